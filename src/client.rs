//! Connection setup against the remote signing provider.
//!
//! The provider holds the deployment keys and exposes a standard
//! wallet-enabled JSON-RPC interface: accounts are enumerated with
//! `eth_accounts` and transactions submitted with `eth_sendTransaction`
//! are signed and broadcast inside the provider. The scripts never
//! touch key material beyond the API secret used to authenticate.

use std::{fs, str::FromStr, sync::Arc};

use ethers::{
    providers::{Http, Middleware, Provider},
    types::Address,
};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use tracing::info;
use url::Url;

use crate::{cli::Cli, constants::API_KEY_HEADER, errors::ScriptError};

/// A live connection to the target network through the signing provider
pub struct Connection {
    /// The JSON-RPC provider through which transactions are submitted
    /// and signed
    pub provider: Arc<Provider<Http>>,
    /// The account the provider signs deployment transactions with
    pub sender: Address,
    /// The chain ID of the connected network
    pub chain_id: u64,
}

/// Sets up the connection to the signing provider, verifying the chain ID
/// and selecting the sender account from those the provider enumerates
pub async fn setup_client(cli: &Cli) -> Result<Connection, ScriptError> {
    let api_secret = fs::read_to_string(&cli.key_path).map_err(|e| {
        ScriptError::ClientInitialization(format!(
            "reading API secret from {}: {}",
            cli.key_path.display(),
            e
        ))
    })?;

    let mut headers = HeaderMap::new();
    headers.insert(
        API_KEY_HEADER,
        HeaderValue::from_str(&cli.api_key)
            .map_err(|e| ScriptError::ClientInitialization(e.to_string()))?,
    );
    let mut auth = HeaderValue::from_str(&format!("Bearer {}", api_secret.trim()))
        .map_err(|e| ScriptError::ClientInitialization(e.to_string()))?;
    auth.set_sensitive(true);
    headers.insert(AUTHORIZATION, auth);

    let http_client = reqwest::Client::builder()
        .default_headers(headers)
        .build()
        .map_err(|e| ScriptError::ClientInitialization(e.to_string()))?;

    let url = Url::parse(&cli.rpc_url)
        .map_err(|e| ScriptError::ClientInitialization(format!("invalid RPC URL: {}", e)))?;
    let provider = Arc::new(Provider::new(Http::new_with_client(url, http_client)));

    let chain_id = provider
        .get_chainid()
        .await
        .map_err(|e| ScriptError::ClientInitialization(e.to_string()))?
        .as_u64();
    if chain_id != cli.chain_id {
        return Err(ScriptError::ClientInitialization(format!(
            "provider reports chain ID {}, expected {}",
            chain_id, cli.chain_id
        )));
    }

    let authorized = parse_signer_accounts(&cli.signer_accounts)?;
    let enumerated = provider
        .get_accounts()
        .await
        .map_err(|e| ScriptError::ClientInitialization(e.to_string()))?;
    let sender = select_sender(&enumerated, &authorized)?;

    info!("connected to chain {} as {:#x}", chain_id, sender);

    Ok(Connection {
        provider,
        sender,
        chain_id,
    })
}

/// Parses the configured signer account addresses from their hex form
pub fn parse_signer_accounts(accounts: &[String]) -> Result<Vec<Address>, ScriptError> {
    accounts
        .iter()
        .map(|s| {
            Address::from_str(s).map_err(|e| {
                ScriptError::ClientInitialization(format!("invalid signer account {}: {}", s, e))
            })
        })
        .collect()
}

/// Selects the sender account: the first provider-enumerated account in the
/// authorized set, or the first enumerated account if the set is empty
pub fn select_sender(
    enumerated: &[Address],
    authorized: &[Address],
) -> Result<Address, ScriptError> {
    let sender = if authorized.is_empty() {
        enumerated.first().copied()
    } else {
        enumerated.iter().copied().find(|a| authorized.contains(a))
    };

    sender.ok_or_else(|| {
        ScriptError::ClientInitialization(
            "signing provider enumerated no authorized account".to_string(),
        )
    })
}

#[cfg(test)]
mod tests {
    use ethers::types::Address;

    use super::{parse_signer_accounts, select_sender};

    /// A fixed test address
    fn addr(byte: u8) -> Address {
        Address::from([byte; 20])
    }

    #[test]
    fn test_select_sender_empty_authorized_set() {
        let enumerated = vec![addr(1), addr(2)];
        let sender = select_sender(&enumerated, &[]).unwrap();
        assert_eq!(sender, addr(1));
    }

    #[test]
    fn test_select_sender_respects_authorized_set() {
        let enumerated = vec![addr(1), addr(2), addr(3)];
        let authorized = vec![addr(3), addr(2)];
        let sender = select_sender(&enumerated, &authorized).unwrap();
        assert_eq!(sender, addr(2));
    }

    #[test]
    fn test_select_sender_no_match() {
        let enumerated = vec![addr(1)];
        let authorized = vec![addr(2)];
        assert!(select_sender(&enumerated, &authorized).is_err());
    }

    #[test]
    fn test_select_sender_no_accounts() {
        assert!(select_sender(&[], &[]).is_err());
    }

    #[test]
    fn test_parse_signer_accounts() {
        let parsed = parse_signer_accounts(&[
            "0x0101010101010101010101010101010101010101".to_string()
        ])
        .unwrap();
        assert_eq!(parsed, vec![addr(1)]);

        assert!(parse_signer_accounts(&["not-an-address".to_string()]).is_err());
    }
}
