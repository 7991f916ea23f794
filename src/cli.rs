//! Definitions of CLI arguments for the deploy scripts

use std::path::PathBuf;

use clap::Parser;

/// Deploy the Lock, SimpleERC20, and ERC1967Proxy contracts, in that order,
/// through a remote signing provider
#[derive(Parser)]
pub struct Cli {
    /// Path to the file containing the API secret used to authenticate
    /// to the signing provider
    #[arg(long, env = "SIGNER_API_KEY_PATH")]
    pub key_path: PathBuf,

    /// API key identifying this workspace to the signing provider
    #[arg(long, env = "SIGNER_API_KEY")]
    pub api_key: String,

    /// Comma-separated set of signer account addresses authorized to fund
    /// the deployments.
    ///
    /// The first account the provider enumerates that belongs to this set is
    /// used as the sender; an empty set selects the first enumerated account.
    #[arg(long, env = "SIGNER_ACCOUNTS", value_delimiter = ',')]
    pub signer_accounts: Vec<String>,

    /// Chain ID of the target network, checked against the provider
    /// at connection time
    #[arg(long, env = "CHAIN_ID")]
    pub chain_id: u64,

    /// URL of the signing provider's JSON-RPC bridge
    #[arg(long, env = "RPC_URL")]
    pub rpc_url: String,

    /// Directory containing the compiled contract artifacts
    #[arg(long, env = "ARTIFACTS_DIR", default_value = "artifacts")]
    pub artifacts_dir: PathBuf,
}
