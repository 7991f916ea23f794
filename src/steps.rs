//! The typed deployment pipeline.
//!
//! Each contract deployment is described by a [`DeployStep`]: the contract
//! to deploy, a builder producing its constructor arguments from the
//! addresses confirmed so far, and an optional native value transfer.
//! Describing the sequence as data lets the driver enforce the
//! wait-for-confirmation-before-next-step ordering in one place, and lets
//! the constructor arguments be checked without a network in sight.

use std::{
    collections::HashMap,
    fmt::{self, Display},
};

use ethers::{
    abi::Token,
    types::{Address, U256},
    utils::{parse_ether, parse_units},
};

use crate::{
    constants::{LOCK_VALUE_ETHER, TOKEN_DECIMALS, TOKEN_INITIAL_SUPPLY, UNLOCK_DELAY_SECS},
    errors::ScriptError,
};

/// The contracts deployed by these scripts
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum NamedContract {
    /// The time-locked vault contract
    Lock,
    /// The fungible token contract
    SimpleErc20,
    /// The upgradeable proxy contract, pointing at the token as its
    /// logic contract
    Erc1967Proxy,
}

impl NamedContract {
    /// The name under which the contract's compiled artifact is resolved
    pub fn artifact_name(self) -> &'static str {
        match self {
            NamedContract::Lock => "Lock",
            NamedContract::SimpleErc20 => "SimpleERC20",
            NamedContract::Erc1967Proxy => "ERC1967Proxy",
        }
    }
}

impl Display for NamedContract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.artifact_name())
    }
}

/// A builder mapping the addresses confirmed so far to a step's
/// constructor tokens
type ArgsBuilder = Box<dyn Fn(&DeployedContracts) -> Result<Vec<Token>, ScriptError> + Send + Sync>;

/// A single deployment in the pipeline
pub struct DeployStep {
    /// The contract this step deploys
    pub contract: NamedContract,
    /// The constructor-argument builder, invoked only once every prior
    /// step has confirmed
    args: ArgsBuilder,
    /// The native value attached to the deployment transaction, in wei
    pub value: Option<U256>,
}

impl DeployStep {
    /// Builds the step's constructor tokens from the addresses deployed
    /// so far
    pub fn constructor_args(
        &self,
        deployed: &DeployedContracts,
    ) -> Result<Vec<Token>, ScriptError> {
        (self.args)(deployed)
    }
}

/// An append-only record of confirmed deployments
#[derive(Default)]
pub struct DeployedContracts {
    /// The confirmed on-chain address of each deployed contract
    addresses: HashMap<NamedContract, Address>,
}

impl DeployedContracts {
    /// Records the confirmed address of a contract
    pub fn record(&mut self, contract: NamedContract, address: Address) {
        self.addresses.insert(contract, address);
    }

    /// The confirmed address of a contract, if the pipeline has deployed it
    pub fn address_of(&self, contract: NamedContract) -> Option<Address> {
        self.addresses.get(&contract).copied()
    }

    /// The confirmed address of a contract a later step depends on
    fn require(&self, contract: NamedContract) -> Result<Address, ScriptError> {
        self.address_of(contract).ok_or_else(|| {
            ScriptError::CalldataConstruction(format!("{} has not been deployed yet", contract))
        })
    }
}

/// The amount of wei attached to the Lock deployment
pub fn lock_value() -> U256 {
    // Can `unwrap` here since the constant is a well-formed decimal
    parse_ether(LOCK_VALUE_ETHER).unwrap()
}

/// The SimpleERC20 initial supply in base token units
pub fn token_initial_supply() -> U256 {
    // Can `unwrap` here since the constant is a well-formed decimal
    parse_units(TOKEN_INITIAL_SUPPLY, TOKEN_DECIMALS).unwrap().into()
}

/// The unlock timestamp for a Lock deployed at `now_secs`
pub fn unlock_time_from(now_secs: u64) -> u64 {
    now_secs + UNLOCK_DELAY_SECS
}

/// The ordered deployment plan: the Lock vault, then the SimpleERC20 token,
/// then the ERC1967Proxy pointing at the token
pub fn deployment_plan(unlock_time: u64) -> Vec<DeployStep> {
    vec![
        DeployStep {
            contract: NamedContract::Lock,
            args: Box::new(move |_| Ok(vec![Token::Uint(U256::from(unlock_time))])),
            value: Some(lock_value()),
        },
        DeployStep {
            contract: NamedContract::SimpleErc20,
            args: Box::new(|_| Ok(vec![Token::Uint(token_initial_supply())])),
            value: None,
        },
        DeployStep {
            contract: NamedContract::Erc1967Proxy,
            args: Box::new(|deployed| {
                let token = deployed.require(NamedContract::SimpleErc20)?;
                // The proxy receives no initialization calldata
                Ok(vec![Token::Address(token), Token::Bytes(Vec::new())])
            }),
            value: None,
        },
    ]
}
