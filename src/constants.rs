//! Constants used in the deploy scripts

/// The number of seconds between invocation and the Lock contract's
/// unlock time
pub const UNLOCK_DELAY_SECS: u64 = 3600;

/// The amount of ether attached to the Lock deployment, as a decimal string
pub const LOCK_VALUE_ETHER: &str = "0.1";

/// The initial SimpleERC20 supply in whole tokens, as a decimal string
pub const TOKEN_INITIAL_SUPPLY: &str = "1000";

/// The number of decimals by which the token's initial supply is scaled
pub const TOKEN_DECIMALS: u32 = 18;

/// The number of confirmations to wait for each deployment transaction
pub const NUM_DEPLOY_CONFIRMATIONS: usize = 1;

/// The name of the HTTP header carrying the API key on requests
/// to the signing provider
pub const API_KEY_HEADER: &str = "X-API-Key";

/// The file extension of compiled contract artifacts
pub const ARTIFACT_EXTENSION: &str = "json";
