//! Definitions of errors that can occur during the execution of the deploy scripts

use std::{
    error::Error,
    fmt::{self, Display, Formatter},
};

/// Errors that can occur during the execution of the deploy scripts
#[derive(Debug)]
pub enum ScriptError {
    /// Error initializing the connection to the signing provider
    ClientInitialization(String),
    /// Error resolving or parsing a compiled contract artifact
    ArtifactResolution(String),
    /// Error constructing constructor calldata for a contract
    CalldataConstruction(String),
    /// Error deploying a contract
    ContractDeployment(String),
}

impl Display for ScriptError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ScriptError::ClientInitialization(s) => write!(f, "error initializing client: {}", s),
            ScriptError::ArtifactResolution(s) => write!(f, "error resolving artifact: {}", s),
            ScriptError::CalldataConstruction(s) => write!(f, "error constructing calldata: {}", s),
            ScriptError::ContractDeployment(s) => write!(f, "error deploying contract: {}", s),
        }
    }
}

impl Error for ScriptError {}
