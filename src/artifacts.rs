//! Resolution of compiled contract artifacts.
//!
//! Artifacts are produced by the contract toolchain ahead of time; the
//! scripts only resolve them by name from the configured artifacts
//! directory and never compile anything themselves.

use std::{fs, path::Path};

use ethers::{abi::Contract, types::Bytes};
use serde::Deserialize;

use crate::{constants::ARTIFACT_EXTENSION, errors::ScriptError};

/// The on-disk artifact format: the contract ABI and its hex-encoded
/// creation bytecode
#[derive(Deserialize)]
struct RawArtifact {
    /// The contract ABI
    abi: Contract,
    /// The creation bytecode, hex-encoded with an optional `0x` prefix
    bytecode: String,
}

/// The ABI and creation bytecode of a deployable contract
pub struct ContractArtifact {
    /// The contract ABI
    pub abi: Contract,
    /// The creation bytecode
    pub bytecode: Bytes,
}

/// Loads the artifact for the given contract name from the artifacts
/// directory, e.g. `<dir>/Lock.json`
pub fn load_artifact(artifacts_dir: &Path, name: &str) -> Result<ContractArtifact, ScriptError> {
    let path = artifacts_dir.join(name).with_extension(ARTIFACT_EXTENSION);

    let contents = fs::read_to_string(&path).map_err(|e| {
        ScriptError::ArtifactResolution(format!("reading {}: {}", path.display(), e))
    })?;

    let raw: RawArtifact = serde_json::from_str(&contents).map_err(|e| {
        ScriptError::ArtifactResolution(format!("parsing {}: {}", path.display(), e))
    })?;

    let bytecode = hex::decode(raw.bytecode.trim_start_matches("0x"))
        .map_err(|e| ScriptError::ArtifactResolution(format!("decoding {} bytecode: {}", name, e)))?;
    if bytecode.is_empty() {
        return Err(ScriptError::ArtifactResolution(format!(
            "artifact for {} has empty bytecode",
            name
        )));
    }

    Ok(ContractArtifact {
        abi: raw.abi,
        bytecode: bytecode.into(),
    })
}
