//! The deploy-all driver: executes the deployment plan in order,
//! awaiting each confirmation before submitting the next transaction

use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

use ethers::{contract::ContractFactory, providers::Middleware, types::Address};
use tracing::info;

use crate::{
    artifacts::load_artifact,
    constants::NUM_DEPLOY_CONFIRMATIONS,
    errors::ScriptError,
    steps::{deployment_plan, unlock_time_from, DeployStep, DeployedContracts, NamedContract},
};

/// Executes a single deployment step through to confirmation.
///
/// The plan runner invokes this only once every prior step in the plan
/// has confirmed, so implementations may rely on the record holding the
/// addresses of all earlier steps.
trait StepExecutor {
    /// Deploys the step's contract, waits for its confirmation, and
    /// returns the deployed address
    async fn execute(
        &mut self,
        step: &DeployStep,
        deployed: &DeployedContracts,
    ) -> Result<Address, ScriptError>;
}

/// Deploys contracts through the connected client, resolving each
/// contract's compiled artifact from the artifacts directory
struct ClientExecutor<M> {
    /// The JSON-RPC client through which transactions are submitted
    /// and signed
    client: Arc<M>,
    /// The account the deployment transactions are funded from
    sender: Address,
    /// The directory compiled artifacts are resolved from
    artifacts_dir: PathBuf,
}

impl<M: Middleware + 'static> StepExecutor for ClientExecutor<M> {
    async fn execute(
        &mut self,
        step: &DeployStep,
        deployed: &DeployedContracts,
    ) -> Result<Address, ScriptError> {
        let artifact = load_artifact(&self.artifacts_dir, step.contract.artifact_name())?;
        let args = step.constructor_args(deployed)?;

        info!("deploying {}", step.contract);

        let factory = ContractFactory::new(artifact.abi, artifact.bytecode, self.client.clone());
        let mut deployer = factory
            .deploy_tokens(args)
            .map_err(|e| ScriptError::CalldataConstruction(e.to_string()))?;

        // The signing provider owns the sender's key, so the transaction is
        // submitted unsigned with an explicit `from`
        deployer.tx.set_from(self.sender);
        if let Some(value) = step.value {
            deployer.tx.set_value(value);
        }

        let (contract, receipt) = deployer
            .confirmations(NUM_DEPLOY_CONFIRMATIONS)
            .send_with_receipt()
            .await
            .map_err(|e| ScriptError::ContractDeployment(e.to_string()))?;

        info!(
            "{} confirmed in block {:?} (tx {:#x})",
            step.contract, receipt.block_number, receipt.transaction_hash
        );

        Ok(contract.address())
    }
}

/// Deploys the full contract stack in plan order, printing each confirmed
/// address, and returns the addresses in deployment order.
///
/// A step's transaction is only submitted once the previous step's receipt
/// has been observed; any failure aborts the remaining steps.
pub async fn deploy_all<M: Middleware + 'static>(
    client: Arc<M>,
    sender: Address,
    artifacts_dir: &Path,
) -> Result<Vec<(NamedContract, Address)>, ScriptError> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| ScriptError::CalldataConstruction(e.to_string()))?
        .as_secs();
    let plan = deployment_plan(unlock_time_from(now));

    let mut executor = ClientExecutor {
        client,
        sender,
        artifacts_dir: artifacts_dir.to_path_buf(),
    };
    execute_plan(plan, &mut executor).await
}

/// Runs the plan in order: each step's address is recorded before the next
/// step's constructor arguments are built, and the first failure aborts
/// every remaining step
async fn execute_plan<E: StepExecutor>(
    plan: Vec<DeployStep>,
    executor: &mut E,
) -> Result<Vec<(NamedContract, Address)>, ScriptError> {
    let mut deployed = DeployedContracts::default();
    let mut addresses = Vec::with_capacity(plan.len());
    for step in plan {
        let address = executor.execute(&step, &deployed).await?;
        println!("{} deployed to: {:#x}", step.contract, address);

        deployed.record(step.contract, address);
        addresses.push((step.contract, address));
    }

    Ok(addresses)
}

#[cfg(test)]
mod tests {
    use std::{fs, sync::Arc};

    use ethers::{providers::Provider, types::Address};
    use tempdir::TempDir;

    use super::{deploy_all, execute_plan, StepExecutor};
    use crate::{
        errors::ScriptError,
        steps::{deployment_plan, DeployStep, DeployedContracts, NamedContract},
    };

    /// A Lock artifact with the payable single-argument constructor the
    /// plan deploys first
    const LOCK_ARTIFACT: &str = r#"{
        "contractName": "Lock",
        "abi": [
            {
                "type": "constructor",
                "stateMutability": "payable",
                "inputs": [{ "name": "_unlockTime", "type": "uint256" }]
            }
        ],
        "bytecode": "0x6080604052"
    }"#;

    /// An executor handing out sequential addresses, failing at the
    /// configured step index
    struct StubExecutor {
        /// The contracts executed so far, in order
        executed: Vec<NamedContract>,
        /// The step index at which execution fails, if any
        fail_at: Option<usize>,
    }

    impl StubExecutor {
        /// An executor that never fails
        fn new() -> Self {
            Self {
                executed: Vec::new(),
                fail_at: None,
            }
        }

        /// An executor that fails at the given step index
        fn failing_at(step: usize) -> Self {
            Self {
                executed: Vec::new(),
                fail_at: Some(step),
            }
        }
    }

    impl StepExecutor for StubExecutor {
        async fn execute(
            &mut self,
            step: &DeployStep,
            deployed: &DeployedContracts,
        ) -> Result<Address, ScriptError> {
            if self.fail_at == Some(self.executed.len()) {
                return Err(ScriptError::ContractDeployment(
                    "transaction rejected".to_string(),
                ));
            }

            // Every step's constructor arguments must be buildable from
            // the addresses recorded before it ran
            step.constructor_args(deployed)?;

            self.executed.push(step.contract);
            Ok(Address::from([self.executed.len() as u8; 20]))
        }
    }

    #[tokio::test]
    async fn test_plan_executes_in_order() {
        let mut executor = StubExecutor::new();
        let deployed = execute_plan(deployment_plan(0), &mut executor)
            .await
            .unwrap();

        let order: Vec<_> = deployed.iter().map(|(contract, _)| *contract).collect();
        assert_eq!(
            order,
            vec![
                NamedContract::Lock,
                NamedContract::SimpleErc20,
                NamedContract::Erc1967Proxy,
            ]
        );
        assert_eq!(executor.executed, order);

        // Three distinct, non-zero addresses
        let mut addresses: Vec<_> = deployed.iter().map(|(_, address)| *address).collect();
        assert!(addresses.iter().all(|address| !address.is_zero()));
        addresses.dedup();
        assert_eq!(addresses.len(), 3);
    }

    #[tokio::test]
    async fn test_first_step_failure_aborts_plan() {
        let mut executor = StubExecutor::failing_at(0);
        let res = execute_plan(deployment_plan(0), &mut executor).await;

        assert!(matches!(res, Err(ScriptError::ContractDeployment(_))));
        assert!(executor.executed.is_empty());
    }

    #[tokio::test]
    async fn test_later_step_failure_aborts_remaining_steps() {
        let mut executor = StubExecutor::failing_at(2);
        let res = execute_plan(deployment_plan(0), &mut executor).await;

        assert!(res.is_err());
        // The proxy step never ran
        assert_eq!(
            executor.executed,
            vec![NamedContract::Lock, NamedContract::SimpleErc20]
        );
    }

    #[tokio::test]
    async fn test_deploy_all_send_failure_aborts() {
        // Only the Lock artifact exists: the run must fail at the first
        // submission, before any later artifact is resolved
        let dir = TempDir::new("artifacts").unwrap();
        fs::write(dir.path().join("Lock.json"), LOCK_ARTIFACT).unwrap();

        // A mocked provider with no queued responses rejects every request
        let (provider, _mock) = Provider::mocked();
        let res = deploy_all(Arc::new(provider), Address::from([1u8; 20]), dir.path()).await;

        assert!(matches!(res, Err(ScriptError::ContractDeployment(_))));
    }
}
