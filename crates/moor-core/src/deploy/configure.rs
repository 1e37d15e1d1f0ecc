//! Configuration orchestrators.
//!
//! Each variant submits one entry-point call, then scans the finalized
//! effects for the configuration object it shared. No degraded shape here:
//! failures propagate and the caller decides whether the run halts.

use crate::changes::find_created;
use crate::client::{ExecutionStatus, LedgerClient, TransactionResult};
use crate::error::DeployError;
use crate::finality::{WaitPolicy, await_effects};
use crate::tx::TransactionIntent;
use crate::tx::schema::{CallSchema, CallValues, MANAGER_CONFIGURE, TOKEN_CONFIGURE, build_call};
use crate::types::{Digest, ObjectId};

/// Outcome of one configure call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigureRecord {
    pub digest: Digest,
    /// Id of the configuration object the call created, when the scan finds
    /// one. Absent is tolerable: some entry points only mutate state.
    pub config_id: Option<ObjectId>,
}

/// Domain parameters of `spoke_manager::configure`. Unlike the token
/// variant, this entry point takes no allow-lists.
#[derive(Debug, Clone)]
pub struct ManagerParams {
    pub storage: String,
    pub manager_config: String,
    pub version: u64,
    pub token_id: String,
}

/// Domain parameters of `spoke_token::configure`.
#[derive(Debug, Clone)]
pub struct TokenParams {
    pub storage: String,
    pub version: u64,
    pub token_id: String,
    pub sources: Vec<String>,
    pub destinations: Vec<String>,
}

/// Builds and submits configuration transactions.
pub struct Configurator<'a> {
    client: &'a dyn LedgerClient,
    wait: WaitPolicy,
}

impl<'a> Configurator<'a> {
    pub fn new(client: &'a dyn LedgerClient) -> Self {
        Self {
            client,
            wait: WaitPolicy::default(),
        }
    }

    pub fn with_wait_policy(mut self, wait: WaitPolicy) -> Self {
        self.wait = wait;
        self
    }

    /// Configure a spoke manager deployment.
    ///
    /// `admin` and `witness` come from the publish record; the rest are
    /// external parameters. No precondition guard on `package_id`: an empty
    /// id still submits and fails at the ledger boundary.
    pub async fn configure_manager(
        &self,
        package_id: &str,
        admin: &str,
        witness: &str,
        params: &ManagerParams,
    ) -> Result<ConfigureRecord, DeployError> {
        let values = CallValues::new()
            .object("admin", admin)
            .object("storage", params.storage.clone())
            .object("manager-config", params.manager_config.clone())
            .object("witness", witness)
            .u64("version", params.version)
            .str("token-id", params.token_id.clone());

        self.run(package_id, &MANAGER_CONFIGURE, values, "spoke_manager::Config")
            .await
    }

    /// Configure a spoke token deployment, treasury capability included.
    pub async fn configure_token(
        &self,
        package_id: &str,
        admin: &str,
        witness: &str,
        treasury: &str,
        params: &TokenParams,
    ) -> Result<ConfigureRecord, DeployError> {
        let values = CallValues::new()
            .object("admin", admin)
            .object("storage", params.storage.clone())
            .object("witness", witness)
            .u64("version", params.version)
            .str("token-id", params.token_id.clone())
            .str_list("sources", params.sources.clone())
            .str_list("destinations", params.destinations.clone())
            .object("treasury", treasury);

        self.run(package_id, &TOKEN_CONFIGURE, values, "spoke_token::Config")
            .await
    }

    async fn run(
        &self,
        package_id: &str,
        schema: &CallSchema,
        values: CallValues,
        config_suffix: &str,
    ) -> Result<ConfigureRecord, DeployError> {
        let call = build_call(package_id, schema, &values)?;
        let mut intent = TransactionIntent::new();
        intent.operations.push(call);

        let result = self.client.submit(&intent).await?;
        let target = format!("{package_id}::{}::{}", schema.module, schema.function);
        tracing::info!(digest = %result.digest, entry = %target, "configure transaction submitted");

        if let ExecutionStatus::Failure(error) = &result.status {
            return Err(DeployError::Submission(format!(
                "configure {} failed on-chain: {error}",
                result.digest
            )));
        }

        // The configure call shares its config object, so the submission
        // result may predate it; scan the finalized effects instead.
        let effects = await_effects(self.client, &result.digest, &self.wait).await?;
        let record = scan_config(&effects, package_id, config_suffix);
        match &record.config_id {
            Some(id) => tracing::info!(config_id = %id, "configuration object created"),
            None => tracing::warn!(digest = %record.digest, "no configuration object in change set"),
        }
        Ok(record)
    }
}

fn scan_config(
    effects: &TransactionResult,
    package_id: &str,
    config_suffix: &str,
) -> ConfigureRecord {
    let tag = format!("{package_id}::{config_suffix}");
    ConfigureRecord {
        digest: effects.digest.clone(),
        config_id: find_created(&effects.object_changes, &tag).map(str::to_string),
    }
}
