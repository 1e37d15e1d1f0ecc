//! Ledger client layer: the orchestrators talk to the `LedgerClient` trait,
//! implemented by [`rpc`] for real fullnodes and by scripted mocks in tests.

pub mod rpc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::changes::ObjectChange;
use crate::error::DeployError;
use crate::tx::TransactionIntent;
use crate::types::Digest;

pub use rpc::{Network, RpcClient};

/// Outcome of executing a transaction on the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "status", content = "error")]
pub enum ExecutionStatus {
    Success,
    Failure(String),
}

/// What a submission or effects query returned. `object_changes` is only
/// populated when the request asked for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResult {
    pub digest: Digest,
    pub status: ExecutionStatus,
    #[serde(default)]
    pub object_changes: Vec<ObjectChange>,
}

/// Field selection for an effects query. Unselected fields are omitted from
/// the response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectsOptions {
    pub show_effects: bool,
    pub show_input: bool,
    pub show_events: bool,
    pub show_object_changes: bool,
    pub show_balance_changes: bool,
}

impl Default for EffectsOptions {
    fn default() -> Self {
        Self::effects_and_changes()
    }
}

impl EffectsOptions {
    /// Effects and object changes only, what the pipeline always asks for.
    pub fn effects_and_changes() -> Self {
        Self {
            show_effects: true,
            show_input: false,
            show_events: false,
            show_object_changes: true,
            show_balance_changes: false,
        }
    }
}

/// The ledger collaborator: submit signed transactions, query their
/// finalized effects, and report the signer's address.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Sign and execute an intent as one atomic transaction.
    async fn submit(&self, intent: &TransactionIntent) -> Result<TransactionResult, DeployError>;

    /// Fetch the authoritative record of an already-submitted transaction.
    async fn query_effects(
        &self,
        digest: &str,
        options: &EffectsOptions,
    ) -> Result<TransactionResult, DeployError>;

    /// The address transactions are signed with.
    fn signer_address(&self) -> &str;
}
