//! Typed failure reasons for the deployment pipeline. Whether a failure
//! degrades or halts the run is decided by the caller, not here.

use thiserror::Error;

/// Failure reasons surfaced by the publish/configure orchestrators.
#[derive(Debug, Error)]
pub enum DeployError {
    /// The external Move toolchain failed to produce a bytecode bundle.
    #[error("move build failed: {0}")]
    Build(String),

    /// Transaction submission was rejected or executed with a failure status.
    #[error("transaction submission failed: {0}")]
    Submission(String),

    /// Transport-level RPC failure (network, malformed response).
    #[error("ledger rpc error: {0}")]
    Rpc(String),

    /// A transaction succeeded but the change set lacks an expected record,
    /// e.g. no `published` record after a publish.
    #[error("transaction {digest} has no {expected} record in its change set")]
    MissingExpectedObject { digest: String, expected: String },

    /// A pipeline step declared a role its predecessors never produced.
    #[error("step `{step}` requires role `{role}`, which no earlier step produced")]
    MissingRole { step: String, role: String },

    /// The effects query never returned finalized data within the wait policy.
    #[error("no finalized effects for {digest} after {attempts} attempts")]
    FinalityTimeout { digest: String, attempts: u32 },

    /// A call schema parameter had no value supplied.
    #[error("call to `{target}` is missing argument `{name}`")]
    MissingArgument { target: String, name: String },

    /// A supplied argument does not match the schema's declared kind.
    #[error("call to `{target}`: argument `{name}` expects {expected}")]
    ArgumentMismatch {
        target: String,
        name: String,
        expected: &'static str,
    },
}

impl From<reqwest::Error> for DeployError {
    fn from(err: reqwest::Error) -> Self {
        DeployError::Rpc(err.to_string())
    }
}
