//! Moor Core Library
//!
//! Provides the publish–extract–configure pipeline for bringing Move
//! packages live on a Sui-style ledger: compile a bundle, publish it,
//! scan the object changes for the generated capability objects, and
//! thread those identifiers into the follow-up configuration calls.

pub mod build;
pub mod changes;
pub mod client;
pub mod deploy;
pub mod error;
pub mod finality;
pub mod settings;
pub mod signer;
pub mod tx;
pub mod types;

/// Re-exports of commonly used types
pub mod prelude {
    // Errors
    pub use crate::error::DeployError;

    // Ledger client
    pub use crate::client::{
        EffectsOptions, ExecutionStatus, LedgerClient, Network, RpcClient, TransactionResult,
    };

    // Object changes
    pub use crate::changes::{ChangeKind, ObjectChange, find_created, find_published};

    // Transactions
    pub use crate::tx::schema::{CallSchema, CallValues, ParamKind};
    pub use crate::tx::{CallArg, EntryPoint, Operation, TransactionIntent};

    // Orchestration
    pub use crate::deploy::configure::{ConfigureRecord, Configurator, ManagerParams, TokenParams};
    pub use crate::deploy::pipeline::{Pipeline, PipelineStep, RoleMap, StepReport};
    pub use crate::deploy::publish::{DeploymentRecord, Publisher, RoleSpec};

    // Collaborators
    pub use crate::build::{DeploymentArtifact, MoveBuilder};
    pub use crate::finality::WaitPolicy;
    pub use crate::settings::Settings;
    pub use crate::signer::Signer;
}
