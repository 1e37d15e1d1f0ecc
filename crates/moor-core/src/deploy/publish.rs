//! Publish orchestrator: submit a compiled bundle and extract what it made.
//!
//! One atomic transaction (publish + capability transfer), then the package
//! id comes out of the `published` change record and the change set is
//! scanned once per well-known role.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::build::DeploymentArtifact;
use crate::changes::{find_created, find_published};
use crate::client::{ExecutionStatus, LedgerClient};
use crate::error::DeployError;
use crate::finality::{WaitPolicy, await_effects};
use crate::tx::TransactionIntent;
use crate::types::{ObjectId, normalize_package_id};

/// One role the publish is expected to create: a name and a type-tag
/// template with `{package}` standing in for the not-yet-known package id.
#[derive(Debug, Clone)]
pub struct RoleSpec {
    pub name: String,
    template: String,
}

impl RoleSpec {
    pub fn new(name: impl Into<String>, template: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            template: template.into(),
        }
    }

    /// Concrete type tag once the package id is known.
    pub fn type_tag(&self, package_id: &str) -> String {
        self.template.replace("{package}", package_id)
    }
}

/// What a publish produced: the normalized package id plus a role→object-id
/// map. A role the scan did not find maps to an empty string; an empty
/// package id is the single downstream signal for a failed publish.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentRecord {
    pub package_id: String,
    pub roles: BTreeMap<String, ObjectId>,
}

impl DeploymentRecord {
    /// The degraded shape: empty package id, every requested role empty.
    pub fn empty(specs: &[RoleSpec]) -> Self {
        Self {
            package_id: String::new(),
            roles: specs
                .iter()
                .map(|spec| (spec.name.clone(), String::new()))
                .collect(),
        }
    }

    /// Role lookup treating the empty string as absent.
    pub fn role(&self, name: &str) -> Option<&str> {
        self.roles
            .get(name)
            .map(String::as_str)
            .filter(|id| !id.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.package_id.is_empty()
    }
}

/// Builds, submits, and scans the publish transaction.
pub struct Publisher<'a> {
    client: &'a dyn LedgerClient,
    wait: WaitPolicy,
}

impl<'a> Publisher<'a> {
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

    /// Publish `artifact`, transferring the upgrade capability to
    /// `recipient`, and extract the ids of the objects named by `roles`.
    ///
    /// The submission result is authoritative: a failed effects refetch is
    /// logged and swallowed, but a missing `published` record is an error.
    pub async fn publish(
        &self,
        artifact: DeploymentArtifact,
        recipient: &str,
        roles: &[RoleSpec],
    ) -> Result<DeploymentRecord, DeployError> {
        let mut intent = TransactionIntent::new();
        intent
            .publish(artifact.modules, artifact.dependencies)
            .transfer_published(recipient);

        let result = self.client.submit(&intent).await?;
        tracing::info!(digest = %result.digest, "publish transaction submitted");

        if let ExecutionStatus::Failure(error) = &result.status {
            return Err(DeployError::Submission(format!(
                "publish {} failed on-chain: {error}",
                result.digest
            )));
        }

        let package_id = find_published(&result.object_changes)
            .map(normalize_package_id)
            .ok_or_else(|| DeployError::MissingExpectedObject {
                digest: result.digest.clone(),
                expected: "published".to_string(),
            })?;
        tracing::info!(package_id, "package published");

        if let Err(err) = await_effects(self.client, &result.digest, &self.wait).await {
            tracing::warn!(
                digest = %result.digest,
                error = %err,
                "could not refetch finalized effects; keeping submission result"
            );
        }

        let mut record = DeploymentRecord {
            package_id,
            roles: BTreeMap::new(),
        };
        for spec in roles {
            let tag = spec.type_tag(&record.package_id);
            let object_id = find_created(&result.object_changes, &tag).unwrap_or_default();
            if object_id.is_empty() {
                tracing::warn!(role = %spec.name, tag, "no created object for role");
            } else {
                tracing::info!(role = %spec.name, object_id, "role object found");
            }
            record.roles.insert(spec.name.clone(), object_id.to_string());
        }

        Ok(record)
    }

    /// The always-return-a-shape contract: any publish failure is logged
    /// and collapsed into [`DeploymentRecord::empty`], so a multi-step
    /// script can keep going and test `is_empty()` instead of unwinding.
    pub async fn publish_or_empty(
        &self,
        artifact: DeploymentArtifact,
        recipient: &str,
        roles: &[RoleSpec],
    ) -> DeploymentRecord {
        match self.publish(artifact, recipient, roles).await {
            Ok(record) => record,
            Err(err) => {
                tracing::error!(error = %err, "publish failed; returning empty deployment record");
                DeploymentRecord::empty(roles)
            }
        }
    }
}
