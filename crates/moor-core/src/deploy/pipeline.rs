//! Explicit deployment pipeline.
//!
//! Each step declares the roles it reads and writes; the runner checks
//! availability before a step submits anything and threads produced ids
//! to later steps through a shared role map.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::build::DeploymentArtifact;
use crate::deploy::configure::{Configurator, ManagerParams, TokenParams};
use crate::deploy::publish::{Publisher, RoleSpec};
use crate::deploy::roles;
use crate::error::DeployError;

/// Role name → object id map shared across a pipeline run. Empty values are
/// treated as absent.
#[derive(Debug, Clone, Default)]
pub struct RoleMap {
    entries: BTreeMap<String, String>,
}

impl RoleMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, role: impl Into<String>, id: impl Into<String>) {
        let id = id.into();
        if !id.is_empty() {
            self.entries.insert(role.into(), id);
        }
    }

    pub fn get(&self, role: &str) -> Option<&str> {
        self.entries.get(role).map(String::as_str)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// What one executed step reports back.
#[derive(Debug, Clone)]
pub struct StepReport {
    pub step: String,
    pub digest: Option<String>,
}

/// One named unit of pipeline work with declared role dependencies.
#[async_trait]
pub trait PipelineStep: Send {
    fn name(&self) -> &str;
    /// Roles that must be present in the map before this step runs.
    fn needs(&self) -> &[String];
    /// Roles this step is expected to add to the map.
    fn produces(&self) -> &[String];
    async fn run(&mut self, roles: &mut RoleMap) -> Result<StepReport, DeployError>;
}

/// Sequential executor over an ordered list of steps.
///
/// Steps are executed in insertion order, which the caller is responsible
/// for keeping topological; there is no reordering and no concurrency.
#[derive(Default)]
pub struct Pipeline<'a> {
    steps: Vec<Box<dyn PipelineStep + 'a>>,
}

impl<'a> Pipeline<'a> {
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    pub fn step(mut self, step: impl PipelineStep + 'a) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    /// Run every step in order. The first failure halts the pipeline; a
    /// step whose declared needs are not satisfied fails before submitting
    /// anything.
    pub async fn run(&mut self, roles: &mut RoleMap) -> Result<Vec<StepReport>, DeployError> {
        let mut reports = Vec::with_capacity(self.steps.len());

        for step in &mut self.steps {
            for role in step.needs() {
                if roles.get(role).is_none() {
                    return Err(DeployError::MissingRole {
                        step: step.name().to_string(),
                        role: role.clone(),
                    });
                }
            }

            tracing::info!(step = %step.name(), "running pipeline step");
            let report = step.run(roles).await?;

            for role in step.produces() {
                if roles.get(role).is_none() {
                    tracing::warn!(step = %step.name(), role = %role, "declared role not produced");
                }
            }
            reports.push(report);
        }

        Ok(reports)
    }
}

/// Publish step: compiles nothing itself; consumes a prebuilt artifact.
pub struct PublishStep<'a> {
    publisher: Publisher<'a>,
    artifact: Option<DeploymentArtifact>,
    recipient: String,
    role_specs: Vec<RoleSpec>,
    needs: Vec<String>,
    produces: Vec<String>,
}

impl<'a> PublishStep<'a> {
    pub fn new(
        publisher: Publisher<'a>,
        artifact: DeploymentArtifact,
        recipient: impl Into<String>,
        role_specs: Vec<RoleSpec>,
    ) -> Self {
        let mut produces = vec![roles::PACKAGE_ID.to_string()];
        produces.extend(role_specs.iter().map(|spec| spec.name.clone()));
        Self {
            publisher,
            artifact: Some(artifact),
            recipient: recipient.into(),
            role_specs,
            needs: Vec::new(),
            produces,
        }
    }
}

#[async_trait]
impl PipelineStep for PublishStep<'_> {
    fn name(&self) -> &str {
        "publish"
    }

    fn needs(&self) -> &[String] {
        &self.needs
    }

    fn produces(&self) -> &[String] {
        &self.produces
    }

    async fn run(&mut self, role_map: &mut RoleMap) -> Result<StepReport, DeployError> {
        // The artifact is consumed by its one publish; a pipeline never
        // runs a step twice.
        let artifact = self
            .artifact
            .take()
            .ok_or_else(|| DeployError::Build("deployment artifact already consumed".into()))?;

        let record = self
            .publisher
            .publish(artifact, &self.recipient, &self.role_specs)
            .await?;

        role_map.insert(roles::PACKAGE_ID, record.package_id.clone());
        for (name, id) in &record.roles {
            role_map.insert(name.clone(), id.clone());
        }

        Ok(StepReport {
            step: self.name().to_string(),
            digest: None,
        })
    }
}

/// Token configuration step.
pub struct ConfigureTokenStep<'a> {
    configurator: Configurator<'a>,
    params: TokenParams,
    needs: Vec<String>,
    produces: Vec<String>,
}

impl<'a> ConfigureTokenStep<'a> {
    pub fn new(configurator: Configurator<'a>, params: TokenParams) -> Self {
        Self {
            configurator,
            params,
            needs: vec![
                roles::PACKAGE_ID.to_string(),
                roles::CAPABILITY.to_string(),
                roles::WITNESS_CARRIER.to_string(),
                roles::TREASURY.to_string(),
            ],
            produces: vec![roles::CONFIGURATION_HANDLE.to_string()],
        }
    }
}

#[async_trait]
impl PipelineStep for ConfigureTokenStep<'_> {
    fn name(&self) -> &str {
        "configure-token"
    }

    fn needs(&self) -> &[String] {
        &self.needs
    }

    fn produces(&self) -> &[String] {
        &self.produces
    }

    async fn run(&mut self, role_map: &mut RoleMap) -> Result<StepReport, DeployError> {
        let package_id = role_map
            .get(roles::PACKAGE_ID)
            .unwrap_or_default()
            .to_string();
        let admin = role_map.get(roles::CAPABILITY).unwrap_or_default().to_string();
        let witness = role_map
            .get(roles::WITNESS_CARRIER)
            .unwrap_or_default()
            .to_string();
        let treasury = role_map.get(roles::TREASURY).unwrap_or_default().to_string();

        let record = self
            .configurator
            .configure_token(&package_id, &admin, &witness, &treasury, &self.params)
            .await?;
        if let Some(id) = &record.config_id {
            role_map.insert(roles::CONFIGURATION_HANDLE, id.clone());
        }

        Ok(StepReport {
            step: self.name().to_string(),
            digest: Some(record.digest),
        })
    }
}

/// Manager configuration step.
///
/// `admin_role`/`witness_role` are parameterized so the chained scenario can
/// point this step at the manager-side capability pair a combined bundle
/// created, while a manager-only deployment uses the default role names.
pub struct ConfigureManagerStep<'a> {
    configurator: Configurator<'a>,
    params: ManagerParams,
    admin_role: String,
    witness_role: String,
    needs: Vec<String>,
    produces: Vec<String>,
}

impl<'a> ConfigureManagerStep<'a> {
    pub fn new(configurator: Configurator<'a>, params: ManagerParams) -> Self {
        Self::with_capability_roles(configurator, params, roles::CAPABILITY, roles::WITNESS_CARRIER)
    }

    /// Chained variant reading the manager-side capability pair.
    pub fn chained(configurator: Configurator<'a>, params: ManagerParams) -> Self {
        Self::with_capability_roles(
            configurator,
            params,
            roles::MANAGER_CAPABILITY,
            roles::MANAGER_WITNESS,
        )
    }

    fn with_capability_roles(
        configurator: Configurator<'a>,
        params: ManagerParams,
        admin_role: &str,
        witness_role: &str,
    ) -> Self {
        Self {
            configurator,
            params,
            admin_role: admin_role.to_string(),
            witness_role: witness_role.to_string(),
            needs: vec![
                roles::PACKAGE_ID.to_string(),
                admin_role.to_string(),
                witness_role.to_string(),
            ],
            produces: vec![roles::CONFIGURATION_HANDLE.to_string()],
        }
    }
}

#[async_trait]
impl PipelineStep for ConfigureManagerStep<'_> {
    fn name(&self) -> &str {
        "configure-manager"
    }

    fn needs(&self) -> &[String] {
        &self.needs
    }

    fn produces(&self) -> &[String] {
        &self.produces
    }

    async fn run(&mut self, role_map: &mut RoleMap) -> Result<StepReport, DeployError> {
        let package_id = role_map
            .get(roles::PACKAGE_ID)
            .unwrap_or_default()
            .to_string();
        let admin = role_map.get(&self.admin_role).unwrap_or_default().to_string();
        let witness = role_map
            .get(&self.witness_role)
            .unwrap_or_default()
            .to_string();

        let record = self
            .configurator
            .configure_manager(&package_id, &admin, &witness, &self.params)
            .await?;
        if let Some(id) = &record.config_id {
            role_map.insert(roles::CONFIGURATION_HANDLE, id.clone());
        }

        Ok(StepReport {
            step: self.name().to_string(),
            digest: Some(record.digest),
        })
    }
}
