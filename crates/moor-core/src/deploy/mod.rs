//! Publish and configure orchestration.

pub mod configure;
pub mod mint;
pub mod pipeline;
pub mod publish;

#[cfg(test)]
mod tests;

pub use configure::{ConfigureRecord, Configurator, ManagerParams, TokenParams};
pub use pipeline::{
    ConfigureManagerStep, ConfigureTokenStep, Pipeline, PipelineStep, PublishStep, RoleMap,
    StepReport,
};
pub use publish::{DeploymentRecord, Publisher, RoleSpec};

/// Well-known role names a deployment record maps to object ids.
pub mod roles {
    /// The deployed package id, threaded between pipeline steps.
    pub const PACKAGE_ID: &str = "package-id";
    /// Administrative capability of the published module.
    pub const CAPABILITY: &str = "capability";
    /// One-time initialization witness carrier.
    pub const WITNESS_CARRIER: &str = "witness-carrier";
    /// Treasury/mint capability (token variant).
    pub const TREASURY: &str = "treasury";
    /// Shared configuration object created by a configure call.
    pub const CONFIGURATION_HANDLE: &str = "configuration-handle";
    /// Manager-side capability in the chained token+manager scenario.
    pub const MANAGER_CAPABILITY: &str = "manager-capability";
    /// Manager-side witness carrier in the chained scenario.
    pub const MANAGER_WITNESS: &str = "manager-witness";
}

/// Roles a spoke-token publish is expected to create.
pub fn token_roles() -> Vec<RoleSpec> {
    vec![
        RoleSpec::new(roles::CAPABILITY, "{package}::spoke_token::AdminCap"),
        RoleSpec::new(roles::WITNESS_CARRIER, "{package}::spoke_token::WitnessCarrier"),
        RoleSpec::new(
            roles::TREASURY,
            "0x2::coin::TreasuryCap<{package}::test_coin::TEST_COIN>",
        ),
    ]
}

/// Roles a spoke-manager publish is expected to create.
pub fn manager_roles() -> Vec<RoleSpec> {
    vec![
        RoleSpec::new(roles::CAPABILITY, "{package}::spoke_manager::AdminCap"),
        RoleSpec::new(
            roles::WITNESS_CARRIER,
            "{package}::spoke_manager::WitnessCarrier",
        ),
    ]
}

/// Roles for a bundle that ships both modules: the token roles plus the
/// manager's capability pair under distinct names, for the chained
/// token-then-manager configuration.
pub fn chained_roles() -> Vec<RoleSpec> {
    let mut specs = token_roles();
    specs.push(RoleSpec::new(
        roles::MANAGER_CAPABILITY,
        "{package}::spoke_manager::AdminCap",
    ));
    specs.push(RoleSpec::new(
        roles::MANAGER_WITNESS,
        "{package}::spoke_manager::WitnessCarrier",
    ));
    specs
}
