//! Orchestrator tests against a scripted in-memory ledger.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use super::configure::{Configurator, TokenParams};
use super::pipeline::{
    ConfigureManagerStep, ConfigureTokenStep, Pipeline, PublishStep, RoleMap,
};
use super::publish::{DeploymentRecord, Publisher};
use super::{chained_roles, manager_roles, roles, token_roles};
use crate::build::DeploymentArtifact;
use crate::changes::ObjectChange;
use crate::client::{EffectsOptions, ExecutionStatus, LedgerClient, TransactionResult};
use crate::deploy::configure::ManagerParams;
use crate::deploy::mint::mint;
use crate::error::DeployError;
use crate::tx::{CallArg, Operation, TransactionIntent};

/// Ledger double: records submissions, replays scripted results in order.
#[derive(Default)]
struct MockLedger {
    submissions: Mutex<Vec<TransactionIntent>>,
    submit_results: Mutex<VecDeque<Result<TransactionResult, DeployError>>>,
    effects_results: Mutex<VecDeque<Result<TransactionResult, DeployError>>>,
}

impl MockLedger {
    fn new() -> Self {
        Self::default()
    }

    fn script_submit(&self, result: Result<TransactionResult, DeployError>) {
        self.submit_results.lock().unwrap().push_back(result);
    }

    fn script_effects(&self, result: Result<TransactionResult, DeployError>) {
        self.effects_results.lock().unwrap().push_back(result);
    }

    fn submissions(&self) -> Vec<TransactionIntent> {
        self.submissions.lock().unwrap().clone()
    }
}

#[async_trait]
impl LedgerClient for MockLedger {
    async fn submit(&self, intent: &TransactionIntent) -> Result<TransactionResult, DeployError> {
        self.submissions.lock().unwrap().push(intent.clone());
        self.submit_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(DeployError::Rpc("unscripted submission".into())))
    }

    async fn query_effects(
        &self,
        _digest: &str,
        _options: &EffectsOptions,
    ) -> Result<TransactionResult, DeployError> {
        self.effects_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(DeployError::Rpc("unscripted effects query".into())))
    }

    fn signer_address(&self) -> &str {
        "0xsigner"
    }
}

fn success(digest: &str, changes: Vec<ObjectChange>) -> TransactionResult {
    TransactionResult {
        digest: digest.to_string(),
        status: ExecutionStatus::Success,
        object_changes: changes,
    }
}

fn artifact() -> DeploymentArtifact {
    DeploymentArtifact {
        modules: vec!["oRzrCw==".to_string()],
        dependencies: vec!["0x1".to_string(), "0x2".to_string()],
    }
}

/// Change set of a successful spoke-token publish, ids already normalized
/// the way the ledger reports type tags.
fn token_publish_changes() -> Vec<ObjectChange> {
    vec![
        ObjectChange::published("0x00abc"),
        ObjectChange::created("0xabc::spoke_token::AdminCap", "0x1"),
        ObjectChange::created("0xabc::spoke_token::WitnessCarrier", "0x2"),
        ObjectChange::created("0x2::coin::TreasuryCap<0xabc::test_coin::TEST_COIN>", "0x3"),
    ]
}

fn token_params() -> TokenParams {
    TokenParams {
        storage: "0xstorage".to_string(),
        version: 1,
        token_id: "0x1.icon/cx7".to_string(),
        sources: vec!["0x1.icon".to_string()],
        destinations: vec!["sui".to_string()],
    }
}

fn manager_params() -> ManagerParams {
    ManagerParams {
        storage: "0xstorage".to_string(),
        manager_config: "0xmconf".to_string(),
        version: 1,
        token_id: "0x1.icon/cx7".to_string(),
    }
}

mod publish_tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn extracts_package_id_and_all_roles() {
        let ledger = MockLedger::new();
        ledger.script_submit(Ok(success("Dig1", token_publish_changes())));
        ledger.script_effects(Ok(success("Dig1", token_publish_changes())));

        let record = Publisher::new(&ledger)
            .publish(artifact(), "0xme", &token_roles())
            .await
            .unwrap();

        assert_eq!(record.package_id, "0xabc");
        assert_eq!(record.role(roles::CAPABILITY), Some("0x1"));
        assert_eq!(record.role(roles::WITNESS_CARRIER), Some("0x2"));
        assert_eq!(record.role(roles::TREASURY), Some("0x3"));
    }

    #[tokio::test(start_paused = true)]
    async fn intent_is_publish_then_capability_transfer() {
        let ledger = MockLedger::new();
        ledger.script_submit(Ok(success("Dig1", token_publish_changes())));
        ledger.script_effects(Ok(success("Dig1", token_publish_changes())));

        Publisher::new(&ledger)
            .publish(artifact(), "0xme", &token_roles())
            .await
            .unwrap();

        let submissions = ledger.submissions();
        assert_eq!(submissions.len(), 1);
        let ops = &submissions[0].operations;
        assert_eq!(ops.len(), 2);
        assert!(matches!(&ops[0], Operation::Publish { modules, .. } if modules.len() == 1));
        assert!(
            matches!(&ops[1], Operation::TransferPublished { recipient } if recipient == "0xme")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn absent_role_maps_to_empty_string() {
        // Scenario B: capability record missing from the change set.
        let changes = vec![
            ObjectChange::published("0xABC"),
            ObjectChange::created("0xABC::spoke_token::WitnessCarrier", "0x2"),
        ];
        let ledger = MockLedger::new();
        ledger.script_submit(Ok(success("Dig1", changes.clone())));
        ledger.script_effects(Ok(success("Dig1", changes)));

        let record = Publisher::new(&ledger)
            .publish(artifact(), "0xme", &token_roles())
            .await
            .unwrap();

        assert_eq!(record.roles[roles::CAPABILITY], "");
        assert_eq!(record.role(roles::CAPABILITY), None);
        assert_eq!(record.role(roles::WITNESS_CARRIER), Some("0x2"));
    }

    #[tokio::test(start_paused = true)]
    async fn missing_published_record_is_a_typed_error() {
        let changes = vec![ObjectChange::created("0xabc::spoke_token::AdminCap", "0x1")];
        let ledger = MockLedger::new();
        ledger.script_submit(Ok(success("Dig1", changes)));

        let err = Publisher::new(&ledger)
            .publish(artifact(), "0xme", &token_roles())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DeployError::MissingExpectedObject { expected, .. } if expected == "published"
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn publish_or_empty_degrades_instead_of_raising() {
        let ledger = MockLedger::new();
        ledger.script_submit(Err(DeployError::Rpc("connection refused".into())));

        let specs = token_roles();
        let record = Publisher::new(&ledger)
            .publish_or_empty(artifact(), "0xme", &specs)
            .await;

        assert!(record.is_empty());
        assert_eq!(record, DeploymentRecord::empty(&specs));
        assert_eq!(record.roles.len(), specs.len());
        assert!(record.roles.values().all(String::is_empty));
    }

    #[tokio::test(start_paused = true)]
    async fn on_chain_failure_status_is_a_submission_error() {
        let ledger = MockLedger::new();
        ledger.script_submit(Ok(TransactionResult {
            digest: "Dig1".to_string(),
            status: ExecutionStatus::Failure("insufficient gas".to_string()),
            object_changes: vec![],
        }));

        let err = Publisher::new(&ledger)
            .publish(artifact(), "0xme", &token_roles())
            .await
            .unwrap_err();
        assert!(matches!(err, DeployError::Submission(msg) if msg.contains("insufficient gas")));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_effects_refetch_does_not_abort() {
        // Effects queue left empty: every poll errors, the waiter times out,
        // and the submission result still wins.
        let ledger = MockLedger::new();
        ledger.script_submit(Ok(success("Dig1", token_publish_changes())));

        let record = Publisher::new(&ledger)
            .publish(artifact(), "0xme", &token_roles())
            .await
            .unwrap();
        assert_eq!(record.package_id, "0xabc");
        assert_eq!(record.role(roles::TREASURY), Some("0x3"));
    }
}

mod configure_tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn token_configure_scans_finalized_effects_for_config() {
        let ledger = MockLedger::new();
        ledger.script_submit(Ok(success("Dig2", vec![])));
        ledger.script_effects(Ok(success(
            "Dig2",
            vec![ObjectChange::created("0xabc::spoke_token::Config", "0xc0")],
        )));

        let record = Configurator::new(&ledger)
            .configure_token("0xabc", "0x1", "0x2", "0x3", &token_params())
            .await
            .unwrap();

        assert_eq!(record.digest, "Dig2");
        assert_eq!(record.config_id.as_deref(), Some("0xc0"));
    }

    #[tokio::test(start_paused = true)]
    async fn token_arguments_follow_the_schema_order() {
        let ledger = MockLedger::new();
        ledger.script_submit(Ok(success("Dig2", vec![])));
        ledger.script_effects(Ok(success(
            "Dig2",
            vec![ObjectChange::created("0xabc::spoke_token::Config", "0xc0")],
        )));

        Configurator::new(&ledger)
            .configure_token("0xabc", "0x1", "0x2", "0x3", &token_params())
            .await
            .unwrap();

        let submissions = ledger.submissions();
        assert_eq!(submissions.len(), 1);
        let Operation::MoveCall { entry, arguments } = &submissions[0].operations[0] else {
            panic!("expected a move call");
        };
        assert_eq!(entry.target(), "0xabc::spoke_token::configure");
        assert_eq!(arguments.len(), 8);
        assert_eq!(arguments[0], CallArg::Object("0x1".into()));
        assert_eq!(arguments[3], CallArg::U64(1));
        assert_eq!(arguments[7], CallArg::Object("0x3".into()));
    }

    #[tokio::test(start_paused = true)]
    async fn submission_failure_propagates() {
        let ledger = MockLedger::new();
        ledger.script_submit(Err(DeployError::Rpc("connection reset".into())));

        let err = Configurator::new(&ledger)
            .configure_token("0xabc", "0x1", "0x2", "0x3", &token_params())
            .await
            .unwrap_err();
        assert!(matches!(err, DeployError::Rpc(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn empty_package_id_still_submits_and_fails_downstream() {
        // Scenario C: a failed publish hands an empty package id through;
        // there is no precondition guard, the ledger gets to reject it.
        let ledger = MockLedger::new();
        ledger.script_submit(Err(DeployError::Submission("unknown package".into())));

        let err = Configurator::new(&ledger)
            .configure_token("", "", "", "", &token_params())
            .await
            .unwrap_err();

        assert!(matches!(err, DeployError::Submission(_)));
        let submissions = ledger.submissions();
        assert_eq!(submissions.len(), 1);
        let Operation::MoveCall { entry, .. } = &submissions[0].operations[0] else {
            panic!("expected a move call");
        };
        assert_eq!(entry.target(), "::spoke_token::configure");
    }

    #[tokio::test(start_paused = true)]
    async fn finality_timeout_propagates_for_configure() {
        let ledger = MockLedger::new();
        ledger.script_submit(Ok(success("Dig2", vec![])));
        // No effects scripted: the waiter exhausts its attempts.

        let err = Configurator::new(&ledger)
            .configure_manager("0xabc", "0x1", "0x2", &manager_params())
            .await
            .unwrap_err();
        assert!(matches!(err, DeployError::FinalityTimeout { .. }));
    }
}

mod pipeline_tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn publish_then_configure_threads_roles() {
        let ledger = MockLedger::new();
        ledger.script_submit(Ok(success("Dig1", token_publish_changes())));
        ledger.script_effects(Ok(success("Dig1", token_publish_changes())));
        ledger.script_submit(Ok(success("Dig2", vec![])));
        ledger.script_effects(Ok(success(
            "Dig2",
            vec![ObjectChange::created("0xabc::spoke_token::Config", "0xc0")],
        )));

        let mut role_map = RoleMap::new();
        let reports = Pipeline::new()
            .step(PublishStep::new(
                Publisher::new(&ledger),
                artifact(),
                "0xme",
                token_roles(),
            ))
            .step(ConfigureTokenStep::new(
                Configurator::new(&ledger),
                token_params(),
            ))
            .run(&mut role_map)
            .await
            .unwrap();

        assert_eq!(reports.len(), 2);
        assert_eq!(role_map.get(roles::PACKAGE_ID), Some("0xabc"));
        assert_eq!(role_map.get(roles::CONFIGURATION_HANDLE), Some("0xc0"));

        // The configure call picked up the ids the publish produced.
        let submissions = ledger.submissions();
        let Operation::MoveCall { arguments, .. } = &submissions[1].operations[0] else {
            panic!("expected a move call");
        };
        assert_eq!(arguments[0], CallArg::Object("0x1".into()));
        assert_eq!(arguments[7], CallArg::Object("0x3".into()));
    }

    #[tokio::test(start_paused = true)]
    async fn unsatisfied_need_fails_before_any_submission() {
        let ledger = MockLedger::new();

        let mut role_map = RoleMap::new();
        let err = Pipeline::new()
            .step(ConfigureTokenStep::new(
                Configurator::new(&ledger),
                token_params(),
            ))
            .run(&mut role_map)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DeployError::MissingRole { step, role }
                if step == "configure-token" && role == roles::PACKAGE_ID
        ));
        assert!(ledger.submissions().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn chained_manager_step_uses_manager_capability_pair() {
        let mut changes = token_publish_changes();
        changes.push(ObjectChange::created("0xabc::spoke_manager::AdminCap", "0x4"));
        changes.push(ObjectChange::created(
            "0xabc::spoke_manager::WitnessCarrier",
            "0x5",
        ));

        let ledger = MockLedger::new();
        ledger.script_submit(Ok(success("Dig1", changes.clone())));
        ledger.script_effects(Ok(success("Dig1", changes)));
        // token configure
        ledger.script_submit(Ok(success("Dig2", vec![])));
        ledger.script_effects(Ok(success(
            "Dig2",
            vec![ObjectChange::created("0xabc::spoke_token::Config", "0xc0")],
        )));
        // manager configure
        ledger.script_submit(Ok(success("Dig3", vec![])));
        ledger.script_effects(Ok(success(
            "Dig3",
            vec![ObjectChange::created("0xabc::spoke_manager::Config", "0xc1")],
        )));

        let mut role_map = RoleMap::new();
        Pipeline::new()
            .step(PublishStep::new(
                Publisher::new(&ledger),
                artifact(),
                "0xme",
                chained_roles(),
            ))
            .step(ConfigureTokenStep::new(
                Configurator::new(&ledger),
                token_params(),
            ))
            .step(ConfigureManagerStep::chained(
                Configurator::new(&ledger),
                manager_params(),
            ))
            .run(&mut role_map)
            .await
            .unwrap();

        let submissions = ledger.submissions();
        assert_eq!(submissions.len(), 3);
        let Operation::MoveCall { entry, arguments } = &submissions[2].operations[0] else {
            panic!("expected a move call");
        };
        assert_eq!(entry.target(), "0xabc::spoke_manager::configure");
        // Manager-side capability pair, not the token's, and no allow-lists.
        assert_eq!(arguments.len(), 6);
        assert_eq!(arguments[0], CallArg::Object("0x4".into()));
        assert_eq!(arguments[3], CallArg::Object("0x5".into()));
    }

    #[tokio::test(start_paused = true)]
    async fn manager_only_deployment_uses_default_roles() {
        let changes = vec![
            ObjectChange::published("0x0def"),
            ObjectChange::created("0xdef::spoke_manager::AdminCap", "0x7"),
            ObjectChange::created("0xdef::spoke_manager::WitnessCarrier", "0x8"),
        ];
        let ledger = MockLedger::new();
        ledger.script_submit(Ok(success("Dig1", changes.clone())));
        ledger.script_effects(Ok(success("Dig1", changes)));
        ledger.script_submit(Ok(success("Dig2", vec![])));
        ledger.script_effects(Ok(success(
            "Dig2",
            vec![ObjectChange::created("0xdef::spoke_manager::Config", "0xc2")],
        )));

        let mut role_map = RoleMap::new();
        Pipeline::new()
            .step(PublishStep::new(
                Publisher::new(&ledger),
                artifact(),
                "0xme",
                manager_roles(),
            ))
            .step(ConfigureManagerStep::new(
                Configurator::new(&ledger),
                manager_params(),
            ))
            .run(&mut role_map)
            .await
            .unwrap();

        assert_eq!(role_map.get(roles::CONFIGURATION_HANDLE), Some("0xc2"));
    }
}

mod mint_tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn mint_builds_the_fixed_three_argument_call() {
        let ledger = MockLedger::new();
        ledger.script_submit(Ok(success("Dig9", vec![])));

        let digest = mint(&ledger, "0xabc", "0x3", 100, "0xme").await.unwrap();
        assert_eq!(digest, "Dig9");

        let submissions = ledger.submissions();
        let Operation::MoveCall { entry, arguments } = &submissions[0].operations[0] else {
            panic!("expected a move call");
        };
        assert_eq!(entry.target(), "0xabc::test_coin::mint");
        assert_eq!(
            arguments,
            &vec![
                CallArg::Object("0x3".into()),
                CallArg::U64(100),
                CallArg::Address("0xme".into()),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn mint_propagates_submission_failure() {
        let ledger = MockLedger::new();
        let err = mint(&ledger, "0xabc", "0x3", 100, "0xme").await.unwrap_err();
        assert!(matches!(err, DeployError::Rpc(_)));
    }
}
