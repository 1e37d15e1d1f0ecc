//! Finality waiter: poll the effects endpoint with exponential backoff
//! until the ledger returns a record carrying object changes.

use std::time::Duration;

use crate::client::{EffectsOptions, LedgerClient, TransactionResult};
use crate::error::DeployError;

/// Bounds for one wait: first delay, growth factor, attempt cap.
///
/// The defaults (1s start, doubling, 5 attempts) cover roughly the same
/// envelope as the fixed 10-second sleep they replace.
#[derive(Debug, Clone, Copy)]
pub struct WaitPolicy {
    pub initial_delay: Duration,
    pub backoff_factor: f64,
    pub max_attempts: u32,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            backoff_factor: 2.0,
            max_attempts: 5,
        }
    }
}

/// Poll `query_effects` for `digest` until a result with object changes
/// arrives, within the bounds of `policy`.
///
/// Transport errors and empty results both count as one attempt; only the
/// attempt cap ends the wait.
pub async fn await_effects(
    client: &dyn LedgerClient,
    digest: &str,
    policy: &WaitPolicy,
) -> Result<TransactionResult, DeployError> {
    let options = EffectsOptions::effects_and_changes();
    let mut delay = policy.initial_delay;

    for attempt in 1..=policy.max_attempts {
        tokio::time::sleep(delay).await;

        match client.query_effects(digest, &options).await {
            Ok(result) if !result.object_changes.is_empty() => {
                tracing::debug!(digest, attempt, "transaction effects available");
                return Ok(result);
            }
            Ok(_) => {
                tracing::debug!(digest, attempt, "effects not finalized yet");
            }
            Err(err) => {
                tracing::debug!(digest, attempt, error = %err, "effects query failed, will retry");
            }
        }

        delay = delay.mul_f64(policy.backoff_factor);
    }

    Err(DeployError::FinalityTimeout {
        digest: digest.to_string(),
        attempts: policy.max_attempts,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::changes::ObjectChange;
    use crate::client::ExecutionStatus;
    use crate::tx::TransactionIntent;

    /// Effects endpoint that yields misses before the real record.
    struct SlowLedger {
        misses_before_hit: Mutex<u32>,
        attempts_seen: Mutex<u32>,
    }

    impl SlowLedger {
        fn new(misses_before_hit: u32) -> Self {
            Self {
                misses_before_hit: Mutex::new(misses_before_hit),
                attempts_seen: Mutex::new(0),
            }
        }

        fn attempts(&self) -> u32 {
            *self.attempts_seen.lock().unwrap()
        }
    }

    #[async_trait]
    impl LedgerClient for SlowLedger {
        async fn submit(
            &self,
            _intent: &TransactionIntent,
        ) -> Result<TransactionResult, DeployError> {
            unreachable!("the waiter never submits");
        }

        async fn query_effects(
            &self,
            digest: &str,
            _options: &EffectsOptions,
        ) -> Result<TransactionResult, DeployError> {
            *self.attempts_seen.lock().unwrap() += 1;
            let mut misses = self.misses_before_hit.lock().unwrap();
            if *misses > 0 {
                *misses -= 1;
                return Ok(TransactionResult {
                    digest: digest.to_string(),
                    status: ExecutionStatus::Success,
                    object_changes: vec![],
                });
            }
            Ok(TransactionResult {
                digest: digest.to_string(),
                status: ExecutionStatus::Success,
                object_changes: vec![ObjectChange::created("0xabc::m::Config", "0xc0")],
            })
        }

        fn signer_address(&self) -> &str {
            "0xtest"
        }
    }

    #[tokio::test(start_paused = true)]
    async fn returns_first_result_with_changes() {
        let ledger = SlowLedger::new(2);
        let result = await_effects(&ledger, "Dig", &WaitPolicy::default())
            .await
            .unwrap();
        assert_eq!(result.object_changes.len(), 1);
        assert_eq!(ledger.attempts(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_attempts_time_out() {
        let ledger = SlowLedger::new(u32::MAX);
        let policy = WaitPolicy {
            max_attempts: 3,
            ..WaitPolicy::default()
        };
        let err = await_effects(&ledger, "Dig", &policy).await.unwrap_err();
        match err {
            DeployError::FinalityTimeout { digest, attempts } => {
                assert_eq!(digest, "Dig");
                assert_eq!(attempts, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(ledger.attempts(), 3);
    }
}
