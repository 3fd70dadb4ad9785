//! Bounded-retry execution state machine with automatic circuit breaking.

use alloy::primitives::Bytes;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::automation::AutomationState;
use crate::config::consts::{EXEC_COOLDOWN_SECS, EXEC_MAX_ATTEMPTS, EXEC_PAUSE_POLL_SECS};
use crate::decode::DecodedPayload;
use crate::executor::submitter::{aggregate_signatures, SafeSubmitter, SubmitResult};
use crate::executor::{ExecutionOutcome, SkipReason};
use crate::notifier::Notifier;
use crate::safe::types::MultisigTransaction;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Total submission attempts for one nonce.
    pub max_attempts: u32,
    /// Cooldown between attempts.
    pub cooldown: Duration,
    /// The cooldown polls the pause flag at this interval.
    pub pause_poll: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_attempts: EXEC_MAX_ATTEMPTS,
            cooldown: Duration::from_secs(EXEC_COOLDOWN_SECS),
            pause_poll: Duration::from_secs(EXEC_PAUSE_POLL_SECS),
        }
    }
}

/// Drives one transaction through submission, receipt wait, bounded retries,
/// and the circuit breaker.
pub struct ExecutionEngine {
    submitter: Arc<dyn SafeSubmitter>,
    automation: Arc<AutomationState>,
    notifier: Arc<dyn Notifier>,
    config: EngineConfig,
    /// Serializes submissions process-wide so the periodic tick and a manual
    /// command can never race the same nonce.
    tx_lock: Mutex<()>,
}

impl ExecutionEngine {
    pub fn new(
        submitter: Arc<dyn SafeSubmitter>,
        automation: Arc<AutomationState>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            submitter,
            automation,
            notifier,
            config: EngineConfig::default(),
            tx_lock: Mutex::new(()),
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Submit a validated transaction, retrying reverts up to the attempt
    /// limit. A network-level failure and a mined-but-unsuccessful receipt
    /// are treated identically. After the final consecutive revert the
    /// automation pause flag is set and an operator alert goes out.
    pub async fn execute_with_retries(
        &self,
        tx: &MultisigTransaction,
        payload: Option<&DecodedPayload>,
    ) -> ExecutionOutcome {
        let signatures = match aggregate_signatures(&tx.confirmations) {
            Ok(s) => s,
            Err(e) => {
                warn!(nonce = tx.nonce, error = %e, "No usable signatures, not submitting");
                return ExecutionOutcome::NotSubmitted {
                    reason: SkipReason::NoSignatureBytes,
                };
            }
        };

        let _guard = self.tx_lock.lock().await;

        for attempt in 1..=self.config.max_attempts {
            if attempt > 1 && !self.cooldown_respecting_pause().await {
                info!(
                    nonce = tx.nonce,
                    "Pause requested during cooldown, halting before resubmission"
                );
                return ExecutionOutcome::NotSubmitted {
                    reason: SkipReason::PauseRequested,
                };
            }

            match self.submitter.submit(tx, Bytes::clone(&signatures)).await {
                Ok(SubmitResult::Confirmed { tx_hash }) => {
                    let message = match payload {
                        Some(p) => format!(
                            "Executed transaction nonce {}: validator {}, {:.1} tokens. Tx hash: {tx_hash}",
                            tx.nonce, p.validator_id, p.amount_tokens
                        ),
                        None => format!(
                            "Executed transaction nonce {} (no decodable payload). Tx hash: {tx_hash}",
                            tx.nonce
                        ),
                    };
                    info!(nonce = tx.nonce, tx_hash = ?tx_hash, attempt, "Transaction executed");
                    self.notifier.broadcast(&message).await;
                    return ExecutionOutcome::Confirmed { tx_hash };
                }
                Ok(SubmitResult::Reverted) => {
                    warn!(nonce = tx.nonce, attempt, "Transaction reverted");
                }
                Err(e) => {
                    warn!(nonce = tx.nonce, attempt, error = %e, "Submission attempt failed");
                }
            }

            if attempt < self.config.max_attempts {
                self.notifier
                    .broadcast(&format!(
                        "Transaction reverted (attempt {attempt}/{}) for nonce {}. Retrying in {} seconds.",
                        self.config.max_attempts,
                        tx.nonce,
                        self.config.cooldown.as_secs()
                    ))
                    .await;
            }
        }

        // Circuit breaker: repeated consecutive reverts halt automation until
        // an operator investigates and resumes.
        self.automation.set_paused(true);
        error!(
            nonce = tx.nonce,
            attempts = self.config.max_attempts,
            "Consecutive reverts exhausted, automation paused"
        );
        self.notifier
            .broadcast(&format!(
                "Transaction reverted {} consecutive times for nonce {}. Automation is now paused pending operator review.",
                self.config.max_attempts, tx.nonce
            ))
            .await;
        ExecutionOutcome::Reverted
    }

    /// Wait out the cooldown, polling the pause flag. Returns false when a
    /// pause request should abort the next attempt.
    async fn cooldown_respecting_pause(&self) -> bool {
        let mut remaining = self.config.cooldown;
        while remaining > Duration::ZERO {
            if self.automation.paused() {
                return false;
            }
            let step = remaining.min(self.config.pause_poll);
            tokio::time::sleep(step).await;
            remaining -= step;
        }
        !self.automation.paused()
    }
}
