//! The collaborator surface exposed to the scheduler and to whatever
//! command/presentation layer is attached.

use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};

use crate::automation::AutomationState;
use crate::chain::BalanceClient;
use crate::decode::{decode_payload, SelectorTable};
use crate::executor::{gate, ExecutionEngine, ExecutionOutcome, GateVariant, SkipReason};
use crate::safe::{normalize_queue, MultisigTransaction, SafeQueueClient};
use crate::scanner::{Deposit, DepositMonitor, ProbeOutcome};

pub struct KeeperService {
    monitor: DepositMonitor,
    queue: SafeQueueClient,
    balances: BalanceClient,
    engine: ExecutionEngine,
    automation: Arc<AutomationState>,
    selectors: SelectorTable,
}

impl KeeperService {
    pub fn new(
        monitor: DepositMonitor,
        queue: SafeQueueClient,
        balances: BalanceClient,
        engine: ExecutionEngine,
        automation: Arc<AutomationState>,
        selectors: SelectorTable,
    ) -> Self {
        Self {
            monitor,
            queue,
            balances,
            engine,
            automation,
            selectors,
        }
    }

    pub fn automation(&self) -> &Arc<AutomationState> {
        &self.automation
    }

    pub fn selectors(&self) -> &SelectorTable {
        &self.selectors
    }

    /// Live deposit probe (see [`DepositMonitor::probe`]).
    pub async fn probe(&self, start_block: Option<u64>) -> ProbeOutcome {
        self.monitor.probe(start_block).await
    }

    /// Historical large-deposit scan over a past-hours window.
    pub async fn scan_historical(&self, hours: f64) -> (bool, String) {
        self.monitor.scan_historical(hours).await
    }

    /// Every deposit in a past-hours window, for export.
    pub async fn list_deposits(&self, hours: f64) -> Result<Vec<Deposit>> {
        self.monitor.list_deposits(hours).await
    }

    /// Current staking contract balance in whole tokens.
    pub async fn staking_balance(&self) -> Result<f64> {
        self.balances.staking_balance_tokens().await
    }

    /// Fetch the coordination feed and normalize it into the pending queue.
    pub async fn pending_queue(&self) -> Result<Vec<MultisigTransaction>> {
        let raw = self.queue.recent_transactions().await?;
        Ok(normalize_queue(raw))
    }

    /// Gate and execute the lowest-nonce pending transaction.
    pub async fn attempt_execution(&self, variant: GateVariant) -> ExecutionOutcome {
        let pending = match self.pending_queue().await {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "Could not fetch pending queue for execution");
                return ExecutionOutcome::NotSubmitted {
                    reason: SkipReason::QueueUnavailable,
                };
            }
        };
        let Some(lowest) = pending.first() else {
            return ExecutionOutcome::NotSubmitted {
                reason: SkipReason::NoPendingTransactions,
            };
        };
        self.execute_candidate(lowest, variant).await
    }

    /// Gate and execute a specific pending nonce. Nonces execute strictly in
    /// order on-chain, so anything above the current lowest will revert; the
    /// mismatch is logged and left to the gate-and-retry machinery.
    pub async fn execute_by_nonce(&self, nonce: u64, variant: GateVariant) -> ExecutionOutcome {
        let pending = match self.pending_queue().await {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "Could not fetch pending queue for execution");
                return ExecutionOutcome::NotSubmitted {
                    reason: SkipReason::QueueUnavailable,
                };
            }
        };
        let Some(tx) = pending.iter().find(|tx| tx.nonce == nonce) else {
            return ExecutionOutcome::NotSubmitted {
                reason: SkipReason::NonceNotFound { nonce },
            };
        };
        if pending.first().map(|t| t.nonce) != Some(nonce) {
            warn!(
                nonce,
                lowest = pending.first().map(|t| t.nonce),
                "Requested nonce is not the lowest pending; a stuck low nonce blocks it"
            );
        }
        self.execute_candidate(tx, variant).await
    }

    async fn execute_candidate(
        &self,
        tx: &MultisigTransaction,
        variant: GateVariant,
    ) -> ExecutionOutcome {
        let balance = match self.balances.staking_balance_tokens().await {
            Ok(b) => b,
            Err(e) => {
                warn!(error = %e, "Could not fetch staking balance, treating as zero");
                0.0
            }
        };
        let payload = tx.data.as_deref().and_then(decode_payload);

        if let Err(rejection) =
            gate::evaluate(variant, tx, payload.as_ref(), balance, self.automation.paused())
        {
            info!(nonce = tx.nonce, rejection = %rejection, "Execution gate rejected transaction");
            return ExecutionOutcome::NotSubmitted {
                reason: rejection.into(),
            };
        }

        // Refetch by nonce so the submission uses the freshest record (more
        // signatures may have landed since the queue fetch).
        let fresh = match self.queue.transaction_by_nonce(tx.nonce).await {
            Ok(Some(fresh)) => fresh,
            Ok(None) => {
                warn!(nonce = tx.nonce, "Transaction disappeared from the feed");
                return ExecutionOutcome::NotSubmitted {
                    reason: SkipReason::NonceNotFound { nonce: tx.nonce },
                };
            }
            Err(e) => {
                warn!(error = %e, "Could not refetch transaction for submission");
                return ExecutionOutcome::NotSubmitted {
                    reason: SkipReason::QueueUnavailable,
                };
            }
        };

        self.engine.execute_with_retries(&fresh, payload.as_ref()).await
    }
}
