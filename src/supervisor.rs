//! The recurring scheduler tick: probe deposits, survey the queue, attempt
//! execution, and finalize the once-daily summary.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::decode::{decode_payload, DecodedPayload, SelectorTable};
use crate::executor::{ExecutionOutcome, GateVariant};
use crate::notifier::Notifier;
use crate::safe::MultisigTransaction;
use crate::service::KeeperService;

pub struct Scheduler {
    service: Arc<KeeperService>,
    notifier: Arc<dyn Notifier>,
    tick_interval: Duration,
    daily_report_hour: u32,
    shutdown: CancellationToken,
}

impl Scheduler {
    pub fn new(
        service: Arc<KeeperService>,
        notifier: Arc<dyn Notifier>,
        tick_interval: Duration,
        daily_report_hour: u32,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            service,
            notifier,
            tick_interval,
            daily_report_hour,
            shutdown,
        }
    }

    /// Run the recurring tick until shutdown. Tick failures are reported and
    /// swallowed; the loop never dies.
    pub async fn run(self) {
        let mut ticker = interval(self.tick_interval);
        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    info!("Scheduler stopped");
                    break;
                }
                _ = ticker.tick() => {
                    self.tick().await;
                }
            }
        }
    }

    /// One full recheck cycle.
    pub async fn tick(&self) {
        info!("Performing periodic recheck");
        self.notifier
            .broadcast("Performing periodic recheck of deposits and transactions...")
            .await;

        let summary = match self.run_tick_body().await {
            Ok(summary) => Some(summary),
            Err(e) => {
                error!(error = %e, "Periodic recheck failed");
                self.notifier
                    .broadcast(&format!("Error during periodic recheck: {e}"))
                    .await;
                None
            }
        };

        // The daily-report anchor runs unconditionally, even when the tick
        // body failed partway through.
        if self
            .service
            .automation()
            .note_daily_report(Utc::now(), self.daily_report_hour)
        {
            match summary {
                Some(summary) => self.notifier.broadcast(&summary).await,
                None => {
                    self.notifier
                        .broadcast("Daily report failed to build; check logs.")
                        .await
                }
            }
        }
    }

    async fn run_tick_body(&self) -> anyhow::Result<String> {
        let automation = self.service.automation().clone();

        // Checkpoint advancement always precedes execution attempts.
        let probe = self.service.probe(None).await;
        if probe.alert_triggered {
            self.notifier.broadcast(&probe.message).await;
            if automation.paused() {
                info!("Large deposit detected while automation was already paused");
            } else {
                automation.set_paused(true);
                info!("Deposit alert paused automation");
            }
        }

        let balance = match self.service.staking_balance().await {
            Ok(b) => b,
            Err(e) => {
                warn!(error = %e, "Could not fetch staking balance for recheck");
                0.0
            }
        };

        let pending = match self.service.pending_queue().await {
            Ok(pending) => pending,
            Err(e) => {
                warn!(error = %e, "Coordination feed unavailable during recheck");
                self.notifier
                    .broadcast(
                        "Coordination service is unavailable or returned no transactions; skipping queue checks this tick.",
                    )
                    .await;
                Vec::new()
            }
        };

        for tx in &pending {
            let payload = tx.data.as_deref().and_then(decode_payload);
            info!(
                nonce = tx.nonce,
                status = %queue_status(tx, payload.as_ref(), balance),
                signatures = tx.signature_count(),
                required = tx.confirmations_required,
                "Pending transaction"
            );
        }

        let mut summary = compose_tick_summary(balance, &pending, self.service.selectors());

        if automation.paused() {
            info!("Execution is paused; recheck continues without executing");
            summary.push_str(
                "\nNote: automated transaction execution is currently paused. Rechecks and reports will continue.",
            );
        } else if !pending.is_empty() {
            match self.service.attempt_execution(GateVariant::Standard).await {
                ExecutionOutcome::Confirmed { .. } | ExecutionOutcome::Reverted => {
                    // The engine already broadcast the outcome.
                }
                ExecutionOutcome::NotSubmitted { reason } => {
                    info!(reason = %reason, "Tick execution skipped");
                }
            }
        }

        Ok(summary)
    }
}

/// Status line for one pending transaction, mirroring the execution gate's
/// standard checks.
fn queue_status(
    tx: &MultisigTransaction,
    payload: Option<&DecodedPayload>,
    balance_tokens: f64,
) -> String {
    let Some(payload) = payload else {
        return "No Data".to_string();
    };
    let have = tx.signature_count();
    let need = tx.confirmations_required;
    if have < need as usize {
        format!("Signatures Needed {have}/{need}")
    } else if balance_tokens >= payload.amount_tokens {
        "Ready to Execute".to_string()
    } else {
        "Insufficient Balance".to_string()
    }
}

/// Terse status summary for the recheck broadcast and the daily report.
fn compose_tick_summary(
    balance_tokens: f64,
    pending: &[MultisigTransaction],
    selectors: &SelectorTable,
) -> String {
    let mut lines = vec![
        "### Periodic Recheck Report ###".to_string(),
        format!("Staking contract balance: {balance_tokens:.1} tokens"),
    ];

    if pending.is_empty() {
        lines.push("No pending transactions found during this recheck.".to_string());
        return lines.join("\n");
    }

    lines.push("Pending transactions:".to_string());
    let mut total_pending = 0.0;
    for tx in pending {
        let payload = tx.data.as_deref().and_then(decode_payload);
        let function = selectors.function_name(tx.data.as_deref());
        let (validator, amount) = match &payload {
            Some(p) => (p.validator_id.clone(), p.amount_tokens),
            None => ("N/A".to_string(), 0.0),
        };
        total_pending += amount;
        lines.push(format!(
            "- nonce {} [{}] validator {} amount {:.1} | {} | signatures {}/{}",
            tx.nonce,
            function,
            validator,
            amount,
            queue_status(tx, payload.as_ref(), balance_tokens),
            tx.signature_count(),
            tx.confirmations_required,
        ));
    }

    lines.push(format!(
        "Staking headroom (pending total - balance): {:.1} tokens",
        total_pending - balance_tokens
    ));

    lines.join("\n")
}
