//! Deposit watching: checkpointed live probes plus chunked historical scans.

pub mod api;
pub mod chunker;
pub mod classifier;
pub mod types;

pub use types::{Deposit, RawLogEvent};

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{info, warn};

use crate::checkpoint::CheckpointStore;
use crate::config::consts::FLAG_THRESHOLD_TOKENS;
use crate::scanner::api::IndexerClient;
use crate::scanner::chunker::{scan_range, ChunkerConfig};
use crate::scanner::classifier::classify_logs;

/// Result of one live deposit probe.
#[derive(Debug)]
pub struct ProbeOutcome {
    pub alert_triggered: bool,
    pub message: String,
    /// Start block actually used, when range resolution succeeded.
    pub start_block: Option<u64>,
    /// Newly persisted checkpoint; `None` when the scan aborted and the
    /// stored checkpoint was left untouched.
    pub new_checkpoint: Option<u64>,
}

impl ProbeOutcome {
    fn aborted(message: &str, start_block: Option<u64>) -> Self {
        Self {
            alert_triggered: false,
            message: message.to_string(),
            start_block,
            new_checkpoint: None,
        }
    }
}

/// Watches the deposit contract through the block-indexing API.
pub struct DepositMonitor {
    api: IndexerClient,
    checkpoint: CheckpointStore,
    chunker: ChunkerConfig,
    lookback_secs: u64,
}

impl DepositMonitor {
    pub fn new(
        api: IndexerClient,
        checkpoint: CheckpointStore,
        chunker: ChunkerConfig,
        lookback_secs: u64,
    ) -> Self {
        Self {
            api,
            checkpoint,
            chunker,
            lookback_secs,
        }
    }

    /// Live probe for large deposits.
    ///
    /// Scans from `start_block`, or from checkpoint+1, or from the lookback
    /// window when neither exists. One unchunked range query — live windows
    /// are small. The checkpoint is persisted regardless of the alert
    /// outcome; on any failure it is left untouched so the next tick retries
    /// the same range.
    pub async fn probe(&self, start_block: Option<u64>) -> ProbeOutcome {
        let start = match start_block.or_else(|| self.checkpoint.load().map(|b| b + 1)) {
            Some(s) => s,
            None => match self.resolve_window_start(self.lookback_secs).await {
                Ok(s) => s,
                Err(e) => {
                    warn!(error = %e, "Deposit probe could not resolve start block");
                    return ProbeOutcome::aborted("Error: could not resolve scan start block.", None);
                }
            },
        };

        let head = match self.api.head_block().await {
            Ok(h) => h,
            Err(e) => {
                warn!(error = %e, "Deposit probe could not fetch chain head");
                return ProbeOutcome::aborted(
                    "Error: could not fetch latest block.",
                    Some(start),
                );
            }
        };

        info!(from = start, to = head, "Scanning for large deposits");

        let logs = match self.api.logs(start, head).await {
            Ok(l) => l,
            Err(e) => {
                warn!(error = %e, "Deposit probe could not fetch logs");
                return ProbeOutcome::aborted("Error: could not fetch deposit logs.", Some(start));
            }
        };

        let result = classify_logs(&logs);
        // Quiet windows still advance to the resolved head: forward progress
        // is guaranteed even when nothing matched.
        let new_checkpoint = result.max_block.unwrap_or(head);
        self.checkpoint.save(new_checkpoint);

        let (alert_triggered, message) = if result.alerts.is_empty() {
            (
                false,
                format!(
                    "No deposits over {FLAG_THRESHOLD_TOKENS} tokens were found between blocks {start} and {new_checkpoint}."
                ),
            )
        } else {
            let mut lines: Vec<String> = result.alerts.iter().map(alert_line).collect();
            lines.push("Automated execution is paused pending operator review.".to_string());
            (true, lines.join("\n\n"))
        };

        ProbeOutcome {
            alert_triggered,
            message,
            start_block: Some(start),
            new_checkpoint: Some(new_checkpoint),
        }
    }

    /// Historical large-deposit scan over a past-hours window. Walks the
    /// range in adaptive chunks; a walk that stops at the chunk-size floor is
    /// reported as a total failure. Never touches the checkpoint and never
    /// pauses automation.
    pub async fn scan_historical(&self, hours: f64) -> (bool, String) {
        let window_secs = (hours * 3600.0) as u64;
        let start = match self.resolve_window_start(window_secs).await {
            Ok(s) => s,
            Err(e) => {
                warn!(error = %e, "Historical scan could not resolve start block");
                return (false, "Error: could not resolve scan start block.".to_string());
            }
        };
        let head = match self.api.head_block().await {
            Ok(h) => h,
            Err(e) => {
                warn!(error = %e, "Historical scan could not fetch chain head");
                return (false, "Error: could not fetch latest block.".to_string());
            }
        };

        let scan = scan_range(&self.chunker, start, head, |from, to| {
            self.api.logs(from, to)
        })
        .await;
        if !scan.complete {
            return (
                false,
                "Error: network failures prevented retrieving historical deposits.".to_string(),
            );
        }

        let result = classify_logs(&scan.logs);
        if result.alerts.is_empty() {
            (
                false,
                format!(
                    "No large deposits (>= {FLAG_THRESHOLD_TOKENS} tokens) were found in the last {hours} hours."
                ),
            )
        } else {
            info!(count = result.alerts.len(), hours, "Found large historical deposits");
            let lines: Vec<String> = result.alerts.iter().map(alert_line).collect();
            (true, lines.join("\n\n"))
        }
    }

    /// Every deposit in a past-hours window, for export. A walk that stops at
    /// the chunk-size floor returns the partial results collected so far.
    pub async fn list_deposits(&self, hours: f64) -> Result<Vec<Deposit>> {
        let window_secs = (hours * 3600.0) as u64;
        let start = self
            .resolve_window_start(window_secs)
            .await
            .context("Could not resolve export start block")?;
        let head = self
            .api
            .head_block()
            .await
            .context("Could not fetch latest block")?;

        let scan = scan_range(&self.chunker, start, head, |from, to| {
            self.api.logs(from, to)
        })
        .await;
        if !scan.complete {
            warn!(
                collected = scan.logs.len(),
                "Deposit export stopped early, returning partial results"
            );
        }

        Ok(classify_logs(&scan.logs).deposits)
    }

    async fn resolve_window_start(&self, window_secs: u64) -> Result<u64> {
        let cutoff = (Utc::now().timestamp() as u64).saturating_sub(window_secs);
        self.api.block_by_time(cutoff).await
    }
}

fn alert_line(deposit: &Deposit) -> String {
    format!(
        "ALERT: {:.2} token deposit by {} in tx {} (alert threshold {FLAG_THRESHOLD_TOKENS} tokens).",
        deposit.amount_tokens, deposit.sender, deposit.tx_hash
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::RetryConfig;
    use httpmock::prelude::*;
    use serde_json::json;
    use std::path::PathBuf;
    use std::time::Duration;

    const TOPIC: &str = "0x73a19dd210f1a7f902193214c0ee91dd35ee5b4d920cba8d519eca65a7b488ca";

    fn monitor(server: &MockServer, checkpoint_name: &str) -> (DepositMonitor, PathBuf) {
        let path = std::env::temp_dir().join(checkpoint_name);
        let _ = std::fs::remove_file(&path);
        let api = IndexerClient::new(
            server.url("/api"),
            "key".to_string(),
            "0xE5DA20F15420aD15DE0fa650600aFc998bbE3955"
                .parse()
                .unwrap(),
            TOPIC.to_string(),
        )
        .unwrap()
        .with_retry(RetryConfig {
            max_attempts: 1,
            delay: Duration::ZERO,
            backoff_multiplier: 1.0,
            max_delay: Duration::ZERO,
            courtesy_delay: false,
        });
        let chunker = ChunkerConfig {
            retry_backoff: Duration::ZERO,
            ..ChunkerConfig::default()
        };
        (
            DepositMonitor::new(api, CheckpointStore::new(&path), chunker, 3900),
            path,
        )
    }

    async fn mock_head(server: &MockServer, head: u64) {
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/api")
                    .query_param("action", "eth_blockNumber");
                then.status(200)
                    .json_body(json!({"result": format!("{:#x}", head)}));
            })
            .await;
    }

    fn deposit_json(block: u64, amount_wei: u128) -> serde_json::Value {
        json!({
            "transactionHash": format!("0xtx{block}"),
            "topics": [TOPIC, "0x00000000000000000000000069503b52764138e906c883ed6ef4cac939eb998c"],
            "data": format!("0x{:064x}", amount_wei),
            "blockNumber": format!("{:#x}", block)
        })
    }

    #[tokio::test]
    async fn test_probe_quiet_window_advances_to_head() {
        let server = MockServer::start_async().await;
        mock_head(&server, 5000).await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api").query_param("module", "logs");
                then.status(200).json_body(json!({"result": []}));
            })
            .await;

        let (monitor, path) = monitor(&server, "probe_quiet.json");
        let outcome = monitor.probe(Some(4000)).await;

        assert!(!outcome.alert_triggered);
        assert_eq!(outcome.start_block, Some(4000));
        assert_eq!(outcome.new_checkpoint, Some(5000));
        assert_eq!(CheckpointStore::new(&path).load(), Some(5000));
        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn test_probe_alert_and_checkpoint_from_logs() {
        let server = MockServer::start_async().await;
        mock_head(&server, 5000).await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api").query_param("module", "logs");
                then.status(200).json_body(json!({
                    "result": [deposit_json(4500, 200_000 * 10u128.pow(18))]
                }));
            })
            .await;

        let (monitor, path) = monitor(&server, "probe_alert.json");
        let outcome = monitor.probe(Some(4000)).await;

        assert!(outcome.alert_triggered);
        assert!(outcome.message.contains("ALERT"));
        // Deposits found: checkpoint comes from the logs, not the head.
        assert_eq!(outcome.new_checkpoint, Some(4500));
        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn test_probe_failure_leaves_checkpoint_untouched() {
        let server = MockServer::start_async().await;
        let (monitor, path) = monitor(&server, "probe_fail.json");
        CheckpointStore::new(&path).save(1234);

        // Head endpoint fails outright.
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api");
                then.status(500);
            })
            .await;

        let outcome = monitor.probe(None).await;
        assert!(!outcome.alert_triggered);
        assert_eq!(outcome.new_checkpoint, None);
        assert!(outcome.message.starts_with("Error:"));
        assert_eq!(CheckpointStore::new(&path).load(), Some(1234));
        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn test_probe_starts_from_checkpoint_plus_one() {
        let server = MockServer::start_async().await;
        mock_head(&server, 5000).await;
        let logs_mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/api")
                    .query_param("module", "logs")
                    .query_param("fromBlock", "1235");
                then.status(200).json_body(json!({"result": []}));
            })
            .await;

        let (monitor, path) = monitor(&server, "probe_resume.json");
        CheckpointStore::new(&path).save(1234);

        let outcome = monitor.probe(None).await;
        assert_eq!(outcome.start_block, Some(1235));
        logs_mock.assert_async().await;
        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn test_historical_scan_reports_large_deposits() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/api")
                    .query_param("action", "getblocknobytime");
                then.status(200).json_body(json!({"result": "100"}));
            })
            .await;
        mock_head(&server, 200).await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api").query_param("module", "logs");
                then.status(200).json_body(json!({
                    "result": [
                        deposit_json(150, 5 * 10u128.pow(18)),
                        deposit_json(160, 150_000 * 10u128.pow(18)),
                    ]
                }));
            })
            .await;

        let (monitor, path) = monitor(&server, "hist_scan.json");
        let (found, message) = monitor.scan_historical(24.0).await;

        assert!(found);
        assert!(message.contains("150000.00"));
        // Historical scans never write the checkpoint.
        assert_eq!(CheckpointStore::new(&path).load(), None);
        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn test_list_deposits_returns_all_sizes() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/api")
                    .query_param("action", "getblocknobytime");
                then.status(200).json_body(json!({"result": "100"}));
            })
            .await;
        mock_head(&server, 200).await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api").query_param("module", "logs");
                then.status(200).json_body(json!({
                    "result": [
                        deposit_json(150, 5 * 10u128.pow(18)),
                        deposit_json(160, 150_000 * 10u128.pow(18)),
                    ]
                }));
            })
            .await;

        let (monitor, path) = monitor(&server, "list_deposits.json");
        let deposits = monitor.list_deposits(24.0).await.unwrap();
        assert_eq!(deposits.len(), 2);
        assert_eq!(deposits[0].amount_tokens, 5.0);
        let _ = std::fs::remove_file(path);
    }
}
