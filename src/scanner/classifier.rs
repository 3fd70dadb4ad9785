//! Turns raw event logs into typed deposits and flags the large ones.

use alloy::primitives::U256;
use tracing::warn;

use crate::config::consts::FLAG_THRESHOLD_TOKENS;
use crate::scanner::types::{Deposit, RawLogEvent};

/// Alert threshold in wei. The comparison is done on the raw integer amount
/// so the inclusive boundary is exact.
pub fn flag_threshold_wei() -> U256 {
    U256::from(FLAG_THRESHOLD_TOKENS) * U256::from(10u64).pow(U256::from(18))
}

/// Whether a deposit meets the alert threshold (inclusive).
pub fn is_flagged(deposit: &Deposit) -> bool {
    deposit.amount_wei >= flag_threshold_wei()
}

/// Result of classifying one batch of raw logs.
#[derive(Debug, Default)]
pub struct Classification {
    /// Every decodable deposit, flagged or not.
    pub deposits: Vec<Deposit>,
    /// The subset at or above the alert threshold.
    pub alerts: Vec<Deposit>,
    /// Highest block number seen across ALL processed logs, including ones
    /// that failed to decode. Checkpoint candidate for the scan.
    pub max_block: Option<u64>,
}

/// Classify a batch of raw logs. Logs that do not carry the deposit shape
/// are skipped with a warning, but their block numbers still advance the
/// checkpoint candidate.
pub fn classify_logs(logs: &[RawLogEvent]) -> Classification {
    let mut result = Classification::default();

    for log in logs {
        result.max_block = Some(result.max_block.map_or(log.block_number, |m| {
            m.max(log.block_number)
        }));

        match Deposit::from_log(log) {
            Some(deposit) => {
                if is_flagged(&deposit) {
                    result.alerts.push(deposit.clone());
                }
                result.deposits.push(deposit);
            }
            None => {
                warn!(
                    tx_hash = %log.transaction_hash,
                    block = log.block_number,
                    "Skipping log without deposit shape"
                );
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    const SENDER: &str = "69503b52764138e906c883ed6ef4cac939eb998c";

    fn log(block: u64, amount_wei: u128) -> RawLogEvent {
        RawLogEvent {
            transaction_hash: format!("0xtx{block}"),
            topics: vec![
                "0xtopic0".to_string(),
                format!("0x{:0>64}", SENDER),
            ],
            data: format!("0x{:064x}", amount_wei),
            block_number: block,
        }
    }

    fn tokens(n: u64) -> u128 {
        n as u128 * 10u128.pow(18)
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let at_threshold = Deposit::from_log(&log(1, tokens(100_000))).unwrap();
        assert!(is_flagged(&at_threshold));

        // 99,999.99 tokens: below by 0.01
        let just_below = tokens(100_000) - 10u128.pow(16);
        let below = Deposit::from_log(&log(2, just_below)).unwrap();
        assert!(!is_flagged(&below));

        let above = Deposit::from_log(&log(3, tokens(100_001))).unwrap();
        assert!(is_flagged(&above));
    }

    #[test]
    fn test_classify_splits_alerts() {
        let logs = vec![log(10, tokens(50)), log(11, tokens(200_000)), log(12, tokens(1))];
        let result = classify_logs(&logs);

        assert_eq!(result.deposits.len(), 3);
        assert_eq!(result.alerts.len(), 1);
        assert_eq!(result.alerts[0].block_number, 11);
        assert_eq!(result.max_block, Some(12));
    }

    #[test]
    fn test_max_block_counts_undecodable_logs() {
        let bad = RawLogEvent {
            transaction_hash: "0xbad".to_string(),
            topics: vec![],
            data: "0x0".to_string(),
            block_number: 99,
        };
        let logs = vec![log(10, tokens(5)), bad];
        let result = classify_logs(&logs);

        assert_eq!(result.deposits.len(), 1);
        assert_eq!(result.max_block, Some(99));
    }

    #[test]
    fn test_empty_batch() {
        let result = classify_logs(&[]);
        assert!(result.deposits.is_empty());
        assert!(result.alerts.is_empty());
        assert_eq!(result.max_block, None);
    }
}
