//! Queue normalization for the raw coordination feed.

use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::safe::types::MultisigTransaction;

/// Deduplicate and order the raw feed into the pending queue.
///
/// Rules:
/// - A nonce with ANY executed record is dropped entirely — the coordination
///   layer considers that slot consumed, whatever else was resubmitted.
/// - Among pending records sharing a nonce, the latest `submission_date`
///   wins; on an exact tie the first record in feed order is kept.
/// - Output is sorted ascending by nonce. That ordering is the execution
///   order: a stuck low nonce blocks all higher ones.
pub fn normalize_queue(raw: Vec<MultisigTransaction>) -> Vec<MultisigTransaction> {
    let mut executed_nonces: HashSet<u64> = HashSet::new();
    let mut latest: HashMap<u64, MultisigTransaction> = HashMap::new();

    for tx in raw {
        if tx.is_executed {
            executed_nonces.insert(tx.nonce);
            continue;
        }

        match latest.get(&tx.nonce) {
            Some(existing) if tx.submission_date <= existing.submission_date => {
                debug!(
                    nonce = tx.nonce,
                    submission_date = %tx.submission_date,
                    "Ignoring older pending record for nonce"
                );
            }
            _ => {
                latest.insert(tx.nonce, tx);
            }
        }
    }

    let mut pending: Vec<MultisigTransaction> = latest
        .into_values()
        .filter(|tx| !executed_nonces.contains(&tx.nonce))
        .collect();
    pending.sort_by_key(|tx| tx.nonce);
    pending
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn tx(nonce: u64, executed: bool, submitted: &str) -> MultisigTransaction {
        MultisigTransaction {
            nonce,
            to: "0x1111111111111111111111111111111111111111".to_string(),
            value: "0".to_string(),
            data: None,
            operation: 0,
            safe_tx_gas: 0,
            base_gas: 0,
            gas_price: "0".to_string(),
            gas_token: "0x0000000000000000000000000000000000000000".to_string(),
            refund_receiver: "0x0000000000000000000000000000000000000000".to_string(),
            confirmations: vec![],
            confirmations_required: 3,
            is_executed: executed,
            submission_date: submitted.parse::<DateTime<Utc>>().unwrap(),
        }
    }

    #[test]
    fn test_executed_nonce_is_dropped_entirely() {
        let raw = vec![
            tx(5, false, "2025-01-01T00:00:00Z"),
            tx(5, true, "2025-01-02T00:00:00Z"),
            tx(6, false, "2025-01-01T00:00:00Z"),
        ];
        let pending = normalize_queue(raw);
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].nonce, 6);
    }

    #[test]
    fn test_executed_drops_nonce_even_when_pending_is_newer() {
        let raw = vec![
            tx(5, true, "2025-01-01T00:00:00Z"),
            // Resubmitted after execution: still excluded.
            tx(5, false, "2025-01-03T00:00:00Z"),
        ];
        assert!(normalize_queue(raw).is_empty());
    }

    #[test]
    fn test_latest_submission_date_wins() {
        let raw = vec![
            tx(5, false, "2025-01-01T00:00:00Z"),
            tx(5, false, "2025-01-02T00:00:00Z"),
        ];
        let pending = normalize_queue(raw);
        assert_eq!(pending.len(), 1);
        assert_eq!(
            pending[0].submission_date,
            "2025-01-02T00:00:00Z".parse::<DateTime<Utc>>().unwrap()
        );

        // Same records, reversed feed order: the later date still wins.
        let raw = vec![
            tx(5, false, "2025-01-02T00:00:00Z"),
            tx(5, false, "2025-01-01T00:00:00Z"),
        ];
        let pending = normalize_queue(raw);
        assert_eq!(
            pending[0].submission_date,
            "2025-01-02T00:00:00Z".parse::<DateTime<Utc>>().unwrap()
        );
    }

    #[test]
    fn test_tie_keeps_first_in_feed_order() {
        let mut first = tx(5, false, "2025-01-01T00:00:00Z");
        first.to = "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa".to_string();
        let mut second = tx(5, false, "2025-01-01T00:00:00Z");
        second.to = "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb".to_string();

        let pending = normalize_queue(vec![first, second]);
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].to, "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa");
    }

    #[test]
    fn test_sorted_ascending_no_duplicates() {
        let raw = vec![
            tx(9, false, "2025-01-01T00:00:00Z"),
            tx(3, false, "2025-01-01T00:00:00Z"),
            tx(7, false, "2025-01-01T00:00:00Z"),
            tx(3, false, "2025-01-02T00:00:00Z"),
        ];
        let pending = normalize_queue(raw);
        let nonces: Vec<u64> = pending.iter().map(|tx| tx.nonce).collect();
        assert_eq!(nonces, vec![3, 7, 9]);
    }

    #[test]
    fn test_empty_feed() {
        assert!(normalize_queue(vec![]).is_empty());
    }
}
