//! Wire and domain types for the deposit scanner.

use alloy::primitives::{Address, U256};
use serde::{Deserialize, Deserializer};

use crate::decode::{strip_hex_prefix, tokens_from_wei};

/// One raw event log as returned by the block-indexing API. Opaque until
/// classified.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLogEvent {
    #[serde(default = "unknown_hash")]
    pub transaction_hash: String,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default = "empty_data")]
    pub data: String,
    #[serde(deserialize_with = "deserialize_block_number")]
    pub block_number: u64,
}

fn unknown_hash() -> String {
    "N/A".to_string()
}

fn empty_data() -> String {
    "0x0".to_string()
}

/// The indexing API reports block numbers as hex strings, decimal strings,
/// or plain integers depending on the endpoint.
fn deserialize_block_number<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| serde::de::Error::custom("block number out of range")),
        serde_json::Value::String(s) => {
            let s = s.trim();
            let parsed = match s.strip_prefix("0x") {
                Some(hex_part) => u64::from_str_radix(hex_part, 16),
                None => s.parse(),
            };
            parsed.map_err(serde::de::Error::custom)
        }
        other => Err(serde::de::Error::custom(format!(
            "unexpected block number value: {other}"
        ))),
    }
}

/// A classified deposit. Derived from a raw log, never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct Deposit {
    pub tx_hash: String,
    pub sender: Address,
    pub amount_wei: U256,
    pub amount_tokens: f64,
    pub block_number: u64,
}

impl Deposit {
    /// Interpret a raw log as a deposit: sender is the low 20 bytes of the
    /// second topic, amount is the first 32-byte word of the data field.
    /// Returns `None` when the log does not carry that shape.
    pub fn from_log(log: &RawLogEvent) -> Option<Self> {
        let sender_topic = strip_hex_prefix(log.topics.get(1)?);
        if sender_topic.len() < 40 {
            return None;
        }
        let sender: Address = format!("0x{}", &sender_topic[sender_topic.len() - 40..])
            .parse()
            .ok()?;

        let data = strip_hex_prefix(&log.data);
        let word = &data[..data.len().min(64)];
        let amount_wei = if word.is_empty() {
            U256::ZERO
        } else {
            U256::from_str_radix(word, 16).ok()?
        };

        Some(Self {
            tx_hash: log.transaction_hash.clone(),
            sender,
            amount_wei,
            amount_tokens: tokens_from_wei(amount_wei),
            block_number: log.block_number,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deposit_log(block: u64, sender: &str, amount_wei: u128) -> RawLogEvent {
        RawLogEvent {
            transaction_hash: format!("0xtx{block}"),
            topics: vec![
                "0x73a19dd210f1a7f902193214c0ee91dd35ee5b4d920cba8d519eca65a7b488ca".to_string(),
                format!("0x{:0>64}", sender.trim_start_matches("0x")),
            ],
            data: format!("0x{:064x}", amount_wei),
            block_number: block,
        }
    }

    #[test]
    fn test_block_number_formats() {
        let hex: RawLogEvent =
            serde_json::from_str(r#"{"topics":[],"data":"0x0","blockNumber":"0x10"}"#).unwrap();
        assert_eq!(hex.block_number, 16);

        let dec: RawLogEvent =
            serde_json::from_str(r#"{"topics":[],"data":"0x0","blockNumber":"16"}"#).unwrap();
        assert_eq!(dec.block_number, 16);

        let num: RawLogEvent =
            serde_json::from_str(r#"{"topics":[],"data":"0x0","blockNumber":16}"#).unwrap();
        assert_eq!(num.block_number, 16);
    }

    #[test]
    fn test_missing_optional_fields_default() {
        let log: RawLogEvent =
            serde_json::from_str(r#"{"topics":[],"blockNumber":"0x1"}"#).unwrap();
        assert_eq!(log.transaction_hash, "N/A");
        assert_eq!(log.data, "0x0");
    }

    #[test]
    fn test_deposit_from_log() {
        let sender = "69503b52764138e906c883ed6ef4cac939eb998c";
        let log = deposit_log(100, sender, 5 * 10u128.pow(18));
        let deposit = Deposit::from_log(&log).unwrap();

        assert_eq!(deposit.block_number, 100);
        assert_eq!(deposit.amount_tokens, 5.0);
        assert_eq!(
            deposit.sender,
            format!("0x{sender}").parse::<Address>().unwrap()
        );
    }

    #[test]
    fn test_deposit_from_log_missing_topic() {
        let log = RawLogEvent {
            transaction_hash: "0xabc".to_string(),
            topics: vec!["0xtopic0".to_string()],
            data: "0x0".to_string(),
            block_number: 5,
        };
        assert_eq!(Deposit::from_log(&log), None);
    }

    #[test]
    fn test_deposit_amount_uses_first_word_only() {
        let sender = "69503b52764138e906c883ed6ef4cac939eb998c";
        let mut log = deposit_log(7, sender, 42);
        // Append a second data word; only the first should be read.
        log.data = format!("{}{:064x}", log.data, 999u64);
        let deposit = Deposit::from_log(&log).unwrap();
        assert_eq!(deposit.amount_wei, U256::from(42u64));
    }
}
