//! Calldata decoding for queued multisig transactions.
//!
//! Two independent concerns: mapping a 4-byte function selector to a
//! human-readable name via a declarative table, and strictly decoding the
//! one known withdrawal payload shape of two `uint256` words
//! `(validatorId, amountWei)`. Any other payload is simply "not decodable",
//! never an error.

use alloy::primitives::{utils::format_ether, U256};
use anyhow::Context;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

/// Known staking-contract function selectors, lower-case hex without prefix.
const BUILTIN_SELECTORS: &[(&str, &str)] = &[
    ("095ea7b3", "approve"),
    ("42966c68", "burn"),
    ("79cc6790", "burnFrom"),
    ("5eac6239", "claimRewards"),
    ("d9a34952", "delegate"),
    ("d0e30db0", "deposit"),
    ("ed88c68e", "donate"),
    ("2f2ff15d", "grantRole"),
    ("485cc955", "initialize"),
    ("cf5c3eb7", "operatorExecuteClawBack"),
    ("71bbf3e7", "operatorInitiateClawBack"),
    ("8456cb59", "pause"),
    ("d505accf", "permit"),
    ("715018a6", "renounceOwnership"),
    ("36568abe", "renounceRole"),
    ("d547741f", "revokeRole"),
    ("543f66a4", "setDepositPaused"),
    ("98176a01", "setProtocolFeeBIPS"),
    ("f0f44260", "setTreasury"),
    ("e882e4ef", "setUndelegateFromPoolPaused"),
    ("cc90ef5c", "setUndelegatePaused"),
    ("72f0cb30", "setWithdrawDelay"),
    ("37d15139", "setWithdrawPaused"),
    ("a9059cbb", "transfer"),
    ("23b872dd", "transferFrom"),
    ("f2fde38b", "transferOwnership"),
    ("634b91e3", "undelegate"),
    ("d02e92a6", "undelegateFromPool"),
    ("2f3cd672", "undelegateMany"),
    ("4f1ef286", "upgradeToAndCall"),
    ("38d07436", "withdraw"),
    ("ac697e3f", "withdrawMany"),
];

#[derive(Debug, Deserialize)]
struct SelectorOverrides {
    #[serde(default)]
    selectors: HashMap<String, String>,
}

/// Selector-to-name table, loaded once at startup.
#[derive(Debug, Clone)]
pub struct SelectorTable {
    entries: HashMap<String, String>,
}

impl SelectorTable {
    /// The compiled-in table.
    pub fn builtin() -> Self {
        let entries = BUILTIN_SELECTORS
            .iter()
            .map(|(sel, name)| (sel.to_string(), name.to_string()))
            .collect();
        Self { entries }
    }

    /// The compiled-in table merged with optional TOML overrides:
    ///
    /// ```toml
    /// [selectors]
    /// "aabbccdd" = "customFunction"
    /// ```
    pub fn load<P: AsRef<Path>>(override_path: Option<P>) -> anyhow::Result<Self> {
        let mut table = Self::builtin();
        if let Some(path) = override_path {
            let path = path.as_ref();
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read selector table {}", path.display()))?;
            let overrides: SelectorOverrides = toml::from_str(&contents)
                .with_context(|| format!("Failed to parse selector table {}", path.display()))?;
            info!(
                path = %path.display(),
                count = overrides.selectors.len(),
                "Loaded selector table overrides"
            );
            for (sel, name) in overrides.selectors {
                table.entries.insert(sel.to_lowercase(), name);
            }
        }
        Ok(table)
    }

    /// Resolve a calldata payload to a function name. Empty or absent data
    /// is "No Data"; an unrecognized selector is "Unknown".
    pub fn function_name(&self, data: Option<&str>) -> String {
        let Some(data) = data else {
            return "No Data".to_string();
        };
        let stripped = strip_hex_prefix(data);
        if stripped.is_empty() {
            return "No Data".to_string();
        }
        if stripped.len() < 8 {
            return "Unknown".to_string();
        }
        let selector = stripped[..8].to_lowercase();
        self.entries
            .get(&selector)
            .cloned()
            .unwrap_or_else(|| "Unknown".to_string())
    }
}

/// Decoded withdrawal payload.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedPayload {
    pub validator_id: String,
    pub amount_wei: U256,
    pub amount_tokens: f64,
}

/// Strictly decode calldata as a 4-byte selector followed by exactly two
/// 32-byte words `(validatorId, amountWei)`. Anything else yields `None`.
pub fn decode_payload(data: &str) -> Option<DecodedPayload> {
    let stripped = strip_hex_prefix(data);
    let bytes = hex::decode(stripped).ok()?;
    if bytes.len() != 4 + 64 {
        return None;
    }

    let validator_id = U256::from_be_slice(&bytes[4..36]);
    let amount_wei = U256::from_be_slice(&bytes[36..68]);

    Some(DecodedPayload {
        validator_id: validator_id.to_string(),
        amount_wei,
        amount_tokens: tokens_from_wei(amount_wei),
    })
}

/// Convert a wei amount (18 decimals) into whole tokens.
pub fn tokens_from_wei(wei: U256) -> f64 {
    format_ether(wei).parse().unwrap_or_default()
}

pub(crate) fn strip_hex_prefix(data: &str) -> &str {
    data.strip_prefix("0x").unwrap_or(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pad_word(value: u128) -> String {
        format!("{:064x}", value)
    }

    #[test]
    fn test_function_name_known() {
        let table = SelectorTable::builtin();
        assert_eq!(
            table.function_name(Some("0x38d07436deadbeef")),
            "withdraw"
        );
        // Casing and prefix are irrelevant
        assert_eq!(table.function_name(Some("38D07436")), "withdraw");
    }

    #[test]
    fn test_function_name_unknown_and_empty() {
        let table = SelectorTable::builtin();
        assert_eq!(table.function_name(Some("0xffffffff")), "Unknown");
        assert_eq!(table.function_name(Some("0xab")), "Unknown");
        assert_eq!(table.function_name(Some("")), "No Data");
        assert_eq!(table.function_name(Some("0x")), "No Data");
        assert_eq!(table.function_name(None), "No Data");
    }

    #[test]
    fn test_load_with_overrides() {
        let path = std::env::temp_dir().join("selectors_override.toml");
        std::fs::write(
            &path,
            "[selectors]\n\"AABBCCDD\" = \"customCall\"\n\"38d07436\" = \"withdrawV2\"\n",
        )
        .unwrap();
        let table = SelectorTable::load(Some(&path)).unwrap();
        assert_eq!(table.function_name(Some("0xaabbccdd")), "customCall");
        assert_eq!(table.function_name(Some("0x38d07436")), "withdrawV2");
        // Untouched builtins survive
        assert_eq!(table.function_name(Some("0xd0e30db0")), "deposit");
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_decode_payload() {
        // Selector + validatorId 7 + amount 2500 tokens in wei
        let amount_wei: u128 = 2500 * 10u128.pow(18);
        let data = format!("0x38d07436{}{}", pad_word(7), pad_word(amount_wei));

        let decoded = decode_payload(&data).unwrap();
        assert_eq!(decoded.validator_id, "7");
        assert_eq!(decoded.amount_wei, U256::from(amount_wei));
        assert_eq!(decoded.amount_tokens, 2500.0);
    }

    #[test]
    fn test_decode_payload_wrong_shape() {
        // One word only
        let data = format!("0x38d07436{}", pad_word(7));
        assert_eq!(decode_payload(&data), None);

        // Three words
        let data = format!("0x38d07436{}{}{}", pad_word(1), pad_word(2), pad_word(3));
        assert_eq!(decode_payload(&data), None);

        // Not hex at all
        assert_eq!(decode_payload("0xzzzz"), None);
        assert_eq!(decode_payload(""), None);
    }

    #[test]
    fn test_tokens_from_wei() {
        let one_token = U256::from(10u64).pow(U256::from(18));
        assert_eq!(tokens_from_wei(one_token), 1.0);
        assert_eq!(tokens_from_wei(U256::ZERO), 0.0);
        assert_eq!(tokens_from_wei(one_token / U256::from(2)), 0.5);
    }
}
