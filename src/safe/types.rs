//! Wire types for the multisig coordination service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One signer's signature attached to a pending transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Confirmation {
    pub owner: String,
    #[serde(default)]
    pub signature: Option<String>,
}

/// One multisig transaction record from the coordination feed.
///
/// Nonces are NOT unique across the raw feed: resubmissions share a nonce.
/// Uniqueness is restored by the queue normalizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultisigTransaction {
    pub nonce: u64,
    pub to: String,
    #[serde(default = "zero_string")]
    pub value: String,
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default)]
    pub operation: u8,
    #[serde(default)]
    pub safe_tx_gas: u64,
    #[serde(default)]
    pub base_gas: u64,
    #[serde(default = "zero_string")]
    pub gas_price: String,
    #[serde(default = "zero_address")]
    pub gas_token: String,
    #[serde(default = "zero_address")]
    pub refund_receiver: String,
    #[serde(default)]
    pub confirmations: Vec<Confirmation>,
    #[serde(default)]
    pub confirmations_required: u32,
    #[serde(default)]
    pub is_executed: bool,
    pub submission_date: DateTime<Utc>,
}

impl MultisigTransaction {
    /// Signatures currently attached, derived from the confirmation list.
    pub fn signature_count(&self) -> usize {
        self.confirmations.len()
    }
}

fn zero_string() -> String {
    "0".to_string()
}

fn zero_address() -> String {
    "0x0000000000000000000000000000000000000000".to_string()
}

/// Paginated response envelope from the coordination service.
#[derive(Debug, Deserialize)]
pub(crate) struct TransactionPage {
    #[serde(default)]
    pub results: Vec<MultisigTransaction>,
}
