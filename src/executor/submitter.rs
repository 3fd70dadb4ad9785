//! On-chain submission of multisig transactions.

use alloy::{
    primitives::{Address, Bytes, B256, U256},
    providers::{DynProvider, Provider},
    sol,
};
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::consts::{EXEC_GAS_LIMIT, RECEIPT_TIMEOUT_SECS};
use crate::decode::strip_hex_prefix;
use crate::safe::types::{Confirmation, MultisigTransaction};

sol! {
    #[sol(rpc)]
    interface ISafe {
        function execTransaction(
            address to,
            uint256 value,
            bytes calldata data,
            uint8 operation,
            uint256 safeTxGas,
            uint256 baseGas,
            uint256 gasPrice,
            address gasToken,
            address refundReceiver,
            bytes memory signatures
        ) external payable returns (bool success);
    }
}

/// Result of one landed (or failed) submission attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitResult {
    Confirmed { tx_hash: B256 },
    /// The transaction landed but its receipt status bit is not success.
    Reverted,
}

/// Submission seam. The engine drives retries against this; tests substitute
/// a scripted implementation.
#[async_trait]
pub trait SafeSubmitter: Send + Sync {
    async fn submit(&self, tx: &MultisigTransaction, signatures: Bytes) -> Result<SubmitResult>;
}

/// Sorts confirmations by owner address, case-insensitive ascending, and
/// concatenates the raw signature bytes with no separators. The ordering is
/// a correctness requirement of the on-chain verification.
pub fn aggregate_signatures(confirmations: &[Confirmation]) -> Result<Bytes> {
    let mut sorted: Vec<&Confirmation> = confirmations.iter().collect();
    sorted.sort_by_key(|c| c.owner.to_lowercase());

    let mut bytes = Vec::new();
    for confirmation in sorted {
        let Some(signature) = confirmation
            .signature
            .as_deref()
            .filter(|s| !s.is_empty())
        else {
            warn!(owner = %confirmation.owner, "Skipping confirmation without signature");
            continue;
        };
        let raw = hex::decode(strip_hex_prefix(signature))
            .with_context(|| format!("Invalid signature from {}", confirmation.owner))?;
        bytes.extend_from_slice(&raw);
    }

    if bytes.is_empty() {
        bail!("No valid signatures to aggregate");
    }
    Ok(bytes.into())
}

/// Real submitter: calls `execTransaction` on the Safe and gates success on
/// the mined receipt's status flag.
pub struct OnchainSubmitter {
    safe: ISafe::ISafeInstance<DynProvider>,
    provider: DynProvider,
    gas_limit: u64,
}

impl OnchainSubmitter {
    pub fn new(provider: DynProvider, safe_address: Address) -> Self {
        Self {
            safe: ISafe::new(safe_address, provider.clone()),
            provider,
            gas_limit: EXEC_GAS_LIMIT,
        }
    }
}

#[async_trait]
impl SafeSubmitter for OnchainSubmitter {
    async fn submit(&self, tx: &MultisigTransaction, signatures: Bytes) -> Result<SubmitResult> {
        let to: Address = tx
            .to
            .parse()
            .with_context(|| format!("Invalid destination address: {}", tx.to))?;
        let value = U256::from_str_radix(&tx.value, 10)
            .with_context(|| format!("Invalid transaction value: {}", tx.value))?;
        let data: Bytes = match tx.data.as_deref() {
            Some(d) if !strip_hex_prefix(d).is_empty() => hex::decode(strip_hex_prefix(d))
                .context("Invalid transaction data")?
                .into(),
            _ => Bytes::new(),
        };
        let embedded_gas_price = U256::from_str_radix(&tx.gas_price, 10)
            .with_context(|| format!("Invalid gas price field: {}", tx.gas_price))?;
        let gas_token: Address = tx
            .gas_token
            .parse()
            .with_context(|| format!("Invalid gas token address: {}", tx.gas_token))?;
        let refund_receiver: Address = tx
            .refund_receiver
            .parse()
            .with_context(|| format!("Invalid refund receiver: {}", tx.refund_receiver))?;

        // The network-level fee is fetched fresh at submit time; it is
        // independent of the record's own embedded gasPrice field, which is
        // passed through unchanged as a call argument.
        let network_gas_price = self
            .provider
            .get_gas_price()
            .await
            .context("Failed to fetch gas price")?;

        let call = self
            .safe
            .execTransaction(
                to,
                value,
                data,
                tx.operation,
                U256::from(tx.safe_tx_gas),
                U256::from(tx.base_gas),
                embedded_gas_price,
                gas_token,
                refund_receiver,
                signatures,
            )
            .gas(self.gas_limit)
            .max_fee_per_gas(network_gas_price)
            .max_priority_fee_per_gas(0);

        let pending = call.send().await.context("execTransaction failed to send")?;
        let receipt = pending
            .with_timeout(Some(Duration::from_secs(RECEIPT_TIMEOUT_SECS)))
            .get_receipt()
            .await
            .context("Timed out waiting for receipt")?;

        let tx_hash = receipt.transaction_hash;
        if receipt.status() {
            info!(
                nonce = tx.nonce,
                tx_hash = ?tx_hash,
                gas_used = receipt.gas_used,
                "execTransaction confirmed"
            );
            Ok(SubmitResult::Confirmed { tx_hash })
        } else {
            warn!(nonce = tx.nonce, tx_hash = ?tx_hash, "execTransaction reverted on-chain");
            Ok(SubmitResult::Reverted)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn confirmation(owner: &str, signature: Option<&str>) -> Confirmation {
        Confirmation {
            owner: owner.to_string(),
            signature: signature.map(str::to_string),
        }
    }

    #[test]
    fn test_signatures_sorted_by_owner_case_insensitive() {
        let confirmations = vec![
            confirmation("0xB3B1000000000000000000000000000000000001", Some("0xbbbb")),
            confirmation("0xa01b000000000000000000000000000000000002", Some("0xaaaa")),
            confirmation("0x6950000000000000000000000000000000000003", Some("0x6969")),
        ];

        let aggregated = aggregate_signatures(&confirmations).unwrap();
        // 0x695... < 0xa01... < 0xb3b... after lower-casing
        assert_eq!(aggregated.to_vec(), vec![0x69, 0x69, 0xaa, 0xaa, 0xbb, 0xbb]);
    }

    #[test]
    fn test_signatures_concatenated_without_separators() {
        let confirmations = vec![
            confirmation("0xaaa0000000000000000000000000000000000001", Some("0x0102")),
            confirmation("0xbbb0000000000000000000000000000000000002", Some("0x0304")),
        ];
        let aggregated = aggregate_signatures(&confirmations).unwrap();
        assert_eq!(aggregated.to_vec(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_missing_signatures_skipped() {
        let confirmations = vec![
            confirmation("0xaaa0000000000000000000000000000000000001", None),
            confirmation("0xbbb0000000000000000000000000000000000002", Some("0xff")),
            confirmation("0xccc0000000000000000000000000000000000003", Some("")),
        ];
        let aggregated = aggregate_signatures(&confirmations).unwrap();
        assert_eq!(aggregated.to_vec(), vec![0xff]);
    }

    #[test]
    fn test_no_valid_signatures_is_error() {
        let confirmations = vec![confirmation(
            "0xaaa0000000000000000000000000000000000001",
            None,
        )];
        assert!(aggregate_signatures(&confirmations).is_err());
        assert!(aggregate_signatures(&[]).is_err());
    }

    #[test]
    fn test_invalid_hex_signature_is_error() {
        let confirmations = vec![confirmation(
            "0xaaa0000000000000000000000000000000000001",
            Some("0xzz"),
        )];
        assert!(aggregate_signatures(&confirmations).is_err());
    }
}
