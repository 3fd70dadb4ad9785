//! Multi-criteria eligibility check for the lowest-nonce pending transaction.

use std::fmt;

use crate::decode::DecodedPayload;
use crate::safe::types::MultisigTransaction;

/// Named policy variants. Each is a subset of the standard checks; the
/// signature threshold is checked by every variant and can never be
/// bypassed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateVariant {
    /// Pause check + decode + balance.
    Standard,
    /// Ignores the pause flag.
    OverridePause,
    /// Ignores the pause flag and the balance check.
    OverridePauseBalance,
    /// Ignores everything except the signature threshold; tolerates a
    /// payload that does not decode.
    OverrideAll,
}

impl GateVariant {
    fn checks_pause(self) -> bool {
        matches!(self, GateVariant::Standard)
    }

    fn requires_decode(self) -> bool {
        !matches!(self, GateVariant::OverrideAll)
    }

    fn checks_balance(self) -> bool {
        matches!(self, GateVariant::Standard | GateVariant::OverridePause)
    }
}

/// Why the gate refused a transaction. No side effects accompany a
/// rejection.
#[derive(Debug, Clone, PartialEq)]
pub enum GateRejection {
    Paused,
    InsufficientSignatures { have: usize, need: u32 },
    UndecodablePayload { nonce: u64 },
    InsufficientBalance { required: f64, available: f64 },
}

impl fmt::Display for GateRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GateRejection::Paused => {
                write!(f, "automated transaction execution is paused")
            }
            GateRejection::InsufficientSignatures { have, need } => {
                write!(f, "insufficient signatures ({have}/{need})")
            }
            GateRejection::UndecodablePayload { nonce } => {
                write!(f, "failed to decode transaction data for nonce {nonce}")
            }
            GateRejection::InsufficientBalance {
                required,
                available,
            } => {
                write!(
                    f,
                    "insufficient staking balance (required {required:.1}, available {available:.1})"
                )
            }
        }
    }
}

/// Evaluate one pending transaction against a policy variant.
pub fn evaluate(
    variant: GateVariant,
    tx: &MultisigTransaction,
    payload: Option<&DecodedPayload>,
    balance_tokens: f64,
    paused: bool,
) -> Result<(), GateRejection> {
    if variant.checks_pause() && paused {
        return Err(GateRejection::Paused);
    }

    if variant.requires_decode() && payload.is_none() {
        return Err(GateRejection::UndecodablePayload { nonce: tx.nonce });
    }

    let have = tx.signature_count();
    let need = tx.confirmations_required;
    if have < need as usize {
        return Err(GateRejection::InsufficientSignatures { have, need });
    }

    if variant.checks_balance() {
        let required = payload.map(|p| p.amount_tokens).unwrap_or(0.0);
        if balance_tokens < required {
            return Err(GateRejection::InsufficientBalance {
                required,
                available: balance_tokens,
            });
        }
    }

    Ok(())
}
