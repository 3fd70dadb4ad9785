//! Execution gate, submission seam, and the retrying execution engine.

pub mod engine;
pub mod gate;
pub mod submitter;

pub use engine::{EngineConfig, ExecutionEngine};
pub use gate::{GateRejection, GateVariant};
pub use submitter::{aggregate_signatures, OnchainSubmitter, SafeSubmitter, SubmitResult};

use alloy::primitives::B256;
use std::fmt;

/// Why an execution attempt never reached the chain.
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    Gate(GateRejection),
    QueueUnavailable,
    NoPendingTransactions,
    NonceNotFound { nonce: u64 },
    NoSignatureBytes,
    /// A pause request arrived during the revert cooldown.
    PauseRequested,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Gate(rejection) => rejection.fmt(f),
            SkipReason::QueueUnavailable => write!(f, "coordination service unavailable"),
            SkipReason::NoPendingTransactions => write!(f, "no pending transactions found"),
            SkipReason::NonceNotFound { nonce } => {
                write!(f, "no transaction found for nonce {nonce}")
            }
            SkipReason::NoSignatureBytes => write!(f, "no usable signature bytes"),
            SkipReason::PauseRequested => write!(f, "pause requested during cooldown"),
        }
    }
}

impl From<GateRejection> for SkipReason {
    fn from(rejection: GateRejection) -> Self {
        SkipReason::Gate(rejection)
    }
}

/// Tagged result of one execution attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionOutcome {
    Confirmed { tx_hash: B256 },
    /// Every attempt reverted; the circuit breaker has paused automation.
    Reverted,
    NotSubmitted { reason: SkipReason },
}
