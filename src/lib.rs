pub mod automation;
pub mod chain;
pub mod checkpoint;
pub mod config;
pub mod decode;
pub mod executor;
pub mod notifier;
pub mod retry;
pub mod safe;
pub mod scanner;
pub mod service;
pub mod supervisor;

pub use automation::AutomationState;
pub use decode::{decode_payload, DecodedPayload, SelectorTable};
pub use executor::{ExecutionOutcome, GateRejection, GateVariant, SkipReason};
pub use safe::{normalize_queue, MultisigTransaction};
pub use scanner::{Deposit, DepositMonitor, ProbeOutcome};
pub use service::KeeperService;
pub use supervisor::Scheduler;
