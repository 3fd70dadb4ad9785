//! Seam between the core and whatever chat/alerting surface is attached.

use async_trait::async_trait;
use tracing::info;

/// Outbound operator-facing messages. The presentation layer implements this
/// against its own transport; the core only ever broadcasts.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn broadcast(&self, message: &str);
}

/// Default notifier: messages go to the structured log only.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn broadcast(&self, message: &str) {
        info!(broadcast = %message, "Operator broadcast");
    }
}
