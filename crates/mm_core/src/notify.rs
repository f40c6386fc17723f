use async_trait::async_trait;

use crate::types::{DeliveryError, Report};

/// Delivers a finished report to its recipients. Fire-and-confirm: `Ok`
/// means the remote accepted the payload. The orchestrator gates the
/// archive transition on that confirmation.
#[async_trait]
pub trait Notifier: Send + Sync {
    fn name(&self) -> &str;

    async fn send(
        &self,
        report: &Report,
        recipients: &[String],
    ) -> std::result::Result<(), DeliveryError>;
}
