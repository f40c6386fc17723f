use std::sync::Arc;

use tracing::info;

use mm_core::config::EmailProvider;
use mm_core::{AppConfig, Error, Notifier, Result};

pub mod smtp;
pub mod webhook;

pub use smtp::SmtpNotifier;
pub use webhook::{WebhookNotifier, WebhookPayload};

pub mod prelude {
    pub use super::{create_notifier, SmtpNotifier, WebhookNotifier};
    pub use mm_core::{DeliveryError, Notifier};
}

/// Build the delivery transport selected by EMAIL_PROVIDER.
pub fn create_notifier(config: &AppConfig) -> Result<Arc<dyn Notifier>> {
    match config.email_provider {
        EmailProvider::Webhook => {
            let url = config
                .webhook_url
                .clone()
                .ok_or_else(|| Error::Config("WEBHOOK_URL is not set".to_string()))?;
            info!("delivering reports via webhook");
            Ok(Arc::new(WebhookNotifier::new(url)?))
        }
        EmailProvider::Smtp => {
            info!(host = %config.smtp.host, "delivering reports via smtp");
            Ok(Arc::new(SmtpNotifier::new(&config.smtp)?))
        }
    }
}
