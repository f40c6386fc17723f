use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Serialize;
use tracing::info;

use mm_core::{DeliveryError, Notifier, Report, RetryPolicy};

/// Cap on a single POST, so a hung webhook surfaces as a delivery timeout
/// instead of eating the whole run budget.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Payload posted to the delivery webhook. The receiving automation owns
/// the actual email send.
#[derive(Debug, Serialize)]
pub struct WebhookPayload<'a> {
    pub subject: &'a str,
    pub html: &'a str,
    pub recipients: &'a [String],
    pub generated_at: DateTime<Utc>,
}

/// Delivers reports by POSTing them to a configured webhook.
pub struct WebhookNotifier {
    client: Client,
    url: String,
    retry: RetryPolicy,
}

impl WebhookNotifier {
    pub fn new(url: String) -> mm_core::Result<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            url,
            retry: RetryPolicy::default(),
        })
    }

    async fn post_once(&self, payload: &WebhookPayload<'_>) -> Result<(), DeliveryError> {
        let response = self
            .client
            .post(&self.url)
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    DeliveryError::Timeout
                } else {
                    DeliveryError::ConnectionFailed(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(DeliveryError::Rejected(status.as_u16()));
        }
        Ok(())
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    fn name(&self) -> &str {
        "webhook"
    }

    async fn send(&self, report: &Report, recipients: &[String]) -> Result<(), DeliveryError> {
        let payload = WebhookPayload {
            subject: &report.subject,
            html: &report.html,
            recipients,
            generated_at: Utc::now(),
        };

        // Only connection failures are retried. A timeout or rejection may
        // mean the remote already accepted the payload, and resending would
        // duplicate the report.
        self.retry
            .run(
                || self.post_once(&payload),
                |e| matches!(e, DeliveryError::ConnectionFailed(_)),
            )
            .await?;

        info!(recipients = recipients.len(), "webhook accepted the report");
        Ok(())
    }
}
