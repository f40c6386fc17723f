use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::info;

use mm_core::config::SmtpConfig;
use mm_core::{DeliveryError, Error, Notifier, Report, Result};

/// Delivers reports directly over SMTP as HTML email.
pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl SmtpNotifier {
    pub fn new(config: &SmtpConfig) -> Result<Self> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| Error::Config(format!("invalid SMTP relay '{}': {e}", config.host)))?
            .port(config.port)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .build();
        Ok(Self {
            transport,
            from: config.from.clone(),
        })
    }

    fn build_message(
        &self,
        report: &Report,
        recipients: &[String],
    ) -> std::result::Result<Message, DeliveryError> {
        let mut builder = Message::builder()
            .from(self.from.parse().map_err(|e| {
                DeliveryError::ConnectionFailed(format!("invalid sender address: {e}"))
            })?)
            .subject(&report.subject)
            .header(ContentType::TEXT_HTML);

        for recipient in recipients {
            builder = builder.to(recipient.parse().map_err(|e| {
                DeliveryError::ConnectionFailed(format!(
                    "invalid recipient '{recipient}': {e}"
                ))
            })?);
        }

        builder
            .body(report.html.clone())
            .map_err(|e| DeliveryError::ConnectionFailed(e.to_string()))
    }
}

fn classify_smtp_error(e: lettre::transport::smtp::Error) -> DeliveryError {
    if let Some(code) = e.status() {
        let code = code.to_string().parse().unwrap_or(550);
        return DeliveryError::Rejected(code);
    }
    if e.is_timeout() {
        return DeliveryError::Timeout;
    }
    DeliveryError::ConnectionFailed(e.to_string())
}

#[async_trait]
impl Notifier for SmtpNotifier {
    fn name(&self) -> &str {
        "smtp"
    }

    async fn send(
        &self,
        report: &Report,
        recipients: &[String],
    ) -> std::result::Result<(), DeliveryError> {
        if recipients.is_empty() {
            return Err(DeliveryError::ConnectionFailed(
                "no recipients configured".to_string(),
            ));
        }

        let message = self.build_message(report, recipients)?;
        self.transport
            .send(message)
            .await
            .map_err(classify_smtp_error)?;

        info!(recipients = recipients.len(), "smtp accepted the report");
        Ok(())
    }
}
