use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailProvider {
    Webhook,
    Smtp,
}

impl FromStr for EmailProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "webhook" => Ok(Self::Webhook),
            "smtp" => Ok(Self::Smtp),
            other => Err(format!("unknown EMAIL_PROVIDER '{other}'")),
        }
    }
}

#[derive(Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
}

/// Application settings read from the environment, validated up front so a
/// misconfigured deployment fails at startup instead of mid-run.
#[derive(Clone)]
pub struct AppConfig {
    pub database_path: String,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub email_provider: EmailProvider,
    pub webhook_url: Option<String>,
    pub smtp: SmtpConfig,
    pub recipients: Vec<String>,
    pub scrape_timeout: Duration,
    pub user_agent: String,
    pub worker_cap: usize,
    pub run_budget: Duration,
    pub host: String,
    pub port: u16,
    pub local_mode: bool,
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("database_path", &self.database_path)
            .field("gemini_api_key", &self.gemini_api_key.as_deref().map(|_| "***"))
            .field("gemini_model", &self.gemini_model)
            .field("email_provider", &self.email_provider)
            .field("webhook_url", &self.webhook_url)
            .field("smtp_host", &self.smtp.host)
            .field("smtp_port", &self.smtp.port)
            .field("smtp_username", &self.smtp.username)
            .field("smtp_password", &"***")
            .field("recipients", &self.recipients)
            .field("scrape_timeout", &self.scrape_timeout)
            .field("user_agent", &self.user_agent)
            .field("worker_cap", &self.worker_cap)
            .field("run_budget", &self.run_budget)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("local_mode", &self.local_mode)
            .finish()
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("invalid {} value '{}', using default", key, raw);
            default
        }),
        Err(_) => default,
    }
}

fn env_bool(key: &str) -> bool {
    env::var(key)
        .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
        .unwrap_or(false)
}

impl AppConfig {
    /// Build the configuration from environment variables. Collects every
    /// problem into a single [`Error::Config`] so the operator sees the
    /// whole list at once.
    pub fn from_env() -> Result<Self> {
        let provider_raw = env_or("EMAIL_PROVIDER", "webhook");
        let mut errors = Vec::new();

        let email_provider = match provider_raw.parse::<EmailProvider>() {
            Ok(p) => p,
            Err(e) => {
                errors.push(e);
                EmailProvider::Webhook
            }
        };

        let webhook_url = env::var("WEBHOOK_URL").ok().filter(|v| !v.trim().is_empty());
        let smtp = SmtpConfig {
            host: env_or("SMTP_HOST", "smtp.gmail.com"),
            port: env_parse("SMTP_PORT", 587u16),
            username: env_or("SMTP_USERNAME", ""),
            password: env_or("SMTP_PASSWORD", ""),
            from: env_or("EMAIL_FROM", &env_or("SMTP_USERNAME", "")),
        };

        match email_provider {
            EmailProvider::Webhook => match &webhook_url {
                Some(raw) => {
                    if url::Url::parse(raw).is_err() {
                        errors.push(format!("WEBHOOK_URL '{raw}' is not a valid URL"));
                    }
                }
                None => errors.push(
                    "WEBHOOK_URL is required when EMAIL_PROVIDER is set to webhook".to_string(),
                ),
            },
            EmailProvider::Smtp => {
                if smtp.username.is_empty() {
                    errors.push(
                        "SMTP_USERNAME is required when EMAIL_PROVIDER is set to smtp".to_string(),
                    );
                }
                if smtp.password.is_empty() {
                    errors.push(
                        "SMTP_PASSWORD is required when EMAIL_PROVIDER is set to smtp".to_string(),
                    );
                }
            }
        }

        let gemini_api_key = env::var("GEMINI_API_KEY").ok().filter(|v| !v.is_empty());
        let local_mode = env_bool("LOCAL_MODE");
        if gemini_api_key.is_none() && !local_mode {
            warn!("GEMINI_API_KEY not set, summaries will use the local model");
        }

        let recipients = env_or("EMAIL_RECIPIENTS", "")
            .split(',')
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .collect::<Vec<_>>();
        if recipients.is_empty() {
            warn!("EMAIL_RECIPIENTS not set, reports need a per-request recipient");
        }

        if !errors.is_empty() {
            return Err(Error::Config(errors.join("; ")));
        }

        Ok(Self {
            database_path: env_or("DATABASE_PATH", "media_monitoring.db"),
            gemini_api_key,
            gemini_model: env_or("GEMINI_MODEL", "gemini-1.5-flash"),
            email_provider,
            webhook_url,
            smtp,
            recipients,
            scrape_timeout: Duration::from_secs(env_parse("SCRAPE_TIMEOUT_SECS", 15u64)),
            user_agent: env_or("SCRAPE_USER_AGENT", "media-monitoring-agent/0.1"),
            worker_cap: env_parse("WORKER_CAP", 5usize).max(1),
            run_budget: Duration::from_secs(env_parse("RUN_BUDGET_SECS", 300u64)),
            host: env_or("HOST", "0.0.0.0"),
            port: env_parse("PORT", 8000u16),
            local_mode,
        })
    }
}
