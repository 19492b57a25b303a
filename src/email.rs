//! Outbound email alerts through an HTTP email provider.

use std::time::Duration;

use serde::Serialize;

use crate::config::EmailConfig;

/// Failure talking to the email provider.
#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    #[error("email provider unreachable: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("email provider rejected message with status {0}")]
    Rejected(u16),
}

#[derive(Debug, Serialize)]
struct OutboundMessage<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: &'a str,
}

/// Sends plain-text messages as JSON to the configured provider.
#[derive(Debug, Clone)]
pub struct Mailer {
    http: reqwest::Client,
    config: EmailConfig,
}

impl Mailer {
    pub fn new(config: EmailConfig, timeout: Duration) -> Result<Self, EmailError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http, config })
    }

    pub async fn send(&self, to: &str, subject: &str, text: &str) -> Result<(), EmailError> {
        // ---
        let message = OutboundMessage {
            from: &self.config.from,
            to,
            subject,
            text,
        };

        let mut request = self.http.post(&self.config.api_url).json(&message);
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        tracing::debug!("Sending alert email to {} via {}", to, self.config.api_url);
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(EmailError::Rejected(status.as_u16()));
        }

        tracing::info!("Alert email sent to {}", to);
        Ok(())
    }
}

/// Subject line for a device alert.
pub fn alert_subject(pm_id: &str) -> String {
    format!("PM2.5 alert for device {pm_id}")
}
