//! HTTP client for the monitoring API and for device control endpoints.

use std::time::Duration;

use reqwest::{Response, StatusCode};
use serde::Serialize;

use crate::models::{Device, Reading};

/// Failure fetching from or posting to a remote endpoint.
///
/// No retries are attempted; callers show a message and move on.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("server responded {status}: {message}")]
    Status { status: u16, message: String },
}

#[derive(Debug, Serialize)]
struct AlertBody<'a> {
    email: &'a str,
    pm_id: &'a str,
    message: &'a str,
}

/// Client used by dashboard views.
#[derive(Debug, Clone)]
pub struct DashboardClient {
    http: reqwest::Client,
    base_url: String,
}

impl DashboardClient {
    // ---
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Full reading history for one device, or for all devices.
    pub async fn fetch_history(&self, pm_id: Option<&str>) -> Result<Vec<Reading>, ClientError> {
        // ---
        let url = match pm_id {
            Some(id) => format!("{}/api/history/{}", self.base_url, id),
            None => format!("{}/api/history", self.base_url),
        };
        tracing::debug!("Fetching history from {}", url);

        let response = check(self.http.get(&url).send().await?).await?;
        let readings: Vec<Reading> = response.json().await?;

        tracing::debug!("Fetched {} readings", readings.len());
        Ok(readings)
    }

    /// Current device list. The API answers 404 when there are none.
    pub async fn fetch_devices(&self) -> Result<Vec<Device>, ClientError> {
        // ---
        let url = format!("{}/api/devices", self.base_url);
        let response = self.http.get(&url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        Ok(check(response).await?.json().await?)
    }

    /// Ask a device to reboot via its own `/restart` endpoint.
    pub async fn restart_device(&self, device_url: &str) -> Result<(), ClientError> {
        // ---
        let url = format!("{}/restart", device_url.trim_end_matches('/'));
        tracing::info!("Requesting device restart at {}", url);
        check(self.http.post(&url).send().await?).await?;
        Ok(())
    }

    /// Ask the API to email `message` about `pm_id` to `email`.
    pub async fn send_alert(&self, email: &str, pm_id: &str, message: &str) -> Result<(), ClientError> {
        // ---
        let url = format!("{}/api/alerts/email", self.base_url);
        let body = AlertBody { email, pm_id, message };
        check(self.http.post(&url).json(&body).send().await?).await?;
        Ok(())
    }
}

/// Turn a non-success response into [`ClientError::Status`].
async fn check(response: Response) -> Result<Response, ClientError> {
    // ---
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&text)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(String::from))
        .unwrap_or(text);

    Err(ClientError::Status {
        status: status.as_u16(),
        message,
    })
}
