//! Email alerts relayed to the configured provider.

use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::email::alert_subject;
use crate::error::AppError;
use crate::state::AppState;

// ---

pub fn router() -> Router<AppState> {
    Router::new().route("/api/alerts/email", post(send_email))
}

#[derive(Debug, Default, Deserialize)]
struct AlertRequest {
    #[serde(default, alias = "useremail")]
    email: Option<String>,
    #[serde(default, alias = "pmId")]
    pm_id: Option<String>,
    #[serde(default, alias = "pmData")]
    message: Option<String>,
}

#[derive(Debug, Serialize)]
struct AlertResponse {
    message: &'static str,
}

/// Handle `POST /api/alerts/email`.
async fn send_email(
    State(state): State<AppState>,
    Json(request): Json<AlertRequest>,
) -> Result<Json<AlertResponse>, AppError> {
    // ---
    let (Some(email), Some(pm_id), Some(text)) = (
        request.email.filter(|v| !v.trim().is_empty()),
        request.pm_id.filter(|v| !v.trim().is_empty()),
        request.message.filter(|v| !v.trim().is_empty()),
    ) else {
        return Err(AppError::BadRequest(
            "email, pm_id and message are required.".to_string(),
        ));
    };

    let mailer = state
        .mailer
        .as_ref()
        .ok_or_else(|| AppError::Unavailable("Email alerts are not configured.".to_string()))?;

    mailer
        .send(&email, &alert_subject(&pm_id), &text)
        .await
        .map_err(|e| AppError::BadGateway(e.to_string()))?;

    info!("Alert for {} sent to {}", pm_id, email);
    Ok(Json(AlertResponse {
        message: "Email sent.",
    }))
}
