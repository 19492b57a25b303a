//! Device listing and direct document mutation keyed by `pm_id`.

use axum::{
    extract::{Path, State},
    routing::{get, patch},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::AppError;
use crate::models::{Device, DeviceStatus, DeviceUpdate};
use crate::state::AppState;

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new()
        .route("/api/devices", get(list_devices))
        .route(
            "/api/devices/{pm_id}",
            patch(update_device).delete(delete_device),
        )
        .route("/api/devices/{pm_id}/status", patch(update_status))
}

#[derive(Debug, Serialize)]
struct MessageResponse {
    message: String,
}

impl MessageResponse {
    fn new(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            message: message.into(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct StatusRequest {
    #[serde(default)]
    status: Option<String>,
}

fn device_not_found() -> AppError {
    AppError::NotFound("Device not found".to_string())
}

/// Handle `GET /api/devices`. Answers 404 when no device has reported yet.
async fn list_devices(State(state): State<AppState>) -> Result<Json<Vec<Device>>, AppError> {
    let devices = state.store.list_devices().await?;
    if devices.is_empty() {
        return Err(AppError::NotFound("No IoT data found.".to_string()));
    }
    Ok(Json(devices))
}

/// Handle `PATCH /api/devices/{pm_id}`: merge the given fields.
async fn update_device(
    State(state): State<AppState>,
    Path(pm_id): Path<String>,
    Json(update): Json<DeviceUpdate>,
) -> Result<Json<Device>, AppError> {
    // ---
    info!("PATCH /api/devices/{} - {:?}", pm_id, update);
    state
        .store
        .update_device(&pm_id, &update)
        .await?
        .map(Json)
        .ok_or_else(device_not_found)
}

/// Handle `PATCH /api/devices/{pm_id}/status`.
async fn update_status(
    State(state): State<AppState>,
    Path(pm_id): Path<String>,
    Json(request): Json<StatusRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    // ---
    let status = request
        .status
        .as_deref()
        .and_then(DeviceStatus::parse)
        .ok_or_else(|| {
            AppError::BadRequest(
                "Invalid status. Allowed values are active or inactive.".to_string(),
            )
        })?;

    if !state.store.set_device_status(&pm_id, status).await? {
        return Err(device_not_found());
    }

    info!("Device {} status updated to {}", pm_id, status.as_str());
    Ok(MessageResponse::new(format!(
        "Device {} status updated to {}",
        pm_id,
        status.as_str()
    )))
}

/// Handle `DELETE /api/devices/{pm_id}`.
async fn delete_device(
    State(state): State<AppState>,
    Path(pm_id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    // ---
    info!("Deleting device {}", pm_id);
    if !state.store.delete_device(&pm_id).await? {
        return Err(device_not_found());
    }
    Ok(MessageResponse::new("Device deleted successfully"))
}
