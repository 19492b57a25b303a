//! Sensor ingestion and reading history.
//!
//! History is returned in full as stored: no server-side filtering,
//! pagination or aggregation. Dashboards do that on their side.

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::AppError;
use crate::models::{Device, IngestPayload, Reading};
use crate::state::AppState;

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new()
        .route("/api/readings", post(ingest))
        .route("/api/history", get(history_all))
        .route("/api/history/{pm_id}", get(history_for_device))
}

#[derive(Debug, Serialize)]
struct IngestResponse {
    message: &'static str,
    data: Device,
}

/// Handle `POST /api/readings`.
///
/// Upserts the device document keyed by `pm_id` and appends the sample to
/// the history. Missing fields are stored as neutral defaults.
async fn ingest(
    State(state): State<AppState>,
    Json(payload): Json<IngestPayload>,
) -> Result<Json<IngestResponse>, AppError> {
    // ---
    let (device, reading) = payload
        .into_records(Utc::now())
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    info!("POST /api/readings - {}", device.pm_id);

    state.store.upsert_device(&device).await?;
    state.store.append_reading(&reading).await?;

    debug!(
        "Stored reading {} for {} (pm2_5={})",
        reading.id, reading.pm_id, reading.pm2_5
    );
    Ok(Json(IngestResponse {
        message: "Data added or updated successfully.",
        data: device,
    }))
}

/// Handle `GET /api/history`: readings of every device.
async fn history_all(State(state): State<AppState>) -> Result<Json<Vec<Reading>>, AppError> {
    let readings = state.store.history(None).await?;
    debug!("GET /api/history - {} readings", readings.len());
    Ok(Json(readings))
}

/// Handle `GET /api/history/{pm_id}`.
async fn history_for_device(
    State(state): State<AppState>,
    Path(pm_id): Path<String>,
) -> Result<Json<Vec<Reading>>, AppError> {
    let readings = state.store.history(Some(&pm_id)).await?;
    debug!("GET /api/history/{} - {} readings", pm_id, readings.len());
    Ok(Json(readings))
}
