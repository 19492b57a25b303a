use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

mod accounts;
mod alerts;
mod devices;
mod health;
mod readings;

// ---

pub fn router(state: AppState) -> Router {
    // ---
    Router::new()
        .merge(readings::router())
        .merge(devices::router())
        .merge(accounts::router())
        .merge(alerts::router())
        .merge(health::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
