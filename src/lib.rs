//! PM2.5 monitoring backend and dashboard client.
//!
//! The crate is split along Explicit Module Boundaries:
//! - `config`, `schema`, `store`: process setup and persistence
//! - `routes`: the HTTP gateway; `main.rs` only sees [`routes::router`]
//! - `aggregate`: pure range filtering, hour/day bucketing and ranking
//! - `dashboard`: fetch-and-aggregate client used by dashboard pages

pub mod aggregate;
pub mod config;
pub mod dashboard;
pub mod email;
pub mod error;
pub mod models;
pub mod routes;
pub mod schema;
pub mod state;
pub mod store;

pub use config::Config;
pub use error::{AppError, StoreError};
pub use models::{Device, Person, Reading};
pub use state::AppState;
