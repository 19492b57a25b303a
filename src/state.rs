//! Shared state handed to every route handler.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use crate::email::Mailer;
use crate::store::Store;
use crate::Config;

/// Cloned into each request; the store is shared behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: Config,
    /// Present only when an email provider is configured.
    pub mailer: Option<Mailer>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: Config) -> Result<Self> {
        // ---
        let timeout = Duration::from_secs(config.http_timeout_secs);
        let mailer = config
            .email
            .clone()
            .map(|email| Mailer::new(email, timeout))
            .transpose()?;

        Ok(Self {
            store,
            config,
            mailer,
        })
    }
}
