//! Configuration loader for the `pm25-monitor` service.
//!
//! All runtime settings are read from environment variables once at startup
//! (with optional `.env` support provided by the caller) and frozen into a
//! [`Config`] snapshot. Nothing else in the crate calls `env::var`.
use std::{env, net::SocketAddr};

use anyhow::{anyhow, Result};
use chrono::{FixedOffset, Offset, Utc};

/// Parse an optional numeric environment variable with a default value.
macro_rules! parse_env {
    ($var_name:expr, $ty:ty, $default:expr) => {
        env::var($var_name)
            .ok()
            .map(|v| v.parse::<$ty>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Parse a required string environment variable.
macro_rules! require_env {
    ($var_name:expr) => {
        env::var($var_name)
            .map_err(|_| anyhow!("{} must be set in .env or environment", $var_name))?
    };
}

/// Value of `DATABASE_URL` that selects the in-process store.
pub const MEMORY_DB_URL: &str = "memory://";

/// Settings for the outbound email provider.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    // ---
    /// HTTP endpoint that accepts `{from, to, subject, text}` JSON.
    pub api_url: String,

    /// Optional bearer token sent with every request.
    pub api_key: Option<String>,

    /// Sender address placed in the `from` field.
    pub from: String,
}

/// Strongly typed application configuration.
///
/// All fields are immutable after loading, ensuring a consistent configuration
/// snapshot for the lifetime of the application.
#[derive(Debug, Clone)]
pub struct Config {
    // ---
    /// PostgreSQL connection string, or [`MEMORY_DB_URL`].
    pub db_url: String,

    /// Maximum number of database connections in the pool.
    pub db_pool_max: u32,

    /// Address the HTTP server binds to.
    pub bind_addr: SocketAddr,

    /// Zone used to truncate timestamps into hour/day buckets and labels.
    pub display_offset: FixedOffset,

    /// Timeout applied to outbound HTTP calls (email provider, devices).
    pub http_timeout_secs: u64,

    /// Email provider, if alerts are enabled.
    pub email: Option<EmailConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_url: MEMORY_DB_URL.to_string(),
            db_pool_max: 5,
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3005)),
            display_offset: bangkok_offset(),
            http_timeout_secs: 10,
            email: None,
        }
    }
}

/// Load configuration from environment variables with defaults.
///
/// Required:
/// - `DATABASE_URL` – PostgreSQL connection string (or `memory://`)
///
/// Optional:
/// - `DB_POOL_MAX` – max DB connections (default: 5)
/// - `BIND_ADDR` – listen address (default: `0.0.0.0:3005`)
/// - `DISPLAY_UTC_OFFSET_MINUTES` – bucket/label zone (default: 420, UTC+7)
/// - `HTTP_TIMEOUT_SECS` – outbound HTTP timeout (default: 10)
/// - `EMAIL_API_URL`, `EMAIL_API_KEY`, `EMAIL_FROM` – email alerts
///
/// Returns an error if any required variable is missing or invalid.
pub fn load_from_env() -> Result<Config> {
    // ---
    let db_url = require_env!("DATABASE_URL");
    let db_pool_max = parse_env!("DB_POOL_MAX", u32, 5);
    let bind_addr = parse_env!(
        "BIND_ADDR",
        SocketAddr,
        SocketAddr::from(([0, 0, 0, 0], 3005))
    );
    let offset_minutes = parse_env!("DISPLAY_UTC_OFFSET_MINUTES", i32, 7 * 60);
    let http_timeout_secs = parse_env!("HTTP_TIMEOUT_SECS", u64, 10);

    let display_offset = FixedOffset::east_opt(offset_minutes * 60)
        .ok_or_else(|| anyhow!("Invalid DISPLAY_UTC_OFFSET_MINUTES: {}", offset_minutes))?;

    let email = env::var("EMAIL_API_URL").ok().map(|api_url| EmailConfig {
        api_url,
        api_key: env::var("EMAIL_API_KEY").ok(),
        from: env::var("EMAIL_FROM").unwrap_or_else(|_| "alerts@localhost".to_string()),
    });

    Ok(Config {
        db_url,
        db_pool_max,
        bind_addr,
        display_offset,
        http_timeout_secs,
        email,
    })
}

fn bangkok_offset() -> FixedOffset {
    FixedOffset::east_opt(7 * 3600).unwrap_or(Utc.fix())
}

/// Replace the password in a connection URL with `****`.
fn mask_password(url: &str) -> String {
    // ---
    if let Some(at_pos) = url.rfind('@') {
        if let Some(colon_pos) = url[..at_pos].rfind(':') {
            // only colon is the scheme separator: no password present
            if !url[..colon_pos].contains("//") {
                return url.to_string();
            }
            return format!("{}:****{}", &url[..colon_pos], &url[at_pos..]);
        }
    }
    url.to_string()
}

impl Config {
    /// Log the loaded configuration for debugging purposes.
    ///
    /// Masks the database password and the email API key.
    pub fn log_config(&self) {
        // ---
        tracing::info!("Configuration loaded:");
        tracing::info!("  DATABASE_URL      : {}", mask_password(&self.db_url));
        tracing::info!("  DB_POOL_MAX       : {}", self.db_pool_max);
        tracing::info!("  BIND_ADDR         : {}", self.bind_addr);
        tracing::info!("  DISPLAY_OFFSET    : {}", self.display_offset);
        tracing::info!("  HTTP_TIMEOUT_SECS : {}", self.http_timeout_secs);
        match &self.email {
            Some(email) => {
                tracing::info!("  EMAIL_API_URL     : {}", email.api_url);
                tracing::info!(
                    "  EMAIL_API_KEY     : {}",
                    if email.api_key.is_some() { "****" } else { "<none>" }
                );
                tracing::info!("  EMAIL_FROM        : {}", email.from);
            }
            None => tracing::info!("  EMAIL_API_URL     : <disabled>"),
        }
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn masks_password_in_db_url() {
        let masked = mask_password("postgres://pm:secret@db:5432/pm25");
        assert_eq!(masked, "postgres://pm:****@db:5432/pm25");
    }

    #[test]
    fn leaves_url_without_password_alone() {
        assert_eq!(mask_password("postgres://db/pm25"), "postgres://db/pm25");
        assert_eq!(mask_password("postgres://pm@db/pm25"), "postgres://pm@db/pm25");
        assert_eq!(mask_password(MEMORY_DB_URL), MEMORY_DB_URL);
    }

    #[test]
    fn default_config_uses_bangkok_time() {
        let cfg = Config::default();
        assert_eq!(cfg.display_offset.local_minus_utc(), 7 * 3600);
        assert_eq!(cfg.bind_addr.port(), 3005);
        assert!(cfg.email.is_none());
    }
}
