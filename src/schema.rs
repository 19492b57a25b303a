//! Database schema management for `pm25-monitor`.
//!
//! Ensures required tables and indexes exist before serving requests.
//! Applied once on startup from `main.rs` when a PostgreSQL store is used.

use anyhow::Result;
use sqlx::PgPool;

// ---

/// Create or update the database schema (idempotent).
///
/// Creates `devices` (latest state per device), `readings` (append-only
/// history) and `people` (admins and users). Safe to call on every startup;
/// no-op if objects already exist.
///
/// Errors are propagated if any SQL execution fails.
pub async fn create_schema(pool: &PgPool) -> Result<()> {
    // ---
    let mut tx = pool.begin().await?;

    // Latest reported state, one row per device, upserted by ingestion
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS devices (
            pm_id     TEXT PRIMARY KEY,
            pm1       DOUBLE PRECISION NOT NULL DEFAULT 0,
            pm2_5     DOUBLE PRECISION NOT NULL DEFAULT 0,
            pm10      DOUBLE PRECISION NOT NULL DEFAULT 0,
            address   TEXT NOT NULL,
            location  TEXT NOT NULL,
            status    TEXT NOT NULL,
            timestamp TEXT NOT NULL
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    // History served by `/api/history`; `seq` preserves ingestion order
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS readings (
            seq           BIGSERIAL PRIMARY KEY,
            id            UUID        NOT NULL UNIQUE,
            pm_id         TEXT        NOT NULL,
            timestamp     TEXT        NOT NULL,
            pm1           DOUBLE PRECISION NOT NULL,
            pm2_5         DOUBLE PRECISION NOT NULL,
            pm10          DOUBLE PRECISION NOT NULL,
            sensor_status TEXT        NOT NULL,
            received_at   TIMESTAMPTZ NOT NULL
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS people (
            id            TEXT PRIMARY KEY,
            role          TEXT NOT NULL,
            name          TEXT NOT NULL,
            email         TEXT NOT NULL,
            phone         TEXT NOT NULL,
            date          TEXT NOT NULL,
            password_hash TEXT
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_readings_pm_id
            ON readings (pm_id, seq);
        "#,
    )
    .execute(&mut *tx)
    .await?;

    // Login resolves accounts by email, so it must be unique
    sqlx::query("DROP INDEX IF EXISTS idx_people_email;")
        .execute(&mut *tx)
        .await?;

    sqlx::query(
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS uq_people_email
            ON people (email);
        "#,
    )
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}
