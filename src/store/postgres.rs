//! PostgreSQL-backed [`Store`].

use async_trait::async_trait;
use sqlx::PgPool;

use super::Store;
use crate::error::StoreError;
use crate::models::{Device, DeviceStatus, DeviceUpdate, Person, PersonUpdate, Reading, Role};

// ---

const DEVICE_COLUMNS: &str = "pm_id, pm1, pm2_5, pm10, address, location, status, timestamp";
const READING_COLUMNS: &str = "id, pm_id, timestamp, pm1, pm2_5, pm10, sensor_status, received_at";
const PERSON_COLUMNS: &str = "id, role, name, email, phone, date, password_hash";

/// Store over the tables created by [`crate::schema::create_schema`].
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// `people` row before the role column is validated.
#[derive(sqlx::FromRow)]
struct PersonRow {
    id: String,
    role: String,
    name: String,
    email: String,
    phone: String,
    date: String,
    password_hash: Option<String>,
}

impl TryFrom<PersonRow> for Person {
    type Error = StoreError;

    fn try_from(row: PersonRow) -> Result<Self, Self::Error> {
        let role = Role::parse(&row.role)
            .ok_or_else(|| StoreError::Corrupt(format!("role {:?} for {}", row.role, row.id)))?;
        Ok(Person {
            id: row.id,
            role,
            name: row.name,
            email: row.email,
            phone: row.phone,
            date: row.date,
            password_hash: row.password_hash,
        })
    }
}

/// Map a primary-key or `uq_people_email` violation to [`StoreError::Duplicate`].
fn unique_violation(err: sqlx::Error, id: &str) -> StoreError {
    match err.as_database_error() {
        Some(db) if db.is_unique_violation() => StoreError::Duplicate(format!(
            "person {} ({})",
            id,
            db.constraint().unwrap_or("unique")
        )),
        _ => StoreError::Database(err),
    }
}

#[async_trait]
impl Store for PgStore {
    // ---
    async fn upsert_device(&self, device: &Device) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO devices (pm_id, pm1, pm2_5, pm10, address, location, status, timestamp)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (pm_id) DO UPDATE SET
                pm1       = EXCLUDED.pm1,
                pm2_5     = EXCLUDED.pm2_5,
                pm10      = EXCLUDED.pm10,
                address   = EXCLUDED.address,
                location  = EXCLUDED.location,
                status    = EXCLUDED.status,
                timestamp = EXCLUDED.timestamp
            "#,
        )
        .bind(&device.pm_id)
        .bind(device.pm1)
        .bind(device.pm2_5)
        .bind(device.pm10)
        .bind(&device.address)
        .bind(&device.location)
        .bind(&device.status)
        .bind(&device.timestamp)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_devices(&self) -> Result<Vec<Device>, StoreError> {
        let sql = format!("SELECT {DEVICE_COLUMNS} FROM devices ORDER BY pm_id");
        Ok(sqlx::query_as::<_, Device>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn update_device(
        &self,
        pm_id: &str,
        update: &DeviceUpdate,
    ) -> Result<Option<Device>, StoreError> {
        let sql = format!(
            r#"
            UPDATE devices SET
                pm1       = COALESCE($2, pm1),
                pm2_5     = COALESCE($3, pm2_5),
                pm10      = COALESCE($4, pm10),
                address   = COALESCE($5, address),
                location  = COALESCE($6, location),
                status    = COALESCE($7, status),
                timestamp = COALESCE($8, timestamp)
            WHERE pm_id = $1
            RETURNING {DEVICE_COLUMNS}
            "#
        );
        Ok(sqlx::query_as::<_, Device>(&sql)
            .bind(pm_id)
            .bind(update.pm1)
            .bind(update.pm2_5)
            .bind(update.pm10)
            .bind(update.address.as_deref())
            .bind(update.location.as_deref())
            .bind(update.status.map(|s| s.as_str()))
            .bind(update.timestamp.as_deref())
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn set_device_status(
        &self,
        pm_id: &str,
        status: DeviceStatus,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE devices SET status = $2 WHERE pm_id = $1")
            .bind(pm_id)
            .bind(status.as_str())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_device(&self, pm_id: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM devices WHERE pm_id = $1")
            .bind(pm_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn append_reading(&self, reading: &Reading) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO readings (
                id, pm_id, timestamp, pm1, pm2_5, pm10, sensor_status, received_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(reading.id)
        .bind(&reading.pm_id)
        .bind(&reading.timestamp)
        .bind(reading.pm1)
        .bind(reading.pm2_5)
        .bind(reading.pm10)
        .bind(&reading.sensor_status)
        .bind(reading.received_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn history(&self, pm_id: Option<&str>) -> Result<Vec<Reading>, StoreError> {
        let sql = format!(
            "SELECT {READING_COLUMNS} FROM readings \
             WHERE ($1::TEXT IS NULL OR pm_id = $1) ORDER BY seq"
        );
        Ok(sqlx::query_as::<_, Reading>(&sql)
            .bind(pm_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn insert_person(&self, person: &Person) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO people (id, role, name, email, phone, date, password_hash)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(&person.id)
        .bind(person.role.as_str())
        .bind(&person.name)
        .bind(&person.email)
        .bind(&person.phone)
        .bind(&person.date)
        .bind(person.password_hash.as_deref())
        .execute(&self.pool)
        .await
        .map_err(|e| unique_violation(e, &person.id))?;

        Ok(())
    }

    async fn get_person(&self, id: &str) -> Result<Option<Person>, StoreError> {
        let sql = format!("SELECT {PERSON_COLUMNS} FROM people WHERE id = $1");
        sqlx::query_as::<_, PersonRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Person::try_from)
            .transpose()
    }

    async fn find_person_by_email(&self, email: &str) -> Result<Option<Person>, StoreError> {
        let sql = format!("SELECT {PERSON_COLUMNS} FROM people WHERE email = $1 ORDER BY id LIMIT 1");
        sqlx::query_as::<_, PersonRow>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?
            .map(Person::try_from)
            .transpose()
    }

    async fn list_people(&self) -> Result<Vec<Person>, StoreError> {
        let sql = format!("SELECT {PERSON_COLUMNS} FROM people ORDER BY id");
        sqlx::query_as::<_, PersonRow>(&sql)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Person::try_from)
            .collect()
    }

    async fn update_person(&self, id: &str, update: &PersonUpdate) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE people SET
                name          = COALESCE($2, name),
                email         = COALESCE($3, email),
                phone         = COALESCE($4, phone),
                date          = COALESCE($5, date),
                password_hash = COALESCE($6, password_hash)
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(update.name.as_deref())
        .bind(update.email.as_deref())
        .bind(update.phone.as_deref())
        .bind(update.date.as_deref())
        .bind(update.password_hash.as_deref())
        .execute(&self.pool)
        .await
        .map_err(|e| unique_violation(e, id))?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_person(&self, id: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM people WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
