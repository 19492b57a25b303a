//! Persistence boundary for devices, reading history, and accounts.
//!
//! Route handlers only see the [`Store`] trait. [`PgStore`] backs it with
//! PostgreSQL; [`MemoryStore`] keeps everything in process and is used by
//! tests and by `DATABASE_URL=memory://`.
//!
//! Mutations keyed by id report whether the document existed, so handlers
//! can map a missing document to 404 without a separate read.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::models::{Device, DeviceStatus, DeviceUpdate, Person, PersonUpdate, Reading};

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Document-style storage used by the HTTP layer.
#[async_trait]
pub trait Store: Send + Sync {
    // ---
    /// Insert or overwrite the device document keyed by `device.pm_id`.
    async fn upsert_device(&self, device: &Device) -> Result<(), StoreError>;

    /// All devices, ordered by `pm_id`.
    async fn list_devices(&self) -> Result<Vec<Device>, StoreError>;

    /// Merge `update` into an existing device. `Ok(None)` if it does not exist.
    async fn update_device(
        &self,
        pm_id: &str,
        update: &DeviceUpdate,
    ) -> Result<Option<Device>, StoreError>;

    /// Returns `false` if the device does not exist.
    async fn set_device_status(&self, pm_id: &str, status: DeviceStatus)
        -> Result<bool, StoreError>;

    /// Returns `false` if the device does not exist.
    async fn delete_device(&self, pm_id: &str) -> Result<bool, StoreError>;

    /// Append one reading to the history.
    async fn append_reading(&self, reading: &Reading) -> Result<(), StoreError>;

    /// Readings in ingestion order, for one device or all of them.
    async fn history(&self, pm_id: Option<&str>) -> Result<Vec<Reading>, StoreError>;

    /// Insert a new person. Fails with [`StoreError::Duplicate`] if the id or
    /// email is already taken; existing accounts are never overwritten.
    async fn insert_person(&self, person: &Person) -> Result<(), StoreError>;

    async fn get_person(&self, id: &str) -> Result<Option<Person>, StoreError>;

    async fn find_person_by_email(&self, email: &str) -> Result<Option<Person>, StoreError>;

    /// All people, ordered by id.
    async fn list_people(&self) -> Result<Vec<Person>, StoreError>;

    /// Merge `update` into an existing person. Returns `false` if missing.
    ///
    /// Fails with [`StoreError::Duplicate`] if the new email belongs to
    /// another person.
    async fn update_person(&self, id: &str, update: &PersonUpdate) -> Result<bool, StoreError>;

    /// Returns `false` if the person does not exist.
    async fn delete_person(&self, id: &str) -> Result<bool, StoreError>;
}
