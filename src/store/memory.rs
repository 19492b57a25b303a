//! In-process [`Store`] backed by ordered maps.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::Store;
use crate::error::StoreError;
use crate::models::{Device, DeviceStatus, DeviceUpdate, Person, PersonUpdate, Reading};

#[derive(Debug, Default)]
struct Collections {
    devices: BTreeMap<String, Device>,
    readings: Vec<Reading>,
    people: BTreeMap<String, Person>,
}

impl Collections {
    /// Whether someone other than `id` already uses `email`.
    fn email_taken(&self, email: &str, id: &str) -> bool {
        self.people.values().any(|p| p.email == email && p.id != id)
    }
}

/// Volatile store with the same ordering guarantees as [`super::PgStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    // ---
    async fn upsert_device(&self, device: &Device) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.devices.insert(device.pm_id.clone(), device.clone());
        Ok(())
    }

    async fn list_devices(&self) -> Result<Vec<Device>, StoreError> {
        Ok(self.inner.read().await.devices.values().cloned().collect())
    }

    async fn update_device(
        &self,
        pm_id: &str,
        update: &DeviceUpdate,
    ) -> Result<Option<Device>, StoreError> {
        let mut inner = self.inner.write().await;
        Ok(inner.devices.get_mut(pm_id).map(|device| {
            device.merge(update);
            device.clone()
        }))
    }

    async fn set_device_status(
        &self,
        pm_id: &str,
        status: DeviceStatus,
    ) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        match inner.devices.get_mut(pm_id) {
            Some(device) => {
                device.status = status.as_str().to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_device(&self, pm_id: &str) -> Result<bool, StoreError> {
        Ok(self.inner.write().await.devices.remove(pm_id).is_some())
    }

    async fn append_reading(&self, reading: &Reading) -> Result<(), StoreError> {
        self.inner.write().await.readings.push(reading.clone());
        Ok(())
    }

    async fn history(&self, pm_id: Option<&str>) -> Result<Vec<Reading>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .readings
            .iter()
            .filter(|r| pm_id.map_or(true, |id| r.pm_id == id))
            .cloned()
            .collect())
    }

    async fn insert_person(&self, person: &Person) -> Result<(), StoreError> {
        // ---
        let mut inner = self.inner.write().await;
        if inner.people.contains_key(&person.id) {
            return Err(StoreError::Duplicate(format!("id {}", person.id)));
        }
        if inner.email_taken(&person.email, &person.id) {
            return Err(StoreError::Duplicate(format!("email {}", person.email)));
        }
        inner.people.insert(person.id.clone(), person.clone());
        Ok(())
    }

    async fn get_person(&self, id: &str) -> Result<Option<Person>, StoreError> {
        Ok(self.inner.read().await.people.get(id).cloned())
    }

    async fn find_person_by_email(&self, email: &str) -> Result<Option<Person>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.people.values().find(|p| p.email == email).cloned())
    }

    async fn list_people(&self) -> Result<Vec<Person>, StoreError> {
        Ok(self.inner.read().await.people.values().cloned().collect())
    }

    async fn update_person(&self, id: &str, update: &PersonUpdate) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        if let Some(email) = &update.email {
            if inner.email_taken(email, id) {
                return Err(StoreError::Duplicate(format!("email {email}")));
            }
        }
        match inner.people.get_mut(id) {
            Some(person) => {
                person.merge(update);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_person(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self.inner.write().await.people.remove(id).is_some())
    }
}
