//! Data models for devices, reading history, and accounts.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

// ---

/// Placeholder stored when a device does not report its address.
pub const UNKNOWN_ADDRESS: &str = "unknown";

/// Placeholder stored when a device does not report its location.
pub const UNSPECIFIED_LOCATION: &str = "unspecified";

/// Sensor status recorded when a payload carries none.
pub const UNKNOWN_SENSOR_STATUS: &str = "Unknown";

/// A device counts as online when its last update is at most this old.
pub const ONLINE_WINDOW_SECS: i64 = 30;

/// Raw ingestion payload as posted by a device.
///
/// Field aliases accept the camel-case names older firmware sends. Numeric
/// fields are kept as raw JSON so that coercion happens in one place,
/// [`IngestPayload::into_records`].
#[derive(Debug, Default, Deserialize)]
pub struct IngestPayload {
    // ---
    #[serde(default, alias = "pmId")]
    pub pm_id: Option<String>,
    #[serde(default, alias = "PM1")]
    pub pm1: Option<Value>,
    #[serde(default, alias = "PM2_5")]
    pub pm2_5: Option<Value>,
    #[serde(default, alias = "PM10")]
    pub pm10: Option<Value>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, alias = "sensorStatus")]
    pub sensor_status: Option<String>,
}

/// Reasons an ingestion payload is rejected outright.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum IngestError {
    #[error("pm_id is required.")]
    MissingDeviceId,
}

/// One stored sensor sample in a device's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Reading {
    // ---
    pub id: Uuid,
    pub pm_id: String,
    /// Source clock, exactly as reported. May be empty or unparseable.
    pub timestamp: String,
    pub pm1: f64,
    pub pm2_5: f64,
    pub pm10: f64,
    pub sensor_status: String,
    pub received_at: DateTime<Utc>,
}

/// Latest known state of a device, keyed by `pm_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Device {
    // ---
    pub pm_id: String,
    pub pm1: f64,
    pub pm2_5: f64,
    pub pm10: f64,
    pub address: String,
    pub location: String,
    pub status: String,
    pub timestamp: String,
}

/// Administrative on/off state of a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceStatus {
    Active,
    Inactive,
}

impl DeviceStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "active" => Some(Self::Active),
            "inactive" => Some(Self::Inactive),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }
}

/// Partial device update; absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceUpdate {
    // ---
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pm1: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pm2_5: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pm10: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<DeviceStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

/// Account role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "admin" => Some(Self::Admin),
            "user" => Some(Self::User),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::User => "user",
        }
    }
}

/// An administrator or end user.
///
/// The bcrypt hash never leaves the service: it is skipped on serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    // ---
    pub id: String,
    pub role: Role,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub date: String,
    #[serde(default, skip_serializing)]
    pub password_hash: Option<String>,
}

/// Partial account update; absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersonUpdate {
    // ---
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub date: Option<String>,
    pub password_hash: Option<String>,
}

// ---

/// Parse a device timestamp.
///
/// Accepts RFC 3339 and naive `YYYY-MM-DD HH:MM:SS` / `YYYY-MM-DDTHH:MM:SS`
/// (read as UTC). Anything else yields `None`.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    // ---
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Coerce a raw PM field to a non-negative finite number, defaulting to 0.
fn coerce_pm(field: &str, value: Option<&Value>) -> f64 {
    // ---
    let parsed = match value {
        None | Some(Value::Null) => return 0.0,
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(_) => None,
    };
    match parsed {
        Some(v) if v.is_finite() && v >= 0.0 => v,
        _ => {
            tracing::warn!("Coercing malformed {} value {:?} to 0", field, value);
            0.0
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl IngestPayload {
    // ---
    /// Validate the payload and produce the device document and history row.
    ///
    /// Every field not present in the payload is set to a neutral default
    /// instead of being omitted.
    pub fn into_records(self, received_at: DateTime<Utc>) -> Result<(Device, Reading), IngestError> {
        // ---
        let pm_id = non_blank(self.pm_id).ok_or(IngestError::MissingDeviceId)?;

        let pm1 = coerce_pm("pm1", self.pm1.as_ref());
        let pm2_5 = coerce_pm("pm2_5", self.pm2_5.as_ref());
        let pm10 = coerce_pm("pm10", self.pm10.as_ref());

        let status = match self.status.as_deref().map(DeviceStatus::parse) {
            Some(Some(status)) => status,
            Some(None) => {
                tracing::warn!("Unknown status {:?} for {}, storing inactive", self.status, pm_id);
                DeviceStatus::Inactive
            }
            None => DeviceStatus::Inactive,
        };
        let timestamp = self.timestamp.unwrap_or_default();

        let device = Device {
            pm_id: pm_id.clone(),
            pm1,
            pm2_5,
            pm10,
            address: non_blank(self.address).unwrap_or_else(|| UNKNOWN_ADDRESS.to_string()),
            location: non_blank(self.location).unwrap_or_else(|| UNSPECIFIED_LOCATION.to_string()),
            status: status.as_str().to_string(),
            timestamp: timestamp.clone(),
        };

        let reading = Reading {
            id: Uuid::new_v4(),
            pm_id,
            timestamp,
            pm1,
            pm2_5,
            pm10,
            sensor_status: non_blank(self.sensor_status)
                .unwrap_or_else(|| UNKNOWN_SENSOR_STATUS.to_string()),
            received_at,
        };

        Ok((device, reading))
    }
}

impl Reading {
    /// Instant the sample was taken, if the source timestamp is valid.
    pub fn observed_at(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.timestamp)
    }
}

impl Device {
    // ---
    /// Whether the device reported within [`ONLINE_WINDOW_SECS`] of `now`.
    ///
    /// PM fields are always populated after ingestion coercion, so freshness
    /// of the last update decides on its own. A timestamp ahead of `now`
    /// (device clock skew) counts as offline.
    pub fn is_online(&self, now: DateTime<Utc>) -> bool {
        match parse_timestamp(&self.timestamp) {
            Some(last) => (0..=ONLINE_WINDOW_SECS).contains(&(now - last).num_seconds()),
            None => false,
        }
    }

    /// Apply a partial update in place.
    pub fn merge(&mut self, update: &DeviceUpdate) {
        // ---
        if let Some(v) = update.pm1 {
            self.pm1 = v;
        }
        if let Some(v) = update.pm2_5 {
            self.pm2_5 = v;
        }
        if let Some(v) = update.pm10 {
            self.pm10 = v;
        }
        if let Some(v) = &update.address {
            self.address = v.clone();
        }
        if let Some(v) = &update.location {
            self.location = v.clone();
        }
        if let Some(v) = update.status {
            self.status = v.as_str().to_string();
        }
        if let Some(v) = &update.timestamp {
            self.timestamp = v.clone();
        }
    }
}

impl Person {
    /// Apply a partial update in place.
    pub fn merge(&mut self, update: &PersonUpdate) {
        // ---
        if let Some(v) = &update.name {
            self.name = v.clone();
        }
        if let Some(v) = &update.email {
            self.email = v.clone();
        }
        if let Some(v) = &update.phone {
            self.phone = v.clone();
        }
        if let Some(v) = &update.date {
            self.date = v.clone();
        }
        if let Some(v) = &update.password_hash {
            self.password_hash = Some(v.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn received() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 26, 18, 45, 0).unwrap()
    }

    fn payload(body: Value) -> IngestPayload {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn test_ingest_defaults_missing_fields() {
        // ---
        let (device, reading) = payload(json!({ "pm_id": "IOTGPY2024" }))
            .into_records(received())
            .unwrap();

        assert_eq!(device.pm_id, "IOTGPY2024");
        assert_eq!(device.pm1, 0.0);
        assert_eq!(device.pm2_5, 0.0);
        assert_eq!(device.pm10, 0.0);
        assert_eq!(device.address, UNKNOWN_ADDRESS);
        assert_eq!(device.location, UNSPECIFIED_LOCATION);
        assert_eq!(device.status, "inactive");
        assert_eq!(device.timestamp, "");

        assert_eq!(reading.pm_id, "IOTGPY2024");
        assert_eq!(reading.sensor_status, UNKNOWN_SENSOR_STATUS);
        assert_eq!(reading.received_at, received());
    }

    #[test]
    fn test_ingest_accepts_legacy_field_names() {
        // ---
        let (device, reading) = payload(json!({
            "pmId": "dev-1",
            "PM1": 4.5,
            "PM2_5": "12.25",
            "PM10": 20,
            "status": "active",
            "sensorStatus": "ok",
            "timestamp": "2025-03-26T18:45:00Z"
        }))
        .into_records(received())
        .unwrap();

        assert_eq!(device.pm1, 4.5);
        assert_eq!(device.pm2_5, 12.25);
        assert_eq!(device.pm10, 20.0);
        assert_eq!(device.status, "active");
        assert_eq!(reading.sensor_status, "ok");
        assert_eq!(reading.observed_at(), Some(received()));
    }

    #[test]
    fn test_ingest_rejects_missing_device_id() {
        // ---
        let err = payload(json!({ "PM2_5": 10 })).into_records(received());
        assert_eq!(err.unwrap_err(), IngestError::MissingDeviceId);

        let err = payload(json!({ "pm_id": "   " })).into_records(received());
        assert_eq!(err.unwrap_err(), IngestError::MissingDeviceId);
    }

    #[test]
    fn test_ingest_coerces_malformed_numbers() {
        // ---
        let (device, _) = payload(json!({
            "pm_id": "dev-1",
            "pm1": "n/a",
            "pm2_5": -3.0,
            "pm10": [1, 2]
        }))
        .into_records(received())
        .unwrap();

        assert_eq!(device.pm1, 0.0);
        assert_eq!(device.pm2_5, 0.0);
        assert_eq!(device.pm10, 0.0);
    }

    #[test]
    fn test_unknown_status_is_stored_inactive() {
        let (device, _) = payload(json!({ "pm_id": "dev-1", "status": "rebooting" }))
            .into_records(received())
            .unwrap();
        assert_eq!(device.status, "inactive");
    }

    #[test]
    fn test_parse_timestamp_formats() {
        // ---
        let expected = Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2025-01-01T12:00:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2025-01-01T19:00:00+07:00"), Some(expected));
        assert_eq!(parse_timestamp("2025-01-01 12:00:00"), Some(expected));
        assert_eq!(parse_timestamp("2025-01-01T12:00:00"), Some(expected));
        assert_eq!(parse_timestamp("2025-01-01 12:00"), Some(expected));
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn test_device_online_window() {
        // ---
        let now = received();
        let mut device = Device {
            pm_id: "dev-1".to_string(),
            pm1: 1.0,
            pm2_5: 2.0,
            pm10: 3.0,
            address: UNKNOWN_ADDRESS.to_string(),
            location: UNSPECIFIED_LOCATION.to_string(),
            status: "active".to_string(),
            timestamp: "2025-03-26T18:44:30Z".to_string(),
        };
        assert!(device.is_online(now));

        device.timestamp = "2025-03-26T18:44:29Z".to_string();
        assert!(!device.is_online(now));

        device.timestamp = String::new();
        assert!(!device.is_online(now));
    }

    #[test]
    fn test_device_from_the_future_is_offline() {
        // ---
        let now = received();
        let mut device = Device {
            pm_id: "dev-1".to_string(),
            pm1: 1.0,
            pm2_5: 2.0,
            pm10: 3.0,
            address: UNKNOWN_ADDRESS.to_string(),
            location: UNSPECIFIED_LOCATION.to_string(),
            status: "active".to_string(),
            timestamp: "2025-03-26T18:45:00Z".to_string(),
        };
        assert!(device.is_online(now));

        device.timestamp = "2025-03-26T18:45:01Z".to_string();
        assert!(!device.is_online(now));

        device.timestamp = "2026-03-26T18:45:00Z".to_string();
        assert!(!device.is_online(now));
    }

    #[test]
    fn test_device_merge_keeps_absent_fields() {
        // ---
        let (mut device, _) = payload(json!({ "pm_id": "dev-1", "address": "Building 4" }))
            .into_records(received())
            .unwrap();

        device.merge(&DeviceUpdate {
            location: Some("Roof".to_string()),
            status: Some(DeviceStatus::Active),
            ..Default::default()
        });

        assert_eq!(device.address, "Building 4");
        assert_eq!(device.location, "Roof");
        assert_eq!(device.status, "active");
    }

    #[test]
    fn test_person_hash_is_never_serialized() {
        // ---
        let person = Person {
            id: "a-1".to_string(),
            role: Role::Admin,
            name: "Admin".to_string(),
            email: "admin@example.com".to_string(),
            phone: "0800000000".to_string(),
            date: "2025-01-01".to_string(),
            password_hash: Some("$2b$10$hash".to_string()),
        };

        let body = serde_json::to_value(&person).unwrap();
        assert!(body.get("password_hash").is_none());
        assert_eq!(body["role"], "admin");
    }
}
