//! Live checks of `PgStore` SQL against a real PostgreSQL.
//!
//! Run with `DATABASE_URL=postgres://... cargo test -- --ignored`.

use anyhow::Result;
use chrono::Utc;
use sqlx::postgres::PgPoolOptions;
use tokio::sync::OnceCell;
use uuid::Uuid;

use pm25_monitor::models::{
    Device, DeviceStatus, DeviceUpdate, Person, PersonUpdate, Reading, Role,
};
use pm25_monitor::schema;
use pm25_monitor::store::{PgStore, Store};
use pm25_monitor::StoreError;

// ---

static SCHEMA: OnceCell<()> = OnceCell::const_new();

/// `None` when `DATABASE_URL` is unset so an explicit `--ignored` run
/// without a database still passes.
async fn connect() -> Result<Option<PgStore>> {
    // ---
    let Ok(url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set; skipping");
        return Ok(None);
    };

    let pool = PgPoolOptions::new().max_connections(2).connect(&url).await?;
    SCHEMA
        .get_or_try_init(|| schema::create_schema(&pool))
        .await?;
    Ok(Some(PgStore::new(pool)))
}

fn unique(prefix: &str) -> String {
    format!("{prefix}-{}", Uuid::new_v4().simple())
}

fn device(pm_id: &str) -> Device {
    Device {
        pm_id: pm_id.to_string(),
        pm1: 1.0,
        pm2_5: 2.0,
        pm10: 3.0,
        address: "Building 4".to_string(),
        location: "unspecified".to_string(),
        status: "inactive".to_string(),
        timestamp: String::new(),
    }
}

fn reading(pm_id: &str, pm2_5: f64) -> Reading {
    Reading {
        id: Uuid::new_v4(),
        pm_id: pm_id.to_string(),
        timestamp: "2025-03-01T09:15:00Z".to_string(),
        pm1: 0.0,
        pm2_5,
        pm10: 0.0,
        sensor_status: "ok".to_string(),
        received_at: Utc::now(),
    }
}

fn person(id: &str, email: &str) -> Person {
    Person {
        id: id.to_string(),
        role: Role::Admin,
        name: "Admin".to_string(),
        email: email.to_string(),
        phone: "0800000000".to_string(),
        date: "2025-01-01".to_string(),
        password_hash: Some("hash".to_string()),
    }
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn device_updates_merge_in_sql() -> Result<()> {
    // ---
    let Some(store) = connect().await? else {
        return Ok(());
    };
    let id = unique("dev");
    store.upsert_device(&device(&id)).await?;

    let update = DeviceUpdate {
        location: Some("Roof".to_string()),
        pm2_5: Some(42.0),
        ..DeviceUpdate::default()
    };
    let merged = store.update_device(&id, &update).await?.expect("device exists");
    assert_eq!(merged.location, "Roof");
    assert_eq!(merged.address, "Building 4");
    assert_eq!(merged.pm2_5, 42.0);
    assert_eq!(merged.pm10, 3.0);

    assert!(store.set_device_status(&id, DeviceStatus::Active).await?);
    let listed = store.list_devices().await?;
    let stored = listed.iter().find(|d| d.pm_id == id).expect("listed");
    assert_eq!(stored.status, "active");

    assert!(store.update_device(&unique("ghost"), &update).await?.is_none());
    assert!(store.delete_device(&id).await?);
    assert!(!store.delete_device(&id).await?);
    Ok(())
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn history_filters_by_device_in_ingestion_order() -> Result<()> {
    // ---
    let Some(store) = connect().await? else {
        return Ok(());
    };
    let a = unique("a");
    let b = unique("b");
    store.append_reading(&reading(&a, 1.0)).await?;
    store.append_reading(&reading(&b, 2.0)).await?;
    store.append_reading(&reading(&a, 3.0)).await?;

    let only_a: Vec<f64> = store.history(Some(a.as_str())).await?.iter().map(|r| r.pm2_5).collect();
    assert_eq!(only_a, [1.0, 3.0]);

    let ours: Vec<f64> = store
        .history(None)
        .await?
        .iter()
        .filter(|r| r.pm_id == a || r.pm_id == b)
        .map(|r| r.pm2_5)
        .collect();
    assert_eq!(ours, [1.0, 2.0, 3.0]);
    Ok(())
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn people_ids_and_emails_stay_unique() -> Result<()> {
    // ---
    let Some(store) = connect().await? else {
        return Ok(());
    };
    let a = unique("adm");
    let b = unique("adm");
    let a_email = format!("{a}@example.com");
    let b_email = format!("{b}@example.com");
    store.insert_person(&person(&a, &a_email)).await?;
    store.insert_person(&person(&b, &b_email)).await?;

    let mut same_id = person(&a, &format!("{}@example.com", unique("x")));
    same_id.role = Role::User;
    assert!(matches!(
        store.insert_person(&same_id).await,
        Err(StoreError::Duplicate(_))
    ));
    assert_eq!(store.get_person(&a).await?.expect("kept").role, Role::Admin);

    let steal = PersonUpdate {
        email: Some(a_email.clone()),
        ..PersonUpdate::default()
    };
    assert!(matches!(
        store.update_person(&b, &steal).await,
        Err(StoreError::Duplicate(_))
    ));

    let phone = PersonUpdate {
        phone: Some("0811111111".to_string()),
        ..PersonUpdate::default()
    };
    assert!(store.update_person(&b, &phone).await?);
    let found = store.find_person_by_email(&b_email).await?.expect("found");
    assert_eq!(found.phone, "0811111111");
    assert_eq!(found.password_hash.as_deref(), Some("hash"));

    assert!(store.delete_person(&a).await?);
    assert!(store.delete_person(&b).await?);
    Ok(())
}
