//! PostgreSQL store tests.
//!
//! These tests require a DATABASE_URL pointing at a database with the
//! `health_data` table. Run with: cargo test --test postgres_store_test -- --ignored

use chrono::Utc;

use health_metrics_api::error::StoreError;
use health_metrics_api::records::{HealthRecord, MetricChanges, NewRecord};
use health_metrics_api::store::{HealthStore, PgStore};

/// Connect to the test database, if configured.
async fn test_store() -> Option<PgStore> {
    dotenvy::dotenv().ok();
    let url = std::env::var("DATABASE_URL").ok()?;
    PgStore::connect(&url, 2).await.ok()
}

fn record(phone: &str) -> HealthRecord {
    HealthRecord::new(
        NewRecord {
            phone_number: phone.to_string(),
            steps: 5000,
            avg_heart_rate: 70,
            resting_calories: 1500,
            sleep_hours: 7,
        },
        Utc::now(),
    )
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn crud_cycle() {
    let Some(store) = test_store().await else {
        println!("Skipping: DATABASE_URL not set or unreachable");
        return;
    };
    let phone = "99900000001";
    store.delete(phone).await.unwrap();

    let inserted = store.insert(record(phone)).await.unwrap();
    assert_eq!(store.get(phone).await.unwrap().unwrap().steps, inserted.steps);

    let err = store.insert(record(phone)).await.unwrap_err();
    assert!(matches!(err, StoreError::Conflict { .. }));

    let updated = store
        .update(phone, MetricChanges::steps(6000), Utc::now())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.steps, 6000);
    assert_eq!(updated.sleep_hours, 7);
    assert!(updated.updated_at >= updated.created_at);

    assert!(store.stats().await.unwrap().total_users >= 1);
    assert!(store.delete(phone).await.unwrap());
    assert!(store.get(phone).await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn ping_succeeds() {
    let Some(store) = test_store().await else {
        println!("Skipping: DATABASE_URL not set or unreachable");
        return;
    };
    store.ping().await.unwrap();
}
