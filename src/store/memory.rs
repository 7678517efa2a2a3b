//! In-memory store.
//!
//! Used when no `DATABASE_URL` is configured, and by the tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use super::{HealthStore, StoreResult};
use crate::error::StoreError;
use crate::records::{HealthRecord, HealthStats, MetricChanges};

/// Health records held in a sharded concurrent map.
///
/// Per-key writes go through the shard lock, so an insert racing another
/// insert of the same key sees exactly one winner.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: DashMap<String, HealthRecord>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl HealthStore for MemoryStore {
    async fn get(&self, phone_number: &str) -> StoreResult<Option<HealthRecord>> {
        Ok(self.records.get(phone_number).map(|r| r.value().clone()))
    }

    async fn list(&self) -> StoreResult<Vec<HealthRecord>> {
        let mut records: Vec<HealthRecord> =
            self.records.iter().map(|r| r.value().clone()).collect();
        records.sort_by(|a, b| a.phone_number.cmp(&b.phone_number));
        Ok(records)
    }

    async fn insert(&self, record: HealthRecord) -> StoreResult<HealthRecord> {
        match self.records.entry(record.phone_number.clone()) {
            Entry::Occupied(_) => Err(StoreError::Conflict {
                phone_number: record.phone_number,
            }),
            Entry::Vacant(slot) => {
                slot.insert(record.clone());
                Ok(record)
            }
        }
    }

    async fn update(
        &self,
        phone_number: &str,
        changes: MetricChanges,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<HealthRecord>> {
        Ok(self.records.get_mut(phone_number).map(|mut r| {
            r.apply(&changes, now);
            r.clone()
        }))
    }

    async fn delete(&self, phone_number: &str) -> StoreResult<bool> {
        Ok(self.records.remove(phone_number).is_some())
    }

    async fn stats(&self) -> StoreResult<HealthStats> {
        let records = self.list().await?;
        Ok(HealthStats::compute(&records))
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::NewRecord;
    use chrono::Duration;

    fn record(phone: &str, steps: i32) -> HealthRecord {
        HealthRecord::new(
            NewRecord {
                phone_number: phone.to_string(),
                steps,
                avg_heart_rate: 70,
                resting_calories: 1400,
                sleep_hours: 7,
            },
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn insert_then_get() {
        let store = MemoryStore::new();
        let rec = record("5551234567", 100);

        store.insert(rec.clone()).await.unwrap();

        assert_eq!(store.get("5551234567").await.unwrap(), Some(rec));
        assert_eq!(store.get("5550000000").await.unwrap(), None);
    }

    #[tokio::test]
    async fn duplicate_insert_conflicts_and_keeps_original() {
        let store = MemoryStore::new();
        store.insert(record("5551234567", 100)).await.unwrap();

        let err = store.insert(record("5551234567", 999)).await.unwrap_err();

        assert!(matches!(err, StoreError::Conflict { .. }));
        assert_eq!(store.get("5551234567").await.unwrap().unwrap().steps, 100);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn list_is_ordered_by_phone_number() {
        let store = MemoryStore::new();
        for phone in ["5550000003", "5550000001", "5550000002"] {
            store.insert(record(phone, 1)).await.unwrap();
        }

        let phones: Vec<String> = store
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.phone_number)
            .collect();

        assert_eq!(phones, ["5550000001", "5550000002", "5550000003"]);
    }

    #[tokio::test]
    async fn update_merges_and_stamps() {
        let store = MemoryStore::new();
        let rec = store.insert(record("5551234567", 100)).await.unwrap();
        let later = rec.created_at + Duration::seconds(1);

        let updated = store
            .update("5551234567", MetricChanges::steps(500), later)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.steps, 500);
        assert_eq!(updated.sleep_hours, 7);
        assert_eq!(updated.updated_at, later);
        assert_eq!(store.get("5551234567").await.unwrap(), Some(updated));
    }

    #[tokio::test]
    async fn update_missing_returns_none() {
        let store = MemoryStore::new();
        let result = store
            .update("5551234567", MetricChanges::steps(1), Utc::now())
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn delete_reports_whether_removed() {
        let store = MemoryStore::new();
        store.insert(record("5551234567", 100)).await.unwrap();

        assert!(store.delete("5551234567").await.unwrap());
        assert!(!store.delete("5551234567").await.unwrap());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn stats_over_empty_store() {
        let store = MemoryStore::new();
        assert_eq!(store.stats().await.unwrap(), HealthStats::empty());
    }
}
