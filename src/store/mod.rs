//! Data store for health records.
//!
//! This module handles:
//! - The repository interface used by the controller
//! - An in-memory store for development and tests
//! - A PostgreSQL store backed by the `health_data` table

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::StoreError;
use crate::records::{HealthRecord, HealthStats, MetricChanges};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Result alias for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Repository over health records keyed by phone number.
///
/// Every write is a single atomic operation on one row. Concurrent writes to
/// the same key are applied in arrival order; the last one wins.
#[async_trait]
pub trait HealthStore: Send + Sync + 'static {
    /// Fetch one record.
    async fn get(&self, phone_number: &str) -> StoreResult<Option<HealthRecord>>;

    /// All records, ordered by phone number.
    async fn list(&self) -> StoreResult<Vec<HealthRecord>>;

    /// Insert a new record.
    ///
    /// # Errors
    /// Returns [`StoreError::Conflict`] if the key already exists; the stored
    /// row is left untouched.
    async fn insert(&self, record: HealthRecord) -> StoreResult<HealthRecord>;

    /// Apply changes to an existing record and stamp `updated_at`.
    ///
    /// Returns `None` if the key does not exist.
    async fn update(
        &self,
        phone_number: &str,
        changes: MetricChanges,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<HealthRecord>>;

    /// Remove a record. Returns whether a row was removed.
    async fn delete(&self, phone_number: &str) -> StoreResult<bool>;

    /// Aggregate statistics over all records.
    async fn stats(&self) -> StoreResult<HealthStats>;

    /// Check the store is reachable.
    async fn ping(&self) -> StoreResult<()>;
}
