//! PostgreSQL store.
//!
//! Expects an existing table:
//!
//! ```sql
//! CREATE TABLE health_data (
//!     phone_number     VARCHAR(20) PRIMARY KEY,
//!     steps            INTEGER NOT NULL DEFAULT 0,
//!     avg_heart_rate   INTEGER NOT NULL DEFAULT 0,
//!     resting_calories INTEGER NOT NULL DEFAULT 0,
//!     sleep_hours      INTEGER NOT NULL DEFAULT 0,
//!     created_at       TIMESTAMPTZ NOT NULL,
//!     updated_at       TIMESTAMPTZ NOT NULL
//! );
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::debug;

use super::{HealthStore, StoreResult};
use crate::error::StoreError;
use crate::records::{HealthRecord, HealthStats, MetricChanges};

const COLUMNS: &str = "phone_number, steps, avg_heart_rate, resting_calories, sleep_hours, \
                       created_at, updated_at";

/// Health records in PostgreSQL.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Creates a store over an existing pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects a new pool.
    ///
    /// # Errors
    /// Returns an error if the database connection cannot be established.
    pub async fn connect(database_url: &str, max_connections: u32) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        debug!(max_connections, "Connected to PostgreSQL");
        Ok(Self { pool })
    }

    /// Returns the underlying pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl HealthStore for PgStore {
    async fn get(&self, phone_number: &str) -> StoreResult<Option<HealthRecord>> {
        let record = sqlx::query_as::<_, HealthRecord>(&format!(
            "SELECT {COLUMNS} FROM health_data WHERE phone_number = $1"
        ))
        .bind(phone_number)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn list(&self) -> StoreResult<Vec<HealthRecord>> {
        let records = sqlx::query_as::<_, HealthRecord>(&format!(
            "SELECT {COLUMNS} FROM health_data ORDER BY phone_number ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    async fn insert(&self, record: HealthRecord) -> StoreResult<HealthRecord> {
        let result = sqlx::query_as::<_, HealthRecord>(&format!(
            r"
            INSERT INTO health_data ({COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {COLUMNS}
            "
        ))
        .bind(&record.phone_number)
        .bind(record.steps)
        .bind(record.avg_heart_rate)
        .bind(record.resting_calories)
        .bind(record.sleep_hours)
        .bind(record.created_at)
        .bind(record.updated_at)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(inserted) => Ok(inserted),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(StoreError::Conflict {
                    phone_number: record.phone_number,
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn update(
        &self,
        phone_number: &str,
        changes: MetricChanges,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<HealthRecord>> {
        let record = sqlx::query_as::<_, HealthRecord>(&format!(
            r"
            UPDATE health_data
            SET steps = COALESCE($2, steps),
                avg_heart_rate = COALESCE($3, avg_heart_rate),
                resting_calories = COALESCE($4, resting_calories),
                sleep_hours = COALESCE($5, sleep_hours),
                updated_at = GREATEST($6, created_at)
            WHERE phone_number = $1
            RETURNING {COLUMNS}
            "
        ))
        .bind(phone_number)
        .bind(changes.steps)
        .bind(changes.avg_heart_rate)
        .bind(changes.resting_calories)
        .bind(changes.sleep_hours)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn delete(&self, phone_number: &str) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM health_data WHERE phone_number = $1")
            .bind(phone_number)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn stats(&self) -> StoreResult<HealthStats> {
        let stats = sqlx::query_as::<_, HealthStats>(
            r"
            SELECT COUNT(*) AS total_users,
                   AVG(steps)::FLOAT8 AS avg_steps,
                   AVG(avg_heart_rate)::FLOAT8 AS avg_heart_rate,
                   AVG(sleep_hours)::FLOAT8 AS avg_sleep_hours,
                   MAX(steps) AS max_steps,
                   MIN(steps) AS min_steps
            FROM health_data
            ",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(stats)
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
