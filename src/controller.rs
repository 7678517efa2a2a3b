//! Health record operations, independent of HTTP.
//!
//! Every write runs the field validators before touching the store. Each
//! operation is one request/response exchange against a single row.

use std::sync::Arc;

use chrono::Utc;
use serde_json::{Map, Value};
use tracing::{info, instrument, warn};

use crate::error::ApiError;
use crate::metrics::{self, StoreTimer};
use crate::records::payload::read_integer_field;
use crate::records::validation::{validate_avg_heart_rate, validate_steps};
use crate::records::{
    Field, FieldError, HealthRecord, HealthRecordInput, HealthStats, InputMode, MetricChanges,
    ValidationErrors,
};
use crate::store::HealthStore;

/// Outcome of a delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deleted {
    /// Key of the removed record.
    pub phone_number: String,
    /// Confirmation message.
    pub message: String,
}

/// Messages for the single-field update endpoints.
struct SingleField {
    field: Field,
    missing: &'static str,
    invalid: &'static str,
    validate: fn(i64) -> Result<i32, FieldError>,
    changes: fn(i32) -> MetricChanges,
}

const STEPS_FIELD: SingleField = SingleField {
    field: Field::Steps,
    missing: "Steps value is required",
    invalid: "Invalid steps value",
    validate: validate_steps,
    changes: MetricChanges::steps,
};

const HEART_RATE_FIELD: SingleField = SingleField {
    field: Field::AvgHeartRate,
    missing: "Heart rate value is required",
    invalid: "Invalid heart rate value",
    validate: validate_avg_heart_rate,
    changes: MetricChanges::avg_heart_rate,
};

/// Controller over a health record store.
#[derive(Clone)]
pub struct HealthDataController {
    store: Arc<dyn HealthStore>,
}

impl std::fmt::Debug for HealthDataController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HealthDataController").finish_non_exhaustive()
    }
}

impl HealthDataController {
    /// Create a controller over a store.
    pub fn new(store: Arc<dyn HealthStore>) -> Self {
        Self { store }
    }

    /// The underlying store.
    pub fn store(&self) -> &Arc<dyn HealthStore> {
        &self.store
    }

    /// All records in storage order.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<HealthRecord>, ApiError> {
        let _timer = StoreTimer::new("list");
        Ok(self.store.list().await?)
    }

    /// Create a record from a full payload.
    #[instrument(skip(self, body))]
    pub async fn create(&self, body: &Map<String, Value>) -> Result<HealthRecord, ApiError> {
        let new = rejecting(
            HealthRecordInput::parse(body, InputMode::Create)
                .and_then(HealthRecordInput::into_new_record),
        )?;

        let record = {
            let _timer = StoreTimer::new("insert");
            self.store.insert(HealthRecord::new(new, Utc::now())).await?
        };

        metrics::inc_records_created();
        info!(phone_number = %record.phone_number, "Health data created");
        Ok(record)
    }

    /// Fetch one record.
    #[instrument(skip(self))]
    pub async fn retrieve(&self, phone_number: &str) -> Result<HealthRecord, ApiError> {
        let _timer = StoreTimer::new("get");
        self.store
            .get(phone_number)
            .await?
            .ok_or_else(|| ApiError::not_found(phone_number))
    }

    /// Replace every metric of a record.
    #[instrument(skip(self, body))]
    pub async fn update(
        &self,
        phone_number: &str,
        body: &Map<String, Value>,
    ) -> Result<HealthRecord, ApiError> {
        self.write(phone_number, body, InputMode::Replace).await
    }

    /// Change only the supplied metrics of a record.
    #[instrument(skip(self, body))]
    pub async fn partial_update(
        &self,
        phone_number: &str,
        body: &Map<String, Value>,
    ) -> Result<HealthRecord, ApiError> {
        self.write(phone_number, body, InputMode::Partial).await
    }

    /// Remove a record.
    #[instrument(skip(self))]
    pub async fn delete(&self, phone_number: &str) -> Result<Deleted, ApiError> {
        let removed = {
            let _timer = StoreTimer::new("delete");
            self.store.delete(phone_number).await?
        };
        if !removed {
            return Err(ApiError::not_found(phone_number));
        }

        metrics::inc_records_deleted();
        let message = format!("Health data for {phone_number} deleted successfully");
        info!("{}", message);
        Ok(Deleted {
            phone_number: phone_number.to_string(),
            message,
        })
    }

    /// Aggregate statistics over all records.
    #[instrument(skip(self))]
    pub async fn stats(&self) -> Result<HealthStats, ApiError> {
        let _timer = StoreTimer::new("stats");
        Ok(self.store.stats().await?)
    }

    /// Set `steps` alone.
    #[instrument(skip(self, body))]
    pub async fn update_steps(
        &self,
        phone_number: &str,
        body: &Map<String, Value>,
    ) -> Result<HealthRecord, ApiError> {
        self.write_single(phone_number, body, &STEPS_FIELD).await
    }

    /// Set `avg_heart_rate` alone.
    #[instrument(skip(self, body))]
    pub async fn update_heart_rate(
        &self,
        phone_number: &str,
        body: &Map<String, Value>,
    ) -> Result<HealthRecord, ApiError> {
        self.write_single(phone_number, body, &HEART_RATE_FIELD).await
    }

    async fn write(
        &self,
        phone_number: &str,
        body: &Map<String, Value>,
        mode: InputMode,
    ) -> Result<HealthRecord, ApiError> {
        let changes = rejecting(
            HealthRecordInput::parse(body, mode).and_then(|input| input.into_changes(phone_number)),
        )?;
        self.apply(phone_number, changes).await
    }

    async fn write_single(
        &self,
        phone_number: &str,
        body: &Map<String, Value>,
        field_update: &SingleField,
    ) -> Result<HealthRecord, ApiError> {
        // Unknown keys answer 404 before the body is looked at.
        self.retrieve(phone_number).await?;

        let raw = match read_integer_field(body, field_update.field) {
            None | Some(Err(FieldError::Null(_))) => {
                return Err(ApiError::BadRequest(field_update.missing.to_string()))
            }
            Some(Err(_)) => return Err(ApiError::BadRequest(field_update.invalid.to_string())),
            Some(Ok(raw)) => raw,
        };
        let value = rejecting((field_update.validate)(raw).map_err(ValidationErrors::from))?;

        self.apply(phone_number, (field_update.changes)(value)).await
    }

    async fn apply(
        &self,
        phone_number: &str,
        changes: MetricChanges,
    ) -> Result<HealthRecord, ApiError> {
        let record = {
            let _timer = StoreTimer::new("update");
            self.store
                .update(phone_number, changes, Utc::now())
                .await?
                .ok_or_else(|| ApiError::not_found(phone_number))?
        };

        metrics::inc_records_updated();
        info!(phone_number = %record.phone_number, "Health data updated");
        Ok(record)
    }
}

fn rejecting<T>(result: Result<T, ValidationErrors>) -> Result<T, ApiError> {
    result.map_err(|errors| {
        metrics::inc_validation_failures();
        warn!(%errors, "Rejected write");
        ApiError::Validation(errors)
    })
}
