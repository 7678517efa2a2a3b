//! Response bodies.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::records::{HealthRecord, HealthStats};

/// A record as rendered to callers.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct HealthRecordView {
    /// Phone number.
    #[schema(example = "5551234567")]
    pub phone_number: String,
    /// `user_` plus the last four digits of the phone number.
    #[schema(example = "user_4567")]
    pub display_name: String,
    /// Daily steps count.
    pub steps: i32,
    /// Average heart rate.
    pub avg_heart_rate: i32,
    /// Resting calories burned.
    pub resting_calories: i32,
    /// Hours of sleep.
    pub sleep_hours: i32,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

impl From<&HealthRecord> for HealthRecordView {
    fn from(record: &HealthRecord) -> Self {
        Self {
            phone_number: record.phone_number.clone(),
            display_name: record.display_name(),
            steps: record.steps,
            avg_heart_rate: record.avg_heart_rate,
            resting_calories: record.resting_calories,
            sleep_hours: record.sleep_hours,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// Single-record envelope.
#[derive(Debug, Serialize, ToSchema)]
pub struct DataResponse {
    /// Outcome description.
    pub message: String,
    /// The record.
    pub data: HealthRecordView,
}

impl DataResponse {
    /// Wrap a record with a message.
    pub fn new(message: impl Into<String>, record: &HealthRecord) -> Self {
        Self {
            message: message.into(),
            data: record.into(),
        }
    }
}

/// List envelope.
#[derive(Debug, Serialize, ToSchema)]
pub struct ListResponse {
    /// Number of records.
    pub count: usize,
    /// The records.
    pub results: Vec<HealthRecordView>,
}

impl From<Vec<HealthRecord>> for ListResponse {
    fn from(records: Vec<HealthRecord>) -> Self {
        Self {
            count: records.len(),
            results: records.iter().map(HealthRecordView::from).collect(),
        }
    }
}

/// Stats envelope.
#[derive(Debug, Serialize, ToSchema)]
pub struct StatsResponse {
    /// Outcome description.
    pub message: String,
    /// Aggregates; averages and extremes are `null` over an empty store.
    pub stats: HealthStats,
}

/// API index.
#[derive(Debug, Serialize)]
pub struct IndexResponse {
    /// Service name.
    pub message: &'static str,
    /// Endpoint name to path.
    pub endpoints: BTreeMap<&'static str, &'static str>,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Status: "ok".
    pub status: &'static str,
}

/// Readiness check response.
#[derive(Debug, Serialize)]
pub struct ReadyResponse {
    /// Whether the store answered.
    pub ready: bool,
    /// Store backend in use.
    pub store: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::NewRecord;

    #[test]
    fn view_carries_display_name() {
        let record = HealthRecord::new(
            NewRecord {
                phone_number: "5551234567".to_string(),
                steps: 10,
                avg_heart_rate: 60,
                resting_calories: 1200,
                sleep_hours: 8,
            },
            Utc::now(),
        );

        let json = serde_json::to_value(DataResponse::new("ok", &record)).unwrap();

        assert_eq!(json["message"], "ok");
        assert_eq!(json["data"]["display_name"], "user_4567");
        assert_eq!(json["data"]["steps"], 10);
        assert!(json["data"]["created_at"].is_string());
    }

    #[test]
    fn list_counts_results() {
        let list = ListResponse::from(Vec::new());
        assert_eq!(list.count, 0);
        assert!(list.results.is_empty());
    }
}
