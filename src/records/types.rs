//! Health record types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

/// Prefix of the derived display name.
pub const DISPLAY_NAME_PREFIX: &str = "user_";

/// Writable fields of a health record.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumString, AsRefStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum Field {
    /// Primary key.
    PhoneNumber,
    /// Daily steps count.
    Steps,
    /// Average heart rate.
    AvgHeartRate,
    /// Resting calories burned.
    RestingCalories,
    /// Hours of sleep.
    SleepHours,
}

impl Field {
    /// The four metric fields, in rendering order.
    pub const METRICS: [Field; 4] = [
        Field::Steps,
        Field::AvgHeartRate,
        Field::RestingCalories,
        Field::SleepHours,
    ];
}

/// One stored row of health metrics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct HealthRecord {
    /// Phone number (primary key, digits only).
    pub phone_number: String,
    /// Daily steps count.
    pub steps: i32,
    /// Average heart rate.
    pub avg_heart_rate: i32,
    /// Resting calories burned.
    pub resting_calories: i32,
    /// Hours of sleep.
    pub sleep_hours: i32,
    /// Set once at insert.
    pub created_at: DateTime<Utc>,
    /// Refreshed on every mutation.
    pub updated_at: DateTime<Utc>,
}

impl HealthRecord {
    /// Build a record for insertion, stamping both timestamps with `now`.
    pub fn new(metrics: NewRecord, now: DateTime<Utc>) -> Self {
        Self {
            phone_number: metrics.phone_number,
            steps: metrics.steps,
            avg_heart_rate: metrics.avg_heart_rate,
            resting_calories: metrics.resting_calories,
            sleep_hours: metrics.sleep_hours,
            created_at: now,
            updated_at: now,
        }
    }

    /// Derived display name, see [`display_name`].
    pub fn display_name(&self) -> String {
        display_name(&self.phone_number)
    }

    /// Apply the supplied changes and bump `updated_at`.
    ///
    /// `updated_at` never moves before `created_at`, even if the clock did.
    pub fn apply(&mut self, changes: &MetricChanges, now: DateTime<Utc>) {
        if let Some(v) = changes.steps {
            self.steps = v;
        }
        if let Some(v) = changes.avg_heart_rate {
            self.avg_heart_rate = v;
        }
        if let Some(v) = changes.resting_calories {
            self.resting_calories = v;
        }
        if let Some(v) = changes.sleep_hours {
            self.sleep_hours = v;
        }
        self.updated_at = now.max(self.created_at);
    }
}

/// Validated values for a new record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRecord {
    /// Phone number.
    pub phone_number: String,
    /// Steps.
    pub steps: i32,
    /// Average heart rate.
    pub avg_heart_rate: i32,
    /// Resting calories.
    pub resting_calories: i32,
    /// Sleep hours.
    pub sleep_hours: i32,
}

/// Validated metric changes. `None` keeps the stored value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricChanges {
    /// New steps.
    pub steps: Option<i32>,
    /// New average heart rate.
    pub avg_heart_rate: Option<i32>,
    /// New resting calories.
    pub resting_calories: Option<i32>,
    /// New sleep hours.
    pub sleep_hours: Option<i32>,
}

impl MetricChanges {
    /// Change only `steps`.
    pub fn steps(steps: i32) -> Self {
        Self {
            steps: Some(steps),
            ..Self::default()
        }
    }

    /// Change only `avg_heart_rate`.
    pub fn avg_heart_rate(avg_heart_rate: i32) -> Self {
        Self {
            avg_heart_rate: Some(avg_heart_rate),
            ..Self::default()
        }
    }

    /// Whether every metric is supplied.
    pub fn is_complete(&self) -> bool {
        self.steps.is_some()
            && self.avg_heart_rate.is_some()
            && self.resting_calories.is_some()
            && self.sleep_hours.is_some()
    }
}

/// Aggregate statistics over all records.
///
/// Over an empty store `total_users` is 0 and every other value is `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct HealthStats {
    /// Number of records.
    pub total_users: i64,
    /// Mean steps.
    pub avg_steps: Option<f64>,
    /// Mean heart rate.
    pub avg_heart_rate: Option<f64>,
    /// Mean sleep hours.
    pub avg_sleep_hours: Option<f64>,
    /// Highest steps.
    pub max_steps: Option<i32>,
    /// Lowest steps.
    pub min_steps: Option<i32>,
}

impl HealthStats {
    /// Stats for an empty store.
    pub fn empty() -> Self {
        Self {
            total_users: 0,
            avg_steps: None,
            avg_heart_rate: None,
            avg_sleep_hours: None,
            max_steps: None,
            min_steps: None,
        }
    }

    /// Compute stats in process over a set of records.
    pub fn compute<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a HealthRecord>,
    {
        let mut count: i64 = 0;
        let mut steps_sum: i64 = 0;
        let mut heart_sum: i64 = 0;
        let mut sleep_sum: i64 = 0;
        let mut max_steps: Option<i32> = None;
        let mut min_steps: Option<i32> = None;

        for record in records {
            count += 1;
            steps_sum += i64::from(record.steps);
            heart_sum += i64::from(record.avg_heart_rate);
            sleep_sum += i64::from(record.sleep_hours);
            max_steps = Some(max_steps.map_or(record.steps, |m| m.max(record.steps)));
            min_steps = Some(min_steps.map_or(record.steps, |m| m.min(record.steps)));
        }

        if count == 0 {
            return Self::empty();
        }

        let n = count as f64;
        Self {
            total_users: count,
            avg_steps: Some(steps_sum as f64 / n),
            avg_heart_rate: Some(heart_sum as f64 / n),
            avg_sleep_hours: Some(sleep_sum as f64 / n),
            max_steps,
            min_steps,
        }
    }
}

/// Display name derived from a phone number: `user_` plus its last four characters.
///
/// Shorter inputs are used whole.
pub fn display_name(phone_number: &str) -> String {
    let chars: Vec<char> = phone_number.chars().collect();
    let start = chars.len().saturating_sub(4);
    let suffix: String = chars[start..].iter().collect();
    format!("{DISPLAY_NAME_PREFIX}{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn record(phone: &str, steps: i32, heart: i32, sleep: i32) -> HealthRecord {
        HealthRecord::new(
            NewRecord {
                phone_number: phone.to_string(),
                steps,
                avg_heart_rate: heart,
                resting_calories: 1500,
                sleep_hours: sleep,
            },
            Utc::now(),
        )
    }

    #[test]
    fn display_name_uses_last_four_digits() {
        assert_eq!(display_name("5551234567"), "user_4567");
        assert_eq!(display_name("123"), "user_123");
    }

    #[test]
    fn field_names_are_snake_case() {
        assert_eq!(Field::AvgHeartRate.to_string(), "avg_heart_rate");
        assert_eq!(Field::PhoneNumber.as_ref(), "phone_number");
        assert_eq!("sleep_hours".parse::<Field>().unwrap(), Field::SleepHours);
    }

    #[test]
    fn apply_only_touches_supplied_fields() {
        let mut rec = record("5551234567", 100, 70, 8);
        let later = rec.created_at + Duration::seconds(5);

        rec.apply(&MetricChanges::steps(250), later);

        assert_eq!(rec.steps, 250);
        assert_eq!(rec.avg_heart_rate, 70);
        assert_eq!(rec.resting_calories, 1500);
        assert_eq!(rec.sleep_hours, 8);
        assert_eq!(rec.updated_at, later);
    }

    #[test]
    fn apply_never_moves_updated_at_before_created_at() {
        let mut rec = record("5551234567", 100, 70, 8);
        let earlier = rec.created_at - Duration::seconds(30);

        rec.apply(&MetricChanges::avg_heart_rate(80), earlier);

        assert_eq!(rec.updated_at, rec.created_at);
    }

    #[test]
    fn stats_over_nothing_are_empty() {
        let none: Vec<HealthRecord> = Vec::new();
        assert_eq!(HealthStats::compute(&none), HealthStats::empty());
    }

    #[test]
    fn stats_aggregate_records() {
        let records = vec![
            record("5550000001", 1000, 60, 6),
            record("5550000002", 3000, 80, 8),
        ];

        let stats = HealthStats::compute(&records);

        assert_eq!(stats.total_users, 2);
        assert_eq!(stats.avg_steps, Some(2000.0));
        assert_eq!(stats.avg_heart_rate, Some(70.0));
        assert_eq!(stats.avg_sleep_hours, Some(7.0));
        assert_eq!(stats.max_steps, Some(3000));
        assert_eq!(stats.min_steps, Some(1000));
    }
}
