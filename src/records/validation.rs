//! Per-field validators.
//!
//! Each validator is a pure function that either returns the value narrowed
//! to its storage type or a [`FieldError`] carrying the message shown to the
//! caller. Callers collect failures into [`ValidationErrors`] so a single
//! response reports every bad field at once.

use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

use super::types::Field;

/// Minimum phone number length.
pub const PHONE_MIN_LEN: usize = 10;
/// Maximum phone number length (column width).
pub const PHONE_MAX_LEN: usize = 20;
/// Upper bound for daily steps.
pub const MAX_STEPS: i64 = 100_000;
/// Upper bound for average heart rate.
pub const MAX_HEART_RATE: i64 = 300;
/// Upper bound for sleep hours.
pub const MAX_SLEEP_HOURS: i64 = 24;

/// A single field failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    /// Value has the wrong shape (e.g. non-digit phone number).
    #[error("{message}")]
    InvalidFormat {
        /// Offending field.
        field: Field,
        /// Caller-facing message.
        message: &'static str,
    },

    /// Numeric value outside its bounds.
    #[error("{message}")]
    OutOfRange {
        /// Offending field.
        field: Field,
        /// Caller-facing message.
        message: &'static str,
    },

    /// Field must be present.
    #[error("This field is required.")]
    Required(Field),

    /// Field was explicitly `null`.
    #[error("This field may not be null.")]
    Null(Field),

    /// Value could not be read as an integer.
    #[error("A valid integer is required.")]
    NotAnInteger(Field),

    /// Value could not be read as a string.
    #[error("Not a valid string.")]
    NotAString(Field),

    /// Attempt to change a field that is fixed after creation.
    #[error("Phone number cannot be changed.")]
    Immutable(Field),
}

impl FieldError {
    /// The field this error refers to.
    pub fn field(&self) -> Field {
        match self {
            Self::InvalidFormat { field, .. } | Self::OutOfRange { field, .. } => *field,
            Self::Required(field)
            | Self::Null(field)
            | Self::NotAnInteger(field)
            | Self::NotAString(field)
            | Self::Immutable(field) => *field,
        }
    }
}

/// Field-level validation failures of one request.
#[derive(Error, Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[error("validation failed for {}", field_list(.fields))]
#[serde(transparent)]
pub struct ValidationErrors {
    fields: BTreeMap<String, Vec<String>>,
}

impl ValidationErrors {
    /// Empty error set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure.
    pub fn push(&mut self, error: FieldError) {
        self.fields
            .entry(error.field().to_string())
            .or_default()
            .push(error.to_string());
    }

    /// Keep the value on success, record the failure otherwise.
    pub fn check<T>(&mut self, result: Result<T, FieldError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                self.push(e);
                None
            }
        }
    }

    /// Whether no failure has been recorded.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Messages recorded for a field.
    pub fn messages(&self, field: Field) -> &[String] {
        self.fields
            .get(field.as_ref())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Field-to-messages map.
    pub fn fields(&self) -> &BTreeMap<String, Vec<String>> {
        &self.fields
    }

    /// `Ok(())` when empty, otherwise `Err(self)`.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

fn field_list(fields: &BTreeMap<String, Vec<String>>) -> String {
    fields.keys().cloned().collect::<Vec<_>>().join(", ")
}

impl From<FieldError> for ValidationErrors {
    fn from(error: FieldError) -> Self {
        let mut errors = Self::new();
        errors.push(error);
        errors
    }
}

/// Phone number: ASCII digits only, 10 to 20 characters.
pub fn validate_phone_number(value: &str) -> Result<(), FieldError> {
    let invalid = |message| FieldError::InvalidFormat {
        field: Field::PhoneNumber,
        message,
    };

    if !value.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid("Phone number should contain only digits."));
    }
    if value.len() < PHONE_MIN_LEN {
        return Err(invalid("Phone number should be at least 10 digits."));
    }
    if value.len() > PHONE_MAX_LEN {
        return Err(invalid("Ensure this field has no more than 20 characters."));
    }
    Ok(())
}

/// Steps: 0 to 100000.
pub fn validate_steps(value: i64) -> Result<i32, FieldError> {
    bounded(
        Field::Steps,
        value,
        MAX_STEPS,
        "Steps cannot be negative.",
        "Steps count seems unrealistic.",
    )
}

/// Average heart rate: 0 to 300.
pub fn validate_avg_heart_rate(value: i64) -> Result<i32, FieldError> {
    bounded(
        Field::AvgHeartRate,
        value,
        MAX_HEART_RATE,
        "Heart rate cannot be negative.",
        "Heart rate seems unrealistic.",
    )
}

/// Resting calories: non-negative and fits the integer column.
pub fn validate_resting_calories(value: i64) -> Result<i32, FieldError> {
    bounded(
        Field::RestingCalories,
        value,
        i64::from(i32::MAX),
        "Resting calories cannot be negative.",
        "Ensure this value is less than or equal to 2147483647.",
    )
}

/// Sleep hours: 0 to 24.
pub fn validate_sleep_hours(value: i64) -> Result<i32, FieldError> {
    bounded(
        Field::SleepHours,
        value,
        MAX_SLEEP_HOURS,
        "Sleep hours cannot be negative.",
        "Sleep hours cannot exceed 24.",
    )
}

/// Dispatch to the validator for a metric field.
pub fn validate_metric(field: Field, value: i64) -> Result<i32, FieldError> {
    match field {
        Field::Steps => validate_steps(value),
        Field::AvgHeartRate => validate_avg_heart_rate(value),
        Field::RestingCalories => validate_resting_calories(value),
        Field::SleepHours => validate_sleep_hours(value),
        Field::PhoneNumber => Err(FieldError::NotAnInteger(field)),
    }
}

fn bounded(
    field: Field,
    value: i64,
    max: i64,
    below_message: &'static str,
    above_message: &'static str,
) -> Result<i32, FieldError> {
    if value < 0 {
        return Err(FieldError::OutOfRange {
            field,
            message: below_message,
        });
    }
    if value > max {
        return Err(FieldError::OutOfRange {
            field,
            message: above_message,
        });
    }
    i32::try_from(value).map_err(|_| FieldError::OutOfRange {
        field,
        message: above_message,
    })
}
