//! Parsing JSON request bodies into validated record values.
//!
//! Bodies are read field by field from a `serde_json::Value` rather than
//! through a derived `Deserialize`, so a type error on one field is reported
//! next to range errors on the others instead of rejecting the whole body.

use serde::Deserialize;
use serde_json::{Map, Value};
use utoipa::ToSchema;

use super::types::{Field, MetricChanges, NewRecord};
use super::validation::{validate_metric, validate_phone_number, FieldError, ValidationErrors};

/// How strictly a body is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    /// `phone_number` required, metrics default to 0.
    Create,
    /// Every metric required.
    Replace,
    /// Anything may be omitted.
    Partial,
}

/// Writable fields of a record as read from the wire.
///
/// Integer fields also accept integral floats (`5.0`) and numeric strings (`"42"`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, ToSchema)]
pub struct HealthRecordInput {
    /// Phone number, digits only, 10 to 20 characters.
    #[schema(example = "5551234567")]
    pub phone_number: Option<String>,
    /// Daily steps, 0 to 100000.
    pub steps: Option<i64>,
    /// Average heart rate, 0 to 300.
    pub avg_heart_rate: Option<i64>,
    /// Resting calories burned, non-negative.
    pub resting_calories: Option<i64>,
    /// Hours of sleep, 0 to 24.
    pub sleep_hours: Option<i64>,
}

impl HealthRecordInput {
    /// Read the writable fields out of a JSON object.
    ///
    /// Read-only and unknown keys are ignored. Missing required fields, nulls
    /// and type errors are collected per field.
    pub fn parse(body: &Map<String, Value>, mode: InputMode) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let phone_number = match body.get(Field::PhoneNumber.as_ref()) {
            None => {
                if mode == InputMode::Create {
                    errors.push(FieldError::Required(Field::PhoneNumber));
                }
                None
            }
            Some(value) => errors.check(read_string(Field::PhoneNumber, value)),
        };

        let mut metrics = [None; 4];
        for (slot, field) in metrics.iter_mut().zip(Field::METRICS) {
            *slot = match body.get(field.as_ref()) {
                None => {
                    if mode == InputMode::Replace {
                        errors.push(FieldError::Required(field));
                    }
                    None
                }
                Some(value) => errors.check(read_integer(field, value)),
            };
        }
        let [steps, avg_heart_rate, resting_calories, sleep_hours] = metrics;

        errors.into_result()?;
        Ok(Self {
            phone_number,
            steps,
            avg_heart_rate,
            resting_calories,
            sleep_hours,
        })
    }

    /// Validate for insertion; omitted metrics default to 0.
    pub fn into_new_record(self) -> Result<NewRecord, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let changes = self.validate_metrics(&mut errors);
        let phone_number = match self.phone_number {
            Some(phone) => errors.check(validate_phone_number(&phone)).map(|()| phone),
            None => {
                errors.push(FieldError::Required(Field::PhoneNumber));
                None
            }
        };

        errors.into_result()?;
        Ok(NewRecord {
            phone_number: phone_number.unwrap_or_default(),
            steps: changes.steps.unwrap_or(0),
            avg_heart_rate: changes.avg_heart_rate.unwrap_or(0),
            resting_calories: changes.resting_calories.unwrap_or(0),
            sleep_hours: changes.sleep_hours.unwrap_or(0),
        })
    }

    /// Validate supplied metrics as changes to the record keyed by `phone_number`.
    ///
    /// A `phone_number` in the body must match the key.
    pub fn into_changes(self, phone_number: &str) -> Result<MetricChanges, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Some(phone) = &self.phone_number {
            if phone != phone_number {
                errors.push(FieldError::Immutable(Field::PhoneNumber));
            }
        }
        let changes = self.validate_metrics(&mut errors);

        errors.into_result()?;
        Ok(changes)
    }

    fn validate_metrics(&self, errors: &mut ValidationErrors) -> MetricChanges {
        let mut check = |field: Field, value: Option<i64>| {
            value.and_then(|v| errors.check(validate_metric(field, v)))
        };
        MetricChanges {
            steps: check(Field::Steps, self.steps),
            avg_heart_rate: check(Field::AvgHeartRate, self.avg_heart_rate),
            resting_calories: check(Field::RestingCalories, self.resting_calories),
            sleep_hours: check(Field::SleepHours, self.sleep_hours),
        }
    }
}

/// Read one field as an integer with the lenient wire rules.
///
/// Returns `None` when the field is absent.
pub fn read_integer_field(
    body: &Map<String, Value>,
    field: Field,
) -> Option<Result<i64, FieldError>> {
    body.get(field.as_ref()).map(|value| read_integer(field, value))
}

fn read_integer(field: Field, value: &Value) -> Result<i64, FieldError> {
    match value {
        Value::Null => Err(FieldError::Null(field)),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                return Ok(i);
            }
            match n.as_f64() {
                Some(f) if f.fract() == 0.0 && f.abs() < 9.0e15 => Ok(f as i64),
                _ => Err(FieldError::NotAnInteger(field)),
            }
        }
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| FieldError::NotAnInteger(field)),
        Value::Bool(_) | Value::Array(_) | Value::Object(_) => Err(FieldError::NotAnInteger(field)),
    }
}

fn read_string(field: Field, value: &Value) -> Result<String, FieldError> {
    match value {
        Value::Null => Err(FieldError::Null(field)),
        Value::String(s) => Ok(s.trim().to_string()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(_) | Value::Array(_) | Value::Object(_) => Err(FieldError::NotAString(field)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn create_defaults_missing_metrics_to_zero() {
        let body = object(json!({ "phone_number": "5551234567", "steps": 4200 }));

        let record = HealthRecordInput::parse(&body, InputMode::Create)
            .and_then(HealthRecordInput::into_new_record)
            .unwrap();

        assert_eq!(
            record,
            NewRecord {
                phone_number: "5551234567".to_string(),
                steps: 4200,
                avg_heart_rate: 0,
                resting_calories: 0,
                sleep_hours: 0,
            }
        );
    }

    #[test]
    fn create_requires_phone_number() {
        let body = object(json!({ "steps": 10 }));

        let errors = HealthRecordInput::parse(&body, InputMode::Create).unwrap_err();

        assert_eq!(errors.messages(Field::PhoneNumber), ["This field is required."]);
    }

    #[test]
    fn replace_requires_every_metric() {
        let body = object(json!({ "steps": 10, "sleep_hours": 7 }));

        let errors = HealthRecordInput::parse(&body, InputMode::Replace).unwrap_err();

        assert!(errors.messages(Field::Steps).is_empty());
        assert_eq!(errors.messages(Field::AvgHeartRate), ["This field is required."]);
        assert_eq!(errors.messages(Field::RestingCalories), ["This field is required."]);
        assert!(errors.messages(Field::PhoneNumber).is_empty());
    }

    #[test]
    fn lenient_integer_forms() {
        let body = object(json!({ "steps": "42", "avg_heart_rate": 61.0, "sleep_hours": 8 }));

        let input = HealthRecordInput::parse(&body, InputMode::Partial).unwrap();

        assert_eq!(input.steps, Some(42));
        assert_eq!(input.avg_heart_rate, Some(61));
        assert_eq!(input.sleep_hours, Some(8));
        assert_eq!(input.resting_calories, None);
    }

    #[test]
    fn type_errors_and_nulls_are_field_level() {
        let body = object(json!({
            "steps": "lots",
            "avg_heart_rate": 72.5,
            "sleep_hours": null,
            "resting_calories": true,
        }));

        let errors = HealthRecordInput::parse(&body, InputMode::Partial).unwrap_err();

        assert_eq!(errors.messages(Field::Steps), ["A valid integer is required."]);
        assert_eq!(errors.messages(Field::AvgHeartRate), ["A valid integer is required."]);
        assert_eq!(errors.messages(Field::SleepHours), ["This field may not be null."]);
        assert_eq!(errors.messages(Field::RestingCalories), ["A valid integer is required."]);
    }

    #[test]
    fn read_only_and_unknown_keys_are_ignored() {
        let body = object(json!({
            "created_at": "2020-01-01T00:00:00Z",
            "display_name": "someone",
            "favourite_colour": "green",
            "steps": 1,
        }));

        let input = HealthRecordInput::parse(&body, InputMode::Partial).unwrap();

        assert_eq!(input.steps, Some(1));
    }

    #[test]
    fn changes_reject_a_different_phone_number() {
        let body = object(json!({ "phone_number": "5559999999", "steps": 1 }));
        let input = HealthRecordInput::parse(&body, InputMode::Partial).unwrap();

        let errors = input.into_changes("5551234567").unwrap_err();

        assert_eq!(errors.messages(Field::PhoneNumber), ["Phone number cannot be changed."]);
    }

    #[test]
    fn changes_accept_the_same_phone_number() {
        let body = object(json!({ "phone_number": "5551234567", "sleep_hours": 24 }));
        let input = HealthRecordInput::parse(&body, InputMode::Partial).unwrap();

        let changes = input.into_changes("5551234567").unwrap();

        assert_eq!(changes.sleep_hours, Some(24));
        assert_eq!(changes.steps, None);
    }

    #[test]
    fn range_errors_are_collected_together() {
        let body = object(json!({
            "phone_number": "12ab",
            "steps": 100001,
            "sleep_hours": 25,
        }));

        let errors = HealthRecordInput::parse(&body, InputMode::Create)
            .and_then(HealthRecordInput::into_new_record)
            .unwrap_err();

        assert_eq!(
            errors.messages(Field::PhoneNumber),
            ["Phone number should contain only digits."]
        );
        assert_eq!(errors.messages(Field::Steps), ["Steps count seems unrealistic."]);
        assert_eq!(errors.messages(Field::SleepHours), ["Sleep hours cannot exceed 24."]);
    }

    #[test]
    fn numeric_phone_number_is_stringified() {
        let body = object(json!({ "phone_number": 5551234567u64 }));

        let input = HealthRecordInput::parse(&body, InputMode::Create).unwrap();

        assert_eq!(input.phone_number.as_deref(), Some("5551234567"));
    }
}
