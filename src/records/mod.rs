//! Health record model, validation, and input parsing.
//!
//! This module handles:
//! - The stored record type and its derived display name
//! - Per-field validators with caller-facing messages
//! - Reading JSON bodies into validated values

pub mod payload;
pub mod types;
pub mod validation;

pub use payload::{HealthRecordInput, InputMode};
pub use types::{display_name, Field, HealthRecord, HealthStats, MetricChanges, NewRecord};
pub use validation::{FieldError, ValidationErrors};
