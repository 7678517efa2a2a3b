//! Unified error types for the health metrics service.

use std::collections::BTreeMap;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::error;
use utoipa::ToSchema;

use crate::records::ValidationErrors;

/// Top-level error for startup and process concerns.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration loading error.
    #[error("configuration error: {0}")]
    Config(#[from] envy::Error),

    /// Configuration loaded but rejected.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Store error during startup.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Data store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// A record with this primary key already exists.
    #[error("record {phone_number} already exists")]
    Conflict {
        /// The duplicate key.
        phone_number: String,
    },

    /// Database driver error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Errors surfaced by controller operations and mapped to HTTP responses.
#[derive(Error, Debug)]
pub enum ApiError {
    /// One or more fields failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    /// No record for this phone number.
    #[error("health data for {phone_number} not found")]
    NotFound {
        /// The missing key.
        phone_number: String,
    },

    /// Duplicate primary key on create.
    #[error("health data with phone number {phone_number} already exists")]
    Conflict {
        /// The duplicate key.
        phone_number: String,
    },

    /// Missing or malformed input outside field validation.
    #[error("{0}")]
    BadRequest(String),

    /// Store failure.
    #[error(transparent)]
    Store(StoreError),
}

impl ApiError {
    /// Not-found error for a key.
    pub fn not_found(phone_number: impl Into<String>) -> Self {
        Self::NotFound {
            phone_number: phone_number.into(),
        }
    }

    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Conflict { phone_number } => Self::Conflict { phone_number },
            other => Self::Store(other),
        }
    }
}

/// Error response body.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Human-readable description.
    pub error: String,
    /// Field-level messages, present for validation errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<BTreeMap<String, Vec<String>>>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            Self::Validation(errors) => ErrorResponse {
                error: "Validation failed".to_string(),
                fields: Some(errors.fields().clone()),
            },
            Self::Store(e) => {
                error!("Store failure: {}", e);
                ErrorResponse {
                    error: "Internal server error".to_string(),
                    fields: None,
                }
            }
            other => ErrorResponse {
                error: other.to_string(),
                fields: None,
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, AppError>;
