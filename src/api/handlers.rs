//! HTTP API handlers.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use axum::async_trait;
use axum::extract::{FromRequest, MatchedPath, Path, Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::{Map, Value};
use tracing::warn;
use utoipa::OpenApi;

use super::responses::{
    DataResponse, HealthResponse, IndexResponse, ListResponse, ReadyResponse, StatsResponse,
};
use super::ApiDoc;
use crate::controller::HealthDataController;
use crate::error::{ApiError, ErrorResponse};
use crate::metrics;
use crate::records::HealthRecordInput;
use crate::store::HealthStore;

/// Application state shared with handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Record operations.
    pub controller: HealthDataController,
    /// Store backend name, reported by `/ready`.
    pub store_kind: &'static str,
    /// Prometheus handle for `/metrics`, if a recorder is installed.
    pub prometheus: Option<PrometheusHandle>,
}

impl AppState {
    /// Create new app state over a store.
    pub fn new(store: Arc<dyn HealthStore>, store_kind: &'static str) -> Self {
        Self {
            controller: HealthDataController::new(store),
            store_kind,
            prometheus: None,
        }
    }

    /// Attach a Prometheus handle.
    pub fn with_prometheus(mut self, handle: PrometheusHandle) -> Self {
        self.prometheus = Some(handle);
        self
    }
}

/// Request body that must be a JSON object.
#[derive(Debug)]
pub struct JsonObject(pub Map<String, Value>);

#[async_trait]
impl<S> FromRequest<S> for JsonObject
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<Value>::from_request(req, state)
            .await
            .map_err(|rejection| {
                ApiError::BadRequest(format!("Invalid JSON body: {}", rejection.body_text()))
            })?;

        match value {
            Value::Object(map) => Ok(Self(map)),
            _ => Err(ApiError::BadRequest(
                "Invalid JSON body: expected an object".to_string(),
            )),
        }
    }
}

/// List all health records.
#[utoipa::path(
    get,
    path = "/health-data/",
    tag = "health-data",
    responses((status = 200, description = "All records", body = ListResponse))
)]
pub async fn list_records(State(state): State<AppState>) -> Result<Json<ListResponse>, ApiError> {
    let records = state.controller.list().await?;
    Ok(Json(records.into()))
}

/// Create a health record.
#[utoipa::path(
    post,
    path = "/health-data/",
    tag = "health-data",
    request_body = HealthRecordInput,
    responses(
        (status = 201, description = "Record created", body = DataResponse),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 409, description = "Phone number already exists", body = ErrorResponse)
    )
)]
pub async fn create_record(
    State(state): State<AppState>,
    JsonObject(body): JsonObject,
) -> Result<impl IntoResponse, ApiError> {
    let record = state.controller.create(&body).await?;
    Ok((
        StatusCode::CREATED,
        Json(DataResponse::new("Health data created successfully", &record)),
    ))
}

/// Get the health record for a phone number.
#[utoipa::path(
    get,
    path = "/health-data/{phone_number}/",
    tag = "health-data",
    params(("phone_number" = String, Path, description = "Record key")),
    responses(
        (status = 200, description = "The record", body = DataResponse),
        (status = 404, description = "Not found", body = ErrorResponse)
    )
)]
pub async fn retrieve_record(
    State(state): State<AppState>,
    Path(phone_number): Path<String>,
) -> Result<Json<DataResponse>, ApiError> {
    let record = state.controller.retrieve(&phone_number).await?;
    Ok(Json(DataResponse::new(
        "Health data retrieved successfully",
        &record,
    )))
}

/// Replace every metric of a record.
#[utoipa::path(
    put,
    path = "/health-data/{phone_number}/",
    tag = "health-data",
    params(("phone_number" = String, Path, description = "Record key")),
    request_body = HealthRecordInput,
    responses(
        (status = 200, description = "Record updated", body = DataResponse),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 404, description = "Not found", body = ErrorResponse)
    )
)]
pub async fn update_record(
    State(state): State<AppState>,
    Path(phone_number): Path<String>,
    JsonObject(body): JsonObject,
) -> Result<Json<DataResponse>, ApiError> {
    let record = state.controller.update(&phone_number, &body).await?;
    Ok(Json(DataResponse::new(
        "Health data updated successfully",
        &record,
    )))
}

/// Change the supplied metrics of a record.
#[utoipa::path(
    patch,
    path = "/health-data/{phone_number}/",
    tag = "health-data",
    params(("phone_number" = String, Path, description = "Record key")),
    request_body = HealthRecordInput,
    responses(
        (status = 200, description = "Record updated", body = DataResponse),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 404, description = "Not found", body = ErrorResponse)
    )
)]
pub async fn partial_update_record(
    State(state): State<AppState>,
    Path(phone_number): Path<String>,
    JsonObject(body): JsonObject,
) -> Result<Json<DataResponse>, ApiError> {
    let record = state.controller.partial_update(&phone_number, &body).await?;
    Ok(Json(DataResponse::new(
        "Health data updated successfully",
        &record,
    )))
}

/// Delete a record.
#[utoipa::path(
    delete,
    path = "/health-data/{phone_number}/",
    tag = "health-data",
    params(("phone_number" = String, Path, description = "Record key")),
    responses(
        (status = 204, description = "Record deleted"),
        (status = 404, description = "Not found", body = ErrorResponse)
    )
)]
pub async fn delete_record(
    State(state): State<AppState>,
    Path(phone_number): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.controller.delete(&phone_number).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Aggregate statistics over all records.
#[utoipa::path(
    get,
    path = "/health-data/stats/",
    tag = "health-data",
    responses((status = 200, description = "Aggregates", body = StatsResponse))
)]
pub async fn stats(State(state): State<AppState>) -> Result<Json<StatsResponse>, ApiError> {
    let stats = state.controller.stats().await?;
    Ok(Json(StatsResponse {
        message: "Health data statistics".to_string(),
        stats,
    }))
}

/// Set only the steps of a record.
#[utoipa::path(
    patch,
    path = "/health-data/{phone_number}/update_steps/",
    tag = "health-data",
    params(("phone_number" = String, Path, description = "Record key")),
    request_body(content = HealthRecordInput, description = "Only `steps` is read"),
    responses(
        (status = 200, description = "Steps updated", body = DataResponse),
        (status = 400, description = "Missing or invalid value", body = ErrorResponse),
        (status = 404, description = "Not found", body = ErrorResponse)
    )
)]
pub async fn update_steps(
    State(state): State<AppState>,
    Path(phone_number): Path<String>,
    JsonObject(body): JsonObject,
) -> Result<Json<DataResponse>, ApiError> {
    let record = state.controller.update_steps(&phone_number, &body).await?;
    Ok(Json(DataResponse::new("Steps updated successfully", &record)))
}

/// Set only the average heart rate of a record.
#[utoipa::path(
    patch,
    path = "/health-data/{phone_number}/update_heart_rate/",
    tag = "health-data",
    params(("phone_number" = String, Path, description = "Record key")),
    request_body(content = HealthRecordInput, description = "Only `avg_heart_rate` is read"),
    responses(
        (status = 200, description = "Heart rate updated", body = DataResponse),
        (status = 400, description = "Missing or invalid value", body = ErrorResponse),
        (status = 404, description = "Not found", body = ErrorResponse)
    )
)]
pub async fn update_heart_rate(
    State(state): State<AppState>,
    Path(phone_number): Path<String>,
    JsonObject(body): JsonObject,
) -> Result<Json<DataResponse>, ApiError> {
    let record = state
        .controller
        .update_heart_rate(&phone_number, &body)
        .await?;
    Ok(Json(DataResponse::new(
        "Heart rate updated successfully",
        &record,
    )))
}

/// API index.
pub async fn index() -> impl IntoResponse {
    Json(IndexResponse {
        message: "Health Data API",
        endpoints: BTreeMap::from([
            ("health_data", "/health-data/"),
            ("stats", "/health-data/stats/"),
            ("openapi", "/api-docs/openapi.json"),
        ]),
    })
}

/// Health check handler - always returns 200.
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}

/// Readiness check handler - returns 200 if the store answers, 503 otherwise.
pub async fn ready(State(state): State<AppState>) -> impl IntoResponse {
    let ready = match state.controller.store().ping().await {
        Ok(()) => true,
        Err(e) => {
            warn!("Store ping failed: {}", e);
            false
        }
    };

    let response = ReadyResponse {
        ready,
        store: state.store_kind,
    };

    if ready {
        (StatusCode::OK, Json(response))
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, Json(response))
    }
}

/// Prometheus text exposition.
pub async fn metrics_text(State(state): State<AppState>) -> Response {
    match &state.prometheus {
        Some(handle) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => (StatusCode::SERVICE_UNAVAILABLE, "metrics recorder not installed").into_response(),
    }
}

/// OpenAPI document.
pub async fn openapi_json() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}

/// Middleware recording request latency per matched route.
pub async fn track_latency(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().to_string();
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(req).await;
    metrics::record_http_latency(start, &method, &route, response.status().as_u16());
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn app_state_starts_without_prometheus() {
        let state = AppState::new(Arc::new(MemoryStore::new()), "memory");
        assert!(state.prometheus.is_none());
        assert_eq!(state.store_kind, "memory");
    }
}
