//! HTTP API for the health data resource plus health, metrics, and docs endpoints.

pub mod handlers;
pub mod responses;
pub mod routes;

use utoipa::OpenApi;

pub use handlers::AppState;
pub use routes::create_router;

/// OpenAPI document for the health data resource.
#[derive(OpenApi)]
#[openapi(
    info(title = "Health Data API", description = "Per-user health metrics keyed by phone number"),
    paths(
        handlers::list_records,
        handlers::create_record,
        handlers::retrieve_record,
        handlers::update_record,
        handlers::partial_update_record,
        handlers::delete_record,
        handlers::stats,
        handlers::update_steps,
        handlers::update_heart_rate,
    ),
    components(schemas(
        responses::HealthRecordView,
        responses::DataResponse,
        responses::ListResponse,
        responses::StatsResponse,
        crate::records::HealthStats,
        crate::records::HealthRecordInput,
        crate::error::ErrorResponse,
    )),
    tags((name = "health-data", description = "Health metric records"))
)]
pub struct ApiDoc;
