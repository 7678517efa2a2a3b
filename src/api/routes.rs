//! HTTP API route definitions.

use axum::middleware;
use axum::routing::{get, patch};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::handlers::{
    create_record, delete_record, health, index, list_records, metrics_text, openapi_json,
    partial_update_record, ready, retrieve_record, stats, track_latency, update_heart_rate,
    update_record, update_steps, AppState,
};

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        // Service endpoints
        .route("/health", get(health))
        .route("/ready", get(ready))
        .route("/metrics", get(metrics_text))
        .route("/api-docs/openapi.json", get(openapi_json))
        // Health data resource
        .route("/health-data/", get(list_records).post(create_record))
        .route("/health-data/stats/", get(stats))
        .route(
            "/health-data/:phone_number/",
            get(retrieve_record)
                .put(update_record)
                .patch(partial_update_record)
                .delete(delete_record),
        )
        .route(
            "/health-data/:phone_number/update_steps/",
            patch(update_steps),
        )
        .route(
            "/health-data/:phone_number/update_heart_rate/",
            patch(update_heart_rate),
        )
        .layer(middleware::from_fn(track_latency))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use crate::store::MemoryStore;

    fn app() -> Router {
        create_router(AppState::new(Arc::new(MemoryStore::new()), "memory"))
    }

    async fn get_status(uri: &str) -> StatusCode {
        app()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn health_endpoint_returns_ok() {
        assert_eq!(get_status("/health").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn ready_endpoint_returns_200_with_memory_store() {
        assert_eq!(get_status("/ready").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn metrics_endpoint_needs_a_recorder() {
        assert_eq!(get_status("/metrics").await, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn stats_route_wins_over_phone_number() {
        assert_eq!(get_status("/health-data/stats/").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn openapi_document_is_served() {
        assert_eq!(get_status("/api-docs/openapi.json").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn stats_rejects_other_methods() {
        let response = app()
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/health-data/stats/")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
