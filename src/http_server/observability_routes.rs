//! Observability HTTP Routes
//!
//! Health check and experiment counters.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde::Serialize;

use crate::observability::MetricsSnapshot;
use crate::service::ExperimentService;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub config_version: u64,
}

/// `/health` and `/metrics`
pub fn observability_routes(service: Arc<ExperimentService>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(service)
}

/// `/admin/metrics`, kept for admin dashboards that poll under /admin
pub fn admin_metrics_routes(service: Arc<ExperimentService>) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(service)
}

async fn health_handler(State(service): State<Arc<ExperimentService>>) -> impl IntoResponse {
    let response = HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        config_version: service.store().version(),
    };

    (StatusCode::OK, Json(response))
}

async fn metrics_handler(State(service): State<Arc<ExperimentService>>) -> Json<MetricsSnapshot> {
    Json(service.metrics())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_response_serialization() {
        let response = HealthResponse {
            status: "ok".to_string(),
            version: "0.1.0".to_string(),
            config_version: 2,
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["config_version"], 2);
    }
}
