//! Admin HTTP Routes
//!
//! - `GET /admin/form-config`
//! - `PUT /admin/save-form-config`
//! - `PUT /admin/update-routing-probability`
//! - `GET /admin/submissions`

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::errors::{api_error, rejected_body, ApiError};
use crate::admin::ConfigPatch;
use crate::experiment::ExperimentConfig;
use crate::form::SubmissionRecord;
use crate::service::ExperimentService;

pub fn admin_routes(service: Arc<ExperimentService>) -> Router {
    Router::new()
        .route("/form-config", get(get_config_handler))
        .route("/save-form-config", put(save_config_handler))
        .route("/update-routing-probability", put(update_probability_handler))
        .route("/submissions", get(submissions_handler))
        .with_state(service)
}

#[derive(Debug, Serialize)]
pub struct ConfigResponse {
    #[serde(flatten)]
    pub config: ExperimentConfig,
    pub version: u64,
}

#[derive(Debug, Deserialize)]
pub struct ProbabilityUpdate {
    pub probability: f64,
}

#[derive(Debug, Serialize)]
pub struct SaveResponse {
    pub status: &'static str,
    pub version: u64,
}

impl SaveResponse {
    fn success(version: u64) -> Self {
        Self {
            status: "success",
            version,
        }
    }
}

async fn get_config_handler(State(service): State<Arc<ExperimentService>>) -> Json<ConfigResponse> {
    let snapshot = service.config();
    Json(ConfigResponse {
        config: (*snapshot.config).clone(),
        version: snapshot.version,
    })
}

async fn save_config_handler(
    State(service): State<Arc<ExperimentService>>,
    payload: Result<Json<ConfigPatch>, JsonRejection>,
) -> Result<Json<SaveResponse>, ApiError> {
    let Json(patch) = payload.map_err(rejected_body)?;
    let version = service.admin().save_patch(patch).map_err(api_error)?;
    Ok(Json(SaveResponse::success(version)))
}

async fn update_probability_handler(
    State(service): State<Arc<ExperimentService>>,
    payload: Result<Json<ProbabilityUpdate>, JsonRejection>,
) -> Result<Json<SaveResponse>, ApiError> {
    let Json(update) = payload.map_err(rejected_body)?;
    let version = service
        .admin()
        .update_probability(update.probability)
        .map_err(api_error)?;
    Ok(Json(SaveResponse::success(version)))
}

async fn submissions_handler(
    State(service): State<Arc<ExperimentService>>,
) -> Result<Json<Vec<SubmissionRecord>>, ApiError> {
    service.submissions().map(Json).map_err(api_error)
}
