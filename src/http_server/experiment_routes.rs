//! Visitor-facing HTTP Routes
//!
//! - `GET  /route`               pick a site for this visit
//! - `GET  /form-schema/:site`   schema a renderer draws for site-a / site-b
//! - `POST /submit-form/:site`   submit form values

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::{api_error, not_found, rejected_body, ApiError};
use crate::experiment::{ExperimentError, RoutingDecision, Variant};
use crate::form::{values_from_json, FormSchema, VariantDiff};
use crate::service::ExperimentService;

pub fn experiment_routes(service: Arc<ExperimentService>) -> Router {
    Router::new()
        .route("/route", get(route_handler))
        .route("/form-schema/:site", get(form_schema_handler))
        .route("/submit-form/:site", post(submit_handler))
        .with_state(service)
}

// ==================
// Request/Response Types
// ==================

#[derive(Debug, Deserialize)]
pub struct RouteQuery {
    pub visitor: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SubmitQuery {
    /// Config version the site B form was rendered from
    pub config_version: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct FormSchemaResponse {
    #[serde(flatten)]
    pub schema: FormSchema,
    pub initial_values: BTreeMap<String, String>,
}

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub status: &'static str,
    pub id: Uuid,
    #[serde(flatten)]
    pub diff: Option<VariantDiff>,
}

fn parse_site(site: &str) -> Result<Variant, ApiError> {
    Variant::from_site_slug(site).ok_or_else(|| not_found(format!("Unknown site '{}'", site)))
}

// ==================
// Handlers
// ==================

async fn route_handler(
    State(service): State<Arc<ExperimentService>>,
    Query(query): Query<RouteQuery>,
) -> Json<RoutingDecision> {
    Json(service.route(query.visitor.as_deref()))
}

async fn form_schema_handler(
    State(service): State<Arc<ExperimentService>>,
    Path(site): Path<String>,
) -> Result<Json<FormSchemaResponse>, ApiError> {
    let variant = parse_site(&site)?;
    let schema = service.form_schema(variant);
    let initial_values = schema.initial_values();
    Ok(Json(FormSchemaResponse {
        schema,
        initial_values,
    }))
}

async fn submit_handler(
    State(service): State<Arc<ExperimentService>>,
    Path(site): Path<String>,
    Query(query): Query<SubmitQuery>,
    payload: Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<Json<SubmitResponse>, ApiError> {
    let variant = parse_site(&site)?;
    let Json(body) = payload.map_err(rejected_body)?;
    let values = values_from_json(body).map_err(|e| api_error(ExperimentError::from(e)))?;
    let receipt = service
        .submit(variant, values, query.config_version)
        .map_err(api_error)?;

    Ok(Json(SubmitResponse {
        status: "success",
        id: receipt.id,
        diff: receipt.diff,
    }))
}
