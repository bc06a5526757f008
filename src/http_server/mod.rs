//! # HTTP Server Module
//!
//! JSON API over the experiment service, served with Axum.
//!
//! # Endpoints
//!
//! - `/health` - Health check
//! - `/route` - Assign a visit to site A or B
//! - `/form-schema/:site` - Form a renderer should draw
//! - `/submit-form/:site` - Form submissions
//! - `/metrics`, `/admin/metrics` - Visit and submission counters
//! - `/admin/*` - Config editing and submission listing

pub mod admin_routes;
pub mod config;
pub mod errors;
pub mod experiment_routes;
pub mod observability_routes;
pub mod server;

pub use config::HttpServerConfig;
pub use errors::ErrorResponse;
pub use server::{build_router, HttpServer};
