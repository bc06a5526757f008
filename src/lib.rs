//! abform - A/B testing for web forms
//!
//! Routes visitors between a fixed control form (site A) and an
//! admin-configurable experiment form (site B), validates submissions
//! against whichever form was rendered, and counts visits and submissions
//! per site.

pub mod admin;
pub mod cli;
pub mod experiment;
pub mod form;
pub mod http_server;
pub mod observability;
pub mod persistence;
pub mod routing;
pub mod service;
