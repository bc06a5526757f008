//! # HTTP Server
//!
//! Combines all experiment routers into one Axum server, flushes metrics on
//! an interval, and flushes once more on graceful shutdown.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;

use super::admin_routes::admin_routes;
use super::config::HttpServerConfig;
use super::experiment_routes::experiment_routes;
use super::observability_routes::{admin_metrics_routes, observability_routes};
use crate::observability::{Event, Logger};
use crate::service::ExperimentService;

/// HTTP server for the experiment API
pub struct HttpServer {
    config: HttpServerConfig,
    service: Arc<ExperimentService>,
    router: Router,
    metrics_flush_interval: Option<Duration>,
}

impl HttpServer {
    /// Create a server over an in-memory service with default configuration
    pub fn new() -> Self {
        Self::with_service(HttpServerConfig::default(), Arc::new(ExperimentService::in_memory()))
    }

    pub fn with_service(config: HttpServerConfig, service: Arc<ExperimentService>) -> Self {
        let router = build_router(&config, service.clone());
        Self {
            config,
            service,
            router,
            metrics_flush_interval: None,
        }
    }

    /// Persist metrics every `interval` while serving
    pub fn with_metrics_flush_interval(mut self, interval: Duration) -> Self {
        self.metrics_flush_interval = Some(interval);
        self
    }

    /// Get the socket address
    pub fn socket_addr(&self) -> String {
        self.config.socket_addr()
    }

    /// Get the router (for testing)
    pub fn router(self) -> Router {
        self.router
    }

    /// Serve until Ctrl-C
    pub async fn start(self) -> io::Result<()> {
        let addr = self.config.bind_addr()?;

        let listener = TcpListener::bind(addr).await?;
        Logger::info(Event::ServerListening, &[("addr", addr.to_string().as_str())]);

        let flusher = self.metrics_flush_interval.map(|period| {
            let service = self.service.clone();
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(period);
                ticker.tick().await;
                loop {
                    ticker.tick().await;
                    // flush_metrics logs failures itself; the next tick retries.
                    let _ = service.flush_metrics();
                }
            })
        });

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        Logger::info(Event::ShutdownStart, &[]);
        if let Some(handle) = flusher {
            handle.abort();
        }
        let _ = self.service.flush_metrics();
        Logger::info(Event::ShutdownComplete, &[]);
        Ok(())
    }
}

impl Default for HttpServer {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the combined router
pub fn build_router(config: &HttpServerConfig, service: Arc<ExperimentService>) -> Router {
    Router::new()
        // /health, /metrics
        .merge(observability_routes(service.clone()))
        // /route, /form-schema/:site, /submit-form/:site
        .merge(experiment_routes(service.clone()))
        .nest(
            "/admin",
            admin_routes(service.clone()).merge(admin_metrics_routes(service)),
        )
        .layer(config.cors_layer())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        // No signal handler available; serve until the process is killed.
        std::future::pending::<()>().await;
    }
}
