//! CLI command implementations
//!
//! `start` boots in a fixed order: load the config file, open persisted
//! state, build the service, then hand it to the HTTP server.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::experiment::validate_probability;
use crate::http_server::{HttpServer, HttpServerConfig};
use crate::observability::{Event, Logger};
use crate::routing::{simulate as simulate_split, SeededSampler, ThreadRngSampler};
use crate::service::ExperimentService;

use super::args::Command;
use super::errors::{CliError, CliResult};
use super::io::write_json;

/// Configuration file structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory for persisted state; everything stays in memory when absent
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    #[serde(default)]
    pub server: HttpServerConfig,

    /// Seconds between metric flushes (default 30)
    #[serde(default = "default_metrics_flush_interval")]
    pub metrics_flush_interval_secs: u64,

    /// Route repeat visitors to the same site when they send `?visitor=`
    #[serde(default)]
    pub sticky_routing: bool,
}

fn default_metrics_flush_interval() -> u64 {
    30
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: Some(PathBuf::from("./abform-data")),
            server: HttpServerConfig::default(),
            metrics_flush_interval_secs: default_metrics_flush_interval(),
            sticky_routing: false,
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read config: {}", e)))?;

        let config: Config = serde_json::from_str(&content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> CliResult<()> {
        if self.metrics_flush_interval_secs == 0 {
            return Err(CliError::config_error(
                "metrics_flush_interval_secs must be > 0",
            ));
        }

        if self.server.host.trim().is_empty() {
            return Err(CliError::config_error("server.host must not be empty"));
        }

        if let Some(dir) = &self.data_dir {
            if dir.as_os_str().is_empty() {
                return Err(CliError::config_error("data_dir must not be empty"));
            }
        }

        Ok(())
    }

    pub fn metrics_flush_interval(&self) -> Duration {
        Duration::from_secs(self.metrics_flush_interval_secs)
    }
}

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Init { config } => init(&config),
        Command::Start { config } => start(&config),
        Command::Simulate {
            probability,
            samples,
            seed,
        } => simulate(probability, samples, seed),
    }
}

/// Write a default configuration file and create its data directory
///
/// Refuses to overwrite an existing config file.
pub fn init(config_path: &Path) -> CliResult<()> {
    if config_path.exists() {
        return Err(CliError::already_initialized(config_path.display()));
    }

    let config = Config::default();
    if let Some(dir) = &config.data_dir {
        let dir = resolve_data_dir(config_path, dir);
        fs::create_dir_all(&dir).map_err(|e| {
            CliError::config_error(format!("Failed to create directory {:?}: {}", dir, e))
        })?;
    }

    let content = serde_json::to_string_pretty(&config)?;
    fs::write(config_path, content).map_err(|e| {
        CliError::config_error(format!("Failed to write {:?}: {}", config_path, e))
    })?;

    write_json(&json!({
        "initialized": true,
        "config": config_path.display().to_string(),
    }))
}

/// Start the experiment server and block until shutdown
pub fn start(config_path: &Path) -> CliResult<()> {
    Logger::info(Event::BootStart, &[]);

    let config = Config::load(config_path)?;
    Logger::info(
        Event::ConfigFileLoaded,
        &[
            ("path", config_path.display().to_string().as_str()),
            ("sticky_routing", config.sticky_routing.to_string().as_str()),
        ],
    );

    let service = match &config.data_dir {
        Some(dir) => ExperimentService::open(resolve_data_dir(config_path, dir))?,
        None => ExperimentService::in_memory(),
    }
    .with_sticky_routing(config.sticky_routing);

    let server = HttpServer::with_service(config.server.clone(), Arc::new(service))
        .with_metrics_flush_interval(config.metrics_flush_interval());

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::boot_failed(format!("Failed to create tokio runtime: {}", e)))?;

    Logger::info(
        Event::BootComplete,
        &[("addr", server.socket_addr().as_str())],
    );

    rt.block_on(async {
        server
            .start()
            .await
            .map_err(|e| CliError::boot_failed(format!("HTTP server failed: {}", e)))
    })?;

    Ok(())
}

/// Draw `samples` routing decisions offline and print the observed split
pub fn simulate(probability: f64, samples: u64, seed: Option<u64>) -> CliResult<()> {
    validate_probability(probability).map_err(|e| CliError::invalid_argument(e.to_string()))?;
    if samples == 0 {
        return Err(CliError::invalid_argument("samples must be > 0"));
    }

    let report = match seed {
        Some(seed) => simulate_split(probability, samples, &SeededSampler::new(seed)),
        None => simulate_split(probability, samples, &ThreadRngSampler),
    };

    write_json(&report)
}

/// Relative data directories are resolved against the config file's directory
fn resolve_data_dir(config_path: &Path, data_dir: &Path) -> PathBuf {
    if data_dir.is_absolute() {
        return data_dir.to_path_buf();
    }
    match config_path.parent() {
        Some(parent) => parent.join(data_dir),
        None => data_dir.to_path_buf(),
    }
}
