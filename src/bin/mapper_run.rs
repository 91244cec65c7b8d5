//! Mapper Runner Binary
//!
//! Fits a Mapper pipeline on a JSON dataset and prints the graph as JSON.
//!
//! ## Configuration
//!
//! Environment variables:
//! - `MAPPER_INPUT`: path to the dataset, a JSON array of rows (required)
//! - `MAPPER_CONFIG`: path to a JSON `MapperConfig` (default: built-in defaults)
//! - `MAPPER_FITTED_OUT`: path to write the fitted state to (optional)
//! - `RUST_LOG`: Log level filter (default: info)
//! - `LOG_FORMAT`: "json" for structured logs, "pretty" for development (default: json)
//!
//! Logs go to stderr; stdout carries only the graph.
//!
//! ## Usage
//!
//! ```bash
//! MAPPER_INPUT=points.json cargo run --bin mapper_run --features cli > graph.json
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use tracing::{error, info};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use mapper_kernel::{ConfigError, MapperConfig, MapperError, MapperPipeline, Matrix};

#[derive(Debug, thiserror::Error)]
enum RunError {
    #[error("MAPPER_INPUT is not set")]
    MissingInput,
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Mapper(#[from] MapperError),
}

/// Initialize the tracing subscriber with JSON or pretty format
fn init_tracing() {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "json".to_string());

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "mapper_run=info,mapper_kernel=info".into());

    if log_format == "pretty" {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_current_span(true)
                    .with_span_events(FmtSpan::CLOSE)
                    .flatten_event(true),
            )
            .init();
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: PathBuf) -> Result<T, RunError> {
    let text = std::fs::read_to_string(&path).map_err(|source| RunError::Read {
        path: path.clone(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| RunError::Json { path, source })
}

fn run() -> Result<(), RunError> {
    let input = std::env::var_os("MAPPER_INPUT")
        .map(PathBuf::from)
        .ok_or(RunError::MissingInput)?;

    let config: MapperConfig = match std::env::var_os("MAPPER_CONFIG") {
        Some(path) => read_json(PathBuf::from(path))?,
        None => MapperConfig::default(),
    };

    let rows: Vec<Vec<f64>> = read_json(input.clone())?;
    let data = Matrix::from_rows(rows)?;
    info!(
        input = %input.display(),
        n_points = data.n_rows(),
        n_features = data.n_cols(),
        "dataset loaded"
    );

    let start = Instant::now();
    let mut pipeline = MapperPipeline::new(config)?;
    let graph = pipeline.fit_transform(&data)?;
    info!(
        executor = pipeline.executor_name(),
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        components = graph.connected_components().len(),
        graph_hash = %graph.graph_hash,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "mapper graph built"
    );

    if let (Some(path), Some(fitted)) = (std::env::var_os("MAPPER_FITTED_OUT"), pipeline.fitted()) {
        let path = PathBuf::from(path);
        std::fs::write(&path, fitted.to_json()?).map_err(|source| RunError::Write {
            path: path.clone(),
            source,
        })?;
        info!(path = %path.display(), params_hash = %fitted.params_hash(), "fitted state written");
    }

    let json = serde_json::to_string_pretty(&graph).map_err(MapperError::from)?;
    println!("{json}");
    Ok(())
}

fn main() -> ExitCode {
    init_tracing();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "mapper run failed");
            ExitCode::FAILURE
        }
    }
}
