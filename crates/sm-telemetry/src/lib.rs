//! # ShardMail Telemetry
//!
//! Logging and metrics shared by every ShardMail node.
//!
//! ## Components
//!
//! - **Logging**: `tracing` subscriber with an `EnvFilter`, pretty or JSON output
//! - **Metrics**: Prometheus registry scraped from the balancer's `/metrics`
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sm_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     init_telemetry(&TelemetryConfig::for_role("balancer"))?;
//!     Ok(())
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `SM_LOG_LEVEL` | `info` | Log level filter (falls back to `RUST_LOG`) |
//! | `SM_JSON_LOGS` | `false` | JSON log lines |
//! | `SM_CONSOLE_OUTPUT` | `true` | Write logs to stdout |
//! | `SM_SERVICE_NAME` | `shardmail` | Service name |

mod config;
mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use logging::init_logging;
pub use metrics::{
    encode_metrics, register_metrics, time_shard_call, HistogramTimer, CORRUPTED_READS,
    EVENT_LOG_SIZE, HTTP_REQUESTS, MESSAGES_ROUTED, ROUTING_FAILURES, SHARD_CALL_DURATION,
    SHARD_CALL_FAILURES, SHARD_UP,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),
}

/// Register metrics and install the log subscriber.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    register_metrics()?;
    init_logging(config)
}
