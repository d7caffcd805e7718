//! # Scope Telemetry
//!
//! Logging and metrics wiring for hosts that embed scoped stores and buses.
//!
//! ## Components
//!
//! - **Logging**: `tracing-subscriber` with `EnvFilter`, pretty or JSON output
//! - **Metrics**: Prometheus counters fed by [`PrometheusRecorder`]
//!
//! ## Usage
//!
//! ```rust,ignore
//! use scope_telemetry::{init_telemetry, PrometheusRecorder, TelemetryConfig};
//! use scoped_bus::{EventBusConfig, ScopedEventBus};
//! use std::sync::Arc;
//!
//! init_telemetry(&TelemetryConfig::from_env())?;
//! let app_bus = ScopedEventBus::root_with_config(
//!     EventBusConfig::from_env().with_recorder(Arc::new(PrometheusRecorder)),
//! );
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `SCOPE_SERVICE_NAME` | `scopebus` | Service name in logs |
//! | `SCOPE_LOG_LEVEL` / `RUST_LOG` | `info` | Log level filter |
//! | `SCOPE_JSON_LOGS` | `false` | JSON log lines |
//! | `SCOPE_CONSOLE_OUTPUT` | `true` | Write logs to stdout |

#![cfg_attr(test, allow(clippy::unwrap_used))]

mod config;
mod logging;
mod metrics;

pub use config::TelemetryConfig;
pub use logging::{env_filter, init_logging};
pub use metrics::{
    gather_text, observe_registry, register_metrics, PrometheusRecorder, ACTIVE_SCOPES,
    BUS_DELIVERIES, BUS_EVENTS_PUBLISHED, BUS_LISTENER_FAILURES, REGISTRY,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl TelemetryError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    #[must_use]
    pub fn as_label(&self) -> &'static str {
        match self {
            Self::LoggingInit(_) => "logging_init",
            Self::MetricsInit(_) => "metrics_init",
            Self::Config(_) => "config",
        }
    }
}

/// Register metrics, then install logging.
///
/// # Errors
///
/// The first failing step's [`TelemetryError`].
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    register_metrics()?;
    init_logging(config)
}
