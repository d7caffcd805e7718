//! Prometheus metrics for scoped stores and event buses.
//!
//! All metrics follow the naming convention: `scope_<component>_<metric>_<unit>`
//!
//! Buses feed these counters through [`PrometheusRecorder`], installed via
//! [`EventBusConfig::with_recorder`](scoped_bus::EventBusConfig::with_recorder).

use lazy_static::lazy_static;
use prometheus::{Encoder, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use scope_store::ScopeStoreRegistry;
use scope_types::ScopeKind;
use scoped_bus::MetricsRecorder;

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // EVENT BUS METRICS
    // =========================================================================

    /// Events published, by scope of the publishing bus
    pub static ref BUS_EVENTS_PUBLISHED: IntCounterVec = IntCounterVec::new(
        Opts::new("scope_bus_events_published_total", "Total events published"),
        &["scope"]
    ).expect("metric creation failed");

    /// Listener deliveries, by scope of the receiving bus
    pub static ref BUS_DELIVERIES: IntCounterVec = IntCounterVec::new(
        Opts::new("scope_bus_deliveries_total", "Total events delivered to listeners"),
        &["scope"]
    ).expect("metric creation failed");

    /// Listener failures, by scope of the receiving bus
    pub static ref BUS_LISTENER_FAILURES: IntCounterVec = IntCounterVec::new(
        Opts::new("scope_bus_listener_failures_total", "Listener errors that aborted a publish"),
        &["scope"]
    ).expect("metric creation failed");

    // =========================================================================
    // SCOPE STORE METRICS
    // =========================================================================

    /// Scope stores currently alive in the host's registry
    pub static ref ACTIVE_SCOPES: IntGauge = IntGauge::new(
        "scope_store_active_scopes",
        "Number of active scope stores"
    ).expect("metric creation failed");
}

/// Register all metrics with the global registry.
///
/// # Errors
///
/// [`TelemetryError::MetricsInit`] if a metric is already registered.
pub fn register_metrics() -> Result<(), TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(BUS_EVENTS_PUBLISHED.clone()),
        Box::new(BUS_DELIVERIES.clone()),
        Box::new(BUS_LISTENER_FAILURES.clone()),
        Box::new(ACTIVE_SCOPES.clone()),
    ];

    for metric in metrics {
        REGISTRY
            .register(metric)
            .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    }
    Ok(())
}

/// Encode all metrics as Prometheus text format.
pub fn gather_text() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Refresh the active-scope gauge from `registry`.
pub fn observe_registry(registry: &ScopeStoreRegistry) {
    ACTIVE_SCOPES.set(i64::try_from(registry.active_count()).unwrap_or(i64::MAX));
}

/// [`MetricsRecorder`] backed by the global Prometheus counters.
#[derive(Debug, Default, Clone, Copy)]
pub struct PrometheusRecorder;

impl MetricsRecorder for PrometheusRecorder {
    fn record_published(&self, scope: ScopeKind) {
        BUS_EVENTS_PUBLISHED.with_label_values(&[scope.as_str()]).inc();
    }

    fn record_delivered(&self, scope: ScopeKind) {
        BUS_DELIVERIES.with_label_values(&[scope.as_str()]).inc();
    }

    fn record_failed(&self, scope: ScopeKind) {
        BUS_LISTENER_FAILURES.with_label_values(&[scope.as_str()]).inc();
    }
}
