//! Metrics hooks for bus operations
//!
//! Every bus keeps its own [`BusMetrics`] counters and additionally forwards
//! to the [`MetricsRecorder`] configured in
//! [`EventBusConfig`](crate::EventBusConfig), which is how external systems
//! (Prometheus via `scope-telemetry`) get fed.

use scope_types::ScopeKind;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Trait for custom metrics recording implementations.
pub trait MetricsRecorder: Send + Sync {
    /// An event was published on a bus of `scope`.
    fn record_published(&self, scope: ScopeKind);

    /// A listener on a bus of `scope` received an event.
    fn record_delivered(&self, scope: ScopeKind);

    /// A listener on a bus of `scope` returned an error.
    fn record_failed(&self, scope: ScopeKind);
}

/// Thread-safe per-bus counters.
#[derive(Debug, Default)]
pub struct BusMetrics {
    pub events_published: AtomicU64,
    pub deliveries: AtomicU64,
    pub listener_failures: AtomicU64,
}

impl BusMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            events_published: self.events_published.load(Ordering::Relaxed),
            deliveries: self.deliveries.load(Ordering::Relaxed),
            listener_failures: self.listener_failures.load(Ordering::Relaxed),
        }
    }

    /// Reset all counters
    pub fn reset(&self) {
        self.events_published.store(0, Ordering::Relaxed);
        self.deliveries.store(0, Ordering::Relaxed);
        self.listener_failures.store(0, Ordering::Relaxed);
    }
}

impl MetricsRecorder for BusMetrics {
    fn record_published(&self, _scope: ScopeKind) {
        self.events_published.fetch_add(1, Ordering::Relaxed);
    }

    fn record_delivered(&self, _scope: ScopeKind) {
        self.deliveries.fetch_add(1, Ordering::Relaxed);
    }

    fn record_failed(&self, _scope: ScopeKind) {
        self.listener_failures.fetch_add(1, Ordering::Relaxed);
    }
}

/// Point-in-time metrics snapshot
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub events_published: u64,
    pub deliveries: u64,
    pub listener_failures: u64,
}

/// No-op metrics recorder for when metrics are disabled
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpMetrics;

impl MetricsRecorder for NoOpMetrics {
    fn record_published(&self, _scope: ScopeKind) {}
    fn record_delivered(&self, _scope: ScopeKind) {}
    fn record_failed(&self, _scope: ScopeKind) {}
}
