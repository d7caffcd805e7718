//! Error types for the scoped event bus

use scope_types::ScopeKind;
use thiserror::Error;

/// Error returned by a listener callback.
pub type ListenerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type every listener callback returns.
pub type HandlerResult = Result<(), ListenerError>;

/// Errors raised synchronously by bus operations.
#[derive(Debug, Error)]
pub enum EventBusError {
    /// A multi-scope publish named a scope absent from the ancestor chain.
    #[error("Scope {requested} is not reachable from the {origin} bus (available: {available:?})")]
    UnsupportedScope {
        requested: ScopeKind,
        origin: ScopeKind,
        available: Vec<ScopeKind>,
    },

    /// A child bus must be strictly narrower than its parent.
    #[error("A {child} bus cannot be a child of a {parent} bus")]
    InvalidHierarchy { parent: ScopeKind, child: ScopeKind },

    /// A listener failed; delivery of the publish call stopped there.
    #[error("Listener '{listener}' failed on {scope} event (topic '{topic}'): {source}")]
    ListenerFailed {
        listener: String,
        scope: ScopeKind,
        topic: String,
        #[source]
        source: ListenerError,
    },
}

impl EventBusError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    #[must_use]
    pub fn as_label(&self) -> &'static str {
        match self {
            Self::UnsupportedScope { .. } => "unsupported_scope",
            Self::InvalidHierarchy { .. } => "invalid_hierarchy",
            Self::ListenerFailed { .. } => "listener_failed",
        }
    }
}

/// Invalid handler-set declaration, reported when the set is built.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("No handler methods declared on {target}")]
    NoHandlers { target: &'static str },

    #[error("Handler method name must not be empty (declared on {target})")]
    EmptyMethodName { target: &'static str },

    #[error("Handler method '{method}' is declared more than once")]
    DuplicateMethod { method: String },

    #[error("Handler method '{method}' declares an empty topic")]
    EmptyTopic { method: String },
}

impl ConfigurationError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    #[must_use]
    pub fn as_label(&self) -> &'static str {
        match self {
            Self::NoHandlers { .. } => "no_handlers",
            Self::EmptyMethodName { .. } => "empty_method_name",
            Self::DuplicateMethod { .. } => "duplicate_method",
            Self::EmptyTopic { .. } => "empty_topic",
        }
    }
}

/// A handler-set method failed.
#[derive(Debug, Error)]
#[error("Handler method '{method}' failed: {source}")]
pub struct HandlerMethodError {
    pub method: String,
    #[source]
    pub source: ListenerError,
}
