//! Error types for scoped stores and scope resolution

use scope_types::{ScopeId, ScopeKind};
use thiserror::Error;

/// Errors raised by stores, resolvers and the store registry.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScopeError {
    /// No scope of the requested kind is bound to the caller's context.
    #[error("No active {kind} scope for current context")]
    NoActiveScope { kind: ScopeKind },

    /// The store has already been destroyed and accepts no further work.
    #[error("Scope store {id} has been destroyed")]
    StoreDestroyed { id: ScopeId },

    /// The bean stored under `key` is not of the requested type.
    #[error("Bean '{key}' is not of type {expected}")]
    TypeMismatch { key: String, expected: &'static str },

    /// An id of the wrong kind was supplied where a specific kind is required.
    #[error("Scope id {id} is not a {expected} scope")]
    WrongKind { id: ScopeId, expected: ScopeKind },

    /// A child scope must be strictly narrower than its parent.
    #[error("Scope {child} cannot nest inside {parent}")]
    InvalidNesting { parent: ScopeId, child: ScopeId },
}

impl ScopeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    #[must_use]
    pub fn as_label(&self) -> &'static str {
        match self {
            Self::NoActiveScope { .. } => "no_active_scope",
            Self::StoreDestroyed { .. } => "store_destroyed",
            Self::TypeMismatch { .. } => "type_mismatch",
            Self::WrongKind { .. } => "wrong_kind",
            Self::InvalidNesting { .. } => "invalid_nesting",
        }
    }
}
