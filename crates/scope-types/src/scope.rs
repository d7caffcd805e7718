//! # Scope Kinds and Identities
//!
//! A scope is a bounded lifetime owned by the host: the application itself,
//! a user session, a UI instance inside a session, or a view shown inside a
//! UI. Scopes nest strictly in that order.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Errors from parsing scope kinds and identifiers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseScopeError {
    /// The scope kind name is not one of the known kinds.
    #[error("Unknown scope kind: {0}")]
    UnknownKind(String),

    /// The identifier is not of the form `kind:uuid`.
    #[error("Malformed scope id: {0}")]
    Malformed(String),
}

/// The lifetime category of a scope.
///
/// Variants are declared from broadest to narrowest, so the derived
/// ordering reads "is broader than" as `<`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeKind {
    /// Process-wide scope. Root of every bus chain.
    Application,
    /// One user session.
    Session,
    /// One UI instance (a browser tab) inside a session.
    Ui,
    /// One displayed view inside a UI.
    View,
}

impl ScopeKind {
    /// All kinds, broadest first.
    pub const ALL: [ScopeKind; 4] = [
        ScopeKind::Application,
        ScopeKind::Session,
        ScopeKind::Ui,
        ScopeKind::View,
    ];

    /// Stable lowercase name used in logs, metrics labels and ids.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Application => "application",
            Self::Session => "session",
            Self::Ui => "ui",
            Self::View => "view",
        }
    }

    /// True if `self` is strictly broader than `other`.
    #[must_use]
    pub fn is_broader_than(&self, other: ScopeKind) -> bool {
        *self < other
    }

    /// The next broader kind, if any.
    #[must_use]
    pub fn parent_kind(&self) -> Option<ScopeKind> {
        match self {
            Self::Application => None,
            Self::Session => Some(Self::Application),
            Self::Ui => Some(Self::Session),
            Self::View => Some(Self::Ui),
        }
    }
}

impl fmt::Display for ScopeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScopeKind {
    type Err = ParseScopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "application" | "app" => Ok(Self::Application),
            "session" => Ok(Self::Session),
            "ui" => Ok(Self::Ui),
            "view" => Ok(Self::View),
            other => Err(ParseScopeError::UnknownKind(other.to_string())),
        }
    }
}

/// Opaque identity of one concrete scope instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScopeId {
    kind: ScopeKind,
    value: Uuid,
}

impl ScopeId {
    /// Create a fresh random id of the given kind.
    #[must_use]
    pub fn new(kind: ScopeKind) -> Self {
        Self {
            kind,
            value: Uuid::new_v4(),
        }
    }

    /// Build an id from a host-assigned uuid.
    #[must_use]
    pub fn from_parts(kind: ScopeKind, value: Uuid) -> Self {
        Self { kind, value }
    }

    /// Fresh session id.
    #[must_use]
    pub fn session() -> Self {
        Self::new(ScopeKind::Session)
    }

    /// Fresh UI id.
    #[must_use]
    pub fn ui() -> Self {
        Self::new(ScopeKind::Ui)
    }

    /// Fresh view id.
    #[must_use]
    pub fn view() -> Self {
        Self::new(ScopeKind::View)
    }

    #[must_use]
    pub fn kind(&self) -> ScopeKind {
        self.kind
    }

    #[must_use]
    pub fn value(&self) -> Uuid {
        self.value
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.value)
    }
}

impl FromStr for ScopeId {
    type Err = ParseScopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, value) = s
            .split_once(':')
            .ok_or_else(|| ParseScopeError::Malformed(s.to_string()))?;
        let kind = kind.parse::<ScopeKind>()?;
        let value = Uuid::parse_str(value).map_err(|_| ParseScopeError::Malformed(s.to_string()))?;
        Ok(Self { kind, value })
    }
}
