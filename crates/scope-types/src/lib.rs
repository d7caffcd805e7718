//! # Scope Types Crate
//!
//! Shared vocabulary for the scoped store and the scoped event bus.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: scope kinds and scope identities are defined
//!   here and nowhere else.
//! - **Strict nesting**: `Application > Session > Ui > View`. Every other crate
//!   relies on this ordering when it builds hierarchies.

pub mod scope;

pub use scope::{ParseScopeError, ScopeId, ScopeKind};
