//! # Scope Store
//!
//! Exactly-one-instance-per-key object stores bound to a session, UI or view
//! lifetime, with cleanup that runs exactly once when the scope ends.
//!
//! ## Components
//!
//! ```text
//! ScopeContext ──► ScopeContextResolver ──► ScopeStoreRegistry ──► ScopeStore
//!  (explicit)        (pluggable strategy)     (id → store)          (beans + callbacks)
//! ```
//!
//! - [`ScopeStore`]: keyed bean cache, destruction callbacks, idempotent teardown.
//! - [`ScopeContext`]: the scopes bound to the current unit of work, passed
//!   explicitly through the call chain.
//! - [`ScopeContextResolver`]: maps a context to the store of one scope kind.
//! - [`ScopeStoreRegistry`]: owns live stores and ends scopes (children first).
//!
//! ## Failure Model
//!
//! - Resolving a kind the context does not carry fails with
//!   [`ScopeError::NoActiveScope`]; there is no default store.
//! - A destroyed store fails closed on `get` and callback registration.

#![allow(clippy::missing_const_for_fn)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod context;
pub mod error;
pub mod registry;
pub mod resolver;
pub mod store;

pub use context::ScopeContext;
pub use error::ScopeError;
pub use registry::ScopeStoreRegistry;
pub use resolver::{FixedScopeResolver, RegistryResolver, ScopeContextResolver};
pub use store::{Bean, DestroyReport, DestructionCallback, ScopeStore};
