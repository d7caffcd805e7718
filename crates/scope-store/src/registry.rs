//! # Scope Store Registry
//!
//! Owns every live store keyed by scope id and ends scopes on behalf of the
//! host lifecycle (session expiry, UI detach, view navigation).
//!
//! Ending a scope also ends the scopes registered as its children, narrowest
//! first, so a view's cleanup never observes its UI already torn down.

use crate::error::ScopeError;
use crate::store::{DestroyReport, ScopeStore};
use parking_lot::RwLock;
use scope_types::ScopeId;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Central registry of live scope stores.
#[derive(Default)]
pub struct ScopeStoreRegistry {
    stores: RwLock<HashMap<ScopeId, Arc<ScopeStore>>>,
    children: RwLock<HashMap<ScopeId, Vec<ScopeId>>>,
}

impl ScopeStoreRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The store for `id`, created on first access.
    pub fn store(&self, id: ScopeId) -> Arc<ScopeStore> {
        if let Some(store) = self.stores.read().get(&id) {
            return Arc::clone(store);
        }

        let mut stores = self.stores.write();
        Arc::clone(stores.entry(id).or_insert_with(|| {
            debug!(scope_id = %id, "Scope store opened");
            Arc::new(ScopeStore::new(id))
        }))
    }

    /// The store for `id` if it is live.
    #[must_use]
    pub fn get(&self, id: ScopeId) -> Option<Arc<ScopeStore>> {
        self.stores.read().get(&id).cloned()
    }

    /// Record that `child` lives inside `parent`.
    ///
    /// # Errors
    ///
    /// - `ScopeError::InvalidNesting` - `child` is not strictly narrower
    pub fn register_child(&self, parent: ScopeId, child: ScopeId) -> Result<(), ScopeError> {
        if !parent.kind().is_broader_than(child.kind()) {
            return Err(ScopeError::InvalidNesting { parent, child });
        }
        let mut children = self.children.write();
        let entry = children.entry(parent).or_default();
        if !entry.contains(&child) {
            entry.push(child);
        }
        Ok(())
    }

    /// Destroy and forget the store for `id` and every descendant scope.
    ///
    /// Returns the report for `id` itself, or `None` if it was never opened.
    pub fn end_scope(&self, id: ScopeId) -> Option<DestroyReport> {
        let descendants = self.take_children(id);
        for child in descendants {
            self.end_scope(child);
        }

        let store = self.stores.write().remove(&id)?;
        let report = store.destroy();
        info!(
            scope_id = %id,
            callbacks = report.callbacks_run,
            panicked = report.callbacks_panicked,
            "Scope ended"
        );
        Some(report)
    }

    /// End every live scope (application shutdown). Returns how many ended.
    pub fn end_all(&self) -> usize {
        let mut ids: Vec<ScopeId> = self.stores.read().keys().copied().collect();
        // Narrowest first.
        ids.sort_by(|a, b| b.kind().cmp(&a.kind()));
        ids.into_iter()
            .filter_map(|id| self.end_scope(id))
            .count()
    }

    /// Number of live stores.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.stores.read().len()
    }

    fn take_children(&self, id: ScopeId) -> Vec<ScopeId> {
        self.children.write().remove(&id).unwrap_or_default()
    }
}
