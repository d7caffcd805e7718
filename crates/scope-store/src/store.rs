//! # Scope Store
//!
//! Keyed bean cache bound to one scope instance.
//!
//! ## Guarantees
//!
//! - **One instance per key**: concurrent `get` calls for the same absent key
//!   run exactly one factory; every caller observes the winner.
//! - **Nested construction**: the map lock is never held while a factory runs,
//!   so a factory may fetch other beans from the same store.
//! - **Single teardown**: `destroy()` runs each destruction callback once, in
//!   registration order. Later calls are no-ops.
//!
//! ## Lifecycle
//!
//! ```text
//! ACTIVE ──destroy()──► DESTROYED (terminal)
//!                          │
//!                          ├─ get / register_destruction_callback ─► Err(StoreDestroyed)
//!                          └─ remove / destroy                     ─► no-op
//! ```

use crate::error::ScopeError;
use parking_lot::Mutex;
use scope_types::ScopeId;
use std::any::{type_name, Any};
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, OnceLock};
use tracing::{debug, error, info, warn};

/// A type-erased bean instance held by a store.
pub type Bean = Arc<dyn Any + Send + Sync>;

/// Zero-argument cleanup action run when the owning store is destroyed.
pub type DestructionCallback = Box<dyn FnOnce() + Send + 'static>;

/// Outcome of a `destroy()` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DestroyReport {
    /// False when the store had already been destroyed by an earlier call.
    pub first_destroy: bool,
    /// Number of beans dropped from the store.
    pub beans_released: usize,
    /// Number of destruction callbacks invoked.
    pub callbacks_run: usize,
    /// Number of destruction callbacks that panicked.
    pub callbacks_panicked: usize,
}

struct StoreState {
    /// Per-key once-cells; a cell is inserted before its factory runs.
    beans: HashMap<String, Arc<OnceLock<Bean>>>,
    /// Callbacks in registration order.
    callbacks: Vec<(String, DestructionCallback)>,
    destroyed: bool,
}

/// Object store for one session, UI or view scope.
pub struct ScopeStore {
    id: ScopeId,
    state: Mutex<StoreState>,
}

impl ScopeStore {
    /// Create an empty, active store.
    #[must_use]
    pub fn new(id: ScopeId) -> Self {
        Self {
            id,
            state: Mutex::new(StoreState {
                beans: HashMap::new(),
                callbacks: Vec::new(),
                destroyed: false,
            }),
        }
    }

    /// Identity of the scope this store belongs to.
    #[must_use]
    pub fn id(&self) -> ScopeId {
        self.id
    }

    /// Return the bean under `key`, creating it with `factory` if absent.
    ///
    /// # Errors
    ///
    /// - `ScopeError::StoreDestroyed` - the store was destroyed before or
    ///   during the call
    pub fn get_raw<F>(&self, key: &str, factory: F) -> Result<Bean, ScopeError>
    where
        F: FnOnce() -> Bean,
    {
        let cell = {
            let mut state = self.state.lock();
            if state.destroyed {
                warn!(scope_id = %self.id, key, "Bean lookup on destroyed scope store");
                return Err(ScopeError::StoreDestroyed { id: self.id });
            }
            Arc::clone(state.beans.entry(key.to_string()).or_default())
        };

        let mut created = false;
        let bean = Arc::clone(cell.get_or_init(|| {
            created = true;
            factory()
        }));

        if created {
            debug!(scope_id = %self.id, key, "Bean created");
        }
        // A concurrent destroy() may have cleared the map while the factory
        // ran; callers that waited on the same cell see that too.
        if self.state.lock().destroyed {
            return Err(ScopeError::StoreDestroyed { id: self.id });
        }

        Ok(bean)
    }

    /// Typed variant of [`Self::get_raw`].
    ///
    /// # Errors
    ///
    /// - `ScopeError::StoreDestroyed` - the store has been destroyed
    /// - `ScopeError::TypeMismatch` - `key` already holds a bean of another type
    pub fn get<T, F>(&self, key: &str, factory: F) -> Result<Arc<T>, ScopeError>
    where
        T: Any + Send + Sync,
        F: FnOnce() -> T,
    {
        let bean = self.get_raw(key, || Arc::new(factory()) as Bean)?;
        bean.downcast::<T>().map_err(|_| ScopeError::TypeMismatch {
            key: key.to_string(),
            expected: type_name::<T>(),
        })
    }

    /// Return the bean under `key` without creating it.
    #[must_use]
    pub fn get_if_present(&self, key: &str) -> Option<Bean> {
        let state = self.state.lock();
        if state.destroyed {
            return None;
        }
        state.beans.get(key).and_then(|cell| cell.get().cloned())
    }

    /// True if a fully constructed bean exists under `key`.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.get_if_present(key).is_some()
    }

    /// Number of fully constructed beans.
    #[must_use]
    pub fn len(&self) -> usize {
        let state = self.state.lock();
        state.beans.values().filter(|cell| cell.get().is_some()).count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.state.lock().destroyed
    }

    /// Remove the bean under `key` together with its destruction callback.
    ///
    /// The callback is discarded without being invoked. Returns `None` when
    /// nothing was stored or the store is destroyed.
    pub fn remove(&self, key: &str) -> Option<Bean> {
        let mut state = self.state.lock();
        if state.destroyed {
            return None;
        }
        state.callbacks.retain(|(k, _)| k != key);
        let removed = state.beans.remove(key).and_then(|cell| cell.get().cloned());
        if removed.is_some() {
            debug!(scope_id = %self.id, key, "Bean removed");
        }
        removed
    }

    /// Associate a cleanup action with `key`, replacing any previous one.
    ///
    /// A replaced callback keeps the run position of the one it replaces.
    ///
    /// # Errors
    ///
    /// - `ScopeError::StoreDestroyed` - the store has been destroyed
    pub fn register_destruction_callback<F>(&self, key: &str, callback: F) -> Result<(), ScopeError>
    where
        F: FnOnce() + Send + 'static,
    {
        let mut state = self.state.lock();
        if state.destroyed {
            return Err(ScopeError::StoreDestroyed { id: self.id });
        }

        let callback: DestructionCallback = Box::new(callback);
        match state.callbacks.iter_mut().find(|(k, _)| k == key) {
            Some(slot) => slot.1 = callback,
            None => state.callbacks.push((key.to_string(), callback)),
        }
        Ok(())
    }

    /// Destroy the store, running every destruction callback exactly once.
    ///
    /// Callbacks run outside the store lock, in registration order. A
    /// panicking callback is logged and counted; the remaining callbacks
    /// still run.
    pub fn destroy(&self) -> DestroyReport {
        let (beans, callbacks) = {
            let mut state = self.state.lock();
            if state.destroyed {
                return DestroyReport::default();
            }
            state.destroyed = true;
            (
                std::mem::take(&mut state.beans),
                std::mem::take(&mut state.callbacks),
            )
        };

        let mut report = DestroyReport {
            first_destroy: true,
            beans_released: beans.values().filter(|cell| cell.get().is_some()).count(),
            ..DestroyReport::default()
        };

        for (key, callback) in callbacks {
            report.callbacks_run += 1;
            if let Err(panic_err) = panic::catch_unwind(AssertUnwindSafe(callback)) {
                report.callbacks_panicked += 1;
                error!(
                    scope_id = %self.id,
                    key = %key,
                    panic = %panic_message(panic_err.as_ref()),
                    "Destruction callback panicked"
                );
            }
        }

        // Beans outlive their callbacks so cleanup code can still reach them.
        drop(beans);

        info!(
            scope_id = %self.id,
            beans = report.beans_released,
            callbacks = report.callbacks_run,
            "Scope store destroyed"
        );
        report
    }
}

impl std::fmt::Debug for ScopeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("ScopeStore")
            .field("id", &self.id)
            .field("beans", &state.beans.len())
            .field("callbacks", &state.callbacks.len())
            .field("destroyed", &state.destroyed)
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
