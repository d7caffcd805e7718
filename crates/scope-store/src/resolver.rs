//! # Scope Context Resolvers
//!
//! A resolver maps the caller's [`ScopeContext`] to the store of one scope
//! kind. It is a pluggable strategy: production code resolves through a
//! [`ScopeStoreRegistry`], tests can pin a single store with
//! [`FixedScopeResolver`].
//!
//! ```rust,ignore
//! let registry = Arc::new(ScopeStoreRegistry::new());
//! let ui_scope = RegistryResolver::new(ScopeKind::Ui, registry.clone());
//!
//! let ctx = ScopeContext::new().with_session(session_id).with_ui(ui_id);
//! let nav = ui_scope.resolve(&ctx)?.get("navigator", Navigator::default)?;
//! ```

use crate::context::ScopeContext;
use crate::error::ScopeError;
use crate::registry::ScopeStoreRegistry;
use crate::store::ScopeStore;
use scope_types::ScopeKind;
use std::any::Any;
use std::sync::Arc;

/// Strategy that finds the store for the scope active in a context.
pub trait ScopeContextResolver: Send + Sync {
    /// The scope kind this resolver serves.
    fn kind(&self) -> ScopeKind;

    /// Resolve the store bound to `ctx`.
    ///
    /// # Errors
    ///
    /// - `ScopeError::NoActiveScope` - `ctx` has no scope of this kind
    /// - `ScopeError::WrongKind` - the bound id is of another kind
    fn resolve(&self, ctx: &ScopeContext) -> Result<Arc<ScopeStore>, ScopeError>;

    /// Fetch or create a typed bean in the resolved store.
    fn bean<T, F>(&self, ctx: &ScopeContext, key: &str, factory: F) -> Result<Arc<T>, ScopeError>
    where
        Self: Sized,
        T: Any + Send + Sync,
        F: FnOnce() -> T,
    {
        self.resolve(ctx)?.get(key, factory)
    }
}

/// Resolves through a shared registry, opening stores on first use.
pub struct RegistryResolver {
    kind: ScopeKind,
    registry: Arc<ScopeStoreRegistry>,
}

impl RegistryResolver {
    #[must_use]
    pub fn new(kind: ScopeKind, registry: Arc<ScopeStoreRegistry>) -> Self {
        Self { kind, registry }
    }

    #[must_use]
    pub fn session(registry: Arc<ScopeStoreRegistry>) -> Self {
        Self::new(ScopeKind::Session, registry)
    }

    #[must_use]
    pub fn ui(registry: Arc<ScopeStoreRegistry>) -> Self {
        Self::new(ScopeKind::Ui, registry)
    }

    #[must_use]
    pub fn view(registry: Arc<ScopeStoreRegistry>) -> Self {
        Self::new(ScopeKind::View, registry)
    }
}

impl ScopeContextResolver for RegistryResolver {
    fn kind(&self) -> ScopeKind {
        self.kind
    }

    fn resolve(&self, ctx: &ScopeContext) -> Result<Arc<ScopeStore>, ScopeError> {
        let id = ctx
            .get(self.kind)
            .ok_or(ScopeError::NoActiveScope { kind: self.kind })?;
        if id.kind() != self.kind {
            return Err(ScopeError::WrongKind {
                id,
                expected: self.kind,
            });
        }
        Ok(self.registry.store(id))
    }
}

/// Always resolves to the same store, whatever the context.
pub struct FixedScopeResolver {
    store: Arc<ScopeStore>,
}

impl FixedScopeResolver {
    #[must_use]
    pub fn new(store: Arc<ScopeStore>) -> Self {
        Self { store }
    }
}

impl ScopeContextResolver for FixedScopeResolver {
    fn kind(&self) -> ScopeKind {
        self.store.id().kind()
    }

    fn resolve(&self, _ctx: &ScopeContext) -> Result<Arc<ScopeStore>, ScopeError> {
        Ok(Arc::clone(&self.store))
    }
}
