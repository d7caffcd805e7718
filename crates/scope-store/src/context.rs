//! # Scope Context
//!
//! The explicit "where am I" value a request handler carries through its
//! call chain. It replaces any per-thread ambient lookup: whoever needs a
//! scoped bean must be handed the context it runs in.

use scope_types::{ScopeId, ScopeKind};

/// The scopes bound to the current unit of work.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScopeContext {
    session: Option<ScopeId>,
    ui: Option<ScopeId>,
    view: Option<ScopeId>,
}

impl ScopeContext {
    /// A context with no scopes bound (e.g. a background job).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_session(mut self, id: ScopeId) -> Self {
        self.session = Some(id);
        self
    }

    #[must_use]
    pub fn with_ui(mut self, id: ScopeId) -> Self {
        self.ui = Some(id);
        self
    }

    #[must_use]
    pub fn with_view(mut self, id: ScopeId) -> Self {
        self.view = Some(id);
        self
    }

    /// The id bound for `kind`, if any. Application scope is never bound here.
    #[must_use]
    pub fn get(&self, kind: ScopeKind) -> Option<ScopeId> {
        match kind {
            ScopeKind::Application => None,
            ScopeKind::Session => self.session,
            ScopeKind::Ui => self.ui,
            ScopeKind::View => self.view,
        }
    }

    /// The narrowest bound scope.
    #[must_use]
    pub fn innermost(&self) -> Option<ScopeId> {
        self.view.or(self.ui).or(self.session)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.innermost().is_none()
    }
}
