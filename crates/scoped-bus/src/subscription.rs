//! Subscription handles.

use crate::listener::{Listener, SubscriptionId};
use crate::registry::ListenerRegistry;
use std::fmt;
use std::sync::{Arc, Weak};

/// Handle to one listener registration.
///
/// For weak registrations the handle owns the listener: dropping it ends the
/// subscription. Strong registrations stay until [`cancel`](Self::cancel),
/// [`ScopedEventBus::unsubscribe`](crate::ScopedEventBus::unsubscribe) or the
/// bus itself goes away.
#[must_use = "dropping a weak subscription unsubscribes it immediately"]
pub struct Subscription {
    id: SubscriptionId,
    registry: Weak<ListenerRegistry>,
    keep_alive: Option<Arc<dyn Listener>>,
}

impl Subscription {
    pub(crate) fn strong(id: SubscriptionId, registry: &Arc<ListenerRegistry>) -> Self {
        Self {
            id,
            registry: Arc::downgrade(registry),
            keep_alive: None,
        }
    }

    pub(crate) fn weak(
        id: SubscriptionId,
        registry: &Arc<ListenerRegistry>,
        listener: Arc<dyn Listener>,
    ) -> Self {
        Self {
            id,
            registry: Arc::downgrade(registry),
            keep_alive: Some(listener),
        }
    }

    #[must_use]
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// True if dropping this handle ends the subscription.
    #[must_use]
    pub fn is_weak(&self) -> bool {
        self.keep_alive.is_some()
    }

    /// Remove the registration now. Returns whether it was still present.
    pub fn cancel(self) -> bool {
        self.registry
            .upgrade()
            .is_some_and(|registry| registry.remove(self.id))
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if self.keep_alive.is_some() {
            if let Some(registry) = self.registry.upgrade() {
                registry.remove(self.id);
            }
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("weak", &self.is_weak())
            .finish()
    }
}
