//! Per-bus listener registry.
//!
//! Strong entries keep their listener alive until removed. Weak entries only
//! reference it; once the owning [`Subscription`](crate::Subscription) is
//! dropped they are skipped and pruned on the next lookup.

use crate::event::Event;
use crate::listener::{Listener, SubscriptionId, TargetId};
use parking_lot::RwLock;
use std::sync::{Arc, Weak};
use tracing::trace;

struct StrongEntry {
    id: SubscriptionId,
    include_propagated: bool,
    target: Option<TargetId>,
    listener: Arc<dyn Listener>,
}

struct WeakEntry {
    id: SubscriptionId,
    include_propagated: bool,
    target: Option<TargetId>,
    listener: Weak<dyn Listener>,
}

#[derive(Default)]
pub(crate) struct ListenerRegistry {
    strong: RwLock<Vec<StrongEntry>>,
    weak: RwLock<Vec<WeakEntry>>,
}

impl ListenerRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add_strong(
        &self,
        listener: Arc<dyn Listener>,
        include_propagated: bool,
    ) -> SubscriptionId {
        let id = SubscriptionId::next();
        self.strong.write().push(StrongEntry {
            id,
            include_propagated,
            target: listener.target(),
            listener,
        });
        id
    }

    pub(crate) fn add_weak(
        &self,
        listener: &Arc<dyn Listener>,
        include_propagated: bool,
    ) -> SubscriptionId {
        let id = SubscriptionId::next();
        self.weak.write().push(WeakEntry {
            id,
            include_propagated,
            target: listener.target(),
            listener: Arc::downgrade(listener),
        });
        id
    }

    /// Remove one registration. Returns whether it was present.
    pub(crate) fn remove(&self, id: SubscriptionId) -> bool {
        let mut removed = false;
        self.strong.write().retain(|e| {
            let hit = e.id == id;
            removed |= hit;
            !hit
        });
        self.weak.write().retain(|e| {
            let hit = e.id == id;
            removed |= hit;
            !hit
        });
        removed
    }

    /// Remove every registration wrapping `target`. Returns how many went.
    pub(crate) fn remove_target(&self, target: TargetId) -> usize {
        let mut strong = self.strong.write();
        let before = strong.len();
        strong.retain(|e| e.target != Some(target));
        let mut removed = before - strong.len();
        drop(strong);

        let mut weak = self.weak.write();
        let before = weak.len();
        weak.retain(|e| e.target != Some(target));
        removed += before - weak.len();
        removed
    }

    /// Snapshot the listeners interested in `event`.
    ///
    /// Candidates are copied out under the read locks and `supports` runs
    /// after they are released, so listener code (topic filters included)
    /// may subscribe or unsubscribe re-entrantly.
    pub(crate) fn matching(&self, event: &Event, propagated: bool) -> Vec<Arc<dyn Listener>> {
        let wanted = |include_propagated: bool| include_propagated || !propagated;

        let mut candidates: Vec<(Arc<dyn Listener>, bool)> = self
            .strong
            .read()
            .iter()
            .map(|e| (Arc::clone(&e.listener), e.include_propagated))
            .collect();

        let mut dead = false;
        for entry in self.weak.read().iter() {
            match entry.listener.upgrade() {
                Some(listener) => candidates.push((listener, entry.include_propagated)),
                None => dead = true,
            }
        }

        if dead {
            self.prune();
        }
        candidates
            .into_iter()
            .filter(|(listener, include)| wanted(*include) && listener.supports(event))
            .map(|(listener, _)| listener)
            .collect()
    }

    fn prune(&self) {
        let mut weak = self.weak.write();
        let before = weak.len();
        weak.retain(|e| e.listener.strong_count() > 0);
        trace!(pruned = before - weak.len(), "Pruned dead weak listeners");
    }

    /// Registrations whose listener is still alive.
    pub(crate) fn len(&self) -> usize {
        let weak_alive = self
            .weak
            .read()
            .iter()
            .filter(|e| e.listener.strong_count() > 0)
            .count();
        self.strong.read().len() + weak_alive
    }
}
