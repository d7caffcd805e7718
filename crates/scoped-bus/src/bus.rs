//! # Scoped Event Bus
//!
//! One bus per scope instance, arranged in a tree rooted at the application
//! bus. A child holds its parent strongly; a parent only references its
//! children weakly, so dropping a view bus needs no explicit detach.
//!
//! ```text
//!   Application ──► Session ──► Ui ──► View
//!        publish ───────────────────────────►  (propagates down)
//! ```
//!
//! Delivery is synchronous: `publish` returns after every matching listener
//! on this bus and every live descendant has run.

use crate::adapter::HandlerSet;
use crate::config::EventBusConfig;
use crate::error::{EventBusError, HandlerResult};
use crate::event::{BusId, Event, Sender, TypedEvent};
use crate::listener::{EventListener, Listener, SubscriptionOptions, TargetId, TypedListener};
use crate::metrics::{BusMetrics, MetricsRecorder, MetricsSnapshot};
use crate::registry::ListenerRegistry;
use crate::subscription::Subscription;
use parking_lot::RwLock;
use scope_types::ScopeKind;
use std::any::{type_name, Any};
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::{debug, warn};

pub struct ScopedEventBus {
    id: BusId,
    scope: ScopeKind,
    parent: Option<Arc<ScopedEventBus>>,
    children: RwLock<Vec<Weak<ScopedEventBus>>>,
    registry: Arc<ListenerRegistry>,
    stats: BusMetrics,
    config: EventBusConfig,
}

impl ScopedEventBus {
    /// Create the application-scope root bus.
    #[must_use]
    pub fn root() -> Arc<Self> {
        Self::root_with_config(EventBusConfig::default())
    }

    #[must_use]
    pub fn root_with_config(config: EventBusConfig) -> Arc<Self> {
        Arc::new(Self::new(ScopeKind::Application, None, config))
    }

    /// Create a bus for `scope` below `parent`, inheriting its configuration.
    ///
    /// # Errors
    ///
    /// [`EventBusError::InvalidHierarchy`] unless `scope` is strictly
    /// narrower than the parent's scope.
    pub fn child(parent: &Arc<Self>, scope: ScopeKind) -> Result<Arc<Self>, EventBusError> {
        Self::child_with_config(parent, scope, parent.config.clone())
    }

    pub fn child_with_config(
        parent: &Arc<Self>,
        scope: ScopeKind,
        config: EventBusConfig,
    ) -> Result<Arc<Self>, EventBusError> {
        if !parent.scope.is_broader_than(scope) {
            return Err(EventBusError::InvalidHierarchy {
                parent: parent.scope,
                child: scope,
            });
        }

        let child = Arc::new(Self::new(scope, Some(Arc::clone(parent)), config));
        {
            let mut children = parent.children.write();
            children.retain(|c| c.strong_count() > 0);
            children.push(Arc::downgrade(&child));
        }

        debug!(parent = %parent.scope, scope = %scope, bus = %child.id, "Child bus created");
        Ok(child)
    }

    fn new(scope: ScopeKind, parent: Option<Arc<Self>>, config: EventBusConfig) -> Self {
        Self {
            id: BusId::new(),
            scope,
            parent,
            children: RwLock::new(Vec::new()),
            registry: Arc::new(ListenerRegistry::new()),
            stats: BusMetrics::new(),
            config,
        }
    }

    #[must_use]
    pub fn id(&self) -> BusId {
        self.id
    }

    #[must_use]
    pub fn scope(&self) -> ScopeKind {
        self.scope
    }

    #[must_use]
    pub fn parent(&self) -> Option<&Arc<Self>> {
        self.parent.as_ref()
    }

    #[must_use]
    pub fn config(&self) -> &EventBusConfig {
        &self.config
    }

    /// Live registrations on this bus (descendants not included).
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.registry.len()
    }

    #[must_use]
    pub fn metrics(&self) -> MetricsSnapshot {
        self.stats.snapshot()
    }

    // ------------------------------------------------------------------
    // Publishing
    // ------------------------------------------------------------------

    /// Publish `payload` with an empty topic. Returns the number of
    /// deliveries across this bus and its descendants.
    ///
    /// # Errors
    ///
    /// [`EventBusError::ListenerFailed`] for the first listener that fails;
    /// remaining deliveries of this call are skipped.
    pub fn publish<T>(&self, sender: impl Into<Sender>, payload: T) -> Result<usize, EventBusError>
    where
        T: Any + Send + Sync,
    {
        self.publish_with_topic(sender, payload, "")
    }

    pub fn publish_with_topic<T>(
        &self,
        sender: impl Into<Sender>,
        payload: T,
        topic: &str,
    ) -> Result<usize, EventBusError>
    where
        T: Any + Send + Sync,
    {
        let event = Event::new(self.id, self.scope, sender.into(), topic.to_string(), payload);

        self.stats.record_published(self.scope);
        self.config.recorder.record_published(self.scope);
        debug!(
            scope = %self.scope,
            topic = event.topic(),
            payload = event.payload_type_name(),
            sender = %event.sender(),
            "Publishing event"
        );

        self.dispatch(&event)
    }

    /// Publish on the bus of `scope` in this bus's ancestor chain (or on this
    /// bus itself).
    ///
    /// # Errors
    ///
    /// [`EventBusError::UnsupportedScope`] if no bus in the chain has `scope`,
    /// otherwise as [`publish`](Self::publish).
    pub fn publish_to<T>(
        &self,
        scope: ScopeKind,
        sender: impl Into<Sender>,
        payload: T,
    ) -> Result<usize, EventBusError>
    where
        T: Any + Send + Sync,
    {
        self.publish_to_with_topic(scope, sender, payload, "")
    }

    pub fn publish_to_with_topic<T>(
        &self,
        scope: ScopeKind,
        sender: impl Into<Sender>,
        payload: T,
        topic: &str,
    ) -> Result<usize, EventBusError>
    where
        T: Any + Send + Sync,
    {
        match self.find_scope(scope) {
            Some(bus) => bus.publish_with_topic(sender, payload, topic),
            None => {
                let available = self.chain_scopes();
                warn!(requested = %scope, origin = %self.scope, ?available, "Publish to unreachable scope");
                Err(EventBusError::UnsupportedScope {
                    requested: scope,
                    origin: self.scope,
                    available,
                })
            }
        }
    }

    fn find_scope(&self, scope: ScopeKind) -> Option<&Self> {
        if self.scope == scope {
            return Some(self);
        }
        self.parent.as_deref().and_then(|p| p.find_scope(scope))
    }

    fn chain_scopes(&self) -> Vec<ScopeKind> {
        let mut scopes = vec![self.scope];
        let mut current = self.parent.as_deref();
        while let Some(bus) = current {
            scopes.push(bus.scope);
            current = bus.parent.as_deref();
        }
        scopes
    }

    fn dispatch(&self, event: &Event) -> Result<usize, EventBusError> {
        let propagated = event.source() != self.id;
        let listeners = self.registry.matching(event, propagated);

        let mut delivered = 0;
        for listener in listeners {
            match listener.deliver(event) {
                Ok(false) => {}
                Ok(true) => {
                    delivered += 1;
                    self.stats.record_delivered(self.scope);
                    self.config.recorder.record_delivered(self.scope);
                }
                Err(source) => {
                    self.stats.record_failed(self.scope);
                    self.config.recorder.record_failed(self.scope);
                    warn!(
                        scope = %self.scope,
                        topic = event.topic(),
                        listener = listener.name(),
                        error = %source,
                        "Listener failed, aborting publish"
                    );
                    return Err(EventBusError::ListenerFailed {
                        listener: listener.name().to_string(),
                        scope: event.scope(),
                        topic: event.topic().to_string(),
                        source,
                    });
                }
            }
        }

        for child in self.live_children() {
            delivered += child.dispatch(event)?;
        }
        Ok(delivered)
    }

    fn live_children(&self) -> Vec<Arc<Self>> {
        let (live, dead) = {
            let children = self.children.read();
            let live: Vec<Arc<Self>> = children.iter().filter_map(Weak::upgrade).collect();
            let dead = live.len() < children.len();
            (live, dead)
        };
        if dead {
            self.children.write().retain(|c| c.strong_count() > 0);
        }
        live
    }

    // ------------------------------------------------------------------
    // Subscribing
    // ------------------------------------------------------------------

    /// Subscribe a callback for payloads of exactly type `T`, any topic.
    pub fn subscribe<T, F>(&self, handler: F) -> Subscription
    where
        T: Any + Send + Sync,
        F: Fn(&TypedEvent<'_, T>) -> HandlerResult + Send + Sync + 'static,
    {
        self.subscribe_with(SubscriptionOptions::default(), handler)
    }

    pub fn subscribe_with<T, F>(&self, options: SubscriptionOptions, handler: F) -> Subscription
    where
        T: Any + Send + Sync,
        F: Fn(&TypedEvent<'_, T>) -> HandlerResult + Send + Sync + 'static,
    {
        let selector = options.selector(self.config.default_filter());
        let listener: Arc<dyn Listener> = Arc::new(TypedListener::<T, F>::new(selector, handler));
        debug!(scope = %self.scope, payload = type_name::<T>(), topic = ?options.topic, "Subscribing listener");
        self.register(listener, &options)
    }

    /// Subscribe a callback that receives every payload type.
    pub fn subscribe_all<F>(&self, options: SubscriptionOptions, handler: F) -> Subscription
    where
        F: Fn(&Event) -> HandlerResult + Send + Sync + 'static,
    {
        let selector = options.selector(self.config.default_filter());
        let listener: Arc<dyn Listener> = Arc::new(EventListener::new(selector, handler));
        debug!(scope = %self.scope, topic = ?options.topic, "Subscribing catch-all listener");
        self.register(listener, &options)
    }

    /// Subscribe every handler method of a target object.
    ///
    /// Method-level topics and filters take precedence over `options`.
    pub fn subscribe_handlers(&self, handlers: HandlerSet, options: SubscriptionOptions) -> Subscription {
        let listener = handlers.into_listener(&options, &self.config.default_filter());
        debug!(
            scope = %self.scope,
            listener = listener.name(),
            "Subscribing handler set"
        );
        self.register(listener, &options)
    }

    fn register(&self, listener: Arc<dyn Listener>, options: &SubscriptionOptions) -> Subscription {
        if options.weak {
            let id = self.registry.add_weak(&listener, options.include_propagated);
            Subscription::weak(id, &self.registry, listener)
        } else {
            let id = self.registry.add_strong(listener, options.include_propagated);
            Subscription::strong(id, &self.registry)
        }
    }

    /// Remove one registration. Returns whether it was present on this bus.
    pub fn unsubscribe(&self, subscription: &Subscription) -> bool {
        let removed = self.registry.remove(subscription.id());
        debug!(scope = %self.scope, subscription = %subscription.id(), removed, "Unsubscribe");
        removed
    }

    /// Remove every handler-set registration wrapping `target`.
    pub fn unsubscribe_target<X: ?Sized>(&self, target: &Arc<X>) -> usize {
        let removed = self.registry.remove_target(TargetId::of(target));
        debug!(scope = %self.scope, removed, "Unsubscribed target");
        removed
    }
}

impl fmt::Debug for ScopedEventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopedEventBus")
            .field("id", &self.id)
            .field("scope", &self.scope)
            .field("parent", &self.parent.as_ref().map(|p| p.scope))
            .field("listeners", &self.registry.len())
            .finish()
    }
}
