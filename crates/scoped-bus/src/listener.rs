//! # Listeners
//!
//! A [`Listener`] is anything the registry can ask "do you want this event?"
//! and then hand the event to. Two shapes ship with the crate:
//!
//! - [`TypedListener`]: one closure bound to one payload type.
//! - [`HandlerSet`](crate::HandlerSet): several named handler methods of one
//!   target object.
//!
//! Payload matching is by exact `TypeId`.

use crate::error::{HandlerResult, ListenerError};
use crate::event::{Event, TypedEvent};
use crate::topic::{TopicFilter, TopicSelector};
use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Dispatch capability consumed by the listener registry.
pub trait Listener: Send + Sync {
    /// Whether this listener wants `event` (payload type and topic).
    fn supports(&self, event: &Event) -> bool;

    /// Hand `event` to the listener. `Ok(false)` means a later check
    /// (a handler predicate) declined it and nothing ran.
    fn deliver(&self, event: &Event) -> Result<bool, ListenerError>;

    /// Name used in logs and error reports.
    fn name(&self) -> &str;

    /// The wrapped target object, for listeners built from one.
    fn target(&self) -> Option<TargetId> {
        None
    }
}

/// Registration identity returned by every subscribe call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Reference identity of a target object behind an `Arc`.
///
/// Valid while the target is alive; an address may be reused after the
/// target is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetId(usize);

impl TargetId {
    #[must_use]
    pub fn of<X: ?Sized>(target: &Arc<X>) -> Self {
        Self(Arc::as_ptr(target).cast::<()>() as usize)
    }
}

/// How a listener is registered.
#[derive(Debug, Clone)]
pub struct SubscriptionOptions {
    /// Required topic; `None` accepts every topic.
    pub topic: Option<String>,
    /// Filter for `topic`; `None` uses the bus default.
    pub topic_filter: Option<Arc<dyn TopicFilter>>,
    /// Also receive events forwarded from ancestor buses.
    pub include_propagated: bool,
    /// Registry holds the listener weakly; the returned subscription owns it.
    pub weak: bool,
}

impl Default for SubscriptionOptions {
    fn default() -> Self {
        Self {
            topic: None,
            topic_filter: None,
            include_propagated: true,
            weak: false,
        }
    }
}

impl SubscriptionOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    #[must_use]
    pub fn topic_filter(mut self, filter: impl TopicFilter + 'static) -> Self {
        self.topic_filter = Some(Arc::new(filter));
        self
    }

    /// Only receive events published directly on the subscribed bus.
    #[must_use]
    pub fn local_only(mut self) -> Self {
        self.include_propagated = false;
        self
    }

    #[must_use]
    pub fn include_propagated(mut self, include: bool) -> Self {
        self.include_propagated = include;
        self
    }

    #[must_use]
    pub fn weak(mut self) -> Self {
        self.weak = true;
        self
    }

    pub(crate) fn selector(&self, default_filter: Arc<dyn TopicFilter>) -> TopicSelector {
        TopicSelector::new(
            self.topic.clone(),
            self.topic_filter.clone().unwrap_or(default_filter),
        )
    }
}

/// A closure bound to payload type `T`.
pub struct TypedListener<T, F> {
    name: String,
    selector: TopicSelector,
    handler: F,
    _payload: PhantomData<fn(&T)>,
}

impl<T, F> TypedListener<T, F>
where
    T: Any + Send + Sync,
    F: Fn(&TypedEvent<'_, T>) -> HandlerResult + Send + Sync + 'static,
{
    pub fn new(selector: TopicSelector, handler: F) -> Self {
        Self {
            name: format!("listener<{}>", type_name::<T>()),
            selector,
            handler,
            _payload: PhantomData,
        }
    }
}

impl<T, F> Listener for TypedListener<T, F>
where
    T: Any + Send + Sync,
    F: Fn(&TypedEvent<'_, T>) -> HandlerResult + Send + Sync + 'static,
{
    fn supports(&self, event: &Event) -> bool {
        event.payload_type_id() == TypeId::of::<T>() && self.selector.matches(event.topic())
    }

    fn deliver(&self, event: &Event) -> Result<bool, ListenerError> {
        match TypedEvent::<T>::from_event(event) {
            Some(typed) => (self.handler)(&typed).map(|()| true),
            None => Ok(false),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// A closure that accepts every payload type.
pub struct EventListener<F> {
    selector: TopicSelector,
    handler: F,
}

impl<F> EventListener<F>
where
    F: Fn(&Event) -> HandlerResult + Send + Sync + 'static,
{
    pub fn new(selector: TopicSelector, handler: F) -> Self {
        Self { selector, handler }
    }
}

impl<F> Listener for EventListener<F>
where
    F: Fn(&Event) -> HandlerResult + Send + Sync + 'static,
{
    fn supports(&self, event: &Event) -> bool {
        self.selector.matches(event.topic())
    }

    fn deliver(&self, event: &Event) -> Result<bool, ListenerError> {
        (self.handler)(event).map(|()| true)
    }

    fn name(&self) -> &str {
        "listener<any>"
    }
}
