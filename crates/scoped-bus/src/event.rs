//! # Events
//!
//! An [`Event`] is created once per publish call and is immutable from then
//! on. Listeners only borrow it for the duration of their callback; the
//! payload itself is shared behind an `Arc`.

use scope_types::ScopeKind;
use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;
use std::time::SystemTime;
use uuid::Uuid;

/// Identity of one bus instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BusId(Uuid);

impl BusId {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for BusId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The component that published an event.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Sender {
    name: Arc<str>,
}

impl Sender {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: Arc::from(name),
        }
    }

    /// Sender used when the publisher does not identify itself.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::new("anonymous")
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl From<&str> for Sender {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Sender {
    fn from(name: String) -> Self {
        Self {
            name: Arc::from(name),
        }
    }
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// An immutable published event.
pub struct Event {
    id: Uuid,
    source: BusId,
    scope: ScopeKind,
    sender: Sender,
    topic: String,
    payload: Arc<dyn Any + Send + Sync>,
    payload_type: TypeId,
    payload_type_name: &'static str,
    timestamp: SystemTime,
}

impl Event {
    pub(crate) fn new<T>(source: BusId, scope: ScopeKind, sender: Sender, topic: String, payload: T) -> Self
    where
        T: Any + Send + Sync,
    {
        Self {
            id: Uuid::new_v4(),
            source,
            scope,
            sender,
            topic,
            payload: Arc::new(payload),
            payload_type: TypeId::of::<T>(),
            payload_type_name: type_name::<T>(),
            timestamp: SystemTime::now(),
        }
    }

    /// Unique id of this event.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The bus the event was published on.
    #[must_use]
    pub fn source(&self) -> BusId {
        self.source
    }

    /// Scope of the originating bus.
    #[must_use]
    pub fn scope(&self) -> ScopeKind {
        self.scope
    }

    #[must_use]
    pub fn sender(&self) -> &Sender {
        &self.sender
    }

    /// Topic tag; empty when published without one.
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    #[must_use]
    pub fn timestamp(&self) -> SystemTime {
        self.timestamp
    }

    #[must_use]
    pub fn payload_type_id(&self) -> TypeId {
        self.payload_type
    }

    #[must_use]
    pub fn payload_type_name(&self) -> &'static str {
        self.payload_type_name
    }

    /// True if the payload is exactly a `T`.
    #[must_use]
    pub fn payload_is<T: Any>(&self) -> bool {
        self.payload_type == TypeId::of::<T>()
    }

    /// Borrow the payload as `T`.
    #[must_use]
    pub fn payload_as<T: Any>(&self) -> Option<&T> {
        self.payload.downcast_ref::<T>()
    }

    /// Shared handle to the payload, for listeners that must keep it.
    #[must_use]
    pub fn payload_arc(&self) -> Arc<dyn Any + Send + Sync> {
        Arc::clone(&self.payload)
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("id", &self.id)
            .field("source", &self.source)
            .field("scope", &self.scope)
            .field("sender", &self.sender)
            .field("topic", &self.topic)
            .field("payload_type", &self.payload_type_name)
            .finish()
    }
}

/// Borrowed view of an [`Event`] whose payload is known to be a `T`.
pub struct TypedEvent<'a, T> {
    event: &'a Event,
    payload: &'a T,
}

impl<'a, T: Any> TypedEvent<'a, T> {
    pub(crate) fn from_event(event: &'a Event) -> Option<Self> {
        event
            .payload_as::<T>()
            .map(|payload| Self { event, payload })
    }

    #[must_use]
    pub fn payload(&self) -> &'a T {
        self.payload
    }

    /// The untyped event.
    #[must_use]
    pub fn event(&self) -> &'a Event {
        self.event
    }
}

impl<T> Deref for TypedEvent<'_, T> {
    type Target = Event;

    fn deref(&self) -> &Event {
        self.event
    }
}
