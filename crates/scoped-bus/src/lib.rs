//! # Scoped Bus - Hierarchical Event Bus for Scoped Components
//!
//! Components publish typed, optionally topic-tagged events on the bus of
//! their scope. Events flow from broader scopes down to narrower ones, never
//! upward.
//!
//! ```text
//! ┌──────────────────┐
//! │ Application bus  │  publish("Hello World")
//! └────────┬─────────┘
//!          ▼
//! ┌──────────────────┐
//! │   Session bus    │  listener<String> receives it, scope = Application
//! └────────┬─────────┘
//!          ▼
//! ┌──────────────────┐
//! │  Ui / View bus   │
//! └──────────────────┘
//! ```
//!
//! ## Listener shapes
//!
//! - Typed closures: [`ScopedEventBus::subscribe`] and friends.
//! - Catch-all closures: [`ScopedEventBus::subscribe_all`].
//! - Target objects with declared handler methods: [`HandlerSet`].
//!
//! ## Delivery
//!
//! - Synchronous. `publish` returns once every matching listener has run.
//! - Fail loud. The first listener error stops the publish and is returned
//!   as [`EventBusError::ListenerFailed`].
//! - Weak subscriptions end when their [`Subscription`] handle is dropped.

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod adapter;
pub mod bus;
pub mod config;
pub mod error;
pub mod event;
pub mod listener;
pub mod metrics;
mod registry;
pub mod subscription;
pub mod topic;

// Re-export main types
pub use adapter::{HandlerOptions, HandlerSet, HandlerSetBuilder};
pub use bus::ScopedEventBus;
pub use config::EventBusConfig;
pub use error::{ConfigurationError, EventBusError, HandlerMethodError, HandlerResult, ListenerError};
pub use event::{BusId, Event, Sender, TypedEvent};
pub use listener::{EventListener, Listener, SubscriptionId, SubscriptionOptions, TargetId, TypedListener};
pub use metrics::{BusMetrics, MetricsRecorder, MetricsSnapshot, NoOpMetrics};
pub use scope_types::ScopeKind;
pub use subscription::Subscription;
pub use topic::{ExactTopicFilter, HierarchicalTopicFilter, TopicFilter, TopicMatch, TopicSelector};
