//! # Handler Sets
//!
//! Lets a plain object act as a listener by declaring its handler methods up
//! front. Each method has a name, a payload type, and a closure that receives
//! the target plus either the raw payload or the typed event.
//!
//! ```ignore
//! let handlers = HandlerSet::builder(&audit)
//!     .on_payload::<LoginEvent, _>("on_login", |audit, ev| audit.record(ev))
//!     .on_event_with::<String, _>(
//!         "on_news",
//!         HandlerOptions::new().topic("news"),
//!         |audit, ev| audit.note(ev.sender(), ev.payload()),
//!     )
//!     .build()?;
//! let sub = bus.subscribe_handlers(handlers, SubscriptionOptions::default());
//! ```
//!
//! Declarations are validated once by [`HandlerSetBuilder::build`]; a set
//! that fails validation cannot be subscribed.

use crate::error::{ConfigurationError, HandlerMethodError, HandlerResult, ListenerError};
use crate::event::{Event, TypedEvent};
use crate::listener::{Listener, SubscriptionOptions, TargetId};
use crate::topic::{TopicFilter, TopicSelector};
use std::any::{type_name, Any, TypeId};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

type Accepts = Box<dyn Fn(&Event) -> bool + Send + Sync>;
type Invoke = Box<dyn Fn(&Event) -> HandlerResult + Send + Sync>;

/// Per-method options.
pub struct HandlerOptions<T> {
    pub topic: Option<String>,
    pub topic_filter: Option<Arc<dyn TopicFilter>>,
    /// Runs on the raw payload after type and topic checks pass.
    pub predicate: Option<Arc<dyn Fn(&T) -> bool + Send + Sync>>,
}

impl<T> Default for HandlerOptions<T> {
    fn default() -> Self {
        Self {
            topic: None,
            topic_filter: None,
            predicate: None,
        }
    }
}

impl<T> Clone for HandlerOptions<T> {
    fn clone(&self) -> Self {
        Self {
            topic: self.topic.clone(),
            topic_filter: self.topic_filter.clone(),
            predicate: self.predicate.clone(),
        }
    }
}

impl<T> HandlerOptions<T> {
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

    #[must_use]
    pub fn predicate(mut self, predicate: impl Fn(&T) -> bool + Send + Sync + 'static) -> Self {
        self.predicate = Some(Arc::new(predicate));
        self
    }
}

impl<T> fmt::Debug for HandlerOptions<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerOptions")
            .field("topic", &self.topic)
            .field("topic_filter", &self.topic_filter)
            .field("predicate", &self.predicate.is_some())
            .finish()
    }
}

struct HandlerMethod {
    name: String,
    payload_type: TypeId,
    payload_type_name: &'static str,
    topic: Option<String>,
    topic_filter: Option<Arc<dyn TopicFilter>>,
    accepts: Accepts,
    invoke: Invoke,
}

/// Validated handler methods of one target object.
pub struct HandlerSet {
    target: TargetId,
    target_name: &'static str,
    methods: Vec<HandlerMethod>,
}

impl HandlerSet {
    /// Start declaring handler methods for `target`.
    pub fn builder<X>(target: &Arc<X>) -> HandlerSetBuilder<X>
    where
        X: Send + Sync + 'static,
    {
        HandlerSetBuilder {
            target: Arc::clone(target),
            methods: Vec::new(),
        }
    }

    #[must_use]
    pub fn target(&self) -> TargetId {
        self.target
    }

    /// Declared method names, in declaration order.
    pub fn method_names(&self) -> impl Iterator<Item = &str> {
        self.methods.iter().map(|m| m.name.as_str())
    }

    /// Resolve topics against the subscription options and wrap as a
    /// listener. Method-level settings win over `options`, which win over
    /// `default_filter`.
    pub(crate) fn into_listener(
        self,
        options: &SubscriptionOptions,
        default_filter: &Arc<dyn TopicFilter>,
    ) -> Arc<dyn Listener> {
        let methods = self
            .methods
            .into_iter()
            .map(|method| {
                let topic = method.topic.clone().or_else(|| options.topic.clone());
                let filter = method
                    .topic_filter
                    .clone()
                    .or_else(|| options.topic_filter.clone())
                    .unwrap_or_else(|| Arc::clone(default_filter));
                BoundMethod {
                    selector: TopicSelector::new(topic, filter),
                    method,
                }
            })
            .collect();

        Arc::new(HandlerSetListener {
            target: self.target,
            name: self.target_name,
            methods,
        })
    }
}

impl fmt::Debug for HandlerSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerSet")
            .field("target", &self.target_name)
            .field("methods", &self.method_names().collect::<Vec<_>>())
            .finish()
    }
}

/// Collects handler declarations; see [`HandlerSet::builder`].
pub struct HandlerSetBuilder<X> {
    target: Arc<X>,
    methods: Vec<HandlerMethod>,
}

impl<X> HandlerSetBuilder<X>
where
    X: Send + Sync + 'static,
{
    /// Handler receiving the raw payload.
    #[must_use]
    pub fn on_payload<T, F>(self, name: &str, handler: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&X, &T) -> HandlerResult + Send + Sync + 'static,
    {
        self.on_payload_with(name, HandlerOptions::default(), handler)
    }

    #[must_use]
    pub fn on_payload_with<T, F>(self, name: &str, options: HandlerOptions<T>, handler: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&X, &T) -> HandlerResult + Send + Sync + 'static,
    {
        let target = Arc::clone(&self.target);
        let invoke: Invoke = Box::new(move |event: &Event| match event.payload_as::<T>() {
            Some(payload) => handler(target.as_ref(), payload),
            None => Ok(()),
        });
        self.push(name, options, invoke)
    }

    /// Handler receiving the typed event (payload plus sender, topic, scope).
    #[must_use]
    pub fn on_event<T, F>(self, name: &str, handler: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&X, &TypedEvent<'_, T>) -> HandlerResult + Send + Sync + 'static,
    {
        self.on_event_with(name, HandlerOptions::default(), handler)
    }

    #[must_use]
    pub fn on_event_with<T, F>(self, name: &str, options: HandlerOptions<T>, handler: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&X, &TypedEvent<'_, T>) -> HandlerResult + Send + Sync + 'static,
    {
        let target = Arc::clone(&self.target);
        let invoke: Invoke = Box::new(move |event: &Event| match TypedEvent::<T>::from_event(event) {
            Some(typed) => handler(target.as_ref(), &typed),
            None => Ok(()),
        });
        self.push(name, options, invoke)
    }

    fn push<T>(mut self, name: &str, options: HandlerOptions<T>, invoke: Invoke) -> Self
    where
        T: Any + Send + Sync,
    {
        let predicate = options.predicate;
        let accepts: Accepts = Box::new(move |event: &Event| match &predicate {
            None => true,
            Some(p) => event.payload_as::<T>().is_some_and(|payload| p(payload)),
        });

        self.methods.push(HandlerMethod {
            name: name.to_string(),
            payload_type: TypeId::of::<T>(),
            payload_type_name: type_name::<T>(),
            topic: options.topic,
            topic_filter: options.topic_filter,
            accepts,
            invoke,
        });
        self
    }

    /// Validate the declarations.
    ///
    /// # Errors
    ///
    /// [`ConfigurationError`] naming the first offending method: no methods,
    /// an empty method name, a duplicate method name, or an empty topic.
    pub fn build(self) -> Result<HandlerSet, ConfigurationError> {
        let target_name = type_name::<X>();
        if self.methods.is_empty() {
            return Err(ConfigurationError::NoHandlers {
                target: target_name,
            });
        }

        let mut seen = HashSet::new();
        for method in &self.methods {
            if method.name.is_empty() {
                return Err(ConfigurationError::EmptyMethodName {
                    target: target_name,
                });
            }
            if !seen.insert(method.name.as_str()) {
                return Err(ConfigurationError::DuplicateMethod {
                    method: method.name.clone(),
                });
            }
            if method.topic.as_deref() == Some("") {
                return Err(ConfigurationError::EmptyTopic {
                    method: method.name.clone(),
                });
            }
        }

        Ok(HandlerSet {
            target: TargetId::of(&self.target),
            target_name,
            methods: self.methods,
        })
    }
}

struct BoundMethod {
    method: HandlerMethod,
    selector: TopicSelector,
}

impl BoundMethod {
    /// Payload type and topic only; the predicate is left to delivery.
    fn routes(&self, event: &Event) -> bool {
        self.method.payload_type == event.payload_type_id() && self.selector.matches(event.topic())
    }
}

struct HandlerSetListener {
    target: TargetId,
    name: &'static str,
    methods: Vec<BoundMethod>,
}

impl Listener for HandlerSetListener {
    fn supports(&self, event: &Event) -> bool {
        self.methods.iter().any(|m| m.routes(event))
    }

    fn deliver(&self, event: &Event) -> Result<bool, ListenerError> {
        let mut ran = false;
        for bound in self.methods.iter().filter(|m| m.routes(event)) {
            if !(bound.method.accepts)(event) {
                continue;
            }
            (bound.method.invoke)(event).map_err(|source| HandlerMethodError {
                method: bound.method.name.clone(),
                source,
            })?;
            ran = true;
        }
        Ok(ran)
    }

    fn name(&self) -> &str {
        self.name
    }

    fn target(&self) -> Option<TargetId> {
        Some(self.target)
    }
}

impl fmt::Debug for HandlerMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerMethod")
            .field("name", &self.name)
            .field("payload", &self.payload_type_name)
            .field("topic", &self.topic)
            .finish_non_exhaustive()
    }
}
