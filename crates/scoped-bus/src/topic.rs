//! # Topic Filters
//!
//! A topic filter decides whether an event topic satisfies a listener topic.
//! Listeners without a topic accept every event topic; the filter is only
//! consulted when the listener names one.
//!
//! | Filter | Listener `news` accepts |
//! |--------|-------------------------|
//! | [`ExactTopicFilter`] | `news` |
//! | [`HierarchicalTopicFilter`] | `news`, `news.breaking`, `newsletter` |

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Pure predicate over `(event topic, listener topic)`.
pub trait TopicFilter: Send + Sync + fmt::Debug {
    fn matches(&self, event_topic: &str, listener_topic: &str) -> bool;
}

/// Topics must be equal.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactTopicFilter;

impl TopicFilter for ExactTopicFilter {
    fn matches(&self, event_topic: &str, listener_topic: &str) -> bool {
        event_topic == listener_topic
    }
}

/// The listener topic must be a prefix of the event topic.
#[derive(Debug, Clone, Copy, Default)]
pub struct HierarchicalTopicFilter;

impl TopicFilter for HierarchicalTopicFilter {
    fn matches(&self, event_topic: &str, listener_topic: &str) -> bool {
        event_topic.starts_with(listener_topic)
    }
}

/// Built-in filter choice, used by configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopicMatch {
    #[default]
    Exact,
    Hierarchical,
}

impl TopicMatch {
    #[must_use]
    pub fn filter(&self) -> Arc<dyn TopicFilter> {
        match self {
            Self::Exact => Arc::new(ExactTopicFilter),
            Self::Hierarchical => Arc::new(HierarchicalTopicFilter),
        }
    }
}

impl FromStr for TopicMatch {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exact" => Ok(Self::Exact),
            "hierarchical" | "hierarchy" | "prefix" => Ok(Self::Hierarchical),
            other => Err(format!("unknown topic match mode: {other}")),
        }
    }
}

/// A listener's resolved topic requirement.
#[derive(Debug, Clone)]
pub struct TopicSelector {
    topic: Option<String>,
    filter: Arc<dyn TopicFilter>,
}

impl TopicSelector {
    #[must_use]
    pub fn new(topic: Option<String>, filter: Arc<dyn TopicFilter>) -> Self {
        Self { topic, filter }
    }

    /// Selector that accepts every topic.
    #[must_use]
    pub fn any() -> Self {
        Self::new(None, Arc::new(ExactTopicFilter))
    }

    #[must_use]
    pub fn topic(&self) -> Option<&str> {
        self.topic.as_deref()
    }

    #[must_use]
    pub fn matches(&self, event_topic: &str) -> bool {
        match &self.topic {
            None => true,
            Some(listener_topic) => self.filter.matches(event_topic, listener_topic),
        }
    }
}
