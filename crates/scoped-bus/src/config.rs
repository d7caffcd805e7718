//! Bus configuration.

use crate::metrics::{MetricsRecorder, NoOpMetrics};
use crate::topic::{TopicFilter, TopicMatch};
use std::env;
use std::fmt;
use std::sync::Arc;
use tracing::warn;

/// Settings shared by a bus and, unless overridden, its descendants.
#[derive(Clone)]
pub struct EventBusConfig {
    /// Filter used by subscriptions that name a topic but no filter.
    pub topic_match: TopicMatch,

    /// External metrics sink.
    pub recorder: Arc<dyn MetricsRecorder>,
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self {
            topic_match: TopicMatch::Exact,
            recorder: Arc::new(NoOpMetrics),
        }
    }
}

impl EventBusConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `SCOPE_BUS_TOPIC_MATCH`: `exact` or `hierarchical` (default: exact)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let topic_match = match lookup("SCOPE_BUS_TOPIC_MATCH") {
            Some(raw) => raw.parse().unwrap_or_else(|e: String| {
                warn!(value = %raw, error = %e, "Ignoring invalid SCOPE_BUS_TOPIC_MATCH");
                TopicMatch::default()
            }),
            None => TopicMatch::default(),
        };

        Self {
            topic_match,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_topic_match(mut self, topic_match: TopicMatch) -> Self {
        self.topic_match = topic_match;
        self
    }

    #[must_use]
    pub fn with_recorder(mut self, recorder: Arc<dyn MetricsRecorder>) -> Self {
        self.recorder = recorder;
        self
    }

    pub(crate) fn default_filter(&self) -> Arc<dyn TopicFilter> {
        self.topic_match.filter()
    }
}

impl fmt::Debug for EventBusConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBusConfig")
            .field("topic_match", &self.topic_match)
            .finish_non_exhaustive()
    }
}
