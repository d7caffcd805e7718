//! # Bus Chain Integration Tests
//!
//! Four-level bus trees (application → session → ui → view): propagation,
//! routing to ancestors, topic filters, and metrics fed into Prometheus.

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;
    use scope_telemetry::{PrometheusRecorder, BUS_DELIVERIES, BUS_EVENTS_PUBLISHED};
    use scope_types::ScopeKind;
    use scoped_bus::{
        EventBusConfig, EventBusError, HierarchicalTopicFilter, ScopedEventBus, Subscription,
        SubscriptionOptions, TopicMatch,
    };
    use std::sync::Arc;

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    struct Chain {
        app: Arc<ScopedEventBus>,
        session: Arc<ScopedEventBus>,
        ui: Arc<ScopedEventBus>,
        view: Arc<ScopedEventBus>,
    }

    fn chain_with(config: EventBusConfig) -> Chain {
        let app = ScopedEventBus::root_with_config(config);
        let session = ScopedEventBus::child(&app, ScopeKind::Session).unwrap();
        let ui = ScopedEventBus::child(&session, ScopeKind::Ui).unwrap();
        let view = ScopedEventBus::child(&ui, ScopeKind::View).unwrap();
        Chain { app, session, ui, view }
    }

    fn chain() -> Chain {
        chain_with(EventBusConfig::default())
    }

    type Log = Arc<Mutex<Vec<(ScopeKind, String)>>>;

    /// Record (bus scope, payload) for every String delivered on `bus`.
    fn record_strings(bus: &ScopedEventBus, log: &Log, options: SubscriptionOptions) -> Subscription {
        let log = Arc::clone(log);
        let at = bus.scope();
        bus.subscribe_with::<String, _>(options, move |ev| {
            log.lock().push((at, ev.payload().clone()));
            Ok(())
        })
    }

    // =============================================================================
    // PROPAGATION
    // =============================================================================

    #[test]
    fn test_application_event_reaches_every_level() {
        let c = chain();
        let log: Log = Arc::default();
        let _subs: Vec<_> = [&c.app, &c.session, &c.ui, &c.view]
            .into_iter()
            .map(|bus| record_strings(bus, &log, SubscriptionOptions::default()))
            .collect();

        assert_eq!(c.app.publish("app", String::from("Hello World")).unwrap(), 4);

        let mut scopes: Vec<ScopeKind> = log.lock().iter().map(|(s, _)| *s).collect();
        scopes.sort();
        assert_eq!(
            scopes,
            vec![ScopeKind::Application, ScopeKind::Session, ScopeKind::Ui, ScopeKind::View]
        );
    }

    #[test]
    fn test_ui_event_stays_below_ui() {
        let c = chain();
        let log: Log = Arc::default();
        let _subs: Vec<_> = [&c.app, &c.session, &c.ui, &c.view]
            .into_iter()
            .map(|bus| record_strings(bus, &log, SubscriptionOptions::default()))
            .collect();

        c.ui.publish("ui", String::from("refresh")).unwrap();

        let scopes: Vec<ScopeKind> = log.lock().iter().map(|(s, _)| *s).collect();
        assert!(scopes.contains(&ScopeKind::Ui));
        assert!(scopes.contains(&ScopeKind::View));
        assert!(!scopes.contains(&ScopeKind::Session));
        assert!(!scopes.contains(&ScopeKind::Application));
    }

    #[test]
    fn test_local_only_listener_at_every_level() {
        let c = chain();
        let log: Log = Arc::default();
        let _view = record_strings(&c.view, &log, SubscriptionOptions::new().local_only());

        c.app.publish("app", String::from("from app")).unwrap();
        c.ui.publish("ui", String::from("from ui")).unwrap();
        c.view.publish("view", String::from("from view")).unwrap();

        assert_eq!(*log.lock(), vec![(ScopeKind::View, "from view".to_string())]);
    }

    #[test]
    fn test_sibling_sessions_are_isolated() {
        let app = ScopedEventBus::root();
        let alice = ScopedEventBus::child(&app, ScopeKind::Session).unwrap();
        let bob = ScopedEventBus::child(&app, ScopeKind::Session).unwrap();
        let log: Log = Arc::default();
        let _a = record_strings(&alice, &log, SubscriptionOptions::default());
        let _b = record_strings(&bob, &log, SubscriptionOptions::default());

        alice.publish("alice", String::from("private")).unwrap();
        assert_eq!(log.lock().len(), 1);

        app.publish("app", String::from("broadcast")).unwrap();
        assert_eq!(log.lock().len(), 3);
    }

    // =============================================================================
    // ROUTING
    // =============================================================================

    #[test]
    fn test_view_publishes_to_session_scope() {
        let c = chain();
        let log: Log = Arc::default();
        let _ui = record_strings(&c.ui, &log, SubscriptionOptions::default());
        let _session = record_strings(&c.session, &log, SubscriptionOptions::new().local_only());

        let delivered = c
            .view
            .publish_to_with_topic(ScopeKind::Session, "view", String::from("logout"), "auth")
            .unwrap();

        assert_eq!(delivered, 2);
        let log = log.lock();
        assert!(log.contains(&(ScopeKind::Session, "logout".to_string())));
        assert!(log.contains(&(ScopeKind::Ui, "logout".to_string())));
    }

    #[test]
    fn test_publish_to_narrower_scope_is_unsupported() {
        let c = chain();
        let err = c.ui.publish_to(ScopeKind::View, "ui", 1u8).unwrap_err();
        match err {
            EventBusError::UnsupportedScope { requested, origin, available } => {
                assert_eq!(requested, ScopeKind::View);
                assert_eq!(origin, ScopeKind::Ui);
                assert_eq!(
                    available,
                    vec![ScopeKind::Ui, ScopeKind::Session, ScopeKind::Application]
                );
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    // =============================================================================
    // TOPICS
    // =============================================================================

    #[test]
    fn test_hierarchical_default_from_config() {
        let c = chain_with(EventBusConfig::default().with_topic_match(TopicMatch::Hierarchical));
        let log: Log = Arc::default();
        let _sub = record_strings(&c.view, &log, SubscriptionOptions::new().topic("orders"));

        c.app.publish_with_topic("app", String::from("a"), "orders.created").unwrap();
        c.app.publish_with_topic("app", String::from("b"), "customers").unwrap();

        assert_eq!(*log.lock(), vec![(ScopeKind::View, "a".to_string())]);
    }

    #[test]
    fn test_per_subscription_filter_overrides_default() {
        let c = chain();
        let log: Log = Arc::default();
        let _exact = record_strings(&c.session, &log, SubscriptionOptions::new().topic("news"));
        let _prefix = record_strings(
            &c.ui,
            &log,
            SubscriptionOptions::new()
                .topic("news")
                .topic_filter(HierarchicalTopicFilter),
        );

        c.app.publish_with_topic("app", String::from("x"), "news.breaking").unwrap();
        assert_eq!(*log.lock(), vec![(ScopeKind::Ui, "x".to_string())]);
    }

    // =============================================================================
    // FAILURE AND METRICS
    // =============================================================================

    #[test]
    fn test_failure_in_session_skips_descendants() {
        let c = chain();
        let log: Log = Arc::default();
        let _fail = c.session.subscribe::<String, _>(|_| Err("session handler down".into()));
        let _view = record_strings(&c.view, &log, SubscriptionOptions::default());

        let err = c.app.publish("app", String::from("x")).unwrap_err();
        assert!(matches!(
            err,
            EventBusError::ListenerFailed { scope: ScopeKind::Application, .. }
        ));
        assert!(log.lock().is_empty());
        assert_eq!(c.session.metrics().listener_failures, 1);
    }

    #[test]
    fn test_prometheus_recorder_counts_by_scope() {
        let c = chain_with(EventBusConfig::default().with_recorder(Arc::new(PrometheusRecorder)));
        let log: Log = Arc::default();
        let _sub = record_strings(&c.view, &log, SubscriptionOptions::default());

        let published = BUS_EVENTS_PUBLISHED.with_label_values(&["ui"]).get();
        let delivered = BUS_DELIVERIES.with_label_values(&["view"]).get();

        c.ui.publish("ui", String::from("tick")).unwrap();

        assert!(BUS_EVENTS_PUBLISHED.with_label_values(&["ui"]).get() > published);
        assert!(BUS_DELIVERIES.with_label_values(&["view"]).get() > delivered);
    }
}
