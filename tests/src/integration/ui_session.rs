//! # UI Session End-to-End Tests
//!
//! A host wires one user session the way an application would:
//!
//! 1. The session store holds a security context bean.
//! 2. A UI-scoped audit component subscribes to the session bus with a
//!    handler set; its weak subscription lives in the UI store.
//! 3. Ending the session tears down the UI store, which drops the
//!    subscription and silences the component.

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;
    use scope_store::{RegistryResolver, ScopeContext, ScopeContextResolver, ScopeStoreRegistry};
    use scope_types::{ScopeId, ScopeKind};
    use scoped_bus::{
        ConfigurationError, HandlerOptions, HandlerSet, ScopedEventBus, Subscription,
        SubscriptionOptions,
    };
    use std::sync::Arc;

    // =============================================================================
    // DOMAIN FIXTURES
    // =============================================================================

    #[derive(Debug)]
    struct SecurityContext {
        user: String,
        roles: Vec<&'static str>,
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Login {
        user: String,
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Navigation {
        to: String,
    }

    #[derive(Default)]
    struct AuditTrail {
        entries: Mutex<Vec<String>>,
    }

    impl AuditTrail {
        fn handlers(self: &Arc<Self>) -> Result<HandlerSet, ConfigurationError> {
            HandlerSet::builder(self)
                .on_payload::<Login, _>("on_login", |audit, login| {
                    audit.entries.lock().push(format!("login:{}", login.user));
                    Ok(())
                })
                .on_event_with::<Navigation, _>(
                    "on_admin_navigation",
                    HandlerOptions::new()
                        .topic("nav")
                        .predicate(|nav: &Navigation| nav.to.starts_with("/admin")),
                    |audit, ev| {
                        audit
                            .entries
                            .lock()
                            .push(format!("nav:{}:{}", ev.sender(), ev.payload().to));
                        Ok(())
                    },
                )
                .build()
        }
    }

    struct Host {
        registry: Arc<ScopeStoreRegistry>,
        session_scope: RegistryResolver,
        ui_scope: RegistryResolver,
        app_bus: Arc<ScopedEventBus>,
    }

    fn host() -> Host {
        let registry = Arc::new(ScopeStoreRegistry::new());
        Host {
            session_scope: RegistryResolver::session(Arc::clone(&registry)),
            ui_scope: RegistryResolver::ui(Arc::clone(&registry)),
            registry,
            app_bus: ScopedEventBus::root(),
        }
    }

    /// Open a session + UI and wire the audit component into the session bus.
    fn open_ui(host: &Host) -> (ScopeContext, Arc<ScopedEventBus>, Arc<AuditTrail>) {
        let (session_id, ui_id) = (ScopeId::session(), ScopeId::ui());
        host.registry.register_child(session_id, ui_id).unwrap();
        let ctx = ScopeContext::new().with_session(session_id).with_ui(ui_id);

        let session_bus = host
            .session_scope
            .bean(&ctx, "session-bus", || {
                ScopedEventBus::child(&host.app_bus, ScopeKind::Session).unwrap()
            })
            .unwrap();
        let session_bus = Arc::clone(&*session_bus);

        host.session_scope
            .bean(&ctx, "security-context", || SecurityContext {
                user: "alice".into(),
                roles: vec!["admin"],
            })
            .unwrap();

        let audit = host
            .ui_scope
            .bean(&ctx, "audit", AuditTrail::default)
            .unwrap();
        let subscription = session_bus.subscribe_handlers(
            audit.handlers().unwrap(),
            SubscriptionOptions::default().weak(),
        );
        host.ui_scope
            .bean(&ctx, "audit-subscription", move || Mutex::new(Some(subscription)))
            .unwrap();

        (ctx, session_bus, audit)
    }

    // =============================================================================
    // END-TO-END
    // =============================================================================

    #[test]
    fn test_security_context_is_session_wide() {
        let host = host();
        let (ctx, _bus, _audit) = open_ui(&host);

        let sc = host
            .session_scope
            .bean(&ctx, "security-context", || SecurityContext {
                user: "mallory".into(),
                roles: vec![],
            })
            .unwrap();
        assert_eq!(sc.user, "alice");
        assert_eq!(sc.roles, vec!["admin"]);
    }

    #[test]
    fn test_audit_receives_filtered_events() {
        let host = host();
        let (_ctx, session_bus, audit) = open_ui(&host);

        host.app_bus
            .publish("login-form", Login { user: "alice".into() })
            .unwrap();
        session_bus
            .publish_with_topic("menu", Navigation { to: "/admin/users".into() }, "nav")
            .unwrap();
        session_bus
            .publish_with_topic("menu", Navigation { to: "/home".into() }, "nav")
            .unwrap();
        session_bus
            .publish("menu", Navigation { to: "/admin".into() })
            .unwrap();

        assert_eq!(
            *audit.entries.lock(),
            vec!["login:alice".to_string(), "nav:menu:/admin/users".to_string()]
        );
    }

    #[test]
    fn test_ending_session_silences_ui_component() {
        let host = host();
        let (ctx, session_bus, audit) = open_ui(&host);
        assert_eq!(session_bus.listener_count(), 1);

        host.registry
            .end_scope(ctx.get(ScopeKind::Session).unwrap())
            .unwrap();

        assert_eq!(session_bus.listener_count(), 0);
        assert_eq!(
            session_bus.publish("late", Login { user: "bob".into() }).unwrap(),
            0
        );
        assert!(audit.entries.lock().is_empty());
    }

    #[test]
    fn test_unsubscribe_target_detaches_component_explicitly() {
        let host = host();
        let (_ctx, session_bus, audit) = open_ui(&host);

        assert_eq!(session_bus.unsubscribe_target(&audit), 1);
        host.app_bus
            .publish("login-form", Login { user: "alice".into() })
            .unwrap();
        assert!(audit.entries.lock().is_empty());
    }

    #[test]
    fn test_cleanup_callback_cancels_subscription() {
        let host = host();
        let (ctx, session_bus, _audit) = open_ui(&host);
        let ui_store = host.ui_scope.resolve(&ctx).unwrap();

        let extra: Subscription = session_bus.subscribe::<Login, _>(|_| Ok(()));
        ui_store
            .register_destruction_callback("extra-listener", move || {
                extra.cancel();
            })
            .unwrap();
        assert_eq!(session_bus.listener_count(), 2);

        let report = host.registry.end_scope(ui_store.id()).unwrap();
        assert_eq!(report.callbacks_run, 1);
        assert_eq!(session_bus.listener_count(), 0);
    }
}
