//! # Scoped Lifecycle Integration Tests
//!
//! Stores opened through resolvers, nested teardown through the registry,
//! and concurrent once-only construction under contention.

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;
    use rand::seq::SliceRandom;
    use rand::thread_rng;
    use scope_store::{
        RegistryResolver, ScopeContext, ScopeContextResolver, ScopeError, ScopeStoreRegistry,
    };
    use scope_types::{ScopeId, ScopeKind};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Barrier};
    use std::thread;

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    struct Fixture {
        registry: Arc<ScopeStoreRegistry>,
        session: RegistryResolver,
        ui: RegistryResolver,
        view: RegistryResolver,
    }

    fn fixture() -> Fixture {
        let registry = Arc::new(ScopeStoreRegistry::new());
        Fixture {
            session: RegistryResolver::session(Arc::clone(&registry)),
            ui: RegistryResolver::ui(Arc::clone(&registry)),
            view: RegistryResolver::view(Arc::clone(&registry)),
            registry,
        }
    }

    /// Open a session with one UI and one view, registered as a tree.
    fn open_tree(f: &Fixture) -> ScopeContext {
        let (session, ui, view) = (ScopeId::session(), ScopeId::ui(), ScopeId::view());
        f.registry.register_child(session, ui).unwrap();
        f.registry.register_child(ui, view).unwrap();
        ScopeContext::new()
            .with_session(session)
            .with_ui(ui)
            .with_view(view)
    }

    // =============================================================================
    // RESOLUTION
    // =============================================================================

    #[test]
    fn test_resolvers_pick_store_of_their_kind() {
        let f = fixture();
        let ctx = open_tree(&f);

        let a = f.session.bean(&ctx, "counter", || AtomicUsize::new(0)).unwrap();
        let b = f.ui.bean(&ctx, "counter", || AtomicUsize::new(100)).unwrap();
        a.fetch_add(1, Ordering::SeqCst);

        assert_eq!(a.load(Ordering::SeqCst), 1);
        assert_eq!(b.load(Ordering::SeqCst), 100);
        assert_eq!(f.session.resolve(&ctx).unwrap().id(), ctx.get(ScopeKind::Session).unwrap());
        assert_eq!(f.registry.active_count(), 2);
    }

    #[test]
    fn test_missing_context_fails_closed() {
        let f = fixture();
        let ctx = ScopeContext::new().with_session(ScopeId::session());

        let err = f.view.resolve(&ctx).unwrap_err();
        assert_eq!(err, ScopeError::NoActiveScope { kind: ScopeKind::View });
        assert_eq!(err.to_string(), "No active view scope for current context");
        assert_eq!(f.registry.active_count(), 0);
    }

    #[test]
    fn test_same_context_same_bean_across_threads() {
        let f = Arc::new(fixture());
        let ctx = open_tree(&f);
        let creations = Arc::new(AtomicUsize::new(0));
        let barrier = Arc::new(Barrier::new(8));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let f = Arc::clone(&f);
                let creations = Arc::clone(&creations);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    f.session
                        .bean(&ctx, "shared", || {
                            creations.fetch_add(1, Ordering::SeqCst);
                            Mutex::new(Vec::<u32>::new())
                        })
                        .unwrap()
                })
            })
            .collect();

        let beans: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(creations.load(Ordering::SeqCst), 1);
        assert!(beans.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    }

    // =============================================================================
    // TEARDOWN
    // =============================================================================

    #[test]
    fn test_ending_session_ends_nested_scopes_narrowest_first() {
        let f = fixture();
        let ctx = open_tree(&f);
        let order = Arc::new(Mutex::new(Vec::new()));

        for (resolver, label) in [(&f.session, "session"), (&f.ui, "ui"), (&f.view, "view")] {
            let store = resolver.resolve(&ctx).unwrap();
            let order = Arc::clone(&order);
            store
                .register_destruction_callback("marker", move || order.lock().push(label))
                .unwrap();
        }
        let view_store = f.view.resolve(&ctx).unwrap();

        let report = f
            .registry
            .end_scope(ctx.get(ScopeKind::Session).unwrap())
            .unwrap();

        assert!(report.first_destroy);
        assert_eq!(*order.lock(), vec!["view", "ui", "session"]);
        assert!(view_store.is_destroyed());
        assert_eq!(f.registry.active_count(), 0);
    }

    #[test]
    fn test_destroyed_store_rejects_access_held_elsewhere() {
        let f = fixture();
        let ctx = open_tree(&f);
        let store = f.ui.resolve(&ctx).unwrap();
        store.get("bean", || 1u8).unwrap();

        f.registry.end_scope(store.id());

        assert!(matches!(
            store.get("bean", || 2u8),
            Err(ScopeError::StoreDestroyed { .. })
        ));
        assert!(store.remove("bean").is_none());

        // A fresh resolve opens a new store for the same id.
        let reopened = f.ui.resolve(&ctx).unwrap();
        assert!(!Arc::ptr_eq(&store, &reopened));
        assert_eq!(*reopened.get("bean", || 3u8).unwrap(), 3);
    }

    #[test]
    fn test_end_all_in_any_registration_order() {
        let f = fixture();
        let mut ids: Vec<ScopeId> = (0..4)
            .flat_map(|_| [ScopeId::session(), ScopeId::ui(), ScopeId::view()])
            .collect();
        ids.shuffle(&mut thread_rng());

        let ran = Arc::new(AtomicUsize::new(0));
        for id in &ids {
            let ran = Arc::clone(&ran);
            f.registry
                .store(*id)
                .register_destruction_callback("cleanup", move || {
                    ran.fetch_add(1, Ordering::SeqCst);
                })
                .unwrap();
        }

        assert_eq!(f.registry.end_all(), ids.len());
        assert_eq!(ran.load(Ordering::SeqCst), ids.len());
        assert_eq!(f.registry.active_count(), 0);
    }

    #[test]
    fn test_panicking_cleanup_does_not_block_others() {
        let f = fixture();
        let ctx = open_tree(&f);
        let store = f.session.resolve(&ctx).unwrap();
        let ran = Arc::new(AtomicUsize::new(0));

        let r = Arc::clone(&ran);
        store.register_destruction_callback("first", move || {
            r.fetch_add(1, Ordering::SeqCst);
        }).unwrap();
        store.register_destruction_callback("bad", || panic!("cleanup failed")).unwrap();
        let r = Arc::clone(&ran);
        store.register_destruction_callback("last", move || {
            r.fetch_add(1, Ordering::SeqCst);
        }).unwrap();

        let report = store.destroy();
        assert_eq!(report.callbacks_run, 3);
        assert_eq!(report.callbacks_panicked, 1);
        assert_eq!(ran.load(Ordering::SeqCst), 2);
    }
}

#[cfg(test)]
mod proptests {
    use proptest::prelude::*;
    use scope_store::ScopeStore;
    use scope_types::ScopeId;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    proptest! {
        #[test]
        fn prop_destroy_runs_each_callback_once(keys in proptest::collection::vec("[a-e]", 0..12), destroys in 1usize..4) {
            let store = ScopeStore::new(ScopeId::session());
            let ran = Arc::new(AtomicUsize::new(0));
            for key in &keys {
                let ran = Arc::clone(&ran);
                store.register_destruction_callback(key, move || {
                    ran.fetch_add(1, Ordering::SeqCst);
                }).unwrap();
            }

            let distinct = keys.iter().collect::<std::collections::HashSet<_>>().len();
            for _ in 0..destroys {
                store.destroy();
            }
            prop_assert_eq!(ran.load(Ordering::SeqCst), distinct);
        }
    }
}
