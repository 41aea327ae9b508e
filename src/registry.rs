//! Singleton identity registry with early-reference resolution
//!
//! Finished instances live in a `DashMap` so the hot lookup path never
//! blocks. Everything that mutates the registry (create, promote, expose
//! early, evict) serializes on one reentrant lock per container, so a
//! creation callback may recursively create other singletons on the same
//! thread while other threads wait.

use crate::lifecycle::ContainerState;
use crate::types::{Instance, same_instance};
use crate::{DiError, Result};
use ahash::RandomState;
use dashmap::{DashMap, DashSet};
use parking_lot::ReentrantMutex;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU8, Ordering};

#[cfg(feature = "logging")]
use tracing::{debug, trace};

/// Produces the early reference for a singleton in creation; run at most once
pub(crate) type EarlyFactory = Box<dyn FnOnce() -> Result<Instance> + Send>;

/// Property injection waiting for its target singleton to be promoted
pub(crate) struct PendingInjection {
    pub(crate) dependent: String,
    pub(crate) apply: Box<dyn FnOnce(Instance) -> Result<()> + Send>,
}

/// Outcome of [`SingletonRegistry::resolve_or_defer`]
pub(crate) enum Deferral {
    Available(Instance),
    Queued,
    NotInCreation,
}

#[derive(Default)]
struct RegistryState {
    early_factories: HashMap<String, EarlyFactory>,
    early_exposed: HashMap<String, Instance>,
    registered: Vec<String>,
    excluded: HashSet<String>,
    suppressed: Option<Vec<DiError>>,
    pending: HashMap<String, Vec<PendingInjection>>,
}

impl RegistryState {
    fn register_name(&mut self, name: &str) {
        if !self.registered.iter().any(|n| n == name) {
            self.registered.push(name.to_owned());
        }
    }
}

/// Name → instance table for singletons plus the early-reference tiers
pub(crate) struct SingletonRegistry {
    finished: DashMap<String, Instance, RandomState>,
    in_progress: DashSet<String, RandomState>,
    lock: ReentrantMutex<RefCell<RegistryState>>,
    state: AtomicU8,
}

impl SingletonRegistry {
    pub(crate) fn new() -> Self {
        Self {
            finished: DashMap::with_capacity_and_hasher_and_shard_amount(0, RandomState::new(), 8),
            in_progress: DashSet::with_hasher(RandomState::new()),
            lock: ReentrantMutex::new(RefCell::new(RegistryState::default())),
            state: AtomicU8::new(ContainerState::Active as u8),
        }
    }

    #[inline]
    pub(crate) fn state(&self) -> ContainerState {
        ContainerState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub(crate) fn set_state(&self, state: ContainerState) {
        let _guard = self.lock.lock();
        self.state.store(state as u8, Ordering::Release);
    }

    #[inline]
    fn finished(&self, name: &str) -> Option<Instance> {
        self.finished.get(name).map(|r| r.value().clone())
    }

    /// Look up a singleton through all three tiers.
    ///
    /// With `allow_early`, a registered early factory for a name in creation
    /// is run once and its product cached as the early-exposed instance.
    pub(crate) fn get_singleton(&self, name: &str, allow_early: bool) -> Result<Option<Instance>> {
        if let Some(instance) = self.finished(name) {
            return Ok(Some(instance));
        }
        if !self.in_progress.contains(name) {
            return Ok(None);
        }

        let guard = self.lock.lock();
        if let Some(instance) = self.finished(name) {
            return Ok(Some(instance));
        }
        let factory = {
            let mut st = guard.borrow_mut();
            if let Some(early) = st.early_exposed.get(name) {
                return Ok(Some(early.clone()));
            }
            if !allow_early {
                return Ok(None);
            }
            match st.early_factories.remove(name) {
                Some(factory) => factory,
                None => return Ok(None),
            }
        };

        #[cfg(feature = "logging")]
        debug!(
            target: "component_injector",
            component = name,
            "Materializing early reference for singleton in creation"
        );

        let early = factory()?;
        guard.borrow_mut().early_exposed.insert(name.to_owned(), early.clone());
        Ok(Some(early))
    }

    /// Return the singleton for `name`, creating it with `create` on a miss.
    ///
    /// The callback runs under the registry lock. Injections queued against
    /// `name` are applied before promotion; if one fails the creation fails
    /// and nothing is promoted.
    pub(crate) fn get_or_create<F>(&self, name: &str, create: F) -> Result<Instance>
    where
        F: FnOnce() -> Result<Instance>,
    {
        if let Some(instance) = self.finished(name) {
            return Ok(instance);
        }

        let guard = self.lock.lock();
        if let Some(instance) = self.finished(name) {
            return Ok(instance);
        }
        match self.state() {
            ContainerState::Active => {}
            ContainerState::Destroying => {
                return Err(DiError::DestructionInProgress { name: name.to_owned() });
            }
            ContainerState::Destroyed => {
                return Err(DiError::ContainerDestroyed { name: name.to_owned() });
            }
        }

        #[cfg(feature = "logging")]
        debug!(target: "component_injector", component = name, "Creating shared instance of singleton");

        self.before_creation(name)?;
        let record_suppressed = {
            let mut st = guard.borrow_mut();
            if st.suppressed.is_none() {
                st.suppressed = Some(Vec::new());
                true
            } else {
                false
            }
        };

        let result = create().and_then(|instance| {
            self.flush_pending(name, &instance)?;
            Ok(instance)
        });

        let suppressed = if record_suppressed {
            guard.borrow_mut().suppressed.take().unwrap_or_default()
        } else {
            Vec::new()
        };
        let after = self.after_creation(name);

        let instance = match result {
            Ok(instance) => instance,
            Err(err) => {
                guard.borrow_mut().pending.remove(name);
                return Err(err.with_related(suppressed));
            }
        };
        after?;

        self.add_singleton(name, instance.clone());

        #[cfg(feature = "logging")]
        debug!(target: "component_injector", component = name, "Finished creating singleton");

        Ok(instance)
    }

    /// Register an already-built instance
    pub(crate) fn register_direct(&self, name: &str, instance: Instance) -> Result<()> {
        let _guard = self.lock.lock();
        if let Some(existing) = self.finished(name) {
            if same_instance(&existing, &instance) {
                return Ok(());
            }
            return Err(DiError::IdentityCollision { name: name.to_owned() });
        }
        self.add_singleton(name, instance);
        Ok(())
    }

    /// Promote `instance` to the finished table and drop the early tiers for `name`
    pub(crate) fn add_singleton(&self, name: &str, instance: Instance) {
        let guard = self.lock.lock();
        self.finished.insert(name.to_owned(), instance);
        let mut st = guard.borrow_mut();
        st.early_factories.remove(name);
        st.early_exposed.remove(name);
        st.register_name(name);
    }

    /// Register the early factory for a singleton whose bare instance exists
    pub(crate) fn add_early_factory(&self, name: &str, factory: EarlyFactory) {
        let guard = self.lock.lock();
        if self.finished.contains_key(name) {
            return;
        }
        let mut st = guard.borrow_mut();
        st.early_factories.insert(name.to_owned(), factory);
        st.early_exposed.remove(name);
        st.register_name(name);
    }

    /// Resolve `target` for a property injection, or queue the injection
    /// when `target` is still inside its own constructor.
    pub(crate) fn resolve_or_defer(&self, target: &str, pending: PendingInjection) -> Result<Deferral> {
        if let Some(instance) = self.finished(target) {
            return Ok(Deferral::Available(instance));
        }
        let guard = self.lock.lock();
        if let Some(instance) = self.get_singleton(target, true)? {
            return Ok(Deferral::Available(instance));
        }
        if !self.is_currently_in_creation(target) {
            return Ok(Deferral::NotInCreation);
        }

        #[cfg(feature = "logging")]
        debug!(
            target: "component_injector",
            component = %pending.dependent,
            dependency = target,
            "Deferring property injection until singleton is promoted"
        );

        guard
            .borrow_mut()
            .pending
            .entry(target.to_owned())
            .or_default()
            .push(pending);
        Ok(Deferral::Queued)
    }

    /// Apply and drop the injections queued against `name`
    pub(crate) fn flush_pending(&self, name: &str, instance: &Instance) -> Result<()> {
        let pending = {
            let guard = self.lock.lock();
            let taken = guard.borrow_mut().pending.remove(name);
            taken.unwrap_or_default()
        };
        let mut first_error = None;
        for injection in pending {
            #[cfg(feature = "logging")]
            trace!(
                target: "component_injector",
                component = %injection.dependent,
                dependency = name,
                "Applying deferred property injection"
            );
            if let Err(err) = (injection.apply)(instance.clone()) {
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    fn before_creation(&self, name: &str) -> Result<()> {
        let guard = self.lock.lock();
        let excluded = guard.borrow().excluded.contains(name);
        if !excluded && !self.in_progress.insert(name.to_owned()) {
            return Err(DiError::in_creation(
                name,
                "Is there an unresolvable circular reference?",
            ));
        }
        Ok(())
    }

    fn after_creation(&self, name: &str) -> Result<()> {
        let guard = self.lock.lock();
        let excluded = guard.borrow().excluded.contains(name);
        if !excluded && self.in_progress.remove(name).is_none() {
            return Err(DiError::Internal(format!("Singleton '{name}' isn't currently in creation")));
        }
        Ok(())
    }

    /// Record an error observed and tolerated during the current creation
    pub(crate) fn on_suppressed(&self, err: DiError) {
        let guard = self.lock.lock();
        if let Some(suppressed) = guard.borrow_mut().suppressed.as_mut() {
            suppressed.push(err);
        }
    }

    /// Exclude `name` from (or re-include it in) the in-creation check
    pub(crate) fn set_currently_in_creation(&self, name: &str, in_creation: bool) {
        let guard = self.lock.lock();
        let mut st = guard.borrow_mut();
        if in_creation {
            st.excluded.remove(name);
        } else {
            st.excluded.insert(name.to_owned());
        }
    }

    pub(crate) fn is_currently_in_creation(&self, name: &str) -> bool {
        if !self.in_progress.contains(name) {
            return false;
        }
        let guard = self.lock.lock();
        let excluded = guard.borrow().excluded.contains(name);
        !excluded
    }

    #[inline]
    pub(crate) fn is_actually_in_creation(&self, name: &str) -> bool {
        self.in_progress.contains(name)
    }

    /// Evict every tier for `name`
    pub(crate) fn remove(&self, name: &str) -> Option<Instance> {
        let guard = self.lock.lock();
        let removed = self.finished.remove(name).map(|(_, v)| v);
        let mut st = guard.borrow_mut();
        st.early_factories.remove(name);
        st.early_exposed.remove(name);
        st.pending.remove(name);
        st.registered.retain(|n| n != name);
        removed
    }

    #[inline]
    pub(crate) fn contains(&self, name: &str) -> bool {
        self.finished.contains_key(name)
    }

    /// Registered singleton names, in registration order
    pub(crate) fn names(&self) -> Vec<String> {
        let guard = self.lock.lock();
        let names = guard.borrow().registered.clone();
        names
    }

    pub(crate) fn count(&self) -> usize {
        let guard = self.lock.lock();
        let count = guard.borrow().registered.len();
        count
    }

    pub(crate) fn clear(&self) {
        let guard = self.lock.lock();
        self.finished.clear();
        self.in_progress.clear();
        let mut st = guard.borrow_mut();
        st.early_factories.clear();
        st.early_exposed.clear();
        st.registered.clear();
        st.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::instance;
    use std::sync::atomic::AtomicUsize;
    use std::sync::{Arc, Barrier};
    use std::thread;

    #[test]
    fn test_get_or_create_caches() {
        let registry = SingletonRegistry::new();
        let calls = AtomicUsize::new(0);

        let first = registry
            .get_or_create("a", || {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(instance(1u32))
            })
            .unwrap();
        let second = registry
            .get_or_create("a", || {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(instance(2u32))
            })
            .unwrap();

        assert!(same_instance(&first, &second));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!registry.is_actually_in_creation("a"));
        assert_eq!(registry.names(), vec!["a".to_string()]);
    }

    #[test]
    fn test_failed_creation_clears_in_progress() {
        let registry = SingletonRegistry::new();
        let err = registry
            .get_or_create("a", || Err(DiError::creation_failed("a", "boom")))
            .unwrap_err();
        assert!(matches!(err, DiError::CreationFailed { .. }));
        assert!(!registry.is_actually_in_creation("a"));
        assert!(registry.get_or_create("a", || Ok(instance(1u8))).is_ok());
    }

    #[test]
    fn test_reentrant_request_is_rejected() {
        let registry = SingletonRegistry::new();
        let err = registry
            .get_or_create("a", || registry.get_or_create("a", || Ok(instance(0u8))))
            .unwrap_err();
        assert!(err.is_currently_in_creation());
    }

    #[test]
    fn test_early_factory_runs_once() {
        let registry = SingletonRegistry::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let raw = instance(String::from("raw"));

        let result = registry.get_or_create("a", || {
            let calls = Arc::clone(&calls);
            let early = raw.clone();
            registry.add_early_factory(
                "a",
                Box::new(move || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(early)
                }),
            );
            let first = registry.get_singleton("a", true)?.unwrap();
            let second = registry.get_singleton("a", true)?.unwrap();
            assert!(same_instance(&first, &second));
            assert!(registry.get_singleton("a", false)?.is_some());
            Ok(first)
        });

        assert!(same_instance(&result.unwrap(), &raw));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_no_early_lookup_without_allow_early() {
        let registry = SingletonRegistry::new();
        registry
            .get_or_create("a", || {
                registry.add_early_factory("a", Box::new(|| Ok(instance(1u8))));
                assert!(registry.get_singleton("a", false)?.is_none());
                Ok(instance(1u8))
            })
            .unwrap();
    }

    #[test]
    fn test_register_direct_collision() {
        let registry = SingletonRegistry::new();
        let inst = instance(5u8);
        registry.register_direct("x", inst.clone()).unwrap();
        registry.register_direct("x", inst).unwrap();
        let err = registry.register_direct("x", instance(6u8)).unwrap_err();
        assert!(matches!(err, DiError::IdentityCollision { .. }));
    }

    #[test]
    fn test_refuses_creation_while_destroying() {
        let registry = SingletonRegistry::new();
        registry.set_state(ContainerState::Destroying);
        let err = registry.get_or_create("a", || Ok(instance(1u8))).unwrap_err();
        assert!(matches!(err, DiError::DestructionInProgress { .. }));

        registry.set_state(ContainerState::Destroyed);
        let err = registry.get_or_create("a", || Ok(instance(1u8))).unwrap_err();
        assert!(matches!(err, DiError::ContainerDestroyed { .. }));
    }

    #[test]
    fn test_excluded_name_skips_cycle_check() {
        let registry = SingletonRegistry::new();
        registry.set_currently_in_creation("a", false);
        let inst = registry
            .get_or_create("a", || {
                assert!(!registry.is_currently_in_creation("a"));
                Ok(instance(1u8))
            })
            .unwrap();
        assert_eq!(inst.downcast_ref::<u8>(), Some(&1));
    }

    #[test]
    fn test_deferred_injection_applied_on_promotion() {
        let registry = SingletonRegistry::new();
        let seen = Arc::new(parking_lot::Mutex::new(None));

        let created = registry
            .get_or_create("a", || {
                let sink = Arc::clone(&seen);
                let outcome = registry.resolve_or_defer(
                    "a",
                    PendingInjection {
                        dependent: "b".into(),
                        apply: Box::new(move |target| {
                            *sink.lock() = Some(target);
                            Ok(())
                        }),
                    },
                )?;
                assert!(matches!(outcome, Deferral::Queued));
                Ok(instance(String::from("a")))
            })
            .unwrap();

        let guard = seen.lock();
        assert!(same_instance(guard.as_ref().unwrap(), &created));
    }

    #[test]
    fn test_failed_deferred_injection_is_not_promoted() {
        let registry = SingletonRegistry::new();

        let err = registry
            .get_or_create("a", || {
                registry.resolve_or_defer(
                    "a",
                    PendingInjection {
                        dependent: "b".into(),
                        apply: Box::new(|_| Err(DiError::creation_failed("b", "setter rejected"))),
                    },
                )?;
                Ok(instance(String::from("a")))
            })
            .unwrap_err();

        assert!(matches!(err, DiError::CreationFailed { .. }));
        assert!(!registry.contains("a"));
        assert!(!registry.is_actually_in_creation("a"));
        assert!(registry.names().is_empty());
    }

    #[test]
    fn test_suppressed_errors_attached_to_outer_failure() {
        let registry = SingletonRegistry::new();
        let err = registry
            .get_or_create("a", || {
                registry.on_suppressed(DiError::not_found("x"));
                Err(DiError::creation_failed("a", "boom"))
            })
            .unwrap_err();
        assert_eq!(err.related().len(), 1);
    }

    #[test]
    fn test_concurrent_get_or_create_single_instance() {
        let registry = Arc::new(SingletonRegistry::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let barrier = Arc::new(Barrier::new(8));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                let calls = Arc::clone(&calls);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    registry
                        .get_or_create("shared", || {
                            calls.fetch_add(1, Ordering::SeqCst);
                            Ok(instance(42u64))
                        })
                        .unwrap()
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(results.windows(2).all(|w| same_instance(&w[0], &w[1])));
    }
}
