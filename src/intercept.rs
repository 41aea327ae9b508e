//! Interception of component instances
//!
//! An [`Interceptor`] may replace a component with a wrapper that forwards
//! through extra behaviour. The [`InterceptionHook`] runs the registered
//! interceptors at exactly one of two points per instance: when an early
//! reference is materialized for a cycle, or after initialization. A
//! component wrapped early is never wrapped again.
//!
//! Wrappers must produce the same concrete type the component was registered
//! as (typically an `Arc<dyn Trait>` component), so consumers downcast the
//! wrapper exactly like the plain instance.

use crate::descriptor::{ComponentDescriptor, Role};
use crate::types::{Instance, same_instance};
use crate::{BoxError, DiError, Result};
use ahash::RandomState;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::sync::Arc;

#[cfg(feature = "logging")]
use tracing::{debug, trace};

/// Predicate + transform pair deciding whether and how to wrap a component.
///
/// # Examples
///
/// ```rust
/// use component_injector::{BoxError, ComponentDescriptor, Instance, Interceptor};
/// use std::sync::Arc;
///
/// trait Greeter: Send + Sync {
///     fn greet(&self) -> String;
/// }
///
/// struct Loud(Arc<dyn Greeter>);
///
/// impl Greeter for Loud {
///     fn greet(&self) -> String {
///         self.0.greet().to_uppercase()
///     }
/// }
///
/// struct Shout;
///
/// impl Interceptor for Shout {
///     fn is_eligible(&self, name: &str, _: &ComponentDescriptor) -> bool {
///         name.starts_with("greeter")
///     }
///
///     fn wrap(&self, _: &str, instance: Instance) -> Result<Instance, BoxError> {
///         let inner = instance
///             .downcast_ref::<Arc<dyn Greeter>>()
///             .cloned()
///             .ok_or("not a greeter")?;
///         let wrapped: Arc<dyn Greeter> = Arc::new(Loud(inner));
///         Ok(Arc::new(wrapped))
///     }
/// }
/// ```
pub trait Interceptor: Send + Sync {
    /// Whether the component should be wrapped
    fn is_eligible(&self, name: &str, descriptor: &ComponentDescriptor) -> bool;

    /// Produce the wrapped (or original) instance
    fn wrap(&self, name: &str, instance: Instance) -> std::result::Result<Instance, BoxError>;

    /// Whether this interceptor can wrap a component that is not yet fully populated.
    ///
    /// When an eligible interceptor returns `false` the component is not
    /// exposed early, so cycles through it fail as currently-in-creation.
    fn supports_early_reference(&self) -> bool {
        true
    }
}

/// Callbacks around initialization and destruction of every created component
pub trait PostProcessor: Send + Sync {
    /// Before the initializer and init method run
    fn before_init(&self, _name: &str, instance: Instance) -> std::result::Result<Instance, BoxError> {
        Ok(instance)
    }

    /// After the initializer and init method ran
    fn after_init(&self, _name: &str, instance: Instance) -> std::result::Result<Instance, BoxError> {
        Ok(instance)
    }

    /// Whether [`before_destruction`](Self::before_destruction) must run for this instance
    fn requires_destruction(&self, _name: &str, _instance: &Instance) -> bool {
        false
    }

    fn before_destruction(&self, _name: &str, _instance: &Instance) -> std::result::Result<(), BoxError> {
        Ok(())
    }
}

/// Runs interceptors at the early-exposure and post-population points
#[derive(Default)]
pub(crate) struct InterceptionHook {
    interceptors: RwLock<Vec<Arc<dyn Interceptor>>>,
    /// Raw instances handed to interceptors at the early point, by name
    early_references: DashMap<String, Instance, RandomState>,
}

impl InterceptionHook {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add(&self, interceptor: Arc<dyn Interceptor>) {
        self.interceptors.write().push(interceptor);
    }

    pub(crate) fn len(&self) -> usize {
        self.interceptors.read().len()
    }

    fn should_skip(descriptor: &ComponentDescriptor) -> bool {
        descriptor.role() == Role::Infrastructure
            || descriptor.static_type().is_some_and(|t| t.is_infrastructure())
            || descriptor.is_original_instance()
    }

    fn eligible(&self, name: &str, descriptor: &ComponentDescriptor) -> Vec<Arc<dyn Interceptor>> {
        if Self::should_skip(descriptor) {
            return Vec::new();
        }
        self.interceptors
            .read()
            .iter()
            .filter(|i| i.is_eligible(name, descriptor))
            .cloned()
            .collect()
    }

    /// Whether every eligible interceptor can wrap an early reference
    pub(crate) fn supports_early_reference(&self, name: &str, descriptor: &ComponentDescriptor) -> bool {
        self.eligible(name, descriptor)
            .iter()
            .all(|i| i.supports_early_reference())
    }

    /// Early-exposure point: remember the raw instance, then wrap it
    pub(crate) fn early_reference(
        &self,
        name: &str,
        descriptor: &ComponentDescriptor,
        raw: Instance,
    ) -> Result<Instance> {
        self.early_references.insert(name.to_owned(), raw.clone());
        self.wrap_if_necessary(name, descriptor, raw)
    }

    /// Post-population point: skip components already wrapped early
    pub(crate) fn after_initialization(
        &self,
        name: &str,
        descriptor: &ComponentDescriptor,
        instance: Instance,
    ) -> Result<Instance> {
        if let Some((_, early)) = self.early_references.remove(name) {
            if same_instance(&early, &instance) {
                #[cfg(feature = "logging")]
                trace!(
                    target: "component_injector",
                    component = name,
                    "Component already handled at early exposure, not wrapping again"
                );
                return Ok(instance);
            }
        }
        self.wrap_if_necessary(name, descriptor, instance)
    }

    /// Forget early bookkeeping for a component whose creation failed
    pub(crate) fn forget(&self, name: &str) {
        self.early_references.remove(name);
    }

    fn wrap_if_necessary(
        &self,
        name: &str,
        descriptor: &ComponentDescriptor,
        instance: Instance,
    ) -> Result<Instance> {
        let mut current = instance;
        for interceptor in self.eligible(name, descriptor) {
            current = interceptor
                .wrap(name, current)
                .map_err(|e| DiError::creation_caused_by(name, "interceptor failed to wrap component", e))?;

            #[cfg(feature = "logging")]
            debug!(target: "component_injector", component = name, "Wrapped component with interceptor");
        }
        Ok(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::ComponentType;
    use crate::types::instance;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Tagged(u32);

    struct CountingInterceptor {
        wraps: AtomicUsize,
    }

    impl Interceptor for CountingInterceptor {
        fn is_eligible(&self, name: &str, _: &ComponentDescriptor) -> bool {
            name != "plain"
        }

        fn wrap(&self, _: &str, instance: Instance) -> std::result::Result<Instance, BoxError> {
            self.wraps.fetch_add(1, Ordering::SeqCst);
            let inner = instance.downcast_ref::<Tagged>().ok_or("unexpected type")?;
            Ok(instance_of(inner.0 + 100))
        }
    }

    fn instance_of(v: u32) -> Instance {
        instance(Tagged(v))
    }

    fn descriptor(name: &str) -> ComponentDescriptor {
        let ty = ComponentType::builder::<Tagged>()
            .constructor(vec![], |_| Ok(Tagged(0)))
            .build();
        ComponentDescriptor::builder(name, ty).build()
    }

    fn hook() -> (InterceptionHook, Arc<CountingInterceptor>) {
        let hook = InterceptionHook::new();
        let counting = Arc::new(CountingInterceptor { wraps: AtomicUsize::new(0) });
        hook.add(counting.clone());
        (hook, counting)
    }

    #[test]
    fn test_post_population_wraps() {
        let (hook, counting) = hook();
        let desc = descriptor("svc");
        let wrapped = hook.after_initialization("svc", &desc, instance_of(1)).unwrap();
        assert_eq!(wrapped.downcast_ref::<Tagged>().map(|t| t.0), Some(101));
        assert_eq!(counting.wraps.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_early_wrapped_component_not_wrapped_twice() {
        let (hook, counting) = hook();
        let desc = descriptor("svc");
        let raw = instance_of(1);

        let early = hook.early_reference("svc", &desc, raw.clone()).unwrap();
        let post = hook.after_initialization("svc", &desc, raw.clone()).unwrap();

        assert!(!same_instance(&early, &raw));
        assert!(same_instance(&post, &raw));
        assert_eq!(counting.wraps.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_infrastructure_and_original_are_skipped() {
        let (hook, counting) = hook();
        let ty = ComponentType::builder::<Tagged>()
            .constructor(vec![], |_| Ok(Tagged(0)))
            .build();

        let infra = ComponentDescriptor::builder("infra", ty.clone()).infrastructure().build();
        let original = ComponentDescriptor::builder("svc.ORIGINAL", ty).build();

        let raw = instance_of(1);
        assert!(same_instance(&hook.after_initialization("infra", &infra, raw.clone()).unwrap(), &raw));
        assert!(same_instance(
            &hook.after_initialization("svc.ORIGINAL", &original, raw.clone()).unwrap(),
            &raw
        ));
        assert_eq!(counting.wraps.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_ineligible_component_passes_through() {
        let (hook, _) = hook();
        let desc = descriptor("plain");
        let raw = instance_of(1);
        assert!(same_instance(&hook.after_initialization("plain", &desc, raw.clone()).unwrap(), &raw));
    }

    #[test]
    fn test_wrap_failure_becomes_creation_error() {
        let (hook, _) = hook();
        let desc = descriptor("svc");
        let err = hook.after_initialization("svc", &desc, instance(7u8)).unwrap_err();
        assert!(matches!(err, DiError::CreationFailed { .. }));
    }
}
