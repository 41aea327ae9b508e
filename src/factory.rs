//! Component creation pipeline
//!
//! One call builds one instance: instantiate, expose an early reference
//! when the component may take part in a cycle, populate properties, run
//! the initialization callbacks and interceptors, verify that the exposed
//! identity is consistent with any early reference already handed out, and
//! register the teardown.

use crate::constructor::ConstructorResolver;
use crate::container::Container;
use crate::descriptor::{
    ArgValue, Args, AutowireMode, ComponentDescriptor, ComponentType, Instantiation, ParamKind, Setter,
    ValueSource,
};
use crate::lifecycle::{DestructibleHandle, destroy_detached};
use crate::provider::Scope;
use crate::registry::{Deferral, PendingInjection};
use crate::types::{Instance, TypeInfo, TypeKey, TypedValue, same_instance};
use crate::{DiError, Result};
use std::sync::Arc;

#[cfg(feature = "logging")]
use tracing::{debug, trace};

/// Types never autowired by name or by type
fn is_simple_property(ty: &TypeInfo) -> bool {
    macro_rules! simple {
        ($($t:ty),*) => {
            [$(TypeKey::of::<$t>()),*]
        };
    }
    let simple = simple!(
        bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, String,
        &'static str
    );
    simple.contains(&ty.key())
}

/// Bind a single resolved reference to a setter parameter
fn bind_reference(kind: ParamKind, target: &str, instance: Instance) -> ArgValue {
    match kind {
        ParamKind::List => ArgValue::List(vec![instance]),
        ParamKind::Map => ArgValue::Map(vec![(target.to_owned(), instance)]),
        ParamKind::Single | ParamKind::Optional => ArgValue::Single(instance),
    }
}

fn apply_setter(name: &str, setter: &Setter, target: &Instance, value: ArgValue) -> Result<()> {
    (setter.call)(target, value)
        .map_err(|e| DiError::creation_caused_by(name, format!("Error setting property '{}'", setter.name), e))
}

/// Builds instances for one container
pub(crate) struct ComponentFactory<'a> {
    container: &'a Container,
}

impl<'a> ComponentFactory<'a> {
    pub(crate) fn new(container: &'a Container) -> Self {
        Self { container }
    }

    /// Build, wire and initialize one instance of `name`
    pub(crate) fn create(
        &self,
        name: &str,
        descriptor: &Arc<ComponentDescriptor>,
        explicit: Option<&[TypedValue]>,
    ) -> Result<Instance> {
        #[cfg(feature = "logging")]
        trace!(
            target: "component_injector",
            component = name,
            scope = %descriptor.scope(),
            "Creating instance of component"
        );

        let core = &self.container.core;
        let (raw, ty) = self.instantiate(name, descriptor, explicit)?;

        let early_exposure = descriptor.is_singleton()
            && core.config.allow_circular_references
            && core.registry.is_currently_in_creation(name)
            && core.hook.supports_early_reference(name, descriptor);
        if early_exposure {
            #[cfg(feature = "logging")]
            debug!(
                target: "component_injector",
                component = name,
                "Eagerly caching component to allow for resolving potential circular references"
            );

            let hook = Arc::clone(&core.hook);
            let early_descriptor = Arc::clone(descriptor);
            let early_name = name.to_owned();
            let early_raw = raw.clone();
            core.registry.add_early_factory(
                name,
                Box::new(move || hook.early_reference(&early_name, &early_descriptor, early_raw)),
            );
        }

        self.populate(name, descriptor, &ty, &raw)?;
        let mut exposed = self.initialize(name, descriptor, &ty, &raw)?;

        if early_exposure {
            if let Some(early) = core.registry.get_singleton(name, false)? {
                if same_instance(&exposed, &raw) {
                    exposed = early;
                } else if !core.config.allow_raw_injection_despite_wrapping && core.graph.has_dependents(name) {
                    let dependents = core.graph.dependents_of(name);
                    return Err(DiError::in_creation(
                        name,
                        format!(
                            "Component has been injected into other components [{}] in its raw version as part \
                             of a circular reference, but has eventually been wrapped. This means that said \
                             other components do not use the final version of the component.",
                            dependents.join(", ")
                        ),
                    ));
                }
            }
        }

        self.register_teardown(name, descriptor, &ty, &raw)?;
        Ok(exposed)
    }

    fn instantiate(
        &self,
        name: &str,
        descriptor: &ComponentDescriptor,
        explicit: Option<&[TypedValue]>,
    ) -> Result<(Instance, ComponentType)> {
        let resolver = ConstructorResolver::new(self.container);
        let ty = match descriptor.instantiation() {
            Instantiation::Constructor(ty) => ty,
            Instantiation::StaticFactory { .. } | Instantiation::InstanceFactory { .. } => {
                return resolver.instantiate_using_factory_method(name, descriptor, explicit);
            }
        };

        let chosen = ty.preferred_constructors();
        if chosen.is_some()
            || descriptor.autowire() == AutowireMode::Constructor
            || !descriptor.constructor_args().is_empty()
            || explicit.is_some()
        {
            return resolver.autowire_constructor(name, descriptor, ty, chosen, explicit);
        }

        let non_public = descriptor
            .non_public_access_allowed
            .unwrap_or(self.container.core.config.non_public_access_allowed);
        let ctor = ty
            .constructors()
            .iter()
            .find(|c| c.params().is_empty() && (non_public || c.is_public()))
            .ok_or_else(|| DiError::invalid(name, format!("No default constructor found on {}", ty.name())))?;
        let instance = (ctor.call)(&Args::new(name, Vec::new()))
            .map_err(|e| DiError::creation_caused_by(name, "Instantiation of component failed", e))?;
        Ok((instance, ty.clone()))
    }

    /// Apply explicit property values, then by-name or by-type autowiring
    fn populate(&self, name: &str, descriptor: &ComponentDescriptor, ty: &ComponentType, raw: &Instance) -> Result<()> {
        let converter = self.container.converter();

        for property in descriptor.properties() {
            let setter = ty.setter(&property.name).ok_or_else(|| {
                DiError::invalid(
                    name,
                    format!("Invalid property '{}' of component type {}", property.name, ty.name()),
                )
            })?;
            match &property.source {
                ValueSource::Literal(value) => {
                    let converted = converter.convert(value, setter.param.ty()).ok_or_else(|| {
                        DiError::creation_failed(
                            name,
                            format!(
                                "Failed to convert property value of type [{}] to required type [{}] for property '{}'",
                                value.ty(),
                                setter.param.ty(),
                                property.name
                            ),
                        )
                    })?;
                    let (value, _) = converted.into_parts();
                    apply_setter(name, setter, raw, ArgValue::Single(value))?;
                }
                ValueSource::Reference(target) => self.inject_reference(name, setter, raw, target)?,
            }
        }

        let mode = descriptor.autowire();
        if !matches!(mode, AutowireMode::ByName | AutowireMode::ByType) {
            return Ok(());
        }
        let unsatisfied = ty.setters().iter().filter(|s| {
            !is_simple_property(s.param.ty()) && !descriptor.properties().iter().any(|p| p.name == s.name)
        });
        for setter in unsatisfied {
            if mode == AutowireMode::ByName {
                if self.container.contains(&setter.name) {
                    self.inject_reference(name, setter, raw, &setter.name)?;
                } else {
                    #[cfg(feature = "logging")]
                    trace!(
                        target: "component_injector",
                        component = name,
                        property = %setter.name,
                        "Not autowiring property by name: no matching component"
                    );
                }
                continue;
            }

            if let Some(target) = self.in_creation_candidate(name, setter) {
                self.inject_reference(name, setter, raw, &target)?;
                continue;
            }

            let resolved = match self.container.resolve_dependency(name, &setter.param, true) {
                Ok(resolved) => resolved,
                Err(DiError::NoComponentOfType { .. }) => continue,
                Err(err) => {
                    let reason = err.to_string();
                    return Err(DiError::unsatisfied(
                        name,
                        format!("property '{}'", setter.name),
                        reason,
                        Some(err),
                    ));
                }
            };
            if matches!(resolved.value, ArgValue::Absent) {
                continue;
            }
            for dependency in &resolved.names {
                self.container.core.graph.register_dependent(dependency, name);

                #[cfg(feature = "logging")]
                debug!(
                    target: "component_injector",
                    component = name,
                    property = %setter.name,
                    dependency = %dependency,
                    "Autowiring by type"
                );
            }
            apply_setter(name, setter, raw, resolved.value)?;
        }
        Ok(())
    }

    /// The singleton a by-type setter would bind to, when that singleton is
    /// still being created further up the stack
    fn in_creation_candidate(&self, name: &str, setter: &Setter) -> Option<String> {
        if !self.container.core.config.defer_cyclic_property_injection {
            return None;
        }
        if !matches!(setter.param.kind(), ParamKind::Single | ParamKind::Optional) {
            return None;
        }
        let target = self.container.select_candidate(name, &setter.param).ok()?;
        self.container
            .core
            .registry
            .is_currently_in_creation(&target)
            .then_some(target)
    }

    /// Inject the component `target` through `setter`, deferring the call
    /// when `target` is a singleton still inside its own constructor.
    fn inject_reference(&self, name: &str, setter: &Setter, raw: &Instance, target: &str) -> Result<()> {
        let core = &self.container.core;
        core.graph.register_dependent(target, name);
        let kind = setter.param.kind();

        if core.config.defer_cyclic_property_injection {
            let call = Arc::clone(&setter.call);
            let property = setter.name.clone();
            let dependent = name.to_owned();
            let receiver = raw.clone();
            let target_name = target.to_owned();
            let pending = PendingInjection {
                dependent: name.to_owned(),
                apply: Box::new(move |instance| {
                    call(&receiver, bind_reference(kind, &target_name, instance)).map_err(|e| {
                        DiError::creation_caused_by(dependent, format!("Error setting property '{property}'"), e)
                    })
                }),
            };
            match core.registry.resolve_or_defer(target, pending)? {
                Deferral::Available(instance) => {
                    return apply_setter(name, setter, raw, bind_reference(kind, target, instance));
                }
                Deferral::Queued => return Ok(()),
                Deferral::NotInCreation => {}
            }
        }

        let instance = self.container.lookup(target)?;
        apply_setter(name, setter, raw, bind_reference(kind, target, instance))
    }

    /// Post-processors, initializer, init method, interceptors; returns the exposed instance
    fn initialize(
        &self,
        name: &str,
        descriptor: &ComponentDescriptor,
        ty: &ComponentType,
        raw: &Instance,
    ) -> Result<Instance> {
        let processors = self.container.post_processors();
        let mut current = raw.clone();

        for processor in &processors {
            current = processor
                .before_init(name, current)
                .map_err(|e| DiError::creation_caused_by(name, "Post-processing before initialization failed", e))?;
        }

        if let Some(initializer) = ty.initializer() {
            #[cfg(feature = "logging")]
            trace!(target: "component_injector", component = name, "Invoking initializer");

            initializer(&current).map_err(|e| DiError::creation_caused_by(name, "Invocation of initializer failed", e))?;
        }

        if let Some(method) = descriptor.init_method() {
            let init = ty.method(method).ok_or_else(|| {
                DiError::invalid(name, format!("Could not find an init method named '{method}'"))
            })?;
            let already_run = ty.initializer().is_some_and(|hook| Arc::ptr_eq(hook, init));

            #[cfg(feature = "logging")]
            trace!(target: "component_injector", component = name, method = method, "Invoking init method");

            if !already_run {
                init(&current).map_err(|e| {
                    DiError::creation_caused_by(name, format!("Invocation of init method '{method}' failed"), e)
                })?;
            }
        }

        for processor in &processors {
            current = processor
                .after_init(name, current)
                .map_err(|e| DiError::creation_caused_by(name, "Post-processing after initialization failed", e))?;
        }

        self.container.core.hook.after_initialization(name, descriptor, current)
    }

    fn register_teardown(
        &self,
        name: &str,
        descriptor: &ComponentDescriptor,
        ty: &ComponentType,
        raw: &Instance,
    ) -> Result<()> {
        let core = &self.container.core;
        let processors = self.container.post_processors();

        match descriptor.scope() {
            Scope::Prototype => Ok(()),
            Scope::Singleton => {
                if let Some(handle) = DestructibleHandle::for_component(name, raw.clone(), ty, descriptor, &processors)? {
                    core.lifecycle.register(handle);
                }
                Ok(())
            }
            Scope::Custom(scope_name) => {
                let Some(scope) = core.scopes.get(scope_name).map(|s| Arc::clone(s.value())) else {
                    return Ok(());
                };
                if let Some(handle) = DestructibleHandle::for_component(name, raw.clone(), ty, descriptor, &processors)? {
                    scope.register_destruction_callback(
                        name,
                        Box::new(move || {
                            // failures are logged by destroy_detached
                            let _ = destroy_detached(&handle);
                        }),
                    );
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::Parameter;
    use crate::intercept::{Interceptor, PostProcessor};
    use crate::{BoxError, ContainerConfig, KeyedScope};
    use once_cell::sync::OnceCell;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Alpha {
        beta: OnceCell<Arc<Beta>>,
    }

    struct Beta {
        alpha: OnceCell<Arc<Alpha>>,
    }

    fn alpha_type() -> ComponentType {
        ComponentType::builder::<Alpha>()
            .constructor(vec![], |_| Ok(Alpha { beta: OnceCell::new() }))
            .property::<Beta, _>("beta", |a, b| {
                a.beta.set(b).map_err(|_| "beta already set")?;
                Ok(())
            })
            .build()
    }

    fn beta_type() -> ComponentType {
        ComponentType::builder::<Beta>()
            .constructor(vec![], |_| Ok(Beta { alpha: OnceCell::new() }))
            .property::<Alpha, _>("alpha", |b, a| {
                b.alpha.set(a).map_err(|_| "alpha already set")?;
                Ok(())
            })
            .build()
    }

    fn setter_cycle(config: ContainerConfig) -> Container {
        let container = Container::with_config(config);
        container
            .register(ComponentDescriptor::builder("alpha", alpha_type()).property_ref("beta", "beta").build())
            .unwrap();
        container
            .register(ComponentDescriptor::builder("beta", beta_type()).property_ref("alpha", "alpha").build())
            .unwrap();
        container
    }

    #[test]
    fn test_setter_cycle_resolves_with_early_reference() {
        let container = setter_cycle(ContainerConfig::default());
        let alpha = container.get::<Alpha>("alpha").unwrap();
        let beta = container.get::<Beta>("beta").unwrap();

        assert!(Arc::ptr_eq(alpha.beta.get().unwrap(), &beta));
        assert!(Arc::ptr_eq(beta.alpha.get().unwrap(), &alpha));
    }

    #[test]
    fn test_setter_cycle_rejected_without_circular_references() {
        let container = setter_cycle(
            ContainerConfig::default()
                .with_allow_circular_references(false)
                .with_defer_cyclic_property_injection(false),
        );
        let err = container.lookup("alpha").unwrap_err();
        assert!(err.is_currently_in_creation(), "unexpected error: {err:?}");
        assert!(!container.contains_singleton("alpha"));
        assert!(!container.contains_singleton("beta"));
    }

    #[test]
    fn test_deferred_injection_resolves_cycle_without_early_reference() {
        let container = setter_cycle(ContainerConfig::default().with_allow_circular_references(false));
        let alpha = container.get::<Alpha>("alpha").unwrap();
        let beta = container.get::<Beta>("beta").unwrap();

        assert!(Arc::ptr_eq(beta.alpha.get().unwrap(), &alpha));
        assert!(Arc::ptr_eq(alpha.beta.get().unwrap(), &beta));
    }

    #[test]
    fn test_literal_property_is_converted() {
        struct Pool {
            size: Mutex<u32>,
        }
        let ty = ComponentType::builder::<Pool>()
            .constructor(vec![], |_| Ok(Pool { size: Mutex::new(0) }))
            .setter("size", Parameter::of::<u32>(), |p, v| {
                if let ArgValue::Single(v) = v {
                    *p.size.lock() = *v.downcast_ref::<u32>().ok_or("not a u32")?;
                }
                Ok(())
            })
            .build();
        let container = Container::new();
        container
            .register(ComponentDescriptor::builder("pool", ty).property_value("size", String::from("16")).build())
            .unwrap();
        assert_eq!(*container.get::<Pool>("pool").unwrap().size.lock(), 16);
    }

    #[test]
    fn test_unknown_property_is_invalid() {
        let container = Container::new();
        container
            .register(ComponentDescriptor::builder("alpha", alpha_type()).property_ref("gamma", "beta").build())
            .unwrap();
        assert!(matches!(container.lookup("alpha"), Err(DiError::InvalidDescriptor { .. })));
    }

    #[test]
    fn test_init_callbacks_run_in_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        struct Service;
        let (l1, l2) = (Arc::clone(&log), Arc::clone(&log));
        let ty = ComponentType::builder::<Service>()
            .constructor(vec![], |_| Ok(Service))
            .initializer(move |_| {
                l1.lock().push("initializer");
                Ok(())
            })
            .method("start", move |_| {
                l2.lock().push("start");
                Ok(())
            })
            .build();

        struct Recording(Arc<Mutex<Vec<&'static str>>>);
        impl PostProcessor for Recording {
            fn before_init(&self, _: &str, instance: Instance) -> std::result::Result<Instance, BoxError> {
                self.0.lock().push("before");
                Ok(instance)
            }
            fn after_init(&self, _: &str, instance: Instance) -> std::result::Result<Instance, BoxError> {
                self.0.lock().push("after");
                Ok(instance)
            }
        }

        let container = Container::new();
        container.add_post_processor(Arc::new(Recording(Arc::clone(&log))));
        container
            .register(ComponentDescriptor::builder("svc", ty).init_method("start").build())
            .unwrap();
        container.lookup("svc").unwrap();
        assert_eq!(*log.lock(), vec!["before", "initializer", "start", "after"]);
    }

    #[test]
    fn test_missing_init_method_is_invalid() {
        let container = Container::new();
        container
            .register(ComponentDescriptor::builder("alpha", alpha_type()).init_method("boot").build())
            .unwrap();
        assert!(matches!(container.lookup("alpha"), Err(DiError::InvalidDescriptor { .. })));
    }

    #[test]
    fn test_no_default_constructor() {
        struct NeedsTwo;
        let ty = ComponentType::builder::<NeedsTwo>()
            .constructor(vec![Parameter::of::<u8>()], |_| Ok(NeedsTwo))
            .constructor(vec![Parameter::of::<u16>()], |_| Ok(NeedsTwo))
            .build();
        let container = Container::new();
        container.register(ComponentDescriptor::builder("n", ty).build()).unwrap();
        assert!(matches!(container.lookup("n"), Err(DiError::InvalidDescriptor { .. })));
    }

    #[test]
    fn test_constructor_failure_wraps_cause() {
        struct Flaky;
        let ty = ComponentType::builder::<Flaky>()
            .constructor(vec![], |_| Err("connection refused".into()))
            .build();
        let container = Container::new();
        container.register(ComponentDescriptor::builder("flaky", ty).build()).unwrap();
        let err = container.lookup("flaky").unwrap_err();
        assert!(matches!(err, DiError::CreationFailed { .. }));
        let source = std::error::Error::source(&err).map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("connection refused"));
        assert!(!container.is_currently_in_creation("flaky"));
    }

    // Interceptor that wraps Alpha instances in a fresh Alpha sharing the same beta cell
    struct Rewrap {
        wraps: AtomicUsize,
        early: bool,
    }

    impl Interceptor for Rewrap {
        fn is_eligible(&self, name: &str, _: &ComponentDescriptor) -> bool {
            name == "alpha"
        }

        fn wrap(&self, _: &str, instance: Instance) -> std::result::Result<Instance, BoxError> {
            self.wraps.fetch_add(1, Ordering::SeqCst);
            instance.downcast_ref::<Alpha>().ok_or("not an alpha")?;
            Ok(Arc::new(Alpha { beta: OnceCell::new() }))
        }

        fn supports_early_reference(&self) -> bool {
            self.early
        }
    }

    #[test]
    fn test_early_wrapped_reference_becomes_final_instance() {
        let container = setter_cycle(ContainerConfig::default());
        let rewrap = Arc::new(Rewrap {
            wraps: AtomicUsize::new(0),
            early: true,
        });
        container.add_interceptor(rewrap.clone());

        let alpha = container.lookup("alpha").unwrap();
        let beta = container.get::<Beta>("beta").unwrap();
        let held: Instance = beta.alpha.get().unwrap().clone();

        assert!(same_instance(&alpha, &held));
        assert_eq!(rewrap.wraps.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_wrapping_after_raw_injection_is_rejected() {
        struct LateOnly;
        impl Interceptor for LateOnly {
            fn is_eligible(&self, name: &str, _: &ComponentDescriptor) -> bool {
                name == "alpha"
            }
            fn wrap(&self, _: &str, _: Instance) -> std::result::Result<Instance, BoxError> {
                Ok(Arc::new(Alpha { beta: OnceCell::new() }))
            }
        }
        struct Swap;
        impl PostProcessor for Swap {
            fn after_init(&self, name: &str, instance: Instance) -> std::result::Result<Instance, BoxError> {
                if name == "alpha" {
                    return Ok(Arc::new(Alpha { beta: OnceCell::new() }));
                }
                Ok(instance)
            }
        }

        let container = setter_cycle(ContainerConfig::default());
        container.add_interceptor(Arc::new(LateOnly));
        container.add_post_processor(Arc::new(Swap));

        let err = container.lookup("alpha").unwrap_err();
        assert!(err.is_currently_in_creation());
        assert!(err.to_string().contains("raw version"));

        let lenient = setter_cycle(ContainerConfig::default().with_allow_raw_injection_despite_wrapping(true));
        lenient.add_post_processor(Arc::new(Swap));
        assert!(lenient.lookup("alpha").is_ok());
    }

    #[test]
    fn test_no_early_exposure_when_interceptor_declines() {
        let strict = setter_cycle(ContainerConfig::default().with_defer_cyclic_property_injection(false));
        strict.add_interceptor(Arc::new(Rewrap {
            wraps: AtomicUsize::new(0),
            early: false,
        }));
        assert!(strict.lookup("alpha").unwrap_err().is_currently_in_creation());

        // the queued injection receives the final wrapped instance
        let deferred = setter_cycle(ContainerConfig::default());
        let rewrap = Arc::new(Rewrap {
            wraps: AtomicUsize::new(0),
            early: false,
        });
        deferred.add_interceptor(rewrap.clone());
        let alpha = deferred.lookup("alpha").unwrap();
        let beta = deferred.get::<Beta>("beta").unwrap();
        let held: Instance = beta.alpha.get().unwrap().clone();
        assert!(same_instance(&alpha, &held));
        assert_eq!(rewrap.wraps.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_scoped_teardown_runs_on_reset() {
        let closed = Arc::new(AtomicUsize::new(0));
        struct Session;
        let counter = Arc::clone(&closed);
        let ty = ComponentType::builder::<Session>()
            .constructor(vec![], |_| Ok(Session))
            .disposer(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .build();

        let scope = Arc::new(KeyedScope::new());
        let container = Container::new();
        container.register_scope("session", scope.clone());
        container
            .register(ComponentDescriptor::builder("s", ty).scope(Scope::custom("session")).build())
            .unwrap();
        container.lookup("s").unwrap();
        scope.reset();
        assert_eq!(closed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_by_name_autowiring() {
        let container = Container::new();
        container
            .register(
                ComponentDescriptor::builder("alpha", alpha_type())
                    .autowire(AutowireMode::ByName)
                    .build(),
            )
            .unwrap();
        container
            .register(
                ComponentDescriptor::builder("beta", beta_type())
                    .autowire(AutowireMode::ByName)
                    .build(),
            )
            .unwrap();

        let alpha = container.get::<Alpha>("alpha").unwrap();
        let beta = container.get::<Beta>("beta").unwrap();
        assert!(Arc::ptr_eq(alpha.beta.get().unwrap(), &beta));
        assert!(Arc::ptr_eq(beta.alpha.get().unwrap(), &alpha));
    }

    #[test]
    fn test_simple_property_types() {
        assert!(is_simple_property(&TypeInfo::of::<String>()));
        assert!(is_simple_property(&TypeInfo::of::<u64>()));
        assert!(!is_simple_property(&TypeInfo::of::<Alpha>()));
    }
}
