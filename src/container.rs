//! Named-component container
//!
//! The `Container` owns every piece of per-container state: descriptors,
//! the singleton registry, the dependency graph, interceptors and the
//! teardown coordinator. It is a cheap `Arc` handle; clones share state.

use crate::config::ContainerConfig;
use crate::constructor::ResolvedExecutable;
use crate::descriptor::{
    ArgValue, ComponentDescriptor, ComponentType, FACTORY_PREFIX, Instantiation, ParamKind, Parameter,
};
use crate::error::AmbiguityKind;
use crate::factory::ComponentFactory;
use crate::graph::DependencyGraph;
use crate::intercept::{InterceptionHook, Interceptor, PostProcessor};
use crate::lifecycle::{ContainerState, DestructibleHandle, DestructionReport, LifecycleCoordinator, destroy_detached};
use crate::provider::Scope;
use crate::registry::SingletonRegistry;
use crate::scope::CustomScope;
use crate::types::{DefaultConverter, Instance, TypeConverter, TypeInfo, TypedValue, downcast, same_instance};
use crate::{DiError, Injectable, Result};
use ahash::RandomState;
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use std::cell::RefCell;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

#[cfg(feature = "logging")]
use tracing::{debug, info, trace};

// =============================================================================
// Prototype cycle tracking
// =============================================================================

thread_local! {
    /// (container id, name) of every prototype currently being built on this thread
    static PROTOTYPES_IN_CREATION: RefCell<HashSet<(u64, String)>> = RefCell::new(HashSet::new());
}

fn prototype_in_creation(container: u64, name: &str) -> bool {
    PROTOTYPES_IN_CREATION.with(|set| set.borrow().contains(&(container, name.to_owned())))
}

/// Marks a non-singleton name as in creation on this thread until dropped
struct PrototypeGuard {
    key: (u64, String),
}

impl PrototypeGuard {
    fn enter(container: u64, name: &str) -> Self {
        let key = (container, name.to_owned());
        PROTOTYPES_IN_CREATION.with(|set| set.borrow_mut().insert(key.clone()));
        Self { key }
    }
}

impl Drop for PrototypeGuard {
    fn drop(&mut self) {
        PROTOTYPES_IN_CREATION.with(|set| set.borrow_mut().remove(&self.key));
    }
}

// =============================================================================
// Dependency lookup result
// =============================================================================

/// A value bound to a parameter by dependency lookup
pub(crate) struct ResolvedDependency {
    pub(crate) value: ArgValue,
    /// Type of a single bound component; `None` for collections and absent optionals
    pub(crate) ty: Option<TypeInfo>,
    /// Names of the components bound
    pub(crate) names: Vec<String>,
}

/// Shared state behind a [`Container`] handle
pub(crate) struct ContainerCore {
    pub(crate) id: u64,
    pub(crate) config: ContainerConfig,
    descriptors: DashMap<String, Arc<ComponentDescriptor>, RandomState>,
    /// Descriptor names in registration order
    order: RwLock<Vec<String>>,
    /// Types of instances registered directly, by name
    manual_types: DashMap<String, TypeInfo, RandomState>,
    manual_order: Mutex<Vec<String>>,
    pub(crate) registry: SingletonRegistry,
    pub(crate) graph: DependencyGraph,
    pub(crate) lifecycle: LifecycleCoordinator,
    pub(crate) hook: Arc<InterceptionHook>,
    pub(crate) post_processors: RwLock<Vec<Arc<dyn PostProcessor>>>,
    pub(crate) scopes: DashMap<String, Arc<dyn CustomScope>, RandomState>,
    converter: RwLock<Arc<dyn TypeConverter>>,
    /// Cached constructor/factory-method resolutions, by component name
    pub(crate) resolved: DashMap<String, ResolvedExecutable, RandomState>,
    /// Shared products of singleton factory components, with the factory that made them
    products: DashMap<String, (Instance, Instance), RandomState>,
}

fn new_map<V>() -> DashMap<String, V, RandomState> {
    DashMap::with_capacity_and_hasher_and_shard_amount(0, RandomState::new(), 8)
}

/// Named-component container.
///
/// # Examples
///
/// ```rust
/// use component_injector::{ComponentDescriptor, ComponentType, Container, Parameter};
/// use std::sync::Arc;
///
/// struct Database {
///     url: String,
/// }
///
/// struct UserRepository {
///     db: Arc<Database>,
/// }
///
/// let container = Container::new();
/// container
///     .register_singleton("db", Database { url: "postgres://localhost".into() })
///     .unwrap();
///
/// let repo = ComponentType::builder::<UserRepository>()
///     .constructor(vec![Parameter::of::<Database>()], |args| {
///         Ok(UserRepository { db: args.get::<Database>(0)? })
///     })
///     .build();
/// container.register(ComponentDescriptor::builder("users", repo).build()).unwrap();
///
/// let users = container.get::<UserRepository>("users").unwrap();
/// assert_eq!(users.db.url, "postgres://localhost");
/// assert!(Arc::ptr_eq(&users, &container.get::<UserRepository>("users").unwrap()));
/// ```
#[derive(Clone)]
pub struct Container {
    pub(crate) core: Arc<ContainerCore>,
}

impl Container {
    /// Create a container with the default configuration
    #[inline]
    pub fn new() -> Self {
        Self::with_config(ContainerConfig::default())
    }

    /// Create a container with explicit settings
    pub fn with_config(config: ContainerConfig) -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);
        let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);

        #[cfg(feature = "logging")]
        debug!(
            target: "component_injector",
            container_id = id,
            allow_circular_references = config.allow_circular_references,
            lenient = config.lenient_constructor_resolution,
            "Creating new container"
        );

        Self {
            core: Arc::new(ContainerCore {
                id,
                config,
                descriptors: new_map(),
                order: RwLock::new(Vec::new()),
                manual_types: new_map(),
                manual_order: Mutex::new(Vec::new()),
                registry: SingletonRegistry::new(),
                graph: DependencyGraph::new(),
                lifecycle: LifecycleCoordinator::new(),
                hook: Arc::new(InterceptionHook::new()),
                post_processors: RwLock::new(Vec::new()),
                scopes: new_map(),
                converter: RwLock::new(Arc::new(DefaultConverter)),
                resolved: new_map(),
                products: new_map(),
            }),
        }
    }

    #[inline]
    pub fn config(&self) -> &ContainerConfig {
        &self.core.config
    }

    /// Process-unique id of this container
    #[inline]
    pub fn id(&self) -> u64 {
        self.core.id
    }

    #[inline]
    pub fn state(&self) -> ContainerState {
        self.core.registry.state()
    }

    fn ensure_active(&self, name: &str) -> Result<()> {
        match self.state() {
            ContainerState::Active => Ok(()),
            ContainerState::Destroying => Err(DiError::DestructionInProgress { name: name.to_owned() }),
            ContainerState::Destroyed => Err(DiError::ContainerDestroyed { name: name.to_owned() }),
        }
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Register a component descriptor.
    ///
    /// Registering an existing name replaces its descriptor (unless
    /// overriding is disabled) and destroys any instance built from the old one.
    pub fn register(&self, descriptor: ComponentDescriptor) -> Result<()> {
        let name = descriptor.name().to_owned();
        self.ensure_active(&name)?;

        if let Instantiation::InstanceFactory { factory_component, .. } = descriptor.instantiation() {
            if *factory_component == name {
                return Err(DiError::invalid(
                    &name,
                    "factory component reference points back to the same definition",
                ));
            }
        }

        let existing = self.core.descriptors.contains_key(&name);
        if existing {
            if !self.core.config.allow_descriptor_overriding {
                return Err(DiError::invalid(
                    &name,
                    "a descriptor is already registered under this name and overriding is disabled",
                ));
            }

            #[cfg(feature = "logging")]
            info!(target: "component_injector", component = %name, "Overriding component descriptor");

            self.reset_component(&name);
        }

        #[cfg(feature = "logging")]
        debug!(
            target: "component_injector",
            component = %name,
            scope = %descriptor.scope(),
            autowire = ?descriptor.autowire(),
            "Registering component descriptor"
        );

        self.core.descriptors.insert(name.clone(), Arc::new(descriptor));
        if !existing {
            self.core.order.write().push(name);
        }
        Ok(())
    }

    /// Register an already-built singleton of type `T`
    pub fn register_singleton<T: Injectable>(&self, name: impl Into<String>, value: T) -> Result<()> {
        self.register_instance(name, Arc::new(value), TypeInfo::of::<T>())
    }

    /// Register an already-built instance under `name` with its type info.
    ///
    /// Fails with [`DiError::IdentityCollision`] when a different instance is
    /// already bound to the name.
    pub fn register_instance(&self, name: impl Into<String>, instance: Instance, ty: TypeInfo) -> Result<()> {
        let name = name.into();
        self.core.registry.register_direct(&name, instance)?;

        #[cfg(feature = "logging")]
        debug!(
            target: "component_injector",
            component = %name,
            r#type = ty.name(),
            "Registered singleton instance"
        );

        if self.core.manual_types.insert(name.clone(), ty).is_none() {
            self.core.manual_order.lock().push(name);
        }
        Ok(())
    }

    /// Register a custom scope under `name`
    pub fn register_scope(&self, name: impl Into<String>, scope: Arc<dyn CustomScope>) {
        let name = name.into();

        #[cfg(feature = "logging")]
        debug!(target: "component_injector", scope = %name, "Registering custom scope");

        self.core.scopes.insert(name, scope);
    }

    pub fn add_interceptor(&self, interceptor: Arc<dyn Interceptor>) {
        self.core.hook.add(interceptor);
    }

    pub fn add_post_processor(&self, processor: Arc<dyn PostProcessor>) {
        self.core.post_processors.write().push(processor);
    }

    /// Replace the converter used for literal constructor arguments and property values
    pub fn set_type_converter(&self, converter: Arc<dyn TypeConverter>) {
        *self.core.converter.write() = converter;
    }

    pub(crate) fn converter(&self) -> Arc<dyn TypeConverter> {
        Arc::clone(&self.core.converter.read())
    }

    pub(crate) fn post_processors(&self) -> Vec<Arc<dyn PostProcessor>> {
        self.core.post_processors.read().clone()
    }

    /// Drop every instance and cached resolution derived from `name`
    fn reset_component(&self, name: &str) {
        self.core.resolved.remove(name);
        self.core.products.remove(name);
        self.core.hook.forget(name);
        let mut report = DestructionReport::default();
        self.core
            .lifecycle
            .destroy_singleton(name, &self.core.registry, &self.core.graph, &mut report);
        if self.core.manual_types.remove(name).is_some() {
            self.core.manual_order.lock().retain(|n| n != name);
        }
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    /// Return the instance for `name`, creating it if necessary.
    ///
    /// For a factory component this is its product; `&name` returns the
    /// factory itself.
    #[inline]
    pub fn lookup(&self, name: &str) -> Result<Instance> {
        self.resolve_named(name, None)
    }

    /// Lookup `name` and downcast to `T`
    pub fn get<T: Injectable>(&self, name: &str) -> Result<Arc<T>> {
        downcast::<T>(name, self.lookup(name)?)
    }

    /// Create `name` with explicit constructor or factory-method arguments.
    ///
    /// Only non-singleton components may be created this way once a shared
    /// instance exists; the explicit arguments bypass the resolution cache.
    pub fn get_with_args(&self, name: &str, args: Vec<TypedValue>) -> Result<Instance> {
        self.resolve_named(name, Some(&args))
    }

    /// The single component assignable to `T`
    pub fn get_by_type<T: Injectable>(&self) -> Result<Arc<T>> {
        let (name, instance) = self.resolve_by_type(&TypeInfo::of::<T>())?;
        downcast::<T>(&name, instance)
    }

    /// The single component assignable to `ty`, with its name
    pub fn resolve_by_type(&self, ty: &TypeInfo) -> Result<(String, Instance)> {
        let param = Parameter::typed(ty.clone());
        let name = self.select_candidate("", &param)?;
        let instance = self.lookup(&name)?;
        Ok((name, instance))
    }

    /// Every component assignable to `T`, in registration order.
    ///
    /// Components that are currently in creation are skipped.
    pub fn components_of_type<T: Injectable>(&self) -> Result<Vec<(String, Arc<T>)>> {
        let mut found = Vec::new();
        for name in self.names_for_type(&TypeInfo::of::<T>()) {
            match self.lookup(&name) {
                Ok(instance) => {
                    let typed = downcast::<T>(&name, instance)?;
                    found.push((name, typed));
                }
                Err(err) if err.is_currently_in_creation() => {
                    #[cfg(feature = "logging")]
                    trace!(
                        target: "component_injector",
                        component = %name,
                        "Skipping component in creation during by-type collection"
                    );
                    self.core.registry.on_suppressed(err);
                }
                Err(err) => return Err(err),
            }
        }
        Ok(found)
    }

    fn resolve_named(&self, name: &str, explicit: Option<&[TypedValue]>) -> Result<Instance> {
        if let Some(factory_name) = name.strip_prefix(FACTORY_PREFIX) {
            let factory = self.resolve_component(factory_name, explicit)?;
            if self.component_type_of(factory_name).is_some_and(|t| t.product().is_some()) {
                return Ok(factory);
            }
            return Err(DiError::invalid(factory_name, "component is not a factory component"));
        }
        let instance = self.resolve_component(name, explicit)?;
        self.product_of(name, instance)
    }

    /// Hand out the product when `name` is a factory component
    fn product_of(&self, name: &str, factory: Instance) -> Result<Instance> {
        let Some(product) = self.component_type_of(name).and_then(|t| t.product().cloned()) else {
            return Ok(factory);
        };
        // products of factories still in creation or outside the singleton scope are never cached
        let shared = product.is_shared() && self.core.registry.contains(name);
        if shared {
            if let Some(cached) = self.core.products.get(name) {
                let (made_by, made) = cached.value();
                if same_instance(made_by, &factory) {
                    return Ok(made.clone());
                }
            }
        }

        #[cfg(feature = "logging")]
        trace!(
            target: "component_injector",
            component = name,
            product = product.info().name(),
            "Obtaining product from factory component"
        );

        let made = (product.call)(&factory)
            .map_err(|e| DiError::creation_caused_by(name, "Factory component threw on product creation", e))?;
        if !shared {
            return Ok(made);
        }
        let mut entry = self
            .core
            .products
            .entry(name.to_owned())
            .or_insert_with(|| (factory.clone(), made.clone()));
        if !same_instance(&entry.0, &factory) {
            *entry = (factory, made);
        }
        Ok(entry.1.clone())
    }

    fn resolve_component(&self, name: &str, explicit: Option<&[TypedValue]>) -> Result<Instance> {
        if explicit.is_none() {
            if let Some(shared) = self.core.registry.get_singleton(name, true)? {
                #[cfg(feature = "logging")]
                trace!(
                    target: "component_injector",
                    component = name,
                    early = self.core.registry.is_actually_in_creation(name),
                    "Returning cached instance of singleton"
                );
                return Ok(shared);
            }
        }

        if prototype_in_creation(self.core.id, name) {
            return Err(DiError::in_creation(
                name,
                "Requested non-singleton component is already being created on this thread",
            ));
        }

        let descriptor = self.descriptor(name).ok_or_else(|| DiError::not_found(name))?;

        for dependency in descriptor.depends_on() {
            if self.core.graph.is_dependent(name, dependency) {
                return Err(DiError::creation_failed(
                    name,
                    format!("Circular depends-on relationship between '{name}' and '{dependency}'"),
                ));
            }
            self.core.graph.register_dependent(dependency, name);
            self.lookup(dependency).map_err(|err| match err {
                DiError::NotFound { .. } => {
                    DiError::creation_failed(name, format!("depends on missing component '{dependency}'"))
                }
                other => other,
            })?;
        }

        match descriptor.scope() {
            Scope::Singleton => {
                if explicit.is_some() && self.core.registry.contains(name) {
                    return Err(DiError::invalid(
                        name,
                        "explicit arguments are only allowed when creating a new instance",
                    ));
                }
                let factory = ComponentFactory::new(self);
                // a rejected reentrant request must not evict the creation still in flight
                self.core.registry.get_or_create(name, || {
                    factory
                        .create(name, &descriptor, explicit)
                        .and_then(|instance| {
                            self.core.registry.flush_pending(name, &instance)?;
                            Ok(instance)
                        })
                        .inspect_err(|_| self.discard_failed_singleton(name))
                })
            }
            Scope::Prototype => {
                let _guard = PrototypeGuard::enter(self.core.id, name);
                ComponentFactory::new(self).create(name, &descriptor, explicit)
            }
            Scope::Custom(scope_name) => {
                let scope = self
                    .core
                    .scopes
                    .get(scope_name)
                    .map(|s| Arc::clone(s.value()))
                    .ok_or_else(|| DiError::ScopeNotActive {
                        name: name.to_owned(),
                        scope: scope_name.clone(),
                    })?;
                let _guard = PrototypeGuard::enter(self.core.id, name);
                let factory = ComponentFactory::new(self);
                scope.get(name, &mut || factory.create(name, &descriptor, explicit))
            }
        }
    }

    fn discard_failed_singleton(&self, name: &str) {
        #[cfg(feature = "logging")]
        debug!(target: "component_injector", component = name, "Discarding singleton after failed creation");

        self.core.hook.forget(name);
        let mut report = DestructionReport::default();
        self.core
            .lifecycle
            .destroy_singleton(name, &self.core.registry, &self.core.graph, &mut report);
    }

    // =========================================================================
    // Dependency lookup
    // =========================================================================

    /// Type table of the component registered under `name`
    pub(crate) fn component_type_of(&self, name: &str) -> Option<ComponentType> {
        self.component_type_at(name, 0)
    }

    fn component_type_at(&self, name: &str, depth: usize) -> Option<ComponentType> {
        // bounded walk through chains of instance factories
        if depth > self.core.descriptors.len() {
            return None;
        }
        let descriptor = self.descriptor(name)?;
        match descriptor.instantiation() {
            Instantiation::Constructor(ty) => Some(ty.clone()),
            Instantiation::StaticFactory { .. } => descriptor.static_type().cloned(),
            Instantiation::InstanceFactory { factory_component, method } => self
                .component_type_at(factory_component, depth + 1)?
                .factory_methods_named(method)
                .next()
                .map(|m| m.returns().clone()),
        }
    }

    /// Type of what a lookup of `name` returns; the product type for factory components
    pub(crate) fn type_of(&self, name: &str) -> Option<TypeInfo> {
        if self.core.descriptors.contains_key(name) {
            return self
                .component_type_of(name)
                .map(|t| t.product().map_or_else(|| t.info().clone(), |p| p.info().clone()));
        }
        self.core.manual_types.get(name).map(|t| t.value().clone())
    }

    fn autowire_candidates(&self, ty: &TypeInfo) -> Vec<(String, bool)> {
        let mut out = Vec::new();
        for name in self.core.order.read().iter() {
            let Some(descriptor) = self.descriptor(name) else { continue };
            if !descriptor.is_autowire_candidate() {
                continue;
            }
            if self.type_of(name).is_some_and(|t| t.is_assignable_to(ty)) {
                out.push((name.clone(), descriptor.is_primary()));
            }
        }
        for name in self.core.manual_order.lock().iter() {
            if self.core.descriptors.contains_key(name) {
                continue;
            }
            if self.core.manual_types.get(name).is_some_and(|t| t.is_assignable_to(ty)) {
                out.push((name.clone(), false));
            }
        }
        out
    }

    fn matching_candidates(&self, requesting: &str, param: &Parameter) -> Vec<(String, bool)> {
        let mut candidates = self.autowire_candidates(param.ty());
        if let Some(qualifier) = param.qualifier() {
            candidates.retain(|(n, _)| n == qualifier);
        }
        if candidates.len() > 1 || candidates.iter().any(|(n, _)| n != requesting) {
            candidates.retain(|(n, _)| n != requesting);
        }
        candidates
    }

    /// Pick the single candidate for a single-valued injection point
    pub(crate) fn select_candidate(&self, requesting: &str, param: &Parameter) -> Result<String> {
        let candidates = self.matching_candidates(requesting, param);
        match candidates.as_slice() {
            [] => Err(DiError::NoComponentOfType { type_name: param.ty().name() }),
            [(only, _)] => Ok(only.clone()),
            _ => {
                let primaries: Vec<_> = candidates.iter().filter(|(_, p)| *p).collect();
                if primaries.len() == 1 {
                    return Ok(primaries[0].0.clone());
                }
                if primaries.len() > 1 {
                    return Err(DiError::Ambiguous {
                        name: requesting.to_owned(),
                        kind: AmbiguityKind::Dependency,
                        candidates: primaries.iter().map(|(n, _)| n.clone()).collect(),
                    });
                }
                if let Some(by_name) = param.name().and_then(|p| candidates.iter().find(|(n, _)| n == p)) {
                    return Ok(by_name.0.clone());
                }
                Err(DiError::Ambiguous {
                    name: requesting.to_owned(),
                    kind: AmbiguityKind::Dependency,
                    candidates: candidates.into_iter().map(|(n, _)| n).collect(),
                })
            }
        }
    }

    /// Resolve a parameter by dependency lookup on behalf of `requesting`.
    ///
    /// With `fallback`, a collection parameter with no match binds an empty collection.
    pub(crate) fn resolve_dependency(
        &self,
        requesting: &str,
        param: &Parameter,
        fallback: bool,
    ) -> Result<ResolvedDependency> {
        match param.kind() {
            ParamKind::Single | ParamKind::Optional => {
                let name = match self.select_candidate(requesting, param) {
                    Ok(name) => name,
                    Err(DiError::NoComponentOfType { .. }) if param.kind() == ParamKind::Optional => {
                        return Ok(ResolvedDependency {
                            value: ArgValue::Absent,
                            ty: None,
                            names: Vec::new(),
                        });
                    }
                    Err(err) => return Err(err),
                };
                let instance = self.lookup(&name)?;
                let ty = self.type_of(&name);
                Ok(ResolvedDependency {
                    value: ArgValue::Single(instance),
                    ty,
                    names: vec![name],
                })
            }
            ParamKind::List | ParamKind::Map => {
                let names: Vec<String> = self
                    .matching_candidates(requesting, param)
                    .into_iter()
                    .map(|(n, _)| n)
                    .collect();
                if names.is_empty() && !fallback {
                    return Err(DiError::NoComponentOfType { type_name: param.ty().name() });
                }
                let mut instances = Vec::with_capacity(names.len());
                for name in &names {
                    instances.push((name.clone(), self.lookup(name)?));
                }
                let value = if param.kind() == ParamKind::List {
                    ArgValue::List(instances.into_iter().map(|(_, i)| i).collect())
                } else {
                    ArgValue::Map(instances)
                };
                Ok(ResolvedDependency { value, ty: None, names })
            }
        }
    }

    // =========================================================================
    // Introspection
    // =========================================================================

    /// Whether a descriptor or an instance is registered under `name`
    pub fn contains(&self, name: &str) -> bool {
        self.core.descriptors.contains_key(name) || self.core.registry.contains(name)
    }

    pub fn descriptor(&self, name: &str) -> Option<Arc<ComponentDescriptor>> {
        self.core.descriptors.get(name).map(|d| Arc::clone(d.value()))
    }

    /// Whether lookups of `name` share one instance; a factory component also
    /// needs a shared product
    pub fn is_singleton(&self, name: &str) -> Result<bool> {
        if let Some(factory_name) = name.strip_prefix(FACTORY_PREFIX) {
            return self
                .descriptor(factory_name)
                .map(|d| d.is_singleton())
                .ok_or_else(|| DiError::not_found(factory_name));
        }
        match self.descriptor(name) {
            Some(d) => Ok(d.is_singleton()
                && self
                    .component_type_of(name)
                    .and_then(|t| t.product().map(|p| p.is_shared()))
                    .unwrap_or(true)),
            None if self.core.registry.contains(name) => Ok(true),
            None => Err(DiError::not_found(name)),
        }
    }

    pub fn is_prototype(&self, name: &str) -> Result<bool> {
        if let Some(factory_name) = name.strip_prefix(FACTORY_PREFIX) {
            return self
                .descriptor(factory_name)
                .map(|d| d.is_prototype())
                .ok_or_else(|| DiError::not_found(factory_name));
        }
        match self.descriptor(name) {
            Some(d) => Ok(d.is_prototype()
                || self
                    .component_type_of(name)
                    .and_then(|t| t.product().map(|p| d.is_singleton() && !p.is_shared()))
                    .unwrap_or(false)),
            None if self.core.registry.contains(name) => Ok(false),
            None => Err(DiError::not_found(name)),
        }
    }

    /// Every registered name: descriptors first, then directly registered instances
    pub fn names(&self) -> Vec<String> {
        let mut names = self.core.order.read().clone();
        for name in self.core.manual_order.lock().iter() {
            if !self.core.descriptors.contains_key(name) {
                names.push(name.clone());
            }
        }
        names
    }

    /// Names of every component assignable to `ty`, autowire candidates or not
    pub fn names_for_type(&self, ty: &TypeInfo) -> Vec<String> {
        self.names()
            .into_iter()
            .filter(|n| self.type_of(n).is_some_and(|t| t.is_assignable_to(ty)))
            .collect()
    }

    /// Create every non-lazy singleton, stopping at the first failure
    pub fn pre_instantiate_singletons(&self) -> Result<()> {
        let names = self.core.order.read().clone();

        #[cfg(feature = "logging")]
        info!(
            target: "component_injector",
            components = names.len(),
            "Pre-instantiating singletons"
        );

        for name in names {
            let Some(descriptor) = self.descriptor(&name) else { continue };
            if descriptor.is_singleton() && !descriptor.is_lazy_init() {
                self.lookup(&name)?;
            }
        }
        Ok(())
    }

    // =========================================================================
    // Teardown
    // =========================================================================

    /// Destroy every singleton, dependents first, then clear all state.
    ///
    /// Teardown failures are collected in the report, never propagated.
    pub fn destroy_all(&self) -> DestructionReport {
        let report = self.core.lifecycle.destroy_all(&self.core.registry, &self.core.graph);
        self.core.resolved.clear();
        self.core.products.clear();
        report
    }

    /// Destroy one singleton and every component depending on it
    pub fn destroy_singleton(&self, name: &str) -> DestructionReport {
        let mut report = DestructionReport::default();
        self.core.hook.forget(name);
        self.core.products.remove(name);
        self.core
            .lifecycle
            .destroy_singleton(name, &self.core.registry, &self.core.graph, &mut report);
        report
    }

    /// Run the teardown of a non-singleton instance obtained from `name`
    pub fn destroy_instance(&self, name: &str, instance: Instance) -> Result<()> {
        let descriptor = self.descriptor(name).ok_or_else(|| DiError::not_found(name))?;
        let ty = self
            .component_type_of(name)
            .ok_or_else(|| DiError::invalid(name, "component type is unknown"))?;
        let handle = DestructibleHandle::for_component(name, instance, &ty, &descriptor, &self.post_processors())?;
        match handle {
            Some(handle) => destroy_detached(&handle),
            None => Ok(()),
        }
    }

    // =========================================================================
    // Dependency graph
    // =========================================================================

    /// Components recorded as depending on `name`
    #[inline]
    pub fn dependents_of(&self, name: &str) -> Vec<String> {
        self.core.graph.dependents_of(name)
    }

    /// Components `name` was recorded as depending on
    #[inline]
    pub fn dependencies_of(&self, name: &str) -> Vec<String> {
        self.core.graph.dependencies_of(name)
    }

    /// Whether `dependent` depends on `name`, directly or transitively
    #[inline]
    pub fn is_dependent(&self, name: &str, dependent: &str) -> bool {
        self.core.graph.is_dependent(name, dependent)
    }

    // =========================================================================
    // Singleton registry
    // =========================================================================

    /// Names of finished singletons, in registration order
    pub fn singleton_names(&self) -> Vec<String> {
        self.core.registry.names()
    }

    pub fn singleton_count(&self) -> usize {
        self.core.registry.count()
    }

    /// Whether a finished singleton exists for `name`
    pub fn contains_singleton(&self, name: &str) -> bool {
        self.core.registry.contains(name)
    }

    pub fn is_currently_in_creation(&self, name: &str) -> bool {
        self.core.registry.is_currently_in_creation(name) || prototype_in_creation(self.core.id, name)
    }

    /// Exclude `name` from (`false`) or re-include it in (`true`) the in-creation cycle check
    pub fn set_currently_in_creation(&self, name: &str, in_creation: bool) {
        self.core.registry.set_currently_in_creation(name, in_creation);
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("id", &self.core.id)
            .field("state", &self.state())
            .field("descriptors", &self.core.descriptors.len())
            .field("singletons", &self.singleton_count())
            .field("interceptors", &self.core.hook.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::AutowireMode;
    use crate::scope::KeyedScope;
    use std::sync::atomic::AtomicUsize;

    struct Engine;
    struct Car {
        engine: Arc<Engine>,
    }

    fn engine_type() -> ComponentType {
        ComponentType::builder::<Engine>()
            .constructor(vec![], |_| Ok(Engine))
            .build()
    }

    fn car_type() -> ComponentType {
        ComponentType::builder::<Car>()
            .constructor(vec![Parameter::of::<Engine>()], |args| {
                Ok(Car {
                    engine: args.get::<Engine>(0)?,
                })
            })
            .build()
    }

    #[test]
    fn test_singleton_identity() {
        let container = Container::new();
        container.register(ComponentDescriptor::builder("engine", engine_type()).build()).unwrap();

        let a = container.lookup("engine").unwrap();
        let b = container.lookup("engine").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(container.contains_singleton("engine"));
        assert_eq!(container.singleton_names(), vec!["engine"]);
    }

    #[test]
    fn test_prototype_creates_new_instances() {
        let container = Container::new();
        container
            .register(ComponentDescriptor::builder("engine", engine_type()).prototype().build())
            .unwrap();

        let a = container.lookup("engine").unwrap();
        let b = container.lookup("engine").unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert!(container.is_prototype("engine").unwrap());
        assert_eq!(container.singleton_count(), 0);
    }

    #[test]
    fn test_not_found() {
        let container = Container::new();
        assert!(matches!(container.lookup("missing"), Err(DiError::NotFound { .. })));
        assert!(matches!(container.is_singleton("missing"), Err(DiError::NotFound { .. })));
    }

    #[test]
    fn test_type_mismatch() {
        let container = Container::new();
        container.register_singleton("engine", Engine).unwrap();
        assert!(matches!(container.get::<Car>("engine"), Err(DiError::TypeMismatch { .. })));
    }

    #[test]
    fn test_identity_collision() {
        let container = Container::new();
        let engine: Instance = Arc::new(Engine);
        container
            .register_instance("engine", engine.clone(), TypeInfo::of::<Engine>())
            .unwrap();
        // same instance again is fine
        container
            .register_instance("engine", engine, TypeInfo::of::<Engine>())
            .unwrap();
        assert!(matches!(
            container.register_singleton("engine", Engine),
            Err(DiError::IdentityCollision { .. })
        ));
    }

    #[test]
    fn test_constructor_dependency_records_edge() {
        let container = Container::new();
        container.register(ComponentDescriptor::builder("engine", engine_type()).build()).unwrap();
        container.register(ComponentDescriptor::builder("car", car_type()).build()).unwrap();

        let car = container.get::<Car>("car").unwrap();
        let engine = container.get::<Engine>("engine").unwrap();
        assert!(Arc::ptr_eq(&car.engine, &engine));
        assert_eq!(container.dependents_of("engine"), vec!["car"]);
        assert!(container.is_dependent("engine", "car"));
    }

    #[test]
    fn test_ambiguous_dependency() {
        let container = Container::new();
        container.register_singleton("v8", Engine).unwrap();
        container.register_singleton("v6", Engine).unwrap();
        container.register(ComponentDescriptor::builder("car", car_type()).build()).unwrap();

        match container.lookup("car") {
            Err(DiError::Ambiguous { kind, candidates, .. }) => {
                assert_eq!(kind, AmbiguityKind::Dependency);
                assert_eq!(candidates, vec!["v8", "v6"]);
            }
            other => panic!("expected ambiguity, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_primary_and_parameter_name_break_ties() {
        let container = Container::new();
        container.register(ComponentDescriptor::builder("v8", engine_type()).build()).unwrap();
        container
            .register(ComponentDescriptor::builder("v6", engine_type()).primary().build())
            .unwrap();
        container.register(ComponentDescriptor::builder("car", car_type()).build()).unwrap();
        let car = container.get::<Car>("car").unwrap();
        assert!(Arc::ptr_eq(&car.engine, &container.get::<Engine>("v6").unwrap()));

        let named = ComponentType::builder::<Car>()
            .constructor(vec![Parameter::of::<Engine>().named("v8")], |args| {
                Ok(Car {
                    engine: args.get::<Engine>(0)?,
                })
            })
            .build();
        let container = Container::new();
        container.register_singleton("v8", Engine).unwrap();
        container.register_singleton("v6", Engine).unwrap();
        container.register(ComponentDescriptor::builder("car", named).build()).unwrap();
        let car = container.get::<Car>("car").unwrap();
        assert!(Arc::ptr_eq(&car.engine, &container.get::<Engine>("v8").unwrap()));
    }

    #[test]
    fn test_get_by_type_and_components_of_type() {
        let container = Container::new();
        container.register_singleton("e1", Engine).unwrap();
        assert!(container.get_by_type::<Engine>().is_ok());

        container.register_singleton("e2", Engine).unwrap();
        assert!(matches!(container.get_by_type::<Engine>(), Err(DiError::Ambiguous { .. })));
        let all = container.components_of_type::<Engine>().unwrap();
        assert_eq!(all.iter().map(|(n, _)| n.as_str()).collect::<Vec<_>>(), vec!["e1", "e2"]);
        assert!(matches!(container.get_by_type::<Car>(), Err(DiError::NoComponentOfType { .. })));
    }

    #[test]
    fn test_depends_on_creates_first_and_detects_cycles() {
        let created = Arc::new(Mutex::new(Vec::new()));
        let typed = |label: &'static str| {
            let created = Arc::clone(&created);
            ComponentType::builder::<Engine>()
                .constructor(vec![], move |_| {
                    created.lock().push(label);
                    Ok(Engine)
                })
                .build()
        };

        let container = Container::new();
        container
            .register(ComponentDescriptor::builder("a", typed("a")).depends_on("b").build())
            .unwrap();
        container.register(ComponentDescriptor::builder("b", typed("b")).build()).unwrap();
        container.lookup("a").unwrap();
        assert_eq!(*created.lock(), vec!["b", "a"]);
        assert_eq!(container.dependents_of("b"), vec!["a"]);

        let container = Container::new();
        container
            .register(ComponentDescriptor::builder("x", typed("x")).depends_on("y").build())
            .unwrap();
        container
            .register(ComponentDescriptor::builder("y", typed("y")).depends_on("x").build())
            .unwrap();
        let err = container.lookup("x").unwrap_err();
        assert!(err.to_string().contains("Circular depends-on"));
    }

    #[test]
    fn test_prototype_self_cycle_is_rejected() {
        struct Node;
        let ty = ComponentType::builder::<Node>()
            .constructor(vec![Parameter::of::<Node>()], |_| Ok(Node))
            .build();
        let container = Container::new();
        container.register(ComponentDescriptor::builder("node", ty).prototype().build()).unwrap();

        let err = container.lookup("node").unwrap_err();
        assert!(err.is_currently_in_creation(), "unexpected error: {err:?}");
        assert!(!container.is_currently_in_creation("node"));
    }

    #[test]
    fn test_custom_scope_lookup() {
        let container = Container::new();
        let scope = Arc::new(KeyedScope::new());
        container.register_scope("request", scope.clone());
        container
            .register(
                ComponentDescriptor::builder("engine", engine_type())
                    .scope(Scope::custom("request"))
                    .build(),
            )
            .unwrap();

        let a = container.lookup("engine").unwrap();
        assert!(Arc::ptr_eq(&a, &container.lookup("engine").unwrap()));
        assert!(scope.contains("engine"));
        assert_eq!(scope.reset(), 1);
        assert!(!Arc::ptr_eq(&a, &container.lookup("engine").unwrap()));
    }

    #[test]
    fn test_unregistered_scope() {
        let container = Container::new();
        container
            .register(
                ComponentDescriptor::builder("engine", engine_type())
                    .scope(Scope::custom("session"))
                    .build(),
            )
            .unwrap();
        assert!(matches!(container.lookup("engine"), Err(DiError::ScopeNotActive { .. })));
    }

    #[test]
    fn test_override_descriptor_replaces_instance() {
        struct Version(u8);
        let versioned = |v: u8| {
            ComponentType::builder::<Version>()
                .constructor(vec![], move |_| Ok(Version(v)))
                .build()
        };
        let container = Container::new();
        container.register(ComponentDescriptor::builder("v", versioned(1)).build()).unwrap();
        assert_eq!(container.get::<Version>("v").unwrap().0, 1);

        container.register(ComponentDescriptor::builder("v", versioned(2)).build()).unwrap();
        assert_eq!(container.get::<Version>("v").unwrap().0, 2);
        assert_eq!(container.names(), vec!["v"]);

        let strict = Container::with_config(ContainerConfig::default().with_allow_descriptor_overriding(false));
        strict.register(ComponentDescriptor::builder("v", versioned(1)).build()).unwrap();
        assert!(matches!(
            strict.register(ComponentDescriptor::builder("v", versioned(2)).build()),
            Err(DiError::InvalidDescriptor { .. })
        ));
    }

    #[test]
    fn test_pre_instantiate_skips_lazy_and_prototypes() {
        let built = Arc::new(AtomicUsize::new(0));
        let counted = || {
            let built = Arc::clone(&built);
            ComponentType::builder::<Engine>()
                .constructor(vec![], move |_| {
                    built.fetch_add(1, Ordering::SeqCst);
                    Ok(Engine)
                })
                .build()
        };
        let container = Container::new();
        container.register(ComponentDescriptor::builder("eager", counted()).build()).unwrap();
        container.register(ComponentDescriptor::builder("lazy", counted()).lazy().build()).unwrap();
        container
            .register(ComponentDescriptor::builder("proto", counted()).prototype().build())
            .unwrap();

        container.pre_instantiate_singletons().unwrap();
        assert_eq!(built.load(Ordering::SeqCst), 1);
        assert!(container.contains_singleton("eager"));
        assert!(!container.contains_singleton("lazy"));
    }

    #[test]
    fn test_pre_instantiate_fails_fast() {
        let container = Container::new();
        container.register(ComponentDescriptor::builder("car", car_type()).build()).unwrap();
        assert!(container.pre_instantiate_singletons().is_err());
        assert!(!container.contains_singleton("car"));
    }

    #[test]
    fn test_lookup_after_destroy_all() {
        let container = Container::new();
        container.register(ComponentDescriptor::builder("engine", engine_type()).build()).unwrap();
        container.lookup("engine").unwrap();

        let report = container.destroy_all();
        assert!(report.is_clean());
        assert_eq!(container.state(), ContainerState::Destroyed);
        assert_eq!(container.singleton_count(), 0);
        assert!(matches!(container.lookup("engine"), Err(DiError::ContainerDestroyed { .. })));
        assert!(matches!(
            container.register(ComponentDescriptor::builder("late", engine_type()).build()),
            Err(DiError::ContainerDestroyed { .. })
        ));
    }

    #[test]
    fn test_by_type_autowired_setter() {
        struct Garage {
            engine: parking_lot::Mutex<Option<Arc<Engine>>>,
        }
        let ty = ComponentType::builder::<Garage>()
            .constructor(vec![], |_| {
                Ok(Garage {
                    engine: parking_lot::Mutex::new(None),
                })
            })
            .property::<Engine, _>("engine", |g, e| {
                *g.engine.lock() = Some(e);
                Ok(())
            })
            .build();
        let container = Container::new();
        container.register_singleton("main", Engine).unwrap();
        container
            .register(ComponentDescriptor::builder("garage", ty).autowire(AutowireMode::ByType).build())
            .unwrap();

        let garage = container.get::<Garage>("garage").unwrap();
        assert!(garage.engine.lock().is_some());
        assert_eq!(container.dependencies_of("garage"), vec!["main"]);
    }

    struct Workshop {
        built: AtomicUsize,
    }

    fn workshop_type(shared: bool) -> ComponentType {
        let builder = ComponentType::builder::<Workshop>().constructor(vec![], |_| {
            Ok(Workshop {
                built: AtomicUsize::new(0),
            })
        });
        let make = |w: &Workshop| -> std::result::Result<Car, crate::BoxError> {
            w.built.fetch_add(1, Ordering::SeqCst);
            Ok(Car { engine: Arc::new(Engine) })
        };
        if shared {
            builder.product::<Car, _>(make).build()
        } else {
            builder.prototype_product::<Car, _>(make).build()
        }
    }

    #[test]
    fn test_factory_component_hands_out_cached_product() {
        let container = Container::new();
        container
            .register(ComponentDescriptor::builder("cars", workshop_type(true)).build())
            .unwrap();

        let first = container.get::<Car>("cars").unwrap();
        let second = container.get::<Car>("cars").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(container.is_singleton("cars").unwrap());

        let workshop = container.get::<Workshop>("&cars").unwrap();
        assert_eq!(workshop.built.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&workshop, &container.get::<Workshop>("&cars").unwrap()));

        let (name, _) = container.resolve_by_type(&TypeInfo::of::<Car>()).unwrap();
        assert_eq!(name, "cars");
        assert!(container.names_for_type(&TypeInfo::of::<Workshop>()).is_empty());
    }

    #[test]
    fn test_prototype_product_is_made_per_lookup() {
        let container = Container::new();
        container
            .register(ComponentDescriptor::builder("cars", workshop_type(false)).build())
            .unwrap();

        let first = container.get::<Car>("cars").unwrap();
        let second = container.get::<Car>("cars").unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert!(!container.is_singleton("cars").unwrap());
        assert!(container.is_prototype("cars").unwrap());
        assert!(container.is_singleton("&cars").unwrap());

        let workshop = container.get::<Workshop>("&cars").unwrap();
        assert_eq!(workshop.built.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_product_cache_follows_factory_instance() {
        let container = Container::new();
        container
            .register(ComponentDescriptor::builder("cars", workshop_type(true)).build())
            .unwrap();

        let before = container.get::<Car>("cars").unwrap();
        container.destroy_singleton("cars");
        let after = container.get::<Car>("cars").unwrap();
        assert!(!Arc::ptr_eq(&before, &after));
    }

    #[test]
    fn test_factory_prefix_on_plain_component() {
        let container = Container::new();
        container.register(ComponentDescriptor::builder("engine", engine_type()).build()).unwrap();
        assert!(matches!(
            container.lookup("&engine"),
            Err(DiError::InvalidDescriptor { .. })
        ));
    }

    #[test]
    fn test_debug_output() {
        let container = Container::new();
        let debug = format!("{container:?}");
        assert!(debug.contains("Container"));
        assert!(debug.contains("active") || debug.contains("Active"));
    }
}
