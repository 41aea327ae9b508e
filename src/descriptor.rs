//! Component descriptors and the compile-time component type table
//!
//! A [`ComponentType`] lists what the container may do with a Rust type:
//! its constructors, factory methods, setters and lifecycle hooks. A
//! [`ComponentDescriptor`] names one component and says how to build it from
//! such a type. Descriptors are immutable once registered.

use crate::provider::Scope;
use crate::types::{Instance, TypeInfo, TypedValue};
use crate::{BoxError, DiError, Injectable};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Destroy-method name that asks the container to infer `close` then `shutdown`
pub const INFER_METHOD: &str = "(inferred)";

/// Suffix marking a component as the original target behind an interceptor
pub const ORIGINAL_INSTANCE_SUFFIX: &str = ".ORIGINAL";

/// Name prefix that looks up a factory component itself instead of its product
pub const FACTORY_PREFIX: &str = "&";

pub(crate) type ConstructorFn = Arc<dyn Fn(&Args) -> Result<Instance, BoxError> + Send + Sync>;
pub(crate) type FactoryMethodFn =
    Arc<dyn Fn(Option<&Instance>, &Args) -> Result<Instance, BoxError> + Send + Sync>;
pub(crate) type SetterFn = Arc<dyn Fn(&Instance, ArgValue) -> Result<(), BoxError> + Send + Sync>;
pub(crate) type MethodFn = Arc<dyn Fn(&Instance) -> Result<(), BoxError> + Send + Sync>;
pub(crate) type ProductFn = Arc<dyn Fn(&Instance) -> Result<Instance, BoxError> + Send + Sync>;

// =============================================================================
// Parameters and argument values
// =============================================================================

/// How a parameter consumes matching components
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// Exactly one component
    Single,
    /// Zero or one component
    Optional,
    /// Every matching component, in registration order
    List,
    /// Every matching component keyed by name
    Map,
}

/// A constructor, factory-method or setter parameter
#[derive(Debug, Clone)]
pub struct Parameter {
    name: Option<String>,
    ty: TypeInfo,
    kind: ParamKind,
    qualifier: Option<String>,
}

impl Parameter {
    /// Single-valued parameter of type `T`
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self::typed(TypeInfo::of::<T>())
    }

    /// Single-valued parameter with explicit type info
    pub fn typed(ty: TypeInfo) -> Self {
        Self {
            name: None,
            ty,
            kind: ParamKind::Single,
            qualifier: None,
        }
    }

    pub fn optional<T: ?Sized + 'static>() -> Self {
        Self::of::<T>().with_kind(ParamKind::Optional)
    }

    /// Collects every component assignable to `T`
    pub fn list<T: ?Sized + 'static>() -> Self {
        Self::of::<T>().with_kind(ParamKind::List)
    }

    /// Collects every component assignable to `T`, keyed by name
    pub fn map<T: ?Sized + 'static>() -> Self {
        Self::of::<T>().with_kind(ParamKind::Map)
    }

    pub fn with_kind(mut self, kind: ParamKind) -> Self {
        self.kind = kind;
        self
    }

    /// Parameter name; used to match named arguments and as the last
    /// fallback when choosing between several candidates.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Qualifier naming the preferred candidate
    pub fn qualified(mut self, qualifier: impl Into<String>) -> Self {
        self.qualifier = Some(qualifier.into());
        self
    }

    #[inline]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[inline]
    pub fn ty(&self) -> &TypeInfo {
        &self.ty
    }

    #[inline]
    pub fn kind(&self) -> ParamKind {
        self.kind
    }

    #[inline]
    pub fn qualifier(&self) -> Option<&str> {
        self.qualifier.as_deref()
    }

    #[inline]
    pub fn is_collection(&self) -> bool {
        matches!(self.kind, ParamKind::List | ParamKind::Map)
    }
}

/// A bound parameter value
#[derive(Clone)]
pub enum ArgValue {
    Single(Instance),
    List(Vec<Instance>),
    Map(Vec<(String, Instance)>),
    /// Unresolved optional parameter
    Absent,
}

impl fmt::Debug for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(_) => f.write_str("Single(..)"),
            Self::List(v) => write!(f, "List(len={})", v.len()),
            Self::Map(v) => write!(f, "Map(len={})", v.len()),
            Self::Absent => f.write_str("Absent"),
        }
    }
}

fn arg_error(component: &str, index: usize, reason: &str) -> BoxError {
    Box::new(DiError::unsatisfied(
        component,
        format!("parameter {index}"),
        reason,
        None,
    ))
}

/// Resolved arguments handed to constructors and factory methods
#[derive(Debug, Clone)]
pub struct Args {
    component: String,
    values: Vec<ArgValue>,
}

impl Args {
    pub(crate) fn new(component: impl Into<String>, values: Vec<ArgValue>) -> Self {
        Self {
            component: component.into(),
            values,
        }
    }

    /// Name of the component being built
    #[inline]
    pub fn component(&self) -> &str {
        &self.component
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[inline]
    pub fn raw(&self, index: usize) -> Option<&ArgValue> {
        self.values.get(index)
    }

    /// Single-valued argument at `index`
    pub fn get<T: Injectable>(&self, index: usize) -> Result<Arc<T>, BoxError> {
        match self.values.get(index) {
            Some(ArgValue::Single(v)) => Arc::clone(v)
                .downcast::<T>()
                .map_err(|_| arg_error(&self.component, index, std::any::type_name::<T>())),
            _ => Err(arg_error(&self.component, index, "no single value bound")),
        }
    }

    /// Optional argument at `index`
    pub fn optional<T: Injectable>(&self, index: usize) -> Result<Option<Arc<T>>, BoxError> {
        match self.values.get(index) {
            Some(ArgValue::Absent) | None => Ok(None),
            Some(_) => self.get::<T>(index).map(Some),
        }
    }

    /// Clone of a literal argument, e.g. a `String` or an integer
    pub fn value<T: Injectable + Clone>(&self, index: usize) -> Result<T, BoxError> {
        self.get::<T>(index).map(|v| (*v).clone())
    }

    /// Collection argument at `index`
    pub fn list<T: Injectable>(&self, index: usize) -> Result<Vec<Arc<T>>, BoxError> {
        match self.values.get(index) {
            Some(ArgValue::List(items)) => items
                .iter()
                .map(|v| {
                    Arc::clone(v)
                        .downcast::<T>()
                        .map_err(|_| arg_error(&self.component, index, std::any::type_name::<T>()))
                })
                .collect(),
            _ => Err(arg_error(&self.component, index, "no list bound")),
        }
    }

    /// Keyed collection argument at `index`
    pub fn map<T: Injectable>(&self, index: usize) -> Result<Vec<(String, Arc<T>)>, BoxError> {
        match self.values.get(index) {
            Some(ArgValue::Map(items)) => items
                .iter()
                .map(|(k, v)| {
                    Arc::clone(v)
                        .downcast::<T>()
                        .map(|v| (k.clone(), v))
                        .map_err(|_| arg_error(&self.component, index, std::any::type_name::<T>()))
                })
                .collect(),
            _ => Err(arg_error(&self.component, index, "no map bound")),
        }
    }
}

// =============================================================================
// Component type table
// =============================================================================

/// A constructor of a component type
#[derive(Clone)]
pub struct Constructor {
    pub(crate) params: Vec<Parameter>,
    pub(crate) public: bool,
    pub(crate) autowired: bool,
    pub(crate) call: ConstructorFn,
}

impl Constructor {
    #[inline]
    pub fn params(&self) -> &[Parameter] {
        &self.params
    }

    #[inline]
    pub fn is_public(&self) -> bool {
        self.public
    }

    #[inline]
    pub fn is_autowired(&self) -> bool {
        self.autowired
    }
}

impl fmt::Debug for Constructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constructor")
            .field("params", &self.params.iter().map(|p| p.ty().name()).collect::<Vec<_>>())
            .field("public", &self.public)
            .field("autowired", &self.autowired)
            .finish()
    }
}

/// A static or instance factory method
#[derive(Clone)]
pub struct FactoryMethod {
    pub(crate) name: String,
    pub(crate) params: Vec<Parameter>,
    pub(crate) public: bool,
    pub(crate) is_static: bool,
    pub(crate) returns: ComponentType,
    pub(crate) call: FactoryMethodFn,
}

impl FactoryMethod {
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn params(&self) -> &[Parameter] {
        &self.params
    }

    #[inline]
    pub fn is_static(&self) -> bool {
        self.is_static
    }

    /// Type of the produced component
    #[inline]
    pub fn returns(&self) -> &ComponentType {
        &self.returns
    }
}

impl fmt::Debug for FactoryMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FactoryMethod")
            .field("name", &self.name)
            .field("params", &self.params.iter().map(|p| p.ty().name()).collect::<Vec<_>>())
            .field("static", &self.is_static)
            .field("returns", &self.returns.name())
            .finish()
    }
}

/// Object a factory component hands out in place of itself
#[derive(Clone)]
pub struct Product {
    pub(crate) info: TypeInfo,
    pub(crate) shared: bool,
    pub(crate) call: ProductFn,
}

impl Product {
    /// Type handed out by lookups of the factory's name
    #[inline]
    pub fn info(&self) -> &TypeInfo {
        &self.info
    }

    /// Whether one product is cached per singleton factory
    #[inline]
    pub fn is_shared(&self) -> bool {
        self.shared
    }
}

impl fmt::Debug for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Product")
            .field("type", &self.info.name())
            .field("shared", &self.shared)
            .finish()
    }
}

#[derive(Clone)]
pub(crate) struct Setter {
    pub(crate) name: String,
    pub(crate) param: Parameter,
    pub(crate) call: SetterFn,
}

struct ComponentTypeInner {
    info: TypeInfo,
    constructors: Vec<Constructor>,
    factory_methods: Vec<FactoryMethod>,
    setters: Vec<Setter>,
    methods: Vec<(String, MethodFn)>,
    initializer: Option<MethodFn>,
    disposer: Option<MethodFn>,
    product: Option<Product>,
    infrastructure: bool,
}

/// What the container can do with a Rust type.
///
/// # Examples
///
/// ```rust
/// use component_injector::{ComponentType, Parameter};
/// use std::sync::Arc;
///
/// struct Clock;
/// struct Greeter {
///     clock: Arc<Clock>,
///     greeting: String,
/// }
///
/// let greeter = ComponentType::builder::<Greeter>()
///     .constructor(vec![Parameter::of::<Clock>(), Parameter::of::<String>()], |args| {
///         Ok(Greeter {
///             clock: args.get::<Clock>(0)?,
///             greeting: args.value::<String>(1)?,
///         })
///     })
///     .build();
///
/// assert_eq!(greeter.constructors().len(), 1);
/// ```
#[derive(Clone)]
pub struct ComponentType(Arc<ComponentTypeInner>);

impl ComponentType {
    /// Start describing `T`
    pub fn builder<T: Injectable>() -> ComponentTypeBuilder<T> {
        ComponentTypeBuilder::new(TypeInfo::of::<T>())
    }

    /// A type with no constructors or members; used for factory method products
    pub fn of<T: Injectable>() -> Self {
        Self::builder::<T>().build()
    }

    #[inline]
    pub fn info(&self) -> &TypeInfo {
        &self.0.info
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.0.info.name()
    }

    #[inline]
    pub fn constructors(&self) -> &[Constructor] {
        &self.0.constructors
    }

    /// Factory methods declared under `name`, in declaration order
    pub fn factory_methods_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a FactoryMethod> + 'a {
        self.0.factory_methods.iter().filter(move |m| m.name == name)
    }

    #[inline]
    pub fn factory_methods(&self) -> &[FactoryMethod] {
        &self.0.factory_methods
    }

    pub(crate) fn setters(&self) -> &[Setter] {
        &self.0.setters
    }

    pub(crate) fn setter(&self, name: &str) -> Option<&Setter> {
        self.0.setters.iter().find(|s| s.name == name)
    }

    pub(crate) fn method(&self, name: &str) -> Option<&MethodFn> {
        self.0.methods.iter().find(|(n, _)| n == name).map(|(_, m)| m)
    }

    pub fn has_method(&self, name: &str) -> bool {
        self.method(name).is_some()
    }

    pub(crate) fn initializer(&self) -> Option<&MethodFn> {
        self.0.initializer.as_ref()
    }

    pub(crate) fn disposer(&self) -> Option<&MethodFn> {
        self.0.disposer.as_ref()
    }

    /// Product handed out in place of instances of this type, if any
    #[inline]
    pub fn product(&self) -> Option<&Product> {
        self.0.product.as_ref()
    }

    /// Whether the type belongs to the interception machinery itself
    #[inline]
    pub fn is_infrastructure(&self) -> bool {
        self.0.infrastructure
    }

    /// Constructors an implicit constructor-autowire should consider: the
    /// ones marked autowired, or the only constructor when it takes parameters.
    pub(crate) fn preferred_constructors(&self) -> Option<Vec<Constructor>> {
        let marked: Vec<_> = self.0.constructors.iter().filter(|c| c.autowired).cloned().collect();
        if !marked.is_empty() {
            return Some(marked);
        }
        match self.0.constructors.as_slice() {
            [only] if !only.params.is_empty() => Some(vec![only.clone()]),
            _ => None,
        }
    }
}

impl fmt::Debug for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentType")
            .field("type", &self.name())
            .field("constructors", &self.0.constructors.len())
            .field("factory_methods", &self.0.factory_methods.len())
            .field("setters", &self.0.setters.iter().map(|s| s.name.as_str()).collect::<Vec<_>>())
            .finish()
    }
}

/// Builder for [`ComponentType`]
pub struct ComponentTypeBuilder<T> {
    inner: ComponentTypeInner,
    _marker: std::marker::PhantomData<fn() -> T>,
}

impl<T: Injectable> ComponentTypeBuilder<T> {
    fn new(info: TypeInfo) -> Self {
        Self {
            inner: ComponentTypeInner {
                info,
                constructors: Vec::new(),
                factory_methods: Vec::new(),
                setters: Vec::new(),
                methods: Vec::new(),
                initializer: None,
                disposer: None,
                product: None,
                infrastructure: false,
            },
            _marker: std::marker::PhantomData,
        }
    }

    /// Replace the type info, e.g. to declare a lineage
    pub fn type_info(mut self, info: TypeInfo) -> Self {
        self.inner.info = info;
        self
    }

    /// Declare the parent type
    pub fn extends(mut self, parent: TypeInfo) -> Self {
        self.inner.info = self.inner.info.extends(parent);
        self
    }

    /// Declare an implemented interface
    pub fn implements<I: ?Sized + 'static>(mut self) -> Self {
        self.inner.info = self.inner.info.implements::<I>();
        self
    }

    fn push_constructor<F>(mut self, params: Vec<Parameter>, public: bool, autowired: bool, f: F) -> Self
    where
        F: Fn(&Args) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        self.inner.constructors.push(Constructor {
            params,
            public,
            autowired,
            call: Arc::new(move |args| f(args).map(|v| Arc::new(v) as Instance)),
        });
        self
    }

    /// Public constructor
    pub fn constructor<F>(self, params: Vec<Parameter>, f: F) -> Self
    where
        F: Fn(&Args) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        self.push_constructor(params, true, false, f)
    }

    /// Non-public constructor; only considered when non-public access is allowed
    pub fn private_constructor<F>(self, params: Vec<Parameter>, f: F) -> Self
    where
        F: Fn(&Args) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        self.push_constructor(params, false, false, f)
    }

    /// Constructor marked for autowiring
    pub fn autowired_constructor<F>(self, params: Vec<Parameter>, f: F) -> Self
    where
        F: Fn(&Args) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        self.push_constructor(params, true, true, f)
    }

    /// Static factory method producing a component of type `R`
    pub fn static_factory<R, F>(
        mut self,
        name: impl Into<String>,
        params: Vec<Parameter>,
        returns: ComponentType,
        f: F,
    ) -> Self
    where
        R: Injectable,
        F: Fn(&Args) -> Result<R, BoxError> + Send + Sync + 'static,
    {
        debug_assert!(returns.info().is::<R>(), "factory method return type mismatch");
        self.inner.factory_methods.push(FactoryMethod {
            name: name.into(),
            params,
            public: true,
            is_static: true,
            returns,
            call: Arc::new(move |_, args| f(args).map(|v| Arc::new(v) as Instance)),
        });
        self
    }

    /// Instance factory method invoked on a `T` component
    pub fn factory_method<R, F>(
        mut self,
        name: impl Into<String>,
        params: Vec<Parameter>,
        returns: ComponentType,
        f: F,
    ) -> Self
    where
        R: Injectable,
        F: Fn(&T, &Args) -> Result<R, BoxError> + Send + Sync + 'static,
    {
        debug_assert!(returns.info().is::<R>(), "factory method return type mismatch");
        self.inner.factory_methods.push(FactoryMethod {
            name: name.into(),
            params,
            public: true,
            is_static: false,
            returns,
            call: Arc::new(move |receiver, args| {
                let this = receiver
                    .and_then(|r| r.downcast_ref::<T>())
                    .ok_or_else(|| Box::new(DiError::type_mismatch::<T>(args.component())) as BoxError)?;
                f(this, args).map(|v| Arc::new(v) as Instance)
            }),
        });
        self
    }

    /// Setter receiving the raw bound value
    pub fn setter<F>(mut self, name: impl Into<String>, param: Parameter, f: F) -> Self
    where
        F: Fn(&T, ArgValue) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        let name = name.into();
        let param = if param.name().is_none() { param.named(name.clone()) } else { param };
        self.inner.setters.push(Setter {
            name,
            param,
            call: Arc::new(move |target, value| {
                let this = target
                    .downcast_ref::<T>()
                    .ok_or_else(|| Box::new(DiError::type_mismatch::<T>("setter target")) as BoxError)?;
                f(this, value)
            }),
        });
        self
    }

    /// Setter for a single component of type `V`
    pub fn property<V, F>(self, name: impl Into<String>, f: F) -> Self
    where
        V: Injectable,
        F: Fn(&T, Arc<V>) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.setter(name, Parameter::of::<V>(), move |this, value| match value {
            ArgValue::Single(v) => {
                let v = v
                    .downcast::<V>()
                    .map_err(|_| Box::new(DiError::type_mismatch::<V>("property value")) as BoxError)?;
                f(this, v)
            }
            other => Err(format!("expected a single value, got {other:?}").into()),
        })
    }

    /// Named zero-argument method usable as an init or destroy method
    pub fn method<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&T) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.inner.methods.push((name.into(), erase_method(f)));
        self
    }

    /// Hook run after properties are set
    pub fn initializer<F>(mut self, f: F) -> Self
    where
        F: Fn(&T) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.inner.initializer = Some(erase_method(f));
        self
    }

    /// Hook run when the component is destroyed
    pub fn disposer<F>(mut self, f: F) -> Self
    where
        F: Fn(&T) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.inner.disposer = Some(erase_method(f));
        self
    }

    /// Make `T` a factory component: looking up its name returns what `f`
    /// produces, cached once per singleton factory instance.
    ///
    /// The factory itself stays reachable as `&name` (see [`FACTORY_PREFIX`]).
    pub fn product<P, F>(self, f: F) -> Self
    where
        P: Injectable,
        F: Fn(&T) -> Result<P, BoxError> + Send + Sync + 'static,
    {
        self.push_product(true, f)
    }

    /// Like [`product`](Self::product), but every lookup produces a new object
    pub fn prototype_product<P, F>(self, f: F) -> Self
    where
        P: Injectable,
        F: Fn(&T) -> Result<P, BoxError> + Send + Sync + 'static,
    {
        self.push_product(false, f)
    }

    fn push_product<P, F>(mut self, shared: bool, f: F) -> Self
    where
        P: Injectable,
        F: Fn(&T) -> Result<P, BoxError> + Send + Sync + 'static,
    {
        self.inner.product = Some(Product {
            info: TypeInfo::of::<P>(),
            shared,
            call: Arc::new(move |factory: &Instance| {
                let this = factory
                    .downcast_ref::<T>()
                    .ok_or_else(|| Box::new(DiError::type_mismatch::<T>("factory component")) as BoxError)?;
                f(this).map(|p| Arc::new(p) as Instance)
            }),
        });
        self
    }

    /// Mark as part of the interception machinery; never wrapped
    pub fn infrastructure(mut self) -> Self {
        self.inner.infrastructure = true;
        self
    }

    pub fn build(self) -> ComponentType {
        ComponentType(Arc::new(self.inner))
    }
}

fn erase_method<T, F>(f: F) -> MethodFn
where
    T: Injectable,
    F: Fn(&T) -> Result<(), BoxError> + Send + Sync + 'static,
{
    Arc::new(move |target: &Instance| {
        let this = target
            .downcast_ref::<T>()
            .ok_or_else(|| Box::new(DiError::type_mismatch::<T>("lifecycle target")) as BoxError)?;
        f(this)
    })
}

// =============================================================================
// Descriptor values
// =============================================================================

/// Where an explicit value comes from
#[derive(Debug, Clone)]
pub enum ValueSource {
    Literal(TypedValue),
    /// Another component, by name
    Reference(String),
}

/// An explicit constructor argument
#[derive(Debug, Clone)]
pub struct ArgumentValue {
    pub source: ValueSource,
    pub type_hint: Option<TypeInfo>,
    pub name: Option<String>,
}

impl ArgumentValue {
    pub fn literal<V: Injectable>(value: V) -> Self {
        Self {
            source: ValueSource::Literal(TypedValue::new(value)),
            type_hint: None,
            name: None,
        }
    }

    pub fn reference(name: impl Into<String>) -> Self {
        Self {
            source: ValueSource::Reference(name.into()),
            type_hint: None,
            name: None,
        }
    }

    pub fn with_type(mut self, ty: TypeInfo) -> Self {
        self.type_hint = Some(ty);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Explicit constructor arguments, by index or generic
#[derive(Debug, Clone, Default)]
pub struct ConstructorArgs {
    pub(crate) indexed: BTreeMap<usize, ArgumentValue>,
    pub(crate) generic: Vec<ArgumentValue>,
}

impl ConstructorArgs {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.indexed.is_empty() && self.generic.is_empty()
    }

    /// Minimum parameter count a candidate needs to accept these arguments
    pub fn min_arg_count(&self) -> usize {
        let count = self.indexed.len() + self.generic.len();
        self.indexed
            .keys()
            .next_back()
            .map_or(count, |highest| count.max(highest + 1))
    }
}

/// An explicit property value
#[derive(Debug, Clone)]
pub struct PropertyValue {
    pub name: String,
    pub source: ValueSource,
}

/// Property autowiring mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AutowireMode {
    #[default]
    No,
    /// Match unsatisfied setters to components of the same name
    ByName,
    /// Match unsatisfied setters to the single component of the setter's type
    ByType,
    /// Autowire constructor parameters
    Constructor,
}

/// Role of a component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Role {
    #[default]
    Application,
    /// Supporting machinery; never intercepted
    Infrastructure,
}

/// How the instance is produced
#[derive(Debug, Clone)]
pub enum Instantiation {
    /// Call a constructor of the type
    Constructor(ComponentType),
    /// Call a static factory method declared on `holder`
    StaticFactory { holder: ComponentType, method: String },
    /// Call a factory method on another component
    InstanceFactory { factory_component: String, method: String },
}

// =============================================================================
// Component descriptor
// =============================================================================

/// How to build and wire one named component
#[derive(Debug, Clone)]
pub struct ComponentDescriptor {
    pub(crate) name: String,
    pub(crate) instantiation: Instantiation,
    pub(crate) scope: Scope,
    pub(crate) depends_on: Vec<String>,
    pub(crate) init_method: Option<String>,
    pub(crate) destroy_method: Option<String>,
    pub(crate) constructor_args: ConstructorArgs,
    pub(crate) properties: Vec<PropertyValue>,
    pub(crate) autowire: AutowireMode,
    pub(crate) lenient_constructor_resolution: Option<bool>,
    pub(crate) non_public_access_allowed: Option<bool>,
    pub(crate) primary: bool,
    pub(crate) autowire_candidate: bool,
    pub(crate) lazy_init: bool,
    pub(crate) role: Role,
    pub(crate) original_instance: bool,
}

impl ComponentDescriptor {
    /// Component built by a constructor of `component_type`
    pub fn builder(name: impl Into<String>, component_type: ComponentType) -> DescriptorBuilder {
        DescriptorBuilder::new(name.into(), Instantiation::Constructor(component_type))
    }

    /// Component built by a static factory method declared on `holder`
    pub fn static_factory(
        name: impl Into<String>,
        holder: ComponentType,
        method: impl Into<String>,
    ) -> DescriptorBuilder {
        DescriptorBuilder::new(
            name.into(),
            Instantiation::StaticFactory {
                holder,
                method: method.into(),
            },
        )
    }

    /// Component built by a factory method of another component
    pub fn instance_factory(
        name: impl Into<String>,
        factory_component: impl Into<String>,
        method: impl Into<String>,
    ) -> DescriptorBuilder {
        DescriptorBuilder::new(
            name.into(),
            Instantiation::InstanceFactory {
                factory_component: factory_component.into(),
                method: method.into(),
            },
        )
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn instantiation(&self) -> &Instantiation {
        &self.instantiation
    }

    #[inline]
    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    #[inline]
    pub fn is_singleton(&self) -> bool {
        self.scope.is_singleton()
    }

    #[inline]
    pub fn is_prototype(&self) -> bool {
        self.scope.is_prototype()
    }

    #[inline]
    pub fn depends_on(&self) -> &[String] {
        &self.depends_on
    }

    #[inline]
    pub fn init_method(&self) -> Option<&str> {
        self.init_method.as_deref()
    }

    #[inline]
    pub fn destroy_method(&self) -> Option<&str> {
        self.destroy_method.as_deref()
    }

    #[inline]
    pub fn constructor_args(&self) -> &ConstructorArgs {
        &self.constructor_args
    }

    #[inline]
    pub fn properties(&self) -> &[PropertyValue] {
        &self.properties
    }

    #[inline]
    pub fn autowire(&self) -> AutowireMode {
        self.autowire
    }

    #[inline]
    pub fn is_primary(&self) -> bool {
        self.primary
    }

    #[inline]
    pub fn is_autowire_candidate(&self) -> bool {
        self.autowire_candidate
    }

    #[inline]
    pub fn is_lazy_init(&self) -> bool {
        self.lazy_init
    }

    #[inline]
    pub fn role(&self) -> Role {
        self.role
    }

    /// Whether this component is the un-intercepted target of another
    pub fn is_original_instance(&self) -> bool {
        self.original_instance || self.name.ends_with(ORIGINAL_INSTANCE_SUFFIX)
    }

    /// Static type table, when known without consulting other components
    pub fn static_type(&self) -> Option<&ComponentType> {
        match &self.instantiation {
            Instantiation::Constructor(ty) => Some(ty),
            Instantiation::StaticFactory { holder, method } => {
                holder.factory_methods_named(method).next().map(FactoryMethod::returns)
            }
            Instantiation::InstanceFactory { .. } => None,
        }
    }
}

/// Builder for [`ComponentDescriptor`]
#[derive(Debug, Clone)]
pub struct DescriptorBuilder {
    descriptor: ComponentDescriptor,
}

impl DescriptorBuilder {
    fn new(name: String, instantiation: Instantiation) -> Self {
        Self {
            descriptor: ComponentDescriptor {
                name,
                instantiation,
                scope: Scope::Singleton,
                depends_on: Vec::new(),
                init_method: None,
                destroy_method: None,
                constructor_args: ConstructorArgs::default(),
                properties: Vec::new(),
                autowire: AutowireMode::No,
                lenient_constructor_resolution: None,
                non_public_access_allowed: None,
                primary: false,
                autowire_candidate: true,
                lazy_init: false,
                role: Role::Application,
                original_instance: false,
            },
        }
    }

    pub fn scope(mut self, scope: Scope) -> Self {
        self.descriptor.scope = scope;
        self
    }

    pub fn prototype(self) -> Self {
        self.scope(Scope::Prototype)
    }

    /// Component that must be created first and destroyed after this one
    pub fn depends_on(mut self, name: impl Into<String>) -> Self {
        self.descriptor.depends_on.push(name.into());
        self
    }

    pub fn init_method(mut self, name: impl Into<String>) -> Self {
        self.descriptor.init_method = Some(name.into());
        self
    }

    pub fn destroy_method(mut self, name: impl Into<String>) -> Self {
        self.descriptor.destroy_method = Some(name.into());
        self
    }

    /// Use `close`, or else `shutdown`, as the destroy method
    pub fn infer_destroy_method(self) -> Self {
        self.destroy_method(INFER_METHOD)
    }

    /// Constructor argument at a fixed position
    pub fn arg(mut self, index: usize, value: ArgumentValue) -> Self {
        self.descriptor.constructor_args.indexed.insert(index, value);
        self
    }

    /// Literal constructor argument at a fixed position
    pub fn arg_value<V: Injectable>(self, index: usize, value: V) -> Self {
        self.arg(index, ArgumentValue::literal(value))
    }

    /// Component reference at a fixed position
    pub fn arg_ref(self, index: usize, component: impl Into<String>) -> Self {
        self.arg(index, ArgumentValue::reference(component))
    }

    /// Constructor argument matched by type or name
    pub fn generic_arg(mut self, value: ArgumentValue) -> Self {
        self.descriptor.constructor_args.generic.push(value);
        self
    }

    pub fn property_value<V: Injectable>(mut self, name: impl Into<String>, value: V) -> Self {
        self.descriptor.properties.push(PropertyValue {
            name: name.into(),
            source: ValueSource::Literal(TypedValue::new(value)),
        });
        self
    }

    pub fn property_ref(mut self, name: impl Into<String>, component: impl Into<String>) -> Self {
        self.descriptor.properties.push(PropertyValue {
            name: name.into(),
            source: ValueSource::Reference(component.into()),
        });
        self
    }

    pub fn autowire(mut self, mode: AutowireMode) -> Self {
        self.descriptor.autowire = mode;
        self
    }

    /// Override the container-wide constructor resolution mode
    pub fn lenient_constructor_resolution(mut self, lenient: bool) -> Self {
        self.descriptor.lenient_constructor_resolution = Some(lenient);
        self
    }

    /// Override whether non-public constructors are candidates
    pub fn non_public_access(mut self, allowed: bool) -> Self {
        self.descriptor.non_public_access_allowed = Some(allowed);
        self
    }

    pub fn primary(mut self) -> Self {
        self.descriptor.primary = true;
        self
    }

    pub fn autowire_candidate(mut self, candidate: bool) -> Self {
        self.descriptor.autowire_candidate = candidate;
        self
    }

    /// Skip during eager warm-up
    pub fn lazy(mut self) -> Self {
        self.descriptor.lazy_init = true;
        self
    }

    pub fn infrastructure(mut self) -> Self {
        self.descriptor.role = Role::Infrastructure;
        self
    }

    /// Mark as the target behind an interceptor; never wrapped itself
    pub fn original_instance(mut self) -> Self {
        self.descriptor.original_instance = true;
        self
    }

    pub fn build(self) -> ComponentDescriptor {
        self.descriptor
    }
}
