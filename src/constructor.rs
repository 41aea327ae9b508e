//! Constructor and factory-method selection
//!
//! Candidates are sorted by descending parameter count, then public before
//! non-public, then declaration order. Each candidate's parameters are bound
//! from explicit arguments or by dependency lookup, the bound candidates are
//! weighed by type difference, and the lightest one wins. The chosen
//! executable and the shape of its arguments are cached per component, so
//! repeated creations (prototypes, custom scopes) only re-resolve the
//! autowired and referenced positions.

use crate::container::{Container, ResolvedDependency};
use crate::descriptor::{
    ArgValue, Args, AutowireMode, ComponentDescriptor, ComponentType, Constructor, ConstructorFn,
    FactoryMethodFn, Instantiation, ParamKind, Parameter, ValueSource,
};
use crate::error::AmbiguityKind;
use crate::types::{Instance, MAX_WEIGHT, TypeInfo, TypedValue, assignability_weight, lenient_weight};
use crate::{DiError, Result};
use std::collections::BTreeMap;

#[cfg(feature = "logging")]
use tracing::{debug, trace};

/// What a candidate invokes
#[derive(Clone)]
enum Invocation {
    Constructor(ConstructorFn),
    FactoryMethod(FactoryMethodFn),
}

/// A constructor or factory method under consideration
#[derive(Clone)]
pub(crate) struct Executable {
    label: String,
    params: Vec<Parameter>,
    public: bool,
    product: ComponentType,
    invocation: Invocation,
}

impl Executable {
    fn from_constructor(ty: &ComponentType, ctor: &Constructor) -> Self {
        Self {
            label: signature(ty.name(), ctor.params()),
            params: ctor.params.clone(),
            public: ctor.public,
            product: ty.clone(),
            invocation: Invocation::Constructor(ctor.call.clone()),
        }
    }

    fn kind(&self) -> AmbiguityKind {
        match self.invocation {
            Invocation::Constructor(_) => AmbiguityKind::Constructor,
            Invocation::FactoryMethod(_) => AmbiguityKind::FactoryMethod,
        }
    }

    fn invoke(&self, name: &str, receiver: Option<&Instance>, args: Vec<ArgValue>) -> Result<Instance> {
        let args = Args::new(name, args);
        match &self.invocation {
            Invocation::Constructor(call) => call(&args).map_err(|e| {
                DiError::creation_caused_by(name, format!("Instantiation via constructor {} failed", self.label), e)
            }),
            Invocation::FactoryMethod(call) => call(receiver, &args).map_err(|e| {
                DiError::creation_caused_by(name, format!("Instantiation via factory method {} failed", self.label), e)
            }),
        }
    }
}

fn signature(owner: &str, params: &[Parameter]) -> String {
    let params: Vec<_> = params.iter().map(|p| p.ty().name()).collect();
    format!("{owner}({})", params.join(", "))
}

/// Cached form of one bound argument
#[derive(Clone)]
enum PreparedArg {
    /// Literal, already converted
    Value(ArgValue),
    /// Explicit component reference; looked up again
    Reference(String),
    /// Dependency lookup; resolved again
    Autowired,
}

/// Cached outcome of a resolution
#[derive(Clone)]
pub(crate) struct ResolvedExecutable {
    executable: Executable,
    prepared: Vec<PreparedArg>,
}

/// Arguments bound to one candidate
struct ArgumentsHolder {
    arguments: Vec<ArgValue>,
    arg_types: Vec<Option<TypeInfo>>,
    raw_types: Vec<Option<TypeInfo>>,
    prepared: Vec<PreparedArg>,
    autowired_names: Vec<String>,
}

impl ArgumentsHolder {
    fn with_capacity(n: usize) -> Self {
        Self {
            arguments: Vec::with_capacity(n),
            arg_types: Vec::with_capacity(n),
            raw_types: Vec::with_capacity(n),
            prepared: Vec::with_capacity(n),
            autowired_names: Vec::new(),
        }
    }

    fn weight(&self, params: &[Parameter], lenient: bool) -> i32 {
        let types: Vec<TypeInfo> = params.iter().map(|p| p.ty().clone()).collect();
        if lenient {
            lenient_weight(&types, &self.arg_types, &self.raw_types)
        } else {
            assignability_weight(&types, &self.arg_types, &self.raw_types)
        }
    }
}

/// An explicit constructor argument with references already resolved
struct ResolvedArg {
    value: TypedValue,
    type_hint: Option<TypeInfo>,
    name: Option<String>,
    reference: Option<String>,
}

#[derive(Default)]
struct ResolvedArgs {
    indexed: BTreeMap<usize, ResolvedArg>,
    generic: Vec<ResolvedArg>,
}

impl ResolvedArgs {
    fn count(&self) -> usize {
        self.indexed.len() + self.generic.len()
    }

    /// Explicit value for parameter `index`, matched by position, then by type or name
    fn value_for(
        &self,
        index: usize,
        param: &Parameter,
        used: &mut [bool],
        autowiring: bool,
        param_count: usize,
    ) -> Option<&ResolvedArg> {
        if let Some(arg) = self.indexed.get(&index) {
            let type_ok = arg.type_hint.as_ref().is_none_or(|t| t == param.ty());
            let name_ok = arg.name.as_deref().is_none_or(|n| param.name() == Some(n));
            if type_ok && name_ok {
                return Some(arg);
            }
        }
        for (i, arg) in self.generic.iter().enumerate() {
            if used[i] {
                continue;
            }
            if arg.name.as_deref().is_some_and(|n| param.name() != Some(n)) {
                continue;
            }
            if arg.type_hint.as_ref().is_some_and(|t| t != param.ty()) {
                continue;
            }
            if arg.type_hint.is_none() && arg.name.is_none() && !arg.value.ty().is_assignable_to(param.ty()) {
                continue;
            }
            used[i] = true;
            return Some(arg);
        }
        // untyped fallback: may still match after conversion
        if !autowiring || param_count == self.count() {
            if let Some(i) = used.iter().position(|u| !u) {
                used[i] = true;
                return self.generic.get(i);
            }
        }
        None
    }
}

/// Picks and invokes the constructor or factory method for a component
pub(crate) struct ConstructorResolver<'a> {
    container: &'a Container,
}

impl<'a> ConstructorResolver<'a> {
    pub(crate) fn new(container: &'a Container) -> Self {
        Self { container }
    }

    fn lenient(&self, desc: &ComponentDescriptor) -> bool {
        desc.lenient_constructor_resolution
            .unwrap_or(self.container.core.config.lenient_constructor_resolution)
    }

    fn non_public_allowed(&self, desc: &ComponentDescriptor) -> bool {
        desc.non_public_access_allowed
            .unwrap_or(self.container.core.config.non_public_access_allowed)
    }

    fn cached(&self, name: &str) -> Option<ResolvedExecutable> {
        self.container.core.resolved.get(name).map(|r| r.value().clone())
    }

    fn store(&self, name: &str, executable: Executable, prepared: Vec<PreparedArg>) {
        self.container
            .core
            .resolved
            .insert(name.to_owned(), ResolvedExecutable { executable, prepared });
    }

    /// Instantiate through a constructor, choosing among `chosen` or all
    /// eligible constructors of `ty`.
    pub(crate) fn autowire_constructor(
        &self,
        name: &str,
        desc: &ComponentDescriptor,
        ty: &ComponentType,
        chosen: Option<Vec<Constructor>>,
        explicit: Option<&[TypedValue]>,
    ) -> Result<(Instance, ComponentType)> {
        if explicit.is_none() {
            if let Some(cached) = self.cached(name) {
                return self.instantiate_cached(name, &cached, None);
            }
        }

        let autowiring = chosen.is_some() || desc.autowire() == AutowireMode::Constructor;
        let non_public = self.non_public_allowed(desc);
        let candidates: Vec<Executable> = match &chosen {
            Some(ctors) => ctors.iter().map(|c| Executable::from_constructor(ty, c)).collect(),
            None => ty
                .constructors()
                .iter()
                .filter(|c| non_public || c.is_public())
                .map(|c| Executable::from_constructor(ty, c))
                .collect(),
        };
        if candidates.is_empty() {
            return Err(DiError::invalid(
                name,
                format!("no accessible constructor declared on {}", ty.name()),
            ));
        }

        let instance = self.select_and_invoke(name, desc, candidates, None, explicit, autowiring)?;
        Ok((instance, ty.clone()))
    }

    /// Instantiate through a static or instance factory method
    pub(crate) fn instantiate_using_factory_method(
        &self,
        name: &str,
        desc: &ComponentDescriptor,
        explicit: Option<&[TypedValue]>,
    ) -> Result<(Instance, ComponentType)> {
        let (holder, receiver, is_static, method) = match desc.instantiation() {
            Instantiation::StaticFactory { holder, method } => (holder.clone(), None, true, method.as_str()),
            Instantiation::InstanceFactory { factory_component, method } => {
                if factory_component == name {
                    return Err(DiError::invalid(
                        name,
                        "factory component reference points back to the same definition",
                    ));
                }
                let receiver = self.container.lookup(factory_component)?;
                self.container.core.graph.register_dependent(factory_component, name);
                let holder = self.container.component_type_of(factory_component).ok_or_else(|| {
                    DiError::invalid(
                        name,
                        format!("type of factory component '{factory_component}' is unknown"),
                    )
                })?;
                (holder, Some(receiver), false, method.as_str())
            }
            Instantiation::Constructor(_) => {
                return Err(DiError::Internal(format!("'{name}' is not built by a factory method")));
            }
        };

        if explicit.is_none() {
            if let Some(cached) = self.cached(name) {
                return self.instantiate_cached(name, &cached, receiver.as_ref());
            }
        }

        let non_public = self.non_public_allowed(desc);
        let candidates: Vec<Executable> = holder
            .factory_methods_named(method)
            .filter(|m| m.is_static == is_static && (non_public || m.public))
            .map(|m| Executable {
                label: signature(&format!("{}::{}", holder.name(), m.name), m.params()),
                params: m.params.clone(),
                public: m.public,
                product: m.returns.clone(),
                invocation: Invocation::FactoryMethod(m.call.clone()),
            })
            .collect();
        if candidates.is_empty() {
            return Err(DiError::invalid(
                name,
                format!(
                    "No matching factory method found: {} factory method '{method}()' on {}",
                    if is_static { "static" } else { "instance" },
                    holder.name()
                ),
            ));
        }

        // factory method parameters are always candidates for autowiring
        let instance = self.select_and_invoke(name, desc, candidates.clone(), receiver.as_ref(), explicit, true)?;
        let product = self
            .cached(name)
            .map(|c| c.executable.product)
            .unwrap_or_else(|| candidates[0].product.clone());
        Ok((instance, product))
    }

    fn instantiate_cached(
        &self,
        name: &str,
        cached: &ResolvedExecutable,
        receiver: Option<&Instance>,
    ) -> Result<(Instance, ComponentType)> {
        #[cfg(feature = "logging")]
        trace!(
            target: "component_injector",
            component = name,
            executable = %cached.executable.label,
            "Using cached constructor resolution"
        );

        let mut args = Vec::with_capacity(cached.prepared.len());
        for (index, (prepared, param)) in cached.prepared.iter().zip(&cached.executable.params).enumerate() {
            let value = match prepared {
                PreparedArg::Value(v) => v.clone(),
                PreparedArg::Reference(target) => {
                    let inst = self.container.lookup(target)?;
                    self.container.core.graph.register_dependent(target, name);
                    ArgValue::Single(inst)
                }
                PreparedArg::Autowired => {
                    let resolved = self
                        .container
                        .resolve_dependency(name, param, true)
                        .map_err(|e| injection_error(name, index, &cached.executable, e))?;
                    for dep in &resolved.names {
                        self.container.core.graph.register_dependent(dep, name);
                    }
                    resolved.value
                }
            };
            args.push(value);
        }
        let instance = cached.executable.invoke(name, receiver, args)?;
        Ok((instance, cached.executable.product.clone()))
    }

    /// Resolve references among the explicit constructor arguments
    fn resolve_constructor_arguments(&self, name: &str, desc: &ComponentDescriptor) -> Result<ResolvedArgs> {
        let mut resolved = ResolvedArgs::default();
        let resolve = |arg: &crate::descriptor::ArgumentValue| -> Result<ResolvedArg> {
            let (value, reference) = match &arg.source {
                ValueSource::Literal(v) => (v.clone(), None),
                ValueSource::Reference(target) => {
                    let inst = self.container.lookup(target)?;
                    self.container.core.graph.register_dependent(target, name);
                    let ty = self
                        .container
                        .type_of(target)
                        .unwrap_or_else(|| TypeInfo::of::<Instance>());
                    (TypedValue::with_type(inst, ty), Some(target.clone()))
                }
            };
            Ok(ResolvedArg {
                value,
                type_hint: arg.type_hint.clone(),
                name: arg.name.clone(),
                reference,
            })
        };
        for (index, arg) in &desc.constructor_args().indexed {
            resolved.indexed.insert(*index, resolve(arg)?);
        }
        for arg in &desc.constructor_args().generic {
            resolved.generic.push(resolve(arg)?);
        }
        Ok(resolved)
    }

    fn select_and_invoke(
        &self,
        name: &str,
        desc: &ComponentDescriptor,
        mut candidates: Vec<Executable>,
        receiver: Option<&Instance>,
        explicit: Option<&[TypedValue]>,
        autowiring: bool,
    ) -> Result<Instance> {
        // single no-arg candidate: nothing to choose
        if candidates.len() == 1
            && explicit.is_none()
            && desc.constructor_args().is_empty()
            && candidates[0].params.is_empty()
        {
            let only = candidates.remove(0);
            self.store(name, only.clone(), Vec::new());
            return only.invoke(name, receiver, Vec::new());
        }

        let (min_args, resolved) = match explicit {
            Some(args) => (args.len(), None),
            None => (
                desc.constructor_args().min_arg_count(),
                Some(self.resolve_constructor_arguments(name, desc)?),
            ),
        };

        // stable: declaration order breaks remaining ties
        candidates.sort_by(|a, b| b.params.len().cmp(&a.params.len()).then(b.public.cmp(&a.public)));

        let lenient = self.lenient(desc);
        let fallback = candidates.len() == 1;
        let mut best: Option<(Executable, ArgumentsHolder)> = None;
        let mut min_weight = MAX_WEIGHT;
        let mut ambiguous: Vec<String> = Vec::new();
        let mut causes: Vec<DiError> = Vec::new();

        for candidate in candidates {
            let count = candidate.params.len();
            if best.as_ref().is_some_and(|(_, h)| h.arguments.len() > count) {
                break;
            }
            if count < min_args {
                continue;
            }

            let holder = match explicit {
                Some(values) => {
                    if values.len() != count {
                        continue;
                    }
                    explicit_holder(values)
                }
                None => {
                    let resolved = resolved.as_ref();
                    match self.create_argument_array(name, &candidate, resolved, autowiring, fallback) {
                        Ok(holder) => holder,
                        Err(err @ DiError::UnsatisfiedDependency { .. }) => {
                            #[cfg(feature = "logging")]
                            trace!(
                                target: "component_injector",
                                component = name,
                                candidate = %candidate.label,
                                error = %err,
                                "Ignoring candidate"
                            );
                            causes.push(err);
                            continue;
                        }
                        Err(err) => return Err(err),
                    }
                }
            };

            let weight = holder.weight(&candidate.params, lenient);
            if weight < min_weight {
                min_weight = weight;
                ambiguous.clear();
                best = Some((candidate, holder));
            } else if let Some((current, _)) = &best {
                let counts_as_tie = weight == min_weight
                    && (current.kind() == AmbiguityKind::Constructor
                        || current.params.len() == candidate.params.len());
                if counts_as_tie {
                    if ambiguous.is_empty() {
                        ambiguous.push(current.label.clone());
                    }
                    ambiguous.push(candidate.label.clone());
                }
            }
        }

        let Some((executable, holder)) = best else {
            if let Some(last) = causes.pop() {
                return Err(last.with_related(causes));
            }
            return Err(DiError::creation_failed(
                name,
                "Could not resolve matching constructor or factory method \
                 (hint: specify index/type/name arguments for simple parameters to avoid type ambiguities)",
            ));
        };

        if !ambiguous.is_empty() {
            if !lenient {
                return Err(DiError::Ambiguous {
                    name: name.to_owned(),
                    kind: executable.kind(),
                    candidates: ambiguous,
                });
            }
            #[cfg(feature = "logging")]
            debug!(
                target: "component_injector",
                component = name,
                chosen = %executable.label,
                tied = ambiguous.len(),
                "Equal-weight candidates under lenient resolution, using the first"
            );
        }

        for dep in &holder.autowired_names {
            self.container.core.graph.register_dependent(dep, name);

            #[cfg(feature = "logging")]
            debug!(
                target: "component_injector",
                component = name,
                dependency = %dep,
                executable = %executable.label,
                "Autowired argument"
            );
        }

        if explicit.is_none() {
            self.store(name, executable.clone(), holder.prepared);
        }
        executable.invoke(name, receiver, holder.arguments)
    }

    fn create_argument_array(
        &self,
        name: &str,
        executable: &Executable,
        resolved: Option<&ResolvedArgs>,
        autowiring: bool,
        fallback: bool,
    ) -> Result<ArgumentsHolder> {
        let count = executable.params.len();
        let mut holder = ArgumentsHolder::with_capacity(count);
        let mut used = vec![false; resolved.map_or(0, |r| r.generic.len())];
        let converter = self.container.converter();

        for (index, param) in executable.params.iter().enumerate() {
            let explicit = resolved.and_then(|r| r.value_for(index, param, &mut used, autowiring, count));

            if let Some(arg) = explicit {
                let converted = if param.is_collection() {
                    arg.value.ty().is_assignable_to(param.ty()).then(|| arg.value.clone())
                } else {
                    converter.convert(&arg.value, param.ty())
                };
                let Some(converted) = converted else {
                    return Err(DiError::unsatisfied(
                        name,
                        injection_point(index, executable),
                        format!(
                            "Could not convert argument value of type [{}] to required type [{}]",
                            arg.value.ty(),
                            param.ty()
                        ),
                        None,
                    ));
                };
                let value = match param.kind() {
                    ParamKind::List => ArgValue::List(vec![converted.value().clone()]),
                    _ => ArgValue::Single(converted.value().clone()),
                };
                holder.prepared.push(match &arg.reference {
                    Some(target) => PreparedArg::Reference(target.clone()),
                    None => PreparedArg::Value(value.clone()),
                });
                holder.arguments.push(value);
                holder.arg_types.push(Some(converted.ty().clone()));
                holder.raw_types.push(Some(arg.value.ty().clone()));
                continue;
            }

            if !autowiring {
                return Err(DiError::unsatisfied(
                    name,
                    injection_point(index, executable),
                    format!(
                        "Ambiguous argument values for parameter of type [{}] - \
                         did you specify the correct component references as arguments?",
                        param.ty()
                    ),
                    None,
                ));
            }

            let ResolvedDependency { value, ty, names } = self
                .container
                .resolve_dependency(name, param, fallback)
                .map_err(|e| injection_error(name, index, executable, e))?;
            holder.arguments.push(value);
            holder.arg_types.push(ty.clone());
            holder.raw_types.push(ty);
            holder.prepared.push(PreparedArg::Autowired);
            for dep in names {
                if !holder.autowired_names.contains(&dep) {
                    holder.autowired_names.push(dep);
                }
            }
        }
        Ok(holder)
    }
}

fn explicit_holder(values: &[TypedValue]) -> ArgumentsHolder {
    let mut holder = ArgumentsHolder::with_capacity(values.len());
    for v in values {
        holder.arguments.push(ArgValue::Single(v.value().clone()));
        holder.arg_types.push(Some(v.ty().clone()));
        holder.raw_types.push(Some(v.ty().clone()));
    }
    holder
}

fn injection_point(index: usize, executable: &Executable) -> String {
    format!("parameter {index} of {}", executable.label)
}

/// Wrap a dependency lookup failure; ambiguity and fatal creation errors pass through
fn injection_error(name: &str, index: usize, executable: &Executable, err: DiError) -> DiError {
    let skippable = err.is_recoverable() || matches!(err, DiError::CurrentlyInCreation { .. });
    if !skippable {
        return err;
    }
    let reason = err.to_string();
    DiError::unsatisfied(name, injection_point(index, executable), reason, Some(err))
}
