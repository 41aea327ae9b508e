//! Container lifecycle and ordered destruction
//!
//! Teardown walks the disposable singletons in reverse registration order,
//! destroying every recorded dependent of a component before the component
//! itself. A failing destroy callback is logged and recorded; it never stops
//! the rest of the teardown.

use crate::descriptor::{ComponentDescriptor, ComponentType, INFER_METHOD, MethodFn};
use crate::graph::DependencyGraph;
use crate::intercept::PostProcessor;
use crate::registry::SingletonRegistry;
use crate::types::Instance;
use crate::{DiError, Result};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

#[cfg(feature = "logging")]
use tracing::{debug, warn};

/// Container state machine: `Active` → `Destroying` → `Destroyed`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ContainerState {
    Active = 0,
    Destroying = 1,
    /// Terminal
    Destroyed = 2,
}

impl ContainerState {
    pub(crate) fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Active,
            1 => Self::Destroying,
            _ => Self::Destroyed,
        }
    }
}

impl fmt::Display for ContainerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => f.write_str("active"),
            Self::Destroying => f.write_str("destroying"),
            Self::Destroyed => f.write_str("destroyed"),
        }
    }
}

/// Everything needed to tear down one instance
pub struct DestructibleHandle {
    name: String,
    instance: Instance,
    disposer: Option<MethodFn>,
    destroy_method: Option<(String, MethodFn)>,
    processors: Vec<Arc<dyn PostProcessor>>,
}

impl DestructibleHandle {
    /// Build a handle when the instance needs any teardown, `None` otherwise.
    ///
    /// Fails when the descriptor names a destroy method the type lacks.
    pub(crate) fn for_component(
        name: &str,
        instance: Instance,
        ty: &ComponentType,
        descriptor: &ComponentDescriptor,
        processors: &[Arc<dyn PostProcessor>],
    ) -> Result<Option<Self>> {
        let destroy_method = match descriptor.destroy_method() {
            None => None,
            Some(INFER_METHOD) => ["close", "shutdown"]
                .into_iter()
                .find_map(|m| ty.method(m).map(|f| (m.to_owned(), Arc::clone(f)))),
            Some(method) => match ty.method(method) {
                Some(f) => Some((method.to_owned(), Arc::clone(f))),
                None => {
                    return Err(DiError::invalid(
                        name,
                        format!("could not find a destroy method named '{method}'"),
                    ));
                }
            },
        };
        let processors: Vec<_> = processors
            .iter()
            .filter(|p| p.requires_destruction(name, &instance))
            .cloned()
            .collect();
        let disposer = ty.disposer().cloned();

        if disposer.is_none() && destroy_method.is_none() && processors.is_empty() {
            return Ok(None);
        }
        Ok(Some(Self {
            name: name.to_owned(),
            instance,
            disposer,
            destroy_method,
            processors,
        }))
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run every teardown step; each step is attempted even if an earlier one failed
    pub fn destroy(&self) -> Result<()> {
        let mut first_error = None;

        for processor in &self.processors {
            if let Err(e) = processor.before_destruction(&self.name, &self.instance) {
                first_error.get_or_insert(DiError::destruction_failed(
                    &self.name,
                    "post-processor before destruction",
                    e,
                ));
            }
        }
        if let Some(disposer) = &self.disposer {
            if let Err(e) = disposer(&self.instance) {
                first_error.get_or_insert(DiError::destruction_failed(&self.name, "disposer", e));
            }
        }
        if let Some((method, f)) = &self.destroy_method {
            if let Err(e) = f(&self.instance) {
                first_error.get_or_insert(DiError::destruction_failed(
                    &self.name,
                    format!("destroy method '{method}'"),
                    e,
                ));
            }
        }

        first_error.map_or(Ok(()), Err)
    }
}

impl fmt::Debug for DestructibleHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DestructibleHandle")
            .field("name", &self.name)
            .field("disposer", &self.disposer.is_some())
            .field("destroy_method", &self.destroy_method.as_ref().map(|(m, _)| m))
            .field("processors", &self.processors.len())
            .finish()
    }
}

/// Outcome of a teardown
#[derive(Debug, Default, Clone)]
pub struct DestructionReport {
    /// Components whose teardown ran cleanly, in destruction order
    pub destroyed: Vec<String>,
    /// Components whose teardown failed, in destruction order
    pub failures: Vec<(String, DiError)>,
}

impl DestructionReport {
    #[inline]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Every component whose teardown was attempted, in order
    pub fn attempted(&self) -> usize {
        self.destroyed.len() + self.failures.len()
    }
}

/// Ordered set of disposable singletons plus the teardown algorithm
#[derive(Default)]
pub(crate) struct LifecycleCoordinator {
    disposables: Mutex<Vec<(String, Arc<DestructibleHandle>)>>,
}

impl LifecycleCoordinator {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Register (or replace in place) the handle for a singleton
    pub(crate) fn register(&self, handle: DestructibleHandle) {
        let mut list = self.disposables.lock();
        let name = handle.name.clone();
        let handle = Arc::new(handle);
        match list.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = handle,
            None => list.push((name, handle)),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.disposables.lock().len()
    }

    fn take(&self, name: &str) -> Option<Arc<DestructibleHandle>> {
        let mut list = self.disposables.lock();
        let pos = list.iter().position(|(n, _)| n == name)?;
        Some(list.remove(pos).1)
    }

    /// Tear down every singleton, then clear the registry and the graph
    pub(crate) fn destroy_all(&self, registry: &SingletonRegistry, graph: &DependencyGraph) -> DestructionReport {
        let mut report = DestructionReport::default();
        if registry.state() != ContainerState::Active {
            return report;
        }

        #[cfg(feature = "logging")]
        debug!(
            target: "component_injector",
            disposables = self.len(),
            "Destroying singletons"
        );

        registry.set_state(ContainerState::Destroying);

        let names: Vec<String> = self.disposables.lock().iter().map(|(n, _)| n.clone()).collect();
        for name in names.iter().rev() {
            self.destroy_singleton(name, registry, graph, &mut report);
        }

        graph.clear();
        registry.clear();
        registry.set_state(ContainerState::Destroyed);

        #[cfg(feature = "logging")]
        debug!(
            target: "component_injector",
            destroyed = report.destroyed.len(),
            failed = report.failures.len(),
            "Container destroyed"
        );

        report
    }

    /// Evict one singleton and destroy it, dependents first
    pub(crate) fn destroy_singleton(
        &self,
        name: &str,
        registry: &SingletonRegistry,
        graph: &DependencyGraph,
        report: &mut DestructionReport,
    ) {
        registry.remove(name);
        let handle = self.take(name);
        self.destroy_component(name, handle, registry, graph, report);
    }

    fn destroy_component(
        &self,
        name: &str,
        handle: Option<Arc<DestructibleHandle>>,
        registry: &SingletonRegistry,
        graph: &DependencyGraph,
        report: &mut DestructionReport,
    ) {
        for dependent in graph.take_dependents(name) {
            self.destroy_singleton(&dependent, registry, graph, report);
        }

        if let Some(handle) = handle {
            #[cfg(feature = "logging")]
            debug!(target: "component_injector", component = name, "Invoking destroy callbacks");

            match handle.destroy() {
                Ok(()) => report.destroyed.push(name.to_owned()),
                Err(err) => {
                    #[cfg(feature = "logging")]
                    warn!(
                        target: "component_injector",
                        component = name,
                        error = %err,
                        "Destroy callback failed"
                    );
                    report.failures.push((name.to_owned(), err));
                }
            }
        }

        graph.remove_from_all(name);
    }
}

/// Run a handle outside the coordinator (prototypes, custom scopes), logging failures
pub(crate) fn destroy_detached(handle: &DestructibleHandle) -> Result<()> {
    let result = handle.destroy();
    #[cfg(feature = "logging")]
    if let Err(err) = &result {
        warn!(
            target: "component_injector",
            component = handle.name(),
            error = %err,
            "Destroy callback failed"
        );
    }
    result
}
