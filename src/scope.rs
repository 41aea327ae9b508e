//! Custom named scopes
//!
//! A component whose descriptor names a custom scope is looked up through
//! the [`CustomScope`] registered under that name. [`KeyedScope`] is a
//! map-backed implementation suitable for request- or session-like scopes:
//! create one per unit of work and [`reset`](KeyedScope::reset) it at the end.

use crate::types::Instance;
use crate::Result;
use ahash::RandomState;
use dashmap::DashMap;
use parking_lot::{Mutex, ReentrantMutex};
use std::sync::atomic::{AtomicU64, Ordering};

#[cfg(feature = "logging")]
use tracing::debug;

/// Teardown registered for a scoped instance
pub type DestructionCallback = Box<dyn FnOnce() + Send>;

/// Storage strategy for a named scope
pub trait CustomScope: Send + Sync {
    /// Return the scoped instance for `name`, creating it with `create` if absent
    fn get(&self, name: &str, create: &mut dyn FnMut() -> Result<Instance>) -> Result<Instance>;

    /// Drop the scoped instance for `name` without running its teardown
    fn remove(&self, name: &str) -> Option<Instance>;

    /// Teardown to run when the scope ends (or the instance is removed by the scope)
    fn register_destruction_callback(&self, name: &str, callback: DestructionCallback);

    /// Identifier of the current scope instance, for diagnostics
    fn conversation_id(&self) -> Option<String> {
        None
    }
}

/// Unique scope identifier.
///
/// Each scope gets a unique ID for tracking and debugging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(u64);

impl ScopeId {
    /// Generate a new unique scope ID.
    #[inline]
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    #[inline]
    pub fn id(&self) -> u64 {
        self.0
    }
}

impl Default for ScopeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ScopeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "scope-{}", self.0)
    }
}

/// Map-backed custom scope.
///
/// # Examples
///
/// ```rust
/// use component_injector::{ComponentDescriptor, ComponentType, Container, KeyedScope, Scope};
/// use std::sync::Arc;
///
/// struct RequestContext;
///
/// let container = Container::new();
/// let request = Arc::new(KeyedScope::new());
/// container.register_scope("request", request.clone());
///
/// let ty = ComponentType::builder::<RequestContext>()
///     .constructor(vec![], |_| Ok(RequestContext))
///     .build();
/// container
///     .register(ComponentDescriptor::builder("ctx", ty).scope(Scope::custom("request")).build())
///     .unwrap();
///
/// let a = container.get::<RequestContext>("ctx").unwrap();
/// let b = container.get::<RequestContext>("ctx").unwrap();
/// assert!(Arc::ptr_eq(&a, &b));
///
/// request.reset();
/// let c = container.get::<RequestContext>("ctx").unwrap();
/// assert!(!Arc::ptr_eq(&a, &c));
/// ```
pub struct KeyedScope {
    id: ScopeId,
    instances: DashMap<String, Instance, RandomState>,
    order: Mutex<Vec<String>>,
    callbacks: Mutex<Vec<(String, DestructionCallback)>>,
    creation: ReentrantMutex<()>,
}

impl KeyedScope {
    pub fn new() -> Self {
        let id = ScopeId::new();

        #[cfg(feature = "logging")]
        debug!(target: "component_injector", scope_id = id.id(), "Creating keyed scope");

        Self {
            id,
            instances: DashMap::with_capacity_and_hasher_and_shard_amount(0, RandomState::new(), 8),
            order: Mutex::new(Vec::new()),
            callbacks: Mutex::new(Vec::new()),
            creation: ReentrantMutex::new(()),
        }
    }

    #[inline]
    pub fn id(&self) -> ScopeId {
        self.id
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.instances.contains_key(name)
    }

    /// End the scope: drop every instance and run teardown in reverse creation order.
    ///
    /// Returns the number of instances dropped.
    pub fn reset(&self) -> usize {
        let _guard = self.creation.lock();
        let order = std::mem::take(&mut *self.order.lock());
        let mut callbacks = std::mem::take(&mut *self.callbacks.lock());

        #[cfg(feature = "logging")]
        debug!(
            target: "component_injector",
            scope_id = self.id.id(),
            instances = order.len(),
            "Resetting keyed scope"
        );

        let mut dropped = 0;
        for name in order.iter().rev() {
            if self.instances.remove(name).is_some() {
                dropped += 1;
            }
            if let Some(pos) = callbacks.iter().position(|(n, _)| n == name) {
                let (_, callback) = callbacks.remove(pos);
                callback();
            }
        }
        // callbacks for names that were removed individually
        for (_, callback) in callbacks.into_iter().rev() {
            callback();
        }
        dropped
    }
}

impl Default for KeyedScope {
    fn default() -> Self {
        Self::new()
    }
}

impl CustomScope for KeyedScope {
    fn get(&self, name: &str, create: &mut dyn FnMut() -> Result<Instance>) -> Result<Instance> {
        if let Some(existing) = self.instances.get(name) {
            return Ok(existing.value().clone());
        }

        let _guard = self.creation.lock();
        if let Some(existing) = self.instances.get(name) {
            return Ok(existing.value().clone());
        }
        let created = create()?;
        self.instances.insert(name.to_owned(), created.clone());
        self.order.lock().push(name.to_owned());
        Ok(created)
    }

    fn remove(&self, name: &str) -> Option<Instance> {
        let _guard = self.creation.lock();
        self.order.lock().retain(|n| n != name);
        self.instances.remove(name).map(|(_, v)| v)
    }

    fn register_destruction_callback(&self, name: &str, callback: DestructionCallback) {
        self.callbacks.lock().push((name.to_owned(), callback));
    }

    fn conversation_id(&self) -> Option<String> {
        Some(self.id.to_string())
    }
}
