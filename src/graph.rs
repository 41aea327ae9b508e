//! Dependency edges recorded during wiring
//!
//! Two inverse multimaps, each behind its own lock: "X is depended on by"
//! and "X depends on". Teardown walks them dependents first. Creation reads
//! them twice: to reject circular depends-on declarations and to refuse
//! wrapping a singleton whose raw instance was already injected elsewhere.

use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};

#[cfg(feature = "logging")]
use tracing::debug;

#[derive(Default)]
pub(crate) struct DependencyGraph {
    /// dependency → components depending on it, in discovery order
    dependents: Mutex<HashMap<String, Vec<String>>>,
    /// component → its dependencies, in discovery order
    dependencies: Mutex<HashMap<String, Vec<String>>>,
}

fn push_unique(list: &mut Vec<String>, name: &str) -> bool {
    if list.iter().any(|n| n == name) {
        false
    } else {
        list.push(name.to_owned());
        true
    }
}

impl DependencyGraph {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Record that `dependent` depends on `dependency`
    pub(crate) fn register_dependent(&self, dependency: &str, dependent: &str) {
        let added = {
            let mut map = self.dependents.lock();
            push_unique(map.entry(dependency.to_owned()).or_default(), dependent)
        };
        if !added {
            return;
        }
        let mut map = self.dependencies.lock();
        push_unique(map.entry(dependent.to_owned()).or_default(), dependency);

        #[cfg(feature = "logging")]
        debug!(
            target: "component_injector",
            component = dependent,
            dependency = dependency,
            "Recorded dependency edge"
        );
    }

    /// Components that depend on `name`
    pub(crate) fn dependents_of(&self, name: &str) -> Vec<String> {
        self.dependents.lock().get(name).cloned().unwrap_or_default()
    }

    /// Components `name` depends on
    pub(crate) fn dependencies_of(&self, name: &str) -> Vec<String> {
        self.dependencies.lock().get(name).cloned().unwrap_or_default()
    }

    pub(crate) fn has_dependents(&self, name: &str) -> bool {
        self.dependents.lock().get(name).is_some_and(|d| !d.is_empty())
    }

    /// Whether `dependent` depends on `name`, directly or transitively
    pub(crate) fn is_dependent(&self, name: &str, dependent: &str) -> bool {
        let map = self.dependents.lock();
        let mut seen = HashSet::new();
        is_dependent_in(&map, name, dependent, &mut seen)
    }

    /// Remove and return the dependents of `name`
    pub(crate) fn take_dependents(&self, name: &str) -> Vec<String> {
        self.dependents.lock().remove(name).unwrap_or_default()
    }

    /// Forget `name` as a dependent everywhere and drop its own dependency list
    pub(crate) fn remove_from_all(&self, name: &str) {
        {
            let mut map = self.dependents.lock();
            map.retain(|_, list| {
                list.retain(|n| n != name);
                !list.is_empty()
            });
        }
        self.dependencies.lock().remove(name);
    }

    pub(crate) fn clear(&self) {
        self.dependents.lock().clear();
        self.dependencies.lock().clear();
    }
}

fn is_dependent_in(
    map: &HashMap<String, Vec<String>>,
    name: &str,
    dependent: &str,
    seen: &mut HashSet<String>,
) -> bool {
    if !seen.insert(name.to_owned()) {
        return false;
    }
    let Some(direct) = map.get(name) else {
        return false;
    };
    if direct.iter().any(|d| d == dependent) {
        return true;
    }
    direct.iter().any(|d| is_dependent_in(map, d, dependent, seen))
}
