#![no_main]

//! Fuzz target for creation and destruction ordering
//!
//! Interleaves registration, lookup, single-singleton destruction and full
//! shutdown. Every destroy callback must run at most once per instance, and
//! within one `destroy_all` a dependent must be destroyed before anything it
//! depends on (unless the two form a cycle).

use arbitrary::Arbitrary;
use component_injector::{ComponentDescriptor, ComponentType, Container, ContainerState};
use libfuzzer_sys::fuzz_target;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;

const MAX_NODES: u8 = 6;

struct Resource;

#[derive(Debug, Arbitrary)]
enum LifecycleOp {
    Register { id: u8, depends_on: Vec<u8>, lazy: bool },
    Lookup(u8),
    PreInstantiate,
    DestroySingleton(u8),
    DestroyAll,
}

fn name(id: u8) -> String {
    format!("r{}", id % MAX_NODES)
}

fn resource_type(label: String, log: Arc<Mutex<Vec<String>>>) -> ComponentType {
    ComponentType::builder::<Resource>()
        .constructor(vec![], |_| Ok(Resource))
        .disposer(move |_| {
            log.lock().push(label.clone());
            Ok(())
        })
        .build()
}

fuzz_target!(|ops: Vec<LifecycleOp>| {
    let container = Container::new();
    let log = Arc::new(Mutex::new(Vec::new()));

    for op in ops.into_iter().take(64) {
        match op {
            LifecycleOp::Register { id, depends_on, lazy } => {
                let label = name(id);
                let mut builder =
                    ComponentDescriptor::builder(label.clone(), resource_type(label, Arc::clone(&log)));
                for dependency in depends_on.into_iter().take(3) {
                    builder = builder.depends_on(name(dependency));
                }
                if lazy {
                    builder = builder.lazy();
                }
                let _ = container.register(builder.build());
            }
            LifecycleOp::Lookup(id) => {
                let _ = container.lookup(&name(id));
            }
            LifecycleOp::PreInstantiate => {
                let _ = container.pre_instantiate_singletons();
            }
            LifecycleOp::DestroySingleton(id) => {
                log.lock().clear();
                let report = container.destroy_singleton(&name(id));
                let logged = log.lock().clone();
                assert!(logged.len() <= report.attempted());
            }
            LifecycleOp::DestroyAll => {
                let live = container.singleton_names();
                // (dependency, dependent) pairs outside any cycle
                let edges: Vec<(String, String)> = live
                    .iter()
                    .flat_map(|n| container.dependents_of(n).into_iter().map(move |d| (n.clone(), d)))
                    .filter(|(dependency, dependent)| !container.is_dependent(dependent, dependency))
                    .collect();

                log.lock().clear();
                let report = container.destroy_all();
                let logged = log.lock().clone();

                let unique: HashSet<&String> = logged.iter().collect();
                assert_eq!(unique.len(), logged.len(), "destroyed twice: {logged:?}");
                assert_eq!(container.singleton_count(), 0);
                assert_eq!(container.state(), ContainerState::Destroyed);
                assert!(report.failures.is_empty());

                let position = |n: &String| logged.iter().position(|l| l == n);
                for (dependency, dependent) in &edges {
                    if let (Some(a), Some(b)) = (position(dependent), position(dependency)) {
                        assert!(a < b, "{dependent} must be destroyed before {dependency}");
                    }
                }
            }
        }
    }
});
