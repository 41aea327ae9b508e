#![no_main]

//! Fuzz target for resolution over arbitrary component graphs
//!
//! Builds up to eight components wired through constructor references and
//! setter references (cycles included) and resolves them in random order.
//! Resolution may fail, but it must never panic or leave a name marked as
//! in creation, and a singleton must keep its identity once created.

use arbitrary::Arbitrary;
use component_injector::{ComponentDescriptor, ComponentType, Container, ContainerConfig, Parameter};
use libfuzzer_sys::fuzz_target;
use parking_lot::Mutex;
use std::sync::Arc;

const MAX_NODES: usize = 8;

struct Node {
    peers: Mutex<Vec<Arc<Node>>>,
}

#[derive(Debug, Arbitrary)]
struct NodeShape {
    prototype: bool,
    constructor_refs: Vec<u8>,
    setter_refs: Vec<u8>,
}

#[derive(Debug, Arbitrary)]
struct Input {
    allow_circular_references: bool,
    defer_cyclic_property_injection: bool,
    lenient: bool,
    nodes: Vec<NodeShape>,
    lookups: Vec<u8>,
}

fn node_name(i: usize) -> String {
    format!("n{i}")
}

fn node_type(arity: usize) -> ComponentType {
    let mut builder = ComponentType::builder::<Node>().constructor(vec![Parameter::of::<Node>(); arity], move |args| {
        let mut peers = Vec::with_capacity(arity);
        for i in 0..arity {
            peers.push(args.get::<Node>(i)?);
        }
        Ok(Node {
            peers: Mutex::new(peers),
        })
    });
    for i in 0..MAX_NODES {
        builder = builder.property::<Node, _>(format!("p{i}"), |node, peer| {
            node.peers.lock().push(peer);
            Ok(())
        });
    }
    builder.build()
}

fuzz_target!(|input: Input| {
    let config = ContainerConfig::default()
        .with_allow_circular_references(input.allow_circular_references)
        .with_defer_cyclic_property_injection(input.defer_cyclic_property_injection)
        .with_lenient_constructor_resolution(input.lenient);
    let container = Container::with_config(config);

    let count = input.nodes.len().min(MAX_NODES);
    for (i, shape) in input.nodes.iter().take(count).enumerate() {
        let constructor_refs: Vec<usize> = shape.constructor_refs.iter().take(4).map(|r| *r as usize % count).collect();
        let mut builder = ComponentDescriptor::builder(node_name(i), node_type(constructor_refs.len()));
        for (index, target) in constructor_refs.iter().enumerate() {
            builder = builder.arg_ref(index, node_name(*target));
        }
        for target in shape.setter_refs.iter().take(MAX_NODES).map(|r| *r as usize % count) {
            builder = builder.property_ref(format!("p{target}"), node_name(target));
        }
        if shape.prototype {
            builder = builder.prototype();
        }
        let _ = container.register(builder.build());
    }
    if count == 0 {
        return;
    }

    for lookup in input.lookups.iter().take(32) {
        let name = node_name(*lookup as usize % count);
        let first = container.lookup(&name);

        for i in 0..count {
            assert!(!container.is_currently_in_creation(&node_name(i)));
        }

        if let (Ok(first), Ok(true)) = (first, container.is_singleton(&name)) {
            let again = container.lookup(&name).expect("created singleton must resolve again");
            assert!(Arc::ptr_eq(&first, &again));
        }
    }
});
