//! Walk through a component's life: wiring, a setter cycle, a request
//! scope and ordered teardown.
//!
//! Run with pretty logging:
//! ```bash
//! cargo run --example lifecycle --features logging-pretty
//! ```

use component_injector::{
    ComponentDescriptor, ComponentType, Container, KeyedScope, Parameter, Scope,
};
use once_cell::sync::OnceCell;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

struct Pool {
    url: String,
}

struct Repository {
    pool: Arc<Pool>,
}

struct Orders {
    repository: Arc<Repository>,
    audit: OnceCell<Arc<Audit>>,
}

struct Audit {
    orders: OnceCell<Arc<Orders>>,
}

struct RequestContext {
    id: u64,
}

fn main() {
    #[cfg(feature = "logging")]
    component_injector::logging::init();

    println!("=== Component Lifecycle Demo ===\n");

    let container = Container::new();

    let pool = ComponentType::builder::<Pool>()
        .constructor(vec![], |_| Ok(Pool { url: "postgres://localhost/shop".into() }))
        .method("close", |p| {
            println!("  [Pool] closing {}", p.url);
            Ok(())
        })
        .build();
    let repository = ComponentType::builder::<Repository>()
        .constructor(vec![Parameter::of::<Pool>()], |args| {
            Ok(Repository { pool: args.get(0)? })
        })
        .disposer(|_| {
            println!("  [Repository] flushing");
            Ok(())
        })
        .build();
    let orders = ComponentType::builder::<Orders>()
        .constructor(vec![Parameter::of::<Repository>()], |args| {
            Ok(Orders {
                repository: args.get(0)?,
                audit: OnceCell::new(),
            })
        })
        .property::<Audit, _>("audit", |o, a| o.audit.set(a).map_err(|_| "audit already set".into()))
        .disposer(|_| {
            println!("  [Orders] draining");
            Ok(())
        })
        .build();
    let audit = ComponentType::builder::<Audit>()
        .constructor(vec![], |_| Ok(Audit { orders: OnceCell::new() }))
        .property::<Orders, _>("orders", |a, o| a.orders.set(o).map_err(|_| "orders already set".into()))
        .build();

    static NEXT_REQUEST: AtomicU64 = AtomicU64::new(1);
    let request_context = ComponentType::builder::<RequestContext>()
        .constructor(vec![], |_| {
            Ok(RequestContext {
                id: NEXT_REQUEST.fetch_add(1, Ordering::Relaxed),
            })
        })
        .disposer(|ctx| {
            println!("  [Request {}] ended", ctx.id);
            Ok(())
        })
        .build();

    let request = Arc::new(KeyedScope::new());
    container.register_scope("request", request.clone());

    let descriptors = [
        ComponentDescriptor::builder("pool", pool).infer_destroy_method().build(),
        ComponentDescriptor::builder("repository", repository).build(),
        ComponentDescriptor::builder("orders", orders).property_ref("audit", "audit").build(),
        ComponentDescriptor::builder("audit", audit).property_ref("orders", "orders").build(),
        ComponentDescriptor::builder("request", request_context)
            .scope(Scope::custom("request"))
            .build(),
    ];
    for descriptor in descriptors {
        if let Err(e) = container.register(descriptor) {
            eprintln!("registration failed: {e}");
            return;
        }
    }

    println!("1. Warming up singletons");
    if let Err(e) = container.pre_instantiate_singletons() {
        eprintln!("  warm-up failed: {e}");
        return;
    }
    println!("   singletons: {:?}", container.singleton_names());

    println!("\n2. Setter cycle between orders and audit");
    match (container.get::<Orders>("orders"), container.get::<Audit>("audit")) {
        (Ok(orders), Ok(audit)) => {
            let round_trip = audit.orders.get().is_some_and(|o| Arc::ptr_eq(o, &orders));
            println!("   audit sees the same orders instance: {round_trip}");
            println!("   orders -> repository -> pool: {}", orders.repository.pool.url);
        }
        (Err(e), _) | (_, Err(e)) => eprintln!("   lookup failed: {e}"),
    }

    println!("\n3. Dependency graph");
    for name in ["pool", "repository", "orders"] {
        println!("   {name} is used by {:?}", container.dependents_of(name));
    }

    println!("\n4. Request scope");
    for _ in 0..2 {
        let first = container.get::<RequestContext>("request");
        let second = container.get::<RequestContext>("request");
        if let (Ok(a), Ok(b)) = (first, second) {
            println!("   request {} shared within scope: {}", a.id, Arc::ptr_eq(&a, &b));
        }
        request.reset();
    }

    println!("\n5. Teardown (dependents first)");
    let report = container.destroy_all();
    println!(
        "   destroyed {:?}, {} failure(s), state {}",
        report.destroyed,
        report.failures.len(),
        container.state()
    );
}
