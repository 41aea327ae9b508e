//! Benchmarks for the component container

use component_injector::{
    AutowireMode, ComponentDescriptor, ComponentType, Container, ContainerConfig, KeyedScope, Parameter, Scope,
};
use criterion::{BatchSize, Criterion, Throughput, criterion_group, criterion_main};
use once_cell::sync::OnceCell;
use std::hint::black_box;
use std::sync::Arc;

#[allow(dead_code)]
struct Config {
    url: String,
}

#[allow(dead_code)]
struct Repository {
    config: Arc<Config>,
}

#[allow(dead_code)]
struct Service {
    repository: Arc<Repository>,
    config: Arc<Config>,
}

#[allow(dead_code)]
struct Left {
    right: OnceCell<Arc<Right>>,
}

#[allow(dead_code)]
struct Right {
    left: OnceCell<Arc<Left>>,
}

fn config_type() -> ComponentType {
    ComponentType::builder::<Config>()
        .constructor(vec![], |_| Ok(Config { url: "postgres://localhost".into() }))
        .build()
}

fn repository_type() -> ComponentType {
    ComponentType::builder::<Repository>()
        .constructor(vec![Parameter::of::<Config>()], |args| {
            Ok(Repository { config: args.get(0)? })
        })
        .build()
}

fn service_type() -> ComponentType {
    ComponentType::builder::<Service>()
        .constructor(vec![Parameter::of::<Repository>()], |args| {
            let repository: Arc<Repository> = args.get(0)?;
            Ok(Service {
                config: Arc::clone(&repository.config),
                repository,
            })
        })
        .constructor(
            vec![Parameter::of::<Repository>(), Parameter::of::<Config>()],
            |args| {
                Ok(Service {
                    repository: args.get(0)?,
                    config: args.get(1)?,
                })
            },
        )
        .build()
}

/// Three-level constructor graph
fn layered(container: &Container, scope: Scope) {
    container
        .register(ComponentDescriptor::builder("config", config_type()).build())
        .unwrap();
    container
        .register(ComponentDescriptor::builder("repository", repository_type()).scope(scope.clone()).build())
        .unwrap();
    container
        .register(
            ComponentDescriptor::builder("service", service_type())
                .scope(scope)
                .autowire(AutowireMode::Constructor)
                .build(),
        )
        .unwrap();
}

fn cyclic(container: &Container) {
    let left = ComponentType::builder::<Left>()
        .constructor(vec![], |_| Ok(Left { right: OnceCell::new() }))
        .property::<Right, _>("right", |l, r| l.right.set(r).map_err(|_| "right already set".into()))
        .build();
    let right = ComponentType::builder::<Right>()
        .constructor(vec![], |_| Ok(Right { left: OnceCell::new() }))
        .property::<Left, _>("left", |r, l| r.left.set(l).map_err(|_| "left already set".into()))
        .build();
    container
        .register(ComponentDescriptor::builder("left", left).property_ref("right", "right").build())
        .unwrap();
    container
        .register(ComponentDescriptor::builder("right", right).property_ref("left", "left").build())
        .unwrap();
}

fn bench_registration(c: &mut Criterion) {
    let mut group = c.benchmark_group("registration");

    group.bench_function("descriptor", |b| {
        b.iter(|| {
            let container = Container::new();
            container
                .register(ComponentDescriptor::builder("config", config_type()).build())
                .unwrap();
            black_box(container)
        })
    });

    group.bench_function("singleton_instance", |b| {
        b.iter(|| {
            let container = Container::new();
            container
                .register_singleton("config", Config { url: "postgres://localhost".into() })
                .unwrap();
            black_box(container)
        })
    });

    group.finish();
}

fn bench_resolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolution");
    group.throughput(Throughput::Elements(1));

    let container = Container::new();
    layered(&container, Scope::Singleton);
    container.pre_instantiate_singletons().unwrap();

    group.bench_function("get_singleton", |b| {
        b.iter(|| black_box(container.get::<Service>("service").unwrap()))
    });

    group.bench_function("get_by_type", |b| {
        b.iter(|| black_box(container.get_by_type::<Repository>().unwrap()))
    });

    group.bench_function("contains_check", |b| b.iter(|| black_box(container.contains("service"))));

    group.bench_function("lookup_not_found", |b| b.iter(|| black_box(container.lookup("missing").is_err())));

    group.finish();
}

fn bench_creation(c: &mut Criterion) {
    let mut group = c.benchmark_group("creation");
    group.throughput(Throughput::Elements(1));

    let prototypes = Container::new();
    layered(&prototypes, Scope::Prototype);

    // the resolved constructor is cached after the first request
    group.bench_function("prototype_cached_constructor", |b| {
        b.iter(|| black_box(prototypes.get::<Service>("service").unwrap()))
    });

    let strict = Container::with_config(ContainerConfig::default().with_lenient_constructor_resolution(false));
    layered(&strict, Scope::Prototype);

    group.bench_function("prototype_strict", |b| {
        b.iter(|| black_box(strict.get::<Service>("service").unwrap()))
    });

    group.bench_function("singleton_cold_start", |b| {
        b.iter_batched(
            || {
                let container = Container::new();
                layered(&container, Scope::Singleton);
                container
            },
            |container| black_box(container.get::<Service>("service").unwrap()),
            BatchSize::SmallInput,
        )
    });

    group.bench_function("setter_cycle", |b| {
        b.iter_batched(
            || {
                let container = Container::new();
                cyclic(&container);
                container
            },
            |container| black_box(container.get::<Left>("left").unwrap()),
            BatchSize::SmallInput,
        )
    });

    group.finish();
}

fn bench_scoped(c: &mut Criterion) {
    let mut group = c.benchmark_group("scoped");

    let container = Container::new();
    let request = Arc::new(KeyedScope::new());
    container.register_scope("request", request.clone());
    layered(&container, Scope::custom("request"));

    group.bench_function("resolve_in_scope", |b| {
        b.iter(|| black_box(container.get::<Service>("service").unwrap()))
    });

    group.bench_function("resolve_and_reset", |b| {
        b.iter(|| {
            let service = container.get::<Service>("service").unwrap();
            request.reset();
            black_box(service)
        })
    });

    group.finish();
}

fn bench_concurrent(c: &mut Criterion) {
    use std::thread;

    let mut group = c.benchmark_group("concurrent");

    group.bench_function("concurrent_reads_4", |b| {
        let container = Container::new();
        layered(&container, Scope::Singleton);

        b.iter(|| {
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    let c = container.clone();
                    thread::spawn(move || {
                        for _ in 0..100 {
                            let _ = c.get::<Service>("service").unwrap();
                        }
                    })
                })
                .collect();

            for h in handles {
                h.join().unwrap();
            }
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_registration,
    bench_resolution,
    bench_creation,
    bench_scoped,
    bench_concurrent,
);

criterion_main!(benches);
