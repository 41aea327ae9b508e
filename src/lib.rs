//! # Component Injector - named-component container
//!
//! A container that builds, wires and tears down named components from
//! descriptors.
//!
//! ## Features
//!
//! - **Singleton identity** - one instance per name, even under concurrent first requests
//! - **Circular references** - setter cycles between singletons resolve through early references
//! - **Constructor selection** - the greediest satisfiable constructor or factory method wins
//! - **Interception** - wrappers applied exactly once, consistent with early references
//! - **Dependency graph** - dependents are always destroyed before their dependencies
//! - **Custom scopes** - request- or session-like lifetimes via [`CustomScope`]
//! - **Observable** - optional tracing integration with JSON or pretty output
//!
//! ## Quick Start
//!
//! ```rust
//! use component_injector::{ComponentDescriptor, ComponentType, Container, Parameter};
//! use std::sync::Arc;
//!
//! struct Database {
//!     url: String,
//! }
//!
//! struct UserService {
//!     db: Arc<Database>,
//! }
//!
//! let container = Container::new();
//!
//! let database = ComponentType::builder::<Database>()
//!     .constructor(vec![], |_| Ok(Database { url: "postgres://localhost".into() }))
//!     .build();
//! let users = ComponentType::builder::<UserService>()
//!     .constructor(vec![Parameter::of::<Database>()], |args| {
//!         Ok(UserService { db: args.get::<Database>(0)? })
//!     })
//!     .build();
//!
//! container.register(ComponentDescriptor::builder("database", database).build()).unwrap();
//! container.register(ComponentDescriptor::builder("users", users).build()).unwrap();
//!
//! let service = container.get::<UserService>("users").unwrap();
//! assert_eq!(service.db.url, "postgres://localhost");
//! assert_eq!(container.dependents_of("database"), vec!["users".to_string()]);
//! ```
//!
//! ## Setter Cycles
//!
//! Late-bound fields (here a [`OnceCell`](once_cell::sync::OnceCell)) let two
//! singletons reference each other:
//!
//! ```rust
//! use component_injector::{ComponentDescriptor, ComponentType, Container};
//! use once_cell::sync::OnceCell;
//! use std::sync::Arc;
//!
//! struct A {
//!     b: OnceCell<Arc<B>>,
//! }
//!
//! struct B {
//!     a: OnceCell<Arc<A>>,
//! }
//!
//! let a = ComponentType::builder::<A>()
//!     .constructor(vec![], |_| Ok(A { b: OnceCell::new() }))
//!     .property::<B, _>("b", |a, b| a.b.set(b).map_err(|_| "b already set".into()))
//!     .build();
//! let b = ComponentType::builder::<B>()
//!     .constructor(vec![], |_| Ok(B { a: OnceCell::new() }))
//!     .property::<A, _>("a", |b, a| b.a.set(a).map_err(|_| "a already set".into()))
//!     .build();
//!
//! let container = Container::new();
//! container.register(ComponentDescriptor::builder("a", a).property_ref("b", "b").build()).unwrap();
//! container.register(ComponentDescriptor::builder("b", b).property_ref("a", "a").build()).unwrap();
//!
//! let a = container.get::<A>("a").unwrap();
//! assert!(Arc::ptr_eq(a.b.get().unwrap().a.get().unwrap(), &a));
//! ```
//!
//! ## Teardown
//!
//! [`Container::destroy_all`] runs destroy callbacks in reverse registration
//! order, dependents first, and collects failures instead of stopping:
//!
//! ```rust
//! use component_injector::{ComponentDescriptor, ComponentType, Container};
//!
//! struct Pool;
//!
//! let pool = ComponentType::builder::<Pool>()
//!     .constructor(vec![], |_| Ok(Pool))
//!     .method("close", |_| Ok(()))
//!     .build();
//!
//! let container = Container::new();
//! container
//!     .register(ComponentDescriptor::builder("pool", pool).infer_destroy_method().build())
//!     .unwrap();
//! container.pre_instantiate_singletons().unwrap();
//!
//! let report = container.destroy_all();
//! assert!(report.is_clean());
//! assert_eq!(report.destroyed, vec!["pool".to_string()]);
//! ```

mod config;
mod constructor;
mod container;
mod descriptor;
mod error;
mod factory;
mod graph;
mod intercept;
mod lifecycle;
#[cfg(feature = "logging")]
pub mod logging;
mod provider;
mod registry;
mod scope;
mod types;

pub use config::*;
pub use container::Container;
pub use descriptor::*;
pub use error::*;
pub use intercept::{Interceptor, PostProcessor};
pub use lifecycle::{ContainerState, DestructibleHandle, DestructionReport};
pub use provider::*;
pub use scope::*;
pub use types::*;

// Re-export for convenience
pub use std::sync::Arc;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        ArgumentValue, AutowireMode, ComponentDescriptor, ComponentType, Container, ContainerConfig, CustomScope,
        DiError, Injectable, Instance, Interceptor, KeyedScope, Parameter, PostProcessor, Result, Scope, TypeInfo,
    };
    pub use std::sync::Arc;
}
