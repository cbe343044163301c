//! # Contextual Injector
//!
//! A dependency injection container that builds components from their
//! declared dependencies, choosing between implementation variants by the
//! qualifiers present in a resolution *context*.
//!
//! ## Features
//!
//! - **Context-aware** - bindings serve qualifier sets; components declare
//!   which qualifier types they observe and are cached per observed subset
//! - **Hierarchical** - child containers shadow their parents, domain
//!   containers build independent instance graphs, isolated components keep
//!   private dependencies
//! - **Interceptors** - replace or veto dependencies before they are bound
//! - **Concurrent** - `DashMap` registries and per-key `OnceCell` caches;
//!   one build per key no matter how many threads ask
//! - **Diagnosable** - every error carries the dependency path that led to it
//!
//! ## Quick Start
//!
//! ```rust
//! use contextual_injector::prelude::*;
//!
//! struct Config {
//!     url: String,
//! }
//!
//! struct Database {
//!     config: Arc<Config>,
//! }
//!
//! impl Component for Database {
//!     fn descriptor() -> Descriptor<Self> {
//!         Descriptor::new().constructor(Constructor::from_fn("new", |config: Arc<Config>| {
//!             Ok(Database { config })
//!         }))
//!     }
//! }
//!
//! let container = Container::new();
//! container
//!     .bind_instance(Arc::new(Config { url: "postgres://localhost".into() }), Attributes::new())
//!     .unwrap();
//! container.bind_component::<Database>().unwrap();
//!
//! let db = container.get_component::<Database>().unwrap();
//! assert!(Arc::ptr_eq(&db, &container.get_component::<Database>().unwrap()));
//! assert_eq!(db.config.url, "postgres://localhost");
//! ```
//!
//! ## Variants
//!
//! ```rust
//! use contextual_injector::prelude::*;
//!
//! const LOCALE: QualifierType = QualifierType::new("locale");
//!
//! trait Greeter: Send + Sync {
//!     fn greet(&self) -> &'static str;
//! }
//!
//! struct English;
//! struct French;
//!
//! impl Greeter for English {
//!     fn greet(&self) -> &'static str { "hello" }
//! }
//!
//! impl Greeter for French {
//!     fn greet(&self) -> &'static str { "bonjour" }
//! }
//!
//! impl Component for English {
//!     fn descriptor() -> Descriptor<Self> {
//!         Descriptor::new().constructor(Constructor::from_fn("new", |()| Ok(English)))
//!     }
//! }
//!
//! impl Component for French {
//!     fn descriptor() -> Descriptor<Self> {
//!         Descriptor::new().constructor(Constructor::from_fn("new", |()| Ok(French)))
//!     }
//! }
//!
//! let container = Container::new();
//! container.bind::<dyn Greeter, English>(|c| c, Attributes::new()).unwrap();
//! container
//!     .bind::<dyn Greeter, French>(|c| c, Attributes::new().qualified(LOCALE.value("fr")))
//!     .unwrap();
//!
//! let fr = Context::new().with(LOCALE.value("fr"));
//! assert_eq!(container.get_component_in::<dyn Greeter>(&fr).unwrap().greet(), "bonjour");
//! assert_eq!(container.get_component::<dyn Greeter>().unwrap().greet(), "hello");
//! ```
//!
//! ## Domains
//!
//! ```rust
//! use contextual_injector::prelude::*;
//!
//! struct Session;
//!
//! impl Component for Session {
//!     fn descriptor() -> Descriptor<Self> {
//!         Descriptor::new().constructor(Constructor::from_fn("new", |()| Ok(Session)))
//!     }
//! }
//!
//! let root = Container::new();
//! root.bind_component_with::<Session>(Attributes::new().per_domain()).unwrap();
//!
//! let tenant_a = root.make_domain_container();
//! let tenant_b = root.make_domain_container();
//!
//! let a = tenant_a.get_component::<Session>().unwrap();
//! let b = tenant_b.get_component::<Session>().unwrap();
//! assert!(!Arc::ptr_eq(&a, &b));
//! assert!(root.get_component::<Session>().is_err());
//! ```

mod cache;
mod catalog;
mod component;
mod container;
mod context;
mod error;
mod factory;
mod inject;
mod interceptor;
#[cfg(feature = "logging")]
pub mod logging;
mod observer;
mod path;
mod qualifier;
mod registry;
mod resolver;

pub use catalog::{Catalog, CatalogEntry};
pub use component::{
    AnyArc, Attributes, Component, ComponentType, Constructor, Dependency, DependencyKind,
    Descriptor, Injection, Method,
};
pub use container::Container;
pub use context::Context;
pub use error::{BindingFault, BoxError, DiError, InjectionFault, ResolutionFault, Result};
pub use factory::{factory_fn, variant, Factory, FactoryFn, Instance};
pub use inject::{Arguments, Inject};
pub use interceptor::{Interception, Interceptor, InterceptorFilter, Verdict};
#[cfg(feature = "logging")]
pub use observer::TracingObserver;
pub use observer::{Event, Observer, RecordingObserver};
pub use path::{DependencyPath, PathNode};
pub use qualifier::{Qualifier, QualifierSet, QualifierType, Qualifiers};
pub use registry::Binder;
pub use resolver::{Lazy, Resolver};

#[cfg(feature = "derive")]
pub use contextual_injector_derive::Component;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        Attributes, Binder, Component, Constructor, Container, Context, Descriptor, DiError,
        Injection, Instance, Lazy, Qualifier, QualifierType, Qualifiers, Resolver, Result,
    };
    pub use std::sync::Arc;
}
