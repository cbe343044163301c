//! What the container logs while it resolves
//!
//! JSON lines:
//! ```bash
//! cargo run --example logging --features logging-json
//! ```
//!
//! Human readable:
//! ```bash
//! cargo run --example logging --features logging-pretty
//! ```

use contextual_injector::{
    Attributes, BoxError, Component, Constructor, Container, Descriptor, Interception,
    Interceptor, InterceptorFilter, Resolver, TracingObserver, Verdict,
};
use std::sync::Arc;

struct Database {
    url: &'static str,
}

struct Repository {
    #[allow(dead_code)]
    db: Arc<Database>,
}

impl Component for Repository {
    fn descriptor() -> Descriptor<Self> {
        Descriptor::new().constructor(Constructor::from_fn("new", |db: Arc<Database>| {
            Ok(Repository { db })
        }))
    }
}

struct Ping(#[allow(dead_code)] Arc<Pong>);
struct Pong(#[allow(dead_code)] Arc<Ping>);

impl Component for Ping {
    fn descriptor() -> Descriptor<Self> {
        Descriptor::new().constructor(Constructor::from_fn("new", |pong| Ok(Ping(pong))))
    }
}

impl Component for Pong {
    fn descriptor() -> Descriptor<Self> {
        Descriptor::new().constructor(Constructor::from_fn("new", |ping| Ok(Pong(ping))))
    }
}

struct ReadOnly;

impl Interceptor for ReadOnly {
    fn intercept(&self, _: &Interception, _: &mut Resolver<'_>) -> Result<Verdict, BoxError> {
        Ok(Verdict::Veto)
    }
}

fn main() {
    // JSON with logging-json, pretty with logging-pretty
    contextual_injector::logging::init();

    println!("=== Logging Demo ===\n");

    // Logs: "Creating new root container"
    let container = Container::new().observed(Arc::new(TracingObserver));

    // Logs: "Registering binding" per bind
    container
        .bind_instance(Arc::new(Database { url: "postgres://localhost/app" }), Attributes::new())
        .and_then(|c| c.bind_component::<Repository>())
        .and_then(|c| c.bind_component::<Ping>())
        .and_then(|c| c.bind_component::<Pong>())
        .expect("bindings");

    // Logs: "Instantiating component", then "Component replayed from cache"
    let _ = container.get_component::<Repository>();
    let _ = container.get_component::<Repository>();
    println!(
        "Database: {}",
        container.get_component::<Database>().map(|db| db.url).unwrap_or("?")
    );

    // Logs: "Circular reference detected"
    if let Err(error) = container.get_component::<Ping>() {
        println!("{error}");
    }

    // Logs: "Lookup failed"
    if let Err(error) = container.get_component::<String>() {
        println!("{error}");
    }

    // Logs: "Registering interceptor", "Dependency vetoed by interceptor"
    let guarded = container.make_child_container();
    guarded
        .add_interceptor(InterceptorFilter::api::<Database>(), Arc::new(ReadOnly))
        .expect("interceptor");
    if let Err(error) = guarded.get_component::<Database>() {
        println!("{error}");
    }

    println!("\n=== Demo Complete ===");
}
