#![no_main]

//! Fuzz target for concurrent resolution
//!
//! Threads race on the same keys and bind into their own child levels; every
//! key must still be built exactly once.

use arbitrary::Arbitrary;
use contextual_injector::{
    Attributes, Component, Constructor, Container, Context, Descriptor, QualifierType,
    Qualifiers,
};
use libfuzzer_sys::fuzz_target;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

const SHARD: QualifierType = QualifierType::new("shard");
const SHARDS: [&str; 4] = ["0", "1", "2", "3"];

#[derive(Default)]
struct Builds(AtomicUsize);

struct Shared {
    #[allow(dead_code)]
    builds: Arc<Builds>,
}

impl Component for Shared {
    fn descriptor() -> Descriptor<Self> {
        Descriptor::new()
            .qualifiers(Qualifiers::only([SHARD]))
            .constructor(Constructor::from_fn("new", |builds: Arc<Builds>| {
                builds.0.fetch_add(1, Ordering::SeqCst);
                Ok(Shared { builds })
            }))
    }
}

struct Local;

impl Component for Local {
    fn descriptor() -> Descriptor<Self> {
        Descriptor::new().constructor(Constructor::from_fn("new", |_: Arc<Shared>| Ok(Local)))
    }
}

#[derive(Debug, Clone, Arbitrary)]
enum ThreadOp {
    Resolve { shard: u8 },
    BindLocal,
    ResolveLocal,
}

#[derive(Debug, Arbitrary)]
struct Scenario {
    thread_count: u8,
    ops: Vec<ThreadOp>,
}

fuzz_target!(|scenario: Scenario| {
    let builds = Arc::new(Builds::default());
    let container = Container::new();
    container
        .bind_instance(Arc::clone(&builds), Attributes::new())
        .and_then(|c| c.bind_component::<Shared>())
        .expect("bindings");

    let thread_count = (scenario.thread_count % 8).max(1) as usize;
    let ops: Vec<ThreadOp> = scenario.ops.into_iter().take(50).collect();
    let mut seen = [false; SHARDS.len()];
    for op in &ops {
        if let ThreadOp::Resolve { shard } = op {
            seen[*shard as usize % SHARDS.len()] = true;
        }
    }

    thread::scope(|scope| {
        for _ in 0..thread_count {
            scope.spawn(|| {
                let child = container.make_child_container();
                for op in &ops {
                    match op {
                        ThreadOp::Resolve { shard } => {
                            let context = Context::new()
                                .with(SHARD.value(SHARDS[*shard as usize % SHARDS.len()]));
                            container
                                .get_component_in::<Shared>(&context)
                                .expect("shared resolves");
                        }
                        ThreadOp::BindLocal => {
                            // Second bind on the same child is a duplicate primary
                            let _ = child.bind_component::<Local>();
                        }
                        ThreadOp::ResolveLocal => {
                            let _ = child.get_component::<Local>();
                        }
                    }
                }
            });
        }
    });

    // `ResolveLocal` may build the default-context instance as well
    let expected = seen.iter().filter(|seen| **seen).count();
    let built = builds.0.load(Ordering::SeqCst);
    assert!(built >= expected && built <= expected + 1);
});
