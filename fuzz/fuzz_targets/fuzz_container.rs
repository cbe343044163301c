#![no_main]

//! Fuzz target for binding and resolution across container hierarchies
//!
//! Arbitrary variant bindings, child and domain levels and request contexts.
//! Resolution may fail, but never panics, and repeated requests for the same
//! context return the same instance.

use arbitrary::Arbitrary;
use contextual_injector::{
    Attributes, Component, Constructor, Container, Context, Descriptor, QualifierType,
    Qualifiers,
};
use libfuzzer_sys::fuzz_target;
use std::sync::Arc;

const LOCALE: QualifierType = QualifierType::new("locale");
const REGION: QualifierType = QualifierType::new("region");
const VALUES: [&str; 3] = ["a", "b", "c"];

trait Greeter: Send + Sync {}

struct Plain;
struct Observing;

impl Greeter for Plain {}
impl Greeter for Observing {}

impl Component for Plain {
    fn descriptor() -> Descriptor<Self> {
        Descriptor::new().constructor(Constructor::from_fn("new", |()| Ok(Plain)))
    }
}

impl Component for Observing {
    fn descriptor() -> Descriptor<Self> {
        Descriptor::new()
            .qualifiers(Qualifiers::only([LOCALE]))
            .constructor(Constructor::from_fn("new", |()| Ok(Observing)))
    }
}

struct Consumer {
    #[allow(dead_code)]
    greeter: Option<Arc<dyn Greeter>>,
}

impl Component for Consumer {
    fn descriptor() -> Descriptor<Self> {
        Descriptor::new()
            .qualifiers(Qualifiers::All)
            .constructor(Constructor::from_fn("new", |greeter: Option<Arc<dyn Greeter>>| {
                Ok(Consumer { greeter })
            }))
    }
}

#[derive(Debug, Arbitrary)]
struct Request {
    locale: Option<u8>,
    region: Option<u8>,
}

impl Request {
    fn context(&self) -> Context {
        let mut context = Context::new();
        if let Some(value) = self.locale {
            context = context.with(LOCALE.value(VALUES[value as usize % VALUES.len()]));
        }
        if let Some(value) = self.region {
            context = context.with(REGION.value(VALUES[value as usize % VALUES.len()]));
        }
        context
    }
}

#[derive(Debug, Arbitrary)]
enum Op {
    BindVariant {
        level: u8,
        observing: bool,
        primary: bool,
        per_domain: bool,
        qualifier: Option<u8>,
    },
    BindMember { level: u8 },
    BindConsumer { level: u8 },
    MakeChild { parent: u8 },
    MakeDomain { parent: u8 },
    Lock { level: u8 },
    Resolve { level: u8, request: Request },
    ResolveConsumer { level: u8, request: Request },
    ResolveGroup { level: u8 },
}

fn pick(levels: &[Container], index: u8) -> &Container {
    &levels[index as usize % levels.len()]
}

fuzz_target!(|ops: Vec<Op>| {
    let mut levels = vec![Container::new()];

    for op in ops.into_iter().take(64) {
        match op {
            Op::BindVariant {
                level,
                observing,
                primary,
                per_domain,
                qualifier,
            } => {
                let mut attributes = Attributes::new();
                if !primary {
                    attributes = attributes.fallback();
                }
                if per_domain {
                    attributes = attributes.per_domain();
                }
                if let Some(value) = qualifier {
                    attributes =
                        attributes.qualified(LOCALE.value(VALUES[value as usize % VALUES.len()]));
                }
                let container = pick(&levels, level);
                // Duplicates and locked levels are rejected, not panics
                let _ = if observing {
                    container.bind::<dyn Greeter, Observing>(|c| c, attributes)
                } else {
                    container.bind::<dyn Greeter, Plain>(|c| c, attributes)
                };
            }
            Op::BindMember { level } => {
                let _ = pick(&levels, level).bind_group_member::<dyn Greeter, Plain>(|c| c);
            }
            Op::BindConsumer { level } => {
                let _ = pick(&levels, level).bind_component::<Consumer>();
            }
            Op::MakeChild { parent } => {
                let child = pick(&levels, parent).make_child_container();
                levels.push(child);
            }
            Op::MakeDomain { parent } => {
                let domain = pick(&levels, parent).make_domain_container();
                levels.push(domain);
            }
            Op::Lock { level } => pick(&levels, level).lock(),
            Op::Resolve { level, request } => {
                let container = pick(&levels, level);
                let context = request.context();
                if let Ok(first) = container.get_component_in::<dyn Greeter>(&context) {
                    let second = container
                        .get_component_in::<dyn Greeter>(&context)
                        .expect("a resolved binding resolves again");
                    assert!(Arc::ptr_eq(&first, &second));
                }
            }
            Op::ResolveConsumer { level, request } => {
                let container = pick(&levels, level);
                let context = request.context();
                if let Ok(first) = container.get_component_in::<Consumer>(&context) {
                    let second = container
                        .get_component_in::<Consumer>(&context)
                        .expect("a resolved binding resolves again");
                    assert!(Arc::ptr_eq(&first, &second));
                }
            }
            Op::ResolveGroup { level } => {
                let container = pick(&levels, level);
                if let Ok(first) = container.get_component_group::<dyn Greeter>() {
                    let second = container
                        .get_component_group::<dyn Greeter>()
                        .expect("a resolved group resolves again");
                    assert_eq!(first.len(), second.len());
                }
            }
        }
    }
});
