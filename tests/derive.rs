//! `#[derive(Component)]` against a live container

#![cfg(feature = "derive")]

use contextual_injector::{
    Attributes, Component, Container, Context, DependencyKind, Lazy, QualifierType, Qualifiers,
};
use std::sync::Arc;

const LOCALE: QualifierType = QualifierType::new("locale");
const REGION: QualifierType = QualifierType::new("region");

trait Greeter: Send + Sync {
    fn greet(&self) -> &'static str;
}

#[derive(Component)]
struct English;

#[derive(Component)]
struct French;

impl Greeter for English {
    fn greet(&self) -> &'static str {
        "hello"
    }
}

impl Greeter for French {
    fn greet(&self) -> &'static str {
        "bonjour"
    }
}

struct Motd(&'static str);

#[derive(Component)]
#[component(qualifiers("locale"))]
struct Banner {
    #[inject]
    greeter: Arc<dyn Greeter>,
    #[inject(optional)]
    motd: Option<Arc<Motd>>,
    #[inject(group)]
    extras: Vec<Arc<dyn Greeter>>,
    #[inject]
    context: Context,
    shown: u32,
}

#[derive(Component)]
struct Pinned {
    #[inject(qualifier(kind = "locale", value = "fr"))]
    greeter: Arc<dyn Greeter>,
}

#[derive(Component)]
struct Owner {
    #[inject(lazy)]
    helper: Lazy<Helper>,
}

#[derive(Component)]
struct Helper {
    #[inject]
    owner: Arc<Owner>,
}

#[derive(Component)]
#[component(stateful)]
struct Fresh;

fn greeters() -> Container {
    let container = Container::new();
    container
        .bind::<dyn Greeter, English>(|c| c, Attributes::new())
        .and_then(|c| {
            c.bind::<dyn Greeter, French>(|c| c, Attributes::new().qualified(LOCALE.value("fr")))
        })
        .unwrap();
    container
}

#[test]
fn test_unit_struct_descriptor() {
    let descriptor = English::descriptor();
    assert_eq!(descriptor.constructors().len(), 1);
    assert!(descriptor.constructors()[0].params().is_empty());
    assert_eq!(descriptor.accepted(), &Qualifiers::None);
    assert!(Fresh::descriptor().is_stateful());
}

#[test]
fn test_field_kinds_follow_types() {
    let descriptor = Banner::descriptor();
    let kinds: Vec<(DependencyKind, bool)> = descriptor.constructors()[0]
        .params()
        .iter()
        .map(|d| (d.kind(), d.is_optional()))
        .collect();
    assert_eq!(
        kinds,
        vec![
            (DependencyKind::Component, false),
            (DependencyKind::Component, true),
            (DependencyKind::Group, false),
            (DependencyKind::Context, false),
        ]
    );
    assert_eq!(descriptor.accepted(), &Qualifiers::only([LOCALE]));
}

#[test]
fn test_derived_component_resolves_variants() {
    let container = greeters();
    container
        .bind_group_member::<dyn Greeter, English>(|c| c)
        .and_then(|c| c.bind_component::<Banner>())
        .unwrap();

    let default = container.get_component::<Banner>().unwrap();
    assert_eq!(default.greeter.greet(), "hello");
    assert!(default.motd.is_none());
    assert_eq!(default.extras.len(), 1);
    assert_eq!(default.shown, 0);

    let request = Context::new()
        .with(LOCALE.value("fr"))
        .with(REGION.value("eu"));
    let french = container.get_component_in::<Banner>(&request).unwrap();
    assert_eq!(french.greeter.greet(), "bonjour");
    assert_eq!(french.context, Context::new().with(LOCALE.value("fr")));
    assert!(!Arc::ptr_eq(&default, &french));
}

#[test]
fn test_optional_field_filled_when_bound() {
    let container = greeters();
    container
        .bind_instance(Arc::new(Motd("welcome")), Attributes::new())
        .and_then(|c| c.bind_component::<Banner>())
        .unwrap();

    let banner = container.get_component::<Banner>().unwrap();
    assert_eq!(banner.motd.as_ref().map(|motd| motd.0), Some("welcome"));
}

#[test]
fn test_site_qualifier_field() {
    let container = greeters();
    container.bind_component::<Pinned>().unwrap();

    assert_eq!(container.get_component::<Pinned>().unwrap().greeter.greet(), "bonjour");
}

#[test]
fn test_lazy_field_closes_loop() {
    let container = Container::new();
    container
        .bind_component::<Owner>()
        .and_then(|c| c.bind_component::<Helper>())
        .unwrap();

    let owner = container.get_component::<Owner>().unwrap();
    let helper = owner.helper.get().unwrap();
    assert!(Arc::ptr_eq(&helper.owner, &owner));
}
