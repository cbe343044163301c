//! `#[derive(Component)]` with qualified variants and a lazy back-reference
//!
//! Run with:
//!   cargo run --example derive --features derive

use contextual_injector::{
    Attributes, Component, Container, Context, Lazy, QualifierType,
};
use std::sync::Arc;

const LOCALE: QualifierType = QualifierType::new("locale");

trait Greeter: Send + Sync {
    fn greet(&self, name: &str) -> String;
}

#[derive(Component)]
struct English;

#[derive(Component)]
struct French;

impl Greeter for English {
    fn greet(&self, name: &str) -> String {
        format!("Hello, {name}!")
    }
}

impl Greeter for French {
    fn greet(&self, name: &str) -> String {
        format!("Bonjour, {name} !")
    }
}

struct Settings {
    product: &'static str,
}

trait Plugin: Send + Sync {
    fn name(&self) -> &'static str;
}

#[derive(Component)]
struct Metrics;

impl Plugin for Metrics {
    fn name(&self) -> &'static str {
        "metrics"
    }
}

/// Observes only `locale`; any other qualifier in the request context is
/// dropped before it reaches the greeter or the cache key.
#[derive(Component)]
#[component(qualifiers("locale"))]
struct Welcome {
    #[inject]
    greeter: Arc<dyn Greeter>,
    #[inject]
    settings: Arc<Settings>,
    #[inject(optional)]
    motd: Option<Arc<String>>,
    #[inject(group)]
    plugins: Vec<Arc<dyn Plugin>>,
    #[inject(lazy)]
    inbox: Lazy<Inbox>,
    #[inject]
    context: Context,
    // Not injected
    shown: u32,
}

#[derive(Component)]
struct Inbox {
    #[inject(qualifier(kind = "locale", value = "fr"))]
    greeter: Arc<dyn Greeter>,
}

impl Welcome {
    fn render(&self, user: &str) -> String {
        let plugins: Vec<&str> = self.plugins.iter().map(|p| p.name()).collect();
        format!(
            "[{}] {} (context {}, plugins {:?}, motd {:?}, shown {})",
            self.settings.product,
            self.greeter.greet(user),
            self.context,
            plugins,
            self.motd.as_deref(),
            self.shown
        )
    }
}

fn main() -> contextual_injector::Result<()> {
    println!("=== Derive Demo ===\n");

    let container = Container::new();
    container
        .bind_instance(Arc::new(Settings { product: "Shop" }), Attributes::new())?
        .bind::<dyn Greeter, English>(|c| c, Attributes::new())?
        .bind::<dyn Greeter, French>(|c| c, Attributes::new().qualified(LOCALE.value("fr")))?
        .bind_group_member::<dyn Plugin, Metrics>(|c| c)?
        .bind_component::<Welcome>()?
        .bind_component::<Inbox>()?;

    let default = container.get_component::<Welcome>()?;
    println!("{}", default.render("Ada"));

    let fr = Context::new()
        .with(LOCALE.value("fr"))
        .with(QualifierType::new("region").value("eu"));
    let french = container.get_component_in::<Welcome>(&fr)?;
    println!("{}", french.render("Ada"));

    // Resolved now, after construction has finished
    let inbox = french.inbox.get()?;
    println!("Inbox greeter: {}", inbox.greeter.greet("Ada"));

    println!("\nCached per observed context: {}", !Arc::ptr_eq(&default, &french));
    Ok(())
}
