//! Benchmarks for binding, resolution and context handling

use contextual_injector::{
    Attributes, Component, Constructor, Container, Context, Descriptor, QualifierType,
    Qualifiers,
};
use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use std::sync::Arc;

const LOCALE: QualifierType = QualifierType::new("locale");
const REGION: QualifierType = QualifierType::new("region");

struct Config {
    #[allow(dead_code)]
    value: i32,
}

struct Repository {
    #[allow(dead_code)]
    config: Arc<Config>,
}

impl Component for Repository {
    fn descriptor() -> Descriptor<Self> {
        Descriptor::new().constructor(Constructor::from_fn("new", |config: Arc<Config>| {
            Ok(Repository { config })
        }))
    }
}

struct Service {
    #[allow(dead_code)]
    repository: Arc<Repository>,
    #[allow(dead_code)]
    config: Arc<Config>,
}

impl Component for Service {
    fn descriptor() -> Descriptor<Self> {
        Descriptor::new().constructor(Constructor::from_fn(
            "new",
            |(repository, config): (Arc<Repository>, Arc<Config>)| Ok(Service { repository, config }),
        ))
    }
}

trait Greeter: Send + Sync {}

struct English;
struct French;

impl Greeter for English {}
impl Greeter for French {}

impl Component for English {
    fn descriptor() -> Descriptor<Self> {
        Descriptor::new().constructor(Constructor::from_fn("new", |()| Ok(English)))
    }
}

impl Component for French {
    fn descriptor() -> Descriptor<Self> {
        Descriptor::new().constructor(Constructor::from_fn("new", |()| Ok(French)))
    }
}

struct Localized {
    #[allow(dead_code)]
    greeter: Arc<dyn Greeter>,
}

impl Component for Localized {
    fn descriptor() -> Descriptor<Self> {
        Descriptor::new()
            .qualifiers(Qualifiers::only([LOCALE]))
            .constructor(Constructor::from_fn("new", |greeter: Arc<dyn Greeter>| {
                Ok(Localized { greeter })
            }))
    }
}

fn graph() -> Container {
    let container = Container::new();
    container
        .bind_instance(Arc::new(Config { value: 42 }), Attributes::new())
        .and_then(|c| c.bind_component::<Repository>())
        .and_then(|c| c.bind_component::<Service>())
        .unwrap();
    container
}

fn localized() -> Container {
    let container = Container::new();
    container
        .bind::<dyn Greeter, English>(|c| c, Attributes::new())
        .and_then(|c| {
            c.bind::<dyn Greeter, French>(|c| c, Attributes::new().qualified(LOCALE.value("fr")))
        })
        .and_then(|c| c.bind_component::<Localized>())
        .unwrap();
    container
}

fn bench_registration(c: &mut Criterion) {
    let mut group = c.benchmark_group("registration");

    group.bench_function("instance", |b| {
        b.iter(|| {
            let container = Container::new();
            container
                .bind_instance(Arc::new(Config { value: 42 }), Attributes::new())
                .unwrap();
            black_box(container)
        })
    });

    group.bench_function("graph_3", |b| b.iter(|| black_box(graph())));

    group.bench_function("variants_3", |b| b.iter(|| black_box(localized())));

    group.finish();
}

fn bench_resolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolution");
    group.throughput(Throughput::Elements(1));

    let container = graph();

    group.bench_function("cached_instance", |b| {
        b.iter(|| black_box(container.get_component::<Config>().unwrap()))
    });

    group.bench_function("cached_component", |b| {
        b.iter(|| black_box(container.get_component::<Service>().unwrap()))
    });

    group.bench_function("cold_graph", |b| {
        b.iter(|| black_box(graph().get_component::<Service>().unwrap()))
    });

    group.bench_function("stateful", |b| {
        let container = Container::new();
        container
            .bind_instance(Arc::new(Config { value: 1 }), Attributes::new())
            .and_then(|c| c.bind_component_with::<Repository>(Attributes::new().stateful()))
            .unwrap();
        b.iter(|| black_box(container.get_component::<Repository>().unwrap()))
    });

    group.bench_function("not_found", |b| {
        b.iter(|| black_box(container.get_component::<French>().is_err()))
    });

    group.bench_function("contains", |b| {
        b.iter(|| black_box(container.contains::<Service>()))
    });

    group.finish();
}

fn bench_context(c: &mut Criterion) {
    let mut group = c.benchmark_group("context");

    let container = localized();
    let fr = Context::new().with(LOCALE.value("fr"));
    let noisy = Context::new()
        .with(LOCALE.value("fr"))
        .with(REGION.value("eu"));

    group.bench_function("variant_cached", |b| {
        b.iter(|| black_box(container.get_component_in::<Localized>(&fr).unwrap()))
    });

    group.bench_function("variant_narrowed", |b| {
        b.iter(|| black_box(container.get_component_in::<Localized>(&noisy).unwrap()))
    });

    group.bench_function("accept", |b| {
        let accepted = Qualifiers::only([LOCALE]);
        b.iter(|| black_box(noisy.accept(&accepted)))
    });

    group.finish();
}

fn bench_hierarchy(c: &mut Criterion) {
    let mut group = c.benchmark_group("hierarchy");

    group.bench_function("create_child", |b| {
        let root = graph();
        b.iter(|| black_box(root.make_child_container()))
    });

    group.bench_function("resolve_from_parent", |b| {
        let root = graph();
        let child = root.make_child_container().make_child_container();
        b.iter(|| black_box(child.get_component::<Service>().unwrap()))
    });

    group.bench_function("per_domain_fresh", |b| {
        let root = Container::new();
        root.bind_instance(Arc::new(Config { value: 1 }), Attributes::new())
            .and_then(|c| c.bind_component_with::<Repository>(Attributes::new().per_domain()))
            .unwrap();
        b.iter(|| {
            let domain = root.make_domain_container();
            black_box(domain.get_component::<Repository>().unwrap())
        })
    });

    group.finish();
}

fn bench_concurrent(c: &mut Criterion) {
    use std::thread;

    let mut group = c.benchmark_group("concurrent");

    group.bench_function("concurrent_reads_4", |b| {
        let container = graph();
        container.get_component::<Service>().unwrap();

        b.iter(|| {
            thread::scope(|scope| {
                for _ in 0..4 {
                    scope.spawn(|| {
                        for _ in 0..100 {
                            black_box(container.get_component::<Service>().unwrap());
                        }
                    });
                }
            })
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_registration,
    bench_resolution,
    bench_context,
    bench_hierarchy,
    bench_concurrent,
);

criterion_main!(benches);
