//! Binding registry
//!
//! One `Registry` per container level. Bindings are kept per API in
//! registration order; lookups walk from the requesting registry towards the
//! root and the first level with a matching binding wins, which is how child
//! containers shadow their parents without touching them.
//!
//! Domain and isolated registries additionally leave a marker in the
//! registries above them for every API they bind, so a failed lookup there
//! can report *why* the component is not visible.

use crate::cache::ComponentCache;
use crate::component::{AnyArc, Attributes, Component, ComponentType};
use crate::context::Context;
use crate::error::{BindingFault, DiError, InjectionFault, Result};
use crate::factory::{Factory, FactoryAdapter};
use crate::inject::erase;
use crate::interceptor::{Interceptor, InterceptorEntry, InterceptorFilter};
use crate::qualifier::Qualifiers;
use crate::resolver::{Blueprint, ErasedFactory};
use ahash::RandomState;
use dashmap::DashMap;
use std::any::TypeId;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, Weak};

#[cfg(feature = "logging")]
use tracing::debug;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

#[inline]
fn next_id() -> u64 {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

/// Converts a built implementation value into an API handle.
pub(crate) type Caster = Arc<dyn Fn(AnyArc) -> Option<AnyArc> + Send + Sync>;

/// Identity cast for strategies that already produce handles.
fn handle_cast() -> Caster {
    Arc::new(|handle: AnyArc| Some(handle))
}

/// Upcast from `Arc<C>` to an `A` handle.
pub(crate) fn upcast<A, C>(cast: fn(Arc<C>) -> Arc<A>) -> Caster
where
    A: ?Sized + Send + Sync + 'static,
    C: Send + Sync + 'static,
{
    Arc::new(move |value: AnyArc| value.downcast::<C>().ok().map(|c| erase(cast(c))))
}

/// How a binding produces its value.
pub(crate) enum Strategy {
    /// Construct from a component descriptor.
    Class(Arc<dyn Blueprint>),
    /// A fixed, already erased handle.
    Instance(AnyArc),
    /// Delegate to a factory.
    Factory(Arc<dyn ErasedFactory>),
}

static NO_QUALIFIERS: Qualifiers = Qualifiers::None;

/// An immutable registration.
pub(crate) struct Binding {
    pub(crate) id: u64,
    pub(crate) api: ComponentType,
    pub(crate) implementation: ComponentType,
    pub(crate) attributes: Attributes,
    pub(crate) strategy: Strategy,
    pub(crate) cast: Caster,
    /// Private registry of an isolated binding.
    pub(crate) private: Option<Arc<Registry>>,
}

impl Binding {
    fn new(
        api: ComponentType,
        implementation: ComponentType,
        attributes: Attributes,
        strategy: Strategy,
        cast: Caster,
    ) -> Self {
        Self {
            id: next_id(),
            api,
            implementation,
            attributes,
            strategy,
            cast,
            private: None,
        }
    }

    /// Qualifier types the produced value observes.
    pub(crate) fn accepted(&self) -> &Qualifiers {
        match &self.strategy {
            Strategy::Class(blueprint) => blueprint.accepted(),
            Strategy::Factory(factory) => factory.accepted(),
            Strategy::Instance(_) => &NO_QUALIFIERS,
        }
    }

    pub(crate) fn is_stateful(&self) -> bool {
        self.attributes.is_stateful()
            || matches!(&self.strategy, Strategy::Class(blueprint) if blueprint.is_stateful())
    }

    pub(crate) fn is_scoped(&self) -> bool {
        matches!(&self.strategy, Strategy::Class(blueprint) if blueprint.is_scoped())
    }

    fn is_candidate(&self, context: &Context, in_domain: bool) -> bool {
        !self.attributes.is_member()
            && (in_domain || !self.attributes.is_per_domain())
            && context.satisfies(self.attributes.qualifiers())
    }
}

/// Kind of container level a registry backs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ScopeKind {
    Root,
    Child,
    Domain,
    Isolated,
}

enum Parent {
    None,
    Owned(Arc<Registry>),
    /// Isolated registries are owned by a binding of their enclosing registry.
    Enclosing(Weak<Registry>),
}

/// A binding chosen for a lookup, with the registry that owns it.
#[derive(Clone)]
pub(crate) struct Selected {
    pub(crate) binding: Arc<Binding>,
    pub(crate) owner: Arc<Registry>,
}

/// Why a lookup found nothing.
#[derive(Debug)]
pub(crate) enum Miss {
    NotFound,
    Ambiguous(Vec<String>),
    Hidden(InjectionFault),
}

pub(crate) struct Registry {
    id: u64,
    tree: u64,
    kind: ScopeKind,
    depth: u32,
    parent: Parent,
    bindings: DashMap<TypeId, Vec<Arc<Binding>>, RandomState>,
    hidden: DashMap<TypeId, ScopeKind, RandomState>,
    interceptors: RwLock<Vec<InterceptorEntry>>,
    cache: ComponentCache,
    locked: AtomicBool,
}

impl Registry {
    fn shard_amount(capacity: usize) -> usize {
        if capacity <= 16 {
            8
        } else if capacity <= 64 {
            16
        } else {
            32
        }
    }

    fn build(kind: ScopeKind, parent: Parent, tree: u64, depth: u32, capacity: usize) -> Self {
        let id = next_id();
        Self {
            id,
            tree: if tree == 0 { id } else { tree },
            kind,
            depth,
            parent,
            bindings: DashMap::with_capacity_and_hasher_and_shard_amount(
                capacity,
                RandomState::new(),
                Self::shard_amount(capacity),
            ),
            hidden: DashMap::with_hasher_and_shard_amount(RandomState::new(), 8),
            interceptors: RwLock::new(Vec::new()),
            cache: ComponentCache::new(),
            locked: AtomicBool::new(false),
        }
    }

    pub(crate) fn root(capacity: usize) -> Arc<Self> {
        Arc::new(Self::build(ScopeKind::Root, Parent::None, 0, 0, capacity))
    }

    pub(crate) fn child(self: &Arc<Self>, kind: ScopeKind) -> Arc<Self> {
        let parent = match kind {
            ScopeKind::Isolated => Parent::Enclosing(Arc::downgrade(self)),
            _ => Parent::Owned(Arc::clone(self)),
        };

        #[cfg(feature = "logging")]
        debug!(
            target: "contextual_injector",
            parent_depth = self.depth,
            child_depth = self.depth + 1,
            kind = ?kind,
            parent_bindings = self.len(),
            "Creating child registry"
        );

        Arc::new(Self::build(kind, parent, self.tree, self.depth + 1, 0))
    }

    #[inline]
    pub(crate) fn tree(&self) -> u64 {
        self.tree
    }

    #[inline]
    pub(crate) fn depth(&self) -> u32 {
        self.depth
    }

    #[inline]
    pub(crate) fn kind(&self) -> ScopeKind {
        self.kind
    }

    #[inline]
    pub(crate) fn cache(&self) -> &ComponentCache {
        &self.cache
    }

    pub(crate) fn parent(&self) -> Option<Arc<Registry>> {
        match &self.parent {
            Parent::None => None,
            Parent::Owned(parent) => Some(Arc::clone(parent)),
            Parent::Enclosing(parent) => parent.upgrade(),
        }
    }

    /// This registry followed by its ancestors.
    pub(crate) fn chain(self: &Arc<Self>) -> Vec<Arc<Registry>> {
        let mut chain = vec![Arc::clone(self)];
        while let Some(parent) = chain.last().and_then(|registry| registry.parent()) {
            chain.push(parent);
        }
        chain
    }

    #[inline]
    fn same(a: &Registry, b: &Registry) -> bool {
        a.id == b.id
    }

    // =========================================================================
    // Registration
    // =========================================================================

    pub(crate) fn lock(&self) {
        #[cfg(feature = "logging")]
        debug!(
            target: "contextual_injector",
            depth = self.depth,
            bindings = self.len(),
            "Locking registry - no further bindings allowed"
        );

        self.locked.store(true, Ordering::Release);
    }

    #[inline]
    pub(crate) fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Acquire)
    }

    fn check_unlocked(&self, component: ComponentType) -> Result<()> {
        if self.is_locked() {
            return Err(DiError::binding(component, BindingFault::Locked));
        }
        Ok(())
    }

    fn register(&self, binding: Binding) -> Result<()> {
        self.check_unlocked(binding.implementation)?;

        let api = binding.api;
        let mut entry = self.bindings.entry(api.id()).or_default();
        if binding.attributes.is_primary() && !binding.attributes.is_member() {
            let duplicate = entry.iter().any(|existing| {
                existing.attributes.is_primary()
                    && !existing.attributes.is_member()
                    && existing.attributes.qualifiers() == binding.attributes.qualifiers()
            });
            if duplicate {
                return Err(DiError::binding(
                    api,
                    BindingFault::DuplicatePrimary {
                        qualifiers: binding.attributes.qualifiers().to_string(),
                    },
                ));
            }
        }

        #[cfg(feature = "logging")]
        debug!(
            target: "contextual_injector",
            api = api.name(),
            implementation = binding.implementation.name(),
            qualifiers = %binding.attributes.qualifiers(),
            primary = binding.attributes.is_primary(),
            member = binding.attributes.is_member(),
            depth = self.depth,
            "Registering binding"
        );

        entry.push(Arc::new(binding));
        drop(entry);

        if matches!(self.kind, ScopeKind::Domain | ScopeKind::Isolated) {
            self.hide_in_ancestors(api);
        }
        Ok(())
    }

    /// Leave a marker above this registry for an API bound here.
    fn hide_in_ancestors(&self, api: ComponentType) {
        let mut level = self.parent();
        while let Some(registry) = level {
            registry.hidden.entry(api.id()).or_insert(self.kind);
            // Isolation only hides from the enclosing registry
            if self.kind == ScopeKind::Isolated {
                break;
            }
            level = registry.parent();
        }
    }

    fn add_interceptor(&self, entry: InterceptorEntry, component: ComponentType) -> Result<()> {
        self.check_unlocked(component)?;

        #[cfg(feature = "logging")]
        debug!(
            target: "contextual_injector",
            interceptor = component.name(),
            depth = self.depth,
            "Registering interceptor"
        );

        self.interceptors
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry);
        Ok(())
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    /// Choose the binding answering `api` in `context`.
    pub(crate) fn select(
        self: &Arc<Self>,
        api: ComponentType,
        context: &Context,
    ) -> std::result::Result<Selected, Miss> {
        let mut in_domain = false;
        let mut per_domain_only = false;

        for registry in self.chain() {
            in_domain |= registry.kind == ScopeKind::Domain;

            let Some(bindings) = registry.bindings.get(&api.id()) else {
                continue;
            };
            let candidates: Vec<&Arc<Binding>> = bindings
                .iter()
                .filter(|binding| binding.is_candidate(context, in_domain))
                .collect();
            if candidates.is_empty() {
                per_domain_only |= bindings
                    .iter()
                    .any(|binding| binding.attributes.is_per_domain());
                continue;
            }

            let binding = Self::pick(&candidates)?;
            drop(bindings);
            return Ok(Selected {
                binding,
                owner: registry,
            });
        }

        if per_domain_only {
            return Err(Miss::Hidden(InjectionFault::NoDomain));
        }
        for registry in self.chain() {
            if let Some(kind) = registry.hidden.get(&api.id()) {
                return Err(Miss::Hidden(match *kind {
                    ScopeKind::Isolated => InjectionFault::HiddenInIsolation,
                    _ => InjectionFault::HiddenInDomain,
                }));
            }
        }
        Err(Miss::NotFound)
    }

    /// Primary tier strictly first, then the most specific qualifier set.
    fn pick(candidates: &[&Arc<Binding>]) -> std::result::Result<Arc<Binding>, Miss> {
        let primaries: Vec<&Arc<Binding>> = candidates
            .iter()
            .copied()
            .filter(|binding| binding.attributes.is_primary())
            .collect();
        let primary_tier = !primaries.is_empty();
        let tier = if primary_tier { &primaries[..] } else { candidates };

        let specificity = tier
            .iter()
            .map(|binding| binding.attributes.qualifiers().len())
            .max()
            .unwrap_or(0);
        let best: Vec<&Arc<Binding>> = tier
            .iter()
            .copied()
            .filter(|binding| binding.attributes.qualifiers().len() == specificity)
            .collect();

        match best.as_slice() {
            [] => Err(Miss::NotFound),
            [only] => Ok(Arc::clone(only)),
            [first, ..] if !primary_tier => Ok(Arc::clone(first)),
            all => Err(Miss::Ambiguous(
                all.iter()
                    .map(|binding| {
                        format!(
                            "{}{}",
                            binding.implementation,
                            binding.attributes.qualifiers()
                        )
                    })
                    .collect(),
            )),
        }
    }

    /// Group members of `api`, root registry first, each in registration order.
    pub(crate) fn members(self: &Arc<Self>, api: ComponentType, context: &Context) -> Vec<Selected> {
        let chain = self.chain();
        let mut members = Vec::new();
        for (level, registry) in chain.iter().enumerate().rev() {
            let in_domain = chain[..=level]
                .iter()
                .any(|registry| registry.kind == ScopeKind::Domain);
            let Some(bindings) = registry.bindings.get(&api.id()) else {
                continue;
            };
            members.extend(
                bindings
                    .iter()
                    .filter(|binding| {
                        binding.attributes.is_member()
                            && (in_domain || !binding.attributes.is_per_domain())
                            && context.satisfies(binding.attributes.qualifiers())
                    })
                    .map(|binding| Selected {
                        binding: Arc::clone(binding),
                        owner: Arc::clone(registry),
                    }),
            );
        }
        members
    }

    /// The registry a selected binding builds and caches in.
    ///
    /// Isolated bindings use their private registry; per-domain bindings the
    /// nearest domain between `self` (the lookup start) and the owner.
    pub(crate) fn home(
        self: &Arc<Self>,
        selected: &Selected,
    ) -> std::result::Result<Arc<Registry>, InjectionFault> {
        if let Some(private) = &selected.binding.private {
            return Ok(Arc::clone(private));
        }
        if !selected.binding.attributes.is_per_domain() {
            return Ok(Arc::clone(&selected.owner));
        }
        for registry in self.chain() {
            if registry.kind == ScopeKind::Domain {
                return Ok(registry);
            }
            if Self::same(&registry, &selected.owner) {
                break;
            }
        }
        Err(InjectionFault::NoDomain)
    }

    /// Interceptors visible from here, root-declared first.
    pub(crate) fn interceptors(self: &Arc<Self>) -> Vec<(InterceptorEntry, Arc<Registry>)> {
        let mut entries = Vec::new();
        for registry in self.chain().into_iter().rev() {
            let declared = registry
                .interceptors
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .clone();
            entries.extend(declared.into_iter().map(|entry| (entry, Arc::clone(&registry))));
        }
        entries
    }

    /// Whether any level of the chain binds `api`.
    pub(crate) fn contains(self: &Arc<Self>, api: ComponentType) -> bool {
        self.chain()
            .iter()
            .any(|registry| registry.bindings.contains_key(&api.id()))
    }

    /// Number of bindings in this level.
    pub(crate) fn len(&self) -> usize {
        self.bindings.iter().map(|entry| entry.value().len()).sum()
    }
}

// =============================================================================
// Binder
// =============================================================================

/// The mutation side of a registry.
///
/// Handed to configuration closures such as
/// [`Container::make_child_container_with`](crate::Container::make_child_container_with)
/// and [`Binder::isolate_component`].
pub struct Binder<'a> {
    registry: &'a Arc<Registry>,
}

impl<'a> Binder<'a> {
    #[inline]
    pub(crate) fn new(registry: &'a Arc<Registry>) -> Self {
        Self { registry }
    }

    /// Bind a component as its own API.
    #[inline]
    pub fn bind_component<C: Component>(&self) -> Result<&Self> {
        self.bind_component_with::<C>(Attributes::new())
    }

    pub fn bind_component_with<C: Component>(&self, attributes: Attributes) -> Result<&Self> {
        self.bind::<C, C>(|component| component, attributes)
    }

    /// Bind implementation `C` for API `A`; `cast` performs the upcast,
    /// typically `|c| c` coercing to `Arc<dyn Trait>`.
    pub fn bind<A, C>(&self, cast: fn(Arc<C>) -> Arc<A>, attributes: Attributes) -> Result<&Self>
    where
        A: ?Sized + Send + Sync + 'static,
        C: Component,
    {
        let implementation = ComponentType::of::<C>();
        let descriptor = C::descriptor();
        if descriptor.constructors().is_empty() {
            return Err(DiError::binding(
                implementation,
                BindingFault::NotInstantiable,
            ));
        }
        self.registry.register(Binding::new(
            ComponentType::of::<A>(),
            implementation,
            attributes,
            Strategy::Class(Arc::new(descriptor)),
            upcast(cast),
        ))?;
        Ok(self)
    }

    /// Bind a ready-made instance.
    pub fn bind_instance<A>(&self, instance: Arc<A>, attributes: Attributes) -> Result<&Self>
    where
        A: ?Sized + Send + Sync + 'static,
    {
        let api = ComponentType::of::<A>();
        self.registry.register(Binding::new(
            api,
            api,
            attributes,
            Strategy::Instance(erase(instance)),
            handle_cast(),
        ))?;
        Ok(self)
    }

    /// Bind a factory producing `A`.
    pub fn bind_factory<A, F>(&self, factory: F, attributes: Attributes) -> Result<&Self>
    where
        A: ?Sized + Send + Sync + 'static,
        F: Factory<A>,
    {
        self.registry.register(Binding::new(
            ComponentType::of::<A>(),
            ComponentType::of::<F>(),
            attributes,
            Strategy::Factory(Arc::new(FactoryAdapter::new(factory))),
            handle_cast(),
        ))?;
        Ok(self)
    }

    /// Add `C` to the group of `A`.
    pub fn bind_group_member<A, C>(&self, cast: fn(Arc<C>) -> Arc<A>) -> Result<&Self>
    where
        A: ?Sized + Send + Sync + 'static,
        C: Component,
    {
        self.bind::<A, C>(cast, Attributes::new().member())
    }

    /// Bind `C` for `A` with a private registry for its own dependencies.
    ///
    /// `configure` populates the private registry. `C` resolves its
    /// dependencies there first, then here; nothing bound privately is
    /// visible to other consumers.
    pub fn isolate_component<A, C, F>(
        &self,
        cast: fn(Arc<C>) -> Arc<A>,
        attributes: Attributes,
        configure: F,
    ) -> Result<&Self>
    where
        A: ?Sized + Send + Sync + 'static,
        C: Component,
        F: FnOnce(&Binder<'_>) -> Result<()>,
    {
        let implementation = ComponentType::of::<C>();
        let descriptor = C::descriptor();
        if descriptor.constructors().is_empty() {
            return Err(DiError::binding(
                implementation,
                BindingFault::NotInstantiable,
            ));
        }
        self.registry.check_unlocked(implementation)?;

        let private = self.registry.child(ScopeKind::Isolated);
        configure(&Binder::new(&private))?;

        let mut binding = Binding::new(
            ComponentType::of::<A>(),
            implementation,
            attributes,
            Strategy::Class(Arc::new(descriptor)),
            upcast(cast),
        );
        binding.private = Some(private);
        self.registry.register(binding)?;
        Ok(self)
    }

    /// Intercept matching resolutions with a prepared interceptor.
    pub fn add_interceptor(
        &self,
        filter: InterceptorFilter,
        interceptor: Arc<dyn Interceptor>,
    ) -> Result<&Self> {
        self.registry.add_interceptor(
            InterceptorEntry::instance(filter, interceptor),
            ComponentType::of::<dyn Interceptor>(),
        )?;
        Ok(self)
    }

    /// Intercept matching resolutions with a container-built interceptor.
    pub fn add_interceptor_component<I>(&self, filter: InterceptorFilter) -> Result<&Self>
    where
        I: Component + Interceptor,
    {
        self.registry.add_interceptor(
            InterceptorEntry::component::<I>(filter),
            ComponentType::of::<I>(),
        )?;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{Constructor, Descriptor};
    use crate::qualifier::QualifierType;

    const LOCALE: QualifierType = QualifierType::new("locale");

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

    struct Abstract;

    impl Component for Abstract {
        fn descriptor() -> Descriptor<Self> {
            Descriptor::new()
        }
    }

    fn greeter() -> ComponentType {
        ComponentType::of::<dyn Greeter>()
    }

    fn selected(registry: &Arc<Registry>, context: &Context) -> ComponentType {
        registry
            .select(greeter(), context)
            .map(|selected| selected.binding.implementation)
            .unwrap()
    }

    #[test]
    fn test_primary_beats_fallback_regardless_of_order() {
        let registry = Registry::root(0);
        let binder = Binder::new(&registry);
        binder
            .bind::<dyn Greeter, French>(|c| c, Attributes::new().fallback())
            .unwrap();
        binder
            .bind::<dyn Greeter, English>(|c| c, Attributes::new())
            .unwrap();

        assert_eq!(selected(&registry, &Context::new()), ComponentType::of::<English>());
    }

    #[test]
    fn test_qualified_binding_is_more_specific() {
        let registry = Registry::root(0);
        let binder = Binder::new(&registry);
        binder
            .bind::<dyn Greeter, English>(|c| c, Attributes::new())
            .unwrap();
        binder
            .bind::<dyn Greeter, French>(|c| c, Attributes::new().qualified(LOCALE.value("fr")))
            .unwrap();

        let fr = Context::new().with(LOCALE.value("fr"));
        let de = Context::new().with(LOCALE.value("de"));
        assert_eq!(selected(&registry, &fr), ComponentType::of::<French>());
        // Unmatched qualifiers fall back to the default binding
        assert_eq!(selected(&registry, &de), ComponentType::of::<English>());
    }

    #[test]
    fn test_duplicate_primary_rejected() {
        let registry = Registry::root(0);
        let binder = Binder::new(&registry);
        binder
            .bind::<dyn Greeter, English>(|c| c, Attributes::new())
            .unwrap();
        let error = binder
            .bind::<dyn Greeter, French>(|c| c, Attributes::new())
            .err()
            .unwrap();
        assert!(error.is_binding());

        // A fallback next to the primary is fine
        binder
            .bind::<dyn Greeter, French>(|c| c, Attributes::new().fallback())
            .unwrap();
    }

    #[test]
    fn test_ambiguous_primaries() {
        const REGION: QualifierType = QualifierType::new("region");

        let registry = Registry::root(0);
        let binder = Binder::new(&registry);
        binder
            .bind::<dyn Greeter, English>(|c| c, Attributes::new().qualified(LOCALE.value("en")))
            .unwrap();
        binder
            .bind::<dyn Greeter, French>(|c| c, Attributes::new().qualified(REGION.value("eu")))
            .unwrap();

        let both = Context::new()
            .with(LOCALE.value("en"))
            .with(REGION.value("eu"));
        assert!(matches!(
            registry.select(greeter(), &both),
            Err(Miss::Ambiguous(candidates)) if candidates.len() == 2
        ));
    }

    #[test]
    fn test_not_instantiable() {
        let registry = Registry::root(0);
        let error = Binder::new(&registry)
            .bind_component::<Abstract>()
            .err()
            .unwrap();
        assert!(matches!(
            error,
            DiError::Binding {
                fault: BindingFault::NotInstantiable,
                ..
            }
        ));
    }

    #[test]
    fn test_child_shadows_parent() {
        let root = Registry::root(0);
        Binder::new(&root)
            .bind::<dyn Greeter, English>(|c| c, Attributes::new())
            .unwrap();
        let child = root.child(ScopeKind::Child);
        Binder::new(&child)
            .bind::<dyn Greeter, French>(|c| c, Attributes::new())
            .unwrap();

        assert_eq!(selected(&child, &Context::new()), ComponentType::of::<French>());
        assert_eq!(selected(&root, &Context::new()), ComponentType::of::<English>());
    }

    #[test]
    fn test_domain_binding_hidden_from_parent() {
        let root = Registry::root(0);
        let domain = root.child(ScopeKind::Domain);
        Binder::new(&domain)
            .bind::<dyn Greeter, English>(|c| c, Attributes::new())
            .unwrap();

        assert!(matches!(
            root.select(greeter(), &Context::new()),
            Err(Miss::Hidden(InjectionFault::HiddenInDomain))
        ));
    }

    #[test]
    fn test_members_root_first_in_order() {
        let root = Registry::root(0);
        Binder::new(&root)
            .bind_group_member::<dyn Greeter, English>(|c| c)
            .unwrap();
        let child = root.child(ScopeKind::Child);
        Binder::new(&child)
            .bind_group_member::<dyn Greeter, French>(|c| c)
            .unwrap();

        let members: Vec<ComponentType> = child
            .members(greeter(), &Context::new())
            .into_iter()
            .map(|selected| selected.binding.implementation)
            .collect();
        assert_eq!(
            members,
            vec![ComponentType::of::<English>(), ComponentType::of::<French>()]
        );
        // Members never answer single lookups
        assert!(matches!(
            child.select(greeter(), &Context::new()),
            Err(Miss::NotFound)
        ));
    }

    #[test]
    fn test_locked_registry_rejects_binds() {
        let registry = Registry::root(0);
        registry.lock();
        let error = Binder::new(&registry)
            .bind_component::<English>()
            .err()
            .unwrap();
        assert!(matches!(
            error,
            DiError::Binding {
                fault: BindingFault::Locked,
                ..
            }
        ));
    }
}
