//! Dependency injection container
//!
//! The `Container` is the facade over one registry level. Binding methods
//! mutate that level; resolution methods start a resolution session on it.
//! Child, domain and isolated levels share their parents' bindings without
//! copying them.

use crate::catalog::Catalog;
use crate::component::{Attributes, Component, ComponentType, Method};
use crate::context::Context;
use crate::error::{DiError, ResolutionFault, Result};
use crate::factory::Factory;
use crate::inject::unerase;
use crate::interceptor::{Interceptor, InterceptorFilter};
use crate::observer::Observer;
use crate::path::DependencyPath;
use crate::registry::{Binder, Registry, ScopeKind};
use crate::resolver::{Observers, Session};
use std::sync::Arc;

#[cfg(feature = "logging")]
use tracing::{debug, trace};

/// Dependency injection container.
///
/// Cloning is cheap and yields a handle to the same level.
///
/// # Examples
///
/// ```rust
/// use contextual_injector::{Attributes, Component, Constructor, Container, Descriptor};
/// use std::sync::Arc;
///
/// trait Greeter: Send + Sync {
///     fn greet(&self) -> String;
/// }
///
/// struct English;
///
/// impl Greeter for English {
///     fn greet(&self) -> String {
///         "hello".into()
///     }
/// }
///
/// impl Component for English {
///     fn descriptor() -> Descriptor<Self> {
///         Descriptor::new().constructor(Constructor::from_fn("new", |()| Ok(English)))
///     }
/// }
///
/// let container = Container::new();
/// container.bind::<dyn Greeter, English>(|c| c, Attributes::new()).unwrap();
///
/// let greeter = container.get_component::<dyn Greeter>().unwrap();
/// assert_eq!(greeter.greet(), "hello");
/// ```
#[derive(Clone)]
pub struct Container {
    registry: Arc<Registry>,
    observers: Observers,
}

impl Container {
    /// Create a new root container.
    #[inline]
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create a root container sized for roughly `capacity` APIs.
    pub fn with_capacity(capacity: usize) -> Self {
        #[cfg(feature = "logging")]
        debug!(
            target: "contextual_injector",
            depth = 0,
            capacity,
            "Creating new root container"
        );

        Self {
            registry: Registry::root(capacity),
            observers: Arc::from(Vec::new()),
        }
    }

    /// Create a root container with the catalog's components discoverable.
    pub fn with_catalog(catalog: Catalog) -> Result<Self> {
        let container = Self::with_capacity(catalog.len());
        catalog.install(&container.binder())?;

        #[cfg(feature = "logging")]
        debug!(
            target: "contextual_injector",
            components = catalog.len(),
            "Catalog installed"
        );

        Ok(container)
    }

    fn level(&self, kind: ScopeKind) -> Self {
        Self {
            registry: self.registry.child(kind),
            observers: Arc::clone(&self.observers),
        }
    }

    /// A view of this container that also reports to `observer`.
    ///
    /// The view shares bindings and caches; only resolutions started through
    /// it (and containers derived from it) are reported.
    pub fn observed(&self, observer: Arc<dyn Observer>) -> Self {
        let mut observers: Vec<Arc<dyn Observer>> = self.observers.iter().cloned().collect();
        observers.push(observer);
        Self {
            registry: Arc::clone(&self.registry),
            observers: observers.into(),
        }
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// The registration side of this level.
    #[inline]
    pub fn binder(&self) -> Binder<'_> {
        Binder::new(&self.registry)
    }

    pub fn bind_component<C: Component>(&self) -> Result<&Self> {
        self.binder().bind_component::<C>()?;
        Ok(self)
    }

    pub fn bind_component_with<C: Component>(&self, attributes: Attributes) -> Result<&Self> {
        self.binder().bind_component_with::<C>(attributes)?;
        Ok(self)
    }

    /// Bind implementation `C` for API `A`.
    pub fn bind<A, C>(&self, cast: fn(Arc<C>) -> Arc<A>, attributes: Attributes) -> Result<&Self>
    where
        A: ?Sized + Send + Sync + 'static,
        C: Component,
    {
        self.binder().bind::<A, C>(cast, attributes)?;
        Ok(self)
    }

    pub fn bind_instance<A>(&self, instance: Arc<A>, attributes: Attributes) -> Result<&Self>
    where
        A: ?Sized + Send + Sync + 'static,
    {
        self.binder().bind_instance(instance, attributes)?;
        Ok(self)
    }

    pub fn bind_factory<A, F>(&self, factory: F, attributes: Attributes) -> Result<&Self>
    where
        A: ?Sized + Send + Sync + 'static,
        F: Factory<A>,
    {
        self.binder().bind_factory::<A, F>(factory, attributes)?;
        Ok(self)
    }

    pub fn bind_group_member<A, C>(&self, cast: fn(Arc<C>) -> Arc<A>) -> Result<&Self>
    where
        A: ?Sized + Send + Sync + 'static,
        C: Component,
    {
        self.binder().bind_group_member::<A, C>(cast)?;
        Ok(self)
    }

    /// See [`Binder::isolate_component`].
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
        self.binder()
            .isolate_component::<A, C, F>(cast, attributes, configure)?;
        Ok(self)
    }

    pub fn add_interceptor(
        &self,
        filter: InterceptorFilter,
        interceptor: Arc<dyn Interceptor>,
    ) -> Result<&Self> {
        self.binder().add_interceptor(filter, interceptor)?;
        Ok(self)
    }

    pub fn add_interceptor_component<I>(&self, filter: InterceptorFilter) -> Result<&Self>
    where
        I: Component + Interceptor,
    {
        self.binder().add_interceptor_component::<I>(filter)?;
        Ok(self)
    }

    // =========================================================================
    // Resolution
    // =========================================================================

    fn session(&self, request: ComponentType) -> Result<Session> {
        Session::begin(&self.registry, Arc::clone(&self.observers), request)
    }

    /// Resolve `A` in the default context.
    #[inline]
    pub fn get_component<A: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<A>> {
        self.get_component_in::<A>(&Context::new())
    }

    /// Resolve `A` in `context`.
    pub fn get_component_in<A: ?Sized + Send + Sync + 'static>(
        &self,
        context: &Context,
    ) -> Result<Arc<A>> {
        let api = ComponentType::of::<A>();

        #[cfg(feature = "logging")]
        trace!(
            target: "contextual_injector",
            api = api.name(),
            context = %context,
            depth = self.registry.depth(),
            "Resolving component"
        );

        let mut session = self.session(api)?;
        let handle = session.request(&self.registry, api, context)?;
        unerase(handle).ok_or_else(|| {
            DiError::resolution(
                api,
                &DependencyPath::new(),
                ResolutionFault::IncompatibleInstance,
            )
        })
    }

    /// Resolve every member of the group of `A`, in registration order.
    #[inline]
    pub fn get_component_group<A: ?Sized + Send + Sync + 'static>(&self) -> Result<Vec<Arc<A>>> {
        self.get_component_group_in::<A>(&Context::new())
    }

    pub fn get_component_group_in<A: ?Sized + Send + Sync + 'static>(
        &self,
        context: &Context,
    ) -> Result<Vec<Arc<A>>> {
        let api = ComponentType::of::<A>();
        let mut session = self.session(api)?;
        session
            .group(&self.registry, api, context)?
            .into_iter()
            .map(|handle| {
                unerase(handle).ok_or_else(|| {
                    DiError::resolution(
                        api,
                        &DependencyPath::new(),
                        ResolutionFault::IncompatibleInstance,
                    )
                })
            })
            .collect()
    }

    /// Build `C` without binding or caching it. Its dependencies resolve as
    /// usual.
    pub fn instantiate<C: Component>(&self) -> Result<Arc<C>> {
        let mut session = self.session(ComponentType::of::<C>())?;
        session.instantiate_unbound::<C>(&self.registry, &Context::new())
    }

    /// Like [`instantiate`](Self::instantiate), with extra bindings visible to
    /// this build only.
    pub fn instantiate_with<C, F>(&self, configure: F) -> Result<Arc<C>>
    where
        C: Component,
        F: FnOnce(&Binder<'_>) -> Result<()>,
    {
        let transient = self.registry.child(ScopeKind::Child);
        configure(&Binder::new(&transient))?;
        let mut session = self.session(ComponentType::of::<C>())?;
        session.instantiate_unbound::<C>(&transient, &Context::new())
    }

    /// Run `C`'s post-construction injections on an existing value.
    pub fn initialize<C: Component>(&self, target: &mut C) -> Result<()> {
        let mut session = self.session(ComponentType::of::<C>())?;
        session.initialize(&self.registry, target, &Context::new())
    }

    /// Call `method` with its parameters injected.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use contextual_injector::{Attributes, Container, Method};
    /// use std::sync::Arc;
    ///
    /// struct Prefix(&'static str);
    /// struct Name(&'static str);
    ///
    /// let container = Container::new();
    /// container.bind_instance(Arc::new(Prefix("Dr.")), Attributes::new()).unwrap();
    ///
    /// let method = Method::from_fn("greet", |(prefix, name): (Arc<Prefix>, Arc<Name>)| {
    ///     Ok(format!("{} {}", prefix.0, name.0))
    /// })
    /// .supply(1, Arc::new(Name("Who")));
    ///
    /// assert_eq!(container.invoke(method).unwrap(), "Dr. Who");
    /// ```
    pub fn invoke<R: 'static>(&self, method: Method<R>) -> Result<R> {
        let mut session = self.session(ComponentType::of::<R>())?;
        session.invoke(&self.registry, method, &Context::new())
    }

    // =========================================================================
    // Hierarchy
    // =========================================================================

    /// Create a child container that sees this container's bindings and may
    /// shadow them.
    #[inline]
    pub fn make_child_container(&self) -> Self {
        self.level(ScopeKind::Child)
    }

    pub fn make_child_container_with<F>(&self, configure: F) -> Result<Self>
    where
        F: FnOnce(&Binder<'_>) -> Result<()>,
    {
        let child = self.make_child_container();
        configure(&child.binder())?;
        Ok(child)
    }

    /// Create a domain container.
    ///
    /// Per-domain bindings of the ancestors build an independent instance
    /// graph in every domain. Bindings made in the domain itself are not
    /// visible outside of it.
    #[inline]
    pub fn make_domain_container(&self) -> Self {
        self.level(ScopeKind::Domain)
    }

    pub fn make_domain_container_with<F>(&self, configure: F) -> Result<Self>
    where
        F: FnOnce(&Binder<'_>) -> Result<()>,
    {
        let domain = self.make_domain_container();
        configure(&domain.binder())?;
        Ok(domain)
    }

    // =========================================================================
    // Introspection
    // =========================================================================

    /// Whether `A` is bound here or in an ancestor.
    #[inline]
    pub fn contains<A: ?Sized + 'static>(&self) -> bool {
        self.registry.contains(ComponentType::of::<A>())
    }

    /// Number of bindings made on this level.
    #[inline]
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Distance from the root container.
    #[inline]
    pub fn depth(&self) -> u32 {
        self.registry.depth()
    }

    /// Refuse further bindings on this level.
    #[inline]
    pub fn lock(&self) {
        self.registry.lock();
    }

    #[inline]
    pub fn is_locked(&self) -> bool {
        self.registry.is_locked()
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("kind", &self.registry.kind())
            .field("bindings", &self.len())
            .field("depth", &self.depth())
            .field("observers", &self.observers.len())
            .field("locked", &self.is_locked())
            .finish()
    }
}
