//! Dependency graph resolver
//!
//! A [`Session`] is one synchronous resolution on the caller's thread. It
//! walks the dependency graph depth first, carrying the dependency path
//! (which doubles as the instantiation stack for cycle detection), the
//! context of the current node and the nested caches of enclosing scope
//! roots.
//!
//! Per node:
//!
//! 1. select a binding from the lookup registry (local first, then parents)
//! 2. narrow the context to the qualifiers the binding observes
//! 3. replay the cached instance for `(binding, narrowed context)` if any
//! 4. otherwise mark the node as instantiating, failing on a cycle, and build
//!    it once through the cache cell
//! 5. run the interceptor chain before handing the value to its consumer
//!
//! Factories and interceptors only ever see a [`Resolver`], which exposes
//! dependency lookups but not the container.

use crate::cache::{CacheKey, ComponentCache};
use crate::component::{
    AnyArc, Component, ComponentType, Constructor, Dependency, DependencyKind, Descriptor, Method,
};
use crate::container::Container;
use crate::context::Context;
use crate::error::{DiError, InjectionFault, ResolutionFault, Result};
use crate::inject::{unerase, Argument, Arguments};
use crate::interceptor::{Interception, Interceptor, InterceptorEntry, Prepared, Verdict};
use crate::observer::Observer;
use crate::path::DependencyPath;
use crate::qualifier::{Qualifier, Qualifiers};
use crate::registry::{Binding, Caster, Miss, Registry, Selected, Strategy};
use std::cell::RefCell;
use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, Weak};

#[cfg(feature = "logging")]
use tracing::{debug, trace};

pub(crate) type Observers = Arc<[Arc<dyn Observer>]>;

// =============================================================================
// Active sessions
// =============================================================================

thread_local! {
    /// Container trees with a session running on this thread.
    static ACTIVE: RefCell<Vec<u64>> = const { RefCell::new(Vec::new()) };
}

/// Marks a container tree as resolving on the current thread.
struct ActiveGuard {
    tree: u64,
}

impl ActiveGuard {
    fn enter(tree: u64) -> Option<Self> {
        ACTIVE.with(|active| {
            let mut active = active.borrow_mut();
            if active.contains(&tree) {
                None
            } else {
                active.push(tree);
                Some(Self { tree })
            }
        })
    }
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        ACTIVE.with(|active| {
            let mut active = active.borrow_mut();
            if let Some(position) = active.iter().rposition(|tree| *tree == self.tree) {
                active.remove(position);
            }
        });
    }
}

// =============================================================================
// Build strategies
// =============================================================================

/// A type-erased component descriptor.
pub(crate) trait Blueprint: Send + Sync {
    fn implementation(&self) -> ComponentType;

    fn accepted(&self) -> &Qualifiers;

    fn is_stateful(&self) -> bool;

    fn is_scoped(&self) -> bool;

    /// Build the component; returns the erased `Arc<C>`.
    fn construct(
        &self,
        session: &mut Session,
        home: &Arc<Registry>,
        context: &Context,
    ) -> Result<AnyArc>;
}

impl<C: Component> Blueprint for Descriptor<C> {
    fn implementation(&self) -> ComponentType {
        ComponentType::of::<C>()
    }

    fn accepted(&self) -> &Qualifiers {
        Descriptor::accepted(self)
    }

    fn is_stateful(&self) -> bool {
        Descriptor::is_stateful(self)
    }

    fn is_scoped(&self) -> bool {
        Descriptor::is_scoped(self)
    }

    fn construct(
        &self,
        session: &mut Session,
        home: &Arc<Registry>,
        context: &Context,
    ) -> Result<AnyArc> {
        session
            .build(self, home, context)
            .map(|value| Arc::new(value) as AnyArc)
    }
}

/// A type-erased factory binding; produces API handles.
pub(crate) trait ErasedFactory: Send + Sync {
    fn accepted(&self) -> &Qualifiers;

    fn produce(
        &self,
        session: &mut Session,
        home: &Arc<Registry>,
        api: ComponentType,
        context: &Context,
    ) -> Result<AnyArc>;
}

// =============================================================================
// Session
// =============================================================================

/// State of one resolution call.
pub(crate) struct Session {
    observers: Observers,
    path: DependencyPath,
    /// Caches of the scope roots currently being built, innermost last.
    nested: Vec<ComponentCache>,
    intercepting: bool,
    _active: ActiveGuard,
}

impl Session {
    /// Start a session on `registry`'s tree.
    ///
    /// Fails if this thread is already resolving in the same tree: a
    /// container used from inside one of its own constructions would escape
    /// cycle detection.
    pub(crate) fn begin(
        registry: &Registry,
        observers: Observers,
        request: ComponentType,
    ) -> Result<Self> {
        let active = ActiveGuard::enter(registry.tree()).ok_or_else(|| {
            DiError::resolution(
                request,
                &DependencyPath::new(),
                ResolutionFault::DynamicDependency,
            )
        })?;
        Ok(Self {
            observers,
            path: DependencyPath::new(),
            nested: Vec::new(),
            intercepting: true,
            _active: active,
        })
    }

    #[inline]
    pub(crate) fn path(&self) -> &DependencyPath {
        &self.path
    }

    /// Resolve a top-level request, interceptors included.
    pub(crate) fn request(
        &mut self,
        lookup: &Arc<Registry>,
        api: ComponentType,
        context: &Context,
    ) -> Result<AnyArc> {
        let handle = self.resolve(lookup, api, context)?;
        self.intercept(lookup, api, context, handle)?
            .ok_or_else(|| DiError::resolution(api, &self.path, ResolutionFault::Vetoed))
    }

    /// Resolve every group member of `api`.
    pub(crate) fn group(
        &mut self,
        lookup: &Arc<Registry>,
        api: ComponentType,
        context: &Context,
    ) -> Result<Vec<AnyArc>> {
        let members = lookup.members(api, context);
        let mut handles = Vec::with_capacity(members.len());
        for member in &members {
            let handle = self.provide(lookup, member, context)?;
            if let Some(handle) = self.intercept(lookup, api, context, handle)? {
                handles.push(handle);
            }
        }
        Ok(handles)
    }

    fn resolve(
        &mut self,
        lookup: &Arc<Registry>,
        api: ComponentType,
        context: &Context,
    ) -> Result<AnyArc> {
        let selected = lookup
            .select(api, context)
            .map_err(|miss| self.miss(api, miss))?;
        self.provide(lookup, &selected, context)
    }

    fn miss(&self, api: ComponentType, miss: Miss) -> DiError {
        #[cfg(feature = "logging")]
        debug!(
            target: "contextual_injector",
            api = api.name(),
            path = %self.path,
            miss = ?miss,
            "Lookup failed"
        );

        match miss {
            Miss::NotFound => DiError::resolution(api, &self.path, ResolutionFault::NotFound),
            Miss::Ambiguous(candidates) => DiError::resolution(
                api,
                &self.path,
                ResolutionFault::AmbiguousBinding { candidates },
            ),
            Miss::Hidden(fault) => DiError::injection(api, &self.path, fault),
        }
    }

    /// Produce the handle for a selected binding, with its path node pushed.
    fn provide(
        &mut self,
        lookup: &Arc<Registry>,
        selected: &Selected,
        context: &Context,
    ) -> Result<AnyArc> {
        let binding = &selected.binding;
        self.path.push(binding.api, binding.implementation);
        for observer in self.observers.iter() {
            observer.resolved(&self.path, binding.implementation);
        }
        let result = self.produce(lookup, selected, context);
        self.path.pop();
        result
    }

    fn produce(
        &mut self,
        lookup: &Arc<Registry>,
        selected: &Selected,
        context: &Context,
    ) -> Result<AnyArc> {
        let binding = &selected.binding;
        if let Strategy::Instance(handle) = &binding.strategy {
            return Ok(Arc::clone(handle));
        }

        let home = lookup
            .home(selected)
            .map_err(|fault| DiError::injection(binding.api, &self.path, fault))?;
        let narrowed = context.accept(binding.accepted());

        let value = if binding.is_stateful() {
            self.begin_instantiation()?;
            self.instantiate(&home, binding, &narrowed)?
        } else {
            let key = CacheKey::new(binding.id, narrowed.clone());
            let cell = match self.nested.last() {
                Some(nested) if binding.is_scoped() => nested.cell(key),
                _ => home.cache().cell(key),
            };
            match cell.get() {
                Some(value) => {
                    #[cfg(feature = "logging")]
                    trace!(
                        target: "contextual_injector",
                        implementation = binding.implementation.name(),
                        context = %narrowed,
                        depth = home.depth(),
                        "Component replayed from cache"
                    );
                    Arc::clone(value)
                }
                None => {
                    // Before touching the cell: a cyclic re-entry must fail
                    // instead of waiting on its own initialisation.
                    self.begin_instantiation()?;
                    let value =
                        cell.get_or_try_init(|| self.instantiate(&home, binding, &narrowed))?;
                    Arc::clone(value)
                }
            }
        };

        (binding.cast)(value).ok_or_else(|| {
            DiError::resolution(
                binding.api,
                &self.path,
                ResolutionFault::IncompatibleInstance,
            )
        })
    }

    fn begin_instantiation(&mut self) -> Result<()> {
        if self.path.begin_instantiation() {
            Ok(())
        } else {
            #[cfg(feature = "logging")]
            debug!(
                target: "contextual_injector",
                path = %self.path,
                "Circular reference detected"
            );
            Err(DiError::circular(&self.path))
        }
    }

    fn instantiate(
        &mut self,
        home: &Arc<Registry>,
        binding: &Binding,
        context: &Context,
    ) -> Result<AnyArc> {
        #[cfg(feature = "logging")]
        debug!(
            target: "contextual_injector",
            api = binding.api.name(),
            implementation = binding.implementation.name(),
            context = %context,
            depth = home.depth(),
            "Instantiating component"
        );

        let value = match &binding.strategy {
            Strategy::Class(blueprint) => blueprint.construct(self, home, context)?,
            Strategy::Factory(factory) => factory.produce(self, home, binding.api, context)?,
            Strategy::Instance(handle) => return Ok(Arc::clone(handle)),
        };
        self.notify_instantiated(&value);
        Ok(value)
    }

    /// Build the component a factory delegated to, in the factory's home.
    pub(crate) fn delegate(
        &mut self,
        blueprint: &dyn Blueprint,
        cast: &Caster,
        home: &Arc<Registry>,
        api: ComponentType,
        context: &Context,
    ) -> Result<AnyArc> {
        let narrowed = context.accept(blueprint.accepted());
        self.path.push(api, blueprint.implementation());
        let result = self
            .begin_instantiation()
            .and_then(|()| blueprint.construct(self, home, &narrowed))
            .and_then(|value| {
                self.notify_instantiated(&value);
                cast(value).ok_or_else(|| {
                    DiError::resolution(api, &self.path, ResolutionFault::IncompatibleInstance)
                })
            });
        self.path.pop();
        result
    }

    fn notify_instantiated(&self, value: &AnyArc) {
        for observer in self.observers.iter() {
            observer.instantiated(&self.path, value);
        }
    }

    // =========================================================================
    // Dependencies
    // =========================================================================

    pub(crate) fn arguments(
        &mut self,
        lookup: &Arc<Registry>,
        params: &[Dependency],
        context: &Context,
    ) -> Result<Arguments> {
        let mut values = Vec::with_capacity(params.len());
        for param in params {
            values.push(self.resolve_dependency(lookup, param, context)?);
        }
        Ok(Arguments::new(values))
    }

    /// Resolve one injection point of a consumer whose context is `context`.
    pub(crate) fn resolve_dependency(
        &mut self,
        lookup: &Arc<Registry>,
        dependency: &Dependency,
        context: &Context,
    ) -> Result<Argument> {
        let context = context.extend(dependency.qualifiers());
        let api = dependency.api();

        match dependency.kind() {
            DependencyKind::Context => Ok(Argument::Context(context)),
            DependencyKind::Lazy => Ok(Argument::Lazy(LazySource {
                registry: Arc::downgrade(lookup),
                api,
                context,
                observers: Arc::downgrade(&self.observers),
            })),
            DependencyKind::Group => self.group(lookup, api, &context).map(Argument::Many),
            DependencyKind::Component => {
                if api == ComponentType::of::<Container>() {
                    return Err(DiError::resolution(
                        api,
                        &self.path,
                        ResolutionFault::DynamicDependency,
                    ));
                }

                let resolved = self
                    .resolve(lookup, api, &context)
                    .and_then(|handle| self.intercept(lookup, api, &context, handle));
                match resolved {
                    Ok(Some(handle)) => Ok(Argument::One(Some(handle))),
                    Ok(None) if dependency.is_optional() => Ok(Argument::One(None)),
                    Ok(None) => Err(DiError::resolution(
                        api,
                        &self.path,
                        ResolutionFault::Vetoed,
                    )),
                    Err(error) if dependency.is_optional() && error.is_absence() => {
                        #[cfg(feature = "logging")]
                        trace!(
                            target: "contextual_injector",
                            api = api.name(),
                            error = %error,
                            "Optional dependency unavailable"
                        );
                        Ok(Argument::One(None))
                    }
                    Err(error) => Err(error),
                }
            }
        }
    }

    // =========================================================================
    // Interception
    // =========================================================================

    fn intercept(
        &mut self,
        lookup: &Arc<Registry>,
        api: ComponentType,
        context: &Context,
        handle: AnyArc,
    ) -> Result<Option<AnyArc>> {
        if !self.intercepting {
            return Ok(Some(handle));
        }
        let entries = lookup.interceptors();
        if entries.is_empty() {
            return Ok(Some(handle));
        }

        self.intercepting = false;
        let result = self.run_chain(entries, api, context, handle);
        self.intercepting = true;
        result
    }

    fn run_chain(
        &mut self,
        entries: Vec<(InterceptorEntry, Arc<Registry>)>,
        api: ComponentType,
        context: &Context,
        mut current: AnyArc,
    ) -> Result<Option<AnyArc>> {
        for (entry, owner) in entries {
            if !entry.filter().matches(api, context) {
                continue;
            }
            let interceptor = self.prepare(&entry, &owner)?;
            let interception = Interception::new(
                api,
                context.clone(),
                self.path.clone(),
                Arc::clone(&current),
            );
            let verdict = {
                let mut resolver = Resolver::new(self, Arc::clone(&owner), context.clone());
                interceptor.intercept(&interception, &mut resolver)
            }
            .map_err(|error| DiError::lift(error, api, &self.path))?;

            match verdict {
                Verdict::Keep => {}
                Verdict::Replace(replacement) => current = replacement,
                Verdict::Veto => {
                    #[cfg(feature = "logging")]
                    debug!(
                        target: "contextual_injector",
                        api = api.name(),
                        path = %self.path,
                        "Dependency vetoed by interceptor"
                    );
                    return Ok(None);
                }
            }
        }
        Ok(Some(current))
    }

    /// The interceptor of `entry`, built once in its declaring registry.
    fn prepare(
        &mut self,
        entry: &InterceptorEntry,
        owner: &Arc<Registry>,
    ) -> Result<Arc<dyn Interceptor>> {
        match entry.prepared() {
            Prepared::Ready(interceptor) => Ok(interceptor),
            Prepared::Pending {
                blueprint,
                cast,
                built,
            } => {
                let implementation = blueprint.implementation();
                self.path.push(implementation, implementation);
                let result = self.begin_instantiation().and_then(|()| {
                    built
                        .get_or_try_init(|| {
                            let value = blueprint.construct(self, owner, &Context::new())?;
                            cast(value).ok_or_else(|| {
                                DiError::resolution(
                                    implementation,
                                    &self.path,
                                    ResolutionFault::IncompatibleInstance,
                                )
                            })
                        })
                        .map(Arc::clone)
                });
                self.path.pop();
                result
            }
        }
    }

    // =========================================================================
    // Components
    // =========================================================================

    /// Run constructor selection, construction and injections for `C`.
    fn build<C: Component>(
        &mut self,
        descriptor: &Descriptor<C>,
        home: &Arc<Registry>,
        context: &Context,
    ) -> Result<C> {
        let component = ComponentType::of::<C>();
        let constructor = descriptor
            .select_constructor()
            .map_err(|fault| DiError::resolution(component, &self.path, fault))?;
        let inner = context.ignore(descriptor.ignored());

        let scoped = descriptor.is_scoped();
        if scoped {
            self.nested.push(ComponentCache::new());
        }
        let result = self.build_with(descriptor, constructor, home, &inner);
        if scoped {
            self.nested.pop();
        }
        result
    }

    fn build_with<C: Component>(
        &mut self,
        descriptor: &Descriptor<C>,
        constructor: &Constructor<C>,
        home: &Arc<Registry>,
        context: &Context,
    ) -> Result<C> {
        let mut args = self.arguments(home, constructor.params(), context)?;
        let mut value = constructor
            .build(&mut args)
            .map_err(|error| DiError::lift(error, ComponentType::of::<C>(), &self.path))?;
        self.inject(descriptor, &mut value, home, context)?;
        Ok(value)
    }

    fn inject<C: Component>(
        &mut self,
        descriptor: &Descriptor<C>,
        target: &mut C,
        home: &Arc<Registry>,
        context: &Context,
    ) -> Result<()> {
        for injection in descriptor.injections() {
            let mut args = self.arguments(home, injection.params(), context)?;
            injection
                .apply(target, &mut args)
                .map_err(|error| DiError::lift(error, ComponentType::of::<C>(), &self.path))?;
        }
        Ok(())
    }

    /// Build `C` without a binding and without caching.
    pub(crate) fn instantiate_unbound<C: Component>(
        &mut self,
        lookup: &Arc<Registry>,
        context: &Context,
    ) -> Result<Arc<C>> {
        let component = ComponentType::of::<C>();
        let descriptor = C::descriptor();
        let narrowed = context.accept(descriptor.accepted());

        self.path.push(component, component);
        for observer in self.observers.iter() {
            observer.resolved(&self.path, component);
        }
        let result = self
            .begin_instantiation()
            .and_then(|()| self.build(&descriptor, lookup, &narrowed))
            .map(|value| {
                let value = Arc::new(value);
                self.notify_instantiated(&(Arc::clone(&value) as AnyArc));
                value
            });
        self.path.pop();
        result
    }

    /// Run `C`'s injections on an existing value.
    pub(crate) fn initialize<C: Component>(
        &mut self,
        lookup: &Arc<Registry>,
        target: &mut C,
        context: &Context,
    ) -> Result<()> {
        let component = ComponentType::of::<C>();
        let descriptor = C::descriptor();
        let inner = context
            .accept(descriptor.accepted())
            .ignore(descriptor.ignored());

        self.path.push(component, component);
        let result = self.inject(&descriptor, target, lookup, &inner);
        self.path.pop();
        result
    }

    /// Call a method with injected (or supplied) arguments.
    pub(crate) fn invoke<R: 'static>(
        &mut self,
        lookup: &Arc<Registry>,
        method: Method<R>,
        context: &Context,
    ) -> Result<R> {
        let mut values = Vec::with_capacity(method.params().len());
        for (index, param) in method.params().iter().enumerate() {
            match method.supplied(index) {
                Some(value) => values.push(Argument::One(Some(value))),
                None => values.push(self.resolve_dependency(lookup, param, context)?),
            }
        }

        #[cfg(feature = "logging")]
        trace!(
            target: "contextual_injector",
            method = method.name(),
            arguments = values.len(),
            "Invoking method"
        );

        let mut args = Arguments::new(values);
        method
            .call(&mut args)
            .map_err(|error| DiError::lift(error, ComponentType::of::<R>(), &self.path))
    }
}

// =============================================================================
// Restricted resolver
// =============================================================================

/// Dependency lookups offered to factories and interceptors.
///
/// Everything resolved through a `Resolver` takes part in the surrounding
/// resolution: it extends the same dependency path and is subject to the
/// same cycle detection. The container itself is not reachable from here.
pub struct Resolver<'s> {
    session: &'s mut Session,
    registry: Arc<Registry>,
    context: Context,
}

impl<'s> Resolver<'s> {
    pub(crate) fn new(session: &'s mut Session, registry: Arc<Registry>, context: Context) -> Self {
        Self {
            session,
            registry,
            context,
        }
    }

    /// The (narrowed) context of the factory or interception.
    #[inline]
    pub fn context(&self) -> &Context {
        &self.context
    }

    #[inline]
    pub fn path(&self) -> &DependencyPath {
        self.session.path()
    }

    fn take<T>(
        &mut self,
        dependency: Dependency,
        read: impl FnOnce(&mut Arguments) -> Result<T>,
    ) -> Result<T> {
        let argument = self
            .session
            .resolve_dependency(&self.registry, &dependency, &self.context)?;
        read(&mut Arguments::new(vec![argument])).map_err(|error| error.at(self.session.path()))
    }

    /// Resolve a mandatory dependency.
    pub fn resolve<A: ?Sized + Send + Sync + 'static>(&mut self) -> Result<Arc<A>> {
        self.take(Dependency::component::<A>(), |args| args.take::<A>())
    }

    /// Resolve a mandatory dependency with an extra site qualifier.
    pub fn resolve_qualified<A: ?Sized + Send + Sync + 'static>(
        &mut self,
        qualifier: Qualifier,
    ) -> Result<Arc<A>> {
        self.take(Dependency::component::<A>().qualified(qualifier), |args| {
            args.take::<A>()
        })
    }

    /// Resolve an optional dependency.
    pub fn lookup<A: ?Sized + Send + Sync + 'static>(&mut self) -> Result<Option<Arc<A>>> {
        self.take(Dependency::optional::<A>(), |args| args.take_optional::<A>())
    }

    /// Resolve the group of `A`.
    pub fn discover<A: ?Sized + Send + Sync + 'static>(&mut self) -> Result<Vec<Arc<A>>> {
        self.take(Dependency::group::<A>(), |args| args.take_group::<A>())
    }

    /// Build an unbound component in the current context.
    pub fn instance<C: Component>(&mut self) -> Result<Arc<C>> {
        self.session
            .instantiate_unbound::<C>(&self.registry, &self.context)
    }
}

// =============================================================================
// Lazy
// =============================================================================

/// Where a lazy reference resolves from.
#[derive(Clone)]
pub(crate) struct LazySource {
    registry: Weak<Registry>,
    api: ComponentType,
    context: Context,
    observers: Weak<[Arc<dyn Observer>]>,
}

impl LazySource {
    #[inline]
    pub(crate) fn api(&self) -> ComponentType {
        self.api
    }
}

/// A reference resolved on first use.
///
/// Lazy dependencies do not take part in their consumer's construction, so
/// they may close a loop that a constructor dependency could not. They hold
/// their container weakly.
///
/// # Examples
///
/// ```rust
/// use contextual_injector::{Component, Constructor, Container, Descriptor, Lazy};
/// use std::sync::Arc;
///
/// struct Parent { child: Lazy<Child> }
/// struct Child { parent: Arc<Parent> }
///
/// impl Component for Parent {
///     fn descriptor() -> Descriptor<Self> {
///         Descriptor::new().constructor(Constructor::from_fn("new", |child: Lazy<Child>| Ok(Parent { child })))
///     }
/// }
///
/// impl Component for Child {
///     fn descriptor() -> Descriptor<Self> {
///         Descriptor::new().constructor(Constructor::from_fn("new", |parent: Arc<Parent>| Ok(Child { parent })))
///     }
/// }
///
/// let container = Container::new();
/// container.bind_component::<Parent>().unwrap();
/// container.bind_component::<Child>().unwrap();
///
/// let parent = container.get_component::<Parent>().unwrap();
/// let child = parent.child.get().unwrap();
/// assert!(Arc::ptr_eq(&child.parent, &parent));
/// ```
pub struct Lazy<A: ?Sized> {
    source: LazySource,
    _marker: PhantomData<fn() -> Arc<A>>,
}

impl<A: ?Sized + Send + Sync + 'static> Lazy<A> {
    pub(crate) fn new(source: LazySource) -> Self {
        Self {
            source,
            _marker: PhantomData,
        }
    }

    /// Resolve the reference.
    ///
    /// Calling this while the container is still constructing components on
    /// this thread fails with a dynamic-dependency error.
    pub fn get(&self) -> Result<Arc<A>> {
        let api = self.source.api;
        let registry = self.source.registry.upgrade().ok_or_else(|| {
            DiError::injection(api, &DependencyPath::new(), InjectionFault::ScopeDiscarded)
        })?;
        let observers: Observers = self
            .source
            .observers
            .upgrade()
            .unwrap_or_else(|| Arc::from(Vec::new()));

        let mut session = Session::begin(&registry, observers, api)?;
        let handle = session.request(&registry, api, &self.source.context)?;
        unerase(handle).ok_or_else(|| {
            DiError::resolution(
                api,
                &DependencyPath::new(),
                ResolutionFault::IncompatibleInstance,
            )
        })
    }

    /// The context the reference will resolve in.
    #[inline]
    pub fn context(&self) -> &Context {
        &self.source.context
    }
}

impl<A: ?Sized> Clone for Lazy<A> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            _marker: PhantomData,
        }
    }
}

impl<A: ?Sized> fmt::Debug for Lazy<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lazy")
            .field("api", &self.source.api)
            .field("context", &self.source.context)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_guard_is_reentrancy_checked() {
        let outer = ActiveGuard::enter(u64::MAX).unwrap();
        assert!(ActiveGuard::enter(u64::MAX).is_none());
        assert!(ActiveGuard::enter(u64::MAX - 1).is_some());
        drop(outer);
        assert!(ActiveGuard::enter(u64::MAX).is_some());
    }

    #[test]
    fn test_session_rejects_same_tree() {
        let registry = Registry::root(0);
        let observers: Observers = Arc::from(Vec::new());
        let request = ComponentType::of::<u8>();

        let _session = Session::begin(&registry, Arc::clone(&observers), request).unwrap();
        let error = Session::begin(&registry, observers, request).err().unwrap();
        assert!(matches!(
            error,
            DiError::Resolution {
                fault: ResolutionFault::DynamicDependency,
                ..
            }
        ));
    }
}
