//! Component metadata
//!
//! Instead of reflecting over a type at runtime, every component hands the
//! container a [`Descriptor`]: its constructors with their parameter lists,
//! its post-construction injections and the qualifier types it observes.
//! Descriptors are built once per binding at bind time.

use crate::context::Context;
use crate::error::{BoxError, ResolutionFault};
use crate::inject::{Arguments, Inject};
use crate::qualifier::{Qualifier, QualifierType, Qualifiers};
use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// A type-erased shared value.
pub type AnyArc = Arc<dyn Any + Send + Sync>;

/// Identity of an API or implementation type.
///
/// Works for unsized types, so `ComponentType::of::<dyn Greeter>()` names a
/// trait-object API.
#[derive(Clone, Copy)]
pub struct ComponentType {
    id: TypeId,
    name: &'static str,
}

impl ComponentType {
    #[inline]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    #[inline]
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// The fully qualified type name.
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The type name with module paths stripped, e.g. `Arc<dyn Greeter>`.
    pub fn short_name(&self) -> String {
        let mut short = String::with_capacity(self.name.len());
        let mut rest = self.name;
        while let Some(pos) = rest.find("::") {
            short.push_str(&rest[..pos]);
            let kept = short
                .trim_end_matches(|c: char| c.is_alphanumeric() || c == '_')
                .len();
            short.truncate(kept);
            rest = &rest[pos + 2..];
        }
        short.push_str(rest);
        short
    }
}

impl PartialEq for ComponentType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ComponentType {}

impl Hash for ComponentType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.short_name())
    }
}

// =============================================================================
// Dependencies
// =============================================================================

/// How an injection point is satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyKind {
    /// A single component.
    Component,
    /// Every group member bound for the API, in registration order.
    Group,
    /// A reference resolved on first use.
    Lazy,
    /// The consumer's own (narrowed) context.
    Context,
}

/// One injection point: a constructor parameter or an injected field.
#[derive(Debug, Clone)]
pub struct Dependency {
    api: ComponentType,
    kind: DependencyKind,
    qualifiers: Vec<Qualifier>,
    optional: bool,
}

impl Dependency {
    fn new(api: ComponentType, kind: DependencyKind, optional: bool) -> Self {
        Self {
            api,
            kind,
            qualifiers: Vec::new(),
            optional,
        }
    }

    /// A mandatory component dependency.
    pub fn component<A: ?Sized + Send + Sync + 'static>() -> Self {
        Self::new(ComponentType::of::<A>(), DependencyKind::Component, false)
    }

    /// A dependency that yields nothing instead of failing.
    pub fn optional<A: ?Sized + Send + Sync + 'static>() -> Self {
        Self::new(ComponentType::of::<A>(), DependencyKind::Component, true)
    }

    pub fn group<A: ?Sized + Send + Sync + 'static>() -> Self {
        Self::new(ComponentType::of::<A>(), DependencyKind::Group, false)
    }

    pub fn lazy<A: ?Sized + Send + Sync + 'static>() -> Self {
        Self::new(ComponentType::of::<A>(), DependencyKind::Lazy, false)
    }

    pub fn context() -> Self {
        Self::new(ComponentType::of::<Context>(), DependencyKind::Context, false)
    }

    /// Add a qualifier contributed at this injection site.
    pub fn qualified(mut self, qualifier: Qualifier) -> Self {
        self.qualifiers.push(qualifier);
        self
    }

    #[inline]
    pub fn api(&self) -> ComponentType {
        self.api
    }

    #[inline]
    pub fn kind(&self) -> DependencyKind {
        self.kind
    }

    #[inline]
    pub fn qualifiers(&self) -> &[Qualifier] {
        &self.qualifiers
    }

    #[inline]
    pub fn is_optional(&self) -> bool {
        self.optional
    }
}

// =============================================================================
// Constructors and injections
// =============================================================================

type BuildFn<C> = Arc<dyn Fn(&mut Arguments) -> Result<C, BoxError> + Send + Sync>;
type ApplyFn<C> = Arc<dyn Fn(&mut C, &mut Arguments) -> Result<(), BoxError> + Send + Sync>;

/// A way of constructing `C` from resolved dependencies.
///
/// # Examples
///
/// ```rust
/// use contextual_injector::{Constructor, Dependency};
/// use std::sync::Arc;
///
/// struct Port(u16);
/// struct Server { port: Arc<Port> }
///
/// // Parameters derived from the closure signature
/// let typed = Constructor::from_fn("new", |port: Arc<Port>| Ok(Server { port }));
/// assert_eq!(typed.params().len(), 1);
///
/// // Or spelled out and read from the argument list
/// let manual = Constructor::new("manual", vec![Dependency::component::<Port>()], |args| {
///     Ok(Server { port: args.take::<Port>()? })
/// });
/// assert_eq!(manual.name(), "manual");
/// ```
pub struct Constructor<C> {
    name: &'static str,
    inject: bool,
    params: Vec<Dependency>,
    build: BuildFn<C>,
}

impl<C: 'static> Constructor<C> {
    pub fn new<F>(name: &'static str, params: Vec<Dependency>, build: F) -> Self
    where
        F: Fn(&mut Arguments) -> Result<C, BoxError> + Send + Sync + 'static,
    {
        Self {
            name,
            inject: false,
            params,
            build: Arc::new(build),
        }
    }

    /// A constructor whose parameters are the [`Inject`] tuple `D`.
    pub fn from_fn<D, F>(name: &'static str, build: F) -> Self
    where
        D: Inject,
        F: Fn(D) -> Result<C, BoxError> + Send + Sync + 'static,
    {
        Self::new(name, D::dependencies(), move |args| build(D::take(args)?))
    }

    /// Mark as the constructor to use when several are declared.
    pub fn inject(mut self) -> Self {
        self.inject = true;
        self
    }

    /// Qualify the parameter at `index`.
    pub fn qualify(mut self, index: usize, qualifier: Qualifier) -> Self {
        if let Some(param) = self.params.get_mut(index) {
            param.qualifiers.push(qualifier);
        }
        self
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    pub fn is_marked(&self) -> bool {
        self.inject
    }

    #[inline]
    pub fn params(&self) -> &[Dependency] {
        &self.params
    }

    pub(crate) fn build(&self, args: &mut Arguments) -> Result<C, BoxError> {
        (self.build)(args)
    }
}

impl<C> Clone for Constructor<C> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            inject: self.inject,
            params: self.params.clone(),
            build: Arc::clone(&self.build),
        }
    }
}

impl<C> fmt::Debug for Constructor<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constructor")
            .field("name", &self.name)
            .field("inject", &self.inject)
            .field("params", &self.params)
            .finish()
    }
}

/// Field or method injection applied after construction, before the
/// instance is shared.
pub struct Injection<C> {
    name: &'static str,
    params: Vec<Dependency>,
    apply: ApplyFn<C>,
}

impl<C: 'static> Injection<C> {
    pub fn new<F>(name: &'static str, params: Vec<Dependency>, apply: F) -> Self
    where
        F: Fn(&mut C, &mut Arguments) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        Self {
            name,
            params,
            apply: Arc::new(apply),
        }
    }

    pub fn from_fn<D, F>(name: &'static str, apply: F) -> Self
    where
        D: Inject,
        F: Fn(&mut C, D) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        Self::new(name, D::dependencies(), move |target, args| {
            apply(target, D::take(args)?)
        })
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    pub fn params(&self) -> &[Dependency] {
        &self.params
    }

    pub(crate) fn apply(&self, target: &mut C, args: &mut Arguments) -> Result<(), BoxError> {
        (self.apply)(target, args)
    }
}

impl<C> Clone for Injection<C> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            params: self.params.clone(),
            apply: Arc::clone(&self.apply),
        }
    }
}

// =============================================================================
// Descriptor
// =============================================================================

/// Everything the container needs to know to build a `C`.
pub struct Descriptor<C> {
    constructors: Vec<Constructor<C>>,
    injections: Vec<Injection<C>>,
    qualifiers: Qualifiers,
    ignored: Vec<QualifierType>,
    stateful: bool,
    scoped: bool,
}

impl<C: 'static> Descriptor<C> {
    pub fn new() -> Self {
        Self {
            constructors: Vec::new(),
            injections: Vec::new(),
            qualifiers: Qualifiers::None,
            ignored: Vec::new(),
            stateful: false,
            scoped: false,
        }
    }

    pub fn constructor(mut self, constructor: Constructor<C>) -> Self {
        self.constructors.push(constructor);
        self
    }

    pub fn injection(mut self, injection: Injection<C>) -> Self {
        self.injections.push(injection);
        self
    }

    /// Declare the qualifier types this component observes.
    pub fn qualifiers(mut self, qualifiers: Qualifiers) -> Self {
        self.qualifiers = qualifiers;
        self
    }

    /// Qualifier types withheld from this component's dependencies.
    pub fn ignore(mut self, kinds: impl IntoIterator<Item = QualifierType>) -> Self {
        self.ignored.extend(kinds);
        self
    }

    /// Never cache: every resolution builds a new instance.
    pub fn stateful(mut self) -> Self {
        self.stateful = true;
        self
    }

    /// Scope root: scoped dependencies get a fresh cache per instance.
    pub fn scoped(mut self) -> Self {
        self.scoped = true;
        self
    }

    #[inline]
    pub fn constructors(&self) -> &[Constructor<C>] {
        &self.constructors
    }

    #[inline]
    pub fn injections(&self) -> &[Injection<C>] {
        &self.injections
    }

    #[inline]
    pub fn accepted(&self) -> &Qualifiers {
        &self.qualifiers
    }

    #[inline]
    pub fn ignored(&self) -> &[QualifierType] {
        &self.ignored
    }

    #[inline]
    pub fn is_stateful(&self) -> bool {
        self.stateful
    }

    #[inline]
    pub fn is_scoped(&self) -> bool {
        self.scoped
    }

    /// The single constructor, else the single marked one.
    pub fn select_constructor(&self) -> Result<&Constructor<C>, ResolutionFault> {
        match self.constructors.as_slice() {
            [] => Err(ResolutionFault::NoConstructor),
            [only] => Ok(only),
            all => {
                let mut marked = all.iter().filter(|c| c.inject);
                match (marked.next(), marked.next()) {
                    (Some(chosen), None) => Ok(chosen),
                    _ => Err(ResolutionFault::AmbiguousConstructor { count: all.len() }),
                }
            }
        }
    }
}

impl<C: 'static> Default for Descriptor<C> {
    fn default() -> Self {
        Self::new()
    }
}

/// A type the container knows how to construct.
///
/// Usually derived with `#[derive(Component)]` (feature `derive`).
///
/// # Examples
///
/// ```rust
/// use contextual_injector::{Component, Constructor, Container, Descriptor};
/// use std::sync::Arc;
///
/// struct Config { url: String }
/// struct Database { config: Arc<Config> }
///
/// impl Component for Database {
///     fn descriptor() -> Descriptor<Self> {
///         Descriptor::new().constructor(Constructor::from_fn("new", |config: Arc<Config>| {
///             Ok(Database { config })
///         }))
///     }
/// }
///
/// let container = Container::new();
/// container.bind_instance(Arc::new(Config { url: "postgres://localhost".into() }), Default::default()).unwrap();
/// container.bind_component::<Database>().unwrap();
///
/// let db = container.get_component::<Database>().unwrap();
/// assert_eq!(db.config.url, "postgres://localhost");
/// ```
pub trait Component: Send + Sync + Sized + 'static {
    fn descriptor() -> Descriptor<Self>;
}

// =============================================================================
// Attributes
// =============================================================================

/// Per-binding attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attributes {
    primary: bool,
    stateful: bool,
    automatic: bool,
    member: bool,
    per_domain: bool,
    qualifiers: Context,
}

impl Default for Attributes {
    fn default() -> Self {
        Self {
            primary: true,
            stateful: false,
            automatic: false,
            member: false,
            per_domain: false,
            qualifiers: Context::new(),
        }
    }
}

impl Attributes {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Only used when no primary binding matches.
    pub fn fallback(mut self) -> Self {
        self.primary = false;
        self
    }

    pub fn stateful(mut self) -> Self {
        self.stateful = true;
        self
    }

    /// Discovered rather than explicitly bound.
    pub fn automatic(mut self) -> Self {
        self.automatic = true;
        self
    }

    /// Contribute to the API's group instead of answering single lookups.
    pub fn member(mut self) -> Self {
        self.member = true;
        self
    }

    /// Build one instance graph per domain container.
    pub fn per_domain(mut self) -> Self {
        self.per_domain = true;
        self
    }

    /// Serve only contexts carrying this qualifier.
    pub fn qualified(mut self, qualifier: Qualifier) -> Self {
        self.qualifiers = self.qualifiers.with(qualifier);
        self
    }

    #[inline]
    pub fn is_primary(&self) -> bool {
        self.primary
    }

    #[inline]
    pub fn is_stateful(&self) -> bool {
        self.stateful
    }

    #[inline]
    pub fn is_automatic(&self) -> bool {
        self.automatic
    }

    #[inline]
    pub fn is_member(&self) -> bool {
        self.member
    }

    #[inline]
    pub fn is_per_domain(&self) -> bool {
        self.per_domain
    }

    #[inline]
    pub fn qualifiers(&self) -> &Context {
        &self.qualifiers
    }
}

// =============================================================================
// Method
// =============================================================================

/// A one-shot call whose parameters are injected, see
/// [`Container::invoke`](crate::Container::invoke).
///
/// Positions filled with [`supply`](Self::supply) bypass resolution.
pub struct Method<R> {
    name: &'static str,
    params: Vec<Dependency>,
    supplied: Vec<(usize, AnyArc)>,
    call: Box<dyn FnOnce(&mut Arguments) -> Result<R, BoxError>>,
}

impl<R: 'static> Method<R> {
    pub fn from_fn<D, F>(name: &'static str, call: F) -> Self
    where
        D: Inject + 'static,
        F: FnOnce(D) -> Result<R, BoxError> + 'static,
    {
        Self {
            name,
            params: D::dependencies(),
            supplied: Vec::new(),
            call: Box::new(move |args| call(D::take(args)?)),
        }
    }

    /// Pass `value` at parameter `index` instead of resolving it.
    pub fn supply<T: ?Sized + Send + Sync + 'static>(mut self, index: usize, value: Arc<T>) -> Self {
        self.supplied.retain(|(i, _)| *i != index);
        self.supplied.push((index, Arc::new(value) as AnyArc));
        self
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    pub fn params(&self) -> &[Dependency] {
        &self.params
    }

    pub(crate) fn supplied(&self, index: usize) -> Option<AnyArc> {
        self.supplied
            .iter()
            .find(|(i, _)| *i == index)
            .map(|(_, value)| Arc::clone(value))
    }

    pub(crate) fn call(self, args: &mut Arguments) -> Result<R, BoxError> {
        (self.call)(args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Value;
    trait Key: Send + Sync {}

    fn unit(_: &mut Arguments) -> Result<Value, BoxError> {
        Ok(Value)
    }

    #[test]
    fn test_short_name() {
        assert_eq!(ComponentType::of::<Value>().short_name(), "Value");
        assert_eq!(ComponentType::of::<dyn Key>().short_name(), "dyn Key");
        assert_eq!(
            ComponentType::of::<Arc<Option<Value>>>().short_name(),
            "Arc<Option<Value>>"
        );
        assert_eq!(ComponentType::of::<u32>().to_string(), "u32");
    }

    #[test]
    fn test_identity_ignores_name() {
        assert_eq!(ComponentType::of::<Value>(), ComponentType::of::<Value>());
        assert_ne!(ComponentType::of::<Value>(), ComponentType::of::<dyn Key>());
    }

    #[test]
    fn test_single_constructor_selected() {
        let descriptor = Descriptor::new().constructor(Constructor::new("only", vec![], unit));
        assert_eq!(descriptor.select_constructor().unwrap().name(), "only");
    }

    #[test]
    fn test_marked_constructor_selected() {
        let descriptor = Descriptor::new()
            .constructor(Constructor::new("a", vec![], unit))
            .constructor(Constructor::new("b", vec![], unit).inject());
        assert_eq!(descriptor.select_constructor().unwrap().name(), "b");
    }

    #[test]
    fn test_ambiguous_constructors() {
        let unmarked = Descriptor::new()
            .constructor(Constructor::new("a", vec![], unit))
            .constructor(Constructor::new("b", vec![], unit));
        assert_eq!(
            unmarked.select_constructor().unwrap_err(),
            ResolutionFault::AmbiguousConstructor { count: 2 }
        );

        let both_marked = Descriptor::new()
            .constructor(Constructor::new("a", vec![], unit).inject())
            .constructor(Constructor::new("b", vec![], unit).inject());
        assert!(both_marked.select_constructor().is_err());

        let none = Descriptor::<Value>::new();
        assert_eq!(
            none.select_constructor().unwrap_err(),
            ResolutionFault::NoConstructor
        );
    }

    #[test]
    fn test_qualify_parameter() {
        const LOCALE: QualifierType = QualifierType::new("locale");

        let constructor = Constructor::new(
            "new",
            vec![Dependency::component::<Value>(), Dependency::optional::<dyn Key>()],
            unit,
        )
        .qualify(1, LOCALE.value("en"));

        assert!(constructor.params()[0].qualifiers().is_empty());
        assert_eq!(constructor.params()[1].qualifiers(), &[LOCALE.value("en")]);
        assert!(constructor.params()[1].is_optional());
    }

    #[test]
    fn test_attributes_defaults() {
        let attributes = Attributes::new();
        assert!(attributes.is_primary());
        assert!(!attributes.is_member());
        assert!(!Attributes::new().fallback().is_primary());
    }
}
