//! Factory bindings
//!
//! A factory decides at resolution time how an API is satisfied. It receives
//! a [`Resolver`] for its own dependencies and returns an [`Instance`]:
//! either a value it built itself, or a delegation to a component the
//! container builds in the factory's place.
//!
//! Factory results are cached like any other component, keyed by the
//! factory's narrowed context, so a factory runs at most once per distinct
//! context it observes. Variant factories observe the qualifier types given
//! to [`variant`].

use crate::component::{AnyArc, Component, ComponentType};
use crate::context::Context;
use crate::error::{BoxError, DiError, Result};
use crate::inject::erase;
use crate::qualifier::Qualifiers;
use crate::registry::{upcast, Caster, Registry};
use crate::resolver::{Blueprint, ErasedFactory, Resolver, Session};
use std::marker::PhantomData;
use std::sync::Arc;

#[cfg(feature = "logging")]
use tracing::trace;

/// Custom construction logic for an API.
pub trait Factory<A: ?Sized>: Send + Sync + 'static {
    /// Qualifier types the factory observes; other qualifiers are removed
    /// from the context it sees and from its cache key.
    fn qualifiers(&self) -> Qualifiers {
        Qualifiers::None
    }

    fn create(&self, resolver: &mut Resolver<'_>) -> std::result::Result<Instance<A>, BoxError>;
}

enum Produced {
    Ready(AnyArc),
    Delegate {
        blueprint: Arc<dyn Blueprint>,
        cast: Caster,
        context: Context,
    },
}

/// What a factory produced.
pub struct Instance<A: ?Sized> {
    produced: Produced,
    _marker: PhantomData<fn() -> Arc<A>>,
}

impl<A: ?Sized + Send + Sync + 'static> Instance<A> {
    /// A value the factory built itself.
    pub fn of(value: Arc<A>) -> Self {
        Self {
            produced: Produced::Ready(erase(value)),
            _marker: PhantomData,
        }
    }

    /// Let the container build `C` and hand it out as `A`.
    ///
    /// `C` is built with the factory's context combined with the context
    /// given to [`within`](Self::within), narrowed to what `C` observes.
    pub fn delegate<C: Component>(cast: fn(Arc<C>) -> Arc<A>) -> Self {
        Self {
            produced: Produced::Delegate {
                blueprint: Arc::new(C::descriptor()),
                cast: upcast(cast),
                context: Context::new(),
            },
            _marker: PhantomData,
        }
    }

    /// Extra context for a delegated build. No effect on ready values.
    pub fn within(mut self, own: Context) -> Self {
        if let Produced::Delegate { context, .. } = &mut self.produced {
            *context = context.combine(&own);
        }
        self
    }
}

/// A factory backed by a closure.
pub struct FactoryFn<F> {
    qualifiers: Qualifiers,
    create: F,
}

/// Wrap a closure as a context-oblivious factory.
pub fn factory_fn<A, F>(create: F) -> FactoryFn<F>
where
    A: ?Sized + Send + Sync + 'static,
    F: Fn(&mut Resolver<'_>) -> std::result::Result<Instance<A>, BoxError>
        + Send
        + Sync
        + 'static,
{
    FactoryFn {
        qualifiers: Qualifiers::None,
        create,
    }
}

/// Wrap a closure as a variant factory observing `qualifiers`.
///
/// # Examples
///
/// ```rust
/// use contextual_injector::{variant, Attributes, Container, Context, Instance, QualifierType, Qualifiers};
/// use std::sync::Arc;
///
/// const LOCALE: QualifierType = QualifierType::new("locale");
///
/// struct Greeting(String);
///
/// let container = Container::new();
/// container
///     .bind_factory::<Greeting, _>(
///         variant(Qualifiers::only([LOCALE]), |resolver| {
///             let text = match resolver.context().get(LOCALE) {
///                 Some("fr") => "bonjour",
///                 _ => "hello",
///             };
///             Ok(Instance::of(Arc::new(Greeting(text.to_string()))))
///         }),
///         Attributes::new(),
///     )
///     .unwrap();
///
/// let fr = Context::new().with(LOCALE.value("fr"));
/// assert_eq!(container.get_component_in::<Greeting>(&fr).unwrap().0, "bonjour");
/// assert_eq!(container.get_component::<Greeting>().unwrap().0, "hello");
/// ```
pub fn variant<A, F>(qualifiers: Qualifiers, create: F) -> FactoryFn<F>
where
    A: ?Sized + Send + Sync + 'static,
    F: Fn(&mut Resolver<'_>) -> std::result::Result<Instance<A>, BoxError>
        + Send
        + Sync
        + 'static,
{
    FactoryFn { qualifiers, create }
}

impl<A, F> Factory<A> for FactoryFn<F>
where
    A: ?Sized + Send + Sync + 'static,
    F: Fn(&mut Resolver<'_>) -> std::result::Result<Instance<A>, BoxError>
        + Send
        + Sync
        + 'static,
{
    fn qualifiers(&self) -> Qualifiers {
        self.qualifiers.clone()
    }

    fn create(&self, resolver: &mut Resolver<'_>) -> std::result::Result<Instance<A>, BoxError> {
        (self.create)(resolver)
    }
}

/// Adapts a typed factory to the erased binding strategy.
pub(crate) struct FactoryAdapter<A: ?Sized, F> {
    factory: F,
    accepted: Qualifiers,
    _marker: PhantomData<fn() -> Arc<A>>,
}

impl<A: ?Sized, F: Factory<A>> FactoryAdapter<A, F> {
    pub(crate) fn new(factory: F) -> Self {
        let accepted = factory.qualifiers();
        Self {
            factory,
            accepted,
            _marker: PhantomData,
        }
    }
}

impl<A, F> ErasedFactory for FactoryAdapter<A, F>
where
    A: ?Sized + Send + Sync + 'static,
    F: Factory<A>,
{
    fn accepted(&self) -> &Qualifiers {
        &self.accepted
    }

    fn produce(
        &self,
        session: &mut Session,
        home: &Arc<Registry>,
        api: ComponentType,
        context: &Context,
    ) -> Result<AnyArc> {
        #[cfg(feature = "logging")]
        trace!(
            target: "contextual_injector",
            api = api.name(),
            factory = std::any::type_name::<F>(),
            context = %context,
            "Invoking factory"
        );

        let instance = {
            let mut resolver = Resolver::new(session, Arc::clone(home), context.clone());
            self.factory.create(&mut resolver)
        }
        .map_err(|error| DiError::lift(error, api, session.path()))?;

        match instance.produced {
            Produced::Ready(handle) => Ok(handle),
            Produced::Delegate {
                blueprint,
                cast,
                context: own,
            } => session.delegate(&*blueprint, &cast, home, api, &context.combine(&own)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{Attributes, Constructor, Descriptor};
    use crate::container::Container;
    use crate::qualifier::QualifierType;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const LOCALE: QualifierType = QualifierType::new("locale");

    trait Greeter: Send + Sync {
        fn greet(&self) -> String;
    }

    struct Localized {
        locale: String,
    }

    impl Greeter for Localized {
        fn greet(&self) -> String {
            format!("hello ({})", self.locale)
        }
    }

    impl Component for Localized {
        fn descriptor() -> Descriptor<Self> {
            Descriptor::new()
                .qualifiers(Qualifiers::only([LOCALE]))
                .constructor(Constructor::from_fn("new", |context: Context| {
                    Ok(Localized {
                        locale: context.get(LOCALE).unwrap_or("default").to_string(),
                    })
                }))
        }
    }

    #[test]
    fn test_factory_invoked_once_per_context() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);

        let container = Container::new();
        container
            .bind_factory::<dyn Greeter, _>(
                variant(Qualifiers::only([LOCALE]), move |resolver| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    let locale = resolver.context().get(LOCALE).unwrap_or("none").to_string();
                    Ok(Instance::of(Arc::new(Localized { locale }) as Arc<dyn Greeter>))
                }),
                Attributes::new(),
            )
            .unwrap();

        let en = Context::new().with(LOCALE.value("en"));
        let fr = Context::new().with(LOCALE.value("fr"));

        let a = container.get_component_in::<dyn Greeter>(&en).unwrap();
        let b = container.get_component_in::<dyn Greeter>(&en).unwrap();
        let c = container.get_component_in::<dyn Greeter>(&fr).unwrap();

        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(c.greet(), "hello (fr)");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_context_oblivious_factory_ignores_qualifiers() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);

        let container = Container::new();
        container
            .bind_factory::<dyn Greeter, _>(
                factory_fn(move |resolver| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    assert!(resolver.context().is_empty());
                    Ok(Instance::of(Arc::new(Localized {
                        locale: "any".into(),
                    }) as Arc<dyn Greeter>))
                }),
                Attributes::new(),
            )
            .unwrap();

        container
            .get_component_in::<dyn Greeter>(&Context::new().with(LOCALE.value("en")))
            .unwrap();
        container
            .get_component_in::<dyn Greeter>(&Context::new().with(LOCALE.value("fr")))
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_delegate_combines_context() {
        let container = Container::new();
        container
            .bind_factory::<dyn Greeter, _>(
                factory_fn::<dyn Greeter, _>(|_resolver| {
                    Ok(Instance::delegate::<Localized>(|c| c as Arc<dyn Greeter>)
                        .within(Context::new().with(LOCALE.value("de"))))
                }),
                Attributes::new(),
            )
            .unwrap();

        let greeter = container.get_component::<dyn Greeter>().unwrap();
        assert_eq!(greeter.greet(), "hello (de)");
    }

    #[test]
    fn test_factory_error_wrapped() {
        #[derive(Debug)]
        struct Unavailable;

        impl std::fmt::Display for Unavailable {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("backend unavailable")
            }
        }

        impl std::error::Error for Unavailable {}

        let container = Container::new();
        container
            .bind_factory::<dyn Greeter, _>(
                factory_fn::<dyn Greeter, _>(|_resolver| Err(Box::new(Unavailable) as BoxError)),
                Attributes::new(),
            )
            .unwrap();

        let error = container.get_component::<dyn Greeter>().err().unwrap();
        assert!(error.is_instantiation());
        assert!(error.cause().is_some_and(|cause| cause.is::<Unavailable>()));
    }
}
