//! Interceptor chain
//!
//! Interceptors see every dependency resolved beneath the container they are
//! declared on and may keep, replace or veto it. For a given resolution the
//! chain runs interceptors declared closer to the root first, then the
//! descendants', each level in declaration order. Interceptors and their own
//! dependencies are never intercepted.

use crate::component::{AnyArc, ComponentType};
use crate::context::Context;
use crate::error::BoxError;
use crate::inject::{erase, unerase};
use crate::path::DependencyPath;
use crate::resolver::{Blueprint, Resolver};
use once_cell::sync::OnceCell;
use std::sync::Arc;

/// Which resolutions an interceptor applies to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterceptorFilter {
    api: Option<ComponentType>,
    qualifiers: Context,
}

impl InterceptorFilter {
    /// Every resolution.
    pub fn any() -> Self {
        Self::default()
    }

    /// Resolutions of one API.
    pub fn api<A: ?Sized + 'static>() -> Self {
        Self {
            api: Some(ComponentType::of::<A>()),
            qualifiers: Context::new(),
        }
    }

    /// Only resolutions whose context carries `qualifier`.
    pub fn qualified(mut self, qualifier: crate::Qualifier) -> Self {
        self.qualifiers = self.qualifiers.with(qualifier);
        self
    }

    pub fn matches(&self, api: ComponentType, context: &Context) -> bool {
        self.api.is_none_or(|expected| expected == api) && context.satisfies(&self.qualifiers)
    }
}

/// What an interceptor decided.
pub enum Verdict {
    /// Bind the dependency as resolved.
    Keep,
    /// Bind a different value; build it with [`Verdict::replace`].
    Replace(AnyArc),
    /// Remove the dependency. Optional consumers see nothing, mandatory
    /// consumers fail.
    Veto,
}

impl Verdict {
    pub fn replace<A: ?Sized + Send + Sync + 'static>(value: Arc<A>) -> Self {
        Self::Replace(erase(value))
    }
}

/// The dependency under interception.
pub struct Interception {
    api: ComponentType,
    context: Context,
    path: DependencyPath,
    instance: AnyArc,
}

impl Interception {
    pub(crate) fn new(
        api: ComponentType,
        context: Context,
        path: DependencyPath,
        instance: AnyArc,
    ) -> Self {
        Self {
            api,
            context,
            path,
            instance,
        }
    }

    #[inline]
    pub fn api(&self) -> ComponentType {
        self.api
    }

    #[inline]
    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Path of the consumer the dependency is bound into.
    #[inline]
    pub fn path(&self) -> &DependencyPath {
        &self.path
    }

    /// The current value, if it is an `A`.
    pub fn get<A: ?Sized + Send + Sync + 'static>(&self) -> Option<Arc<A>> {
        unerase(Arc::clone(&self.instance))
    }
}

/// Resolution hook able to replace or remove dependencies.
///
/// # Examples
///
/// ```rust
/// use contextual_injector::{
///     BoxError, Container, Interception, Interceptor, InterceptorFilter, Resolver, Verdict,
/// };
/// use std::sync::Arc;
///
/// struct Greeting(&'static str);
///
/// struct Shout;
///
/// impl Interceptor for Shout {
///     fn intercept(&self, _: &Interception, _: &mut Resolver<'_>) -> Result<Verdict, BoxError> {
///         Ok(Verdict::replace(Arc::new(Greeting("HELLO"))))
///     }
/// }
///
/// let container = Container::new();
/// container.bind_instance(Arc::new(Greeting("hello")), Default::default()).unwrap();
/// container.add_interceptor(InterceptorFilter::api::<Greeting>(), Arc::new(Shout)).unwrap();
///
/// assert_eq!(container.get_component::<Greeting>().unwrap().0, "HELLO");
/// ```
pub trait Interceptor: Send + Sync + 'static {
    fn intercept(
        &self,
        interception: &Interception,
        resolver: &mut Resolver<'_>,
    ) -> Result<Verdict, BoxError>;
}

pub(crate) type InterceptorCast = Arc<dyn Fn(AnyArc) -> Option<Arc<dyn Interceptor>> + Send + Sync>;

#[derive(Clone)]
enum Source {
    Instance(Arc<dyn Interceptor>),
    Component {
        blueprint: Arc<dyn Blueprint>,
        cast: InterceptorCast,
        built: Arc<OnceCell<Arc<dyn Interceptor>>>,
    },
}

/// A filter and the interceptor it guards.
#[derive(Clone)]
pub(crate) struct InterceptorEntry {
    filter: InterceptorFilter,
    source: Source,
}

impl InterceptorEntry {
    pub(crate) fn instance(filter: InterceptorFilter, interceptor: Arc<dyn Interceptor>) -> Self {
        Self {
            filter,
            source: Source::Instance(interceptor),
        }
    }

    /// An interceptor built by the container on first use.
    pub(crate) fn component<I: crate::Component + Interceptor>(filter: InterceptorFilter) -> Self {
        Self {
            filter,
            source: Source::Component {
                blueprint: Arc::new(I::descriptor()),
                cast: Arc::new(|value: AnyArc| {
                    value
                        .downcast::<I>()
                        .ok()
                        .map(|interceptor| interceptor as Arc<dyn Interceptor>)
                }),
                built: Arc::new(OnceCell::new()),
            },
        }
    }

    #[inline]
    pub(crate) fn filter(&self) -> &InterceptorFilter {
        &self.filter
    }

    /// The interceptor, or what has to be built before it can run.
    pub(crate) fn prepared(&self) -> Prepared<'_> {
        match &self.source {
            Source::Instance(interceptor) => Prepared::Ready(Arc::clone(interceptor)),
            Source::Component {
                blueprint,
                cast,
                built,
            } => match built.get() {
                Some(interceptor) => Prepared::Ready(Arc::clone(interceptor)),
                None => Prepared::Pending {
                    blueprint,
                    cast,
                    built: &**built,
                },
            },
        }
    }
}

pub(crate) enum Prepared<'a> {
    Ready(Arc<dyn Interceptor>),
    Pending {
        blueprint: &'a Arc<dyn Blueprint>,
        cast: &'a InterceptorCast,
        built: &'a OnceCell<Arc<dyn Interceptor>>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qualifier::QualifierType;

    const LOCALE: QualifierType = QualifierType::new("locale");

    struct Greeting;
    struct Farewell;

    #[test]
    fn test_filter_matches_api_and_qualifiers() {
        let en = Context::new().with(LOCALE.value("en"));
        let api = ComponentType::of::<Greeting>();

        assert!(InterceptorFilter::any().matches(api, &Context::new()));
        assert!(InterceptorFilter::api::<Greeting>().matches(api, &en));
        assert!(!InterceptorFilter::api::<Farewell>().matches(api, &en));

        let english = InterceptorFilter::any().qualified(LOCALE.value("en"));
        assert!(english.matches(api, &en));
        assert!(!english.matches(api, &Context::new()));
    }

    #[test]
    fn test_interception_downcast() {
        let interception = Interception::new(
            ComponentType::of::<Greeting>(),
            Context::new(),
            DependencyPath::new(),
            erase(Arc::new(Greeting)),
        );
        assert!(interception.get::<Greeting>().is_some());
        assert!(interception.get::<Farewell>().is_none());
    }
}
