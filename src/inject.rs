//! Typed injection points
//!
//! [`Inject`] maps a Rust parameter type onto the [`Dependency`] it stands
//! for and reads it back from the resolved [`Arguments`]. Tuples of
//! injectable types are injectable, so a closure's signature is enough to
//! describe a constructor.

use crate::component::{AnyArc, ComponentType, Dependency};
use crate::context::Context;
use crate::error::{DiError, ResolutionFault};
use crate::path::DependencyPath;
use crate::resolver::{Lazy, LazySource};
use std::sync::Arc;

/// Wrap a shared value the way resolved handles travel through the engine.
#[inline]
pub(crate) fn erase<A: ?Sized + Send + Sync + 'static>(value: Arc<A>) -> AnyArc {
    Arc::new(value)
}

/// Inverse of [`erase`].
#[inline]
pub(crate) fn unerase<A: ?Sized + Send + Sync + 'static>(handle: AnyArc) -> Option<Arc<A>> {
    handle
        .downcast::<Arc<A>>()
        .ok()
        .map(|inner| Arc::clone(&*inner))
}

/// A resolved injection point.
pub(crate) enum Argument {
    One(Option<AnyArc>),
    Many(Vec<AnyArc>),
    Lazy(LazySource),
    Context(Context),
}

/// The resolved arguments of a constructor, injection or method, consumed in
/// declaration order.
pub struct Arguments {
    values: Vec<Option<Argument>>,
    cursor: usize,
}

impl Arguments {
    pub(crate) fn new(values: Vec<Argument>) -> Self {
        Self {
            values: values.into_iter().map(Some).collect(),
            cursor: 0,
        }
    }

    /// Number of arguments not yet taken.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.values.len().saturating_sub(self.cursor)
    }

    fn next(&mut self, expected: ComponentType) -> Result<(usize, Argument), DiError> {
        let index = self.cursor;
        self.cursor += 1;
        match self.values.get_mut(index).and_then(Option::take) {
            Some(argument) => Ok((index, argument)),
            None => Err(DiError::resolution(
                expected,
                &DependencyPath::new(),
                ResolutionFault::MissingArgument { index },
            )),
        }
    }

    fn mismatch(index: usize, expected: ComponentType) -> DiError {
        DiError::resolution(
            expected,
            &DependencyPath::new(),
            ResolutionFault::ArgumentMismatch {
                index,
                expected: expected.short_name(),
            },
        )
    }

    /// Take a mandatory component.
    pub fn take<A: ?Sized + Send + Sync + 'static>(&mut self) -> Result<Arc<A>, DiError> {
        let expected = ComponentType::of::<A>();
        match self.next(expected)? {
            (index, Argument::One(Some(handle))) => {
                unerase(handle).ok_or_else(|| Self::mismatch(index, expected))
            }
            (index, Argument::One(None)) => Err(DiError::resolution(
                expected,
                &DependencyPath::new(),
                ResolutionFault::MissingArgument { index },
            )),
            (index, _) => Err(Self::mismatch(index, expected)),
        }
    }

    /// Take an optional component.
    pub fn take_optional<A: ?Sized + Send + Sync + 'static>(
        &mut self,
    ) -> Result<Option<Arc<A>>, DiError> {
        let expected = ComponentType::of::<A>();
        match self.next(expected)? {
            (index, Argument::One(Some(handle))) => unerase(handle)
                .map(Some)
                .ok_or_else(|| Self::mismatch(index, expected)),
            (_, Argument::One(None)) => Ok(None),
            (index, _) => Err(Self::mismatch(index, expected)),
        }
    }

    /// Take the members of a group.
    pub fn take_group<A: ?Sized + Send + Sync + 'static>(
        &mut self,
    ) -> Result<Vec<Arc<A>>, DiError> {
        let expected = ComponentType::of::<A>();
        match self.next(expected)? {
            (index, Argument::Many(handles)) => handles
                .into_iter()
                .map(|handle| unerase(handle).ok_or_else(|| Self::mismatch(index, expected)))
                .collect(),
            (index, _) => Err(Self::mismatch(index, expected)),
        }
    }

    /// Take a lazily resolved reference.
    pub fn take_lazy<A: ?Sized + Send + Sync + 'static>(&mut self) -> Result<Lazy<A>, DiError> {
        let expected = ComponentType::of::<A>();
        match self.next(expected)? {
            (_, Argument::Lazy(source)) if source.api() == expected => Ok(Lazy::new(source)),
            (index, _) => Err(Self::mismatch(index, expected)),
        }
    }

    /// Take the consumer's context.
    pub fn take_context(&mut self) -> Result<Context, DiError> {
        let expected = ComponentType::of::<Context>();
        match self.next(expected)? {
            (_, Argument::Context(context)) => Ok(context),
            (index, _) => Err(Self::mismatch(index, expected)),
        }
    }
}

/// A type that can stand in a constructor, injection or method signature.
pub trait Inject: Sized {
    /// The injection points this type consumes, in order.
    fn dependencies() -> Vec<Dependency>;

    /// Read the value back from resolved arguments.
    fn take(args: &mut Arguments) -> Result<Self, DiError>;
}

impl Inject for () {
    fn dependencies() -> Vec<Dependency> {
        Vec::new()
    }

    fn take(_args: &mut Arguments) -> Result<Self, DiError> {
        Ok(())
    }
}

impl<A: ?Sized + Send + Sync + 'static> Inject for Arc<A> {
    fn dependencies() -> Vec<Dependency> {
        vec![Dependency::component::<A>()]
    }

    fn take(args: &mut Arguments) -> Result<Self, DiError> {
        args.take::<A>()
    }
}

impl<A: ?Sized + Send + Sync + 'static> Inject for Option<Arc<A>> {
    fn dependencies() -> Vec<Dependency> {
        vec![Dependency::optional::<A>()]
    }

    fn take(args: &mut Arguments) -> Result<Self, DiError> {
        args.take_optional::<A>()
    }
}

impl<A: ?Sized + Send + Sync + 'static> Inject for Vec<Arc<A>> {
    fn dependencies() -> Vec<Dependency> {
        vec![Dependency::group::<A>()]
    }

    fn take(args: &mut Arguments) -> Result<Self, DiError> {
        args.take_group::<A>()
    }
}

impl<A: ?Sized + Send + Sync + 'static> Inject for Lazy<A> {
    fn dependencies() -> Vec<Dependency> {
        vec![Dependency::lazy::<A>()]
    }

    fn take(args: &mut Arguments) -> Result<Self, DiError> {
        args.take_lazy::<A>()
    }
}

impl Inject for Context {
    fn dependencies() -> Vec<Dependency> {
        vec![Dependency::context()]
    }

    fn take(args: &mut Arguments) -> Result<Self, DiError> {
        args.take_context()
    }
}

macro_rules! impl_inject_tuple {
    ($($T:ident),+) => {
        impl<$($T: Inject),+> Inject for ($($T,)+) {
            fn dependencies() -> Vec<Dependency> {
                let mut dependencies = Vec::new();
                $(dependencies.extend($T::dependencies());)+
                dependencies
            }

            fn take(args: &mut Arguments) -> Result<Self, DiError> {
                Ok(($($T::take(args)?,)+))
            }
        }
    };
}

impl_inject_tuple!(A);
impl_inject_tuple!(A, B);
impl_inject_tuple!(A, B, C);
impl_inject_tuple!(A, B, C, D);
impl_inject_tuple!(A, B, C, D, E);
impl_inject_tuple!(A, B, C, D, E, F);
impl_inject_tuple!(A, B, C, D, E, F, G);
impl_inject_tuple!(A, B, C, D, E, F, G, H);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::DependencyKind;

    trait Greeter: Send + Sync {
        fn greet(&self) -> &'static str;
    }

    struct English;

    impl Greeter for English {
        fn greet(&self) -> &'static str {
            "hello"
        }
    }

    #[test]
    fn test_tuple_dependencies_flatten_in_order() {
        type Params = (Arc<dyn Greeter>, Option<Arc<English>>, Vec<Arc<dyn Greeter>>, Context);
        let kinds: Vec<(DependencyKind, bool)> = Params::dependencies()
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
    }

    #[test]
    fn test_take_unsized_handle() {
        let greeter: Arc<dyn Greeter> = Arc::new(English);
        let mut args = Arguments::new(vec![
            Argument::One(Some(erase(greeter))),
            Argument::One(None),
        ]);

        let (greeter, missing) = <(Arc<dyn Greeter>, Option<Arc<English>>)>::take(&mut args).unwrap();
        assert_eq!(greeter.greet(), "hello");
        assert!(missing.is_none());
        assert_eq!(args.remaining(), 0);
    }

    #[test]
    fn test_take_reports_mismatch() {
        let mut args = Arguments::new(vec![Argument::One(Some(erase(Arc::new(English))))]);
        let error = args.take::<dyn Greeter>().err().unwrap();
        assert!(error.is_resolution());
        assert!(error.to_string().contains("does not match"));
    }

    #[test]
    fn test_take_past_end() {
        let mut args = Arguments::new(Vec::new());
        let error = args.take_optional::<English>().err().unwrap();
        assert!(error.to_string().contains("not supplied"));
    }
}
