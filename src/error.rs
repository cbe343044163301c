//! Error types for dependency injection
//!
//! Every failure carries the component it concerns and, where one exists, the
//! structured [`DependencyPath`] that led to it. The rendered message includes
//! the path so a failing chain can be read straight from the error.

use crate::component::ComponentType;
use crate::path::DependencyPath;
use std::error::Error;
use std::sync::Arc;
use thiserror::Error;

/// Boxed error returned by user constructors, factories and interceptors.
pub type BoxError = Box<dyn Error + Send + Sync>;

/// Why a bind operation was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BindingFault {
    /// The component declares no constructor.
    #[error("component is not instantiable (no constructor declared)")]
    NotInstantiable,

    /// A primary binding for the same API and qualifiers already exists.
    #[error("a primary binding with qualifiers {qualifiers} already exists")]
    DuplicatePrimary { qualifiers: String },

    /// The registry was locked.
    #[error("container is locked - cannot register new bindings")]
    Locked,
}

/// Why a lookup failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolutionFault {
    #[error("no binding found")]
    NotFound,

    #[error("ambiguous primary bindings: {}", .candidates.join(", "))]
    AmbiguousBinding { candidates: Vec<String> },

    #[error(
        "ambiguous constructor: {count} constructors and no single one marked for injection"
    )]
    AmbiguousConstructor { count: usize },

    #[error("no constructor declared")]
    NoConstructor,

    #[error(
        "dynamic dependency: the container cannot be used while one of its components is being constructed"
    )]
    DynamicDependency,

    #[error("vetoed by an interceptor")]
    Vetoed,

    #[error("argument {index} does not match the declared dependency {expected}")]
    ArgumentMismatch { index: usize, expected: String },

    #[error("argument {index} was not supplied")]
    MissingArgument { index: usize },

    #[error("the produced instance does not implement the requested API")]
    IncompatibleInstance,
}

/// Why a component is not visible from the requesting scope.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InjectionFault {
    #[error("bound only inside a domain container")]
    HiddenInDomain,

    #[error("bound only inside an isolated registry")]
    HiddenInIsolation,

    #[error("bound per domain but requested outside of any domain")]
    NoDomain,

    #[error("the owning container has been discarded")]
    ScopeDiscarded,
}

/// Errors that can occur during dependency injection operations
#[derive(Error, Debug, Clone)]
pub enum DiError {
    /// A registration was rejected
    #[error("Cannot bind {component}: {fault}")]
    Binding {
        component: ComponentType,
        fault: BindingFault,
    },

    /// A lookup-time failure
    #[error("Cannot resolve {component}: {fault} [path: {path}]")]
    Resolution {
        component: ComponentType,
        path: DependencyPath,
        fault: ResolutionFault,
    },

    /// A constructor chain revisits an implementation under construction
    #[error("Circular references: {path}")]
    CircularReferences { path: DependencyPath },

    /// A constructor, factory, injection or interceptor failed
    #[error("Failed to instantiate {component}: {source} [path: {path}]")]
    Instantiation {
        component: ComponentType,
        path: DependencyPath,
        #[source]
        source: Arc<dyn Error + Send + Sync>,
    },

    /// A scoped binding is not visible from where it was requested
    #[error("Cannot inject {component}: {fault} [path: {path}]")]
    Injection {
        component: ComponentType,
        path: DependencyPath,
        fault: InjectionFault,
    },
}

impl DiError {
    #[inline]
    pub(crate) fn binding(component: ComponentType, fault: BindingFault) -> Self {
        Self::Binding { component, fault }
    }

    #[inline]
    pub(crate) fn resolution(
        component: ComponentType,
        path: &DependencyPath,
        fault: ResolutionFault,
    ) -> Self {
        Self::Resolution {
            component,
            path: path.clone(),
            fault,
        }
    }

    #[inline]
    pub(crate) fn injection(
        component: ComponentType,
        path: &DependencyPath,
        fault: InjectionFault,
    ) -> Self {
        Self::Injection {
            component,
            path: path.clone(),
            fault,
        }
    }

    #[inline]
    pub(crate) fn circular(path: &DependencyPath) -> Self {
        Self::CircularReferences { path: path.clone() }
    }

    /// Convert an error raised by user code while building `component`.
    ///
    /// A `DiError` travelling through user code (typically via `?` on an
    /// argument) is passed on unchanged; anything else is wrapped.
    pub(crate) fn lift(error: BoxError, component: ComponentType, path: &DependencyPath) -> Self {
        match error.downcast::<DiError>() {
            Ok(inner) => (*inner).at(path),
            Err(source) => Self::Instantiation {
                component,
                path: path.clone(),
                source: Arc::from(source),
            },
        }
    }

    /// Fill in a path for errors raised without one.
    pub(crate) fn at(self, at: &DependencyPath) -> Self {
        match self {
            Self::Resolution {
                component,
                path,
                fault,
            } if path.is_empty() => Self::Resolution {
                component,
                path: at.clone(),
                fault,
            },
            other => other,
        }
    }

    /// The user error wrapped by an `Instantiation` failure.
    pub fn cause(&self) -> Option<&(dyn Error + Send + Sync + 'static)> {
        match self {
            Self::Instantiation { source, .. } => Some(&**source),
            _ => None,
        }
    }

    /// The dependency path at which the error was raised.
    pub fn path(&self) -> Option<&DependencyPath> {
        match self {
            Self::Binding { .. } => None,
            Self::Resolution { path, .. }
            | Self::CircularReferences { path }
            | Self::Instantiation { path, .. }
            | Self::Injection { path, .. } => Some(path),
        }
    }

    #[inline]
    pub fn is_binding(&self) -> bool {
        matches!(self, Self::Binding { .. })
    }

    #[inline]
    pub fn is_resolution(&self) -> bool {
        matches!(self, Self::Resolution { .. })
    }

    #[inline]
    pub fn is_circular(&self) -> bool {
        matches!(self, Self::CircularReferences { .. })
    }

    #[inline]
    pub fn is_instantiation(&self) -> bool {
        matches!(self, Self::Instantiation { .. })
    }

    #[inline]
    pub fn is_injection(&self) -> bool {
        matches!(self, Self::Injection { .. })
    }

    /// Whether an optional dependency may swallow this error.
    pub(crate) fn is_absence(&self) -> bool {
        match self {
            Self::Resolution { fault, .. } => *fault != ResolutionFault::DynamicDependency,
            Self::Injection { .. } => true,
            _ => false,
        }
    }
}

/// Result type alias for DI operations
pub type Result<T> = std::result::Result<T, DiError>;

#[cfg(test)]
mod tests {
    use super::*;

    struct Broken;

    #[test]
    fn test_lift_wraps_foreign_errors() {
        let path = DependencyPath::new();
        let error = DiError::lift("boom".into(), ComponentType::of::<Broken>(), &path);

        assert!(error.is_instantiation());
        assert_eq!(error.cause().map(|e| e.to_string()).as_deref(), Some("boom"));
        assert!(error.source().is_some());
        assert!(error.to_string().contains("Broken"));
    }

    #[test]
    fn test_lift_passes_di_errors_through() {
        let component = ComponentType::of::<Broken>();
        let mut path = DependencyPath::new();
        path.push(component, component);

        let inner = DiError::resolution(component, &DependencyPath::new(), ResolutionFault::NotFound);
        let lifted = DiError::lift(Box::new(inner), component, &path);

        assert!(lifted.is_resolution());
        assert_eq!(lifted.path().map(|p| p.len()), Some(1));
    }

    #[test]
    fn test_messages_mention_constructor() {
        let error = DiError::resolution(
            ComponentType::of::<Broken>(),
            &DependencyPath::new(),
            ResolutionFault::AmbiguousConstructor { count: 2 },
        );
        assert!(error.to_string().contains("constructor"));
    }
}
