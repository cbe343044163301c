//! Observation API
//!
//! Observers are told about binding decisions and real instantiations. They
//! cannot influence resolution; use an [`Interceptor`](crate::Interceptor)
//! for that.

use crate::component::{AnyArc, ComponentType};
use crate::path::DependencyPath;
use std::sync::{Mutex, PoisonError};

/// Resolution hooks. Both callbacks default to doing nothing.
pub trait Observer: Send + Sync {
    /// A binding was chosen for the last node of `path`.
    fn resolved(&self, path: &DependencyPath, implementation: ComponentType) {
        let _ = (path, implementation);
    }

    /// The last node of `path` was actually constructed (not replayed from cache).
    fn instantiated(&self, path: &DependencyPath, instance: &AnyArc) {
        let _ = (path, instance);
    }
}

/// A recorded observer callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Resolved {
        path: DependencyPath,
        implementation: ComponentType,
    },
    Instantiated {
        path: DependencyPath,
        implementation: ComponentType,
    },
}

impl Event {
    /// The implementation the event concerns.
    pub fn implementation(&self) -> ComponentType {
        match self {
            Self::Resolved { implementation, .. } | Self::Instantiated { implementation, .. } => {
                *implementation
            }
        }
    }
}

/// Observer that keeps every event in memory.
///
/// # Examples
///
/// ```rust
/// use contextual_injector::{Component, Constructor, Container, Descriptor, RecordingObserver};
/// use std::sync::Arc;
///
/// struct Clock;
///
/// impl Component for Clock {
///     fn descriptor() -> Descriptor<Self> {
///         Descriptor::new().constructor(Constructor::from_fn("new", |()| Ok(Clock)))
///     }
/// }
///
/// let recorder = Arc::new(RecordingObserver::new());
/// let container = Container::new().observed(recorder.clone());
/// container.bind_component::<Clock>().unwrap();
///
/// container.get_component::<Clock>().unwrap();
/// container.get_component::<Clock>().unwrap();
///
/// assert_eq!(recorder.resolved_count::<Clock>(), 2);
/// assert_eq!(recorder.instantiated_count::<Clock>(), 1);
/// ```
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<Event>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, event: Event) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }

    /// Snapshot of the events so far.
    pub fn events(&self) -> Vec<Event> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn clear(&self) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn resolved_count<T: ?Sized + 'static>(&self) -> usize {
        let component = ComponentType::of::<T>();
        self.count(|event| matches!(event, Event::Resolved { implementation, .. } if *implementation == component))
    }

    pub fn instantiated_count<T: ?Sized + 'static>(&self) -> usize {
        let component = ComponentType::of::<T>();
        self.count(|event| matches!(event, Event::Instantiated { implementation, .. } if *implementation == component))
    }

    fn count(&self, predicate: impl Fn(&Event) -> bool) -> usize {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|event| predicate(event))
            .count()
    }
}

impl Observer for RecordingObserver {
    fn resolved(&self, path: &DependencyPath, implementation: ComponentType) {
        self.record(Event::Resolved {
            path: path.clone(),
            implementation,
        });
    }

    fn instantiated(&self, path: &DependencyPath, _instance: &AnyArc) {
        if let Some(node) = path.last() {
            self.record(Event::Instantiated {
                path: path.clone(),
                implementation: node.implementation(),
            });
        }
    }
}

/// Observer forwarding every event to `tracing` at TRACE level.
#[cfg(feature = "logging")]
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

#[cfg(feature = "logging")]
impl Observer for TracingObserver {
    fn resolved(&self, path: &DependencyPath, implementation: ComponentType) {
        tracing::trace!(
            target: "contextual_injector",
            implementation = implementation.name(),
            path = %path,
            "Binding resolved"
        );
    }

    fn instantiated(&self, path: &DependencyPath, _instance: &AnyArc) {
        tracing::trace!(
            target: "contextual_injector",
            path = %path,
            "Component instantiated"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    struct Sample;

    #[test]
    fn test_recording_observer_counts() {
        let recorder = RecordingObserver::new();
        let sample = ComponentType::of::<Sample>();
        let mut path = DependencyPath::new();
        path.push(sample, sample);

        recorder.resolved(&path, sample);
        recorder.resolved(&path, sample);
        recorder.instantiated(&path, &(Arc::new(Sample) as AnyArc));

        assert_eq!(recorder.resolved_count::<Sample>(), 2);
        assert_eq!(recorder.instantiated_count::<Sample>(), 1);
        assert_eq!(recorder.events()[2].implementation(), sample);

        recorder.clear();
        assert!(recorder.events().is_empty());
    }
}
