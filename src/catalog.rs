//! Component catalog
//!
//! A catalog lists components that may be discovered without an explicit
//! bind. Installing it registers every entry as an *automatic fallback*
//! binding, so an explicit primary binding for the same API always wins.

use crate::component::{Attributes, Component, ComponentType};
use crate::error::Result;
use crate::registry::Binder;
use std::fmt;
use std::sync::Arc;

type InstallFn = Box<dyn Fn(&Binder<'_>) -> Result<()> + Send + Sync>;

fn installer<F>(install: F) -> InstallFn
where
    F: Fn(&Binder<'_>) -> Result<()> + Send + Sync + 'static,
{
    Box::new(install)
}

/// One discoverable component.
pub struct CatalogEntry {
    api: ComponentType,
    implementation: ComponentType,
    install: InstallFn,
}

impl CatalogEntry {
    #[inline]
    pub fn api(&self) -> ComponentType {
        self.api
    }

    #[inline]
    pub fn implementation(&self) -> ComponentType {
        self.implementation
    }
}

impl fmt::Debug for CatalogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CatalogEntry")
            .field("api", &self.api)
            .field("implementation", &self.implementation)
            .finish()
    }
}

/// Discoverable components, installed with
/// [`Container::with_catalog`](crate::Container::with_catalog).
///
/// # Examples
///
/// ```rust
/// use contextual_injector::{Catalog, Component, Constructor, Container, Descriptor};
///
/// trait Clock: Send + Sync {}
///
/// struct SystemClock;
///
/// impl Clock for SystemClock {}
///
/// impl Component for SystemClock {
///     fn descriptor() -> Descriptor<Self> {
///         Descriptor::new().constructor(Constructor::from_fn("new", |()| Ok(SystemClock)))
///     }
/// }
///
/// let catalog = Catalog::new().implementation::<dyn Clock, SystemClock>(|c| c);
/// let container = Container::with_catalog(catalog).unwrap();
///
/// assert!(container.get_component::<dyn Clock>().is_ok());
/// ```
#[derive(Debug, Default)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// A component discoverable as itself.
    pub fn component<C: Component>(self) -> Self {
        self.implementation::<C, C>(|component| component)
    }

    /// A component discoverable as `A`.
    pub fn implementation<A, C>(mut self, cast: fn(Arc<C>) -> Arc<A>) -> Self
    where
        A: ?Sized + Send + Sync + 'static,
        C: Component,
    {
        self.entries.push(CatalogEntry {
            api: ComponentType::of::<A>(),
            implementation: ComponentType::of::<C>(),
            install: installer(move |binder| {
                binder
                    .bind::<A, C>(cast, Attributes::new().fallback().automatic())
                    .map(|_| ())
            }),
        });
        self
    }

    /// A component discoverable as a member of the group of `A`.
    pub fn member<A, C>(mut self, cast: fn(Arc<C>) -> Arc<A>) -> Self
    where
        A: ?Sized + Send + Sync + 'static,
        C: Component,
    {
        self.entries.push(CatalogEntry {
            api: ComponentType::of::<A>(),
            implementation: ComponentType::of::<C>(),
            install: installer(move |binder| {
                binder
                    .bind::<A, C>(cast, Attributes::new().fallback().automatic().member())
                    .map(|_| ())
            }),
        });
        self
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.iter()
    }

    /// Register every entry through `binder`, in catalog order.
    pub fn install(&self, binder: &Binder<'_>) -> Result<()> {
        for entry in &self.entries {
            (entry.install)(binder)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{Constructor, Descriptor};
    use crate::container::Container;

    trait Store: Send + Sync {
        fn name(&self) -> &'static str;
    }

    struct Memory;
    struct Disk;

    impl Store for Memory {
        fn name(&self) -> &'static str {
            "memory"
        }
    }

    impl Store for Disk {
        fn name(&self) -> &'static str {
            "disk"
        }
    }

    impl Component for Memory {
        fn descriptor() -> Descriptor<Self> {
            Descriptor::new().constructor(Constructor::from_fn("new", |()| Ok(Memory)))
        }
    }

    impl Component for Disk {
        fn descriptor() -> Descriptor<Self> {
            Descriptor::new().constructor(Constructor::from_fn("new", |()| Ok(Disk)))
        }
    }

    #[test]
    fn test_catalog_entries() {
        let catalog = Catalog::new()
            .component::<Memory>()
            .implementation::<dyn Store, Disk>(|c| c);

        assert_eq!(catalog.len(), 2);
        let apis: Vec<ComponentType> = catalog.entries().map(CatalogEntry::api).collect();
        assert_eq!(
            apis,
            vec![ComponentType::of::<Memory>(), ComponentType::of::<dyn Store>()]
        );
    }

    #[test]
    fn test_explicit_binding_beats_catalog() {
        let catalog = Catalog::new().implementation::<dyn Store, Disk>(|c| c);
        let container = Container::with_catalog(catalog).unwrap();
        assert_eq!(container.get_component::<dyn Store>().unwrap().name(), "disk");

        let container = Container::with_catalog(
            Catalog::new().implementation::<dyn Store, Disk>(|c| c),
        )
        .unwrap();
        container
            .bind::<dyn Store, Memory>(|c| c, Attributes::new())
            .unwrap();
        assert_eq!(container.get_component::<dyn Store>().unwrap().name(), "memory");
    }

    #[test]
    fn test_catalog_members_join_group() {
        let catalog = Catalog::new()
            .member::<dyn Store, Memory>(|c| c)
            .member::<dyn Store, Disk>(|c| c);
        let container = Container::with_catalog(catalog).unwrap();

        let names: Vec<&'static str> = container
            .get_component_group::<dyn Store>()
            .unwrap()
            .iter()
            .map(|store| store.name())
            .collect();
        assert_eq!(names, vec!["memory", "disk"]);
    }
}
