//! Resolution context
//!
//! A [`Context`] is the qualifier information accumulated along a dependency
//! path. Entries contributed closer to the leaf override entries of the same
//! qualifier type contributed earlier. Contexts compare and hash by their
//! qualifier map, which makes them usable as cache-key components.

use crate::qualifier::{Qualifier, QualifierType, Qualifiers};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Accumulated qualifiers for one point of a dependency path.
///
/// # Examples
///
/// ```rust
/// use contextual_injector::{Context, QualifierType, Qualifiers};
///
/// const LOCALE: QualifierType = QualifierType::new("locale");
/// const REGION: QualifierType = QualifierType::new("region");
///
/// let context = Context::new().with(LOCALE.value("en")).with(REGION.value("eu"));
///
/// // A component interested in `locale` only sees `locale`
/// let narrowed = context.accept(&Qualifiers::only([LOCALE]));
/// assert_eq!(narrowed.get(LOCALE), Some("en"));
/// assert_eq!(narrowed.get(REGION), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Context {
    qualifiers: BTreeMap<QualifierType, Arc<str>>,
}

impl Context {
    /// The empty (default) context.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a context from a set of qualifiers.
    pub fn of(qualifiers: impl IntoIterator<Item = Qualifier>) -> Self {
        let mut context = Self::new();
        for qualifier in qualifiers {
            context.insert(qualifier);
        }
        context
    }

    /// Add (or override) a qualifier.
    #[inline]
    pub fn with(mut self, qualifier: Qualifier) -> Self {
        self.insert(qualifier);
        self
    }

    fn insert(&mut self, qualifier: Qualifier) {
        self.qualifiers
            .insert(qualifier.kind(), qualifier.shared_value());
    }

    /// Value of a qualifier type, if present.
    #[inline]
    pub fn get(&self, kind: QualifierType) -> Option<&str> {
        self.qualifiers.get(&kind).map(|value| &**value)
    }

    /// Whether this context carries exactly this qualifier.
    #[inline]
    pub fn contains(&self, qualifier: &Qualifier) -> bool {
        self.get(qualifier.kind()) == Some(qualifier.value())
    }

    /// Whether every qualifier of `required` is carried by this context.
    pub fn satisfies(&self, required: &Context) -> bool {
        required
            .qualifiers
            .iter()
            .all(|(kind, value)| self.qualifiers.get(kind) == Some(value))
    }

    /// Number of qualifiers.
    #[inline]
    pub fn len(&self) -> usize {
        self.qualifiers.len()
    }

    /// Whether this is the default context.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.qualifiers.is_empty()
    }

    /// Iterate over the qualifiers in tag order.
    pub fn iter(&self) -> impl Iterator<Item = Qualifier> + '_ {
        self.qualifiers
            .iter()
            .map(|(kind, value)| Qualifier::new(*kind, Arc::clone(value)))
    }

    /// Narrow to the qualifier types a consumer declared interest in.
    pub fn accept(&self, qualifiers: &Qualifiers) -> Context {
        match qualifiers {
            Qualifiers::All => self.clone(),
            Qualifiers::None => Context::new(),
            Qualifiers::Only(_) => Context {
                qualifiers: self
                    .qualifiers
                    .iter()
                    .filter(|(kind, _)| qualifiers.accepts(**kind))
                    .map(|(kind, value)| (*kind, Arc::clone(value)))
                    .collect(),
            },
        }
    }

    /// Union with `other`; `other` wins where both carry the same type.
    pub fn combine(&self, other: &Context) -> Context {
        if other.is_empty() {
            return self.clone();
        }
        let mut combined = self.clone();
        for (kind, value) in &other.qualifiers {
            combined.qualifiers.insert(*kind, Arc::clone(value));
        }
        combined
    }

    /// Drop the given qualifier types so they do not reach descendants.
    pub fn ignore(&self, kinds: &[QualifierType]) -> Context {
        if kinds.is_empty() {
            return self.clone();
        }
        Context {
            qualifiers: self
                .qualifiers
                .iter()
                .filter(|(kind, _)| !kinds.contains(kind))
                .map(|(kind, value)| (*kind, Arc::clone(value)))
                .collect(),
        }
    }

    /// Extend with dependency-site qualifiers.
    pub fn extend(&self, qualifiers: &[Qualifier]) -> Context {
        if qualifiers.is_empty() {
            return self.clone();
        }
        let mut extended = self.clone();
        for qualifier in qualifiers {
            extended.insert(qualifier.clone());
        }
        extended
    }
}

impl FromIterator<Qualifier> for Context {
    fn from_iter<I: IntoIterator<Item = Qualifier>>(iter: I) -> Self {
        Self::of(iter)
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (kind, value)) in self.qualifiers.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}={}", kind, value)?;
        }
        f.write_str("}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qualifier::QualifierSet;
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    const LOCALE: QualifierType = QualifierType::new("locale");
    const REGION: QualifierType = QualifierType::new("region");
    const TENANT: QualifierType = QualifierType::new("tenant");

    fn hash_of(context: &Context) -> u64 {
        let mut hasher = DefaultHasher::new();
        context.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_accept_narrows() {
        let context = Context::of([LOCALE.value("en"), REGION.value("eu")]);

        let narrowed = context.accept(&Qualifiers::only([LOCALE]));
        assert_eq!(narrowed, Context::of([LOCALE.value("en")]));
        assert!(context.accept(&Qualifiers::None).is_empty());
        assert_eq!(context.accept(&Qualifiers::All), context);
    }

    #[test]
    fn test_narrowed_equality_ignores_filtered_types() {
        let a = Context::of([LOCALE.value("en"), REGION.value("eu")]);
        let b = Context::of([LOCALE.value("en"), REGION.value("us")]);
        let filter = Qualifiers::only([LOCALE]);

        assert_ne!(a, b);
        assert_eq!(a.accept(&filter), b.accept(&filter));
        assert_eq!(hash_of(&a.accept(&filter)), hash_of(&b.accept(&filter)));
    }

    #[test]
    fn test_accept_keeps_every_declared_type() {
        let context = Context::of([LOCALE.value("en"), REGION.value("eu"), TENANT.value("acme")]);
        let declared: QualifierSet = [REGION, LOCALE].into_iter().collect();

        let narrowed = context.accept(&Qualifiers::Only(declared));
        assert_eq!(narrowed, Context::of([LOCALE.value("en"), REGION.value("eu")]));
    }

    #[test]
    fn test_combine_prefers_other() {
        let own = Context::of([LOCALE.value("en"), TENANT.value("acme")]);
        let delegate = Context::of([LOCALE.value("fr")]);

        let combined = own.combine(&delegate);
        assert_eq!(combined.get(LOCALE), Some("fr"));
        assert_eq!(combined.get(TENANT), Some("acme"));
    }

    #[test]
    fn test_ignore_removes_types() {
        let context = Context::of([LOCALE.value("en"), REGION.value("eu")]);
        let ignored = context.ignore(&[REGION]);
        assert_eq!(ignored.len(), 1);
        assert_eq!(ignored.get(REGION), None);
    }

    #[test]
    fn test_satisfies_subset() {
        let context = Context::of([LOCALE.value("en"), REGION.value("eu")]);
        assert!(context.satisfies(&Context::new()));
        assert!(context.satisfies(&Context::of([LOCALE.value("en")])));
        assert!(!context.satisfies(&Context::of([LOCALE.value("de")])));
        assert!(!context.satisfies(&Context::of([TENANT.value("acme")])));
    }

    #[test]
    fn test_display() {
        let context = Context::new()
            .with(REGION.value("eu"))
            .with(LOCALE.value("en"));
        assert_eq!(context.to_string(), "{locale=en, region=eu}");
        assert_eq!(Context::new().to_string(), "{}");
    }
}
