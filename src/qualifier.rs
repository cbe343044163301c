//! Qualifier tags
//!
//! Qualifiers are `(type-tag, value)` pairs that select between variants of a
//! component. A component declares which qualifier types it is interested in
//! through [`Qualifiers`]; everything else is filtered out of its context.

use std::fmt;
use std::sync::Arc;

/// The tag half of a qualifier, e.g. `locale` or `region`.
///
/// # Examples
///
/// ```rust
/// use contextual_injector::QualifierType;
///
/// const LOCALE: QualifierType = QualifierType::new("locale");
///
/// let english = LOCALE.value("en");
/// assert_eq!(english.kind(), LOCALE);
/// assert_eq!(english.value(), "en");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QualifierType(&'static str);

impl QualifierType {
    /// Create a qualifier type from its tag name.
    #[inline]
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    /// The tag name.
    #[inline]
    pub fn name(&self) -> &'static str {
        self.0
    }

    /// Pair this tag with a value.
    #[inline]
    pub fn value(self, value: impl Into<Arc<str>>) -> Qualifier {
        Qualifier::new(self, value)
    }
}

impl From<&'static str> for QualifierType {
    fn from(name: &'static str) -> Self {
        Self(name)
    }
}

impl fmt::Display for QualifierType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// A tagged qualifier value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Qualifier {
    kind: QualifierType,
    value: Arc<str>,
}

impl Qualifier {
    /// Create a qualifier.
    #[inline]
    pub fn new(kind: impl Into<QualifierType>, value: impl Into<Arc<str>>) -> Self {
        Self {
            kind: kind.into(),
            value: value.into(),
        }
    }

    /// The qualifier's type tag.
    #[inline]
    pub fn kind(&self) -> QualifierType {
        self.kind
    }

    /// The qualifier's value.
    #[inline]
    pub fn value(&self) -> &str {
        &self.value
    }

    pub(crate) fn shared_value(&self) -> Arc<str> {
        Arc::clone(&self.value)
    }
}

impl fmt::Display for Qualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.kind, self.value)
    }
}

/// A sorted, duplicate-free set of qualifier types.
///
/// Only built through [`Qualifiers::only`] or `collect`, so lookups can rely
/// on the ordering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct QualifierSet(Vec<QualifierType>);

impl QualifierSet {
    #[inline]
    pub fn contains(&self, kind: QualifierType) -> bool {
        self.0.binary_search(&kind).is_ok()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = QualifierType> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<QualifierType> for QualifierSet {
    fn from_iter<I: IntoIterator<Item = QualifierType>>(iter: I) -> Self {
        let mut types: Vec<QualifierType> = iter.into_iter().collect();
        types.sort_unstable();
        types.dedup();
        Self(types)
    }
}

/// The qualifier types a component (or factory) observes.
///
/// Components are context-oblivious by default: they see an empty context and
/// are cached once per scope regardless of the caller's qualifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Qualifiers {
    /// Observe nothing.
    #[default]
    None,
    /// Observe only the listed qualifier types.
    Only(QualifierSet),
    /// Observe the whole incoming context.
    All,
}

impl Qualifiers {
    /// Observe only the given qualifier types, in any order.
    pub fn only(types: impl IntoIterator<Item = QualifierType>) -> Self {
        Self::Only(types.into_iter().collect())
    }

    /// Whether a qualifier type passes this filter.
    #[inline]
    pub fn accepts(&self, kind: QualifierType) -> bool {
        match self {
            Self::None => false,
            Self::Only(types) => types.contains(kind),
            Self::All => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOCALE: QualifierType = QualifierType::new("locale");
    const REGION: QualifierType = QualifierType::new("region");

    #[test]
    fn test_qualifier_display() {
        assert_eq!(LOCALE.value("en").to_string(), "locale=en");
        assert_eq!(Qualifier::new("region", "eu").kind(), REGION);
    }

    #[test]
    fn test_qualifiers_filter() {
        assert!(!Qualifiers::None.accepts(LOCALE));
        assert!(Qualifiers::All.accepts(REGION));

        let only = Qualifiers::only([REGION, LOCALE, LOCALE]);
        assert_eq!(only, Qualifiers::only([LOCALE, REGION]));
        assert!(only.accepts(LOCALE));
        assert!(!only.accepts(QualifierType::new("tenant")));
    }

    #[test]
    fn test_unsorted_declaration_accepts_every_type() {
        let tenant = QualifierType::new("tenant");
        let set: QualifierSet = [tenant, REGION, LOCALE, REGION].into_iter().collect();
        assert_eq!(set.len(), 3);
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![LOCALE, REGION, tenant]);

        let only = Qualifiers::Only(set);
        assert!(only.accepts(REGION));
        assert!(only.accepts(LOCALE));
        assert!(only.accepts(tenant));
    }
}
