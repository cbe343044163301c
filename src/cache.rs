//! Component cache
//!
//! Per-scope storage of built instances keyed by binding and narrowed
//! context. Uses DashMap for concurrent access; each key owns a `OnceCell`
//! so concurrent resolvers of one key perform a single build.

use crate::component::AnyArc;
use crate::context::Context;
use ahash::RandomState;
use dashmap::DashMap;
use once_cell::sync::OnceCell;
use std::sync::Arc;

/// Cache key: the binding that produced the instance and the context it saw.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct CacheKey {
    binding: u64,
    context: Context,
}

impl CacheKey {
    #[inline]
    pub(crate) fn new(binding: u64, context: Context) -> Self {
        Self { binding, context }
    }
}

/// Write-once instance storage for one scope.
pub(crate) struct ComponentCache {
    cells: DashMap<CacheKey, Arc<OnceCell<AnyArc>>, RandomState>,
}

impl ComponentCache {
    /// Create an empty cache.
    ///
    /// 8 shards: caches are created per scope (and per scoped instance), so
    /// creation cost matters more than wide write concurrency.
    #[inline]
    pub(crate) fn new() -> Self {
        Self {
            cells: DashMap::with_capacity_and_hasher_and_shard_amount(
                0,
                RandomState::new(),
                8,
            ),
        }
    }

    /// The published instance for `key`, if any.
    #[cfg(test)]
    pub(crate) fn get(&self, key: &CacheKey) -> Option<AnyArc> {
        self.cells
            .get(key)
            .and_then(|cell| cell.get().map(Arc::clone))
    }

    /// The cell for `key`, created empty on first request.
    ///
    /// The shard guard is released before returning, so the caller may run a
    /// (recursive) build inside `get_or_try_init` without holding it.
    #[inline]
    pub(crate) fn cell(&self, key: CacheKey) -> Arc<OnceCell<AnyArc>> {
        Arc::clone(self.cells.entry(key).or_default().value())
    }

    /// Number of published instances.
    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.cells
            .iter()
            .filter(|entry| entry.value().get().is_some())
            .count()
    }
}

impl Default for ComponentCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qualifier::QualifierType;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    const LOCALE: QualifierType = QualifierType::new("locale");

    #[test]
    fn test_keys_distinguish_context() {
        let cache = ComponentCache::new();
        let en = CacheKey::new(1, Context::new().with(LOCALE.value("en")));
        let fr = CacheKey::new(1, Context::new().with(LOCALE.value("fr")));

        cache.cell(en.clone()).get_or_init(|| Arc::new("en") as AnyArc);
        assert!(cache.get(&en).is_some());
        assert!(cache.get(&fr).is_none());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_failed_build_leaves_cell_empty() {
        let cache = ComponentCache::new();
        let key = CacheKey::new(7, Context::new());

        let cell = cache.cell(key.clone());
        let failed: Result<&AnyArc, &str> = cell.get_or_try_init(|| Err("boom"));
        assert!(failed.is_err());
        assert!(cache.get(&key).is_none());
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_concurrent_single_build() {
        let cache = ComponentCache::new();
        let builds = AtomicUsize::new(0);
        let key = CacheKey::new(3, Context::new());

        thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    let cell = cache.cell(key.clone());
                    cell.get_or_init(|| {
                        builds.fetch_add(1, Ordering::SeqCst);
                        Arc::new(42u32) as AnyArc
                    });
                });
            }
        });

        assert_eq!(builds.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }
}
