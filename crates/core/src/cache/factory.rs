//! Factory resolution cache.
//!
//! Memoizes "which implementation serves factory X for loader L" so the
//! discovery strategy runs at most once per key in the steady state.
//! Entries live until the loader is torn down or the host overwrites them.

use dashmap::DashMap;
use factory_finder_api::{
    CacheEntry, CacheKey, CacheStats, DiscoveryStrategy, FactoryResolver, LoaderContext,
    LoaderId, LoaderScopedCache,
};
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

pub struct FactoryFinderCache {
    entries: DashMap<CacheKey, CacheEntry>,
    strategy: Arc<dyn DiscoveryStrategy>,
    /// Caches purged in lock-step with this one on teardown.
    dependents: Vec<Arc<dyn LoaderScopedCache>>,
    hits: AtomicU64,
    misses: AtomicU64,
    discoveries_failed: AtomicU64,
}

impl FactoryFinderCache {
    pub fn new(strategy: Arc<dyn DiscoveryStrategy>) -> Self {
        Self {
            entries: DashMap::new(),
            strategy,
            dependents: Vec::new(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            discoveries_failed: AtomicU64::new(0),
        }
    }

    /// Attach a cache that must be cleared whenever a loader is torn down here.
    pub fn with_dependent(mut self, dependent: Arc<dyn LoaderScopedCache>) -> Self {
        self.dependents.push(dependent);
        self
    }

    pub fn strategy(&self) -> &Arc<dyn DiscoveryStrategy> {
        &self.strategy
    }

    /// Store the implementation for `(loader, factory_id)`, replacing any previous entry.
    ///
    /// `None` or an empty name records that the deployment has no implementation.
    pub fn register(
        &self,
        loader: Option<&LoaderContext>,
        factory_id: &str,
        implementation: Option<&str>,
    ) {
        let key = CacheKey::new(loader.map(LoaderContext::id), factory_id);
        let entry = CacheEntry::from_name(implementation);
        tracing::debug!(
            "Registered {:?} for {} in {}",
            entry,
            factory_id,
            describe(key.loader)
        );
        self.entries.insert(key, entry);
    }

    /// Resolve the implementation for `factory_id` as seen from `loader`.
    ///
    /// Cached answers (including "none") are returned without running
    /// discovery. On a miss the strategy runs, its failures count as "none",
    /// and the outcome is cached. Concurrent misses on one key may each run
    /// discovery; the last write wins.
    pub fn resolve(&self, factory_id: &str, loader: Option<&LoaderContext>) -> Option<String> {
        let key = CacheKey::new(loader.map(LoaderContext::id), factory_id);

        let cached = self.entries.get(&key).map(|entry| entry.value().clone());
        if let Some(entry) = cached {
            self.hits.fetch_add(1, Ordering::Relaxed);
            tracing::trace!("Cache hit for {} in {}", factory_id, describe(key.loader));
            return entry.implementation().map(str::to_string);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let entry = match self.strategy.discover(factory_id, loader) {
            Ok(found) => CacheEntry::from_name(found.into_name().as_deref()),
            Err(e) => {
                self.discoveries_failed.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(
                    "Discovery via {} failed for {} in {}: {}",
                    self.strategy.name(),
                    factory_id,
                    describe(key.loader),
                    e
                );
                CacheEntry::Negative
            }
        };
        tracing::debug!(
            "Discovered {:?} for {} in {}",
            entry,
            factory_id,
            describe(key.loader)
        );

        let resolved = entry.implementation().map(str::to_string);
        self.entries.insert(key, entry);
        resolved
    }

    /// The cached entry for a key, without running discovery.
    pub fn lookup(&self, factory_id: &str, loader: Option<&LoaderContext>) -> Option<CacheEntry> {
        let key = CacheKey::new(loader.map(LoaderContext::id), factory_id);
        self.entries.get(&key).map(|entry| entry.value().clone())
    }

    /// Remove every entry for `loader` here and in every dependent cache.
    ///
    /// Call once the loader is quiescent; a resolve racing with teardown on
    /// the same loader may re-insert an entry.
    pub fn teardown(&self, loader: Option<&LoaderContext>) -> usize {
        let target = loader.map(LoaderContext::id);

        let mut removed = 0;
        self.entries.retain(|key, _| {
            if key.loader == target {
                removed += 1;
                false
            } else {
                true
            }
        });

        for dependent in &self.dependents {
            let cleared = dependent.clear_loader(target);
            tracing::debug!(
                "Cleared {} entries from {} for {}",
                cleared,
                dependent.name(),
                describe(target)
            );
        }

        tracing::info!(
            "Tore down {}: removed {} factory entries",
            describe(target),
            removed
        );
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        let mut loaders = HashSet::new();
        let mut entries = 0;
        let mut negative_entries = 0;
        for item in self.entries.iter() {
            entries += 1;
            if item.value().is_negative() {
                negative_entries += 1;
            }
            loaders.insert(item.key().loader);
        }

        CacheStats {
            entries,
            negative_entries,
            loaders: loaders.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            discoveries_failed: self.discoveries_failed.load(Ordering::Relaxed),
        }
    }
}

fn describe(loader: Option<LoaderId>) -> String {
    match loader {
        Some(id) => id.to_string(),
        None => "system loader".to_string(),
    }
}

impl FactoryResolver for FactoryFinderCache {
    fn register(
        &self,
        loader: Option<&LoaderContext>,
        factory_id: &str,
        implementation: Option<&str>,
    ) {
        FactoryFinderCache::register(self, loader, factory_id, implementation)
    }

    fn resolve(&self, factory_id: &str, loader: Option<&LoaderContext>) -> Option<String> {
        FactoryFinderCache::resolve(self, factory_id, loader)
    }

    fn teardown(&self, loader: Option<&LoaderContext>) -> usize {
        FactoryFinderCache::teardown(self, loader)
    }

    fn stats(&self) -> CacheStats {
        FactoryFinderCache::stats(self)
    }
}
