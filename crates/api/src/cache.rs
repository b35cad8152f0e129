use crate::models::{LoaderContext, LoaderId};
use serde::{Deserialize, Serialize};

/// Counters and sizes for a factory resolution cache
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub entries: usize,
    pub negative_entries: usize,
    pub loaders: usize,
    pub hits: u64,
    pub misses: u64,
    pub discoveries_failed: u64,
}

/// A cache keyed by loader context that must be purged when that context is retired.
pub trait LoaderScopedCache: Send + Sync {
    /// Cache name (for logging)
    fn name(&self) -> &str;

    /// Drop every entry belonging to `loader`. Returns the number removed.
    fn clear_loader(&self, loader: Option<LoaderId>) -> usize;
}

/// Host-facing contract of the factory resolution cache.
pub trait FactoryResolver: Send + Sync {
    /// Record the implementation a deployment uses for `factory_id`, or that it has none.
    fn register(
        &self,
        loader: Option<&LoaderContext>,
        factory_id: &str,
        implementation: Option<&str>,
    );

    /// Implementation name serving `factory_id` for `loader`, if any.
    fn resolve(&self, factory_id: &str, loader: Option<&LoaderContext>) -> Option<String>;

    /// Forget everything cached for `loader`. Returns the number of factory entries removed.
    fn teardown(&self, loader: Option<&LoaderContext>) -> usize;

    fn stats(&self) -> CacheStats;
}
