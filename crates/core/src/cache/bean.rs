//! Bean properties cache.
//!
//! Holds introspected property lists per (loader, type name). It is purged
//! together with the factory cache when a loader is torn down.

use dashmap::DashMap;
use factory_finder_api::{LoaderContext, LoaderId, LoaderScopedCache};
use serde::Serialize;
use smol_str::SmolStr;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BeanProperties {
    pub type_name: String,
    /// Sorted, deduplicated
    pub properties: Vec<String>,
}

impl BeanProperties {
    pub fn new<I, S>(type_name: impl Into<String>, properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut properties: Vec<String> = properties.into_iter().map(Into::into).collect();
        properties.sort();
        properties.dedup();
        Self {
            type_name: type_name.into(),
            properties,
        }
    }

    pub fn has_property(&self, name: &str) -> bool {
        self.properties
            .binary_search_by(|p| p.as_str().cmp(name))
            .is_ok()
    }
}

#[derive(Debug, Default)]
pub struct BeanPropertiesCache {
    entries: DashMap<(Option<LoaderId>, SmolStr), Arc<BeanProperties>>,
}

impl BeanPropertiesCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, loader: Option<&LoaderContext>, type_name: &str) -> Option<Arc<BeanProperties>> {
        let key = (loader.map(LoaderContext::id), SmolStr::new(type_name));
        self.entries.get(&key).map(|entry| Arc::clone(entry.value()))
    }

    /// Cached properties for `type_name`, running `introspect` on a miss.
    ///
    /// `introspect` runs without holding a map lock; if two callers race the
    /// first insert is kept.
    pub fn get_or_introspect<F>(
        &self,
        loader: Option<&LoaderContext>,
        type_name: &str,
        introspect: F,
    ) -> Arc<BeanProperties>
    where
        F: FnOnce() -> BeanProperties,
    {
        let key = (loader.map(LoaderContext::id), SmolStr::new(type_name));
        if let Some(hit) = self.entries.get(&key).map(|entry| Arc::clone(entry.value())) {
            return hit;
        }

        let computed = Arc::new(introspect());
        let entry = self.entries.entry(key).or_insert(computed);
        Arc::clone(entry.value())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl LoaderScopedCache for BeanPropertiesCache {
    fn name(&self) -> &str {
        "bean-properties"
    }

    fn clear_loader(&self, loader: Option<LoaderId>) -> usize {
        let mut removed = 0;
        self.entries.retain(|(owner, _), _| {
            if *owner == loader {
                removed += 1;
                false
            } else {
                true
            }
        });
        removed
    }
}
