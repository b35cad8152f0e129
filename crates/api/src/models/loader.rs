//! Loader contexts: isolated, identity-compared code-loading scopes.
//!
//! A [`LoaderContext`] stands for one deployment's view of resources and
//! service providers. Two contexts with the same roots are still different
//! contexts; equality and hashing only look at the [`LoaderId`].

use crate::error::{ApiError, ApiResult};
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::io::{self, Read};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

static NEXT_LOADER_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a loader context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LoaderId(pub u64);

impl LoaderId {
    fn next() -> Self {
        LoaderId(NEXT_LOADER_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for LoaderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "loader#{}", self.0)
    }
}

/// A place resources can be read from (a directory, an archive, ...).
pub trait ResourceRoot: Send + Sync {
    /// Open `name` (a `/`-separated resource path). `Ok(None)` when absent.
    fn open(&self, name: &str) -> io::Result<Option<Box<dyn Read + Send>>>;

    /// Resource names under `prefix`. Roots that cannot enumerate return nothing.
    fn list(&self, _prefix: &str) -> io::Result<Vec<String>> {
        Ok(Vec::new())
    }

    /// Short description for logs.
    fn describe(&self) -> String;
}

/// Service name to provider implementation registrations, in registration order.
#[derive(Debug, Default)]
pub struct ProviderTable {
    entries: RwLock<Vec<(SmolStr, String)>>,
}

impl ProviderTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, service: &str, implementation: &str) -> ApiResult<()> {
        if service.is_empty() {
            return Err(ApiError::InvalidArgument("empty service name".to_string()));
        }
        if implementation.is_empty() {
            return Err(ApiError::InvalidArgument(format!(
                "empty provider name for {}",
                service
            )));
        }
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.push((SmolStr::new(service), implementation.to_string()));
        Ok(())
    }

    pub fn providers(&self, service: &str) -> Vec<String> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .iter()
            .filter(|(s, _)| s == service)
            .map(|(_, implementation)| implementation.clone())
            .collect()
    }
}

struct LoaderInner {
    id: LoaderId,
    name: String,
    parent: Option<LoaderContext>,
    roots: Vec<Arc<dyn ResourceRoot>>,
    providers: ProviderTable,
}

/// Cheaply clonable handle to a loader context.
#[derive(Clone)]
pub struct LoaderContext {
    inner: Arc<LoaderInner>,
}

impl LoaderContext {
    pub fn new(name: impl Into<String>, roots: Vec<Arc<dyn ResourceRoot>>) -> Self {
        Self::builder(name).roots(roots).build()
    }

    pub fn builder(name: impl Into<String>) -> LoaderContextBuilder {
        LoaderContextBuilder {
            name: name.into(),
            parent: None,
            roots: Vec::new(),
        }
    }

    pub fn id(&self) -> LoaderId {
        self.inner.id
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn parent(&self) -> Option<&LoaderContext> {
        self.inner.parent.as_ref()
    }

    pub fn roots(&self) -> &[Arc<dyn ResourceRoot>] {
        &self.inner.roots
    }

    /// Open a resource, asking the parent chain before this context's own roots.
    pub fn open_resource(&self, name: &str) -> io::Result<Option<Box<dyn Read + Send>>> {
        if let Some(parent) = &self.inner.parent {
            if let Some(reader) = parent.open_resource(name)? {
                return Ok(Some(reader));
            }
        }
        for root in &self.inner.roots {
            if let Some(reader) = root.open(name)? {
                return Ok(Some(reader));
            }
        }
        Ok(None)
    }

    /// Every resource name under `prefix` visible to this context, sorted and deduplicated.
    pub fn list_resources(&self, prefix: &str) -> io::Result<Vec<String>> {
        let mut names = match &self.inner.parent {
            Some(parent) => parent.list_resources(prefix)?,
            None => Vec::new(),
        };
        for root in &self.inner.roots {
            names.extend(root.list(prefix)?);
        }
        names.sort();
        names.dedup();
        Ok(names)
    }

    /// Register a dynamically discoverable provider for `service` on this context.
    pub fn register_provider(&self, service: &str, implementation: &str) -> ApiResult<()> {
        self.inner.providers.register(service, implementation)
    }

    /// Providers visible to this context for `service`, parent-first.
    pub fn providers(&self, service: &str) -> Vec<String> {
        let mut visible = match &self.inner.parent {
            Some(parent) => parent.providers(service),
            None => Vec::new(),
        };
        visible.extend(self.inner.providers.providers(service));
        visible
    }
}

impl PartialEq for LoaderContext {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for LoaderContext {}

impl Hash for LoaderContext {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.id.hash(state);
    }
}

impl fmt::Debug for LoaderContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let roots: Vec<String> = self.inner.roots.iter().map(|r| r.describe()).collect();
        f.debug_struct("LoaderContext")
            .field("id", &self.inner.id)
            .field("name", &self.inner.name)
            .field("parent", &self.inner.parent.as_ref().map(|p| p.id()))
            .field("roots", &roots)
            .finish()
    }
}

pub struct LoaderContextBuilder {
    name: String,
    parent: Option<LoaderContext>,
    roots: Vec<Arc<dyn ResourceRoot>>,
}

impl LoaderContextBuilder {
    pub fn parent(mut self, parent: &LoaderContext) -> Self {
        self.parent = Some(parent.clone());
        self
    }

    pub fn root(mut self, root: Arc<dyn ResourceRoot>) -> Self {
        self.roots.push(root);
        self
    }

    pub fn roots(mut self, roots: impl IntoIterator<Item = Arc<dyn ResourceRoot>>) -> Self {
        self.roots.extend(roots);
        self
    }

    pub fn build(self) -> LoaderContext {
        LoaderContext {
            inner: Arc::new(LoaderInner {
                id: LoaderId::next(),
                name: self.name,
                parent: self.parent,
                roots: self.roots,
                providers: ProviderTable::new(),
            }),
        }
    }
}
