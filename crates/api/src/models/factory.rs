use super::loader::LoaderId;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::fmt;

/// Logical service name a factory is resolved for, e.g. `jakarta.el.ExpressionFactory`.
///
/// Compared with ordinary string equality. The empty id is a valid, distinct value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FactoryId(SmolStr);

impl FactoryId {
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(SmolStr::new(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Resource path of the service descriptor for this factory.
    pub fn descriptor_path(&self) -> String {
        format!("{}{}", SERVICES_PREFIX, self.0)
    }
}

/// Directory service descriptors live under inside a loader's resources.
pub const SERVICES_PREFIX: &str = "META-INF/services/";

impl fmt::Display for FactoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FactoryId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for FactoryId {
    fn from(s: String) -> Self {
        Self(SmolStr::from(s))
    }
}

impl AsRef<str> for FactoryId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// Registry key: loader identity plus factory id.
///
/// `loader` is `None` for the system context. Only the id of the loader is
/// kept, so an entry never holds a retired context alive.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub loader: Option<LoaderId>,
    pub factory_id: FactoryId,
}

impl CacheKey {
    pub fn new(loader: Option<LoaderId>, factory_id: impl Into<FactoryId>) -> Self {
        Self {
            loader,
            factory_id: factory_id.into(),
        }
    }
}

/// Memoized outcome of a resolution attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CacheEntry {
    /// Discovery (or the host) named an implementation. Never empty.
    Resolved(String),
    /// Discovery ran and found nothing. Distinct from "never attempted".
    Negative,
}

impl CacheEntry {
    /// Build an entry from an optional class name; absent and empty names are negative.
    pub fn from_name(name: Option<&str>) -> Self {
        match name {
            Some(name) if !name.is_empty() => CacheEntry::Resolved(name.to_string()),
            _ => CacheEntry::Negative,
        }
    }

    pub fn implementation(&self) -> Option<&str> {
        match self {
            CacheEntry::Resolved(name) => Some(name),
            CacheEntry::Negative => None,
        }
    }

    pub fn is_negative(&self) -> bool {
        matches!(self, CacheEntry::Negative)
    }
}
