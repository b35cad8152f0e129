//! Discovery contract: the expensive lookup the factory cache wraps.

use crate::models::LoaderContext;
use std::io;

/// Outcome of a discovery attempt that completed without error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Discovery {
    Found(String),
    NotFound,
}

impl Discovery {
    /// The implementation name, treating an empty `Found` as not found.
    pub fn into_name(self) -> Option<String> {
        match self {
            Discovery::Found(name) if !name.is_empty() => Some(name),
            _ => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Discovery::Found(name) if !name.is_empty())
    }
}

impl From<Option<String>> for Discovery {
    fn from(name: Option<String>) -> Self {
        match name {
            Some(name) if !name.is_empty() => Discovery::Found(name),
            _ => Discovery::NotFound,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("malformed descriptor {resource}: {reason}")]
    MalformedDescriptor { resource: String, reason: String },
    #[error("provider unavailable for {service}: {reason}")]
    ProviderUnavailable { service: String, reason: String },
    #[error("{0}")]
    Other(String),
}

/// Resolves the implementation name for a factory id as seen from a loader.
///
/// `loader` is `None` for the system context.
pub trait DiscoveryStrategy: Send + Sync {
    /// Strategy name (for logging)
    fn name(&self) -> &str;

    fn discover(
        &self,
        factory_id: &str,
        loader: Option<&LoaderContext>,
    ) -> Result<Discovery, DiscoveryError>;
}

/// Adapts a closure into a [`DiscoveryStrategy`].
pub struct FnDiscovery<F> {
    name: String,
    f: F,
}

impl<F> FnDiscovery<F> {
    pub fn new(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&str, Option<&LoaderContext>) -> Result<Discovery, DiscoveryError> + Send + Sync,
    {
        Self {
            name: name.into(),
            f,
        }
    }
}

impl<F> DiscoveryStrategy for FnDiscovery<F>
where
    F: Fn(&str, Option<&LoaderContext>) -> Result<Discovery, DiscoveryError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn discover(
        &self,
        factory_id: &str,
        loader: Option<&LoaderContext>,
    ) -> Result<Discovery, DiscoveryError> {
        (self.f)(factory_id, loader)
    }
}
