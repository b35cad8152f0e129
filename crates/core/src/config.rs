//! Finder configuration.
//!
//! Loaded from an optional JSON file, then adjusted from the environment:
//! - `FACTORY_FINDER_STRATEGY` overrides the strategy kind
//! - `CLASSPATH` supplies the system classpath when the file sets none
//!
//! `system_providers` fills the provider strategy's table for the system
//! context; deployment loaders register their own providers.

use crate::classpath::classpath_roots;
use crate::discovery::{
    DiscoveryChain, FixedDiscovery, ProviderEnumerationDiscovery, ServiceDescriptorDiscovery,
};
use crate::error::{FinderError, Result};
use factory_finder_api::DiscoveryStrategy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

pub const STRATEGY_ENV: &str = "FACTORY_FINDER_STRATEGY";
pub const CLASSPATH_ENV: &str = "CLASSPATH";

/// Which discovery strategy a cache is built with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    /// `META-INF/services` descriptors only
    Descriptor,
    /// Dynamically registered providers only
    Provider,
    /// Descriptors, then providers, then configured defaults
    #[default]
    Chain,
}

impl FromStr for StrategyKind {
    type Err = FinderError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "descriptor" => Ok(StrategyKind::Descriptor),
            "provider" => Ok(StrategyKind::Provider),
            "chain" => Ok(StrategyKind::Chain),
            other => Err(FinderError::Config(format!(
                "unknown strategy '{}' (expected descriptor, provider or chain)",
                other
            ))),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StrategyKind::Descriptor => "descriptor",
            StrategyKind::Provider => "provider",
            StrategyKind::Chain => "chain",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FinderConfig {
    pub strategy: StrategyKind,
    /// Roots searched for the system context (no loader).
    pub system_classpath: Vec<PathBuf>,
    /// Providers visible to the system context, per factory id, in registration order.
    pub system_providers: BTreeMap<String, Vec<String>>,
    /// Fallback implementation per factory id, used by the chain strategy.
    pub defaults: BTreeMap<String, String>,
}

impl FinderConfig {
    /// Read `path` (if any) and apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_json(&std::fs::read_to_string(path)?)?,
            None => Self::default(),
        };
        config.apply_overrides(
            std::env::var(STRATEGY_ENV).ok(),
            std::env::var_os(CLASSPATH_ENV),
        )?;
        Ok(config)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn apply_overrides(
        &mut self,
        strategy: Option<String>,
        classpath: Option<OsString>,
    ) -> Result<()> {
        if let Some(strategy) = strategy {
            self.strategy = strategy.parse()?;
        }
        if self.system_classpath.is_empty() {
            if let Some(classpath) = classpath {
                self.system_classpath = std::env::split_paths(&classpath)
                    .filter(|p| !p.as_os_str().is_empty())
                    .collect();
            }
        }
        Ok(())
    }

    /// Build the discovery strategy this configuration selects.
    pub fn build_strategy(&self) -> Arc<dyn DiscoveryStrategy> {
        let descriptor: Arc<dyn DiscoveryStrategy> = Arc::new(ServiceDescriptorDiscovery::new(
            classpath_roots(&self.system_classpath),
        ));
        let provider = ProviderEnumerationDiscovery::new();
        for (service, implementations) in &self.system_providers {
            for implementation in implementations {
                if let Err(e) = provider.register_system_provider(service, implementation) {
                    tracing::warn!(
                        "Skipping system provider {} for {}: {}",
                        implementation,
                        service,
                        e
                    );
                }
            }
        }
        let provider: Arc<dyn DiscoveryStrategy> = Arc::new(provider);

        match self.strategy {
            StrategyKind::Descriptor => descriptor,
            StrategyKind::Provider => provider,
            StrategyKind::Chain => Arc::new(
                DiscoveryChain::new(vec![descriptor, provider])
                    .then(Arc::new(FixedDiscovery::new(self.defaults.clone()))),
            ),
        }
    }
}
