pub mod cache;
pub mod classpath;
pub mod config;
pub mod discovery;
pub mod error;
pub mod logging;

pub use cache::{BeanProperties, BeanPropertiesCache, FactoryFinderCache};
pub use config::{FinderConfig, StrategyKind};
pub use error::{FinderError, Result};
