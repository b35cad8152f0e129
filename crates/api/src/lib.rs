pub mod cache;
pub mod discovery;
pub mod error;
pub mod models;

// Re-export commonly used types
pub use cache::{CacheStats, FactoryResolver, LoaderScopedCache};
pub use discovery::{Discovery, DiscoveryError, DiscoveryStrategy, FnDiscovery};
pub use error::{ApiError, ApiResult};
pub use models::*;
