//! Discovery strategies the factory cache can be built with.

pub mod chain;
pub mod descriptor;
pub mod provider;

pub use chain::{DiscoveryChain, FixedDiscovery};
pub use descriptor::{ServiceDescriptorDiscovery, first_service_name, sanitize};
pub use provider::{ProviderEnumerationDiscovery, is_binary_name};
