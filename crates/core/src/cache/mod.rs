pub mod bean;
pub mod factory;

pub use bean::{BeanProperties, BeanPropertiesCache};
pub use factory::FactoryFinderCache;
