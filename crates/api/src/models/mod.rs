pub mod factory;
pub mod loader;

pub use factory::*;
pub use loader::*;
