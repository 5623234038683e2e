// Submodules
pub mod core;
pub mod error;
pub mod inline;
pub mod sharding;

pub use core::Config;
pub use error::Error;
pub use inline::expand;
pub use sharding::*;
