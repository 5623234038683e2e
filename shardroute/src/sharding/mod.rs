//! Shard selection: values, the strategy contract and built-in algorithms.

pub mod error;
pub mod hasher;
pub mod hint_value;
pub mod inline;
pub mod list;
pub mod modulo;
pub mod range;
pub mod shard;
pub mod strategy;
pub mod value;

pub use error::Error;
pub use hasher::HashModulo;
pub use hint_value::HintValue;
pub use inline::Inline;
pub use list::ListShards;
pub use modulo::{ComplexModulo, Modulo};
pub use range::Ranges;
pub use shard::Shard;
pub use strategy::*;
pub use value::*;
