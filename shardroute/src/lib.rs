//! Sharding router: decides which data sources and actual tables
//! a statement over logical tables needs.
//!
//! ```no_run
//! use shardroute::router::{RouteStatement, Router, ShardingCondition};
//! use shardroute::rule::ShardingRule;
//! use shardroute::sharding::Value;
//!
//! let rule = ShardingRule::load("shardroute.toml")?;
//! let router = Router::new(rule);
//!
//! let statement = RouteStatement::new()
//!     .with_table("t_order")
//!     .with_condition(ShardingCondition::new().with("t_order", "order_id", Value::from(10)));
//! let context = router.route(&statement, None)?;
//! println!("{}", context);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod cli;
pub mod logger;
pub mod router;
pub mod rule;
pub mod sharding;

pub use router::{RouteContext, RouteStatement, Router};
pub use rule::ShardingRule;
