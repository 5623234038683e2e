use thiserror::Error;

use crate::{rule, sharding};

#[derive(Debug, Error)]
pub enum Error {
    #[error("no shard satisfies the statement for table \"{0}\"")]
    NoShard(String),

    #[error("tables {0:?} can't be routed to a single data source")]
    CannotJoin(Vec<String>),

    #[error("no data source hosts all of {0:?}")]
    NoCommonDataSource(Vec<String>),

    #[error("no data sources are configured")]
    NoDataSource,

    #[error("table \"{table}\" can't be routed to \"{node}\"")]
    InvalidRoute { table: String, node: String },

    #[error("table \"{table}\": {source}")]
    Algorithm {
        table: String,
        source: sharding::Error,
    },

    #[error("{0}")]
    Rule(#[from] rule::Error),
}
