use thiserror::Error;

use crate::sharding;

/// The rules don't make sense together.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Config(#[from] shardroute_config::Error),

    #[error("algorithm \"{0}\" is not configured")]
    UnknownAlgorithm(String),

    #[error("algorithm \"{name}\" ({kind}) can't be used by a {strategy} strategy")]
    AlgorithmKindMismatch {
        name: String,
        kind: &'static str,
        strategy: &'static str,
    },

    #[error("algorithm \"{name}\": {source}")]
    InvalidAlgorithm {
        name: String,
        source: sharding::Error,
    },

    #[error("\"{0}\" is not a valid data node, expected \"data_source.table\"")]
    InvalidDataNode(String),

    #[error("table \"{0}\" has no data nodes")]
    EmptyDataNodes(String),

    #[error("table \"{0}\" is configured more than once")]
    DuplicateTable(String),

    #[error("data source \"{data_source}\" used by \"{table}\" is not configured")]
    UnknownDataSource { table: String, data_source: String },

    #[error("default data source \"{0}\" is not configured")]
    UnknownDefaultDataSource(String),

    #[error("broadcast table \"{0}\" is also sharded")]
    BroadcastSharded(String),

    #[error("binding table \"{0}\" has no table rule")]
    UnknownBindingTable(String),

    #[error("table \"{0}\" is in more than one binding group")]
    DuplicateBindingTable(String),

    #[error("binding tables \"{primary}\" and \"{table}\" don't have matching data nodes")]
    BindingMismatch { primary: String, table: String },

    #[error("binding table \"{table}\" has no actual table matching \"{node}\"")]
    MissingBindingNode { table: String, node: String },
}
