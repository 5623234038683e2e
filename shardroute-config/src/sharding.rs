use serde::{Deserialize, Serialize};

use super::error::Error;
use crate::inline::expand;

/// Sharded (logical) table.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct TableConfig {
    /// Logical table name, as the application writes it.
    pub name: String,
    /// Physical data nodes, e.g. `ds_${0..1}.t_order_${0..3}`.
    /// If not set, the table lives on every data source under its own name.
    #[serde(default)]
    pub actual_data_nodes: Option<String>,
    /// Overrides `default_database_strategy`.
    #[serde(default)]
    pub database_strategy: Option<StrategyConfig>,
    /// Overrides `default_table_strategy`.
    #[serde(default)]
    pub table_strategy: Option<StrategyConfig>,
    /// Column filled in by the key generator. Not used for routing.
    #[serde(default)]
    pub key_generate_column: Option<String>,
}

impl TableConfig {
    /// Expand the inline expression into a list of `data_source.table` strings.
    pub fn data_nodes(&self) -> Result<Vec<String>, Error> {
        match self.actual_data_nodes {
            Some(ref nodes) => expand(nodes),
            None => Ok(vec![]),
        }
    }
}

/// How a table is split along one axis (data sources or tables).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StrategyConfig {
    /// One sharding column.
    Standard {
        column: String,
        algorithm: String,
        /// Algorithm used for range conditions, if different.
        #[serde(default)]
        range_algorithm: Option<String>,
    },
    /// Several sharding columns handled by one algorithm.
    Complex {
        columns: Vec<String>,
        algorithm: String,
    },
    /// Shards are supplied by the caller, not by predicates.
    Hint { algorithm: String },
    /// Not sharded.
    None,
}

impl StrategyConfig {
    /// Names of the algorithms this strategy refers to.
    pub fn algorithms(&self) -> Vec<&str> {
        match self {
            Self::Standard {
                algorithm,
                range_algorithm,
                ..
            } => {
                let mut names = vec![algorithm.as_str()];
                if let Some(range) = range_algorithm {
                    names.push(range.as_str());
                }
                names
            }
            Self::Complex { algorithm, .. } => vec![algorithm.as_str()],
            Self::Hint { algorithm } => vec![algorithm.as_str()],
            Self::None => vec![],
        }
    }
}

/// Named sharding algorithm.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct AlgorithmConfig {
    pub name: String,
    #[serde(flatten)]
    pub kind: AlgorithmKind,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AlgorithmKind {
    /// Target name rendered from the value, e.g. `t_order_${order_id % 2}`.
    Inline { expression: String },
    /// Integer value modulo the number of targets.
    Mod,
    /// SHA-1 of the value modulo the number of targets.
    HashMod,
    /// Explicit value to shard mapping.
    List {
        #[serde(default)]
        mappings: Vec<ListMapping>,
    },
    /// `[start, end)` intervals mapped to shards.
    Range {
        #[serde(default)]
        mappings: Vec<RangeMapping>,
    },
    /// Sum of all sharding column values modulo the number of targets.
    ComplexMod,
    /// Hint values are shard numbers or target names.
    HintValue,
}

impl AlgorithmKind {
    /// Human-readable name used in errors.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Inline { .. } => "inline",
            Self::Mod => "mod",
            Self::HashMod => "hash_mod",
            Self::List { .. } => "list",
            Self::Range { .. } => "range",
            Self::ComplexMod => "complex_mod",
            Self::HintValue => "hint_value",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct ListMapping {
    pub values: Vec<FlexibleType>,
    pub shard: usize,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct RangeMapping {
    #[serde(default)]
    pub start: Option<FlexibleType>,
    #[serde(default)]
    pub end: Option<FlexibleType>,
    pub shard: usize,
}

#[derive(Serialize, Deserialize, PartialEq, Debug, Clone, Eq, Hash)]
#[serde(untagged)]
pub enum FlexibleType {
    Integer(i64),
    Uuid(uuid::Uuid),
    String(String),
}

impl From<i64> for FlexibleType {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<uuid::Uuid> for FlexibleType {
    fn from(value: uuid::Uuid) -> Self {
        Self::Uuid(value)
    }
}

impl From<String> for FlexibleType {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&str> for FlexibleType {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}
