//! Sharding strategies and the algorithm contract.

use std::collections::BTreeSet;
use std::fmt::Debug;
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::trace;

use super::{ConditionValue, Error, HintValue, Shard, Value, ValueRange};

/// Maps one value to shards.
pub trait PreciseAlgorithm: Debug + Send + Sync {
    fn shard_value(&self, targets: &[String], value: &Value) -> Result<Shard, Error>;
}

/// Maps an interval of values to shards.
pub trait RangeAlgorithm: Debug + Send + Sync {
    fn shard_range(&self, targets: &[String], range: &ValueRange) -> Result<Shard, Error>;
}

/// Maps values of several columns to shards.
///
/// `values` only has the sharding columns that have a condition.
pub trait ComplexAlgorithm: Debug + Send + Sync {
    fn shard_columns(
        &self,
        targets: &[String],
        columns: &[String],
        values: &IndexMap<String, ConditionValue>,
    ) -> Result<Shard, Error>;
}

/// Maps values supplied out of band to shards.
pub trait HintAlgorithm: Debug + Send + Sync {
    fn shard_hint(&self, targets: &[String], values: &[Value]) -> Result<Shard, Error>;
}

/// What the strategy routes on.
#[derive(Debug, Clone, Copy)]
pub enum StrategyInput<'a> {
    /// Predicate values of this table, by column.
    Conditions(&'a IndexMap<String, ConditionValue>),
    /// Values from a hint, bypassing predicates.
    Hint(&'a [Value]),
}

/// How one axis (data sources or tables) of a logical table is sharded.
#[derive(Debug, Clone, Default)]
pub enum ShardingStrategy {
    /// One sharding column.
    Standard {
        column: String,
        precise: Arc<dyn PreciseAlgorithm>,
        range: Option<Arc<dyn RangeAlgorithm>>,
    },
    /// Several sharding columns, one algorithm.
    Complex {
        columns: Vec<String>,
        algorithm: Arc<dyn ComplexAlgorithm>,
    },
    /// Shards come from a hint.
    Hint { algorithm: Arc<dyn HintAlgorithm> },
    /// Not sharded.
    #[default]
    None,
}

impl ShardingStrategy {
    pub fn standard(column: impl ToString, precise: Arc<dyn PreciseAlgorithm>) -> Self {
        Self::Standard {
            column: column.to_string(),
            precise,
            range: None,
        }
    }

    /// Standard strategy that uses the same algorithm for ranges.
    pub fn standard_with_range<A>(column: impl ToString, algorithm: Arc<A>) -> Self
    where
        A: PreciseAlgorithm + RangeAlgorithm + 'static,
    {
        Self::Standard {
            column: column.to_string(),
            precise: algorithm.clone(),
            range: Some(algorithm),
        }
    }

    pub fn complex(columns: &[&str], algorithm: Arc<dyn ComplexAlgorithm>) -> Self {
        Self::Complex {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            algorithm,
        }
    }

    pub fn hint(algorithm: Arc<dyn HintAlgorithm>) -> Self {
        Self::Hint { algorithm }
    }

    /// Columns this strategy shards on.
    pub fn columns(&self) -> Vec<&str> {
        match self {
            Self::Standard { column, .. } => vec![column.as_str()],
            Self::Complex { columns, .. } => columns.iter().map(|c| c.as_str()).collect(),
            Self::Hint { .. } | Self::None => vec![],
        }
    }

    pub fn is_hint(&self) -> bool {
        matches!(self, Self::Hint { .. })
    }

    /// Pick shards among `targets`.
    ///
    /// Empty result means no shard matched. If the sharding column has no
    /// condition, every target is a candidate. Hints bypass the configured
    /// algorithm of standard and complex strategies: an integer is the
    /// shard number, a string is the target name.
    pub fn route(
        &self,
        targets: &[String],
        input: StrategyInput<'_>,
    ) -> Result<BTreeSet<usize>, Error> {
        let shard = match (self, input) {
            (Self::None, _) => Shard::All,

            (Self::Standard { .. } | Self::Complex { .. }, StrategyInput::Hint(values)) => {
                trace!("hint overrides sharding columns");
                HintValue.shard_hint(targets, values)?
            }

            (
                Self::Standard {
                    column,
                    precise,
                    range,
                },
                StrategyInput::Conditions(conditions),
            ) => match find(conditions, column) {
                Some(ConditionValue::Precise(value)) => {
                    trace!("sharding \"{}\" by value", column);
                    precise.shard_value(targets, value)?
                }
                Some(ConditionValue::List(values)) => {
                    trace!("sharding \"{}\" by list", column);
                    Self::shard_values(precise.as_ref(), targets, values)?
                }
                Some(ConditionValue::Range(value_range)) => match range {
                    Some(range) => {
                        trace!("sharding \"{}\" by range", column);
                        range.shard_range(targets, value_range)?
                    }
                    None => {
                        trace!("no range algorithm for \"{}\", using all shards", column);
                        Shard::All
                    }
                },
                None => Shard::All,
            },

            (Self::Complex { columns, algorithm }, StrategyInput::Conditions(conditions)) => {
                let present: IndexMap<String, ConditionValue> = columns
                    .iter()
                    .filter_map(|column| {
                        find(conditions, column).map(|value| (column.clone(), value.clone()))
                    })
                    .collect();

                if present.is_empty() {
                    Shard::All
                } else {
                    trace!("sharding {:?} with complex strategy", columns);
                    algorithm.shard_columns(targets, columns, &present)?
                }
            }

            (Self::Hint { algorithm }, StrategyInput::Hint(values)) => {
                trace!("sharding using hint");
                algorithm.shard_hint(targets, values)?
            }

            // Hint strategy without a hint.
            (Self::Hint { .. }, StrategyInput::Conditions(_)) => Shard::All,
        };

        Ok(shard.indexes(targets.len()))
    }

    fn shard_values(
        precise: &dyn PreciseAlgorithm,
        targets: &[String],
        values: &[Value],
    ) -> Result<Shard, Error> {
        let mut shards = BTreeSet::new();
        for value in values {
            shards.extend(precise.shard_value(targets, value)?.indexes(targets.len()));
        }
        Ok(Shard::Multi(shards.into_iter().collect()))
    }
}

fn find<'a>(
    conditions: &'a IndexMap<String, ConditionValue>,
    column: &str,
) -> Option<&'a ConditionValue> {
    conditions
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(column))
        .map(|(_, value)| value)
}
