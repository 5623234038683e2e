//! Compile the rule file into a [`ShardingRule`].

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use shardroute_config::{AlgorithmConfig, AlgorithmKind, Config, StrategyConfig, TableConfig};
use tracing::{info, warn};

use super::{DataNode, Error, ShardingRule, TableRule};
use crate::sharding::{
    ComplexAlgorithm, ComplexModulo, HashModulo, HintAlgorithm, HintValue, Inline, ListShards, Modulo,
    PreciseAlgorithm, RangeAlgorithm, Ranges, ShardingStrategy,
};

#[derive(Debug, Clone)]
enum Algorithm {
    Standard {
        precise: Arc<dyn PreciseAlgorithm>,
        range: Arc<dyn RangeAlgorithm>,
    },
    Complex(Arc<dyn ComplexAlgorithm>),
    Hint(Arc<dyn HintAlgorithm>),
}

impl Algorithm {
    fn new(config: &AlgorithmConfig) -> Result<Self, Error> {
        let invalid = |source: crate::sharding::Error| Error::InvalidAlgorithm {
            name: config.name.clone(),
            source,
        };

        Ok(match config.kind {
            AlgorithmKind::Inline { ref expression } => {
                Self::standard(Arc::new(Inline::new(expression).map_err(invalid)?))
            }
            AlgorithmKind::Mod => Self::standard(Arc::new(Modulo)),
            AlgorithmKind::HashMod => Self::standard(Arc::new(HashModulo)),
            AlgorithmKind::List { ref mappings } => {
                let lists = ListShards::new(mappings);
                if lists.is_empty() {
                    warn!("list algorithm \"{}\" has no mappings", config.name);
                }
                Self::standard(Arc::new(lists))
            }
            AlgorithmKind::Range { ref mappings } => {
                let ranges = Ranges::new(mappings).map_err(invalid)?;
                Self::standard(Arc::new(ranges))
            }
            AlgorithmKind::ComplexMod => Self::Complex(Arc::new(ComplexModulo)),
            AlgorithmKind::HintValue => Self::Hint(Arc::new(HintValue)),
        })
    }

    fn standard<A>(algorithm: Arc<A>) -> Self
    where
        A: PreciseAlgorithm + RangeAlgorithm + 'static,
    {
        Self::Standard {
            precise: algorithm.clone(),
            range: algorithm,
        }
    }
}

struct Algorithms {
    compiled: HashMap<String, (&'static str, Algorithm)>,
}

impl Algorithms {
    fn new(configs: &[AlgorithmConfig]) -> Result<Self, Error> {
        let mut compiled = HashMap::new();
        for config in configs {
            if compiled.contains_key(&config.name) {
                warn!("algorithm \"{}\" is configured more than once", config.name);
                continue;
            }
            compiled.insert(
                config.name.clone(),
                (config.kind.name(), Algorithm::new(config)?),
            );
        }
        Ok(Self { compiled })
    }

    fn get(&self, name: &str) -> Result<&(&'static str, Algorithm), Error> {
        self.compiled
            .get(name)
            .ok_or_else(|| Error::UnknownAlgorithm(name.to_string()))
    }

    fn strategy(&self, config: &StrategyConfig) -> Result<ShardingStrategy, Error> {
        let mismatch = |name: &str, kind: &'static str, strategy: &'static str| Error::AlgorithmKindMismatch {
            name: name.to_string(),
            kind,
            strategy,
        };

        Ok(match config {
            StrategyConfig::Standard {
                column,
                algorithm,
                range_algorithm,
            } => {
                let precise = match self.get(algorithm)? {
                    (_, Algorithm::Standard { precise, .. }) => precise.clone(),
                    (kind, _) => return Err(mismatch(algorithm, *kind, "standard")),
                };
                let range = match range_algorithm {
                    Some(name) => match self.get(name)? {
                        (_, Algorithm::Standard { range, .. }) => Some(range.clone()),
                        (kind, _) => return Err(mismatch(name, *kind, "standard")),
                    },
                    None => None,
                };
                ShardingStrategy::Standard {
                    column: column.clone(),
                    precise,
                    range,
                }
            }

            StrategyConfig::Complex { columns, algorithm } => match self.get(algorithm)? {
                (_, Algorithm::Complex(complex)) => ShardingStrategy::Complex {
                    columns: columns.clone(),
                    algorithm: complex.clone(),
                },
                (kind, _) => return Err(mismatch(algorithm, *kind, "complex")),
            },

            StrategyConfig::Hint { algorithm } => match self.get(algorithm)? {
                (_, Algorithm::Hint(hint)) => ShardingStrategy::hint(hint.clone()),
                (kind, _) => return Err(mismatch(algorithm, *kind, "hint")),
            },

            StrategyConfig::None => ShardingStrategy::None,
        })
    }
}

fn table_rule(
    config: &TableConfig,
    data_sources: &[String],
    algorithms: &Algorithms,
) -> Result<TableRule, Error> {
    let mut rule = if config.actual_data_nodes.is_some() {
        let nodes = config
            .data_nodes()?
            .iter()
            .map(|node| node.parse::<DataNode>())
            .collect::<Result<Vec<_>, _>>()?;
        TableRule::new(&config.name, nodes)?
    } else {
        TableRule::on_data_sources(&config.name, data_sources)?
    };

    if let Some(ref strategy) = config.database_strategy {
        rule = rule.with_database_strategy(algorithms.strategy(strategy)?);
    }
    if let Some(ref strategy) = config.table_strategy {
        rule = rule.with_table_strategy(algorithms.strategy(strategy)?);
    }
    if let Some(ref column) = config.key_generate_column {
        rule = rule.with_key_generate_column(column);
    }

    Ok(rule)
}

impl TryFrom<&Config> for ShardingRule {
    type Error = Error;

    fn try_from(config: &Config) -> Result<Self, Self::Error> {
        let algorithms = Algorithms::new(&config.algorithms)?;

        let mut builder = ShardingRule::builder().data_sources(&config.data_sources);

        if let Some(ref data_source) = config.default_data_source {
            builder = builder.default_data_source(data_source);
        }
        if let Some(ref strategy) = config.default_database_strategy {
            builder = builder.default_database_strategy(algorithms.strategy(strategy)?);
        }
        if let Some(ref strategy) = config.default_table_strategy {
            builder = builder.default_table_strategy(algorithms.strategy(strategy)?);
        }

        for table in &config.tables {
            builder = builder.table(table_rule(table, &config.data_sources, &algorithms)?);
        }
        for group in &config.binding_tables {
            builder = builder.binding_group(group);
        }
        for table in &config.broadcast_tables {
            builder = builder.broadcast_table(table);
        }

        builder.build()
    }
}

impl ShardingRule {
    /// Load and compile the rule file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let config = Config::load(path)?;
        let rule = ShardingRule::try_from(&config)?;

        info!(
            "{} sharded tables, {} broadcast tables on {} data sources",
            rule.table_rules().len(),
            rule.broadcast_tables().len(),
            rule.data_sources().len()
        );

        Ok(rule)
    }
}
