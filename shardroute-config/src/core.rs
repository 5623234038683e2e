use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::read_to_string;
use std::path::Path;
use std::str::FromStr;
use tracing::{info, warn};

use super::error::Error;
use super::sharding::{AlgorithmConfig, StrategyConfig, TableConfig};

/// Sharding rules for one logical database.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Physical data sources, in order. Used for broadcast and
    /// unicast routing, so the order matters.
    #[serde(default)]
    pub data_sources: Vec<String>,

    /// Where tables without a rule live.
    #[serde(default)]
    pub default_data_source: Option<String>,

    /// Used by tables without their own database strategy.
    #[serde(default)]
    pub default_database_strategy: Option<StrategyConfig>,

    /// Used by tables without their own table strategy.
    #[serde(default)]
    pub default_table_strategy: Option<StrategyConfig>,

    /// Sharded tables.
    #[serde(default)]
    pub tables: Vec<TableConfig>,

    /// Groups of tables that always shard the same way.
    #[serde(default)]
    pub binding_tables: Vec<Vec<String>>,

    /// Tables replicated on every data source.
    #[serde(default)]
    pub broadcast_tables: Vec<String>,

    /// Sharding algorithms, referenced by name from strategies.
    #[serde(default)]
    pub algorithms: Vec<AlgorithmConfig>,
}

impl Config {
    /// Load configuration from disk or use defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();

        let config = if let Ok(source) = read_to_string(path) {
            let config: Config = source.parse()?;
            info!("loaded \"{}\"", path.display());
            config
        } else {
            warn!(
                "\"{}\" doesn't exist, loading defaults instead",
                path.display()
            );
            Config::default()
        };

        config.check();

        Ok(config)
    }

    /// Warn about settings that are allowed but probably not intended.
    /// Hard errors are reported when the rules are compiled.
    pub fn check(&self) {
        let mut names = HashSet::new();
        for table in &self.tables {
            if !names.insert(table.name.to_lowercase()) {
                warn!("table \"{}\" is configured more than once", table.name);
            }

            if table.actual_data_nodes.is_none() && self.data_sources.is_empty() {
                warn!(
                    "table \"{}\" has no data nodes and no data sources are configured",
                    table.name
                );
            }
        }

        for group in &self.binding_tables {
            if group.len() < 2 {
                warn!("binding group {:?} has less than two tables", group);
            }
        }

        for table in &self.broadcast_tables {
            if names.contains(&table.to_lowercase()) {
                warn!("broadcast table \"{}\" is also configured as sharded", table);
            }
        }

        for name in self.missing_algorithms() {
            warn!("algorithm \"{}\" is used but not configured", name);
        }

        if let Some(ref default) = self.default_data_source {
            if !self.data_sources.is_empty() && !self.data_sources.contains(default) {
                warn!(
                    "default data source \"{}\" is not in data_sources",
                    default
                );
            }
        }
    }

    /// Algorithms referenced by strategies but not configured.
    pub fn missing_algorithms(&self) -> Vec<&str> {
        let strategies = self
            .default_database_strategy
            .iter()
            .chain(self.default_table_strategy.iter())
            .chain(self.tables.iter().flat_map(|table| {
                table
                    .database_strategy
                    .iter()
                    .chain(table.table_strategy.iter())
            }));

        let mut missing = vec![];
        for name in strategies.flat_map(|strategy| strategy.algorithms()) {
            if self.algorithm(name).is_none() && !missing.contains(&name) {
                missing.push(name);
            }
        }
        missing
    }

    /// Find algorithm by name.
    pub fn algorithm(&self, name: &str) -> Option<&AlgorithmConfig> {
        self.algorithms.iter().find(|a| a.name == name)
    }
}

impl FromStr for Config {
    type Err = Error;

    fn from_str(source: &str) -> Result<Self, Self::Err> {
        toml::from_str(source).map_err(|err| Error::config(source, err))
    }
}
