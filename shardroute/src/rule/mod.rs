//! Sharding rules: how logical tables map onto data sources and actual tables.
//!
//! Built once and shared between statements. Cloning is cheap.

pub mod binding;
pub mod convert;
pub mod data_node;
pub mod error;
pub mod table_rule;

pub use binding::{binding_actual_table, BindingTableGroup};
pub use data_node::DataNode;
pub use error::Error;
pub use table_rule::TableRule;

use std::sync::Arc;

use tracing::debug;

use crate::sharding::ShardingStrategy;

#[derive(Debug, Default)]
struct Inner {
    data_sources: Vec<String>,
    default_data_source: Option<String>,
    default_database_strategy: ShardingStrategy,
    default_table_strategy: ShardingStrategy,
    tables: Vec<TableRule>,
    binding_groups: Vec<BindingTableGroup>,
    broadcast_tables: Vec<String>,
}

/// Sharding rules of one logical database.
#[derive(Debug, Clone, Default)]
pub struct ShardingRule {
    inner: Arc<Inner>,
}

impl ShardingRule {
    pub fn builder() -> RuleBuilder {
        RuleBuilder::default()
    }

    /// All data sources, in configuration order.
    pub fn data_sources(&self) -> &[String] {
        &self.inner.data_sources
    }

    pub fn default_data_source(&self) -> Option<&str> {
        self.inner.default_data_source.as_deref()
    }

    pub fn table_rules(&self) -> &[TableRule] {
        &self.inner.tables
    }

    pub fn binding_groups(&self) -> &[BindingTableGroup] {
        &self.inner.binding_groups
    }

    pub fn broadcast_tables(&self) -> &[String] {
        &self.inner.broadcast_tables
    }

    /// Rule for a sharded table.
    pub fn table_rule(&self, table: &str) -> Option<&TableRule> {
        self.inner.tables.iter().find(|rule| rule.is_logic_table(table))
    }

    pub fn is_sharded(&self, table: &str) -> bool {
        self.table_rule(table).is_some()
    }

    pub fn is_broadcast_table(&self, table: &str) -> bool {
        self.inner
            .broadcast_tables
            .iter()
            .any(|t| t.eq_ignore_ascii_case(table))
    }

    /// At least one table and all of them are broadcast.
    pub fn is_all_broadcast_tables(&self, tables: &[String]) -> bool {
        !tables.is_empty() && tables.iter().all(|table| self.is_broadcast_table(table))
    }

    /// Neither sharded nor broadcast.
    pub fn is_single_table(&self, table: &str) -> bool {
        !self.is_sharded(table) && !self.is_broadcast_table(table)
    }

    pub fn binding_group(&self, table: &str) -> Option<&BindingTableGroup> {
        self.inner
            .binding_groups
            .iter()
            .find(|group| group.contains(table))
    }

    /// Table's own database strategy, or the default.
    pub fn database_strategy<'a>(&'a self, rule: &'a TableRule) -> &'a ShardingStrategy {
        rule.database_strategy()
            .unwrap_or(&self.inner.default_database_strategy)
    }

    /// Table's own table strategy, or the default.
    pub fn table_strategy<'a>(&'a self, rule: &'a TableRule) -> &'a ShardingStrategy {
        rule.table_strategy()
            .unwrap_or(&self.inner.default_table_strategy)
    }

    /// Is the column used to shard the table, on either axis.
    pub fn is_sharding_column(&self, table: &str, column: &str) -> bool {
        match self.table_rule(table) {
            Some(rule) => self
                .database_strategy(rule)
                .columns()
                .into_iter()
                .chain(self.table_strategy(rule).columns())
                .any(|c| c.eq_ignore_ascii_case(column)),
            None => false,
        }
    }

    /// Every node the table can live on. Broadcast tables live on every
    /// data source, single tables on the default one.
    pub fn data_nodes(&self, table: &str) -> Vec<DataNode> {
        if let Some(rule) = self.table_rule(table) {
            rule.actual_data_nodes().to_vec()
        } else if self.is_broadcast_table(table) {
            self.inner
                .data_sources
                .iter()
                .map(|data_source| DataNode::new(data_source, table))
                .collect()
        } else if let Some(data_source) = self.default_data_source() {
            vec![DataNode::new(data_source, table)]
        } else {
            vec![]
        }
    }

    /// The table is allowed to be routed to this node.
    pub fn is_valid_route(&self, table: &str, data_source: &str, actual_table: &str) -> bool {
        self.data_nodes(table)
            .iter()
            .any(|node| node.matches(data_source, actual_table))
    }
}

/// Assembles and validates a [`ShardingRule`].
#[derive(Debug, Default)]
pub struct RuleBuilder {
    data_sources: Vec<String>,
    default_data_source: Option<String>,
    default_database_strategy: ShardingStrategy,
    default_table_strategy: ShardingStrategy,
    tables: Vec<TableRule>,
    binding_groups: Vec<BindingTableGroup>,
    broadcast_tables: Vec<String>,
}

impl RuleBuilder {
    /// Known data sources. If not set, data sources used by
    /// table rules are used, in order of appearance.
    pub fn data_sources(mut self, data_sources: impl IntoIterator<Item = impl ToString>) -> Self {
        self.data_sources = data_sources.into_iter().map(|d| d.to_string()).collect();
        self
    }

    pub fn default_data_source(mut self, data_source: impl ToString) -> Self {
        self.default_data_source = Some(data_source.to_string());
        self
    }

    pub fn default_database_strategy(mut self, strategy: ShardingStrategy) -> Self {
        self.default_database_strategy = strategy;
        self
    }

    pub fn default_table_strategy(mut self, strategy: ShardingStrategy) -> Self {
        self.default_table_strategy = strategy;
        self
    }

    pub fn table(mut self, rule: TableRule) -> Self {
        self.tables.push(rule);
        self
    }

    pub fn binding_group(mut self, tables: impl IntoIterator<Item = impl ToString>) -> Self {
        self.binding_groups.push(BindingTableGroup::new(tables));
        self
    }

    pub fn broadcast_table(mut self, table: impl ToString) -> Self {
        self.broadcast_tables.push(table.to_string());
        self
    }

    pub fn build(self) -> Result<ShardingRule, Error> {
        let Self {
            mut data_sources,
            default_data_source,
            default_database_strategy,
            default_table_strategy,
            tables,
            binding_groups,
            broadcast_tables,
        } = self;

        for (i, rule) in tables.iter().enumerate() {
            if tables[..i]
                .iter()
                .any(|other| other.is_logic_table(rule.logic_table()))
            {
                return Err(Error::DuplicateTable(rule.logic_table().to_string()));
            }
        }

        if data_sources.is_empty() {
            for rule in &tables {
                for data_source in rule.data_sources() {
                    if !data_sources.contains(data_source) {
                        data_sources.push(data_source.clone());
                    }
                }
            }
            if let Some(ref default) = default_data_source {
                if !data_sources.contains(default) {
                    data_sources.push(default.clone());
                }
            }
        } else {
            for rule in &tables {
                if let Some(unknown) = rule
                    .data_sources()
                    .iter()
                    .find(|data_source| !data_sources.contains(data_source))
                {
                    return Err(Error::UnknownDataSource {
                        table: rule.logic_table().to_string(),
                        data_source: unknown.clone(),
                    });
                }
            }
            if let Some(ref default) = default_data_source {
                if !data_sources.contains(default) {
                    return Err(Error::UnknownDefaultDataSource(default.clone()));
                }
            }
        }

        for table in &broadcast_tables {
            if tables.iter().any(|rule| rule.is_logic_table(table)) {
                return Err(Error::BroadcastSharded(table.clone()));
            }
        }

        let mut bound: Vec<&str> = vec![];
        for group in &binding_groups {
            let mut rules = vec![];
            for table in group.tables() {
                if bound.iter().any(|b| b.eq_ignore_ascii_case(table)) {
                    return Err(Error::DuplicateBindingTable(table.clone()));
                }
                bound.push(table);

                let rule = tables
                    .iter()
                    .find(|rule| rule.is_logic_table(table))
                    .ok_or_else(|| Error::UnknownBindingTable(table.clone()))?;
                rules.push(rule);
            }
            group.validate(&rules)?;
        }

        debug!(
            "sharding rule with {} data sources, {} tables, {} binding groups, {} broadcast tables",
            data_sources.len(),
            tables.len(),
            binding_groups.len(),
            broadcast_tables.len()
        );

        Ok(ShardingRule {
            inner: Arc::new(Inner {
                data_sources,
                default_data_source,
                default_database_strategy,
                default_table_strategy,
                tables,
                binding_groups,
                broadcast_tables,
            }),
        })
    }
}
