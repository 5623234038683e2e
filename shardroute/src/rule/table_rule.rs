use crate::sharding::ShardingStrategy;

use super::{DataNode, Error};

/// How one logical table maps onto physical tables.
#[derive(Debug, Clone)]
pub struct TableRule {
    logic_table: String,
    actual_data_nodes: Vec<DataNode>,
    database_strategy: Option<ShardingStrategy>,
    table_strategy: Option<ShardingStrategy>,
    key_generate_column: Option<String>,
    data_sources: Vec<String>,
    actual_tables: Vec<String>,
}

impl TableRule {
    /// Create a rule for a table spread over `actual_data_nodes`.
    /// Duplicate nodes are dropped, declared order is kept.
    pub fn new(
        logic_table: impl ToString,
        actual_data_nodes: impl IntoIterator<Item = DataNode>,
    ) -> Result<Self, Error> {
        let logic_table = logic_table.to_string();

        let mut nodes: Vec<DataNode> = vec![];
        for node in actual_data_nodes {
            if !nodes.contains(&node) {
                nodes.push(node);
            }
        }

        if nodes.is_empty() {
            return Err(Error::EmptyDataNodes(logic_table));
        }

        let mut data_sources: Vec<String> = vec![];
        let mut actual_tables: Vec<String> = vec![];
        for node in &nodes {
            if !data_sources.contains(&node.data_source) {
                data_sources.push(node.data_source.clone());
            }
            if !actual_tables.contains(&node.table) {
                actual_tables.push(node.table.clone());
            }
        }

        Ok(Self {
            logic_table,
            actual_data_nodes: nodes,
            database_strategy: None,
            table_strategy: None,
            key_generate_column: None,
            data_sources,
            actual_tables,
        })
    }

    /// Table that exists under its own name on every one of `data_sources`.
    pub fn on_data_sources(logic_table: impl ToString, data_sources: &[String]) -> Result<Self, Error> {
        let logic_table = logic_table.to_string();
        let nodes = data_sources
            .iter()
            .map(|data_source| DataNode::new(data_source, &logic_table))
            .collect::<Vec<_>>();
        Self::new(logic_table, nodes)
    }

    pub fn with_database_strategy(mut self, strategy: ShardingStrategy) -> Self {
        self.database_strategy = Some(strategy);
        self
    }

    pub fn with_table_strategy(mut self, strategy: ShardingStrategy) -> Self {
        self.table_strategy = Some(strategy);
        self
    }

    pub fn with_key_generate_column(mut self, column: impl ToString) -> Self {
        self.key_generate_column = Some(column.to_string());
        self
    }

    pub fn logic_table(&self) -> &str {
        &self.logic_table
    }

    /// Physical nodes in declared order.
    pub fn actual_data_nodes(&self) -> &[DataNode] {
        &self.actual_data_nodes
    }

    /// Own database strategy, if configured.
    pub fn database_strategy(&self) -> Option<&ShardingStrategy> {
        self.database_strategy.as_ref()
    }

    /// Own table strategy, if configured.
    pub fn table_strategy(&self) -> Option<&ShardingStrategy> {
        self.table_strategy.as_ref()
    }

    pub fn key_generate_column(&self) -> Option<&str> {
        self.key_generate_column.as_deref()
    }

    /// Distinct data sources, in order of first appearance.
    pub fn data_sources(&self) -> &[String] {
        &self.data_sources
    }

    /// Distinct actual table names, in order of first appearance.
    pub fn actual_tables(&self) -> &[String] {
        &self.actual_tables
    }

    /// Actual tables on one data source, in declared order.
    pub fn actual_tables_on(&self, data_source: &str) -> Vec<&str> {
        self.actual_data_nodes
            .iter()
            .filter(|node| node.data_source == data_source)
            .map(|node| node.table.as_str())
            .collect()
    }

    pub fn contains(&self, node: &DataNode) -> bool {
        self.actual_data_nodes.contains(node)
    }

    pub fn is_logic_table(&self, name: &str) -> bool {
        self.logic_table.eq_ignore_ascii_case(name)
    }
}
