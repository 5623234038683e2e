//! Routing engines.
//!
//! Each engine produces [`RouteGroup`]s: combinations of table mappings,
//! by data source. The builder turns them into a [`RouteContext`](super::RouteContext).

pub mod binding;
pub mod broadcast;
pub mod complex;
pub mod standard;
pub mod unicast;

use indexmap::IndexMap;

use super::RouteMapper;
use crate::rule::DataNode;

/// Routing result for some tables, before composition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteGroup {
    tables: Vec<String>,
    units: IndexMap<String, Vec<Vec<RouteMapper>>>,
}

impl RouteGroup {
    pub fn new(tables: Vec<String>) -> Self {
        Self {
            tables,
            units: IndexMap::new(),
        }
    }

    /// One table, one combination per node.
    pub fn from_nodes(table: &str, nodes: &[DataNode]) -> Self {
        let mut group = Self::new(vec![table.to_string()]);
        for node in nodes {
            group.push(&node.data_source, vec![RouteMapper::new(table, &node.table)]);
        }
        group
    }

    /// Tables present under their own name on every data source.
    pub fn broadcast(tables: &[String], data_sources: &[String]) -> Self {
        let mut group = Self::new(tables.to_vec());
        for data_source in data_sources {
            group.push(
                data_source,
                tables.iter().map(|table| RouteMapper::new(table, table)).collect(),
            );
        }
        group
    }

    pub fn push(&mut self, data_source: &str, combination: Vec<RouteMapper>) {
        let combinations = self.units.entry(data_source.to_string()).or_default();
        if !combinations.contains(&combination) {
            combinations.push(combination);
        }
    }

    /// Logical tables covered by this group.
    pub fn tables(&self) -> &[String] {
        &self.tables
    }

    pub fn units(&self) -> &IndexMap<String, Vec<Vec<RouteMapper>>> {
        &self.units
    }

    pub fn into_units(self) -> IndexMap<String, Vec<Vec<RouteMapper>>> {
        self.units
    }

    pub fn combinations(&self, data_source: &str) -> Option<&[Vec<RouteMapper>]> {
        self.units.get(data_source).map(|c| c.as_slice())
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}
