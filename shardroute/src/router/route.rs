//! Routing result.

use std::fmt::Display;

use indexmap::IndexMap;
use serde::Serialize;

use crate::rule::DataNode;

/// Logical table name and the physical name it's replaced with.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RouteMapper {
    pub logic_name: String,
    pub actual_name: String,
}

impl RouteMapper {
    pub fn new(logic_name: impl ToString, actual_name: impl ToString) -> Self {
        Self {
            logic_name: logic_name.to_string(),
            actual_name: actual_name.to_string(),
        }
    }
}

impl Display for RouteMapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> {}", self.logic_name, self.actual_name)
    }
}

/// Work for one data source: the statement runs once per combination,
/// with each logical table replaced by its mapper's actual table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteUnit {
    data_source: String,
    combinations: Vec<Vec<RouteMapper>>,
}

impl RouteUnit {
    pub fn new(data_source: impl ToString) -> Self {
        Self {
            data_source: data_source.to_string(),
            combinations: vec![],
        }
    }

    pub fn data_source(&self) -> &str {
        &self.data_source
    }

    pub fn combinations(&self) -> &[Vec<RouteMapper>] {
        &self.combinations
    }

    /// Add a combination unless it's already there.
    pub fn add_combination(&mut self, combination: Vec<RouteMapper>) {
        if !self.combinations.contains(&combination) {
            self.combinations.push(combination);
        }
    }

    /// Actual tables used for `logic_name`, in order, without duplicates.
    pub fn actual_tables(&self, logic_name: &str) -> Vec<&str> {
        let mut tables: Vec<&str> = vec![];
        for mapper in self.combinations.iter().flatten() {
            if mapper.logic_name.eq_ignore_ascii_case(logic_name)
                && !tables.contains(&mapper.actual_name.as_str())
            {
                tables.push(&mapper.actual_name);
            }
        }
        tables
    }
}

/// Where a statement goes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RouteContext {
    route_units: Vec<RouteUnit>,
    original_data_nodes: IndexMap<String, Vec<DataNode>>,
}

impl RouteContext {
    pub(crate) fn new(
        route_units: Vec<RouteUnit>,
        original_data_nodes: IndexMap<String, Vec<DataNode>>,
    ) -> Self {
        Self {
            route_units,
            original_data_nodes,
        }
    }

    /// One unit per data source, in routing order.
    pub fn route_units(&self) -> &[RouteUnit] {
        &self.route_units
    }

    /// Data nodes each logical table was routed to.
    pub fn original_data_nodes(&self) -> &IndexMap<String, Vec<DataNode>> {
        &self.original_data_nodes
    }

    /// Nothing to route, the statement passes through.
    pub fn is_empty(&self) -> bool {
        self.route_units.is_empty()
    }

    pub fn data_sources(&self) -> Vec<&str> {
        self.route_units.iter().map(|unit| unit.data_source()).collect()
    }

    pub fn unit(&self, data_source: &str) -> Option<&RouteUnit> {
        self.route_units
            .iter()
            .find(|unit| unit.data_source() == data_source)
    }

    /// Statement runs exactly once.
    pub fn is_single_route(&self) -> bool {
        self.route_units.len() == 1 && self.route_units[0].combinations().len() <= 1
    }
}

impl Display for RouteContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.route_units.is_empty() {
            return write!(f, "no route");
        }

        for (i, unit) in self.route_units.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}", unit.data_source())?;
            if !unit.combinations().is_empty() {
                let combinations = unit
                    .combinations()
                    .iter()
                    .map(|combination| {
                        combination
                            .iter()
                            .map(|mapper| mapper.to_string())
                            .collect::<Vec<_>>()
                            .join(", ")
                    })
                    .collect::<Vec<_>>();
                write!(f, " [{}]", combinations.join(" | "))?;
            }
        }

        Ok(())
    }
}
