use indexmap::IndexMap;

use super::{engine::RouteGroup, Error, RouteContext, RouteUnit};
use crate::rule::{DataNode, ShardingRule};

/// Merges engine output into one unit per data source and checks
/// every mapping against the rules.
#[derive(Debug, Default)]
pub struct RouteContextBuilder {
    units: IndexMap<String, RouteUnit>,
}

impl RouteContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_group(&mut self, group: RouteGroup) {
        for (data_source, combinations) in group.into_units() {
            let unit = self
                .units
                .entry(data_source)
                .or_insert_with_key(|data_source| RouteUnit::new(data_source));

            for combination in combinations {
                if !combination.is_empty() {
                    unit.add_combination(combination);
                }
            }
        }
    }

    pub fn with_group(mut self, group: RouteGroup) -> Self {
        self.add_group(group);
        self
    }

    pub fn build(self, rule: &ShardingRule) -> Result<RouteContext, Error> {
        let mut original_data_nodes: IndexMap<String, Vec<DataNode>> = IndexMap::new();

        for unit in self.units.values() {
            for mapper in unit.combinations().iter().flatten() {
                let data_source = unit.data_source();
                if !rule.is_valid_route(&mapper.logic_name, data_source, &mapper.actual_name) {
                    return Err(Error::InvalidRoute {
                        table: mapper.logic_name.clone(),
                        node: format!("{}.{}", data_source, mapper.actual_name),
                    });
                }

                let node = DataNode::new(data_source, &mapper.actual_name);
                let nodes = original_data_nodes
                    .entry(mapper.logic_name.clone())
                    .or_default();
                if !nodes.contains(&node) {
                    nodes.push(node);
                }
            }
        }

        Ok(RouteContext::new(
            self.units.into_values().collect(),
            original_data_nodes,
        ))
    }
}
