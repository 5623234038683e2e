//! Statements that need exactly one node.

use tracing::debug;

use super::RouteGroup;
use crate::router::{Error, RouteMapper};
use crate::rule::ShardingRule;

/// First data source, in configuration order, that hosts every table.
/// Each table goes to its first actual table there. Tables that
/// don't live anywhere are ignored.
pub fn route(rule: &ShardingRule, tables: &[String]) -> Result<RouteGroup, Error> {
    let nodes: Vec<_> = tables
        .iter()
        .map(|table| (table, rule.data_nodes(table)))
        .filter(|(_, nodes)| !nodes.is_empty())
        .collect();

    for data_source in rule.data_sources() {
        let combination: Option<Vec<RouteMapper>> = nodes
            .iter()
            .map(|(table, nodes)| {
                nodes
                    .iter()
                    .find(|node| &node.data_source == data_source)
                    .map(|node| RouteMapper::new(table, &node.table))
            })
            .collect();

        if let Some(combination) = combination {
            debug!("unicast to \"{}\"", data_source);

            let mut group = RouteGroup::new(tables.to_vec());
            group.push(data_source, combination);
            return Ok(group);
        }
    }

    if rule.data_sources().is_empty() {
        Err(Error::NoDataSource)
    } else {
        Err(Error::NoCommonDataSource(tables.to_vec()))
    }
}
