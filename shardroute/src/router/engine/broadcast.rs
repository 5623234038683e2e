//! Statements that go everywhere.

use tracing::debug;

use super::RouteGroup;
use crate::router::{Error, RouteMapper};
use crate::rule::ShardingRule;

/// Every data source, each table mapped to its own name.
/// Used for tables replicated on every data source.
pub fn database(rule: &ShardingRule, tables: &[String]) -> Result<RouteGroup, Error> {
    if rule.data_sources().is_empty() {
        return Err(Error::NoDataSource);
    }

    debug!(
        "broadcasting {:?} to {} data sources",
        tables,
        rule.data_sources().len()
    );

    Ok(RouteGroup::broadcast(tables, rule.data_sources()))
}

/// Every node of every table, without conditions or join checks.
/// Used for schema changes.
pub fn schema(rule: &ShardingRule, tables: &[String]) -> Vec<RouteGroup> {
    let mut groups = vec![];

    for table in tables {
        let nodes = rule.data_nodes(table);
        if nodes.is_empty() {
            debug!("\"{}\" has no data nodes, skipping", table);
            continue;
        }

        let mut group = RouteGroup::new(vec![table.clone()]);
        for node in &nodes {
            group.push(&node.data_source, vec![RouteMapper::new(table, &node.table)]);
        }
        groups.push(group);
    }

    debug!("broadcasting schema change for {:?}", tables);

    groups
}
