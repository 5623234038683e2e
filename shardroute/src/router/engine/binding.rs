//! Bound tables follow the primary table's routing.

use tracing::debug;

use super::RouteGroup;
use crate::router::{Error, RouteMapper};
use crate::rule::{binding_actual_table, DataNode, TableRule};

/// Build one combination per primary node, with every member mapped
/// to its actual table at the same position on the same data source.
///
/// Names are the statement's spelling of each table.
pub fn route(
    primary: (&str, &TableRule),
    members: &[(&str, &TableRule)],
    primary_nodes: &[DataNode],
) -> Result<RouteGroup, Error> {
    let (primary_name, primary_rule) = primary;
    let tables = std::iter::once(primary_name)
        .chain(members.iter().map(|(name, _)| *name))
        .map(String::from)
        .collect();
    let mut group = RouteGroup::new(tables);

    for node in primary_nodes {
        let mut combination = Vec::with_capacity(members.len() + 1);
        combination.push(RouteMapper::new(primary_name, &node.table));

        for (name, member) in members {
            let actual =
                binding_actual_table(primary_rule, member, &node.data_source, &node.table)?;
            combination.push(RouteMapper::new(*name, actual));
        }

        group.push(&node.data_source, combination);
    }

    debug!(
        "binding tables {:?} follow \"{}\" to {} nodes",
        &group.tables()[1..],
        primary_name,
        primary_nodes.len()
    );

    Ok(group)
}
