//! Route one logical table.

use std::collections::{BTreeSet, HashSet};

use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::router::{Error, Hint, ShardingConditions};
use crate::rule::{DataNode, ShardingRule, TableRule};
use crate::sharding::{ShardingStrategy, StrategyInput};

/// Data nodes of `rule` that satisfy the statement, in declared order.
///
/// A hint for the table replaces conditions. Each `OR` branch of conditions
/// is routed separately and the results combined. Empty result is an error.
pub fn route(
    sharding_rule: &ShardingRule,
    rule: &TableRule,
    conditions: &ShardingConditions,
    hint: Option<&Hint>,
) -> Result<Vec<DataNode>, Error> {
    let table = rule.logic_table();
    let no_columns = IndexMap::new();
    let mut selected: HashSet<&DataNode> = HashSet::new();

    if let Some(hint) = hint.and_then(|hint| hint.table(table)) {
        trace!("routing \"{}\" by hint", table);
        let database = hint.database.filter(|v| !v.is_empty()).map(StrategyInput::Hint);
        let tables = hint.table.filter(|v| !v.is_empty()).map(StrategyInput::Hint);
        selected.extend(route_once(sharding_rule, rule, database, tables)?);
    } else if conditions.is_empty() {
        let input = Some(StrategyInput::Conditions(&no_columns));
        selected.extend(route_once(sharding_rule, rule, input, input)?);
    } else {
        for condition in conditions.iter() {
            let columns = condition.columns(table).unwrap_or(&no_columns);
            let input = Some(StrategyInput::Conditions(columns));
            selected.extend(route_once(sharding_rule, rule, input, input)?);
        }
    }

    let nodes: Vec<DataNode> = rule
        .actual_data_nodes()
        .iter()
        .filter(|node| selected.contains(node))
        .cloned()
        .collect();

    if nodes.is_empty() {
        return Err(Error::NoShard(table.to_string()));
    }

    debug!(
        "\"{}\" routed to {} of {} data nodes",
        table,
        nodes.len(),
        rule.actual_data_nodes().len()
    );

    Ok(nodes)
}

/// Route both axes independently, then keep declared nodes that
/// match on both. `None` input means the whole axis.
fn route_once<'a>(
    sharding_rule: &ShardingRule,
    rule: &'a TableRule,
    database: Option<StrategyInput<'_>>,
    tables: Option<StrategyInput<'_>>,
) -> Result<Vec<&'a DataNode>, Error> {
    let data_sources = axis(
        rule,
        sharding_rule.database_strategy(rule),
        rule.data_sources(),
        database,
    )?;
    let actual_tables = axis(
        rule,
        sharding_rule.table_strategy(rule),
        rule.actual_tables(),
        tables,
    )?;

    trace!(
        "\"{}\": data sources {:?}, tables {:?}",
        rule.logic_table(),
        data_sources,
        actual_tables
    );

    Ok(rule
        .actual_data_nodes()
        .iter()
        .filter(|node| {
            data_sources.contains(node.data_source.as_str())
                && actual_tables.contains(node.table.as_str())
        })
        .collect())
}

fn axis<'a>(
    rule: &TableRule,
    strategy: &ShardingStrategy,
    targets: &'a [String],
    input: Option<StrategyInput<'_>>,
) -> Result<HashSet<&'a str>, Error> {
    let indexes = match input {
        Some(input) => strategy
            .route(targets, input)
            .map_err(|source| Error::Algorithm {
                table: rule.logic_table().to_string(),
                source,
            })?,
        None => (0..targets.len()).collect::<BTreeSet<_>>(),
    };

    Ok(indexes
        .into_iter()
        .filter_map(|index| targets.get(index).map(|t| t.as_str()))
        .collect())
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use super::*;
    use crate::router::ShardingCondition;
    use crate::sharding::{HintValue, ListShards, Modulo, Value, ValueRange};
    use shardroute_config::ListMapping;

    fn order_rule() -> (ShardingRule, TableRule) {
        let nodes = (0..2).flat_map(|ds| {
            (0..2).map(move |t| DataNode::new(format!("ds_{}", ds), format!("t_order_{}", t)))
        });
        let table = TableRule::new("t_order", nodes.collect::<Vec<_>>())
            .unwrap()
            .with_database_strategy(ShardingStrategy::standard("user_id", Arc::new(Modulo)))
            .with_table_strategy(ShardingStrategy::standard_with_range(
                "order_id",
                Arc::new(Modulo),
            ));
        let rule = ShardingRule::builder().table(table.clone()).build().unwrap();
        (rule, table)
    }

    fn condition(user_id: i64, order_id: i64) -> ShardingConditions {
        ShardingCondition::new()
            .with("t_order", "user_id", Value::from(user_id))
            .with("t_order", "order_id", Value::from(order_id))
            .into()
    }

    #[test]
    fn test_both_axes_pinned() {
        let (rule, table) = order_rule();

        for user_id in 0..4 {
            for order_id in 0..4 {
                let nodes = route(&rule, &table, &condition(user_id, order_id), None).unwrap();
                assert_eq!(nodes.len(), 1);
                assert!(table.contains(&nodes[0]));
                assert_eq!(
                    nodes[0],
                    DataNode::new(
                        format!("ds_{}", user_id % 2),
                        format!("t_order_{}", order_id % 2)
                    )
                );
            }
        }
    }

    #[test]
    fn test_no_condition_is_everything() {
        let (rule, table) = order_rule();

        let nodes = route(&rule, &table, &ShardingConditions::new(), None).unwrap();
        assert_eq!(nodes, table.actual_data_nodes());

        let unrelated: ShardingConditions = ShardingCondition::new()
            .with("t_user", "user_id", Value::from(1))
            .into();
        let nodes = route(&rule, &table, &unrelated, None).unwrap();
        assert_eq!(nodes, table.actual_data_nodes());
    }

    #[test]
    fn test_one_axis() {
        let (rule, table) = order_rule();
        let conditions: ShardingConditions = ShardingCondition::new()
            .with("t_order", "user_id", Value::from(3))
            .into();

        let nodes = route(&rule, &table, &conditions, None).unwrap();
        assert_eq!(
            nodes,
            vec![
                DataNode::new("ds_1", "t_order_0"),
                DataNode::new("ds_1", "t_order_1")
            ]
        );
    }

    #[test]
    fn test_list_and_range() {
        let (rule, table) = order_rule();
        let conditions: ShardingConditions = ShardingCondition::new()
            .with("t_order", "user_id", vec![Value::from(0), Value::from(2)])
            .with("t_order", "order_id", ValueRange::closed(5, 5))
            .into();

        let nodes = route(&rule, &table, &conditions, None).unwrap();
        assert_eq!(nodes, vec![DataNode::new("ds_0", "t_order_1")]);
    }

    #[test]
    fn test_or_branches_union() {
        let (rule, table) = order_rule();
        let conditions = ShardingConditions::from(vec![
            ShardingCondition::new()
                .with("t_order", "user_id", Value::from(1))
                .with("t_order", "order_id", Value::from(1)),
            ShardingCondition::new()
                .with("t_order", "user_id", Value::from(0))
                .with("t_order", "order_id", Value::from(0)),
        ]);

        let nodes = route(&rule, &table, &conditions, None).unwrap();
        assert_eq!(
            nodes,
            vec![
                DataNode::new("ds_0", "t_order_0"),
                DataNode::new("ds_1", "t_order_1")
            ]
        );
    }

    #[test]
    fn test_sparse_nodes() {
        let table = TableRule::new(
            "t_log",
            vec![
                DataNode::new("ds_0", "t_log_0"),
                DataNode::new("ds_1", "t_log_1"),
            ],
        )
        .unwrap()
        .with_database_strategy(ShardingStrategy::standard("id", Arc::new(Modulo)))
        .with_table_strategy(ShardingStrategy::standard("id", Arc::new(Modulo)));
        let rule = ShardingRule::builder().table(table.clone()).build().unwrap();

        let conditions: ShardingConditions =
            ShardingCondition::new().with("t_log", "id", Value::from(1)).into();
        assert_eq!(
            route(&rule, &table, &conditions, None).unwrap(),
            vec![DataNode::new("ds_1", "t_log_1")]
        );
    }

    #[test]
    fn test_no_shard() {
        let table = TableRule::new("t_order", vec![DataNode::new("ds_0", "t_order_0")])
            .unwrap()
            .with_database_strategy(ShardingStrategy::hint(Arc::new(HintValue)));
        let rule = ShardingRule::builder().table(table.clone()).build().unwrap();
        let hint = Hint::new().with_database_value("t_order", 5);

        assert!(matches!(
            route(&rule, &table, &ShardingConditions::new(), Some(&hint)),
            Err(Error::NoShard(t)) if t == "t_order"
        ));
    }

    #[test]
    fn test_hint_overrides_conditions() {
        let (rule, table) = order_rule();
        let hint = Hint::new()
            .with_database_value("t_order", 0)
            .with_table_value("t_order", 1);

        let nodes = route(&rule, &table, &condition(1, 0), Some(&hint)).unwrap();
        assert_eq!(nodes, vec![DataNode::new("ds_0", "t_order_1")]);

        let database_only = Hint::database_only([1]);
        let nodes = route(&rule, &table, &condition(0, 0), Some(&database_only)).unwrap();
        assert_eq!(
            nodes,
            vec![
                DataNode::new("ds_1", "t_order_0"),
                DataNode::new("ds_1", "t_order_1")
            ]
        );
    }

    #[test]
    fn test_hint_on_list_and_by_name() {
        let regions = ListShards::new(&[
            ListMapping {
                values: vec!["eu".into()],
                shard: 0,
            },
            ListMapping {
                values: vec!["us".into()],
                shard: 1,
            },
        ]);
        let table = TableRule::new(
            "t_user",
            vec![
                DataNode::new("ds_0", "t_user"),
                DataNode::new("ds_1", "t_user"),
            ],
        )
        .unwrap()
        .with_database_strategy(ShardingStrategy::standard("region", Arc::new(regions)));
        let rule = ShardingRule::builder().table(table.clone()).build().unwrap();

        let hint = Hint::new().with_database_value("t_user", 1);
        assert_eq!(
            route(&rule, &table, &ShardingConditions::new(), Some(&hint)).unwrap(),
            vec![DataNode::new("ds_1", "t_user")]
        );

        let (rule, table) = order_rule();
        let hint = Hint::new()
            .with_database_value("t_order", "ds_1")
            .with_table_value("t_order", "t_order_0");
        assert_eq!(
            route(&rule, &table, &ShardingConditions::new(), Some(&hint)).unwrap(),
            vec![DataNode::new("ds_1", "t_order_0")]
        );
    }

    #[test]
    fn test_algorithm_error() {
        let (rule, table) = order_rule();
        let conditions: ShardingConditions = ShardingCondition::new()
            .with("t_order", "user_id", Value::from("abc"))
            .into();
        assert!(matches!(
            route(&rule, &table, &conditions, None),
            Err(Error::Algorithm { table, .. }) if table == "t_order"
        ));
    }
}
