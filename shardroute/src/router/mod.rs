//! Statement router.

pub mod builder;
pub mod condition;
pub mod engine;
pub mod error;
pub mod hint;
pub mod route;
pub mod statement;

pub use builder::RouteContextBuilder;
pub use condition::{ShardingCondition, ShardingConditions};
pub use error::Error;
pub use hint::{Hint, HintGuard, HintManager, TableHint};
pub use route::{RouteContext, RouteMapper, RouteUnit};
pub use statement::{RouteStatement, StatementKind};

use tracing::{debug, trace};

use crate::rule::{self, DataNode, ShardingRule};
use engine::{binding, broadcast, complex, standard, unicast, RouteGroup};

/// Routes statements using one set of sharding rules.
#[derive(Debug, Clone)]
pub struct Router {
    rule: ShardingRule,
}

impl Router {
    pub fn new(rule: ShardingRule) -> Self {
        Self { rule }
    }

    pub fn rule(&self) -> &ShardingRule {
        &self.rule
    }

    /// Find the data sources and actual tables the statement needs.
    ///
    /// An empty context means the statement doesn't touch any table
    /// the rules know about and can be passed through.
    pub fn route(
        &self,
        statement: &RouteStatement,
        hint: Option<&Hint>,
    ) -> Result<RouteContext, Error> {
        let tables = statement.tables();
        let mut builder = RouteContextBuilder::new();

        match statement.kind() {
            StatementKind::Introspection => {
                builder.add_group(unicast::route(&self.rule, tables)?);
            }

            StatementKind::Schema => {
                if self.rule.is_all_broadcast_tables(tables) {
                    builder.add_group(broadcast::database(&self.rule, tables)?);
                } else {
                    for group in broadcast::schema(&self.rule, tables) {
                        builder.add_group(group);
                    }
                }
            }

            StatementKind::Query => {
                if tables.is_empty() {
                    trace!("no tables, nothing to route");
                } else if self.rule.is_all_broadcast_tables(tables) {
                    builder.add_group(broadcast::database(&self.rule, tables)?);
                } else if let Some(group) = self.route_sharded(statement, hint)? {
                    builder.add_group(group);
                }
            }
        }

        let context = builder.build(&self.rule)?;
        debug!("{} {:?} routed to {}", statement.kind(), tables, context);

        Ok(context)
    }

    /// Route each sharded table, or its binding group, on its own,
    /// then join the results.
    fn route_sharded(
        &self,
        statement: &RouteStatement,
        hint: Option<&Hint>,
    ) -> Result<Option<RouteGroup>, Error> {
        let mut groups = vec![];
        let mut broadcast_tables = vec![];
        let mut routed: Vec<&str> = vec![];

        for table in statement.tables() {
            if routed.iter().any(|r| r.eq_ignore_ascii_case(table)) {
                continue;
            }

            if self.rule.is_broadcast_table(table) {
                broadcast_tables.push(table.clone());
                continue;
            }

            let Some(table_rule) = self.rule.table_rule(table) else {
                match self.rule.default_data_source() {
                    Some(data_source) => groups.push(RouteGroup::from_nodes(
                        table,
                        &[DataNode::new(data_source, table)],
                    )),
                    None => debug!("\"{}\" has no rule and there is no default data source", table),
                }
                continue;
            };

            let nodes = standard::route(&self.rule, table_rule, statement.conditions(), hint)?;
            routed.push(table);

            // Bound tables later in the statement follow this one.
            let bound: Vec<&String> = match self.rule.binding_group(table) {
                Some(group) => statement
                    .tables()
                    .iter()
                    .filter(|other| {
                        group.contains(other)
                            && !routed.iter().any(|r| r.eq_ignore_ascii_case(other))
                    })
                    .collect(),
                None => vec![],
            };

            if bound.is_empty() {
                groups.push(RouteGroup::from_nodes(table, &nodes));
                continue;
            }

            let mut members = vec![];
            for name in bound {
                let member = self
                    .rule
                    .table_rule(name)
                    .ok_or_else(|| rule::Error::UnknownBindingTable(name.clone()))?;
                members.push((name.as_str(), member));
                routed.push(name);
            }

            groups.push(binding::route(
                (table.as_str(), table_rule),
                &members,
                &nodes,
            )?);
        }

        if !broadcast_tables.is_empty() {
            groups.push(broadcast::database(&self.rule, &broadcast_tables)?);
        }

        match groups.len() {
            0 => Ok(None),
            1 => Ok(groups.pop()),
            _ => Ok(Some(complex::route(groups)?)),
        }
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use super::*;
    use crate::rule::TableRule;
    use crate::sharding::{HintValue, Modulo, ShardingStrategy, Value};

    /// `t_order` and `t_order_item` are bound, 2 data sources x 2 tables each.
    /// `t_user` is sharded by database only, `t_config` is broadcast.
    fn router() -> Router {
        let sharded = |name: &str| {
            let nodes = (0..2).flat_map(|ds| {
                (0..2).map(move |t| DataNode::new(format!("ds_{}", ds), format!("{}_{}", name, t)))
            });
            TableRule::new(name, nodes.collect::<Vec<_>>())
                .unwrap()
                .with_table_strategy(ShardingStrategy::standard("order_id", Arc::new(Modulo)))
        };

        let rule = ShardingRule::builder()
            .data_sources(["ds_0", "ds_1", "ds_2"])
            .default_data_source("ds_0")
            .default_database_strategy(ShardingStrategy::standard("user_id", Arc::new(Modulo)))
            .table(sharded("t_order"))
            .table(sharded("t_order_item"))
            .table(
                TableRule::new(
                    "t_user",
                    vec![
                        DataNode::new("ds_1", "t_user"),
                        DataNode::new("ds_2", "t_user"),
                    ],
                )
                .unwrap(),
            )
            .table(
                TableRule::new("t_log", vec![DataNode::new("ds_2", "t_log")])
                    .unwrap()
                    .with_database_strategy(ShardingStrategy::hint(Arc::new(HintValue))),
            )
            .binding_group(["t_order", "t_order_item"])
            .broadcast_table("t_config")
            .build()
            .unwrap();

        Router::new(rule)
    }

    fn order(user_id: i64, order_id: i64) -> ShardingCondition {
        ShardingCondition::new()
            .with("t_order", "user_id", Value::from(user_id))
            .with("t_order", "order_id", Value::from(order_id))
    }

    #[test]
    fn test_single_table() {
        let statement = RouteStatement::new()
            .with_table("t_order")
            .with_condition(order(1, 2));
        let context = router().route(&statement, None).unwrap();

        assert!(context.is_single_route());
        assert_eq!(context.data_sources(), vec!["ds_1"]);
        assert_eq!(
            context.unit("ds_1").unwrap().combinations(),
            &[vec![RouteMapper::new("t_order", "t_order_0")]]
        );
        assert_eq!(
            context.original_data_nodes()["t_order"],
            vec![DataNode::new("ds_1", "t_order_0")]
        );
    }

    #[test]
    fn test_full_scan() {
        let statement = RouteStatement::new().with_table("t_order");
        let context = router().route(&statement, None).unwrap();

        assert_eq!(context.data_sources(), vec!["ds_0", "ds_1"]);
        assert_eq!(context.unit("ds_0").unwrap().combinations().len(), 2);
        assert_eq!(context.original_data_nodes()["t_order"].len(), 4);
    }

    #[test]
    fn test_binding() {
        let statement = RouteStatement::new()
            .with_tables(["t_order", "t_order_item"])
            .with_condition(order(0, 1));
        let context = router().route(&statement, None).unwrap();

        assert_eq!(context.data_sources(), vec!["ds_0"]);
        assert_eq!(
            context.unit("ds_0").unwrap().combinations(),
            &[vec![
                RouteMapper::new("t_order", "t_order_1"),
                RouteMapper::new("t_order_item", "t_order_item_1")
            ]]
        );

        // Primary is whichever bound table comes first.
        let statement = RouteStatement::new()
            .with_tables(["t_order_item", "t_order"])
            .with_condition(
                ShardingCondition::new()
                    .with("t_order_item", "user_id", Value::from(1))
                    .with("t_order", "order_id", Value::from(0)),
            );
        let context = router().route(&statement, None).unwrap();
        assert_eq!(context.data_sources(), vec!["ds_1"]);
        assert_eq!(
            context.unit("ds_1").unwrap().combinations(),
            &[
                vec![
                    RouteMapper::new("t_order_item", "t_order_item_0"),
                    RouteMapper::new("t_order", "t_order_0")
                ],
                vec![
                    RouteMapper::new("t_order_item", "t_order_item_1"),
                    RouteMapper::new("t_order", "t_order_1")
                ]
            ]
        );
    }

    #[test]
    fn test_join_independent_tables() {
        // t_order on ds_0/ds_1, t_user on ds_1/ds_2.
        let statement = RouteStatement::new().with_tables(["t_order", "t_user"]);
        let context = router().route(&statement, None).unwrap();

        assert_eq!(context.data_sources(), vec!["ds_1"]);
        let unit = context.unit("ds_1").unwrap();
        assert_eq!(unit.combinations().len(), 2);
        assert_eq!(unit.actual_tables("t_user"), vec!["t_user"]);
        assert_eq!(unit.actual_tables("t_order"), vec!["t_order_0", "t_order_1"]);
    }

    #[test]
    fn test_join_disjoint() {
        let statement = RouteStatement::new()
            .with_tables(["t_order", "t_user"])
            .with_condition(order(0, 0));

        assert!(matches!(
            router().route(&statement, None),
            Err(Error::CannotJoin(tables)) if tables == vec!["t_order", "t_user"]
        ));
    }

    #[test]
    fn test_broadcast() {
        let statement = RouteStatement::new()
            .with_table("t_config")
            .with_condition(ShardingCondition::new().with("t_config", "user_id", Value::from(1)));
        let context = router().route(&statement, None).unwrap();

        assert_eq!(context.route_units().len(), 3);
        for unit in context.route_units() {
            assert_eq!(unit.combinations(), &[vec![RouteMapper::new("t_config", "t_config")]]);
        }
    }

    #[test]
    fn test_broadcast_with_sharded() {
        let statement = RouteStatement::new()
            .with_tables(["t_config", "t_order"])
            .with_condition(order(1, 1));
        let context = router().route(&statement, None).unwrap();

        assert_eq!(
            context.route_units(),
            &[{
                let mut unit = RouteUnit::new("ds_1");
                unit.add_combination(vec![
                    RouteMapper::new("t_order", "t_order_1"),
                    RouteMapper::new("t_config", "t_config"),
                ]);
                unit
            }]
        );
    }

    #[test]
    fn test_single_table_default_data_source() {
        let statement = RouteStatement::new().with_table("t_unknown");
        let context = router().route(&statement, None).unwrap();
        assert_eq!(context.data_sources(), vec!["ds_0"]);

        let rule = ShardingRule::builder()
            .data_sources(["ds_0"])
            .build()
            .unwrap();
        let context = Router::new(rule).route(&statement, None).unwrap();
        assert!(context.is_empty());
    }

    #[test]
    fn test_no_tables() {
        let context = router().route(&RouteStatement::new(), None).unwrap();
        assert!(context.is_empty());
    }

    #[test]
    fn test_schema() {
        let statement = RouteStatement::new()
            .with_tables(["t_order", "t_config"])
            .with_kind(StatementKind::Schema)
            .with_condition(order(1, 1));
        let context = router().route(&statement, None).unwrap();

        assert_eq!(context.data_sources(), vec!["ds_0", "ds_1", "ds_2"]);
        assert_eq!(context.original_data_nodes()["t_order"].len(), 4);
        assert_eq!(
            context.unit("ds_2").unwrap().combinations(),
            &[vec![RouteMapper::new("t_config", "t_config")]]
        );
    }

    #[test]
    fn test_introspection() {
        let statement = RouteStatement::new().with_kind(StatementKind::Introspection);
        let context = router().route(&statement, None).unwrap();
        assert_eq!(context.data_sources(), vec!["ds_0"]);

        let statement = statement.with_table("t_user");
        let context = router().route(&statement, None).unwrap();
        assert_eq!(context.data_sources(), vec!["ds_1"]);
        assert!(context.is_single_route());
    }

    #[test]
    fn test_hint() {
        let statement = RouteStatement::new().with_table("t_log");

        let context = router().route(&statement, None).unwrap();
        assert_eq!(context.data_sources(), vec!["ds_2"]);

        let hint = Hint::new().with_database_value("t_log", "ds_2");
        assert!(router().route(&statement, Some(&hint)).is_ok());

        let hint = Hint::new().with_database_value("t_log", 1);
        assert!(matches!(
            router().route(&statement, Some(&hint)),
            Err(Error::NoShard(table)) if table == "t_log"
        ));
    }

    #[test]
    fn test_hint_manager_scope() {
        let router = router();
        let statement = RouteStatement::new().with_table("t_order");
        let mut manager = HintManager::new();

        {
            let guard = manager.set(Hint::database_only([1]));
            let context = router.route(&statement, guard.hint()).unwrap();
            assert_eq!(context.data_sources(), vec!["ds_1"]);
        }

        let context = router.route(&statement, manager.current()).unwrap();
        assert_eq!(context.data_sources(), vec!["ds_0", "ds_1"]);
    }

    #[test]
    fn test_idempotent() {
        let router = router();
        let statement = RouteStatement::new()
            .with_tables(["t_order", "t_order_item", "t_config"])
            .with_condition(order(1, 0))
            .with_condition(order(0, 1));

        let first = serde_json::to_string(&router.route(&statement, None).unwrap()).unwrap();
        let second = serde_json::to_string(&router.route(&statement, None).unwrap()).unwrap();
        assert_eq!(first, second);
    }
}
