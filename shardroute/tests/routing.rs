use std::io::Write;

use shardroute::router::{
    Error, Hint, HintManager, RouteMapper, RouteStatement, Router, ShardingCondition,
    StatementKind,
};
use shardroute::rule::{DataNode, ShardingRule};
use shardroute::sharding::{Value, ValueRange};

const RULES: &str = r#"
data_sources = ["ds_0", "ds_1", "ds_2"]
default_data_source = "ds_0"
broadcast_tables = ["t_config"]
binding_tables = [["t_order", "t_order_item"]]
default_database_strategy = { kind = "standard", column = "user_id", algorithm = "ds_mod" }

[[tables]]
name = "t_order"
actual_data_nodes = "ds_${0..1}.t_order_${0..1}"
table_strategy = { kind = "standard", column = "order_id", algorithm = "t_mod", range_algorithm = "t_mod" }
key_generate_column = "order_id"

[[tables]]
name = "t_order_item"
actual_data_nodes = "ds_${0..1}.t_order_item_${0..1}"
table_strategy = { kind = "standard", column = "order_id", algorithm = "t_mod" }

[[tables]]
name = "t_user"
actual_data_nodes = "ds_${['1', '2']}.t_user"
database_strategy = { kind = "standard", column = "region", algorithm = "by_region" }

[[tables]]
name = "t_score"
actual_data_nodes = "ds_0.t_score_${0..2}"
database_strategy = { kind = "none" }
table_strategy = { kind = "standard", column = "elo", algorithm = "by_elo", range_algorithm = "by_elo" }

[[tables]]
name = "t_audit"
actual_data_nodes = "ds_${0..2}.t_audit"
database_strategy = { kind = "hint", algorithm = "by_hint" }

[[algorithms]]
name = "ds_mod"
kind = "mod"

[[algorithms]]
name = "t_mod"
kind = "mod"

[[algorithms]]
name = "by_region"
kind = "list"
mappings = [
    { values = ["eu", "uk"], shard = 0 },
    { values = ["us"], shard = 1 },
]

[[algorithms]]
name = "by_elo"
kind = "range"
mappings = [
    { end = 1200, shard = 0 },
    { start = 1200, end = 1800, shard = 1 },
    { start = 1800, shard = 2 },
]

[[algorithms]]
name = "by_hint"
kind = "hint_value"
"#;

fn router() -> Router {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(RULES.as_bytes()).unwrap();
    Router::new(ShardingRule::load(file.path()).unwrap())
}

#[test]
fn test_order_by_keys() {
    let statement = RouteStatement::new().with_table("t_order").with_condition(
        ShardingCondition::new()
            .with("t_order", "user_id", Value::from(3))
            .with("t_order", "order_id", Value::from(4)),
    );

    let context = router().route(&statement, None).unwrap();
    assert_eq!(context.data_sources(), vec!["ds_1"]);
    assert_eq!(
        context.original_data_nodes()["t_order"],
        vec![DataNode::new("ds_1", "t_order_0")]
    );
}

#[test]
fn test_order_range() {
    let statement = RouteStatement::new().with_table("t_order").with_condition(
        ShardingCondition::new()
            .with("t_order", "user_id", Value::from(0))
            .with("t_order", "order_id", ValueRange::closed(7, 7)),
    );

    let context = router().route(&statement, None).unwrap();
    assert_eq!(
        context.original_data_nodes()["t_order"],
        vec![DataNode::new("ds_0", "t_order_1")]
    );
}

#[test]
fn test_binding_join() {
    let statement = RouteStatement::new()
        .with_tables(["t_order", "t_order_item", "t_config"])
        .with_condition(ShardingCondition::new().with("t_order", "order_id", Value::from(1)));

    let context = router().route(&statement, None).unwrap();
    assert_eq!(context.data_sources(), vec!["ds_0", "ds_1"]);

    for unit in context.route_units() {
        assert_eq!(
            unit.combinations(),
            &[vec![
                RouteMapper::new("t_order", "t_order_1"),
                RouteMapper::new("t_order_item", "t_order_item_1"),
                RouteMapper::new("t_config", "t_config"),
            ]]
        );
    }
}

#[test]
fn test_list_and_join() {
    let statement = RouteStatement::new()
        .with_tables(["t_user", "t_order"])
        .with_condition(ShardingCondition::new().with("t_user", "region", Value::from("uk")));

    // t_user lands on ds_1, the only data source it shares with t_order.
    let context = router().route(&statement, None).unwrap();
    assert_eq!(context.data_sources(), vec!["ds_1"]);
    assert_eq!(context.unit("ds_1").unwrap().combinations().len(), 2);

    let statement = RouteStatement::new()
        .with_tables(["t_user", "t_order"])
        .with_condition(ShardingCondition::new().with("t_user", "region", Value::from("us")));
    assert!(matches!(
        router().route(&statement, None),
        Err(Error::CannotJoin(_))
    ));

    let statement = RouteStatement::new()
        .with_table("t_user")
        .with_condition(ShardingCondition::new().with("t_user", "region", Value::from("mars")));
    assert!(matches!(
        router().route(&statement, None),
        Err(Error::NoShard(table)) if table == "t_user"
    ));
}

#[test]
fn test_score_ranges() {
    let statement = RouteStatement::new().with_table("t_score").with_condition(
        ShardingCondition::new().with("t_score", "elo", ValueRange::closed(1000, 1500)),
    );

    let context = router().route(&statement, None).unwrap();
    assert_eq!(
        context.unit("ds_0").unwrap().actual_tables("t_score"),
        vec!["t_score_0", "t_score_1"]
    );
}

#[test]
fn test_or_conditions() {
    let statement = RouteStatement::new()
        .with_table("t_score")
        .with_condition(ShardingCondition::new().with("t_score", "elo", Value::from(2000)))
        .with_condition(ShardingCondition::new().with("t_score", "elo", Value::from(100)));

    let context = router().route(&statement, None).unwrap();
    assert_eq!(
        context.unit("ds_0").unwrap().actual_tables("t_score"),
        vec!["t_score_0", "t_score_2"]
    );
}

#[test]
fn test_hint_scope() {
    let router = router();
    let statement = RouteStatement::new().with_table("t_audit");
    let mut manager = HintManager::new();

    {
        let guard = manager.set(Hint::new().with_database_value("t_audit", "ds_2"));
        let context = router.route(&statement, guard.hint()).unwrap();
        assert_eq!(context.data_sources(), vec!["ds_2"]);
    }

    assert!(manager.current().is_none());
    let context = router.route(&statement, manager.current()).unwrap();
    assert_eq!(context.route_units().len(), 3);
}

#[test]
fn test_schema_and_introspection() {
    let statement = RouteStatement::new()
        .with_table("t_score")
        .with_kind(StatementKind::Schema);
    let context = router().route(&statement, None).unwrap();
    assert_eq!(context.unit("ds_0").unwrap().combinations().len(), 3);

    let statement = RouteStatement::new()
        .with_table("t_user")
        .with_kind(StatementKind::Introspection);
    let context = router().route(&statement, None).unwrap();
    assert_eq!(context.data_sources(), vec!["ds_1"]);
}

#[test]
fn test_json_output() {
    let statement = RouteStatement::new().with_table("t_config");
    let context = router().route(&statement, None).unwrap();
    let json = serde_json::to_value(&context).unwrap();

    assert_eq!(json["route_units"].as_array().unwrap().len(), 3);
    assert_eq!(json["route_units"][0]["data_source"], "ds_0");
    assert_eq!(
        json["route_units"][0]["combinations"][0][0]["actual_name"],
        "t_config"
    );
    assert_eq!(
        json["original_data_nodes"]["t_config"][2]["data_source"],
        "ds_2"
    );
}

const INLINE_RULES: &str = r#"
binding_tables = [["t_order", "t_order_item"]]
default_database_strategy = { kind = "standard", column = "user_id", algorithm = "ds_inline" }

[[tables]]
name = "t_order"
actual_data_nodes = "ds_${0..1}.t_order_${0..1}"
table_strategy = { kind = "standard", column = "order_id", algorithm = "t_order_inline" }

[[tables]]
name = "t_order_item"
actual_data_nodes = "ds_${0..1}.t_order_item_${0..1}"
table_strategy = { kind = "standard", column = "order_id", algorithm = "t_order_item_inline" }

[[algorithms]]
name = "ds_inline"
kind = "inline"
expression = "ds_${user_id % 2}"

[[algorithms]]
name = "t_order_inline"
kind = "inline"
expression = "t_order_${order_id % 2}"

[[algorithms]]
name = "t_order_item_inline"
kind = "inline"
expression = "t_order_item_${order_id % 2}"
"#;

#[test]
fn test_inline_expressions() {
    let config: shardroute_config::Config = INLINE_RULES.parse().unwrap();
    let router = Router::new(ShardingRule::try_from(&config).unwrap());

    let statement = RouteStatement::new()
        .with_tables(["t_order", "t_order_item"])
        .with_condition(
            ShardingCondition::new()
                .with("t_order", "user_id", Value::from(1))
                .with("t_order", "order_id", Value::from(3)),
        );
    let context = router.route(&statement, None).unwrap();
    assert_eq!(context.data_sources(), vec!["ds_1"]);
    assert_eq!(
        context.unit("ds_1").unwrap().combinations(),
        &[vec![
            RouteMapper::new("t_order", "t_order_1"),
            RouteMapper::new("t_order_item", "t_order_item_1"),
        ]]
    );

    // Hints are shard numbers, not values for the expression.
    let hint = Hint::new()
        .with_database_value("t_order", 0)
        .with_table_value("t_order", 1);
    let statement = RouteStatement::new().with_table("t_order");
    let context = router.route(&statement, Some(&hint)).unwrap();
    assert_eq!(
        context.original_data_nodes()["t_order"],
        vec![DataNode::new("ds_0", "t_order_1")]
    );
}
