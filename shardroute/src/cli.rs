use std::ops::Bound;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use clap::{Parser, Subcommand};
use shardroute_config::Config;
use thiserror::Error;
use tracing::{info, warn};

use crate::router::{Hint, RouteStatement, Router, ShardingCondition, StatementKind};
use crate::rule::{self, ShardingRule};
use crate::sharding::{ConditionValue, Value, ValueRange};

/// Shardroute routes statements over logical tables to data sources and actual tables.
#[derive(Parser, Debug)]
#[command(name = "shardroute", version)]
pub struct Cli {
    /// Path to the rule file. Default: "shardroute.toml"
    #[arg(short, long, default_value = "shardroute.toml")]
    pub config: PathBuf,

    /// Log in JSON.
    #[arg(long)]
    pub json: bool,

    /// Subcommand.
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Route a statement and print the result as JSON.
    Route {
        /// Logical table used by the statement. Repeat for joins.
        #[arg(short, long = "table")]
        tables: Vec<String>,

        /// Predicate `table.column=value`. Repeating a column makes a list.
        #[arg(long = "condition")]
        conditions: Vec<ColumnValue>,

        /// Predicate `table.column=start..end`, inclusive. Either end can be left out.
        #[arg(long = "range")]
        ranges: Vec<ColumnRange>,

        /// Database hint `table=value`.
        #[arg(long = "hint-database")]
        hint_database: Vec<TableValue>,

        /// Table hint `table=value`.
        #[arg(long = "hint-table")]
        hint_table: Vec<TableValue>,

        /// Database hint for every table.
        #[arg(long = "hint-database-only")]
        hint_database_only: Vec<Value>,

        /// Statement kind: query, schema or introspection.
        #[arg(short, long, default_value = "query")]
        kind: StatementKind,
    },

    /// Check the rule file for errors.
    #[command(alias = "check")]
    Configcheck,
}

/// `table.column=value`
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnValue {
    pub table: String,
    pub column: String,
    pub value: Value,
}

impl FromStr for ColumnValue {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (table, column, value) = column_assignment(s)?;
        Ok(Self {
            table,
            column,
            value: value.parse::<Value>().unwrap_or_else(|err| match err {}),
        })
    }
}

/// `table.column=start..end`
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnRange {
    pub table: String,
    pub column: String,
    pub range: ValueRange,
}

impl FromStr for ColumnRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (table, column, range) = column_assignment(s)?;
        let (start, end) = range
            .split_once("..")
            .ok_or_else(|| format!("\"{}\" is not a range, expected start..end", range))?;

        let bound = |value: &str| match value.trim() {
            "" => Bound::Unbounded,
            value => Bound::Included(value.parse::<Value>().unwrap_or_else(|err| match err {})),
        };

        Ok(Self {
            table,
            column,
            range: ValueRange::new(bound(start), bound(end)),
        })
    }
}

/// `table=value`
#[derive(Debug, Clone, PartialEq)]
pub struct TableValue {
    pub table: String,
    pub value: Value,
}

impl FromStr for TableValue {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('=') {
            Some((table, value)) if !table.trim().is_empty() => Ok(Self {
                table: table.trim().to_string(),
                value: value.trim().parse::<Value>().unwrap_or_else(|err| match err {}),
            }),
            _ => Err(format!("\"{}\" is not table=value", s)),
        }
    }
}

fn column_assignment(s: &str) -> Result<(String, String, String), String> {
    let invalid = || format!("\"{}\" is not table.column=value", s);

    let (target, value) = s.split_once('=').ok_or_else(invalid)?;
    let (table, column) = target.trim().split_once('.').ok_or_else(invalid)?;

    if table.is_empty() || column.is_empty() {
        return Err(invalid());
    }

    Ok((
        table.to_string(),
        column.to_string(),
        value.trim().to_string(),
    ))
}

/// Build the statement from command line predicates. Values given
/// for the same column more than once become a list.
pub fn statement(
    tables: &[String],
    conditions: &[ColumnValue],
    ranges: &[ColumnRange],
    kind: StatementKind,
) -> RouteStatement {
    let mut condition = ShardingCondition::new();

    let mut seen: Vec<(&str, &str, Vec<Value>)> = vec![];
    for predicate in conditions {
        match seen.iter_mut().find(|(table, column, _)| {
            table.eq_ignore_ascii_case(&predicate.table)
                && column.eq_ignore_ascii_case(&predicate.column)
        }) {
            Some((_, _, values)) => values.push(predicate.value.clone()),
            None => seen.push((
                predicate.table.as_str(),
                predicate.column.as_str(),
                vec![predicate.value.clone()],
            )),
        }
    }

    for (table, column, mut values) in seen {
        let value = if values.len() == 1 {
            ConditionValue::Precise(values.remove(0))
        } else {
            ConditionValue::List(values)
        };
        condition.add(table, column, value);
    }

    for predicate in ranges {
        condition.add(&predicate.table, &predicate.column, predicate.range.clone());
    }

    let statement = RouteStatement::new().with_tables(tables).with_kind(kind);

    if condition.is_empty() {
        statement
    } else {
        statement.with_condition(condition)
    }
}

/// Route a statement described on the command line.
#[allow(clippy::print_stdout)]
pub fn route(config: &Path, commands: Commands) -> Result<(), Box<dyn std::error::Error>> {
    if let Commands::Route {
        tables,
        conditions,
        ranges,
        hint_database,
        hint_table,
        hint_database_only,
        kind,
    } = commands
    {
        if !config.exists() {
            return Err(ConfigCheckError::Missing(config.to_path_buf()).into());
        }
        let rule = ShardingRule::load(config)?;

        for (table, column) in conditions
            .iter()
            .map(|c| (&c.table, &c.column))
            .chain(ranges.iter().map(|r| (&r.table, &r.column)))
        {
            if !rule.is_sharding_column(table, column) {
                warn!("\"{}.{}\" is not a sharding column", table, column);
            }
        }

        let mut hint = if hint_database_only.is_empty() {
            Hint::new()
        } else {
            Hint::database_only(hint_database_only)
        };
        for value in hint_database {
            hint.add_database_value(value.table, value.value);
        }
        for value in hint_table {
            hint.add_table_value(value.table, value.value);
        }

        let statement = statement(&tables, &conditions, &ranges, kind);
        let router = Router::new(rule);
        let hint = if hint.is_empty() { None } else { Some(&hint) };
        let context = router.route(&statement, hint)?;

        println!("{}", serde_json::to_string_pretty(&context)?);
    }

    Ok(())
}

#[derive(Debug, Error)]
pub enum ConfigCheckError {
    #[error("`{0}` doesn't exist")]
    Missing(PathBuf),

    #[error("{0}")]
    Config(#[from] shardroute_config::Error),

    #[error("{0}")]
    Rule(#[from] rule::Error),
}

/// Confirm that the rule file is valid.
pub fn config_check(path: &Path) -> Result<(), ConfigCheckError> {
    if !path.exists() {
        return Err(ConfigCheckError::Missing(path.to_path_buf()));
    }

    let config = Config::load(path)?;
    let rule = ShardingRule::try_from(&config)?;

    info!(
        "\"{}\" is valid: {} sharded tables, {} binding groups, {} broadcast tables",
        path.display(),
        rule.table_rules().len(),
        rule.binding_groups().len(),
        rule.broadcast_tables().len()
    );

    Ok(())
}
