use std::fmt::Display;
use std::str::FromStr;

use serde::Serialize;

use super::{ShardingCondition, ShardingConditions};

/// What the statement does, as far as routing cares.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementKind {
    /// Reads and writes data.
    #[default]
    Query,
    /// Changes the schema, e.g. `CREATE TABLE`.
    Schema,
    /// Asks about the database itself, e.g. `SHOW TABLES`.
    Introspection,
}

impl FromStr for StatementKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "query" => Ok(Self::Query),
            "schema" => Ok(Self::Schema),
            "introspection" => Ok(Self::Introspection),
            _ => Err(format!(
                "unknown statement kind \"{}\", expected query, schema or introspection",
                s
            )),
        }
    }
}

impl Display for StatementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self {
            Self::Query => "query",
            Self::Schema => "schema",
            Self::Introspection => "introspection",
        };
        write!(f, "{}", kind)
    }
}

/// Everything the router needs to know about one statement.
#[derive(Debug, Clone, Default)]
pub struct RouteStatement {
    tables: Vec<String>,
    conditions: ShardingConditions,
    kind: StatementKind,
}

impl RouteStatement {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a referenced logical table. Repeated tables are ignored.
    pub fn with_table(mut self, table: impl ToString) -> Self {
        let table = table.to_string();
        if !self.tables.iter().any(|t| t.eq_ignore_ascii_case(&table)) {
            self.tables.push(table);
        }
        self
    }

    pub fn with_tables(self, tables: impl IntoIterator<Item = impl ToString>) -> Self {
        tables.into_iter().fold(self, |statement, table| statement.with_table(table))
    }

    /// Add one `OR` branch of conditions.
    pub fn with_condition(mut self, condition: ShardingCondition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn with_conditions(mut self, conditions: ShardingConditions) -> Self {
        self.conditions = conditions;
        self
    }

    pub fn with_kind(mut self, kind: StatementKind) -> Self {
        self.kind = kind;
        self
    }

    /// Logical tables in statement order.
    pub fn tables(&self) -> &[String] {
        &self.tables
    }

    pub fn conditions(&self) -> &ShardingConditions {
        &self.conditions
    }

    pub fn kind(&self) -> StatementKind {
        self.kind
    }
}
