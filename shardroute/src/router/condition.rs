//! Values of sharding columns, extracted from statement predicates.

use indexmap::IndexMap;

use crate::sharding::ConditionValue;

/// Column predicates joined with `AND`, by table and column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShardingCondition {
    tables: IndexMap<String, IndexMap<String, ConditionValue>>,
}

impl ShardingCondition {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a predicate. A second predicate on the same column replaces the first.
    pub fn add(&mut self, table: impl ToString, column: impl ToString, value: impl Into<ConditionValue>) {
        let table = table.to_string();
        let key = self
            .tables
            .keys()
            .find(|t| t.eq_ignore_ascii_case(&table))
            .cloned()
            .unwrap_or(table);

        let columns = self.tables.entry(key).or_default();
        let column = column.to_string();
        match columns
            .iter_mut()
            .find(|(name, _)| name.eq_ignore_ascii_case(&column))
        {
            Some((_, existing)) => *existing = value.into(),
            None => {
                columns.insert(column, value.into());
            }
        }
    }

    pub fn with(
        mut self,
        table: impl ToString,
        column: impl ToString,
        value: impl Into<ConditionValue>,
    ) -> Self {
        self.add(table, column, value);
        self
    }

    /// Predicates on one table, by column.
    pub fn columns(&self, table: &str) -> Option<&IndexMap<String, ConditionValue>> {
        self.tables
            .iter()
            .find(|(t, _)| t.eq_ignore_ascii_case(table))
            .map(|(_, columns)| columns)
    }

    pub fn is_empty(&self) -> bool {
        self.tables.values().all(|columns| columns.is_empty())
    }
}

/// Condition groups joined with `OR`. Empty means no conditions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShardingConditions {
    conditions: Vec<ShardingCondition>,
}

impl ShardingConditions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, condition: ShardingCondition) {
        self.conditions.push(condition);
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ShardingCondition> {
        self.conditions.iter()
    }
}

impl From<ShardingCondition> for ShardingConditions {
    fn from(condition: ShardingCondition) -> Self {
        Self {
            conditions: vec![condition],
        }
    }
}

impl From<Vec<ShardingCondition>> for ShardingConditions {
    fn from(conditions: Vec<ShardingCondition>) -> Self {
        Self { conditions }
    }
}
