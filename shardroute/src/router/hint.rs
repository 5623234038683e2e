//! Shard overrides supplied by the caller instead of predicates.
//!
//! A [`Hint`] is a plain value passed to [`Router::route`](super::Router::route).
//! Callers that keep a hint across several statements hold it in a
//! [`HintManager`]; the [`HintGuard`] returned by [`HintManager::set`]
//! clears it when dropped, including on early return and unwinding.

use std::ops::{Deref, DerefMut};

use indexmap::IndexMap;
use tracing::trace;

use crate::sharding::Value;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hint {
    database_only: Option<Vec<Value>>,
    databases: IndexMap<String, Vec<Value>>,
    tables: IndexMap<String, Vec<Value>>,
}

/// Hint values for one table. `None` means the axis isn't hinted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableHint<'a> {
    pub database: Option<&'a [Value]>,
    pub table: Option<&'a [Value]>,
}

impl Hint {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route every table on the database axis only, using `values`.
    pub fn database_only(values: impl IntoIterator<Item = impl Into<Value>>) -> Self {
        Self {
            database_only: Some(values.into_iter().map(Into::into).collect()),
            ..Default::default()
        }
    }

    pub fn add_database_value(&mut self, table: impl ToString, value: impl Into<Value>) {
        push(&mut self.databases, table.to_string(), value.into());
    }

    pub fn add_table_value(&mut self, table: impl ToString, value: impl Into<Value>) {
        push(&mut self.tables, table.to_string(), value.into());
    }

    pub fn with_database_value(mut self, table: impl ToString, value: impl Into<Value>) -> Self {
        self.add_database_value(table, value);
        self
    }

    pub fn with_table_value(mut self, table: impl ToString, value: impl Into<Value>) -> Self {
        self.add_table_value(table, value);
        self
    }

    pub fn is_database_only(&self) -> bool {
        self.database_only.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.database_only.is_none() && self.databases.is_empty() && self.tables.is_empty()
    }

    /// Hint values for `table`, if the table is hinted at all.
    pub fn table(&self, table: &str) -> Option<TableHint<'_>> {
        if let Some(ref values) = self.database_only {
            return Some(TableHint {
                database: Some(values.as_slice()),
                table: None,
            });
        }

        let database = find(&self.databases, table);
        let tables = find(&self.tables, table);

        if database.is_none() && tables.is_none() {
            None
        } else {
            Some(TableHint {
                database,
                table: tables,
            })
        }
    }
}

fn push(map: &mut IndexMap<String, Vec<Value>>, table: String, value: Value) {
    let key = map
        .keys()
        .find(|t| t.eq_ignore_ascii_case(&table))
        .cloned()
        .unwrap_or(table);
    let values = map.entry(key).or_default();
    if !values.contains(&value) {
        values.push(value);
    }
}

fn find<'a>(map: &'a IndexMap<String, Vec<Value>>, table: &str) -> Option<&'a [Value]> {
    map.iter()
        .find(|(t, _)| t.eq_ignore_ascii_case(table))
        .map(|(_, values)| values.as_slice())
}

/// Holds the hint of the current unit of work.
#[derive(Debug, Default)]
pub struct HintManager {
    hint: Option<Hint>,
}

impl HintManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a hint until the guard is dropped.
    pub fn set(&mut self, hint: Hint) -> HintGuard<'_> {
        trace!("hint set");
        self.hint = Some(hint);
        HintGuard { manager: self }
    }

    /// Installed hint. Always `None` outside of a guard's scope.
    pub fn current(&self) -> Option<&Hint> {
        self.hint.as_ref()
    }
}

/// Clears the hint on drop.
#[derive(Debug)]
pub struct HintGuard<'a> {
    manager: &'a mut HintManager,
}

impl HintGuard<'_> {
    pub fn hint(&self) -> Option<&Hint> {
        self.manager.hint.as_ref()
    }
}

impl Deref for HintGuard<'_> {
    type Target = HintManager;

    fn deref(&self) -> &Self::Target {
        self.manager
    }
}

impl DerefMut for HintGuard<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.manager
    }
}

impl Drop for HintGuard<'_> {
    fn drop(&mut self) {
        if self.manager.hint.take().is_some() {
            trace!("hint cleared");
        }
    }
}
