use std::fmt::Display;
use std::str::FromStr;

use serde::Serialize;

use super::Error;

/// One physical table on one data source.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct DataNode {
    pub data_source: String,
    pub table: String,
}

impl DataNode {
    pub fn new(data_source: impl ToString, table: impl ToString) -> Self {
        Self {
            data_source: data_source.to_string(),
            table: table.to_string(),
        }
    }

    /// Same node, ignoring ASCII case.
    pub fn matches(&self, data_source: &str, table: &str) -> bool {
        self.data_source.eq_ignore_ascii_case(data_source) && self.table.eq_ignore_ascii_case(table)
    }
}

/// `data_source.table`. The table part may contain dots.
impl FromStr for DataNode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.split_once('.') {
            Some((data_source, table)) if !data_source.is_empty() && !table.is_empty() => {
                Ok(Self::new(data_source.trim(), table.trim()))
            }
            _ => Err(Error::InvalidDataNode(s.to_string())),
        }
    }
}

impl Display for DataNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.data_source, self.table)
    }
}
