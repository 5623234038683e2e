use super::{Error, TableRule};

/// Logical tables that are always sharded the same way,
/// so joins between them stay on one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingTableGroup {
    tables: Vec<String>,
}

impl BindingTableGroup {
    pub fn new(tables: impl IntoIterator<Item = impl ToString>) -> Self {
        Self {
            tables: tables.into_iter().map(|t| t.to_string()).collect(),
        }
    }

    pub fn tables(&self) -> &[String] {
        &self.tables
    }

    pub fn contains(&self, table: &str) -> bool {
        self.tables.iter().any(|t| t.eq_ignore_ascii_case(table))
    }

    /// Member tables must have the same shape: same number of nodes,
    /// same data sources, same number of actual tables on each.
    pub(crate) fn validate(&self, rules: &[&TableRule]) -> Result<(), Error> {
        let Some((primary, members)) = rules.split_first() else {
            return Ok(());
        };

        for member in members {
            let mismatch = || Error::BindingMismatch {
                primary: primary.logic_table().to_string(),
                table: member.logic_table().to_string(),
            };

            if member.actual_data_nodes().len() != primary.actual_data_nodes().len()
                || member.data_sources().len() != primary.data_sources().len()
            {
                return Err(mismatch());
            }

            for data_source in primary.data_sources() {
                if member.actual_tables_on(data_source).len()
                    != primary.actual_tables_on(data_source).len()
                {
                    return Err(mismatch());
                }
            }
        }

        Ok(())
    }
}

/// Actual table of `member` that sits at the same position on `data_source`
/// as `actual_table` does for `primary`.
pub fn binding_actual_table(
    primary: &TableRule,
    member: &TableRule,
    data_source: &str,
    actual_table: &str,
) -> Result<String, Error> {
    let missing = || Error::MissingBindingNode {
        table: member.logic_table().to_string(),
        node: format!("{}.{}", data_source, actual_table),
    };

    let position = primary
        .actual_tables_on(data_source)
        .iter()
        .position(|table| *table == actual_table)
        .ok_or_else(missing)?;

    member
        .actual_tables_on(data_source)
        .get(position)
        .map(|table| table.to_string())
        .ok_or_else(missing)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::rule::DataNode;

    fn rule(name: &str, nodes: &[&str]) -> TableRule {
        TableRule::new(
            name,
            nodes.iter().map(|n| n.parse::<DataNode>().unwrap()),
        )
        .unwrap()
    }

    #[test]
    fn test_positional_lookup() {
        let order = rule("t_order", &["ds_0.t_order_0", "ds_0.t_order_1", "ds_1.t_order_0", "ds_1.t_order_1"]);
        let item = rule("t_order_item", &["ds_0.t_item_a", "ds_0.t_item_b", "ds_1.t_item_a", "ds_1.t_item_b"]);

        assert_eq!(binding_actual_table(&order, &item, "ds_1", "t_order_1").unwrap(), "t_item_b");
        assert_eq!(binding_actual_table(&order, &item, "ds_0", "t_order_0").unwrap(), "t_item_a");
        assert!(matches!(
            binding_actual_table(&order, &item, "ds_2", "t_order_0"),
            Err(Error::MissingBindingNode { .. })
        ));
    }

    #[test]
    fn test_validate() {
        let order = rule("t_order", &["ds_0.t_order_0", "ds_1.t_order_1"]);
        let item = rule("t_order_item", &["ds_0.t_order_item_0", "ds_1.t_order_item_1"]);
        let group = BindingTableGroup::new(["t_order", "t_order_item"]);
        assert!(group.validate(&[&order, &item]).is_ok());
        assert!(group.contains("T_ORDER_ITEM"));

        let lopsided = rule("t_order_item", &["ds_0.t_order_item_0", "ds_0.t_order_item_1"]);
        assert!(matches!(
            group.validate(&[&order, &lopsided]),
            Err(Error::BindingMismatch { primary, table }) if primary == "t_order" && table == "t_order_item"
        ));

        let short = rule("t_order_item", &["ds_0.t_order_item_0"]);
        assert!(group.validate(&[&order, &short]).is_err());
    }
}
