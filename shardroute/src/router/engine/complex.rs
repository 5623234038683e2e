//! Join tables that aren't bound to each other.

use tracing::debug;

use super::RouteGroup;
use crate::router::{Error, RouteMapper};

/// Keep data sources present in every group. On each, combine every
/// combination of every group with each other.
pub fn route(groups: Vec<RouteGroup>) -> Result<RouteGroup, Error> {
    let tables: Vec<String> = groups
        .iter()
        .flat_map(|group| group.tables().iter().cloned())
        .collect();

    let Some((first, rest)) = groups.split_first() else {
        return Ok(RouteGroup::default());
    };

    let mut result = RouteGroup::new(tables.clone());

    for (data_source, combinations) in first.units() {
        let mut product: Vec<Vec<RouteMapper>> = combinations.clone();
        let mut feasible = true;

        for group in rest {
            let Some(others) = group.combinations(data_source) else {
                feasible = false;
                break;
            };

            product = product
                .iter()
                .flat_map(|left| {
                    others.iter().map(move |right| {
                        let mut combination = left.clone();
                        combination.extend(right.iter().cloned());
                        combination
                    })
                })
                .collect();
        }

        if feasible {
            for combination in product {
                result.push(data_source, combination);
            }
        }
    }

    if result.is_empty() {
        return Err(Error::CannotJoin(tables));
    }

    debug!(
        "{:?} joined on {} data sources",
        tables,
        result.units().len()
    );

    Ok(result)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::rule::DataNode;

    fn group(table: &str, nodes: &[(&str, &str)]) -> RouteGroup {
        let nodes: Vec<DataNode> = nodes.iter().map(|(d, t)| DataNode::new(d, t)).collect();
        RouteGroup::from_nodes(table, &nodes)
    }

    #[test]
    fn test_common_data_source() {
        let a = group("a", &[("ds0", "a_0"), ("ds1", "a_1")]);
        let b = group("b", &[("ds1", "b_1"), ("ds2", "b_2")]);

        let joined = route(vec![a, b]).unwrap();
        assert_eq!(joined.units().len(), 1);
        assert_eq!(
            joined.combinations("ds1").unwrap(),
            &[vec![RouteMapper::new("a", "a_1"), RouteMapper::new("b", "b_1")]]
        );
        assert!(joined.combinations("ds0").is_none());
        assert!(joined.combinations("ds2").is_none());
    }

    #[test]
    fn test_disjoint() {
        let a = group("a", &[("ds0", "a_0")]);
        let b = group("b", &[("ds1", "b_1")]);

        assert!(matches!(
            route(vec![a, b]),
            Err(Error::CannotJoin(tables)) if tables == vec!["a", "b"]
        ));
    }

    #[test]
    fn test_cartesian() {
        let a = group("a", &[("ds0", "a_0"), ("ds0", "a_1")]);
        let b = group("b", &[("ds0", "b_0"), ("ds0", "b_1")]);
        let c = group("c", &[("ds0", "c")]);

        let joined = route(vec![a, b, c]).unwrap();
        let combinations = joined.combinations("ds0").unwrap();
        assert_eq!(combinations.len(), 4);
        assert_eq!(
            combinations[1],
            vec![
                RouteMapper::new("a", "a_0"),
                RouteMapper::new("b", "b_1"),
                RouteMapper::new("c", "c")
            ]
        );
    }
}
