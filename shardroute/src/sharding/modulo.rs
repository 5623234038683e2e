//! Modulo sharding.

use indexmap::IndexMap;

use super::{
    ComplexAlgorithm, ConditionValue, Error, PreciseAlgorithm, RangeAlgorithm, Shard, Value,
    ValueRange,
};

/// Integer value modulo the number of targets.
#[derive(Debug, Default, Clone, Copy)]
pub struct Modulo;

impl Modulo {
    fn shard(value: i64, targets: usize) -> Shard {
        if targets == 0 {
            return Shard::none();
        }

        Shard::Direct(value.rem_euclid(targets as i64) as usize)
    }
}

impl PreciseAlgorithm for Modulo {
    fn shard_value(&self, targets: &[String], value: &Value) -> Result<Shard, Error> {
        let integer = value
            .integer()
            .ok_or_else(|| Error::InvalidValue(value.clone(), "mod"))?;
        Ok(Self::shard(integer, targets.len()))
    }
}

impl RangeAlgorithm for Modulo {
    fn shard_range(&self, targets: &[String], range: &ValueRange) -> Result<Shard, Error> {
        let (lower, upper) = range
            .integer_bounds()
            .ok_or(Error::Unsupported("mod", "non-integer range"))?;

        match (lower, upper) {
            (Some(lower), Some(upper)) => {
                if lower > upper {
                    return Ok(Shard::none());
                }

                // Narrower than the number of targets: enumerate.
                let width = (upper as i128) - (lower as i128) + 1;
                if width < targets.len() as i128 {
                    let mut shards: Vec<usize> = (lower..=upper)
                        .flat_map(|value| Self::shard(value, targets.len()).indexes(targets.len()))
                        .collect();
                    shards.sort_unstable();
                    shards.dedup();
                    Ok(Shard::Multi(shards))
                } else {
                    Ok(Shard::All)
                }
            }
            _ => Ok(Shard::All),
        }
    }
}

/// Sum of the sharding columns' integer values modulo the number of targets.
///
/// Every combination of the columns' values is tried. A range on any
/// column, or a column without a value, selects all targets.
#[derive(Debug, Default, Clone, Copy)]
pub struct ComplexModulo;

impl ComplexAlgorithm for ComplexModulo {
    fn shard_columns(
        &self,
        targets: &[String],
        columns: &[String],
        values: &IndexMap<String, ConditionValue>,
    ) -> Result<Shard, Error> {
        let complete = columns
            .iter()
            .all(|column| values.keys().any(|c| c.eq_ignore_ascii_case(column)));
        if !complete {
            return Ok(Shard::All);
        }

        let mut sums = vec![0i64];

        for value in values.values() {
            let values = match value {
                ConditionValue::Precise(value) => std::slice::from_ref(value),
                ConditionValue::List(values) => values.as_slice(),
                ConditionValue::Range(_) => return Ok(Shard::All),
            };

            let mut next = Vec::with_capacity(sums.len() * values.len());
            for value in values {
                let integer = value
                    .integer()
                    .ok_or_else(|| Error::InvalidValue(value.clone(), "complex_mod"))?;
                next.extend(sums.iter().map(|sum| sum.wrapping_add(integer)));
            }
            sums = next;
        }

        let mut shards: Vec<usize> = sums
            .into_iter()
            .flat_map(|sum| Modulo::shard(sum, targets.len()).indexes(targets.len()))
            .collect();
        shards.sort_unstable();
        shards.dedup();

        Ok(Shard::Multi(shards))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn targets(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("t_{}", i)).collect()
    }

    #[test]
    fn test_precise() {
        let targets = targets(4);
        assert_eq!(Modulo.shard_value(&targets, &10.into()).unwrap(), Shard::Direct(2));
        assert_eq!(Modulo.shard_value(&targets, &(-1).into()).unwrap(), Shard::Direct(3));
        assert!(Modulo.shard_value(&[], &1.into()).unwrap().is_empty());
        assert!(matches!(
            Modulo.shard_value(&targets, &"abc".into()),
            Err(Error::InvalidValue(_, "mod"))
        ));
    }

    #[test]
    fn test_range() {
        let targets = targets(4);
        assert_eq!(
            Modulo.shard_range(&targets, &ValueRange::closed(3, 4)).unwrap(),
            Shard::Multi(vec![0, 3])
        );
        assert_eq!(
            Modulo.shard_range(&targets, &ValueRange::closed(0, 10)).unwrap(),
            Shard::All
        );
        assert_eq!(
            Modulo.shard_range(&targets, &ValueRange::at_least(1)).unwrap(),
            Shard::All
        );
        assert!(Modulo
            .shard_range(&targets, &ValueRange::closed(5, 1))
            .unwrap()
            .is_empty());

        let above_max = ValueRange::new(
            std::ops::Bound::Excluded(i64::MAX.into()),
            std::ops::Bound::Unbounded,
        );
        assert!(Modulo.shard_range(&targets, &above_max).unwrap().is_empty());
    }

    #[test]
    fn test_complex() {
        let targets = targets(4);
        let columns = IndexMap::from([
            ("user_id".to_string(), ConditionValue::Precise(1.into())),
            (
                "order_id".to_string(),
                ConditionValue::List(vec![2.into(), 3.into()]),
            ),
        ]);
        let names = vec!["user_id".to_string(), "order_id".to_string()];
        assert_eq!(
            ComplexModulo.shard_columns(&targets, &names, &columns).unwrap(),
            Shard::Multi(vec![0, 3])
        );

        let partial = IndexMap::from([("user_id".to_string(), ConditionValue::Precise(1.into()))]);
        assert_eq!(
            ComplexModulo.shard_columns(&targets, &names, &partial).unwrap(),
            Shard::All
        );

        let columns = IndexMap::from([
            (
                "user_id".to_string(),
                ConditionValue::Range(ValueRange::closed(1, 2)),
            ),
            ("order_id".to_string(), ConditionValue::Precise(1.into())),
        ]);
        assert_eq!(
            ComplexModulo.shard_columns(&targets, &names, &columns).unwrap(),
            Shard::All
        );
    }
}
