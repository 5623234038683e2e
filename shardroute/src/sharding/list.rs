use std::collections::BTreeMap;

use shardroute_config::ListMapping;

use super::{Error, PreciseAlgorithm, RangeAlgorithm, Shard, Value, ValueRange};

/// Explicit value to shard mapping.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ListShards {
    mapping: BTreeMap<Value, usize>,
}

impl ListShards {
    pub fn new(mappings: &[ListMapping]) -> Self {
        let mut mapping = BTreeMap::new();

        for map in mappings {
            for value in &map.values {
                mapping.insert(Value::from(value.clone()), map.shard);
            }
        }

        Self { mapping }
    }

    pub fn is_empty(&self) -> bool {
        self.mapping.is_empty()
    }

    /// Add a value, replacing its previous shard.
    pub fn insert(&mut self, value: impl Into<Value>, shard: usize) {
        self.mapping.insert(value.into(), shard);
    }
}

impl PreciseAlgorithm for ListShards {
    fn shard_value(&self, _targets: &[String], value: &Value) -> Result<Shard, Error> {
        Ok(self.mapping.get(value).copied().into())
    }
}

/// Every listed value inside the range.
impl RangeAlgorithm for ListShards {
    fn shard_range(&self, _targets: &[String], range: &ValueRange) -> Result<Shard, Error> {
        let mut shards: Vec<usize> = self
            .mapping
            .iter()
            .filter(|(value, _)| range.contains(value))
            .map(|(_, shard)| *shard)
            .collect();
        shards.sort_unstable();
        shards.dedup();

        Ok(Shard::Multi(shards))
    }
}
