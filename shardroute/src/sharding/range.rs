use shardroute_config::RangeMapping;

use super::{Error, PreciseAlgorithm, RangeAlgorithm, Shard, Value, ValueRange};

/// `[start, end)` intervals mapped to shards.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Ranges {
    ranges: Vec<Range>,
}

impl Ranges {
    pub fn new(mappings: &[RangeMapping]) -> Result<Self, Error> {
        let ranges = Self {
            ranges: mappings.iter().map(Range::new).collect(),
        };

        if ranges.valid() {
            Ok(ranges)
        } else {
            Err(Error::IncorrectRange)
        }
    }

    /// Every interval is non-empty and no two intervals overlap.
    pub fn valid(&self) -> bool {
        if self.ranges.iter().any(|range| !range.valid()) {
            return false;
        }

        for (i, left) in self.ranges.iter().enumerate() {
            for right in &self.ranges[i + 1..] {
                if left.overlaps(right) {
                    return false;
                }
            }
        }

        true
    }
}

impl PreciseAlgorithm for Ranges {
    fn shard_value(&self, _targets: &[String], value: &Value) -> Result<Shard, Error> {
        Ok(self
            .ranges
            .iter()
            .find(|range| range.contains(value))
            .map(|range| range.shard)
            .into())
    }
}

impl RangeAlgorithm for Ranges {
    fn shard_range(&self, _targets: &[String], range: &ValueRange) -> Result<Shard, Error> {
        let mut shards: Vec<usize> = self
            .ranges
            .iter()
            .filter(|r| range.overlaps(r.start.as_ref(), r.end.as_ref()))
            .map(|r| r.shard)
            .collect();
        shards.sort_unstable();
        shards.dedup();

        Ok(Shard::Multi(shards))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Range {
    start: Option<Value>,
    end: Option<Value>,
    shard: usize,
}

impl Range {
    fn new(mapping: &RangeMapping) -> Self {
        Self {
            start: mapping.start.clone().map(Value::from),
            end: mapping.end.clone().map(Value::from),
            shard: mapping.shard,
        }
    }

    fn valid(&self) -> bool {
        match (&self.start, &self.end) {
            (Some(start), Some(end)) => start < end,
            (None, None) => false,
            _ => true,
        }
    }

    fn contains(&self, value: &Value) -> bool {
        let above = self.start.as_ref().map(|start| value >= start).unwrap_or(true);
        let below = self.end.as_ref().map(|end| value < end).unwrap_or(true);
        above && below
    }

    fn overlaps(&self, other: &Range) -> bool {
        let starts_before_other_ends = match (&self.start, &other.end) {
            (Some(start), Some(end)) => start < end,
            _ => true,
        };
        let other_starts_before_end = match (&other.start, &self.end) {
            (Some(start), Some(end)) => start < end,
            _ => true,
        };
        starts_before_other_ends && other_starts_before_end
    }
}
