use super::{Error, HintAlgorithm, Shard, Value};

/// Hint values name the shards directly: an integer is the shard
/// number, a string is the target name.
#[derive(Debug, Default, Clone, Copy)]
pub struct HintValue;

impl HintAlgorithm for HintValue {
    fn shard_hint(&self, targets: &[String], values: &[Value]) -> Result<Shard, Error> {
        let mut shards = vec![];

        for value in values {
            match value {
                Value::Integer(shard) => {
                    if let Ok(shard) = usize::try_from(*shard) {
                        shards.push(shard);
                    }
                }
                Value::String(name) => {
                    if let Some(shard) = targets.iter().position(|t| t.eq_ignore_ascii_case(name)) {
                        shards.push(shard);
                    }
                }
                Value::Uuid(_) => return Err(Error::InvalidValue(value.clone(), "hint_value")),
            }
        }

        shards.sort_unstable();
        shards.dedup();

        Ok(Shard::Multi(shards))
    }
}
