//! Hash-based sharding.

use sha1::{Digest, Sha1};

use super::{Error, PreciseAlgorithm, RangeAlgorithm, Shard, Value, ValueRange};

/// Hash a value with SHA-1, keeping the first 8 bytes.
pub fn sha1(value: &Value) -> u64 {
    let mut hasher = Sha1::new();
    hasher.update(value.bytes());
    let hash = hasher.finalize();
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&hash[..8]);
    u64::from_be_bytes(prefix)
}

/// SHA-1 of the value modulo the number of targets.
#[derive(Debug, Default, Clone, Copy)]
pub struct HashModulo;

impl PreciseAlgorithm for HashModulo {
    fn shard_value(&self, targets: &[String], value: &Value) -> Result<Shard, Error> {
        if targets.is_empty() {
            return Ok(Shard::none());
        }

        Ok(Shard::Direct((sha1(value) % targets.len() as u64) as usize))
    }
}

/// Hashing doesn't preserve order, so any range can be anywhere.
impl RangeAlgorithm for HashModulo {
    fn shard_range(&self, _targets: &[String], _range: &ValueRange) -> Result<Shard, Error> {
        Ok(Shard::All)
    }
}
