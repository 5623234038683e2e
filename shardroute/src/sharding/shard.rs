use std::collections::BTreeSet;
use std::fmt::Display;

/// Shards selected by an algorithm, as indexes into the
/// list of available targets (data sources or tables).
#[derive(Debug, Clone, PartialEq, PartialOrd, Ord, Eq, Hash, Default)]
pub enum Shard {
    /// Direct-to-shard number.
    Direct(usize),
    /// Multiple shards, enumerated. Empty if nothing matched.
    Multi(Vec<usize>),
    /// All shards.
    #[default]
    All,
}

impl Display for Shard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Direct(shard) => shard.to_string(),
                Self::Multi(shards) => format!("{:?}", shards),
                Self::All => "all".into(),
            }
        )
    }
}

impl Shard {
    /// No shard matched.
    pub fn none() -> Self {
        Self::Multi(vec![])
    }

    /// Returns true if this is an all-shard result.
    pub fn is_all(&self) -> bool {
        matches!(self, Shard::All)
    }

    /// Returns true if nothing matched.
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Multi(shards) if shards.is_empty())
    }

    /// Resolve to concrete indexes. Indexes past `targets` are dropped.
    pub fn indexes(&self, targets: usize) -> BTreeSet<usize> {
        match self {
            Self::Direct(shard) => Some(*shard).into_iter().filter(|s| *s < targets).collect(),
            Self::Multi(shards) => shards.iter().copied().filter(|s| *s < targets).collect(),
            Self::All => (0..targets).collect(),
        }
    }
}

impl From<Option<usize>> for Shard {
    fn from(value: Option<usize>) -> Self {
        if let Some(value) = value {
            Shard::Direct(value)
        } else {
            Shard::none()
        }
    }
}

impl From<usize> for Shard {
    fn from(value: usize) -> Self {
        Shard::Direct(value)
    }
}

impl From<Vec<usize>> for Shard {
    fn from(value: Vec<usize>) -> Self {
        Shard::Multi(value)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_indexes() {
        assert_eq!(Shard::Direct(1).indexes(3), BTreeSet::from([1]));
        assert!(Shard::Direct(3).indexes(3).is_empty());
        assert_eq!(Shard::Multi(vec![2, 0, 2, 7]).indexes(3), BTreeSet::from([0, 2]));
        assert_eq!(Shard::All.indexes(2), BTreeSet::from([0, 1]));
        assert!(Shard::none().is_empty());
        assert!(Shard::none().indexes(4).is_empty());
    }

    #[test]
    fn test_display() {
        assert_eq!(Shard::Direct(2).to_string(), "2");
        assert_eq!(Shard::Multi(vec![0, 1]).to_string(), "[0, 1]");
        assert_eq!(Shard::All.to_string(), "all");
    }
}
