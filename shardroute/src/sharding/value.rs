use std::fmt::Display;
use std::ops::Bound;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use shardroute_config::FlexibleType;
use uuid::Uuid;

/// Value of a sharding column, as extracted from the statement.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Integer(i64),
    Uuid(Uuid),
    String(String),
}

impl Value {
    pub fn integer(&self) -> Option<i64> {
        match self {
            Self::Integer(integer) => Some(*integer),
            _ => None,
        }
    }

    pub fn varchar(&self) -> Option<&str> {
        match self {
            Self::String(varchar) => Some(varchar.as_str()),
            _ => None,
        }
    }

    pub fn uuid(&self) -> Option<Uuid> {
        match self {
            Self::Uuid(uuid) => Some(*uuid),
            _ => None,
        }
    }

    /// Bytes used for hashing. Stable across releases.
    pub fn bytes(&self) -> Vec<u8> {
        match self {
            Self::Integer(integer) => integer.to_be_bytes().to_vec(),
            Self::Uuid(uuid) => uuid.as_bytes().to_vec(),
            Self::String(varchar) => varchar.as_bytes().to_vec(),
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Integer(integer) => write!(f, "{}", integer),
            Self::Uuid(uuid) => write!(f, "{}", uuid),
            Self::String(varchar) => write!(f, "'{}'", varchar),
        }
    }
}

/// Guess the type from text: BIGINT first, then UUID, then VARCHAR.
impl FromStr for Value {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(if let Ok(integer) = s.parse::<i64>() {
            Self::Integer(integer)
        } else if let Ok(uuid) = s.parse::<Uuid>() {
            Self::Uuid(uuid)
        } else {
            Self::String(s.to_string())
        })
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Integer(value as i64)
    }
}

impl From<Uuid> for Value {
    fn from(value: Uuid) -> Self {
        Self::Uuid(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<FlexibleType> for Value {
    fn from(value: FlexibleType) -> Self {
        match value {
            FlexibleType::Integer(integer) => Self::Integer(integer),
            FlexibleType::Uuid(uuid) => Self::Uuid(uuid),
            FlexibleType::String(varchar) => Self::String(varchar),
        }
    }
}

/// Interval of values, e.g. `BETWEEN 1 AND 5` or `> 10`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueRange {
    lower: Bound<Value>,
    upper: Bound<Value>,
}

impl ValueRange {
    pub fn new(lower: Bound<Value>, upper: Bound<Value>) -> Self {
        Self { lower, upper }
    }

    /// `BETWEEN start AND end`.
    pub fn closed(start: impl Into<Value>, end: impl Into<Value>) -> Self {
        Self::new(Bound::Included(start.into()), Bound::Included(end.into()))
    }

    /// `>= start`.
    pub fn at_least(start: impl Into<Value>) -> Self {
        Self::new(Bound::Included(start.into()), Bound::Unbounded)
    }

    /// `< end`.
    pub fn less_than(end: impl Into<Value>) -> Self {
        Self::new(Bound::Unbounded, Bound::Excluded(end.into()))
    }

    pub fn lower(&self) -> &Bound<Value> {
        &self.lower
    }

    pub fn upper(&self) -> &Bound<Value> {
        &self.upper
    }

    pub fn contains(&self, value: &Value) -> bool {
        let above = match &self.lower {
            Bound::Included(lower) => value >= lower,
            Bound::Excluded(lower) => value > lower,
            Bound::Unbounded => true,
        };
        let below = match &self.upper {
            Bound::Included(upper) => value <= upper,
            Bound::Excluded(upper) => value < upper,
            Bound::Unbounded => true,
        };
        above && below
    }

    /// Does this range intersect `[start, end)`? Missing ends are unbounded.
    pub fn overlaps(&self, start: Option<&Value>, end: Option<&Value>) -> bool {
        let below_end = match (end, &self.lower) {
            (None, _) | (_, Bound::Unbounded) => true,
            (Some(end), Bound::Included(lower)) | (Some(end), Bound::Excluded(lower)) => {
                lower < end
            }
        };
        let above_start = match (start, &self.upper) {
            (None, _) | (_, Bound::Unbounded) => true,
            (Some(start), Bound::Included(upper)) => upper >= start,
            (Some(start), Bound::Excluded(upper)) => upper > start,
        };
        below_end && above_start
    }

    /// Inclusive integer bounds, `None` for unbounded ends.
    /// Returns `None` if a bound isn't an integer. An empty range has
    /// `lower > upper`.
    pub fn integer_bounds(&self) -> Option<(Option<i64>, Option<i64>)> {
        const EMPTY: (Option<i64>, Option<i64>) = (Some(i64::MAX), Some(i64::MIN));

        let lower = match &self.lower {
            Bound::Included(value) => Some(value.integer()?),
            Bound::Excluded(value) => match value.integer()?.checked_add(1) {
                Some(lower) => Some(lower),
                None => return Some(EMPTY),
            },
            Bound::Unbounded => None,
        };
        let upper = match &self.upper {
            Bound::Included(value) => Some(value.integer()?),
            Bound::Excluded(value) => match value.integer()?.checked_sub(1) {
                Some(upper) => Some(upper),
                None => return Some(EMPTY),
            },
            Bound::Unbounded => None,
        };
        Some((lower, upper))
    }
}

impl Display for ValueRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.lower {
            Bound::Included(lower) => write!(f, "[{}", lower)?,
            Bound::Excluded(lower) => write!(f, "({}", lower)?,
            Bound::Unbounded => write!(f, "(-∞")?,
        }
        write!(f, ", ")?;
        match &self.upper {
            Bound::Included(upper) => write!(f, "{}]", upper),
            Bound::Excluded(upper) => write!(f, "{})", upper),
            Bound::Unbounded => write!(f, "+∞)"),
        }
    }
}

/// Predicate on one sharding column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConditionValue {
    /// `column = value`
    Precise(Value),
    /// `column IN (values)`
    List(Vec<Value>),
    /// `column BETWEEN a AND b`, `column > a`, ...
    Range(ValueRange),
}

impl From<Value> for ConditionValue {
    fn from(value: Value) -> Self {
        Self::Precise(value)
    }
}

impl From<Vec<Value>> for ConditionValue {
    fn from(values: Vec<Value>) -> Self {
        Self::List(values)
    }
}

impl From<ValueRange> for ConditionValue {
    fn from(range: ValueRange) -> Self {
        Self::Range(range)
    }
}
