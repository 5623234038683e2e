use thiserror::Error;

use super::Value;

#[derive(Debug, Error)]
pub enum Error {
    #[error("sharding key value {0} isn't valid for the \"{1}\" algorithm")]
    InvalidValue(Value, &'static str),

    #[error("range is overlapping or incorrect")]
    IncorrectRange,

    #[error("expression \"{0}\": {1}")]
    InvalidExpression(String, String),

    #[error("\"{0}\" algorithm doesn't support {1} sharding")]
    Unsupported(&'static str, &'static str),
}
