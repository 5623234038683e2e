//! Configuration errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Toml(#[from] toml::de::Error),

    #[error("config parse error on line {line}, column {column}: {message}")]
    Parse {
        line: usize,
        column: usize,
        message: String,
    },

    #[error("inline expression \"{expression}\": {reason}")]
    InlineExpression { expression: String, reason: String },
}

impl Error {
    /// Attach the position of a TOML error to the message,
    /// so users know where to look.
    pub fn config(source: &str, err: toml::de::Error) -> Self {
        let Some(span) = err.span() else {
            return Self::Toml(err);
        };

        let before = &source[..span.start.min(source.len())];
        let line = before.matches('\n').count() + 1;
        let column = before
            .rfind('\n')
            .map(|newline| before.len() - newline)
            .unwrap_or(before.len() + 1);

        Self::Parse {
            line,
            column,
            message: err.message().to_string(),
        }
    }

    pub(crate) fn inline(expression: &str, reason: impl ToString) -> Self {
        Self::InlineExpression {
            expression: expression.to_string(),
            reason: reason.to_string(),
        }
    }
}
