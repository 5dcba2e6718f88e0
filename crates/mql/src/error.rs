use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    #[error("invalid operator: {0}")]
    InvalidOperator(String),

    #[error("invalid regex {pattern:?}: {source}")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("text index required for $text query")]
    TextIndexRequired,

    #[error("invalid sort spec: {0}")]
    InvalidSort(String),

    #[error("invalid projection: {0}")]
    InvalidProjection(String),
}

impl QueryError {
    #[inline]
    pub fn filter(msg: impl Into<String>) -> Self {
        QueryError::InvalidFilter(msg.into())
    }
}
