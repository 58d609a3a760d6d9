use thiserror::Error;

/// Errors surfaced by the storage, engine and service layers.
#[derive(Error, Debug)]
pub enum PantryError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Not permitted: {0}")]
    Forbidden(String),

    #[error("Already exists: {0}")]
    Conflict(String),

    #[error("AI recipe suggestions are not configured")]
    SuggestionsUnavailable,

    #[error("AI recipe suggestions failed")]
    Suggestions(#[source] anyhow::Error),
}

impl PantryError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}

pub type Result<T, E = PantryError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn suggestion_failure_keeps_the_cause_as_source() {
        let err = PantryError::Suggestions(anyhow::anyhow!("connection refused"));
        assert_eq!(err.to_string(), "AI recipe suggestions failed");
        let source = err.source().expect("cause is attached");
        assert_eq!(source.to_string(), "connection refused");

        let chained = format!("{:#}", anyhow::Error::new(err));
        assert_eq!(chained.matches("connection refused").count(), 1);
    }
}
