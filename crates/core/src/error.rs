use chrono::NaiveDate;

use crate::types::DbId;
use crate::validation::ValidationError;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {}", summarize(.0))]
    Validation(Vec<ValidationError>),

    #[error("Daily limit exceeded on {date}: {message}")]
    DailyCapExceeded { date: NaiveDate, message: String },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Storage error: {0}")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl CoreError {
    /// Shorthand for a single field-level validation failure.
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        CoreError::Validation(vec![ValidationError::new(field, message)])
    }

    /// Wrap an infrastructure error without altering it.
    pub fn storage<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        CoreError::Storage(Box::new(err))
    }

    /// Whether the caller should surface this as a 422-class rejection.
    pub fn is_unprocessable(&self) -> bool {
        matches!(
            self,
            CoreError::Validation(_) | CoreError::DailyCapExceeded { .. }
        )
    }
}

fn summarize(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

pub type CoreResult<T> = Result<T, CoreError>;
