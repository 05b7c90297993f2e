// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Missing required query parameters: {}", .0.join(", "))]
    MissingParameters(Vec<String>),

    #[error("Result of {capability} violates schema: field '{field}' must be {expected}")]
    SchemaViolation {
        capability: String,
        field: String,
        expected: String,
    },
}

pub type Result<T> = std::result::Result<T, DomainError>;
