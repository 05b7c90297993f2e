// Central Error Type for the Application

use thiserror::Error;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Domain error: {0}")]
    Domain(#[from] crate::domain::DomainError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invocation error: {0}")]
    Invocation(#[from] crate::port::InvocationError),

    #[error("Chat error: {0}")]
    Chat(#[from] crate::port::ChatError),
}

impl AppError {
    /// True when the caller, not the backend, is at fault
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AppError::Validation(_)
                | AppError::Domain(crate::domain::DomainError::MissingParameters(_))
        )
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
