//! API Error Types
//!
//! Maps application errors to HTTP status codes and the JSON error envelope.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use greenearth_core::domain::{Capability, DomainError};
use greenearth_core::port::ChatError;
use greenearth_core::AppError;
use serde_json::{json, Value};

/// Public messages (the envelope never carries internal detail)
pub mod message {
    pub const INTERNAL: &str = "An internal server error occurred";
    pub const MESSAGE_REQUIRED: &str = "Message is required";
    pub const CHAT_NOT_CONFIGURED: &str = "Chat relay is not configured";
    pub const CHAT_UPSTREAM: &str = "Failed to fetch from OpenAI API";
    pub const CHAT_INVALID_RESPONSE: &str = "Invalid response from OpenAI";
    pub const CHAT_FAILED: &str = "Something went wrong with the chatbot API.";
    pub const PLOT_NOT_FOUND: &str = "Plot not found";
    pub const INVALID_PLOT_NAME: &str = "Invalid plot name";
}

/// Error returned by every handler
#[derive(Debug)]
pub enum ApiError {
    /// Caller error, message is shown as-is
    BadRequest(String),

    NotFound(String),

    /// Upstream service failure forwarded with its own status and body
    Upstream {
        status: StatusCode,
        message: String,
        details: Value,
    },

    /// Server-side failure; `detail` is logged, only `message` reaches the caller
    Internal { message: String, detail: String },
}

impl ApiError {
    pub fn internal(message: impl Into<String>, detail: impl ToString) -> Self {
        ApiError::Internal {
            message: message.into(),
            detail: detail.to_string(),
        }
    }

    /// Map a prediction failure: caller errors keep their message, everything
    /// else collapses into the capability's generic failure message
    pub fn from_prediction(capability: Capability, err: AppError) -> Self {
        match err {
            AppError::Validation(msg) => ApiError::BadRequest(msg),
            AppError::Domain(e @ DomainError::MissingParameters(_)) => {
                ApiError::BadRequest(e.to_string())
            }
            other => ApiError::Internal {
                message: capability.failure_message().to_string(),
                detail: format!("{capability}: {other}"),
            },
        }
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::Validation(msg) => ApiError::BadRequest(msg),
            AppError::Domain(e @ DomainError::MissingParameters(_)) => {
                ApiError::BadRequest(e.to_string())
            }
            AppError::Chat(e) => e.into(),
            other => ApiError::internal(message::INTERNAL, other),
        }
    }
}

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::NotConfigured => ApiError::internal(message::CHAT_NOT_CONFIGURED, err),
            ChatError::Upstream { status, details } => ApiError::Upstream {
                status: StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY),
                message: message::CHAT_UPSTREAM.to_string(),
                details,
            },
            ChatError::EmptyResponse => ApiError::internal(message::CHAT_INVALID_RESPONSE, err),
            ChatError::Transport(_) => ApiError::internal(message::CHAT_FAILED, err),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, json!({ "error": message })),
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, json!({ "error": message })),
            ApiError::Upstream {
                status,
                message,
                details,
            } => {
                tracing::warn!(status = status.as_u16(), details = %details, "Upstream error");
                (status, json!({ "error": message, "details": details }))
            }
            ApiError::Internal { message, detail } => {
                tracing::error!(error = %detail, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": message }))
            }
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use greenearth_core::port::InvocationError;

    #[test]
    fn test_missing_parameters_are_bad_request() {
        let err = AppError::from(DomainError::MissingParameters(vec!["humidity".to_string()]));

        match ApiError::from_prediction(Capability::AirQuality, err) {
            ApiError::BadRequest(msg) => {
                assert_eq!(msg, "Missing required query parameters: humidity")
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_invocation_failure_uses_capability_message() {
        let err = AppError::from(InvocationError::Timeout(120_000));

        match ApiError::from_prediction(Capability::Newsfeed, err) {
            ApiError::Internal { message, detail } => {
                assert_eq!(message, "Failed to fetch newsfeed data.");
                assert!(detail.contains("120000ms"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_chat_upstream_keeps_status() {
        let err = ChatError::Upstream {
            status: 429,
            details: json!({"error": "slow down"}),
        };

        let response = ApiError::from(err).into_response();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[test]
    fn test_internal_hides_detail() {
        let response = ApiError::internal("Failed to process request.", "stack trace").into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
