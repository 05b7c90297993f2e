// Chat relay handler

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use tracing::debug;

use greenearth_core::application::ChatReply;

use crate::error::{message, ApiError};
use crate::state::ApiState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
}

pub async fn chat(
    State(state): State<ApiState>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatReply>, ApiError> {
    let text = match body {
        Ok(Json(ChatRequest {
            message: Some(text),
        })) => text,
        Ok(_) => return Err(ApiError::BadRequest(message::MESSAGE_REQUIRED.to_string())),
        Err(rejection) => {
            debug!(error = %rejection, "Unreadable chat body");
            return Err(ApiError::BadRequest(message::MESSAGE_REQUIRED.to_string()));
        }
    };

    Ok(Json(state.chat.reply(&text).await?))
}
