// Chat Relay Use Case

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::constants::FALLBACK_CHAT_REPLY;
use crate::error::{AppError, Result};
use crate::port::ChatCompletion;

/// Reply returned to the chat caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    pub reply: String,
}

pub struct ChatService {
    client: Arc<dyn ChatCompletion>,
}

impl ChatService {
    pub fn new(client: Arc<dyn ChatCompletion>) -> Self {
        Self { client }
    }

    /// Relay `message` and return the model's reply
    ///
    /// # Errors
    /// - `AppError::Validation` if the message is blank
    /// - `AppError::Chat` if the completion API fails
    pub async fn reply(&self, message: &str) -> Result<ChatReply> {
        if message.trim().is_empty() {
            return Err(AppError::Validation("Message is required".to_string()));
        }

        let content = self.client.complete(message).await?;

        let reply = if content.trim().is_empty() {
            FALLBACK_CHAT_REPLY.to_string()
        } else {
            content
        };

        info!(reply_len = reply.len(), "Chat reply relayed");
        Ok(ChatReply { reply })
    }
}
