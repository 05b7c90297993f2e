// Chat Completion Port
// Relay of a single user message to a third-party language model

use async_trait::async_trait;
use thiserror::Error;

/// Chat relay errors
#[derive(Error, Debug)]
pub enum ChatError {
    #[error("Chat completion API key is not configured")]
    NotConfigured,

    #[error("Completion API returned status {status}")]
    Upstream {
        status: u16,
        details: serde_json::Value,
    },

    #[error("Completion API returned no choices")]
    EmptyResponse,

    #[error("Transport error: {0}")]
    Transport(String),
}

#[async_trait]
pub trait ChatCompletion: Send + Sync {
    /// Send one user message and return the first choice's content
    ///
    /// Returns an empty string when the first choice carries no content.
    async fn complete(&self, message: &str) -> Result<String, ChatError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::{Arc, Mutex};
    /// Mock chat behavior
    #[derive(Debug, Clone)]
    pub enum MockChatBehavior {
        Reply(String),
        Upstream(u16, serde_json::Value),
        Empty,
        Transport(String),
        NotConfigured,
    }
    /// Mock ChatCompletion recording every message it receives
    pub struct MockChatCompletion {
        behavior: MockChatBehavior,
        messages: Arc<Mutex<Vec<String>>>,
    }
    impl MockChatCompletion {
        pub fn new(behavior: MockChatBehavior) -> Self {
            Self {
                behavior,
                messages: Arc::new(Mutex::new(Vec::new())),
            }
        }
        pub fn new_reply(reply: impl Into<String>) -> Self {
            Self::new(MockChatBehavior::Reply(reply.into()))
        }
        pub fn messages(&self) -> Vec<String> {
            self.messages.lock().unwrap().clone()
        }
    }
    #[async_trait]
    impl ChatCompletion for MockChatCompletion {
        async fn complete(&self, message: &str) -> Result<String, ChatError> {
            self.messages.lock().unwrap().push(message.to_string());

            match self.behavior.clone() {
                MockChatBehavior::Reply(reply) => Ok(reply),
                MockChatBehavior::Upstream(status, details) => {
                    Err(ChatError::Upstream { status, details })
                }
                MockChatBehavior::Empty => Err(ChatError::EmptyResponse),
                MockChatBehavior::Transport(msg) => Err(ChatError::Transport(msg)),
                MockChatBehavior::NotConfigured => Err(ChatError::NotConfigured),
            }
        }
    }
}
