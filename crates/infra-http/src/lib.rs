// GreenEarth Infrastructure - HTTP Adapters
// Implements: ChatCompletion (OpenAI), ModelInvoker (remote endpoint)

pub mod http_invoker;
pub mod openai_chat;

pub use http_invoker::HttpModelInvoker;
pub use openai_chat::{OpenAiChatClient, OpenAiConfig};
