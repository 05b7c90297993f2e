// Application Layer - Use Cases and Business Logic

pub mod chat;
pub mod constants;
pub mod extractor;
pub mod prediction;

// Re-exports
pub use chat::{ChatReply, ChatService};
pub use extractor::extract_payload;
pub use prediction::{PredictionOptions, PredictionService};
