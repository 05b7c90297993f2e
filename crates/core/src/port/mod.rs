// Port Layer - Interfaces for external dependencies

pub mod chat_completion;
pub mod id_provider; // For deterministic testing
pub mod model_invoker;
pub mod time_provider;

// Re-exports
pub use chat_completion::{ChatCompletion, ChatError};
pub use id_provider::IdProvider;
pub use model_invoker::{
    ExtractionError, InvocationError, InvocationOutput, InvocationStatus, ModelInvoker,
};
pub use time_provider::TimeProvider;
