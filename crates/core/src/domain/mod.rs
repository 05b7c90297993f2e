// Domain Layer - Pure business logic and entities

pub mod capability;
pub mod error;
pub mod invocation;
pub mod payload;
pub mod schema;

// Re-exports
pub use capability::{Capability, ParamSpec, Presence};
pub use error::DomainError;
pub use invocation::{InvocationRequest, QueryParams};
pub use payload::{OutputProtocol, Payload, DEFAULT_RESULT_MARKER};
pub use schema::{FieldKind, FieldSpec, ResultSchema, Violation};
