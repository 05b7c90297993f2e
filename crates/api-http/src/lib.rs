//! REST API Layer
//!
//! Endpoint adapters translating HTTP requests into prediction and chat use cases.
//! Errors become HTTP responses only in [`error::ApiError`].

pub mod chat;
pub mod error;
pub mod handler;
pub mod plots;
pub mod server;
pub mod state;

pub use error::ApiError;
pub use server::{build_router, HttpServer, HttpServerConfig, ServerHandle};
pub use state::ApiState;
