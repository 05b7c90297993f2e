// Model Invoker Port
// Capability boundary: positional arguments in, one structured payload out

use crate::domain::{InvocationRequest, Payload};
use async_trait::async_trait;
use thiserror::Error;

/// Captured result of one script process
#[derive(Debug, Clone)]
pub struct InvocationOutput {
    pub status: InvocationStatus,
    pub duration_ms: i64,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl InvocationOutput {
    /// Stdout on a zero exit, otherwise the exit code and stderr as an error
    pub fn into_stdout(self) -> Result<String, InvocationError> {
        match self.status {
            InvocationStatus::Success => Ok(self.stdout),
            InvocationStatus::Failed => Err(InvocationError::NonZeroExit {
                code: self.exit_code,
                stderr: self.stderr,
            }),
        }
    }
}

/// Process exit classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvocationStatus {
    Success,
    Failed,
}

/// Failure to turn captured stdout into a payload
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Script produced no output line")]
    EmptyOutput,

    #[error("No line starting with result marker '{0}'")]
    MarkerNotFound(String),

    #[error("Result line is not valid JSON ({source}): {line}")]
    InvalidJson {
        line: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Invocation errors
#[derive(Error, Debug)]
pub enum InvocationError {
    #[error("Spawn failed: {0}")]
    SpawnFailed(String),

    #[error("Script exited with code {code:?}: {stderr}")]
    NonZeroExit { code: Option<i32>, stderr: String },

    #[error("Script timeout after {0}ms")]
    Timeout(u64),

    #[error("IO error: {0}")]
    IoError(String),

    #[error("Model endpoint returned status {status}")]
    Remote { status: u16 },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Extraction failed: {0}")]
    Extraction(#[from] ExtractionError),
}

/// Model Invoker trait
///
/// Implementations:
/// - ProcessInvoker: spawns the capability's script and extracts its result line
/// - HttpModelInvoker: posts the arguments to a model-serving endpoint
#[async_trait]
pub trait ModelInvoker: Send + Sync {
    /// Run the capability once and return its structured result
    ///
    /// # Errors
    /// - InvocationError::SpawnFailed if the script cannot be started
    /// - InvocationError::NonZeroExit if the script exits unsuccessfully
    /// - InvocationError::Timeout if the configured bound elapses
    /// - InvocationError::Extraction if no valid result line is found
    async fn invoke(&self, request: &InvocationRequest) -> Result<Payload, InvocationError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::{Arc, Mutex};
    /// Mock invoker behavior
    #[derive(Debug, Clone)]
    pub enum MockBehavior {
        /// Always return this payload
        Respond(serde_json::Value),
        /// Always fail to spawn with message
        Fail(String),
        /// Exit with the given non-zero code
        Exit(i32),
        /// Produce an unparseable result line
        Malformed(String),
        /// Timeout after N ms
        Timeout(u64),
    }
    /// Mock Model Invoker, also usable as a spy
    pub struct MockModelInvoker {
        behavior: Arc<Mutex<MockBehavior>>,
        requests: Arc<Mutex<Vec<InvocationRequest>>>,
    }
    impl MockModelInvoker {
        pub fn new(behavior: MockBehavior) -> Self {
            Self {
                behavior: Arc::new(Mutex::new(behavior)),
                requests: Arc::new(Mutex::new(Vec::new())),
            }
        }
        pub fn new_respond(value: serde_json::Value) -> Self {
            Self::new(MockBehavior::Respond(value))
        }
        pub fn call_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
        pub fn requests(&self) -> Vec<InvocationRequest> {
            self.requests.lock().unwrap().clone()
        }
    }
    #[async_trait]
    impl ModelInvoker for MockModelInvoker {
        async fn invoke(&self, request: &InvocationRequest) -> Result<Payload, InvocationError> {
            self.requests.lock().unwrap().push(request.clone());

            let behavior = self.behavior.lock().unwrap().clone();

            match behavior {
                MockBehavior::Respond(value) => Ok(Payload::new(value)),
                MockBehavior::Fail(msg) => Err(InvocationError::SpawnFailed(msg)),
                MockBehavior::Exit(code) => Err(InvocationError::NonZeroExit {
                    code: Some(code),
                    stderr: "mock failure".to_string(),
                }),
                MockBehavior::Malformed(line) => {
                    let source = serde_json::from_str::<serde_json::Value>(&line)
                        .err()
                        .unwrap_or_else(|| serde_json::from_str::<serde_json::Value>("{").unwrap_err());
                    Err(ExtractionError::InvalidJson { line, source }.into())
                }
                MockBehavior::Timeout(ms) => Err(InvocationError::Timeout(ms)),
            }
        }
    }
}
