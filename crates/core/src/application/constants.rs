// Application constants
use std::time::Duration;

/// Default bound on a single script invocation (2 minutes)
/// Model training inside the scripts dominates this budget
pub const DEFAULT_SCRIPT_TIMEOUT_MS: u64 = 120_000;

/// Grace period between SIGTERM and SIGKILL for a timed-out script (5 seconds)
pub const GRACEFUL_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Default bound on a chat completion round trip (60 seconds)
pub const DEFAULT_CHAT_TIMEOUT_MS: u64 = 60_000;

/// Reply used when the model answers with empty content
pub const FALLBACK_CHAT_REPLY: &str = "Sorry, I didn't catch that. Could you try again?";

/// Time allowed for in-flight HTTP requests after a shutdown signal
pub const SERVER_SHUTDOWN_GRACE: Duration = Duration::from_secs(5);
