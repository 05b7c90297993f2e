// GreenEarth Infrastructure - System Adapters
// Implements: ModelInvoker over local scripts

pub mod process_invoker;
pub mod process_runner;

pub use process_invoker::{ProcessInvoker, ScriptRegistry};
pub use process_runner::{ProcessRunner, ProcessRunnerConfig};
