// Process Invoker (ModelInvoker over local scripts)

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use tracing::debug;

use greenearth_core::application::extract_payload;
use greenearth_core::domain::{Capability, InvocationRequest, OutputProtocol, Payload};
use greenearth_core::port::{InvocationError, ModelInvoker};

use crate::process_runner::ProcessRunner;

/// Maps each capability to the script that implements it
#[derive(Debug, Clone)]
pub struct ScriptRegistry {
    dir: PathBuf,
    overrides: HashMap<Capability, PathBuf>,
}

impl ScriptRegistry {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            overrides: HashMap::new(),
        }
    }

    /// Replace the default script of one capability.
    /// Relative paths are resolved against the script directory.
    pub fn with_override(mut self, capability: Capability, script: impl Into<PathBuf>) -> Self {
        self.overrides.insert(capability, script.into());
        self
    }

    pub fn resolve(&self, capability: Capability) -> PathBuf {
        match self.overrides.get(&capability) {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => self.dir.join(path),
            None => self.dir.join(capability.default_script()),
        }
    }
}

/// Runs the capability's script and extracts the payload from its stdout
pub struct ProcessInvoker {
    runner: ProcessRunner,
    scripts: ScriptRegistry,
    protocol: OutputProtocol,
}

impl ProcessInvoker {
    pub fn new(runner: ProcessRunner, scripts: ScriptRegistry, protocol: OutputProtocol) -> Self {
        Self {
            runner,
            scripts,
            protocol,
        }
    }
}

#[async_trait]
impl ModelInvoker for ProcessInvoker {
    async fn invoke(&self, request: &InvocationRequest) -> Result<Payload, InvocationError> {
        let script = self.scripts.resolve(request.capability());
        let stdout = self.runner.run(&script, request.args()).await?;

        debug!(
            capability = %request.capability(),
            stdout_bytes = stdout.len(),
            "Extracting result"
        );

        Ok(extract_payload(&stdout, &self.protocol)?)
    }
}
