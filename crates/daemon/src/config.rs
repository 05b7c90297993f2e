//! Gateway configuration
//!
//! Layers, lowest precedence first: built-in defaults, optional TOML file
//! (`greenearth.toml` or `$GREENEARTH_CONFIG`), `GREENEARTH__SECTION__KEY`
//! environment variables, then the legacy `PORT` and `OPENAI_API_KEY` variables.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;

use greenearth_core::application::constants::{DEFAULT_CHAT_TIMEOUT_MS, DEFAULT_SCRIPT_TIMEOUT_MS};
use greenearth_core::domain::{Capability, OutputProtocol, DEFAULT_RESULT_MARKER};
use greenearth_infra_http::openai_chat::{DEFAULT_OPENAI_MODEL, DEFAULT_OPENAI_URL};

const DEFAULT_CONFIG_FILE: &str = "greenearth.toml";
const CONFIG_PATH_VAR: &str = "GREENEARTH_CONFIG";
const ENV_PREFIX: &str = "GREENEARTH";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub server: ServerConfig,
    pub scripts: ScriptsConfig,
    pub invoker: InvokerConfig,
    pub predictions: PredictionsConfig,
    pub chat: ChatConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub plots_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            plots_dir: PathBuf::from("plots"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputProtocolKind {
    LastLine,
    Marker,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScriptsConfig {
    pub interpreter: String,
    pub dir: PathBuf,
    /// 0 disables the bound
    pub timeout_ms: u64,
    pub output_protocol: OutputProtocolKind,
    pub marker: String,
    pub env_allowlist: Vec<String>,
    /// Capability id -> script path (relative paths resolve against `dir`)
    pub overrides: HashMap<String, PathBuf>,
}

impl Default for ScriptsConfig {
    fn default() -> Self {
        Self {
            interpreter: "python3".to_string(),
            dir: PathBuf::from("scripts"),
            timeout_ms: DEFAULT_SCRIPT_TIMEOUT_MS,
            output_protocol: OutputProtocolKind::LastLine,
            marker: DEFAULT_RESULT_MARKER.to_string(),
            env_allowlist: ["PATH", "HOME", "USER", "LANG", "PYTHONPATH", "VIRTUAL_ENV"]
                .into_iter()
                .map(String::from)
                .collect(),
            overrides: HashMap::new(),
        }
    }
}

impl ScriptsConfig {
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms))
    }

    pub fn output_protocol(&self) -> OutputProtocol {
        match self.output_protocol {
            OutputProtocolKind::LastLine => OutputProtocol::LastLine,
            OutputProtocolKind::Marker => OutputProtocol::Marker(self.marker.clone()),
        }
    }

    /// Overrides keyed by capability, rejecting unknown ids
    pub fn capability_overrides(&self) -> Result<Vec<(Capability, PathBuf)>> {
        self.overrides
            .iter()
            .map(|(id, path)| match Capability::from_id(id) {
                Some(capability) => Ok((capability, path.clone())),
                None => bail!("scripts.overrides: unknown capability '{id}'"),
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvokerMode {
    #[default]
    Process,
    Http,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InvokerConfig {
    pub mode: InvokerMode,
    pub base_url: Option<String>,
    /// 0 disables the bound
    pub timeout_ms: u64,
}

impl Default for InvokerConfig {
    fn default() -> Self {
        Self {
            mode: InvokerMode::Process,
            base_url: None,
            timeout_ms: DEFAULT_SCRIPT_TIMEOUT_MS,
        }
    }
}

impl InvokerConfig {
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PredictionsConfig {
    pub validate_results: bool,
}

impl Default for PredictionsConfig {
    fn default() -> Self {
        Self {
            validate_results: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    pub api_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout_ms: u64,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_OPENAI_URL.to_string(),
            model: DEFAULT_OPENAI_MODEL.to_string(),
            api_key: None,
            timeout_ms: DEFAULT_CHAT_TIMEOUT_MS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub format: LogFormat,
}

impl GatewayConfig {
    /// Load configuration from every layer and validate it
    pub fn load() -> Result<Self> {
        // .env is optional
        let _ = dotenv::dotenv();

        let explicit = std::env::var(CONFIG_PATH_VAR).ok();
        let file = explicit.as_deref().unwrap_or(DEFAULT_CONFIG_FILE);

        let raw = Config::builder()
            .add_source(File::new(file, FileFormat::Toml).required(explicit.is_some()))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("scripts.env_allowlist"),
            )
            .build()
            .with_context(|| format!("Failed to load configuration from {file}"))?;

        let mut config: Self = raw
            .try_deserialize()
            .context("Invalid configuration")?;

        config.apply_legacy_env(
            std::env::var("PORT").ok().as_deref(),
            std::env::var("OPENAI_API_KEY").ok().as_deref(),
        )?;
        config.validate()?;

        Ok(config)
    }

    /// `PORT` always wins; `OPENAI_API_KEY` fills an unset key
    pub fn apply_legacy_env(&mut self, port: Option<&str>, api_key: Option<&str>) -> Result<()> {
        if let Some(port) = port.map(str::trim).filter(|p| !p.is_empty()) {
            self.server.port = port
                .parse()
                .with_context(|| format!("PORT is not a valid port: {port}"))?;
        }

        let key_missing = self
            .chat
            .api_key
            .as_deref()
            .map_or(true, |k| k.trim().is_empty());
        if key_missing {
            if let Some(key) = api_key.filter(|k| !k.trim().is_empty()) {
                self.chat.api_key = Some(key.to_string());
            }
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            bail!("server.port must be non-zero");
        }

        match self.invoker.mode {
            InvokerMode::Process => {
                if self.scripts.interpreter.trim().is_empty() {
                    bail!("scripts.interpreter must not be empty");
                }
                if self.scripts.output_protocol == OutputProtocolKind::Marker
                    && self.scripts.marker.trim().is_empty()
                {
                    bail!("scripts.marker must not be empty with the marker protocol");
                }
                self.scripts.capability_overrides()?;
            }
            InvokerMode::Http => {
                let base_url = self.invoker.base_url.as_deref().unwrap_or_default();
                if base_url.trim().is_empty() {
                    bail!("invoker.base_url is required when invoker.mode = \"http\"");
                }
            }
        }

        if self.chat.timeout_ms == 0 {
            bail!("chat.timeout_ms must be greater than zero");
        }

        Ok(())
    }
}
