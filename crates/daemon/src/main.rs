//! GreenEarth Gateway - Main Entry Point
//! REST prediction gateway over local model scripts plus a chat relay

mod config;
mod telemetry;

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use greenearth_api_http::{ApiState, HttpServer, HttpServerConfig};
use greenearth_core::application::constants::{GRACEFUL_SHUTDOWN_TIMEOUT, SERVER_SHUTDOWN_GRACE};
use greenearth_core::application::{ChatService, PredictionOptions, PredictionService};
use greenearth_core::port::id_provider::UuidProvider;
use greenearth_core::port::time_provider::SystemTimeProvider;
use greenearth_core::port::{ModelInvoker, TimeProvider};
use greenearth_infra_http::{HttpModelInvoker, OpenAiChatClient, OpenAiConfig};
use greenearth_infra_system::{ProcessInvoker, ProcessRunner, ProcessRunnerConfig, ScriptRegistry};

use crate::config::{GatewayConfig, InvokerMode, LogFormat};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Load configuration (.env, file, environment)
    let config = GatewayConfig::load()?;

    // 2. Initialize logging
    init_tracing(config.logging.format)?;

    info!("GreenEarth gateway v{} starting...", VERSION);

    // 3. Setup dependencies (DI wiring)
    let time_provider: Arc<dyn TimeProvider> = Arc::new(SystemTimeProvider);
    let invoker = build_invoker(&config, time_provider.clone())?;

    let predictions = Arc::new(PredictionService::new(
        invoker,
        Arc::new(UuidProvider),
        time_provider,
        PredictionOptions {
            validate_results: config.predictions.validate_results,
        },
    ));

    if config.chat.api_key.is_none() {
        warn!("OPENAI_API_KEY is not set; /api/chat will answer 500 until it is configured");
    }
    let chat_client = OpenAiChatClient::new(OpenAiConfig {
        api_url: config.chat.api_url.clone(),
        model: config.chat.model.clone(),
        api_key: config.chat.api_key.clone(),
        timeout: std::time::Duration::from_millis(config.chat.timeout_ms),
    })
    .context("Chat client creation failed")?;
    let chat = Arc::new(ChatService::new(Arc::new(chat_client)));

    // 4. Start HTTP server
    let state = ApiState::new(predictions, chat, config.server.plots_dir.clone());
    let server = HttpServer::new(
        HttpServerConfig {
            host: config.server.host.clone(),
            port: config.server.port,
        },
        state,
    );
    let listener = server
        .bind()
        .await
        .with_context(|| format!("Failed to bind {}:{}", config.server.host, config.server.port))?;
    let handle = server.start(listener).context("HTTP server start failed")?;

    info!(addr = %handle.local_addr(), "System ready. Press Ctrl+C to shutdown");

    // 5. Wait for shutdown signal
    tokio::signal::ctrl_c().await?;

    info!("Shutdown signal received. Exiting gracefully...");

    // 6. Graceful shutdown
    if tokio::time::timeout(SERVER_SHUTDOWN_GRACE, handle.stop())
        .await
        .is_err()
    {
        warn!("In-flight requests did not finish in time");
    }

    info!("Shutdown complete.");

    Ok(())
}

/// Registry with env filter, pretty or JSON output, and optional OpenTelemetry
fn init_tracing(format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("greenearth=info"))
        .context("Failed to create env filter")?;

    let fmt_layer = match format {
        // Production: JSON structured logging
        LogFormat::Json => fmt::layer().json().boxed(),
        // Development: Pretty formatting with colors
        LogFormat::Pretty => fmt::layer().pretty().boxed(),
    };

    let (otel_layer, otel_error) = match telemetry::otel_layer() {
        Ok(layer) => (layer, None),
        Err(e) => (None, Some(e)),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .with(otel_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    if let Some(e) = otel_error {
        warn!(error = ?e, "Failed to initialize OpenTelemetry (continuing without it)");
    }

    Ok(())
}

fn build_invoker(
    config: &GatewayConfig,
    time_provider: Arc<dyn TimeProvider>,
) -> Result<Arc<dyn ModelInvoker>> {
    match config.invoker.mode {
        InvokerMode::Process => {
            let scripts_cfg = &config.scripts;
            if !scripts_cfg.dir.is_dir() {
                warn!(dir = %scripts_cfg.dir.display(), "Script directory does not exist");
            }

            let runner = ProcessRunner::new(
                time_provider,
                ProcessRunnerConfig {
                    interpreter: scripts_cfg.interpreter.clone(),
                    timeout: scripts_cfg.timeout(),
                    kill_grace: GRACEFUL_SHUTDOWN_TIMEOUT,
                    env_allowlist: scripts_cfg.env_allowlist.clone(),
                },
            );

            let mut scripts = ScriptRegistry::new(&scripts_cfg.dir);
            for (capability, path) in scripts_cfg.capability_overrides()? {
                scripts = scripts.with_override(capability, path);
            }

            info!(
                interpreter = %scripts_cfg.interpreter,
                dir = %scripts_cfg.dir.display(),
                timeout_ms = scripts_cfg.timeout_ms,
                protocol = ?scripts_cfg.output_protocol,
                "Using process invoker"
            );

            Ok(Arc::new(ProcessInvoker::new(
                runner,
                scripts,
                scripts_cfg.output_protocol(),
            )))
        }
        InvokerMode::Http => {
            let base_url = config
                .invoker
                .base_url
                .clone()
                .context("invoker.base_url is required in http mode")?;

            info!(base_url = %base_url, "Using remote model invoker");

            let invoker = HttpModelInvoker::new(base_url, config.invoker.timeout())
                .context("Remote invoker creation failed")?;
            Ok(Arc::new(invoker))
        }
    }
}
