//! HTTP Server
//!
//! Builds the axum router and runs it on a bound listener until stopped.

use std::net::SocketAddr;

use axum::http::{header, Method};
use axum::routing::{get, post};
use axum::Router;
use greenearth_core::domain::{Capability, QueryParams};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

use crate::handler::{self, route_path};
use crate::state::ApiState;
use crate::{chat, plots};

const DEFAULT_HTTP_HOST: &str = "0.0.0.0";
const DEFAULT_HTTP_PORT: u16 = 5000;

/// HTTP Server Configuration
#[derive(Debug, Clone)]
pub struct HttpServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HTTP_HOST.to_string(),
            port: DEFAULT_HTTP_PORT,
        }
    }
}

impl HttpServerConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Router with every REST route
pub fn build_router(state: ApiState) -> Router {
    let mut router = Router::new()
        .route("/health", get(handler::health))
        .route("/api/chat", post(chat::chat))
        .route("/plots/:file", get(plots::plot));

    for capability in Capability::ALL {
        router = router.route(
            route_path(capability),
            get(
                move |state: axum::extract::State<ApiState>,
                      query: axum::extract::Query<QueryParams>| {
                    handler::predict(capability, state, query)
                },
            ),
        );
    }

    router.with_state(state).layer(cors_layer())
}

/// Any origin may call the gateway; the web client is served separately
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

/// Handle to a running server
pub struct ServerHandle {
    local_addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    join: JoinHandle<()>,
}

impl ServerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop accepting connections and wait for in-flight requests
    pub async fn stop(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Err(e) = self.join.await {
            error!(error = %e, "HTTP server task failed");
        }
    }
}

/// HTTP Server
pub struct HttpServer {
    config: HttpServerConfig,
    state: ApiState,
}

impl HttpServer {
    pub fn new(config: HttpServerConfig, state: ApiState) -> Self {
        Self { config, state }
    }

    /// Bind the configured address
    pub async fn bind(&self) -> std::io::Result<TcpListener> {
        TcpListener::bind(self.config.addr()).await
    }

    /// Serve on `listener` in a background task
    pub fn start(self, listener: TcpListener) -> std::io::Result<ServerHandle> {
        let local_addr = listener.local_addr()?;
        let router = build_router(self.state);
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        info!(addr = %local_addr, "Starting HTTP server");

        let join = tokio::spawn(async move {
            let shutdown = async {
                let _ = shutdown_rx.await;
            };
            if let Err(e) = axum::serve(listener, router)
                .with_graceful_shutdown(shutdown)
                .await
            {
                error!(error = %e, "HTTP server stopped with error");
            }
            info!("HTTP server stopped");
        });

        Ok(ServerHandle {
            local_addr,
            shutdown_tx: Some(shutdown_tx),
            join,
        })
    }
}
