//! Application startup and lifecycle management.

use crate::config::GatewayConfig;
use crate::handlers::{
    health::health_check,
    metrics::metrics,
    search::search,
    sessions::{create_session, get_session, list_sessions},
};
use crate::services::metrics::http_metrics_middleware;
use crate::services::{
    DiscoveryEngineClient, SearchGateway, SearchProvider, SessionRegistry, TokenProvider,
};
use axum::{
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::tracing::request_id_middleware;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: GatewayConfig,
    pub gateway: Arc<SearchGateway>,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .route("/search", post(search))
        .route("/session", post(create_session))
        .route("/session/*id", get(get_session))
        .route("/sessions", get(list_sessions))
        .layer(from_fn(http_metrics_middleware))
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}

/// Application container for managing server lifecycle.
pub struct Application {
    http_port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Build the application with the production credential chain and
    /// Discovery Engine client.
    pub async fn build(config: GatewayConfig) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.discovery.timeout_secs))
            .build()
            .map_err(|e| AppError::ConfigError(anyhow::anyhow!("HTTP client: {}", e)))?;

        let tokens = TokenProvider::from_config(&config.credentials, client.clone());
        let provider: Arc<dyn SearchProvider> =
            Arc::new(DiscoveryEngineClient::new(config.discovery.clone(), client));

        if config.discovery.engine_id.is_none() || config.discovery.project_id.is_none() {
            tracing::warn!("Engine identifiers are incomplete; searches will fail until set");
        }

        Self::build_with(config, tokens, provider).await
    }

    /// Build the application around the given credential chain and provider.
    pub async fn build_with(
        config: GatewayConfig,
        tokens: TokenProvider,
        provider: Arc<dyn SearchProvider>,
    ) -> Result<Self, AppError> {
        tracing::info!(provider = provider.name(), "Initialized search provider");

        let gateway = SearchGateway::new(
            tokens,
            Arc::new(SessionRegistry::new()),
            provider,
            config.search.clone(),
        );

        let state = AppState {
            config: config.clone(),
            gateway: Arc::new(gateway),
        };

        // Bind HTTP listener (port 0 = random port for testing)
        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let http_port = listener.local_addr()?.port();

        tracing::info!("Search gateway listening on port {}", http_port);

        Ok(Self {
            http_port,
            listener,
            state,
        })
    }

    /// Get the HTTP port the server is listening on.
    pub fn http_port(&self) -> u16 {
        self.http_port
    }

    /// Run the application until a shutdown signal arrives.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        let router = build_router(self.state);

        axum::serve(self.listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| {
                tracing::error!("HTTP server error: {}", e);
                std::io::Error::other(format!("HTTP server error: {}", e))
            })
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
