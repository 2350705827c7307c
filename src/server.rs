use std::{net::SocketAddr, path::Path};

use anyhow::Context;
use axum::{
    middleware::{from_fn, from_fn_with_state},
    Router,
};
use serde::Deserialize;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    decompression::RequestDecompressionLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};

use crate::{
    error::ErrorVerbosity,
    middleware::{
        cors_headers::cors_headers, method_not_allowed::method_not_allowed, not_found::not_found,
        trace_response_body::trace_response_body, unsupported_media_type::unsupported_media_type,
    },
    route,
    state::ApiState,
    store::StoreConfig,
};

#[derive(Debug, thiserror::Error)]
pub enum ServerConfigError {
    #[error("Failed to read config file: {0}")]
    Read(#[source] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    Parse(#[source] serde_yaml::Error),
}

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    socket_address: SocketAddr,
    #[serde(default)]
    error_verbosity: ErrorVerbosity,
    /// Logs every response body at trace level.
    #[serde(default)]
    trace_response_body: bool,
    #[serde(default)]
    store: StoreConfig,
}

impl ServerConfig {
    pub async fn from_config_file(path: impl AsRef<Path>) -> Result<Self, ServerConfigError> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(ServerConfigError::Read)?;

        serde_yaml::from_str(&content).map_err(ServerConfigError::Parse)
    }
}

/// Builds the application with every route and middleware.
pub fn app(state: ApiState, trace_body: bool) -> Router {
    let mut router = Router::new()
        .nest("/books", route::books::app::app())
        .fallback(not_found)
        .layer(from_fn_with_state(
            state.clone(),
            method_not_allowed::<ApiState>,
        ));

    if trace_body {
        router = router.layer(from_fn_with_state(state.clone(), trace_response_body));
    }

    router.with_state(state.clone()).layer(
        ServiceBuilder::new()
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(DefaultMakeSpan::new().level(tracing::Level::INFO))
                    .on_request(DefaultOnRequest::new().level(tracing::Level::INFO))
                    .on_response(DefaultOnResponse::new().level(tracing::Level::INFO)),
            )
            .layer(from_fn(cors_headers))
            .layer(CorsLayer::permissive())
            .layer(from_fn_with_state(
                state,
                unsupported_media_type::<ApiState>,
            ))
            .layer(RequestDecompressionLayer::new())
            .layer(CompressionLayer::new()),
    )
}

pub struct Server {
    config: ServerConfig,
}

impl Server {
    pub fn new(config: ServerConfig) -> Self {
        Self { config }
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let store = self
            .config
            .store
            .open()
            .await
            .context("Failed to open book store")?;

        let state = ApiState::new(self.config.error_verbosity, store);

        let app = app(state, self.config.trace_response_body);

        tracing::info!(addr = %self.config.socket_address, "Starting server");

        let listener = TcpListener::bind(&self.config.socket_address)
            .await
            .context("Bind failed")?;

        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server failed")?;

        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(%err, "Failed to listen for CTRL+C");

            std::future::pending::<()>().await;
        }

        tracing::info!("CTRL+C received");
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;

                tracing::info!("SIGTERM received");
            }
            Err(err) => {
                tracing::error!(%err, "Failed to install SIGTERM signal handler");

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

    tracing::info!("Shutting down");
}
