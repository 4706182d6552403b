//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the relay route
//! - Wire up middleware (tracing, request ID, deadline, concurrency, nosniff)
//! - Bind server to a plain or TLS listener
//! - Map relay outcomes to responses, logs and metrics

use axum::{
    extract::State,
    http::{header::X_CONTENT_TYPE_OPTIONS, HeaderMap, HeaderValue, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use axum_server::tls_rustls::RustlsConfig;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    set_header::SetResponseHeaderLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::RelayServiceConfig;
use crate::http::request::{request_id, UuidRequestId};
use crate::observability::metrics;
use crate::relay::{RelayGate, RelayPolicy, ReqwestUpstream, Upstream, UpstreamError};

/// How long in-flight requests may drain after a TLS shutdown signal.
const TLS_DRAIN_SECS: u64 = 30;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub gate: Arc<RelayGate>,
}

/// HTTP server for the relay.
pub struct HttpServer {
    router: Router,
    config: RelayServiceConfig,
}

impl HttpServer {
    /// Create a server that fetches through the given upstream.
    pub fn new(config: RelayServiceConfig, upstream: Arc<dyn Upstream>) -> Self {
        let policy = RelayPolicy::from_config(&config.relay, &config.timeouts);
        Self::with_policy(config, policy, upstream)
    }

    /// Create a server with an explicit policy.
    pub fn with_policy(config: RelayServiceConfig, policy: RelayPolicy, upstream: Arc<dyn Upstream>) -> Self {
        let state = AppState {
            gate: Arc::new(RelayGate::new(policy, upstream)),
        };

        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Create a server backed by the production `reqwest` upstream.
    pub fn from_config(config: RelayServiceConfig) -> Result<Self, UpstreamError> {
        let upstream = ReqwestUpstream::new(Duration::from_secs(config.timeouts.connect_secs))?;
        Ok(Self::new(config, Arc::new(upstream)))
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &RelayServiceConfig, state: AppState) -> Router {
        Router::new()
            .route(&config.relay.route, get(relay_handler))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(GlobalConcurrencyLimitLayer::new(config.listener.max_connections))
            .layer(SetResponseHeaderLayer::if_not_present(
                X_CONTENT_TYPE_OPTIONS,
                HeaderValue::from_static("nosniff"),
            ))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
    }

    /// The fully layered router, for serving or in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server on a plain TCP listener until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            route = %self.config.relay.route,
            "HTTP server starting"
        );

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Run the server with TLS until `shutdown` fires.
    pub async fn run_tls(
        self,
        addr: SocketAddr,
        tls: RustlsConfig,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        tracing::info!(
            address = %addr,
            route = %self.config.relay.route,
            "HTTPS server starting"
        );

        let handle = axum_server::Handle::new();
        let signal_handle = handle.clone();
        tokio::spawn(async move {
            let _ = shutdown.recv().await;
            tracing::info!("Shutdown signal received");
            signal_handle.graceful_shutdown(Some(Duration::from_secs(TLS_DRAIN_SECS)));
        });

        axum_server::bind_rustls(addr, tls)
            .handle(handle)
            .serve(self.router.into_make_service())
            .await?;

        tracing::info!("HTTPS server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &RelayServiceConfig {
        &self.config
    }
}

/// Relay endpoint handler.
async fn relay_handler(State(state): State<AppState>, headers: HeaderMap, uri: Uri) -> Response {
    let started = Instant::now();
    let request_id = request_id(&headers).to_string();

    match state.gate.relay(uri.query()).await {
        Ok(response) => {
            tracing::info!(
                request_id = %request_id,
                status = %response.status(),
                content_length = ?response.headers().get(axum::http::header::CONTENT_LENGTH),
                "Relaying upstream PDF"
            );
            metrics::record_request("relayed", response.status().as_u16(), started);
            response
        }
        Err(err) => {
            let status = err.status_code();
            match std::error::Error::source(&err) {
                Some(cause) => tracing::warn!(
                    request_id = %request_id,
                    kind = err.kind().as_str(),
                    status = %status,
                    reason = %err,
                    cause = %cause,
                    "Relay rejected request"
                ),
                None => tracing::warn!(
                    request_id = %request_id,
                    kind = err.kind().as_str(),
                    status = %status,
                    reason = %err,
                    "Relay rejected request"
                ),
            }
            metrics::record_request(err.kind().as_str(), status.as_u16(), started);
            err.into_response()
        }
    }
}
