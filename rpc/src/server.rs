//! Axum router and HTTP server.

use std::future::Future;
use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use presence_verification::CheckinEngine;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::info;

use crate::handlers::{self, USER_ID_HEADER, USER_ROLE_HEADER};
use crate::{RpcError, RpcMetrics};

/// Shared state for every handler.
pub struct AppState {
    pub engine: Arc<CheckinEngine>,
    pub metrics: Arc<RpcMetrics>,
}

impl AppState {
    pub fn new(engine: Arc<CheckinEngine>, metrics: Arc<RpcMetrics>) -> Self {
        Self { engine, metrics }
    }

    /// Count an error response before handing the result back.
    pub(crate) fn observe<T>(&self, result: Result<T, RpcError>) -> Result<T, RpcError> {
        if let Err(e) = &result {
            self.metrics.record_error(e);
        }
        result
    }
}

pub fn build_router(state: Arc<AppState>, enable_metrics: bool, cors: Option<CorsLayer>) -> Router {
    let mut router = Router::new()
        .route("/checkin/code", post(handlers::check_code))
        .route("/checkin/gps", post(handlers::check_gps))
        .route("/checkin/receipt", post(handlers::check_receipt))
        .route("/checkin/commit", post(handlers::commit_checkin))
        .route("/checkin/status/:venue_id", get(handlers::checkin_status))
        .route("/health", get(handlers::health));
    if enable_metrics {
        router = router.route("/metrics", get(handlers::metrics));
    }
    let router = router.with_state(state);
    match cors {
        Some(layer) => router.layer(layer),
        None => router,
    }
}

/// CORS policy from configured origins. Empty means no CORS layer.
pub fn cors_layer(origins: &[String]) -> Result<Option<CorsLayer>, RpcError> {
    let origins: Vec<&str> = origins
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();
    if origins.is_empty() {
        return Ok(None);
    }

    let allow_origin = if origins.contains(&"*") {
        AllowOrigin::any()
    } else {
        let origins = origins
            .iter()
            .map(|s| {
                s.parse::<HeaderValue>()
                    .map_err(|e| RpcError::Config(format!("invalid CORS origin {s:?}: {e}")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        AllowOrigin::list(origins)
    };

    Ok(Some(
        CorsLayer::new()
            .allow_origin(allow_origin)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([
                axum::http::header::CONTENT_TYPE,
                HeaderName::from_static(USER_ID_HEADER),
                HeaderName::from_static(USER_ROLE_HEADER),
            ]),
    ))
}

pub struct RpcServer {
    pub port: u16,
    router: Router,
}

impl RpcServer {
    pub fn new(port: u16, router: Router) -> Self {
        Self { port, router }
    }

    /// Serve until `shutdown` resolves.
    pub async fn start<F>(self, shutdown: F) -> Result<(), RpcError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = format!("0.0.0.0:{}", self.port);
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| RpcError::Server(format!("bind {addr}: {e}")))?;
        info!("HTTP API listening on {}", addr);
        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| RpcError::Server(e.to_string()))
    }
}
