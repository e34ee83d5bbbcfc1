//! # Admin HTTP Server
//!
//! Combines the table and observability routers, request logging and CORS.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Request, State},
    http::HeaderValue,
    middleware::{self, Next},
    response::Response,
    Router,
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use uuid::Uuid;

use crate::backend::Backend;
use crate::observability::{log_event, Event};

use super::config::AdminConfig;
use super::observability_routes::{health_routes, observability_routes};
use super::state::AdminState;
use super::table_routes::table_routes;

/// Admin API server
pub struct AdminServer {
    config: AdminConfig,
    state: Arc<AdminState>,
    router: Router,
}

impl AdminServer {
    /// Create a server over an already constructed backend handle
    pub fn new(backend: Arc<dyn Backend>, config: AdminConfig) -> Self {
        let state = Arc::new(AdminState::new(backend, &config));
        let router = Self::build_router(&config, Arc::clone(&state));
        Self {
            config,
            state,
            router,
        }
    }

    fn build_router(config: &AdminConfig, state: Arc<AdminState>) -> Router {
        let cors = if config.cors_origins.is_empty() {
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        } else {
            let origins: Vec<HeaderValue> = config
                .cors_origins
                .iter()
                .filter_map(|s| s.parse().ok())
                .collect();

            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods(Any)
                .allow_headers(Any)
        };

        Router::new()
            .merge(health_routes())
            .nest("/observability", observability_routes(Arc::clone(&state)))
            .nest("/tables", table_routes(Arc::clone(&state)))
            .layer(middleware::from_fn_with_state(state, log_requests))
            .layer(cors)
    }

    /// Get the socket address
    pub fn socket_addr(&self) -> String {
        self.config.socket_addr()
    }

    pub fn state(&self) -> &Arc<AdminState> {
        &self.state
    }

    /// Token that stops the server and cancels in-flight scans
    pub fn shutdown_token(&self) -> CancellationToken {
        self.state.shutdown.clone()
    }

    /// Get the router (for testing)
    pub fn router(self) -> Router {
        self.router
    }

    /// Serve until Ctrl-C or until the shutdown token is cancelled
    pub async fn start(self) -> Result<(), std::io::Error> {
        let addr = self.config.socket_addr();
        let listener = TcpListener::bind(&addr).await?;
        log_event(
            Event::ServerListening,
            &[("addr", addr.as_str()), ("endpoint", self.config.backend.endpoint.as_str())],
        );

        let shutdown = self.state.shutdown.clone();
        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = shutdown.cancelled() => {}
                }
                shutdown.cancel();
            })
            .await?;

        log_event(Event::Shutdown, &[("addr", addr.as_str())]);
        Ok(())
    }
}

/// Log one line per request and tag the response with a request id
async fn log_requests(State(state): State<Arc<AdminState>>, request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let request_id = Uuid::new_v4().to_string();
    let started = Instant::now();

    let mut response = next.run(request).await;

    state.metrics.increment_requests_handled();
    let status = response.status().as_u16().to_string();
    let elapsed = started.elapsed().as_millis().to_string();
    log_event(
        Event::RequestHandled,
        &[
            ("method", method.as_str()),
            ("path", path.as_str()),
            ("status", status.as_str()),
            ("duration_ms", elapsed.as_str()),
            ("request_id", request_id.as_str()),
        ],
    );

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert("x-request-id", value);
    }
    response
}
