//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with the proxy handler
//! - Wire up middleware (timeout, request ID, tracing)
//! - Dispatch requests to the routing engine
//! - Forward requests to the route's upstream
//! - Drive every response through the filter pipeline

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue, Request, StatusCode},
    response::Response,
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::ProxyConfig;
use crate::filters::{self, FilterPipeline, RequestState, ResponseHead, UpstreamInfo};
use crate::http::request::{RequestIdExt, RequestIdLayer};
use crate::http::response;
use crate::observability::metrics;
use crate::routing::Router as RouteTable;
use crate::upstream::{self, UpstreamClient, UpstreamOutcome};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub routes: Arc<RouteTable>,
    pub upstream: Arc<UpstreamClient>,
    pub pipeline: Arc<FilterPipeline>,
    /// Server-wide error shield default, used for responses the gateway
    /// generates itself (no matched route).
    pub default_error_shield: bool,
}

/// HTTP server for the gateway proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ProxyConfig) -> Self {
        let routes = Arc::new(RouteTable::from_config(&config));
        let upstream = Arc::new(UpstreamClient::new(&config.timeouts));
        let pipeline = Arc::new(filters::build_pipeline());

        let state = AppState {
            routes,
            upstream,
            pipeline,
            default_error_shield: config.filter.error_shield_enabled,
        };

        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &ProxyConfig, state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.timeouts.request_secs,
            )))
            .layer(RequestIdLayer)
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }
}

const NO_ROUTE_BODY: &str = "no matching route\n";

/// Main proxy handler.
/// Looks up the route, forwards to its upstream, and streams the response
/// back through the filter pipeline.
async fn proxy_handler(
    State(state): State<AppState>,
    request: Request<Body>,
) -> Response<Body> {
    let start = Instant::now();
    let request_id = request.request_id().to_string();
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let host = request
        .headers()
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .map(|h| h.split(':').next().unwrap_or(h).to_string());

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        path = %path,
        "Proxying request"
    );

    let Some(route) = state.routes.match_request(host.as_deref(), &path) else {
        tracing::debug!(request_id = %request_id, path = %path, "No route matched");
        metrics::record_request(&method, StatusCode::NOT_FOUND.as_u16(), "none", start);

        // Locally generated responses still run the full filter pipeline,
        // with no upstream association.
        let local_state = RequestState::new("none", state.default_error_shield);
        return response::emit(
            state.pipeline.clone(),
            local_state,
            local_head(StatusCode::NOT_FOUND, NO_ROUTE_BODY),
            Some(response::static_frames(NO_ROUTE_BODY)),
        );
    };

    let route_name = route.name.clone();
    let mut request_state = RequestState::new(route_name.clone(), route.error_shield_enabled);

    let outbound = match upstream::build_request(request, &route.authority, &request_id) {
        Ok(outbound) => outbound,
        Err(e) => {
            tracing::error!(
                request_id = %request_id,
                route = %route_name,
                error = %e,
                "Failed to build upstream request"
            );
            metrics::record_request(
                &method,
                StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
                &route_name,
                start,
            );
            return response::internal_error();
        }
    };

    match state.upstream.send(outbound).await {
        UpstreamOutcome::Response(upstream_response) => {
            metrics::record_request(
                &method,
                upstream_response.status.as_u16(),
                &route_name,
                start,
            );
            request_state.upstream =
                Some(UpstreamInfo::new(upstream_response.status_line.clone()));

            let head = ResponseHead::from_upstream(
                upstream_response.status,
                upstream_response.headers,
            );
            response::emit(
                state.pipeline.clone(),
                request_state,
                head,
                Some(response::upstream_frames(upstream_response.body)),
            )
        }
        UpstreamOutcome::NoStatusLine { error } => {
            tracing::warn!(
                request_id = %request_id,
                route = %route_name,
                error = %error,
                "Upstream produced no status line"
            );
            metrics::record_upstream_failure(&route_name);
            metrics::record_request(
                &method,
                StatusCode::BAD_GATEWAY.as_u16(),
                &route_name,
                start,
            );
            request_state.upstream = Some(UpstreamInfo::without_status_line());

            response::emit(
                state.pipeline.clone(),
                request_state,
                ResponseHead::new(StatusCode::BAD_GATEWAY),
                None,
            )
        }
    }
}

fn local_head(status: StatusCode, body: &str) -> ResponseHead {
    let mut head = ResponseHead::new(status);
    head.headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    head.content_length = Some(body.len() as u64);
    head
}
