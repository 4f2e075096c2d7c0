//! Upstream exchange.
//!
//! # Responsibilities
//! - Forward client requests to the route's upstream origin
//! - Classify the outcome for the response filter pipeline
//!
//! # Design Decisions
//! - Any client error before a parsable status line (refused connection,
//!   reset, close after partial bytes) is reported as a single coarse
//!   "no status line" outcome; the cases are deliberately not distinguished
//! - A structured upstream response is relayed whatever its status, errors
//!   included

use std::time::Duration;

use axum::body::Body;
use axum::http::uri::{Authority, PathAndQuery, Scheme};
use axum::http::{header, HeaderMap, HeaderValue, Request, StatusCode, Uri, Version};
use hyper::body::Incoming;
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;
use thiserror::Error;

use crate::config::TimeoutConfig;
use crate::http::request::X_REQUEST_ID;

/// Errors building the outbound request. The exchange itself does not
/// error; failures there are part of the outcome classification.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// The rewritten target URI was not valid.
    #[error("failed to build upstream URI: {0}")]
    InvalidTarget(String),
}

/// A structured response relayed from the upstream.
pub struct UpstreamResponse {
    /// Reconstructed status line text, e.g. "HTTP/1.1 404 Not Found".
    pub status_line: String,

    /// Parsed status code.
    pub status: StatusCode,

    /// Response headers, minus hop-by-hop framing headers the gateway
    /// owns itself.
    pub headers: HeaderMap,

    /// Streaming response body.
    pub body: Incoming,
}

/// Result of one upstream exchange.
pub enum UpstreamOutcome {
    /// The backend produced a parsable status line (any status, its own
    /// error statuses included).
    Response(UpstreamResponse),

    /// The connection failed before a status line could be parsed.
    NoStatusLine {
        /// Client error description, for diagnostics only.
        error: String,
    },
}

/// Shared HTTP client for upstream exchanges.
pub struct UpstreamClient {
    client: Client<HttpConnector, Body>,
}

impl UpstreamClient {
    pub fn new(timeouts: &TimeoutConfig) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(Duration::from_secs(timeouts.connect_secs)));

        Self {
            client: Client::builder(TokioExecutor::new()).build(connector),
        }
    }

    /// Perform one exchange and classify the outcome.
    pub async fn send(&self, request: Request<Body>) -> UpstreamOutcome {
        match self.client.request(request).await {
            Ok(response) => {
                let status_line = status_line_of(response.version(), response.status());
                let (parts, body) = response.into_parts();

                let mut headers = parts.headers;
                // The gateway re-frames the body itself; backend framing
                // headers must not leak through.
                headers.remove(header::TRANSFER_ENCODING);
                headers.remove(header::CONNECTION);

                UpstreamOutcome::Response(UpstreamResponse {
                    status_line,
                    status: parts.status,
                    headers,
                    body,
                })
            }
            Err(e) => UpstreamOutcome::NoStatusLine {
                error: e.to_string(),
            },
        }
    }
}

/// Rewrite a client request into the outbound upstream request: http
/// scheme, the route's authority, HTTP/1.1, request ID propagated.
pub fn build_request(
    request: Request<Body>,
    authority: &Authority,
    request_id: &str,
) -> Result<Request<Body>, UpstreamError> {
    let (mut parts, body) = request.into_parts();

    let mut uri_parts = parts.uri.into_parts();
    uri_parts.scheme = Some(Scheme::HTTP);
    uri_parts.authority = Some(authority.clone());
    if uri_parts.path_and_query.is_none() {
        uri_parts.path_and_query = Some(PathAndQuery::from_static("/"));
    }
    parts.uri =
        Uri::from_parts(uri_parts).map_err(|e| UpstreamError::InvalidTarget(e.to_string()))?;
    parts.version = Version::HTTP_11;

    if let Ok(value) = HeaderValue::from_str(request_id) {
        parts.headers.insert(X_REQUEST_ID, value);
    }

    Ok(Request::from_parts(parts, body))
}

fn status_line_of(version: Version, status: StatusCode) -> String {
    format!("{:?} {}", version, status)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_line_reconstruction() {
        assert_eq!(
            status_line_of(Version::HTTP_11, StatusCode::NOT_FOUND),
            "HTTP/1.1 404 Not Found"
        );
        assert_eq!(
            status_line_of(Version::HTTP_11, StatusCode::INTERNAL_SERVER_ERROR),
            "HTTP/1.1 500 Internal Server Error"
        );
    }

    #[test]
    fn test_build_request_rewrites_target() {
        let request = Request::builder()
            .method("GET")
            .uri("/objects/key?versionId=3")
            .body(Body::empty())
            .unwrap();

        let authority: Authority = "127.0.0.1:9000".parse().unwrap();
        let outbound = build_request(request, &authority, "req-1").unwrap();

        assert_eq!(
            outbound.uri().to_string(),
            "http://127.0.0.1:9000/objects/key?versionId=3"
        );
        assert_eq!(outbound.version(), Version::HTTP_11);
        assert_eq!(outbound.headers().get(X_REQUEST_ID).unwrap(), "req-1");
    }

    #[test]
    fn test_build_request_defaults_empty_path() {
        let request = Request::builder()
            .method("GET")
            .uri("http://client.example.com")
            .body(Body::empty())
            .unwrap();

        let authority: Authority = "127.0.0.1:9000".parse().unwrap();
        let outbound = build_request(request, &authority, "req-2").unwrap();

        assert_eq!(outbound.uri().path(), "/");
        assert_eq!(outbound.uri().authority().unwrap().as_str(), "127.0.0.1:9000");
    }
}
