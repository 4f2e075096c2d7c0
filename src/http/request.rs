//! Request ID handling.
//!
//! # Responsibilities
//! - Assign a unique request ID (UUID v4) as early as possible
//! - Preserve an ID supplied by a trusted downstream proxy
//! - Make the ID available to handlers via request extensions

use axum::body::Body;
use axum::http::{HeaderValue, Request};
use tower::{Layer, Service};
use uuid::Uuid;

/// Header carrying the request ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Request ID attached to request extensions by [`RequestIdLayer`].
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Convenience accessor for the assigned request ID.
pub trait RequestIdExt {
    /// The ID assigned by the layer, or "unknown" outside of it.
    fn request_id(&self) -> &str;
}

impl RequestIdExt for Request<Body> {
    fn request_id(&self) -> &str {
        self.extensions()
            .get::<RequestId>()
            .map(|id| id.0.as_str())
            .unwrap_or("unknown")
    }
}

/// Tower layer that ensures every request carries an ID.
#[derive(Debug, Clone, Default)]
pub struct RequestIdLayer;

impl<S> Layer<S> for RequestIdLayer {
    type Service = RequestIdService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestIdService { inner }
    }
}

/// Service wrapper applied by [`RequestIdLayer`].
#[derive(Debug, Clone)]
pub struct RequestIdService<S> {
    inner: S,
}

impl<S> Service<Request<Body>> for RequestIdService<S>
where
    S: Service<Request<Body>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: Request<Body>) -> Self::Future {
        let id = match request
            .headers()
            .get(X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
        {
            Some(existing) => existing.to_string(),
            None => {
                let generated = Uuid::new_v4().to_string();
                if let Ok(value) = HeaderValue::from_str(&generated) {
                    request.headers_mut().insert(X_REQUEST_ID, value);
                }
                generated
            }
        };
        request.extensions_mut().insert(RequestId(id));

        self.inner.call(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;
    use tower::{service_fn, ServiceExt};

    async fn observed_id(request: Request<Body>) -> String {
        let service = RequestIdLayer.layer(service_fn(|req: Request<Body>| async move {
            Ok::<_, Infallible>(req.request_id().to_string())
        }));
        service.oneshot(request).await.unwrap()
    }

    #[tokio::test]
    async fn test_generates_id_when_missing() {
        let request = Request::builder().body(Body::empty()).unwrap();
        let id = observed_id(request).await;
        assert!(Uuid::parse_str(&id).is_ok());
    }

    #[tokio::test]
    async fn test_preserves_existing_id() {
        let request = Request::builder()
            .header(X_REQUEST_ID, "upstream-supplied")
            .body(Body::empty())
            .unwrap();
        assert_eq!(observed_id(request).await, "upstream-supplied");
    }
}
