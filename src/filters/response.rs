//! Response head and body chunk types flowing through the filter pipeline.

use axum::http::{HeaderMap, StatusCode};
use bytes::Bytes;

/// Mutable response metadata handed to header-phase filters.
///
/// The declared content length is carried as a field rather than a header
/// entry so a filter can invalidate a stale `Content-Length` header and
/// declare a new length without emitting conflicting values; the header is
/// written from this field at emission time.
#[derive(Debug)]
pub struct ResponseHead {
    /// Status code the client will see.
    pub status: StatusCode,

    /// Response headers.
    pub headers: HeaderMap,

    /// Declared body length, written to `Content-Length` at emission.
    /// `None` means no declared length (the upstream's own header, if any,
    /// is relayed as-is).
    pub content_length: Option<u64>,
}

impl ResponseHead {
    /// A head with the given status and no headers.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            content_length: None,
        }
    }

    /// A head relaying an upstream response's status and headers.
    pub fn from_upstream(status: StatusCode, headers: HeaderMap) -> Self {
        Self {
            status,
            headers,
            content_length: None,
        }
    }
}

/// A unit of body data flowing through the body phase.
///
/// Filters may replace the payload in place; `Bytes` makes a replacement a
/// reference rebind, not a copy, so a filter can point the chunk at static
/// immutable memory that outlives the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyChunk {
    /// Payload bytes.
    pub data: Bytes,

    /// Marks the final chunk of the response. The pipeline driver stops
    /// feeding chunks after a last-marked chunk has been emitted.
    pub last: bool,
}

impl BodyChunk {
    pub fn new(data: Bytes, last: bool) -> Self {
        Self { data, last }
    }

    /// The empty terminal chunk fed when an upstream body produced no data.
    pub fn final_empty() -> Self {
        Self {
            data: Bytes::new(),
            last: true,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
