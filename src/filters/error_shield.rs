//! Error shield response filter.
//!
//! # Responsibilities
//! - Header phase: decide, once per response, whether the upstream died
//!   before producing a parsable status line
//! - Body phase: when flagged, discard the real body and substitute the
//!   canonical XML error document
//!
//! # Design Decisions
//! - A non-empty status line means the upstream returned *some* structured
//!   response, even an error status; only a connection that failed before
//!   any parsable status line triggers intervention
//! - The canonical document is static immutable memory; body chunks borrow
//!   it, the declared length and the emitted bytes can never diverge

use axum::http::header;
use axum::http::HeaderValue;
use bytes::Bytes;

use crate::filters::context::{RequestState, ShieldContext};
use crate::filters::pipeline::{FilterError, ResponseFilter};
use crate::filters::response::{BodyChunk, ResponseHead};
use crate::observability::metrics;

/// Content type of the canonical error document.
pub const ERROR_CONTENT_TYPE: &str = "application/xml";

/// Canonical error document, byte-exact wire format.
pub const INTERNAL_ERROR_BODY: &[u8] = b"<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<Error><Code>InternalError</Code><Message>Server encountered an internal error.</Message><RequestId/><HostId/></Error>";

/// Response filter substituting the canonical error document when the
/// upstream produced no status line.
pub struct ErrorShield;

impl ResponseFilter for ErrorShield {
    fn name(&self) -> &'static str {
        "error_shield"
    }

    fn on_response_head(
        &self,
        state: &mut RequestState,
        head: &mut ResponseHead,
    ) -> Result<(), FilterError> {
        if !state.error_shield_enabled {
            return Ok(());
        }

        let Some(upstream) = &state.upstream else {
            tracing::debug!(route = %state.route, "error shield: response has no upstream");
            return Ok(());
        };

        tracing::debug!(
            route = %state.route,
            status_line = %upstream.status_line,
            "error shield: inspecting upstream status line"
        );
        if !upstream.status_line.is_empty() {
            return Ok(());
        }

        if state.shield.is_none() {
            state.shield = Some(ShieldContext {
                intervene_on_body: true,
            });
        }

        head.headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(ERROR_CONTENT_TYPE),
        );

        // Invalidate any relayed Content-Length; the declared length field
        // is the single source of truth from here on.
        head.headers.remove(header::CONTENT_LENGTH);
        head.content_length = Some(INTERNAL_ERROR_BODY.len() as u64);

        // The replacement body no longer supports partial content.
        head.headers.remove(header::ACCEPT_RANGES);

        metrics::record_intervention(&state.route);
        Ok(())
    }

    fn on_body_chunk(
        &self,
        state: &mut RequestState,
        chunk: &mut BodyChunk,
    ) -> Result<(), FilterError> {
        if !state.intervention_flagged() {
            return Ok(());
        }

        tracing::debug!(route = %state.route, "error shield: substituting response body");
        chunk.data = Bytes::from_static(INTERNAL_ERROR_BODY);
        chunk.last = true;
        Ok(())
    }
}
