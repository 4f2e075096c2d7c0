//! Response emission and body-phase driving.
//!
//! # Responsibilities
//! - Run the header phase over the response head
//! - Feed body chunks through the body phase, one at a time
//! - Keep declared content length and transmitted bytes consistent
//!
//! # Design Decisions
//! - A one-frame lookahead marks the final chunk of the upstream body
//! - Zero upstream frames still drive one empty terminal chunk, so a
//!   flagged intervention always gets to emit its replacement
//! - Feeding stops at the first last-marked chunk; any remaining upstream
//!   frames are discarded
//! - A filter failure aborts the body stream rather than emitting bytes
//!   that disagree with the declared framing

use std::ops::ControlFlow;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, HeaderValue, Response, StatusCode};
use bytes::Bytes;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use http_body_util::BodyStream;
use hyper::body::Incoming;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::filters::{BodyChunk, FilterPipeline, RequestState, ResponseHead};

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Stream of raw body frames entering the body phase.
pub type FrameStream = BoxStream<'static, Result<Bytes, BoxError>>;

/// Adapt an upstream body into a stream of data frames.
pub fn upstream_frames(body: Incoming) -> FrameStream {
    BodyStream::new(body)
        .filter_map(|frame| async move {
            match frame {
                Ok(frame) => frame.into_data().ok().map(Ok),
                Err(e) => Some(Err(Box::new(e) as BoxError)),
            }
        })
        .boxed()
}

/// A single-frame stream for locally generated bodies.
pub fn static_frames(text: &'static str) -> FrameStream {
    futures_util::stream::once(async move { Ok(Bytes::from_static(text.as_bytes())) }).boxed()
}

/// Run the header phase and emit the response, driving every body chunk
/// through the body phase.
pub fn emit(
    pipeline: Arc<FilterPipeline>,
    mut state: RequestState,
    mut head: ResponseHead,
    frames: Option<FrameStream>,
) -> Response<Body> {
    if let Err(e) = pipeline.run_header_phase(&mut state, &mut head) {
        tracing::error!(route = %state.route, error = %e, "header filter failed, failing request");
        return internal_error();
    }

    let body = filtered_body(pipeline, state, frames);
    into_response(head, body)
}

/// Build the client-facing body by feeding frames through the body phase.
pub fn filtered_body(
    pipeline: Arc<FilterPipeline>,
    state: RequestState,
    frames: Option<FrameStream>,
) -> Body {
    let (tx, rx) = mpsc::channel::<Result<Bytes, BoxError>>(8);
    tokio::spawn(drive_chunks(pipeline, state, frames, tx));
    Body::from_stream(ReceiverStream::new(rx))
}

/// The bare internal error response used when a filter fails.
pub(crate) fn internal_error() -> Response<Body> {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response
}

fn into_response(head: ResponseHead, body: Body) -> Response<Body> {
    let mut response = Response::new(body);
    *response.status_mut() = head.status;
    *response.headers_mut() = head.headers;
    if let Some(len) = head.content_length {
        response
            .headers_mut()
            .insert(header::CONTENT_LENGTH, HeaderValue::from(len));
    }
    response
}

async fn drive_chunks(
    pipeline: Arc<FilterPipeline>,
    mut state: RequestState,
    frames: Option<FrameStream>,
    tx: mpsc::Sender<Result<Bytes, BoxError>>,
) {
    let mut pending: Option<Bytes> = None;

    if let Some(mut frames) = frames {
        while let Some(item) = frames.next().await {
            let data = match item {
                Ok(data) => data,
                Err(e) => {
                    tracing::warn!(route = %state.route, error = %e, "upstream body stream failed");
                    let _ = tx.send(Err(e)).await;
                    return;
                }
            };

            // Lookahead: the previous frame is only fed once the next one
            // arrives, so it is known not to be the last.
            let Some(previous) = pending.replace(data) else {
                continue;
            };
            if feed(&pipeline, &mut state, BodyChunk::new(previous, false), &tx)
                .await
                .is_break()
            {
                return;
            }
        }
    }

    let tail = pending.take().unwrap_or_default();
    let _ = feed(&pipeline, &mut state, BodyChunk::new(tail, true), &tx).await;
}

async fn feed(
    pipeline: &FilterPipeline,
    state: &mut RequestState,
    mut chunk: BodyChunk,
    tx: &mpsc::Sender<Result<Bytes, BoxError>>,
) -> ControlFlow<()> {
    match pipeline.run_body_phase(state, &mut chunk) {
        Ok(last) => {
            if !chunk.is_empty() && tx.send(Ok(chunk.data)).await.is_err() {
                // Client went away; nothing left to emit to.
                return ControlFlow::Break(());
            }
            if last {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        }
        Err(e) => {
            tracing::error!(route = %state.route, error = %e, "body filter failed, aborting response");
            let _ = tx.send(Err(Box::new(e) as BoxError)).await;
            ControlFlow::Break(())
        }
    }
}
