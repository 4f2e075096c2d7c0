//! Response filter subsystem.
//!
//! # Data Flow
//! ```text
//! Upstream outcome (status line, headers, body stream)
//!     → pipeline.rs header phase (each filter inspects/mutates ResponseHead)
//!     → http/response.rs drives body chunks
//!     → pipeline.rs body phase (each filter inspects/mutates BodyChunk)
//!     → bytes emitted to client
//! ```
//!
//! # Design Decisions
//! - Explicit middleware composition: an ordered list of filters built once
//!   at startup, no mutable global handler chain
//! - Filters mutate the response in place and always hand control to the
//!   next filter; a filter error is fatal for that request only
//! - Per-request coordination happens through RequestState, owned by one
//!   request's processing flow and never shared

pub mod context;
pub mod error_shield;
pub mod pipeline;
pub mod response;

pub use context::{RequestState, ShieldContext, UpstreamInfo};
pub use error_shield::ErrorShield;
pub use pipeline::{FilterError, FilterPipeline, ResponseFilter};
pub use response::{BodyChunk, ResponseHead};

/// Build the response filter pipeline.
///
/// The order here is the execution order for both the header and the body
/// phase. Built once at startup and shared read-only by all requests.
pub fn build_pipeline() -> FilterPipeline {
    FilterPipeline::new(vec![Box::new(ErrorShield)])
}
