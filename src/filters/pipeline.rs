//! Filter trait and ordered pipeline.

use thiserror::Error;

use crate::filters::context::RequestState;
use crate::filters::response::{BodyChunk, ResponseHead};

/// Error raised by a filter hook. Fatal for the current request only: the
/// pipeline halts, the response fails, and other in-flight requests are
/// unaffected.
#[derive(Debug, Error)]
#[error("response filter '{filter}' failed: {reason}")]
pub struct FilterError {
    /// Name of the filter that failed.
    pub filter: &'static str,
    /// Human-readable failure description.
    pub reason: String,
}

impl FilterError {
    pub fn new(filter: &'static str, reason: impl Into<String>) -> Self {
        Self {
            filter,
            reason: reason.into(),
        }
    }
}

/// A response filter with a header-phase and a body-phase hook.
///
/// The host guarantees that for a given response the header phase runs
/// exactly once, strictly before any body chunk, and that the body phase
/// runs once per chunk. Both hooks mutate the response in place; returning
/// `Ok` always hands control to the next filter in the chain.
pub trait ResponseFilter: Send + Sync {
    /// Filter name, used in logs and error reports.
    fn name(&self) -> &'static str;

    /// Inspect and possibly mutate the response metadata.
    fn on_response_head(
        &self,
        _state: &mut RequestState,
        _head: &mut ResponseHead,
    ) -> Result<(), FilterError> {
        Ok(())
    }

    /// Inspect and possibly mutate one body chunk.
    fn on_body_chunk(
        &self,
        _state: &mut RequestState,
        _chunk: &mut BodyChunk,
    ) -> Result<(), FilterError> {
        Ok(())
    }
}

/// Ordered chain of response filters, built once at startup and shared
/// read-only by all requests.
pub struct FilterPipeline {
    filters: Vec<Box<dyn ResponseFilter>>,
}

impl FilterPipeline {
    pub fn new(filters: Vec<Box<dyn ResponseFilter>>) -> Self {
        Self { filters }
    }

    /// Run every filter's header hook in order.
    pub fn run_header_phase(
        &self,
        state: &mut RequestState,
        head: &mut ResponseHead,
    ) -> Result<(), FilterError> {
        for filter in &self.filters {
            filter.on_response_head(state, head)?;
        }
        Ok(())
    }

    /// Run every filter's body hook in order over one chunk.
    ///
    /// Returns whether the chunk left the chain marked last, in which case
    /// the caller must not feed any further chunks.
    pub fn run_body_phase(
        &self,
        state: &mut RequestState,
        chunk: &mut BodyChunk,
    ) -> Result<bool, FilterError> {
        for filter in &self.filters {
            filter.on_body_chunk(state, chunk)?;
        }
        Ok(chunk.last)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, StatusCode};
    use bytes::Bytes;
    use std::sync::Mutex;

    struct Recorder {
        label: &'static str,
        calls: &'static Mutex<Vec<&'static str>>,
    }

    impl ResponseFilter for Recorder {
        fn name(&self) -> &'static str {
            self.label
        }

        fn on_response_head(
            &self,
            _state: &mut RequestState,
            head: &mut ResponseHead,
        ) -> Result<(), FilterError> {
            self.calls.lock().unwrap().push(self.label);
            head.headers
                .append("x-seen-by", HeaderValue::from_static(self.label));
            Ok(())
        }
    }

    struct Failing;

    impl ResponseFilter for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn on_response_head(
            &self,
            _state: &mut RequestState,
            _head: &mut ResponseHead,
        ) -> Result<(), FilterError> {
            Err(FilterError::new("failing", "induced"))
        }
    }

    #[test]
    fn test_filters_run_in_registration_order() {
        static CALLS: Mutex<Vec<&'static str>> = Mutex::new(Vec::new());

        let pipeline = FilterPipeline::new(vec![
            Box::new(Recorder {
                label: "first",
                calls: &CALLS,
            }),
            Box::new(Recorder {
                label: "second",
                calls: &CALLS,
            }),
        ]);

        let mut state = RequestState::new("test", false);
        let mut head = ResponseHead::new(StatusCode::OK);
        pipeline.run_header_phase(&mut state, &mut head).unwrap();

        assert_eq!(*CALLS.lock().unwrap(), vec!["first", "second"]);
        assert_eq!(head.headers.get_all("x-seen-by").iter().count(), 2);
    }

    #[test]
    fn test_header_phase_error_halts_chain() {
        static CALLS: Mutex<Vec<&'static str>> = Mutex::new(Vec::new());

        let pipeline = FilterPipeline::new(vec![
            Box::new(Failing),
            Box::new(Recorder {
                label: "after",
                calls: &CALLS,
            }),
        ]);

        let mut state = RequestState::new("test", false);
        let mut head = ResponseHead::new(StatusCode::OK);
        let err = pipeline
            .run_header_phase(&mut state, &mut head)
            .unwrap_err();

        assert_eq!(err.filter, "failing");
        assert!(CALLS.lock().unwrap().is_empty());
    }

    #[test]
    fn test_body_phase_reports_last_marker() {
        let pipeline = FilterPipeline::new(vec![]);
        let mut state = RequestState::new("test", false);

        let mut chunk = BodyChunk::new(Bytes::from_static(b"data"), false);
        assert!(!pipeline.run_body_phase(&mut state, &mut chunk).unwrap());

        let mut chunk = BodyChunk::new(Bytes::from_static(b"tail"), true);
        assert!(pipeline.run_body_phase(&mut state, &mut chunk).unwrap());
    }
}
