//! Per-request filter state.

/// Upstream response metadata visible to filters.
#[derive(Debug, Clone)]
pub struct UpstreamInfo {
    /// Raw status line text reported by the upstream. Empty when the
    /// connection died before a parsable status line arrived.
    pub status_line: String,
}

impl UpstreamInfo {
    pub fn new(status_line: impl Into<String>) -> Self {
        Self {
            status_line: status_line.into(),
        }
    }

    /// An upstream association without a parsed status line.
    pub fn without_status_line() -> Self {
        Self {
            status_line: String::new(),
        }
    }
}

/// Error shield coordination state, allocated lazily by the header phase.
#[derive(Debug)]
pub struct ShieldContext {
    /// When set, the body phase discards the real body and substitutes the
    /// canonical error document.
    pub intervene_on_body: bool,
}

/// State carried alongside one request for its lifetime.
///
/// Owned exclusively by that request's processing flow: the header phase
/// runs strictly before any body chunk, and the two never run concurrently
/// for the same request, so no locking is needed.
#[derive(Debug)]
pub struct RequestState {
    /// Route identifier, for logs and metrics ("none" for unrouted requests).
    pub route: String,

    /// Effective per-route error shield flag.
    pub error_shield_enabled: bool,

    /// Upstream response metadata; absent when the response was generated
    /// by the gateway itself without any upstream interaction.
    pub upstream: Option<UpstreamInfo>,

    /// Error shield context; absence means "do not intervene".
    pub shield: Option<ShieldContext>,
}

impl RequestState {
    pub fn new(route: impl Into<String>, error_shield_enabled: bool) -> Self {
        Self {
            route: route.into(),
            error_shield_enabled,
            upstream: None,
            shield: None,
        }
    }

    /// True when the body phase must substitute the canonical document.
    pub fn intervention_flagged(&self) -> bool {
        self.shield
            .as_ref()
            .map(|ctx| ctx.intervene_on_body)
            .unwrap_or(false)
    }
}
