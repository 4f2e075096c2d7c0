//! Route lookup and dispatch.
//!
//! # Responsibilities
//! - Compile route configs into an immutable, priority-ordered table
//! - Resolve upstream authorities and effective filter flags at compile time
//! - Look up the matching route for a request
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) priority scan (acceptable for typical route counts)
//! - Explicit no-match rather than a silent default route

use axum::http::uri::Authority;
use url::Url;

use crate::config::ProxyConfig;
use crate::routing::matcher::{AndMatcher, HostMatcher, Matcher, PathPrefixMatcher};

/// A compiled route: match conditions plus everything the proxy handler
/// needs to forward a request, resolved once at startup.
#[derive(Debug)]
pub struct RouteTarget {
    /// Route identifier for logging/metrics.
    pub name: String,

    /// Upstream authority (host:port) requests are forwarded to.
    pub authority: Authority,

    /// Effective error shield flag (route override or `[filter]` default).
    pub error_shield_enabled: bool,

    matcher: AndMatcher,
    priority: u32,
}

/// Immutable route table, ordered by priority (highest first).
#[derive(Debug)]
pub struct Router {
    routes: Vec<RouteTarget>,
}

impl Router {
    /// Compile the route table from configuration.
    ///
    /// Routes referencing unknown upstreams or unparsable origins are
    /// skipped with a warning; validation normally rejects such configs
    /// before they get here.
    pub fn from_config(config: &ProxyConfig) -> Self {
        let mut routes = Vec::new();

        for route in &config.routes {
            let Some(upstream) = config
                .upstreams
                .iter()
                .find(|u| u.name == route.upstream)
            else {
                tracing::warn!(
                    route = %route.name,
                    upstream = %route.upstream,
                    "Route references unknown upstream, skipping"
                );
                continue;
            };

            let Some(authority) = origin_authority(&upstream.origin) else {
                tracing::warn!(
                    upstream = %upstream.name,
                    origin = %upstream.origin,
                    "Upstream origin is not a valid authority, skipping route"
                );
                continue;
            };

            let mut matchers: Vec<Box<dyn Matcher>> = Vec::new();
            if let Some(host) = &route.host {
                matchers.push(Box::new(HostMatcher::new(host.clone())));
            }
            if let Some(prefix) = &route.path_prefix {
                matchers.push(Box::new(PathPrefixMatcher::new(prefix.clone())));
            }

            routes.push(RouteTarget {
                name: route.name.clone(),
                authority,
                error_shield_enabled: config
                    .filter
                    .resolve_error_shield(route.error_shield_enabled),
                matcher: AndMatcher::new(matchers),
                priority: route.priority,
            });
        }

        // Highest priority first; stable sort keeps config order for ties
        routes.sort_by(|a, b| b.priority.cmp(&a.priority));

        Self { routes }
    }

    /// Look up the first route matching the given host and path.
    pub fn match_request(&self, host: Option<&str>, path: &str) -> Option<&RouteTarget> {
        self.routes.iter().find(|r| r.matcher.matches(host, path))
    }

    /// Number of compiled routes.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// True when no routes compiled.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

fn origin_authority(origin: &str) -> Option<Authority> {
    let url = Url::parse(origin).ok()?;
    let host = url.host_str()?;
    let authority = match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    };
    authority.parse().ok()
}
