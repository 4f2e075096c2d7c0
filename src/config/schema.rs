//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the gateway proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Route definitions mapping requests to upstreams.
    pub routes: Vec<RouteConfig>,

    /// Upstream origin definitions.
    pub upstreams: Vec<UpstreamConfig>,

    /// Response filter defaults, inherited by routes.
    pub filter: FilterConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Route configuration mapping requests to an upstream origin.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteConfig {
    /// Route identifier for logging/metrics.
    pub name: String,

    /// Host header to match (exact match, case-insensitive).
    pub host: Option<String>,

    /// Path prefix to match (case-sensitive).
    pub path_prefix: Option<String>,

    /// Upstream name to forward to.
    pub upstream: String,

    /// Route priority (higher = checked first).
    #[serde(default)]
    pub priority: u32,

    /// Per-route error shield override. Unset means the route inherits
    /// the `[filter]` section default.
    #[serde(default)]
    pub error_shield_enabled: Option<bool>,
}

/// Upstream origin configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpstreamConfig {
    /// Unique upstream identifier.
    pub name: String,

    /// Origin URL (e.g., "http://127.0.0.1:9000").
    pub origin: String,
}

/// Response filter defaults.
///
/// Routes that do not set their own flag inherit these values, mirroring
/// how server-level directives cascade into location blocks.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Substitute a canonical XML error document when an upstream dies
    /// before producing a status line.
    pub error_shield_enabled: bool,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            error_shield_enabled: false,
        }
    }
}

impl FilterConfig {
    /// Resolve the effective error shield flag for a route: the route's own
    /// value when explicitly set, otherwise this section's default.
    pub fn resolve_error_shield(&self, route_override: Option<bool>) -> bool {
        route_override.unwrap_or(self.error_shield_enabled)
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            request_secs: 30,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_flag_inheritance() {
        let defaults = FilterConfig {
            error_shield_enabled: true,
        };

        // Explicit route value wins over the section default.
        assert!(!defaults.resolve_error_shield(Some(false)));
        assert!(defaults.resolve_error_shield(Some(true)));

        // Unset route value inherits the section default.
        assert!(defaults.resolve_error_shield(None));

        let disabled = FilterConfig::default();
        assert!(!disabled.resolve_error_shield(None));
        assert!(disabled.resolve_error_shield(Some(true)));
    }

    #[test]
    fn test_route_flag_deserialization() {
        let config: ProxyConfig = toml::from_str(
            r#"
            [filter]
            error_shield_enabled = true

            [[routes]]
            name = "bucket-a"
            path_prefix = "/a"
            upstream = "store"
            error_shield_enabled = false

            [[routes]]
            name = "bucket-b"
            path_prefix = "/b"
            upstream = "store"

            [[upstreams]]
            name = "store"
            origin = "http://127.0.0.1:9000"
            "#,
        )
        .expect("config should parse");

        assert!(config.filter.error_shield_enabled);
        assert_eq!(config.routes[0].error_shield_enabled, Some(false));
        assert_eq!(config.routes[1].error_shield_enabled, None);
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: ProxyConfig = toml::from_str("").expect("empty config should parse");
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert!(!config.filter.error_shield_enabled);
        assert_eq!(config.timeouts.request_secs, 30);
        assert!(config.routes.is_empty());
    }
}
