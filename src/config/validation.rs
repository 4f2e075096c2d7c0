//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check referential integrity (routes reference existing upstreams)
//! - Validate addresses and value ranges
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Validation is a pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use url::Url;

use crate::config::schema::ProxyConfig;

/// A single semantic configuration error.
#[derive(Debug)]
pub enum ValidationError {
    /// Listener bind address does not parse as host:port.
    InvalidBindAddress(String),
    /// Metrics bind address does not parse as host:port.
    InvalidMetricsAddress(String),
    /// Route references an upstream that is not defined.
    UnknownUpstream { route: String, upstream: String },
    /// Two upstreams share the same name.
    DuplicateUpstream(String),
    /// Upstream origin is not a usable http URL.
    InvalidOrigin { upstream: String, reason: String },
    /// A timeout is configured as zero.
    ZeroTimeout(&'static str),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::InvalidBindAddress(addr) => {
                write!(f, "invalid listener bind address '{}'", addr)
            }
            ValidationError::InvalidMetricsAddress(addr) => {
                write!(f, "invalid metrics address '{}'", addr)
            }
            ValidationError::UnknownUpstream { route, upstream } => {
                write!(f, "route '{}' references unknown upstream '{}'", route, upstream)
            }
            ValidationError::DuplicateUpstream(name) => {
                write!(f, "duplicate upstream name '{}'", name)
            }
            ValidationError::InvalidOrigin { upstream, reason } => {
                write!(f, "upstream '{}' has invalid origin: {}", upstream, reason)
            }
            ValidationError::ZeroTimeout(which) => {
                write!(f, "timeout '{}' must be greater than zero", which)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Validate a parsed configuration, collecting every semantic error.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    let mut upstream_names: HashSet<&str> = HashSet::new();
    for upstream in &config.upstreams {
        if !upstream_names.insert(upstream.name.as_str()) {
            errors.push(ValidationError::DuplicateUpstream(upstream.name.clone()));
        }
        if let Err(reason) = check_origin(&upstream.origin) {
            errors.push(ValidationError::InvalidOrigin {
                upstream: upstream.name.clone(),
                reason,
            });
        }
    }

    for route in &config.routes {
        if !upstream_names.contains(route.upstream.as_str()) {
            errors.push(ValidationError::UnknownUpstream {
                route: route.name.clone(),
                upstream: route.upstream.clone(),
            });
        }
    }

    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("connect_secs"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("request_secs"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_origin(origin: &str) -> Result<(), String> {
    let url = Url::parse(origin).map_err(|e| e.to_string())?;
    if url.scheme() != "http" {
        return Err(format!("unsupported scheme '{}'", url.scheme()));
    }
    if url.host_str().is_none() {
        return Err("missing host".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{RouteConfig, UpstreamConfig};

    fn base_config() -> ProxyConfig {
        let mut config = ProxyConfig::default();
        config.upstreams.push(UpstreamConfig {
            name: "store".into(),
            origin: "http://127.0.0.1:9000".into(),
        });
        config.routes.push(RouteConfig {
            name: "objects".into(),
            host: None,
            path_prefix: Some("/".into()),
            upstream: "store".into(),
            priority: 0,
            error_shield_enabled: None,
        });
        config
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(validate_config(&base_config()).is_ok());
    }

    #[test]
    fn test_unknown_upstream_is_rejected() {
        let mut config = base_config();
        config.routes[0].upstream = "missing".into();

        let errors = validate_config(&config).unwrap_err();
        assert!(matches!(
            errors[0],
            ValidationError::UnknownUpstream { .. }
        ));
    }

    #[test]
    fn test_duplicate_upstream_is_rejected() {
        let mut config = base_config();
        config.upstreams.push(UpstreamConfig {
            name: "store".into(),
            origin: "http://127.0.0.1:9001".into(),
        });

        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::DuplicateUpstream(_))));
    }

    #[test]
    fn test_invalid_origin_is_rejected() {
        let mut config = base_config();
        config.upstreams[0].origin = "ftp://127.0.0.1:9000".into();

        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::InvalidOrigin { .. })));
    }

    #[test]
    fn test_all_errors_are_collected() {
        let mut config = base_config();
        config.listener.bind_address = "not-an-address".into();
        config.timeouts.request_secs = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
    }
}
