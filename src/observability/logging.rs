//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber
//! - Configure the log level from config, overridable via RUST_LOG

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber.
///
/// The configured level applies to this crate; `RUST_LOG` takes precedence
/// when set.
pub fn init(log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("s3_gateway={log_level},tower_http=info").into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
