//! S3-compatible object storage gateway proxy.
//!
//! Relays client requests to object-storage backends and streams every
//! response back through an ordered response-filter pipeline. The pipeline's
//! centerpiece is the error shield: when a backend connection dies before
//! producing a parsable status line, the client receives a fixed, well-formed
//! XML error document instead of a truncated or empty response.

// Core subsystems
pub mod config;
pub mod filters;
pub mod http;
pub mod routing;
pub mod upstream;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
