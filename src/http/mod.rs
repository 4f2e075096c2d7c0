//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, proxy handler)
//!     → request.rs (request ID layer)
//!     → [routing layer decides upstream]
//!     → [upstream exchange]
//!     → response.rs (filter pipeline driving, emission)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{RequestId, RequestIdExt, RequestIdLayer, X_REQUEST_ID};
pub use server::HttpServer;
