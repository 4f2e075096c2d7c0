//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request (host header, path)
//!     → router.rs (route lookup, priority order)
//!     → matcher.rs (evaluate match conditions)
//!     → Return: matched RouteTarget or no match
//!
//! Route compilation (at startup):
//!     RouteConfig[] + UpstreamConfig[] + FilterConfig
//!     → resolve upstream authorities and filter flags
//!     → sort by priority
//!     → freeze as immutable Router
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex in the hot path (exact host / prefix matching only)
//! - First match wins, ordered by priority
//! - Filter flags resolved at compile time (route override or section default)

pub mod matcher;
pub mod router;

pub use router::{RouteTarget, Router};
