//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → tls.rs (optional TLS handshake, rustls via axum-server)
//!     → Hand off to HTTP layer
//! ```
//!
//! # Design Decisions
//! - TLS is optional; without it the relay expects a terminating proxy in front
//! - Concurrency is bounded in the HTTP layer, not per connection

pub mod tls;
