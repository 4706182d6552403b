//! Validating PDF relay library.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod relay;

pub use config::schema::RelayServiceConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use relay::{RelayGate, RelayPolicy};
