//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize, environment overrides)
//!     → validation.rs (semantic checks)
//!     → RelayServiceConfig (validated, immutable)
//!     → RelayPolicy built once and shared via Arc with the handler
//! ```
//!
//! # Design Decisions
//! - Config is read once at startup and never mutated afterwards
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::RelayServiceConfig;
pub use schema::ListenerConfig;
pub use schema::RelayConfig;
pub use schema::TimeoutConfig;
pub use schema::ObservabilityConfig;
pub use schema::LogFormat;
