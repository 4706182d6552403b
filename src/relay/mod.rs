//! PDF relay subsystem.
//!
//! # Data Flow
//! ```text
//! GET ?url=...
//!     → target.rs (extract, parse, scheme, host allowlist, project/dataset scope)
//!     → upstream.rs (single GET, no redirects, deadline from policy)
//!     → gate.rs (reject 3xx / non-2xx / non-PDF / bad or oversized length)
//!     → envelope.rs (fixed header set, sanitized filename)
//!     → streamed body back to the client
//! ```
//!
//! # Design Decisions
//! - Every check short-circuits; nothing touches the network before the
//!   target is known to be in scope
//! - Allowlisted hosts are shared multi-tenant stores, so the path is scoped
//!   to this deployment's project and dataset as well
//! - Size is judged on the declared content-length; the body is never
//!   buffered or measured
//! - Rejections carry fixed text, never upstream content

pub mod envelope;
pub mod error;
pub mod gate;
pub mod policy;
pub mod target;
pub mod upstream;

pub use error::{ErrorKind, RelayError};
pub use gate::RelayGate;
pub use policy::RelayPolicy;
pub use target::TargetDescriptor;
pub use upstream::{ReqwestUpstream, Upstream, UpstreamError, UpstreamResponse};
