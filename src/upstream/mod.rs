//! Upstream subsystem.
//!
//! # Data Flow
//! ```text
//! Sync worker
//!     → coordinator.rs (SyncCoordinator::fetch: circuit, rate window, retries)
//!     → transport.rs (one HTTP attempt with a deadline)
//!     → serde_json::Value back to the worker
//! ```

pub mod coordinator;
pub mod transport;
pub mod types;

pub use coordinator::{SourceState, SyncCoordinator};
pub use transport::{HttpTransport, Transport};
pub use types::{SourceSnapshot, UpstreamError, UpstreamRequest, UpstreamResult};
