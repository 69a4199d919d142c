//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Build components → Restore cache → Initial sync → Cadences → Listener
//!
//! Shutdown (shutdown.rs):
//!     Trigger → Listener stops → Cadences stop → Connections closed → Cache saved
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then core, then listeners
//! - One watch-based trigger observed by every background loop

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::{Shutdown, ShutdownSignal};
pub use signals::wait_for_signal;
pub use startup::{RelayRuntime, StartupError};
