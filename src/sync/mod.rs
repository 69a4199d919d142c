//! Sync subsystem.
//!
//! # Data Flow
//! ```text
//! scheduler.rs (one ticker per cadence)
//!     → workers.rs (teams, scores, live, standings, rosters)
//!     → pipeline.rs (fetch via SyncCoordinator, normalize, stale fallback)
//!     → repository.rs (persist) → CacheLayer (write) → EventBus (publish)
//! ```

pub mod error;
pub mod normalize;
pub mod pipeline;
pub mod records;
pub mod repository;
pub mod scheduler;
pub mod workers;

pub use error::{SyncError, SyncResult};
pub use pipeline::{Fetched, SyncContext, Target};
pub use repository::{InMemoryRepository, Repository, StoreError};
pub use scheduler::{CadenceSnapshot, Scheduler};
pub use workers::{cadences, Cadence, SyncReport, SyncWorker};
