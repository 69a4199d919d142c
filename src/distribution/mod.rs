//! Real-time distribution subsystem.
//!
//! # Data Flow
//! ```text
//! sync workers → bus.rs (bounded mpsc) → dispatcher.rs
//!     → registry.rs (filter → connections)
//!     → net::ConnectionManager (per-connection outbound queue)
//!
//! socket text frame → protocol.rs (parse) → handler.rs (filters, queries)
//! ```
//!
//! # Design Decisions
//! - One consumer per event stream, so delivery order matches publish order
//! - Team and sport subscriptions are expanded to game filters at subscribe
//!   time and also kept as membership filters for games seen later
//! - Malformed frames are answered, never fatal

pub mod bus;
pub mod dispatcher;
pub mod events;
pub mod handler;
pub mod protocol;
pub mod registry;

pub use bus::{BusClosed, EventBus, EventReceiver};
pub use dispatcher::BroadcastDispatcher;
pub use events::{EventKind, LiveUpdateEvent};
pub use handler::MessageHandler;
pub use protocol::{ClientMessage, FilterFields, ProtocolError, ServerMessage};
pub use registry::{FilterKey, SubscriptionRegistry};
