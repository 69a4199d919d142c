//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! WebSocket upgrade (http/websocket.rs)
//!     → connection.rs (register: id, outbound queue, empty filter set)
//!     → heartbeat.rs (probe every interval, terminate silent connections)
//!     → connection.rs (deregister: drop filters from the registry)
//! ```
//!
//! # Design Decisions
//! - Connections are stored by id, never scanned to resolve identity
//! - A bounded outbound queue per connection; a full queue drops the connection
//! - TLS is optional and handled by the listener

pub mod connection;
pub mod heartbeat;
pub mod tls;

pub use connection::{ConnectionId, ConnectionManager, Outbound, Session};
pub use heartbeat::HeartbeatMonitor;
