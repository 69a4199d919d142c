//! HTTP surface.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum router, tracing)
//!         ├─ GET /ws      → websocket.rs (subscriber session)
//!         ├─ GET /events  → sse.rs (one-way event stream)
//!         ├─ GET /health  → liveness + client count
//!         └─ /admin/*     → admin API (bearer auth)
//! ```

pub mod server;
pub mod sse;
pub mod websocket;

pub use server::{AppState, HttpServer};
