//! # icecheck
//!
//! Server settings management and TURN relay connectivity probing for a
//! WebRTC deployment: ordered signaling/TURN server lists persisted in
//! a SQLite key/value store, and a relay-only probe that classifies a
//! TURN server as reachable from collected ICE candidates.

pub mod config;
pub mod error;
pub mod observability;
pub mod probe;
pub mod settings;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{Error, Result};
