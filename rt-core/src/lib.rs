//! RoomThere Core - Foundation types, error handling, configuration, and logging.
//!
//! This crate provides the shared foundation used by all other RoomThere crates:
//! - Application configuration (project URL, anon key, realtime settings)
//! - Global error type covering backend, auth, and transport failures
//! - Structured logging with tracing
//! - Platform directory lookup
//! - Table, RPC, and endpoint constants

pub mod config;
pub mod error;
pub mod logging;
pub mod platform;
pub mod constants;

// Re-export commonly used items at the crate root
pub use config::AppConfig;
pub use error::{BackendError, RtError, RtResult};
pub use logging::init_logging;
