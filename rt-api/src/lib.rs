//! RoomThere API - HTTP client for the hosted backend.
//!
//! This crate provides the `Backend` trait the accessors are written
//! against, and `ApiClient`, which implements it over the backend's REST
//! (tables and stored procedures) and auth endpoints.

pub mod backend;
pub mod client;
pub mod endpoints;
pub mod response;

// Re-export key types
pub use backend::Backend;
pub use client::ApiClient;
pub use endpoints::auth::{Session, SignUp};
pub use response::{expect_single, maybe_single};
