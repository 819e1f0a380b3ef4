//! API endpoint modules organized by backend service.
//!
//! Each module adds methods to `ApiClient` for one group of endpoints.

pub mod rest;
pub mod rpc;
pub mod auth;
