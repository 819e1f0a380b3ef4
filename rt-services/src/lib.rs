//! RoomThere Services - the accessors consumers call.
//!
//! Each accessor is a stateless façade over the injected `Backend`, mapping
//! one call to one remote query (or a short, non-atomic sequence):
//! - Auth (current principal, sign-up, sign-in, sign-out)
//! - Profiles (base profile, renter and homeowner extensions)
//! - Listings (CRUD, filtered search, view counting, stats)
//! - Applications (renter and homeowner views)
//! - Messages (conversations, unread counts, realtime feeds)
//! - Saved listings (bookmarks)
//! - Contact (contact form and problem reports)
//!
//! `RoomThere` bundles them for consumers.

pub mod accessor;
pub mod auth;
pub mod profile;
pub mod listing;
pub mod application;
pub mod message;
pub mod saved_listing;
pub mod contact;
pub mod registry;

// Re-export key types
pub use accessor::{require_principal, Accessor};
pub use auth::AuthService;
pub use profile::ProfileService;
pub use listing::ListingService;
pub use application::ApplicationService;
pub use message::MessageService;
pub use saved_listing::SavedListingService;
pub use contact::ContactService;
pub use registry::RoomThere;
