//! RoomThere Models - typed records, select expressions, and the query DSL.
//!
//! This crate owns the shape of everything exchanged with the backend:
//! row types for each table (with their embedded joins), the select
//! expressions that produce them, and a `Query` builder that both encodes
//! to the REST filter syntax and evaluates against JSON rows.

pub mod query;
pub mod schema;
pub mod models;

// Re-export key types
pub use query::{Filter, Operator, Order, Query};
pub use models::principal::Principal;
pub use models::profile::{
    ExtendedProfile, FullProfile, HomeownerProfile, HomeownerProfileUpdate, NewHomeownerProfile,
    NewRenterProfile, Profile, ProfileUpdate, RenterProfile, RenterProfileUpdate, UserType,
};
pub use models::listing::{
    HomeownerSummary, Listing, ListingFilters, ListingOwner, ListingStats, ListingUpdate,
    ListingViews, NewListing,
};
pub use models::application::{Application, ApplicationStatus};
pub use models::message::{
    Conversation, ConversationSummary, ConversationThread, Message, MessagePreview, SenderSummary,
};
pub use models::saved_listing::SavedListing;
pub use models::contact::{ContactForm, ContactSubmission, ProblemReport, ProblemReportForm};
