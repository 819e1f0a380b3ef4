//! Select expressions for the backend's resource-embedding syntax.
//!
//! Whitespace is stripped before the expression goes on the wire, so these
//! are laid out for reading.

pub const ID_ONLY: &str = "id";

/// Listing with the public homeowner card.
pub const LISTING_WITH_HOMEOWNER: &str = "
    *,
    homeowner:profiles!homeowner_id(
        id,
        first_name,
        last_name,
        photo_url,
        is_verified,
        bio
    )";

/// Listing with the compact homeowner card used in search results.
pub const LISTING_SEARCH: &str = "
    *,
    homeowner:profiles!homeowner_id(
        id,
        first_name,
        last_name,
        is_verified
    )";

pub const LISTING_VIEWS: &str = "id, view_count";

/// Freshly created application with its listing and renter.
pub const APPLICATION_CREATED: &str = "
    *,
    listing:room_listings(*),
    renter:profiles!renter_id(*)";

/// A renter's applications with the listing and its homeowner.
pub const APPLICATION_FOR_RENTER: &str = "
    *,
    listing:room_listings(*),
    homeowner:room_listings(homeowner:profiles!homeowner_id(*))";

/// Applications to a homeowner's listings. The inner join lets the
/// `listing.homeowner_id` filter drop applications to other listings.
pub const APPLICATION_FOR_HOMEOWNER: &str = "
    *,
    listing:room_listings!inner(*),
    renter:profiles!renter_id(*),
    renter_profile:renter_profiles!applications_renter_id_fkey(*)";

pub const APPLICATION_FOR_LISTING: &str = "
    *,
    renter:profiles!renter_id(*),
    renter_profile:renter_profiles!applications_renter_id_fkey(*)";

/// Conversation with both participants and a preview of every message.
pub const CONVERSATION_WITH_THREAD: &str = "
    *,
    user1:profiles!conversations_user1_id_fkey(*),
    user2:profiles!conversations_user2_id_fkey(*),
    messages(
        id,
        content,
        created_at,
        is_read,
        sender_id
    )";

pub const MESSAGE_WITH_SENDER: &str = "
    *,
    sender:profiles!sender_id(id, first_name, last_name, photo_url)";

pub const SAVED_LISTING_WITH_LISTING: &str = "
    *,
    listing:room_listings(*),
    homeowner:room_listings(homeowner:profiles!homeowner_id(*))";
