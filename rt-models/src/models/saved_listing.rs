//! Renter bookmarks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use super::listing::{Listing, ListingOwner};

/// A row of `saved_listings`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedListing {
    pub id: Uuid,
    pub renter_id: Uuid,
    pub listing_id: Uuid,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub listing: Option<Listing>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homeowner: Option<ListingOwner>,
}

impl SavedListing {
    pub fn new_row(renter_id: Uuid, listing_id: Uuid) -> Value {
        json!({ "renter_id": renter_id, "listing_id": listing_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_saved_listing_with_embeds() {
        let json = json!({
            "id": Uuid::from_u128(1),
            "renter_id": Uuid::from_u128(2),
            "listing_id": Uuid::from_u128(3),
            "listing": {
                "id": Uuid::from_u128(3),
                "homeowner_id": Uuid::from_u128(4),
                "title": "Attic room",
                "monthly_rent": 700
            },
            "homeowner": {"homeowner": null}
        });
        let saved: SavedListing = serde_json::from_value(json).unwrap();
        assert_eq!(saved.listing.unwrap().title, "Attic room");
        assert!(saved.homeowner.unwrap().homeowner.is_none());
    }
}
