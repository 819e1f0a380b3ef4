//! Room listings and the filters used to search them.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use super::profile::Profile;
use super::{non_blank, null_to_default};
use crate::query::Query;

/// A row of `room_listings`, optionally with its homeowner embedded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub id: Uuid,
    pub homeowner_id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub room_type: Option<String>,
    #[serde(default)]
    pub bathroom_type: Option<String>,
    pub monthly_rent: f64,
    #[serde(default)]
    pub available_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "null_to_default")]
    pub amenities: Vec<String>,
    #[serde(default)]
    pub closest_university: Option<String>,
    #[serde(default)]
    pub distance_to_university: Option<f64>,
    #[serde(default, deserialize_with = "null_to_default")]
    pub help_discount_amount: f64,
    #[serde(default, deserialize_with = "null_to_default")]
    pub help_types_needed: Vec<String>,
    #[serde(default)]
    pub help_description: Option<String>,
    #[serde(default, deserialize_with = "null_to_default")]
    pub photos: Vec<String>,
    #[serde(default, deserialize_with = "null_to_default")]
    pub is_active: bool,
    #[serde(default, deserialize_with = "null_to_default")]
    pub view_count: i64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homeowner: Option<HomeownerSummary>,
}

impl Listing {
    pub fn has_help_discount(&self) -> bool {
        self.help_discount_amount > 0.0
    }
}

/// Public homeowner fields embedded in listing reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HomeownerSummary {
    pub id: Uuid,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
    #[serde(default, deserialize_with = "null_to_default")]
    pub is_verified: bool,
    #[serde(default)]
    pub bio: Option<String>,
}

/// An embedded listing reduced to its homeowner profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingOwner {
    #[serde(default)]
    pub homeowner: Option<Profile>,
}

/// Input for creating a listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewListing {
    pub title: String,
    pub description: Option<String>,
    pub room_type: Option<String>,
    pub bathroom_type: Option<String>,
    pub monthly_rent: f64,
    pub available_date: Option<NaiveDate>,
    #[serde(default)]
    pub amenities: Vec<String>,
    pub closest_university: Option<String>,
    pub distance_to_university: Option<f64>,
    pub help_discount_amount: Option<f64>,
    #[serde(default)]
    pub help_types_needed: Vec<String>,
    pub help_description: Option<String>,
    #[serde(default)]
    pub photos: Vec<String>,
}

impl NewListing {
    /// Row to insert for `homeowner_id`.
    pub fn into_row(self, homeowner_id: Uuid) -> Value {
        json!({
            "homeowner_id": homeowner_id,
            "title": self.title,
            "description": self.description,
            "room_type": self.room_type,
            "bathroom_type": self.bathroom_type,
            "monthly_rent": self.monthly_rent,
            "available_date": self.available_date,
            "amenities": self.amenities,
            "closest_university": self.closest_university,
            "distance_to_university": self.distance_to_university,
            "help_discount_amount": self.help_discount_amount.unwrap_or(0.0),
            "help_types_needed": self.help_types_needed,
            "help_description": non_blank(self.help_description),
            "photos": self.photos,
        })
    }
}

/// Columns of `room_listings` the owner may change.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListingUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bathroom_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_rent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amenities: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closest_university: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_to_university: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help_discount_amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help_types_needed: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photos: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

/// Optional search predicates, combined conjunctively.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListingFilters {
    #[serde(default)]
    pub university: Option<String>,
    #[serde(default)]
    pub max_price: Option<f64>,
    #[serde(default)]
    pub has_help_discount: Option<bool>,
}

impl ListingFilters {
    /// Add the set predicates to `query`. A blank university and a max price
    /// that is not positive are ignored.
    pub fn apply(&self, mut query: Query) -> Query {
        if let Some(university) = non_blank(self.university.clone()) {
            query = query.eq("closest_university", university);
        }
        if let Some(max_price) = self.max_price.filter(|p| *p > 0.0) {
            query = query.lte("monthly_rent", max_price);
        }
        match self.has_help_discount {
            Some(true) => query = query.gt("help_discount_amount", 0),
            Some(false) => query = query.eq("help_discount_amount", 0),
            None => {}
        }
        query
    }
}

/// The `id, view_count` projection used for stats.
#[derive(Debug, Clone, Deserialize)]
pub struct ListingViews {
    pub id: Uuid,
    #[serde(default)]
    pub view_count: Option<i64>,
}

/// Aggregate counters for a homeowner's listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingStats {
    pub total_views: i64,
    pub total_applications: u64,
    pub new_applications: u64,
}
