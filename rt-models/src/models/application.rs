//! Rental applications.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use super::listing::{Listing, ListingOwner};
use super::non_blank;
use super::profile::{Profile, RenterProfile};

/// Lifecycle state of an application.
///
/// The backend owns the set of states; values this client has no name for
/// are carried through as `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ApplicationStatus {
    Pending,
    Accepted,
    Rejected,
    Withdrawn,
    Other(String),
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
            Self::Withdrawn => "withdrawn",
            Self::Other(s) => s,
        }
    }

    /// Parse user input. Known names are case-insensitive; anything else
    /// non-blank becomes `Other`.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.is_empty() {
            return None;
        }
        Some(Self::from(s.to_ascii_lowercase()))
    }
}

impl From<String> for ApplicationStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "pending" => Self::Pending,
            "accepted" => Self::Accepted,
            "rejected" => Self::Rejected,
            "withdrawn" => Self::Withdrawn,
            _ => Self::Other(s),
        }
    }
}

impl From<ApplicationStatus> for String {
    fn from(status: ApplicationStatus) -> Self {
        match status {
            ApplicationStatus::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A row of `applications`, with whichever embeds the read selected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub id: Uuid,
    pub listing_id: Uuid,
    pub renter_id: Uuid,
    #[serde(default)]
    pub message: Option<String>,
    pub status: ApplicationStatus,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub listing: Option<Listing>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub renter: Option<Profile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub renter_profile: Option<RenterProfile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homeowner: Option<ListingOwner>,
}

impl Application {
    /// Row for a new application; always starts `pending`.
    pub fn new_row(listing_id: Uuid, renter_id: Uuid, message: Option<String>) -> Value {
        json!({
            "listing_id": listing_id,
            "renter_id": renter_id,
            "message": non_blank(message),
            "status": ApplicationStatus::Pending,
        })
    }

    /// Patch body changing only the status.
    pub fn status_patch(status: ApplicationStatus) -> Value {
        json!({ "status": status })
    }

    /// The homeowner profile, when the read embedded it.
    pub fn homeowner_profile(&self) -> Option<&Profile> {
        self.homeowner.as_ref().and_then(|owner| owner.homeowner.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trips_wire_name() {
        for status in [
            ApplicationStatus::Pending,
            ApplicationStatus::Accepted,
            ApplicationStatus::Rejected,
            ApplicationStatus::Withdrawn,
        ] {
            assert_eq!(ApplicationStatus::parse(status.as_str()), Some(status.clone()));
            assert_eq!(serde_json::to_value(&status).unwrap(), status.as_str());
        }
        assert_eq!(ApplicationStatus::parse(" Accepted "), Some(ApplicationStatus::Accepted));
        assert_eq!(
            ApplicationStatus::parse("approved"),
            Some(ApplicationStatus::Other("approved".into()))
        );
        assert_eq!(ApplicationStatus::parse("  "), None);
    }

    #[test]
    fn test_unlisted_status_decodes_and_encodes_unchanged() {
        let json = json!({
            "id": "00000000-0000-0000-0000-00000000000a",
            "listing_id": "00000000-0000-0000-0000-00000000000b",
            "renter_id": "00000000-0000-0000-0000-00000000000c",
            "status": "approved"
        });
        let app: Application = serde_json::from_value(json).unwrap();
        assert_eq!(app.status, ApplicationStatus::Other("approved".into()));
        assert_eq!(app.status.to_string(), "approved");

        let patch = Application::status_patch(app.status);
        assert_eq!(patch, json!({"status": "approved"}));
    }

    #[test]
    fn test_new_row_is_pending_with_blank_message_nulled() {
        let row = Application::new_row(Uuid::nil(), Uuid::nil(), Some("  ".into()));
        assert_eq!(row["status"], "pending");
        assert!(row["message"].is_null());

        let row = Application::new_row(Uuid::nil(), Uuid::nil(), Some("Hi!".into()));
        assert_eq!(row["message"], "Hi!");
    }

    #[test]
    fn test_renter_read_shape() {
        let json = json!({
            "id": "00000000-0000-0000-0000-00000000000a",
            "listing_id": "00000000-0000-0000-0000-00000000000b",
            "renter_id": "00000000-0000-0000-0000-00000000000c",
            "message": null,
            "status": "accepted",
            "homeowner": {
                "homeowner": {"id": "00000000-0000-0000-0000-00000000000d", "first_name": "Lee"}
            }
        });
        let app: Application = serde_json::from_value(json).unwrap();
        assert_eq!(app.status, ApplicationStatus::Accepted);
        assert_eq!(
            app.homeowner_profile().and_then(|p| p.first_name.as_deref()),
            Some("Lee")
        );
        assert!(app.listing.is_none());
    }
}
