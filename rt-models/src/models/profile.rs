//! Profile records: the base profile plus renter and homeowner extensions.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use super::{non_blank, null_to_default};

/// Marketplace role of a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    Renter,
    Homeowner,
}

impl UserType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Renter => "renter",
            Self::Homeowner => "homeowner",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "renter" => Some(Self::Renter),
            "homeowner" => Some(Self::Homeowner),
            _ => None,
        }
    }
}

impl std::fmt::Display for UserType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A row of `profiles`, one per auth user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    #[serde(default)]
    pub user_type: Option<UserType>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "null_to_default")]
    pub is_verified: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Profile {
    /// "First Last", falling back to whichever part exists, then the email.
    pub fn display_name(&self) -> String {
        let parts: Vec<&str> = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|p| !p.is_empty())
            .collect();
        if parts.is_empty() {
            self.email.clone().unwrap_or_else(|| self.id.to_string())
        } else {
            parts.join(" ")
        }
    }
}

/// Columns of `profiles` the owner may change.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_type: Option<UserType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// A row of `renter_profiles`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenterProfile {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub profile_id: Uuid,
    #[serde(default)]
    pub occupation_type: Option<String>,
    #[serde(default)]
    pub school_or_employer: Option<String>,
    #[serde(default)]
    pub personal_description: Option<String>,
    #[serde(default)]
    pub user_references: Option<Value>,
    #[serde(default)]
    pub desired_move_in_date: Option<NaiveDate>,
    #[serde(default)]
    pub preferred_lease_length: Option<String>,
    #[serde(default, deserialize_with = "null_to_default")]
    pub preferences: Value,
    #[serde(default, deserialize_with = "null_to_default")]
    pub help_types_offered: Vec<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Input for creating a renter extension.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewRenterProfile {
    pub occupation_type: Option<String>,
    pub school_or_employer: Option<String>,
    pub personal_description: Option<String>,
    pub references: Option<Value>,
    pub desired_move_in_date: Option<NaiveDate>,
    pub preferred_lease_length: Option<String>,
    pub preferences: Option<Value>,
    #[serde(default)]
    pub help_types_offered: Vec<String>,
}

impl NewRenterProfile {
    /// Row to insert; preferences default to `{}` and references to null.
    pub fn into_row(self, profile_id: Uuid) -> Value {
        json!({
            "profile_id": profile_id,
            "occupation_type": self.occupation_type,
            "school_or_employer": self.school_or_employer,
            "personal_description": self.personal_description,
            "user_references": self.references,
            "desired_move_in_date": self.desired_move_in_date,
            "preferred_lease_length": self.preferred_lease_length,
            "preferences": self.preferences.unwrap_or_else(|| json!({})),
            "help_types_offered": self.help_types_offered,
        })
    }
}

/// Columns of `renter_profiles` the owner may change.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RenterProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub occupation_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub school_or_employer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub personal_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_references: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub desired_move_in_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_lease_length: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferences: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help_types_offered: Option<Vec<String>>,
}

/// A row of `homeowner_profiles`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HomeownerProfile {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub profile_id: Uuid,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub zip_code: Option<String>,
    #[serde(default, deserialize_with = "null_to_default")]
    pub has_pets: bool,
    #[serde(default)]
    pub pet_details: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Input for creating a homeowner extension.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewHomeownerProfile {
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    #[serde(default)]
    pub has_pets: bool,
    pub pet_details: Option<String>,
}

impl NewHomeownerProfile {
    /// Row to insert; blank pet details are stored as null.
    pub fn into_row(self, profile_id: Uuid) -> Value {
        json!({
            "profile_id": profile_id,
            "address": self.address,
            "city": self.city,
            "state": self.state,
            "zip_code": self.zip_code,
            "has_pets": self.has_pets,
            "pet_details": non_blank(self.pet_details),
        })
    }
}

/// Columns of `homeowner_profiles` the owner may change.
#[derive(Debug, Clone, Default, Serialize)]
pub struct HomeownerProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zip_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_pets: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pet_details: Option<String>,
}

/// The role-specific half of a full profile.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ExtendedProfile {
    Renter(RenterProfile),
    Homeowner(HomeownerProfile),
}

/// A profile together with the extension matching its role.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FullProfile {
    #[serde(flatten)]
    pub profile: Profile,
    pub extended_profile: Option<ExtendedProfile>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(first: Option<&str>, last: Option<&str>) -> Profile {
        Profile {
            id: Uuid::nil(),
            user_type: Some(UserType::Renter),
            email: Some("jo@example.edu".into()),
            first_name: first.map(String::from),
            last_name: last.map(String::from),
            photo_url: None,
            bio: None,
            phone: None,
            is_verified: false,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_user_type_wire_names() {
        assert_eq!(serde_json::to_value(UserType::Homeowner).unwrap(), "homeowner");
        assert_eq!(UserType::parse(" Renter "), Some(UserType::Renter));
        assert_eq!(UserType::parse("landlord"), None);
    }

    #[test]
    fn test_display_name_fallbacks() {
        assert_eq!(profile(Some("Jo"), Some("Park")).display_name(), "Jo Park");
        assert_eq!(profile(None, Some("Park")).display_name(), "Park");
        assert_eq!(profile(None, None).display_name(), "jo@example.edu");
    }

    #[test]
    fn test_profile_tolerates_null_flags() {
        let json = r#"{"id":"00000000-0000-0000-0000-000000000001","user_type":"homeowner","is_verified":null}"#;
        let p: Profile = serde_json::from_str(json).unwrap();
        assert_eq!(p.user_type, Some(UserType::Homeowner));
        assert!(!p.is_verified);
    }

    #[test]
    fn test_new_renter_profile_defaults() {
        let row = NewRenterProfile {
            occupation_type: Some("student".into()),
            ..Default::default()
        }
        .into_row(Uuid::nil());
        assert_eq!(row["preferences"], json!({}));
        assert_eq!(row["help_types_offered"], json!([]));
        assert!(row["user_references"].is_null());
    }

    #[test]
    fn test_new_homeowner_profile_defaults() {
        let row = NewHomeownerProfile {
            city: Some("Austin".into()),
            pet_details: Some("  ".into()),
            ..Default::default()
        }
        .into_row(Uuid::nil());
        assert_eq!(row["has_pets"], false);
        assert!(row["pet_details"].is_null());
    }

    #[test]
    fn test_update_skips_unset_columns() {
        let update = ProfileUpdate {
            bio: Some("Grad student".into()),
            ..Default::default()
        };
        assert_eq!(serde_json::to_value(update).unwrap(), json!({"bio": "Grad student"}));
    }

    #[test]
    fn test_full_profile_flattens_base_columns() {
        let full = FullProfile {
            profile: profile(Some("Jo"), None),
            extended_profile: None,
        };
        let value = serde_json::to_value(full).unwrap();
        assert_eq!(value["first_name"], "Jo");
        assert!(value["extended_profile"].is_null());
    }
}
