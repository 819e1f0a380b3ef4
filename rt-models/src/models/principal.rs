//! The signed-in identity.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The authenticated user, as reported by the auth endpoint.
///
/// Only `id` is used by the accessors (as a foreign key); the rest is
/// carried for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Principal {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: serde_json::Value,
}

impl Principal {
    /// A principal with just an id.
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            email: None,
            user_metadata: serde_json::Value::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_principal_from_auth_user() {
        let json = r#"{
            "id": "6f1c3c1e-6d2a-4f7b-9a55-2f6f4d3c2b1a",
            "aud": "authenticated",
            "email": "sam@example.edu",
            "user_metadata": {"user_type": "renter"}
        }"#;
        let p: Principal = serde_json::from_str(json).unwrap();
        assert_eq!(p.email.as_deref(), Some("sam@example.edu"));
        assert_eq!(p.user_metadata["user_type"], "renter");
    }
}
