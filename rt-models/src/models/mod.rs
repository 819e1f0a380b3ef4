//! Entity model definitions.
//!
//! One module per backend table (or closely related group of tables). Row
//! types deserialize what the backend returns, including embedded joins;
//! `New*` and `*Update` types describe what this client writes.

pub mod principal;
pub mod profile;
pub mod listing;
pub mod application;
pub mod message;
pub mod saved_listing;
pub mod contact;

use serde::{Deserialize, Deserializer};

/// Deserialize a nullable column into its `Default` when it is null.
pub(crate) fn null_to_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Turn a blank optional string into `None`.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
