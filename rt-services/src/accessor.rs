//! Shared plumbing for the accessors.
//!
//! Every accessor is a stateless façade over the injected `Backend`. The
//! helpers here resolve the caller and decode rows into typed records.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use rt_api::{expect_single, maybe_single, Backend};
use rt_core::error::{RtError, RtResult};
use rt_models::Principal;

/// Common surface of every accessor.
pub trait Accessor: Send + Sync {
    /// Human-readable name of this accessor.
    fn name(&self) -> &'static str;
}

/// The signed-in caller, or `NotAuthenticated`.
///
/// Runs before any data call of an operation that needs an identity.
pub async fn require_principal(backend: &dyn Backend) -> RtResult<Principal> {
    match backend.current_user().await? {
        Some(principal) => Ok(principal),
        None => {
            debug!("operation requires a signed-in caller");
            Err(RtError::NotAuthenticated)
        }
    }
}

pub fn decode<T: DeserializeOwned>(row: Value) -> RtResult<T> {
    Ok(serde_json::from_value(row)?)
}

pub fn decode_rows<T: DeserializeOwned>(rows: Vec<Value>) -> RtResult<Vec<T>> {
    rows.into_iter().map(decode).collect()
}

/// Decode the only row of a single-object read.
pub fn decode_single<T: DeserializeOwned>(rows: Vec<Value>) -> RtResult<T> {
    decode(expect_single(rows)?)
}

/// Decode zero or one row.
pub fn decode_maybe_single<T: DeserializeOwned>(rows: Vec<Value>) -> RtResult<Option<T>> {
    maybe_single(rows)?.map(decode).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Row {
        id: u32,
    }

    #[test]
    fn test_decode_helpers() {
        let rows: Vec<Row> = decode_rows(vec![json!({"id": 1}), json!({"id": 2})]).unwrap();
        assert_eq!(rows.len(), 2);

        assert_eq!(decode_single::<Row>(vec![json!({"id": 3})]).unwrap(), Row { id: 3 });
        assert!(decode_single::<Row>(vec![]).is_err());

        assert_eq!(decode_maybe_single::<Row>(vec![]).unwrap(), None);
        assert!(matches!(
            decode_maybe_single::<Row>(vec![json!({"id": "x"})]),
            Err(RtError::Serialization(_))
        ));
    }
}
