//! Response handling shared by the endpoint modules.
//!
//! Error bodies come in two dialects: PostgREST
//! (`{"code","message","details","hint"}`) and the auth server
//! (`{"error","error_description"}`, `{"msg"}`, or `{"code","error_code","msg"}`).
//! Both fold into `BackendError`.

use serde_json::Value;

use rt_core::error::{BackendError, RtResult};

/// PostgREST code for "expected one row, got zero or many".
pub const SINGLE_ROW_MISMATCH: &str = "PGRST116";

/// Build a `BackendError` from a failed response body.
///
/// Non-JSON bodies become the message verbatim; an empty body falls back to
/// the status reason.
pub fn backend_error(status: u16, body: &str, reason: &str) -> BackendError {
    let value: Value = match serde_json::from_str(body) {
        Ok(v @ Value::Object(_)) => v,
        _ => {
            let text = body.trim();
            let message = if text.is_empty() { reason } else { text };
            return BackendError::new(status, message);
        }
    };

    let text = |key: &str| -> Option<String> {
        match value.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    };

    let message = text("message")
        .or_else(|| text("msg"))
        .or_else(|| text("error_description"))
        .or_else(|| text("error"))
        .unwrap_or_else(|| reason.to_string());

    // Auth bodies put a numeric HTTP status in `code`; prefer `error_code`.
    let code = text("error_code")
        .or_else(|| text("code").filter(|c| c.parse::<u16>().is_err()))
        .or_else(|| text("error").filter(|_| value.get("error_description").is_some()));

    BackendError {
        status,
        code,
        message,
        details: text("details"),
        hint: text("hint"),
    }
}

/// Parse the total out of a `Content-Range` header (`0-24/3573`, `*/0`).
///
/// Returns `None` when the total is unknown (`*`) or the header is malformed.
pub fn parse_content_range(header: &str) -> Option<u64> {
    let (_, total) = header.trim().rsplit_once('/')?;
    total.parse().ok()
}

/// Exactly one row, or the same error the backend gives for a single-object read.
pub fn expect_single<T>(mut rows: Vec<T>) -> RtResult<T> {
    if rows.len() == 1 {
        if let Some(row) = rows.pop() {
            return Ok(row);
        }
    }
    Err(single_row_mismatch(rows.len()).into())
}

/// Zero or one row; more than one is an error.
pub fn maybe_single<T>(mut rows: Vec<T>) -> RtResult<Option<T>> {
    match rows.len() {
        0 => Ok(None),
        1 => Ok(rows.pop()),
        n => Err(single_row_mismatch(n).into()),
    }
}

fn single_row_mismatch(count: usize) -> BackendError {
    BackendError {
        status: 406,
        code: Some(SINGLE_ROW_MISMATCH.to_string()),
        message: "JSON object requested, multiple (or no) rows returned".to_string(),
        details: Some(format!("The result contains {count} rows")),
        hint: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rt_core::error::{RtError, UNIQUE_VIOLATION};

    #[test]
    fn test_postgrest_error_body() {
        let body = r#"{"code":"23505","details":"Key (user1_id, user2_id) already exists.","hint":null,"message":"duplicate key value violates unique constraint"}"#;
        let err = backend_error(409, body, "Conflict");
        assert_eq!(err.status, 409);
        assert_eq!(err.code.as_deref(), Some(UNIQUE_VIOLATION));
        assert!(err.is_unique_violation());
        assert_eq!(err.details.as_deref(), Some("Key (user1_id, user2_id) already exists."));
        assert_eq!(err.hint, None);
    }

    #[test]
    fn test_auth_error_bodies() {
        let err = backend_error(
            400,
            r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#,
            "Bad Request",
        );
        assert_eq!(err.message, "Invalid login credentials");
        assert_eq!(err.code.as_deref(), Some("invalid_grant"));

        let err = backend_error(
            422,
            r#"{"code":422,"error_code":"weak_password","msg":"Password should be at least 6 characters"}"#,
            "Unprocessable Entity",
        );
        assert_eq!(err.code.as_deref(), Some("weak_password"));
        assert_eq!(err.message, "Password should be at least 6 characters");
    }

    #[test]
    fn test_non_json_body() {
        assert_eq!(backend_error(502, "", "Bad Gateway").message, "Bad Gateway");
        assert_eq!(backend_error(500, "upstream down\n", "x").message, "upstream down");
    }

    #[test]
    fn test_parse_content_range() {
        assert_eq!(parse_content_range("0-24/3573"), Some(3573));
        assert_eq!(parse_content_range("*/0"), Some(0));
        assert_eq!(parse_content_range("0-9/*"), None);
        assert_eq!(parse_content_range("garbage"), None);
    }

    #[test]
    fn test_single_row_helpers() {
        assert_eq!(expect_single(vec![7]).unwrap(), 7);
        assert_eq!(maybe_single(Vec::<i32>::new()).unwrap(), None);
        assert_eq!(maybe_single(vec![3]).unwrap(), Some(3));

        let err = expect_single(Vec::<i32>::new()).unwrap_err();
        let backend = err.backend().unwrap();
        assert_eq!(backend.status, 406);
        assert_eq!(backend.code.as_deref(), Some(SINGLE_ROW_MISMATCH));

        assert!(matches!(maybe_single(vec![1, 2]), Err(RtError::Backend(_))));
    }
}
