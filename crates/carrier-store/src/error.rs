//! Error types for carrier store operations.
//!
//! Store-layer errors propagate unmodified to the calling controller.
//! Nothing in this crate retries.

use serde::Deserialize;
use thiserror::Error;

/// Error type for all carrier operations.
#[derive(Debug, Error)]
pub enum CarrierError {
    /// Network or transport-level HTTP error from reqwest.
    ///
    /// Includes connection failures, timeouts, and TLS errors.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The store answered with a non-success status that is not a
    /// constraint rejection or a missing row.
    ///
    /// Common causes: authentication failure, RLS policy violation,
    /// malformed range or filter.
    #[error("Supabase error: {status} - {message}")]
    Store {
        /// The HTTP status code returned by the store.
        status: u16,
        /// The response body or error message.
        message: String,
    },

    /// The store rejected the row (unique, not-null or check constraint).
    #[error("Validation failed: {0}")]
    Validation(String),

    /// No row matches the referenced id.
    #[error("Carrier not found: {id}")]
    NotFound { id: String },

    /// Required field left empty. Raised client-side, never reaches the store.
    #[error("The {field} field is required")]
    EmptyField { field: &'static str },

    /// JSON serialization or deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid client setup (bad URL, missing credentials).
    #[error("Configuration error: {0}")]
    Config(String),
}

impl CarrierError {
    /// Returns true for failures that may succeed on a manual retry:
    /// connection errors, timeouts and 5xx answers.
    pub fn is_transient(&self) -> bool {
        match self {
            CarrierError::Http(e) => {
                if e.is_connect() || e.is_timeout() {
                    return true;
                }
                e.status().is_some_and(|s| s.is_server_error())
            }
            CarrierError::Store { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Map a failed PostgREST response to the error taxonomy.
    ///
    /// `id` names the row the request targeted, if any, so that an empty
    /// single-row answer becomes `NotFound`.
    pub fn from_response(status: u16, body: &str, id: Option<&str>) -> Self {
        let parsed = serde_json::from_str::<PostgrestErrorBody>(body).ok();
        let code = parsed.as_ref().and_then(|b| b.code.as_deref()).unwrap_or("");
        let message = parsed
            .as_ref()
            .and_then(|b| b.message.clone())
            .unwrap_or_else(|| body.to_string());

        // PGRST116: single object requested but zero rows matched.
        if code == "PGRST116" {
            return CarrierError::NotFound {
                id: id.unwrap_or_default().to_string(),
            };
        }

        // SQLSTATE class 23: integrity constraint violation.
        if code.starts_with("23") || status == 409 {
            return CarrierError::Validation(message);
        }

        CarrierError::Store { status, message }
    }
}

/// Error payload returned by PostgREST.
#[derive(Debug, Deserialize)]
struct PostgrestErrorBody {
    code: Option<String>,
    message: Option<String>,
}

/// Convenience Result type alias for carrier operations.
pub type CarrierResult<T> = Result<T, CarrierError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_violation_is_validation() {
        let body = r#"{"code":"23505","details":null,"hint":null,"message":"duplicate key value violates unique constraint \"carriers_name_key\""}"#;
        match CarrierError::from_response(409, body, None) {
            CarrierError::Validation(message) => assert!(message.contains("duplicate key")),
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn not_null_violation_is_validation_even_on_400() {
        let body = r#"{"code":"23502","message":"null value in column \"name\""}"#;
        assert!(matches!(
            CarrierError::from_response(400, body, None),
            CarrierError::Validation(_)
        ));
    }

    #[test]
    fn single_row_miss_is_not_found() {
        let body = r#"{"code":"PGRST116","message":"JSON object requested, multiple (or no) rows returned"}"#;
        match CarrierError::from_response(406, body, Some("42")) {
            CarrierError::NotFound { id } => assert_eq!(id, "42"),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn permission_failure_is_store_error() {
        let body = r#"{"code":"42501","message":"permission denied for table carriers"}"#;
        match CarrierError::from_response(401, body, None) {
            CarrierError::Store { status, message } => {
                assert_eq!(status, 401);
                assert!(message.contains("permission denied"));
            }
            other => panic!("expected Store, got {other:?}"),
        }
    }

    #[test]
    fn non_json_body_is_kept_verbatim() {
        match CarrierError::from_response(502, "Bad Gateway", None) {
            CarrierError::Store { message, .. } => assert_eq!(message, "Bad Gateway"),
            other => panic!("expected Store, got {other:?}"),
        }
    }

    #[test]
    fn transient_classification() {
        assert!(CarrierError::Store {
            status: 503,
            message: String::new()
        }
        .is_transient());
        assert!(!CarrierError::Store {
            status: 401,
            message: String::new()
        }
        .is_transient());
        assert!(!CarrierError::Validation("dup".into()).is_transient());
        assert!(!CarrierError::EmptyField { field: "name" }.is_transient());
    }
}
