//! Entries written to the `webhook_errors` collection.

use serde::Serialize;

use crate::domain::foundation::Timestamp;

use super::{WebhookError, WebhookErrorKind};

/// One logged webhook failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WebhookErrorLogEntry {
    pub error_type: WebhookErrorKind,
    pub message: String,
    /// Raw body, or `null` when it was not valid JSON.
    pub payload: serde_json::Value,
    pub timestamp: Timestamp,
    pub retry_count: u32,
    pub retryable: bool,
}

impl WebhookErrorLogEntry {
    pub fn new(error: &WebhookError, payload: serde_json::Value, retry_count: u32) -> Self {
        Self {
            error_type: error.kind(),
            message: error.to_string(),
            payload,
            timestamp: Timestamp::now(),
            retry_count,
            retryable: error.is_retryable(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn entry_copies_taxonomy_from_error() {
        let error = WebhookError::UserNotFound("a@b.pk".to_string());
        let entry = WebhookErrorLogEntry::new(&error, json!({"event": "x"}), 0);

        assert_eq!(entry.error_type, WebhookErrorKind::UserNotFound);
        assert!(entry.retryable);
        assert_eq!(entry.message, "User not found for email a@b.pk");
    }

    #[test]
    fn entry_serializes_error_type_code() {
        let error = WebhookError::SignatureInvalid("bad".to_string());
        let entry = WebhookErrorLogEntry::new(&error, serde_json::Value::Null, 0);
        let json = serde_json::to_value(&entry).unwrap();

        assert_eq!(json["error_type"], "SIGNATURE_INVALID");
        assert_eq!(json["retryable"], false);
        assert_eq!(json["retry_count"], 0);
    }
}
