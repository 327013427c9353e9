//! HTTP DTOs for the Whop webhook endpoint.

use serde::{Deserialize, Serialize};

/// Body returned for every POST delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookResponse {
    pub success: bool,
    /// Milliseconds spent handling the delivery.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_time: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Taxonomy code of the failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
}

impl WebhookResponse {
    pub fn ok(processing_time: u64) -> Self {
        Self {
            success: true,
            processing_time: Some(processing_time),
            error: None,
            error_type: None,
        }
    }

    pub fn failed(error: impl Into<String>, error_type: impl Into<String>, processing_time: u64) -> Self {
        Self {
            success: false,
            processing_time: Some(processing_time),
            error: Some(error.into()),
            error_type: Some(error_type.into()),
        }
    }
}

/// Query of the GET health check; Whop sends `challenge` when
/// registering the endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HealthQuery {
    #[serde(default)]
    pub challenge: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub endpoint: &'static str,
    pub timestamp: String,
}
