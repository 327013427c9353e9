//! Firebase Realtime Database adapter.
//!
//! Talks to the REST surface: every path maps to `{base}/{path}.json`.
//! GET reads, PUT replaces, PATCH merges (null values delete), DELETE
//! removes and POST appends under a generated key.
//!
//! # Configuration
//!
//! ```ignore
//! let store = FirebaseDocumentStore::new(
//!     FirebaseConfig::new("https://my-app.firebaseio.com", secret),
//! );
//! ```

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::ports::{path_segments, DocumentStore, StoreError};

/// Connection settings for one database instance.
#[derive(Clone)]
pub struct FirebaseConfig {
    base_url: String,
    /// Database secret or ID token, sent as `auth`.
    auth: Option<SecretString>,
}

impl FirebaseConfig {
    pub fn new(base_url: impl Into<String>, auth: Option<SecretString>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth,
        }
    }
}

/// Response body of a POST (push).
#[derive(Deserialize)]
struct PushResponse {
    name: String,
}

pub struct FirebaseDocumentStore {
    config: FirebaseConfig,
    http_client: reqwest::Client,
}

impl FirebaseDocumentStore {
    pub fn new(config: FirebaseConfig) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
        }
    }

    /// REST URL for `path`, without query parameters.
    fn url(&self, path: &str) -> Result<String, StoreError> {
        let segments = path_segments(path)?;
        Ok(format!("{}/{}.json", self.config.base_url, segments.join("/")))
    }

    fn auth_query(&self) -> Vec<(&'static str, String)> {
        self.config
            .auth
            .as_ref()
            .map(|secret| vec![("auth", secret.expose_secret().clone())])
            .unwrap_or_default()
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        path: &str,
    ) -> Result<reqwest::Response, StoreError> {
        let response = request
            .query(&self.auth_query())
            .send()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        tracing::warn!(path, status = %status, body = %body, "Realtime Database request failed");
        if status.is_server_error() || status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            Err(StoreError::Unavailable(format!("{status} on '{path}'")))
        } else {
            Err(StoreError::Backend(format!("{status} on '{path}': {body}")))
        }
    }

    async fn json_body(response: reqwest::Response, path: &str) -> Result<Value, StoreError> {
        response
            .json::<Value>()
            .await
            .map_err(|e| StoreError::serialization(path, e.to_string()))
    }
}

/// Query parameters for an equality filter on a child key.
///
/// The REST API expects both values JSON-encoded, quotes included.
fn child_equality_query(child: &str, value: &str) -> Vec<(&'static str, String)> {
    vec![
        ("orderBy", Value::String(child.to_string()).to_string()),
        ("equalTo", Value::String(value.to_string()).to_string()),
    ]
}

#[async_trait]
impl DocumentStore for FirebaseDocumentStore {
    async fn get(&self, path: &str) -> Result<Option<Value>, StoreError> {
        let url = self.url(path)?;
        let response = self.send(self.http_client.get(url), path).await?;
        match Self::json_body(response, path).await? {
            Value::Null => Ok(None),
            value => Ok(Some(value)),
        }
    }

    async fn set(&self, path: &str, value: Value) -> Result<(), StoreError> {
        let url = self.url(path)?;
        self.send(self.http_client.put(url).json(&value), path).await?;
        Ok(())
    }

    async fn update(&self, path: &str, fields: Map<String, Value>) -> Result<(), StoreError> {
        let url = self.url(path)?;
        self.send(self.http_client.patch(url).json(&fields), path)
            .await?;
        Ok(())
    }

    async fn remove(&self, path: &str) -> Result<(), StoreError> {
        let url = self.url(path)?;
        self.send(self.http_client.delete(url), path).await?;
        Ok(())
    }

    async fn push(&self, path: &str, value: Value) -> Result<String, StoreError> {
        let url = self.url(path)?;
        let response = self.send(self.http_client.post(url).json(&value), path).await?;
        let pushed: PushResponse = response
            .json()
            .await
            .map_err(|e| StoreError::serialization(path, e.to_string()))?;
        Ok(pushed.name)
    }

    async fn find_by_child(
        &self,
        path: &str,
        child: &str,
        value: &str,
    ) -> Result<Vec<(String, Value)>, StoreError> {
        let url = self.url(path)?;
        let request = self
            .http_client
            .get(url)
            .query(&child_equality_query(child, value));
        let response = self.send(request, path).await?;

        match Self::json_body(response, path).await? {
            Value::Object(children) => Ok(children.into_iter().collect()),
            _ => Ok(Vec::new()),
        }
    }
}
