//! DocumentStore port - Path-addressed JSON document database.
//!
//! Models the Realtime Database surface the activation flow needs. Paths
//! are slash-separated (`users/u1/subscription`). There are no
//! transactions across paths: callers order their writes and rely on
//! idempotent overwrites to converge.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::domain::subscription::ActivationError;
use crate::domain::webhook::WebhookError;

/// Errors that can occur during document store operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("Invalid path '{0}'")]
    InvalidPath(String),

    #[error("Failed to (de)serialize document at '{path}': {message}")]
    Serialization { path: String, message: String },

    #[error("Store rejected request: {0}")]
    Backend(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn serialization(path: impl Into<String>, message: impl Into<String>) -> Self {
        StoreError::Serialization {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Port for a path-addressed document database.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Reads the document at `path`; `None` if nothing is stored there.
    async fn get(&self, path: &str) -> Result<Option<Value>, StoreError>;

    /// Replaces the document at `path`.
    async fn set(&self, path: &str, value: Value) -> Result<(), StoreError>;

    /// Merges `fields` into the object at `path`.
    ///
    /// Keys mapped to `null` are removed. Missing parents are created.
    async fn update(&self, path: &str, fields: Map<String, Value>) -> Result<(), StoreError>;

    /// Deletes the document at `path`. Deleting a missing path succeeds.
    async fn remove(&self, path: &str) -> Result<(), StoreError>;

    /// Appends `value` under an auto-generated key and returns the key.
    async fn push(&self, path: &str, value: Value) -> Result<String, StoreError>;

    /// Children of `path` whose `child` field equals `value`.
    async fn find_by_child(
        &self,
        path: &str,
        child: &str,
        value: &str,
    ) -> Result<Vec<(String, Value)>, StoreError>;
}

/// Typed helpers on top of [`DocumentStore`].
#[async_trait]
pub trait DocumentStoreExt: DocumentStore {
    /// Reads and deserializes the document at `path`.
    async fn read<T>(&self, path: &str) -> Result<Option<T>, StoreError>
    where
        T: DeserializeOwned + Send,
    {
        match self.get(path).await? {
            None | Some(Value::Null) => Ok(None),
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| StoreError::serialization(path, e.to_string())),
        }
    }

    /// Serializes `document` and replaces the document at `path`.
    async fn write<T>(&self, path: &str, document: &T) -> Result<(), StoreError>
    where
        T: Serialize + Sync,
    {
        let value = serde_json::to_value(document)
            .map_err(|e| StoreError::serialization(path, e.to_string()))?;
        self.set(path, value).await
    }
}

impl<S: DocumentStore + ?Sized> DocumentStoreExt for S {}

/// Splits a path into its non-empty segments, rejecting characters the
/// Realtime Database does not allow in keys.
pub fn path_segments(path: &str) -> Result<Vec<&str>, StoreError> {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if segments.is_empty() {
        return Err(StoreError::InvalidPath(path.to_string()));
    }
    if segments
        .iter()
        .any(|s| s.contains(&['.', '#', '$', '[', ']'][..]))
    {
        return Err(StoreError::InvalidPath(path.to_string()));
    }
    Ok(segments)
}

impl From<StoreError> for ActivationError {
    fn from(err: StoreError) -> Self {
        ActivationError::Store(err.to_string())
    }
}

impl From<StoreError> for WebhookError {
    fn from(err: StoreError) -> Self {
        WebhookError::Database(err.to_string())
    }
}
