//! In-Memory Document Store Adapter
//!
//! Holds the whole database as one JSON tree. Mirrors the Realtime
//! Database semantics the activation flow depends on: `null` deletes,
//! writes create missing parents, `push` keys sort by creation time.
//! Used for development and tests.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::foundation::Timestamp;
use crate::ports::{path_segments, DocumentStore, StoreError};

/// In-memory JSON document tree.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDocumentStore {
    root: Arc<RwLock<Value>>,
}

impl InMemoryDocumentStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            root: Arc::new(RwLock::new(Value::Object(Map::new()))),
        }
    }

    /// Create a store seeded with `root` (useful for tests).
    pub fn with_root(root: Value) -> Self {
        Self {
            root: Arc::new(RwLock::new(root)),
        }
    }

    /// Copy of the whole tree.
    pub async fn snapshot(&self) -> Value {
        self.root.read().await.clone()
    }
}

fn lookup<'a>(root: &'a Value, segments: &[&str]) -> Option<&'a Value> {
    segments
        .iter()
        .try_fold(root, |node, segment| node.as_object()?.get(*segment))
}

/// Walks to `segments`, turning every node on the way into an object.
fn lookup_or_create<'a>(root: &'a mut Value, segments: &[&str]) -> &'a mut Value {
    let mut node = root;
    for segment in segments {
        if !node.is_object() {
            *node = Value::Object(Map::new());
        }
        node = match node {
            Value::Object(map) => map
                .entry((*segment).to_string())
                .or_insert_with(|| Value::Object(Map::new())),
            _ => unreachable!("node was just made an object"),
        };
    }
    node
}

fn remove_at(root: &mut Value, segments: &[&str]) {
    let Some((last, parents)) = segments.split_last() else {
        return;
    };
    let mut node = root;
    for segment in parents {
        match node.as_object_mut().and_then(|map| map.get_mut(*segment)) {
            Some(child) => node = child,
            None => return,
        }
    }
    if let Some(map) = node.as_object_mut() {
        map.remove(*last);
    }
}

/// Time-prefixed key so pushed children list in insertion order.
fn push_key() -> String {
    format!(
        "{:012x}{}",
        Timestamp::now().as_unix_millis(),
        &Uuid::new_v4().simple().to_string()[..8]
    )
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn get(&self, path: &str) -> Result<Option<Value>, StoreError> {
        let segments = path_segments(path)?;
        let root = self.root.read().await;
        Ok(lookup(&root, &segments)
            .filter(|v| !v.is_null())
            .cloned())
    }

    async fn set(&self, path: &str, value: Value) -> Result<(), StoreError> {
        let segments = path_segments(path)?;
        let mut root = self.root.write().await;
        if value.is_null() {
            remove_at(&mut root, &segments);
        } else {
            *lookup_or_create(&mut root, &segments) = value;
        }
        Ok(())
    }

    async fn update(&self, path: &str, fields: Map<String, Value>) -> Result<(), StoreError> {
        let segments = path_segments(path)?;
        let mut root = self.root.write().await;
        let node = lookup_or_create(&mut root, &segments);
        if !node.is_object() {
            *node = Value::Object(Map::new());
        }
        if let Value::Object(map) = node {
            for (key, value) in fields {
                if value.is_null() {
                    map.remove(&key);
                } else {
                    map.insert(key, value);
                }
            }
        }
        Ok(())
    }

    async fn remove(&self, path: &str) -> Result<(), StoreError> {
        let segments = path_segments(path)?;
        let mut root = self.root.write().await;
        remove_at(&mut root, &segments);
        Ok(())
    }

    async fn push(&self, path: &str, value: Value) -> Result<String, StoreError> {
        let segments = path_segments(path)?;
        let key = push_key();
        let mut root = self.root.write().await;
        let node = lookup_or_create(&mut root, &segments);
        if !node.is_object() {
            *node = Value::Object(Map::new());
        }
        if let Value::Object(map) = node {
            map.insert(key.clone(), value);
        }
        Ok(key)
    }

    async fn find_by_child(
        &self,
        path: &str,
        child: &str,
        value: &str,
    ) -> Result<Vec<(String, Value)>, StoreError> {
        let segments = path_segments(path)?;
        let root = self.root.read().await;
        let Some(Value::Object(children)) = lookup(&root, &segments) else {
            return Ok(Vec::new());
        };
        Ok(children
            .iter()
            .filter(|(_, node)| node.get(child).and_then(Value::as_str) == Some(value))
            .map(|(key, node)| (key.clone(), node.clone()))
            .collect())
    }
}
