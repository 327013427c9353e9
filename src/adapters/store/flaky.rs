//! Fault-injecting document store for testing.
//!
//! Wraps another [`DocumentStore`] and fails operations on chosen path
//! prefixes. Supports:
//! - Failing writes or reads a fixed number of times, or forever
//! - Call tracking

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::ports::{DocumentStore, StoreError};

/// Which operations a fault applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultTarget {
    /// set, update, remove, push
    Writes,
    /// get, find_by_child
    Reads,
}

#[derive(Debug, Clone)]
struct Fault {
    prefix: String,
    target: FaultTarget,
    /// `None` fails forever.
    remaining: Option<u32>,
}

/// Recorded store call, counted by [`FlakyDocumentStore::call_count`].
#[derive(Debug, Clone)]
struct StoreCall {
    operation: &'static str,
    path: String,
}

#[derive(Default)]
struct FlakyState {
    faults: Vec<Fault>,
    calls: Vec<StoreCall>,
}

/// Document store that fails on demand.
///
/// # Example
///
/// ```ignore
/// let store = FlakyDocumentStore::new(InMemoryDocumentStore::new());
/// store.fail_writes("usage/", Some(2));
/// ```
pub struct FlakyDocumentStore<S> {
    inner: S,
    state: Arc<Mutex<FlakyState>>,
}

impl<S: DocumentStore> FlakyDocumentStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            state: Arc::new(Mutex::new(FlakyState::default())),
        }
    }

    /// Fail writes under `prefix`, `times` times or forever when `None`.
    pub fn fail_writes(&self, prefix: impl Into<String>, times: Option<u32>) {
        self.add_fault(prefix.into(), FaultTarget::Writes, times);
    }

    /// Fail reads under `prefix`, `times` times or forever when `None`.
    pub fn fail_reads(&self, prefix: impl Into<String>, times: Option<u32>) {
        self.add_fault(prefix.into(), FaultTarget::Reads, times);
    }

    /// Number of calls of `operation` whose path starts with `prefix`.
    pub fn call_count(&self, operation: &str, prefix: &str) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.operation == operation && c.path.starts_with(prefix))
            .count()
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn add_fault(&self, prefix: String, target: FaultTarget, remaining: Option<u32>) {
        self.lock().faults.push(Fault {
            prefix,
            target,
            remaining,
        });
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FlakyState> {
        // A poisoned lock only means a test thread panicked; keep the data.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Records the call and returns an error if a fault fires.
    fn intercept(
        &self,
        operation: &'static str,
        target: FaultTarget,
        path: &str,
    ) -> Result<(), StoreError> {
        let mut state = self.lock();
        state.calls.push(StoreCall {
            operation,
            path: path.to_string(),
        });

        let fault = state.faults.iter_mut().find(|f| {
            f.target == target && path.starts_with(&f.prefix) && f.remaining != Some(0)
        });
        match fault {
            Some(fault) => {
                if let Some(n) = fault.remaining.as_mut() {
                    *n -= 1;
                }
                Err(StoreError::Unavailable(format!(
                    "injected failure on {operation} '{path}'"
                )))
            }
            None => Ok(()),
        }
    }
}

#[async_trait]
impl<S: DocumentStore> DocumentStore for FlakyDocumentStore<S> {
    async fn get(&self, path: &str) -> Result<Option<Value>, StoreError> {
        self.intercept("get", FaultTarget::Reads, path)?;
        self.inner.get(path).await
    }

    async fn set(&self, path: &str, value: Value) -> Result<(), StoreError> {
        self.intercept("set", FaultTarget::Writes, path)?;
        self.inner.set(path, value).await
    }

    async fn update(&self, path: &str, fields: Map<String, Value>) -> Result<(), StoreError> {
        self.intercept("update", FaultTarget::Writes, path)?;
        self.inner.update(path, fields).await
    }

    async fn remove(&self, path: &str) -> Result<(), StoreError> {
        self.intercept("remove", FaultTarget::Writes, path)?;
        self.inner.remove(path).await
    }

    async fn push(&self, path: &str, value: Value) -> Result<String, StoreError> {
        self.intercept("push", FaultTarget::Writes, path)?;
        self.inner.push(path, value).await
    }

    async fn find_by_child(
        &self,
        path: &str,
        child: &str,
        value: &str,
    ) -> Result<Vec<(String, Value)>, StoreError> {
        self.intercept("find_by_child", FaultTarget::Reads, path)?;
        self.inner.find_by_child(path, child, value).await
    }
}
