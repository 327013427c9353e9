//! Adapters - Implementations of port interfaces.
//!
//! - `store` - Document store implementations (Firebase, in-memory, fault-injecting)
//! - `http` - Axum routers for webhooks and subscription endpoints

pub mod http;
pub mod store;

pub use store::{FirebaseConfig, FirebaseDocumentStore, FlakyDocumentStore, InMemoryDocumentStore};
