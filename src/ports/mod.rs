//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `DocumentStore` - Path-addressed document database (Realtime Database)

mod document_store;

pub use document_store::{path_segments, DocumentStore, DocumentStoreExt, StoreError};
