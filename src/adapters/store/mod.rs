//! Document store adapters.

mod firebase;
mod flaky;
mod in_memory;

pub use firebase::{FirebaseConfig, FirebaseDocumentStore};
pub use flaky::{FaultTarget, FlakyDocumentStore};
pub use in_memory::InMemoryDocumentStore;
