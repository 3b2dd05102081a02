//! The caught-set and its persistence backends.

mod backend;
mod connect;
mod document;
mod firestore;
mod local;
#[cfg(test)]
mod memory;
mod remote;
mod storage;
mod store;

pub use backend::*;
pub use connect::open_backend;
pub use document::DocumentStore;
pub use firestore::FirestoreDocument;
pub use local::LocalBackend;
#[cfg(test)]
pub use memory::MemoryDocument;
pub use remote::RemoteBackend;
pub use storage::{LocalStorage, StorageChange, StorageWatch};
pub use store::*;
