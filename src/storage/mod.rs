//! Storage and persistence layer
//!
//! - Key-value store abstraction (file-backed and in-memory)
//! - Fixed storage keys
//! - Persisted snapshot models

mod kv;
mod models;

pub mod keys;

pub use kv::{FileStore, KvStore, MemoryStore};
pub use models::AccountsSnapshot;
