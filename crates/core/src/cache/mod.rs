//! Cache store abstraction and backends.
//!
//! The store is a key-value blob store of (request identity → response
//! snapshot) organized into named partitions. Two backends are provided:
//! an in-memory map for ephemeral hosts and tests, and a SQLite-backed
//! store for hosts that persist the cache across runs.

pub mod key;
pub mod memory;
pub mod migrations;
pub mod snapshot;
pub mod sqlite;
pub mod store;

pub use key::request_key;
pub use memory::MemoryStore;
pub use snapshot::Snapshot;
pub use sqlite::SqliteStore;
pub use store::{CacheStore, Partition};
