//! The cache store abstraction.
//!
//! A store is an async key-value blob store of (request identity →
//! response snapshot), organized into named partitions. Partitions are
//! created lazily on first write and deleted as whole units; individual
//! entries are only ever written with independent `put` calls, never
//! read-modify-write, so per-key atomicity at the backend is the only
//! guarantee the rest of the system relies on.

use crate::{Error, Snapshot};
use async_trait::async_trait;
use std::sync::Arc;

/// Async key-value store of response snapshots in named partitions.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Look up a snapshot by key. `Ok(None)` is a cache miss, not an error.
    async fn get(&self, partition: &str, key: &str) -> Result<Option<Snapshot>, Error>;

    /// Insert or overwrite a snapshot. Creates the partition if needed.
    async fn put(&self, partition: &str, key: &str, snapshot: Snapshot) -> Result<(), Error>;

    /// Delete a single entry. Returns whether it existed.
    async fn delete(&self, partition: &str, key: &str) -> Result<bool, Error>;

    /// List all partition names, in stable order.
    async fn list_partitions(&self) -> Result<Vec<String>, Error>;

    /// Delete a whole partition. Returns whether it existed.
    async fn delete_partition(&self, name: &str) -> Result<bool, Error>;
}

/// A handle binding a partition name to a store.
///
/// Cheap to clone; the equivalent of an opened cache in the browser API.
#[derive(Clone)]
pub struct Partition {
    store: Arc<dyn CacheStore>,
    name: String,
}

impl Partition {
    /// Open a partition by name. The partition itself is created lazily on
    /// first write.
    pub fn open(store: Arc<dyn CacheStore>, name: impl Into<String>) -> Self {
        Self { store, name: name.into() }
    }

    /// Partition name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up a snapshot in this partition.
    pub async fn get(&self, key: &str) -> Result<Option<Snapshot>, Error> {
        self.store.get(&self.name, key).await
    }

    /// Insert or overwrite a snapshot in this partition.
    pub async fn put(&self, key: &str, snapshot: Snapshot) -> Result<(), Error> {
        self.store.put(&self.name, key, snapshot).await
    }
}
