//! In-memory cache store backend.
//!
//! Keeps partitions in a `HashMap` behind an async `RwLock`. The default
//! backend for ephemeral hosts and the fixture every strategy and
//! lifecycle test runs against.

use super::store::CacheStore;
use crate::{Error, Snapshot};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

type PartitionMap = HashMap<String, HashMap<String, Snapshot>>;

/// In-memory [`CacheStore`] backend.
#[derive(Debug, Default)]
pub struct MemoryStore {
    partitions: RwLock<PartitionMap>,
}

impl MemoryStore {
    /// Create an empty store with no partitions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries in a partition. Zero if the partition does not
    /// exist.
    pub async fn entry_count(&self, partition: &str) -> usize {
        self.partitions
            .read()
            .await
            .get(partition)
            .map(|entries| entries.len())
            .unwrap_or(0)
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, partition: &str, key: &str) -> Result<Option<Snapshot>, Error> {
        let partitions = self.partitions.read().await;
        Ok(partitions.get(partition).and_then(|entries| entries.get(key)).cloned())
    }

    async fn put(&self, partition: &str, key: &str, snapshot: Snapshot) -> Result<(), Error> {
        let mut partitions = self.partitions.write().await;
        partitions
            .entry(partition.to_string())
            .or_default()
            .insert(key.to_string(), snapshot);
        Ok(())
    }

    async fn delete(&self, partition: &str, key: &str) -> Result<bool, Error> {
        let mut partitions = self.partitions.write().await;
        Ok(partitions
            .get_mut(partition)
            .map(|entries| entries.remove(key).is_some())
            .unwrap_or(false))
    }

    async fn list_partitions(&self) -> Result<Vec<String>, Error> {
        let partitions = self.partitions.read().await;
        let mut names: Vec<String> = partitions.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn delete_partition(&self, name: &str) -> Result<bool, Error> {
        let mut partitions = self.partitions.write().await;
        Ok(partitions.remove(name).is_some())
    }
}
