//! Cache lifecycle: precache population and stale-partition eviction.
//!
//! Install runs once per new version, before it is eligible to take
//! control: it fills the static partition with every precache asset,
//! all-or-nothing. Activate runs once when the version takes control:
//! it deletes partitions left behind by prior versions.

use cachet_client::Network;
use cachet_core::{AppConfig, CacheStore, Error, Partition, request_key};
use futures_util::future::join_all;
use std::sync::Arc;

/// Owns partition names for the current version and drives the install
/// and activate phases.
pub struct LifecycleManager {
    store: Arc<dyn CacheStore>,
    network: Arc<dyn Network>,
    origin: String,
    cache_prefix: String,
    static_partition: String,
    runtime_partition: String,
    precache_assets: Vec<String>,
}

impl LifecycleManager {
    pub fn new(config: &AppConfig, store: Arc<dyn CacheStore>, network: Arc<dyn Network>) -> Self {
        Self {
            store,
            network,
            origin: config.origin.clone(),
            cache_prefix: config.cache_prefix.clone(),
            static_partition: config.static_partition(),
            runtime_partition: config.runtime_partition(),
            precache_assets: config.precache_assets.clone(),
        }
    }

    /// Populate the static partition with every precache asset, in order.
    ///
    /// All-or-nothing: the first asset that fails to fetch, returns a
    /// non-200 status, or fails to store aborts the whole install. The
    /// host retries the install on its next attempt; a half-populated
    /// partition is never reported as installed.
    pub async fn install(&self) -> Result<(), Error> {
        tracing::info!(partition = %self.static_partition, assets = self.precache_assets.len(), "precaching app shell");

        let partition = Partition::open(self.store.clone(), &self.static_partition);

        for asset in &self.precache_assets {
            let url = format!("{}{}", self.origin, asset);
            let snapshot = self
                .network
                .fetch(&url)
                .await
                .map_err(|e| Error::PrecacheFailed(format!("{asset}: {e}")))?;

            if !snapshot.is_cacheable() {
                return Err(Error::PrecacheFailed(format!("{asset}: status {}", snapshot.status)));
            }

            partition.put(&request_key(&url), snapshot).await?;
            tracing::debug!(%url, "precached");
        }

        Ok(())
    }

    /// Delete partitions from prior versions.
    ///
    /// A partition is stale when its name carries our prefix but is
    /// neither the current static nor the current runtime partition.
    /// Deletions run concurrently and independently: one failure is
    /// logged and must not block the others or fail activation.
    pub async fn activate(&self) -> Result<(), Error> {
        let names = self.store.list_partitions().await?;

        let stale: Vec<String> = names
            .into_iter()
            .filter(|name| {
                name.starts_with(&self.cache_prefix)
                    && *name != self.static_partition
                    && *name != self.runtime_partition
            })
            .collect();

        let deletions = stale.into_iter().map(|name| {
            let store = self.store.clone();
            async move {
                match store.delete_partition(&name).await {
                    Ok(_) => tracing::info!(partition = %name, "deleted stale cache partition"),
                    Err(e) => tracing::warn!(partition = %name, error = %e, "failed to delete stale partition"),
                }
            }
        });
        join_all(deletions).await;

        Ok(())
    }
}
