//! The three caching strategy executors plus the analytics passthrough.
//!
//! All executors resolve to a response on every path: network failures
//! degrade to cached copies or synthesized placeholders, and store
//! failures degrade to cache misses or skipped writes. No error crosses
//! the dispatch boundary.
//!
//! Reads consult the runtime partition first and fall back to the static
//! partition, so precached shell assets are served offline; writes only
//! ever go to the runtime partition.

use cachet_client::Network;
use cachet_core::{Partition, Snapshot};
use std::sync::Arc;

/// Where a response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Cache,
    Network,
    Synthesized,
}

/// A response together with its provenance.
#[derive(Debug, Clone)]
pub struct Outcome {
    pub snapshot: Snapshot,
    pub source: Source,
}

impl Outcome {
    fn cache(snapshot: Snapshot) -> Self {
        Self { snapshot, source: Source::Cache }
    }

    fn network(snapshot: Snapshot) -> Self {
        Self { snapshot, source: Source::Network }
    }

    fn synthesized(snapshot: Snapshot) -> Self {
        Self { snapshot, source: Source::Synthesized }
    }
}

/// Executes the caching strategies against the runtime partition and the
/// network.
#[derive(Clone)]
pub struct StrategyRunner {
    network: Arc<dyn Network>,
    runtime: Partition,
    precache: Partition,
}

impl StrategyRunner {
    pub fn new(network: Arc<dyn Network>, runtime: Partition, precache: Partition) -> Self {
        Self { network, runtime, precache }
    }

    /// Serve from cache if present, otherwise fetch and populate the
    /// runtime partition. Accepts staleness in exchange for the fastest
    /// path on same-origin assets.
    pub async fn cache_first(&self, key: &str, url: &str) -> Outcome {
        if let Some(cached) = self.read_cached(key).await {
            return Outcome::cache(cached);
        }

        match self.network.fetch(url).await {
            Ok(snapshot) => {
                self.write_back(key, &snapshot).await;
                Outcome::network(snapshot)
            }
            Err(e) => {
                tracing::debug!(%url, error = %e, "cache-first fetch failed with empty cache");
                Outcome::synthesized(Snapshot::synthesized(url, 503, "Resource not available"))
            }
        }
    }

    /// Favor freshness: fetch first, fall back to the cached copy when the
    /// network is unreachable, and synthesize an offline response when
    /// both miss.
    pub async fn network_first(&self, key: &str, url: &str) -> Outcome {
        match self.network.fetch(url).await {
            Ok(snapshot) => {
                self.write_back(key, &snapshot).await;
                Outcome::network(snapshot)
            }
            Err(e) => {
                tracing::debug!(%url, error = %e, "network-first falling back to cache");
                match self.read_cached(key).await {
                    Some(cached) => Outcome::cache(cached),
                    None => Outcome::synthesized(Snapshot::synthesized(url, 503, "Offline")),
                }
            }
        }
    }

    /// Serve the cached copy immediately and refresh it in the background.
    ///
    /// The refresh task is spawned unawaited when a cached copy exists;
    /// its completion is observable only through the runtime-partition
    /// write it performs. Timing of that write relative to the returned
    /// response is deliberately unordered. Only when the cache misses is
    /// the same fetch awaited, so each call issues exactly one network
    /// request.
    pub async fn stale_while_revalidate(&self, key: &str, url: &str) -> Outcome {
        let cached = self.read_cached(key).await;

        let refresh = {
            let runner = self.clone();
            let key = key.to_string();
            let url = url.to_string();
            tokio::spawn(async move {
                let fetched = runner.network.fetch(&url).await;
                match &fetched {
                    Ok(snapshot) => runner.write_back(&key, snapshot).await,
                    Err(e) => tracing::debug!(%url, error = %e, "background revalidation failed"),
                }
                fetched
            })
        };

        if let Some(snapshot) = cached {
            // refresh keeps running detached; its handle is dropped here
            return Outcome::cache(snapshot);
        }

        match refresh.await {
            Ok(Ok(snapshot)) => Outcome::network(snapshot),
            Ok(Err(_)) => Outcome::synthesized(Snapshot::synthesized(url, 503, "Offline")),
            Err(e) => {
                tracing::warn!(%url, error = %e, "revalidation task panicked");
                Outcome::synthesized(Snapshot::synthesized(url, 503, "Offline"))
            }
        }
    }

    /// Fetch without touching any partition. Failures return an empty
    /// response: analytics must never break the page.
    pub async fn analytics_passthrough(&self, url: &str) -> Outcome {
        match self.network.fetch(url).await {
            Ok(snapshot) => Outcome::network(snapshot),
            Err(e) => {
                tracing::debug!(%url, error = %e, "analytics fetch failed, returning empty response");
                Outcome::synthesized(Snapshot::empty(url))
            }
        }
    }

    /// Cache lookup across the runtime and static partitions. Store errors
    /// degrade to a miss.
    async fn read_cached(&self, key: &str) -> Option<Snapshot> {
        for partition in [&self.runtime, &self.precache] {
            match partition.get(key).await {
                Ok(Some(snapshot)) => return Some(snapshot),
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(partition = partition.name(), error = %e, "cache read failed, treating as miss");
                }
            }
        }
        None
    }

    /// Persist a clone into the runtime partition if the response
    /// qualifies. Write errors are logged and swallowed.
    async fn write_back(&self, key: &str, snapshot: &Snapshot) {
        if !snapshot.is_cacheable() {
            return;
        }
        if let Err(e) = self.runtime.put(key, snapshot.clone()).await {
            tracing::warn!(partition = self.runtime.name(), error = %e, "cache write failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeNetwork, wait_for_entry};
    use cachet_core::{CacheStore, MemoryStore, request_key};

    const RUNTIME: &str = "cachet-v1.0.0-runtime";
    const STATIC: &str = "cachet-v1.0.0-static";

    fn runner(network: Arc<FakeNetwork>) -> (StrategyRunner, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let store_dyn: Arc<dyn CacheStore> = store.clone();
        let runner = StrategyRunner::new(
            network,
            Partition::open(store_dyn.clone(), RUNTIME),
            Partition::open(store_dyn, STATIC),
        );
        (runner, store)
    }

    #[tokio::test]
    async fn test_cache_first_miss_fetches_and_stores() {
        let network = Arc::new(FakeNetwork::new());
        network.route_ok("http://localhost:8080/app.js", "console.log(1)");
        let (runner, store) = runner(network.clone());
        let key = request_key("http://localhost:8080/app.js");

        let outcome = runner.cache_first(&key, "http://localhost:8080/app.js").await;
        assert_eq!(outcome.source, Source::Network);
        assert_eq!(outcome.snapshot.status, 200);
        assert_eq!(network.calls_for("http://localhost:8080/app.js"), 1);
        assert_eq!(store.entry_count(RUNTIME).await, 1);
    }

    #[tokio::test]
    async fn test_cache_first_hit_skips_network() {
        let network = Arc::new(FakeNetwork::new());
        network.route_ok("http://localhost:8080/app.js", "console.log(1)");
        let (runner, _store) = runner(network.clone());
        let key = request_key("http://localhost:8080/app.js");

        runner.cache_first(&key, "http://localhost:8080/app.js").await;
        let outcome = runner.cache_first(&key, "http://localhost:8080/app.js").await;

        assert_eq!(outcome.source, Source::Cache);
        // second identical request triggers zero network calls
        assert_eq!(network.calls_for("http://localhost:8080/app.js"), 1);
    }

    #[tokio::test]
    async fn test_cache_first_does_not_store_non_200() {
        let network = Arc::new(FakeNetwork::new());
        network.route_status("http://localhost:8080/gone.js", 404, "not found");
        let (runner, store) = runner(network.clone());
        let key = request_key("http://localhost:8080/gone.js");

        let outcome = runner.cache_first(&key, "http://localhost:8080/gone.js").await;
        assert_eq!(outcome.snapshot.status, 404);
        assert_eq!(store.entry_count(RUNTIME).await, 0);

        // next request hits the network again
        runner.cache_first(&key, "http://localhost:8080/gone.js").await;
        assert_eq!(network.calls_for("http://localhost:8080/gone.js"), 2);
    }

    #[tokio::test]
    async fn test_cache_first_offline_miss_synthesizes_503() {
        let network = Arc::new(FakeNetwork::new());
        network.set_offline(true);
        let (runner, _store) = runner(network);
        let key = request_key("http://localhost:8080/app.js");

        let outcome = runner.cache_first(&key, "http://localhost:8080/app.js").await;
        assert_eq!(outcome.source, Source::Synthesized);
        assert_eq!(outcome.snapshot.status, 503);
        assert_eq!(outcome.snapshot.body, b"Resource not available");
    }

    #[tokio::test]
    async fn test_cache_first_serves_precached_asset() {
        let network = Arc::new(FakeNetwork::new());
        network.set_offline(true);
        let (runner, store) = runner(network.clone());
        let key = request_key("http://localhost:8080/icons/icon-192x192.png");
        store
            .put(STATIC, &key, Snapshot::new("http://localhost:8080/icons/icon-192x192.png", 200, None, Vec::new(), b"png".to_vec()))
            .await
            .unwrap();

        let outcome = runner.cache_first(&key, "http://localhost:8080/icons/icon-192x192.png").await;
        assert_eq!(outcome.source, Source::Cache);
        assert_eq!(outcome.snapshot.body, b"png");
        assert_eq!(network.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_network_first_success_updates_cache() {
        let network = Arc::new(FakeNetwork::new());
        network.route_ok("http://localhost:8080/", "<html>v2</html>");
        let (runner, store) = runner(network);
        let key = request_key("http://localhost:8080/");

        let outcome = runner.network_first(&key, "http://localhost:8080/").await;
        assert_eq!(outcome.source, Source::Network);
        assert_eq!(outcome.snapshot.body, b"<html>v2</html>");
        assert_eq!(store.entry_count(RUNTIME).await, 1);
    }

    #[tokio::test]
    async fn test_network_first_falls_back_to_cache_when_offline() {
        let network = Arc::new(FakeNetwork::new());
        network.route_ok("http://localhost:8080/", "<html>v1</html>");
        let (runner, _store) = runner(network.clone());
        let key = request_key("http://localhost:8080/");

        runner.network_first(&key, "http://localhost:8080/").await;
        network.set_offline(true);

        let outcome = runner.network_first(&key, "http://localhost:8080/").await;
        assert_eq!(outcome.source, Source::Cache);
        assert_eq!(outcome.snapshot.body, b"<html>v1</html>");
    }

    #[tokio::test]
    async fn test_network_first_offline_miss_synthesizes_503() {
        let network = Arc::new(FakeNetwork::new());
        network.set_offline(true);
        let (runner, _store) = runner(network);
        let key = request_key("http://localhost:8080/never-seen");

        let outcome = runner.network_first(&key, "http://localhost:8080/never-seen").await;
        assert_eq!(outcome.source, Source::Synthesized);
        assert_eq!(outcome.snapshot.status, 503);
        assert_eq!(outcome.snapshot.body, b"Offline");
    }

    #[tokio::test]
    async fn test_network_first_returns_error_status_without_caching() {
        let network = Arc::new(FakeNetwork::new());
        network.route_status("http://localhost:8080/api", 500, "boom");
        let (runner, store) = runner(network);
        let key = request_key("http://localhost:8080/api");

        let outcome = runner.network_first(&key, "http://localhost:8080/api").await;
        assert_eq!(outcome.source, Source::Network);
        assert_eq!(outcome.snapshot.status, 500);
        assert_eq!(store.entry_count(RUNTIME).await, 0);
    }

    #[tokio::test]
    async fn test_swr_miss_awaits_network_once() {
        let network = Arc::new(FakeNetwork::new());
        network.route_ok("https://fonts.googleapis.com/css2", "font-face-v1");
        let (runner, store) = runner(network.clone());
        let key = request_key("https://fonts.googleapis.com/css2");

        let outcome = runner.stale_while_revalidate(&key, "https://fonts.googleapis.com/css2").await;
        assert_eq!(outcome.source, Source::Network);
        assert_eq!(outcome.snapshot.body, b"font-face-v1");
        assert_eq!(network.calls_for("https://fonts.googleapis.com/css2"), 1);
        assert_eq!(store.entry_count(RUNTIME).await, 1);
    }

    #[tokio::test]
    async fn test_swr_hit_returns_stale_and_refreshes() {
        let network = Arc::new(FakeNetwork::new());
        network.route_ok("https://fonts.googleapis.com/css2", "font-face-v1");
        let (runner, store) = runner(network.clone());
        let key = request_key("https://fonts.googleapis.com/css2");

        runner.stale_while_revalidate(&key, "https://fonts.googleapis.com/css2").await;

        network.route_ok("https://fonts.googleapis.com/css2", "font-face-v2");
        let outcome = runner.stale_while_revalidate(&key, "https://fonts.googleapis.com/css2").await;

        // stale copy served immediately
        assert_eq!(outcome.source, Source::Cache);
        assert_eq!(outcome.snapshot.body, b"font-face-v1");

        // background refresh overwrites the entry for next access
        let store_dyn: Arc<dyn CacheStore> = store;
        let runtime = Partition::open(store_dyn, RUNTIME);
        let refreshed = wait_for_entry(&runtime, &key, |s| s.body == b"font-face-v2").await;
        assert_eq!(refreshed.body, b"font-face-v2");

        let next = runner.stale_while_revalidate(&key, "https://fonts.googleapis.com/css2").await;
        assert_eq!(next.snapshot.body, b"font-face-v2");
    }

    #[tokio::test]
    async fn test_swr_hit_survives_offline_refresh() {
        let network = Arc::new(FakeNetwork::new());
        network.route_ok("https://fonts.gstatic.com/inter.woff2", "woff2");
        let (runner, _store) = runner(network.clone());
        let key = request_key("https://fonts.gstatic.com/inter.woff2");

        runner.stale_while_revalidate(&key, "https://fonts.gstatic.com/inter.woff2").await;
        network.set_offline(true);

        let outcome = runner.stale_while_revalidate(&key, "https://fonts.gstatic.com/inter.woff2").await;
        assert_eq!(outcome.source, Source::Cache);
        assert_eq!(outcome.snapshot.body, b"woff2");
    }

    #[tokio::test]
    async fn test_swr_miss_offline_synthesizes_503() {
        let network = Arc::new(FakeNetwork::new());
        network.set_offline(true);
        let (runner, _store) = runner(network);
        let key = request_key("https://fonts.gstatic.com/inter.woff2");

        let outcome = runner.stale_while_revalidate(&key, "https://fonts.gstatic.com/inter.woff2").await;
        assert_eq!(outcome.source, Source::Synthesized);
        assert_eq!(outcome.snapshot.status, 503);
    }

    #[tokio::test]
    async fn test_analytics_never_touches_partitions() {
        let network = Arc::new(FakeNetwork::new());
        network.route_ok("https://www.google-analytics.com/collect", "ok");
        let (runner, store) = runner(network);

        let outcome = runner.analytics_passthrough("https://www.google-analytics.com/collect").await;
        assert_eq!(outcome.source, Source::Network);
        assert!(store.list_partitions().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_analytics_failure_returns_empty_response() {
        let network = Arc::new(FakeNetwork::new());
        network.set_offline(true);
        let (runner, store) = runner(network);

        let outcome = runner.analytics_passthrough("https://www.google-analytics.com/collect").await;
        assert_eq!(outcome.source, Source::Synthesized);
        assert_eq!(outcome.snapshot.status, 200);
        assert!(outcome.snapshot.body.is_empty());
        assert!(store.list_partitions().await.unwrap().is_empty());
    }
}
