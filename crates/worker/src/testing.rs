//! Test support: a programmable in-process network.

use async_trait::async_trait;
use cachet_client::Network;
use cachet_core::{Error, Partition, Snapshot};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// A fake network with per-URL canned responses, an offline switch, and a
/// call log.
#[derive(Default)]
pub struct FakeNetwork {
    routes: Mutex<HashMap<String, Snapshot>>,
    offline: AtomicBool,
    calls: Mutex<Vec<String>>,
}

impl FakeNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `snapshot` for `url`. Replaces any prior route.
    pub fn route(&self, url: &str, snapshot: Snapshot) {
        self.routes.lock().unwrap().insert(url.to_string(), snapshot);
    }

    /// Serve a 200 text response for `url`.
    pub fn route_ok(&self, url: &str, body: &str) {
        self.route(url, Snapshot::new(url, 200, Some("text/plain".to_string()), Vec::new(), body.as_bytes().to_vec()));
    }

    /// Serve an arbitrary-status response for `url`.
    pub fn route_status(&self, url: &str, status: u16, body: &str) {
        self.route(url, Snapshot::new(url, status, Some("text/plain".to_string()), Vec::new(), body.as_bytes().to_vec()));
    }

    /// Toggle connectivity. When offline every fetch fails.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// How many fetches were issued for `url`.
    pub fn calls_for(&self, url: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|u| *u == url).count()
    }

    /// Total fetches issued.
    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Network for FakeNetwork {
    async fn fetch(&self, url: &str) -> Result<Snapshot, Error> {
        self.calls.lock().unwrap().push(url.to_string());

        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::FetchFailed("offline".to_string()));
        }

        self.routes
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| Error::FetchFailed(format!("no route for {url}")))
    }
}

/// Poll a partition until an entry matching `pred` appears.
///
/// Background revalidation is observable only through its cache write, so
/// tests wait for the side effect instead of the task.
pub async fn wait_for_entry<F>(partition: &Partition, key: &str, pred: F) -> Snapshot
where
    F: Fn(&Snapshot) -> bool,
{
    for _ in 0..500 {
        if let Ok(Some(snapshot)) = partition.get(key).await
            && pred(&snapshot)
        {
            return snapshot;
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    panic!("entry for key {key} never reached the expected state");
}
