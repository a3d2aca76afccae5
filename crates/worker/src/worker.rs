//! The service-worker core: host event surface and dispatch loop.
//!
//! The host runtime invokes one method per lifecycle event (`install`,
//! `activate`, `fetch`, `message`) instead of the worker attaching
//! callbacks to a global event target. This keeps the core testable by
//! direct invocation.

use crate::classify::{PatternTable, RequestClass, RequestDescriptor, classify};
use crate::lifecycle::LifecycleManager;
use crate::strategy::{Outcome, StrategyRunner};
use cachet_client::Network;
use cachet_core::{AppConfig, CacheStore, Error, Partition, request_key};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use url::Origin;

/// Control signal delivered through the host's `message` event.
///
/// Mirrors the `{"type": "SKIP_WAITING"}` payload a page posts to force
/// a waiting worker to activate immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ControlMessage {
    #[serde(rename = "SKIP_WAITING")]
    SkipWaiting,
}

/// The per-deployment worker core.
///
/// Owns the immutable policy configuration, the pattern table, the
/// lifecycle manager, and the strategy executors. One instance serves
/// every intercepted request for the lifetime of the version.
pub struct WorkerCore {
    config: AppConfig,
    app_origin: Origin,
    patterns: PatternTable,
    lifecycle: LifecycleManager,
    strategies: StrategyRunner,
    skip_waiting: AtomicBool,
}

impl WorkerCore {
    /// Build the core from configuration, a cache store, and a network.
    ///
    /// Compiles the pattern table and parses the application origin up
    /// front; a bad pattern or origin fails construction rather than
    /// surfacing at dispatch time.
    pub fn new(config: AppConfig, store: Arc<dyn CacheStore>, network: Arc<dyn Network>) -> Result<Self, Error> {
        let app_origin = url::Url::parse(&config.origin)
            .map_err(|e| Error::InvalidUrl(format!("origin {:?}: {e}", config.origin)))?
            .origin();

        let patterns = PatternTable::compile(&config.analytics_patterns, &config.cdn_patterns)?;

        let runtime = Partition::open(store.clone(), config.runtime_partition());
        let precache = Partition::open(store.clone(), config.static_partition());
        let strategies = StrategyRunner::new(network.clone(), runtime, precache);
        let lifecycle = LifecycleManager::new(&config, store, network);

        Ok(Self {
            config,
            app_origin,
            patterns,
            lifecycle,
            strategies,
            skip_waiting: AtomicBool::new(false),
        })
    }

    /// `install` event: precache the app shell, then request immediate
    /// activation.
    ///
    /// Propagates precache failure so the host can retry the install on
    /// its next attempt.
    pub async fn handle_install(&self) -> Result<(), Error> {
        tracing::info!(version = %self.config.version_tag, "installing");
        self.lifecycle.install().await?;
        self.skip_waiting.store(true, Ordering::SeqCst);
        Ok(())
    }

    /// `activate` event: evict partitions from prior versions. After this
    /// returns the worker is ready to control all open pages immediately.
    pub async fn handle_activate(&self) -> Result<(), Error> {
        tracing::info!(version = %self.config.version_tag, "activating");
        self.lifecycle.activate().await
    }

    /// `fetch` event: classify the request and run exactly one strategy.
    ///
    /// Never fails; every path resolves to a response, synthesized if
    /// necessary. This is the only place a classification result is bound
    /// to a concrete strategy.
    pub async fn handle_fetch(&self, request: &RequestDescriptor) -> Outcome {
        let class = classify(request, &self.patterns, &self.app_origin);
        let url = request.url.as_str();
        let key = request_key(url);

        tracing::debug!(%url, ?class, "dispatching");

        match class {
            RequestClass::AnalyticsOnly => self.strategies.analytics_passthrough(url).await,
            RequestClass::Document | RequestClass::Other => self.strategies.network_first(&key, url).await,
            RequestClass::ThirdPartyCacheable => self.strategies.stale_while_revalidate(&key, url).await,
            RequestClass::SameOriginCacheable => self.strategies.cache_first(&key, url).await,
        }
    }

    /// `message` event: accept a control signal. Returns whether immediate
    /// activation was requested.
    pub fn handle_message(&self, message: ControlMessage) -> bool {
        match message {
            ControlMessage::SkipWaiting => {
                tracing::info!("skip-waiting requested");
                self.skip_waiting.store(true, Ordering::SeqCst);
                true
            }
        }
    }

    /// Whether this worker has requested to bypass the waiting phase.
    pub fn update_forced(&self) -> bool {
        self.skip_waiting.load(Ordering::SeqCst)
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}
