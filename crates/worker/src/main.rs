//! cachet host-simulator binary.
//!
//! Boots the worker core against the real network and a persistent SQLite
//! cache, runs the install and activate phases, then reads one URL per
//! line from stdin and dispatches it as an intercepted request. Control
//! messages arrive as JSON lines (`{"type":"SKIP_WAITING"}`). Logging
//! goes to stderr so stdout stays machine-readable.

use anyhow::Result;
use cachet_client::{HttpNetwork, Network, NetworkConfig, canonicalize};
use cachet_core::{AppConfig, CacheStore, SqliteStore};
use cachet_worker::{ControlMessage, Destination, RequestDescriptor, WorkerCore};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    tracing::info!(version = %config.version_tag, db = %config.db_path.display(), "starting cachet host");

    let store: Arc<dyn CacheStore> = Arc::new(SqliteStore::open(&config.db_path).await?);
    let network: Arc<dyn Network> = Arc::new(HttpNetwork::new(NetworkConfig {
        user_agent: config.user_agent.clone(),
        max_bytes: config.max_bytes,
        timeout: config.timeout(),
        max_redirects: 5,
    })?);

    let worker = WorkerCore::new(config, store, network)?;

    worker.handle_install().await?;
    worker.handle_activate().await?;
    tracing::info!("worker active, reading requests from stdin");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if line.starts_with('{') {
            match serde_json::from_str::<ControlMessage>(line) {
                Ok(message) => {
                    worker.handle_message(message);
                }
                Err(e) => tracing::warn!(error = %e, "unrecognized control message"),
            }
            continue;
        }

        let url = match canonicalize(line) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(input = line, error = %e, "skipping unparseable URL");
                continue;
            }
        };

        let request = descriptor_for(url);
        let outcome = worker.handle_fetch(&request).await;
        println!("{}\t{:?}\t{}", outcome.snapshot.status, outcome.source, request.url);
    }

    Ok(())
}

/// Guess a request descriptor from a bare URL, the way a browser would
/// label it: known asset extensions become subresources, everything else
/// a navigation.
fn descriptor_for(url: url::Url) -> RequestDescriptor {
    let destination = match url.path().rsplit('.').next() {
        Some("js" | "mjs") => Some(Destination::Script),
        Some("css") => Some(Destination::Style),
        Some("woff" | "woff2" | "ttf" | "otf") => Some(Destination::Font),
        Some("png" | "jpg" | "jpeg" | "gif" | "webp" | "svg" | "ico") => Some(Destination::Image),
        Some("json" | "webmanifest") => Some(Destination::Other),
        _ => None,
    };
    match destination {
        Some(destination) => RequestDescriptor::subresource(url, destination),
        None => RequestDescriptor::navigation(url),
    }
}
