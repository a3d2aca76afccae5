//! The network side of the proxy.
//!
//! ### Failure contract
//! Only connectivity-level failures (DNS, TLS, refused, timeout) are
//! errors. HTTP error statuses come back as `Ok` snapshots so the caching
//! strategies can apply the 200-only persistence rule themselves and still
//! hand the response to the page.
//!
//! ### URL Canonicalization
//! - Trim whitespace, ensure scheme (default: `https`)
//! - Lowercase host, remove fragments
//! - Preserve query string

pub mod url;

use async_trait::async_trait;
use cachet_core::{Error, Snapshot};
use reqwest::{Client, header};
use std::time::{Duration, Instant};

pub use url::{UrlError, canonicalize};

/// Configuration for the HTTP network client.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// User agent string (default: "cachet/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 5MB)
    pub max_bytes: usize,

    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            user_agent: "cachet/0.1".to_string(),
            max_bytes: 5 * 1024 * 1024,
            timeout: Duration::from_millis(20000),
            max_redirects: 5,
        }
    }
}

/// The network a strategy executor fetches through.
///
/// Implemented by [`HttpNetwork`] in production and by programmable fakes
/// in tests.
#[async_trait]
pub trait Network: Send + Sync {
    /// Fetch a URL, returning a snapshot of the response.
    ///
    /// `Err` means the network itself failed; any HTTP status is `Ok`.
    async fn fetch(&self, url: &str) -> Result<Snapshot, Error>;
}

/// HTTP network client backed by reqwest.
pub struct HttpNetwork {
    http: Client,
    config: NetworkConfig,
}

impl HttpNetwork {
    /// Create a new network client with the given configuration.
    pub fn new(config: NetworkConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::FetchFailed(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }
}

#[async_trait]
impl Network for HttpNetwork {
    async fn fetch(&self, url_str: &str) -> Result<Snapshot, Error> {
        let start = Instant::now();
        let url = canonicalize(url_str).map_err(|e| Error::InvalidUrl(e.to_string()))?;

        let response = self
            .http
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| Error::FetchFailed(format!("network error: {}", e)))?;

        let status = response.status();

        if let Some(len) = response.content_length()
            && len as usize > self.config.max_bytes
        {
            return Err(Error::FetchTooLarge(format!("{} bytes exceeds {}", len, self.config.max_bytes)));
        }

        let final_url = response.url().clone();

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.to_string(), v.to_string())))
            .collect();

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::FetchFailed(format!("failed to read response: {}", e)))?;

        if bytes.len() > self.config.max_bytes {
            return Err(Error::FetchTooLarge(format!("{} bytes exceeds {}", bytes.len(), self.config.max_bytes)));
        }

        tracing::debug!(
            "fetched {} -> {} status {} in {}ms ({} bytes)",
            url,
            final_url,
            status.as_u16(),
            start.elapsed().as_millis(),
            bytes.len()
        );

        Ok(Snapshot::new(final_url.as_str(), status.as_u16(), content_type, headers, bytes.to_vec()))
    }
}
