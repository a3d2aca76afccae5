//! Request-identity cache key generation.

use sha2::{Digest, Sha256};

/// Compute the cache key identifying a request within a partition.
///
/// Identity is the canonicalized URL alone: this is a GET-only proxy, so
/// method and request headers do not participate in matching.
pub fn request_key(url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}
