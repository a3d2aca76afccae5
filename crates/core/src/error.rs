//! Unified error types for cachet.

use tokio_rusqlite::rusqlite;

/// Unified error types shared across the cachet crates.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid URL.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// Network-level fetch failure (DNS, TLS, refused, timeout).
    ///
    /// This is the only failure a network implementation may surface;
    /// HTTP error statuses are `Ok` snapshots, not errors, so callers
    /// can apply the 200-only persistence rule themselves.
    #[error("FETCH_FAILED: {0}")]
    FetchFailed(String),

    /// Fetch response body exceeded the configured byte limit.
    #[error("FETCH_TOO_LARGE: {0}")]
    FetchTooLarge(String),

    /// A precache asset could not be fetched or stored during install.
    ///
    /// Fatal to the whole install step: a half-populated static partition
    /// must never be reported as installed.
    #[error("PRECACHE_FAILED: {0}")]
    PrecacheFailed(String),

    /// A configured URL pattern failed to compile.
    #[error("PATTERN_INVALID: {0}")]
    PatternInvalid(String),

    /// Cache store operation failed.
    #[error("STORE_ERROR: {0}")]
    Store(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("STORE_ERROR: migration failed: {0}")]
    MigrationFailed(String),
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Store(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Store(tokio_rusqlite::Error::Close(c)),
            _ => Error::Store(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Store(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Store(tokio_rusqlite::Error::Error(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::FetchFailed("connection refused".to_string());
        assert!(err.to_string().contains("FETCH_FAILED"));
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn test_precache_error_display() {
        let err = Error::PrecacheFailed("/index.html: status 404".to_string());
        assert!(err.to_string().contains("PRECACHE_FAILED"));
        assert!(err.to_string().contains("/index.html"));
    }
}
