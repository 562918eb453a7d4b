//! Error types for cache operations.

use camino::Utf8PathBuf;
use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or reading the resource cache.
#[derive(Error, Debug)]
pub enum Error {
    /// Filesystem I/O failed (creating the cache root, writing a download, purging).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The HTTP client failed, timed out, or the CDN answered with an error status.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A non-HTTP transport could not serve a URL.
    #[error("Remote file unavailable: {url}")]
    Unavailable { url: String },

    /// The client descriptor could not be parsed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The client descriptor marks the upstream as protected (maintenance, downtime).
    #[error("Upstream is in a protected state, refusing to build a cache")]
    ProtectedState,

    /// The cache directory looks like a live game installation.
    #[error("Refusing to use a game installation as cache directory: {0}")]
    InvalidCacheDir(Utf8PathBuf),

    /// The logical resource is listed in neither manifest.
    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    /// A manifest line could not be parsed.
    #[error("Malformed manifest at line {line}: {reason}")]
    IndexParse { line: usize, reason: String },

    /// Downloaded bytes disagree with the size declared in the manifest.
    #[error("Size mismatch for {path}: manifest declares {expected} bytes, got {actual}")]
    SizeMismatch {
        path: String,
        expected: u64,
        actual: u64,
    },
}

impl Error {
    /// Whether the error only means "this resource is not available right now".
    ///
    /// Absence and fetch failures are recoverable for a single icon variant.
    /// Everything else points at a broken cache or environment.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::ResourceNotFound(_)
                | Error::Http(_)
                | Error::Unavailable { .. }
                | Error::SizeMismatch { .. }
        )
    }
}
