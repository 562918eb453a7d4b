//! Error types for icon building and packaging.
//!
//! All fallible functions in this crate return [`Result<T>`]. The engine separates
//! two kinds of failure:
//!
//! - a cache error for which [`icon_cache::Error::is_recoverable`] holds (a resource
//!   is absent or could not be fetched). The affected variant is logged and skipped.
//! - everything else, notably [`Error::Composition`], which means the cached art
//!   itself is broken and the run must stop.

use camino::Utf8PathBuf;
use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or packaging icons.
#[derive(Error, Debug)]
pub enum Error {
    /// Resource lookup or download failed.
    #[error("Cache error: {0}")]
    Cache(#[from] icon_cache::Error),

    /// Filesystem I/O failed in the icon folder.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to serialize or parse JSON (service metadata, web index).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Writing a zip archive failed.
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// A source image could not be decoded or the result could not be encoded.
    #[error("Failed to composite {filename}: {source}")]
    Composition {
        filename: String,
        #[source]
        source: image::ImageError,
    },

    /// Conversion to an output format the builder does not know.
    #[error("Unknown image extension: {0}")]
    UnsupportedExtension(String),

    /// The persisted build index could not be read back.
    #[error("Corrupt build index: {0}")]
    CorruptIndex(String),

    /// The selected output target could not be created.
    #[error("Cannot write output {path}: {source}")]
    Packaging {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Whether only the current variant should be skipped.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::Cache(e) if e.is_recoverable())
    }
}
