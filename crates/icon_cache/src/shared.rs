//! The cache capability consumed by the icon build.

use crate::error::Result;
use camino::Utf8PathBuf;

/// Read access to game client resources by logical path.
///
/// The split between pure lookups and I/O matters to callers:
///
/// - [`has`](Self::has) and [`hash_of`](Self::hash_of) only consult the manifests.
///   They are safe to call for every item in the catalog.
/// - [`fetch`](Self::fetch) and [`path_of`](Self::path_of) may download the file
///   first and should only be called once the caller knows it needs the bytes.
///
/// All methods accept un-normalized logical paths.
///
/// Implementations must be [`Send`] and [`Sync`] so the build can fan out over
/// worker threads; concurrent requests for the same path must not race two
/// downloads.
pub trait SharedCache: Send + Sync {
    /// Build identifier of the remote client the manifests belong to.
    fn version(&self) -> &str;

    /// All known logical paths, normalized, sorted and without duplicates.
    fn resources(&self) -> Vec<String>;

    /// Whether the logical path is listed in any manifest.
    fn has(&self, logical: &str) -> bool;

    /// Read the resource, downloading it first if it is not cached yet.
    fn fetch(&self, logical: &str) -> Result<Vec<u8>>;

    /// Local path of the resource. The file exists when this returns `Ok`.
    fn path_of(&self, logical: &str) -> Result<Utf8PathBuf>;

    /// Content hash declared by the manifest. Performs no file I/O.
    fn hash_of(&self, logical: &str) -> Result<String>;
}
