//! CDN-backed implementation of [`SharedCache`].
//!
//! # Construction
//!
//! 1. Create the cache root and refuse it if it looks like a game installation.
//! 2. Fetch the client descriptor; refuse a protected upstream.
//! 3. Fetch (or reuse from disk) the application manifest for the advertised build.
//! 4. Resolve `app:/resfileindex.txt` through the application index and parse it as
//!    the resource manifest.
//!
//! # Lookups
//!
//! The application index is consulted first, then the resource index. Application
//! entries are downloaded from the binaries base URL, resource entries from the
//! resources base URL. A file already present under the cache root is trusted as is.

use crate::endpoints::CdnEndpoints;
use crate::error::{Error, Result};
use crate::index::{normalize_resource, IndexEntry, ResourceIndex};
use crate::shared::SharedCache;
use crate::transport::{HttpTransport, Transport};
use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::io::Write;
use std::sync::{Arc, Mutex, PoisonError};

/// Files that only exist in a real client installation.
const INSTALL_MARKERS: &[&str] = &["updater.exe", "tq"];

/// Logical path of the resource manifest inside the application index.
const RESOURCE_MANIFEST: &str = "app:/resfileindex.txt";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClientDescriptor {
    build_number: BuildNumber,
    #[serde(default)]
    protected: bool,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum BuildNumber {
    Text(String),
    Number(u64),
}

impl BuildNumber {
    fn into_string(self) -> String {
        match self {
            BuildNumber::Text(s) => s,
            BuildNumber::Number(n) => n.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    Application,
    Resource,
}

/// Lazily populated disk cache in front of the game CDN.
pub struct CacheDownloader {
    cache_dir: Utf8PathBuf,
    endpoints: CdnEndpoints,
    transport: Box<dyn Transport>,
    version: String,
    manifest_file: String,
    app_index: ResourceIndex,
    res_index: ResourceIndex,
    /// Normalized logical path -> lock held while that path is being downloaded.
    in_flight: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl CacheDownloader {
    /// Open a cache at `cache_dir` using the HTTP transport.
    pub fn new(cache_dir: Utf8PathBuf, user_agent: &str, endpoints: CdnEndpoints) -> Result<Self> {
        let transport = HttpTransport::new(user_agent, endpoints.request_timeout())?;
        Self::with_transport(cache_dir, endpoints, Box::new(transport))
    }

    /// Open a cache at `cache_dir` fetching through an arbitrary [`Transport`].
    pub fn with_transport(
        cache_dir: Utf8PathBuf,
        endpoints: CdnEndpoints,
        transport: Box<dyn Transport>,
    ) -> Result<Self> {
        std::fs::create_dir_all(cache_dir.as_std_path())?;

        if INSTALL_MARKERS
            .iter()
            .any(|marker| cache_dir.join(marker).as_std_path().exists())
        {
            return Err(Error::InvalidCacheDir(cache_dir));
        }

        let descriptor: ClientDescriptor =
            serde_json::from_slice(&transport.get(&endpoints.descriptor_url)?)?;
        if descriptor.protected {
            return Err(Error::ProtectedState);
        }
        let version = descriptor.build_number.into_string();
        tracing::info!("Client build {}", version);

        let manifest_file = endpoints.manifest_name(&version);
        let manifest_path = cache_dir.join(&manifest_file);
        let manifest_bytes = if manifest_path.as_std_path().exists() {
            std::fs::read(manifest_path.as_std_path())?
        } else {
            let bytes = transport.get(&endpoints.binaries_url(&manifest_file))?;
            write_atomically(&manifest_path, &bytes)?;
            bytes
        };
        let app_index = ResourceIndex::parse_bytes(&manifest_bytes)?;

        let mut cache = Self {
            cache_dir,
            endpoints,
            transport,
            version,
            manifest_file,
            app_index,
            res_index: ResourceIndex::default(),
            in_flight: Mutex::new(HashMap::new()),
        };

        let res_bytes = cache.fetch(RESOURCE_MANIFEST)?;
        cache.res_index = ResourceIndex::parse_bytes(&res_bytes)?;

        tracing::info!(
            "Cache ready: {} application entries, {} resource entries",
            cache.app_index.len(),
            cache.res_index.len()
        );

        Ok(cache)
    }

    pub fn cache_dir(&self) -> &Utf8Path {
        &self.cache_dir
    }

    /// File name of the application manifest under the cache root.
    pub fn manifest_file(&self) -> &str {
        &self.manifest_file
    }

    /// Delete cached files that no manifest references any more.
    ///
    /// `keep` lists extra paths, relative to the cache root with forward slashes,
    /// that must survive. The current application manifest always survives.
    /// Returns the number of files removed; individual removal failures are logged
    /// and skipped.
    pub fn purge(&self, keep: &HashSet<String>) -> Result<usize> {
        let mut valid: HashSet<&str> = self
            .app_index
            .physical_paths()
            .chain(self.res_index.physical_paths())
            .collect();
        valid.insert(self.manifest_file.as_str());

        let mut removed = 0;
        for entry in walkdir::WalkDir::new(self.cache_dir.as_std_path()) {
            let entry = entry.map_err(std::io::Error::from)?;
            if !entry.file_type().is_file() {
                continue;
            }

            let Ok(relative) = entry.path().strip_prefix(self.cache_dir.as_std_path()) else {
                continue;
            };
            let relative = relative.to_string_lossy().replace('\\', "/");

            if valid.contains(relative.as_str()) || keep.contains(&relative) {
                continue;
            }

            match std::fs::remove_file(entry.path()) {
                Ok(()) => {
                    tracing::debug!("Purged {}", relative);
                    removed += 1;
                }
                Err(e) => tracing::warn!("Failed to purge {}: {}", relative, e),
            }
        }

        tracing::info!("Purged {} stale cache file(s)", removed);
        Ok(removed)
    }

    fn resolve(&self, logical: &str) -> Result<(String, &IndexEntry, Origin)> {
        let key = normalize_resource(logical);
        if let Some(entry) = self.app_index.get_normalized(&key) {
            return Ok((key, entry, Origin::Application));
        }
        if let Some(entry) = self.res_index.get_normalized(&key) {
            return Ok((key, entry, Origin::Resource));
        }
        Err(Error::ResourceNotFound(key))
    }

    /// Make sure the entry is on disk, downloading it at most once at a time.
    fn ensure_cached(&self, key: &str, entry: &IndexEntry, origin: Origin) -> Result<Utf8PathBuf> {
        let local = self.cache_dir.join(&entry.physical_path);
        if local.as_std_path().exists() {
            return Ok(local);
        }

        let lock = {
            let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(in_flight.entry(key.to_string()).or_default())
        };
        let guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        // Another thread may have finished the download while we waited.
        let result = if local.as_std_path().exists() {
            Ok(())
        } else {
            self.download(key, entry, origin, &local)
        };

        // Drop the per-path lock from the map while still holding it, unless a
        // later caller already replaced it.
        {
            let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
            if in_flight
                .get(key)
                .is_some_and(|current| Arc::ptr_eq(current, &lock))
            {
                in_flight.remove(key);
            }
        }
        drop(guard);

        result.map(|()| local)
    }

    fn download(
        &self,
        key: &str,
        entry: &IndexEntry,
        origin: Origin,
        local: &Utf8Path,
    ) -> Result<()> {
        let url = match origin {
            Origin::Application => self.endpoints.binaries_url(&entry.physical_path),
            Origin::Resource => self.endpoints.resources_url(&entry.physical_path),
        };
        tracing::debug!("Downloading {} from {}", key, url);
        let bytes = self.transport.get(&url)?;

        if entry.size != 0 && entry.size != bytes.len() as u64 {
            return Err(Error::SizeMismatch {
                path: key.to_string(),
                expected: entry.size,
                actual: bytes.len() as u64,
            });
        }

        write_atomically(local, &bytes)
    }
}

impl SharedCache for CacheDownloader {
    fn version(&self) -> &str {
        &self.version
    }

    fn resources(&self) -> Vec<String> {
        self.app_index
            .logical_paths()
            .chain(self.res_index.logical_paths())
            .map(str::to_string)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    fn has(&self, logical: &str) -> bool {
        self.resolve(logical).is_ok()
    }

    fn fetch(&self, logical: &str) -> Result<Vec<u8>> {
        let path = self.path_of(logical)?;
        Ok(std::fs::read(path.as_std_path())?)
    }

    fn path_of(&self, logical: &str) -> Result<Utf8PathBuf> {
        let (key, entry, origin) = self.resolve(logical)?;
        self.ensure_cached(&key, entry, origin)
    }

    fn hash_of(&self, logical: &str) -> Result<String> {
        let (_, entry, _) = self.resolve(logical)?;
        Ok(entry.content_hash.clone())
    }
}

/// Write `bytes` to `path` through a temporary file in the same directory, so a
/// crashed download never leaves a truncated file that would later be trusted.
fn write_atomically(path: &Utf8Path, bytes: &[u8]) -> Result<()> {
    let parent = path.parent().unwrap_or(Utf8Path::new("."));
    std::fs::create_dir_all(parent.as_std_path())?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent.as_std_path())?;
    tmp.write_all(bytes)?;
    tmp.persist(path.as_std_path()).map_err(|e| e.error)?;
    Ok(())
}
