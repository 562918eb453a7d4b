//! Synthetic CDN for tests, enabled with the `test-utils` feature.
//!
//! [`MemoryTransport`] serves a fixed URL table and records every request.
//! [`MemoryCdn`] assembles a client descriptor, both manifests and the file bodies
//! from a list of `(logical path, bytes)` pairs and publishes them on a
//! [`MemoryTransport`]. Content hashes are xxHash3-128 of the bytes, so identical
//! art always yields identical hashes.

use crate::endpoints::CdnEndpoints;
use crate::error::{Error, Result};
use crate::transport::Transport;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, PoisonError, RwLock};
use xxhash_rust::xxh3::xxh3_128;

const RESOURCE_MANIFEST: &str = "app:/resfileindex.txt";

/// In-memory transport serving a fixed URL -> bytes table.
///
/// Records every request so callers can assert how often the network was hit.
#[derive(Default)]
pub struct MemoryTransport {
    files: RwLock<HashMap<String, Vec<u8>>>,
    requests: Mutex<Vec<String>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `bytes` at `url`, replacing any previous body.
    pub fn insert(&self, url: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.files
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(url.into(), bytes.into());
    }

    /// Stop serving `url`.
    pub fn remove(&self, url: &str) {
        self.files
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(url);
    }

    /// URLs requested so far, in request order.
    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of times `url` was requested.
    pub fn request_count(&self, url: &str) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|u| u.as_str() == url)
            .count()
    }
}

impl Transport for MemoryTransport {
    fn get(&self, url: &str) -> Result<Vec<u8>> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(url.to_string());

        self.files
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(url)
            .cloned()
            .ok_or_else(|| Error::Unavailable {
                url: url.to_string(),
            })
    }
}

/// Builder for an in-memory CDN.
#[derive(Debug, Clone)]
pub struct MemoryCdn {
    endpoints: CdnEndpoints,
    build: String,
    protected: bool,
    app_files: BTreeMap<String, Vec<u8>>,
    resources: BTreeMap<String, Vec<u8>>,
}

impl MemoryCdn {
    /// Create an empty CDN advertising the given client build.
    pub fn new(build: impl Into<String>) -> Self {
        Self {
            endpoints: CdnEndpoints {
                descriptor_url: "memory://binaries/client.json".to_string(),
                binaries_base: "memory://binaries".to_string(),
                resources_base: "memory://resources".to_string(),
                manifest_template: "eveonline_{build}.txt".to_string(),
                request_timeout_secs: None,
            },
            build: build.into(),
            protected: false,
            app_files: BTreeMap::new(),
            resources: BTreeMap::new(),
        }
    }

    /// Add a loose resource (listed in the resource manifest).
    pub fn with_resource(mut self, logical: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.resources.insert(logical.into(), bytes.into());
        self
    }

    /// Add an application file (listed in the application manifest).
    pub fn with_app_file(mut self, logical: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.app_files.insert(logical.into(), bytes.into());
        self
    }

    /// Flag the descriptor as protected.
    pub fn protected(mut self, protected: bool) -> Self {
        self.protected = protected;
        self
    }

    pub fn endpoints(&self) -> &CdnEndpoints {
        &self.endpoints
    }

    pub fn build(&self) -> &str {
        &self.build
    }

    /// Content hash the CDN declares for `bytes`.
    pub fn content_hash(bytes: &[u8]) -> String {
        format!("{:032x}", xxh3_128(bytes))
    }

    /// Physical path under which a resource with the given hash is published.
    pub fn physical_path(hash: &str) -> String {
        format!("{}/{}", &hash[..2], hash)
    }

    /// Publish everything on a new transport.
    pub fn into_transport(self) -> MemoryTransport {
        let transport = MemoryTransport::new();

        let descriptor = serde_json::json!({
            "buildNumber": self.build,
            "protected": self.protected,
        });
        transport.insert(
            self.endpoints.descriptor_url.clone(),
            descriptor.to_string().into_bytes(),
        );

        let mut res_manifest = String::new();
        for (logical, bytes) in &self.resources {
            let (line, physical) = manifest_line(logical, bytes);
            res_manifest.push_str(&line);
            transport.insert(self.endpoints.resources_url(&physical), bytes.clone());
        }

        let mut app_files = self.app_files;
        app_files.insert(RESOURCE_MANIFEST.to_string(), res_manifest.into_bytes());

        let mut app_manifest = String::new();
        for (logical, bytes) in &app_files {
            let (line, physical) = manifest_line(logical, bytes);
            app_manifest.push_str(&line);
            transport.insert(self.endpoints.binaries_url(&physical), bytes.clone());
        }

        let manifest_name = self.endpoints.manifest_name(&self.build);
        transport.insert(
            self.endpoints.binaries_url(&manifest_name),
            app_manifest.into_bytes(),
        );

        transport
    }
}

fn manifest_line(logical: &str, bytes: &[u8]) -> (String, String) {
    let hash = MemoryCdn::content_hash(bytes);
    let physical = MemoryCdn::physical_path(&hash);
    (
        format!("{},{},{},{}\n", logical, physical, hash, bytes.len()),
        physical,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_transport_serves_and_records() {
        let transport = MemoryTransport::new();
        transport.insert("https://cdn/a", b"hello".to_vec());

        assert_eq!(transport.get("https://cdn/a").unwrap(), b"hello");
        assert!(matches!(
            transport.get("https://cdn/b"),
            Err(Error::Unavailable { .. })
        ));
        assert_eq!(transport.requests(), vec!["https://cdn/a", "https://cdn/b"]);
        assert_eq!(transport.request_count("https://cdn/a"), 1);
    }

    #[test]
    fn test_publishes_descriptor_and_manifests() {
        let cdn = MemoryCdn::new("1234").with_resource("res:/ui/a.png", b"aaa".to_vec());
        let endpoints = cdn.endpoints().clone();
        let transport = cdn.into_transport();

        let descriptor = transport.get(&endpoints.descriptor_url).unwrap();
        assert!(String::from_utf8(descriptor).unwrap().contains("1234"));

        let manifest = transport
            .get(&endpoints.binaries_url("eveonline_1234.txt"))
            .unwrap();
        assert!(String::from_utf8(manifest)
            .unwrap()
            .starts_with("app:/resfileindex.txt,"));

        let hash = MemoryCdn::content_hash(b"aaa");
        let body = transport
            .get(&endpoints.resources_url(&MemoryCdn::physical_path(&hash)))
            .unwrap();
        assert_eq!(body, b"aaa");
    }

    #[test]
    fn test_identical_bytes_share_hash() {
        assert_eq!(MemoryCdn::content_hash(b"x"), MemoryCdn::content_hash(b"x"));
        assert_ne!(MemoryCdn::content_hash(b"x"), MemoryCdn::content_hash(b"y"));
    }
}
