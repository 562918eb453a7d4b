//! CDN endpoint configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Where the client descriptor, manifests and files live.
///
/// The defaults point at the production CDN. Every field can be overridden from the
/// `[cdn]` table of the builder's config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct CdnEndpoints {
    /// JSON document with the current `buildNumber` and `protected` flag.
    pub descriptor_url: String,
    /// Base URL for application files (including the application manifest).
    pub binaries_base: String,
    /// Base URL for loose resource files.
    pub resources_base: String,
    /// File name of the application manifest, `{build}` is replaced by the build id.
    pub manifest_template: String,
    /// Per-request timeout in seconds. `None` leaves the client default in place.
    pub request_timeout_secs: Option<u64>,
}

impl Default for CdnEndpoints {
    fn default() -> Self {
        Self {
            descriptor_url: "https://binaries.eveonline.com/eveclient_TQ.json".to_string(),
            binaries_base: "https://binaries.eveonline.com".to_string(),
            resources_base: "https://resources.eveonline.com".to_string(),
            manifest_template: "eveonline_{build}.txt".to_string(),
            request_timeout_secs: Some(120),
        }
    }
}

impl CdnEndpoints {
    /// Application manifest file name for a client build.
    pub fn manifest_name(&self, build: &str) -> String {
        self.manifest_template.replace("{build}", build)
    }

    pub fn binaries_url(&self, physical_path: &str) -> String {
        join_url(&self.binaries_base, physical_path)
    }

    pub fn resources_url(&self, physical_path: &str) -> String {
        join_url(&self.resources_base, physical_path)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
