//! Manifest parsing and logical path lookup.
//!
//! A manifest is a plain text file with one resource per line:
//!
//! ```text
//! res:/ui/texture/icons/7_64_1.png,a1/a1b2c3d4_e5f6,a1b2c3d4e5f6,1832
//! ```
//!
//! The fields are `logical_path,physical_path,content_hash[,size]`. Logical paths are
//! normalized with [`normalize_resource`] before they are stored, so every lookup must
//! go through the same normalization (the [`ResourceIndex`] methods do this for you).

use crate::error::{Error, Result};
use std::collections::HashMap;

/// Normalize a logical resource path for lookup.
///
/// Lower-cases the path and converts backslashes to forward slashes, so
/// `Res:\UI\Icon.PNG` and `res:/ui/icon.png` resolve to the same entry.
pub fn normalize_resource(path: &str) -> String {
    path.trim().to_lowercase().replace('\\', "/")
}

/// One manifest record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    /// Path of the file relative to the CDN base and to the local cache root.
    pub physical_path: String,
    /// Content hash as declared by the manifest. Never recomputed locally.
    pub content_hash: String,
    /// Declared size in bytes, `0` when the manifest omits it.
    pub size: u64,
}

/// Lookup table from normalized logical path to [`IndexEntry`].
///
/// Built once from a downloaded manifest and immutable afterwards.
#[derive(Debug, Clone, Default)]
pub struct ResourceIndex {
    entries: HashMap<String, IndexEntry>,
}

impl ResourceIndex {
    /// Parse manifest text.
    ///
    /// Blank lines are skipped. A line with fewer than three fields, or a size field
    /// that is not an unsigned integer, fails the whole parse: a half-read manifest
    /// would silently drop resources.
    pub fn parse(content: &str) -> Result<Self> {
        let mut entries = HashMap::new();

        for (idx, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let fields: Vec<&str> = line.split(',').map(str::trim).collect();
            if fields.len() < 3 {
                return Err(Error::IndexParse {
                    line: idx + 1,
                    reason: format!("expected at least 3 fields, found {}", fields.len()),
                });
            }

            let size = match fields.get(3) {
                Some(raw) if !raw.is_empty() => raw.parse::<u64>().map_err(|e| Error::IndexParse {
                    line: idx + 1,
                    reason: format!("invalid size '{raw}': {e}"),
                })?,
                _ => 0,
            };

            entries.insert(
                normalize_resource(fields[0]),
                IndexEntry {
                    physical_path: fields[1].to_string(),
                    content_hash: fields[2].to_string(),
                    size,
                },
            );
        }

        Ok(Self { entries })
    }

    /// Parse manifest bytes, rejecting non UTF-8 content.
    pub fn parse_bytes(bytes: &[u8]) -> Result<Self> {
        let content = std::str::from_utf8(bytes).map_err(|e| Error::IndexParse {
            line: 0,
            reason: format!("manifest is not valid UTF-8: {e}"),
        })?;
        Self::parse(content)
    }

    /// Look up a logical path (normalized internally).
    pub fn get(&self, logical: &str) -> Option<&IndexEntry> {
        self.entries.get(&normalize_resource(logical))
    }

    /// Look up an already normalized key without allocating.
    pub(crate) fn get_normalized(&self, key: &str) -> Option<&IndexEntry> {
        self.entries.get(key)
    }

    pub fn contains(&self, logical: &str) -> bool {
        self.get(logical).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate normalized logical paths (unordered).
    pub fn logical_paths(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Iterate physical paths of all entries (unordered).
    pub fn physical_paths(&self) -> impl Iterator<Item = &str> {
        self.entries.values().map(|e| e.physical_path.as_str())
    }
}
