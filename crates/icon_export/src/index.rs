//! Persisted set of derived filenames.
//!
//! After every build the names of all derived files are written to `cache.csv` in
//! the icon folder: sorted, joined by the record separator byte `0x1E`, no trailing
//! separator. On the next build that file becomes the *previous* set. A derived file
//! whose name is already in it is not composited again, and the two sets give the
//! add/remove delta once the build is done.
//!
//! This is the only state carried between builds. There is no timestamp or
//! dependency tracking: because names are derived from content hashes, a name
//! being present means its content is current.

use crate::error::{Error, Result};
use camino::Utf8Path;
use std::collections::BTreeSet;

/// Separator between entries of the index file.
pub const RECORD_SEPARATOR: u8 = 0x1E;

/// File name of the index inside the icon folder.
pub const INDEX_FILE_NAME: &str = "cache.csv";

/// Encode names in iteration order, separated by [`RECORD_SEPARATOR`].
pub fn encode_index<'a, I>(names: I) -> Vec<u8>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut out = Vec::new();
    for (idx, name) in names.into_iter().enumerate() {
        if idx > 0 {
            out.push(RECORD_SEPARATOR);
        }
        out.extend_from_slice(name.as_bytes());
    }
    out
}

/// Decode index bytes. Empty records are ignored.
pub fn decode_index(bytes: &[u8]) -> Result<BTreeSet<String>> {
    bytes
        .split(|b| *b == RECORD_SEPARATOR)
        .filter(|record| !record.is_empty())
        .map(|record| {
            String::from_utf8(record.to_vec())
                .map_err(|e| Error::CorruptIndex(format!("entry is not valid UTF-8: {e}")))
        })
        .collect()
}

/// Difference between the previous and the current build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexDelta {
    /// Names produced now that the previous build did not have.
    pub to_add: Vec<String>,
    /// Names the previous build had that are no longer produced.
    pub to_remove: Vec<String>,
}

impl IndexDelta {
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}

/// Previous and current derived filename sets of one build.
#[derive(Debug, Clone, Default)]
pub struct BuildIndex {
    previous: BTreeSet<String>,
    current: BTreeSet<String>,
    force_rebuild: bool,
}

impl BuildIndex {
    /// Start a build on top of a known previous set.
    ///
    /// With `force_rebuild`, [`already_built`](Self::already_built) always answers
    /// `false`, but the previous set still drives the delta.
    pub fn new(previous: BTreeSet<String>, force_rebuild: bool) -> Self {
        Self {
            previous,
            current: BTreeSet::new(),
            force_rebuild,
        }
    }

    /// Load the previous set from `path`. A missing file means a first build.
    pub fn load(path: &Utf8Path, force_rebuild: bool) -> Result<Self> {
        let previous = if path.as_std_path().exists() {
            decode_index(&std::fs::read(path.as_std_path())?)?
        } else {
            BTreeSet::new()
        };

        tracing::debug!("Loaded {} previous index entries from {}", previous.len(), path);
        Ok(Self::new(previous, force_rebuild))
    }

    /// Whether the previous build already produced this file.
    pub fn already_built(&self, name: &str) -> bool {
        !self.force_rebuild && self.previous.contains(name)
    }

    /// Record that the current build produces this file.
    pub fn register(&mut self, name: impl Into<String>) {
        self.current.insert(name.into());
    }

    /// Withdraw a name, used when a variant could not be produced after all.
    pub fn unregister(&mut self, name: &str) -> bool {
        self.current.remove(name)
    }

    /// Names produced by the current build, sorted.
    pub fn current(&self) -> &BTreeSet<String> {
        &self.current
    }

    /// Names produced by the previous build, sorted.
    pub fn previous(&self) -> &BTreeSet<String> {
        &self.previous
    }

    pub fn delta(&self) -> IndexDelta {
        IndexDelta {
            to_add: self.current.difference(&self.previous).cloned().collect(),
            to_remove: self.previous.difference(&self.current).cloned().collect(),
        }
    }

    /// Bytes of the index file for the current set.
    pub fn encode(&self) -> Vec<u8> {
        encode_index(self.current.iter().map(String::as_str))
    }

    /// Persist the current set, creating parent directories if needed.
    pub fn save(&self, path: &Utf8Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent.as_std_path())?;
        }
        std::fs::write(path.as_std_path(), self.encode())?;
        Ok(())
    }
}
