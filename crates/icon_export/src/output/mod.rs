//! Output targets for a finished build.
//!
//! | mode | produces |
//! |------|----------|
//! | [`OutputMode::ServiceBundle`] | zip of every derived file plus `service_metadata.json` |
//! | [`OutputMode::Iec`] | zip with files renamed to `{id}_64.png`, `{id}_bpc_64.png`, `{id}_512.jpg` |
//! | [`OutputMode::WebDir`] | directory of per-item links with its own `index.json` |
//! | [`OutputMode::Checksum`] | SHA-256 over the build index |
//! | [`OutputMode::AuxIcons`] | zip of the raw catalog icon resources |
//! | [`OutputMode::AuxAll`] | zip of every image resource the cache lists |
//!
//! Bundles and archives are rewritten completely on every run. The web directory
//! keeps an index of its own and only touches links whose target changed.

mod bundle;
mod checksum;
mod dump;
mod web_dir;

pub use bundle::SERVICE_METADATA_NAME;
pub use checksum::index_checksum;
pub use web_dir::WEB_INDEX_FILE_NAME;

use crate::data::IconBuildData;
use crate::engine::{BuildOutcome, IconBuildEngine, ServiceMetadata};
use crate::error::{Error, Result};
use crate::index::BuildIndex;
use camino::{Utf8Path, Utf8PathBuf};
use icon_cache::SharedCache;
use std::fs::File;
use zip::write::SimpleFileOptions;

/// How web directory entries point at the icon folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkMode {
    Copy,
    HardLink,
    #[default]
    Symlink,
}

/// What to produce from a build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputMode {
    ServiceBundle { out: Utf8PathBuf },
    Iec { out: Utf8PathBuf },
    WebDir { out: Utf8PathBuf, link: LinkMode },
    /// Digest is written to `out` if given, otherwise only returned.
    Checksum { out: Option<Utf8PathBuf> },
    AuxIcons { out: Utf8PathBuf },
    AuxAll { out: Utf8PathBuf },
}

impl OutputMode {
    pub fn name(&self) -> &'static str {
        match self {
            OutputMode::ServiceBundle { .. } => "service_bundle",
            OutputMode::Iec { .. } => "iec",
            OutputMode::WebDir { .. } => "web_dir",
            OutputMode::Checksum { .. } => "checksum",
            OutputMode::AuxIcons { .. } => "aux_icons",
            OutputMode::AuxAll { .. } => "aux_all",
        }
    }
}

/// Writes the selected output from a build's index and metadata.
pub struct OutputPackager<'a> {
    icon_dir: &'a Utf8Path,
    index: &'a BuildIndex,
    metadata: &'a ServiceMetadata,
    cache: &'a dyn SharedCache,
    data: &'a IconBuildData,
    force_rebuild: bool,
}

impl<'a> OutputPackager<'a> {
    pub fn new(engine: &'a IconBuildEngine<'_>, outcome: &'a BuildOutcome) -> Self {
        Self {
            icon_dir: engine.icon_dir(),
            index: &outcome.index,
            metadata: &outcome.metadata,
            cache: engine.cache(),
            data: engine.data(),
            force_rebuild: engine.options().force_rebuild,
        }
    }

    /// Produce the output. Returns the digest for [`OutputMode::Checksum`].
    pub fn package(&self, mode: &OutputMode) -> Result<Option<String>> {
        tracing::info!("Writing {} output", mode.name());

        match mode {
            OutputMode::ServiceBundle { out } => {
                bundle::write_service_bundle(self.icon_dir, self.index, self.metadata, out)?
            }
            OutputMode::Iec { out } => bundle::write_iec(self.icon_dir, self.metadata, out)?,
            OutputMode::WebDir { out, link } => web_dir::write_web_dir(
                self.icon_dir,
                self.metadata,
                out,
                *link,
                self.force_rebuild,
            )?,
            OutputMode::Checksum { out } => {
                return checksum::write_checksum(self.index, out.as_deref()).map(Some);
            }
            OutputMode::AuxIcons { out } => dump::write_aux_icons(self.cache, self.data, out)?,
            OutputMode::AuxAll { out } => dump::write_aux_all(self.cache, out)?,
        }

        Ok(None)
    }
}

/// Options shared by every archive: no compression, the images already are.
fn stored() -> SimpleFileOptions {
    SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored)
}

/// Create an output file, creating its parent directory first.
fn create_output(path: &Utf8Path) -> Result<File> {
    let packaging = |source| Error::Packaging {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_str().is_empty()) {
        std::fs::create_dir_all(parent.as_std_path()).map_err(packaging)?;
    }
    File::create(path.as_std_path()).map_err(packaging)
}
