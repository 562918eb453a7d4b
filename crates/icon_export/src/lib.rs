//! Incremental item icon builder for the static data export.
//!
//! Icons are assembled from client textures served by an [`icon_cache::SharedCache`]:
//! plain icons, icons with a tech badge, and blueprint, reaction and relic variants
//! layered onto their background art. Every derived file is named after the content
//! hashes of its sources, so a file only has to be produced once and items sharing
//! art share the file.
//!
//! - **Content-addressed names**: see [`IconKind::derived_filename`]
//! - **Incremental builds**: the [`BuildIndex`] remembers what the previous run produced
//! - **Parallel compositing**: missing files are rendered on the rayon pool
//! - **Several outputs**: service bundle, IEC archive, web directory, checksum and raw dumps
//!
//! # Example
//!
//! ```no_run
//! use icon_export::{build_icon_export, IconBuildData, IconBuildEngine, OutputMode};
//! use icon_cache::{CacheDownloader, CdnEndpoints};
//! use camino::Utf8PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let cache = CacheDownloader::new(
//!     Utf8PathBuf::from("./cache"),
//!     "icon-builder/0.1 (ops@example.com)",
//!     CdnEndpoints::default(),
//! )?;
//! let data: IconBuildData = serde_json::from_str(&std::fs::read_to_string("catalog.json")?)?;
//!
//! let engine = IconBuildEngine::new(&data, &cache, Utf8PathBuf::from("./icons"));
//! let mode = OutputMode::ServiceBundle { out: Utf8PathBuf::from("icons.zip") };
//! let report = build_icon_export(&engine, &mode, true)?;
//! println!("{} new, {} removed", report.to_add, report.to_remove);
//! # Ok(())
//! # }
//! ```

pub mod compositor;
pub mod data;
pub mod engine;
pub mod error;
pub mod export;
pub mod index;
pub mod kind;
pub mod output;
pub mod recipe;
pub mod rules;

// Re-export main types
pub use data::{IconBuildData, TypeId, TypeInfo};
pub use engine::{
    BuildOptions, BuildOutcome, BuildProgress, BuildReport, IconBuildEngine, ItemIconTask,
    PhaseTimings, PlannedVariant, ServiceMetadata,
};
pub use error::{Error, Result};
pub use export::build_icon_export;
pub use index::{BuildIndex, IndexDelta, INDEX_FILE_NAME};
pub use kind::IconKind;
pub use output::{index_checksum, LinkMode, OutputMode, OutputPackager};
pub use recipe::Recipe;
pub use rules::{BlueprintArt, BuildRules};
