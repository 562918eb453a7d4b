//! Local disk cache for game client resources.
//!
//! The game client ships its art as content-addressed files on a CDN. Two manifests
//! map *logical* resource names (`res:/ui/texture/icons/7_64_1.png`) to *physical*
//! CDN paths and declared content hashes:
//!
//! - the **application** manifest, named after the current client build, and
//! - the **resource** manifest (`app:/resfileindex.txt`), itself listed in the
//!   application manifest.
//!
//! [`CacheDownloader`] downloads both manifests once, builds a [`ResourceIndex`] for
//! each, and then serves individual resources on demand. Files are written under the
//! cache root at their physical path and never downloaded twice.
//!
//! Consumers should program against the [`SharedCache`] trait so that lookups
//! ([`has`](SharedCache::has), [`hash_of`](SharedCache::hash_of)) stay cheap and
//! network I/O only happens on [`fetch`](SharedCache::fetch) or
//! [`path_of`](SharedCache::path_of).
//!
//! # Example
//!
//! ```no_run
//! use icon_cache::{CacheDownloader, CdnEndpoints, SharedCache};
//! use camino::Utf8PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let cache = CacheDownloader::new(
//!     Utf8PathBuf::from("./cache"),
//!     "icon-builder/0.1 (ops@example.com)",
//!     CdnEndpoints::default(),
//! )?;
//!
//! println!("client build {}", cache.version());
//! if cache.has("res:/ui/texture/icons/7_64_1.png") {
//!     let path = cache.path_of("res:/ui/texture/icons/7_64_1.png")?;
//!     println!("cached at {path}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod downloader;
pub mod endpoints;
pub mod error;
pub mod index;
#[cfg(any(test, feature = "test-utils"))]
pub mod memory;
pub mod shared;
pub mod transport;

pub use downloader::CacheDownloader;
pub use endpoints::CdnEndpoints;
pub use error::{Error, Result};
pub use index::{normalize_resource, IndexEntry, ResourceIndex};
#[cfg(any(test, feature = "test-utils"))]
pub use memory::{MemoryCdn, MemoryTransport};
pub use shared::SharedCache;
pub use transport::{HttpTransport, Transport};
