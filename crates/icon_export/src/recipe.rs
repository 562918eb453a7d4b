//! How a derived file is produced from cached resources.

use crate::compositor;
use crate::error::{Error, Result};
use icon_cache::SharedCache;
use image::RgbaImage;

/// Instructions for producing one derived file.
///
/// Recipes only name logical resources; nothing is fetched until
/// [`render`](Recipe::render) runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipe {
    /// Pass the resource through, converting it if its format differs from the target.
    Copy { source: String },
    /// Icon resized to 64 with a tech badge in the corner.
    Tech { icon: String, tech: String },
    /// Icon on a background with an additive overlay and an optional tech badge.
    Layered {
        background: String,
        overlay: String,
        icon: String,
        tech: Option<String>,
    },
}

impl Recipe {
    /// Logical resources this recipe reads, in order.
    pub fn sources(&self) -> Vec<&str> {
        match self {
            Recipe::Copy { source } => vec![source.as_str()],
            Recipe::Tech { icon, tech } => vec![icon.as_str(), tech.as_str()],
            Recipe::Layered {
                background,
                overlay,
                icon,
                tech,
            } => {
                let mut sources = vec![background.as_str(), overlay.as_str(), icon.as_str()];
                sources.extend(tech.as_deref());
                sources
            }
        }
    }

    /// Produce the bytes of `filename`.
    ///
    /// Fetch failures come back as [`Error::Cache`]; undecodable art as
    /// [`Error::Composition`].
    pub fn render(&self, cache: &dyn SharedCache, filename: &str) -> Result<Vec<u8>> {
        let image = match self {
            Recipe::Copy { source } => {
                return compositor::copy_or_convert(cache.fetch(source)?, source, filename);
            }
            Recipe::Tech { icon, tech } => {
                let icon = load(cache, icon, filename)?;
                let tech = load(cache, tech, filename)?;
                compositor::composite_tech(&icon, &tech)
            }
            Recipe::Layered {
                background,
                overlay,
                icon,
                tech,
            } => {
                let background = load(cache, background, filename)?;
                let overlay = load(cache, overlay, filename)?;
                let icon = load(cache, icon, filename)?;
                let tech = match tech {
                    Some(tech) => Some(load(cache, tech, filename)?),
                    None => None,
                };
                compositor::composite_blueprint(&background, &overlay, &icon, tech.as_ref())
            }
        };

        compositor::encode_png(&image).map_err(|source| Error::Composition {
            filename: filename.to_string(),
            source,
        })
    }
}

fn load(cache: &dyn SharedCache, resource: &str, filename: &str) -> Result<RgbaImage> {
    let bytes = cache.fetch(resource)?;
    compositor::decode(&bytes).map_err(|source| Error::Composition {
        filename: filename.to_string(),
        source,
    })
}
