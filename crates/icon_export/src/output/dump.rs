//! Raw resource dumps that bypass the derived files.

use super::{create_output, stored};
use crate::data::IconBuildData;
use crate::error::Result;
use camino::Utf8Path;
use icon_cache::SharedCache;
use std::collections::HashSet;
use std::io::Write;
use zip::ZipWriter;

/// Every catalog icon resource as `{icon_id}.{ext}`. Unfetchable icons are skipped.
pub fn write_aux_icons(cache: &dyn SharedCache, data: &IconBuildData, out: &Utf8Path) -> Result<()> {
    tracing::info!("Writing auxiliary icon dump to {}", out);

    let mut zip = ZipWriter::new(create_output(out)?);
    let options = stored();

    for (icon_id, resource) in &data.icon_files {
        let extension = match resource.rsplit_once('.') {
            Some((_, ext)) => ext,
            None => resource.rsplit('/').next().unwrap_or(resource),
        };

        let bytes = match cache.fetch(resource) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::debug!("Skipping icon {} ({}): {}", icon_id, resource, e);
                continue;
            }
        };

        tracing::debug!("\t{}: {}", icon_id, resource);
        zip.start_file(format!("{icon_id}.{extension}"), options)?;
        zip.write_all(&bytes)?;
    }

    zip.finish()?;
    Ok(())
}

/// Every `.png` and `.jpg` resource under its logical path without the scheme.
pub fn write_aux_all(cache: &dyn SharedCache, out: &Utf8Path) -> Result<()> {
    tracing::info!("Writing image dump to {}", out);

    let mut zip = ZipWriter::new(create_output(out)?);
    let options = stored();
    let mut written = HashSet::new();

    for resource in cache.resources() {
        if !(resource.ends_with("png") || resource.ends_with("jpg")) {
            continue;
        }

        let name = match resource.split_once(":/") {
            Some((_, path)) => path.to_string(),
            None => resource.clone(),
        };
        if !written.insert(name.clone()) {
            tracing::debug!("Skipping {}, {} is already in the dump", resource, name);
            continue;
        }

        let bytes = match cache.fetch(&resource) {
            Ok(bytes) => bytes,
            Err(e) if e.is_recoverable() => {
                tracing::warn!("Skipping {}: {}", resource, e);
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        tracing::debug!("\t{}", resource);
        zip.start_file(name, options)?;
        zip.write_all(&bytes)?;
    }

    zip.finish()?;
    Ok(())
}
