use super::{create_output, stored};
use crate::engine::ServiceMetadata;
use crate::error::Result;
use crate::index::BuildIndex;
use camino::Utf8Path;
use std::fs::File;
use std::io::Write;
use zip::ZipWriter;

/// Name of the metadata entry inside the service bundle.
pub const SERVICE_METADATA_NAME: &str = "service_metadata.json";

/// Every derived file under its own name, plus the service metadata.
pub fn write_service_bundle(
    icon_dir: &Utf8Path,
    index: &BuildIndex,
    metadata: &ServiceMetadata,
    out: &Utf8Path,
) -> Result<()> {
    tracing::info!("Writing service bundle to {}", out);

    let mut zip = ZipWriter::new(create_output(out)?);
    let options = stored();

    for filename in index.current() {
        tracing::debug!("\t{}", filename);
        zip.start_file(filename.as_str(), options)?;
        let mut file = File::open(icon_dir.join(filename).as_std_path())?;
        std::io::copy(&mut file, &mut zip)?;
    }

    zip.start_file(SERVICE_METADATA_NAME, options)?;
    zip.write_all(serde_json::to_string_pretty(metadata)?.as_bytes())?;

    zip.finish()?;
    Ok(())
}

/// Icons, blueprint copies and renders under the conventional per-item names.
pub fn write_iec(icon_dir: &Utf8Path, metadata: &ServiceMetadata, out: &Utf8Path) -> Result<()> {
    tracing::info!("Writing IEC archive to {}", out);

    let mut zip = ZipWriter::new(create_output(out)?);
    let options = stored();

    for (type_id, kinds) in metadata {
        for (kind, filename) in kinds {
            let Some(entry) = kind.archive_name(*type_id) else {
                continue;
            };
            tracing::debug!("\t{} -> {}", filename, entry);
            zip.start_file(entry, options)?;
            let mut file = File::open(icon_dir.join(filename).as_std_path())?;
            std::io::copy(&mut file, &mut zip)?;
        }
    }

    zip.finish()?;
    Ok(())
}
