//! Catalog JSON loading.

use crate::errors::CliError;
use camino::Utf8Path;
use icon_export::IconBuildData;

/// Read the exported catalog tables the icon build needs.
pub fn load_catalog(path: &Utf8Path) -> Result<IconBuildData, CliError> {
    let bytes = std::fs::read(path.as_std_path()).map_err(|source| CliError::CatalogRead {
        path: path.to_path_buf(),
        source,
    })?;
    let data: IconBuildData =
        serde_json::from_slice(&bytes).map_err(|source| CliError::CatalogParse {
            path: path.to_path_buf(),
            source,
        })?;

    tracing::info!(
        "Catalog: {} types, {} groups, {} icons, {} graphics",
        data.types.len(),
        data.group_categories.len(),
        data.icon_files.len(),
        data.graphics_folders.len()
    );
    Ok(data)
}
