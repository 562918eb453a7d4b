//! Directory of per-item files for static web hosting.
//!
//! For every item the directory holds `{id}.json`, a JSON array of the kinds the
//! item has, and one entry per kind named `{id}_{kind}.{ext}` that points at the
//! derived file in the icon folder. `index.json` maps every entry name to what it was
//! made from: the derived filename for links, the JSON text for item files. On the
//! next run only entries whose mapping changed are touched, and entries that are no
//! longer produced are deleted.
//!
//! A link that cannot be created is logged and left out of the index, so the next
//! run tries again. Everything else is fatal.

use super::LinkMode;
use crate::engine::ServiceMetadata;
use crate::error::{Error, Result};
use camino::Utf8Path;
use std::collections::BTreeMap;
use std::io;

pub const WEB_INDEX_FILE_NAME: &str = "index.json";

type WebIndex = BTreeMap<String, String>;

pub fn write_web_dir(
    icon_dir: &Utf8Path,
    metadata: &ServiceMetadata,
    out: &Utf8Path,
    link: LinkMode,
    force_rebuild: bool,
) -> Result<()> {
    tracing::info!("Building web directory in {} ({:?})", out, link);

    let packaging = |path: &Utf8Path| {
        let path = path.to_path_buf();
        move |source| Error::Packaging { path, source }
    };

    std::fs::create_dir_all(out.as_std_path()).map_err(packaging(out))?;
    let icon_dir = icon_dir.canonicalize_utf8().map_err(packaging(icon_dir))?;

    let index_path = out.join(WEB_INDEX_FILE_NAME);
    let previous: WebIndex = if index_path.as_std_path().exists() {
        serde_json::from_slice(&std::fs::read(index_path.as_std_path())?)?
    } else {
        WebIndex::new()
    };
    let changed = |name: &str, source: &str| {
        force_rebuild || previous.get(name).map(String::as_str) != Some(source)
    };

    let mut created = WebIndex::new();
    for (type_id, kinds) in metadata {
        let json_name = format!("{type_id}.json");
        let json_content = serde_json::to_string(&kinds.keys().collect::<Vec<_>>())?;
        if changed(&json_name, &json_content) {
            let path = out.join(&json_name);
            std::fs::write(path.as_std_path(), &json_content).map_err(packaging(&path))?;
        }
        created.insert(json_name, json_content);

        for (kind, filename) in kinds {
            let link_name = kind.link_name(*type_id);
            if !changed(&link_name, filename) {
                tracing::debug!("\tUnchanged: {}", link_name);
                created.insert(link_name, filename.clone());
                continue;
            }

            let source = icon_dir.join(filename);
            let target = out.join(&link_name);
            match place(link, &source, &target) {
                Ok(()) => {
                    tracing::debug!("\t{} -> {}", filename, link_name);
                    created.insert(link_name, filename.clone());
                }
                Err(e) => tracing::warn!("Failed to link {} -> {}: {}", filename, link_name, e),
            }
        }
    }

    for name in previous.keys().filter(|name| !created.contains_key(*name)) {
        tracing::debug!("\tRemoving: {}", name);
        let _ = std::fs::remove_file(out.join(name).as_std_path());
    }

    std::fs::write(index_path.as_std_path(), serde_json::to_string(&created)?)
        .map_err(packaging(&index_path))?;
    Ok(())
}

/// Replace `target` with a copy of or link to `source`.
fn place(link: LinkMode, source: &Utf8Path, target: &Utf8Path) -> io::Result<()> {
    // Never write through a link left by a previous run into the icon folder.
    if target.as_std_path().symlink_metadata().is_ok() {
        std::fs::remove_file(target.as_std_path())?;
    }

    match link {
        LinkMode::Copy => std::fs::copy(source.as_std_path(), target.as_std_path()).map(|_| ()),
        LinkMode::HardLink => std::fs::hard_link(source.as_std_path(), target.as_std_path()),
        LinkMode::Symlink => symlink(source, target),
    }
}

#[cfg(unix)]
fn symlink(source: &Utf8Path, target: &Utf8Path) -> io::Result<()> {
    std::os::unix::fs::symlink(source.as_std_path(), target.as_std_path())
}

#[cfg(windows)]
fn symlink(source: &Utf8Path, target: &Utf8Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(source.as_std_path(), target.as_std_path())
}
