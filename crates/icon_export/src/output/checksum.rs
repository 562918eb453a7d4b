use super::create_output;
use crate::error::{Error, Result};
use crate::index::BuildIndex;
use camino::Utf8Path;
use sha2::{Digest, Sha256};
use std::io::Write;

/// Hex SHA-256 of the encoded index file.
pub fn index_checksum(index: &BuildIndex) -> String {
    hex::encode(Sha256::digest(index.encode()))
}

pub(super) fn write_checksum(index: &BuildIndex, out: Option<&Utf8Path>) -> Result<String> {
    let checksum = index_checksum(index);
    tracing::info!("Checksum: {}", checksum);

    if let Some(out) = out {
        let mut file = create_output(out)?;
        file.write_all(checksum.as_bytes())
            .map_err(|source| Error::Packaging {
                path: out.to_path_buf(),
                source,
            })?;
    }

    Ok(checksum)
}
