use crate::error::{CoreError, CoreResult};
use sha2::{Digest, Sha256};
use std::io::{Cursor, Read, Write};
use zip::write::{FileOptions, ZipWriter};
use zip::{CompressionMethod, ZipArchive};

/// Writes `parts` into an in-memory zip with the same bytes for the same
/// input:
/// - entries sorted by path
/// - fixed timestamps (1980-01-01, the zip epoch)
/// - fixed compression method/level and permissions
/// - empty comment
pub fn write_package(mut parts: Vec<(String, Vec<u8>)>) -> CoreResult<Vec<u8>> {
    parts.sort_by(|a, b| a.0.cmp(&b.0));
    if let Some(w) = parts.windows(2).find(|w| w[0].0 == w[1].0) {
        return Err(CoreError::Zip(format!("duplicate package part {}", w[0].0)));
    }

    let mut zw = ZipWriter::new(Cursor::new(Vec::new()));
    let fixed_time = zip::DateTime::from_date_and_time(1980, 1, 1, 0, 0, 0)
        .map_err(|_| CoreError::Zip("failed to create fixed zip datetime".to_string()))?;
    let opts = FileOptions::<()>::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(9))
        .last_modified_time(fixed_time)
        .unix_permissions(0o644);

    for (path, bytes) in parts {
        zw.start_file(path, opts)
            .map_err(|e| CoreError::Zip(e.to_string()))?;
        zw.write_all(&bytes)?;
    }

    zw.set_comment("");
    let cursor = zw.finish().map_err(|e| CoreError::Zip(e.to_string()))?;
    Ok(cursor.into_inner())
}

/// Re-packs an existing zip through [`write_package`], dropping the
/// timestamps and entry order of whatever wrote it first.
pub fn normalize_package(bytes: &[u8]) -> CoreResult<Vec<u8>> {
    let mut zip =
        ZipArchive::new(Cursor::new(bytes)).map_err(|e| CoreError::Zip(e.to_string()))?;
    let mut parts = Vec::with_capacity(zip.len());
    for i in 0..zip.len() {
        let mut entry = zip.by_index(i).map_err(|e| CoreError::Zip(e.to_string()))?;
        if entry.is_dir() {
            continue;
        }
        let mut data = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut data)?;
        parts.push((entry.name().to_string(), data));
    }
    write_package(parts)
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}
