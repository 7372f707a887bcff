//! Snapshot file reading and signature output

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Result;

use super::{CatalogSnapshot, SignatureCache};
use crate::error::SqlSigError;
use crate::model::RoutineSignature;

/// Read a JSON catalog snapshot from disk.
pub fn load_snapshot(path: &Path) -> Result<CatalogSnapshot> {
    let content = std::fs::read_to_string(path).map_err(|e| SqlSigError::SnapshotReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    // Strip UTF-8 BOM if present
    let content = content.strip_prefix('\u{FEFF}').unwrap_or(&content);

    let snapshot: CatalogSnapshot =
        serde_json::from_str(content).map_err(|e| SqlSigError::SnapshotParseError {
            path: path.to_path_buf(),
            source: e,
        })?;

    Ok(snapshot)
}

/// Load a signature cache written by [`save_cache`].
///
/// A missing file yields an empty cache.
pub fn load_cache(path: &Path) -> Result<SignatureCache> {
    if !path.exists() {
        return Ok(SignatureCache::new());
    }

    let content = std::fs::read_to_string(path).map_err(|e| SqlSigError::CacheReadError {
        path: path.to_path_buf(),
        source: e,
    })?;
    let signatures: Vec<RoutineSignature> =
        serde_json::from_str(&content).map_err(|e| SqlSigError::CacheParseError {
            path: path.to_path_buf(),
            source: e,
        })?;

    Ok(SignatureCache::from_signatures(signatures))
}

/// Persist every cached signature to `path`.
pub fn save_cache(cache: &SignatureCache, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(&cache.signatures())
        .map_err(|e| SqlSigError::SerializeError { source: e })?;
    write_file(path, &json)
}

/// Write signatures as pretty JSON to `output`, or to stdout when `None`.
pub fn write_signatures(signatures: &[RoutineSignature], output: Option<&Path>) -> Result<()> {
    let mut json = serde_json::to_string_pretty(signatures)
        .map_err(|e| SqlSigError::SerializeError { source: e })?;
    json.push('\n');

    match output {
        Some(path) => write_file(path, &json)?,
        None => {
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            handle
                .write_all(json.as_bytes())
                .and_then(|_| handle.flush())
                .map_err(|e| SqlSigError::OutputWriteError {
                    path: PathBuf::from("<stdout>"),
                    source: e,
                })?;
        }
    }

    Ok(())
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| SqlSigError::OutputWriteError {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }
    std::fs::write(path, content).map_err(|e| SqlSigError::OutputWriteError {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(())
}
