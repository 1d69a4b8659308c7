//! Removal of plugins that are no longer in the manifest.

use std::collections::BTreeSet;
use std::io;
use std::path::Path;

use tracing::debug;

use crate::core::types::PluginName;

use super::types::{RemovedPlugin, SyncError};

/// List entries of `dir` whose names are not in `expected`.
///
/// Entries starting with `.` are never reported. A missing directory has no
/// stale entries. Results are sorted by name.
pub async fn find_stale(
    dir: &Path,
    expected: &BTreeSet<PluginName>,
) -> Result<Vec<RemovedPlugin>, SyncError> {
    let cleanup_error = |source| SyncError::Cleanup {
        path: dir.to_path_buf(),
        source,
    };

    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(cleanup_error(e)),
    };

    let mut stale = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(cleanup_error)? {
        let file_name = entry.file_name();
        let name = file_name.to_string_lossy();
        if name.starts_with('.') {
            continue;
        }
        let name = PluginName::new(name.as_ref());
        if !expected.contains(&name) {
            stale.push(RemovedPlugin {
                name,
                path: entry.path(),
            });
        }
    }

    stale.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(stale)
}

/// Delete a stale entry, whether it is a directory or a file.
pub async fn remove_entry(entry: &RemovedPlugin) -> Result<(), SyncError> {
    let path = &entry.path;
    let metadata = tokio::fs::symlink_metadata(path)
        .await
        .map_err(|source| SyncError::Cleanup {
            path: path.clone(),
            source,
        })?;

    let result = if metadata.is_dir() {
        tokio::fs::remove_dir_all(path).await
    } else {
        tokio::fs::remove_file(path).await
    };

    result.map_err(|source| SyncError::Cleanup {
        path: path.clone(),
        source,
    })?;
    debug!(plugin = %entry.name, path = %path.display(), "removed");
    Ok(())
}
