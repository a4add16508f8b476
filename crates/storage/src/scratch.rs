//! Scratch directory handle with delete-then-write replacement semantics.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, info};

use crate::error::{CacheError, CacheResult};

/// Handle to a local scratch directory holding downloaded payloads.
///
/// Entries are keyed by file name. Writing an entry always removes any
/// previous file of the same name first, so a crash mid-download leaves at
/// worst a stale file that the next write clears.
///
/// The handle does no locking: concurrent use of one directory by several
/// fetchers is not supported.
#[derive(Debug, Clone)]
pub struct ScratchCache {
    root: PathBuf,
}

impl ScratchCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the directory (and parents) if it does not exist.
    pub async fn ensure(&self) -> CacheResult<()> {
        fs::create_dir_all(&self.root)
            .await
            .map_err(|source| CacheError::CreateDir {
                path: self.root.clone(),
                source,
            })
    }

    /// Path of the entry `name` inside the cache.
    pub fn path(&self, name: &str) -> CacheResult<PathBuf> {
        validate_name(name)?;
        Ok(self.root.join(name))
    }

    /// Remove every file in the cache, returning how many were removed.
    ///
    /// Best-effort: unreadable directories and undeletable files are logged
    /// and skipped.
    pub async fn purge(&self) -> usize {
        self.remove_matching(|_| true).await
    }

    /// Remove every file whose name ends with `suffix`.
    ///
    /// Best-effort, like [`ScratchCache::purge`].
    pub async fn remove_files_with_suffix(&self, suffix: &str) -> usize {
        self.remove_matching(|name| name.ends_with(suffix)).await
    }

    /// Store `data` under `qualified_name`.
    ///
    /// The payload is first written under `raw_name` (the name it has on the
    /// server) and then moved to its qualified name. Existing files under
    /// either name are deleted beforehand.
    pub async fn store(
        &self,
        raw_name: &str,
        qualified_name: &str,
        data: &[u8],
    ) -> CacheResult<PathBuf> {
        let raw_path = self.path(raw_name)?;
        let final_path = self.path(qualified_name)?;

        remove_if_present(&raw_path).await;
        remove_if_present(&final_path).await;

        fs::write(&raw_path, data)
            .await
            .map_err(|source| CacheError::Write {
                path: raw_path.clone(),
                source,
            })?;

        if raw_path != final_path {
            relocate(&raw_path, &final_path).await?;
        }

        info!(
            path = %final_path.display(),
            bytes = data.len(),
            "Stored payload in cache"
        );

        Ok(final_path)
    }

    async fn remove_matching(&self, keep: impl Fn(&str) -> bool) -> usize {
        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) => {
                debug!(path = %self.root.display(), error = %e, "Cannot list cache directory");
                return 0;
            }
        };

        let mut removed = 0;
        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    debug!(path = %self.root.display(), error = %e, "Cache listing interrupted");
                    break;
                }
            };

            let is_file = entry
                .file_type()
                .await
                .map(|t| t.is_file())
                .unwrap_or(false);
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if !is_file || !keep(name) {
                continue;
            }

            match fs::remove_file(entry.path()).await {
                Ok(()) => removed += 1,
                Err(e) => debug!(file = %name, error = %e, "Failed to remove cache file"),
            }
        }

        debug!(path = %self.root.display(), removed = removed, "Cleaned cache directory");
        removed
    }
}

fn validate_name(name: &str) -> CacheResult<()> {
    let invalid = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\');
    if invalid {
        return Err(CacheError::InvalidName(name.to_string()));
    }
    Ok(())
}

async fn remove_if_present(path: &Path) {
    match fs::remove_file(path).await {
        Ok(()) => debug!(file = %path.display(), "Removed stale cache entry"),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => debug!(file = %path.display(), error = %e, "Failed to remove stale cache entry"),
    }
}

async fn relocate(from: &Path, to: &Path) -> CacheResult<()> {
    if fs::rename(from, to).await.is_ok() {
        return Ok(());
    }

    // rename fails across devices; fall back to copy + delete
    let relocate_error = |source| CacheError::Relocate {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source,
    };
    fs::copy(from, to).await.map_err(relocate_error)?;
    fs::remove_file(from).await.map_err(relocate_error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_names_stay_inside_cache() {
        let cache = ScratchCache::new("/tmp/firewx-cache");
        assert_eq!(
            cache.path("ds.maxt_short.bin").unwrap(),
            PathBuf::from("/tmp/firewx-cache/ds.maxt_short.bin")
        );
        assert!(cache.path("").is_err());
        assert!(cache.path("..").is_err());
        assert!(cache.path("../escape.bin").is_err());
        assert!(cache.path("nested/ds.maxt.bin").is_err());
    }
}
