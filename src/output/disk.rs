use std::{
    path::{Path, PathBuf},
    time::{Duration, SystemTime},
};

use crate::{
    content::CacheKey,
    foundation::error::{OgError, OgResult},
    output::{ArtifactLocation, OutputCache},
    render::encode::OutputFormat,
};

/// Artifacts on local disk, fresh while their modification time is younger than the TTL.
///
/// Publishing is a pass-through: the renderer has already written the file at
/// `{root}/{key}.{ext}`. Hits are not re-timestamped.
#[derive(Clone, Debug)]
pub struct DiskCache {
    root: PathBuf,
    format: OutputFormat,
    ttl: Duration,
}

impl DiskCache {
    /// Cache rooted at `root`, which is created if missing.
    pub fn new(root: impl Into<PathBuf>, format: OutputFormat, ttl: Duration) -> OgResult<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|e| {
            OgError::configuration(format!("create cache directory '{}': {e}", root.display()))
        })?;
        Ok(Self { root, format, ttl })
    }

    /// Path an artifact for `key` lives at.
    pub fn artifact_path(&self, key: &CacheKey) -> PathBuf {
        self.root.join(key.file_name(self.format))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn is_fresh(&self, path: &Path) -> bool {
        let Ok(modified) = std::fs::metadata(path).and_then(|m| m.modified()) else {
            return false;
        };
        // A timestamp in the future counts as age zero.
        let age = SystemTime::now()
            .duration_since(modified)
            .unwrap_or(Duration::ZERO);
        age < self.ttl
    }
}

impl OutputCache for DiskCache {
    fn name(&self) -> &'static str {
        "disk"
    }

    fn lookup(&self, key: &CacheKey) -> OgResult<Option<ArtifactLocation>> {
        let path = self.artifact_path(key);
        if path.is_file() && self.is_fresh(&path) {
            tracing::debug!(cache_key = %key, path = %path.display(), "disk cache hit");
            return Ok(Some(ArtifactLocation::Local(path)));
        }
        Ok(None)
    }

    fn publish(&self, path: &Path, key: &CacheKey) -> OgResult<Option<ArtifactLocation>> {
        let expected = self.artifact_path(key);
        if path != expected {
            tracing::warn!(
                cache_key = %key,
                path = %path.display(),
                expected = %expected.display(),
                "artifact written outside the disk cache location; it will never be a hit"
            );
        }
        Ok(Some(ArtifactLocation::Local(path.to_path_buf())))
    }

    fn clear(&self) -> OgResult<usize> {
        let entries = std::fs::read_dir(&self.root).map_err(|e| {
            OgError::persistence(format!("list '{}': {e}", self.root.display()))
        })?;
        let ext = self.format.extension();
        let mut removed = 0;
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some(ext) {
                continue;
            }
            match std::fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "failed to delete cached artifact");
                }
            }
        }
        tracing::info!(removed, root = %self.root.display(), "cleared disk cache");
        Ok(removed)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/output/disk.rs"]
mod tests;
