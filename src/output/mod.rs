//! Output caches: "is there already a fresh artifact for this key?" and "publish this artifact".
//!
//! The disk backend expects the renderer to have written `{generated_dir}/{key}.{ext}` already,
//! so template output paths and cache keys must agree on naming.

pub mod disabled;
pub mod disk;
pub mod object_storage;
pub mod sigv4;

use std::{path::PathBuf, sync::Arc};

use crate::{
    config::{CacheStrategy, ServiceConfig},
    content::CacheKey,
    foundation::error::OgResult,
};

pub use disabled::DisabledCache;
pub use disk::DiskCache;
pub use object_storage::{HttpObjectStore, InMemoryObjectStore, ObjectStorageCache, ObjectStore};
pub use sigv4::{AwsCredentials, SigV4Signer};

/// Cache-Control sent with every published object.
pub const PUBLISHED_CACHE_CONTROL: &str = "max-age=31536000";

/// Where an artifact can be fetched from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArtifactLocation {
    /// File on the local filesystem.
    Local(PathBuf),
    /// Public URL of a published object.
    Remote(String),
}

impl ArtifactLocation {
    /// Local path, if this is a local artifact.
    pub fn local_path(&self) -> Option<&std::path::Path> {
        match self {
            Self::Local(p) => Some(p),
            Self::Remote(_) => None,
        }
    }
}

impl std::fmt::Display for ArtifactLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Local(p) => write!(f, "{}", p.display()),
            Self::Remote(url) => f.write_str(url),
        }
    }
}

/// Pluggable output-cache backend.
pub trait OutputCache: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// Location of a usable artifact for `key`, or `None` on a miss.
    fn lookup(&self, key: &CacheKey) -> OgResult<Option<ArtifactLocation>>;

    /// Make the artifact written at `path` available under `key`.
    ///
    /// Returns the location callers should use, or `None` when the backend keeps nothing.
    fn publish(&self, path: &std::path::Path, key: &CacheKey) -> OgResult<Option<ArtifactLocation>>;

    /// Remove every cached artifact this backend manages. Returns how many were removed.
    fn clear(&self) -> OgResult<usize>;
}

/// Build the backend selected by `cfg.cache_strategy`.
pub fn from_config(cfg: &ServiceConfig) -> OgResult<Arc<dyn OutputCache>> {
    let cache: Arc<dyn OutputCache> = match cfg.cache_strategy {
        CacheStrategy::Disabled => Arc::new(DisabledCache),
        CacheStrategy::Disk => Arc::new(DiskCache::new(
            cfg.generated_dir.clone(),
            cfg.output_format,
            cfg.cache_ttl(),
        )?),
        CacheStrategy::ObjectStorage => {
            let store = HttpObjectStore::from_config(&cfg.object_storage, cfg.fetch_timeout())?;
            Arc::new(ObjectStorageCache::new(
                Arc::new(store),
                cfg.object_storage.resolved_public_base_url(),
                cfg.output_format,
            ))
        }
    };
    tracing::debug!(backend = cache.name(), "output cache ready");
    Ok(cache)
}
