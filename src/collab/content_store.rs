use std::{
    collections::HashMap,
    path::PathBuf,
    sync::atomic::{AtomicBool, Ordering},
};

use parking_lot::RwLock;

use crate::{
    content::{CacheKey, ContentData, ContentType},
    foundation::error::{OgError, OgResult},
};

/// Keyed record lookup with an explicit connection lifecycle.
pub trait ContentStore: Send + Sync {
    /// Open the store. Called once at startup.
    fn connect(&self) -> OgResult<()>;

    /// Record of `content_type` whose identity field equals `id`, or `None`.
    fn fetch_by_identity(&self, content_type: ContentType, id: &str) -> OgResult<Option<ContentData>>;

    /// Release the store. Idempotent.
    fn close(&self) -> OgResult<()>;

    /// News record by slug.
    fn fetch_by_slug(&self, slug: &str) -> OgResult<Option<ContentData>> {
        self.fetch_by_identity(ContentType::News, slug)
    }
}

fn ensure_connected(flag: &AtomicBool) -> OgResult<()> {
    if !flag.load(Ordering::Acquire) {
        return Err(OgError::configuration("content store is not connected"));
    }
    Ok(())
}

/// Reject identities that could not name a file, reusing the cache-key rules.
fn check_identity(content_type: ContentType, id: &str) -> OgResult<()> {
    let record = ContentData::default().with(content_type.identity_field(), id);
    CacheKey::derive(content_type, &record).map(|_| ())
}

/// Records stored as `{root}/{type}/{id}.json`.
#[derive(Debug)]
pub struct JsonDirContentStore {
    root: PathBuf,
    connected: AtomicBool,
}

impl JsonDirContentStore {
    /// Store rooted at `root`. Nothing is touched until [`ContentStore::connect`].
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            connected: AtomicBool::new(false),
        }
    }

    fn record_path(&self, content_type: ContentType, id: &str) -> PathBuf {
        self.root
            .join(content_type.tag())
            .join(format!("{id}.json"))
    }
}

impl ContentStore for JsonDirContentStore {
    fn connect(&self) -> OgResult<()> {
        if !self.root.is_dir() {
            return Err(OgError::configuration(format!(
                "content directory not found: {}",
                self.root.display()
            )));
        }
        self.connected.store(true, Ordering::Release);
        tracing::debug!(root = %self.root.display(), "content store connected");
        Ok(())
    }

    fn fetch_by_identity(&self, content_type: ContentType, id: &str) -> OgResult<Option<ContentData>> {
        ensure_connected(&self.connected)?;
        if id.is_empty() {
            return Ok(None);
        }
        check_identity(content_type, id)?;

        let path = self.record_path(content_type, id);
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(OgError::upstream(format!("read '{}': {e}", path.display())));
            }
        };
        ContentData::from_json_str(&raw).map(Some)
    }

    fn close(&self) -> OgResult<()> {
        self.connected.store(false, Ordering::Release);
        Ok(())
    }
}

/// Process-local store for tests and demos.
#[derive(Debug, Default)]
pub struct InMemoryContentStore {
    records: RwLock<HashMap<(ContentType, String), ContentData>>,
    connected: AtomicBool,
}

impl InMemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a record.
    pub fn insert(&self, content_type: ContentType, id: impl Into<String>, data: ContentData) {
        self.records.write().insert((content_type, id.into()), data);
    }
}

impl ContentStore for InMemoryContentStore {
    fn connect(&self) -> OgResult<()> {
        self.connected.store(true, Ordering::Release);
        Ok(())
    }

    fn fetch_by_identity(&self, content_type: ContentType, id: &str) -> OgResult<Option<ContentData>> {
        ensure_connected(&self.connected)?;
        Ok(self
            .records
            .read()
            .get(&(content_type, id.to_string()))
            .cloned())
    }

    fn close(&self) -> OgResult<()> {
        self.connected.store(false, Ordering::Release);
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/collab/content_store.rs"]
mod tests;
