//! In-memory cache for decoded template images and loaded fonts.
//!
//! Two independent namespaces, each behind its own lock. Admitting a new key into a full
//! namespace first evicts exactly one entry, the least recently accessed. Separately, a sweep
//! task removes every entry whose age exceeds the TTL on a fixed interval.

use std::{
    collections::{BTreeMap, HashMap},
    path::{Path, PathBuf},
    sync::{
        Arc, Weak,
        atomic::{AtomicU64, Ordering},
    },
    thread::JoinHandle,
    time::{Duration, Instant},
};

use anyhow::Context;
use image::RgbaImage;
use parking_lot::Mutex;

use crate::{
    assets::{
        decode::decode_image_file,
        font::FontHandle,
        registry::{TemplateRegistry, normalize_rel_path, template_key},
    },
    foundation::{
        clock::{Clock, SystemClock},
        error::{OgError, OgResult},
    },
};

/// Construction options for [`AssetCache`].
#[derive(Clone, Debug)]
pub struct AssetCacheOpts {
    /// Asset root. Must exist.
    pub root: PathBuf,
    /// Template image paths by asset key, relative to `root`.
    pub templates: BTreeMap<String, String>,
    /// Maximum entries per namespace.
    pub capacity: usize,
    /// Entries idle for longer than this are removed by the sweep.
    pub ttl: Duration,
    /// Sweep period; `None` disables the background task.
    pub sweep_interval: Option<Duration>,
}

impl AssetCacheOpts {
    /// Options with the service defaults: capacity 5, TTL 120s, sweep every 30s.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            templates: BTreeMap::new(),
            capacity: 5,
            ttl: Duration::from_secs(120),
            sweep_interval: Some(Duration::from_secs(30)),
        }
    }
}

#[derive(Debug)]
struct CacheEntry<T> {
    value: T,
    last_accessed_at: Instant,
}

/// Entry count and lifetime counters of one namespace.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NamespaceStats {
    pub entries: usize,
    /// Loads from disk, i.e. misses.
    pub loads: u64,
    pub evictions: u64,
    /// Entries removed by the TTL sweep, not by capacity.
    pub expired: u64,
}

/// Snapshot of both namespaces.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AssetCacheStats {
    pub templates: NamespaceStats,
    pub fonts: NamespaceStats,
}

struct Namespace<T> {
    name: &'static str,
    entries: Mutex<HashMap<String, CacheEntry<T>>>,
    loads: AtomicU64,
    evictions: AtomicU64,
    expired: AtomicU64,
}

impl<T: Clone> Namespace<T> {
    fn new(name: &'static str) -> Self {
        Self {
            name,
            entries: Mutex::new(HashMap::new()),
            loads: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
            expired: AtomicU64::new(0),
        }
    }

    /// Return the cached value for `key`, refreshing its access time, or load and insert it.
    ///
    /// The namespace lock is held across the load, so sweeps and other lookups on this
    /// namespace wait for it.
    fn get_or_load(
        &self,
        key: &str,
        capacity: usize,
        now: Instant,
        load: impl FnOnce() -> OgResult<T>,
    ) -> OgResult<T> {
        let mut entries = self.entries.lock();

        if entries.len() >= capacity && !entries.contains_key(key) {
            if let Some(victim) = evict_oldest(&mut entries) {
                self.evictions.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(namespace = self.name, victim = %victim, "evicted least recently used asset");
            }
        }

        if let Some(entry) = entries.get_mut(key) {
            entry.last_accessed_at = now;
            tracing::debug!(namespace = self.name, asset = key, "asset cache hit");
            return Ok(entry.value.clone());
        }

        let value = load()?;
        self.loads.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(namespace = self.name, asset = key, "asset cache miss, loaded");
        entries.insert(
            key.to_string(),
            CacheEntry {
                value: value.clone(),
                last_accessed_at: now,
            },
        );
        Ok(value)
    }

    fn sweep(&self, now: Instant, ttl: Duration) -> usize {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, e| now.saturating_duration_since(e.last_accessed_at) <= ttl);
        let removed = before - entries.len();
        self.expired.fetch_add(removed as u64, Ordering::Relaxed);
        removed
    }

    fn contains(&self, key: &str) -> bool {
        self.entries.lock().contains_key(key)
    }

    fn clear(&self) {
        self.entries.lock().clear();
    }

    fn stats(&self) -> NamespaceStats {
        NamespaceStats {
            entries: self.entries.lock().len(),
            loads: self.loads.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            expired: self.expired.load(Ordering::Relaxed),
        }
    }
}

/// Remove the entry with the smallest access time. Ties go to the smallest key so the
/// choice does not depend on hash order.
fn evict_oldest<T>(entries: &mut HashMap<String, CacheEntry<T>>) -> Option<String> {
    let victim = entries
        .iter()
        .min_by(|(ka, a), (kb, b)| {
            a.last_accessed_at
                .cmp(&b.last_accessed_at)
                .then_with(|| ka.cmp(kb))
        })
        .map(|(k, _)| k.clone())?;
    entries.remove(&victim);
    Some(victim)
}

struct Inner {
    root: PathBuf,
    registry: TemplateRegistry,
    capacity: usize,
    ttl: Duration,
    clock: Arc<dyn Clock>,
    templates: Namespace<Arc<RgbaImage>>,
    fonts: Namespace<Arc<FontHandle>>,
}

impl Inner {
    fn sweep_expired(&self) -> usize {
        let now = self.clock.now();
        let removed =
            self.templates.sweep(now, self.ttl) + self.fonts.sweep(now, self.ttl);
        if removed > 0 {
            tracing::debug!(removed, "swept expired assets");
        }
        removed
    }
}

struct SweepTask {
    stop: crossbeam_channel::Sender<()>,
    handle: Option<JoinHandle<()>>,
}

impl SweepTask {
    fn spawn(inner: Weak<Inner>, interval: Duration) -> OgResult<Self> {
        let (stop, stop_rx) = crossbeam_channel::bounded::<()>(1);
        let handle = std::thread::Builder::new()
            .name("ogcard-asset-sweep".to_string())
            .spawn(move || {
                loop {
                    match stop_rx.recv_timeout(interval) {
                        Err(crossbeam_channel::RecvTimeoutError::Timeout) => {
                            let Some(inner) = inner.upgrade() else {
                                break;
                            };
                            inner.sweep_expired();
                        }
                        Ok(()) | Err(crossbeam_channel::RecvTimeoutError::Disconnected) => break,
                    }
                }
            })
            .context("spawn asset sweep thread")?;
        Ok(Self {
            stop,
            handle: Some(handle),
        })
    }

    fn stop(&mut self) {
        let _ = self.stop.try_send(());
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for SweepTask {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Bounded, TTL-swept cache of template images and fonts.
pub struct AssetCache {
    inner: Arc<Inner>,
    sweeper: Mutex<Option<SweepTask>>,
}

impl std::fmt::Debug for AssetCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetCache")
            .field("root", &self.inner.root)
            .field("capacity", &self.inner.capacity)
            .field("ttl", &self.inner.ttl)
            .finish()
    }
}

impl AssetCache {
    /// Build a cache on the system clock and start its sweep task if configured.
    pub fn new(opts: AssetCacheOpts) -> OgResult<Self> {
        Self::with_clock(opts, Arc::new(SystemClock))
    }

    /// Build a cache on a caller-provided clock.
    ///
    /// Fails with [`OgError::Configuration`] when the asset root does not exist.
    pub fn with_clock(opts: AssetCacheOpts, clock: Arc<dyn Clock>) -> OgResult<Self> {
        if !opts.root.is_dir() {
            return Err(OgError::configuration(format!(
                "assets directory not found: {}",
                opts.root.display()
            )));
        }
        let root = opts.root.canonicalize().with_context(|| {
            format!("canonicalize assets directory '{}'", opts.root.display())
        })?;
        if opts.capacity == 0 {
            return Err(OgError::configuration("asset cache capacity must be > 0"));
        }
        let registry = TemplateRegistry::from_map(&opts.templates)
            .map_err(|e| OgError::configuration(format!("template registry: {e}")))?;

        let inner = Arc::new(Inner {
            root,
            registry,
            capacity: opts.capacity,
            ttl: opts.ttl,
            clock,
            templates: Namespace::new("templates"),
            fonts: Namespace::new("fonts"),
        });

        let sweeper = match opts.sweep_interval {
            Some(interval) if !interval.is_zero() => {
                Some(SweepTask::spawn(Arc::downgrade(&inner), interval)?)
            }
            _ => None,
        };

        Ok(Self {
            inner,
            sweeper: Mutex::new(sweeper),
        })
    }

    /// Independent copy of a decoded template image.
    ///
    /// Fails with [`OgError::NotFound`] when no path is registered (or the file is missing) and
    /// with [`OgError::Load`] when the file cannot be decoded.
    pub fn get_template(&self, asset_id: &str, variant: Option<u32>) -> OgResult<RgbaImage> {
        let key = template_key(asset_id, variant);
        // Unknown ids must fail before the namespace can evict.
        let path = self.inner.root.join(self.inner.registry.resolve(asset_id, variant)?);
        let cached = self.inner.templates.get_or_load(
            &key,
            self.inner.capacity,
            self.inner.clock.now(),
            || Ok(Arc::new(decode_image_file(&path)?)),
        )?;
        Ok(cached.as_ref().clone())
    }

    /// Shared font handle for `font_path` (relative to the asset root) at `size_px`.
    pub fn get_font(&self, font_path: &str, size_px: u32) -> OgResult<Arc<FontHandle>> {
        let rel = normalize_rel_path(font_path)?;
        let key = format!("{rel}_{size_px}");
        let path = self.inner.root.join(&rel);
        if !self.inner.fonts.contains(&key) && !path.is_file() {
            return Err(OgError::not_found(format!(
                "font file not found: {}",
                path.display()
            )));
        }
        self.inner
            .fonts
            .get_or_load(&key, self.inner.capacity, self.inner.clock.now(), || {
                let bytes = std::fs::read(&path)
                    .map_err(|e| OgError::load(format!("read font '{}': {e}", path.display())))?;
                let font = FontHandle::from_bytes(rel.clone(), bytes, size_px as f32)
                    .map_err(|e| {
                        OgError::load(format!("failed to load font {rel} at size {size_px}: {e}"))
                    })?;
                Ok(Arc::new(font))
            })
    }

    /// Full path of `name` under the asset root. No caching, no existence check.
    pub fn get_asset_path(&self, name: &str) -> PathBuf {
        self.inner.root.join(name)
    }

    /// Canonical asset root.
    pub fn root(&self) -> &Path {
        &self.inner.root
    }

    /// Remove every entry idle for longer than the TTL from both namespaces.
    pub fn sweep_expired(&self) -> usize {
        self.inner.sweep_expired()
    }

    /// `true` when a template image for the key is cached.
    pub fn has_template(&self, asset_id: &str, variant: Option<u32>) -> bool {
        self.inner.templates.contains(&template_key(asset_id, variant))
    }

    /// `true` when the font at this path and size is cached.
    pub fn has_font(&self, font_path: &str, size_px: u32) -> bool {
        normalize_rel_path(font_path)
            .map(|rel| self.inner.fonts.contains(&format!("{rel}_{size_px}")))
            .unwrap_or(false)
    }

    /// Empty both namespaces.
    pub fn clear(&self) {
        self.inner.templates.clear();
        self.inner.fonts.clear();
    }

    /// Snapshot of namespace counters.
    pub fn stats(&self) -> AssetCacheStats {
        AssetCacheStats {
            templates: self.inner.templates.stats(),
            fonts: self.inner.fonts.stats(),
        }
    }

    /// Stop the sweep task and wait for it to exit. Idempotent.
    pub fn shutdown(&self) {
        if let Some(mut task) = self.sweeper.lock().take() {
            task.stop();
            tracing::debug!("asset sweep task stopped");
        }
    }

    /// `true` while the background sweep task is running.
    pub fn is_sweeping(&self) -> bool {
        self.sweeper.lock().is_some()
    }
}

impl Drop for AssetCache {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/cache.rs"]
mod tests;
