use std::{
    path::Path,
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};

use parking_lot::Mutex;

use super::*;
use crate::{
    assets::cache::{AssetCache, AssetCacheOpts},
    config::CanvasConfig,
    output::{DisabledCache, DiskCache, InMemoryObjectStore, ObjectStorageCache},
    template::{CanvasSource, Template, TemplateBase},
};

struct SolidTemplate {
    base: TemplateBase,
    fail: bool,
}

impl Template for SolidTemplate {
    fn base(&self) -> &TemplateBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut TemplateBase {
        &mut self.base
    }

    fn render(&mut self, _data: &ContentData) -> OgResult<()> {
        if self.fail {
            return Err(OgError::validation("boom"));
        }
        self.base.initialize_canvas(&CanvasSource::Solid([9, 9, 9]));
        self.base.mark_rendered()
    }

    fn output_path(&self, data: &ContentData, format: OutputFormat) -> OgResult<PathBuf> {
        let key = CacheKey::derive(self.content_type(), data)?;
        Ok(self.base.generated_dir().join(key.file_name(format)))
    }
}

struct Provider {
    assets: Arc<AssetCache>,
    out: PathBuf,
    fail: bool,
    created: AtomicUsize,
}

impl TemplateProvider for Provider {
    fn create(&self, content_type: ContentType) -> OgResult<Box<dyn Template>> {
        self.created.fetch_add(1, Ordering::SeqCst);
        let canvas = CanvasConfig {
            width: 32,
            height: 16,
            ..CanvasConfig::default()
        };
        let base = TemplateBase::new(content_type, Arc::clone(&self.assets), self.out.clone(), &canvas)?;
        Ok(Box::new(SolidTemplate {
            base,
            fail: self.fail,
        }))
    }
}

#[derive(Default)]
struct RecordingNotifier {
    alerts: Mutex<Vec<Alert>>,
    fail: bool,
}

impl Notifier for RecordingNotifier {
    fn send(&self, alert: &Alert) -> OgResult<()> {
        self.alerts.lock().push(alert.clone());
        if self.fail {
            return Err(OgError::upstream("webhook down"));
        }
        Ok(())
    }
}

struct Fixture {
    _dir: tempfile::TempDir,
    out: PathBuf,
    provider: Arc<Provider>,
    notifier: Arc<RecordingNotifier>,
}

fn fixture(fail: bool) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let mut opts = AssetCacheOpts::new(dir.path());
    opts.sweep_interval = None;
    let assets = Arc::new(AssetCache::new(opts).unwrap());
    let out = dir.path().join("generated");
    let provider = Arc::new(Provider {
        assets,
        out: out.clone(),
        fail,
        created: AtomicUsize::new(0),
    });
    Fixture {
        _dir: dir,
        out,
        provider,
        notifier: Arc::new(RecordingNotifier::default()),
    }
}

fn orchestrator(f: &Fixture, output: Arc<dyn OutputCache>) -> RenderOrchestrator {
    RenderOrchestrator::new(
        f.provider.clone(),
        output,
        f.notifier.clone(),
        OutputFormat::Png,
        EncodeOpts::default(),
    )
}

fn news(slug: &str) -> ContentData {
    ContentData::default()
        .with("slug", slug)
        .with("title", "Hello")
        .with("imageUrl", "http://unreachable")
}

fn disk(out: &Path) -> Arc<dyn OutputCache> {
    Arc::new(DiskCache::new(out, OutputFormat::Png, Duration::from_secs(120)).unwrap())
}

#[test]
fn second_request_within_ttl_is_served_from_disk() {
    let f = fixture(false);
    let o = orchestrator(&f, disk(&f.out));

    let first = o.generate(ContentType::News, &news("a1"), false).unwrap();
    let second = o.generate(ContentType::News, &news("a1"), false).unwrap();

    let expected = f.out.join("news_a1.png");
    assert_eq!(first, ArtifactLocation::Local(expected.clone()));
    assert_eq!(second, first);
    assert_eq!(f.provider.created.load(Ordering::SeqCst), 1);

    let stats = o.stats();
    assert_eq!(stats.renders, 1);
    assert_eq!(stats.cache_hits, 1);
    assert_eq!(stats.generated_total, 1);
    assert_eq!(stats.generated_news, 1);

    let img = image::open(&expected).unwrap();
    assert_eq!((img.width(), img.height()), (32, 16));
}

#[test]
fn force_bypasses_lookup() {
    let f = fixture(false);
    let o = orchestrator(&f, disk(&f.out));

    o.generate(ContentType::News, &news("a1"), false).unwrap();
    o.generate(ContentType::News, &news("a1"), true).unwrap();
    assert_eq!(o.stats().renders, 2);
    assert_eq!(o.stats().cache_hits, 0);
}

#[test]
fn distinct_slugs_render_separately() {
    let f = fixture(false);
    let o = orchestrator(&f, disk(&f.out));

    o.generate(ContentType::News, &news("a1"), false).unwrap();
    o.generate(ContentType::News, &news("a2"), false).unwrap();
    assert_eq!(o.stats().renders, 2);
    assert!(f.out.join("news_a2.png").is_file());
}

#[test]
fn disabled_cache_renders_every_time() {
    let f = fixture(false);
    let o = orchestrator(&f, Arc::new(DisabledCache));

    let loc = o.generate(ContentType::News, &news("a1"), false).unwrap();
    o.generate(ContentType::News, &news("a1"), false).unwrap();
    assert_eq!(loc, ArtifactLocation::Local(f.out.join("news_a1.png")));
    assert_eq!(o.stats().renders, 2);
}

#[test]
fn object_storage_returns_public_url_and_hits_afterwards() {
    let f = fixture(false);
    let store = Arc::new(InMemoryObjectStore::new());
    let cache = Arc::new(ObjectStorageCache::new(
        store.clone(),
        "https://cdn.example.com/",
        OutputFormat::Png,
    ));
    let o = orchestrator(&f, cache);

    let url = ArtifactLocation::Remote("https://cdn.example.com/news_a1.png".to_string());
    assert_eq!(o.generate(ContentType::News, &news("a1"), false).unwrap(), url);
    assert_eq!(o.generate(ContentType::News, &news("a1"), false).unwrap(), url);
    assert_eq!(o.stats().renders, 1);
    assert_eq!(store.get("news_a1.png").unwrap().content_type, "image/png");
}

#[test]
fn render_failure_is_reraised_and_alerted() {
    let f = fixture(true);
    let o = orchestrator(&f, disk(&f.out));

    let err = o.generate(ContentType::News, &news("a1"), false).unwrap_err();
    assert!(matches!(err, OgError::Validation(ref m) if m == "boom"));
    assert_eq!(o.stats().failures, 1);
    assert_eq!(o.stats().generated_total, 0);
    assert!(!f.out.join("news_a1.png").exists());

    let alerts = f.notifier.alerts.lock();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].severity, Severity::Warning);
    assert!(alerts[0].details.as_deref().unwrap().contains("boom"));
}

#[test]
fn notifier_failure_does_not_mask_the_error() {
    let mut f = fixture(true);
    f.notifier = Arc::new(RecordingNotifier {
        alerts: Mutex::new(Vec::new()),
        fail: true,
    });
    let o = orchestrator(&f, disk(&f.out));

    let err = o.generate(ContentType::News, &news("a1"), false).unwrap_err();
    assert!(matches!(err, OgError::Validation(_)));
    assert_eq!(f.notifier.alerts.lock().len(), 1);
}

#[test]
fn unknown_tag_is_unsupported() {
    let f = fixture(false);
    let o = orchestrator(&f, disk(&f.out));
    let err = o.generate_for_tag("invoice", &news("a1"), false).unwrap_err();
    assert!(matches!(err, OgError::UnsupportedType(_)));
    assert_eq!(f.provider.created.load(Ordering::SeqCst), 0);
}
