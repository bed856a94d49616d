use std::io::Cursor;

use super::*;
use crate::{
    assets::cache::{AssetCache, AssetCacheOpts},
    config::CanvasConfig,
    render::text::TextLayoutEngine,
    template::RenderState,
};

struct StaticFetcher(OgResult<Vec<u8>>);

impl PhotoFetcher for StaticFetcher {
    fn fetch(&self, _url: &str) -> OgResult<Vec<u8>> {
        match &self.0 {
            Ok(bytes) => Ok(bytes.clone()),
            Err(e) => Err(OgError::upstream(e.to_string())),
        }
    }
}

fn find_font_bytes() -> Option<Vec<u8>> {
    let candidates = [
        "tests/data/fonts/SourceSans3-Bold.ttf",
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/TTF/DejaVuSans.ttf",
        "/usr/share/fonts/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
        "/System/Library/Fonts/Supplemental/Arial.ttf",
    ];
    candidates.iter().find_map(|p| std::fs::read(p).ok())
}

fn template(dir: &std::path::Path, fetcher: StaticFetcher, canvas: CanvasConfig) -> NewsTemplate {
    let mut opts = AssetCacheOpts::new(dir);
    opts.sweep_interval = None;
    let assets = Arc::new(AssetCache::new(opts).unwrap());
    let base = TemplateBase::new(ContentType::News, assets, dir.join("generated"), &canvas).unwrap();
    NewsTemplate::new(
        base,
        FontConfig {
            bold: "font.ttf".to_string(),
            medium: "font.ttf".to_string(),
        },
        "Read the latest news",
        800,
        Arc::new(fetcher),
    )
}

fn red_png(w: u32, h: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(w, h, image::Rgba([220, 0, 0, 255]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

fn small() -> CanvasConfig {
    CanvasConfig {
        width: 456,
        height: 240,
        ..CanvasConfig::default()
    }
}

#[test]
fn output_path_follows_cache_key() {
    let dir = tempfile::tempdir().unwrap();
    let t = template(dir.path(), StaticFetcher(Ok(vec![])), CanvasConfig::default());
    let data = ContentData::default().with("slug", "a1");

    let path = t.output_path(&data, OutputFormat::Webp).unwrap();
    assert_eq!(path, dir.path().join("generated").join("news_a1.webp"));
}

#[test]
fn record_without_image_url_fails_validation() {
    let dir = tempfile::tempdir().unwrap();
    let mut t = template(dir.path(), StaticFetcher(Ok(vec![])), small());
    let data = ContentData::default().with("slug", "a1").with("title", "T");

    let err = t.render(&data).unwrap_err();
    assert!(matches!(err, OgError::Validation(_)));
    assert_ne!(t.state(), RenderState::Rendered);
}

#[test]
fn missing_font_file_propagates_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let mut t = template(
        dir.path(),
        StaticFetcher(Err(OgError::upstream("offline"))),
        small(),
    );
    let data = ContentData::default()
        .with("slug", "a1")
        .with("imageUrl", "http://example.invalid/x.jpg");

    let err = t.render(&data).unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn fetch_failure_degrades_to_dark_canvas() {
    let Some(font) = find_font_bytes() else {
        eprintln!("skipping: no TrueType font available");
        return;
    };
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("font.ttf"), font).unwrap();
    let mut t = template(
        dir.path(),
        StaticFetcher(Err(OgError::upstream("offline"))),
        small(),
    );
    let data = ContentData::default()
        .with("slug", "a1")
        .with("title", "word ".repeat(40))
        .with("imageUrl", "http://unreachable");

    t.render(&data).unwrap();
    assert_eq!(t.state(), RenderState::Rendered);

    // No brand: the top-left corner stays plain black.
    let canvas = t.base().canvas().unwrap();
    for y in 0..20 {
        for x in 0..40 {
            assert_eq!(canvas.pixel(x, y), [0, 0, 0, 255]);
        }
    }

    let path = t.output_path(&data, OutputFormat::Png).unwrap();
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    t.save(Some(&path), OutputFormat::Png, Default::default())
        .unwrap();
    let decoded = image::open(&path).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (456, 240));
}

#[test]
fn fetched_photo_covers_the_canvas() {
    let Some(font) = find_font_bytes() else {
        eprintln!("skipping: no TrueType font available");
        return;
    };
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("font.ttf"), font).unwrap();
    let mut t = template(dir.path(), StaticFetcher(Ok(red_png(100, 300))), small());
    let data = ContentData::default()
        .with("title", "Hi")
        .with("imageUrl", "http://photo");

    t.render(&data).unwrap();
    let canvas = t.base().canvas().unwrap();
    let top = canvas.pixel(5, 5);
    assert!(top[0] > 200 && top[1] < 20, "{top:?}");
    // Last row sits under the opaque end of the fade.
    let bottom = canvas.pixel(5, 239);
    assert!(bottom[0] < 10, "{bottom:?}");
}

#[test]
fn title_lines_fit_content_width() {
    let Some(font) = find_font_bytes() else {
        eprintln!("skipping: no TrueType font available");
        return;
    };
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("font.ttf"), font).unwrap();
    let t = template(dir.path(), StaticFetcher(Ok(vec![])), CanvasConfig::default());

    let font = t.title_font().unwrap();
    let mut engine = TextLayoutEngine::new();
    let title = "abc ".repeat(40);
    let lines = t.title_lines(&mut engine, &font, &title).unwrap();

    assert!(lines.len() > 1);
    assert!(lines.last().unwrap().ends_with("..."));
    let joined: usize = lines.iter().map(|l| l.chars().count()).sum::<usize>() + lines.len() - 1;
    assert_eq!(joined, 104);
    for line in &lines {
        let w = engine.measure(line, &font).unwrap().width;
        assert!(w <= t.content_width(), "{line} is {w}px wide");
    }
}
