use std::{collections::BTreeMap, io::Cursor, time::Duration};

use super::*;
use crate::assets::cache::AssetCacheOpts;

fn small_canvas() -> CanvasConfig {
    CanvasConfig {
        width: 64,
        height: 32,
        ..CanvasConfig::default()
    }
}

fn assets_with(templates: &[(&str, &str, (u32, u32))]) -> (tempfile::TempDir, Arc<AssetCache>) {
    let dir = tempfile::tempdir().unwrap();
    let mut map = BTreeMap::new();
    for (key, rel, (w, h)) in templates {
        let img = image::RgbaImage::from_pixel(*w, *h, image::Rgba([10, 200, 30, 255]));
        let mut buf = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        std::fs::write(dir.path().join(rel), buf).unwrap();
        map.insert((*key).to_string(), (*rel).to_string());
    }
    let mut opts = AssetCacheOpts::new(dir.path());
    opts.templates = map;
    opts.sweep_interval = None;
    opts.ttl = Duration::from_secs(120);
    let cache = AssetCache::new(opts).unwrap();
    (dir, Arc::new(cache))
}

#[test]
fn scale_is_height_over_reference_height() {
    let (_dir, assets) = assets_with(&[]);
    let base = TemplateBase::new(ContentType::News, assets, "out", &CanvasConfig::default()).unwrap();

    assert!((base.scale() - 1200.0 / 7875.0).abs() < 1e-6);
    assert_eq!(base.scale_dimension(400), 60);
    assert_eq!(base.scale_position(120, 120), (18, 18));
    assert_eq!(base.scale_font_size(580), 88);
    assert_eq!(base.scale_font_size(200), 30);
    assert_eq!(base.scale_font_size(20), MIN_FONT_SIZE_PX);
}

#[test]
fn save_before_render_is_rejected() {
    let (dir, assets) = assets_with(&[]);
    let mut base = TemplateBase::new(ContentType::News, assets, dir.path(), &small_canvas()).unwrap();
    assert_eq!(base.state(), RenderState::Uninitialized);

    let err = base
        .save(None, OutputFormat::Png, EncodeOpts::default())
        .unwrap_err();
    assert!(matches!(err, OgError::NotRendered));

    base.initialize_canvas(&CanvasSource::Solid([0, 0, 0]));
    assert_eq!(base.state(), RenderState::CanvasReady);
    let err = base
        .save(None, OutputFormat::Png, EncodeOpts::default())
        .unwrap_err();
    assert!(matches!(err, OgError::NotRendered));
}

#[test]
fn render_cannot_finish_without_canvas() {
    let (_dir, assets) = assets_with(&[]);
    let mut base = TemplateBase::new(ContentType::News, assets, "out", &small_canvas()).unwrap();
    assert!(base.mark_rendered().is_err());
    assert!(matches!(base.canvas_mut().unwrap_err(), OgError::NoImage));
}

#[test]
fn save_writes_default_path_then_moves_to_saved() {
    let (dir, assets) = assets_with(&[]);
    let out = dir.path().join("generated");
    let mut base = TemplateBase::new(ContentType::News, assets, &out, &small_canvas()).unwrap();
    base.initialize_canvas(&CanvasSource::Solid([1, 2, 3]));
    base.mark_rendered().unwrap();

    let path = base
        .save(None, OutputFormat::Png, EncodeOpts::default())
        .unwrap();
    assert_eq!(path, out.join("news.png"));
    assert_eq!(base.state(), RenderState::Saved);

    let decoded = image::open(&path).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (64, 32));

    let again = base
        .save(None, OutputFormat::Png, EncodeOpts::default())
        .unwrap_err();
    assert!(matches!(again, OgError::NotRendered));
}

#[test]
fn save_to_missing_directory_is_persistence_failure() {
    let (dir, assets) = assets_with(&[]);
    let mut base = TemplateBase::new(ContentType::News, assets, dir.path(), &small_canvas()).unwrap();
    base.initialize_canvas(&CanvasSource::Solid([0, 0, 0]));
    base.mark_rendered().unwrap();

    let target = dir.path().join("no/such/dir/x.png");
    let err = base
        .save(Some(&target), OutputFormat::Png, EncodeOpts::default())
        .unwrap_err();
    assert!(matches!(err, OgError::Persistence(_)));
}

#[test]
fn asset_canvas_is_resized_to_template_size() {
    let (_dir, assets) = assets_with(&[("card", "card.png", (16, 8))]);
    let mut base = TemplateBase::new(ContentType::News, assets, "out", &small_canvas()).unwrap();
    base.initialize_canvas(&CanvasSource::Asset {
        id: "card".to_string(),
        variant: None,
    });

    let canvas = base.canvas().unwrap();
    assert_eq!((canvas.width(), canvas.height()), (64, 32));
    let px = canvas.pixel(32, 16);
    assert_eq!(px[3], 255);
    assert!(px[1] > 150 && px[0] < 50, "{px:?}");
}

#[test]
fn missing_template_asset_falls_back_to_blank_canvas() {
    let (_dir, assets) = assets_with(&[]);
    let mut base = TemplateBase::new(ContentType::News, assets, "out", &small_canvas()).unwrap();
    base.initialize_canvas(&CanvasSource::Asset {
        id: "idea".to_string(),
        variant: Some(4),
    });

    assert_eq!(base.state(), RenderState::CanvasReady);
    assert_eq!(base.canvas().unwrap().pixel(0, 0), [255, 255, 255, 255]);
}
