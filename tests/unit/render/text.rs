use super::*;

fn fixed_advance(px_per_char: f32) -> impl FnMut(&str) -> OgResult<f32> {
    move |s: &str| Ok(s.chars().count() as f32 * px_per_char)
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

#[test]
fn long_title_is_cut_to_101_chars_plus_ellipsis() {
    let title = "x".repeat(150);
    let out = truncate_title(&title, 101);
    assert_eq!(out.chars().count(), 104);
    assert!(out.ends_with("..."));
    assert_eq!(&out[..101], &title[..101]);

    let short = "a".repeat(101);
    assert_eq!(truncate_title(&short, 101), short);
}

#[test]
fn truncation_counts_characters_not_bytes() {
    let title = "é".repeat(120);
    let out = truncate_title(&title, 101);
    assert_eq!(out.chars().count(), 104);
}

#[test]
fn wrap_keeps_every_line_within_width() {
    let text = "word ".repeat(40);
    let lines = wrap_words(&text, 100.0, fixed_advance(10.0)).unwrap();

    assert!(lines.len() > 1);
    for line in &lines {
        assert!(line.chars().count() as f32 * 10.0 <= 100.0, "line too wide: {line}");
    }
    assert_eq!(lines.join(" ").split(' ').count(), 40);
    assert_eq!(lines[0], "word word");
}

#[test]
fn wrap_never_splits_an_oversized_word() {
    let lines = wrap_words(
        "a supercalifragilistic b",
        60.0,
        fixed_advance(10.0),
    )
    .unwrap();
    assert_eq!(lines, vec!["a", "supercalifragilistic", "b"]);

    let lines = wrap_words("supercalifragilistic", 60.0, fixed_advance(10.0)).unwrap();
    assert_eq!(lines, vec!["supercalifragilistic"]);
}

#[test]
fn wrap_of_blank_text_is_empty() {
    assert!(wrap_words("   ", 100.0, fixed_advance(10.0)).unwrap().is_empty());
}

#[test]
fn wrap_propagates_measure_errors() {
    let err = wrap_words("a b", 100.0, |_| Err(OgError::load("no font"))).unwrap_err();
    assert!(matches!(err, OgError::Load(_)));
}

#[test]
fn measured_wrap_respects_content_width_with_a_real_font() {
    let Some(bytes) = find_font_bytes() else {
        eprintln!("skipping: no TrueType font available");
        return;
    };
    let font = FontHandle::from_bytes("test.ttf", bytes, 88.0).unwrap();
    let mut engine = TextLayoutEngine::new();

    let title = truncate_title(&"headline ".repeat(20), 101);
    let max_width = 2220.0;
    let lines = wrap_words(&title, max_width, |s| Ok(engine.measure(s, &font)?.width)).unwrap();

    assert!(lines.len() >= 2);
    for line in &lines {
        let extent = engine.measure(line, &font).unwrap();
        assert!(extent.width <= max_width, "{line} is {} wide", extent.width);
        assert!(extent.height > 0.0);
    }
}

#[test]
fn text_layer_draws_glyph_pixels() {
    let Some(bytes) = find_font_bytes() else {
        eprintln!("skipping: no TrueType font available");
        return;
    };
    let font = FontHandle::from_bytes("test.ttf", bytes, 32.0).unwrap();
    let mut engine = TextLayoutEngine::new();
    let layout = engine
        .layout_line("Hello", &font, TextBrushRgba8::WHITE)
        .unwrap();

    let mut canvas = Canvas::solid(200, 60, [0, 0, 0]);
    let mut layer = TextLayer::new(200, 60).unwrap();
    layer.draw(&layout, &font, 10.0, 10.0);
    layer.composite_onto(&mut canvas).unwrap();

    let lit = canvas
        .pixels()
        .chunks_exact(4)
        .filter(|px| px[0] > 128)
        .count();
    assert!(lit > 0);
}
