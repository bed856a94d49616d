use super::*;

fn sample_canvas() -> Canvas {
    let mut c = Canvas::solid(64, 32, [20, 40, 60]);
    let g = crate::render::canvas::vertical_gradient(64, 16, [0, 0, 0, 0], [0, 0, 0, 255]);
    c.paste_over(&g, 0, 16);
    c
}

#[test]
fn format_metadata_is_consistent() {
    assert_eq!(OutputFormat::Webp.extension(), "webp");
    assert_eq!(OutputFormat::Webp.content_type(), "image/webp");
    assert_eq!(OutputFormat::Jpeg.extension(), "jpeg");
    assert!(!OutputFormat::Jpeg.supports_alpha());
    assert!(OutputFormat::Png.supports_alpha());
    assert_eq!("JPG".parse::<OutputFormat>().unwrap(), OutputFormat::Jpeg);
    assert!("gif".parse::<OutputFormat>().is_err());
}

#[test]
fn webp_output_decodes_at_canvas_size() {
    let bytes = encode_canvas(&sample_canvas(), OutputFormat::Webp, EncodeOpts::default()).unwrap();
    assert!(!bytes.is_empty());
    assert_eq!(&bytes[0..4], b"RIFF");
    assert_eq!(&bytes[8..12], b"WEBP");

    let decoded = image::load_from_memory(&bytes).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (64, 32));
}

#[test]
fn png_output_is_lossless() {
    let canvas = sample_canvas();
    let bytes = encode_canvas(&canvas, OutputFormat::Png, EncodeOpts::default()).unwrap();
    let decoded = image::load_from_memory(&bytes).unwrap().to_rgba8();
    assert_eq!(decoded, canvas.to_rgba_image().unwrap());
}

#[test]
fn jpeg_flattens_transparency_onto_white() {
    let canvas = Canvas::transparent(16, 16);
    let bytes = encode_canvas(
        &canvas,
        OutputFormat::Jpeg,
        EncodeOpts {
            quality: 90,
            effort: 0,
        },
    )
    .unwrap();
    let decoded = image::load_from_memory(&bytes).unwrap().to_rgb8();
    let px = decoded.get_pixel(8, 8).0;
    assert!(px.iter().all(|&c| c > 245));
}
