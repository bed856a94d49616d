use std::io::Cursor;

use super::*;

fn png_bytes(w: u32, h: u32, rgba: [u8; 4]) -> Vec<u8> {
    let img = RgbaImage::from_pixel(w, h, image::Rgba(rgba));
    let mut buf = Vec::new();
    DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

#[test]
fn decode_png_keeps_size_and_pixels() {
    let img = decode_image(&png_bytes(3, 2, [10, 20, 30, 255])).unwrap();
    assert_eq!((img.width(), img.height()), (3, 2));
    assert_eq!(img.to_rgba8().get_pixel(2, 1).0, [10, 20, 30, 255]);
}

#[test]
fn decode_garbage_fails() {
    assert!(decode_image(b"definitely not an image").is_err());
}

#[test]
fn decode_file_distinguishes_missing_from_corrupt() {
    let dir = tempfile::tempdir().unwrap();

    let missing = decode_image_file(&dir.path().join("nope.png")).unwrap_err();
    assert!(matches!(missing, OgError::NotFound(_)));

    let corrupt = dir.path().join("bad.png");
    std::fs::write(&corrupt, b"not a png").unwrap();
    let err = decode_image_file(&corrupt).unwrap_err();
    assert!(matches!(err, OgError::Load(_)));

    let good = dir.path().join("good.png");
    std::fs::write(&good, png_bytes(4, 4, [1, 2, 3, 255])).unwrap();
    assert_eq!(decode_image_file(&good).unwrap().dimensions(), (4, 4));
}
