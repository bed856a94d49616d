use anyhow::Context;
use image::{DynamicImage, RgbaImage};

use crate::foundation::error::{OgError, OgResult};

/// Decode encoded image bytes (PNG, JPEG, WebP, ...).
pub fn decode_image(bytes: &[u8]) -> OgResult<DynamicImage> {
    let img = image::load_from_memory(bytes).context("decode image from memory")?;
    Ok(img)
}

/// Decode a template image from disk into straight-alpha RGBA8.
///
/// A missing file is [`OgError::NotFound`]; a file that exists but cannot be decoded is
/// [`OgError::Load`].
pub fn decode_image_file(path: &std::path::Path) -> OgResult<RgbaImage> {
    let bytes = std::fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => {
            OgError::not_found(format!("asset file '{}' does not exist", path.display()))
        }
        _ => OgError::load(format!("read '{}': {e}", path.display())),
    })?;
    let img = decode_image(&bytes)
        .map_err(|e| OgError::load(format!("decode '{}': {e}", path.display())))?;
    Ok(img.to_rgba8())
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
