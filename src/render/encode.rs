use std::{io::Cursor, str::FromStr};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::{
    foundation::error::{OgError, OgResult},
    render::canvas::Canvas,
};

/// Encoded artifact format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Lossy WebP with quality and method.
    #[default]
    Webp,
    /// Lossless PNG.
    Png,
    /// Lossy JPEG; alpha is flattened onto white.
    Jpeg,
}

impl OutputFormat {
    /// File extension without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Webp => "webp",
            Self::Png => "png",
            Self::Jpeg => "jpeg",
        }
    }

    /// MIME type used when publishing.
    pub fn content_type(self) -> &'static str {
        match self {
            Self::Webp => "image/webp",
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
        }
    }

    /// Whether the format can carry an alpha channel.
    pub fn supports_alpha(self) -> bool {
        !matches!(self, Self::Jpeg)
    }
}

impl FromStr for OutputFormat {
    type Err = OgError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "webp" => Ok(Self::Webp),
            "png" => Ok(Self::Png),
            "jpeg" | "jpg" => Ok(Self::Jpeg),
            other => Err(OgError::configuration(format!(
                "unknown output format '{other}'"
            ))),
        }
    }
}

/// Encoder knobs for lossy formats.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EncodeOpts {
    /// Quality, 0..=100.
    pub quality: u8,
    /// WebP method (compression effort), 0..=6.
    pub effort: u8,
}

impl Default for EncodeOpts {
    fn default() -> Self {
        Self {
            quality: 40,
            effort: 6,
        }
    }
}

/// Encode a canvas into `format` bytes.
pub fn encode_canvas(canvas: &Canvas, format: OutputFormat, opts: EncodeOpts) -> OgResult<Vec<u8>> {
    let rgba = if format.supports_alpha() {
        canvas.to_rgba_image()?
    } else {
        canvas.flattened_onto([255, 255, 255]).to_rgba_image()?
    };
    let (width, height) = rgba.dimensions();

    match format {
        OutputFormat::Webp => encode_webp(rgba.as_raw(), width, height, opts),
        OutputFormat::Png => {
            let mut buf = Vec::new();
            image::DynamicImage::ImageRgba8(rgba)
                .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
                .context("encode png")?;
            Ok(buf)
        }
        OutputFormat::Jpeg => {
            let rgb = image::DynamicImage::ImageRgba8(rgba).to_rgb8();
            let mut buf = Vec::new();
            let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(
                &mut buf,
                opts.quality.clamp(1, 100),
            );
            rgb.write_with_encoder(encoder).context("encode jpeg")?;
            Ok(buf)
        }
    }
}

fn encode_webp(rgba: &[u8], width: u32, height: u32, opts: EncodeOpts) -> OgResult<Vec<u8>> {
    let mut config = libwebp_sys::WebPConfig::new()
        .map_err(|_| OgError::persistence("webp encoder config init failed"))?;
    config.lossless = 0;
    config.quality = f32::from(opts.quality.min(100));
    config.method = i32::from(opts.effort.min(6));

    let encoder = webp::Encoder::from_rgba(rgba, width, height);
    let mem = encoder
        .encode_advanced(&config)
        .map_err(|e| OgError::persistence(format!("webp encode failed: {e:?}")))?;
    Ok(mem.to_vec())
}

#[cfg(test)]
#[path = "../../tests/unit/render/encode.rs"]
mod tests;
