use image::{DynamicImage, RgbaImage, imageops::FilterType};

use crate::foundation::{
    error::{OgError, OgResult},
    math::mul_div255_u8,
};

/// Drawing surface in premultiplied RGBA8, row-major, tightly packed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Canvas {
    width: u32,
    height: u32,
    rgba8_premul: Vec<u8>,
}

impl Canvas {
    /// Opaque canvas filled with `rgb`.
    pub fn solid(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let px = [rgb[0], rgb[1], rgb[2], 255];
        let len = (width as usize) * (height as usize);
        let mut rgba8_premul = Vec::with_capacity(len * 4);
        for _ in 0..len {
            rgba8_premul.extend_from_slice(&px);
        }
        Self {
            width,
            height,
            rgba8_premul,
        }
    }

    /// Fully transparent canvas.
    pub fn transparent(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            rgba8_premul: vec![0; (width as usize) * (height as usize) * 4],
        }
    }

    /// Premultiply a straight-alpha image into a canvas.
    pub fn from_rgba_image(img: &RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        let mut rgba8_premul = img.as_raw().clone();
        premultiply_rgba8_in_place(&mut rgba8_premul);
        Self {
            width,
            height,
            rgba8_premul,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Premultiplied pixel bytes.
    pub fn pixels(&self) -> &[u8] {
        &self.rgba8_premul
    }

    /// Premultiplied pixel at `(x, y)`, or transparent when out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        if x >= self.width || y >= self.height {
            return [0, 0, 0, 0];
        }
        let idx = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        [
            self.rgba8_premul[idx],
            self.rgba8_premul[idx + 1],
            self.rgba8_premul[idx + 2],
            self.rgba8_premul[idx + 3],
        ]
    }

    /// Source-over `src` with its top-left at `(x, y)`, clipped to this canvas.
    pub fn paste_over(&mut self, src: &Canvas, x: i64, y: i64) {
        let dst_w = i64::from(self.width);
        let dst_h = i64::from(self.height);
        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = (x + i64::from(src.width)).min(dst_w);
        let y1 = (y + i64::from(src.height)).min(dst_h);
        if x0 >= x1 || y0 >= y1 {
            return;
        }

        let span = ((x1 - x0) as usize) * 4;
        for dy in y0..y1 {
            let sy = (dy - y) as usize;
            let sx = (x0 - x) as usize;
            let s_start = (sy * src.width as usize + sx) * 4;
            let d_start = ((dy as usize) * (self.width as usize) + x0 as usize) * 4;
            premul_over_row(
                &mut self.rgba8_premul[d_start..d_start + span],
                &src.rgba8_premul[s_start..s_start + span],
            );
        }
    }

    /// Source-over a same-sized premultiplied buffer (for example a rasterized text layer).
    pub fn composite_premul(&mut self, src_premul: &[u8]) -> OgResult<()> {
        if src_premul.len() != self.rgba8_premul.len() {
            return Err(OgError::validation(
                "composite_premul expects a buffer matching the canvas size",
            ));
        }
        premul_over_row(&mut self.rgba8_premul, src_premul);
        Ok(())
    }

    /// Copy of this canvas composited over an opaque `rgb` background.
    pub fn flattened_onto(&self, rgb: [u8; 3]) -> Canvas {
        let mut out = Canvas::solid(self.width, self.height, rgb);
        premul_over_row(&mut out.rgba8_premul, &self.rgba8_premul);
        out
    }

    /// Convert back to a straight-alpha image.
    pub fn to_rgba_image(&self) -> OgResult<RgbaImage> {
        let mut raw = self.rgba8_premul.clone();
        unpremultiply_rgba8_in_place(&mut raw);
        RgbaImage::from_raw(self.width, self.height, raw)
            .ok_or_else(|| OgError::validation("canvas byte length does not match its size"))
    }
}

/// Linear vertical gradient from `start` (top row) to `end` (bottom), straight RGBA colors.
///
/// Row `y` gets `start + (end - start) * y / height`, truncated.
pub fn vertical_gradient(width: u32, height: u32, start: [u8; 4], end: [u8; 4]) -> Canvas {
    let mut out = Canvas::transparent(width, height);
    if height == 0 {
        return out;
    }
    let row_len = (width as usize) * 4;
    for y in 0..height {
        let t = f64::from(y) / f64::from(height);
        let mut px = [0u8; 4];
        for c in 0..4 {
            let v = f64::from(start[c]) + (f64::from(end[c]) - f64::from(start[c])) * t;
            px[c] = v as u8;
        }
        let a = u16::from(px[3]);
        let premul = [
            mul_div255_u8(u16::from(px[0]), a),
            mul_div255_u8(u16::from(px[1]), a),
            mul_div255_u8(u16::from(px[2]), a),
            px[3],
        ];
        let row = &mut out.rgba8_premul[(y as usize) * row_len..(y as usize + 1) * row_len];
        for dst in row.chunks_exact_mut(4) {
            dst.copy_from_slice(&premul);
        }
    }
    out
}

/// Resize-to-cover: scale preserving aspect ratio until both dimensions are filled, then
/// crop the overflow around the center. No letterboxing.
pub fn cover_fit(img: &DynamicImage, width: u32, height: u32) -> RgbaImage {
    img.resize_to_fill(width, height, FilterType::Lanczos3)
        .to_rgba8()
}

/// Downscale so neither dimension exceeds `max_px`, preserving aspect ratio. Smaller
/// images are returned unchanged.
pub fn downscale_to_fit(img: DynamicImage, max_px: u32) -> DynamicImage {
    if max_px == 0 || (img.width() <= max_px && img.height() <= max_px) {
        return img;
    }
    img.resize(max_px, max_px, FilterType::Lanczos3)
}

/// Stretch `img` to exactly `width` x `height`.
pub fn resize_exact(img: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    image::imageops::resize(img, width, height, FilterType::Lanczos3)
}

fn premul_over_row(dst: &mut [u8], src: &[u8]) {
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let sa = u16::from(s[3]);
        if sa == 0 {
            continue;
        }
        if sa == 255 {
            d.copy_from_slice(s);
            continue;
        }
        let inv = 255u16 - sa;
        d[3] = s[3].saturating_add(mul_div255_u8(u16::from(d[3]), inv));
        for c in 0..3 {
            let dc = mul_div255_u8(u16::from(d[c]), inv);
            d[c] = s[c].saturating_add(dc);
        }
    }
}

pub(crate) fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
}

fn unpremultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = u32::from(px[3]);
        if a == 0 || a == 255 {
            continue;
        }
        for c in 0..3 {
            px[c] = ((u32::from(px[c]) * 255 + a / 2) / a).min(255) as u8;
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/canvas.rs"]
mod tests;
