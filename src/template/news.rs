use std::{path::PathBuf, sync::Arc};

use crate::{
    assets::{decode::decode_image, font::FontHandle},
    config::FontConfig,
    content::{CacheKey, ContentData, ContentType, NewsRecord},
    foundation::error::{OgError, OgResult},
    render::{
        canvas::{Canvas, cover_fit, downscale_to_fit, vertical_gradient},
        encode::OutputFormat,
        text::{TextBrushRgba8, TextLayer, TextLayoutEngine, truncate_title, wrap_words},
    },
    template::{CanvasSource, Template, TemplateBase, fetch::PhotoFetcher},
};

// Layout constants in reference coordinates (15001 x 7875).
const TITLE_FONT_SIZE: u32 = 580;
const BRAND_FONT_SIZE: u32 = 200;
const TEXT_MARGIN: u32 = 400;
const TITLE_TOP_OFFSET: u32 = 100;
const LINE_SPACING: u32 = 20;
const BRAND_POSITION: (u32, u32) = (120, 120);

const TITLE_MAX_CHARS: usize = 101;
const FADE_FRACTION: f32 = 0.4;
const BACKGROUND: [u8; 3] = [0, 0, 0];

/// News article preview: cover-fitted photo, bottom fade, centered title, optional brand.
pub struct NewsTemplate {
    base: TemplateBase,
    fonts: FontConfig,
    default_title: String,
    max_background_px: u32,
    fetcher: Arc<dyn PhotoFetcher>,
}

impl std::fmt::Debug for NewsTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewsTemplate")
            .field("base", &self.base)
            .field("fonts", &self.fonts)
            .field("default_title", &self.default_title)
            .finish_non_exhaustive()
    }
}

impl NewsTemplate {
    /// Wrap `base` (which must be for [`ContentType::News`]) with the news layout.
    pub fn new(
        base: TemplateBase,
        fonts: FontConfig,
        default_title: impl Into<String>,
        max_background_px: u32,
        fetcher: Arc<dyn PhotoFetcher>,
    ) -> Self {
        Self {
            base,
            fonts,
            default_title: default_title.into(),
            max_background_px,
            fetcher,
        }
    }

    /// Width available to title lines.
    pub fn content_width(&self) -> f32 {
        self.base
            .width()
            .saturating_sub(self.base.scale_dimension(TEXT_MARGIN)) as f32
    }

    /// Scaled title font.
    pub fn title_font(&self) -> OgResult<Arc<FontHandle>> {
        self.base
            .assets()
            .get_font(&self.fonts.bold, self.base.scale_font_size(TITLE_FONT_SIZE))
    }

    /// Truncate and wrap `title` against [`Self::content_width`].
    pub fn title_lines(
        &self,
        engine: &mut TextLayoutEngine,
        font: &FontHandle,
        title: &str,
    ) -> OgResult<Vec<String>> {
        let title = truncate_title(title, TITLE_MAX_CHARS);
        wrap_words(&title, self.content_width(), |candidate| {
            Ok(engine.measure(candidate, font)?.width)
        })
    }

    fn background(&self, url: &str) -> OgResult<Canvas> {
        let bytes = self.fetcher.fetch(url)?;
        let img = decode_image(&bytes)
            .map_err(|e| OgError::upstream(format!("decode background photo: {e}")))?;
        let img = downscale_to_fit(img, self.max_background_px);
        let fitted = cover_fit(&img, self.base.width(), self.base.height());
        Ok(Canvas::from_rgba_image(&fitted))
    }
}

impl Template for NewsTemplate {
    fn base(&self) -> &TemplateBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut TemplateBase {
        &mut self.base
    }

    #[tracing::instrument(level = "debug", skip_all, fields(content_type = "news"))]
    fn render(&mut self, data: &ContentData) -> OgResult<()> {
        let record = NewsRecord::from_data(data);
        self.base.initialize_canvas(&CanvasSource::Solid(BACKGROUND));

        let image_url = record
            .image_url
            .as_deref()
            .ok_or_else(|| OgError::validation("news record has no imageUrl"))?;

        match self.background(image_url) {
            Ok(photo) => self.base.canvas_mut()?.paste_over(&photo, 0, 0),
            Err(err) => {
                tracing::warn!(url = image_url, error = %err, "background photo unavailable, keeping plain canvas");
            }
        }

        let (width, height) = (self.base.width(), self.base.height());
        let fade = (height as f32 * FADE_FRACTION) as u32;
        let fade_top = height - fade;
        let gradient = vertical_gradient(width, fade, [0, 0, 0, 0], [0, 0, 0, 255]);
        self.base
            .canvas_mut()?
            .paste_over(&gradient, 0, i64::from(fade_top));

        let title_font = self.title_font()?;
        let title = record
            .title
            .clone()
            .unwrap_or_else(|| self.default_title.clone());
        let mut engine = TextLayoutEngine::new();
        let lines = self.title_lines(&mut engine, &title_font, &title)?;

        let mut layer = TextLayer::new(width, height)?;
        let spacing = self.base.scale_dimension(LINE_SPACING) as f32;
        let mut y = (fade_top + self.base.scale_dimension(TITLE_TOP_OFFSET)) as f32;
        for line in &lines {
            let layout = engine.layout_line(line, &title_font, TextBrushRgba8::WHITE)?;
            let x = ((width as f32 - layout.width()) / 2.0).floor();
            layer.draw(&layout, &title_font, f64::from(x), f64::from(y));
            y += layout.height() + spacing;
        }

        if let Some(brand) = record.brand.as_deref() {
            let brand_font = self
                .base
                .assets()
                .get_font(&self.fonts.medium, self.base.scale_font_size(BRAND_FONT_SIZE))?;
            let layout = engine.layout_line(brand, &brand_font, TextBrushRgba8::BLACK)?;
            let (bx, by) = self.base.scale_position(BRAND_POSITION.0, BRAND_POSITION.1);
            layer.draw(&layout, &brand_font, f64::from(bx), f64::from(by));
        }

        layer.composite_onto(self.base.canvas_mut()?)?;
        self.base.mark_rendered()?;
        tracing::debug!(lines = lines.len(), brand = record.brand.is_some(), "rendered news preview");
        Ok(())
    }

    fn output_path(&self, data: &ContentData, format: OutputFormat) -> OgResult<PathBuf> {
        let key = CacheKey::derive(ContentType::News, data)?;
        Ok(self.base.generated_dir().join(key.file_name(format)))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/template/news.rs"]
mod tests;
