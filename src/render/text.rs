use std::collections::HashMap;

use crate::{
    assets::font::FontHandle,
    foundation::error::{OgError, OgResult},
    render::canvas::Canvas,
};

/// RGBA8 brush color used by Parley text layout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TextBrushRgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl TextBrushRgba8 {
    pub const WHITE: Self = Self {
        r: 255,
        g: 255,
        b: 255,
        a: 255,
    };

    pub const BLACK: Self = Self {
        r: 0,
        g: 0,
        b: 0,
        a: 255,
    };
}

/// Advance width and line height of a single laid-out line.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextExtent {
    pub width: f32,
    pub height: f32,
}

/// Stateful helper for shaping single lines with Parley.
///
/// Owned by one template for one render; Parley contexts are not shared across requests.
pub struct TextLayoutEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrushRgba8>,
    families: HashMap<String, String>,
}

impl Default for TextLayoutEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TextLayoutEngine {
    /// Construct a new layout engine with fresh Parley contexts.
    pub fn new() -> Self {
        Self {
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
            families: HashMap::new(),
        }
    }

    fn family_for(&mut self, font: &FontHandle) -> OgResult<String> {
        if let Some(name) = self.families.get(font.source()) {
            return Ok(name.clone());
        }

        let families = self.font_ctx.collection.register_fonts(
            parley::fontique::Blob::from(font.bytes().as_ref().clone()),
            None,
        );
        let family_id = families.first().map(|(id, _)| *id).ok_or_else(|| {
            OgError::load(format!("no font families registered from '{}'", font.source()))
        })?;
        let name = self
            .font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| OgError::load("registered font family has no name"))?
            .to_string();

        self.families
            .insert(font.source().to_string(), name.clone());
        Ok(name)
    }

    /// Shape `text` as one unbroken line.
    pub fn layout_line(
        &mut self,
        text: &str,
        font: &FontHandle,
        brush: TextBrushRgba8,
    ) -> OgResult<parley::Layout<TextBrushRgba8>> {
        let family = self.family_for(font)?;

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(family)),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(font.size_px()));
        builder.push_default(parley::style::StyleProperty::Brush(brush));

        let mut layout: parley::Layout<TextBrushRgba8> = builder.build(text);
        layout.break_all_lines(None);
        Ok(layout)
    }

    /// Measure `text` as one line in `font`.
    pub fn measure(&mut self, text: &str, font: &FontHandle) -> OgResult<TextExtent> {
        let layout = self.layout_line(text, font, TextBrushRgba8::WHITE)?;
        Ok(TextExtent {
            width: layout.width(),
            height: layout.height(),
        })
    }
}

/// Cut `title` to `max_chars` characters plus `...` when it is longer.
pub fn truncate_title(title: &str, max_chars: usize) -> String {
    if title.chars().count() <= max_chars {
        return title.to_string();
    }
    let mut out: String = title.chars().take(max_chars).collect();
    out.push_str("...");
    out
}

/// Greedy word wrap against `max_width`.
///
/// Words are never split. A word that alone exceeds `max_width` is placed on its own line.
pub fn wrap_words(
    text: &str,
    max_width: f32,
    mut measure: impl FnMut(&str) -> OgResult<f32>,
) -> OgResult<Vec<String>> {
    let mut lines = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for word in text.split_whitespace() {
        let mut candidate = current.join(" ");
        if !candidate.is_empty() {
            candidate.push(' ');
        }
        candidate.push_str(word);

        if measure(&candidate)? <= max_width {
            current.push(word);
        } else if !current.is_empty() {
            lines.push(current.join(" "));
            current = vec![word];
        } else {
            lines.push(word.to_string());
        }
    }

    if !current.is_empty() {
        lines.push(current.join(" "));
    }
    Ok(lines)
}

/// Transparent full-canvas layer that glyph runs are rasterized into with `vello_cpu`.
pub struct TextLayer {
    ctx: vello_cpu::RenderContext,
    width: u16,
    height: u16,
}

impl TextLayer {
    /// New layer matching a `width` x `height` canvas.
    pub fn new(width: u32, height: u32) -> OgResult<Self> {
        let w: u16 = width
            .try_into()
            .map_err(|_| OgError::validation("text layer width exceeds u16"))?;
        let h: u16 = height
            .try_into()
            .map_err(|_| OgError::validation("text layer height exceeds u16"))?;
        Ok(Self {
            ctx: vello_cpu::RenderContext::new(w, h),
            width: w,
            height: h,
        })
    }

    /// Fill every glyph run of `layout` with its brush, with the layout's top-left at `(x, y)`.
    pub fn draw(&mut self, layout: &parley::Layout<TextBrushRgba8>, font: &FontHandle, x: f64, y: f64) {
        self.ctx
            .set_transform(vello_cpu::kurbo::Affine::translate((x, y)));
        for line in layout.lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                let brush = run.style().brush;
                self.ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                    brush.r, brush.g, brush.b, brush.a,
                ));
                let glyphs = run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                    id: g.id,
                    x: g.x,
                    y: g.y,
                });
                self.ctx
                    .glyph_run(font.font_data())
                    .font_size(run.run().font_size())
                    .fill_glyphs(glyphs);
            }
        }
    }

    /// Rasterize everything drawn so far and composite it over `canvas`.
    pub fn composite_onto(mut self, canvas: &mut Canvas) -> OgResult<()> {
        if u32::from(self.width) != canvas.width() || u32::from(self.height) != canvas.height() {
            return Err(OgError::validation("text layer size does not match canvas"));
        }
        let mut pixmap = vello_cpu::Pixmap::new(self.width, self.height);
        self.ctx.flush();
        self.ctx.render_to_pixmap(&mut pixmap);
        canvas.composite_premul(pixmap.data_as_u8_slice())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/text.rs"]
mod tests;
