//! Preview templates: the shared canvas lifecycle plus one implementation per content type.
//!
//! A template instance renders exactly one record. Its [`RenderState`] only moves forward:
//! `Uninitialized -> CanvasReady -> Rendered -> Saved`.

pub mod factory;
pub mod fetch;
pub mod news;

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::{
    assets::cache::AssetCache,
    config::CanvasConfig,
    content::{ContentData, ContentType},
    foundation::error::{OgError, OgResult},
    render::{
        canvas::{Canvas, resize_exact},
        encode::{EncodeOpts, OutputFormat, encode_canvas},
    },
};

/// Smallest font size any scaled text is drawn at.
pub const MIN_FONT_SIZE_PX: u32 = 12;

/// Lifecycle of one template instance.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RenderState {
    /// No canvas yet.
    #[default]
    Uninitialized,
    /// Canvas allocated, nothing drawn.
    CanvasReady,
    /// `render` completed.
    Rendered,
    /// Artifact written.
    Saved,
}

/// Where the initial canvas comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CanvasSource {
    /// Flat opaque color.
    Solid([u8; 3]),
    /// Template image from the asset cache, resized to the canvas when needed.
    Asset {
        id: String,
        /// Optional variant (for example a month index).
        variant: Option<u32>,
    },
}

/// Canvas used when a template image cannot be loaded.
const FALLBACK_BACKGROUND: [u8; 3] = [255, 255, 255];

/// State and helpers shared by every template.
#[derive(Debug)]
pub struct TemplateBase {
    content_type: ContentType,
    assets: Arc<AssetCache>,
    generated_dir: PathBuf,
    width: u32,
    height: u32,
    scale: f32,
    canvas: Option<Canvas>,
    state: RenderState,
}

impl TemplateBase {
    /// New base for `content_type` drawing on a canvas of the configured size.
    ///
    /// The scale factor is `height / reference_height`, fixed for the life of the instance.
    pub fn new(
        content_type: ContentType,
        assets: Arc<AssetCache>,
        generated_dir: impl Into<PathBuf>,
        canvas: &CanvasConfig,
    ) -> OgResult<Self> {
        if canvas.width == 0 || canvas.height == 0 {
            return Err(OgError::validation("canvas size must be non-zero"));
        }
        if canvas.reference_height == 0 {
            return Err(OgError::validation("reference height must be non-zero"));
        }
        Ok(Self {
            content_type,
            assets,
            generated_dir: generated_dir.into(),
            width: canvas.width,
            height: canvas.height,
            scale: canvas.height as f32 / canvas.reference_height as f32,
            canvas: None,
            state: RenderState::Uninitialized,
        })
    }

    /// Content type this template renders.
    pub fn content_type(&self) -> ContentType {
        self.content_type
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Uniform scale from reference coordinates to canvas pixels.
    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn state(&self) -> RenderState {
        self.state
    }

    /// Asset cache the template loads fonts and images from.
    pub fn assets(&self) -> &Arc<AssetCache> {
        &self.assets
    }

    pub fn generated_dir(&self) -> &Path {
        &self.generated_dir
    }

    /// Current canvas, if initialized.
    pub fn canvas(&self) -> Option<&Canvas> {
        self.canvas.as_ref()
    }

    /// Mutable canvas; fails when the canvas has not been initialized.
    pub fn canvas_mut(&mut self) -> OgResult<&mut Canvas> {
        self.canvas.as_mut().ok_or(OgError::NoImage)
    }

    /// Allocate the canvas and enter `CanvasReady`.
    ///
    /// A template image that cannot be loaded is logged and replaced by a blank white canvas.
    pub fn initialize_canvas(&mut self, source: &CanvasSource) {
        let canvas = match source {
            CanvasSource::Solid(rgb) => Canvas::solid(self.width, self.height, *rgb),
            CanvasSource::Asset { id, variant } => match self.load_template(id, *variant) {
                Ok(canvas) => canvas,
                Err(err) => {
                    tracing::warn!(asset = %id, ?variant, error = %err, "template image unavailable, using blank canvas");
                    Canvas::solid(self.width, self.height, FALLBACK_BACKGROUND)
                }
            },
        };
        self.canvas = Some(canvas);
        self.state = RenderState::CanvasReady;
    }

    fn load_template(&self, id: &str, variant: Option<u32>) -> OgResult<Canvas> {
        let mut img = self.assets.get_template(id, variant)?;
        if img.dimensions() != (self.width, self.height) {
            img = resize_exact(&img, self.width, self.height);
        }
        Ok(Canvas::from_rgba_image(&img))
    }

    /// Enter `Rendered`. Only valid from `CanvasReady`.
    pub fn mark_rendered(&mut self) -> OgResult<()> {
        if self.state != RenderState::CanvasReady {
            return Err(OgError::validation(format!(
                "cannot finish render from state {:?}",
                self.state
            )));
        }
        self.state = RenderState::Rendered;
        Ok(())
    }

    /// Scale a reference-space length, truncating toward zero.
    pub fn scale_dimension(&self, original: u32) -> u32 {
        (original as f32 * self.scale) as u32
    }

    /// Scale a reference-space point.
    pub fn scale_position(&self, x: u32, y: u32) -> (u32, u32) {
        (self.scale_dimension(x), self.scale_dimension(y))
    }

    /// Scale a reference-space font size, never below [`MIN_FONT_SIZE_PX`].
    pub fn scale_font_size(&self, original: u32) -> u32 {
        self.scale_dimension(original).max(MIN_FONT_SIZE_PX)
    }

    /// `{generated_dir}/{type}.{ext}`.
    pub fn default_output_path(&self, format: OutputFormat) -> PathBuf {
        self.generated_dir
            .join(format!("{}.{}", self.content_type.tag(), format.extension()))
    }

    /// Encode the rendered canvas and write it to `path` (or the default path).
    ///
    /// Fails with [`OgError::NotRendered`] unless the state is `Rendered`, and with
    /// [`OgError::NoImage`] when there is no canvas. Write failures are
    /// [`OgError::Persistence`].
    pub fn save(
        &mut self,
        path: Option<&Path>,
        format: OutputFormat,
        opts: EncodeOpts,
    ) -> OgResult<PathBuf> {
        if self.state != RenderState::Rendered {
            return Err(OgError::NotRendered);
        }
        let canvas = self.canvas.as_ref().ok_or(OgError::NoImage)?;

        let path = match path {
            Some(p) => p.to_path_buf(),
            None => {
                std::fs::create_dir_all(&self.generated_dir).map_err(|e| {
                    OgError::persistence(format!(
                        "create '{}': {e}",
                        self.generated_dir.display()
                    ))
                })?;
                self.default_output_path(format)
            }
        };

        let bytes = encode_canvas(canvas, format, opts)?;
        std::fs::write(&path, &bytes)
            .map_err(|e| OgError::persistence(format!("write '{}': {e}", path.display())))?;

        tracing::debug!(path = %path.display(), bytes = bytes.len(), format = format.extension(), "saved artifact");
        self.state = RenderState::Saved;
        Ok(path)
    }
}

/// A renderer for one content type.
///
/// Implementations own a [`TemplateBase`] and supply the type-specific drawing and naming.
pub trait Template: Send {
    /// Shared state.
    fn base(&self) -> &TemplateBase;

    fn base_mut(&mut self) -> &mut TemplateBase;

    /// Draw `data` onto a fresh canvas and enter `Rendered`.
    fn render(&mut self, data: &ContentData) -> OgResult<()>;

    /// Deterministic artifact path for `data`.
    ///
    /// Must agree with the output cache's `{key}.{ext}` naming under the generated directory.
    fn output_path(&self, data: &ContentData, format: OutputFormat) -> OgResult<PathBuf>;

    /// Content type this template renders.
    fn content_type(&self) -> ContentType {
        self.base().content_type()
    }

    /// Current lifecycle state.
    fn state(&self) -> RenderState {
        self.base().state()
    }

    /// See [`TemplateBase::save`].
    fn save(
        &mut self,
        path: Option<&Path>,
        format: OutputFormat,
        opts: EncodeOpts,
    ) -> OgResult<PathBuf> {
        self.base_mut().save(path, format, opts)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/template/base.rs"]
mod tests;
