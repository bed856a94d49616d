use std::sync::Arc;

use crate::foundation::error::{OgError, OgResult};

/// A loaded font face at a fixed pixel size.
///
/// Handles are shared out of the asset cache and must be treated as immutable.
#[derive(Clone)]
pub struct FontHandle {
    source: String,
    size_px: f32,
    family: String,
    bytes: Arc<Vec<u8>>,
    data: vello_cpu::peniko::FontData,
}

impl std::fmt::Debug for FontHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontHandle")
            .field("source", &self.source)
            .field("size_px", &self.size_px)
            .field("family", &self.family)
            .field("bytes_len", &self.bytes.len())
            .finish()
    }
}

impl FontHandle {
    /// Parse `bytes` and bind them to `size_px`.
    ///
    /// Fails with [`OgError::Load`] when no font family can be read from the data.
    pub fn from_bytes(source: impl Into<String>, bytes: Vec<u8>, size_px: f32) -> OgResult<Self> {
        let source = source.into();
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(OgError::validation("font size must be finite and > 0"));
        }

        let mut font_ctx = parley::FontContext::default();
        let families = font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(bytes.clone()), None);
        let family_id = families
            .first()
            .map(|(id, _)| *id)
            .ok_or_else(|| OgError::load(format!("no font families in '{source}'")))?;
        let family = font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| OgError::load(format!("font family in '{source}' has no name")))?
            .to_string();

        let bytes = Arc::new(bytes);
        let data = vello_cpu::peniko::FontData::new(
            vello_cpu::peniko::Blob::from(bytes.as_ref().clone()),
            0,
        );

        Ok(Self {
            source,
            size_px,
            family,
            bytes,
            data,
        })
    }

    /// Path the font was loaded from, relative to the asset root.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Pixel size the handle is bound to.
    pub fn size_px(&self) -> f32 {
        self.size_px
    }

    /// Primary family name read from the font data.
    pub fn family(&self) -> &str {
        &self.family
    }

    /// Raw font bytes.
    pub fn bytes(&self) -> &Arc<Vec<u8>> {
        &self.bytes
    }

    pub(crate) fn font_data(&self) -> &vello_cpu::peniko::FontData {
        &self.data
    }
}
