/// Convenience result type used across ogcard.
pub type OgResult<T> = Result<T, OgError>;

/// Top-level error taxonomy for asset loading, rendering and caching.
#[derive(thiserror::Error, Debug)]
pub enum OgError {
    /// Missing asset, font file or content record.
    #[error("not found: {0}")]
    NotFound(String),

    /// Invalid startup configuration (for example a missing asset root).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A remote dependency (background photo host, object storage) failed.
    #[error("upstream failure: {0}")]
    Upstream(String),

    /// An asset exists but could not be decoded.
    #[error("load failure: {0}")]
    Load(String),

    /// `save` was called before a successful `render`.
    #[error("template has not been rendered yet; call render() first")]
    NotRendered,

    /// `save` was called on a template without a canvas.
    #[error("no image to save; canvas initialization failed")]
    NoImage,

    /// No template is registered for the requested content type.
    #[error("unsupported content type: {0}")]
    UnsupportedType(String),

    /// Writing or uploading a rendered artifact failed.
    #[error("persistence failure: {0}")]
    Persistence(String),

    /// Invalid caller-provided data.
    #[error("validation error: {0}")]
    Validation(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl OgError {
    /// Build a [`OgError::NotFound`] value.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Build a [`OgError::Configuration`] value.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Build a [`OgError::Upstream`] value.
    pub fn upstream(msg: impl Into<String>) -> Self {
        Self::Upstream(msg.into())
    }

    /// Build a [`OgError::Load`] value.
    pub fn load(msg: impl Into<String>) -> Self {
        Self::Load(msg.into())
    }

    /// Build a [`OgError::UnsupportedType`] value.
    pub fn unsupported_type(msg: impl Into<String>) -> Self {
        Self::UnsupportedType(msg.into())
    }

    /// Build a [`OgError::Persistence`] value.
    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::Persistence(msg.into())
    }

    /// Build a [`OgError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`OgError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// `true` when the boundary should answer "not found" rather than a generic failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
