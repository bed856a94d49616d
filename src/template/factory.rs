use std::{path::PathBuf, sync::Arc};

use crate::{
    assets::cache::AssetCache,
    config::{CanvasConfig, FontConfig, ServiceConfig},
    content::ContentType,
    foundation::error::OgResult,
    template::{Template, TemplateBase, fetch::PhotoFetcher, news::NewsTemplate},
};

/// Render settings shared by every template the factory creates.
#[derive(Clone, Debug, PartialEq)]
pub struct TemplateSettings {
    /// Output directory for artifacts.
    pub generated_dir: PathBuf,
    pub canvas: CanvasConfig,
    /// Font files, relative to the asset root.
    pub fonts: FontConfig,
    /// Title for records without one.
    pub default_title: String,
    /// Downscale bound for downloaded photos.
    pub max_background_px: u32,
}

impl TemplateSettings {
    /// Pick the template-related fields out of the service config.
    pub fn from_config(cfg: &ServiceConfig) -> Self {
        Self {
            generated_dir: cfg.generated_dir.clone(),
            canvas: cfg.canvas,
            fonts: cfg.fonts.clone(),
            default_title: cfg.default_title.clone(),
            max_background_px: cfg.max_background_px,
        }
    }
}

/// Source of fresh template instances, one per render request.
pub trait TemplateProvider: Send + Sync {
    /// Template for `content_type`; types without an implementation are `UnsupportedType`.
    fn create(&self, content_type: ContentType) -> OgResult<Box<dyn Template>>;
}

/// Creates templates wired to the shared asset cache and photo fetcher.
pub struct TemplateFactory {
    assets: Arc<AssetCache>,
    fetcher: Arc<dyn PhotoFetcher>,
    settings: TemplateSettings,
}

impl std::fmt::Debug for TemplateFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateFactory")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl TemplateFactory {
    /// Wire the factory to its shared collaborators.
    pub fn new(
        assets: Arc<AssetCache>,
        fetcher: Arc<dyn PhotoFetcher>,
        settings: TemplateSettings,
    ) -> Self {
        Self {
            assets,
            fetcher,
            settings,
        }
    }

    /// Template for a content-type tag; unknown tags are `UnsupportedType` errors.
    pub fn create_for_tag(&self, tag: &str) -> OgResult<Box<dyn Template>> {
        let content_type: ContentType = tag.parse()?;
        self.create(content_type)
    }

    /// Shared render settings.
    pub fn settings(&self) -> &TemplateSettings {
        &self.settings
    }

    /// Asset cache handed to templates.
    pub fn assets(&self) -> &Arc<AssetCache> {
        &self.assets
    }
}

impl TemplateProvider for TemplateFactory {
    fn create(&self, content_type: ContentType) -> OgResult<Box<dyn Template>> {
        let base = TemplateBase::new(
            content_type,
            Arc::clone(&self.assets),
            self.settings.generated_dir.clone(),
            &self.settings.canvas,
        )?;
        match content_type {
            ContentType::News => Ok(Box::new(NewsTemplate::new(
                base,
                self.settings.fonts.clone(),
                self.settings.default_title.clone(),
                self.settings.max_background_px,
                Arc::clone(&self.fetcher),
            ))),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/template/factory.rs"]
mod tests;
