//! Process-level wiring: every long-lived collaborator is built once here and torn down by
//! [`App::close`].

use std::sync::Arc;

use crate::{
    assets::cache::{AssetCache, AssetCacheOpts},
    collab::{
        content_store::ContentStore,
        notify::{Notifier, SlackNotifier, TracingNotifier},
    },
    config::ServiceConfig,
    content::{ContentData, ContentType},
    foundation::error::OgResult,
    output::{self, ArtifactLocation, OutputCache},
    render::encode::EncodeOpts,
    service::{orchestrator::RenderOrchestrator, preview::news_preview},
    template::{
        factory::{TemplateFactory, TemplateSettings},
        fetch::HttpPhotoFetcher,
    },
};

/// A running preview service.
pub struct App {
    config: ServiceConfig,
    assets: Arc<AssetCache>,
    orchestrator: RenderOrchestrator,
    content: Arc<dyn ContentStore>,
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("assets", &self.assets)
            .field("orchestrator", &self.orchestrator)
            .finish_non_exhaustive()
    }
}

impl App {
    /// Build everything `config` describes and connect `content`.
    pub fn from_config(config: ServiceConfig, content: Arc<dyn ContentStore>) -> OgResult<Self> {
        let output = output::from_config(&config)?;
        Self::with_output_cache(config, content, output)
    }

    /// Like [`App::from_config`] with a caller-provided output cache.
    pub fn with_output_cache(
        config: ServiceConfig,
        content: Arc<dyn ContentStore>,
        output: Arc<dyn OutputCache>,
    ) -> OgResult<Self> {
        config.validate()?;

        let assets = Arc::new(AssetCache::new(AssetCacheOpts {
            root: config.assets_dir.clone(),
            templates: config.templates.clone(),
            capacity: config.asset_cache_capacity,
            ttl: config.cache_ttl(),
            sweep_interval: Some(config.sweep_interval()),
        })?);

        let fetcher = Arc::new(HttpPhotoFetcher::new(config.fetch_timeout())?);
        let factory = Arc::new(TemplateFactory::new(
            Arc::clone(&assets),
            fetcher,
            TemplateSettings::from_config(&config),
        ));

        let notifier: Arc<dyn Notifier> = match &config.alert_webhook {
            Some(url) => Arc::new(SlackNotifier::new(url.clone(), config.fetch_timeout())?),
            None => Arc::new(TracingNotifier),
        };

        let orchestrator = RenderOrchestrator::new(
            factory,
            output,
            notifier,
            config.output_format,
            EncodeOpts {
                quality: config.output_quality,
                effort: config.compression_effort,
            },
        );

        content.connect()?;
        tracing::info!(
            assets = %assets.root().display(),
            generated = %config.generated_dir.display(),
            cache = orchestrator.output().name(),
            "preview service ready"
        );

        Ok(Self {
            config,
            assets,
            orchestrator,
            content,
        })
    }

    /// Preview for the news article `slug`.
    pub fn news_preview(&self, slug: &str, force: bool) -> OgResult<ArtifactLocation> {
        news_preview(self.content.as_ref(), &self.orchestrator, slug, force)
    }

    /// Preview for an explicit record.
    pub fn generate(
        &self,
        content_type: ContentType,
        data: &ContentData,
        force: bool,
    ) -> OgResult<ArtifactLocation> {
        self.orchestrator.generate(content_type, data, force)
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Shared asset cache.
    pub fn assets(&self) -> &Arc<AssetCache> {
        &self.assets
    }

    pub fn orchestrator(&self) -> &RenderOrchestrator {
        &self.orchestrator
    }

    /// Stop the sweep task, drop cached assets and close the content store.
    pub fn close(&self) -> OgResult<()> {
        self.assets.shutdown();
        self.assets.clear();
        self.content.close()?;
        tracing::info!("preview service closed");
        Ok(())
    }
}
