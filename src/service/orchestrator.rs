use std::{path::PathBuf, sync::Arc};

use crate::{
    collab::notify::{Alert, Notifier, Severity},
    content::{CacheKey, ContentData, ContentType},
    foundation::error::{OgError, OgResult},
    output::{ArtifactLocation, OutputCache},
    render::encode::{EncodeOpts, OutputFormat},
    service::stats::{GenerationStats, StatsSnapshot},
    template::factory::TemplateProvider,
};

/// Drives one generation request: key, cache lookup, render, save, publish.
///
/// Requests are independent and may run concurrently. Concurrent misses for the same key
/// both render; the last writer wins.
pub struct RenderOrchestrator {
    templates: Arc<dyn TemplateProvider>,
    output: Arc<dyn OutputCache>,
    notifier: Arc<dyn Notifier>,
    format: OutputFormat,
    encode: EncodeOpts,
    stats: GenerationStats,
}

impl std::fmt::Debug for RenderOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderOrchestrator")
            .field("output", &self.output.name())
            .field("format", &self.format)
            .field("encode", &self.encode)
            .finish_non_exhaustive()
    }
}

impl RenderOrchestrator {
    /// Wire the orchestrator to its collaborators.
    pub fn new(
        templates: Arc<dyn TemplateProvider>,
        output: Arc<dyn OutputCache>,
        notifier: Arc<dyn Notifier>,
        format: OutputFormat,
        encode: EncodeOpts,
    ) -> Self {
        Self {
            templates,
            output,
            notifier,
            format,
            encode,
            stats: GenerationStats::default(),
        }
    }

    /// Artifact location for `data`, rendering it unless a usable cached artifact exists.
    ///
    /// `force` skips the cache lookup. Hits are returned as-is and not re-timestamped. Any
    /// failure is logged, reported to the notifier, and returned unchanged; partially written
    /// files are left in place.
    pub fn generate(
        &self,
        content_type: ContentType,
        data: &ContentData,
        force: bool,
    ) -> OgResult<ArtifactLocation> {
        let span = tracing::info_span!(
            "generate",
            content_type = %content_type,
            cache_key = tracing::field::Empty,
            force
        );
        let _guard = span.enter();

        let result = CacheKey::derive(content_type, data).and_then(|key| {
            span.record("cache_key", key.as_str());
            self.generate_keyed(content_type, &key, data, force)
        });

        if let Err(err) = &result {
            self.stats.record_failure();
            tracing::error!(error = %err, "generation failed");
            self.alert(content_type, err);
        }
        result
    }

    /// [`Self::generate`] for a content-type tag.
    pub fn generate_for_tag(
        &self,
        tag: &str,
        data: &ContentData,
        force: bool,
    ) -> OgResult<ArtifactLocation> {
        let content_type: ContentType = tag.parse()?;
        self.generate(content_type, data, force)
    }

    fn generate_keyed(
        &self,
        content_type: ContentType,
        key: &CacheKey,
        data: &ContentData,
        force: bool,
    ) -> OgResult<ArtifactLocation> {
        if !force && let Some(hit) = self.output.lookup(key)? {
            self.stats.record_hit();
            tracing::debug!(location = %hit, "output cache hit");
            return Ok(hit);
        }

        let path = self.render_and_save(content_type, data)?;
        let published = self.output.publish(&path, key)?;
        self.stats.record_generated(content_type);

        let location = published.unwrap_or(ArtifactLocation::Local(path));
        tracing::info!(location = %location, backend = self.output.name(), "generated artifact");
        Ok(location)
    }

    fn render_and_save(&self, content_type: ContentType, data: &ContentData) -> OgResult<PathBuf> {
        let mut template = self.templates.create(content_type)?;
        {
            let _render = tracing::debug_span!("render_template", content_type = %content_type).entered();
            self.stats.record_render();
            template.render(data)?;
        }

        let path = template.output_path(data, self.format)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                OgError::persistence(format!("create '{}': {e}", parent.display()))
            })?;
        }
        template.save(Some(&path), self.format, self.encode)
    }

    fn alert(&self, content_type: ContentType, err: &OgError) {
        let alert = Alert::new(
            format!("{content_type} preview generation failed"),
            Severity::Warning,
        )
        .with_details(err.to_string());
        if let Err(notify_err) = self.notifier.send(&alert) {
            tracing::warn!(error = %notify_err, "failed to deliver alert");
        }
    }

    /// Remove cached artifacts through the output cache.
    pub fn clear_output(&self) -> OgResult<usize> {
        self.output.clear()
    }

    /// Output-cache backend in use.
    pub fn output(&self) -> &Arc<dyn OutputCache> {
        &self.output
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/service/orchestrator.rs"]
mod tests;
