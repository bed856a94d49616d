use crate::{
    collab::content_store::ContentStore,
    content::ContentType,
    foundation::error::{OgError, OgResult},
    output::ArtifactLocation,
    service::orchestrator::RenderOrchestrator,
};

/// Preview for the news article `slug`.
///
/// A slug with no record is [`OgError::NotFound`]; every other failure comes from the
/// content store or the orchestrator unchanged.
#[tracing::instrument(level = "info", skip(store, orchestrator))]
pub fn news_preview(
    store: &dyn ContentStore,
    orchestrator: &RenderOrchestrator,
    slug: &str,
    force: bool,
) -> OgResult<ArtifactLocation> {
    let data = store
        .fetch_by_slug(slug)?
        .ok_or_else(|| OgError::not_found(format!("news '{slug}'")))?;
    orchestrator.generate(ContentType::News, &data, force)
}
