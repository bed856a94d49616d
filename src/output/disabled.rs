use std::path::Path;

use crate::{
    content::CacheKey,
    foundation::error::OgResult,
    output::{ArtifactLocation, OutputCache},
};

/// Backend that never caches: every lookup misses and publish keeps nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct DisabledCache;

impl OutputCache for DisabledCache {
    fn name(&self) -> &'static str {
        "disabled"
    }

    fn lookup(&self, _key: &CacheKey) -> OgResult<Option<ArtifactLocation>> {
        Ok(None)
    }

    fn publish(&self, _path: &Path, _key: &CacheKey) -> OgResult<Option<ArtifactLocation>> {
        Ok(None)
    }

    fn clear(&self) -> OgResult<usize> {
        Ok(0)
    }
}
