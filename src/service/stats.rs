use std::sync::atomic::{AtomicU64, Ordering};

use crate::content::ContentType;

/// Lifetime counters of one orchestrator.
#[derive(Debug, Default)]
pub struct GenerationStats {
    generated_total: AtomicU64,
    generated_news: AtomicU64,
    renders: AtomicU64,
    cache_hits: AtomicU64,
    failures: AtomicU64,
}

/// Point-in-time copy of [`GenerationStats`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Artifacts generated and published (cache misses that succeeded).
    pub generated_total: u64,
    pub generated_news: u64,
    /// Template renders started, including ones that later failed.
    pub renders: u64,
    pub cache_hits: u64,
    pub failures: u64,
}

impl GenerationStats {
    pub(crate) fn record_generated(&self, content_type: ContentType) {
        let total = self.generated_total.fetch_add(1, Ordering::Relaxed) + 1;
        let per_type = match content_type {
            ContentType::News => self.generated_news.fetch_add(1, Ordering::Relaxed) + 1,
        };
        tracing::info!(
            og_image_tasks_total = total,
            per_type,
            content_type = %content_type,
            "generation counters"
        );
    }

    pub(crate) fn record_render(&self) {
        self.renders.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Copy the counters.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            generated_total: self.generated_total.load(Ordering::Relaxed),
            generated_news: self.generated_news.load(Ordering::Relaxed),
            renders: self.renders.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }
}
