#![forbid(unsafe_code)]
//! On-demand Open Graph preview images.
//!
//! A [`RenderOrchestrator`] derives a [`CacheKey`] from a content record, answers from an
//! [`OutputCache`] when it can, and otherwise renders the record through a [`Template`] that
//! draws with fonts and template images held in the [`AssetCache`].

pub mod app;
pub mod assets;
pub mod collab;
pub mod config;
pub mod content;
mod foundation;
pub mod output;
pub mod render;
pub mod service;
pub mod template;

pub use app::App;
pub use assets::cache::{AssetCache, AssetCacheOpts, AssetCacheStats};
pub use assets::font::FontHandle;
pub use collab::content_store::{ContentStore, InMemoryContentStore, JsonDirContentStore};
pub use collab::notify::{Alert, Notifier, Severity, SlackNotifier, TracingNotifier};
pub use config::{CacheStrategy, ServiceConfig};
pub use content::{CacheKey, ContentData, ContentType, NewsRecord};
pub use foundation::clock::{Clock, ManualClock, SystemClock};
pub use foundation::error::{OgError, OgResult};
pub use output::{ArtifactLocation, OutputCache};
pub use render::canvas::Canvas;
pub use render::encode::{EncodeOpts, OutputFormat};
pub use service::orchestrator::RenderOrchestrator;
pub use service::preview::news_preview;
pub use service::stats::StatsSnapshot;
pub use template::factory::{TemplateFactory, TemplateProvider, TemplateSettings};
pub use template::{RenderState, Template, TemplateBase};
