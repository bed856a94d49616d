//! Startup configuration.
//!
//! Every field has a default. A [`ServiceConfig`] is built once at process start, optionally
//! from a JSON file, then overlaid with environment variables. There is no hot reload.

use std::{
    collections::BTreeMap,
    fmt::Display,
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::{
    foundation::error::{OgError, OgResult},
    output::sigv4::AwsCredentials,
    render::encode::OutputFormat,
};

/// Output-cache backend selected at construction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CacheStrategy {
    /// Every lookup misses; publish is a no-op.
    Disabled,
    /// Rendered files under the generated directory, fresh while younger than the TTL.
    #[default]
    Disk,
    /// Objects in an S3-compatible bucket, served from a public base URL.
    ObjectStorage,
}

impl FromStr for CacheStrategy {
    type Err = OgError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "disabled" | "none" => Ok(Self::Disabled),
            "disk" => Ok(Self::Disk),
            "object-storage" | "s3" => Ok(Self::ObjectStorage),
            other => Err(OgError::configuration(format!(
                "unknown cache strategy '{other}'"
            ))),
        }
    }
}

/// Output canvas size and the reference template size that drawing constants are authored in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Width of the full-size reference template.
    pub reference_width: u32,
    /// Height of the full-size reference template; the scale factor is `height / reference_height`.
    pub reference_height: u32,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: 2280,
            height: 1200,
            reference_width: 15001,
            reference_height: 7875,
        }
    }
}

/// Font files, relative to the asset root.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontConfig {
    /// Title face.
    pub bold: String,
    /// Brand label face.
    pub medium: String,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            bold: "SourceSans3-Bold.ttf".to_string(),
            medium: "SourceSans3-Medium.ttf".to_string(),
        }
    }
}

/// Object-storage output cache settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectStorageConfig {
    pub bucket: String,
    pub region: String,
    /// API endpoint used for HEAD/PUT; defaults to the public base URL.
    pub endpoint: Option<String>,
    /// Base URL that published objects are served from.
    pub public_base_url: Option<String>,
    /// Bearer token for proxies in front of the bucket; ignored when AWS credentials are set.
    pub auth_token: Option<String>,
    /// AWS access key id; with `secret_access_key`, requests are SigV4-signed.
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    /// Temporary-credential session token.
    pub session_token: Option<String>,
}

impl Default for ObjectStorageConfig {
    fn default() -> Self {
        Self {
            bucket: String::new(),
            region: "ap-south-1".to_string(),
            endpoint: None,
            public_base_url: None,
            auth_token: None,
            access_key_id: None,
            secret_access_key: None,
            session_token: None,
        }
    }
}

impl ObjectStorageConfig {
    /// Signing credentials, when both the key id and the secret are configured.
    pub fn credentials(&self) -> Option<AwsCredentials> {
        match (&self.access_key_id, &self.secret_access_key) {
            (Some(id), Some(secret)) => Some(AwsCredentials {
                access_key_id: id.clone(),
                secret_access_key: secret.clone(),
                session_token: self.session_token.clone(),
            }),
            _ => None,
        }
    }

    /// Public base URL, always ending in `/`.
    pub fn resolved_public_base_url(&self) -> String {
        let base = match &self.public_base_url {
            Some(url) => url.clone(),
            None => format!("https://{}.s3.{}.amazonaws.com/", self.bucket, self.region),
        };
        with_trailing_slash(base)
    }

    /// Endpoint used for storage requests, always ending in `/`.
    pub fn resolved_endpoint(&self) -> String {
        match &self.endpoint {
            Some(url) => with_trailing_slash(url.clone()),
            None => self.resolved_public_base_url(),
        }
    }
}

fn with_trailing_slash(mut url: String) -> String {
    if !url.ends_with('/') {
        url.push('/');
    }
    url
}

/// Complete service configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Directory holding template images and fonts. Must exist.
    pub assets_dir: PathBuf,
    /// Directory rendered artifacts are written to.
    pub generated_dir: PathBuf,
    /// Output-cache backend.
    pub cache_strategy: CacheStrategy,
    /// Age after which cached assets and disk artifacts are stale.
    pub cache_ttl_secs: u64,
    /// Maximum entries per asset-cache namespace.
    pub asset_cache_capacity: usize,
    /// Period of the asset-cache sweep task.
    pub asset_sweep_interval_secs: u64,
    /// Encoded output format.
    pub output_format: OutputFormat,
    /// Lossy encoder quality, 0..=100.
    pub output_quality: u8,
    /// WebP compression effort (method), 0..=6.
    pub compression_effort: u8,
    /// Timeout for background photo downloads.
    pub fetch_timeout_secs: u64,
    /// Downloaded photos larger than this in either dimension are downscaled first.
    pub max_background_px: u32,
    pub canvas: CanvasConfig,
    pub fonts: FontConfig,
    /// Title used when a record has none.
    pub default_title: String,
    /// Template images by asset id (`news`) or id plus variant (`idea_3`).
    pub templates: BTreeMap<String, String>,
    /// Object storage settings, used with [`CacheStrategy::ObjectStorage`].
    pub object_storage: ObjectStorageConfig,
    /// Slack-compatible webhook for operational alerts.
    pub alert_webhook: Option<String>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            assets_dir: PathBuf::from("assets"),
            generated_dir: PathBuf::from("generated"),
            cache_strategy: CacheStrategy::Disk,
            cache_ttl_secs: 120,
            asset_cache_capacity: 5,
            asset_sweep_interval_secs: 30,
            output_format: OutputFormat::Webp,
            output_quality: 40,
            compression_effort: 6,
            fetch_timeout_secs: 5,
            max_background_px: 800,
            canvas: CanvasConfig::default(),
            fonts: FontConfig::default(),
            default_title: "Read the latest news".to_string(),
            templates: BTreeMap::new(),
            object_storage: ObjectStorageConfig::default(),
            alert_webhook: None,
        }
    }
}

impl ServiceConfig {
    /// Load a JSON config file; missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> OgResult<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read config '{}'", path.display()))
            .map_err(|e| OgError::configuration(format!("{e:#}")))?;
        serde_json::from_str(&raw).map_err(|e| {
            OgError::configuration(format!("parse config '{}': {e}", path.display()))
        })
    }

    /// Defaults overlaid with process environment variables.
    pub fn from_env() -> OgResult<Self> {
        Self::default().overlay_env(|key| std::env::var(key).ok())
    }

    /// Overlay values returned by `lookup` for the known environment keys.
    pub fn overlay_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> OgResult<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("OGCARD_ASSETS_DIR") {
            self.assets_dir = PathBuf::from(v);
        }
        if let Some(v) = get("OGCARD_GENERATED_DIR") {
            self.generated_dir = PathBuf::from(v);
        }
        if let Some(v) = get("OGCARD_CACHE_STRATEGY") {
            self.cache_strategy = v.parse()?;
        }
        if let Some(v) = get("OGCARD_CACHE_TTL_SECS") {
            self.cache_ttl_secs = parse_env("OGCARD_CACHE_TTL_SECS", &v)?;
        }
        if let Some(v) = get("OGCARD_ASSET_CACHE_CAPACITY") {
            self.asset_cache_capacity = parse_env("OGCARD_ASSET_CACHE_CAPACITY", &v)?;
        }
        if let Some(v) = get("OGCARD_ASSET_SWEEP_INTERVAL_SECS") {
            self.asset_sweep_interval_secs = parse_env("OGCARD_ASSET_SWEEP_INTERVAL_SECS", &v)?;
        }
        if let Some(v) = get("OGCARD_OUTPUT_FORMAT") {
            self.output_format = v.parse()?;
        }
        if let Some(v) = get("OGCARD_OUTPUT_QUALITY") {
            self.output_quality = parse_env("OGCARD_OUTPUT_QUALITY", &v)?;
        }
        if let Some(v) = get("OGCARD_COMPRESSION_EFFORT") {
            self.compression_effort = parse_env("OGCARD_COMPRESSION_EFFORT", &v)?;
        }
        if let Some(v) = get("OGCARD_FETCH_TIMEOUT_SECS") {
            self.fetch_timeout_secs = parse_env("OGCARD_FETCH_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = get("AWS_S3_BUCKET") {
            self.object_storage.bucket = v;
        }
        if let Some(v) = get("AWS_REGION") {
            self.object_storage.region = v;
        }
        if let Some(v) = get("OGCARD_S3_ENDPOINT") {
            self.object_storage.endpoint = Some(v);
        }
        if let Some(v) = get("OGCARD_PUBLIC_BASE_URL") {
            self.object_storage.public_base_url = Some(v);
        }
        if let Some(v) = get("OGCARD_S3_AUTH_TOKEN") {
            self.object_storage.auth_token = Some(v);
        }
        if let Some(v) = get("AWS_ACCESS_KEY_ID") {
            self.object_storage.access_key_id = Some(v);
        }
        if let Some(v) = get("AWS_SECRET_ACCESS_KEY") {
            self.object_storage.secret_access_key = Some(v);
        }
        if let Some(v) = get("AWS_SESSION_TOKEN") {
            self.object_storage.session_token = Some(v);
        }
        if let Some(v) = get("SLACK_WEBHOOK_URL") {
            self.alert_webhook = Some(v);
        }

        Ok(self)
    }

    /// Reject values the pipeline cannot work with.
    pub fn validate(&self) -> OgResult<()> {
        if self.asset_cache_capacity == 0 {
            return Err(OgError::configuration("asset_cache_capacity must be > 0"));
        }
        if self.canvas.width == 0 || self.canvas.height == 0 {
            return Err(OgError::configuration("canvas size must be non-zero"));
        }
        if self.canvas.width > u32::from(u16::MAX) || self.canvas.height > u32::from(u16::MAX) {
            return Err(OgError::configuration("canvas size must fit in u16"));
        }
        if self.canvas.reference_height == 0 {
            return Err(OgError::configuration("canvas reference_height must be > 0"));
        }
        if self.output_quality > 100 {
            return Err(OgError::configuration("output_quality must be <= 100"));
        }
        if self.compression_effort > 6 {
            return Err(OgError::configuration("compression_effort must be <= 6"));
        }
        if self.cache_strategy == CacheStrategy::ObjectStorage
            && self.object_storage.bucket.is_empty()
            && self.object_storage.public_base_url.is_none()
        {
            return Err(OgError::configuration(
                "object-storage cache needs a bucket or public_base_url",
            ));
        }
        Ok(())
    }

    /// [`Self::cache_ttl_secs`] as a duration.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// [`Self::asset_sweep_interval_secs`] as a duration.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.asset_sweep_interval_secs)
    }

    /// [`Self::fetch_timeout_secs`] as a duration.
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

fn parse_env<T>(key: &str, raw: &str) -> OgResult<T>
where
    T: FromStr,
    T::Err: Display,
{
    raw.trim()
        .parse()
        .map_err(|e| OgError::configuration(format!("invalid {key}='{raw}': {e}")))
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
