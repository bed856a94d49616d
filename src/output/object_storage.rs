use std::{collections::HashMap, path::Path, sync::Arc, time::Duration};

use parking_lot::Mutex;
use percent_encoding::utf8_percent_encode;

use crate::{
    config::ObjectStorageConfig,
    content::CacheKey,
    foundation::error::{OgError, OgResult},
    output::{
        ArtifactLocation, OutputCache, PUBLISHED_CACHE_CONTROL,
        sigv4::{EMPTY_PAYLOAD_SHA256, SigV4Signer, UNRESERVED, payload_sha256},
    },
    render::encode::OutputFormat,
};

/// Minimal object-store surface the output cache needs.
pub trait ObjectStore: Send + Sync {
    /// `true` when `object_key` exists. Metadata only; the body is not fetched.
    fn head(&self, object_key: &str) -> OgResult<bool>;

    /// Store `body` under `object_key`.
    fn put(
        &self,
        object_key: &str,
        body: Vec<u8>,
        content_type: &str,
        cache_control: &str,
    ) -> OgResult<()>;
}

/// S3-compatible store spoken to with plain HTTP `HEAD`/`PUT` on `{endpoint}{key}`.
///
/// Keys are percent-encoded as a single path segment. Requests are SigV4-signed when a
/// [`SigV4Signer`] is attached; otherwise the optional bearer token is sent.
#[derive(Clone, Debug)]
pub struct HttpObjectStore {
    client: reqwest::blocking::Client,
    endpoint: String,
    auth_token: Option<String>,
    signer: Option<SigV4Signer>,
}

impl HttpObjectStore {
    /// Store at `endpoint` (a trailing `/` is added when missing).
    pub fn new(endpoint: impl Into<String>, auth_token: Option<String>, timeout: Duration) -> OgResult<Self> {
        let mut endpoint = endpoint.into();
        if !endpoint.ends_with('/') {
            endpoint.push('/');
        }
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| OgError::configuration(format!("build object storage client: {e}")))?;
        Ok(Self {
            client,
            endpoint,
            auth_token,
            signer: None,
        })
    }

    /// Sign every request with `signer`.
    pub fn with_signer(mut self, signer: SigV4Signer) -> Self {
        self.signer = Some(signer);
        self
    }

    /// Store configured from [`ObjectStorageConfig`].
    ///
    /// The default AWS endpoint only accepts signed requests, so it requires credentials. An
    /// explicit `endpoint` may go unsigned (a proxy, or a bucket policy that allows it).
    pub fn from_config(cfg: &ObjectStorageConfig, timeout: Duration) -> OgResult<Self> {
        let store = Self::new(cfg.resolved_endpoint(), cfg.auth_token.clone(), timeout)?;
        match cfg.credentials() {
            Some(creds) => Ok(store.with_signer(SigV4Signer::s3(creds, cfg.region.clone()))),
            None if cfg.endpoint.is_none() => Err(OgError::configuration(format!(
                "object storage at '{}' needs AWS_ACCESS_KEY_ID and AWS_SECRET_ACCESS_KEY",
                cfg.resolved_endpoint()
            ))),
            None => Ok(store),
        }
    }

    fn url(&self, object_key: &str) -> OgResult<reqwest::Url> {
        let raw = format!("{}{}", self.endpoint, encode_segment(object_key));
        reqwest::Url::parse(&raw)
            .map_err(|e| OgError::configuration(format!("object storage url '{raw}': {e}")))
    }

    fn authorized(
        &self,
        req: reqwest::blocking::RequestBuilder,
        method: &str,
        url: &reqwest::Url,
        signed_headers: &[(&str, &str)],
        payload_sha256: &str,
    ) -> OgResult<reqwest::blocking::RequestBuilder> {
        if let Some(signer) = &self.signer {
            let mut req = req;
            for (name, value) in signer.sign(method, url, signed_headers, payload_sha256)? {
                req = req.header(name, value);
            }
            return Ok(req);
        }
        Ok(match &self.auth_token {
            Some(token) => req.bearer_auth(token),
            None => req,
        })
    }
}

impl ObjectStore for HttpObjectStore {
    fn head(&self, object_key: &str) -> OgResult<bool> {
        let url = self.url(object_key)?;
        let response = self
            .authorized(self.client.head(url.clone()), "HEAD", &url, &[], EMPTY_PAYLOAD_SHA256)?
            .send()
            .map_err(|e| OgError::upstream(format!("HEAD {url}: {e}")))?;
        let status = response.status();
        if status.is_success() {
            Ok(true)
        } else if status == reqwest::StatusCode::NOT_FOUND {
            Ok(false)
        } else {
            Err(OgError::upstream(format!("HEAD {url}: status {status}")))
        }
    }

    fn put(
        &self,
        object_key: &str,
        body: Vec<u8>,
        content_type: &str,
        cache_control: &str,
    ) -> OgResult<()> {
        let url = self.url(object_key)?;
        let headers = [("cache-control", cache_control), ("content-type", content_type)];
        let mut req = self.client.put(url.clone());
        for (name, value) in headers {
            req = req.header(name, value);
        }
        let response = self
            .authorized(req, "PUT", &url, &headers, &payload_sha256(&body))?
            .body(body)
            .send()
            .map_err(|e| OgError::persistence(format!("PUT {url}: {e}")))?;
        let status = response.status();
        if !status.is_success() {
            return Err(OgError::persistence(format!("PUT {url}: status {status}")));
        }
        Ok(())
    }
}

/// `key` as one URL path segment: `/`, `#`, `?` and every other reserved byte are escaped.
pub fn encode_segment(key: &str) -> String {
    utf8_percent_encode(key, UNRESERVED).to_string()
}

/// One object held by [`InMemoryObjectStore`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredObject {
    pub body: Vec<u8>,
    pub content_type: String,
    pub cache_control: String,
}

/// Process-local [`ObjectStore`], for tests and offline runs.
#[derive(Debug, Default)]
pub struct InMemoryObjectStore {
    objects: Mutex<HashMap<String, StoredObject>>,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the object under `object_key`.
    pub fn get(&self, object_key: &str) -> Option<StoredObject> {
        self.objects.lock().get(object_key).cloned()
    }

    pub fn len(&self) -> usize {
        self.objects.lock().len()
    }

    /// `true` when nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.objects.lock().is_empty()
    }
}

impl ObjectStore for InMemoryObjectStore {
    fn head(&self, object_key: &str) -> OgResult<bool> {
        Ok(self.objects.lock().contains_key(object_key))
    }

    fn put(
        &self,
        object_key: &str,
        body: Vec<u8>,
        content_type: &str,
        cache_control: &str,
    ) -> OgResult<()> {
        self.objects.lock().insert(
            object_key.to_string(),
            StoredObject {
                body,
                content_type: content_type.to_string(),
                cache_control: cache_control.to_string(),
            },
        );
        Ok(())
    }
}

/// Artifacts published to an object store and served from a public base URL.
///
/// Lookup only checks existence; object age is not checked against any TTL.
pub struct ObjectStorageCache {
    store: Arc<dyn ObjectStore>,
    public_base_url: String,
    format: OutputFormat,
}

impl std::fmt::Debug for ObjectStorageCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectStorageCache")
            .field("public_base_url", &self.public_base_url)
            .field("format", &self.format)
            .finish_non_exhaustive()
    }
}

impl ObjectStorageCache {
    /// Cache over `store`, building URLs as `{public_base_url}{key}.{ext}`.
    pub fn new(store: Arc<dyn ObjectStore>, public_base_url: impl Into<String>, format: OutputFormat) -> Self {
        let mut public_base_url = public_base_url.into();
        if !public_base_url.ends_with('/') {
            public_base_url.push('/');
        }
        Self {
            store,
            public_base_url,
            format,
        }
    }

    /// Public URL for `key`, with the object name encoded like the storage request path.
    pub fn public_url(&self, key: &CacheKey) -> String {
        format!(
            "{}{}",
            self.public_base_url,
            encode_segment(&key.file_name(self.format))
        )
    }
}

impl OutputCache for ObjectStorageCache {
    fn name(&self) -> &'static str {
        "object-storage"
    }

    fn lookup(&self, key: &CacheKey) -> OgResult<Option<ArtifactLocation>> {
        let object_key = key.file_name(self.format);
        match self.store.head(&object_key) {
            Ok(true) => {
                tracing::debug!(cache_key = %key, "object storage hit");
                Ok(Some(ArtifactLocation::Remote(self.public_url(key))))
            }
            Ok(false) => Ok(None),
            Err(err) => {
                tracing::warn!(cache_key = %key, error = %err, "object storage HEAD failed, treating as miss");
                Ok(None)
            }
        }
    }

    fn publish(&self, path: &Path, key: &CacheKey) -> OgResult<Option<ArtifactLocation>> {
        let body = std::fs::read(path)
            .map_err(|e| OgError::persistence(format!("read '{}': {e}", path.display())))?;
        let object_key = key.file_name(self.format);
        self.store.put(
            &object_key,
            body,
            self.format.content_type(),
            PUBLISHED_CACHE_CONTROL,
        )?;
        let url = self.public_url(key);
        tracing::info!(cache_key = %key, url = %url, "published artifact");
        Ok(Some(ArtifactLocation::Remote(url)))
    }

    fn clear(&self) -> OgResult<usize> {
        tracing::warn!("clearing object storage is not supported; nothing removed");
        Ok(0)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/output/object_storage.rs"]
mod tests;
