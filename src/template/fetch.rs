use std::time::Duration;

use crate::foundation::error::{OgError, OgResult};

/// Downloads background photos for templates.
pub trait PhotoFetcher: Send + Sync {
    /// Body of `url`. Any transport error or non-success status is [`OgError::Upstream`].
    fn fetch(&self, url: &str) -> OgResult<Vec<u8>>;
}

/// Blocking HTTP fetcher with a bounded per-request timeout.
#[derive(Clone, Debug)]
pub struct HttpPhotoFetcher {
    client: reqwest::blocking::Client,
}

impl HttpPhotoFetcher {
    /// Build a client whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> OgResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| OgError::configuration(format!("build http client: {e}")))?;
        Ok(Self { client })
    }
}

impl PhotoFetcher for HttpPhotoFetcher {
    fn fetch(&self, url: &str) -> OgResult<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| OgError::upstream(format!("GET {url}: {e}")))?;
        let status = response.status();
        if !status.is_success() {
            return Err(OgError::upstream(format!("GET {url}: status {status}")));
        }
        let body = response
            .bytes()
            .map_err(|e| OgError::upstream(format!("read body of {url}: {e}")))?;
        Ok(body.to_vec())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/template/fetch.rs"]
mod tests;
