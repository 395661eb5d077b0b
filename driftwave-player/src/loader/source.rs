//! Byte sources for asset acquisition

use driftwave_common::{Error, Result};
use std::path::PathBuf;
use tracing::debug;

/// Acquires the raw bytes of an asset
#[allow(async_fn_in_trait)]
pub trait ByteSource {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Local filesystem source; accepts plain paths and `file://` URLs
#[derive(Debug, Clone, Default)]
pub struct FileSource {
    base_dir: Option<PathBuf>,
}

impl FileSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative paths against `base_dir`
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: Some(base_dir.into()),
        }
    }

    fn resolve(&self, url: &str) -> PathBuf {
        let path = PathBuf::from(url.strip_prefix("file://").unwrap_or(url));
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path,
        }
    }
}

impl ByteSource for FileSource {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let path = self.resolve(url);
        debug!("Reading {}", path.display());
        tokio::fs::read(&path)
            .await
            .map_err(|e| Error::fetch(url, e))
    }
}

/// HTTP(S) source backed by reqwest
#[derive(Debug, Clone, Default)]
pub struct HttpSource {
    client: reqwest::Client,
}

impl HttpSource {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ByteSource for HttpSource {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::fetch(url, e))?
            .error_for_status()
            .map_err(|e| Error::fetch(url, e))?;
        let body = response.bytes().await.map_err(|e| Error::fetch(url, e))?;
        Ok(body.to_vec())
    }
}

/// Dispatches `http://`/`https://` URLs to [`HttpSource`], everything else to
/// [`FileSource`]
#[derive(Debug, Clone, Default)]
pub struct AutoSource {
    file: FileSource,
    http: HttpSource,
}

impl AutoSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file_source(file: FileSource) -> Self {
        Self {
            file,
            http: HttpSource::default(),
        }
    }
}

/// Whether `url` names a network resource
pub fn is_http_url(url: &str) -> bool {
    let lower = url.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

impl ByteSource for AutoSource {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        if url.trim().is_empty() {
            return Err(Error::fetch(url, "empty asset location"));
        }
        if is_http_url(url) {
            self.http.fetch(url).await
        } else {
            self.file.fetch(url).await
        }
    }
}
