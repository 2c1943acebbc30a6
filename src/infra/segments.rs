//! Segment sources backed by HTTP and the local filesystem.

use std::path::PathBuf;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;
use url::Url;

use crate::{
    application::segments::{FetchError, SegmentSource},
    config::FetchSettings,
    domain::segments::Segment,
    infra::error::InfraError,
};

/// Fetches the segment JSON array over HTTP(S).
#[derive(Debug, Clone)]
pub struct HttpSegmentSource {
    client: Client,
}

impl HttpSegmentSource {
    pub fn new(settings: &FetchSettings) -> Result<Self, InfraError> {
        let client = Client::builder()
            .user_agent(settings.user_agent.as_str())
            .timeout(settings.timeout)
            .build()
            .map_err(|err| {
                InfraError::configuration(format!("failed to build http client: {err}"))
            })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl SegmentSource for HttpSegmentSource {
    async fn fetch(&self, location: &str) -> Result<Vec<Segment>, FetchError> {
        let url = Url::parse(location).map_err(|_| FetchError::Location(location.to_string()))?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(FetchError::transport)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                location: location.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(FetchError::transport)?;
        debug!(
            op = "segments::fetch_http",
            location,
            bytes = body.len(),
            "Fetched segment payload"
        );
        Ok(serde_json::from_slice(&body)?)
    }
}

/// Reads the segment JSON array from disk. Accepts plain paths and `file://` URLs.
#[derive(Debug, Clone, Default)]
pub struct FileSegmentSource {
    root: Option<PathBuf>,
}

impl FileSegmentSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative locations against `root`.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    fn resolve(&self, location: &str) -> Result<PathBuf, FetchError> {
        let path = match location.strip_prefix("file://") {
            Some(rest) => PathBuf::from(rest),
            None => PathBuf::from(location),
        };
        if path.as_os_str().is_empty() {
            return Err(FetchError::Location(location.to_string()));
        }
        Ok(match &self.root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path,
        })
    }
}

#[async_trait]
impl SegmentSource for FileSegmentSource {
    async fn fetch(&self, location: &str) -> Result<Vec<Segment>, FetchError> {
        let path = self.resolve(location)?;
        let body = tokio::fs::read(&path).await?;
        debug!(
            op = "segments::fetch_file",
            path = %path.display(),
            bytes = body.len(),
            "Read segment payload"
        );
        Ok(serde_json::from_slice(&body)?)
    }
}

/// Picks the HTTP source for `http(s)://` locations and the file source otherwise.
#[derive(Debug, Clone)]
pub struct RoutedSegmentSource {
    http: HttpSegmentSource,
    file: FileSegmentSource,
}

impl RoutedSegmentSource {
    pub fn new(settings: &FetchSettings) -> Result<Self, InfraError> {
        Ok(Self {
            http: HttpSegmentSource::new(settings)?,
            file: FileSegmentSource::new(),
        })
    }
}

fn is_http_location(location: &str) -> bool {
    let scheme = location
        .split_once("://")
        .map(|(scheme, _)| scheme.to_ascii_lowercase());
    matches!(scheme.as_deref(), Some("http" | "https"))
}

#[async_trait]
impl SegmentSource for RoutedSegmentSource {
    async fn fetch(&self, location: &str) -> Result<Vec<Segment>, FetchError> {
        if is_http_location(location) {
            self.http.fetch(location).await
        } else {
            self.file.fetch(location).await
        }
    }
}
