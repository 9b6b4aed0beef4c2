//! Template asset loading
//!
//! This module handles:
//! 1. Load bookkeeping (generation, progress, last error) kept by the session
//! 2. The fetcher seam used to download and decode a model
//! 3. An HTTP fetcher that streams the file and reports byte progress

use futures_util::StreamExt;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

use crate::scene::SceneNode;

/// Largest up-front buffer reservation for a download
const MAX_PREALLOCATE: u64 = 64 * 1024 * 1024;

/// Why a single fetch attempt failed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    #[error("Load timed out after {0:?}")]
    Timeout(Duration),
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Server returned status {0}")]
    Status(u16),
    #[error("Failed to decode asset: {0}")]
    Decode(String),
}

/// Terminal load failure, reported once the default asset has also failed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Failed to load asset {url}: {source}")]
pub struct AssetLoadError {
    pub url: String,
    #[source]
    pub source: LoadError,
}

/// Byte counts reported by the transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadProgress {
    pub loaded: u64,
    pub total: Option<u64>,
}

impl LoadProgress {
    /// Percentage complete, when the total size is known
    pub fn percent(&self) -> Option<u8> {
        match self.total {
            Some(total) if total > 0 => {
                let pct = self.loaded.min(total) * 100 / total;
                Some(pct as u8)
            }
            _ => None,
        }
    }
}

/// A load attempt issued by the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    pub generation: u64,
    pub url: String,
    pub timeout: Duration,
}

/// What the session did with a finished attempt
#[derive(Debug, Clone, PartialEq)]
pub enum LoadStep {
    /// Template installed from `url`
    Installed { url: String },
    /// Attempt failed; fetch the default asset with this ticket next
    Retry(LoadTicket),
    /// Default asset failed too
    Failed(AssetLoadError),
    /// Attempt was superseded or the session has ended
    Stale,
}

/// Load state of the current template
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadStatus {
    pub generation: u64,
    pub url: Option<String>,
    /// 0-100, never decreases within one attempt
    pub progress: u8,
    pub last_error: Option<String>,
    pub pending: bool,
}

/// Downloads and decodes a model
pub trait AssetFetcher {
    fn fetch(
        &self,
        url: &str,
        progress: &dyn Fn(LoadProgress),
    ) -> impl Future<Output = Result<SceneNode, LoadError>>;
}

/// Turns downloaded bytes into a scene hierarchy (glTF/GLB parsing lives here)
pub trait SceneDecoder {
    fn decode(&self, url: &str, bytes: &[u8]) -> Result<SceneNode, LoadError>;
}

impl<F> SceneDecoder for F
where
    F: Fn(&str, &[u8]) -> Result<SceneNode, LoadError>,
{
    fn decode(&self, url: &str, bytes: &[u8]) -> Result<SceneNode, LoadError> {
        self(url, bytes)
    }
}

/// Fetches assets over HTTP(S)
pub struct HttpAssetFetcher<D> {
    client: reqwest::Client,
    decoder: D,
}

impl<D: SceneDecoder> HttpAssetFetcher<D> {
    pub fn new(decoder: D) -> Self {
        Self::with_client(reqwest::Client::new(), decoder)
    }

    /// Use a preconfigured client (proxy, headers, connect timeout)
    pub fn with_client(client: reqwest::Client, decoder: D) -> Self {
        Self { client, decoder }
    }
}

impl<D: SceneDecoder> AssetFetcher for HttpAssetFetcher<D> {
    async fn fetch(
        &self,
        url: &str,
        progress: &dyn Fn(LoadProgress),
    ) -> Result<SceneNode, LoadError> {
        info!(url = %url, "Fetching asset");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| LoadError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(LoadError::Status(response.status().as_u16()));
        }

        let total = response.content_length();
        let mut bytes = Vec::with_capacity(total.unwrap_or(0).min(MAX_PREALLOCATE) as usize);
        progress(LoadProgress { loaded: 0, total });

        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| LoadError::Transport(e.to_string()))?;
            bytes.extend_from_slice(&chunk);
            progress(LoadProgress {
                loaded: bytes.len() as u64,
                total,
            });
        }

        debug!(url = %url, bytes = bytes.len(), "Asset downloaded");
        self.decoder.decode(url, &bytes)
    }
}
