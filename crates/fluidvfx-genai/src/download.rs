//! Persist generated videos to disk.

use std::path::Path;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::Client;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

use crate::config::GenAiConfig;
use crate::error::{GenError, GenResult, UpstreamFailure};
use crate::metrics;
use crate::reference::VideoReference;

/// Streams a [`VideoReference`] into a local file.
pub struct VideoDownloader {
    http: Client,
}

impl VideoDownloader {
    /// Create a downloader.
    ///
    /// `timeout` bounds connecting and each read of the body, not the whole
    /// transfer, so large videos on slow links still complete.
    pub fn new(timeout: Duration) -> GenResult<Self> {
        let http = Client::builder()
            .connect_timeout(timeout)
            .read_timeout(timeout)
            .build()
            .map_err(|e| GenError::config_error(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { http })
    }

    /// Create a downloader using the configured request timeout as the
    /// per-read limit.
    pub fn from_config(config: &GenAiConfig) -> GenResult<Self> {
        Self::new(config.request_timeout)
    }

    /// Download `reference` to `destination`, creating parent directories.
    ///
    /// Returns the number of bytes written.
    pub async fn download(&self, reference: &VideoReference, destination: &Path) -> GenResult<u64> {
        match self.fetch_to_file(reference, destination).await {
            Ok(bytes) => {
                metrics::record_download("success", bytes);
                info!(
                    reference = %reference.redacted(),
                    path = %destination.display(),
                    bytes,
                    "Video downloaded"
                );
                Ok(bytes)
            }
            Err(e) => {
                metrics::record_download(e.kind().as_str(), 0);
                warn!(reference = %reference.redacted(), error = %e, "Video download failed");
                Err(e)
            }
        }
    }

    async fn fetch_to_file(&self, reference: &VideoReference, destination: &Path) -> GenResult<u64> {
        let response = self.http.get(reference.as_str()).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenError::Upstream(UpstreamFailure {
                status_code: Some(status.as_u16()),
                rpc_code: None,
                status: None,
                reason: None,
                message: format!("Video download returned {}: {}", status, body),
            }));
        }

        if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut file = tokio::fs::File::create(destination).await?;
        let written = async {
            let mut stream = response.bytes_stream();
            let mut written: u64 = 0;
            while let Some(chunk) = stream.next().await {
                let chunk = chunk?;
                file.write_all(&chunk).await?;
                written += chunk.len() as u64;
            }
            file.flush().await?;
            Ok::<u64, GenError>(written)
        }
        .await;

        if written.is_err() {
            // Remove the partial file.
            let _ = tokio::fs::remove_file(destination).await;
        }
        written
    }
}
