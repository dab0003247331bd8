use tracing::warn;

use crate::catalog::Dataset;
use crate::config::SourceConfig;
use crate::error::{Error, Result};

/// Loads dataset documents over plain HTTP. Each source publishes a small
/// "latest" document for a fast first paint and a full "complete" one;
/// startup tries latest first and falls back to complete.
#[derive(Clone)]
pub struct Fetcher {
    client: reqwest::Client,
}

impl Fetcher {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    async fn fetch_document(&self, url: &str) -> Result<Dataset> {
        let response = self.client.get(url).send().await?;
        let response = response.error_for_status()?;
        let text = response.text().await?;
        Dataset::parse(&text)
    }

    /// Fast initial load: latest document, complete as fallback. A double
    /// failure is terminal for this source and surfaces on the status line.
    pub async fn fetch_initial(&self, source: &SourceConfig) -> Result<Dataset> {
        match self.fetch_document(&source.latest_url).await {
            Ok(dataset) => Ok(dataset),
            Err(e) => {
                warn!(source = %source.name, error = %e, "Latest document failed, falling back to complete");
                self.fetch_document(&source.complete_url)
                    .await
                    .map_err(|_| Error::DatasetUnavailable(source.name.clone()))
            }
        }
    }

    /// Background load of the full document. Failures here are logged by
    /// the caller and never shown to the user.
    pub async fn fetch_complete(&self, source: &SourceConfig) -> Result<Dataset> {
        self.fetch_document(&source.complete_url).await
    }
}

impl Default for Fetcher {
    fn default() -> Self {
        Self::new()
    }
}
