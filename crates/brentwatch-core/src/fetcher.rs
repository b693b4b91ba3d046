//! Single-page fetcher for the provider's series page.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, warn};

use crate::http_client::{HttpClient, HttpRequest};
use crate::PipelineError;

/// Raw page returned by a successful fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    pub url: String,
    pub status: u16,
    pub body: String,
    pub latency_ms: u64,
}

/// Issues one GET to a fixed URL. No retry; the user-initiated reload is the
/// only recovery path.
#[derive(Clone)]
pub struct Fetcher {
    client: Arc<dyn HttpClient>,
    url: String,
}

impl Fetcher {
    pub fn new(client: Arc<dyn HttpClient>, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn fetch(&self) -> Result<FetchedPage, PipelineError> {
        let started = Instant::now();
        debug!(url = %self.url, "fetching series page");

        let response = self
            .client
            .execute(HttpRequest::get(self.url.clone()))
            .await
            .map_err(|error| {
                warn!(url = %self.url, error = %error, "transport failure");
                PipelineError::Transport {
                    url: self.url.clone(),
                    status: None,
                    message: error.message().to_owned(),
                }
            })?;
        let latency_ms = started.elapsed().as_millis() as u64;

        if !response.is_success() {
            warn!(url = %self.url, status = response.status, "non-success status");
            return Err(PipelineError::Transport {
                url: self.url.clone(),
                status: Some(response.status),
                message: format!("HTTP {}", response.status),
            });
        }

        debug!(
            url = %self.url,
            status = response.status,
            bytes = response.body.len(),
            latency_ms,
            "fetched series page"
        );
        Ok(FetchedPage {
            url: self.url.clone(),
            status: response.status,
            body: response.body,
            latency_ms,
        })
    }
}
