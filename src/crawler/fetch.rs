//! HTTP fetching for the crawler module
//!
//! One GET per page, with a timeout and no retries. Bodies are decoded using
//! the charset declared in `Content-Type`, falling back to lossy UTF-8.

use reqwest::Client as ReqwestClient;
use tracing::{debug, instrument, warn};

use crate::crawler::CrawlerConfig;
use crate::crawler::error::CrawlError;

/// HTTP client for fetching documentation pages
#[derive(Clone, Debug)]
pub struct PageFetcher {
    /// The underlying reqwest client
    client: ReqwestClient,
}

impl PageFetcher {
    /// Create a fetcher using the timeout and user agent from the crawler config
    pub fn new(config: &CrawlerConfig) -> Result<Self, CrawlError> {
        let client = ReqwestClient::builder()
            .timeout(config.request_timeout())
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self { client })
    }

    /// Fetch a page and return its body as text
    #[instrument(skip(self), level = "debug")]
    pub async fn fetch(&self, url: &str) -> Result<String, CrawlError> {
        debug!("Sending GET request to {}", url);
        let response = self.client.get(url).send().await.map_err(map_send_error)?;

        let status = response.status();
        if !status.is_success() {
            warn!("HTTP {} for {}", status, url);
            return Err(CrawlError::Status {
                url: url.to_string(),
                status_code: status.as_u16(),
            });
        }

        response.text().await.map_err(map_send_error)
    }
}

fn map_send_error(err: reqwest::Error) -> CrawlError {
    if err.is_timeout() {
        CrawlError::Timeout(err.to_string())
    } else {
        CrawlError::Http(err)
    }
}
