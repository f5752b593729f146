use async_trait::async_trait;
use reqwest::{header, Client};

use crate::config::ScraperConfig;
use crate::error::{NetworkErrorKind, ScrapeError};

/// Source of raw page bodies. The orchestrator only talks to the network through this.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, ScrapeError>;
}

/// `reqwest`-backed fetcher sending a fixed User-Agent with a per-request timeout.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(cfg: &ScraperConfig) -> Result<Self, ScrapeError> {
        let client = Client::builder()
            .user_agent(cfg.user_agent.clone())
            .timeout(cfg.timeout)
            .build()
            .map_err(|e| ScrapeError::Client(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, ScrapeError> {
        let resp = self
            .client
            .get(url)
            .header(header::ACCEPT, "text/html,*/*")
            .send()
            .await
            .map_err(|e| ScrapeError::from_reqwest(url, &e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ScrapeError::network(
                url,
                NetworkErrorKind::Status(status.as_u16()),
            ));
        }

        resp.text()
            .await
            .map_err(|e| ScrapeError::from_reqwest(url, &e))
    }
}
