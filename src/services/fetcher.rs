use std::time::Duration;

use reqwest::Client;
use thiserror::Error;

use crate::config::Config;

/// Failure while retrieving an upstream document.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("upstream returned HTTP {0}")]
    Status(reqwest::StatusCode),
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

/// HTTP fetcher shared by the catalog and EPG caches and the stream gateway.
///
/// Two clients: a timed one for playlist/guide documents, and one without an
/// overall request timeout for proxied media, where the response body stays
/// open for the duration of upstream delivery.
#[derive(Clone)]
pub struct Fetcher {
    client: Client,
    stream_client: Client,
}

impl Fetcher {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_millis(config.fetch_timeout_ms))
            .redirect(reqwest::redirect::Policy::limited(10))
            .gzip(true)
            .build()?;

        let stream_client = Client::builder()
            .user_agent(&config.user_agent)
            .connect_timeout(Duration::from_millis(config.fetch_timeout_ms))
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;

        Ok(Self {
            client,
            stream_client,
        })
    }

    /// Fetch a URL's body as text, following redirects. Non-2xx responses
    /// and transport failures both surface as errors.
    pub async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }
        Ok(response.text().await?)
    }

    /// Client used for long-lived proxied media connections.
    pub fn stream_client(&self) -> &Client {
        &self.stream_client
    }
}
