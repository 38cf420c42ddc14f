use crate::types::{AggregatorError, FetchConfig, Result};
use reqwest::Client;
use std::time::Instant;
use tracing::{debug, error, info};

/// Single-shot HTTP GET with a fixed user agent and timeout. No retries.
#[derive(Clone)]
pub struct Fetcher {
    client: Client,
    config: FetchConfig,
}

impl Fetcher {
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .build()?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Fetch `url` and return its body, or the reason it could not be fetched.
    pub async fn fetch(&self, url: &str) -> Result<String> {
        let start_time = Instant::now();
        debug!(%url, "Fetching page");

        let mut response = self.client.get(url).send().await?;
        let status = response.status();

        if !status.is_success() {
            return Err(AggregatorError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let limit = self.config.max_body_bytes;
        if let Some(content_length) = response.content_length() {
            if content_length as usize > limit {
                return Err(AggregatorError::BodyTooLarge { url: url.to_string(), limit });
            }
        }

        // Content-Length is absent on chunked responses, so stop reading once over the cap
        let mut bytes = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            if bytes.len() + chunk.len() > limit {
                return Err(AggregatorError::BodyTooLarge { url: url.to_string(), limit });
            }
            bytes.extend_from_slice(&chunk);
        }
        let body = String::from_utf8_lossy(&bytes).into_owned();

        info!(
            %url,
            bytes = body.len(),
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            "Fetched page"
        );
        Ok(body)
    }

    /// Fetch `url`, logging any failure and yielding no content.
    pub async fn fetch_html(&self, url: &str) -> Option<String> {
        match self.fetch(url).await {
            Ok(body) => Some(body),
            Err(e) => {
                error!(%url, error = %e, "Error fetching page");
                None
            }
        }
    }
}
