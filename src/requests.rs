use anyhow::Context;
use log::debug;
use reqwest::{Client, ClientBuilder, Response};

use crate::{config::ScrapingConfig, ratelimit::RateLimiter};

pub struct RequestClient {
    client: Client,
    rate_limiter: RateLimiter,
}

impl RequestClient {
    pub fn new(config: &ScrapingConfig) -> anyhow::Result<Self> {
        let client = ClientBuilder::new()
            .timeout(config.request_timeout())
            .user_agent(config.user_agent.as_str())
            .build()
            .context("failed to create HTTP client")?;
        let rate_limiter = RateLimiter::new(config.request_delay())?;
        Ok(Self {
            client,
            rate_limiter,
        })
    }

    pub async fn fetch_url_response(&self, url: &str) -> anyhow::Result<Response> {
        // Wait (non-blocking) until the courtesy delay since the previous
        // request has elapsed.
        self.rate_limiter.wait_until_ready().await;

        debug!("GET {url}");
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            anyhow::bail!("GET {} failed with status {}", url, response.status());
        }
        Ok(response)
    }

    pub async fn fetch_url_body(&self, url: &str) -> anyhow::Result<String> {
        let response = self.fetch_url_response(url).await?;
        let body = response
            .text()
            .await
            .with_context(|| format!("failed to read body of {url}"))?;
        Ok(body)
    }
}
