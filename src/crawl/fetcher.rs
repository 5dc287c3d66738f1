//! HTTP page fetching.

use crate::core::config::Config;
use crate::core::error::{AppError, Result};
use async_trait::async_trait;
use rand::seq::SliceRandom;
use reqwest::header::{ACCEPT, USER_AGENT};
use reqwest::{redirect, Client, StatusCode};
use std::time::Duration;
use url::Url;

/// Bodies larger than this are abandoned rather than buffered.
pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// What a single GET produced. Only a 200 with a readable body is a `Page`.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Page { final_url: Url, body: String },
    HttpStatus(u16),
    Failed(String),
}

#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &Url, user_agent: &str, timeout: Duration) -> FetchOutcome;
}

/// [`PageFetcher`] over a shared reqwest client.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .redirect(redirect::Policy::limited(5))
            .build()
            .map_err(|e| AppError::Initialization(format!("Failed to build HTTP client: {}", e)))?;
        tracing::debug!("HTTP client initialized.");
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url, user_agent: &str, timeout: Duration) -> FetchOutcome {
        let mut response = match self
            .client
            .get(url.clone())
            .header(USER_AGENT, user_agent)
            .header(ACCEPT, "text/html,application/xhtml+xml;q=0.9,*/*;q=0.8")
            .timeout(timeout)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) if e.is_timeout() => {
                return FetchOutcome::Failed(format!("Request to {} timed out", url))
            }
            Err(e) => return FetchOutcome::Failed(format!("Request to {} failed: {}", url, e)),
        };

        let status = response.status();
        if status != StatusCode::OK {
            return FetchOutcome::HttpStatus(status.as_u16());
        }

        if response
            .content_length()
            .is_some_and(|len| len > MAX_BODY_BYTES as u64)
        {
            return FetchOutcome::Failed(format!("Body of {} exceeds {} bytes", url, MAX_BODY_BYTES));
        }

        let final_url = response.url().clone();
        let mut bytes = Vec::new();
        loop {
            match response.chunk().await {
                Ok(Some(chunk)) => {
                    if bytes.len() + chunk.len() > MAX_BODY_BYTES {
                        return FetchOutcome::Failed(format!(
                            "Body of {} exceeds {} bytes",
                            url, MAX_BODY_BYTES
                        ));
                    }
                    bytes.extend_from_slice(&chunk);
                }
                Ok(None) => break,
                Err(e) => {
                    return FetchOutcome::Failed(format!("Could not read body of {}: {}", url, e))
                }
            }
        }
        FetchOutcome::Page {
            final_url,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        }
    }
}

/// Picks a User-Agent from the configured pool.
pub(crate) fn pick_user_agent(config: &Config) -> &str {
    config
        .user_agents
        .choose(&mut rand::thread_rng())
        .map(String::as_str)
        .unwrap_or("Mozilla/5.0")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_agent_comes_from_pool() {
        let config = Config::default();
        for _ in 0..20 {
            let ua = pick_user_agent(&config);
            assert!(config.user_agents.iter().any(|u| u == ua));
        }
    }
}
