//! Reachability checks for the configured endpoints

use crate::config::{ServiceDirectory, Settings};
use crate::models::StatusReport;
use anyhow::{Context, Result};
use futures::future::join_all;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub struct StatusChecker {
    directory: Arc<ServiceDirectory>,
    client: Client,
}

impl StatusChecker {
    pub fn new(directory: Arc<ServiceDirectory>, settings: &Settings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeouts.status))
            .user_agent(concat!("smartutil/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create status HTTP client")?;

        Ok(Self { directory, client })
    }

    /// Probe every endpoint concurrently
    pub async fn check_all(&self) -> StatusReport {
        let ai = join_all(
            self.directory
                .ai_backends
                .iter()
                .map(|b| async move { (b.id.clone(), self.probe(&b.base_url).await) }),
        );
        let streaming = join_all(
            self.directory
                .streaming_services
                .iter()
                .map(|(id, url)| async move { (id.clone(), self.probe(url).await) }),
        );

        let (ai, streaming) = futures::join!(ai, streaming);

        StatusReport {
            ai_apis: ai.into_iter().collect(),
            streaming_apis: streaming.into_iter().collect(),
        }
    }

    /// Reachable means a plain GET answers 200
    pub async fn probe(&self, url: &str) -> bool {
        let url = strip_query(url);
        match self.client.get(url).send().await {
            Ok(response) => response.status() == reqwest::StatusCode::OK,
            Err(e) => {
                debug!("{} unreachable: {}", url, e);
                false
            }
        }
    }
}

fn strip_query(url: &str) -> &str {
    url.split('?').next().unwrap_or(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_query() {
        assert_eq!(strip_query("https://a.example/api?q=1"), "https://a.example/api");
        assert_eq!(strip_query("https://a.example"), "https://a.example");
    }
}
