//! Streaming-service proxy
//!
//! Forwards a target URL to the per-service extractor and hands back its body
//! untouched (or truncated for display). Bodies are raw bytes; only valid
//! UTF-8 text is ever truncated.

use crate::config::{ServiceDirectory, Settings};
use crate::models::ProxiedPayload;
use crate::storage::{names, CounterStore};
use crate::utils::error::{from_upstream, AppError, AppResult};
use crate::utils::text::truncate_chars;
use anyhow::{Context, Result};
use axum::body::Bytes;
use reqwest::{Client, Response};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub struct StreamProxy {
    directory: Arc<ServiceDirectory>,
    client: Client,
    display_limit: Option<usize>,
    max_body_bytes: usize,
    counters: Arc<dyn CounterStore>,
}

impl StreamProxy {
    pub fn new(
        directory: Arc<ServiceDirectory>,
        settings: &Settings,
        counters: Arc<dyn CounterStore>,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeouts.stream))
            .user_agent(concat!("smartutil/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create streaming HTTP client")?;

        Ok(Self {
            directory,
            client,
            display_limit: settings.stream.display_limit,
            max_body_bytes: settings.stream.max_body_bytes,
            counters,
        })
    }

    /// Supported service identifiers
    pub fn services(&self) -> Vec<&str> {
        self.directory.streaming_ids().collect()
    }

    /// Extractor base URL for `service`, `NotFound` when unsupported
    pub fn resolve(&self, service: &str) -> AppResult<&str> {
        self.directory.streaming_url(service).ok_or_else(|| {
            AppError::NotFound(format!(
                "unknown streaming service '{}', supported: {}",
                service,
                self.services().join(", ")
            ))
        })
    }

    /// Forward `target_url` to `service`
    ///
    /// Unknown services fail with `NotFound` before anything goes on the wire.
    /// `max_chars` overrides the configured display limit.
    pub async fn fetch(
        &self,
        service: &str,
        target_url: &str,
        max_chars: Option<usize>,
    ) -> AppResult<ProxiedPayload> {
        let base_url = self.resolve(service)?;

        let target_url = target_url.trim();
        if target_url.is_empty() {
            return Err(AppError::Validation("url must not be empty".to_string()));
        }

        self.counters.increment(names::MEDIA_DOWNLOADS).await;
        info!("Proxying {} request", service);

        let response = self
            .client
            .get(base_url)
            .query(&[("url", target_url)])
            .send()
            .await
            .map_err(|e| from_upstream(service, e))?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = self.read_capped(service, response).await?;

        debug!("{} answered {} with {} bytes", service, status, body.len());

        let (body, truncated) = match max_chars.or(self.display_limit) {
            Some(limit) => truncate_text(body, limit),
            None => (body, false),
        };

        Ok(ProxiedPayload {
            service: service.to_string(),
            status,
            content_type,
            body,
            truncated,
        })
    }

    /// Read the whole body, refusing anything past `max_body_bytes`
    async fn read_capped(&self, service: &str, mut response: Response) -> AppResult<Bytes> {
        let too_large = || {
            warn!("{} body exceeds {} bytes", service, self.max_body_bytes);
            AppError::Upstream(format!(
                "{} response exceeds {} bytes",
                service, self.max_body_bytes
            ))
        };

        if let Some(advertised) = response.content_length() {
            if advertised > self.max_body_bytes as u64 {
                return Err(too_large());
            }
        }

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(|e| from_upstream(service, e))? {
            if body.len() + chunk.len() > self.max_body_bytes {
                return Err(too_large());
            }
            body.extend_from_slice(&chunk);
        }
        Ok(Bytes::from(body))
    }
}

/// Cut UTF-8 text to `limit` characters; binary bodies pass through whole
fn truncate_text(body: Bytes, limit: usize) -> (Bytes, bool) {
    let Ok(text) = std::str::from_utf8(&body) else {
        return (body, false);
    };
    let keep = truncate_chars(text, limit).len();
    if keep < body.len() {
        (body.slice(..keep), true)
    } else {
        (body, false)
    }
}
