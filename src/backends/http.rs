//! HTTP answer backend
//!
//! `GET <base_url>?<query_param>=<question>`, answer read from the first
//! present field of the JSON body

use super::AnswerBackend;
use crate::config::AiBackendConfig;
use crate::utils::error::{from_upstream, AppError, AppResult};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// Some upstreams reject requests without a browser user agent
const BROWSER_USER_AGENT: &str = "Mozilla/5.0";

/// Answer backend reached over plain HTTP GET
pub struct HttpAnswerBackend {
    config: AiBackendConfig,
    client: Client,
}

impl HttpAnswerBackend {
    /// Create a backend whose calls are bounded by `timeout_secs`
    pub fn new(config: AiBackendConfig, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(BROWSER_USER_AGENT)
            .build()
            .with_context(|| format!("Failed to create HTTP client for {}", config.id))?;

        Ok(Self { config, client })
    }

    /// Pull the answer out of a response body
    fn extract_answer(&self, body: &Value) -> Option<String> {
        if let Value::String(s) = body {
            return Some(s.clone());
        }

        self.config
            .answer_fields
            .iter()
            .find_map(|field| body.get(field).and_then(Value::as_str))
            .map(str::to_string)
    }
}

#[async_trait]
impl AnswerBackend for HttpAnswerBackend {
    fn name(&self) -> &str {
        &self.config.id
    }

    async fn ask(&self, question: &str) -> AppResult<String> {
        debug!("Asking {} ({} chars)", self.config.id, question.chars().count());

        let response = self
            .client
            .get(&self.config.base_url)
            .query(&[(self.config.query_param.as_str(), question)])
            .send()
            .await
            .map_err(|e| from_upstream(&self.config.id, e))?;

        let status = response.status();
        if !status.is_success() {
            warn!("{} answered with status {}", self.config.id, status);
            return Err(AppError::Upstream(format!(
                "{} returned status {}",
                self.config.id, status
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("{} returned malformed JSON: {}", self.config.id, e)))?;

        self.extract_answer(&body).ok_or_else(|| {
            AppError::Upstream(format!(
                "{} response has none of the fields {:?}",
                self.config.id, self.config.answer_fields
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn backend(fields: &[&str]) -> HttpAnswerBackend {
        HttpAnswerBackend::new(
            AiBackendConfig {
                id: "test".to_string(),
                base_url: "http://127.0.0.1:1/api".to_string(),
                query_param: "q".to_string(),
                answer_fields: fields.iter().map(|f| f.to_string()).collect(),
                fallback: true,
            },
            5,
        )
        .unwrap()
    }

    #[test]
    fn test_extract_answer_field_order() {
        let b = backend(&["response", "answer"]);
        let body = json!({"answer": "from answer", "response": "from response"});
        assert_eq!(b.extract_answer(&body).as_deref(), Some("from response"));

        let body = json!({"answer": "only answer"});
        assert_eq!(b.extract_answer(&body).as_deref(), Some("only answer"));
    }

    #[test]
    fn test_extract_answer_missing_or_wrong_type() {
        let b = backend(&["answer"]);
        assert_eq!(b.extract_answer(&json!({"answer": 42})), None);
        assert_eq!(b.extract_answer(&json!({"other": "x"})), None);
        assert_eq!(b.extract_answer(&json!("plain body")).as_deref(), Some("plain body"));
    }
}
