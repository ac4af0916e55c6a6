//! Data models module
//!
//! Outcome types produced by the services and the JSON bodies served over HTTP

use axum::body::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Result of running the fallback chain for one question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AiOutcome {
    /// A backend produced a usable answer
    Success { source: String, answer: String },
    /// Every backend failed; `attempted` lists them in call order
    Failure { error: String, attempted: Vec<String> },
}

impl AiOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, AiOutcome::Success { .. })
    }

    /// Backend that produced the answer
    pub fn source(&self) -> Option<&str> {
        match self {
            AiOutcome::Success { source, .. } => Some(source),
            AiOutcome::Failure { .. } => None,
        }
    }
}

/// One backend's answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourcedAnswer {
    pub source: String,
    pub answer: String,
}

/// Answers gathered from every backend at once
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AggregateAnswer {
    pub answers: Vec<SourcedAnswer>,
    /// Backends that failed, with the reason
    pub failed: BTreeMap<String, String>,
}

/// Raw body returned by a streaming service
#[derive(Debug, Clone)]
pub struct ProxiedPayload {
    pub service: String,
    pub status: u16,
    pub content_type: Option<String>,
    /// Bytes exactly as served; cut only when the body is UTF-8 text
    pub body: Bytes,
    pub truncated: bool,
}

/// `GET /api/ai` body
#[derive(Debug, Serialize, Deserialize)]
pub struct AiResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub source: Option<String>,
    pub developer: String,
    pub channel: String,
}

/// `GET /api/ask` body
#[derive(Debug, Serialize, Deserialize)]
pub struct AskResponse {
    pub success: bool,
    pub question: String,
    pub answers: Vec<SourcedAnswer>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub failed: BTreeMap<String, String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JokeResponse {
    pub joke: String,
}

/// Local civil time of one city
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CityTime {
    pub city: String,
    pub timezone: String,
    /// RFC 3339 with the zone's offset
    pub time: String,
    /// `hh:mm AM/PM`
    pub display: String,
}

/// Reachability of every configured endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusReport {
    pub ai_apis: BTreeMap<String, bool>,
    pub streaming_apis: BTreeMap<String, bool>,
}
