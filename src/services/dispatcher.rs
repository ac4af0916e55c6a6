//! AI fallback dispatcher
//!
//! Walks the fallback chain in order until a backend produces a usable
//! answer. One attempt per backend per question: no retries, no backoff,
//! nothing remembered between questions.

use crate::backends::{AnswerBackend, HttpAnswerBackend};
use crate::config::settings::FallbackConfig;
use crate::config::{ServiceDirectory, Settings};
use crate::models::{AggregateAnswer, AiOutcome, SourcedAnswer};
use crate::storage::{names, CounterStore};
use crate::utils::error::{AppError, AppResult};
use crate::utils::text::truncate_with_note;
use anyhow::Result;
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// How an answer is judged
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Accept,
    /// Well-formed but under the length threshold; try the next backend,
    /// keep this one in reserve
    Short,
    Reject(String),
}

/// Heuristics deciding whether an answer is good enough
#[derive(Debug, Clone)]
pub struct AnswerPolicy {
    pub min_answer_chars: usize,
    pub error_markers: Vec<String>,
}

impl AnswerPolicy {
    pub fn judge(&self, answer: &str) -> Verdict {
        let trimmed = answer.trim();
        if trimmed.is_empty() {
            return Verdict::Reject("empty answer".to_string());
        }
        if let Some(marker) = self.error_markers.iter().find(|m| trimmed.contains(m.as_str())) {
            return Verdict::Reject(format!("answer contains error marker '{}'", marker));
        }
        if trimmed.chars().count() < self.min_answer_chars {
            return Verdict::Short;
        }
        Verdict::Accept
    }
}

impl From<&FallbackConfig> for AnswerPolicy {
    fn from(config: &FallbackConfig) -> Self {
        Self {
            min_answer_chars: config.min_answer_chars,
            error_markers: config.error_markers.clone(),
        }
    }
}

/// Dispatches questions across the configured AI backends
pub struct FallbackDispatcher {
    /// Tried in order by `ask`
    chain: Vec<Arc<dyn AnswerBackend>>,
    /// Queried together by `ask_all`
    all: Vec<Arc<dyn AnswerBackend>>,
    policy: AnswerPolicy,
    counters: Arc<dyn CounterStore>,
}

impl FallbackDispatcher {
    pub fn new(
        chain: Vec<Arc<dyn AnswerBackend>>,
        all: Vec<Arc<dyn AnswerBackend>>,
        policy: AnswerPolicy,
        counters: Arc<dyn CounterStore>,
    ) -> Self {
        Self {
            chain,
            all,
            policy,
            counters,
        }
    }

    /// Build HTTP backends for every AI service in the directory
    pub fn from_directory(
        directory: &ServiceDirectory,
        settings: &Settings,
        counters: Arc<dyn CounterStore>,
    ) -> Result<Self> {
        let mut chain: Vec<Arc<dyn AnswerBackend>> = Vec::new();
        let mut all: Vec<Arc<dyn AnswerBackend>> = Vec::new();

        for config in &directory.ai_backends {
            let backend: Arc<dyn AnswerBackend> =
                Arc::new(HttpAnswerBackend::new(config.clone(), settings.timeouts.ai)?);
            if config.fallback {
                chain.push(backend.clone());
            }
            all.push(backend);
        }

        let dispatcher = Self::new(chain, all, AnswerPolicy::from(&settings.fallback), counters);
        info!("Fallback chain: [{}]", dispatcher.chain_names().join(" -> "));

        Ok(dispatcher)
    }

    /// Names of the fallback chain, in order
    pub fn chain_names(&self) -> Vec<&str> {
        self.chain.iter().map(|b| b.name()).collect()
    }

    /// Ask the fallback chain
    ///
    /// A blank question is rejected before any backend is called.
    pub async fn ask(&self, question: &str) -> AppResult<AiOutcome> {
        let question = validate_question(question)?;

        let mut attempted = Vec::with_capacity(self.chain.len());
        let mut reserve: Option<(String, String)> = None;
        let mut last_error = String::from("no AI backend configured");

        for backend in &self.chain {
            let name = backend.name().to_string();
            attempted.push(name.clone());
            self.counters.increment(names::AI_BACKEND_CALLS).await;

            match backend.ask(question).await {
                Ok(answer) => match self.policy.judge(&answer) {
                    Verdict::Accept => {
                        debug!("{} answered: {}", name, truncate_with_note(answer.trim(), 80));
                        return Ok(AiOutcome::Success {
                            source: name,
                            answer: answer.trim().to_string(),
                        });
                    }
                    Verdict::Short => {
                        debug!("{} answer is short, trying next backend", name);
                        last_error = format!("{}: answer too short", name);
                        if reserve.is_none() {
                            reserve = Some((name, answer.trim().to_string()));
                        }
                    }
                    Verdict::Reject(reason) => {
                        warn!("{} answer rejected: {}", name, reason);
                        last_error = format!("{}: {}", name, reason);
                    }
                },
                Err(e) => {
                    warn!("{} failed: {}", name, e);
                    last_error = format!("{}: {}", name, e);
                }
            }
        }

        if let Some((source, answer)) = reserve {
            debug!("Falling back to short answer from {}", source);
            return Ok(AiOutcome::Success { source, answer });
        }

        Ok(AiOutcome::Failure {
            error: last_error,
            attempted,
        })
    }

    /// Ask every backend concurrently and keep all usable answers
    pub async fn ask_all(&self, question: &str) -> AppResult<AggregateAnswer> {
        let question = validate_question(question)?;

        let calls = self.all.iter().map(|backend| async move {
            self.counters.increment(names::AI_BACKEND_CALLS).await;
            (backend.name().to_string(), backend.ask(question).await)
        });

        let mut aggregate = AggregateAnswer::default();
        for (name, result) in join_all(calls).await {
            match result.map(|answer| (self.policy.judge(&answer), answer)) {
                Ok((Verdict::Accept | Verdict::Short, answer)) => {
                    aggregate.answers.push(SourcedAnswer {
                        source: name,
                        answer: answer.trim().to_string(),
                    });
                }
                Ok((Verdict::Reject(reason), _)) => {
                    aggregate.failed.insert(name, reason);
                }
                Err(e) => {
                    aggregate.failed.insert(name, e.to_string());
                }
            }
        }

        Ok(aggregate)
    }
}

fn validate_question(question: &str) -> AppResult<&str> {
    let trimmed = question.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation("question must not be empty".to_string()));
    }
    Ok(trimmed)
}
