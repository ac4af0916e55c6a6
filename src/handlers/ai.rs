//! AI answer handlers
//!
//! `/api/ai` runs the fallback chain, `/api/ask` fans out to every backend

use crate::handlers::AppState;
use crate::models::{AiOutcome, AiResponse, AskResponse};
use crate::storage::names;
use crate::utils::error::{AppError, AppResult};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Deserialize)]
pub struct QuestionQuery {
    #[serde(default)]
    pub q: Option<String>,
}

impl QuestionQuery {
    /// The trimmed question, or a 400 when absent or blank
    fn question(&self) -> AppResult<&str> {
        match self.q.as_deref().map(str::trim) {
            Some(q) if !q.is_empty() => Ok(q),
            _ => Err(AppError::Validation("query parameter 'q' is required".to_string())),
        }
    }
}

/// Answer from the fallback chain
///
/// GET /api/ai?q=<question>
pub async fn handle_ai(
    State(state): State<Arc<AppState>>,
    Query(query): Query<QuestionQuery>,
) -> AppResult<Response> {
    let question = query.question()?;
    state.counters.increment(names::AI_QUERIES).await;

    let outcome = state.dispatcher.ask(question).await?;
    let credits = &state.config.credits;

    let (status, body) = match outcome {
        AiOutcome::Success { source, answer } => {
            debug!("Answered via {}", source);
            (
                StatusCode::OK,
                AiResponse {
                    success: true,
                    answer: Some(answer),
                    error: None,
                    source: Some(source),
                    developer: credits.developer.clone(),
                    channel: credits.channel.clone(),
                },
            )
        }
        AiOutcome::Failure { error, .. } => (
            StatusCode::BAD_GATEWAY,
            AiResponse {
                success: false,
                answer: None,
                error: Some(error),
                source: None,
                developer: credits.developer.clone(),
                channel: credits.channel.clone(),
            },
        ),
    };

    Ok((status, Json(body)).into_response())
}

/// Answers from every backend that succeeded
///
/// GET /api/ask?q=<question>
pub async fn handle_ask(
    State(state): State<Arc<AppState>>,
    Query(query): Query<QuestionQuery>,
) -> AppResult<Response> {
    let question = query.question()?;
    state.counters.increment(names::AI_QUERIES).await;

    let aggregate = state.dispatcher.ask_all(question).await?;
    let success = !aggregate.answers.is_empty();

    let body = AskResponse {
        success,
        question: question.to_string(),
        answers: aggregate.answers,
        failed: aggregate.failed,
    };

    let status = if success { StatusCode::OK } else { StatusCode::BAD_GATEWAY };
    Ok((status, Json(body)).into_response())
}
