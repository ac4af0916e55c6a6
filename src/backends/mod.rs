//! AI backend module
//!
//! Defines the AnswerBackend trait and the HTTP implementation used for every
//! configured answering service

pub mod http;

use crate::utils::error::AppResult;
use async_trait::async_trait;

/// An external service that answers free-form questions
///
/// Implementations make exactly one attempt per call; retrying and falling
/// back are the dispatcher's business.
#[async_trait]
pub trait AnswerBackend: Send + Sync {
    /// Identifier reported as the answer's source
    fn name(&self) -> &str;

    /// Ask a question and return the raw answer text
    async fn ask(&self, question: &str) -> AppResult<String>;
}

pub use http::HttpAnswerBackend;
