//! Fallback dispatcher tests

use async_trait::async_trait;
use httpmock::prelude::*;
use serde_json::json;
use smartutil::backends::{AnswerBackend, HttpAnswerBackend};
use smartutil::config::AiBackendConfig;
use smartutil::models::AiOutcome;
use smartutil::services::{AnswerPolicy, FallbackDispatcher};
use smartutil::storage::{CounterStore, MemoryCounterStore};
use smartutil::AppError;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Backend that replays a fixed reply and counts calls
struct ScriptedBackend {
    name: String,
    reply: Result<String, String>,
    calls: AtomicUsize,
}

impl ScriptedBackend {
    fn answers(name: &str, answer: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            reply: Ok(answer.to_string()),
            calls: AtomicUsize::new(0),
        })
    }

    fn fails(name: &str, error: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            reply: Err(error.to_string()),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AnswerBackend for ScriptedBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn ask(&self, _question: &str) -> Result<String, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reply.clone().map_err(AppError::Upstream)
    }
}

fn policy() -> AnswerPolicy {
    AnswerPolicy {
        min_answer_chars: 10,
        error_markers: vec!["ত্রুটি".to_string()],
    }
}

fn dispatcher(
    chain: &[Arc<ScriptedBackend>],
    counters: Arc<dyn CounterStore>,
) -> FallbackDispatcher {
    let backends: Vec<Arc<dyn AnswerBackend>> = chain
        .iter()
        .map(|b| b.clone() as Arc<dyn AnswerBackend>)
        .collect();
    FallbackDispatcher::new(backends.clone(), backends, policy(), counters)
}

#[tokio::test]
async fn test_first_good_answer_wins() {
    let first = ScriptedBackend::answers("first", "A complete and useful answer.");
    let second = ScriptedBackend::answers("second", "Another complete answer.");
    let counters = Arc::new(MemoryCounterStore::new());
    let d = dispatcher(&[first.clone(), second.clone()], counters.clone());

    let outcome = d.ask("question").await.unwrap();

    assert_eq!(
        outcome,
        AiOutcome::Success {
            source: "first".to_string(),
            answer: "A complete and useful answer.".to_string(),
        }
    );
    assert_eq!(first.calls(), 1);
    assert_eq!(second.calls(), 0);
    assert_eq!(counters.read().await.unwrap().get("ai_backend_calls"), 1);
}

#[tokio::test]
async fn test_error_marker_triggers_fallback() {
    let first = ScriptedBackend::answers("first", "Perplexity ত্রুটি: API কাজ করছে না");
    let second = ScriptedBackend::answers("second", "Rust guarantees memory safety.");
    let counters = Arc::new(MemoryCounterStore::new());
    let d = dispatcher(&[first.clone(), second.clone()], counters.clone());

    let outcome = d.ask("what is rust").await.unwrap();

    assert_eq!(outcome.source(), Some("second"));
    assert_eq!(first.calls(), 1);
    assert_eq!(second.calls(), 1);
    assert_eq!(counters.read().await.unwrap().get("ai_backend_calls"), 2);
}

#[tokio::test]
async fn test_short_answer_kept_in_reserve() {
    let first = ScriptedBackend::answers("first", "Paris");
    let second = ScriptedBackend::fails("second", "connection refused");
    let d = dispatcher(&[first, second.clone()], Arc::new(MemoryCounterStore::new()));

    let outcome = d.ask("capital of France?").await.unwrap();

    // The short answer is still the best one available
    assert_eq!(
        outcome,
        AiOutcome::Success {
            source: "first".to_string(),
            answer: "Paris".to_string(),
        }
    );
    assert_eq!(second.calls(), 1);
}

#[tokio::test]
async fn test_short_answer_replaced_by_longer_one() {
    let first = ScriptedBackend::answers("first", "Paris");
    let second = ScriptedBackend::answers("second", "The capital of France is Paris.");
    let d = dispatcher(&[first, second], Arc::new(MemoryCounterStore::new()));

    let outcome = d.ask("capital of France?").await.unwrap();
    assert_eq!(outcome.source(), Some("second"));
}

#[tokio::test]
async fn test_failure_reports_every_attempt() {
    let first = ScriptedBackend::fails("first", "timed out");
    let second = ScriptedBackend::answers("second", "   ");
    let d = dispatcher(&[first, second], Arc::new(MemoryCounterStore::new()));

    match d.ask("anything").await.unwrap() {
        AiOutcome::Failure { error, attempted } => {
            assert_eq!(attempted, vec!["first", "second"]);
            assert!(error.contains("second"));
        }
        other => panic!("Expected failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_success_iff_some_backend_is_usable() {
    let usable = "A well-formed answer of decent length.";
    let replies: [Option<&str>; 4] = [None, Some(""), Some("ত্রুটি ঘটেছে"), Some(usable)];

    for a in replies {
        for b in replies {
            let make = |name: &str, reply: Option<&str>| match reply {
                Some(text) => ScriptedBackend::answers(name, text),
                None => ScriptedBackend::fails(name, "unreachable"),
            };
            let d = dispatcher(
                &[make("a", a), make("b", b)],
                Arc::new(MemoryCounterStore::new()),
            );

            let outcome = d.ask("question").await.unwrap();
            let expected = a == Some(usable) || b == Some(usable);
            assert_eq!(outcome.is_success(), expected, "a={:?} b={:?}", a, b);
        }
    }
}

#[tokio::test]
async fn test_blank_question_calls_nothing() {
    let first = ScriptedBackend::answers("first", "A complete and useful answer.");
    let counters = Arc::new(MemoryCounterStore::new());
    let d = dispatcher(&[first.clone()], counters.clone());

    let err = d.ask("   ").await.unwrap_err();

    assert!(matches!(err, AppError::Validation(_)));
    assert_eq!(first.calls(), 0);
    assert_eq!(counters.read().await.unwrap().get("ai_backend_calls"), 0);
}

#[tokio::test]
async fn test_empty_chain_fails_cleanly() {
    let d = dispatcher(&[], Arc::new(MemoryCounterStore::new()));

    let outcome = d.ask("anything").await.unwrap();
    assert!(!outcome.is_success());
}

#[tokio::test]
async fn test_ask_all_collects_answers_and_failures() {
    let good = ScriptedBackend::answers("good", "A complete and useful answer.");
    let short = ScriptedBackend::answers("short", "Yes");
    let broken = ScriptedBackend::fails("broken", "HTTP 500");
    let marked = ScriptedBackend::answers("marked", "ত্রুটি");
    let counters = Arc::new(MemoryCounterStore::new());
    let d = dispatcher(
        &[good.clone(), short.clone(), broken.clone(), marked.clone()],
        counters.clone(),
    );

    let aggregate = d.ask_all("question").await.unwrap();

    let sources: Vec<&str> = aggregate.answers.iter().map(|a| a.source.as_str()).collect();
    assert_eq!(sources, vec!["good", "short"]);
    assert_eq!(aggregate.failed.len(), 2);
    assert!(aggregate.failed.contains_key("broken"));
    assert!(aggregate.failed.contains_key("marked"));
    assert_eq!(counters.read().await.unwrap().get("ai_backend_calls"), 4);
}

fn http_backend(server: &MockServer, path: &str, param: &str, fields: &[&str], timeout: u64) -> HttpAnswerBackend {
    HttpAnswerBackend::new(
        AiBackendConfig {
            id: path.trim_start_matches('/').to_string(),
            base_url: server.url(path),
            query_param: param.to_string(),
            answer_fields: fields.iter().map(|f| f.to_string()).collect(),
            fallback: true,
        },
        timeout,
    )
    .unwrap()
}

#[tokio::test]
async fn test_http_backend_sends_question_in_configured_param() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/ask")
                .query_param("prompt", "how are you?")
                .header("user-agent", "Mozilla/5.0");
            then.status(200).json_body(json!({"response": "Fine, thanks for asking!"}));
        })
        .await;

    let backend = http_backend(&server, "/ask", "prompt", &["response", "answer"], 5);
    let answer = backend.ask("how are you?").await.unwrap();

    assert_eq!(answer, "Fine, thanks for asking!");
    assert_eq!(mock.hits_async().await, 1);
}

#[tokio::test]
async fn test_http_backend_non_success_status() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api");
            then.status(429).json_body(json!({"answer": "rate limited"}));
        })
        .await;

    let backend = http_backend(&server, "/api", "q", &["answer"], 5);
    let err = backend.ask("hello").await.unwrap_err();

    assert!(matches!(err, AppError::Upstream(msg) if msg.contains("429")));
}

#[tokio::test]
async fn test_http_backend_malformed_body() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api");
            then.status(200).body("<html>gateway error</html>");
        })
        .await;

    let backend = http_backend(&server, "/api", "q", &["answer"], 5);
    assert!(matches!(backend.ask("hello").await, Err(AppError::Upstream(_))));
}

#[tokio::test]
async fn test_http_backend_timeout() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/slow");
            then.status(200)
                .delay(std::time::Duration::from_secs(3))
                .json_body(json!({"answer": "too late to matter"}));
        })
        .await;

    let backend = http_backend(&server, "/slow", "q", &["answer"], 1);
    let err = backend.ask("hello").await.unwrap_err();

    assert!(matches!(err, AppError::UpstreamTimeout(_)));
    assert_eq!(err.status_code(), axum::http::StatusCode::GATEWAY_TIMEOUT);
}

#[tokio::test]
async fn test_timeout_falls_through_to_next_backend() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/slow");
            then.status(200)
                .delay(std::time::Duration::from_secs(3))
                .json_body(json!({"answer": "too late to matter"}));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/fast");
            then.status(200).json_body(json!({"answer": "Quick and complete answer."}));
        })
        .await;

    let chain: Vec<Arc<dyn AnswerBackend>> = vec![
        Arc::new(http_backend(&server, "/slow", "q", &["answer"], 1)),
        Arc::new(http_backend(&server, "/fast", "q", &["answer"], 1)),
    ];
    let d = FallbackDispatcher::new(
        chain.clone(),
        chain,
        policy(),
        Arc::new(MemoryCounterStore::new()),
    );

    let outcome = d.ask("hello").await.unwrap();
    assert_eq!(outcome.source(), Some("fast"));
}
