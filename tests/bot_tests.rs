//! Chat bot tests against a stubbed Bot API

use httpmock::prelude::*;
use serde_json::{json, Value};
use smartutil::bot::telegram::Update;
use smartutil::bot::Bot;
use smartutil::config::{AiBackendConfig, AppConfig, Settings};
use smartutil::handlers::AppState;
use smartutil::storage::{CounterStore, MemoryCounterStore, UserRegistry};
use std::sync::Arc;

const TOKEN: &str = "123:abc";

fn build_bot(server: &MockServer) -> (Bot, Arc<AppState>) {
    let mut settings = Settings::default();
    settings.bot.token = Some(TOKEN.to_string());
    settings.bot.api_url = server.base_url();
    settings.bot.poll_timeout = 1;
    settings.timeouts.ai = 5;

    let mut config = AppConfig::default();
    config.services.ai_backends = vec![AiBackendConfig {
        id: "stub_ai".to_string(),
        base_url: server.url("/ai"),
        query_param: "q".to_string(),
        answer_fields: vec!["answer".to_string()],
        fallback: true,
    }];

    let counters: Arc<dyn CounterStore> = Arc::new(MemoryCounterStore::new());
    let users = Arc::new(UserRegistry::in_memory(counters.clone()));
    let state = Arc::new(AppState::with_stores(settings, config, counters, users).unwrap());
    (Bot::new(state.clone()).unwrap(), state)
}

fn method_path(method: &str) -> String {
    format!("/bot{}/{}", TOKEN, method)
}

fn sent_message(message_id: i64) -> Value {
    json!({
        "ok": true,
        "result": {
            "message_id": message_id,
            "chat": {"id": 99, "type": "private"},
            "text": "..."
        }
    })
}

fn text_update(text: &str) -> Update {
    serde_json::from_value(json!({
        "update_id": 1,
        "message": {
            "message_id": 10,
            "chat": {"id": 99, "type": "private"},
            "from": {"id": 5001, "is_bot": false, "first_name": "Ann", "username": "ann"},
            "text": text
        }
    }))
    .unwrap()
}

#[tokio::test]
async fn test_start_registers_user_and_welcomes() {
    let server = MockServer::start_async().await;
    let send = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(method_path("sendMessage"))
                .body_contains("\"chat_id\":99")
                .body_contains("Welcome Ann!")
                .body_contains("inline_keyboard");
            then.status(200).json_body(sent_message(11));
        })
        .await;
    let (bot, state) = build_bot(&server);

    bot.process_update(text_update("/start")).await.unwrap();
    // The registering /start counts toward the user's commands
    assert_eq!(state.users.get(5001).await.unwrap().commands_used, 1);
    bot.process_update(text_update("/start")).await.unwrap();

    assert_eq!(send.hits_async().await, 2);
    assert_eq!(state.users.len().await, 1);
    assert_eq!(state.users.get(5001).await.unwrap().commands_used, 2);

    let stats = state.counters.read().await.unwrap();
    assert_eq!(stats.get("total_users"), 1);
    assert_eq!(stats.get("total_commands"), 2);
}

#[tokio::test]
async fn test_ai_command_edits_placeholder_with_answer() {
    let server = MockServer::start_async().await;
    let thinking = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(method_path("sendMessage"))
                .body_contains("AI is thinking");
            then.status(200).json_body(sent_message(77));
        })
        .await;
    let ai = server
        .mock_async(|when, then| {
            when.method(GET).path("/ai").query_param("q", "why rust?");
            then.status(200)
                .json_body(json!({"answer": "Rust gives memory safety without a GC."}));
        })
        .await;
    let edit = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(method_path("editMessageText"))
                .body_contains("\"message_id\":77")
                .body_contains("Rust gives memory safety without a GC.")
                .body_contains("stub_ai");
            then.status(200).json_body(json!({"ok": true, "result": true}));
        })
        .await;
    let (bot, state) = build_bot(&server);

    bot.process_update(text_update("/ai why rust?")).await.unwrap();

    assert_eq!(thinking.hits_async().await, 1);
    assert_eq!(ai.hits_async().await, 1);
    assert_eq!(edit.hits_async().await, 1);
    assert_eq!(state.counters.read().await.unwrap().get("ai_queries"), 1);
}

#[tokio::test]
async fn test_ai_command_without_question_shows_usage() {
    let server = MockServer::start_async().await;
    let usage = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(method_path("sendMessage"))
                .body_contains("Usage");
            then.status(200).json_body(sent_message(12));
        })
        .await;
    let ai = server
        .mock_async(|when, then| {
            when.method(GET).path("/ai");
            then.status(200).json_body(json!({"answer": "never asked"}));
        })
        .await;
    let (bot, state) = build_bot(&server);

    bot.process_update(text_update("/ai")).await.unwrap();

    assert_eq!(usage.hits_async().await, 1);
    assert_eq!(ai.hits_async().await, 0);
    assert_eq!(state.counters.read().await.unwrap().get("ai_queries"), 0);
}

#[tokio::test]
async fn test_ping_tolerates_unmodified_message() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path(method_path("sendMessage"));
            then.status(200).json_body(sent_message(13));
        })
        .await;
    let edit = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(method_path("editMessageText"))
                .body_contains("Pong");
            then.status(400).json_body(json!({
                "ok": false,
                "error_code": 400,
                "description": "Bad Request: message is not modified"
            }));
        })
        .await;
    let (bot, _) = build_bot(&server);

    bot.process_update(text_update("/ping")).await.unwrap();
    assert_eq!(edit.hits_async().await, 1);
}

#[tokio::test]
async fn test_send_failure_is_reported() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path(method_path("sendMessage"));
            then.status(403).json_body(json!({
                "ok": false,
                "error_code": 403,
                "description": "Forbidden: bot was blocked by the user"
            }));
        })
        .await;
    let (bot, _) = build_bot(&server);

    let err = bot.process_update(text_update("/joke")).await.unwrap_err();
    assert!(err.to_string().contains("blocked"));
    assert!(!err.to_string().contains(TOKEN));
}

#[tokio::test]
async fn test_unknown_command_and_plain_text() {
    let server = MockServer::start_async().await;
    let unknown = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(method_path("sendMessage"))
                .body_contains("Unknown command");
            then.status(200).json_body(sent_message(14));
        })
        .await;
    let (bot, state) = build_bot(&server);

    bot.process_update(text_update("/yt https://youtu.be/x")).await.unwrap();
    bot.process_update(text_update("just chatting")).await.unwrap();

    assert_eq!(unknown.hits_async().await, 1);
    assert_eq!(state.counters.read().await.unwrap().get("total_commands"), 1);
}

#[tokio::test]
async fn test_callback_edits_and_answers() {
    let server = MockServer::start_async().await;
    let edit = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(method_path("editMessageText"))
                .body_contains("\"message_id\":10")
                .body_contains("back_start");
            then.status(200).json_body(json!({"ok": true, "result": true}));
        })
        .await;
    let answer = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(method_path("answerCallbackQuery"))
                .body_contains("\"callback_query_id\":\"cb-1\"");
            then.status(200).json_body(json!({"ok": true, "result": true}));
        })
        .await;
    let (bot, _) = build_bot(&server);

    let update: Update = serde_json::from_value(json!({
        "update_id": 2,
        "callback_query": {
            "id": "cb-1",
            "from": {"id": 5001, "is_bot": false, "first_name": "Ann"},
            "message": {
                "message_id": 10,
                "chat": {"id": 99, "type": "private"},
                "text": "welcome"
            },
            "data": "features"
        }
    }))
    .unwrap();

    bot.process_update(update).await.unwrap();

    assert_eq!(edit.hits_async().await, 1);
    assert_eq!(answer.hits_async().await, 1);
}

#[tokio::test]
async fn test_unknown_callback_is_still_answered() {
    let server = MockServer::start_async().await;
    let answer = server
        .mock_async(|when, then| {
            when.method(POST).path(method_path("answerCallbackQuery"));
            then.status(200).json_body(json!({"ok": true, "result": true}));
        })
        .await;
    let (bot, _) = build_bot(&server);

    let update: Update = serde_json::from_value(json!({
        "update_id": 3,
        "callback_query": {
            "id": "cb-2",
            "from": {"id": 5001, "is_bot": false, "first_name": "Ann"},
            "data": "something_else"
        }
    }))
    .unwrap();

    bot.process_update(update).await.unwrap();
    assert_eq!(answer.hits_async().await, 1);
}

#[tokio::test]
async fn test_run_stops_on_shutdown() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path(method_path("getUpdates"));
            then.status(200)
                .delay(std::time::Duration::from_millis(200))
                .json_body(json!({"ok": true, "result": []}));
        })
        .await;
    let (bot, state) = build_bot(&server);

    let (tx, rx) = tokio::sync::oneshot::channel::<()>();
    let handle = tokio::spawn(bot.run(async move {
        rx.await.ok();
    }));

    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    assert!(state.is_bot_running());

    tx.send(()).unwrap();
    tokio::time::timeout(std::time::Duration::from_secs(5), handle)
        .await
        .unwrap()
        .unwrap();
    assert!(!state.is_bot_running());
}
