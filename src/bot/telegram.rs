//! Telegram Bot API client
//!
//! Only the handful of methods the bot needs, over HTTPS long polling

use crate::utils::error::{from_upstream, AppError, AppResult};
use anyhow::{Context, Result};
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    #[serde(default)]
    pub from: Option<User>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chat {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub first_name: String,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub data: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InlineKeyboardMarkup {
    pub inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InlineKeyboardButton {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl InlineKeyboardButton {
    pub fn callback(text: &str, data: &str) -> Self {
        Self {
            text: text.to_string(),
            callback_data: Some(data.to_string()),
            url: None,
        }
    }

    pub fn link(text: &str, url: &str) -> Self {
        Self {
            text: text.to_string(),
            callback_data: None,
            url: Some(url.to_string()),
        }
    }
}

/// Bot API client
#[derive(Clone)]
pub struct TelegramClient {
    client: Client,
    /// `<api_url>/bot<token>`; contains the secret, never log it
    base: String,
}

impl TelegramClient {
    /// `poll_timeout` is the long-polling wait; the HTTP timeout leaves headroom
    pub fn new(api_url: &str, token: &str, poll_timeout: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(poll_timeout + 10))
            .build()
            .context("Failed to create Telegram HTTP client")?;

        Ok(Self {
            client,
            base: format!("{}/bot{}", api_url.trim_end_matches('/'), token),
        })
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, body: &Value) -> AppResult<T> {
        let response = self
            .client
            .post(format!("{}/{}", self.base, method))
            .json(body)
            .send()
            .await
            .map_err(|e| from_upstream("telegram", e.without_url()))?;

        let parsed: ApiResponse<T> = response
            .json()
            .await
            .map_err(|e| from_upstream("telegram", e.without_url()))?;

        match (parsed.ok, parsed.result) {
            (true, Some(result)) => Ok(result),
            _ => Err(AppError::Upstream(format!(
                "telegram {} failed: {}",
                method,
                parsed.description.unwrap_or_else(|| "no description".to_string())
            ))),
        }
    }

    /// Long-poll for updates after `offset`
    pub async fn get_updates(&self, offset: i64, timeout: u64) -> AppResult<Vec<Update>> {
        self.call(
            "getUpdates",
            &json!({
                "offset": offset,
                "timeout": timeout,
                "allowed_updates": ["message", "callback_query"],
            }),
        )
        .await
    }

    /// Send a Markdown message, resending as plain text if Telegram
    /// cannot parse the markup
    pub async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Option<&InlineKeyboardMarkup>,
    ) -> AppResult<Message> {
        let mut body = json!({
            "chat_id": chat_id,
            "text": text,
            "parse_mode": "Markdown",
            "disable_web_page_preview": true,
        });
        if let Some(keyboard) = keyboard {
            body["reply_markup"] = json!(keyboard);
        }

        match self.call("sendMessage", &body).await {
            Err(AppError::Upstream(msg)) if is_markup_error(&msg) => {
                debug!("Markdown rejected, resending as plain text");
                strip_parse_mode(&mut body);
                self.call("sendMessage", &body).await
            }
            other => other,
        }
    }

    /// Replace the text of a message the bot sent earlier
    pub async fn edit_message_text(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
        keyboard: Option<&InlineKeyboardMarkup>,
    ) -> AppResult<()> {
        let mut body = json!({
            "chat_id": chat_id,
            "message_id": message_id,
            "text": text,
            "parse_mode": "Markdown",
            "disable_web_page_preview": true,
        });
        if let Some(keyboard) = keyboard {
            body["reply_markup"] = json!(keyboard);
        }

        // Telegram answers with the edited Message or `true`
        let result: AppResult<Value> = match self.call("editMessageText", &body).await {
            Err(AppError::Upstream(msg)) if is_markup_error(&msg) => {
                strip_parse_mode(&mut body);
                self.call("editMessageText", &body).await
            }
            other => other,
        };

        match result {
            Ok(_) => Ok(()),
            // Same text as before; nothing to do
            Err(AppError::Upstream(msg)) if msg.contains("message is not modified") => Ok(()),
            Err(e) => Err(e),
        }
    }

    pub async fn answer_callback_query(&self, callback_query_id: &str) -> AppResult<()> {
        let _: bool = self
            .call(
                "answerCallbackQuery",
                &json!({ "callback_query_id": callback_query_id }),
            )
            .await
            .inspect_err(|e| warn!("answerCallbackQuery failed: {}", e))?;
        Ok(())
    }
}

fn is_markup_error(message: &str) -> bool {
    message.contains("can't parse entities")
}

fn strip_parse_mode(body: &mut Value) {
    if let Some(obj) = body.as_object_mut() {
        obj.remove("parse_mode");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_deserialization() {
        let raw = r#"{
            "update_id": 10,
            "message": {
                "message_id": 5,
                "chat": {"id": 99, "type": "private"},
                "from": {"id": 99, "is_bot": false, "first_name": "Ann"},
                "text": "/ai hello there"
            }
        }"#;
        let update: Update = serde_json::from_str(raw).unwrap();
        let message = update.message.unwrap();
        assert_eq!(message.chat.id, 99);
        assert_eq!(message.from.unwrap().username, None);
        assert_eq!(message.text.as_deref(), Some("/ai hello there"));
        assert!(update.callback_query.is_none());
    }

    #[test]
    fn test_keyboard_serialization() {
        let keyboard = InlineKeyboardMarkup {
            inline_keyboard: vec![vec![
                InlineKeyboardButton::callback("Help", "help"),
                InlineKeyboardButton::link("Channel", "https://t.me/example"),
            ]],
        };
        let value = serde_json::to_value(&keyboard).unwrap();
        assert_eq!(value["inline_keyboard"][0][0]["callback_data"], "help");
        assert!(value["inline_keyboard"][0][0].get("url").is_none());
        assert_eq!(value["inline_keyboard"][0][1]["url"], "https://t.me/example");
    }

    #[test]
    fn test_strip_parse_mode() {
        let mut body = json!({"text": "x", "parse_mode": "Markdown"});
        strip_parse_mode(&mut body);
        assert!(body.get("parse_mode").is_none());
    }
}
