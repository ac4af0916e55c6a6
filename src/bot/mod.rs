//! Chat bot module
//!
//! Long-polls the Telegram Bot API and answers commands using the same
//! services as the HTTP surface

pub mod commands;
pub mod telegram;

use crate::handlers::AppState;
use crate::services::{formatter, jokes, world_time};
use crate::storage::names;
use crate::utils::error::AppResult;
use anyhow::{Context, Result};
use commands::{
    back_keyboard, parse_callback, parse_command, start_keyboard, BotCommand, CallbackAction,
};
use std::future::Future;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};
use telegram::{CallbackQuery, Message, TelegramClient, Update};
use tracing::{debug, error, info, warn};

/// Pause after a failed poll before polling again
const POLL_ERROR_PAUSE: Duration = Duration::from_secs(5);

pub struct Bot {
    client: TelegramClient,
    state: Arc<AppState>,
    poll_timeout: u64,
}

impl Bot {
    /// Create the bot; fails when no token is configured
    pub fn new(state: Arc<AppState>) -> Result<Self> {
        let bot = &state.settings.bot;
        let token = bot
            .token
            .as_deref()
            .context("BOT_TOKEN is required to start the bot")?;
        let client = TelegramClient::new(&bot.api_url, token, bot.poll_timeout)?;
        let poll_timeout = bot.poll_timeout;

        Ok(Self {
            client,
            state,
            poll_timeout,
        })
    }

    /// Poll until `shutdown` resolves
    pub async fn run(self, shutdown: impl Future<Output = ()>) {
        tokio::pin!(shutdown);
        let mut offset = 0_i64;

        self.state.bot_running.store(true, Ordering::Relaxed);
        info!("🤖 Telegram bot started");

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                polled = self.client.get_updates(offset, self.poll_timeout) => match polled {
                    Ok(updates) => {
                        for update in updates {
                            offset = offset.max(update.update_id + 1);
                            if let Err(e) = self.process_update(update).await {
                                warn!("Failed to handle update: {}", e);
                            }
                        }
                    }
                    Err(e) => {
                        error!("Polling failed: {}", e);
                        tokio::time::sleep(POLL_ERROR_PAUSE).await;
                    }
                }
            }
        }

        self.state.bot_running.store(false, Ordering::Relaxed);
        info!("Telegram bot stopped");
    }

    /// Handle one update
    pub async fn process_update(&self, update: Update) -> AppResult<()> {
        if let Some(query) = update.callback_query {
            return self.handle_callback(query).await;
        }

        let Some(message) = update.message else {
            return Ok(());
        };
        let Some(command) = message.text.as_deref().and_then(parse_command) else {
            return Ok(());
        };

        debug!("Command {:?} from chat {}", command, message.chat.id);
        self.handle_command(command, &message).await
    }

    async fn handle_command(&self, command: BotCommand, message: &Message) -> AppResult<()> {
        let chat_id = message.chat.id;
        let credits = &self.state.config.credits;

        self.state.counters.increment(names::TOTAL_COMMANDS).await;
        if let Some(user) = &message.from {
            // Register first so the /start that creates the user is counted
            if command == BotCommand::Start {
                self.state
                    .users
                    .add_user(user.id, user.username.as_deref().unwrap_or(""), &user.first_name)
                    .await;
            }
            self.state.users.record_command(user.id).await;
        }

        match command {
            BotCommand::Start => {
                let first_name = message.from.as_ref().map(|u| u.first_name.as_str());
                self.client
                    .send_message(
                        chat_id,
                        &formatter::welcome(first_name, credits),
                        Some(&start_keyboard(credits)),
                    )
                    .await?;
            }
            BotCommand::Ai(question) if question.is_empty() => {
                self.client.send_message(chat_id, &formatter::ai_usage(), None).await?;
            }
            BotCommand::Ai(question) => {
                self.state.counters.increment(names::AI_QUERIES).await;
                let pending = self
                    .client
                    .send_message(chat_id, &formatter::ai_thinking(), None)
                    .await?;

                let text = match self.state.dispatcher.ask(&question).await {
                    Ok(outcome) => formatter::ai_answer(&outcome, credits),
                    Err(e) => formatter::error_message(
                        &e.to_string(),
                        "the AI service is temporarily unavailable.",
                    ),
                };
                self.client
                    .edit_message_text(chat_id, pending.message_id, &text, None)
                    .await?;
            }
            BotCommand::Ping => {
                let started = Instant::now();
                let pending = self.client.send_message(chat_id, "🏓 *Ping...*", None).await?;
                let latency_ms = started.elapsed().as_secs_f64() * 1000.0;

                let stats = self.state.counters.read().await.unwrap_or_default();
                self.client
                    .edit_message_text(
                        chat_id,
                        pending.message_id,
                        &formatter::ping(latency_ms, &stats, credits),
                        None,
                    )
                    .await?;
            }
            BotCommand::Help => {
                self.client.send_message(chat_id, &formatter::help(credits), None).await?;
            }
            BotCommand::Time => {
                let text = formatter::world_clock(&world_time::all_cities(), credits);
                self.client.send_message(chat_id, &text, None).await?;
            }
            BotCommand::Joke => {
                let text = formatter::joke(jokes::random_joke());
                self.client.send_message(chat_id, &text, None).await?;
            }
            BotCommand::Credits => {
                self.client.send_message(chat_id, &formatter::credits(credits), None).await?;
            }
            BotCommand::Unknown(name) => {
                debug!("Unknown command /{}", name);
                self.client.send_message(chat_id, &formatter::unknown_command(), None).await?;
            }
        }

        Ok(())
    }

    async fn handle_callback(&self, query: CallbackQuery) -> AppResult<()> {
        let credits = &self.state.config.credits;
        let action = query.data.as_deref().and_then(parse_callback);

        if let (Some(action), Some(message)) = (action, &query.message) {
            let (text, keyboard) = match action {
                CallbackAction::Help => (formatter::help_pointer(credits), back_keyboard()),
                CallbackAction::Features => (formatter::features(credits), back_keyboard()),
                CallbackAction::BackStart => (
                    formatter::welcome_back(Some(&query.from.first_name)),
                    start_keyboard(credits),
                ),
            };
            self.client
                .edit_message_text(message.chat.id, message.message_id, &text, Some(&keyboard))
                .await?;
        }

        self.client.answer_callback_query(&query.id).await
    }
}
