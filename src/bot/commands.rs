//! Bot command parsing and keyboards

use super::telegram::{InlineKeyboardButton, InlineKeyboardMarkup};
use crate::config::CreditsConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotCommand {
    Start,
    /// Question text, possibly empty
    Ai(String),
    Ping,
    Help,
    Time,
    Joke,
    Credits,
    Unknown(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackAction {
    Help,
    Features,
    BackStart,
}

/// Parse `/command[@botname] args`; plain text is not a command
pub fn parse_command(text: &str) -> Option<BotCommand> {
    let text = text.trim();
    let rest = text.strip_prefix('/')?;

    let (head, args) = match rest.split_once(char::is_whitespace) {
        Some((head, args)) => (head, args.trim()),
        None => (rest, ""),
    };
    let name = head.split('@').next().unwrap_or(head).to_lowercase();

    Some(match name.as_str() {
        "start" => BotCommand::Start,
        "ai" | "ask" => BotCommand::Ai(args.to_string()),
        "ping" => BotCommand::Ping,
        "help" => BotCommand::Help,
        "time" => BotCommand::Time,
        "joke" => BotCommand::Joke,
        "credits" => BotCommand::Credits,
        _ => BotCommand::Unknown(name),
    })
}

pub fn parse_callback(data: &str) -> Option<CallbackAction> {
    match data {
        "help" => Some(CallbackAction::Help),
        "features" => Some(CallbackAction::Features),
        "back_start" => Some(CallbackAction::BackStart),
        _ => None,
    }
}

/// `@handle` -> `https://t.me/handle`
fn telegram_link(handle: &str) -> String {
    format!("https://t.me/{}", handle.trim_start_matches('@'))
}

pub fn start_keyboard(credits: &CreditsConfig) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup {
        inline_keyboard: vec![
            vec![
                InlineKeyboardButton::callback("📚 Help", "help"),
                InlineKeyboardButton::callback("⚡ Features", "features"),
            ],
            vec![
                InlineKeyboardButton::link("👨‍💻 Developer", &telegram_link(&credits.developer)),
                InlineKeyboardButton::link("🔗 Channel", &telegram_link(&credits.channel)),
            ],
        ],
    }
}

pub fn back_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup {
        inline_keyboard: vec![vec![InlineKeyboardButton::callback("🔙 Back", "back_start")]],
    }
}
