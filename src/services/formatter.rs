//! Response formatter
//!
//! Human-readable (Markdown) replies for the chat bot

use crate::config::CreditsConfig;
use crate::models::{AiOutcome, CityTime};
use crate::storage::{names, UsageCounters};
use crate::utils::text::truncate_chars;

/// Longest error excerpt shown to a user
const MAX_ERROR_CHARS: usize = 200;

fn footer(credits: &CreditsConfig) -> String {
    format!("⚡ *Powered by {}*\n📢 *Channel: {}*", credits.developer, credits.channel)
}

pub fn ai_answer(outcome: &AiOutcome, credits: &CreditsConfig) -> String {
    match outcome {
        AiOutcome::Success { source, answer } => format!(
            "🤖 *AI answer* _(via {})_\n\n{}\n\n✨ *More help:* `/help`\n\n{}\n🔌 *API Credits: {}*",
            source,
            answer,
            footer(credits),
            credits.api_credits
        ),
        AiOutcome::Failure { error, .. } => error_message(error, "the AI service is temporarily unavailable."),
    }
}

pub fn error_message(error: &str, hint: &str) -> String {
    format!(
        "❌ *Something went wrong:*\n\n`{}`\n\nSorry, {}",
        truncate_chars(error, MAX_ERROR_CHARS),
        hint
    )
}

pub fn ai_usage() -> String {
    "❌ *Usage:* `/ai [your question]`".to_string()
}

pub fn ai_thinking() -> String {
    "🤖 *AI is thinking...*".to_string()
}

pub fn welcome(first_name: Option<&str>, credits: &CreditsConfig) -> String {
    format!(
        "🎉 *Welcome {}!* 🎉\n\n\
         🤖 Welcome to *{}*!\n\n\
         *Quick start:*\n\
         • `/ai [question]` - talk to the AI\n\
         • `/time` - world clock\n\
         • `/joke` - a random joke\n\n\
         *More features:* `/help`\n\n\
         👨‍💻 *Developer:* {}\n\
         🔗 *Channel:* {}\n\
         🌐 *GitHub:* {}",
        first_name.filter(|n| !n.is_empty()).unwrap_or("friend"),
        credits.service,
        credits.developer,
        credits.channel,
        credits.github
    )
}

pub fn welcome_back(first_name: Option<&str>) -> String {
    format!(
        "🎉 *Welcome {}!*\n\nWhat can I help you with?",
        first_name.filter(|n| !n.is_empty()).unwrap_or("friend")
    )
}

pub fn help(credits: &CreditsConfig) -> String {
    format!(
        "🤖 *{} - Help*\n\n\
         *Main commands:*\n\
         • `/ai [question]` - AI chat\n\
         • `/ping` - bot status\n\
         • `/time` - world clock\n\n\
         *Utilities:*\n\
         • `/joke` - a joke\n\
         • `/credits` - credits\n\n\
         {}",
        credits.service,
        footer(credits)
    )
}

pub fn help_pointer(credits: &CreditsConfig) -> String {
    format!(
        "ℹ️ *For help:* use the `/help` command\n\nOr visit:\n• GitHub: {}\n• Portfolio: {}\n\n{}",
        credits.github,
        credits.portfolio,
        footer(credits)
    )
}

pub fn features(credits: &CreditsConfig) -> String {
    format!(
        "⚡ *Main features:*\n\n\
         • AI chat with automatic fallback between backends\n\
         • World clock\n\
         • Utility commands\n\n\
         See everything: `/help`\n\n{}",
        footer(credits)
    )
}

pub fn ping(latency_ms: f64, stats: &UsageCounters, credits: &CreditsConfig) -> String {
    format!(
        "🏓 *Pong!*\n\n\
         ⏱️ *Latency:* `{:.2}ms`\n\
         👥 *Users:* `{}`\n\
         📊 *Commands:* `{}`\n\
         🤖 *AI queries:* `{}`\n\n\
         ✅ *Bot status:* active\n\n{}",
        latency_ms,
        stats.get(names::TOTAL_USERS),
        stats.get(names::TOTAL_COMMANDS),
        stats.get(names::AI_QUERIES),
        footer(credits)
    )
}

pub fn world_clock(times: &[CityTime], credits: &CreditsConfig) -> String {
    let mut text = String::from("🕒 *World time*\n\n");
    for t in times {
        text.push_str(&format!("• *{}:* `{}`\n", display_city(&t.city), t.display));
    }
    text.push('\n');
    text.push_str(&format!("⚡ *Powered by {}*", credits.developer));
    text
}

pub fn joke(joke: &str) -> String {
    format!("😂 {}", joke)
}

pub fn credits(credits: &CreditsConfig) -> String {
    format!(
        "🙏 *Credits*\n\n\
         👨‍💻 *Developer:* {}\n\
         🔌 *API Credits:* {}\n\
         📢 *Channel:* {}\n\
         🌐 *GitHub:* {}\n\
         💼 *Portfolio:* {}",
        credits.developer, credits.api_credits, credits.channel, credits.github, credits.portfolio
    )
}

pub fn unknown_command() -> String {
    "🤔 Unknown command. Try `/help`.".to_string()
}

/// `new_york` -> `New York`
fn display_city(city: &str) -> String {
    city.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
