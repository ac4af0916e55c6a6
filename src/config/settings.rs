//! Application configuration settings
//!
//! Runtime settings loaded from environment variables (and `.env`)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Server configuration
    pub server: ServerConfig,
    /// Outbound request timeouts
    pub timeouts: TimeoutConfig,
    /// AI fallback heuristics
    pub fallback: FallbackConfig,
    /// Counter and user persistence
    pub storage: StorageConfig,
    /// Streaming proxy configuration
    pub stream: StreamConfig,
    /// Chat bot configuration
    pub bot: BotConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen host
    pub host: String,
    /// Listen port
    pub port: u16,
}

/// Per-call timeouts in seconds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutConfig {
    /// AI backend calls
    pub ai: u64,
    /// Streaming service calls (media extraction is slower)
    pub stream: u64,
    /// Reachability probes
    pub status: u64,
}

/// When an AI answer counts as unusable
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallbackConfig {
    /// Answers shorter than this (in chars) trigger the next backend
    pub min_answer_chars: usize,
    /// Answers containing any of these trigger the next backend
    pub error_markers: Vec<String>,
}

/// Persistence configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding stats.json and users.json
    pub data_dir: PathBuf,
    /// Write counters to disk; when false they live in memory only
    pub persist: bool,
}

/// Streaming proxy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Default truncation for proxied bodies (None = verbatim)
    pub display_limit: Option<usize>,
    /// Largest upstream body accepted, in bytes
    pub max_body_bytes: usize,
}

/// Chat bot configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    /// Whether the bot polling task is started
    pub enabled: bool,
    /// Bot token, required when enabled
    #[serde(skip_serializing)]
    pub token: Option<String>,
    /// Bot API base URL
    pub api_url: String,
    /// Long-polling timeout in seconds
    pub poll_timeout: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    pub level: String,
    /// Log format (text/json)
    pub format: String,
}

impl Settings {
    /// Create a new configuration instance
    pub fn new() -> Result<Self> {
        // Load .env file if it exists
        dotenv::dotenv().ok();

        let port = env::var("SERVER_PORT")
            .or_else(|_| env::var("PORT"))
            .unwrap_or_else(|_| "8080".to_string());

        let display_limit = match env::var("STREAM_DISPLAY_LIMIT") {
            Ok(v) if !v.trim().is_empty() => Some(
                v.trim().parse().context("Invalid stream display limit")?,
            ),
            _ => None,
        };

        let settings = Self {
            server: ServerConfig {
                host: get_env_or_default("SERVER_HOST", "0.0.0.0"),
                port: port.parse().context("Invalid port number")?,
            },
            timeouts: TimeoutConfig {
                ai: get_env_or_default("AI_TIMEOUT", "30")
                    .parse()
                    .context("Invalid AI timeout")?,
                stream: get_env_or_default("STREAM_TIMEOUT", "60")
                    .parse()
                    .context("Invalid stream timeout")?,
                status: get_env_or_default("STATUS_TIMEOUT", "5")
                    .parse()
                    .context("Invalid status timeout")?,
            },
            fallback: FallbackConfig {
                min_answer_chars: get_env_or_default("FALLBACK_MIN_ANSWER_CHARS", "10")
                    .parse()
                    .context("Invalid minimum answer length")?,
                error_markers: get_env_or_default("FALLBACK_ERROR_MARKERS", "ত্রুটি")
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            },
            storage: StorageConfig {
                data_dir: env::var("DATA_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| default_data_dir()),
                persist: get_env_or_default("PERSIST_STATS", "true")
                    .parse()
                    .context("Invalid PERSIST_STATS flag")?,
            },
            stream: StreamConfig {
                display_limit,
                max_body_bytes: get_env_or_default("STREAM_MAX_BODY_BYTES", "52428800")
                    .parse()
                    .context("Invalid stream body limit")?,
            },
            bot: BotConfig {
                enabled: get_env_or_default("BOT_ENABLED", "false")
                    .parse()
                    .context("Invalid BOT_ENABLED flag")?,
                token: env::var("BOT_TOKEN").ok().filter(|t| !t.trim().is_empty()),
                api_url: get_env_or_default("TELEGRAM_API_URL", "https://api.telegram.org"),
                poll_timeout: get_env_or_default("BOT_POLL_TIMEOUT", "30")
                    .parse()
                    .context("Invalid bot poll timeout")?,
            },
            logging: LoggingConfig {
                level: get_env_or_default("RUST_LOG", "info"),
                format: get_env_or_default("LOG_FORMAT", "text"),
            },
        };

        settings.validate()?;

        Ok(settings)
    }

    /// Validate configuration validity
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            anyhow::bail!("Port number cannot be 0");
        }

        if self.timeouts.ai == 0 || self.timeouts.stream == 0 || self.timeouts.status == 0 {
            anyhow::bail!("Timeout values cannot be 0");
        }

        // Media extraction is slower than answering; keep the ordering sane
        if self.timeouts.stream < self.timeouts.ai {
            anyhow::bail!(
                "Stream timeout ({}s) must not be shorter than AI timeout ({}s)",
                self.timeouts.stream,
                self.timeouts.ai
            );
        }

        if self.stream.display_limit == Some(0) {
            anyhow::bail!("Stream display limit cannot be 0");
        }

        if self.stream.max_body_bytes == 0 {
            anyhow::bail!("Stream body limit cannot be 0");
        }

        if self.bot.enabled {
            match &self.bot.token {
                None => anyhow::bail!("BOT_ENABLED is true but BOT_TOKEN is not set"),
                Some(token) if token.contains(char::is_whitespace) || !token.contains(':') => {
                    anyhow::bail!("BOT_TOKEN is malformed, expected '<id>:<secret>'")
                }
                Some(_) => {}
            }
            if !self.bot.api_url.starts_with("http") {
                anyhow::bail!("Invalid bot API URL format, should start with 'http'");
            }
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            anyhow::bail!("Invalid log level: {}", self.logging.level);
        }

        let valid_formats = ["text", "json"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            anyhow::bail!("Invalid log format: {}", self.logging.format);
        }

        Ok(())
    }

    /// Path of the counters file
    pub fn stats_file(&self) -> PathBuf {
        self.storage.data_dir.join("stats.json")
    }

    /// Path of the user registry file
    pub fn users_file(&self) -> PathBuf {
        self.storage.data_dir.join("users.json")
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            timeouts: TimeoutConfig {
                ai: 30,
                stream: 60,
                status: 5,
            },
            fallback: FallbackConfig {
                min_answer_chars: 10,
                error_markers: vec!["ত্রুটি".to_string()],
            },
            storage: StorageConfig {
                data_dir: default_data_dir(),
                persist: false,
            },
            stream: StreamConfig {
                display_limit: None,
                max_body_bytes: 50 * 1024 * 1024,
            },
            bot: BotConfig {
                enabled: false,
                token: None,
                api_url: "https://api.telegram.org".to_string(),
                poll_timeout: 30,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "text".to_string(),
            },
        }
    }
}

/// Get environment variable or default value
fn get_env_or_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// `/tmp/data` on hosts that have `/tmp` (serverless), `./data` otherwise
fn default_data_dir() -> PathBuf {
    if std::path::Path::new("/tmp").exists() {
        PathBuf::from("/tmp/data")
    } else {
        PathBuf::from("data")
    }
}
