//! File-based configuration loading
//!
//! Loads the service directory and credits metadata from an optional
//! JSON/TOML file, falling back to the built-in directory.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use tracing::{debug, info};

/// Application configuration loaded from file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Every external service the gateway talks to
    #[serde(default)]
    pub services: ServiceDirectory,

    /// Static metadata served by `/api/credits` and shown by the bot
    #[serde(default)]
    pub credits: CreditsConfig,
}

/// Static mapping of service identifier to base URL
///
/// AI backends are ordered; the ones flagged `fallback` form the
/// fallback chain in that order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceDirectory {
    #[serde(default = "default_ai_backends")]
    pub ai_backends: Vec<AiBackendConfig>,

    #[serde(default = "default_streaming_services")]
    pub streaming_services: BTreeMap<String, String>,
}

/// One AI answering backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiBackendConfig {
    /// Identifier reported as `source`
    pub id: String,

    /// Endpoint called with the question as query parameter
    pub base_url: String,

    /// Query parameter carrying the question
    #[serde(default = "default_query_param")]
    pub query_param: String,

    /// JSON fields checked for the answer, first present wins
    #[serde(default = "default_answer_fields")]
    pub answer_fields: Vec<String>,

    /// Member of the fallback chain (otherwise only used by the aggregated ask)
    #[serde(default = "default_true")]
    pub fallback: bool,
}

/// Credits metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditsConfig {
    pub service: String,
    pub developer: String,
    pub api_credits: String,
    pub channel: String,
    pub github: String,
    pub portfolio: String,
}

fn default_query_param() -> String {
    "q".to_string()
}

fn default_answer_fields() -> Vec<String> {
    vec!["answer".to_string(), "response".to_string()]
}

fn default_true() -> bool {
    true
}

fn default_ai_backends() -> Vec<AiBackendConfig> {
    vec![
        AiBackendConfig {
            id: "perplex_ai".to_string(),
            base_url: "https://perplex-pro.vercel.app/api".to_string(),
            query_param: "q".to_string(),
            answer_fields: vec!["answer".to_string(), "response".to_string()],
            fallback: true,
        },
        AiBackendConfig {
            id: "gpt4_ai".to_string(),
            base_url: "https://gpt-4-ask.vercel.app/ask".to_string(),
            query_param: "prompt".to_string(),
            answer_fields: vec!["response".to_string(), "answer".to_string()],
            fallback: true,
        },
        AiBackendConfig {
            id: "multi_ai".to_string(),
            base_url: "https://multi-ai-ask.vercel.app/api".to_string(),
            query_param: "q".to_string(),
            answer_fields: vec![
                "answer".to_string(),
                "response".to_string(),
                "result".to_string(),
            ],
            fallback: false,
        },
    ]
}

fn default_streaming_services() -> BTreeMap<String, String> {
    [
        ("primevideo", "https://primevideo.the-zake.workers.dev"),
        ("zee5", "https://zee5.the-zake.workers.dev"),
        ("appletv", "https://appletv.the-zake.workers.dev"),
        ("airtelxstream", "https://airtelxstream.the-zake.workers.dev"),
        ("sunnxt", "https://sunnxt.the-zake.workers.dev"),
        ("ahavideo", "https://ahavideo.the-zake.workers.dev"),
        ("iqiyi", "https://iqiyi.the-zake.workers.dev"),
        ("wetv", "https://wetv.the-zake.workers.dev"),
        ("shemaroo", "https://shemaroo.the-zake.workers.dev"),
        ("bookmyshow", "https://bookmyshow.the-zake.workers.dev"),
        ("plextv", "https://plextv.the-zake.workers.dev"),
        ("addatimes", "https://addatimes.the-zake.workers.dev"),
        ("stage", "https://stage.the-zake.workers.dev"),
        ("netflix", "https://netflix.the-zake.workers.dev"),
        ("spotify", "https://spotifydl.the-zake.workers.dev"),
    ]
    .into_iter()
    .map(|(id, url)| (id.to_string(), url.to_string()))
    .collect()
}

impl Default for ServiceDirectory {
    fn default() -> Self {
        Self {
            ai_backends: default_ai_backends(),
            streaming_services: default_streaming_services(),
        }
    }
}

impl Default for CreditsConfig {
    fn default() -> Self {
        Self {
            service: "Smart Utility Bot".to_string(),
            developer: "@al_rahim2".to_string(),
            api_credits: "@Offline_669".to_string(),
            channel: "@ahamed_068".to_string(),
            github: "https://github.com/ahamed-2".to_string(),
            portfolio: "https://ahamed-rahim.pages.dev/".to_string(),
        }
    }
}

impl ServiceDirectory {
    /// Base URL of a streaming service
    pub fn streaming_url(&self, service: &str) -> Option<&str> {
        self.streaming_services.get(service).map(String::as_str)
    }

    /// Look up an AI backend by id
    pub fn ai_backend(&self, id: &str) -> Option<&AiBackendConfig> {
        self.ai_backends.iter().find(|b| b.id == id)
    }

    /// Backends of the fallback chain, in order
    pub fn fallback_chain(&self) -> impl Iterator<Item = &AiBackendConfig> {
        self.ai_backends.iter().filter(|b| b.fallback)
    }

    /// Identifiers of all streaming services
    pub fn streaming_ids(&self) -> impl Iterator<Item = &str> {
        self.streaming_services.keys().map(String::as_str)
    }

    fn validate(&self) -> Result<()> {
        if self.fallback_chain().next().is_none() {
            anyhow::bail!("At least one AI backend must be part of the fallback chain");
        }

        let mut seen = HashSet::new();
        for backend in &self.ai_backends {
            if backend.id.is_empty() {
                anyhow::bail!("AI backend id cannot be empty");
            }
            if !seen.insert(backend.id.as_str()) {
                anyhow::bail!("Duplicate AI backend id '{}'", backend.id);
            }
            if !backend.base_url.starts_with("http") {
                anyhow::bail!("Invalid base URL for AI backend '{}': {}", backend.id, backend.base_url);
            }
            if backend.query_param.is_empty() {
                anyhow::bail!("AI backend '{}' must name a query parameter", backend.id);
            }
            if backend.answer_fields.is_empty() {
                anyhow::bail!("AI backend '{}' must list at least one answer field", backend.id);
            }
        }

        for (id, url) in &self.streaming_services {
            if id.is_empty() || id.chars().any(|c| c.is_uppercase() || c.is_whitespace()) {
                anyhow::bail!("Invalid streaming service id '{}', use lowercase without spaces", id);
            }
            if !url.starts_with("http") {
                anyhow::bail!("Invalid base URL for streaming service '{}': {}", id, url);
            }
        }

        Ok(())
    }
}

impl AppConfig {
    /// Load configuration from a JSON or TOML file
    ///
    /// `SMARTUTIL_`-prefixed environment variables override file values,
    /// e.g. `SMARTUTIL_CREDITS__CHANNEL`.
    pub fn load(path: &Path) -> Result<Self> {
        info!("Loading configuration from: {:?}", path);

        let config: AppConfig = config::Config::builder()
            .add_source(config::File::from(path.to_path_buf()))
            .add_source(
                config::Environment::with_prefix("SMARTUTIL")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .with_context(|| format!("Failed to read config file: {:?}", path))?
            .try_deserialize()
            .with_context(|| "Failed to parse configuration")?;

        config.validate()?;

        debug!(
            "Loaded {} AI backends and {} streaming services",
            config.services.ai_backends.len(),
            config.services.streaming_services.len()
        );
        Ok(config)
    }

    /// Load configuration from default locations
    /// Searches in order:
    /// 1. ~/.config/smartutil/smartutil.json
    /// 2. ./smartutil.json
    ///
    /// Uses the built-in directory when neither exists.
    pub fn load_default() -> Result<Self> {
        if let Some(home) = dirs::home_dir() {
            let config_path = home.join(".config").join("smartutil").join("smartutil.json");
            if config_path.exists() {
                return Self::load(&config_path);
            }
        }

        let local_path = Path::new("smartutil.json");
        if local_path.exists() {
            return Self::load(local_path);
        }

        info!("No configuration file found, using built-in service directory");
        let config = Self::default();
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.services.validate()
    }
}
