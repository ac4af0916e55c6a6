//! Persistence module
//!
//! Usage counters behind the [`CounterStore`] trait and the bot's user
//! registry, both stored as whole-file JSON documents.

pub mod counters;
pub mod users;

pub use counters::{CounterStore, JsonFileCounterStore, MemoryCounterStore, UsageCounters};
pub use users::{UserRecord, UserRegistry};

use crate::utils::error::{AppResult, ErrorContext};
use serde::{de::DeserializeOwned, Serialize};
use std::path::Path;

/// Well-known counter names
pub mod names {
    pub const TOTAL_USERS: &str = "total_users";
    pub const TOTAL_COMMANDS: &str = "total_commands";
    pub const AI_QUERIES: &str = "ai_queries";
    pub const AI_BACKEND_CALLS: &str = "ai_backend_calls";
    pub const MEDIA_DOWNLOADS: &str = "media_downloads";
    pub const HTTP_REQUESTS: &str = "http_requests";

    /// Counters present in a freshly created stats file
    pub const DEFAULTS: [&str; 4] = [TOTAL_USERS, TOTAL_COMMANDS, AI_QUERIES, MEDIA_DOWNLOADS];
}

/// Read and parse a whole JSON document
pub(crate) async fn read_json<T: DeserializeOwned>(path: &Path) -> AppResult<T> {
    let raw = tokio::fs::read(path)
        .await
        .storage_context(&format!("Failed to read {}", path.display()))?;
    serde_json::from_slice(&raw).storage_context(&format!("Failed to parse {}", path.display()))
}

/// Write a whole JSON document through a temp file and rename
///
/// Readers never observe a half-written file.
pub(crate) async fn write_json<T: Serialize>(path: &Path, value: &T) -> AppResult<()> {
    let body = serde_json::to_vec_pretty(value)?;
    let tmp = path.with_extension("json.tmp");

    tokio::fs::write(&tmp, &body)
        .await
        .storage_context(&format!("Failed to write {}", tmp.display()))?;
    tokio::fs::rename(&tmp, path)
        .await
        .storage_context(&format!("Failed to replace {}", path.display()))
}

/// Create the parent directory of `path` if needed
pub(crate) async fn ensure_parent(path: &Path) -> AppResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .storage_context(&format!("Failed to create {}", parent.display()))?;
    }
    Ok(())
}
