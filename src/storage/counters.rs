//! Usage counter store
//!
//! `increment` is best-effort: persistence failures are logged and
//! swallowed, callers never see them. The file store's `read` is too: when the
//! file cannot be read it serves the last snapshot it saw.

use super::{ensure_parent, names, read_json, write_json};
use crate::utils::error::AppResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info, warn};

/// Named counters plus bookkeeping timestamps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageCounters {
    pub counters: BTreeMap<String, u64>,
    pub start_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
}

impl UsageCounters {
    /// Fresh counters with the default names set to zero
    pub fn new() -> Self {
        Self {
            counters: names::DEFAULTS.iter().map(|n| (n.to_string(), 0)).collect(),
            start_time: Utc::now(),
            last_updated: None,
        }
    }

    /// Current value of a counter (0 when never incremented)
    pub fn get(&self, name: &str) -> u64 {
        self.counters.get(name).copied().unwrap_or(0)
    }

    fn bump(&mut self, name: &str, by: u64) {
        let slot = self.counters.entry(name.to_string()).or_insert(0);
        *slot = slot.saturating_add(by);
        self.last_updated = Some(Utc::now());
    }
}

impl Default for UsageCounters {
    fn default() -> Self {
        Self::new()
    }
}

/// Store of named usage counters
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Add `by` to a counter; never fails the caller
    async fn increment_by(&self, name: &str, by: u64);

    /// Snapshot of every counter
    async fn read(&self) -> AppResult<UsageCounters>;

    /// Add one to a counter
    async fn increment(&self, name: &str) {
        self.increment_by(name, 1).await
    }
}

/// Counters kept in memory behind a single mutex
#[derive(Debug, Default)]
pub struct MemoryCounterStore {
    inner: Mutex<UsageCounters>,
}

impl MemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CounterStore for MemoryCounterStore {
    async fn increment_by(&self, name: &str, by: u64) {
        let mut counters = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        counters.bump(name, by);
    }

    async fn read(&self) -> AppResult<UsageCounters> {
        Ok(self.inner.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }
}

/// Counters persisted as one JSON file, rewritten on every increment
///
/// Each increment reads the whole file, bumps one field and writes the
/// whole file back. Increments from this process are serialized; other
/// processes sharing the file can still lose updates (last writer wins).
#[derive(Debug)]
pub struct JsonFileCounterStore {
    path: PathBuf,
    lock: tokio::sync::Mutex<()>,
    /// Last snapshot read from or written to disk
    last: Mutex<UsageCounters>,
}

impl JsonFileCounterStore {
    /// Open the store, creating the directory and a default file if missing
    pub async fn open(path: impl Into<PathBuf>) -> AppResult<Self> {
        let path = path.into();
        ensure_parent(&path).await?;

        let last = if tokio::fs::metadata(&path).await.is_err() {
            info!("Creating stats file at {}", path.display());
            let fresh = UsageCounters::new();
            write_json(&path, &fresh).await?;
            fresh
        } else {
            read_json(&path).await.unwrap_or_else(|e| {
                warn!("Stats file unreadable on open: {}", e);
                UsageCounters::new()
            })
        };

        Ok(Self {
            path,
            lock: tokio::sync::Mutex::new(()),
            last: Mutex::new(last),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn remember(&self, counters: &UsageCounters) {
        *self.last.lock().unwrap_or_else(|e| e.into_inner()) = counters.clone();
    }

    fn last_known(&self) -> UsageCounters {
        self.last.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Current file contents, or the last known snapshot when unreadable
    async fn load_or_last(&self) -> UsageCounters {
        match read_json(&self.path).await {
            Ok(counters) => {
                self.remember(&counters);
                counters
            }
            Err(e) => {
                warn!("Stats file unreadable, using last known counters: {}", e);
                self.last_known()
            }
        }
    }
}

#[async_trait]
impl CounterStore for JsonFileCounterStore {
    async fn increment_by(&self, name: &str, by: u64) {
        let _guard = self.lock.lock().await;

        let mut counters = self.load_or_last().await;
        counters.bump(name, by);
        self.remember(&counters);

        match write_json(&self.path, &counters).await {
            Ok(()) => debug!("Counter {} = {}", name, counters.get(name)),
            Err(e) => warn!("Stats update error for {}: {}", name, e),
        }
    }

    async fn read(&self) -> AppResult<UsageCounters> {
        Ok(self.load_or_last().await)
    }
}
