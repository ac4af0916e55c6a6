//! Bot user registry, keyed by numeric user id

use super::{ensure_parent, names, read_json, write_json, CounterStore};
use crate::utils::error::AppResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub username: String,
    pub first_name: String,
    pub joined: DateTime<Utc>,
    #[serde(default)]
    pub commands_used: u64,
}

/// Registered users, mirrored to `users.json` when a path is set
pub struct UserRegistry {
    path: Option<PathBuf>,
    users: Mutex<BTreeMap<String, UserRecord>>,
    counters: Arc<dyn CounterStore>,
}

impl UserRegistry {
    /// Registry that lives in memory only
    pub fn in_memory(counters: Arc<dyn CounterStore>) -> Self {
        Self {
            path: None,
            users: Mutex::new(BTreeMap::new()),
            counters,
        }
    }

    /// Open the registry file, creating an empty one if missing
    pub async fn open(path: impl Into<PathBuf>, counters: Arc<dyn CounterStore>) -> AppResult<Self> {
        let path = path.into();
        ensure_parent(&path).await?;

        let users: BTreeMap<String, UserRecord> = if tokio::fs::metadata(&path).await.is_ok() {
            read_json(&path).await?
        } else {
            info!("Creating user registry at {}", path.display());
            let empty = BTreeMap::new();
            write_json(&path, &empty).await?;
            empty
        };

        Ok(Self {
            path: Some(path),
            users: Mutex::new(users),
            counters,
        })
    }

    /// Register a user; returns false when already known or not persisted
    pub async fn add_user(&self, user_id: i64, username: &str, first_name: &str) -> bool {
        let key = user_id.to_string();
        let mut users = self.users.lock().await;
        if users.contains_key(&key) {
            return false;
        }

        users.insert(
            key.clone(),
            UserRecord {
                username: username.to_string(),
                first_name: first_name.to_string(),
                joined: Utc::now(),
                commands_used: 0,
            },
        );

        if let Err(e) = self.persist(&users).await {
            warn!("Database error while adding user {}: {}", user_id, e);
            users.remove(&key);
            return false;
        }
        drop(users);

        self.counters.increment(names::TOTAL_USERS).await;
        true
    }

    /// Bump the per-user command count, ignoring unknown users
    pub async fn record_command(&self, user_id: i64) {
        let mut users = self.users.lock().await;
        let Some(user) = users.get_mut(&user_id.to_string()) else {
            return;
        };
        user.commands_used += 1;

        if let Err(e) = self.persist(&users).await {
            warn!("Database error while recording command for {}: {}", user_id, e);
        }
    }

    pub async fn get(&self, user_id: i64) -> Option<UserRecord> {
        self.users.lock().await.get(&user_id.to_string()).cloned()
    }

    pub async fn len(&self) -> usize {
        self.users.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    async fn persist(&self, users: &BTreeMap<String, UserRecord>) -> AppResult<()> {
        match &self.path {
            Some(path) => write_json(path, users).await,
            None => Ok(()),
        }
    }
}
