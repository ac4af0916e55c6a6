//! HTTP handlers module
//!
//! Contains all HTTP endpoint handling logic

pub mod ai;
pub mod health;
pub mod stream;
pub mod utility;

use crate::config::{AppConfig, Settings};
use crate::middleware::logging::request_logging_middleware;
use crate::services::{FallbackDispatcher, StatusChecker, StreamProxy};
use crate::storage::{CounterStore, JsonFileCounterStore, MemoryCounterStore, UserRegistry};
use anyhow::Result;
use axum::{middleware::from_fn_with_state, routing::get, Router};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub settings: Settings,
    pub config: AppConfig,
    pub counters: Arc<dyn CounterStore>,
    pub users: Arc<UserRegistry>,
    pub dispatcher: Arc<FallbackDispatcher>,
    pub proxy: Arc<StreamProxy>,
    pub status: Arc<StatusChecker>,
    /// Set by the bot task while it is polling
    pub bot_running: Arc<AtomicBool>,
}

impl AppState {
    /// Build state with the stores chosen by `settings`
    ///
    /// Storage that cannot be opened degrades to memory; stats are best-effort.
    pub async fn build(settings: Settings, config: AppConfig) -> Result<Self> {
        let counters: Arc<dyn CounterStore> = if settings.storage.persist {
            match JsonFileCounterStore::open(settings.stats_file()).await {
                Ok(store) => Arc::new(store),
                Err(e) => {
                    warn!("Stats file unavailable, counting in memory only: {}", e);
                    Arc::new(MemoryCounterStore::new())
                }
            }
        } else {
            Arc::new(MemoryCounterStore::new())
        };

        let users = if settings.storage.persist {
            match UserRegistry::open(settings.users_file(), counters.clone()).await {
                Ok(registry) => registry,
                Err(e) => {
                    warn!("User registry unavailable, keeping users in memory: {}", e);
                    UserRegistry::in_memory(counters.clone())
                }
            }
        } else {
            UserRegistry::in_memory(counters.clone())
        };

        Self::with_stores(settings, config, counters, Arc::new(users))
    }

    /// Build state around caller-provided stores
    pub fn with_stores(
        settings: Settings,
        config: AppConfig,
        counters: Arc<dyn CounterStore>,
        users: Arc<UserRegistry>,
    ) -> Result<Self> {
        let directory = Arc::new(config.services.clone());

        let dispatcher = FallbackDispatcher::from_directory(&directory, &settings, counters.clone())?;
        let proxy = StreamProxy::new(directory.clone(), &settings, counters.clone())?;
        let status = StatusChecker::new(directory, &settings)?;

        Ok(Self {
            settings,
            config,
            counters,
            users,
            dispatcher: Arc::new(dispatcher),
            proxy: Arc::new(proxy),
            status: Arc::new(status),
            bot_running: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn is_bot_running(&self) -> bool {
        self.bot_running.load(Ordering::Relaxed)
    }
}

/// Create application router
pub async fn create_router(settings: Settings, config: AppConfig) -> Result<Router> {
    let state = AppState::build(settings, config).await?;
    Ok(router_with_state(Arc::new(state)))
}

/// Create the router around an existing state
pub fn router_with_state(app_state: Arc<AppState>) -> Router {
    let middleware_stack = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    Router::new()
        .route("/", get(health::home))
        .route("/health", get(health::health_check))
        .route("/api/status", get(health::api_status))
        .route("/api/ai", get(ai::handle_ai))
        .route("/api/ask", get(ai::handle_ask))
        .route("/api/stream", get(stream::handle_stream))
        .route("/api/joke", get(utility::joke))
        .route("/api/stats", get(utility::stats))
        .route("/api/credits", get(utility::credits))
        .route("/api/utility/time", get(utility::city_time))
        .layer(from_fn_with_state(app_state.clone(), request_logging_middleware))
        .with_state(app_state)
        .layer(middleware_stack)
}
