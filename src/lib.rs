//! Smart utility gateway library
//!
//! Aggregates third-party AI answer and media streaming APIs behind one HTTP
//! surface and a Telegram bot

pub mod backends;
pub mod bot;
pub mod config;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod storage;
pub mod utils;

// Re-export common types
pub use config::{AppConfig, Settings};
pub use handlers::{create_router, router_with_state, AppState};
pub use services::{FallbackDispatcher, StreamProxy};
pub use storage::{CounterStore, JsonFileCounterStore, MemoryCounterStore};
pub use utils::error::{AppError, AppResult};

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Library description
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Get version information
pub fn version_info() -> String {
    format!("{} v{} - {}", NAME, VERSION, DESCRIPTION)
}
