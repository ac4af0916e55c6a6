//! Smart utility gateway server
//!
//! Serves the HTTP API and, when enabled, runs the Telegram bot next to it

use anyhow::{Context, Result};
use smartutil::bot::Bot;
use smartutil::config::{AppConfig, Settings};
use smartutil::handlers::{router_with_state, AppState};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Settings first: they carry the log configuration
    let settings = Settings::new().context("Failed to load server settings")?;

    init_logging(&settings.logging.level, &settings.logging.format)?;
    info!("{}", smartutil::version_info());

    let app_config = AppConfig::load_default().context("Failed to load service directory")?;
    info!(
        "📁 Service directory loaded: {} AI backends, {} streaming services",
        app_config.services.ai_backends.len(),
        app_config.services.streaming_services.len()
    );

    let state = Arc::new(AppState::build(settings.clone(), app_config).await?);
    let app = router_with_state(state.clone());

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let bot_task = if settings.bot.enabled {
        let bot = Bot::new(state.clone())?;
        let mut rx = shutdown_rx.clone();
        Some(tokio::spawn(async move {
            bot.run(async move {
                let _ = rx.changed().await;
            })
            .await
        }))
    } else {
        info!("Bot disabled (set BOT_ENABLED=true and BOT_TOKEN to enable)");
        None
    };

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("🚀 Smart utility server started!");
    info!("📝 Health check: http://{}/health", addr);
    info!("🤖 AI endpoint: http://{}/api/ai?q=", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!("Failed to start server: {}", e))?;

    let _ = shutdown_tx.send(true);
    if let Some(task) = bot_task {
        let _ = task.await;
    }

    Ok(())
}

/// Initialize logging system
fn init_logging(level: &str, format: &str) -> Result<()> {
    let subscriber: Box<dyn tracing::Subscriber + Send + Sync> = if format == "json" {
        // JSON format logs (production environment)
        Box::new(
            tracing_subscriber::fmt()
                .with_env_filter(level)
                .json()
                .with_current_span(false)
                .with_span_list(false)
                .finish(),
        )
    } else {
        // Human readable format (development environment)
        Box::new(
            tracing_subscriber::fmt()
                .with_env_filter(level)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .finish(),
        )
    };

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    info!("Logging system initialized");
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("Shutdown signal received");
}
