mod config;
mod handlers;
mod models;
mod services;
mod web; // Upload page and routes

use anyhow::{Context, Result};
use dotenv::dotenv;
use std::sync::Arc;

use config::Config;
use handlers::SessionStore;
use services::{Analyzer, InferenceClient, OpenAiService};
use web::{server::create_router, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logger
    env_logger::init();

    log::info!("🚀 Starting Calorie Advisor...");

    let config = Config::from_env()?;

    let openai: Arc<dyn InferenceClient> = Arc::new(OpenAiService::new(
        config.openai_api_key.clone(),
        config.openai_model.clone(),
        config.openai_base_url.clone(),
        config.openai_max_tokens,
    ));
    log::info!("✅ OpenAI service initialized with model: {}", config.openai_model);

    let analyzer = Arc::new(Analyzer::new(openai, config.mime_label));
    let sessions = Arc::new(SessionStore::new(config.session_idle, config.session_limit));
    log::info!(
        "✅ Session store ready (idle expiry: {} min, limit: {})",
        config.session_idle.num_minutes(),
        config.session_limit
    );

    let state = AppState::new(analyzer, sessions, &config.session_secret);
    let app = create_router(state, config.max_upload_bytes, &config.static_dir);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;

    log::info!("🌐 Server listening on http://{}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                log::error!("❌ Failed to listen for Ctrl+C: {}", e);
            }
        })
        .await
        .context("Server error")?;

    log::info!("🛑 Shutting down...");

    Ok(())
}
