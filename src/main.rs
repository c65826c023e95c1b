mod api_client;
mod bot;
mod compositor;
mod config;
mod frame;
mod handlers;
mod health;
mod messages;
mod pipeline;
mod transport;

use anyhow::{Context, Result};
use api_client::ApiClient;
use config::Config;
use frame::Frame;
use pipeline::Pipeline;
use std::sync::Arc;
use teloxide::prelude::*;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    if let Err(e) = dotenvy::dotenv() {
        info!("No .env file loaded ({}), using process environment", e);
    }
    let config = Config::from_env()?;

    info!("Starting Telegram bot...");
    info!("Configuration: {:?}", config);

    // The bot cannot run without its frame
    let frame = Frame::load(&config.frame_path, config.frame_size)
        .with_context(|| format!("Failed to load frame from {}", config.frame_path.display()))?;
    compositor::content_area(frame.width(), frame.height(), config.frame_padding)
        .context("Frame size does not leave room for content")?;
    info!(
        "Frame loaded: {}x{}, padding {}",
        frame.width(),
        frame.height(),
        config.frame_padding
    );

    let api_client = ApiClient::new(
        config.remove_bg_url.clone(),
        config.remove_bg_api_key.clone(),
        config.http_timeout,
    )?;
    let pipeline = Arc::new(Pipeline::new(frame, config.frame_padding, api_client));

    let listener = health::bind(config.port).await?;

    // Create bot
    let bot = Bot::new(&config.telegram_token);

    tokio::select! {
        result = health::serve(listener) => {
            if let Err(e) = &result {
                error!("Health check server failed: {:#}", e);
            }
            result
        }
        result = bot::start_bot(bot, pipeline) => result,
    }
}
