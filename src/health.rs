//! Liveness endpoint for the hosting platform. Reports only that the
//! process is up, independent of chat processing.

use anyhow::{Context, Result};
use axum::{routing::get, Router};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::info;

pub const BODY: &str = "Bot is running!";

pub fn router() -> Router {
    Router::new().route("/", get(root_handler))
}

async fn root_handler() -> &'static str {
    BODY
}

pub async fn bind(port: u16) -> Result<TcpListener> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind health check listener on {addr}"))?;
    info!("Health check server listening on http://{}", addr);
    Ok(listener)
}

pub async fn serve(listener: TcpListener) -> Result<()> {
    axum::serve(listener, router())
        .await
        .context("Health check server stopped")
}
