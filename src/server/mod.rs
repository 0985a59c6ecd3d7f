pub mod api;
pub mod ws;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    routing::{get, post},
    Json, Router,
};
use colored::*;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::config::HubConfig;
use crate::sync::BroadcastHub;

#[derive(Clone)]
pub struct AppState {
    pub hub: Arc<BroadcastHub>,
    pub config: Arc<HubConfig>,
}

impl AppState {
    /// Fresh store and registry for one hub instance.
    pub fn new(config: HubConfig) -> Self {
        Self {
            hub: Arc::new(BroadcastHub::default()),
            config: Arc::new(config),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { "State Hub Server" }))
        .route("/health", get(|| async { Json("OK") }))
        .route("/api/status", get(api::status))
        .route("/api/data", get(api::read_data).post(api::submit_data))
        .route("/api/control", post(api::submit_control))
        .route("/ws", get(ws::ws_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve on an already bound listener until the process is interrupted.
pub async fn serve_on(listener: TcpListener, state: AppState) -> Result<()> {
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")
}

pub async fn start(config: HubConfig) -> Result<()> {
    let addr = config.bind_addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    println!(
        "{} Server running at {}",
        "✓".green(),
        format!("http://{}", addr).bright_blue()
    );
    println!(
        "  Stream endpoint: {}",
        format!("ws://{}/ws", addr).bright_white()
    );
    tracing::info!(%addr, outbound_buffer = config.outbound_buffer, "hub listening");

    serve_on(listener, AppState::new(config)).await
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::info!("shutdown requested");
    }
}
