// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{
    routing::{get, post, put},
    Router,
};
use tokio::sync::{mpsc, watch};
use tower_http::{compression::CompressionLayer, trace::TraceLayer};
use tracing_subscriber::EnvFilter;

use crate::application::overlay_service::{OverlayHandle, OverlayService};
use crate::application::polling_service::PollingService;
use crate::domain::draw::Frame;
use crate::domain::overlay::Overlay;
use crate::infrastructure::config::load_overlay_config;
use crate::infrastructure::http_backend::HttpMapBackend;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    click, health_check, key_pressed, latest_frame, list_generators, pointer_moved, set_size, set_view,
    stream_frames,
};

const EVENT_QUEUE_DEPTH: usize = 256;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = load_overlay_config()?;

    // Create backend (infrastructure layer)
    let backend = Arc::new(HttpMapBackend::new(&config.backend.url, &config.backend.world_region_id));

    // Create services (application layer)
    let view = config.view.map_view();
    let (events_tx, events_rx) = mpsc::channel(EVENT_QUEUE_DEPTH);
    let (view_tx, view_rx) = watch::channel(view.clone());
    let (frames_tx, frames_rx) = watch::channel(Arc::new(Frame::default()));

    let overlay = Overlay::new(view, chrono::Utc::now().timestamp_millis());
    let overlay_service = OverlayService::new(overlay, backend.clone(), view_tx, frames_tx, config.view.draw_fps);
    tokio::spawn(overlay_service.run(events_rx));

    let polling_service = PollingService::new(backend, view_rx, events_tx.clone(), config.polling.poll_settings());
    polling_service.spawn_all();

    // Create application state
    let state = Arc::new(AppState {
        overlay: OverlayHandle::new(events_tx, frames_rx),
    });

    // Build router (presentation layer). The frame stream compresses its own
    // chunks, so only snapshot routes get CompressionLayer.
    let snapshots = Router::new()
        .route("/overlay/frame", get(latest_frame))
        .route("/generators", get(list_generators))
        .layer(CompressionLayer::new());

    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/overlay/stream", get(stream_frames))
        .route("/input/pointer", post(pointer_moved))
        .route("/input/click", post(click))
        .route("/input/key/:key", post(key_pressed))
        .route("/map/view", put(set_view))
        .route("/map/size", put(set_size))
        .merge(snapshots)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr: SocketAddr = config
        .server
        .bind
        .parse()
        .with_context(|| format!("Invalid server.bind address {}", config.server.bind))?;
    tracing::info!("Starting geo-order overlay on {}, backend {}", addr, config.backend.url);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
