// HTTP request handlers
use crate::application::overlay_service::InputEvent;
use crate::domain::draw::Frame;
use crate::domain::generator::{AuthoringStage, ConfirmedGenerator};
use crate::domain::geo::LatLng;
use crate::domain::map_view::{PixelPoint, MAX_VIEWPORT_PX};
use crate::infrastructure::frame_stream::stream_from_watch;
use crate::presentation::app_state::AppState;
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct PointerInput {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Deserialize)]
pub struct ViewInput {
    pub lat: f64,
    pub lng: f64,
    pub zoom: u8,
}

#[derive(Debug, Deserialize)]
pub struct SizeInput {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GeneratorView {
    pub generator_id: String,
    pub lat: f64,
    pub lng: f64,
    pub radius_km: f64,
    pub geo_order_count_limit: u32,
    pub rate_per_second: u32,
    pub geo_order_count_current: u32,
}

impl From<&ConfirmedGenerator> for GeneratorView {
    fn from(generator: &ConfirmedGenerator) -> Self {
        Self {
            generator_id: generator.generator_id.clone(),
            lat: generator.area.center.lat,
            lng: generator.area.center.lng,
            radius_km: generator.area.radius_km,
            geo_order_count_limit: generator.count.value,
            rate_per_second: generator.rate.value,
            geo_order_count_current: generator.count_current,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratorsView {
    pub authoring_stage: Option<&'static str>,
    pub generators: Vec<GeneratorView>,
}

fn stage_name(stage: AuthoringStage) -> &'static str {
    match stage {
        AuthoringStage::Idle => "idle",
        AuthoringStage::RadiusSet => "radiusSet",
        AuthoringStage::CountSet => "countSet",
    }
}

fn accepts_brotli(headers: &HeaderMap) -> bool {
    headers
        .get("accept-encoding")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.contains("br"))
        .unwrap_or(false)
}

async fn forward(state: &AppState, inputs: Vec<InputEvent>) -> StatusCode {
    for input in inputs {
        if let Err(e) = state.overlay.input(input).await {
            tracing::error!("Error forwarding input: {:#}", e);
            return StatusCode::SERVICE_UNAVAILABLE;
        }
    }
    StatusCode::ACCEPTED
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Latest rendered frame
pub async fn latest_frame(State(state): State<Arc<AppState>>) -> Json<Frame> {
    Json(Frame::clone(&state.overlay.latest_frame()))
}

/// Every new frame as a length-prefixed chunk
pub async fn stream_frames(headers: HeaderMap, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    stream_from_watch(state.overlay.frames(), accepts_brotli(&headers))
}

pub async fn pointer_moved(State(state): State<Arc<AppState>>, Json(input): Json<PointerInput>) -> StatusCode {
    forward(&state, vec![InputEvent::PointerMoved(PixelPoint::new(input.x, input.y))]).await
}

pub async fn click(State(state): State<Arc<AppState>>) -> StatusCode {
    forward(&state, vec![InputEvent::Click]).await
}

pub async fn key_pressed(Path(key): Path<String>, State(state): State<Arc<AppState>>) -> StatusCode {
    forward(&state, vec![InputEvent::Key(key)]).await
}

pub async fn set_view(State(state): State<Arc<AppState>>, Json(input): Json<ViewInput>) -> StatusCode {
    if !(-90.0..=90.0).contains(&input.lat) || !(-180.0..=180.0).contains(&input.lng) {
        return StatusCode::BAD_REQUEST;
    }
    forward(
        &state,
        vec![
            InputEvent::PanTo(LatLng::new(input.lat, input.lng)),
            InputEvent::ZoomTo(input.zoom),
        ],
    )
    .await
}

pub async fn set_size(State(state): State<Arc<AppState>>, Json(input): Json<SizeInput>) -> StatusCode {
    let valid = |edge: f64| edge > 0.0 && edge <= MAX_VIEWPORT_PX;
    if !(valid(input.width) && valid(input.height)) {
        return StatusCode::BAD_REQUEST;
    }
    forward(
        &state,
        vec![InputEvent::Resize {
            width: input.width,
            height: input.height,
        }],
    )
    .await
}

/// Confirmed generators and the stage of the one being authored
pub async fn list_generators(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.overlay.status().await {
        Ok(status) => Json(GeneratorsView {
            authoring_stage: status.authoring_stage.map(stage_name),
            generators: status.generators.iter().map(GeneratorView::from).collect(),
        })
        .into_response(),
        Err(e) => {
            tracing::error!("Error reading generators: {:#}", e);
            StatusCode::SERVICE_UNAVAILABLE.into_response()
        }
    }
}
