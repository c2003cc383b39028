// Overlay service - Single owner of the overlay state
//
// Poll results and operator input arrive as events on one channel, so every
// mutation of the overlay happens on this task. Frames are published on a
// fixed tick through a watch channel.
use crate::application::map_backend::MapBackend;
use crate::application::overlay_renderer::render_frame;
use crate::domain::draw::Frame;
use crate::domain::generator::{AuthoringStage, ConfirmedGenerator, GeneratorSnapshot};
use crate::domain::geo::LatLng;
use crate::domain::map_view::{MapView, PixelPoint};
use crate::domain::order::GeoOrder;
use crate::domain::overlay::{Overlay, OverlayEffect};
use crate::domain::region::{GeoOrderCounts, Region};
use anyhow::Context;
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::IntervalStream;

#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    PointerMoved(PixelPoint),
    Click,
    Key(String),
    PanTo(LatLng),
    ZoomTo(u8),
    Resize { width: f64, height: f64 },
}

/// Read-only summary of the overlay for the operator API.
#[derive(Debug, Clone)]
pub struct OverlayStatus {
    pub generators: Vec<ConfirmedGenerator>,
    pub authoring_stage: Option<AuthoringStage>,
}

#[derive(Debug)]
pub enum OverlayEvent {
    Orders(Vec<GeoOrder>),
    Generators(Vec<GeneratorSnapshot>),
    Regions(Vec<Region>),
    WorldCounts(GeoOrderCounts),
    Input(InputEvent),
    Inspect(oneshot::Sender<OverlayStatus>),
}

/// Cloneable access to a running overlay for request handlers.
#[derive(Clone)]
pub struct OverlayHandle {
    events: mpsc::Sender<OverlayEvent>,
    frames: watch::Receiver<Arc<Frame>>,
}

impl OverlayHandle {
    pub fn new(events: mpsc::Sender<OverlayEvent>, frames: watch::Receiver<Arc<Frame>>) -> Self {
        Self { events, frames }
    }

    pub async fn input(&self, input: InputEvent) -> anyhow::Result<()> {
        self.events
            .send(OverlayEvent::Input(input))
            .await
            .map_err(|_| anyhow::anyhow!("overlay is not running"))
    }

    pub async fn status(&self) -> anyhow::Result<OverlayStatus> {
        let (reply, status) = oneshot::channel();
        self.events
            .send(OverlayEvent::Inspect(reply))
            .await
            .map_err(|_| anyhow::anyhow!("overlay is not running"))?;
        status.await.context("overlay dropped status request")
    }

    pub fn latest_frame(&self) -> Arc<Frame> {
        self.frames.borrow().clone()
    }

    pub fn frames(&self) -> watch::Receiver<Arc<Frame>> {
        self.frames.clone()
    }
}

pub struct OverlayService {
    overlay: Overlay,
    backend: Arc<dyn MapBackend>,
    view_tx: watch::Sender<MapView>,
    frames_tx: watch::Sender<Arc<Frame>>,
    frame_interval: Duration,
}

impl OverlayService {
    pub fn new(
        overlay: Overlay,
        backend: Arc<dyn MapBackend>,
        view_tx: watch::Sender<MapView>,
        frames_tx: watch::Sender<Arc<Frame>>,
        draw_fps: u32,
    ) -> Self {
        Self {
            overlay,
            backend,
            view_tx,
            frames_tx,
            frame_interval: Duration::from_millis(1000 / u64::from(draw_fps.max(1))),
        }
    }

    pub async fn run(mut self, mut events: mpsc::Receiver<OverlayEvent>) {
        let mut ticks = IntervalStream::new(tokio::time::interval(self.frame_interval));
        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => {
                        self.handle(event);
                    }
                    None => break,
                },
                Some(_) = ticks.next() => self.redraw(chrono::Utc::now().timestamp_millis()),
            }
        }
        tracing::info!("overlay event channel closed, stopping redraws");
    }

    /// Applies one event. Returned handles belong to the outbound requests
    /// the event triggered; callers may drop them.
    pub fn handle(&mut self, event: OverlayEvent) -> Vec<JoinHandle<()>> {
        match event {
            OverlayEvent::Orders(orders) => self.overlay.replace_orders(orders),
            OverlayEvent::Regions(regions) => self.overlay.replace_regions(regions),
            OverlayEvent::WorldCounts(counts) => self.overlay.set_world_counts(counts),
            OverlayEvent::Generators(snapshots) => {
                let summary = self.overlay.reconcile_generators(&snapshots);
                if summary.added > 0 {
                    tracing::info!("{} generators learned from backend", summary.added);
                }
            }
            OverlayEvent::Inspect(reply) => {
                let _ = reply.send(self.status());
            }
            OverlayEvent::Input(input) => {
                let effects = self.apply_input(input);
                return self.dispatch(effects);
            }
        }
        Vec::new()
    }

    fn apply_input(&mut self, input: InputEvent) -> Vec<OverlayEffect> {
        let effects = match input {
            InputEvent::PointerMoved(pointer) => {
                self.overlay.pointer_moved(pointer);
                Vec::new()
            }
            InputEvent::Click => self.overlay.click(),
            InputEvent::Key(key) => self
                .overlay
                .key(&key, chrono::Utc::now().timestamp_millis()),
            InputEvent::PanTo(center) => {
                self.overlay.pan_to(center);
                Vec::new()
            }
            InputEvent::ZoomTo(zoom) => {
                self.overlay.zoom_to(zoom);
                Vec::new()
            }
            InputEvent::Resize { width, height } => {
                self.overlay.resize(width, height);
                Vec::new()
            }
        };
        let view = self.overlay.view().clone();
        self.view_tx.send_if_modified(|current| {
            if *current == view {
                false
            } else {
                *current = view;
                true
            }
        });
        effects
    }

    /// Fire-and-forget: outcomes are only logged.
    fn dispatch(&self, effects: Vec<OverlayEffect>) -> Vec<JoinHandle<()>> {
        effects
            .into_iter()
            .map(|effect| {
                let backend = self.backend.clone();
                tokio::spawn(async move {
                    match effect {
                        OverlayEffect::CreateGenerator(request) => {
                            match backend.create_generator(&request).await {
                                Ok(()) => tracing::info!("created generator {}", request.generator_id),
                                Err(e) => tracing::warn!("HTTP error, create generator {}: {:#}", request.generator_id, e),
                            }
                        }
                        OverlayEffect::ToggleOrderAlarm { geo_order_id } => {
                            match backend.toggle_order_alarm(&geo_order_id).await {
                                Ok(()) => tracing::info!("toggled alarm on geo order {}", geo_order_id),
                                Err(e) => tracing::warn!("HTTP error, toggle geoOrder alarm {}: {:#}", geo_order_id, e),
                            }
                        }
                    }
                })
            })
            .collect()
    }

    pub fn redraw(&mut self, now_ms: i64) {
        self.overlay.advance_frame(now_ms);
        let frame = render_frame(&self.overlay);
        self.frames_tx.send_replace(Arc::new(frame));
    }

    fn status(&self) -> OverlayStatus {
        OverlayStatus {
            generators: self.overlay.generators().iter().cloned().collect(),
            authoring_stage: self.overlay.authoring().map(|a| a.stage()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::map_backend::testing::RecordingBackend;

    struct Harness {
        service: OverlayService,
        backend: Arc<RecordingBackend>,
        view_rx: watch::Receiver<MapView>,
        frames_rx: watch::Receiver<Arc<Frame>>,
    }

    fn harness() -> Harness {
        let view = MapView::new(LatLng::new(10.0, 10.0), 5, 1920.0, 1080.0);
        let backend = Arc::new(RecordingBackend::default());
        let (view_tx, view_rx) = watch::channel(view.clone());
        let (frames_tx, frames_rx) = watch::channel(Arc::new(Frame::default()));
        let service = OverlayService::new(Overlay::new(view, 0), backend.clone(), view_tx, frames_tx, 30);
        Harness {
            service,
            backend,
            view_rx,
            frames_rx,
        }
    }

    async fn input(service: &mut OverlayService, input: InputEvent) {
        for handle in service.handle(OverlayEvent::Input(input)) {
            handle.await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_authoring_posts_exactly_one_create() {
        let mut h = harness();
        input(&mut h.service, InputEvent::Key("g".to_string())).await;
        input(&mut h.service, InputEvent::PointerMoved(PixelPoint::new(1200.0, 540.0))).await;
        input(&mut h.service, InputEvent::Click).await;
        input(&mut h.service, InputEvent::PointerMoved(PixelPoint::new(960.0, 540.0))).await;
        input(&mut h.service, InputEvent::Click).await;
        input(&mut h.service, InputEvent::Click).await;
        input(&mut h.service, InputEvent::Click).await;

        let created = h.backend.created.lock().unwrap();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].rate_per_second, 550);
    }

    #[tokio::test]
    async fn test_toggle_alarm_dispatch() {
        let mut h = harness();
        h.service.handle(OverlayEvent::Orders(vec![GeoOrder {
            geo_order_id: "o1".to_string(),
            position: LatLng::new(10.0, 10.0),
            ready_to_ship_at: None,
            back_ordered_at: None,
            alarm: false,
        }]));
        input(&mut h.service, InputEvent::Key("t".to_string())).await;
        assert_eq!(*h.backend.toggled.lock().unwrap(), vec!["o1".to_string()]);
    }

    #[tokio::test]
    async fn test_view_changes_are_published() {
        let mut h = harness();
        input(&mut h.service, InputEvent::ZoomTo(12)).await;
        assert!(h.view_rx.has_changed().unwrap());
        assert_eq!(h.view_rx.borrow_and_update().zoom, 12);

        input(&mut h.service, InputEvent::PointerMoved(PixelPoint::new(1.0, 1.0))).await;
        assert!(!h.view_rx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn test_reconcile_and_inspect() {
        let mut h = harness();
        let snapshot = GeneratorSnapshot {
            generator_id: "g".to_string(),
            position: LatLng::new(10.0, 10.0),
            radius_km: 100.0,
            geo_order_count_limit: 5000,
            rate_per_second: 300,
            geo_order_count_current: 1,
        };
        h.service.handle(OverlayEvent::Generators(vec![snapshot.clone()]));
        h.service.handle(OverlayEvent::Generators(vec![snapshot]));

        let (tx, rx) = oneshot::channel();
        h.service.handle(OverlayEvent::Inspect(tx));
        let status = rx.await.unwrap();
        assert_eq!(status.generators.len(), 1);
        assert_eq!(status.authoring_stage, None);
    }

    #[tokio::test]
    async fn test_handle_talks_to_running_service() {
        let h = harness();
        let (events_tx, events_rx) = mpsc::channel(8);
        let handle = OverlayHandle::new(events_tx, h.frames_rx.clone());
        let task = tokio::spawn(h.service.run(events_rx));

        handle.input(InputEvent::Key("g".to_string())).await.unwrap();
        let status = handle.status().await.unwrap();
        assert_eq!(status.authoring_stage, Some(AuthoringStage::Idle));

        drop(handle);
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_handle_reports_stopped_overlay() {
        let h = harness();
        let (events_tx, events_rx) = mpsc::channel(1);
        drop(events_rx);
        let handle = OverlayHandle::new(events_tx, h.frames_rx);
        assert!(handle.input(InputEvent::Click).await.is_err());
        assert!(handle.status().await.is_err());
    }

    #[tokio::test]
    async fn test_redraw_publishes_frame() {
        let mut h = harness();
        h.service.redraw(1_000);
        let frame = h.frames_rx.borrow_and_update().clone();
        assert_eq!(frame.time_ms, 1_000);
        assert_eq!(frame.width, 1920.0);
        assert!(!frame.commands.is_empty());
    }
}
