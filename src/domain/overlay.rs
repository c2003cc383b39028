// Overlay state: everything the renderer draws, owned by a single writer
use super::draw::LabelGrid;
use super::generator::{AuthoringGenerator, ClickOutcome, CreateGenerator, GeneratorSnapshot};
use super::generators::{Generators, ReconcileSummary};
use super::geo::LatLng;
use super::map_view::{LatLngGrid, MapView, PixelPoint};
use super::order::{nearest_order, GeoOrder};
use super::rate::{RateTracker, RATE_HISTORY_CAPACITY};
use super::region::{GeoOrderCounts, Region};
use super::stopwatch::Stopwatch;

/// Outbound requests produced by operator input.
#[derive(Debug, Clone, PartialEq)]
pub enum OverlayEffect {
    CreateGenerator(CreateGenerator),
    ToggleOrderAlarm { geo_order_id: String },
}

#[derive(Debug, Clone)]
pub struct Overlay {
    view: MapView,
    pointer: PixelPoint,
    label_grid: LabelGrid,
    lat_lng_grid: LatLngGrid,
    orders: Vec<GeoOrder>,
    generators: Generators,
    authoring: Option<AuthoringGenerator>,
    regions: Vec<Region>,
    world_counts: GeoOrderCounts,
    rates: RateTracker,
    stopwatch: Stopwatch,
    frame_time_ms: i64,
}

impl Overlay {
    pub fn new(view: MapView, now_ms: i64) -> Self {
        Self {
            label_grid: LabelGrid::for_viewport(view.width, view.height),
            lat_lng_grid: LatLngGrid::for_view(&view),
            pointer: view.viewport_center(),
            view,
            orders: Vec::new(),
            generators: Generators::new(),
            authoring: None,
            regions: Vec::new(),
            world_counts: GeoOrderCounts::default(),
            rates: RateTracker::new(RATE_HISTORY_CAPACITY, now_ms),
            stopwatch: Stopwatch::default(),
            frame_time_ms: now_ms,
        }
    }

    pub fn view(&self) -> &MapView {
        &self.view
    }

    pub fn pointer(&self) -> PixelPoint {
        self.pointer
    }

    pub fn pointer_lat_lng(&self) -> LatLng {
        self.view.pixel_to_lat_lng(self.pointer)
    }

    pub fn label_grid(&self) -> &LabelGrid {
        &self.label_grid
    }

    pub fn lat_lng_grid(&self) -> &LatLngGrid {
        &self.lat_lng_grid
    }

    pub fn orders(&self) -> &[GeoOrder] {
        &self.orders
    }

    pub fn generators(&self) -> &Generators {
        &self.generators
    }

    pub fn authoring(&self) -> Option<&AuthoringGenerator> {
        self.authoring.as_ref()
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn world_counts(&self) -> GeoOrderCounts {
        self.world_counts
    }

    pub fn rates(&self) -> &RateTracker {
        &self.rates
    }

    pub fn stopwatch(&self) -> &Stopwatch {
        &self.stopwatch
    }

    pub fn frame_time_ms(&self) -> i64 {
        self.frame_time_ms
    }

    pub fn replace_orders(&mut self, orders: Vec<GeoOrder>) {
        self.orders = orders;
    }

    pub fn replace_regions(&mut self, regions: Vec<Region>) {
        self.regions = regions;
    }

    pub fn set_world_counts(&mut self, counts: GeoOrderCounts) {
        self.world_counts = counts;
    }

    pub fn reconcile_generators(&mut self, snapshots: &[GeneratorSnapshot]) -> ReconcileSummary {
        self.generators.reconcile(snapshots)
    }

    pub fn pointer_moved(&mut self, pointer: PixelPoint) {
        self.pointer = pointer;
        self.stopwatch.pointer_moved(pointer);
    }

    pub fn pan_to(&mut self, center: LatLng) {
        self.view.pan_to(center);
        self.view_changed();
    }

    pub fn zoom_to(&mut self, zoom: u8) {
        self.view.zoom_to(zoom);
        self.view_changed();
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.view.resize(width, height);
        self.label_grid = LabelGrid::for_viewport(width, height);
        self.view_changed();
    }

    fn view_changed(&mut self) {
        self.lat_lng_grid = LatLngGrid::for_view(&self.view);
        if let Some(AuthoringGenerator::Idle(idle)) = self.authoring.as_mut() {
            idle.follow_view(&self.view);
        }
    }

    /// Per-frame bookkeeping: feeds the rate tracker once any generator has
    /// made progress.
    pub fn advance_frame(&mut self, now_ms: i64) {
        self.frame_time_ms = now_ms;
        let generated = self.generators.generated_total();
        if generated > 0 {
            self.rates.record(generated, now_ms);
        }
    }

    pub fn click(&mut self) -> Vec<OverlayEffect> {
        self.stopwatch.click();

        let Some(authoring) = self.authoring.take() else {
            return Vec::new();
        };
        match authoring.click(&self.view, self.pointer) {
            ClickOutcome::Authoring(next) => {
                self.authoring = Some(next);
                Vec::new()
            }
            ClickOutcome::Confirmed(generator) => {
                let request = generator.create_request();
                self.generators.push(generator);
                vec![OverlayEffect::CreateGenerator(request)]
            }
        }
    }

    pub fn key(&mut self, key: &str, now_ms: i64) -> Vec<OverlayEffect> {
        match key {
            "g" => {
                self.authoring = Some(AuthoringGenerator::new(&self.view));
                Vec::new()
            }
            "Escape" => {
                self.authoring = None;
                Vec::new()
            }
            "t" => self.toggle_nearest_order().into_iter().collect(),
            "s" => {
                self.stopwatch.toggle(now_ms);
                self.stopwatch.pointer_moved(self.pointer);
                Vec::new()
            }
            "r" => {
                self.stopwatch.hide();
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    fn toggle_nearest_order(&self) -> Option<OverlayEffect> {
        let closest = nearest_order(&self.orders, self.pointer_lat_lng())?;
        tracing::info!("closest geo order {}", closest.geo_order_id);
        Some(OverlayEffect::ToggleOrderAlarm {
            geo_order_id: closest.geo_order_id.clone(),
        })
    }
}
