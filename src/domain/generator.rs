// Generator authoring state machine and confirmed generators
//
// Authoring walks Idle -> RadiusSet -> CountSet -> Confirmed. Each stage type
// only offers the transition to the next one, so a count can never be set
// before the radius and a rate never before the count.
use super::gauge::{map_angle_to_value, pointer_to_angle, value_to_angle, Quadrant};
use super::geo::{haversine_distance, radius_location, LatLng};
use super::map_view::{MapView, PixelPoint};
use std::f64::consts::FRAC_PI_4;

pub const RATE_MIN: u32 = 100;
pub const RATE_MAX: u32 = 1_000;
pub const COUNT_LIMIT_MIN: u32 = 1_000;

/// Smallest pointer distance, in pixels, used for the radius preview.
pub const RADIUS_PREVIEW_MIN_PX: f64 = 200.0;

/// Below this on-screen radius a generator is drawn as a single marker.
pub const LOW_RESOLUTION_RADIUS_PX: f64 = 25.0;

/// Zoom assigned to generators learned from the backend.
pub const REMOTE_GENERATOR_ZOOM: u8 = 18;

pub const COUNT_QUADRANT: Quadrant = Quadrant::TopLeft;
pub const RATE_QUADRANT: Quadrant = Quadrant::BottomLeft;
pub const GENERATED_QUADRANT: Quadrant = Quadrant::BottomRight;

/// Circular footprint of a generator.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorArea {
    pub center: LatLng,
    pub zoom: u8,
    pub radius_point: LatLng,
    pub radius_km: f64,
}

impl GeneratorArea {
    pub fn radius_px(&self, view: &MapView) -> f64 {
        view.pixel_distance(self.center, self.radius_point)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountLimits {
    pub min: u32,
    pub max: u32,
}

impl CountLimits {
    pub fn for_radius(radius_km: f64) -> Self {
        let scaled = ((radius_km / 4.0).round() * 1000.0).min(u32::MAX as f64) as u32;
        Self {
            min: COUNT_LIMIT_MIN,
            max: scaled.max(2_000),
        }
    }
}

/// A committed gauge: its value and the angle it was read from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaugeSetting {
    pub value: u32,
    pub angle: f64,
}

fn count_gauge(pointer_x: f64, view: &MapView, limits: CountLimits) -> GaugeSetting {
    let range = COUNT_QUADRANT.angles();
    let angle = pointer_to_angle(pointer_x, view.width, range);
    GaugeSetting {
        value: map_angle_to_value(angle, range, limits.min, limits.max),
        angle,
    }
}

fn rate_gauge(pointer_x: f64, view: &MapView) -> GaugeSetting {
    let range = RATE_QUADRANT.angles();
    let angle = pointer_to_angle(pointer_x, view.width, range);
    GaugeSetting {
        value: map_angle_to_value(angle, range, RATE_MIN, RATE_MAX),
        angle,
    }
}

/// Centered on the map, radius follows the pointer.
#[derive(Debug, Clone, PartialEq)]
pub struct IdleGenerator {
    pub center: LatLng,
    pub zoom: u8,
}

impl IdleGenerator {
    pub fn at_view_center(view: &MapView) -> Self {
        Self {
            center: view.pixel_to_lat_lng(view.viewport_center()),
            zoom: view.zoom,
        }
    }

    pub fn follow_view(&mut self, view: &MapView) {
        *self = Self::at_view_center(view);
    }

    /// Radius-defining point for the current pointer, projected along a 45
    /// degree bearing from the center.
    pub fn preview_radius_point(&self, view: &MapView, pointer: PixelPoint) -> LatLng {
        let limit = view.width.min(view.height);
        let distance = pointer.distance_to(view.viewport_center());
        let diameter = distance.max(RADIUS_PREVIEW_MIN_PX).min(limit);
        let center = view.lat_lng_to_pixel(self.center);
        let dx = FRAC_PI_4.sin() * diameter / 2.0;
        let dy = FRAC_PI_4.cos() * diameter / 2.0;
        view.pixel_to_lat_lng(PixelPoint::new(center.x + dx, center.y - dy))
    }

    pub fn preview_area(&self, view: &MapView, pointer: PixelPoint) -> GeneratorArea {
        let radius_point = self.preview_radius_point(view, pointer);
        self.area_for(radius_point)
    }

    fn area_for(&self, radius_point: LatLng) -> GeneratorArea {
        GeneratorArea {
            center: self.center,
            zoom: self.zoom,
            radius_point,
            radius_km: haversine_distance(
                self.center.lat,
                self.center.lng,
                radius_point.lat,
                radius_point.lng,
            ),
        }
    }

    pub fn commit_radius(self, radius_point: LatLng) -> RadiusSetGenerator {
        let area = self.area_for(radius_point);
        let limits = CountLimits::for_radius(area.radius_km);
        RadiusSetGenerator { area, limits }
    }
}

/// Radius fixed, count gauge follows the pointer.
#[derive(Debug, Clone, PartialEq)]
pub struct RadiusSetGenerator {
    pub area: GeneratorArea,
    pub limits: CountLimits,
}

impl RadiusSetGenerator {
    pub fn preview_count(&self, view: &MapView, pointer: PixelPoint) -> GaugeSetting {
        count_gauge(pointer.x, view, self.limits)
    }

    pub fn commit_count(self, view: &MapView, pointer: PixelPoint) -> CountSetGenerator {
        let count = count_gauge(pointer.x, view, self.limits);
        CountSetGenerator {
            area: self.area,
            limits: self.limits,
            count,
        }
    }
}

/// Count fixed, rate gauge follows the pointer.
#[derive(Debug, Clone, PartialEq)]
pub struct CountSetGenerator {
    pub area: GeneratorArea,
    pub limits: CountLimits,
    pub count: GaugeSetting,
}

impl CountSetGenerator {
    pub fn preview_rate(&self, view: &MapView, pointer: PixelPoint) -> GaugeSetting {
        rate_gauge(pointer.x, view)
    }

    pub fn commit_rate(self, view: &MapView, pointer: PixelPoint) -> ConfirmedGenerator {
        let rate = rate_gauge(pointer.x, view);
        ConfirmedGenerator {
            generator_id: format!("generator_{}_{}", self.area.center.lat, self.area.center.lng),
            area: self.area,
            limits: self.limits,
            count: self.count,
            rate,
            count_current: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthoringStage {
    Idle,
    RadiusSet,
    CountSet,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AuthoringGenerator {
    Idle(IdleGenerator),
    RadiusSet(RadiusSetGenerator),
    CountSet(CountSetGenerator),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClickOutcome {
    Authoring(AuthoringGenerator),
    Confirmed(ConfirmedGenerator),
}

impl AuthoringGenerator {
    pub fn new(view: &MapView) -> Self {
        Self::Idle(IdleGenerator::at_view_center(view))
    }

    pub fn stage(&self) -> AuthoringStage {
        match self {
            Self::Idle(_) => AuthoringStage::Idle,
            Self::RadiusSet(_) => AuthoringStage::RadiusSet,
            Self::CountSet(_) => AuthoringStage::CountSet,
        }
    }

    /// Advance by one stage using the pointer position at click time.
    pub fn click(self, view: &MapView, pointer: PixelPoint) -> ClickOutcome {
        match self {
            Self::Idle(mut idle) => {
                idle.follow_view(view);
                let radius_point = idle.preview_radius_point(view, pointer);
                ClickOutcome::Authoring(Self::RadiusSet(idle.commit_radius(radius_point)))
            }
            Self::RadiusSet(generator) => {
                ClickOutcome::Authoring(Self::CountSet(generator.commit_count(view, pointer)))
            }
            Self::CountSet(generator) => {
                ClickOutcome::Confirmed(generator.commit_rate(view, pointer))
            }
        }
    }
}

/// Generator state as reported by the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorSnapshot {
    pub generator_id: String,
    pub position: LatLng,
    pub radius_km: f64,
    pub geo_order_count_limit: u32,
    pub rate_per_second: u32,
    pub geo_order_count_current: u32,
}

/// Body of the backend create request.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateGenerator {
    pub generator_id: String,
    pub position: LatLng,
    pub radius_km: f64,
    pub geo_order_count_limit: u32,
    pub rate_per_second: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorDetail {
    Full,
    Marker,
    Hidden,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConfirmedGenerator {
    pub generator_id: String,
    pub area: GeneratorArea,
    pub limits: CountLimits,
    pub count: GaugeSetting,
    pub rate: GaugeSetting,
    pub count_current: u32,
}

impl ConfirmedGenerator {
    /// Rebuild a generator from a backend snapshot so it renders the same way
    /// as one authored locally.
    pub fn from_snapshot(snapshot: &GeneratorSnapshot) -> Self {
        let center = snapshot.position;
        let radius_point = radius_location(center.lat, center.lng, snapshot.radius_km, 0.0);
        let limits = CountLimits::for_radius(snapshot.radius_km);
        let count_max = snapshot.geo_order_count_limit.max(limits.max);
        let count_angle = value_to_angle(
            snapshot.geo_order_count_limit as f64,
            limits.min as f64,
            count_max as f64,
            COUNT_QUADRANT.angles(),
        );
        let rate_angle = value_to_angle(
            snapshot.rate_per_second as f64,
            RATE_MIN as f64,
            RATE_MAX as f64,
            RATE_QUADRANT.angles(),
        );

        Self {
            generator_id: snapshot.generator_id.clone(),
            area: GeneratorArea {
                center,
                zoom: REMOTE_GENERATOR_ZOOM,
                radius_point,
                radius_km: snapshot.radius_km,
            },
            limits,
            count: GaugeSetting {
                value: snapshot.geo_order_count_limit,
                angle: count_angle,
            },
            rate: GaugeSetting {
                value: snapshot.rate_per_second,
                angle: rate_angle,
            },
            count_current: snapshot.geo_order_count_current,
        }
    }

    /// Identity is the id plus the exact center position.
    pub fn matches(&self, snapshot: &GeneratorSnapshot) -> bool {
        self.generator_id == snapshot.generator_id
            && self.area.center.lat == snapshot.position.lat
            && self.area.center.lng == snapshot.position.lng
    }

    pub fn create_request(&self) -> CreateGenerator {
        CreateGenerator {
            generator_id: self.generator_id.clone(),
            position: self.area.center,
            radius_km: self.area.radius_km,
            geo_order_count_limit: self.count.value,
            rate_per_second: self.rate.value,
        }
    }

    /// Angle of the progress gauge, proportional to generated / target.
    pub fn generated_angle(&self) -> f64 {
        value_to_angle(
            self.count_current as f64,
            0.0,
            self.count.value as f64,
            GENERATED_QUADRANT.angles(),
        )
    }

    pub fn detail(&self, view: &MapView) -> GeneratorDetail {
        let center = view.lat_lng_to_pixel(self.area.center);
        let radius = self.area.radius_px(view);
        if radius < LOW_RESOLUTION_RADIUS_PX {
            GeneratorDetail::Marker
        } else if view.circle_intersects(center, radius) {
            GeneratorDetail::Full
        } else {
            GeneratorDetail::Hidden
        }
    }
}
