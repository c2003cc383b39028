// Web Mercator view of the tile map: projection between lat/lng and viewport pixels
use super::geo::{GeoBounds, LatLng};
use std::f64::consts::PI;

pub const TILE_SIZE_PX: f64 = 256.0;
pub const MIN_ZOOM: u8 = 3;
pub const MAX_ZOOM: u8 = 18;
/// Largest viewport edge; grid work on the owner task grows with the span.
pub const MAX_VIEWPORT_PX: f64 = 8192.0;

const MAX_SIN_LAT: f64 = 0.9999;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PixelPoint {
    pub x: f64,
    pub y: f64,
}

impl PixelPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: PixelPoint) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapView {
    pub center: LatLng,
    pub zoom: u8,
    pub width: f64,
    pub height: f64,
}

impl MapView {
    pub fn new(center: LatLng, zoom: u8, width: f64, height: f64) -> Self {
        Self {
            center,
            zoom: zoom.clamp(MIN_ZOOM, MAX_ZOOM),
            width: width.min(MAX_VIEWPORT_PX),
            height: height.min(MAX_VIEWPORT_PX),
        }
    }

    pub fn pan_to(&mut self, center: LatLng) {
        self.center = center;
    }

    pub fn zoom_to(&mut self, zoom: u8) {
        self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.width = width.min(MAX_VIEWPORT_PX);
        self.height = height.min(MAX_VIEWPORT_PX);
    }

    pub fn viewport_center(&self) -> PixelPoint {
        PixelPoint::new(self.width / 2.0, self.height / 2.0)
    }

    fn world_size(&self) -> f64 {
        TILE_SIZE_PX * 2f64.powi(self.zoom as i32)
    }

    fn project(&self, position: LatLng) -> PixelPoint {
        let size = self.world_size();
        let sin_lat = position.lat.to_radians().sin().clamp(-MAX_SIN_LAT, MAX_SIN_LAT);
        let x = (position.lng + 180.0) / 360.0 * size;
        let y = (0.5 - ((1.0 + sin_lat) / (1.0 - sin_lat)).ln() / (4.0 * PI)) * size;
        PixelPoint::new(x, y)
    }

    fn unproject(&self, point: PixelPoint) -> LatLng {
        let size = self.world_size();
        let lng = point.x / size * 360.0 - 180.0;
        let n = PI - 2.0 * PI * point.y / size;
        LatLng::new(n.sinh().atan().to_degrees(), lng)
    }

    pub fn lat_lng_to_pixel(&self, position: LatLng) -> PixelPoint {
        let origin = self.project(self.center);
        let point = self.project(position);
        PixelPoint::new(
            point.x - origin.x + self.width / 2.0,
            point.y - origin.y + self.height / 2.0,
        )
    }

    pub fn pixel_to_lat_lng(&self, pixel: PixelPoint) -> LatLng {
        let origin = self.project(self.center);
        self.unproject(PixelPoint::new(
            pixel.x - self.width / 2.0 + origin.x,
            pixel.y - self.height / 2.0 + origin.y,
        ))
    }

    /// Area covered by the viewport, from pixel `(0, 0)` to the last pixel.
    pub fn bounds(&self) -> GeoBounds {
        GeoBounds::new(
            self.pixel_to_lat_lng(PixelPoint::new(0.0, 0.0)),
            self.pixel_to_lat_lng(PixelPoint::new(self.width - 1.0, self.height - 1.0)),
        )
    }

    /// Pixel distance between two geographic points at the current zoom.
    pub fn pixel_distance(&self, a: LatLng, b: LatLng) -> f64 {
        self.lat_lng_to_pixel(a).distance_to(self.lat_lng_to_pixel(b))
    }

    /// Whether a circle in viewport pixels touches the viewport rectangle.
    pub fn circle_intersects(&self, center: PixelPoint, radius: f64) -> bool {
        let nearest = PixelPoint::new(
            center.x.max(0.0).min(self.width),
            center.y.max(0.0).min(self.height),
        );
        center.distance_to(nearest) <= radius
    }
}

/// Reference lat/lng lines visible in the current view, in viewport pixels.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LatLngGrid {
    pub lat_lines: Vec<(f64, f64)>,
    pub lng_lines: Vec<(f64, f64)>,
}

impl LatLngGrid {
    pub fn for_view(view: &MapView) -> Self {
        let scale = 2f64.powi(view.zoom as i32 - 3);
        let tick_lat = 180.0 / (9.0 * scale);
        let tick_lng = 360.0 / (18.0 * scale);
        let bounds = view.bounds();

        let mut lat_lines = Vec::new();
        let mut lat = tick_lat * (bounds.top_left.lat / tick_lat).trunc();
        while lat > bounds.bot_right.lat {
            let y = view.lat_lng_to_pixel(LatLng::new(lat, view.center.lng)).y;
            lat_lines.push((lat, y));
            lat -= tick_lat;
        }

        let mut lng_lines = Vec::new();
        let mut lng = tick_lng * (bounds.top_left.lng / tick_lng).trunc();
        while lng < bounds.bot_right.lng {
            let x = view.lat_lng_to_pixel(LatLng::new(view.center.lat, lng)).x;
            lng_lines.push((lng, x));
            lng += tick_lng;
        }

        tracing::debug!(
            "zoom {}, tick len lat {}, lng {}",
            view.zoom,
            tick_lat,
            tick_lng
        );
        Self {
            lat_lines,
            lng_lines,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view() -> MapView {
        MapView::new(LatLng::new(10.0, 10.0), 5, 1920.0, 1080.0)
    }

    #[test]
    fn test_center_maps_to_viewport_center() {
        let v = view();
        let p = v.lat_lng_to_pixel(v.center);
        assert!((p.x - 960.0).abs() < 1e-9);
        assert!((p.y - 540.0).abs() < 1e-9);
    }

    #[test]
    fn test_pixel_round_trip() {
        let v = view();
        let position = LatLng::new(12.5, 7.25);
        let back = v.pixel_to_lat_lng(v.lat_lng_to_pixel(position));
        assert!((back.lat - position.lat).abs() < 1e-9);
        assert!((back.lng - position.lng).abs() < 1e-9);
    }

    #[test]
    fn test_bounds_orientation() {
        let bounds = view().bounds();
        assert!(bounds.top_left.lat > bounds.bot_right.lat);
        assert!(bounds.top_left.lng < bounds.bot_right.lng);
    }

    #[test]
    fn test_viewport_size_is_capped() {
        let mut v = MapView::new(LatLng::default(), 18, 1e9, 600.0);
        assert_eq!(v.width, MAX_VIEWPORT_PX);
        v.resize(800.0, 1e9);
        assert_eq!((v.width, v.height), (800.0, MAX_VIEWPORT_PX));
    }

    #[test]
    fn test_zoom_is_clamped() {
        let mut v = MapView::new(LatLng::default(), 1, 800.0, 600.0);
        assert_eq!(v.zoom, MIN_ZOOM);
        v.zoom_to(25);
        assert_eq!(v.zoom, MAX_ZOOM);
    }

    #[test]
    fn test_circle_intersects() {
        let v = view();
        assert!(v.circle_intersects(PixelPoint::new(100.0, 100.0), 1.0));
        assert!(v.circle_intersects(PixelPoint::new(-10.0, 100.0), 20.0));
        assert!(!v.circle_intersects(PixelPoint::new(-50.0, -50.0), 20.0));
    }

    #[test]
    fn test_lat_lng_grid_lines_inside_view() {
        let v = view();
        let grid = LatLngGrid::for_view(&v);
        assert!(!grid.lat_lines.is_empty());
        assert!(!grid.lng_lines.is_empty());
        for (_, y) in &grid.lat_lines {
            assert!(*y >= -1.0 && *y <= v.height);
        }
    }
}
