// Geographic primitives and great-circle math

pub const EARTH_RADIUS_KM: f64 = 6371.0;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Rectangular lat/lng area, top-left to bottom-right as seen on the map.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GeoBounds {
    pub top_left: LatLng,
    pub bot_right: LatLng,
}

impl GeoBounds {
    pub fn new(top_left: LatLng, bot_right: LatLng) -> Self {
        Self {
            top_left,
            bot_right,
        }
    }

    /// Strict containment, points on an edge are outside.
    pub fn contains(&self, point: LatLng) -> bool {
        self.top_left.lat > point.lat
            && self.top_left.lng < point.lng
            && self.bot_right.lat < point.lat
            && self.bot_right.lng > point.lng
    }
}

/// Great-circle distance in km between two points given in degrees.
pub fn haversine_distance(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lng = (lng2 - lng1).to_radians();
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + (d_lng / 2.0).sin().powi(2) * lat1_rad.cos() * lat2_rad.cos();
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}

/// Destination reached from `(lat, lng)` travelling `distance_km` along
/// `bearing`. Angles in and out are radians.
pub fn destination_point(lat: f64, lng: f64, bearing: f64, distance_km: f64) -> LatLng {
    let d = distance_km / EARTH_RADIUS_KM;
    let lat2 = (lat.sin() * d.cos() + lat.cos() * d.sin() * bearing.cos()).asin();
    let lng2 = lng
        + (bearing.sin() * d.sin() * lat.cos()).atan2(d.cos() - lat.sin() * lat2.sin());
    LatLng::new(lat2, lng2)
}

/// Degree based wrapper around [`destination_point`].
pub fn radius_location(lat: f64, lng: f64, distance_km: f64, bearing_deg: f64) -> LatLng {
    let position = destination_point(
        lat.to_radians(),
        lng.to_radians(),
        bearing_deg.to_radians(),
        distance_km,
    );
    LatLng::new(position.lat.to_degrees(), position.lng.to_degrees())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_known_distance() {
        // London to Paris, roughly 343.5 km
        let d = haversine_distance(51.5074, -0.1278, 48.8566, 2.3522);
        assert!((d - 343.5).abs() < 1.0, "got {}", d);
    }

    #[test]
    fn test_haversine_symmetric_and_zero() {
        let points = [(10.0, 10.0, -33.9, 151.2), (0.0, 0.0, 0.0, 179.9), (89.0, 0.0, -89.0, 90.0)];
        for (lat1, lng1, lat2, lng2) in points {
            let ab = haversine_distance(lat1, lng1, lat2, lng2);
            let ba = haversine_distance(lat2, lng2, lat1, lng1);
            assert!((ab - ba).abs() < 1e-9);
            assert_eq!(haversine_distance(lat1, lng1, lat1, lng1), 0.0);
        }
    }

    #[test]
    fn test_destination_point_recovers_distance() {
        for bearing_deg in [0.0, 45.0, 90.0, 180.0, 270.0, 333.0] {
            for distance_km in [0.5, 10.0, 100.0, 2500.0] {
                let to = radius_location(10.0, 10.0, distance_km, bearing_deg);
                let back = haversine_distance(10.0, 10.0, to.lat, to.lng);
                assert!(
                    (back - distance_km).abs() < 1e-6,
                    "bearing {} distance {} recovered {}",
                    bearing_deg,
                    distance_km,
                    back
                );
            }
        }
    }

    #[test]
    fn test_radius_location_due_north() {
        let to = radius_location(10.0, 10.0, 100.0, 0.0);
        assert!((to.lng - 10.0).abs() < 1e-9);
        assert!(to.lat > 10.0);
    }

    #[test]
    fn test_bounds_contains_is_strict() {
        let bounds = GeoBounds::new(LatLng::new(10.0, 0.0), LatLng::new(0.0, 10.0));
        assert!(bounds.contains(LatLng::new(5.0, 5.0)));
        assert!(!bounds.contains(LatLng::new(10.0, 5.0)));
        assert!(!bounds.contains(LatLng::new(5.0, 11.0)));
    }
}
