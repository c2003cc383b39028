// Geo orders as returned by the backend
use super::geo::{haversine_distance, LatLng};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    Pending,
    ReadyToShip,
    BackOrdered,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeoOrder {
    pub geo_order_id: String,
    pub position: LatLng,
    pub ready_to_ship_at: Option<DateTime<Utc>>,
    pub back_ordered_at: Option<DateTime<Utc>>,
    pub alarm: bool,
}

impl GeoOrder {
    pub fn status(&self) -> OrderStatus {
        if self.ready_to_ship_at.is_some() {
            OrderStatus::ReadyToShip
        } else if self.back_ordered_at.is_some() {
            OrderStatus::BackOrdered
        } else {
            OrderStatus::Pending
        }
    }
}

/// Order closest to `point` by great-circle distance.
pub fn nearest_order(orders: &[GeoOrder], point: LatLng) -> Option<&GeoOrder> {
    orders
        .iter()
        .map(|order| {
            let distance =
                haversine_distance(point.lat, point.lng, order.position.lat, order.position.lng);
            (distance, order)
        })
        .min_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, order)| order)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(id: &str, lat: f64, lng: f64) -> GeoOrder {
        GeoOrder {
            geo_order_id: id.to_string(),
            position: LatLng::new(lat, lng),
            ready_to_ship_at: None,
            back_ordered_at: None,
            alarm: false,
        }
    }

    #[test]
    fn test_nearest_order() {
        let orders = vec![order("far", 10.0, 10.0), order("near", 1.0, 1.0), order("mid", 5.0, 5.0)];
        let nearest = nearest_order(&orders, LatLng::new(0.0, 0.0)).unwrap();
        assert_eq!(nearest.geo_order_id, "near");
    }

    #[test]
    fn test_nearest_order_empty() {
        assert!(nearest_order(&[], LatLng::new(0.0, 0.0)).is_none());
    }

    #[test]
    fn test_status_precedence() {
        let mut o = order("a", 0.0, 0.0);
        assert_eq!(o.status(), OrderStatus::Pending);
        o.back_ordered_at = Some(Utc::now());
        assert_eq!(o.status(), OrderStatus::BackOrdered);
        o.ready_to_ship_at = Some(Utc::now());
        assert_eq!(o.status(), OrderStatus::ReadyToShip);
    }
}
