// Aggregated regions and order counts
use super::geo::{GeoBounds, LatLng};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GeoOrderCounts {
    pub geo_orders: u64,
    pub alarms: u64,
}

/// A backend region row. `counts` are the row level totals used for the
/// choropleth and in-view sums; `region_counts` come from the nested region
/// and are shown for the region under the pointer.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub bounds: GeoBounds,
    pub counts: GeoOrderCounts,
    pub region_counts: GeoOrderCounts,
}

impl Region {
    pub fn has_alarms(&self) -> bool {
        self.counts.alarms > 0
    }
}

pub fn region_at(regions: &[Region], point: LatLng) -> Option<&Region> {
    regions.iter().find(|r| r.bounds.contains(point))
}

pub fn in_view_counts(regions: &[Region]) -> GeoOrderCounts {
    regions.iter().fold(GeoOrderCounts::default(), |acc, r| GeoOrderCounts {
        geo_orders: acc.geo_orders + r.counts.geo_orders,
        alarms: acc.alarms + r.counts.alarms,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region(top: f64, left: f64, bottom: f64, right: f64, orders: u64, alarms: u64) -> Region {
        Region {
            bounds: GeoBounds::new(LatLng::new(top, left), LatLng::new(bottom, right)),
            counts: GeoOrderCounts {
                geo_orders: orders,
                alarms,
            },
            region_counts: GeoOrderCounts::default(),
        }
    }

    #[test]
    fn test_region_at() {
        let regions = vec![region(10.0, 0.0, 0.0, 10.0, 5, 0), region(10.0, 10.0, 0.0, 20.0, 7, 1)];
        assert_eq!(region_at(&regions, LatLng::new(5.0, 15.0)).unwrap().counts.geo_orders, 7);
        assert!(region_at(&regions, LatLng::new(-5.0, 15.0)).is_none());
    }

    #[test]
    fn test_in_view_counts() {
        let regions = vec![region(10.0, 0.0, 0.0, 10.0, 5, 0), region(10.0, 10.0, 0.0, 20.0, 7, 1)];
        assert_eq!(in_view_counts(&regions), GeoOrderCounts { geo_orders: 12, alarms: 1 });
        assert!(regions[1].has_alarms());
    }
}
