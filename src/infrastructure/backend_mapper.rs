// Mapper between backend JSON payloads and domain models
//
// Every field the backend may leave out carries a default, so a partial
// response degrades to zeros instead of failing the poll.
use crate::application::map_backend::OrdersPage;
use crate::domain::generator::{CreateGenerator, GeneratorSnapshot};
use crate::domain::geo::{GeoBounds, LatLng};
use crate::domain::order::GeoOrder;
use crate::domain::region::{GeoOrderCounts, Region};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct LatLngDto {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GeoOrdersResponse {
    pub geo_orders: Vec<GeoOrderDto>,
    pub next_page_token: String,
    pub has_more: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GeoOrderDto {
    pub geo_order_id: String,
    pub position: LatLngDto,
    pub ready_to_ship_at: Option<String>,
    pub back_ordered_at: Option<String>,
    pub alarm: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct GeneratorsResponse {
    pub generators: Vec<GeneratorDto>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GeneratorDto {
    pub generator_id: String,
    pub position: LatLngDto,
    pub radius_km: f64,
    pub geo_order_count_limit: u32,
    pub rate_per_second: u32,
    pub geo_order_count_current: u32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegionsResponse {
    pub regions: Vec<RegionRowDto>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RegionRowDto {
    pub region: RegionDto,
    pub geo_order_count: u64,
    pub geo_order_alarm_count: u64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RegionDto {
    pub top_left: LatLngDto,
    pub bot_right: LatLngDto,
    pub geo_order_count: u64,
    pub geo_order_alarm_count: u64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegionResponse {
    pub region: RegionDto,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGeneratorDto {
    pub generator_id: String,
    pub position: LatLngDto,
    pub radius_km: f64,
    pub geo_order_count_limit: u32,
    pub rate_per_second: u32,
}

fn lat_lng(dto: LatLngDto) -> LatLng {
    LatLng::new(dto.lat, dto.lng)
}

/// Blank or malformed timestamps count as unset.
fn timestamp(value: Option<&str>) -> Option<DateTime<Utc>> {
    value
        .filter(|v| !v.is_empty())
        .and_then(|v| DateTime::parse_from_rfc3339(v).ok())
        .map(|t| t.with_timezone(&Utc))
}

pub fn orders_page(response: GeoOrdersResponse) -> OrdersPage {
    OrdersPage {
        geo_orders: response.geo_orders.into_iter().map(geo_order).collect(),
        next_page_token: response.next_page_token,
        has_more: response.has_more,
    }
}

fn geo_order(dto: GeoOrderDto) -> GeoOrder {
    GeoOrder {
        ready_to_ship_at: timestamp(dto.ready_to_ship_at.as_deref()),
        back_ordered_at: timestamp(dto.back_ordered_at.as_deref()),
        geo_order_id: dto.geo_order_id,
        position: lat_lng(dto.position),
        alarm: dto.alarm,
    }
}

pub fn generator_snapshots(response: GeneratorsResponse) -> Vec<GeneratorSnapshot> {
    response
        .generators
        .into_iter()
        .map(|dto| GeneratorSnapshot {
            generator_id: dto.generator_id,
            position: lat_lng(dto.position),
            radius_km: dto.radius_km,
            geo_order_count_limit: dto.geo_order_count_limit,
            rate_per_second: dto.rate_per_second,
            geo_order_count_current: dto.geo_order_count_current,
        })
        .collect()
}

pub fn regions(response: RegionsResponse) -> Vec<Region> {
    response
        .regions
        .into_iter()
        .map(|row| Region {
            bounds: GeoBounds::new(lat_lng(row.region.top_left), lat_lng(row.region.bot_right)),
            counts: GeoOrderCounts {
                geo_orders: row.geo_order_count,
                alarms: row.geo_order_alarm_count,
            },
            region_counts: region_counts(&row.region),
        })
        .collect()
}

fn region_counts(region: &RegionDto) -> GeoOrderCounts {
    GeoOrderCounts {
        geo_orders: region.geo_order_count,
        alarms: region.geo_order_alarm_count,
    }
}

/// A world region without an order count reports nothing, alarms included.
pub fn world_counts(response: RegionResponse) -> GeoOrderCounts {
    if response.region.geo_order_count == 0 {
        return GeoOrderCounts::default();
    }
    region_counts(&response.region)
}

pub fn create_generator_dto(request: &CreateGenerator) -> CreateGeneratorDto {
    CreateGeneratorDto {
        generator_id: request.generator_id.clone(),
        position: LatLngDto {
            lat: request.position.lat,
            lng: request.position.lng,
        },
        radius_km: request.radius_km,
        geo_order_count_limit: request.geo_order_count_limit,
        rate_per_second: request.rate_per_second,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::OrderStatus;

    #[test]
    fn test_world_counts_missing_fields_are_zero() {
        let response: RegionResponse = serde_json::from_str(r#"{"region":{}}"#).unwrap();
        assert_eq!(world_counts(response), GeoOrderCounts { geo_orders: 0, alarms: 0 });

        let response: RegionResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(world_counts(response), GeoOrderCounts::default());

        let response: RegionResponse = serde_json::from_str(r#"{"region":{"geoOrderAlarmCount":4}}"#).unwrap();
        assert_eq!(world_counts(response), GeoOrderCounts::default());

        let response: RegionResponse =
            serde_json::from_str(r#"{"region":{"geoOrderCount":7,"geoOrderAlarmCount":1}}"#).unwrap();
        assert_eq!(world_counts(response), GeoOrderCounts { geo_orders: 7, alarms: 1 });
    }

    #[test]
    fn test_orders_page_statuses() {
        let response: GeoOrdersResponse = serde_json::from_str(
            r#"{
                "geoOrders": [
                    {"geoOrderId": "a", "position": {"lat": 1.5, "lng": 2.5}, "readyToShipAt": "2024-03-01T10:00:00Z"},
                    {"geoOrderId": "b", "position": {"lat": 1.0}, "backOrderedAt": "2024-03-01T10:00:00.123Z"},
                    {"geoOrderId": "c", "readyToShipAt": ""}
                ],
                "nextPageToken": "next",
                "hasMore": true
            }"#,
        )
        .unwrap();
        let page = orders_page(response);

        assert!(page.has_more);
        assert_eq!(page.next_page_token, "next");
        let statuses: Vec<OrderStatus> = page.geo_orders.iter().map(|o| o.status()).collect();
        assert_eq!(
            statuses,
            vec![OrderStatus::ReadyToShip, OrderStatus::BackOrdered, OrderStatus::Pending]
        );
        assert_eq!(page.geo_orders[0].position, LatLng::new(1.5, 2.5));
        assert_eq!(page.geo_orders[1].position.lng, 0.0);
    }

    #[test]
    fn test_regions_keep_row_and_inner_counts() {
        let response: RegionsResponse = serde_json::from_str(
            r#"{"regions":[{
                "region": {"topLeft": {"lat": 10, "lng": 0}, "botRight": {"lat": 0, "lng": 10}, "geoOrderCount": 3},
                "geoOrderCount": 5,
                "geoOrderAlarmCount": 2
            }]}"#,
        )
        .unwrap();
        let regions = regions(response);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].counts, GeoOrderCounts { geo_orders: 5, alarms: 2 });
        assert_eq!(regions[0].region_counts, GeoOrderCounts { geo_orders: 3, alarms: 0 });
        assert!(regions[0].bounds.contains(LatLng::new(5.0, 5.0)));
    }

    #[test]
    fn test_create_generator_body_is_camel_case() {
        let body = create_generator_dto(&CreateGenerator {
            generator_id: "generator_10_10".to_string(),
            position: LatLng::new(10.0, 10.0),
            radius_km: 100.0,
            geo_order_count_limit: 13000,
            rate_per_second: 550,
        });
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["generatorId"], "generator_10_10");
        assert_eq!(json["position"]["lat"], 10.0);
        assert_eq!(json["geoOrderCountLimit"], 13000);
        assert_eq!(json["ratePerSecond"], 550);
    }
}
