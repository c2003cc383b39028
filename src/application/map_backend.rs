// Backend trait for order, generator and region data
use crate::domain::generator::{CreateGenerator, GeneratorSnapshot};
use crate::domain::geo::GeoBounds;
use crate::domain::order::GeoOrder;
use crate::domain::region::{GeoOrderCounts, Region};
use async_trait::async_trait;

/// One page of a paginated order query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrdersPage {
    pub geo_orders: Vec<GeoOrder>,
    pub next_page_token: String,
    pub has_more: bool,
}

#[async_trait]
pub trait MapBackend: Send + Sync {
    /// Orders inside `bounds`, one page at a time. An empty token asks for the
    /// first page.
    async fn query_orders_page(&self, bounds: &GeoBounds, next_page_token: &str) -> anyhow::Result<OrdersPage>;

    /// Generators whose center lies inside `bounds`
    async fn query_generators(&self, bounds: &GeoBounds) -> anyhow::Result<Vec<GeneratorSnapshot>>;

    /// Regions at `zoom` overlapping `bounds`
    async fn query_regions(&self, zoom: u8, bounds: &GeoBounds) -> anyhow::Result<Vec<Region>>;

    /// Totals for the whole world region
    async fn get_world_counts(&self) -> anyhow::Result<GeoOrderCounts>;

    async fn create_generator(&self, request: &CreateGenerator) -> anyhow::Result<()>;

    async fn toggle_order_alarm(&self, geo_order_id: &str) -> anyhow::Result<()>;
}
