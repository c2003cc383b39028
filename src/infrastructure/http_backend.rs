// HTTP backend implementation
use crate::application::map_backend::{MapBackend, OrdersPage};
use crate::domain::generator::{CreateGenerator, GeneratorSnapshot};
use crate::domain::geo::GeoBounds;
use crate::domain::region::{GeoOrderCounts, Region};
use crate::infrastructure::backend_mapper::{
    self, GeneratorsResponse, GeoOrdersResponse, RegionResponse, RegionsResponse,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("{method} {url} failed with status {status}: {body}")]
    Status {
        method: &'static str,
        url: String,
        status: StatusCode,
        body: String,
    },
}

#[derive(Debug, Clone)]
pub struct HttpMapBackend {
    client: Client,
    base_url: String,
    world_region_id: String,
}

fn segment(value: impl ToString) -> String {
    urlencoding::encode(&value.to_string()).into_owned()
}

fn bounds_path(bounds: &GeoBounds) -> String {
    format!(
        "{}/{}/{}/{}",
        segment(bounds.top_left.lat),
        segment(bounds.top_left.lng),
        segment(bounds.bot_right.lat),
        segment(bounds.bot_right.lng)
    )
}

impl HttpMapBackend {
    pub fn new(base_url: &str, world_region_id: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            world_region_id: world_region_id.to_string(),
        }
    }

    fn orders_url(&self, bounds: &GeoBounds, next_page_token: &str) -> String {
        format!(
            "{}/geo-orders/by-location/{}?nextPageToken={}",
            self.base_url,
            bounds_path(bounds),
            urlencoding::encode(next_page_token)
        )
    }

    fn generators_url(&self, bounds: &GeoBounds) -> String {
        format!("{}/generators/by-location/{}", self.base_url, bounds_path(bounds))
    }

    fn regions_url(&self, zoom: u8, bounds: &GeoBounds) -> String {
        format!("{}/regions/by-location/{}/{}", self.base_url, zoom, bounds_path(bounds))
    }

    fn region_url(&self, region_id: &str) -> String {
        format!("{}/region/{}", self.base_url, segment(region_id))
    }

    fn create_generator_url(&self, generator_id: &str) -> String {
        format!("{}/generator/{}/create", self.base_url, segment(generator_id))
    }

    fn toggle_alarm_url(&self, geo_order_id: &str) -> String {
        format!("{}/geo-order/{}/toggle-alarm", self.base_url, segment(geo_order_id))
    }

    async fn ensure_success(method: &'static str, url: &str, response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(BackendError::Status {
            method,
            url: url.to_string(),
            status,
            body,
        }
        .into())
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await
            .with_context(|| format!("Failed to send GET {}", url))?;

        Self::ensure_success("GET", url, response)
            .await?
            .json::<T>()
            .await
            .with_context(|| format!("Failed to parse response of GET {}", url))
    }
}

#[async_trait]
impl MapBackend for HttpMapBackend {
    async fn query_orders_page(&self, bounds: &GeoBounds, next_page_token: &str) -> Result<OrdersPage> {
        let url = self.orders_url(bounds, next_page_token);
        let response: GeoOrdersResponse = self.get_json(&url).await?;
        Ok(backend_mapper::orders_page(response))
    }

    async fn query_generators(&self, bounds: &GeoBounds) -> Result<Vec<GeneratorSnapshot>> {
        let response: GeneratorsResponse = self.get_json(&self.generators_url(bounds)).await?;
        Ok(backend_mapper::generator_snapshots(response))
    }

    async fn query_regions(&self, zoom: u8, bounds: &GeoBounds) -> Result<Vec<Region>> {
        let response: RegionsResponse = self.get_json(&self.regions_url(zoom, bounds)).await?;
        Ok(backend_mapper::regions(response))
    }

    async fn get_world_counts(&self) -> Result<GeoOrderCounts> {
        let response: RegionResponse = self.get_json(&self.region_url(&self.world_region_id)).await?;
        Ok(backend_mapper::world_counts(response))
    }

    async fn create_generator(&self, request: &CreateGenerator) -> Result<()> {
        let url = self.create_generator_url(&request.generator_id);
        let response = self
            .client
            .post(&url)
            .json(&backend_mapper::create_generator_dto(request))
            .send()
            .await
            .with_context(|| format!("Failed to send POST {}", url))?;
        Self::ensure_success("POST", &url, response).await?;
        Ok(())
    }

    async fn toggle_order_alarm(&self, geo_order_id: &str) -> Result<()> {
        let url = self.toggle_alarm_url(geo_order_id);
        let response = self
            .client
            .put(&url)
            .send()
            .await
            .with_context(|| format!("Failed to send PUT {}", url))?;
        Self::ensure_success("PUT", &url, response).await?;
        Ok(())
    }
}
