// Polling service - Self-rescheduling fetch loops feeding the overlay
use crate::application::map_backend::MapBackend;
use crate::application::overlay_service::OverlayEvent;
use crate::domain::geo::GeoBounds;
use crate::domain::map_view::MapView;
use crate::domain::order::GeoOrder;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Orders,
    Generators,
    Regions,
    WorldCounts,
}

impl Resource {
    pub const ALL: [Resource; 4] = [
        Resource::Orders,
        Resource::Generators,
        Resource::Regions,
        Resource::WorldCounts,
    ];
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Resource::Orders => "geoOrders",
            Resource::Generators => "generators",
            Resource::Regions => "regions",
            Resource::WorldCounts => "world wide geoOrder counts",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub orders_interval: Duration,
    pub generators_interval: Duration,
    pub regions_interval: Duration,
    pub world_counts_interval: Duration,
    /// Below this zoom orders are not fetched at all
    pub orders_min_zoom: u8,
}

impl PollSettings {
    fn interval(&self, resource: Resource) -> Duration {
        match resource {
            Resource::Orders => self.orders_interval,
            Resource::Generators => self.generators_interval,
            Resource::Regions => self.regions_interval,
            Resource::WorldCounts => self.world_counts_interval,
        }
    }
}

/// Delay before the next round: the interval minus the last round trip,
/// never less than a millisecond.
pub fn next_delay(interval: Duration, elapsed: Duration) -> Duration {
    interval
        .saturating_sub(elapsed)
        .max(Duration::from_millis(1))
}

#[derive(Clone)]
pub struct PollingService {
    backend: Arc<dyn MapBackend>,
    view: watch::Receiver<MapView>,
    events: mpsc::Sender<OverlayEvent>,
    settings: PollSettings,
}

impl PollingService {
    pub fn new(
        backend: Arc<dyn MapBackend>,
        view: watch::Receiver<MapView>,
        events: mpsc::Sender<OverlayEvent>,
        settings: PollSettings,
    ) -> Self {
        Self {
            backend,
            view,
            events,
            settings,
        }
    }

    /// One independent loop per resource.
    pub fn spawn_all(&self) -> Vec<JoinHandle<()>> {
        Resource::ALL
            .into_iter()
            .map(|resource| {
                let service = self.clone();
                tokio::spawn(async move { service.run(resource).await })
            })
            .collect()
    }

    /// Poll `resource` until the overlay goes away. A failed round is logged
    /// and the next one is scheduled as if it took no time.
    pub async fn run(self, resource: Resource) {
        let interval = self.settings.interval(resource);
        let mut elapsed = Duration::ZERO;
        loop {
            tokio::time::sleep(next_delay(interval, elapsed)).await;
            elapsed = match self.poll_once(resource).await {
                Ok(elapsed) => elapsed,
                Err(e) => {
                    tracing::warn!("HTTP error, query {}: {:#}", resource, e);
                    Duration::ZERO
                }
            };
            if self.events.is_closed() {
                tracing::info!("overlay closed, stopping {} polling", resource);
                break;
            }
        }
    }

    /// Runs a single round and returns how long it took.
    pub async fn poll_once(&self, resource: Resource) -> anyhow::Result<Duration> {
        match resource {
            Resource::Orders => self.poll_orders().await,
            Resource::Generators => self.poll_generators().await,
            Resource::Regions => self.poll_regions().await,
            Resource::WorldCounts => self.poll_world_counts().await,
        }
    }

    fn current_view(&self) -> MapView {
        self.view.borrow().clone()
    }

    async fn publish(&self, event: OverlayEvent) -> anyhow::Result<()> {
        self.events
            .send(event)
            .await
            .map_err(|_| anyhow::anyhow!("overlay event channel closed"))
    }

    async fn poll_orders(&self) -> anyhow::Result<Duration> {
        let view = self.current_view();
        if view.zoom < self.settings.orders_min_zoom {
            self.publish(OverlayEvent::Orders(Vec::new())).await?;
            return Ok(Duration::ZERO);
        }

        let started = Instant::now();
        let orders = self.fetch_all_orders(&view.bounds()).await?;
        let count = orders.len();
        self.publish(OverlayEvent::Orders(orders)).await?;
        Ok(log_query_response(started, count, Resource::Orders))
    }

    /// Follows page tokens until the backend reports no more pages. Any
    /// failed page abandons the whole accumulation, and an empty page
    /// clears it.
    async fn fetch_all_orders(&self, bounds: &GeoBounds) -> anyhow::Result<Vec<GeoOrder>> {
        let mut orders = Vec::new();
        let mut next_page_token = String::new();
        loop {
            let page = self
                .backend
                .query_orders_page(bounds, &next_page_token)
                .await?;
            if page.geo_orders.is_empty() {
                return Ok(Vec::new());
            }
            orders.extend(page.geo_orders);
            if !page.has_more {
                break;
            }
            next_page_token = page.next_page_token;
        }
        Ok(orders)
    }

    async fn poll_generators(&self) -> anyhow::Result<Duration> {
        let view = self.current_view();
        let started = Instant::now();
        let generators = self.backend.query_generators(&view.bounds()).await?;
        let count = generators.len();
        self.publish(OverlayEvent::Generators(generators)).await?;
        Ok(log_query_response(started, count, Resource::Generators))
    }

    async fn poll_regions(&self) -> anyhow::Result<Duration> {
        let view = self.current_view();
        let started = Instant::now();
        let regions = self.backend.query_regions(view.zoom, &view.bounds()).await?;
        let count = regions.len();
        self.publish(OverlayEvent::Regions(regions)).await?;
        Ok(log_query_response(started, count, Resource::Regions))
    }

    async fn poll_world_counts(&self) -> anyhow::Result<Duration> {
        let started = Instant::now();
        let counts = self.backend.get_world_counts().await?;
        self.publish(OverlayEvent::WorldCounts(counts)).await?;
        let elapsed = started.elapsed();
        tracing::debug!(
            "{}ms - {} geoOrders, {} alarms",
            elapsed.as_millis(),
            counts.geo_orders,
            counts.alarms
        );
        Ok(elapsed)
    }
}

fn log_query_response(started: Instant, count: usize, resource: Resource) -> Duration {
    let elapsed = started.elapsed();
    tracing::debug!("{}ms - {} {}", elapsed.as_millis(), count, resource);
    elapsed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::map_backend::testing::RecordingBackend;
    use crate::application::map_backend::OrdersPage;
    use crate::domain::generator::GeneratorSnapshot;
    use crate::domain::geo::LatLng;
    use crate::domain::region::GeoOrderCounts;

    fn settings() -> PollSettings {
        PollSettings {
            orders_interval: Duration::from_millis(1000),
            generators_interval: Duration::from_millis(1000),
            regions_interval: Duration::from_millis(1000),
            world_counts_interval: Duration::from_millis(1000),
            orders_min_zoom: 10,
        }
    }

    fn order(id: &str) -> GeoOrder {
        GeoOrder {
            geo_order_id: id.to_string(),
            position: LatLng::new(1.0, 1.0),
            ready_to_ship_at: None,
            back_ordered_at: None,
            alarm: false,
        }
    }

    fn page(ids: &[&str], token: &str, has_more: bool) -> anyhow::Result<OrdersPage> {
        Ok(OrdersPage {
            geo_orders: ids.iter().map(|id| order(id)).collect(),
            next_page_token: token.to_string(),
            has_more,
        })
    }

    fn service(
        backend: Arc<RecordingBackend>,
        zoom: u8,
    ) -> (PollingService, mpsc::Receiver<OverlayEvent>, watch::Sender<MapView>) {
        let (view_tx, view_rx) = watch::channel(MapView::new(LatLng::new(1.0, 1.0), zoom, 1920.0, 1080.0));
        let (events_tx, events_rx) = mpsc::channel(8);
        let service = PollingService::new(backend, view_rx, events_tx, settings());
        (service, events_rx, view_tx)
    }

    #[test]
    fn test_next_delay() {
        let interval = Duration::from_millis(1000);
        assert_eq!(next_delay(interval, Duration::ZERO), interval);
        assert_eq!(next_delay(interval, Duration::from_millis(300)), Duration::from_millis(700));
        assert_eq!(next_delay(interval, Duration::from_millis(5000)), Duration::from_millis(1));
    }

    #[tokio::test]
    async fn test_single_page_finalizes_without_more_requests() {
        let backend = Arc::new(RecordingBackend::default());
        backend.push_order_page(page(&["a", "b"], "ignored", false));
        let (service, mut events, _view) = service(backend.clone(), 12);

        service.poll_once(Resource::Orders).await.unwrap();

        assert_eq!(backend.order_requests(), 1);
        match events.recv().await {
            Some(OverlayEvent::Orders(orders)) => assert_eq!(orders.len(), 2),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_orders_follow_page_tokens() {
        let backend = Arc::new(RecordingBackend::default());
        backend.push_order_page(page(&["a"], "p2", true));
        backend.push_order_page(page(&["b"], "p3", true));
        backend.push_order_page(page(&["c"], "", false));
        let (service, mut events, _view) = service(backend.clone(), 12);

        service.poll_once(Resource::Orders).await.unwrap();

        assert_eq!(*backend.order_tokens.lock().unwrap(), vec!["", "p2", "p3"]);
        match events.recv().await {
            Some(OverlayEvent::Orders(orders)) => {
                let ids: Vec<_> = orders.iter().map(|o| o.geo_order_id.as_str()).collect();
                assert_eq!(ids, vec!["a", "b", "c"]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_failed_page_abandons_accumulation() {
        let backend = Arc::new(RecordingBackend::default());
        backend.push_order_page(page(&["a"], "p2", true));
        backend.push_order_page(Err(anyhow::anyhow!("boom")));
        let (service, mut events, _view) = service(backend.clone(), 12);

        assert!(service.poll_once(Resource::Orders).await.is_err());
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_empty_later_page_clears_orders() {
        let backend = Arc::new(RecordingBackend::default());
        backend.push_order_page(page(&["a"], "p2", true));
        backend.push_order_page(page(&[], "", false));
        let (service, mut events, _view) = service(backend.clone(), 12);

        service.poll_once(Resource::Orders).await.unwrap();

        assert_eq!(backend.order_requests(), 2);
        match events.recv().await {
            Some(OverlayEvent::Orders(orders)) => assert!(orders.is_empty()),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_low_zoom_skips_order_query() {
        let backend = Arc::new(RecordingBackend::default());
        backend.push_order_page(page(&["a"], "", false));
        let (service, mut events, _view) = service(backend.clone(), 9);

        let elapsed = service.poll_once(Resource::Orders).await.unwrap();

        assert_eq!(elapsed, Duration::ZERO);
        assert_eq!(backend.order_requests(), 0);
        match events.recv().await {
            Some(OverlayEvent::Orders(orders)) => assert!(orders.is_empty()),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_view_changes_are_picked_up() {
        let backend = Arc::new(RecordingBackend::default());
        backend.push_order_page(page(&["a"], "", false));
        let (service, mut events, view) = service(backend.clone(), 5);

        view.send_modify(|v| v.zoom_to(11));
        service.poll_once(Resource::Orders).await.unwrap();

        assert_eq!(backend.order_requests(), 1);
        assert!(matches!(events.recv().await, Some(OverlayEvent::Orders(o)) if o.len() == 1));
    }

    #[tokio::test]
    async fn test_generators_and_failure() {
        let backend = Arc::new(RecordingBackend::default());
        backend.generators.lock().unwrap().push(GeneratorSnapshot {
            generator_id: "g".to_string(),
            position: LatLng::new(1.0, 1.0),
            radius_km: 10.0,
            geo_order_count_limit: 2000,
            rate_per_second: 100,
            geo_order_count_current: 3,
        });
        let (service, mut events, _view) = service(backend.clone(), 5);

        service.poll_once(Resource::Generators).await.unwrap();
        assert!(matches!(events.recv().await, Some(OverlayEvent::Generators(g)) if g.len() == 1));

        *backend.fail_generators.lock().unwrap() = true;
        assert!(service.poll_once(Resource::Generators).await.is_err());
    }

    #[tokio::test]
    async fn test_world_counts() {
        let backend = Arc::new(RecordingBackend::default());
        *backend.world_counts.lock().unwrap() = GeoOrderCounts {
            geo_orders: 10,
            alarms: 2,
        };
        let (service, mut events, _view) = service(backend, 5);

        service.poll_once(Resource::WorldCounts).await.unwrap();
        assert!(matches!(
            events.recv().await,
            Some(OverlayEvent::WorldCounts(GeoOrderCounts { geo_orders: 10, alarms: 2 }))
        ));
    }

    #[tokio::test]
    async fn test_closed_overlay_is_an_error() {
        let backend = Arc::new(RecordingBackend::default());
        let (service, events, _view) = service(backend, 5);
        drop(events);
        assert!(service.poll_once(Resource::Regions).await.is_err());
    }
}
