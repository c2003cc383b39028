use crate::application::polling_service::PollSettings;
use crate::domain::geo::LatLng;
use crate::domain::map_view::MapView;
use serde::Deserialize;
use std::time::Duration;

/// Region id the backend uses for the whole world.
pub const WORLD_REGION_ID: &str =
    "0_90.0000000000000_-180.0000000000000_-90.0000000000000_180.0000000000000";

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct OverlayConfig {
    pub backend: BackendSettings,
    pub server: ServerSettings,
    pub polling: PollingSettings,
    pub view: ViewSettings,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct BackendSettings {
    pub url: String,
    pub world_region_id: String,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            url: "http://localhost:80".to_string(),
            world_region_id: WORLD_REGION_ID.to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerSettings {
    pub bind: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PollingSettings {
    pub orders_interval_ms: u64,
    pub generators_interval_ms: u64,
    pub regions_interval_ms: u64,
    pub world_counts_interval_ms: u64,
    pub orders_min_zoom: u8,
}

impl Default for PollingSettings {
    fn default() -> Self {
        Self {
            orders_interval_ms: 1000,
            generators_interval_ms: 1000,
            regions_interval_ms: 1000,
            world_counts_interval_ms: 1000,
            orders_min_zoom: 10,
        }
    }
}

impl PollingSettings {
    pub fn poll_settings(&self) -> PollSettings {
        PollSettings {
            orders_interval: Duration::from_millis(self.orders_interval_ms),
            generators_interval: Duration::from_millis(self.generators_interval_ms),
            regions_interval: Duration::from_millis(self.regions_interval_ms),
            world_counts_interval: Duration::from_millis(self.world_counts_interval_ms),
            orders_min_zoom: self.orders_min_zoom,
        }
    }
}

/// Initial map view and redraw rate.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ViewSettings {
    pub lat: f64,
    pub lng: f64,
    pub zoom: u8,
    pub width: f64,
    pub height: f64,
    pub draw_fps: u32,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            lat: 0.0,
            lng: 0.0,
            zoom: 3,
            width: 1920.0,
            height: 1080.0,
            draw_fps: 30,
        }
    }
}

impl ViewSettings {
    pub fn map_view(&self) -> MapView {
        MapView::new(LatLng::new(self.lat, self.lng), self.zoom, self.width, self.height)
    }
}

/// `config/overlay.toml` when present, overridden by `OVERLAY__<SECTION>__<KEY>`
/// environment variables.
pub fn load_overlay_config() -> anyhow::Result<OverlayConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/overlay").required(false))
        .add_source(config::Environment::with_prefix("OVERLAY").separator("__"))
        .build()?;

    Ok(settings.try_deserialize()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml: &str) -> OverlayConfig {
        config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = parse("");
        assert_eq!(config.backend.url, "http://localhost:80");
        assert_eq!(config.backend.world_region_id, WORLD_REGION_ID);
        assert_eq!(config.server.bind, "0.0.0.0:8080");
        assert_eq!(config.polling.orders_min_zoom, 10);
        assert_eq!(config.view.draw_fps, 30);
        assert_eq!(config.view.map_view().zoom, 3);
    }

    #[test]
    fn test_partial_sections_keep_other_defaults() {
        let config = parse(
            r#"
            [backend]
            url = "http://backend:9000"

            [polling]
            orders_interval_ms = 250
            "#,
        );
        assert_eq!(config.backend.url, "http://backend:9000");
        assert_eq!(config.backend.world_region_id, WORLD_REGION_ID);

        let poll = config.polling.poll_settings();
        assert_eq!(poll.orders_interval, Duration::from_millis(250));
        assert_eq!(poll.regions_interval, Duration::from_millis(1000));
    }

    #[test]
    fn test_view_zoom_is_clamped() {
        let config = parse("[view]\nzoom = 1\nlat = 51.5\n");
        let view = config.view.map_view();
        assert_eq!(view.zoom, 3);
        assert_eq!(view.center.lat, 51.5);
    }
}
