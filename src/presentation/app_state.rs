// Application state for HTTP handlers
use crate::application::overlay_service::OverlayHandle;

#[derive(Clone)]
pub struct AppState {
    pub overlay: OverlayHandle,
}
