// Application layer - Overlay ownership, rendering and backend polling
pub mod map_backend;
pub mod overlay_renderer;
pub mod overlay_service;
pub mod polling_service;
