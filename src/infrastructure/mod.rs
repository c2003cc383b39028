// Infrastructure layer - External dependencies and adapters
pub mod backend_mapper;
pub mod config;
pub mod frame_stream;
pub mod http_backend;
