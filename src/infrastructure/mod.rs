// Infrastructure layer - External dependencies and adapters
pub mod announcer;
pub mod config;
pub mod http_source;
pub mod locator;
pub mod wire_mapper;
