// Application layer - Views, polling and speech use cases
pub mod live_view;
pub mod log_view;
pub mod polling;
pub mod preferences;
pub mod speech;
pub mod telemetry_source;
