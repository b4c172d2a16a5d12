// Domain layer - Telemetry samples, chart window and alert rules
pub mod alert;
pub mod telemetry;
pub mod window;
