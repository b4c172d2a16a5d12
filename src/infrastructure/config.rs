use crate::application::live_view::LiveSettings;
use crate::application::preferences::{PreferenceValues, validate_rate};
use crate::domain::telemetry::Channel;
use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct DashboardConfig {
    pub server: ServerSettings,
    pub backend: BackendSettings,
    pub polling: PollingSettings,
    pub chart: ChartSettings,
    pub alerts: AlertSettings,
    pub speech: SpeechSettings,
    pub logs: LogSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub bind: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BackendSettings {
    /// Address the dashboard is reached at; the backend shares its host.
    pub location: String,
    pub port: u16,
    pub timeout_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PollingSettings {
    pub rate_ms: u64,
    pub imagery_rate_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChartSettings {
    pub capacity: usize,
    pub series: Vec<Channel>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AlertSettings {
    pub cooldown_ms: u64,
    pub pressure_threshold: f64,
    pub no_signal_after: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SpeechSettings {
    pub muted: bool,
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub args: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogSettings {
    pub limit: u32,
}

impl DashboardConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(self.chart.capacity > 0, "chart.capacity must be at least 1");
        anyhow::ensure!(
            self.alerts.pressure_threshold > 0.0,
            "alerts.pressure_threshold must be positive"
        );
        anyhow::ensure!(
            self.alerts.no_signal_after > 0,
            "alerts.no_signal_after must be at least 1"
        );
        anyhow::ensure!(self.logs.limit > 0, "logs.limit must be at least 1");
        validate_rate(self.poll_rate())?;
        validate_rate(Duration::from_millis(self.polling.imagery_rate_ms))?;
        Ok(())
    }

    pub fn poll_rate(&self) -> Duration {
        Duration::from_millis(self.polling.rate_ms)
    }

    pub fn preference_values(&self) -> PreferenceValues {
        PreferenceValues {
            muted: self.speech.muted,
            poll_rate: self.poll_rate(),
        }
    }

    pub fn live_settings(&self) -> LiveSettings {
        LiveSettings {
            capacity: self.chart.capacity,
            series: self.chart.series.clone(),
            imagery_rate: Duration::from_millis(self.polling.imagery_rate_ms),
            cooldown_ms: self.alerts.cooldown_ms,
            gauge_threshold: self.alerts.pressure_threshold,
            no_signal_after: self.alerts.no_signal_after,
        }
    }
}

/// Defaults, then `config/dashboard.*` if present, then `ROVER__SECTION__KEY` variables.
pub fn load_dashboard_config() -> anyhow::Result<DashboardConfig> {
    let builder = defaults()?
        .add_source(File::with_name("config/dashboard").required(false))
        .add_source(
            Environment::with_prefix("ROVER")
                .prefix_separator("__")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("chart.series")
                .with_list_parse_key("speech.args")
                .try_parsing(true),
        );

    finish(builder)
}

fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let all_series: Vec<&str> = Channel::ALL.iter().map(|c| c.key()).collect();

    config::Config::builder()
        .set_default("server.bind", "0.0.0.0:8080")?
        .set_default("backend.location", "http://localhost:3000/")?
        .set_default("backend.port", 5000)?
        .set_default("backend.timeout_ms", 5000)?
        .set_default("polling.rate_ms", 1000)?
        .set_default("polling.imagery_rate_ms", 1000)?
        .set_default("chart.capacity", 30)?
        .set_default("chart.series", all_series)?
        .set_default("alerts.cooldown_ms", 30_000)?
        .set_default("alerts.pressure_threshold", 10.0)?
        .set_default("alerts.no_signal_after", 3)?
        .set_default("speech.muted", true)?
        .set_default("logs.limit", 30)
}

fn finish(builder: ConfigBuilder<DefaultState>) -> anyhow::Result<DashboardConfig> {
    let config: DashboardConfig = builder.build()?.try_deserialize()?;
    config.validate()?;
    Ok(config)
}
