// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc, time::Duration};
use tracing_subscriber::EnvFilter;

use crate::application::live_view::LiveView;
use crate::application::log_view::LogView;
use crate::application::preferences::Preferences;
use crate::application::speech::{Announcer, SpeechService};
use crate::application::telemetry_source::TelemetrySource;
use crate::infrastructure::announcer::{CommandAnnouncer, LogAnnouncer};
use crate::infrastructure::config::load_dashboard_config;
use crate::infrastructure::http_source::HttpTelemetrySource;
use crate::infrastructure::locator::ServerLocator;
use crate::presentation::app_state::AppState;
use crate::presentation::router::build_router;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = load_dashboard_config()?;

    // Backend client (infrastructure layer)
    let locator = ServerLocator::new(&config.backend.location, config.backend.port)?;
    tracing::info!(backend = %locator.base(), "using rover backend");
    let source: Arc<dyn TelemetrySource> = Arc::new(HttpTelemetrySource::new(
        locator,
        Duration::from_millis(config.backend.timeout_ms),
    )?);

    let announcer: Arc<dyn Announcer> = match &config.speech.command {
        Some(program) => Arc::new(CommandAnnouncer::new(program.clone(), config.speech.args.clone())),
        None => Arc::new(LogAnnouncer),
    };

    // Views (application layer)
    let preferences = Preferences::new(config.preference_values())?;
    let speech = SpeechService::new(announcer, preferences.clone());
    let _mute_watcher = speech.spawn_mute_watcher();

    let live_view = LiveView::new(source.clone(), preferences.clone(), speech, config.live_settings())?;
    let log_view = LogView::new(source, config.logs.limit);

    // Polling stops when the handle drops at the end of main
    let _live = live_view.spawn();

    let state = Arc::new(AppState {
        live_view,
        log_view,
        preferences,
    });

    // Start server (presentation layer)
    let router = build_router(state);
    let addr: SocketAddr = config.server.bind.parse()?;
    tracing::info!(%addr, "starting rover-telemetry dashboard");

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}
