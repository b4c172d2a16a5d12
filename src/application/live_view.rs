// Live view - polls enviro and imagery data, keeps the chart window and speaks alerts
use crate::application::polling::{Liveness, PollAction, PollingController, poll_action};
use crate::application::preferences::Preferences;
use crate::application::speech::{SIGNAL_LOST, SpeechService, alert_phrase};
use crate::application::telemetry_source::TelemetrySource;
use crate::domain::alert::{AlertDeduplicator, Signal};
use crate::domain::telemetry::{Channel, ImagerySnapshot, SeriesData};
use crate::domain::window::RollingWindow;
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;

#[derive(Debug, Clone)]
pub struct LiveSettings {
    pub capacity: usize,
    pub series: Vec<Channel>,
    pub imagery_rate: Duration,
    pub cooldown_ms: u64,
    pub gauge_threshold: f64,
    pub no_signal_after: u32,
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum LiveViewError {
    #[error("chart capacity must be at least 1")]
    ZeroCapacity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageryStatus {
    /// Nothing received yet
    Waiting,
    Live,
    /// Last payload was null; the previous snapshot is still shown
    Stale,
    NoSignal,
}

#[derive(Debug, Serialize)]
pub struct LiveSnapshot {
    pub cursor: i64,
    pub capacity: usize,
    pub series: Vec<SeriesData>,
    pub imagery: Option<ImagerySnapshot>,
    pub imagery_status: ImageryStatus,
    pub video_url: String,
}

struct LiveState {
    window: RollingWindow,
    imagery: Option<ImagerySnapshot>,
    imagery_status: ImageryStatus,
    consecutive_nulls: u32,
    alerts: AlertDeduplicator,
}

#[derive(Clone)]
pub struct LiveView {
    source: Arc<dyn TelemetrySource>,
    preferences: Preferences,
    speech: SpeechService,
    selection: watch::Sender<BTreeSet<Channel>>,
    state: Arc<Mutex<LiveState>>,
    settings: Arc<LiveSettings>,
    epoch: Instant,
}

impl LiveView {
    pub fn new(
        source: Arc<dyn TelemetrySource>,
        preferences: Preferences,
        speech: SpeechService,
        settings: LiveSettings,
    ) -> Result<Self, LiveViewError> {
        if settings.capacity == 0 {
            return Err(LiveViewError::ZeroCapacity);
        }

        let alerts = AlertDeduplicator::new(settings.cooldown_ms)
            .with_threshold(Signal::PressureGauge, settings.gauge_threshold);
        let state = LiveState {
            window: RollingWindow::new(settings.capacity),
            imagery: None,
            imagery_status: ImageryStatus::Waiting,
            consecutive_nulls: 0,
            alerts,
        };
        let (selection, _rx) = watch::channel(settings.series.iter().copied().collect::<BTreeSet<_>>());

        Ok(Self {
            source,
            preferences,
            speech,
            selection,
            state: Arc::new(Mutex::new(state)),
            settings: Arc::new(settings),
            epoch: Instant::now(),
        })
    }

    /// Starts both pollers. They run until the returned handle is dropped.
    pub fn spawn(&self) -> LiveViewHandle {
        let view = self.clone();
        let task = tokio::spawn(async move { view.run().await });
        LiveViewHandle { task }
    }

    async fn run(self) {
        let mut prefs_rx = self.preferences.subscribe();
        let mut selection_rx = self.selection.subscribe();
        let mut enviro = PollingController::new("enviro");
        let mut imagery = PollingController::new("imagery");

        imagery.start(self.settings.imagery_rate, self.imagery_action());

        let mut rate = prefs_rx.borrow_and_update().poll_rate;
        selection_rx.borrow_and_update();
        enviro.start(rate, self.enviro_action());

        loop {
            tokio::select! {
                changed = prefs_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let next = prefs_rx.borrow_and_update().poll_rate;
                    if next == rate {
                        continue;
                    }
                    rate = next;
                }
                changed = selection_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    selection_rx.borrow_and_update();
                }
            }

            tracing::debug!(rate_ms = rate.as_millis() as u64, "restarting enviro polling");
            enviro.start(rate, self.enviro_action());
        }
    }

    fn enviro_action(&self) -> PollAction {
        let view = self.clone();
        poll_action(move |liveness| {
            let view = view.clone();
            async move { view.enviro_cycle(&liveness).await }
        })
    }

    fn imagery_action(&self) -> PollAction {
        let view = self.clone();
        poll_action(move |liveness| {
            let view = view.clone();
            async move { view.imagery_cycle(&liveness).await }
        })
    }

    pub async fn enviro_cycle(&self, liveness: &Liveness) -> anyhow::Result<()> {
        let cursor = self.state().window.cursor();
        let rows = self.source.fetch_enviro(cursor).await?;

        if !liveness.is_live() {
            tracing::debug!(cursor, "discarding enviro rows for stopped poller");
            return Ok(());
        }

        let received = rows.len();
        let mut state = self.state();
        let appended = state.window.append(rows);
        tracing::debug!(cursor, received, appended, buffered = state.window.len(), "enviro cycle");
        Ok(())
    }

    pub async fn imagery_cycle(&self, liveness: &Liveness) -> anyhow::Result<()> {
        let snapshot = self.source.fetch_imagery().await?;

        if !liveness.is_live() {
            tracing::debug!("discarding imagery for stopped poller");
            return Ok(());
        }

        let phrases = self.apply_imagery(snapshot);
        for phrase in phrases {
            self.speech.announce(phrase);
        }
        Ok(())
    }

    fn apply_imagery(&self, snapshot: Option<ImagerySnapshot>) -> Vec<String> {
        let now_ms = self.now_ms();
        let mut state = self.state();
        state.alerts.sweep(now_ms);

        let Some(snapshot) = snapshot else {
            state.consecutive_nulls += 1;
            if state.consecutive_nulls >= self.settings.no_signal_after {
                if state.imagery_status != ImageryStatus::NoSignal {
                    tracing::warn!(nulls = state.consecutive_nulls, "imagery signal lost");
                    state.imagery_status = ImageryStatus::NoSignal;
                    return vec![SIGNAL_LOST.to_string()];
                }
            } else if state.imagery_status == ImageryStatus::Live {
                state.imagery_status = ImageryStatus::Stale;
            }
            return Vec::new();
        };

        if state.imagery_status == ImageryStatus::NoSignal {
            tracing::info!("imagery signal restored");
        }
        state.consecutive_nulls = 0;
        state.imagery_status = ImageryStatus::Live;

        let observations = [
            (Signal::Valve, snapshot.valve_open.map(|open| if open { 1.0 } else { 0.0 })),
            (Signal::Marker, snapshot.aruco_id.map(|id| id as f64)),
            (Signal::PressureGauge, snapshot.pressure_gauge),
        ];

        let mut phrases = Vec::new();
        for (signal, value) in observations {
            if state.alerts.observe(signal, value, now_ms)
                && let Some(value) = value
            {
                phrases.push(alert_phrase(signal, value, self.settings.gauge_threshold));
            }
        }

        state.imagery = Some(snapshot);
        phrases
    }

    pub fn snapshot(&self) -> LiveSnapshot {
        let selection = self.selection.borrow().clone();
        let state = self.state();

        // BTreeSet iterates in channel enumeration order.
        let series = selection
            .into_iter()
            .map(|channel| SeriesData::new(channel, state.window.series(channel)))
            .collect();

        LiveSnapshot {
            cursor: state.window.cursor(),
            capacity: state.window.capacity(),
            series,
            imagery: state.imagery.clone(),
            imagery_status: state.imagery_status,
            video_url: self.source.video_url().to_string(),
        }
    }

    pub fn select_series(&self, channels: impl IntoIterator<Item = Channel>) {
        let next: BTreeSet<Channel> = channels.into_iter().collect();
        self.selection.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            *current = next;
            true
        });
    }

    pub fn selected_series(&self) -> Vec<Channel> {
        self.selection.borrow().iter().copied().collect()
    }

    /// Takes effect on the next enviro append.
    pub fn set_capacity(&self, capacity: usize) -> Result<(), LiveViewError> {
        if capacity == 0 {
            return Err(LiveViewError::ZeroCapacity);
        }
        self.state().window.set_capacity(capacity);
        Ok(())
    }

    pub fn video_url(&self) -> String {
        self.source.video_url().to_string()
    }

    fn now_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }

    fn state(&self) -> MutexGuard<'_, LiveState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Owns the polling task; dropping it stops both pollers.
pub struct LiveViewHandle {
    task: JoinHandle<()>,
}

impl Drop for LiveViewHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
