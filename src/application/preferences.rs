// Shared dashboard preferences (mute, poll rate)
use serde::Serialize;
use std::time::Duration;
use tokio::sync::watch;

pub const RATE_PRESETS_MS: [u64; 5] = [250, 500, 1000, 2000, 5000];
pub const MIN_RATE: Duration = Duration::from_millis(50);
pub const MAX_RATE: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreferenceValues {
    pub muted: bool,
    pub poll_rate: Duration,
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum PreferencesError {
    #[error("poll rate {0:?} outside {min:?}..={max:?}", min = MIN_RATE, max = MAX_RATE)]
    RateOutOfRange(Duration),
}

/// Explicit shared preferences. Clones observe and mutate the same values;
/// subscribers are woken on every change.
#[derive(Debug, Clone)]
pub struct Preferences {
    tx: watch::Sender<PreferenceValues>,
}

#[derive(Debug, Serialize)]
pub struct PreferencesView {
    pub muted: bool,
    pub rate_ms: u64,
    pub presets_ms: [u64; 5],
}

impl Preferences {
    pub fn new(values: PreferenceValues) -> Result<Self, PreferencesError> {
        validate_rate(values.poll_rate)?;
        let (tx, _rx) = watch::channel(values);
        Ok(Self { tx })
    }

    pub fn current(&self) -> PreferenceValues {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<PreferenceValues> {
        self.tx.subscribe()
    }

    pub fn toggle_mute(&self) -> bool {
        let mut muted = false;
        self.tx.send_modify(|values| {
            values.muted = !values.muted;
            muted = values.muted;
        });
        tracing::info!(muted, "mute toggled");
        muted
    }

    pub fn set_muted(&self, muted: bool) {
        let changed = self.tx.send_if_modified(|values| {
            let changed = values.muted != muted;
            values.muted = muted;
            changed
        });
        if changed {
            tracing::info!(muted, "mute set");
        }
    }

    pub fn set_poll_rate(&self, rate: Duration) -> Result<(), PreferencesError> {
        validate_rate(rate)?;
        let changed = self.tx.send_if_modified(|values| {
            let changed = values.poll_rate != rate;
            values.poll_rate = rate;
            changed
        });
        if changed {
            tracing::info!(rate_ms = rate.as_millis() as u64, "poll rate changed");
        }
        Ok(())
    }

    pub fn view(&self) -> PreferencesView {
        let values = self.current();
        PreferencesView {
            muted: values.muted,
            rate_ms: values.poll_rate.as_millis() as u64,
            presets_ms: RATE_PRESETS_MS,
        }
    }
}

pub fn validate_rate(rate: Duration) -> Result<(), PreferencesError> {
    if rate < MIN_RATE || rate > MAX_RATE {
        return Err(PreferencesError::RateOutOfRange(rate));
    }
    Ok(())
}
