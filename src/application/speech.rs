// Spoken status announcements gated by the mute preference
use crate::application::preferences::Preferences;
use crate::domain::alert::{Signal, quantize_to};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::task::JoinHandle;

pub const AUDIO_ENABLED: &str = "audio enabled";
pub const SIGNAL_LOST: &str = "imagery signal lost";

#[derive(Debug, thiserror::Error)]
pub enum SpeechError {
    #[error("speech backend unavailable: {0}")]
    Unavailable(String),

    #[error("speech backend rejected phrase: {0}")]
    Rejected(String),
}

#[async_trait]
pub trait Announcer: Send + Sync {
    async fn speak(&self, phrase: &str) -> Result<(), SpeechError>;
}

#[derive(Clone)]
pub struct SpeechService {
    announcer: Arc<dyn Announcer>,
    preferences: Preferences,
}

impl SpeechService {
    pub fn new(announcer: Arc<dyn Announcer>, preferences: Preferences) -> Self {
        Self {
            announcer,
            preferences,
        }
    }

    /// Fire-and-forget. Returns false when muted and nothing was dispatched.
    pub fn announce(&self, phrase: impl Into<String>) -> bool {
        let phrase = phrase.into();
        if self.preferences.current().muted {
            tracing::debug!(%phrase, "muted, announcement skipped");
            return false;
        }
        self.dispatch(phrase);
        true
    }

    /// Announces [`AUDIO_ENABLED`] each time the mute flag goes from on to off.
    pub fn spawn_mute_watcher(&self) -> JoinHandle<()> {
        let service = self.clone();
        let mut rx = self.preferences.subscribe();

        tokio::spawn(async move {
            let mut was_muted = rx.borrow_and_update().muted;
            while rx.changed().await.is_ok() {
                let muted = rx.borrow_and_update().muted;
                if was_muted && !muted {
                    service.dispatch(AUDIO_ENABLED.to_string());
                }
                was_muted = muted;
            }
        })
    }

    fn dispatch(&self, phrase: String) {
        let announcer = self.announcer.clone();
        tokio::spawn(async move {
            if let Err(e) = announcer.speak(&phrase).await {
                tracing::warn!(%phrase, error = %e, "announcement failed");
            }
        });
    }
}

/// Phrase spoken when `signal` changes to `value`.
pub fn alert_phrase(signal: Signal, value: f64, gauge_threshold: f64) -> String {
    match signal {
        Signal::Valve if value > 0.5 => "valve open".to_string(),
        Signal::Valve => "valve closed".to_string(),
        Signal::Marker => format!("marker {} detected", value.round() as i64),
        Signal::PressureGauge => format!(
            "pressure gauge reading {}",
            quantize_to(value, gauge_threshold).round() as i64
        ),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::application::preferences::PreferenceValues;
    use std::time::Duration;
    use tokio::sync::mpsc;

    /// Forwards every phrase to a channel so tests can await announcements.
    pub(crate) struct RecordingAnnouncer {
        tx: mpsc::UnboundedSender<String>,
    }

    impl RecordingAnnouncer {
        pub(crate) fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<String>) {
            let (tx, rx) = mpsc::unbounded_channel();
            (Arc::new(Self { tx }), rx)
        }
    }

    #[async_trait]
    impl Announcer for RecordingAnnouncer {
        async fn speak(&self, phrase: &str) -> Result<(), SpeechError> {
            let _ = self.tx.send(phrase.to_string());
            Ok(())
        }
    }

    struct BrokenAnnouncer;

    #[async_trait]
    impl Announcer for BrokenAnnouncer {
        async fn speak(&self, _phrase: &str) -> Result<(), SpeechError> {
            Err(SpeechError::Unavailable("no audio device".to_string()))
        }
    }

    pub(crate) fn preferences(muted: bool) -> Preferences {
        Preferences::new(PreferenceValues {
            muted,
            poll_rate: Duration::from_millis(1000),
        })
        .unwrap()
    }

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_muted_suppresses_announcements() {
        let (announcer, mut rx) = RecordingAnnouncer::new();
        let speech = SpeechService::new(announcer, preferences(true));

        assert!(!speech.announce("valve open"));
        assert!(!speech.announce("marker 3 detected"));
        settle().await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_unmuted_announces() {
        let (announcer, mut rx) = RecordingAnnouncer::new();
        let speech = SpeechService::new(announcer, preferences(false));

        assert!(speech.announce("valve closed"));
        assert_eq!(rx.recv().await.as_deref(), Some("valve closed"));
    }

    #[tokio::test]
    async fn test_unmute_announces_once() {
        let (announcer, mut rx) = RecordingAnnouncer::new();
        let prefs = preferences(true);
        let speech = SpeechService::new(announcer, prefs.clone());
        let watcher = speech.spawn_mute_watcher();
        settle().await;

        prefs.toggle_mute();
        assert_eq!(rx.recv().await.as_deref(), Some(AUDIO_ENABLED));

        prefs.toggle_mute();
        settle().await;
        assert!(rx.try_recv().is_err());

        watcher.abort();
    }

    #[tokio::test]
    async fn test_speech_failure_is_swallowed() {
        let speech = SpeechService::new(Arc::new(BrokenAnnouncer), preferences(false));
        assert!(speech.announce("valve open"));
        settle().await;
    }

    #[test]
    fn test_alert_phrases() {
        assert_eq!(alert_phrase(Signal::Valve, 1.0, 10.0), "valve open");
        assert_eq!(alert_phrase(Signal::Valve, 0.0, 10.0), "valve closed");
        assert_eq!(alert_phrase(Signal::Marker, 17.0, 10.0), "marker 17 detected");
        assert_eq!(
            alert_phrase(Signal::PressureGauge, 1004.2, 10.0),
            "pressure gauge reading 1000"
        );
    }
}
