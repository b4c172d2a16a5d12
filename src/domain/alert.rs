// Spoken-alert de-duplication
use std::collections::HashMap;

/// Imagery fields that trigger spoken alerts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    Valve,
    Marker,
    PressureGauge,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct TrackerEntry {
    bucket: i64,
    expires_at_ms: u64,
}

/// Tracks the last announced value per signal.
///
/// A signal is either unset or tracking a quantized value until its cooldown
/// expires. Repeats of the tracked value inside the cooldown are suppressed and
/// do not extend it.
#[derive(Debug, Clone)]
pub struct AlertDeduplicator {
    cooldown_ms: u64,
    thresholds: HashMap<Signal, f64>,
    entries: HashMap<Signal, TrackerEntry>,
}

impl AlertDeduplicator {
    pub fn new(cooldown_ms: u64) -> Self {
        Self {
            cooldown_ms,
            thresholds: HashMap::new(),
            entries: HashMap::new(),
        }
    }

    /// Marks `signal` as continuous: values are rounded to the nearest multiple
    /// of `threshold` before comparison.
    pub fn with_threshold(mut self, signal: Signal, threshold: f64) -> Self {
        self.thresholds.insert(signal, threshold);
        self
    }

    /// Returns whether this observation should be announced.
    pub fn observe(&mut self, signal: Signal, value: Option<f64>, now_ms: u64) -> bool {
        let Some(value) = value else {
            return false;
        };
        let bucket = self.quantize(signal, value);

        if let Some(entry) = self.entries.get(&signal)
            && now_ms < entry.expires_at_ms
            && entry.bucket == bucket
        {
            return false;
        }

        self.entries.insert(
            signal,
            TrackerEntry {
                bucket,
                expires_at_ms: now_ms.saturating_add(self.cooldown_ms),
            },
        );
        true
    }

    /// Forgets every entry whose cooldown has elapsed.
    pub fn sweep(&mut self, now_ms: u64) {
        self.entries.retain(|_, entry| now_ms < entry.expires_at_ms);
    }

    #[cfg(test)]
    pub fn is_tracking(&self, signal: Signal, now_ms: u64) -> bool {
        self.entries
            .get(&signal)
            .is_some_and(|entry| now_ms < entry.expires_at_ms)
    }

    fn quantize(&self, signal: Signal, value: f64) -> i64 {
        match self.thresholds.get(&signal) {
            Some(threshold) => (value / threshold).round() as i64,
            // Discrete signals (valve, marker id) compare exactly.
            None => value.round() as i64,
        }
    }
}

/// Rounds `value` to the nearest multiple of `threshold`.
pub fn quantize_to(value: f64, threshold: f64) -> f64 {
    (value / threshold).round() * threshold
}
