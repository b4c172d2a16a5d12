// Repeating fetch-and-update timer
use futures::future::BoxFuture;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

/// Proof that the controller that started a cycle is still running it.
///
/// Checked after every await before applying a result.
#[derive(Debug, Clone)]
pub struct Liveness {
    generation: Arc<AtomicU64>,
    expected: u64,
}

impl Liveness {
    pub fn is_live(&self) -> bool {
        self.generation.load(Ordering::Acquire) == self.expected
    }

    /// A token no controller owns, for running a single cycle by hand.
    #[cfg(test)]
    pub(crate) fn detached() -> Self {
        Self {
            generation: Arc::new(AtomicU64::new(0)),
            expected: 0,
        }
    }
}

pub type PollAction = Arc<dyn Fn(Liveness) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

pub fn poll_action<F, Fut>(f: F) -> PollAction
where
    F: Fn(Liveness) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(move |liveness: Liveness| -> BoxFuture<'static, anyhow::Result<()>> {
        Box::pin(f(liveness))
    })
}

/// At most one active timer. Restarting swaps the timer only; stopping (or
/// dropping) also invalidates outstanding [`Liveness`] tokens. In-flight cycles
/// always run to completion.
pub struct PollingController {
    name: &'static str,
    generation: Arc<AtomicU64>,
    timer: Option<JoinHandle<()>>,
}

impl PollingController {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            generation: Arc::new(AtomicU64::new(0)),
            timer: None,
        }
    }

    /// Replaces any running timer. Cycles already in flight stay live.
    pub fn start(&mut self, period: Duration, action: PollAction) {
        self.cancel_timer();

        let liveness = Liveness {
            generation: self.generation.clone(),
            expected: self.generation.load(Ordering::Acquire),
        };
        let name = self.name;

        tracing::debug!(name, period_ms = period.as_millis() as u64, "polling started");

        self.timer = Some(tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                let cycle = action(liveness.clone());
                // Each cycle runs detached; a slow fetch never delays the next tick.
                tokio::spawn(async move {
                    if let Err(e) = cycle.await {
                        tracing::warn!(name, error = %e, "poll cycle failed");
                    }
                });
            }
        }));
    }

    /// Teardown: cancels the timer and invalidates outstanding cycles.
    pub fn stop(&mut self) {
        self.cancel_timer();
        self.generation.fetch_add(1, Ordering::AcqRel);
    }

    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
            tracing::debug!(name = self.name, "polling stopped");
        }
    }
}

impl Drop for PollingController {
    fn drop(&mut self) {
        self.stop();
    }
}
