//! Time-windowed loss estimation
//!
//! Sent requests wait in a pending table until they are satisfied or their
//! lifetime runs out. Classified outcomes are kept for a sliding window:
//!
//! ```text
//!   add_sent ──► pending ──(satisfied)──► FutureSatisfied ──(lifetime)──► Satisfied
//!                   │                                                      │
//!                   └──────────(lifetime exceeded)──► Lost                 │
//!                                                      └──(window)──► dropped
//! ```
//!
//! Only `Lost` and `Satisfied` entries count towards the loss percentage.

use super::LossEstimator;
use ndn_common::{NdnError, NdnResult};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, trace, warn};

/// Default refresh period of the background timer
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    /// Data returned, but the lifetime has not yet passed
    FutureSatisfied,
    Satisfied,
    Lost,
}

#[derive(Debug)]
struct WindowState {
    interest_lifetime: Duration,
    window: Duration,
    refresh_interval: Duration,
    next_refresh: Instant,
    /// Sent requests whose outcome is unknown
    pending: HashMap<String, Instant>,
    /// Outcomes ordered by time; the sequence number keeps equal instants apart
    classified: BTreeMap<(Instant, u64), Outcome>,
    seq: u64,
}

impl WindowState {
    fn classify(&mut self, at: Instant, outcome: Outcome) {
        self.seq = self.seq.wrapping_add(1);
        self.classified.insert((at, self.seq), outcome);
    }

    fn refresh(&mut self, now: Instant) {
        let lifetime = self.interest_lifetime;

        for ((at, _), outcome) in self.classified.iter_mut() {
            if *outcome == Outcome::FutureSatisfied && now > *at + lifetime {
                *outcome = Outcome::Satisfied;
            }
        }

        let expired: Vec<(String, Instant)> = self
            .pending
            .iter()
            .filter(|(_, sent)| now > **sent + lifetime)
            .map(|(name, sent)| (name.clone(), *sent))
            .collect();
        for (name, sent) in expired {
            self.pending.remove(&name);
            self.classify(sent, Outcome::Lost);
            trace!("Interest {} marked as lost", name);
        }

        if let Some(cutoff) = now.checked_sub(self.window) {
            self.classified = self.classified.split_off(&(cutoff, u64::MAX));
        }

        self.next_refresh = now + self.refresh_interval;
    }

    fn loss_percentage(&self) -> f64 {
        let (lost, satisfied) =
            self.classified
                .values()
                .fold((0u64, 0u64), |(lost, satisfied), outcome| match outcome {
                    Outcome::Lost => (lost + 1, satisfied),
                    Outcome::Satisfied => (lost, satisfied + 1),
                    Outcome::FutureSatisfied => (lost, satisfied),
                });

        if lost + satisfied == 0 {
            return 0.0;
        }
        lost as f64 / (lost + satisfied) as f64
    }
}

/// Background refresh task owned by one estimator
///
/// The task holds a weak reference to the estimator state and sleeps until
/// the state's next refresh deadline, so every refresh (timer or on-read)
/// pushes the next firing out by one interval. Dropping the timer aborts the
/// task.
#[derive(Debug, Default)]
pub struct RefreshTimer {
    handle: Option<JoinHandle<()>>,
}

impl RefreshTimer {
    fn start(state: &Arc<Mutex<WindowState>>) -> Self {
        let Ok(runtime) = Handle::try_current() else {
            debug!("No runtime, loss estimator refreshes on read only");
            return Self::default();
        };

        let weak: Weak<Mutex<WindowState>> = Arc::downgrade(state);
        let handle = runtime.spawn(async move {
            loop {
                let deadline = match weak.upgrade() {
                    Some(shared) => {
                        let guard = shared.lock();
                        guard.next_refresh
                    }
                    None => break,
                };

                tokio::time::sleep_until(deadline).await;

                let Some(shared) = weak.upgrade() else { break };
                {
                    let mut guard = shared.lock();
                    let now = Instant::now();
                    if now >= guard.next_refresh {
                        guard.refresh(now);
                    }
                }
            }
        });

        Self {
            handle: Some(handle),
        }
    }

    /// Whether a background task is scheduled
    pub fn is_active(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Abort the background task
    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Drop for RefreshTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Loss estimator over a sliding time window
#[derive(Debug)]
pub struct TimeWindowLossEstimator {
    state: Arc<Mutex<WindowState>>,
    timer: RefreshTimer,
}

impl TimeWindowLossEstimator {
    /// Create estimator
    ///
    /// Fails if `window` is not larger than `interest_lifetime`.
    pub fn new(interest_lifetime: Duration, window: Duration) -> NdnResult<Self> {
        Self::with_refresh_interval(interest_lifetime, window, DEFAULT_REFRESH_INTERVAL)
    }

    /// Create estimator with a custom background refresh period
    pub fn with_refresh_interval(
        interest_lifetime: Duration,
        window: Duration,
        refresh_interval: Duration,
    ) -> NdnResult<Self> {
        Self::validate(interest_lifetime, window)?;

        let state = Arc::new(Mutex::new(WindowState {
            interest_lifetime,
            window,
            refresh_interval,
            next_refresh: Instant::now() + refresh_interval,
            pending: HashMap::new(),
            classified: BTreeMap::new(),
            seq: 0,
        }));
        let timer = RefreshTimer::start(&state);

        Ok(Self { state, timer })
    }

    /// Check a lifetime/window pair
    pub fn validate(interest_lifetime: Duration, window: Duration) -> NdnResult<()> {
        if window <= interest_lifetime {
            return Err(NdnError::InvalidWindow {
                lifetime: interest_lifetime,
                window,
            });
        }
        Ok(())
    }

    /// Number of classified entries inside the window
    pub fn classified_len(&self) -> usize {
        self.state.lock().classified.len()
    }

    /// Whether the background refresh task is running
    pub fn has_timer(&self) -> bool {
        self.timer.is_active()
    }

    /// Stop the background refresh task
    pub fn cancel_timer(&mut self) {
        self.timer.cancel();
    }
}

impl LossEstimator for TimeWindowLossEstimator {
    fn add_sent(&mut self, name: &str) {
        let now = Instant::now();
        let mut state = self.state.lock();
        trace!("pending.insert({})", name);
        if state.pending.insert(name.to_string(), now).is_some() {
            warn!("Duplicate insertion of sent interest: {}", name);
        }
    }

    fn remove_sent(&mut self, name: &str) {
        let removed = self.state.lock().pending.remove(name).is_some();
        trace!("Removed {} pending interest(s): {}", u8::from(removed), name);
    }

    fn add_satisfied(&mut self, name: &str) {
        let now = Instant::now();
        let mut state = self.state.lock();
        match state.pending.remove(name) {
            Some(sent) => {
                trace!("Satisfied pending interest {}", name);
                state.classify(sent, Outcome::FutureSatisfied);
            }
            None => {
                trace!("Interest {} not pending, data arrived after lifetime", name);
                state.classify(now, Outcome::FutureSatisfied);
            }
        }
    }

    fn refresh(&mut self) {
        self.state.lock().refresh(Instant::now());
    }

    fn loss_percentage(&mut self) -> f64 {
        let mut state = self.state.lock();
        state.refresh(Instant::now());
        let loss = state.loss_percentage();
        trace!("Loss percentage: {}", loss);
        loss
    }

    fn outstanding(&self) -> usize {
        self.state.lock().pending.len()
    }
}
