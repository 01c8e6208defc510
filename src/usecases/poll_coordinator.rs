//! Poll Coordinator - Deduplicated Polling With One Fetch In Flight
//!
//! Generic over its data source, instantiated once per source (orders at
//! 10 s, store status at 120 s) instead of duplicating the timer/guard
//! idiom per screen. Owned instance with an explicit lifecycle: created
//! on screen mount, stopped on unmount — no process-wide singleton, so
//! tests stay hermetic.
//!
//! Guarantees:
//! - At most one fetch in flight; a refresh arriving while one is
//!   running is dropped, never queued to run concurrently.
//! - Stopping prevents any already-scheduled tick from firing and
//!   cancels an in-flight background fetch, so a late-arriving response
//!   cannot mutate state after teardown.
//! - A `Halt` directive from the source (session expired) ends the
//!   background loop until the caller restarts it after re-auth.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::domain::sync::PollOrigin;

/// What the source wants the coordinator to do after a poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollDirective {
    /// Keep polling on the next tick.
    Continue,
    /// Stop background polling (session expired); resumable via `start`.
    Halt,
}

/// Result of an explicit `refresh_now` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The fetch ran to completion (success or recoverable failure).
    Completed,
    /// Another fetch was already in flight; this request was dropped.
    Skipped,
    /// The source asked to halt further polling.
    Halted,
}

/// A pollable data source.
#[async_trait]
pub trait PollSource: Send + Sync + 'static {
    /// Run one fetch-and-apply cycle. The origin tells the source
    /// whether it may surface notifications / loading indicators.
    async fn poll(&self, origin: PollOrigin) -> PollDirective;
}

struct Inner<S: PollSource> {
    source: Arc<S>,
    interval: Duration,
    /// In-flight guard. CAS-acquired around every fetch, background or
    /// manual, so two gateway calls can never overlap.
    in_flight: AtomicBool,
    /// True while the background task loop is alive.
    running: AtomicBool,
    /// Subscriber reference count for the shared-timer idiom.
    subscribers: AtomicUsize,
    shutdown: Mutex<Option<watch::Sender<bool>>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

/// Deduplicated poller for a single data source.
pub struct PollCoordinator<S: PollSource> {
    inner: Arc<Inner<S>>,
}

impl<S: PollSource> Clone for PollCoordinator<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: PollSource> PollCoordinator<S> {
    pub fn new(source: Arc<S>, interval: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                source,
                interval,
                in_flight: AtomicBool::new(false),
                running: AtomicBool::new(false),
                subscribers: AtomicUsize::new(0),
                shutdown: Mutex::new(None),
                task: Mutex::new(None),
            }),
        }
    }

    /// Start background polling. Idempotent: a second `start` while the
    /// loop is alive is a no-op. The first tick fires immediately.
    pub fn start(&self) {
        if self.inner.running.swap(true, Ordering::SeqCst) {
            debug!("Poll coordinator already running");
            return;
        }

        let (tx, mut rx) = watch::channel(false);
        let inner = Arc::clone(&self.inner);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(inner.interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    biased;
                    _ = rx.changed() => {
                        debug!("Poll loop received stop signal");
                        break;
                    }
                    _ = ticker.tick() => {
                        let outcome = run_guarded(
                            &inner.source,
                            &inner.in_flight,
                            PollOrigin::Background,
                        )
                        .await;
                        if outcome == RefreshOutcome::Halted {
                            warn!("Source requested halt, stopping background polls");
                            break;
                        }
                    }
                }
            }
            inner.running.store(false, Ordering::SeqCst);
        });

        *self.inner.shutdown.lock().unwrap() = Some(tx);
        *self.inner.task.lock().unwrap() = Some(handle);
        info!(interval_secs = self.inner.interval.as_secs(), "Background polling started");
    }

    /// Stop background polling. Effective before the next scheduled
    /// tick; an in-flight background fetch is cancelled with the task.
    pub fn stop(&self) {
        if let Some(tx) = self.inner.shutdown.lock().unwrap().take() {
            let _ = tx.send(true);
        }
        if let Some(handle) = self.inner.task.lock().unwrap().take() {
            handle.abort();
        }
        self.inner.running.store(false, Ordering::SeqCst);
        info!("Background polling stopped");
    }

    /// Run one fetch outside the background cadence.
    ///
    /// Dropped (`Skipped`) if a fetch is already in flight — the
    /// in-flight request will land the same snapshot.
    pub async fn refresh_now(&self, origin: PollOrigin) -> RefreshOutcome {
        run_guarded(&self.inner.source, &self.inner.in_flight, origin).await
    }

    /// Register a consumer. Starts the shared timer on the 0 -> 1 edge.
    pub fn subscribe(&self) {
        if self.inner.subscribers.fetch_add(1, Ordering::SeqCst) == 0 {
            self.start();
        }
    }

    /// Deregister a consumer. Stops the shared timer on the 1 -> 0 edge.
    pub fn unsubscribe(&self) {
        let previous = self.inner.subscribers.fetch_sub(1, Ordering::SeqCst);
        debug_assert!(previous > 0, "unsubscribe without matching subscribe");
        if previous == 1 {
            self.stop();
        }
    }

    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::SeqCst)
    }
}

/// Releases the in-flight flag on drop, so the guard is cleared even if
/// the poll future is cancelled by `stop()` mid-fetch.
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Acquire the in-flight guard, poll, release.
async fn run_guarded<S: PollSource>(
    source: &Arc<S>,
    in_flight: &AtomicBool,
    origin: PollOrigin,
) -> RefreshOutcome {
    if in_flight
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
        .is_err()
    {
        debug!(?origin, "Fetch already in flight, dropping refresh");
        return RefreshOutcome::Skipped;
    }
    let _guard = InFlightGuard(in_flight);

    match source.poll(origin).await {
        PollDirective::Continue => RefreshOutcome::Completed,
        PollDirective::Halt => RefreshOutcome::Halted,
    }
}
