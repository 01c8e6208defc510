//! Store Status Watcher - Storefront Availability Tracking
//!
//! Second instantiation of the deduplicated poller, on the lighter
//! 120 s cadence. Keeps the last known storefront status; a fetch
//! failure retains the previous value, mirroring the order engine's
//! no-destructive-overwrite rule.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::domain::sync::PollOrigin;
use crate::ports::gateway::GatewayError;
use crate::ports::store_status::{StoreStatus, StoreStatusSource};

use super::poll_coordinator::{PollDirective, PollSource};

/// Tracks the last known storefront availability.
pub struct StoreStatusWatcher<S: StoreStatusSource> {
    source: Arc<S>,
    current: RwLock<Option<StoreStatus>>,
}

impl<S: StoreStatusSource> StoreStatusWatcher<S> {
    pub fn new(source: Arc<S>) -> Self {
        Self {
            source,
            current: RwLock::new(None),
        }
    }

    /// Last known status; `None` until the first successful fetch.
    pub async fn current(&self) -> Option<StoreStatus> {
        *self.current.read().await
    }
}

#[async_trait]
impl<S: StoreStatusSource> PollSource for StoreStatusWatcher<S> {
    async fn poll(&self, _origin: PollOrigin) -> PollDirective {
        match self.source.fetch_status().await {
            Ok(status) => {
                debug!(?status, "Store status updated");
                *self.current.write().await = Some(status);
                PollDirective::Continue
            }
            Err(GatewayError::SessionExpired) => {
                warn!("Session expired while polling store status");
                PollDirective::Halt
            }
            Err(err) => {
                // Keep the previous value; retry on the next tick.
                warn!(error = %err, "Store status fetch failed");
                PollDirective::Continue
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct ScriptedSource {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl StoreStatusSource for ScriptedSource {
        async fn fetch_status(&self) -> Result<StoreStatus, GatewayError> {
            match self.calls.fetch_add(1, Ordering::SeqCst) {
                0 => Ok(StoreStatus::Open),
                1 => Err(GatewayError::Transport("timeout".to_string())),
                _ => Ok(StoreStatus::Closed),
            }
        }
    }

    #[tokio::test]
    async fn test_failure_retains_previous_status() {
        let watcher = StoreStatusWatcher::new(Arc::new(ScriptedSource {
            calls: AtomicUsize::new(0),
        }));

        assert_eq!(watcher.current().await, None);

        watcher.poll(PollOrigin::Background).await;
        assert_eq!(watcher.current().await, Some(StoreStatus::Open));

        // Transport failure: previous value survives.
        let directive = watcher.poll(PollOrigin::Background).await;
        assert_eq!(directive, PollDirective::Continue);
        assert_eq!(watcher.current().await, Some(StoreStatus::Open));

        watcher.poll(PollOrigin::Background).await;
        assert_eq!(watcher.current().await, Some(StoreStatus::Closed));
    }
}
