//! Order Sync Engine - Snapshot Ownership and Poll Application
//!
//! Owns the `SyncState` (the single shared mutable resource), implements
//! `PollSource` so a `PollCoordinator` can drive it, and surfaces
//! notification-worthy events on a broadcast channel. Only the poll
//! completion path writes to the state; projections and lookups read a
//! consistent view within one synchronous borrow.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, instrument, warn};

use crate::domain::lifecycle::{
    available_actions, presentation, OrderAction, StatusPresentation,
};
use crate::domain::order::OrderId;
use crate::domain::projection::{project, ProjectedPage, ViewQuery};
use crate::domain::sync::{OrderSnapshot, PollOrigin, SyncEffect, SyncState};
use crate::ports::gateway::{GatewayError, OrderGateway};

use super::poll_coordinator::{PollDirective, PollSource};

/// Capacity of the event channel; droppable UI notifications, so a slow
/// subscriber losing old events is acceptable.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Notifications surfaced to the UI layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Genuinely new confirmed-worthy orders arrived (batched count).
    NewOrdersArrived { count: usize },
    /// A manual refresh failed; background failures stay silent.
    RefreshFailed { message: String },
    /// The session token was rejected; polling halts until re-auth.
    SessionExpired,
    /// A lifecycle transition was accepted by the backend.
    ActionSucceeded {
        order_id: OrderId,
        action: OrderAction,
    },
    /// A lifecycle transition failed; message is backend text when
    /// available, generic connectivity text otherwise.
    ActionFailed {
        order_id: OrderId,
        action: OrderAction,
        message: String,
    },
}

/// Live-sync engine over one merchant's order collection.
pub struct OrderSyncEngine<G: OrderGateway> {
    gateway: Arc<G>,
    state: RwLock<SyncState>,
    events: broadcast::Sender<EngineEvent>,
    /// Loading indicator for *manual* refreshes only. Background polls
    /// never toggle it.
    refreshing: AtomicBool,
}

impl<G: OrderGateway> OrderSyncEngine<G> {
    pub fn new(gateway: Arc<G>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            gateway,
            state: RwLock::new(SyncState::new()),
            events,
            refreshing: AtomicBool::new(false),
        }
    }

    /// Subscribe to engine events.
    pub fn subscribe_events(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }

    /// Whether a manual refresh is currently in flight.
    pub fn is_refreshing(&self) -> bool {
        self.refreshing.load(Ordering::SeqCst)
    }

    /// Clone of the current snapshot.
    pub async fn snapshot(&self) -> OrderSnapshot {
        self.state.read().await.snapshot.clone()
    }

    /// Apply the view query to the current state.
    pub async fn project(&self, query: &ViewQuery) -> ProjectedPage {
        let state = self.state.read().await;
        project(&state, query)
    }

    /// Valid actions for an order currently in the snapshot.
    pub async fn actions_for(&self, id: &str) -> Vec<OrderAction> {
        let state = self.state.read().await;
        state
            .snapshot
            .get(id)
            .map(|o| available_actions(&o.status, &o.channel))
            .unwrap_or_default()
    }

    /// Status badge for an order, with the pending-webhook overlay
    /// recomputed from (status, flag) on every call.
    pub async fn presentation_for(&self, id: &str) -> Option<StatusPresentation> {
        let state = self.state.read().await;
        let order = state.snapshot.get(id)?;
        Some(presentation(&order.status, state.webhook_pending(&order.id)))
    }

    /// Whether `id` awaits its dispatch webhook.
    pub async fn webhook_pending(&self, id: &str) -> bool {
        self.state.read().await.webhook_pending(id)
    }

    /// Flag `id` as awaiting its dispatch webhook (action dispatcher
    /// calls this right after a successful dispatch, before the
    /// follow-up refresh resolves).
    pub async fn mark_webhook_pending(&self, id: &str) {
        let mut state = self.state.write().await;
        *state = state.mark_webhook_pending(id);
    }

    /// Emit an event. Sending fails only when nobody is subscribed,
    /// which is fine for droppable UI notifications.
    pub(crate) fn emit(&self, event: EngineEvent) {
        let _ = self.events.send(event);
    }
}

#[async_trait]
impl<G: OrderGateway> PollSource for OrderSyncEngine<G> {
    /// One fetch-and-apply cycle.
    ///
    /// Success runs the pure reducer and stores the result; transport
    /// failures keep the previous snapshot and only surface a banner for
    /// manual refreshes; a session expiry halts the coordinator.
    #[instrument(skip(self), name = "order_poll")]
    async fn poll(&self, origin: PollOrigin) -> PollDirective {
        let manual = origin == PollOrigin::Manual;
        if manual {
            self.refreshing.store(true, Ordering::SeqCst);
        }

        let directive = match self.gateway.list_orders().await {
            Ok(orders) => {
                let mut state = self.state.write().await;
                let (next, effects) = state.apply_poll(orders, origin);
                *state = next;
                let total = state.snapshot.len();
                drop(state);

                debug!(orders = total, ?origin, "Snapshot replaced");

                for effect in effects {
                    match effect {
                        SyncEffect::NewOrders { count, .. } => {
                            info!(count, "New orders arrived");
                            self.emit(EngineEvent::NewOrdersArrived { count });
                        }
                    }
                }
                PollDirective::Continue
            }
            Err(GatewayError::SessionExpired) => {
                warn!("Session expired, halting background polls");
                self.emit(EngineEvent::SessionExpired);
                PollDirective::Halt
            }
            Err(err) => {
                // Previous snapshot retained; retry on the next tick.
                warn!(error = %err, ?origin, "Order fetch failed");
                if manual {
                    self.emit(EngineEvent::RefreshFailed {
                        message: err.to_string(),
                    });
                }
                PollDirective::Continue
            }
        };

        if manual {
            self.refreshing.store(false, Ordering::SeqCst);
        }
        directive
    }
}
