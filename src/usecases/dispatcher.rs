//! Action Dispatcher - Lifecycle Transition Submission
//!
//! Two-step flow: `arm` builds a `PendingAction` (pure, no network) that
//! the UI shows in its confirmation prompt; `execute` performs the single
//! idempotent-on-retry gateway call, sets the pending-webhook flag where
//! applicable, and triggers an immediate foreground refresh so the user
//! is not left waiting for the next background tick.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::domain::lifecycle::{available_actions, OrderAction};
use crate::domain::order::{Order, OrderId};
use crate::domain::sync::PollOrigin;
use crate::ports::gateway::{GatewayError, OrderGateway};

use super::engine::{EngineEvent, OrderSyncEngine};
use super::poll_coordinator::PollCoordinator;

/// Shown when the backend fails without a usable message of its own.
const GENERIC_CONNECTIVITY_MESSAGE: &str =
    "Could not reach the marketplace. Check your connection and try again.";

/// An armed transition awaiting user confirmation.
///
/// Carries everything the confirmation prompt needs: the order id, the
/// machine-readable action key, and the human label. Building one
/// performs no network activity — it only arms the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingAction {
    pub order_id: OrderId,
    pub action: OrderAction,
    pub label: &'static str,
}

/// Errors from the arming step.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ArmError {
    #[error("action {action} is not valid for order {order_id} in its current state")]
    InvalidForState {
        order_id: OrderId,
        action: OrderAction,
    },
}

/// Arm a transition for `order`. Pure validation against the lifecycle
/// table; rejects actions the current (status, channel) pair does not
/// offer. Performs no network activity.
pub fn arm(order: &Order, action: OrderAction) -> Result<PendingAction, ArmError> {
    if !available_actions(&order.status, &order.channel).contains(&action) {
        return Err(ArmError::InvalidForState {
            order_id: order.id.clone(),
            action,
        });
    }
    Ok(PendingAction {
        order_id: order.id.clone(),
        action,
        label: action.label(),
    })
}

/// Submits lifecycle transitions and wires their consequences.
pub struct ActionDispatcher<G: OrderGateway> {
    gateway: Arc<G>,
    engine: Arc<OrderSyncEngine<G>>,
    coordinator: PollCoordinator<OrderSyncEngine<G>>,
}

impl<G: OrderGateway> ActionDispatcher<G> {
    pub fn new(
        gateway: Arc<G>,
        engine: Arc<OrderSyncEngine<G>>,
        coordinator: PollCoordinator<OrderSyncEngine<G>>,
    ) -> Self {
        Self {
            gateway,
            engine,
            coordinator,
        }
    }

    /// Execute an armed transition.
    ///
    /// On success: sets the pending-webhook flag for a dispatch on a
    /// non-pickup order (before the triggered refresh resolves), emits
    /// `ActionSucceeded`, and requests an immediate foreground refresh.
    /// On failure: emits `ActionFailed` with the backend's message
    /// verbatim when available; local order state is left untouched.
    #[instrument(skip(self, pending), fields(order_id = %pending.order_id, action = %pending.action))]
    pub async fn execute(&self, pending: &PendingAction) -> Result<(), GatewayError> {
        let PendingAction {
            order_id, action, ..
        } = pending;

        match self.gateway.transition(order_id, *action).await {
            Ok(()) => {
                if *action == OrderAction::Dispatch {
                    let is_pickup = self
                        .engine
                        .snapshot()
                        .await
                        .get(order_id)
                        .map(|o| o.channel.is_pickup())
                        .unwrap_or(false);
                    if !is_pickup {
                        self.engine.mark_webhook_pending(order_id).await;
                    }
                }

                info!("Transition accepted");
                self.engine.emit(EngineEvent::ActionSucceeded {
                    order_id: order_id.clone(),
                    action: *action,
                });

                // Foreground refresh so the new status shows up now, not
                // on the next background tick.
                let _ = self.coordinator.refresh_now(PollOrigin::Manual).await;
                Ok(())
            }
            Err(err) => {
                let message = match &err {
                    GatewayError::Rejected { message } => message.clone(),
                    _ => GENERIC_CONNECTIVITY_MESSAGE.to_string(),
                };
                warn!(error = %err, "Transition failed");
                self.engine.emit(EngineEvent::ActionFailed {
                    order_id: order_id.clone(),
                    action: *action,
                    message,
                });
                Err(err)
            }
        }
    }
}
