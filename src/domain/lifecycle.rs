//! Order lifecycle state machine.
//!
//! Pure mapping from (status, fulfillment channel) to the set of valid
//! merchant actions, plus status presentation (label + color) including
//! the synthetic "awaiting marketplace confirmation" overlay shown while
//! a dispatch webhook is still in flight.
//!
//! Every function here is total: unknown statuses yield the raw status
//! string as the label and an empty action set, never an error.

use serde::{Deserialize, Serialize};

use super::order::{Channel, OrderStatus};

// ────────────────────────────────────────────
// Actions
// ────────────────────────────────────────────

/// A merchant-initiated lifecycle transition.
///
/// Each action maps 1:1 to a gateway endpoint; `wire_key()` is the
/// machine-readable segment in the transition URL, `label()` the human
/// text shown on the button and in the confirmation prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderAction {
    Confirm,
    StartSeparation,
    EndSeparation,
    Dispatch,
    /// Hand the order to the marketplace's own courier network.
    DispatchToMarketplace,
    RequestCourier,
    Cancel,
}

impl OrderAction {
    /// Machine-readable action key used on the wire.
    pub fn wire_key(self) -> &'static str {
        match self {
            Self::Confirm => "confirm",
            Self::StartSeparation => "startSeparation",
            Self::EndSeparation => "endSeparation",
            Self::Dispatch => "dispatch",
            Self::DispatchToMarketplace => "dispatchToIfood",
            Self::RequestCourier => "requestCourier",
            Self::Cancel => "cancel",
        }
    }

    /// Human label for buttons and confirmation prompts.
    pub fn label(self) -> &'static str {
        match self {
            Self::Confirm => "Confirm order",
            Self::StartSeparation => "Start separation",
            Self::EndSeparation => "End separation",
            Self::Dispatch => "Dispatch order",
            Self::DispatchToMarketplace => "Dispatch via marketplace",
            Self::RequestCourier => "Request courier",
            Self::Cancel => "Cancel order",
        }
    }

    /// Whether the action destroys or irreversibly advances the order,
    /// requiring an explicit user confirmation step before execution.
    pub fn requires_confirmation(self) -> bool {
        !matches!(self, Self::Confirm)
    }
}

impl std::fmt::Display for OrderAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.wire_key())
    }
}

// ────────────────────────────────────────────
// Action table
// ────────────────────────────────────────────

/// Valid actions for an order in `status` on `channel`.
///
/// Rules:
/// - The cancellation family (Cancelled, CANCELLATION_REQUESTED) never
///   offers actions, regardless of channel.
/// - The pickup channel never offers dispatch/courier actions; its
///   terminal local action is EndSeparation instead.
/// - SeparationEnded on the delivery channel deliberately mirrors
///   SeparationStarted: the backend has no distinct action for it, and
///   we preserve that rather than inventing one.
/// - Unknown statuses yield an empty set.
pub fn available_actions(status: &OrderStatus, channel: &Channel) -> Vec<OrderAction> {
    use OrderAction::{Cancel, Confirm, Dispatch, EndSeparation, StartSeparation};
    use OrderStatus as S;

    if matches!(status, S::Cancelled | S::CancellationRequested) {
        return Vec::new();
    }

    match (status, channel.is_pickup()) {
        (S::Placed, _) => vec![Confirm, Cancel],
        (S::Confirmed, _) => vec![StartSeparation, Cancel],
        (S::SeparationStarted, false) => vec![Dispatch, Cancel],
        (S::SeparationStarted, true) => vec![EndSeparation, Cancel],
        // SPE falls through to the SPS actions on the delivery channel.
        (S::SeparationEnded, false) => vec![Dispatch, Cancel],
        _ => Vec::new(),
    }
}

// ────────────────────────────────────────────
// Presentation
// ────────────────────────────────────────────

/// Display label + color for a status badge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusPresentation {
    pub label: String,
    pub color: &'static str,
}

/// Compute the badge for (status, pending-webhook flag).
///
/// The overlay is purely presentational: while a dispatch confirmation
/// webhook is pending, a `Dispatched` order renders as "awaiting
/// marketplace confirmation" even though the stored status is unchanged.
/// Recomputed on every call, never stored.
pub fn presentation(status: &OrderStatus, webhook_pending: bool) -> StatusPresentation {
    use OrderStatus as S;

    if matches!(status, S::Dispatched) && webhook_pending {
        return StatusPresentation {
            label: "Awaiting marketplace confirmation".to_string(),
            color: "amber",
        };
    }

    let (label, color) = match status {
        S::Placed => ("Placed", "blue"),
        S::Confirmed => ("Confirmed", "indigo"),
        S::SeparationStarted => ("Separation started", "purple"),
        S::SeparationEnded => ("Separation ended", "purple"),
        S::Dispatched => ("Dispatched", "cyan"),
        S::ReadyToPickup => ("Ready to pick up", "teal"),
        S::Arrived => ("Arrived", "green"),
        S::Concluded => ("Concluded", "green"),
        S::Cancelled => ("Cancelled", "red"),
        S::CancellationRequested => ("Cancellation requested", "red"),
        S::Unknown(raw) => {
            return StatusPresentation {
                label: raw.clone(),
                color: "gray",
            };
        }
    };

    StatusPresentation {
        label: label.to_string(),
        color,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delivery() -> Channel {
        Channel::from("LOGGI")
    }

    #[test]
    fn test_placed_offers_confirm_and_cancel_on_both_channels() {
        let expected = vec![OrderAction::Confirm, OrderAction::Cancel];
        assert_eq!(
            available_actions(&OrderStatus::Placed, &delivery()),
            expected
        );
        assert_eq!(
            available_actions(&OrderStatus::Placed, &Channel::pickup()),
            expected
        );
    }

    #[test]
    fn test_separation_started_diverges_by_channel() {
        assert_eq!(
            available_actions(&OrderStatus::SeparationStarted, &delivery()),
            vec![OrderAction::Dispatch, OrderAction::Cancel]
        );
        assert_eq!(
            available_actions(&OrderStatus::SeparationStarted, &Channel::pickup()),
            vec![OrderAction::EndSeparation, OrderAction::Cancel]
        );
    }

    /// SPE never got its own action in the backend's delivery table; it
    /// falls through to the SPS actions. Pinned here so nobody "fixes"
    /// it without noticing.
    #[test]
    fn separation_ended_mirrors_separation_started_for_delivery() {
        assert_eq!(
            available_actions(&OrderStatus::SeparationEnded, &delivery()),
            available_actions(&OrderStatus::SeparationStarted, &delivery())
        );
    }

    #[test]
    fn test_separation_ended_offers_nothing_for_pickup() {
        assert!(available_actions(&OrderStatus::SeparationEnded, &Channel::pickup()).is_empty());
    }

    #[test]
    fn test_cancellation_family_never_offers_actions() {
        for status in [OrderStatus::Cancelled, OrderStatus::CancellationRequested] {
            assert!(available_actions(&status, &delivery()).is_empty());
            assert!(available_actions(&status, &Channel::pickup()).is_empty());
        }
    }

    #[test]
    fn test_pickup_never_offers_dispatch_or_courier() {
        let statuses = [
            OrderStatus::Placed,
            OrderStatus::Confirmed,
            OrderStatus::SeparationStarted,
            OrderStatus::SeparationEnded,
            OrderStatus::Dispatched,
            OrderStatus::ReadyToPickup,
            OrderStatus::Unknown("X".to_string()),
        ];
        for status in statuses {
            let actions = available_actions(&status, &Channel::pickup());
            assert!(!actions.contains(&OrderAction::Dispatch));
            assert!(!actions.contains(&OrderAction::DispatchToMarketplace));
            assert!(!actions.contains(&OrderAction::RequestCourier));
        }
    }

    #[test]
    fn test_unknown_status_yields_empty_set_and_raw_label() {
        let status = OrderStatus::Unknown("WEIRD_STATE".to_string());
        assert!(available_actions(&status, &delivery()).is_empty());
        assert_eq!(presentation(&status, false).label, "WEIRD_STATE");
    }

    #[test]
    fn test_webhook_overlay_only_applies_to_dispatched() {
        let overlaid = presentation(&OrderStatus::Dispatched, true);
        assert_eq!(overlaid.label, "Awaiting marketplace confirmation");
        assert_eq!(overlaid.color, "amber");

        let plain = presentation(&OrderStatus::Dispatched, false);
        assert_eq!(plain.label, "Dispatched");

        // Flag set on a non-Dispatched status changes nothing.
        let confirmed = presentation(&OrderStatus::Confirmed, true);
        assert_eq!(confirmed.label, "Confirmed");
    }

    #[test]
    fn test_wire_keys_match_backend_endpoints() {
        assert_eq!(OrderAction::StartSeparation.wire_key(), "startSeparation");
        assert_eq!(
            OrderAction::DispatchToMarketplace.wire_key(),
            "dispatchToIfood"
        );
        assert_eq!(OrderAction::Cancel.wire_key(), "cancel");
    }
}
