//! Snapshot store and poll reducer.
//!
//! All local mutation derived from a poll lives in one pure transition:
//! `SyncState::apply_poll(prev, fetched, origin) -> (next, effects)`.
//! The snapshot is replaced wholesale on every successful poll; the only
//! local-only annotations are the pending-webhook flags and the
//! notified-order set, both bounded by garbage collection against the
//! current snapshot.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::order::{Order, OrderId, OrderStatus};

// ────────────────────────────────────────────
// Snapshot
// ────────────────────────────────────────────

/// The last successfully fetched, normalized collection of orders.
///
/// Invariant: ids are unique. Duplicates in the fetched batch are dropped
/// (first occurrence wins) at construction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderSnapshot {
    orders: Vec<Order>,
}

impl OrderSnapshot {
    /// Build a snapshot, deduplicating by id (first occurrence wins).
    pub fn from_orders(fetched: Vec<Order>) -> Self {
        let mut seen = HashSet::with_capacity(fetched.len());
        let orders = fetched
            .into_iter()
            .filter(|o| seen.insert(o.id.clone()))
            .collect();
        Self { orders }
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    pub fn get(&self, id: &str) -> Option<&Order> {
        self.orders.iter().find(|o| o.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    fn id_set(&self) -> HashSet<&str> {
        self.orders.iter().map(|o| o.id.as_str()).collect()
    }
}

// ────────────────────────────────────────────
// Poll origin + effects
// ────────────────────────────────────────────

/// Whether a poll was triggered by the background cadence or by an
/// explicit user refresh. Manual refreshes must never re-surface
/// notifications for orders already on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOrigin {
    Background,
    Manual,
}

/// Side effects produced by a poll transition, to be executed by the
/// caller (the engine) after the new state is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEffect {
    /// Genuinely new orders in notify-worthy status arrived. Reported as
    /// one batch per poll cycle to avoid notification storms.
    NewOrders { count: usize, ids: Vec<OrderId> },
}

// ────────────────────────────────────────────
// Sync state + reducer
// ────────────────────────────────────────────

/// Snapshot plus the two local-only derived annotations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncState {
    /// Orders as last fetched.
    pub snapshot: OrderSnapshot,
    /// Ids with a dispatch submitted whose webhook confirmation is still
    /// pending. Never sent to the backend.
    pending_webhook: HashSet<OrderId>,
    /// Ids already notified as new. Bounded: GC'd against the snapshot.
    notified: HashSet<OrderId>,
}

impl SyncState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `id` is flagged as awaiting its dispatch webhook.
    pub fn webhook_pending(&self, id: &str) -> bool {
        self.pending_webhook.contains(id)
    }

    /// Number of ids currently tracked as notified (bounded-memory check).
    pub fn notified_len(&self) -> usize {
        self.notified.len()
    }

    /// Flag `id` as awaiting its dispatch webhook.
    ///
    /// Called by the action dispatcher right after a successful dispatch
    /// call, before the triggered refresh resolves.
    #[must_use]
    pub fn mark_webhook_pending(&self, id: &str) -> Self {
        let mut next = self.clone();
        next.pending_webhook.insert(id.to_string());
        next
    }

    /// Pure poll transition: fold a fetched batch into the next state.
    ///
    /// - Replaces the snapshot wholesale.
    /// - Clears a pending-webhook flag once the authoritative status is
    ///   no longer `Dispatched` (or the order vanished).
    /// - Garbage-collects notified ids absent from the new snapshot.
    /// - For background polls, detects orders that are new ids in status
    ///   `Placed` and not yet notified; emits them as a single batch and
    ///   adds their ids to the notified set. Manual refreshes detect
    ///   nothing — the user is already looking at the screen.
    #[must_use]
    pub fn apply_poll(
        &self,
        fetched: Vec<Order>,
        origin: PollOrigin,
    ) -> (Self, Vec<SyncEffect>) {
        let snapshot = OrderSnapshot::from_orders(fetched);
        let previous_ids = self.snapshot.id_set();

        // Pending-webhook flags survive only while the order is still
        // reported as Dispatched.
        let pending_webhook: HashSet<OrderId> = self
            .pending_webhook
            .iter()
            .filter(|id| {
                snapshot
                    .get(id)
                    .is_some_and(|o| o.status == OrderStatus::Dispatched)
            })
            .cloned()
            .collect();

        // GC: forget notified ids that left the snapshot.
        let mut notified: HashSet<OrderId> = self
            .notified
            .iter()
            .filter(|id| snapshot.contains(id))
            .cloned()
            .collect();

        let mut effects = Vec::new();

        if origin == PollOrigin::Background {
            let fresh: Vec<OrderId> = snapshot
                .orders()
                .iter()
                .filter(|o| {
                    o.status == OrderStatus::Placed
                        && !previous_ids.contains(o.id.as_str())
                        && !notified.contains(&o.id)
                })
                .map(|o| o.id.clone())
                .collect();

            if !fresh.is_empty() {
                notified.extend(fresh.iter().cloned());
                effects.push(SyncEffect::NewOrders {
                    count: fresh.len(),
                    ids: fresh,
                });
            }
        }

        (
            Self {
                snapshot,
                pending_webhook,
                notified,
            },
            effects,
        )
    }
}
