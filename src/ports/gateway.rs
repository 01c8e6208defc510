//! Order Gateway Port - Remote Order API Interface
//!
//! Defines the trait the engine requires from the backend order API:
//! fetch the collection, fetch a single order, invoke a lifecycle
//! transition. The backend is an external collaborator; the engine only
//! depends on this contract and the error taxonomy below.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::lifecycle::OrderAction;
use crate::domain::order::Order;

/// Failure taxonomy for gateway calls.
///
/// Nothing here is fatal to the process. The worst case is "stop
/// polling" (session expired), recoverable by a fresh manual refresh
/// once the session is restored.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Transient network failure. Retry on the next tick; the previous
    /// snapshot is retained.
    #[error("transport failure: {0}")]
    Transport(String),

    /// 401-equivalent response. Polling halts until re-authenticated by
    /// the external session collaborator.
    #[error("session expired")]
    SessionExpired,

    /// Validation/conflict failure on a transition. The message is the
    /// backend's own text, surfaced to the user verbatim.
    #[error("transition rejected: {message}")]
    Rejected { message: String },

    /// Whole response body was undecodable. (Individual bad orders in an
    /// otherwise valid batch are dropped during normalization instead.)
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl GatewayError {
    /// Whether the next scheduled tick should still run.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::SessionExpired)
    }
}

/// Stateless interface to the remote order API.
///
/// Authentication is a bearer token supplied by the implementation on
/// every call; a transition is a single idempotent-on-retry call keyed
/// by order id.
#[async_trait]
pub trait OrderGateway: Send + Sync + 'static {
    /// Fetch the full authoritative order collection.
    ///
    /// # Errors
    /// `Transport` on network failure, `SessionExpired` on a 401,
    /// `Malformed` if the envelope itself cannot be decoded.
    async fn list_orders(&self) -> Result<Vec<Order>, GatewayError>;

    /// Fetch one order by id (item-level detail views).
    async fn get_order(&self, id: &str) -> Result<Order, GatewayError>;

    /// Invoke a lifecycle transition endpoint for `id`.
    ///
    /// # Errors
    /// `Rejected` carries the backend's validation/conflict message.
    async fn transition(&self, id: &str, action: OrderAction) -> Result<(), GatewayError>;
}
