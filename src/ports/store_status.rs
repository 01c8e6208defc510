//! Store Status Port - Lightweight Availability Signal
//!
//! A second, much lighter data source polled on its own cadence
//! (reference: 120 s vs 10 s for orders). Same deduplicated-poller
//! idiom, separate instantiation.

use async_trait::async_trait;

use super::gateway::GatewayError;

/// Whether the storefront is currently accepting orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreStatus {
    Open,
    Closed,
    /// Backend returned something we do not recognize.
    Unknown,
}

/// Source of the storefront availability signal.
#[async_trait]
pub trait StoreStatusSource: Send + Sync + 'static {
    /// Fetch the current storefront status.
    async fn fetch_status(&self) -> Result<StoreStatus, GatewayError>;
}
