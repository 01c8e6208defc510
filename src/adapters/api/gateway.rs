//! HTTP Order Gateway — Adapter for the Backend Order API
//!
//! Implements the `OrderGateway` and `StoreStatusSource` ports over the
//! shared authenticated `ApiClient`. Normalizes the list envelope and
//! drops unparseable individual orders instead of failing the batch.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, instrument, warn};

use super::client::ApiClient;
use super::types::{OrdersEnvelope, RawOrder, RawStoreStatus};
use crate::domain::lifecycle::OrderAction;
use crate::domain::order::Order;
use crate::ports::gateway::{GatewayError, OrderGateway};
use crate::ports::store_status::{StoreStatus, StoreStatusSource};

/// Order gateway backed by the merchant REST API.
///
/// Uses `ApiClient` for all requests (inherits bearer auth, retries,
/// and error mapping). Never creates its own reqwest client.
pub struct HttpOrderGateway {
    client: Arc<ApiClient>,
}

impl HttpOrderGateway {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    /// Decode each envelope element independently; a malformed order is
    /// logged and dropped, the rest of the batch survives.
    fn normalize_batch(elements: Vec<serde_json::Value>) -> Vec<Order> {
        let mut orders = Vec::with_capacity(elements.len());
        for element in elements {
            let parsed = serde_json::from_value::<RawOrder>(element.clone())
                .map_err(|e| e.to_string())
                .and_then(Order::try_from);
            match parsed {
                Ok(order) => orders.push(order),
                Err(reason) => {
                    warn!(reason, "Dropping unparseable order from batch");
                }
            }
        }
        orders
    }
}

#[async_trait]
impl OrderGateway for HttpOrderGateway {
    #[instrument(skip(self))]
    async fn list_orders(&self) -> Result<Vec<Order>, GatewayError> {
        let response = self.client.get("/orders").await?;
        let envelope: OrdersEnvelope = response
            .json()
            .await
            .map_err(|e| GatewayError::Malformed(e.to_string()))?;

        let orders = Self::normalize_batch(envelope.into_elements());
        debug!(count = orders.len(), "Fetched order collection");
        Ok(orders)
    }

    #[instrument(skip(self))]
    async fn get_order(&self, id: &str) -> Result<Order, GatewayError> {
        let response = self.client.get(&format!("/orders/{id}")).await?;
        let raw: RawOrder = response
            .json()
            .await
            .map_err(|e| GatewayError::Malformed(e.to_string()))?;
        Order::try_from(raw).map_err(GatewayError::Malformed)
    }

    #[instrument(skip(self), fields(action = %action))]
    async fn transition(&self, id: &str, action: OrderAction) -> Result<(), GatewayError> {
        let path = format!("/orders/{id}/{}", action.wire_key());

        // Cancel carries a reason payload; the other transitions take an
        // empty body.
        let body = if action == OrderAction::Cancel {
            serde_json::json!({ "reason": "MERCHANT_REQUEST" })
        } else {
            serde_json::json!({})
        };

        self.client.post_json(&path, &body).await?;
        Ok(())
    }
}

#[async_trait]
impl StoreStatusSource for HttpOrderGateway {
    async fn fetch_status(&self) -> Result<StoreStatus, GatewayError> {
        let response = self.client.get("/store/status").await?;
        let raw: RawStoreStatus = response
            .json()
            .await
            .map_err(|e| GatewayError::Malformed(e.to_string()))?;

        Ok(match raw.state.as_str() {
            "OPEN" => StoreStatus::Open,
            "CLOSED" => StoreStatus::Closed,
            other => {
                warn!(state = other, "Unrecognized store status");
                StoreStatus::Unknown
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::OrderStatus;

    #[test]
    fn test_normalize_batch_drops_bad_rows_keeps_good() {
        let elements = vec![
            serde_json::json!({"id": "good-1", "status": "Placed"}),
            serde_json::json!({"status": "Placed"}),
            serde_json::json!({"id": "good-2", "status": "CAR"}),
            serde_json::json!("not even an object"),
        ];

        let orders = HttpOrderGateway::normalize_batch(elements);
        assert_eq!(orders.len(), 2);
        assert_eq!(orders[0].id, "good-1");
        assert_eq!(orders[1].status, OrderStatus::Cancelled);
    }
}
