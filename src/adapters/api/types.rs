//! Merchant API Wire Types
//!
//! The backend's JSON is loose: camelCase keys, prices as numbers or
//! strings, optional fields appearing and vanishing between versions.
//! These types absorb that looseness; conversion into the domain model
//! is per-order fallible so one bad row never fails the whole batch.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::domain::order::{
    Channel, DeliveryWindow, DisplayCodes, LineItem, Order, OrderStatus, Payment,
    Scheduling,
};

/// An amount that arrives either as a JSON number or a string
/// (some backend versions send `"25.90"`, some `25.9`, some `"25,90"`).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawAmount {
    Number(f64),
    Text(String),
}

impl RawAmount {
    pub fn to_decimal(&self) -> Option<Decimal> {
        match self {
            Self::Number(n) => Decimal::from_f64_retain(*n).map(|d| d.round_dp(2)),
            Self::Text(s) => s.trim().replace(',', ".").parse::<Decimal>().ok(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLineItem {
    #[serde(default)]
    pub name: String,
    pub unit_price: RawAmount,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    #[serde(default)]
    pub barcode: Option<String>,
}

fn default_quantity() -> u32 {
    1
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPayment {
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub prepaid: bool,
    #[serde(default)]
    pub cash_change: Option<RawAmount>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawScheduling {
    #[serde(default)]
    pub is_scheduled: bool,
    #[serde(default)]
    pub preparation_start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub delivery_window_start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub delivery_window_end: Option<DateTime<Utc>>,
}

/// One order as the backend sends it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawOrder {
    pub id: String,
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub items: Vec<RawLineItem>,
    pub status: String,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub payment: RawPayment,
    #[serde(default)]
    pub scheduling: RawScheduling,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub short_code: Option<String>,
    #[serde(default)]
    pub delivery_code: Option<String>,
    #[serde(default)]
    pub pickup_code: Option<String>,
    #[serde(default)]
    pub customer_code: Option<String>,
}

impl TryFrom<RawOrder> for Order {
    type Error = String;

    fn try_from(raw: RawOrder) -> Result<Self, Self::Error> {
        if raw.id.trim().is_empty() {
            return Err("order without id".to_string());
        }

        let mut items = Vec::with_capacity(raw.items.len());
        for (index, item) in raw.items.into_iter().enumerate() {
            let unit_price = item
                .unit_price
                .to_decimal()
                .ok_or_else(|| format!("item {index}: unparseable unit price"))?;
            items.push(LineItem {
                name: item.name,
                unit_price,
                quantity: item.quantity,
                barcode: item.barcode,
            });
        }

        let delivery_window = match (
            raw.scheduling.delivery_window_start,
            raw.scheduling.delivery_window_end,
        ) {
            (Some(start), Some(end)) => Some(DeliveryWindow { start, end }),
            _ => None,
        };

        Ok(Self {
            id: raw.id,
            customer_name: raw.customer_name,
            items,
            status: OrderStatus::parse(&raw.status),
            channel: Channel(raw.channel.unwrap_or_default()),
            payment: Payment {
                method: raw.payment.method,
                prepaid: raw.payment.prepaid,
                cash_change: raw.payment.cash_change.and_then(|a| a.to_decimal()),
            },
            scheduling: Scheduling {
                is_scheduled: raw.scheduling.is_scheduled,
                preparation_start: raw.scheduling.preparation_start,
                delivery_window,
            },
            created_at: raw.created_at,
            codes: DisplayCodes {
                short_code: raw.short_code,
                delivery_code: raw.delivery_code,
                pickup_code: raw.pickup_code,
                customer_code: raw.customer_code,
            },
        })
    }
}

/// The list endpoint's envelope. Both `{"orders": [...]}` and
/// `{"data": [...]}` are in the wild, plus a bare array from the oldest
/// backend version. Elements stay as `Value` so each order decodes
/// independently.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum OrdersEnvelope {
    Tagged { orders: Vec<serde_json::Value> },
    Data { data: Vec<serde_json::Value> },
    Bare(Vec<serde_json::Value>),
}

impl OrdersEnvelope {
    pub fn into_elements(self) -> Vec<serde_json::Value> {
        match self {
            Self::Tagged { orders } => orders,
            Self::Data { data } => data,
            Self::Bare(elements) => elements,
        }
    }
}

/// Store status payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawStoreStatus {
    #[serde(default)]
    pub state: String,
}
