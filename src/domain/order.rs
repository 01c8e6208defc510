//! Core order domain types.
//!
//! Defines the normalized order model the engine works with: line items,
//! payment and scheduling descriptors, fulfillment channel, and the fixed
//! status vocabulary. These types are the foundation of the hexagonal
//! architecture's inner ring.
//!
//! The backend owns the authoritative order state; everything here is a
//! normalized local view. The only derived value is `total()`, which the
//! backend never sends.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ────────────────────────────────────────────
// Type aliases consumed by ports and usecases
// ────────────────────────────────────────────

/// Opaque backend-assigned order identifier. Unique within a snapshot.
pub type OrderId = String;

// ────────────────────────────────────────────
// Fulfillment channel
// ────────────────────────────────────────────

/// Raw channel value that denotes customer pickup rather than delivery.
pub const PICKUP_CHANNEL: &str = "TAKEOUT";

/// Fulfillment channel — a delivery-provider tag.
///
/// The tag set is open (providers come and go); the engine only
/// distinguishes the pickup channel from everything else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Channel(pub String);

impl Channel {
    /// True exactly for the distinguished customer-pickup channel.
    pub fn is_pickup(&self) -> bool {
        self.0 == PICKUP_CHANNEL
    }

    pub fn pickup() -> Self {
        Self(PICKUP_CHANNEL.to_string())
    }
}

impl From<&str> for Channel {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ────────────────────────────────────────────
// Status vocabulary
// ────────────────────────────────────────────

/// Order lifecycle status as reported by the backend.
///
/// The backend mixes long names, short codes, and legacy aliases for the
/// same state (`SPS` / `"Separation Started"`, `Cancelled` / `CAR`, ...).
/// Parsing folds every alias into one variant; anything unrecognized is
/// preserved verbatim in `Unknown` so display never loses information and
/// parsing never fails.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OrderStatus {
    /// Received, not yet accepted by the merchant.
    Placed,
    /// Accepted by the merchant.
    Confirmed,
    /// Picking in progress (`SPS`).
    SeparationStarted,
    /// Picked, not yet acted on (`SPE`).
    SeparationEnded,
    /// Handed to a courier; terminal from the merchant's side until the
    /// provider webhook moves it forward.
    Dispatched,
    /// Ready for the customer to collect (`READY_TO_PICKUP` / `RFI`).
    ReadyToPickup,
    /// Courier arrived at the destination.
    Arrived,
    /// Finished (`Concluded` / `DDCS`).
    Concluded,
    /// Terminated (`Cancelled` / `CAR`).
    Cancelled,
    /// Cancellation requested, awaiting provider confirmation.
    CancellationRequested,
    /// Unmapped status — raw string kept as-is.
    Unknown(String),
}

impl OrderStatus {
    /// Parse a raw backend status string, folding known aliases.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "Placed" => Self::Placed,
            "Confirmed" => Self::Confirmed,
            "SPS" | "Separation Started" => Self::SeparationStarted,
            "SPE" | "Separation Ended" => Self::SeparationEnded,
            "Dispatched" => Self::Dispatched,
            "READY_TO_PICKUP" | "Ready to Pickup" | "RFI" => Self::ReadyToPickup,
            "Arrived" => Self::Arrived,
            "Concluded" | "DDCS" => Self::Concluded,
            "Cancelled" | "CAR" => Self::Cancelled,
            "CANCELLATION_REQUESTED" => Self::CancellationRequested,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Canonical raw form (what we send back / log).
    pub fn as_raw(&self) -> &str {
        match self {
            Self::Placed => "Placed",
            Self::Confirmed => "Confirmed",
            Self::SeparationStarted => "SPS",
            Self::SeparationEnded => "SPE",
            Self::Dispatched => "Dispatched",
            Self::ReadyToPickup => "READY_TO_PICKUP",
            Self::Arrived => "Arrived",
            Self::Concluded => "Concluded",
            Self::Cancelled => "Cancelled",
            Self::CancellationRequested => "CANCELLATION_REQUESTED",
            Self::Unknown(raw) => raw,
        }
    }

    /// True once no merchant action can ever apply again.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Cancelled | Self::CancellationRequested | Self::Concluded
        )
    }
}

impl From<String> for OrderStatus {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl From<OrderStatus> for String {
    fn from(status: OrderStatus) -> Self {
        status.as_raw().to_string()
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_raw())
    }
}

// ────────────────────────────────────────────
// Order components
// ────────────────────────────────────────────

/// A single ordered line item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    /// Product name as shown to the merchant.
    pub name: String,
    /// Unit price.
    pub unit_price: Decimal,
    /// Ordered quantity.
    pub quantity: u32,
    /// Optional product barcode for the picking flow.
    pub barcode: Option<String>,
}

impl LineItem {
    /// Line subtotal: unit price × quantity.
    pub fn subtotal(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Payment descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    /// Payment method tag (e.g. "CREDIT", "PIX", "CASH").
    pub method: String,
    /// Paid online (true) vs in person on handoff (false).
    pub prepaid: bool,
    /// Cash-change amount requested by the customer, if any.
    pub cash_change: Option<Decimal>,
}

/// Delivery window with start and end timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Scheduling descriptor — immediate orders carry neither timestamp.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Scheduling {
    /// Whether the order was placed for a future window.
    pub is_scheduled: bool,
    /// When preparation should start (scheduled orders only).
    pub preparation_start: Option<DateTime<Utc>>,
    /// Agreed delivery window (scheduled orders only).
    pub delivery_window: Option<DeliveryWindow>,
}

impl Scheduling {
    pub fn immediate() -> Self {
        Self::default()
    }
}

/// Opaque display codes shown alongside the order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DisplayCodes {
    pub short_code: Option<String>,
    pub delivery_code: Option<String>,
    pub pickup_code: Option<String>,
    pub customer_code: Option<String>,
}

// ────────────────────────────────────────────
// Order
// ────────────────────────────────────────────

/// A normalized marketplace order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Backend-assigned opaque id.
    pub id: OrderId,
    /// Customer display name.
    pub customer_name: String,
    /// Ordered line items.
    pub items: Vec<LineItem>,
    /// Current lifecycle status.
    pub status: OrderStatus,
    /// Fulfillment channel.
    pub channel: Channel,
    /// Payment descriptor.
    pub payment: Payment,
    /// Scheduling descriptor.
    pub scheduling: Scheduling,
    /// Creation timestamp; some legacy rows arrive without one.
    pub created_at: Option<DateTime<Utc>>,
    /// Display codes.
    pub codes: DisplayCodes,
}

impl Order {
    /// Derived order total: Σ(unit_price × quantity). Never persisted.
    pub fn total(&self) -> Decimal {
        self.items.iter().map(LineItem::subtotal).sum()
    }

    /// Shortened display form: `#` + first 8 chars of the raw id.
    pub fn short_display_id(&self) -> String {
        let prefix: String = self.id.chars().take(8).collect();
        format!("#{prefix}")
    }
}

// ────────────────────────────────────────────
// Currency formatting
// ────────────────────────────────────────────

/// Format an amount the way the dashboard shows it: `R$ 1.234,56`.
///
/// Comma decimal separator and dot thousands grouping. The formatted
/// string participates in free-text search, so a user typing "25,90"
/// finds an order whose numeric total is 25.9.
pub fn format_currency(amount: Decimal) -> String {
    let fixed = amount.round_dp(2);
    let negative = fixed.is_sign_negative();
    let text = fixed.abs().to_string();

    let (int_part, frac_part) = match text.split_once('.') {
        Some((i, f)) => (i.to_string(), format!("{f:0<2}")),
        None => (text, "00".to_string()),
    };

    // Group integer digits in threes from the right.
    let digits: Vec<char> = int_part.chars().collect();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(*ch);
    }

    let sign = if negative { "-" } else { "" };
    format!("{sign}R$ {grouped},{frac_part}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn item(price: Decimal, qty: u32) -> LineItem {
        LineItem {
            name: "Item".to_string(),
            unit_price: price,
            quantity: qty,
            barcode: None,
        }
    }

    #[test]
    fn test_status_alias_parsing() {
        assert_eq!(OrderStatus::parse("SPS"), OrderStatus::SeparationStarted);
        assert_eq!(
            OrderStatus::parse("Separation Started"),
            OrderStatus::SeparationStarted
        );
        assert_eq!(OrderStatus::parse("RFI"), OrderStatus::ReadyToPickup);
        assert_eq!(
            OrderStatus::parse("Ready to Pickup"),
            OrderStatus::ReadyToPickup
        );
        assert_eq!(OrderStatus::parse("CAR"), OrderStatus::Cancelled);
        assert_eq!(OrderStatus::parse("DDCS"), OrderStatus::Concluded);
    }

    #[test]
    fn test_status_unknown_round_trips_raw() {
        let status = OrderStatus::parse("SOME_NEW_STATE");
        assert_eq!(status, OrderStatus::Unknown("SOME_NEW_STATE".to_string()));
        assert_eq!(status.as_raw(), "SOME_NEW_STATE");
    }

    #[test]
    fn test_channel_pickup_detection() {
        assert!(Channel::pickup().is_pickup());
        assert!(!Channel::from("LOGGI").is_pickup());
    }

    #[test]
    fn test_order_total_sums_line_items() {
        let order = Order {
            id: "abc".to_string(),
            customer_name: "Ana".to_string(),
            items: vec![item(dec!(10.50), 2), item(dec!(4.90), 1)],
            status: OrderStatus::Placed,
            channel: Channel::pickup(),
            payment: Payment {
                method: "PIX".to_string(),
                prepaid: true,
                cash_change: None,
            },
            scheduling: Scheduling::immediate(),
            created_at: None,
            codes: DisplayCodes::default(),
        };
        assert_eq!(order.total(), dec!(25.90));
    }

    #[test]
    fn test_short_display_id() {
        let mut order = Order {
            id: "1234567890abcdef".to_string(),
            customer_name: String::new(),
            items: vec![],
            status: OrderStatus::Placed,
            channel: Channel::pickup(),
            payment: Payment {
                method: "CASH".to_string(),
                prepaid: false,
                cash_change: None,
            },
            scheduling: Scheduling::immediate(),
            created_at: None,
            codes: DisplayCodes::default(),
        };
        assert_eq!(order.short_display_id(), "#12345678");

        order.id = "a1".to_string();
        assert_eq!(order.short_display_id(), "#a1");
    }

    #[test]
    fn test_format_currency_comma_decimals() {
        assert_eq!(format_currency(dec!(25.9)), "R$ 25,90");
        assert_eq!(format_currency(dec!(0.5)), "R$ 0,50");
        assert_eq!(format_currency(dec!(7)), "R$ 7,00");
    }

    #[test]
    fn test_format_currency_thousands_grouping() {
        assert_eq!(format_currency(dec!(1234.56)), "R$ 1.234,56");
        assert_eq!(format_currency(dec!(1234567.8)), "R$ 1.234.567,80");
    }

    #[test]
    fn test_status_serde_uses_raw_form() {
        let json = serde_json::to_string(&OrderStatus::SeparationStarted).unwrap();
        assert_eq!(json, "\"SPS\"");
        let back: OrderStatus = serde_json::from_str("\"Separation Started\"").unwrap();
        assert_eq!(back, OrderStatus::SeparationStarted);
    }
}
