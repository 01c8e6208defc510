//! Client-side view projection.
//!
//! Pure function from (sync state, view query) to the page of orders the
//! user sees: free-text search, composite status filters, payment and
//! order-type predicates, deterministic sorting, and pagination. The
//! projection never fabricates orders and preserves id uniqueness — it
//! only filters, reorders, and slices the snapshot.

use std::cmp::Ordering;

use super::order::{format_currency, Order, OrderStatus};
use super::sync::SyncState;

// ────────────────────────────────────────────
// Query state
// ────────────────────────────────────────────

/// Sortable columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Id,
    Customer,
    Total,
    Status,
    CreatedAt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDir {
    Asc,
    Desc,
}

impl SortDir {
    fn toggled(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

/// Status filter, including the composite values the dashboard offers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusFilter {
    All,
    /// Dispatched orders still awaiting their webhook confirmation.
    WaitingWebhook,
    /// Union of READY_TO_PICKUP / "Ready to Pickup" / RFI.
    ReadyToPickup,
    /// Union of Cancelled / CAR.
    Cancelled,
    /// Plain status equality.
    Status(OrderStatus),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentFilter {
    All,
    /// Paid online before handoff.
    Online,
    /// Paid in person on handoff.
    InPerson,
    /// Specific payment method tag.
    Method(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderTypeFilter {
    All,
    Scheduled,
    Immediate,
}

/// Ephemeral filter/sort/pagination state.
///
/// Mutators reset the page to 0 whenever any criterion changes, so the
/// user never lands on an empty page after narrowing a filter. Not
/// persisted across sessions.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewQuery {
    pub search: String,
    pub status_filter: StatusFilter,
    pub payment_filter: PaymentFilter,
    pub order_type_filter: OrderTypeFilter,
    pub sort_key: SortKey,
    pub sort_dir: SortDir,
    pub page: usize,
    pub page_size: usize,
}

impl Default for ViewQuery {
    /// Newest first, everything visible, first page.
    fn default() -> Self {
        Self {
            search: String::new(),
            status_filter: StatusFilter::All,
            payment_filter: PaymentFilter::All,
            order_type_filter: OrderTypeFilter::All,
            sort_key: SortKey::CreatedAt,
            sort_dir: SortDir::Desc,
            page: 0,
            page_size: 10,
        }
    }
}

impl ViewQuery {
    pub fn set_search(&mut self, term: impl Into<String>) {
        self.search = term.into();
        self.page = 0;
    }

    pub fn set_status_filter(&mut self, filter: StatusFilter) {
        self.status_filter = filter;
        self.page = 0;
    }

    pub fn set_payment_filter(&mut self, filter: PaymentFilter) {
        self.payment_filter = filter;
        self.page = 0;
    }

    pub fn set_order_type_filter(&mut self, filter: OrderTypeFilter) {
        self.order_type_filter = filter;
        self.page = 0;
    }

    /// Select a sort column. Re-selecting the current one toggles the
    /// direction instead.
    pub fn select_sort_key(&mut self, key: SortKey) {
        if self.sort_key == key {
            self.sort_dir = self.sort_dir.toggled();
        } else {
            self.sort_key = key;
            self.sort_dir = SortDir::Asc;
        }
        self.page = 0;
    }

    pub fn set_page(&mut self, page: usize) {
        self.page = page;
    }

    /// Changing the page size always jumps back to the first page.
    pub fn set_page_size(&mut self, size: usize) {
        self.page_size = size.max(1);
        self.page = 0;
    }
}

/// One page of projected orders plus the pre-pagination match count.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedPage {
    pub orders: Vec<Order>,
    pub total_count: usize,
}

// ────────────────────────────────────────────
// Projection
// ────────────────────────────────────────────

/// Apply search, filters, sort, and pagination to the current snapshot.
pub fn project(state: &SyncState, query: &ViewQuery) -> ProjectedPage {
    let mut matched: Vec<&Order> = state
        .snapshot
        .orders()
        .iter()
        .filter(|o| matches_search(o, &query.search))
        .filter(|o| matches_status(o, &query.status_filter, state))
        .filter(|o| matches_payment(o, &query.payment_filter))
        .filter(|o| matches_order_type(o, query.order_type_filter))
        .collect();

    if query.order_type_filter == OrderTypeFilter::Scheduled {
        // Scheduled view overrides the generic sort: scheduled orders
        // first, ascending preparation-start among them.
        matched.sort_by(|a, b| compare_scheduled_first(a, b));
    } else {
        matched.sort_by(|a, b| compare_by_key(a, b, query.sort_key, query.sort_dir));
    }

    let total_count = matched.len();
    let start = query.page.saturating_mul(query.page_size).min(total_count);
    let end = start.saturating_add(query.page_size).min(total_count);

    ProjectedPage {
        orders: matched[start..end].iter().map(|o| (*o).clone()).collect(),
        total_count,
    }
}

// ────────────────────────────────────────────
// Predicates
// ────────────────────────────────────────────

fn matches_search(order: &Order, term: &str) -> bool {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }

    order.id.to_lowercase().contains(&needle)
        || order.short_display_id().to_lowercase().contains(&needle)
        || format_currency(order.total()).to_lowercase().contains(&needle)
}

fn matches_status(order: &Order, filter: &StatusFilter, state: &SyncState) -> bool {
    match filter {
        StatusFilter::All => true,
        StatusFilter::WaitingWebhook => {
            order.status == OrderStatus::Dispatched && state.webhook_pending(&order.id)
        }
        // The alias unions (RFI variants, Cancelled/CAR) are already
        // folded into one variant at parse time.
        StatusFilter::ReadyToPickup => order.status == OrderStatus::ReadyToPickup,
        StatusFilter::Cancelled => order.status == OrderStatus::Cancelled,
        StatusFilter::Status(status) => order.status == *status,
    }
}

fn matches_payment(order: &Order, filter: &PaymentFilter) -> bool {
    match filter {
        PaymentFilter::All => true,
        PaymentFilter::Online => order.payment.prepaid,
        PaymentFilter::InPerson => !order.payment.prepaid,
        PaymentFilter::Method(method) => order.payment.method.eq_ignore_ascii_case(method),
    }
}

fn matches_order_type(order: &Order, filter: OrderTypeFilter) -> bool {
    match filter {
        OrderTypeFilter::All => true,
        OrderTypeFilter::Scheduled => order.scheduling.is_scheduled,
        OrderTypeFilter::Immediate => !order.scheduling.is_scheduled,
    }
}

// ────────────────────────────────────────────
// Comparators
// ────────────────────────────────────────────

/// Compare by the selected column in the requested direction.
///
/// The direction applies to the primary comparison only: rows with no
/// timestamp always sort after dated rows, and the id tiebreak is always
/// ascending, so ties and gaps keep a stable placement whichever way the
/// column is sorted.
fn compare_by_key(a: &Order, b: &Order, key: SortKey, dir: SortDir) -> Ordering {
    let primary = match key {
        SortKey::Id => a.id.cmp(&b.id),
        SortKey::Customer => collate(&a.customer_name, &b.customer_name),
        SortKey::Total => a.total().cmp(&b.total()),
        SortKey::Status => collate(a.status.as_raw(), b.status.as_raw()),
        SortKey::CreatedAt => compare_created_at(a, b, dir),
    };
    let directed = match key {
        // Missing-timestamp placement is already direction-aware.
        SortKey::CreatedAt => primary,
        _ => apply_dir(primary, dir),
    };
    directed.then_with(|| a.id.cmp(&b.id))
}

fn apply_dir(ord: Ordering, dir: SortDir) -> Ordering {
    match dir {
        SortDir::Asc => ord,
        SortDir::Desc => ord.reverse(),
    }
}

/// Case-insensitive collation for string columns.
fn collate(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

/// Dated rows compare chronologically in the requested direction; rows
/// without a timestamp sort after dated rows whichever direction is
/// active.
fn compare_created_at(a: &Order, b: &Order, dir: SortDir) -> Ordering {
    match (a.created_at, b.created_at) {
        (Some(ta), Some(tb)) => apply_dir(ta.cmp(&tb), dir),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Scheduled-view ordering: scheduled before immediate; among scheduled,
/// ascending preparation-start (missing last); id tiebreak throughout.
fn compare_scheduled_first(a: &Order, b: &Order) -> Ordering {
    b.scheduling
        .is_scheduled
        .cmp(&a.scheduling.is_scheduled)
        .then_with(|| match (
            a.scheduling.preparation_start,
            b.scheduling.preparation_start,
        ) {
            (Some(ta), Some(tb)) => ta.cmp(&tb),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| a.id.cmp(&b.id))
}
