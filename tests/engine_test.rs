//! Integration Tests - End-to-end Engine Component Testing
//!
//! Tests the interaction between usecases, ports, and mock adapters.
//! Uses mockall for trait mocking and tokio::test for async tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use mockall::mock;

use merchant_orders_engine::domain::lifecycle::OrderAction;
use merchant_orders_engine::domain::order::{
    Channel, DisplayCodes, Order, OrderStatus, Payment, Scheduling,
};
use merchant_orders_engine::domain::sync::PollOrigin;
use merchant_orders_engine::ports::gateway::GatewayError;
use merchant_orders_engine::usecases::dispatcher::{arm, ActionDispatcher};
use merchant_orders_engine::usecases::engine::{EngineEvent, OrderSyncEngine};
use merchant_orders_engine::usecases::poll_coordinator::{
    PollCoordinator, PollDirective, PollSource, RefreshOutcome,
};

// ---- Mock Definitions ----

mock! {
    pub Gateway {}

    #[async_trait::async_trait]
    impl merchant_orders_engine::ports::gateway::OrderGateway for Gateway {
        async fn list_orders(
            &self,
        ) -> Result<Vec<Order>, GatewayError>;

        async fn get_order(
            &self,
            id: &str,
        ) -> Result<Order, GatewayError>;

        async fn transition(
            &self,
            id: &str,
            action: OrderAction,
        ) -> Result<(), GatewayError>;
    }
}

// ---- Helpers ----

fn order(id: &str, status: &str, channel: &str) -> Order {
    Order {
        id: id.to_string(),
        customer_name: format!("Customer {id}"),
        items: vec![],
        status: OrderStatus::parse(status),
        channel: Channel::from(channel),
        payment: Payment {
            method: "PIX".to_string(),
            prepaid: true,
            cash_change: None,
        },
        scheduling: Scheduling::immediate(),
        created_at: None,
        codes: DisplayCodes::default(),
    }
}

fn drain_events(
    rx: &mut tokio::sync::broadcast::Receiver<EngineEvent>,
) -> Vec<EngineEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

// ---- Integration Tests ----

#[tokio::test]
async fn test_poll_populates_snapshot_and_failure_retains_it() {
    let mut gateway = MockGateway::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let calls_ref = Arc::clone(&calls);

    gateway.expect_list_orders().returning(move || {
        if calls_ref.fetch_add(1, Ordering::SeqCst) == 0 {
            Ok(vec![order("a1", "Placed", "TAKEOUT")])
        } else {
            Err(GatewayError::Transport("connection reset".to_string()))
        }
    });

    let engine = OrderSyncEngine::new(Arc::new(gateway));

    let directive = engine.poll(PollOrigin::Background).await;
    assert_eq!(directive, PollDirective::Continue);
    assert_eq!(engine.snapshot().await.len(), 1);

    // Transport failure: previous snapshot survives, engine keeps going.
    let directive = engine.poll(PollOrigin::Background).await;
    assert_eq!(directive, PollDirective::Continue);
    assert_eq!(engine.snapshot().await.len(), 1);
    assert!(engine.snapshot().await.contains("a1"));
}

#[tokio::test]
async fn test_manual_refresh_failure_surfaces_banner_background_stays_silent() {
    let mut gateway = MockGateway::new();
    gateway
        .expect_list_orders()
        .returning(|| Err(GatewayError::Transport("timeout".to_string())));

    let engine = OrderSyncEngine::new(Arc::new(gateway));
    let mut events = engine.subscribe_events();

    engine.poll(PollOrigin::Background).await;
    assert!(drain_events(&mut events).is_empty());

    engine.poll(PollOrigin::Manual).await;
    let surfaced = drain_events(&mut events);
    assert!(matches!(
        surfaced.as_slice(),
        [EngineEvent::RefreshFailed { .. }]
    ));
}

#[tokio::test]
async fn test_session_expiry_halts_polling() {
    let mut gateway = MockGateway::new();
    gateway
        .expect_list_orders()
        .returning(|| Err(GatewayError::SessionExpired));

    let engine = OrderSyncEngine::new(Arc::new(gateway));
    let mut events = engine.subscribe_events();

    let directive = engine.poll(PollOrigin::Background).await;
    assert_eq!(directive, PollDirective::Halt);
    assert_eq!(drain_events(&mut events), vec![EngineEvent::SessionExpired]);
}

#[tokio::test]
async fn test_new_order_notifies_once_across_polls() {
    let mut gateway = MockGateway::new();
    gateway
        .expect_list_orders()
        .returning(|| Ok(vec![order("x", "Placed", "LOGGI")]));

    let engine = OrderSyncEngine::new(Arc::new(gateway));
    let mut events = engine.subscribe_events();

    engine.poll(PollOrigin::Background).await;
    assert_eq!(
        drain_events(&mut events),
        vec![EngineEvent::NewOrdersArrived { count: 1 }]
    );

    // Same snapshot again: the order is known, no re-notification.
    engine.poll(PollOrigin::Background).await;
    assert!(drain_events(&mut events).is_empty());
}

#[tokio::test]
async fn test_confirm_lifecycle_scenario_takeout_order() {
    // Snapshot: [{id: "A1", status: Placed, channel: TAKEOUT}]
    let mut gateway = MockGateway::new();
    let polls = Arc::new(AtomicUsize::new(0));
    let polls_ref = Arc::clone(&polls);

    gateway.expect_list_orders().returning(move || {
        if polls_ref.fetch_add(1, Ordering::SeqCst) == 0 {
            Ok(vec![order("A1", "Placed", "TAKEOUT")])
        } else {
            Ok(vec![order("A1", "Confirmed", "TAKEOUT")])
        }
    });
    gateway
        .expect_transition()
        .withf(|id, action| id == "A1" && *action == OrderAction::Confirm)
        .times(1)
        .returning(|_, _| Ok(()));

    let gateway = Arc::new(gateway);
    let engine = Arc::new(OrderSyncEngine::new(Arc::clone(&gateway)));
    let coordinator = PollCoordinator::new(Arc::clone(&engine), Duration::from_secs(60));
    let dispatcher =
        ActionDispatcher::new(Arc::clone(&gateway), Arc::clone(&engine), coordinator);

    engine.poll(PollOrigin::Manual).await;
    assert_eq!(
        engine.actions_for("A1").await,
        vec![OrderAction::Confirm, OrderAction::Cancel]
    );

    let snapshot = engine.snapshot().await;
    let pending = arm(snapshot.get("A1").unwrap(), OrderAction::Confirm).unwrap();
    dispatcher.execute(&pending).await.unwrap();

    // The dispatcher's foreground refresh already fetched the new
    // authoritative status.
    assert_eq!(
        engine.actions_for("A1").await,
        vec![OrderAction::StartSeparation, OrderAction::Cancel]
    );
}

#[tokio::test]
async fn test_dispatch_sets_webhook_flag_until_status_moves_on() {
    let mut gateway = MockGateway::new();
    let polls = Arc::new(AtomicUsize::new(0));
    let polls_ref = Arc::clone(&polls);

    gateway.expect_list_orders().returning(move || {
        match polls_ref.fetch_add(1, Ordering::SeqCst) {
            0 => Ok(vec![order("d1", "SPS", "LOGGI")]),
            1 => Ok(vec![order("d1", "Dispatched", "LOGGI")]),
            _ => Ok(vec![order("d1", "Concluded", "LOGGI")]),
        }
    });
    gateway
        .expect_transition()
        .withf(|id, action| id == "d1" && *action == OrderAction::Dispatch)
        .times(1)
        .returning(|_, _| Ok(()));

    let gateway = Arc::new(gateway);
    let engine = Arc::new(OrderSyncEngine::new(Arc::clone(&gateway)));
    let coordinator = PollCoordinator::new(Arc::clone(&engine), Duration::from_secs(60));
    let dispatcher =
        ActionDispatcher::new(Arc::clone(&gateway), Arc::clone(&engine), coordinator);

    engine.poll(PollOrigin::Manual).await;
    let snapshot = engine.snapshot().await;
    let pending = arm(snapshot.get("d1").unwrap(), OrderAction::Dispatch).unwrap();
    dispatcher.execute(&pending).await.unwrap();

    // Flag set; the follow-up refresh reported Dispatched, so it stays.
    assert!(engine.webhook_pending("d1").await);
    let badge = engine.presentation_for("d1").await.unwrap();
    assert_eq!(badge.label, "Awaiting marketplace confirmation");

    // Webhook landed: next poll reports Concluded, flag clears.
    engine.poll(PollOrigin::Background).await;
    assert!(!engine.webhook_pending("d1").await);
}

#[tokio::test]
async fn test_rejected_transition_surfaces_backend_message_verbatim() {
    let mut gateway = MockGateway::new();
    gateway.expect_list_orders().returning(|| {
        Ok(vec![order("r1", "Placed", "LOGGI")])
    });
    gateway.expect_transition().returning(|_, _| {
        Err(GatewayError::Rejected {
            message: "order already confirmed by another operator".to_string(),
        })
    });

    let gateway = Arc::new(gateway);
    let engine = Arc::new(OrderSyncEngine::new(Arc::clone(&gateway)));
    let coordinator = PollCoordinator::new(Arc::clone(&engine), Duration::from_secs(60));
    let dispatcher =
        ActionDispatcher::new(Arc::clone(&gateway), Arc::clone(&engine), coordinator);

    engine.poll(PollOrigin::Manual).await;
    let before = engine.snapshot().await;
    let mut events = engine.subscribe_events();

    let pending = arm(before.get("r1").unwrap(), OrderAction::Confirm).unwrap();
    let result = dispatcher.execute(&pending).await;
    assert!(result.is_err());

    let surfaced = drain_events(&mut events);
    match surfaced.as_slice() {
        [EngineEvent::ActionFailed { message, .. }] => {
            assert_eq!(message, "order already confirmed by another operator");
        }
        other => panic!("unexpected events: {other:?}"),
    }

    // Local state untouched on failure.
    assert_eq!(engine.snapshot().await, before);
}

/// Gateway whose fetch parks long enough for a second refresh to arrive
/// while the first is still in flight.
struct SlowGateway {
    calls: AtomicUsize,
}

#[async_trait::async_trait]
impl merchant_orders_engine::ports::gateway::OrderGateway for SlowGateway {
    async fn list_orders(&self) -> Result<Vec<Order>, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(50)).await;
        Ok(vec![])
    }

    async fn get_order(&self, id: &str) -> Result<Order, GatewayError> {
        Err(GatewayError::Malformed(format!("no such order {id}")))
    }

    async fn transition(&self, _id: &str, _action: OrderAction) -> Result<(), GatewayError> {
        Ok(())
    }
}

#[tokio::test]
async fn test_refresh_during_in_flight_fetch_makes_one_gateway_call() {
    let gateway = Arc::new(SlowGateway {
        calls: AtomicUsize::new(0),
    });
    let engine = Arc::new(OrderSyncEngine::new(Arc::clone(&gateway)));
    let coordinator = PollCoordinator::new(Arc::clone(&engine), Duration::from_secs(60));

    let (a, b) = tokio::join!(
        coordinator.refresh_now(PollOrigin::Manual),
        coordinator.refresh_now(PollOrigin::Manual),
    );

    // One ran, the other was dropped by the in-flight guard.
    let outcomes = [a, b];
    assert!(outcomes.contains(&RefreshOutcome::Completed));
    assert!(outcomes.contains(&RefreshOutcome::Skipped));
    assert_eq!(gateway.calls.load(Ordering::SeqCst), 1);
}
