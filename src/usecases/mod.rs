//! Use Cases Layer - Application Business Logic
//!
//! Orchestrates domain logic with port interfaces to implement the
//! engine's core workflows. Each use case is a self-contained
//! business operation.
//!
//! Use cases:
//! - `PollCoordinator`: Deduplicated polling, one fetch in flight
//! - `OrderSyncEngine`: Snapshot ownership + poll application + events
//! - `ActionDispatcher`: Lifecycle transition submission
//! - `StoreStatusWatcher`: Lighter storefront availability signal

pub mod dispatcher;
pub mod engine;
pub mod poll_coordinator;
pub mod store_status;
