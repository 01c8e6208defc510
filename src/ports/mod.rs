//! Ports Layer - Hexagonal Architecture Boundaries
//!
//! Defines the interfaces (traits) that the domain/usecases layer
//! requires from the outside world. Adapters implement these traits.
//!
//! Port categories:
//! - `OrderGateway`: Remote order collection + lifecycle transitions
//! - `StoreStatusSource`: Lightweight storefront availability signal

pub mod gateway;
pub mod store_status;
