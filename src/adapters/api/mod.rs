//! Merchant Backend API Adapter
//!
//! HTTP implementation of the order gateway and store-status ports:
//! - `auth`: Bearer-token session handling
//! - `client`: Shared reqwest client with retries + error mapping
//! - `types`: Loose wire types and defensive normalization
//! - `gateway`: `OrderGateway` / `StoreStatusSource` implementations

pub mod auth;
pub mod client;
pub mod gateway;
pub mod types;
