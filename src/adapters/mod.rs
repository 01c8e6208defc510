//! Adapters Layer - Hexagonal Architecture Outer Ring
//!
//! Implements the port traits defined in `crate::ports` with concrete
//! technology: the merchant backend's REST API over reqwest.

pub mod api;
