//! Domain Layer - Pure Order-Tracking Logic
//!
//! Zero I/O: everything here is a pure function over the order model.
//!
//! Components:
//! - `order`: Normalized order model, status vocabulary, currency display
//! - `lifecycle`: (status, channel) -> valid actions + status presentation
//! - `projection`: Search/filter/sort/pagination over a snapshot
//! - `sync`: Snapshot store + pure poll reducer (flags, dedup, GC)

pub mod lifecycle;
pub mod order;
pub mod projection;
pub mod sync;
