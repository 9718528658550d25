//! Domain logic for the Somna sleep-tracking service.
//!
//! This crate has zero internal dependencies so the persistence layer, the
//! API layer, and any future CLI tooling can all share it. Everything here
//! is pure: no I/O, no global state.

pub mod analytics;
pub mod error;
pub mod overlap;
pub mod pagination;
pub mod timezone;
pub mod types;
