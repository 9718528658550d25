//! Sleep-session admission engine.
//!
//! The one place that decides whether a new or edited sleep interval may be
//! persisted: owner lookup, timestamp normalization, idempotent-retry
//! resolution, the overlap pre-check, and the translation of commit-time
//! constraint violations into the same outcomes as the pre-checks.

pub mod admission;
