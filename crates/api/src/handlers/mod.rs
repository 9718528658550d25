//! Request handlers.
//!
//! Each submodule provides async handler functions for one resource.
//! Handlers stay thin: extract, validate, delegate to the admission engine
//! or a repository in `somna_db`, and map errors via [`crate::error::AppError`].

pub mod analytics;
pub mod sleep_session;
pub mod user;
