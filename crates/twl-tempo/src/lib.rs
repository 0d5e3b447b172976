//! Jira/Tempo remote collaborators.
//!
//! [`Client`] is the thin HTTP layer over the Jira and Tempo REST APIs;
//! [`WorkLogService`] drives the reconciliation from `twl-core` against it
//! with bounded concurrency.

mod api;
mod service;

pub use api::{Client, TempoError};
pub use service::WorkLogService;
