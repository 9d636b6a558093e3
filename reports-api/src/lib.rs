//! Reports API - Request Core for the Reports Scheduler
//!
//! Typed transport actions for listing, fetching and deleting report
//! definitions and instances, plus local stats. Requests arrive either as
//! encoded transport payloads through [`ActionDispatcher::execute`] or over
//! the Axum REST routes, and are answered from a pluggable search backend.

#[macro_use]
mod macros;

pub mod actions;
pub mod auth;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod telemetry;

// Re-export commonly used types
pub use actions::*;
pub use auth::{principal_from_header, CallerPrincipal, USER_INFO_HEADER};
pub use config::ReportsConfig;
pub use dispatcher::{ActionDispatcher, ActionKind, ReportAction, WireRequest, WireResponse};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use handlers::ReportHandlers;
pub use routes::{create_router, ReportsState};
pub use telemetry::{Outcome, ReportsMetrics};
