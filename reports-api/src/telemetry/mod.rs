//! Reports Telemetry - Observability Infrastructure
//!
//! Structured logging through `tracing` and Prometheus counters for every
//! dispatched action.

pub mod metrics;
pub mod tracer;

pub use metrics::{metrics_handler, Outcome, ReportsMetrics};
pub use tracer::{init_tracing, TelemetryConfig, DEFAULT_LOG_FILTER};
