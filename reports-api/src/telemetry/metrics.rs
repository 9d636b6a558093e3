//! Prometheus Metrics Definitions
//!
//! One counter family, `reports_actions_total{operation,outcome}`, held in a
//! registry owned by the service. Every dispatched request bumps its
//! operation's `total` and exactly one outcome.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};

use crate::error::{ApiError, ApiResult, ErrorCode};

/// Outcome label recorded for every request regardless of result.
pub const TOTAL_LABEL: &str = "total";

/// Result of one dispatched request, as recorded in metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// Success
    Count,
    /// Bad request or failed validation
    UserError,
    NotFound,
    Forbidden,
    SystemError,
}

impl Outcome {
    pub const ALL: [Outcome; 5] = [
        Outcome::Count,
        Outcome::UserError,
        Outcome::NotFound,
        Outcome::Forbidden,
        Outcome::SystemError,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Count => "count",
            Outcome::UserError => "user_error",
            Outcome::NotFound => "not_found",
            Outcome::Forbidden => "forbidden",
            Outcome::SystemError => "system_error",
        }
    }

    pub fn from_error_code(code: ErrorCode) -> Self {
        match code {
            ErrorCode::BadRequest
            | ErrorCode::ValidationFailed
            | ErrorCode::MissingField
            | ErrorCode::MethodNotAllowed => Outcome::UserError,
            ErrorCode::NotFound => Outcome::NotFound,
            ErrorCode::Forbidden => Outcome::Forbidden,
            ErrorCode::InternalError => Outcome::SystemError,
        }
    }
}

/// Container for the reports metrics.
#[derive(Clone)]
pub struct ReportsMetrics {
    registry: Registry,

    /// Dispatched requests - labels: operation, outcome
    actions_total: IntCounterVec,

    /// Operations pre-registered at zero so stats always list them.
    operations: Arc<Vec<&'static str>>,
}

impl ReportsMetrics {
    /// Create the registry and register the counter family.
    pub fn new(operations: &[&'static str]) -> ApiResult<Self> {
        let registry = Registry::new();
        let actions_total = IntCounterVec::new(
            Opts::new(
                "reports_actions_total",
                "Total number of dispatched report actions",
            ),
            &["operation", "outcome"],
        )
        .map_err(|e| {
            ApiError::internal_error(format!("Failed to create reports_actions_total: {}", e))
        })?;
        registry
            .register(Box::new(actions_total.clone()))
            .map_err(|e| {
                ApiError::internal_error(format!("Failed to register reports_actions_total: {}", e))
            })?;

        for operation in operations {
            actions_total.with_label_values(&[*operation, TOTAL_LABEL]);
            for outcome in Outcome::ALL {
                actions_total.with_label_values(&[*operation, outcome.as_str()]);
            }
        }

        Ok(Self {
            registry,
            actions_total,
            operations: Arc::new(operations.to_vec()),
        })
    }

    /// Record one request.
    pub fn record(&self, operation: &str, outcome: Outcome) {
        self.actions_total
            .with_label_values(&[operation, TOTAL_LABEL])
            .inc();
        self.actions_total
            .with_label_values(&[operation, outcome.as_str()])
            .inc();
    }

    /// Current value of one counter.
    pub fn value(&self, operation: &str, outcome: &str) -> u64 {
        self.actions_total
            .with_label_values(&[operation, outcome])
            .get()
    }

    /// Flattened `"<operation>.<outcome>"` view of every registered counter.
    pub fn snapshot(&self) -> BTreeMap<String, u64> {
        let mut stats = BTreeMap::new();
        for operation in self.operations.iter() {
            let labels =
                std::iter::once(TOTAL_LABEL).chain(Outcome::ALL.iter().map(Outcome::as_str));
            for outcome in labels {
                stats.insert(
                    format!("{}.{}", operation, outcome),
                    self.value(operation, outcome),
                );
            }
        }
        stats
    }

    /// Prometheus text exposition of the registry.
    pub fn render(&self) -> ApiResult<Vec<u8>> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder
            .encode(&self.registry.gather(), &mut buffer)
            .map_err(|e| ApiError::internal_error(format!("Failed to encode metrics: {}", e)))?;
        Ok(buffer)
    }
}

impl std::fmt::Debug for ReportsMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportsMetrics")
            .field("operations", &self.operations)
            .finish_non_exhaustive()
    }
}

/// Handler for GET /metrics endpoint.
///
/// Returns Prometheus text format metrics.
pub async fn metrics_handler(State(metrics): State<Arc<ReportsMetrics>>) -> impl IntoResponse {
    match metrics.render() {
        Ok(buffer) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            buffer,
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [("content-type", "text/plain")],
                e.message.into_bytes(),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OPS: &[&str] = &["report_definition.delete"];

    #[test]
    fn test_snapshot_starts_at_zero() -> ApiResult<()> {
        let metrics = ReportsMetrics::new(OPS)?;
        let stats = metrics.snapshot();
        assert_eq!(stats.len(), 6);
        assert!(stats.values().all(|v| *v == 0));
        assert!(stats.contains_key("report_definition.delete.not_found"));
        Ok(())
    }

    #[test]
    fn test_record_bumps_total_and_outcome() -> ApiResult<()> {
        let metrics = ReportsMetrics::new(OPS)?;
        metrics.record("report_definition.delete", Outcome::NotFound);
        let stats = metrics.snapshot();
        assert_eq!(stats.get("report_definition.delete.total"), Some(&1));
        assert_eq!(stats.get("report_definition.delete.not_found"), Some(&1));
        assert_eq!(stats.get("report_definition.delete.count"), Some(&0));
        Ok(())
    }

    #[test]
    fn test_registries_are_independent() -> ApiResult<()> {
        let first = ReportsMetrics::new(OPS)?;
        let second = ReportsMetrics::new(OPS)?;
        first.record("report_definition.delete", Outcome::Count);
        assert_eq!(second.value("report_definition.delete", "count"), 0);
        Ok(())
    }

    #[test]
    fn test_render_text() -> ApiResult<()> {
        let metrics = ReportsMetrics::new(OPS)?;
        metrics.record("report_definition.delete", Outcome::Count);
        let text = String::from_utf8(metrics.render()?)
            .map_err(|e| ApiError::internal_error(e.to_string()))?;
        assert!(text.contains("reports_actions_total"));
        Ok(())
    }
}
