//! REST API Routes Module
//!
//! Every route decodes its request from the path and query string, then hands
//! it to the [`ActionDispatcher`] so authorization, error mapping and metrics
//! behave the same as for transport callers.
//!
//! Includes:
//! - Report definition list/get/delete
//! - Report instance list/get/delete
//! - Local stats
//! - Prometheus exposition on `/metrics`

pub mod definition;
pub mod instance;
pub mod stats;

use std::sync::Arc;

use axum::{routing::get, Json, Router};
use reports_core::DocumentCodec;
use serde::Deserialize;
use serde_json::Value;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::actions::{FROM_INDEX_FIELD, MAX_ITEMS_FIELD};
use crate::auth::CallerPrincipal;
use crate::config::ReportsConfig;
use crate::dispatcher::{ActionDispatcher, ReportAction};
use crate::error::{ApiError, ApiResult};
use crate::telemetry::metrics_handler;

// ============================================================================
// STATE
// ============================================================================

/// State shared by the report routes.
#[derive(Debug, Clone)]
pub struct ReportsState {
    pub dispatcher: ActionDispatcher,

    /// Page size for list routes without `maxItems`.
    pub default_items_query_count: u32,
}

impl ReportsState {
    pub fn new(dispatcher: ActionDispatcher, default_items_query_count: u32) -> Self {
        Self {
            dispatcher,
            default_items_query_count,
        }
    }

    /// Dispatch a route-decoded request and render the response document.
    ///
    /// A rejected caller header is routed through the dispatcher as a failed
    /// request so it is still counted.
    pub(crate) async fn run<A: ReportAction>(
        &self,
        caller: Result<CallerPrincipal, ApiError>,
        request: ApiResult<A>,
    ) -> ApiResult<Json<Value>> {
        let (principal, request) = match caller {
            Ok(CallerPrincipal(principal)) => (principal, request),
            Err(err) => (None, Err(err)),
        };
        let response = self.dispatcher.dispatch(request, principal.as_ref()).await?;
        Ok(Json(response.to_document()))
    }
}

// ============================================================================
// QUERY PARAMETERS
// ============================================================================

/// Raw paging parameters. Parsed by hand so a bad value becomes a counted
/// user error instead of an extractor rejection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    #[serde(rename = "fromIndex")]
    pub from_index: Option<String>,

    #[serde(rename = "maxItems")]
    pub max_items: Option<String>,
}

impl PageQuery {
    /// `(from_index, max_items)` with defaults applied.
    pub fn page(&self, default_max_items: u32) -> ApiResult<(u64, u32)> {
        let from_index = match &self.from_index {
            None => 0,
            Some(raw) => raw.trim().parse::<u64>().map_err(|_| {
                ApiError::bad_request(format!("Invalid {} '{}'", FROM_INDEX_FIELD, raw))
            })?,
        };
        let max_items = match &self.max_items {
            None => default_max_items,
            Some(raw) => raw.trim().parse::<u32>().map_err(|_| {
                ApiError::bad_request(format!("Invalid {} '{}'", MAX_ITEMS_FIELD, raw))
            })?,
        };
        Ok((from_index, max_items))
    }
}

// ============================================================================
// ROUTER
// ============================================================================

/// Build the full application router.
pub fn create_router(dispatcher: ActionDispatcher, config: &ReportsConfig) -> Router {
    let metrics = dispatcher.metrics_handle();
    let state = Arc::new(ReportsState::new(
        dispatcher,
        config.default_items_query_count,
    ));

    let reports = Router::new()
        .merge(definition::create_router(state.clone()))
        .merge(instance::create_router(state.clone()))
        .merge(stats::create_router(state));

    let metrics_routes = Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(metrics);

    Router::new()
        .nest(&config.base_uri, reports)
        .merge(metrics_routes)
        .layer(TimeoutLayer::new(config.request_timeout))
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_defaults() -> ApiResult<()> {
        assert_eq!(PageQuery::default().page(100)?, (0, 100));
        Ok(())
    }

    #[test]
    fn test_page_parses_values() -> ApiResult<()> {
        let query = PageQuery {
            from_index: Some("20".to_string()),
            max_items: Some(" 5".to_string()),
        };
        assert_eq!(query.page(100)?, (20, 5));
        Ok(())
    }

    #[test]
    fn test_page_rejects_negative_index() {
        let query = PageQuery {
            from_index: Some("-1".to_string()),
            max_items: None,
        };
        assert!(query.page(100).is_err());
    }
}
