//! Local Stats Route
//!
//! `GET _local/stats` returns the flattened action counters. Any other method
//! is answered with 405 and counted as a user error.

use std::sync::Arc;

use axum::{
    extract::State,
    http::Method,
    routing::get,
    Json, Router,
};
use serde_json::Value;

use crate::actions::GetStatsRequest;
use crate::auth::CallerPrincipal;
use crate::error::{ApiError, ApiResult};
use crate::routes::ReportsState;

pub const STATS_PATH: &str = "/_local/stats";

/// GET /_local/stats
pub async fn get_stats(
    State(state): State<Arc<ReportsState>>,
    caller: Result<CallerPrincipal, ApiError>,
) -> ApiResult<Json<Value>> {
    state.run(caller, Ok(GetStatsRequest)).await
}

async fn method_not_allowed(
    State(state): State<Arc<ReportsState>>,
    method: Method,
) -> ApiResult<Json<Value>> {
    let request: ApiResult<GetStatsRequest> = Err(ApiError::method_not_allowed(method));
    state.run(Ok(CallerPrincipal(None)), request).await
}

pub fn create_router(state: Arc<ReportsState>) -> Router {
    Router::new()
        .route(STATS_PATH, get(get_stats).fallback(method_not_allowed))
        .with_state(state)
}
