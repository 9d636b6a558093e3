//! Report Instance REST Routes

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde_json::Value;

use crate::actions::{
    DeleteReportInstanceRequest, GetAllReportInstancesRequest, GetReportInstanceRequest,
};
use crate::auth::CallerPrincipal;
use crate::error::{ApiError, ApiResult};
use crate::routes::{PageQuery, ReportsState};

/// GET /instances
pub async fn list_instances(
    State(state): State<Arc<ReportsState>>,
    caller: Result<CallerPrincipal, ApiError>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Value>> {
    let request = query
        .page(state.default_items_query_count)
        .and_then(|(from_index, max_items)| {
            Ok(GetAllReportInstancesRequest::new(from_index, max_items)?)
        });
    state.run(caller, request).await
}

/// GET /instance/:id
pub async fn get_instance(
    State(state): State<Arc<ReportsState>>,
    caller: Result<CallerPrincipal, ApiError>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let request = GetReportInstanceRequest::new(id).map_err(ApiError::from);
    state.run(caller, request).await
}

/// DELETE /instance/:id
pub async fn delete_instance(
    State(state): State<Arc<ReportsState>>,
    caller: Result<CallerPrincipal, ApiError>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let request = DeleteReportInstanceRequest::new(id).map_err(ApiError::from);
    state.run(caller, request).await
}

pub fn create_router(state: Arc<ReportsState>) -> Router {
    Router::new()
        .route("/instances", get(list_instances))
        .route("/instance/:id", get(get_instance).delete(delete_instance))
        .with_state(state)
}
