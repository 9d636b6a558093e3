//! Report Definition REST Routes
//!
//! - `GET definitions` - page through visible definitions
//! - `GET definition/:id` - fetch one definition
//! - `DELETE definition/:id` - delete one definition

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde_json::Value;

use crate::actions::{
    DeleteReportDefinitionRequest, GetAllReportDefinitionsRequest, GetReportDefinitionRequest,
};
use crate::auth::CallerPrincipal;
use crate::error::{ApiError, ApiResult};
use crate::routes::{PageQuery, ReportsState};

/// GET /definitions
pub async fn list_definitions(
    State(state): State<Arc<ReportsState>>,
    caller: Result<CallerPrincipal, ApiError>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Value>> {
    let request = query
        .page(state.default_items_query_count)
        .and_then(|(from_index, max_items)| {
            Ok(GetAllReportDefinitionsRequest::new(from_index, max_items)?)
        });
    state.run(caller, request).await
}

/// GET /definition/:id
pub async fn get_definition(
    State(state): State<Arc<ReportsState>>,
    caller: Result<CallerPrincipal, ApiError>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let request = GetReportDefinitionRequest::new(id).map_err(ApiError::from);
    state.run(caller, request).await
}

/// DELETE /definition/:id
pub async fn delete_definition(
    State(state): State<Arc<ReportsState>>,
    caller: Result<CallerPrincipal, ApiError>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let request = DeleteReportDefinitionRequest::new(id).map_err(ApiError::from);
    state.run(caller, request).await
}

pub fn create_router(state: Arc<ReportsState>) -> Router {
    Router::new()
        .route("/definitions", get(list_definitions))
        .route("/definition/:id", get(get_definition).delete(delete_definition))
        .with_state(state)
}
