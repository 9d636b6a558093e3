//! Domain Handlers
//!
//! Each handler takes a validated request plus the caller's resolved
//! [`AccessContext`] and talks to the search backend only. Outcomes are
//! [`ReportsError`] values; translating them to transport errors and
//! metrics is the dispatcher's job.

use std::sync::Arc;

use reports_core::{
    AccessContext, ReportDefinitionDetails, ReportInstance, ReportsError, ReportsResult,
    SearchBackend, SearchItem, SearchQuery, SearchResults,
};

use crate::actions::{
    DeleteReportDefinitionRequest, DeleteReportDefinitionResponse, DeleteReportInstanceRequest,
    DeleteReportInstanceResponse, GetAllReportDefinitionsRequest, GetAllReportDefinitionsResponse,
    GetAllReportInstancesRequest, GetAllReportInstancesResponse, GetReportDefinitionRequest,
    GetReportDefinitionResponse, GetReportInstanceRequest, GetReportInstanceResponse,
    GetStatsRequest, GetStatsResponse, REPORT_DEFINITION_LIST_FIELD, REPORT_INSTANCE_LIST_FIELD,
};
use crate::telemetry::ReportsMetrics;

// ============================================================================
// GENERIC HANDLER HELPERS
// ============================================================================

/// Page through `index`, newest first, restricted to what `access` may see.
pub async fn list_items<T: SearchItem>(
    backend: &dyn SearchBackend,
    index: &str,
    from_index: u64,
    max_items: u32,
    access: &AccessContext,
    list_field: &'static str,
) -> ReportsResult<SearchResults<T>> {
    let query = SearchQuery::latest_first(access.search_filter());
    let response = backend.search(index, &query, from_index, max_items).await?;
    tracing::debug!(
        entity = T::ENTITY_NAME,
        index,
        from_index,
        hits = response.hits.len(),
        total_hits = response.total_hits,
        "Search completed"
    );
    // An offset past the end, e.g. after concurrent deletes, is an empty page.
    let start_index = if response.hits.is_empty() {
        from_index.min(response.total_hits)
    } else {
        from_index
    };
    SearchResults::from_search_response(start_index, &response, list_field)
}

/// Fetch one item, enforcing access.
pub async fn get_item<T: SearchItem>(
    backend: &dyn SearchBackend,
    index: &str,
    id: &str,
    access: &AccessContext,
) -> ReportsResult<T> {
    let document = backend
        .get_by_id(index, id)
        .await?
        .ok_or_else(|| ReportsError::not_found(T::ENTITY_NAME, id))?;
    let item = T::parse_item(&document.source, Some(&document.id))
        .map_err(|source| ReportsError::adaptation(T::ENTITY_NAME, source))?;
    if !access.can_access(item.access()) {
        tracing::warn!(entity = T::ENTITY_NAME, id, user = ?access.user, "Access denied");
        return Err(ReportsError::forbidden(T::ENTITY_NAME, id));
    }
    Ok(item)
}

/// Delete one item after the same checks as [`get_item`].
///
/// A concurrent delete that wins the race surfaces as not found.
pub async fn delete_item<T: SearchItem>(
    backend: &dyn SearchBackend,
    index: &str,
    id: &str,
    access: &AccessContext,
) -> ReportsResult<()> {
    get_item::<T>(backend, index, id, access).await?;
    if !backend.delete_by_id(index, id).await? {
        return Err(ReportsError::not_found(T::ENTITY_NAME, id));
    }
    tracing::info!(entity = T::ENTITY_NAME, id, "Deleted");
    Ok(())
}

// ============================================================================
// REPORT HANDLERS
// ============================================================================

/// Handlers bound to a backend and its index names.
#[derive(Clone)]
pub struct ReportHandlers {
    backend: Arc<dyn SearchBackend>,
    definitions_index: String,
    instances_index: String,
}

impl std::fmt::Debug for ReportHandlers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportHandlers")
            .field("definitions_index", &self.definitions_index)
            .field("instances_index", &self.instances_index)
            .finish_non_exhaustive()
    }
}

impl ReportHandlers {
    pub fn new(
        backend: Arc<dyn SearchBackend>,
        definitions_index: impl Into<String>,
        instances_index: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            definitions_index: definitions_index.into(),
            instances_index: instances_index.into(),
        }
    }

    pub fn backend(&self) -> &Arc<dyn SearchBackend> {
        &self.backend
    }

    pub fn definitions_index(&self) -> &str {
        &self.definitions_index
    }

    pub fn instances_index(&self) -> &str {
        &self.instances_index
    }

    pub async fn get_all_report_definitions(
        &self,
        request: GetAllReportDefinitionsRequest,
        access: AccessContext,
    ) -> ReportsResult<GetAllReportDefinitionsResponse> {
        let report_definition_list = list_items::<ReportDefinitionDetails>(
            self.backend.as_ref(),
            &self.definitions_index,
            request.from_index,
            request.max_items,
            &access,
            REPORT_DEFINITION_LIST_FIELD,
        )
        .await?;
        Ok(GetAllReportDefinitionsResponse {
            report_definition_list,
        })
    }

    pub async fn get_report_definition(
        &self,
        request: GetReportDefinitionRequest,
        access: AccessContext,
    ) -> ReportsResult<GetReportDefinitionResponse> {
        let report_definition_details = get_item(
            self.backend.as_ref(),
            &self.definitions_index,
            &request.report_definition_id,
            &access,
        )
        .await?;
        Ok(GetReportDefinitionResponse {
            report_definition_details,
        })
    }

    pub async fn delete_report_definition(
        &self,
        request: DeleteReportDefinitionRequest,
        access: AccessContext,
    ) -> ReportsResult<DeleteReportDefinitionResponse> {
        delete_item::<ReportDefinitionDetails>(
            self.backend.as_ref(),
            &self.definitions_index,
            &request.report_definition_id,
            &access,
        )
        .await?;
        Ok(DeleteReportDefinitionResponse {
            report_definition_id: request.report_definition_id,
        })
    }

    pub async fn get_all_report_instances(
        &self,
        request: GetAllReportInstancesRequest,
        access: AccessContext,
    ) -> ReportsResult<GetAllReportInstancesResponse> {
        let report_instance_list = list_items::<ReportInstance>(
            self.backend.as_ref(),
            &self.instances_index,
            request.from_index,
            request.max_items,
            &access,
            REPORT_INSTANCE_LIST_FIELD,
        )
        .await?;
        Ok(GetAllReportInstancesResponse {
            report_instance_list,
        })
    }

    pub async fn get_report_instance(
        &self,
        request: GetReportInstanceRequest,
        access: AccessContext,
    ) -> ReportsResult<GetReportInstanceResponse> {
        let report_instance = get_item(
            self.backend.as_ref(),
            &self.instances_index,
            &request.report_instance_id,
            &access,
        )
        .await?;
        Ok(GetReportInstanceResponse { report_instance })
    }

    pub async fn delete_report_instance(
        &self,
        request: DeleteReportInstanceRequest,
        access: AccessContext,
    ) -> ReportsResult<DeleteReportInstanceResponse> {
        delete_item::<ReportInstance>(
            self.backend.as_ref(),
            &self.instances_index,
            &request.report_instance_id,
            &access,
        )
        .await?;
        Ok(DeleteReportInstanceResponse {
            report_instance_id: request.report_instance_id,
        })
    }
}

/// Snapshot of the local action counters.
pub fn get_stats(
    metrics: &ReportsMetrics,
    _request: GetStatsRequest,
    _access: AccessContext,
) -> ReportsResult<GetStatsResponse> {
    Ok(GetStatsResponse {
        stats: metrics.snapshot(),
    })
}
