//! Dispatcher Tests
//!
//! Drives every action through [`ActionDispatcher`] against a seeded
//! in-memory backend and checks results, authorization and the per-operation
//! counters together.

use std::sync::Arc;

use proptest::prelude::*;
use reports_api::{
    ActionDispatcher, ActionKind, ApiResult, DeleteReportDefinitionRequest,
    DeleteReportInstanceRequest, ErrorCode, GetAllReportDefinitionsRequest,
    GetAllReportDefinitionsResponse, GetAllReportInstancesRequest, GetAllReportInstancesResponse,
    GetReportDefinitionRequest, GetReportInstanceRequest, GetStatsRequest, GetStatsResponse,
    ReportHandlers, WireRequest,
};
use reports_core::{InMemorySearchBackend, Principal, SearchBackend, SearchItem, WireFormat};
use reports_test_utils::assertions::assert_page_ids;
use reports_test_utils::fixtures::{definition_details, report_instance, seed, user};
use serde_json::json;

const DEFINITIONS: &str = "definitions";
const INSTANCES: &str = "instances";

// ============================================================================
// TEST SUPPORT
// ============================================================================

fn dispatcher_over(backend: InMemorySearchBackend) -> ApiResult<ActionDispatcher> {
    let handlers = ReportHandlers::new(Arc::new(backend), DEFINITIONS, INSTANCES);
    ActionDispatcher::with_fresh_metrics(handlers)
}

/// Three instances readable by alice, newest first: i1, i2, i3.
async fn three_instances() -> ApiResult<ActionDispatcher> {
    let backend = InMemorySearchBackend::new();
    seed(
        &backend,
        INSTANCES,
        &[
            report_instance("i3", 1_000, &["User:alice"]),
            report_instance("i1", 3_000, &["User:alice"]),
            report_instance("i2", 2_000, &["User:alice"]),
        ],
    )
    .await?;
    dispatcher_over(backend)
}

fn counter(dispatcher: &ActionDispatcher, kind: ActionKind, outcome: &str) -> u64 {
    dispatcher.metrics().value(kind.operation(), outcome)
}

// ============================================================================
// SCENARIOS
// ============================================================================

#[tokio::test]
async fn test_list_three_instances() -> ApiResult<()> {
    let dispatcher = three_instances().await?;
    let request = GetAllReportInstancesRequest::new(0, 10)?;
    let response = dispatcher.dispatch(Ok(request), None).await?;

    let page = &response.report_instance_list;
    assert_eq!(page.total_hits(), 3);
    assert_eq!(page.start_index(), 0);
    assert_page_ids(page, &["i1", "i2", "i3"]);
    assert_eq!(page.next_start_index(), None);
    assert_eq!(counter(&dispatcher, ActionKind::GetAllReportInstances, "count"), 1);
    Ok(())
}

#[tokio::test]
async fn test_delete_missing_id_counts_not_found_once() -> ApiResult<()> {
    let dispatcher = dispatcher_over(InMemorySearchBackend::new())?;
    let request = DeleteReportDefinitionRequest::new("missing-id")?;
    let err = dispatcher
        .dispatch(Ok(request), None)
        .await
        .err()
        .map(|e| e.code);

    assert_eq!(err, Some(ErrorCode::NotFound));
    let kind = ActionKind::DeleteReportDefinition;
    assert_eq!(counter(&dispatcher, kind, "not_found"), 1);
    assert_eq!(counter(&dispatcher, kind, "total"), 1);
    assert_eq!(counter(&dispatcher, kind, "count"), 0);
    assert_eq!(counter(&dispatcher, kind, "system_error"), 0);
    Ok(())
}

#[tokio::test]
async fn test_delete_is_not_idempotent() -> ApiResult<()> {
    let dispatcher = three_instances().await?;
    let request = DeleteReportInstanceRequest::new("i2")?;

    let response = dispatcher.dispatch(Ok(request.clone()), None).await?;
    assert_eq!(response.report_instance_id, "i2");

    let second = dispatcher.dispatch(Ok(request), None).await.err();
    assert_eq!(second.map(|e| e.code), Some(ErrorCode::NotFound));

    let get = GetReportInstanceRequest::new("i2")?;
    let gone = dispatcher.dispatch(Ok(get), None).await.err();
    assert_eq!(gone.map(|e| e.code), Some(ErrorCode::NotFound));

    let kind = ActionKind::DeleteReportInstance;
    assert_eq!(counter(&dispatcher, kind, "count"), 1);
    assert_eq!(counter(&dispatcher, kind, "not_found"), 1);
    Ok(())
}

#[tokio::test]
async fn test_get_other_users_definition_is_forbidden() -> ApiResult<()> {
    let backend = InMemorySearchBackend::new();
    seed(&backend, DEFINITIONS, &[definition_details("d1", 1_000, &["User:bob"])]).await?;
    let dispatcher = dispatcher_over(backend)?;

    let alice = user("alice");
    let request = GetReportDefinitionRequest::new("d1")?;
    let err = dispatcher.dispatch(Ok(request.clone()), Some(&alice)).await.err();
    assert_eq!(err.map(|e| e.code), Some(ErrorCode::Forbidden));
    assert_eq!(counter(&dispatcher, ActionKind::GetReportDefinition, "forbidden"), 1);

    let bob = user("bob");
    let response = dispatcher.dispatch(Ok(request), Some(&bob)).await?;
    assert_eq!(response.report_definition_details.id, "d1");
    Ok(())
}

#[tokio::test]
async fn test_backend_role_grants_access() -> ApiResult<()> {
    let backend = InMemorySearchBackend::new();
    seed(
        &backend,
        DEFINITIONS,
        &[
            definition_details("shared", 2_000, &["User:bob", "BERole:analyst"]),
            definition_details("private", 1_000, &["User:bob"]),
        ],
    )
    .await?;
    let dispatcher = dispatcher_over(backend)?;

    let carol = Principal::new("carol").with_backend_roles(["analyst"]);
    let request = GetAllReportDefinitionsRequest::new(0, 10)?;
    let response: GetAllReportDefinitionsResponse =
        dispatcher.dispatch(Ok(request), Some(&carol)).await?;
    assert_page_ids(&response.report_definition_list, &["shared"]);
    Ok(())
}

#[tokio::test]
async fn test_admin_sees_everything() -> ApiResult<()> {
    let dispatcher = three_instances().await?;
    let admin = Principal::new("root").with_roles([reports_core::ADMIN_ROLE]);
    let request = GetAllReportInstancesRequest::new(0, 10)?;
    let response = dispatcher.dispatch(Ok(request), Some(&admin)).await?;
    assert_eq!(response.report_instance_list.total_hits(), 3);
    Ok(())
}

#[tokio::test]
async fn test_paging_through_instances() -> ApiResult<()> {
    let dispatcher = three_instances().await?;
    let request = GetAllReportInstancesRequest::new(1, 1)?;
    let response = dispatcher.dispatch(Ok(request), None).await?;
    let page = &response.report_instance_list;
    assert_eq!(page.start_index(), 1);
    assert_eq!(page.total_hits(), 3);
    assert_page_ids(page, &["i2"]);
    assert_eq!(page.next_start_index(), Some(2));
    Ok(())
}

#[tokio::test]
async fn test_failed_decode_counts_user_error() -> ApiResult<()> {
    let dispatcher = three_instances().await?;
    let request = WireRequest::new(WireFormat::Json, r#"{"maxItems": 0}"#);
    let err = dispatcher
        .execute(ActionKind::GetAllReportInstances.action_name(), request, None)
        .await
        .err();
    assert_eq!(err.map(|e| e.code), Some(ErrorCode::BadRequest));
    assert_eq!(counter(&dispatcher, ActionKind::GetAllReportInstances, "user_error"), 1);
    Ok(())
}

#[tokio::test]
async fn test_execute_binary_list() -> ApiResult<()> {
    let dispatcher = three_instances().await?;
    let request = WireRequest::encode(
        WireFormat::Binary,
        &GetAllReportInstancesRequest::new(0, 2)?,
    );
    let response = dispatcher
        .execute(ActionKind::GetAllReportInstances.action_name(), request, None)
        .await?;
    assert_eq!(response.format, WireFormat::Binary);
    let decoded: GetAllReportInstancesResponse = response.decode()?;
    assert_page_ids(&decoded.report_instance_list, &["i1", "i2"]);
    Ok(())
}

#[tokio::test]
async fn test_stats_reflect_earlier_requests() -> ApiResult<()> {
    let dispatcher = three_instances().await?;
    let missing = GetReportInstanceRequest::new("nope")?;
    let _ = dispatcher.dispatch(Ok(missing), None).await;

    let response: GetStatsResponse = dispatcher.dispatch(Ok(GetStatsRequest), None).await?;
    assert_eq!(response.stats.get("report_instance.info.total"), Some(&1));
    assert_eq!(response.stats.get("report_instance.info.not_found"), Some(&1));
    assert_eq!(response.stats.get("report_definition.list.total"), Some(&0));
    Ok(())
}

#[tokio::test]
async fn test_offset_past_end_is_empty_page() -> ApiResult<()> {
    let backend = InMemorySearchBackend::new();
    seed(&backend, INSTANCES, &[report_instance("i1", 1_000, &["User:alice"])]).await?;
    let dispatcher = dispatcher_over(backend)?;

    let request = GetAllReportInstancesRequest::new(5, 10)?;
    let response = dispatcher.dispatch(Ok(request), Some(&user("alice"))).await?;
    let page = &response.report_instance_list;
    assert_eq!(page.total_hits(), 1);
    assert_eq!(page.start_index(), 1);
    assert!(page.items().is_empty());
    assert_eq!(page.next_start_index(), None);

    let kind = ActionKind::GetAllReportInstances;
    assert_eq!(counter(&dispatcher, kind, "count"), 1);
    assert_eq!(counter(&dispatcher, kind, "system_error"), 0);
    Ok(())
}

#[tokio::test]
async fn test_corrupt_document_is_system_error() -> ApiResult<()> {
    let backend = InMemorySearchBackend::new();
    backend
        .index(INSTANCES, "broken", json!({"status": "Success"}))
        .await
        .map_err(reports_core::ReportsError::from)?;
    let dispatcher = dispatcher_over(backend)?;

    let request = GetReportInstanceRequest::new("broken")?;
    let err = dispatcher.dispatch(Ok(request), None).await.err();
    let Some(err) = err else {
        panic!("corrupt document was served");
    };
    assert_eq!(err.code, ErrorCode::InternalError);
    assert!(!err.message.contains("lastUpdatedTimeMs"));

    let kind = ActionKind::GetReportInstance;
    assert_eq!(counter(&dispatcher, kind, "total"), 1);
    assert_eq!(counter(&dispatcher, kind, "system_error"), 1);
    for outcome in ["count", "user_error", "not_found", "forbidden"] {
        assert_eq!(counter(&dispatcher, kind, outcome), 0, "{}", outcome);
    }
    Ok(())
}

// ============================================================================
// PROPERTIES
// ============================================================================

fn runtime() -> Result<tokio::runtime::Runtime, TestCaseError> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| TestCaseError::fail(e.to_string()))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Listing under one identity never returns an item owned only by
    /// another.
    #[test]
    fn prop_list_is_filtered_by_identity(
        owners in prop::collection::vec(any::<bool>(), 0..12),
        max_items in 1u32..6,
    ) {
        let rt = runtime()?;
        rt.block_on(async {
            let instances: Vec<_> = owners
                .iter()
                .enumerate()
                .map(|(i, alice)| {
                    let owner = if *alice { "User:alice" } else { "User:bob" };
                    report_instance(&format!("i{}", i), 1_000 + i as i64, &[owner])
                })
                .collect();
            let backend = InMemorySearchBackend::new();
            seed(&backend, INSTANCES, &instances)
                .await
                .map_err(|e| TestCaseError::fail(e.to_string()))?;
            let dispatcher = dispatcher_over(backend)
                .map_err(|e| TestCaseError::fail(e.to_string()))?;

            let alice = user("alice");
            let expected = owners.iter().filter(|a| **a).count() as u64;
            let mut from_index = 0;
            let mut seen = 0u64;
            loop {
                let request = GetAllReportInstancesRequest::new(from_index, max_items)
                    .map_err(|e| TestCaseError::fail(e.to_string()))?;
                let response = dispatcher
                    .dispatch(Ok(request), Some(&alice))
                    .await
                    .map_err(|e| TestCaseError::fail(e.to_string()))?;
                let page = response.report_instance_list;
                prop_assert_eq!(page.total_hits(), expected);
                prop_assert!(page.start_index() + page.items().len() as u64 <= page.total_hits());
                prop_assert!(page.items().len() <= max_items as usize);
                for item in page.items() {
                    prop_assert!(item.access().iter().any(|a| a == "User:alice"));
                }
                seen += page.items().len() as u64;
                match page.next_start_index() {
                    Some(next) => from_index = next,
                    None => break,
                }
            }
            prop_assert_eq!(seen, expected);
            Ok::<(), TestCaseError>(())
        })?;
    }
}
