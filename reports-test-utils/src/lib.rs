//! Reports Test Utilities
//!
//! Shared test infrastructure for the reports workspace:
//! - Proptest generators for every entity and page type
//! - Fixtures and a seeded in-memory backend
//! - Custom assertions over [`ReportsResult`]

// Re-export the in-memory backend from its source crate
pub use reports_core::InMemorySearchBackend;

// Re-export core types for convenience
pub use reports_core::{
    from_epoch_millis, AccessContext, BackendError, CodecError, Delivery, DeliveryFormat,
    FileFormat, Format, Principal, ReportDefinition, ReportDefinitionDetails, ReportInstance,
    ReportInstanceStatus, ReportsError, ReportsResult, SearchBackend, SearchItem, SearchResults,
    Source, SourceType, Timestamp, Trigger, TriggerType,
};

/// Timestamp from epoch millis, panicking outside chrono's range.
#[track_caller]
pub fn ts(millis: i64) -> Timestamp {
    from_epoch_millis(millis).expect("epoch millis within range")
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for generating report entity types.

    use super::*;
    use proptest::prelude::*;

    // === Scalar Generators ===

    /// Identifier accepted by request validation.
    pub fn arb_id() -> impl Strategy<Value = String> {
        "[A-Za-z0-9_-]{1,24}"
    }

    /// Millisecond-precision timestamp between 2000 and 2100.
    pub fn arb_timestamp() -> impl Strategy<Value = Timestamp> {
        (946_684_800_000i64..4_102_444_800_000i64).prop_map(ts)
    }

    /// Free text, including non-ASCII.
    pub fn arb_text() -> impl Strategy<Value = String> {
        "\\PC{0,24}"
    }

    pub fn arb_access_entry() -> impl Strategy<Value = String> {
        prop_oneof![
            "[a-z]{1,8}".prop_map(|name| format!("User:{}", name)),
            "[a-z]{1,8}".prop_map(|role| format!("BERole:{}", role)),
        ]
    }

    pub fn arb_access() -> impl Strategy<Value = Vec<String>> {
        prop::collection::vec(arb_access_entry(), 0..4)
    }

    // === Enum Generators ===

    pub fn arb_source_type() -> impl Strategy<Value = SourceType> {
        prop::sample::select(SourceType::ALL)
    }

    pub fn arb_file_format() -> impl Strategy<Value = FileFormat> {
        prop::sample::select(FileFormat::ALL)
    }

    pub fn arb_trigger_type() -> impl Strategy<Value = TriggerType> {
        prop::sample::select(TriggerType::ALL)
    }

    pub fn arb_delivery_format() -> impl Strategy<Value = DeliveryFormat> {
        prop::sample::select(DeliveryFormat::ALL)
    }

    pub fn arb_instance_status() -> impl Strategy<Value = ReportInstanceStatus> {
        prop::sample::select(ReportInstanceStatus::ALL)
    }

    // === Composite Generators ===

    pub fn arb_source() -> impl Strategy<Value = Source> {
        (arb_text(), arb_source_type(), "[a-z]{0,12}", arb_id()).prop_map(
            |(description, source_type, origin, id)| Source {
                description,
                source_type,
                origin,
                id,
            },
        )
    }

    pub fn arb_format() -> impl Strategy<Value = Format> {
        (
            "PT[1-9][0-9]?[HM]",
            arb_file_format(),
            proptest::option::of(1u32..10_000),
            proptest::option::of(arb_text()),
            proptest::option::of(arb_text()),
        )
            .prop_map(|(duration, file_format, limit, header, footer)| Format {
                duration,
                file_format,
                limit,
                header,
                footer,
            })
    }

    pub fn arb_trigger() -> impl Strategy<Value = Trigger> {
        (
            arb_trigger_type(),
            proptest::option::of("[0-9*/ ]{1,16}"),
            proptest::option::of(arb_timestamp()),
        )
            .prop_map(|(trigger_type, cron_expression, enabled_time)| Trigger {
                trigger_type,
                cron_expression,
                enabled_time,
            })
    }

    pub fn arb_delivery() -> impl Strategy<Value = Delivery> {
        (
            prop::collection::vec("[a-z]{1,8}@[a-z]{1,8}\\.com", 0..3),
            arb_delivery_format(),
            arb_text(),
            arb_text(),
        )
            .prop_map(|(recipients, delivery_format, title, text_description)| Delivery {
                recipients,
                delivery_format,
                title,
                text_description,
            })
    }

    pub fn arb_report_definition() -> impl Strategy<Value = ReportDefinition> {
        (
            arb_text(),
            any::<bool>(),
            arb_source(),
            arb_format(),
            arb_trigger(),
            proptest::option::of(arb_delivery()),
        )
            .prop_map(|(name, is_enabled, source, format, trigger, delivery)| {
                ReportDefinition {
                    name,
                    is_enabled,
                    source,
                    format,
                    trigger,
                    delivery,
                }
            })
    }

    pub fn arb_definition_details() -> impl Strategy<Value = ReportDefinitionDetails> {
        (
            arb_id(),
            arb_timestamp(),
            arb_timestamp(),
            "[a-z]{0,8}",
            arb_access(),
            arb_report_definition(),
        )
            .prop_map(
                |(id, last_updated_time, created_time, tenant, access, report_definition)| {
                    ReportDefinitionDetails {
                        id,
                        last_updated_time,
                        created_time,
                        tenant,
                        access,
                        report_definition,
                    }
                },
            )
    }

    pub fn arb_report_instance() -> impl Strategy<Value = ReportInstance> {
        (
            (arb_id(), arb_timestamp(), arb_timestamp()),
            (arb_timestamp(), arb_timestamp()),
            ("[a-z]{0,8}", arb_access()),
            proptest::option::of(arb_definition_details()),
            arb_instance_status(),
            proptest::option::of(arb_text()),
            proptest::option::of("/[a-z/]{0,24}"),
        )
            .prop_map(
                |(
                    (id, last_updated_time, created_time),
                    (begin_time, end_time),
                    (tenant, access),
                    report_definition_details,
                    status,
                    status_text,
                    in_context_download_url_path,
                )| ReportInstance {
                    id,
                    last_updated_time,
                    created_time,
                    begin_time,
                    end_time,
                    tenant,
                    access,
                    report_definition_details,
                    status,
                    status_text,
                    in_context_download_url_path,
                },
            )
    }

    /// A page that satisfies the page invariants, possibly with room for
    /// more hits after it.
    pub fn arb_page<T, S>(
        items: S,
        list_field: &'static str,
    ) -> impl Strategy<Value = SearchResults<T>>
    where
        T: SearchItem + Clone + std::fmt::Debug,
        S: Strategy<Value = T>,
    {
        (
            prop::collection::vec(items, 0..4),
            0u64..10_000,
            0u64..10_000,
        )
            .prop_filter_map("page invariant", move |(items, start_index, extra)| {
                let total_hits = start_index + items.len() as u64 + extra;
                SearchResults::new(start_index, total_hits, items, list_field).ok()
            })
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built entities for common scenarios.

    use super::*;

    /// Minimal on-demand PDF definition guarded by `access`.
    pub fn definition_details(
        id: &str,
        updated_ms: i64,
        access: &[&str],
    ) -> ReportDefinitionDetails {
        ReportDefinitionDetails {
            id: id.to_string(),
            last_updated_time: ts(updated_ms),
            created_time: ts(updated_ms),
            tenant: String::new(),
            access: access.iter().map(|s| s.to_string()).collect(),
            report_definition: ReportDefinition {
                name: format!("report {}", id),
                is_enabled: true,
                source: Source {
                    description: "daily traffic".to_string(),
                    source_type: SourceType::Dashboard,
                    origin: "http://localhost:5601".to_string(),
                    id: "dashboard-1".to_string(),
                },
                format: Format {
                    duration: "PT1H".to_string(),
                    file_format: FileFormat::Pdf,
                    limit: None,
                    header: None,
                    footer: None,
                },
                trigger: Trigger {
                    trigger_type: TriggerType::OnDemand,
                    cron_expression: None,
                    enabled_time: None,
                },
                delivery: None,
            },
        }
    }

    /// Successful instance guarded by `access`.
    pub fn report_instance(id: &str, updated_ms: i64, access: &[&str]) -> ReportInstance {
        ReportInstance {
            id: id.to_string(),
            last_updated_time: ts(updated_ms),
            created_time: ts(updated_ms),
            begin_time: ts(updated_ms - 3_600_000),
            end_time: ts(updated_ms),
            tenant: String::new(),
            access: access.iter().map(|s| s.to_string()).collect(),
            report_definition_details: None,
            status: ReportInstanceStatus::Success,
            status_text: None,
            in_context_download_url_path: None,
        }
    }

    pub fn user(name: &str) -> Principal {
        Principal::new(name)
    }

    /// Store each item under its own id in its stored (full) form.
    pub async fn seed<T: SearchItem>(
        backend: &InMemorySearchBackend,
        index: &str,
        items: &[T],
    ) -> ReportsResult<()> {
        for item in items {
            backend
                .index(index, item.id(), item.write_as_document(false))
                .await?;
        }
        Ok(())
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertions over handler outcomes.

    use super::*;

    /// Assert that a ReportsResult is Ok.
    #[track_caller]
    pub fn assert_ok<T: std::fmt::Debug>(result: &ReportsResult<T>) {
        assert!(result.is_ok(), "Expected Ok, got Err: {:?}", result);
    }

    /// Assert that a ReportsResult is a NotFound error.
    #[track_caller]
    pub fn assert_not_found<T: std::fmt::Debug>(result: &ReportsResult<T>) {
        match result {
            Err(ReportsError::NotFound { .. }) => {}
            other => panic!("Expected NotFound error, got: {:?}", other),
        }
    }

    /// Assert that a ReportsResult is a Forbidden error.
    #[track_caller]
    pub fn assert_forbidden<T: std::fmt::Debug>(result: &ReportsResult<T>) {
        match result {
            Err(ReportsError::Forbidden { .. }) => {}
            other => panic!("Expected Forbidden error, got: {:?}", other),
        }
    }

    /// Assert that the page lists exactly `ids`, in order.
    #[track_caller]
    pub fn assert_page_ids<T: SearchItem>(page: &SearchResults<T>, ids: &[&str]) {
        let actual: Vec<&str> = page.items().iter().map(SearchItem::id).collect();
        assert_eq!(actual, ids, "Unexpected page contents");
    }
}
