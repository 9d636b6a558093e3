//! Transport Request and Response Types
//!
//! Every message implements both [`StreamCodec`] and [`DocumentCodec`].
//! Requests validate their fields at construction and again on decode, so a
//! decoded request is always well-formed.

use std::collections::BTreeMap;

use reports_core::codec::document::{expect_object, expect_u32, expect_u64, require};
use reports_core::codec::{skip_unknown_field, DocumentBuilder};
use reports_core::{
    validate_id, CodecError, CodecResult, DocumentCodec, ReportDefinitionDetails, ReportInstance,
    SearchResults, StreamCodec, StreamInput, StreamOutput, ValidationError,
    MAX_ITEMS_QUERY_COUNT,
};
use serde_json::Value;

pub const FROM_INDEX_FIELD: &str = "fromIndex";
pub const MAX_ITEMS_FIELD: &str = "maxItems";
pub const REPORT_DEFINITION_LIST_FIELD: &str = "reportDefinitionDetailsList";
pub const REPORT_INSTANCE_LIST_FIELD: &str = "reportInstanceList";
pub const REPORT_DEFINITION_DETAILS_FIELD: &str = "reportDefinitionDetails";
pub const REPORT_INSTANCE_FIELD: &str = "reportInstance";

// ============================================================================
// VALIDATION HELPERS
// ============================================================================

/// Range check for a requested page size.
pub fn check_max_items(max_items: u32) -> Result<(), ValidationError> {
    if max_items == 0 || max_items as usize > MAX_ITEMS_QUERY_COUNT {
        return Err(ValidationError::InvalidValue {
            field: MAX_ITEMS_FIELD.to_string(),
            reason: format!("must be between 1 and {}", MAX_ITEMS_QUERY_COUNT),
        });
    }
    Ok(())
}

/// Validate a decoded id, reporting failures as codec errors.
pub(crate) fn checked_id(field: &'static str, id: String) -> CodecResult<String> {
    match validate_id(field, &id) {
        Ok(()) => Ok(id),
        Err(ValidationError::RequiredFieldMissing { .. }) => {
            Err(CodecError::MissingField { field })
        }
        Err(ValidationError::InvalidValue { reason, .. }) => {
            Err(CodecError::InvalidValue { field, reason })
        }
    }
}

pub(crate) fn checked_page(from_index: u64, max_items: u32) -> CodecResult<(u64, u32)> {
    check_max_items(max_items)
        .map(|()| (from_index, max_items))
        .map_err(|e| CodecError::InvalidValue {
            field: MAX_ITEMS_FIELD,
            reason: e.to_string(),
        })
}

/// Parse `fromIndex` / `maxItems`, both optional.
pub(crate) fn parse_page(owner: &'static str, doc: &Value) -> CodecResult<(u64, u32)> {
    let mut from_index = 0;
    let mut max_items = reports_core::DEFAULT_ITEMS_QUERY_COUNT;
    for (field, value) in expect_object(doc)? {
        match field.as_str() {
            FROM_INDEX_FIELD => from_index = expect_u64(FROM_INDEX_FIELD, value)?,
            MAX_ITEMS_FIELD => max_items = expect_u32(MAX_ITEMS_FIELD, value)?,
            _ => skip_unknown_field(owner, field),
        }
    }
    checked_page(from_index, max_items)
}

// ============================================================================
// REPORT DEFINITIONS
// ============================================================================

page_request! {
    /// List report definitions visible to the caller, newest first.
    GetAllReportDefinitionsRequest
}

id_message! {
    /// Fetch one report definition.
    GetReportDefinitionRequest { report_definition_id: "reportDefinitionId" }
}

id_message! {
    /// Delete one report definition.
    DeleteReportDefinitionRequest { report_definition_id: "reportDefinitionId" }
}

id_message! {
    /// Acknowledges a deleted report definition.
    DeleteReportDefinitionResponse { report_definition_id: "reportDefinitionId" }
}

/// One page of report definitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetAllReportDefinitionsResponse {
    pub report_definition_list: SearchResults<ReportDefinitionDetails>,
}

impl StreamCodec for GetAllReportDefinitionsResponse {
    fn write_to(&self, out: &mut StreamOutput) {
        self.report_definition_list.write_to(out);
    }

    fn read_from(input: &mut StreamInput<'_>) -> CodecResult<Self> {
        Ok(Self {
            report_definition_list: SearchResults::read_from(input, REPORT_DEFINITION_LIST_FIELD)?,
        })
    }
}

impl DocumentCodec for GetAllReportDefinitionsResponse {
    fn to_document(&self) -> Value {
        self.report_definition_list.to_document()
    }

    fn from_document(doc: &Value) -> CodecResult<Self> {
        Ok(Self {
            report_definition_list: SearchResults::from_document(
                doc,
                REPORT_DEFINITION_LIST_FIELD,
            )?,
        })
    }
}

/// One report definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetReportDefinitionResponse {
    pub report_definition_details: ReportDefinitionDetails,
}

impl StreamCodec for GetReportDefinitionResponse {
    fn write_to(&self, out: &mut StreamOutput) {
        self.report_definition_details.write_to(out);
    }

    fn read_from(input: &mut StreamInput<'_>) -> CodecResult<Self> {
        Ok(Self {
            report_definition_details: ReportDefinitionDetails::read_from(input)?,
        })
    }
}

impl DocumentCodec for GetReportDefinitionResponse {
    fn to_document(&self) -> Value {
        DocumentBuilder::new(false)
            .field(
                REPORT_DEFINITION_DETAILS_FIELD,
                self.report_definition_details.to_document(true),
            )
            .build()
    }

    fn from_document(doc: &Value) -> CodecResult<Self> {
        let mut details = None;
        for (field, value) in expect_object(doc)? {
            match field.as_str() {
                REPORT_DEFINITION_DETAILS_FIELD => {
                    details = Some(ReportDefinitionDetails::from_document(value, None)?)
                }
                _ => skip_unknown_field("GetReportDefinitionResponse", field),
            }
        }
        Ok(Self {
            report_definition_details: require(REPORT_DEFINITION_DETAILS_FIELD, details)?,
        })
    }
}

// ============================================================================
// REPORT INSTANCES
// ============================================================================

page_request! {
    /// List report instances visible to the caller, newest first.
    GetAllReportInstancesRequest
}

id_message! {
    /// Fetch one report instance.
    GetReportInstanceRequest { report_instance_id: "reportInstanceId" }
}

id_message! {
    /// Delete one report instance.
    DeleteReportInstanceRequest { report_instance_id: "reportInstanceId" }
}

id_message! {
    /// Acknowledges a deleted report instance.
    DeleteReportInstanceResponse { report_instance_id: "reportInstanceId" }
}

/// One page of report instances.
///
/// Structured text: `{"startIndex", "totalHits", "reportInstanceList"}`.
/// Only the list is required when parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetAllReportInstancesResponse {
    pub report_instance_list: SearchResults<ReportInstance>,
}

impl StreamCodec for GetAllReportInstancesResponse {
    fn write_to(&self, out: &mut StreamOutput) {
        self.report_instance_list.write_to(out);
    }

    fn read_from(input: &mut StreamInput<'_>) -> CodecResult<Self> {
        Ok(Self {
            report_instance_list: SearchResults::read_from(input, REPORT_INSTANCE_LIST_FIELD)?,
        })
    }
}

impl DocumentCodec for GetAllReportInstancesResponse {
    fn to_document(&self) -> Value {
        self.report_instance_list.to_document()
    }

    fn from_document(doc: &Value) -> CodecResult<Self> {
        Ok(Self {
            report_instance_list: SearchResults::from_document(doc, REPORT_INSTANCE_LIST_FIELD)?,
        })
    }
}

/// One report instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetReportInstanceResponse {
    pub report_instance: ReportInstance,
}

impl StreamCodec for GetReportInstanceResponse {
    fn write_to(&self, out: &mut StreamOutput) {
        self.report_instance.write_to(out);
    }

    fn read_from(input: &mut StreamInput<'_>) -> CodecResult<Self> {
        Ok(Self {
            report_instance: ReportInstance::read_from(input)?,
        })
    }
}

impl DocumentCodec for GetReportInstanceResponse {
    fn to_document(&self) -> Value {
        DocumentBuilder::new(false)
            .field(REPORT_INSTANCE_FIELD, self.report_instance.to_document(true))
            .build()
    }

    fn from_document(doc: &Value) -> CodecResult<Self> {
        let mut instance = None;
        for (field, value) in expect_object(doc)? {
            match field.as_str() {
                REPORT_INSTANCE_FIELD => {
                    instance = Some(ReportInstance::from_document(value, None)?)
                }
                _ => skip_unknown_field("GetReportInstanceResponse", field),
            }
        }
        Ok(Self {
            report_instance: require(REPORT_INSTANCE_FIELD, instance)?,
        })
    }
}

// ============================================================================
// STATS
// ============================================================================

/// Request for the local metrics snapshot. Carries no fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GetStatsRequest;

impl StreamCodec for GetStatsRequest {
    fn write_to(&self, _out: &mut StreamOutput) {}

    fn read_from(_input: &mut StreamInput<'_>) -> CodecResult<Self> {
        Ok(Self)
    }
}

impl DocumentCodec for GetStatsRequest {
    fn to_document(&self) -> Value {
        DocumentBuilder::new(false).build()
    }

    fn from_document(doc: &Value) -> CodecResult<Self> {
        for (field, _) in expect_object(doc)? {
            skip_unknown_field("GetStatsRequest", field);
        }
        Ok(Self)
    }
}

/// Flat `"<operation>.<outcome>" -> count` snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetStatsResponse {
    pub stats: BTreeMap<String, u64>,
}

impl StreamCodec for GetStatsResponse {
    fn write_to(&self, out: &mut StreamOutput) {
        out.write_vint(u32::try_from(self.stats.len()).unwrap_or(u32::MAX));
        for (name, value) in &self.stats {
            out.write_string(name);
            out.write_vlong(*value);
        }
    }

    fn read_from(input: &mut StreamInput<'_>) -> CodecResult<Self> {
        let count = input.read_vint("stats")?;
        let mut stats = BTreeMap::new();
        for _ in 0..count {
            let name = input.read_string("stats.name")?;
            let value = input.read_vlong("stats.value")?;
            stats.insert(name, value);
        }
        Ok(Self { stats })
    }
}

impl DocumentCodec for GetStatsResponse {
    fn to_document(&self) -> Value {
        self.stats
            .iter()
            .fold(DocumentBuilder::new(false), |builder, (name, value)| {
                builder.field(name, *value)
            })
            .build()
    }

    fn from_document(doc: &Value) -> CodecResult<Self> {
        let stats = expect_object(doc)?
            .iter()
            .map(|(name, value)| Ok((name.clone(), expect_u64("stats", value)?)))
            .collect::<CodecResult<_>>()?;
        Ok(Self { stats })
    }
}
