//! Report instance entities.

use serde_json::Value;

use crate::codec::document::{
    expect_object, expect_string, expect_string_list, expect_timestamp, optional, require,
};
use crate::codec::{skip_unknown_field, DocumentBuilder, StreamCodec, StreamInput, StreamOutput};
use crate::definition::{
    ReportDefinitionDetails, ACCESS_LIST_FIELD, CREATED_TIME_FIELD, ID_FIELD,
    LAST_UPDATED_TIME_FIELD, TENANT_FIELD,
};
use crate::error::CodecResult;
use crate::identity::Timestamp;
use crate::search_results::SearchItem;
use crate::wire_enum;

pub const BEGIN_TIME_FIELD: &str = "beginTimeMs";
pub const END_TIME_FIELD: &str = "endTimeMs";
pub const REPORT_DEFINITION_DETAILS_FIELD: &str = "reportDefinitionDetails";
pub const STATUS_FIELD: &str = "status";
pub const STATUS_TEXT_FIELD: &str = "statusText";
pub const IN_CONTEXT_DOWNLOAD_URL_FIELD: &str = "inContextDownloadUrlPath";

wire_enum! {
    /// Lifecycle state of a report instance.
    pub enum ReportInstanceStatus {
        Scheduled = (0, "Scheduled"),
        Executing = (1, "Executing"),
        Success = (2, "Success"),
        Failed = (3, "Failed"),
    }
}

/// One generated (or scheduled) report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportInstance {
    pub id: String,
    pub last_updated_time: Timestamp,
    pub created_time: Timestamp,
    /// Start of the time range the report covers.
    pub begin_time: Timestamp,
    /// End of the time range the report covers.
    pub end_time: Timestamp,
    pub tenant: String,
    pub access: Vec<String>,
    /// Snapshot of the definition that produced this instance, if any.
    pub report_definition_details: Option<ReportDefinitionDetails>,
    pub status: ReportInstanceStatus,
    pub status_text: Option<String>,
    pub in_context_download_url_path: Option<String>,
}

impl ReportInstance {
    /// Parse a stored or embedded document; `use_id` is overridden by an
    /// `id` field in the body.
    pub fn from_document(doc: &Value, use_id: Option<&str>) -> CodecResult<Self> {
        let mut id = use_id.map(str::to_string);
        let mut last_updated_time = None;
        let mut created_time = None;
        let mut begin_time = None;
        let mut end_time = None;
        let mut tenant = None;
        let mut access = Vec::new();
        let mut report_definition_details = None;
        let mut status = None;
        let mut status_text = None;
        let mut in_context_download_url_path = None;
        for (field, value) in expect_object(doc)? {
            match field.as_str() {
                ID_FIELD => id = Some(expect_string(value)?),
                LAST_UPDATED_TIME_FIELD => {
                    last_updated_time = Some(expect_timestamp(LAST_UPDATED_TIME_FIELD, value)?)
                }
                CREATED_TIME_FIELD => {
                    created_time = Some(expect_timestamp(CREATED_TIME_FIELD, value)?)
                }
                BEGIN_TIME_FIELD => begin_time = Some(expect_timestamp(BEGIN_TIME_FIELD, value)?),
                END_TIME_FIELD => end_time = Some(expect_timestamp(END_TIME_FIELD, value)?),
                TENANT_FIELD => tenant = optional(value, expect_string)?,
                ACCESS_LIST_FIELD => access = expect_string_list(value)?,
                REPORT_DEFINITION_DETAILS_FIELD => {
                    report_definition_details = optional(value, |v| {
                        ReportDefinitionDetails::from_document(v, None)
                    })?
                }
                STATUS_FIELD => {
                    status = Some(ReportInstanceStatus::from_document_value(STATUS_FIELD, value)?)
                }
                STATUS_TEXT_FIELD => status_text = optional(value, expect_string)?,
                IN_CONTEXT_DOWNLOAD_URL_FIELD => {
                    in_context_download_url_path = optional(value, expect_string)?
                }
                _ => skip_unknown_field("ReportInstance", field),
            }
        }
        Ok(Self {
            id: require(ID_FIELD, id)?,
            last_updated_time: require(LAST_UPDATED_TIME_FIELD, last_updated_time)?,
            created_time: require(CREATED_TIME_FIELD, created_time)?,
            begin_time: require(BEGIN_TIME_FIELD, begin_time)?,
            end_time: require(END_TIME_FIELD, end_time)?,
            tenant: tenant.unwrap_or_default(),
            access,
            report_definition_details,
            status: require(STATUS_FIELD, status)?,
            status_text,
            in_context_download_url_path,
        })
    }

    pub fn to_document(&self, short_form: bool) -> Value {
        let builder = DocumentBuilder::new(short_form)
            .field(ID_FIELD, self.id.as_str())
            .timestamp(LAST_UPDATED_TIME_FIELD, &self.last_updated_time)
            .timestamp(CREATED_TIME_FIELD, &self.created_time)
            .timestamp(BEGIN_TIME_FIELD, &self.begin_time)
            .timestamp(END_TIME_FIELD, &self.end_time);
        let builder = if short_form && self.tenant.is_empty() {
            builder
        } else {
            builder.field(TENANT_FIELD, self.tenant.as_str())
        };
        builder
            .string_list(ACCESS_LIST_FIELD, &self.access)
            .optional_field(
                REPORT_DEFINITION_DETAILS_FIELD,
                self.report_definition_details
                    .as_ref()
                    .map(|details| details.to_document(short_form)),
            )
            .field(STATUS_FIELD, self.status.as_str())
            .optional_field(STATUS_TEXT_FIELD, self.status_text.as_deref())
            .optional_field(
                IN_CONTEXT_DOWNLOAD_URL_FIELD,
                self.in_context_download_url_path.as_deref(),
            )
            .build()
    }
}

impl SearchItem for ReportInstance {
    const ENTITY_NAME: &'static str = "report instance";

    fn id(&self) -> &str {
        &self.id
    }

    fn last_updated_time(&self) -> Timestamp {
        self.last_updated_time
    }

    fn access(&self) -> &[String] {
        &self.access
    }

    fn write_as_document(&self, short_form: bool) -> Value {
        self.to_document(short_form)
    }

    fn parse_item(doc: &Value, use_id: Option<&str>) -> CodecResult<Self> {
        Self::from_document(doc, use_id)
    }
}

impl StreamCodec for ReportInstance {
    fn write_to(&self, out: &mut StreamOutput) {
        out.write_string(&self.id);
        out.write_timestamp(&self.last_updated_time);
        out.write_timestamp(&self.created_time);
        out.write_timestamp(&self.begin_time);
        out.write_timestamp(&self.end_time);
        out.write_string(&self.tenant);
        out.write_string_list(&self.access);
        out.write_optional(self.report_definition_details.as_ref());
        self.status.write_to(out);
        out.write_optional_string(self.status_text.as_deref());
        out.write_optional_string(self.in_context_download_url_path.as_deref());
    }

    fn read_from(input: &mut StreamInput<'_>) -> CodecResult<Self> {
        Ok(Self {
            id: input.read_string("reportInstance.id")?,
            last_updated_time: input.read_timestamp("reportInstance.lastUpdatedTimeMs")?,
            created_time: input.read_timestamp("reportInstance.createdTimeMs")?,
            begin_time: input.read_timestamp("reportInstance.beginTimeMs")?,
            end_time: input.read_timestamp("reportInstance.endTimeMs")?,
            tenant: input.read_string("reportInstance.tenant")?,
            access: input.read_string_list("reportInstance.access")?,
            report_definition_details: input
                .read_optional("reportInstance.reportDefinitionDetails")?,
            status: ReportInstanceStatus::read_from(input)?,
            status_text: input.read_optional_string("reportInstance.statusText")?,
            in_context_download_url_path: input
                .read_optional_string("reportInstance.inContextDownloadUrlPath")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CodecError;
    use crate::identity::from_epoch_millis;
    use serde_json::json;

    fn instance_doc() -> Value {
        json!({
            "id": "i1",
            "lastUpdatedTimeMs": 1_603_506_908_773_i64,
            "createdTimeMs": 1_603_506_908_773_i64,
            "beginTimeMs": 1_603_503_308_773_i64,
            "endTimeMs": 1_603_506_908_773_i64,
            "access": ["User:alice"],
            "status": "Success",
            "inContextDownloadUrlPath": "/app/reports#/report_details/i1"
        })
    }

    #[test]
    fn test_parse_minimal_instance() -> CodecResult<()> {
        let instance = ReportInstance::from_document(&instance_doc(), None)?;
        assert_eq!(instance.id, "i1");
        assert_eq!(instance.status, ReportInstanceStatus::Success);
        assert_eq!(instance.tenant, "");
        assert!(instance.report_definition_details.is_none());
        assert_eq!(
            Some(instance.begin_time),
            from_epoch_millis(1_603_503_308_773)
        );
        Ok(())
    }

    #[test]
    fn test_unknown_fields_skipped() -> CodecResult<()> {
        let mut doc = instance_doc();
        if let Some(object) = doc.as_object_mut() {
            object.insert("renderedBy".to_string(), json!({"node": "n-1"}));
        }
        let instance = ReportInstance::from_document(&doc, None)?;
        assert_eq!(instance, ReportInstance::from_document(&instance_doc(), None)?);
        Ok(())
    }

    #[test]
    fn test_missing_status_is_reported() {
        let mut doc = instance_doc();
        if let Some(object) = doc.as_object_mut() {
            object.remove(STATUS_FIELD);
        }
        assert_eq!(
            ReportInstance::from_document(&doc, None).map(|_| ()),
            Err(CodecError::MissingField { field: STATUS_FIELD })
        );
    }

    #[test]
    fn test_body_id_overrides_use_id() -> CodecResult<()> {
        let instance = ReportInstance::from_document(&instance_doc(), Some("hit-id"))?;
        assert_eq!(instance.id, "i1");
        Ok(())
    }

    #[test]
    fn test_both_forms_round_trip() -> CodecResult<()> {
        let instance = ReportInstance::from_document(&instance_doc(), None)?;
        for short_form in [true, false] {
            let doc = instance.to_document(short_form);
            assert_eq!(ReportInstance::from_document(&doc, None)?, instance);
        }
        let bytes = instance.to_stream_bytes();
        assert_eq!(ReportInstance::from_stream_bytes(&bytes)?, instance);
        Ok(())
    }
}
