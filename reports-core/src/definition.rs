//! Report definition entities.
//!
//! JSON format of a stored definition:
//! ```text
//! {
//!   "id": "...",
//!   "lastUpdatedTimeMs": 1603506908773,
//!   "createdTimeMs": 1603506908773,
//!   "tenant": "__user__",
//!   "access": ["User:admin", "BERole:analyst"],
//!   "reportDefinition": {
//!     "name": "daily-sales",
//!     "isEnabled": true,
//!     "source": {"description": "...", "type": "Dashboard", "origin": "...", "id": "..."},
//!     "format": {"duration": "PT1H", "fileFormat": "Pdf", "limit": 1000, "header": "...", "footer": "..."},
//!     "trigger": {"triggerType": "CronBased", "cronExpression": "0 8 * * *", "enabledTimeMs": 1603506908773},
//!     "delivery": {"recipients": ["..."], "deliveryFormat": "LinkOnly", "title": "...", "textDescription": "..."}
//!   }
//! }
//! ```

use serde_json::Value;

use crate::codec::document::{
    expect_bool, expect_object, expect_string, expect_string_list, expect_timestamp, expect_u32,
    optional, require,
};
use crate::codec::{skip_unknown_field, DocumentBuilder, StreamCodec, StreamInput, StreamOutput};
use crate::error::CodecResult;
use crate::identity::Timestamp;
use crate::search_results::SearchItem;
use crate::wire_enum;

pub const ID_FIELD: &str = "id";
pub const LAST_UPDATED_TIME_FIELD: &str = "lastUpdatedTimeMs";
pub const CREATED_TIME_FIELD: &str = "createdTimeMs";
pub const TENANT_FIELD: &str = "tenant";
pub const ACCESS_LIST_FIELD: &str = "access";
pub const REPORT_DEFINITION_FIELD: &str = "reportDefinition";

wire_enum! {
    /// Kind of saved object a report is generated from.
    pub enum SourceType {
        Dashboard = (0, "Dashboard"),
        Visualization = (1, "Visualization"),
        SavedSearch = (2, "SavedSearch"),
        Notebook = (3, "Notebook"),
    }
}

wire_enum! {
    /// Output format of a generated report.
    pub enum FileFormat {
        Pdf = (0, "Pdf"),
        Png = (1, "Png"),
        Csv = (2, "Csv"),
    }
}

wire_enum! {
    /// How a report generation is triggered.
    pub enum TriggerType {
        Download = (0, "Download"),
        OnDemand = (1, "OnDemand"),
        CronBased = (2, "CronBased"),
        IntervalBased = (3, "IntervalBased"),
    }
}

wire_enum! {
    /// How a finished report reaches its recipients.
    pub enum DeliveryFormat {
        LinkOnly = (0, "LinkOnly"),
        Attachment = (1, "Attachment"),
        Embedded = (2, "Embedded"),
    }
}

// ============================================================================
// NESTED VALUES
// ============================================================================

/// Saved object the report is rendered from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    pub description: String,
    pub source_type: SourceType,
    pub origin: String,
    pub id: String,
}

impl Source {
    fn to_document(&self) -> Value {
        DocumentBuilder::new(false)
            .field("description", self.description.as_str())
            .field("type", self.source_type.as_str())
            .field("origin", self.origin.as_str())
            .field("id", self.id.as_str())
            .build()
    }

    fn from_document(doc: &Value) -> CodecResult<Self> {
        let mut description = None;
        let mut source_type = None;
        let mut origin = None;
        let mut id = None;
        for (field, value) in expect_object(doc)? {
            match field.as_str() {
                "description" => description = Some(expect_string(value)?),
                "type" => source_type = Some(SourceType::from_document_value("type", value)?),
                "origin" => origin = Some(expect_string(value)?),
                "id" => id = Some(expect_string(value)?),
                _ => skip_unknown_field("Source", field),
            }
        }
        Ok(Self {
            description: description.unwrap_or_default(),
            source_type: require("type", source_type)?,
            origin: require("origin", origin)?,
            id: require("id", id)?,
        })
    }
}

impl StreamCodec for Source {
    fn write_to(&self, out: &mut StreamOutput) {
        out.write_string(&self.description);
        self.source_type.write_to(out);
        out.write_string(&self.origin);
        out.write_string(&self.id);
    }

    fn read_from(input: &mut StreamInput<'_>) -> CodecResult<Self> {
        Ok(Self {
            description: input.read_string("source.description")?,
            source_type: SourceType::read_from(input)?,
            origin: input.read_string("source.origin")?,
            id: input.read_string("source.id")?,
        })
    }
}

/// Rendering options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Format {
    /// ISO-8601 duration of the time range covered, e.g. `PT1H`.
    pub duration: String,
    pub file_format: FileFormat,
    pub limit: Option<u32>,
    pub header: Option<String>,
    pub footer: Option<String>,
}

impl Format {
    fn to_document(&self, short_form: bool) -> Value {
        DocumentBuilder::new(short_form)
            .field("duration", self.duration.as_str())
            .field("fileFormat", self.file_format.as_str())
            .optional_field("limit", self.limit)
            .optional_field("header", self.header.as_deref())
            .optional_field("footer", self.footer.as_deref())
            .build()
    }

    fn from_document(doc: &Value) -> CodecResult<Self> {
        let mut duration = None;
        let mut file_format = None;
        let mut limit = None;
        let mut header = None;
        let mut footer = None;
        for (field, value) in expect_object(doc)? {
            match field.as_str() {
                "duration" => duration = Some(expect_string(value)?),
                "fileFormat" => {
                    file_format = Some(FileFormat::from_document_value("fileFormat", value)?)
                }
                "limit" => limit = optional(value, |v| expect_u32("limit", v))?,
                "header" => header = optional(value, expect_string)?,
                "footer" => footer = optional(value, expect_string)?,
                _ => skip_unknown_field("Format", field),
            }
        }
        Ok(Self {
            duration: require("duration", duration)?,
            file_format: require("fileFormat", file_format)?,
            limit,
            header,
            footer,
        })
    }
}

impl StreamCodec for Format {
    fn write_to(&self, out: &mut StreamOutput) {
        out.write_string(&self.duration);
        self.file_format.write_to(out);
        match self.limit {
            Some(limit) => {
                out.write_bool(true);
                out.write_vint(limit);
            }
            None => out.write_bool(false),
        }
        out.write_optional_string(self.header.as_deref());
        out.write_optional_string(self.footer.as_deref());
    }

    fn read_from(input: &mut StreamInput<'_>) -> CodecResult<Self> {
        let duration = input.read_string("format.duration")?;
        let file_format = FileFormat::read_from(input)?;
        let limit = if input.read_bool("format.limit")? {
            Some(input.read_vint("format.limit")?)
        } else {
            None
        };
        Ok(Self {
            duration,
            file_format,
            limit,
            header: input.read_optional_string("format.header")?,
            footer: input.read_optional_string("format.footer")?,
        })
    }
}

/// Trigger settings. Evaluation happens elsewhere; this only carries them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trigger {
    pub trigger_type: TriggerType,
    pub cron_expression: Option<String>,
    pub enabled_time: Option<Timestamp>,
}

impl Trigger {
    fn to_document(&self, short_form: bool) -> Value {
        DocumentBuilder::new(short_form)
            .field("triggerType", self.trigger_type.as_str())
            .optional_field("cronExpression", self.cron_expression.as_deref())
            .optional_field(
                "enabledTimeMs",
                self.enabled_time.as_ref().map(Timestamp::timestamp_millis),
            )
            .build()
    }

    fn from_document(doc: &Value) -> CodecResult<Self> {
        let mut trigger_type = None;
        let mut cron_expression = None;
        let mut enabled_time = None;
        for (field, value) in expect_object(doc)? {
            match field.as_str() {
                "triggerType" => {
                    trigger_type = Some(TriggerType::from_document_value("triggerType", value)?)
                }
                "cronExpression" => cron_expression = optional(value, expect_string)?,
                "enabledTimeMs" => {
                    enabled_time = optional(value, |v| expect_timestamp("enabledTimeMs", v))?
                }
                _ => skip_unknown_field("Trigger", field),
            }
        }
        Ok(Self {
            trigger_type: require("triggerType", trigger_type)?,
            cron_expression,
            enabled_time,
        })
    }
}

impl StreamCodec for Trigger {
    fn write_to(&self, out: &mut StreamOutput) {
        self.trigger_type.write_to(out);
        out.write_optional_string(self.cron_expression.as_deref());
        match &self.enabled_time {
            Some(ts) => {
                out.write_bool(true);
                out.write_timestamp(ts);
            }
            None => out.write_bool(false),
        }
    }

    fn read_from(input: &mut StreamInput<'_>) -> CodecResult<Self> {
        let trigger_type = TriggerType::read_from(input)?;
        let cron_expression = input.read_optional_string("trigger.cronExpression")?;
        let enabled_time = if input.read_bool("trigger.enabledTimeMs")? {
            Some(input.read_timestamp("trigger.enabledTimeMs")?)
        } else {
            None
        };
        Ok(Self {
            trigger_type,
            cron_expression,
            enabled_time,
        })
    }
}

/// Delivery settings. Sending happens elsewhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub recipients: Vec<String>,
    pub delivery_format: DeliveryFormat,
    pub title: String,
    pub text_description: String,
}

impl Delivery {
    fn to_document(&self, short_form: bool) -> Value {
        DocumentBuilder::new(short_form)
            .string_list("recipients", &self.recipients)
            .field("deliveryFormat", self.delivery_format.as_str())
            .field("title", self.title.as_str())
            .field("textDescription", self.text_description.as_str())
            .build()
    }

    fn from_document(doc: &Value) -> CodecResult<Self> {
        let mut recipients = Vec::new();
        let mut delivery_format = None;
        let mut title = None;
        let mut text_description = None;
        for (field, value) in expect_object(doc)? {
            match field.as_str() {
                "recipients" => recipients = expect_string_list(value)?,
                "deliveryFormat" => {
                    delivery_format =
                        Some(DeliveryFormat::from_document_value("deliveryFormat", value)?)
                }
                "title" => title = Some(expect_string(value)?),
                "textDescription" => text_description = Some(expect_string(value)?),
                _ => skip_unknown_field("Delivery", field),
            }
        }
        Ok(Self {
            recipients,
            delivery_format: require("deliveryFormat", delivery_format)?,
            title: title.unwrap_or_default(),
            text_description: text_description.unwrap_or_default(),
        })
    }
}

impl StreamCodec for Delivery {
    fn write_to(&self, out: &mut StreamOutput) {
        out.write_string_list(&self.recipients);
        self.delivery_format.write_to(out);
        out.write_string(&self.title);
        out.write_string(&self.text_description);
    }

    fn read_from(input: &mut StreamInput<'_>) -> CodecResult<Self> {
        Ok(Self {
            recipients: input.read_string_list("delivery.recipients")?,
            delivery_format: DeliveryFormat::read_from(input)?,
            title: input.read_string("delivery.title")?,
            text_description: input.read_string("delivery.textDescription")?,
        })
    }
}

// ============================================================================
// REPORT DEFINITION
// ============================================================================

/// User-authored definition of a report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportDefinition {
    pub name: String,
    pub is_enabled: bool,
    pub source: Source,
    pub format: Format,
    pub trigger: Trigger,
    pub delivery: Option<Delivery>,
}

impl ReportDefinition {
    pub fn to_document(&self, short_form: bool) -> Value {
        DocumentBuilder::new(short_form)
            .field("name", self.name.as_str())
            .field("isEnabled", self.is_enabled)
            .field("source", self.source.to_document())
            .field("format", self.format.to_document(short_form))
            .field("trigger", self.trigger.to_document(short_form))
            .optional_field("delivery", self.delivery.as_ref().map(|d| d.to_document(short_form)))
            .build()
    }

    pub fn from_document(doc: &Value) -> CodecResult<Self> {
        let mut name = None;
        let mut is_enabled = None;
        let mut source = None;
        let mut format = None;
        let mut trigger = None;
        let mut delivery = None;
        for (field, value) in expect_object(doc)? {
            match field.as_str() {
                "name" => name = Some(expect_string(value)?),
                "isEnabled" => is_enabled = Some(expect_bool(value)?),
                "source" => source = Some(Source::from_document(value)?),
                "format" => format = Some(Format::from_document(value)?),
                "trigger" => trigger = Some(Trigger::from_document(value)?),
                "delivery" => delivery = optional(value, Delivery::from_document)?,
                _ => skip_unknown_field("ReportDefinition", field),
            }
        }
        Ok(Self {
            name: require("name", name)?,
            is_enabled: is_enabled.unwrap_or(true),
            source: require("source", source)?,
            format: require("format", format)?,
            trigger: require("trigger", trigger)?,
            delivery,
        })
    }
}

impl StreamCodec for ReportDefinition {
    fn write_to(&self, out: &mut StreamOutput) {
        out.write_string(&self.name);
        out.write_bool(self.is_enabled);
        self.source.write_to(out);
        self.format.write_to(out);
        self.trigger.write_to(out);
        out.write_optional(self.delivery.as_ref());
    }

    fn read_from(input: &mut StreamInput<'_>) -> CodecResult<Self> {
        Ok(Self {
            name: input.read_string("reportDefinition.name")?,
            is_enabled: input.read_bool("reportDefinition.isEnabled")?,
            source: Source::read_from(input)?,
            format: Format::read_from(input)?,
            trigger: Trigger::read_from(input)?,
            delivery: input.read_optional("reportDefinition.delivery")?,
        })
    }
}

/// A stored report definition together with its bookkeeping fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportDefinitionDetails {
    pub id: String,
    pub last_updated_time: Timestamp,
    pub created_time: Timestamp,
    pub tenant: String,
    pub access: Vec<String>,
    pub report_definition: ReportDefinition,
}

impl ReportDefinitionDetails {
    /// Parse a stored or embedded document.
    ///
    /// `use_id` supplies the identifier when the document body does not
    /// carry one (backend hits keep it in the hit envelope); an `id` field
    /// in the body takes precedence.
    pub fn from_document(doc: &Value, use_id: Option<&str>) -> CodecResult<Self> {
        let mut id = use_id.map(str::to_string);
        let mut last_updated_time = None;
        let mut created_time = None;
        let mut tenant = None;
        let mut access = Vec::new();
        let mut report_definition = None;
        for (field, value) in expect_object(doc)? {
            match field.as_str() {
                ID_FIELD => id = Some(expect_string(value)?),
                LAST_UPDATED_TIME_FIELD => {
                    last_updated_time = Some(expect_timestamp(LAST_UPDATED_TIME_FIELD, value)?)
                }
                CREATED_TIME_FIELD => {
                    created_time = Some(expect_timestamp(CREATED_TIME_FIELD, value)?)
                }
                TENANT_FIELD => tenant = optional(value, expect_string)?,
                ACCESS_LIST_FIELD => access = expect_string_list(value)?,
                REPORT_DEFINITION_FIELD => {
                    report_definition = Some(ReportDefinition::from_document(value)?)
                }
                _ => skip_unknown_field("ReportDefinitionDetails", field),
            }
        }
        Ok(Self {
            id: require(ID_FIELD, id)?,
            last_updated_time: require(LAST_UPDATED_TIME_FIELD, last_updated_time)?,
            created_time: require(CREATED_TIME_FIELD, created_time)?,
            tenant: tenant.unwrap_or_default(),
            access,
            report_definition: require(REPORT_DEFINITION_FIELD, report_definition)?,
        })
    }

    pub fn to_document(&self, short_form: bool) -> Value {
        let builder = DocumentBuilder::new(short_form)
            .field(ID_FIELD, self.id.as_str())
            .timestamp(LAST_UPDATED_TIME_FIELD, &self.last_updated_time)
            .timestamp(CREATED_TIME_FIELD, &self.created_time);
        let builder = if short_form && self.tenant.is_empty() {
            builder
        } else {
            builder.field(TENANT_FIELD, self.tenant.as_str())
        };
        builder
            .string_list(ACCESS_LIST_FIELD, &self.access)
            .field(
                REPORT_DEFINITION_FIELD,
                self.report_definition.to_document(short_form),
            )
            .build()
    }
}

impl SearchItem for ReportDefinitionDetails {
    const ENTITY_NAME: &'static str = "report definition";

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

impl StreamCodec for ReportDefinitionDetails {
    fn write_to(&self, out: &mut StreamOutput) {
        out.write_string(&self.id);
        out.write_timestamp(&self.last_updated_time);
        out.write_timestamp(&self.created_time);
        out.write_string(&self.tenant);
        out.write_string_list(&self.access);
        self.report_definition.write_to(out);
    }

    fn read_from(input: &mut StreamInput<'_>) -> CodecResult<Self> {
        Ok(Self {
            id: input.read_string("reportDefinitionDetails.id")?,
            last_updated_time: input.read_timestamp("reportDefinitionDetails.lastUpdatedTimeMs")?,
            created_time: input.read_timestamp("reportDefinitionDetails.createdTimeMs")?,
            tenant: input.read_string("reportDefinitionDetails.tenant")?,
            access: input.read_string_list("reportDefinitionDetails.access")?,
            report_definition: ReportDefinition::read_from(input)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CodecError;
    use crate::identity::from_epoch_millis;
    use serde_json::json;

    fn sample() -> Option<ReportDefinitionDetails> {
        let ts = from_epoch_millis(1_603_506_908_773)?;
        Some(ReportDefinitionDetails {
            id: "def-1".to_string(),
            last_updated_time: ts,
            created_time: ts,
            tenant: String::new(),
            access: vec!["User:admin".to_string()],
            report_definition: ReportDefinition {
                name: "daily-sales".to_string(),
                is_enabled: true,
                source: Source {
                    description: "Sales dashboard".to_string(),
                    source_type: SourceType::Dashboard,
                    origin: "http://localhost:5601".to_string(),
                    id: "dash-1".to_string(),
                },
                format: Format {
                    duration: "PT1H".to_string(),
                    file_format: FileFormat::Pdf,
                    limit: None,
                    header: Some("Header".to_string()),
                    footer: None,
                },
                trigger: Trigger {
                    trigger_type: TriggerType::CronBased,
                    cron_expression: Some("0 8 * * *".to_string()),
                    enabled_time: Some(ts),
                },
                delivery: None,
            },
        })
    }

    #[test]
    fn test_short_and_full_forms_decode_equal() -> Result<(), String> {
        let details = sample().ok_or("bad timestamp")?;
        for short_form in [true, false] {
            let doc = details.to_document(short_form);
            let parsed =
                ReportDefinitionDetails::from_document(&doc, None).map_err(|e| e.to_string())?;
            assert_eq!(parsed, details);
        }
        Ok(())
    }

    #[test]
    fn test_short_form_omits_empty_fields() -> Result<(), String> {
        let details = sample().ok_or("bad timestamp")?;
        let doc = details.to_document(true);
        let object = doc.as_object().ok_or("not an object")?;
        assert!(!object.contains_key(TENANT_FIELD));
        let definition = object
            .get(REPORT_DEFINITION_FIELD)
            .and_then(Value::as_object)
            .ok_or("missing definition")?;
        assert!(!definition.contains_key("delivery"));
        Ok(())
    }

    #[test]
    fn test_use_id_supplies_missing_id() -> Result<(), String> {
        let details = sample().ok_or("bad timestamp")?;
        let mut doc = details.to_document(false);
        if let Some(object) = doc.as_object_mut() {
            object.remove(ID_FIELD);
        }
        let parsed = ReportDefinitionDetails::from_document(&doc, Some("def-1"))
            .map_err(|e| e.to_string())?;
        assert_eq!(parsed.id, "def-1");
        assert_eq!(
            ReportDefinitionDetails::from_document(&doc, None).map(|_| ()),
            Err(CodecError::MissingField { field: ID_FIELD })
        );
        Ok(())
    }

    #[test]
    fn test_binary_round_trip() -> Result<(), String> {
        let details = sample().ok_or("bad timestamp")?;
        let bytes = details.to_stream_bytes();
        let parsed =
            ReportDefinitionDetails::from_stream_bytes(&bytes).map_err(|e| e.to_string())?;
        assert_eq!(parsed, details);
        Ok(())
    }

    #[test]
    fn test_unknown_enum_value_rejected() {
        let doc = json!({"triggerType": "Hourly"});
        assert!(matches!(
            Trigger::from_document(&doc),
            Err(CodecError::InvalidValue { field: "triggerType", .. })
        ));
    }
}
