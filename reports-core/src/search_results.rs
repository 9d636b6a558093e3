//! Paginated, typed view over backend search results.

use serde_json::Value;

use crate::backend::SearchResponse;
use crate::codec::document::{expect_array, expect_object, expect_u64, require};
use crate::codec::{skip_unknown_field, DocumentBuilder, StreamCodec, StreamInput, StreamOutput};
use crate::error::{CodecError, CodecResult, ReportsError, ReportsResult};
use crate::identity::Timestamp;
use crate::MAX_ITEMS_QUERY_COUNT;

pub const START_INDEX_FIELD: &str = "startIndex";
pub const TOTAL_HITS_FIELD: &str = "totalHits";

/// An entity that can be returned in bulk from the search backend.
pub trait SearchItem: Sized {
    /// Human-readable entity name used in errors and logs.
    const ENTITY_NAME: &'static str;

    fn id(&self) -> &str;

    /// Ordering key; list queries return newest first.
    fn last_updated_time(&self) -> Timestamp;

    /// Access entries (`User:<name>`, `BERole:<role>`) guarding this item.
    fn access(&self) -> &[String];

    fn write_as_document(&self, short_form: bool) -> Value;

    /// Parse a stored document. `use_id` is the identifier to fall back on
    /// when the body does not carry one.
    fn parse_item(doc: &Value, use_id: Option<&str>) -> CodecResult<Self>;
}

/// One page of search results.
///
/// Invariants, checked at every construction site:
/// - `start_index + items.len() <= total_hits`
/// - `items.len() <= MAX_ITEMS_QUERY_COUNT`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResults<T> {
    start_index: u64,
    total_hits: u64,
    items: Vec<T>,
    list_field: &'static str,
}

fn check_page(start_index: u64, total_hits: u64, len: usize) -> Result<(), String> {
    if len > MAX_ITEMS_QUERY_COUNT {
        return Err(format!(
            "{} items exceeds the page limit of {}",
            len, MAX_ITEMS_QUERY_COUNT
        ));
    }
    match start_index.checked_add(len as u64) {
        Some(end) if end <= total_hits => Ok(()),
        _ => Err(format!(
            "page [{}, +{}) runs past totalHits {}",
            start_index, len, total_hits
        )),
    }
}

impl<T: SearchItem> SearchResults<T> {
    pub fn new(
        start_index: u64,
        total_hits: u64,
        items: Vec<T>,
        list_field: &'static str,
    ) -> CodecResult<Self> {
        check_page(start_index, total_hits, items.len()).map_err(|reason| {
            CodecError::InvalidValue {
                field: list_field,
                reason,
            }
        })?;
        Ok(Self {
            start_index,
            total_hits,
            items,
            list_field,
        })
    }

    /// Build a page from a raw backend response.
    ///
    /// Any hit that fails to parse, or a response that breaks the page
    /// invariants, is a system fault rather than a caller error.
    pub fn from_search_response(
        from: u64,
        response: &SearchResponse,
        list_field: &'static str,
    ) -> ReportsResult<Self> {
        let items = response
            .hits
            .iter()
            .map(|hit| T::parse_item(&hit.source, Some(&hit.id)))
            .collect::<CodecResult<Vec<_>>>()
            .map_err(|source| ReportsError::adaptation(T::ENTITY_NAME, source))?;
        Self::new(from, response.total_hits, items, list_field)
            .map_err(|source| ReportsError::adaptation(T::ENTITY_NAME, source))
    }

    /// Parse the structured-text form.
    ///
    /// The list field is required. `totalHits` and `startIndex` are
    /// optional so list-only documents from older peers still parse.
    pub fn from_document(doc: &Value, list_field: &'static str) -> CodecResult<Self> {
        let mut start_index = None;
        let mut total_hits = None;
        let mut items = None;
        for (field, value) in expect_object(doc)? {
            match field.as_str() {
                START_INDEX_FIELD => start_index = Some(expect_u64(START_INDEX_FIELD, value)?),
                TOTAL_HITS_FIELD => total_hits = Some(expect_u64(TOTAL_HITS_FIELD, value)?),
                name if name == list_field => {
                    items = Some(
                        expect_array(value)?
                            .iter()
                            .map(|item| T::parse_item(item, None))
                            .collect::<CodecResult<Vec<_>>>()?,
                    )
                }
                _ => skip_unknown_field("SearchResults", field),
            }
        }
        let items: Vec<T> = require(list_field, items)?;
        let start_index = start_index.unwrap_or(0);
        let total_hits = total_hits.unwrap_or(start_index.saturating_add(items.len() as u64));
        Self::new(start_index, total_hits, items, list_field)
    }

    /// Emit `startIndex`, `totalHits`, then the item list, each item in
    /// short form.
    pub fn to_document(&self) -> Value {
        let items = self
            .items
            .iter()
            .map(|item| item.write_as_document(true))
            .collect();
        // The list is always present, even when empty.
        DocumentBuilder::new(false)
            .field(START_INDEX_FIELD, self.start_index)
            .field(TOTAL_HITS_FIELD, self.total_hits)
            .list_field(self.list_field, items)
            .build()
    }

    pub fn start_index(&self) -> u64 {
        self.start_index
    }

    pub fn total_hits(&self) -> u64 {
        self.total_hits
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn list_field(&self) -> &'static str {
        self.list_field
    }

    pub fn into_items(self) -> Vec<T> {
        self.items
    }

    /// Offset to request for the following page, or `None` on the last page.
    pub fn next_start_index(&self) -> Option<u64> {
        let next = self.start_index + self.items.len() as u64;
        (!self.items.is_empty() && next < self.total_hits).then_some(next)
    }
}

impl<T: SearchItem + StreamCodec> SearchResults<T> {
    pub fn write_to(&self, out: &mut StreamOutput) {
        out.write_vlong(self.start_index);
        out.write_vlong(self.total_hits);
        out.write_list(&self.items);
    }

    pub fn read_from(input: &mut StreamInput<'_>, list_field: &'static str) -> CodecResult<Self> {
        let start_index = input.read_vlong("searchResults.startIndex")?;
        let total_hits = input.read_vlong("searchResults.totalHits")?;
        let items = input.read_list(list_field)?;
        Self::new(start_index, total_hits, items, list_field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::SearchHit;
    use crate::identity::from_epoch_millis;
    use crate::instance::{ReportInstance, ReportInstanceStatus};
    use serde_json::json;

    const LIST: &str = "reportInstanceList";

    fn instance(id: &str) -> ReportInstance {
        let ts = from_epoch_millis(1_603_506_908_773).expect("valid timestamp");
        ReportInstance {
            id: id.to_string(),
            last_updated_time: ts,
            created_time: ts,
            begin_time: ts,
            end_time: ts,
            tenant: String::new(),
            access: vec![],
            report_definition_details: None,
            status: ReportInstanceStatus::Success,
            status_text: None,
            in_context_download_url_path: None,
        }
    }

    #[test]
    fn test_key_order_and_list_presence() -> CodecResult<()> {
        let page: SearchResults<ReportInstance> = SearchResults::new(0, 0, vec![], LIST)?;
        let doc = page.to_document();
        let keys: Vec<_> = expect_object(&doc)?.keys().cloned().collect();
        assert_eq!(keys, vec![START_INDEX_FIELD, TOTAL_HITS_FIELD, LIST]);
        assert_eq!(doc[LIST], json!([]));
        Ok(())
    }

    #[test]
    fn test_list_only_document_defaults() -> CodecResult<()> {
        let item = instance("i1");
        let doc = json!({ LIST: [item.to_document(true)], "took": 3 });
        let page = SearchResults::<ReportInstance>::from_document(&doc, LIST)?;
        assert_eq!(page.start_index(), 0);
        assert_eq!(page.total_hits(), 1);
        assert_eq!(page.items(), &[item]);
        Ok(())
    }

    #[test]
    fn test_missing_list_field() {
        let doc = json!({ "startIndex": 0, "totalHits": 0 });
        assert_eq!(
            SearchResults::<ReportInstance>::from_document(&doc, LIST).map(|_| ()),
            Err(CodecError::MissingField { field: LIST })
        );
    }

    #[test]
    fn test_invariant_violation_rejected() {
        let doc = json!({ "startIndex": 5, "totalHits": 2, LIST: [] });
        assert!(matches!(
            SearchResults::<ReportInstance>::from_document(&doc, LIST),
            Err(CodecError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_bad_hit_is_adaptation_failure() {
        let response = SearchResponse {
            total_hits: 1,
            hits: vec![SearchHit {
                id: "i1".to_string(),
                source: json!({ "status": "Success" }),
            }],
        };
        assert!(matches!(
            SearchResults::<ReportInstance>::from_search_response(0, &response, LIST),
            Err(ReportsError::Adaptation { .. })
        ));
    }

    #[test]
    fn test_hit_id_used_when_body_has_none() -> ReportsResult<()> {
        let mut source = instance("ignored").to_document(true);
        if let Some(object) = source.as_object_mut() {
            object.remove("id");
        }
        let response = SearchResponse {
            total_hits: 4,
            hits: vec![SearchHit {
                id: "i3".to_string(),
                source,
            }],
        };
        let page = SearchResults::<ReportInstance>::from_search_response(3, &response, LIST)?;
        assert_eq!(page.items()[0].id, "i3");
        assert_eq!(page.start_index(), 3);
        assert_eq!(page.next_start_index(), None);
        Ok(())
    }

    #[test]
    fn test_binary_round_trip() -> CodecResult<()> {
        let items: Vec<_> = ["i1", "i2"].into_iter().map(instance).collect();
        let page = SearchResults::new(10, 40, items, LIST)?;
        assert_eq!(page.next_start_index(), Some(12));
        let mut out = StreamOutput::new();
        page.write_to(&mut out);
        let bytes = out.freeze();
        let mut input = StreamInput::new(&bytes);
        let decoded = SearchResults::<ReportInstance>::read_from(&mut input, LIST)?;
        input.finish()?;
        assert_eq!(decoded, page);
        Ok(())
    }
}
