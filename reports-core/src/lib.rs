//! Reports Core - Entity Types and Request Plumbing
//!
//! Domain model for report definitions and report instances, the dual-format
//! codec they travel in, the paginated search-results page, the caller
//! access model and the search backend boundary. All other crates depend on
//! this.

#[macro_use]
mod macros;

pub mod access;
pub mod backend;
pub mod codec;
pub mod definition;
pub mod error;
pub mod identity;
pub mod instance;
pub mod search_results;

// ============================================================================
// PAGINATION LIMITS
// ============================================================================

/// Upper bound on items in one page.
pub const MAX_ITEMS_QUERY_COUNT: usize = 1000;

/// Page size when a list request does not name one.
pub const DEFAULT_ITEMS_QUERY_COUNT: u32 = 100;

// ============================================================================
// RE-EXPORTS
// ============================================================================

pub use access::{AccessContext, Principal, ADMIN_ROLE};
pub use backend::{
    InMemorySearchBackend, RawDocument, SearchBackend, SearchHit, SearchQuery, SearchResponse,
    SortOrder,
};
pub use codec::{DocumentCodec, StreamCodec, StreamInput, StreamOutput, WireFormat};
pub use definition::{
    Delivery, DeliveryFormat, FileFormat, Format, ReportDefinition, ReportDefinitionDetails,
    Source, SourceType, Trigger, TriggerType,
};
pub use error::{
    BackendError, CodecError, CodecResult, ReportsError, ReportsResult, ValidationError,
};
pub use identity::{from_epoch_millis, now_millis, to_epoch_millis, validate_id, Timestamp};
pub use instance::{ReportInstance, ReportInstanceStatus};
pub use search_results::{SearchItem, SearchResults};
