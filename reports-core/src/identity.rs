//! Identity and time types for report entities

use chrono::{DateTime, TimeZone, Utc};

use crate::error::ValidationError;

/// Timestamp type using UTC timezone, millisecond precision on the wire.
pub type Timestamp = DateTime<Utc>;

/// Longest identifier accepted in a request.
pub const MAX_ID_LENGTH: usize = 512;

/// Epoch milliseconds for a timestamp.
pub fn to_epoch_millis(ts: &Timestamp) -> i64 {
    ts.timestamp_millis()
}

/// Timestamp from epoch milliseconds. `None` when out of chrono's range.
pub fn from_epoch_millis(millis: i64) -> Option<Timestamp> {
    Utc.timestamp_millis_opt(millis).single()
}

/// Current time truncated to milliseconds so it survives a codec round trip.
pub fn now_millis() -> Timestamp {
    let now = Utc::now();
    from_epoch_millis(now.timestamp_millis()).unwrap_or(now)
}

/// Validate a document identifier taken from a request.
///
/// Identifiers are opaque to this service but must be usable as a path
/// segment and as a backend document key.
pub fn validate_id(field: &str, id: &str) -> Result<(), ValidationError> {
    if id.is_empty() {
        return Err(ValidationError::RequiredFieldMissing {
            field: field.to_string(),
        });
    }
    if id.len() > MAX_ID_LENGTH {
        return Err(ValidationError::InvalidValue {
            field: field.to_string(),
            reason: format!("longer than {} bytes", MAX_ID_LENGTH),
        });
    }
    if id.chars().any(|c| c.is_whitespace() || c == '/') {
        return Err(ValidationError::InvalidValue {
            field: field.to_string(),
            reason: "must not contain whitespace or '/'".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_millis_round_trip() {
        let ts = now_millis();
        assert_eq!(from_epoch_millis(to_epoch_millis(&ts)), Some(ts));
    }

    #[test]
    fn test_validate_id_boundaries() {
        assert!(validate_id("id", "a").is_ok());
        assert!(validate_id("id", &"x".repeat(MAX_ID_LENGTH)).is_ok());
        assert!(matches!(
            validate_id("id", ""),
            Err(ValidationError::RequiredFieldMissing { .. })
        ));
        assert!(matches!(
            validate_id("id", &"x".repeat(MAX_ID_LENGTH + 1)),
            Err(ValidationError::InvalidValue { .. })
        ));
        assert!(validate_id("id", "a b").is_err());
        assert!(validate_id("id", "a/b").is_err());
    }
}
