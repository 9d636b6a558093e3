//! Structured-text (JSON) form.
//!
//! Decoding is tolerant: object entries may come in any order, only a fixed
//! set of field names is recognised per type, and anything else is skipped
//! with an info-level log so newer peers can add fields without breaking
//! older readers. Encoding is strict and writes keys in a fixed order.

use serde_json::{Map, Value};

use crate::error::{CodecError, CodecResult};
use crate::identity::{from_epoch_millis, to_epoch_millis, Timestamp};

/// Parse raw bytes into a JSON value.
pub fn parse_document(bytes: &[u8]) -> CodecResult<Value> {
    serde_json::from_slice(bytes).map_err(|e| CodecError::MalformedInput {
        reason: e.to_string(),
    })
}

/// Name of the JSON token kind, used in error messages.
pub fn token_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Require an object at the current position.
pub fn expect_object(value: &Value) -> CodecResult<&Map<String, Value>> {
    value.as_object().ok_or(CodecError::UnexpectedToken {
        expected: "object",
        found: token_name(value),
    })
}

/// Require an array at the current position.
pub fn expect_array(value: &Value) -> CodecResult<&Vec<Value>> {
    value.as_array().ok_or(CodecError::UnexpectedToken {
        expected: "array",
        found: token_name(value),
    })
}

pub fn expect_string(value: &Value) -> CodecResult<String> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or(CodecError::UnexpectedToken {
            expected: "string",
            found: token_name(value),
        })
}

pub fn expect_bool(value: &Value) -> CodecResult<bool> {
    value.as_bool().ok_or(CodecError::UnexpectedToken {
        expected: "boolean",
        found: token_name(value),
    })
}

pub fn expect_u64(field: &'static str, value: &Value) -> CodecResult<u64> {
    match value {
        Value::Number(number) => number.as_u64().ok_or_else(|| CodecError::InvalidValue {
            field,
            reason: format!("{} is not an unsigned integer", number),
        }),
        other => Err(CodecError::UnexpectedToken {
            expected: "number",
            found: token_name(other),
        }),
    }
}

pub fn expect_u32(field: &'static str, value: &Value) -> CodecResult<u32> {
    let wide = expect_u64(field, value)?;
    u32::try_from(wide).map_err(|_| CodecError::InvalidValue {
        field,
        reason: format!("{} exceeds {}", wide, u32::MAX),
    })
}

/// Epoch-millisecond timestamp.
pub fn expect_timestamp(field: &'static str, value: &Value) -> CodecResult<Timestamp> {
    let millis = match value {
        Value::Number(number) => number.as_i64().ok_or_else(|| CodecError::InvalidValue {
            field,
            reason: format!("{} is not an integer", number),
        })?,
        other => {
            return Err(CodecError::UnexpectedToken {
                expected: "number",
                found: token_name(other),
            })
        }
    };
    from_epoch_millis(millis).ok_or_else(|| CodecError::InvalidValue {
        field,
        reason: format!("timestamp {} out of range", millis),
    })
}

pub fn expect_string_list(value: &Value) -> CodecResult<Vec<String>> {
    expect_array(value)?.iter().map(expect_string).collect()
}

/// `null` decodes as absent; anything else goes through `parse`.
pub fn optional<T>(
    value: &Value,
    parse: impl FnOnce(&Value) -> CodecResult<T>,
) -> CodecResult<Option<T>> {
    if value.is_null() {
        Ok(None)
    } else {
        parse(value).map(Some)
    }
}

/// Fail with `MissingField` if a required field never appeared.
pub fn require<T>(field: &'static str, value: Option<T>) -> CodecResult<T> {
    value.ok_or(CodecError::MissingField { field })
}

/// Log and drop an unrecognised field.
pub fn skip_unknown_field(owner: &'static str, field: &str) {
    tracing::info!(owner, field, "Skipping unknown field");
}

// ============================================================================
// BUILDER
// ============================================================================

/// Ordered object builder.
///
/// In short form, absent optionals and empty lists are left out; in full
/// form they are written as `null` / `[]`. Both decode to the same value.
#[derive(Debug)]
pub struct DocumentBuilder {
    map: Map<String, Value>,
    short_form: bool,
}

impl DocumentBuilder {
    pub fn new(short_form: bool) -> Self {
        Self {
            map: Map::new(),
            short_form,
        }
    }

    pub fn field(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.map.insert(name.to_string(), value.into());
        self
    }

    pub fn timestamp(self, name: &str, value: &Timestamp) -> Self {
        self.field(name, to_epoch_millis(value))
    }

    pub fn optional_field<V: Into<Value>>(mut self, name: &str, value: Option<V>) -> Self {
        match value {
            Some(inner) => {
                self.map.insert(name.to_string(), inner.into());
            }
            None if !self.short_form => {
                self.map.insert(name.to_string(), Value::Null);
            }
            None => {}
        }
        self
    }

    pub fn list_field(mut self, name: &str, values: Vec<Value>) -> Self {
        if !(self.short_form && values.is_empty()) {
            self.map.insert(name.to_string(), Value::Array(values));
        }
        self
    }

    pub fn string_list(self, name: &str, values: &[String]) -> Self {
        let values = values.iter().cloned().map(Value::String).collect();
        self.list_field(name, values)
    }

    pub fn build(self) -> Value {
        Value::Object(self.map)
    }
}
