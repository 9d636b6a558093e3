//! Dual-format codec for requests, responses and stored items.
//!
//! Every transport value implements both [`StreamCodec`] (compact,
//! order-dependent binary) and [`DocumentCodec`] (self-describing JSON,
//! tolerant of unknown fields). For all valid values,
//! `decode(encode(x)) == x` in both forms.

pub mod document;
pub mod stream;

use bytes::Bytes;
use serde_json::Value;

use crate::error::CodecResult;

pub use document::{parse_document, skip_unknown_field, DocumentBuilder};
pub use stream::{StreamInput, StreamOutput};

/// Binary stream form.
pub trait StreamCodec: Sized {
    /// Write fields in their fixed order.
    fn write_to(&self, out: &mut StreamOutput);

    /// Read fields in the order [`StreamCodec::write_to`] wrote them.
    fn read_from(input: &mut StreamInput<'_>) -> CodecResult<Self>;

    fn to_stream_bytes(&self) -> Bytes {
        let mut out = StreamOutput::new();
        self.write_to(&mut out);
        out.freeze()
    }

    /// Decode a complete buffer; leftover bytes are an error.
    fn from_stream_bytes(bytes: &[u8]) -> CodecResult<Self> {
        let mut input = StreamInput::new(bytes);
        let value = Self::read_from(&mut input)?;
        input.finish()?;
        Ok(value)
    }
}

/// Structured-text form.
pub trait DocumentCodec: Sized {
    fn to_document(&self) -> Value;

    fn from_document(doc: &Value) -> CodecResult<Self>;

    fn to_json_bytes(&self) -> Bytes {
        Bytes::from(self.to_document().to_string())
    }

    fn from_json_bytes(bytes: &[u8]) -> CodecResult<Self> {
        let doc = parse_document(bytes)?;
        Self::from_document(&doc)
    }
}

/// Wire encoding negotiated per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WireFormat {
    /// [`StreamCodec`] bytes
    Binary,
    /// [`DocumentCodec`] JSON text
    Json,
}

impl WireFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            WireFormat::Binary => "application/octet-stream",
            WireFormat::Json => "application/json",
        }
    }

    pub fn encode<T: StreamCodec + DocumentCodec>(&self, value: &T) -> Bytes {
        match self {
            WireFormat::Binary => value.to_stream_bytes(),
            WireFormat::Json => value.to_json_bytes(),
        }
    }

    pub fn decode<T: StreamCodec + DocumentCodec>(&self, bytes: &[u8]) -> CodecResult<T> {
        match self {
            WireFormat::Binary => T::from_stream_bytes(bytes),
            WireFormat::Json => T::from_json_bytes(bytes),
        }
    }
}
