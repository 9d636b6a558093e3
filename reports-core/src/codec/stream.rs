//! Binary stream form.
//!
//! Fields are written in a fixed order with explicit widths and read back in
//! exactly the same order. There is no field tagging: a reader and writer
//! that disagree on order produce garbage or a [`CodecError`], never a
//! silently reordered value.
//!
//! Primitive encodings:
//! - `u8` / `bool`: one byte (`bool` must be 0 or 1)
//! - `vint` / `vlong`: unsigned LEB128, 7 bits per byte, low group first
//! - `i64`: 8 bytes big-endian
//! - string: `vint` byte length followed by UTF-8 bytes
//! - optional: presence byte followed by the value when present
//! - list: `vint` element count followed by the elements

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{CodecError, CodecResult};
use crate::identity::{from_epoch_millis, to_epoch_millis, Timestamp};

use super::StreamCodec;

const MAX_VINT_BYTES: usize = 5;
const MAX_VLONG_BYTES: usize = 10;

// ============================================================================
// OUTPUT
// ============================================================================

/// Append-only binary writer.
#[derive(Debug, Default)]
pub struct StreamOutput {
    buf: BytesMut,
}

impl StreamOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buf.put_u8(value);
    }

    pub fn write_bool(&mut self, value: bool) {
        self.buf.put_u8(u8::from(value));
    }

    pub fn write_vint(&mut self, value: u32) {
        self.write_vlong(u64::from(value));
    }

    pub fn write_vlong(&mut self, mut value: u64) {
        while value >= 0x80 {
            self.buf.put_u8((value as u8 & 0x7f) | 0x80);
            value >>= 7;
        }
        self.buf.put_u8(value as u8);
    }

    pub fn write_i64(&mut self, value: i64) {
        self.buf.put_i64(value);
    }

    pub fn write_string(&mut self, value: &str) {
        self.write_len(value.len());
        self.buf.put_slice(value.as_bytes());
    }

    pub fn write_timestamp(&mut self, value: &Timestamp) {
        self.write_i64(to_epoch_millis(value));
    }

    pub fn write_optional<T: StreamCodec>(&mut self, value: Option<&T>) {
        match value {
            Some(inner) => {
                self.write_bool(true);
                inner.write_to(self);
            }
            None => self.write_bool(false),
        }
    }

    pub fn write_optional_string(&mut self, value: Option<&str>) {
        match value {
            Some(inner) => {
                self.write_bool(true);
                self.write_string(inner);
            }
            None => self.write_bool(false),
        }
    }

    pub fn write_list<T: StreamCodec>(&mut self, values: &[T]) {
        self.write_len(values.len());
        for value in values {
            value.write_to(self);
        }
    }

    pub fn write_string_list(&mut self, values: &[String]) {
        self.write_len(values.len());
        for value in values {
            self.write_string(value);
        }
    }

    /// Freeze into an immutable buffer.
    pub fn freeze(self) -> Bytes {
        self.buf.freeze()
    }

    fn write_len(&mut self, len: usize) {
        // Lengths beyond u32 cannot be produced by any in-memory value we
        // encode; saturate rather than wrap so a reader fails loudly.
        self.write_vint(u32::try_from(len).unwrap_or(u32::MAX));
    }
}

// ============================================================================
// INPUT
// ============================================================================

/// Cursor over an encoded buffer.
#[derive(Debug)]
pub struct StreamInput<'a> {
    buf: &'a [u8],
}

impl<'a> StreamInput<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    pub fn read_u8(&mut self, context: &'static str) -> CodecResult<u8> {
        self.ensure(1, context)?;
        Ok(self.buf.get_u8())
    }

    pub fn read_bool(&mut self, context: &'static str) -> CodecResult<bool> {
        match self.read_u8(context)? {
            0 => Ok(false),
            1 => Ok(true),
            tag => Err(CodecError::InvalidTag { kind: "bool", tag }),
        }
    }

    pub fn read_vint(&mut self, context: &'static str) -> CodecResult<u32> {
        let value = self.read_varint(context, MAX_VINT_BYTES)?;
        u32::try_from(value).map_err(|_| CodecError::VarintOverflow { context })
    }

    pub fn read_vlong(&mut self, context: &'static str) -> CodecResult<u64> {
        self.read_varint(context, MAX_VLONG_BYTES)
    }

    pub fn read_i64(&mut self, context: &'static str) -> CodecResult<i64> {
        self.ensure(8, context)?;
        Ok(self.buf.get_i64())
    }

    pub fn read_string(&mut self, context: &'static str) -> CodecResult<String> {
        let len = self.read_vint(context)? as usize;
        self.ensure(len, context)?;
        let bytes = self.buf.copy_to_bytes(len);
        String::from_utf8(bytes.to_vec()).map_err(|_| CodecError::InvalidUtf8)
    }

    pub fn read_timestamp(&mut self, context: &'static str) -> CodecResult<Timestamp> {
        let millis = self.read_i64(context)?;
        from_epoch_millis(millis).ok_or_else(|| CodecError::InvalidValue {
            field: context,
            reason: format!("timestamp {} out of range", millis),
        })
    }

    pub fn read_optional<T: StreamCodec>(
        &mut self,
        context: &'static str,
    ) -> CodecResult<Option<T>> {
        if self.read_bool(context)? {
            Ok(Some(T::read_from(self)?))
        } else {
            Ok(None)
        }
    }

    pub fn read_optional_string(&mut self, context: &'static str) -> CodecResult<Option<String>> {
        if self.read_bool(context)? {
            Ok(Some(self.read_string(context)?))
        } else {
            Ok(None)
        }
    }

    pub fn read_list<T: StreamCodec>(&mut self, context: &'static str) -> CodecResult<Vec<T>> {
        let count = self.read_vint(context)? as usize;
        // Every element takes at least one byte, so a count larger than the
        // remaining input is already known to be truncated.
        let mut values = Vec::with_capacity(count.min(self.remaining()));
        for _ in 0..count {
            values.push(T::read_from(self)?);
        }
        Ok(values)
    }

    pub fn read_string_list(&mut self, context: &'static str) -> CodecResult<Vec<String>> {
        let count = self.read_vint(context)? as usize;
        let mut values = Vec::with_capacity(count.min(self.remaining()));
        for _ in 0..count {
            values.push(self.read_string(context)?);
        }
        Ok(values)
    }

    /// Fail if any input is left unread.
    pub fn finish(self) -> CodecResult<()> {
        match self.remaining() {
            0 => Ok(()),
            remaining => Err(CodecError::TrailingBytes { remaining }),
        }
    }

    fn ensure(&self, needed: usize, context: &'static str) -> CodecResult<()> {
        let remaining = self.remaining();
        if remaining < needed {
            return Err(CodecError::Truncated {
                context,
                needed: needed - remaining,
            });
        }
        Ok(())
    }

    fn read_varint(&mut self, context: &'static str, max_bytes: usize) -> CodecResult<u64> {
        let mut value: u64 = 0;
        for index in 0..max_bytes {
            let byte = self.read_u8(context)?;
            let shift = 7 * index as u32;
            let group = u64::from(byte & 0x7f);
            if shift == 63 && group > 1 {
                return Err(CodecError::VarintOverflow { context });
            }
            value |= group << shift;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(CodecError::VarintOverflow { context })
    }
}

impl StreamCodec for String {
    fn write_to(&self, out: &mut StreamOutput) {
        out.write_string(self);
    }

    fn read_from(input: &mut StreamInput<'_>) -> CodecResult<Self> {
        input.read_string("string")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vlong_boundaries() -> CodecResult<()> {
        for value in [0u64, 1, 127, 128, 16_383, 16_384, u64::from(u32::MAX), u64::MAX] {
            let mut out = StreamOutput::new();
            out.write_vlong(value);
            let bytes = out.freeze();
            let mut input = StreamInput::new(&bytes);
            assert_eq!(input.read_vlong("value")?, value);
            input.finish()?;
        }
        Ok(())
    }

    #[test]
    fn test_single_byte_vint() {
        let mut out = StreamOutput::new();
        out.write_vint(127);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn test_vint_rejects_u64_payload() {
        let mut out = StreamOutput::new();
        out.write_vlong(u64::from(u32::MAX) + 1);
        let bytes = out.freeze();
        let mut input = StreamInput::new(&bytes);
        assert!(matches!(
            input.read_vint("count"),
            Err(CodecError::VarintOverflow { .. })
        ));
    }

    #[test]
    fn test_truncated_string() {
        let mut out = StreamOutput::new();
        out.write_string("report-definition");
        let bytes = out.freeze();
        let mut input = StreamInput::new(&bytes[..4]);
        assert!(matches!(
            input.read_string("id"),
            Err(CodecError::Truncated { context: "id", .. })
        ));
    }

    #[test]
    fn test_invalid_bool_tag() {
        let mut input = StreamInput::new(&[2u8]);
        assert_eq!(
            input.read_bool("flag"),
            Err(CodecError::InvalidTag { kind: "bool", tag: 2 })
        );
    }

    #[test]
    fn test_trailing_bytes_detected() -> CodecResult<()> {
        let mut input = StreamInput::new(&[0u8, 9]);
        assert!(!input.read_bool("flag")?);
        assert_eq!(input.finish(), Err(CodecError::TrailingBytes { remaining: 1 }));
        Ok(())
    }

    #[test]
    fn test_list_with_absurd_count_is_truncated() {
        let mut out = StreamOutput::new();
        out.write_vint(u32::MAX);
        let bytes = out.freeze();
        let mut input = StreamInput::new(&bytes);
        assert!(matches!(
            input.read_string_list("access"),
            Err(CodecError::Truncated { .. })
        ));
    }
}
