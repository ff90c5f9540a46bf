//! # Decoded Reply Values
//!
//! [`Value`] is the dynamically-typed form of every reply the native core
//! hands back. Response converters are written as exhaustive matches over
//! this union, so dual-shape replies (the same logical payload encoded as a
//! flat sequence or as a mapping, depending on the negotiated protocol
//! version) are a compile-time-checked branch rather than a runtime cast.
//!
//! Decoding copies everything out of the core-owned [`WireReply`] tree; the
//! caller remains responsible for invoking the core's free entry point on
//! the tree afterwards, on every path including a decode failure.

use std::slice::from_raw_parts;

use crate::error::{Error, Result};
use crate::ffi::layout::{WireReply, WireType};

/// A decoded reply from the native core.
///
/// Maps and sets keep the core's element order; no ordering guarantee is
/// attached to either.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absent value (missing key, exhausted blocking wait, ...)
    Nil,
    Int(i64),
    Double(f64),
    Boolean(bool),
    /// The server's generic "OK" acknowledgement
    Okay,
    /// Byte string; both simple and bulk wire strings decode to this
    BulkString(Vec<u8>),
    Array(Vec<Value>),
    Map(Vec<(Value, Value)>),
    Set(Vec<Value>),
    /// Error marker passed through unconverted; the dispatch layer turns it
    /// into [`Error::Server`]
    ServerError(String),
}

impl Value {
    /// Short name of the variant, used in protocol-violation error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Nil => "null",
            Value::Int(_) => "integer",
            Value::Double(_) => "double",
            Value::Boolean(_) => "boolean",
            Value::Okay => "ok",
            Value::BulkString(_) => "string",
            Value::Array(_) => "array",
            Value::Map(_) => "map",
            Value::Set(_) => "set",
            Value::ServerError(_) => "error",
        }
    }

    /// Copy a core-owned [`WireReply`] tree into an owned [`Value`].
    ///
    /// An out-of-range type tag or a malformed map arity is reported as an
    /// [`Error::UnexpectedReturnType`]; nothing is silently coerced.
    ///
    /// # Safety
    ///
    /// * `raw` must describe a well-formed reply tree: whenever `typ` is a
    ///   pointer-carrying variant, `val` must point to `size` valid bytes or
    ///   `size` valid nested [`WireReply`] values respectively.
    /// * The tree must stay untouched by the native side for the duration of
    ///   the call.
    pub(crate) unsafe fn decode(raw: &WireReply) -> Result<Value> {
        let typ = WireType::try_from(raw.typ)
            .map_err(|tag| Error::unexpected_return_type("known reply tag", format!("tag {tag}")))?;

        let value = match typ {
            WireType::Null => Value::Nil,
            WireType::Int => Value::Int(raw.val),
            WireType::Double => Value::Double(f64::from_bits(raw.val as u64)),
            WireType::Boolean => Value::Boolean(raw.val != 0),
            WireType::Okay => Value::Okay,
            WireType::SimpleString | WireType::BulkString => {
                Value::BulkString(unsafe { copy_bytes(raw) })
            }
            WireType::Error => {
                let bytes = unsafe { copy_bytes(raw) };
                Value::ServerError(String::from_utf8_lossy(&bytes).into_owned())
            }
            WireType::Array => Value::Array(unsafe { decode_children(raw) }?),
            WireType::Set => Value::Set(unsafe { decode_children(raw) }?),
            WireType::Map => {
                let entries = unsafe { decode_children(raw) }?;
                if entries.len() % 2 != 0 {
                    return Err(Error::unexpected_return_type(
                        "map with even entry count",
                        format!("{} entries", entries.len()),
                    ));
                }
                let mut pairs = Vec::with_capacity(entries.len() / 2);
                let mut iter = entries.into_iter();
                while let (Some(key), Some(val)) = (iter.next(), iter.next()) {
                    pairs.push((key, val));
                }
                Value::Map(pairs)
            }
        };
        Ok(value)
    }
}

/// # Safety
/// `raw.val` must point to `raw.size` valid bytes.
unsafe fn copy_bytes(raw: &WireReply) -> Vec<u8> {
    if raw.size == 0 {
        return Vec::new();
    }
    unsafe { from_raw_parts(raw.val as *const u8, raw.size as usize) }.to_vec()
}

/// # Safety
/// `raw.val` must point to `raw.size` valid nested replies.
unsafe fn decode_children(raw: &WireReply) -> Result<Vec<Value>> {
    if raw.size == 0 {
        return Ok(Vec::new());
    }
    let children = unsafe { from_raw_parts(raw.val as *const WireReply, raw.size as usize) };
    children.iter().map(|c| unsafe { Value::decode(c) }).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wire(typ: WireType, val: i64, size: u32) -> WireReply {
        WireReply {
            typ: typ as u32,
            val,
            size,
        }
    }

    #[test]
    fn test_decode_scalars() {
        let cases = [
            (wire(WireType::Null, 0, 0), Value::Nil),
            (wire(WireType::Int, -7, 0), Value::Int(-7)),
            (wire(WireType::Okay, 0, 0), Value::Okay),
            (wire(WireType::Boolean, 1, 0), Value::Boolean(true)),
            (wire(WireType::Boolean, 0, 0), Value::Boolean(false)),
            (
                wire(WireType::Double, 2.5f64.to_bits() as i64, 0),
                Value::Double(2.5),
            ),
        ];
        for (raw, expected) in cases {
            assert_eq!(unsafe { Value::decode(&raw) }.unwrap(), expected);
        }
    }

    #[test]
    fn test_decode_strings() {
        let bytes = b"hello".to_vec();
        let bulk = wire(WireType::BulkString, bytes.as_ptr() as i64, bytes.len() as u32);
        assert_eq!(
            unsafe { Value::decode(&bulk) }.unwrap(),
            Value::BulkString(b"hello".to_vec())
        );

        // Simple strings fold into the same byte-string variant.
        let simple = wire(WireType::SimpleString, bytes.as_ptr() as i64, bytes.len() as u32);
        assert_eq!(
            unsafe { Value::decode(&simple) }.unwrap(),
            Value::BulkString(b"hello".to_vec())
        );

        let empty = wire(WireType::BulkString, 0, 0);
        assert_eq!(
            unsafe { Value::decode(&empty) }.unwrap(),
            Value::BulkString(Vec::new())
        );
    }

    #[test]
    fn test_decode_error_marker() {
        let msg = b"WRONGTYPE bad call".to_vec();
        let raw = wire(WireType::Error, msg.as_ptr() as i64, msg.len() as u32);
        assert_eq!(
            unsafe { Value::decode(&raw) }.unwrap(),
            Value::ServerError("WRONGTYPE bad call".to_string())
        );
    }

    #[test]
    fn test_decode_nested_array() {
        let inner = b"ab".to_vec();
        let children = vec![
            wire(WireType::Int, 1, 0),
            wire(WireType::BulkString, inner.as_ptr() as i64, inner.len() as u32),
        ];
        let raw = wire(WireType::Array, children.as_ptr() as i64, children.len() as u32);
        assert_eq!(
            unsafe { Value::decode(&raw) }.unwrap(),
            Value::Array(vec![Value::Int(1), Value::BulkString(b"ab".to_vec())])
        );
    }

    #[test]
    fn test_decode_map_pairs_up_flat_entries() {
        let key = b"field".to_vec();
        let val = b"value".to_vec();
        let children = vec![
            wire(WireType::BulkString, key.as_ptr() as i64, key.len() as u32),
            wire(WireType::BulkString, val.as_ptr() as i64, val.len() as u32),
        ];
        let raw = wire(WireType::Map, children.as_ptr() as i64, children.len() as u32);
        assert_eq!(
            unsafe { Value::decode(&raw) }.unwrap(),
            Value::Map(vec![(
                Value::BulkString(b"field".to_vec()),
                Value::BulkString(b"value".to_vec())
            )])
        );
    }

    #[test]
    fn test_decode_rejects_odd_map_arity() {
        let children = vec![wire(WireType::Int, 1, 0)];
        let raw = wire(WireType::Map, children.as_ptr() as i64, children.len() as u32);
        assert!(matches!(
            unsafe { Value::decode(&raw) },
            Err(Error::UnexpectedReturnType { .. })
        ));
    }

    #[test]
    fn test_decode_rejects_unknown_tag() {
        let raw = WireReply {
            typ: 77,
            val: 0,
            size: 0,
        };
        assert!(matches!(
            unsafe { Value::decode(&raw) },
            Err(Error::UnexpectedReturnType { .. })
        ));
    }
}
