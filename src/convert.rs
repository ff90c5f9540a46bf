//! # Response Conversion
//!
//! [`Responder`] pairs a converter function with the operation's null
//! policy. The dispatch layer feeds it the decoded [`Value`]; the responder
//! routes error markers and nulls according to the declared flags and
//! otherwise hands the payload to the converter, which matches exhaustively
//! over the value union and reports any unexpected shape as an
//! [`Error::UnexpectedReturnType`].
//!
//! Several operations answer with the same logical payload in two shapes
//! depending on the negotiated protocol version: a flat sequence of
//! alternating key/value tokens, or a genuine mapping. [`value_pairs`]
//! normalizes both encodings, and every converter over pair data goes
//! through it, so dual-shape handling is a single, shared branch.

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::ffi::layout::ErrorKind;
use crate::value::Value;

/// Converter plus null policy for one operation's reply.
pub struct Responder<T> {
    expected: &'static str,
    null_value: Option<fn() -> T>,
    handles_null: bool,
    convert: fn(Value) -> Result<T>,
}

impl<T> Responder<T> {
    /// The operation never answers null; a null reply is a protocol
    /// violation.
    pub(crate) fn required(expected: &'static str, convert: fn(Value) -> Result<T>) -> Self {
        Self {
            expected,
            null_value: None,
            handles_null: false,
            convert,
        }
    }

    /// A null reply converts to the typed-null value produced by
    /// `null_value` (never an error).
    pub(crate) fn nullable(
        expected: &'static str,
        null_value: fn() -> T,
        convert: fn(Value) -> Result<T>,
    ) -> Self {
        Self {
            expected,
            null_value: Some(null_value),
            handles_null: false,
            convert,
        }
    }

    /// The converter itself is invoked with [`Value::Nil`] and decides what
    /// null means for this operation.
    #[allow(dead_code)]
    pub(crate) fn null_aware(expected: &'static str, convert: fn(Value) -> Result<T>) -> Self {
        Self {
            expected,
            null_value: None,
            handles_null: true,
            convert,
        }
    }

    /// Apply the null policy and converter to a decoded reply.
    pub(crate) fn apply(&self, reply: Value) -> Result<T> {
        match reply {
            // Error markers pass through unconverted.
            Value::ServerError(message) => Err(Error::server(ErrorKind::Unspecified, message)),
            Value::Nil if self.handles_null => (self.convert)(Value::Nil),
            Value::Nil => match self.null_value {
                Some(null_value) => Ok(null_value()),
                None => Err(Error::unexpected_return_type(self.expected, "null")),
            },
            other => (self.convert)(other),
        }
    }
}

// ---------------------------------------------------------------------------
// Scalar converters
// ---------------------------------------------------------------------------

pub(crate) fn into_unit(value: Value) -> Result<()> {
    match value {
        Value::Okay => Ok(()),
        other => Err(Error::unexpected_return_type("ok", other.kind_name())),
    }
}

pub(crate) fn into_string(value: Value) -> Result<String> {
    match value {
        Value::Okay => Ok("OK".to_string()),
        Value::BulkString(bytes) => String::from_utf8(bytes)
            .map_err(|_| Error::unexpected_return_type("utf-8 string", "non-utf-8 bytes")),
        other => Err(Error::unexpected_return_type("string", other.kind_name())),
    }
}

pub(crate) fn into_bytes(value: Value) -> Result<Vec<u8>> {
    match value {
        Value::BulkString(bytes) => Ok(bytes),
        other => Err(Error::unexpected_return_type("string", other.kind_name())),
    }
}

pub(crate) fn into_i64(value: Value) -> Result<i64> {
    match value {
        Value::Int(n) => Ok(n),
        other => Err(Error::unexpected_return_type("integer", other.kind_name())),
    }
}

/// Doubles arrive natively under the newer protocol and as numeric strings
/// under the older one; both are contractually valid.
pub(crate) fn into_f64(value: Value) -> Result<f64> {
    match value {
        Value::Double(d) => Ok(d),
        Value::Int(n) => Ok(n as f64),
        Value::BulkString(bytes) => {
            let text = std::str::from_utf8(&bytes)
                .map_err(|_| Error::unexpected_return_type("double", "non-utf-8 bytes"))?;
            text.parse::<f64>()
                .map_err(|_| Error::unexpected_return_type("double", format!("string {text:?}")))
        }
        other => Err(Error::unexpected_return_type("double", other.kind_name())),
    }
}

pub(crate) fn into_bool(value: Value) -> Result<bool> {
    match value {
        Value::Boolean(b) => Ok(b),
        Value::Int(0) => Ok(false),
        Value::Int(1) => Ok(true),
        other => Err(Error::unexpected_return_type("boolean", other.kind_name())),
    }
}

// ---------------------------------------------------------------------------
// Option-wrapping converters for nullable operations
// ---------------------------------------------------------------------------

pub(crate) fn into_some_string(value: Value) -> Result<Option<String>> {
    into_string(value).map(Some)
}

pub(crate) fn into_some_bytes(value: Value) -> Result<Option<Vec<u8>>> {
    into_bytes(value).map(Some)
}

pub(crate) fn into_some_string_array(value: Value) -> Result<Option<Vec<String>>> {
    into_string_array(value).map(Some)
}

// ---------------------------------------------------------------------------
// Sequence converters
// ---------------------------------------------------------------------------

pub(crate) fn into_string_array(value: Value) -> Result<Vec<String>> {
    match value {
        Value::Array(items) => items.into_iter().map(into_string).collect(),
        other => Err(Error::unexpected_return_type("array", other.kind_name())),
    }
}

/// Per-element nullable array, e.g. an MGET reply.
pub(crate) fn into_optional_string_array(value: Value) -> Result<Vec<Option<String>>> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::Nil => Ok(None),
                other => into_string(other).map(Some),
            })
            .collect(),
        other => Err(Error::unexpected_return_type("array", other.kind_name())),
    }
}

// ---------------------------------------------------------------------------
// Dual-shape normalization
// ---------------------------------------------------------------------------

/// Normalize a pair-shaped reply into key/value pairs regardless of whether
/// the core delivered a genuine mapping or a flat alternating sequence.
pub(crate) fn value_pairs(value: Value) -> Result<Vec<(Value, Value)>> {
    match value {
        Value::Map(pairs) => Ok(pairs),
        Value::Array(items) => {
            if items.len() % 2 != 0 {
                return Err(Error::unexpected_return_type(
                    "field-value pairs",
                    format!("array of {} elements", items.len()),
                ));
            }
            let mut pairs = Vec::with_capacity(items.len() / 2);
            let mut iter = items.into_iter();
            while let (Some(key), Some(val)) = (iter.next(), iter.next()) {
                pairs.push((key, val));
            }
            Ok(pairs)
        }
        other => Err(Error::unexpected_return_type(
            "field-value pairs",
            other.kind_name(),
        )),
    }
}

/// Hash field listing (HGETALL and friends).
pub(crate) fn into_string_map(value: Value) -> Result<HashMap<String, String>> {
    value_pairs(value)?
        .into_iter()
        .map(|(k, v)| Ok((into_string(k)?, into_string(v)?)))
        .collect()
}

/// Member/score listing (sorted-set pops).
pub(crate) fn into_scored_members(value: Value) -> Result<Vec<(String, f64)>> {
    value_pairs(value)?
        .into_iter()
        .map(|(member, score)| Ok((into_string(member)?, into_f64(score)?)))
        .collect()
}

// ---------------------------------------------------------------------------
// Blocking-pop converters
// ---------------------------------------------------------------------------

/// A `[source key, value]` pop reply. Null never reaches this converter
/// (the responder's null policy maps it to the empty sentinel first); a
/// non-null reply of any other arity is a protocol violation.
pub(crate) fn into_key_value_pop(value: Value) -> Result<Option<(String, String)>> {
    match value {
        Value::Array(items) => {
            if items.len() != 2 {
                return Err(Error::unexpected_return_type(
                    "[key, value] pair",
                    format!("array of {} elements", items.len()),
                ));
            }
            let mut iter = items.into_iter();
            let key = into_string(iter.next().unwrap_or(Value::Nil))?;
            let val = into_string(iter.next().unwrap_or(Value::Nil))?;
            Ok(Some((key, val)))
        }
        other => Err(Error::unexpected_return_type(
            "[key, value] pair",
            other.kind_name(),
        )),
    }
}

/// A `[source key, member, score]` pop reply, same contract as
/// [`into_key_value_pop`].
pub(crate) fn into_scored_pop(value: Value) -> Result<Option<(String, String, f64)>> {
    match value {
        Value::Array(items) => {
            if items.len() != 3 {
                return Err(Error::unexpected_return_type(
                    "[key, member, score] triple",
                    format!("array of {} elements", items.len()),
                ));
            }
            let mut iter = items.into_iter();
            let key = into_string(iter.next().unwrap_or(Value::Nil))?;
            let member = into_string(iter.next().unwrap_or(Value::Nil))?;
            let score = into_f64(iter.next().unwrap_or(Value::Nil))?;
            Ok(Some((key, member, score)))
        }
        other => Err(Error::unexpected_return_type(
            "[key, member, score] triple",
            other.kind_name(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bulk(text: &str) -> Value {
        Value::BulkString(text.as_bytes().to_vec())
    }

    #[test]
    fn test_nullable_returns_typed_null() {
        let responder = Responder::nullable("string", || None, into_some_string);
        assert_eq!(responder.apply(Value::Nil).unwrap(), None);
        assert_eq!(
            responder.apply(bulk("hello")).unwrap(),
            Some("hello".to_string())
        );
    }

    #[test]
    fn test_required_rejects_null() {
        let responder = Responder::required("integer", into_i64);
        assert!(matches!(
            responder.apply(Value::Nil),
            Err(Error::UnexpectedReturnType { .. })
        ));
        assert_eq!(responder.apply(Value::Int(3)).unwrap(), 3);
    }

    #[test]
    fn test_null_aware_converter_sees_null() {
        fn count_or_zero(value: Value) -> Result<i64> {
            match value {
                Value::Nil => Ok(0),
                other => into_i64(other),
            }
        }
        let responder = Responder::null_aware("integer", count_or_zero);
        assert_eq!(responder.apply(Value::Nil).unwrap(), 0);
        assert_eq!(responder.apply(Value::Int(4)).unwrap(), 4);
    }

    #[test]
    fn test_error_marker_passes_through() {
        let responder = Responder::required("integer", into_i64);
        let err = responder
            .apply(Value::ServerError("MOVED 1234".to_string()))
            .unwrap_err();
        assert!(matches!(err, Error::Server { .. }));
        assert!(err.to_string().contains("MOVED 1234"));
    }

    #[test]
    fn test_type_mismatch_names_expected_and_actual() {
        let err = into_i64(bulk("nope")).unwrap_err();
        match err {
            Error::UnexpectedReturnType { expected, actual } => {
                assert_eq!(expected, "integer");
                assert_eq!(actual, "string");
            }
            other => panic!("wrong error: {other:?}"),
        }
    }

    #[test]
    fn test_dual_shape_map_equals_flat_array() {
        let as_map = Value::Map(vec![
            (bulk("f1"), bulk("v1")),
            (bulk("f2"), bulk("v2")),
        ]);
        let as_array = Value::Array(vec![bulk("f1"), bulk("v1"), bulk("f2"), bulk("v2")]);

        let from_map = into_string_map(as_map).unwrap();
        let from_array = into_string_map(as_array).unwrap();
        assert_eq!(from_map, from_array);
        assert_eq!(from_map.get("f2"), Some(&"v2".to_string()));
    }

    #[test]
    fn test_dual_shape_scored_members() {
        let as_map = Value::Map(vec![(bulk("m"), Value::Double(1.5))]);
        let as_array = Value::Array(vec![bulk("m"), bulk("1.5")]);
        assert_eq!(
            into_scored_members(as_map).unwrap(),
            into_scored_members(as_array).unwrap()
        );
    }

    #[test]
    fn test_flat_pairs_reject_odd_arity() {
        let odd = Value::Array(vec![bulk("f1"), bulk("v1"), bulk("orphan")]);
        assert!(matches!(
            value_pairs(odd),
            Err(Error::UnexpectedReturnType { .. })
        ));
    }

    #[test]
    fn test_pop_arity_is_checked() {
        let wrong = Value::Array(vec![bulk("only-key")]);
        assert!(matches!(
            into_key_value_pop(wrong),
            Err(Error::UnexpectedReturnType { .. })
        ));

        let ok = Value::Array(vec![bulk("list"), bulk("item")]);
        assert_eq!(
            into_key_value_pop(ok).unwrap(),
            Some(("list".to_string(), "item".to_string()))
        );

        let triple = Value::Array(vec![bulk("zset"), bulk("member"), bulk("0.25")]);
        assert_eq!(
            into_scored_pop(triple).unwrap(),
            Some(("zset".to_string(), "member".to_string(), 0.25))
        );
    }

    #[test]
    fn test_optional_string_array_keeps_holes() {
        let reply = Value::Array(vec![bulk("a"), Value::Nil, bulk("c")]);
        assert_eq!(
            into_optional_string_array(reply).unwrap(),
            vec![Some("a".to_string()), None, Some("c".to_string())]
        );
    }

    #[test]
    fn test_into_f64_accepts_both_protocol_encodings() {
        assert_eq!(into_f64(Value::Double(2.5)).unwrap(), 2.5);
        assert_eq!(into_f64(bulk("2.5")).unwrap(), 2.5);
        assert_eq!(into_f64(Value::Int(2)).unwrap(), 2.0);
        assert!(into_f64(bulk("not-a-number")).is_err());
    }
}
