//! # Command Builders
//!
//! Typed entry points that turn validated, high-level arguments into a
//! [`Prepared`] command: the exact byte-token sequence the operation's wire
//! grammar expects plus the response converter matching its reply grammar.
//! Optional keyword tokens are emitted only when the corresponding option
//! is non-default.
//!
//! Invalid inputs (empty key lists, mutually exclusive options set
//! together, a count clause on an exact trim) fail here, synchronously,
//! before anything touches the foreign boundary.

use std::collections::HashMap;

use crate::command::{Command, Prepared, RequestType};
use crate::convert::{
    into_bool, into_i64, into_key_value_pop, into_optional_string_array, into_scored_members,
    into_scored_pop, into_some_bytes, into_some_string, into_some_string_array, into_string,
    into_string_array, into_string_map, into_unit, Responder,
};
use crate::error::{Error, Result};

fn check_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(Error::invalid_parameter("key cannot be empty"));
    }
    Ok(())
}

fn check_keys(keys: &[&str]) -> Result<()> {
    if keys.is_empty() {
        return Err(Error::invalid_parameter("at least one key is required"));
    }
    for key in keys {
        check_key(key)?;
    }
    Ok(())
}

fn int_arg(n: i64) -> Vec<u8> {
    n.to_string().into_bytes()
}

fn uint_arg(n: u64) -> Vec<u8> {
    n.to_string().into_bytes()
}

fn float_arg(f: f64) -> Vec<u8> {
    format!("{f}").into_bytes()
}

// ---------------------------------------------------------------------------
// Connection management
// ---------------------------------------------------------------------------

pub fn ping() -> Prepared<String> {
    Prepared::new(
        Command::new(RequestType::Ping),
        Responder::required("string", into_string),
    )
}

pub fn echo(message: &str) -> Prepared<String> {
    Prepared::new(
        Command::new(RequestType::Echo).arg(message),
        Responder::required("string", into_string),
    )
}

pub fn info() -> Prepared<String> {
    Prepared::new(
        Command::new(RequestType::Info),
        Responder::required("string", into_string),
    )
}

pub fn client_id() -> Prepared<i64> {
    Prepared::new(
        Command::new(RequestType::ClientId),
        Responder::required("integer", into_i64),
    )
}

/// The connection name, or None when none was set.
pub fn client_getname() -> Prepared<Option<String>> {
    Prepared::new(
        Command::new(RequestType::ClientGetName),
        Responder::nullable("string", || None, into_some_string),
    )
}

// ---------------------------------------------------------------------------
// Strings
// ---------------------------------------------------------------------------

pub fn get(key: &str) -> Result<Prepared<Option<String>>> {
    check_key(key)?;
    Ok(Prepared::new(
        Command::new(RequestType::Get).arg(key),
        Responder::nullable("string", || None, into_some_string),
    ))
}

/// Binary-safe variant of [`get`].
pub fn get_bytes(key: &str) -> Result<Prepared<Option<Vec<u8>>>> {
    check_key(key)?;
    Ok(Prepared::new(
        Command::new(RequestType::Get).arg(key),
        Responder::nullable("string", || None, into_some_bytes),
    ))
}

pub fn set(key: &str, value: &str) -> Result<Prepared<()>> {
    check_key(key)?;
    Ok(Prepared::new(
        Command::new(RequestType::Set).arg(key).arg(value),
        Responder::required("ok", into_unit),
    ))
}

/// Binary-safe variant of [`set`].
pub fn set_bytes(key: &str, value: &[u8]) -> Result<Prepared<()>> {
    check_key(key)?;
    Ok(Prepared::new(
        Command::new(RequestType::Set).arg(key).arg(value.to_vec()),
        Responder::required("ok", into_unit),
    ))
}

/// Write condition for [`set_with_options`] and [`ZAddOptions`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetCondition {
    /// Only write when the key/member does not exist yet
    OnlyIfNotExists,
    /// Only write when the key/member already exists
    OnlyIfExists,
}

/// Expiry clause for [`set_with_options`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    Seconds(u64),
    Milliseconds(u64),
    UnixSeconds(u64),
    UnixMilliseconds(u64),
    /// Keep whatever time-to-live the key already has
    KeepExisting,
}

/// Options for the conditional/expiring SET variant.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SetOptions {
    pub condition: Option<SetCondition>,
    pub expiry: Option<Expiry>,
    /// Return the previous value of the key instead of an acknowledgement
    pub return_old_value: bool,
}

/// SET with conditions and expiry. The reply is None when a condition
/// prevented the write, or the old value when `return_old_value` was set;
/// a plain acknowledgement surfaces as `Some("OK")`.
pub fn set_with_options(
    key: &str,
    value: &str,
    options: SetOptions,
) -> Result<Prepared<Option<String>>> {
    check_key(key)?;
    let mut command = Command::new(RequestType::Set).arg(key).arg(value);
    match options.condition {
        Some(SetCondition::OnlyIfNotExists) => command = command.arg("NX"),
        Some(SetCondition::OnlyIfExists) => command = command.arg("XX"),
        None => {}
    }
    if options.return_old_value {
        command = command.arg("GET");
    }
    match options.expiry {
        Some(Expiry::Seconds(secs)) => command = command.arg("EX").arg(uint_arg(secs)),
        Some(Expiry::Milliseconds(ms)) => command = command.arg("PX").arg(uint_arg(ms)),
        Some(Expiry::UnixSeconds(at)) => command = command.arg("EXAT").arg(uint_arg(at)),
        Some(Expiry::UnixMilliseconds(at)) => command = command.arg("PXAT").arg(uint_arg(at)),
        Some(Expiry::KeepExisting) => command = command.arg("KEEPTTL"),
        None => {}
    }
    Ok(Prepared::new(
        command,
        Responder::nullable("string", || None, into_some_string),
    ))
}

/// Number of keys actually removed, independent of how many were named.
pub fn del(keys: &[&str]) -> Result<Prepared<i64>> {
    check_keys(keys)?;
    Ok(Prepared::new(
        Command::new(RequestType::Del).args(keys.iter().copied()),
        Responder::required("integer", into_i64),
    ))
}

pub fn exists(keys: &[&str]) -> Result<Prepared<i64>> {
    check_keys(keys)?;
    Ok(Prepared::new(
        Command::new(RequestType::Exists).args(keys.iter().copied()),
        Responder::required("integer", into_i64),
    ))
}

/// Per-key nullable multi-get; missing keys come back as None in place.
pub fn mget(keys: &[&str]) -> Result<Prepared<Vec<Option<String>>>> {
    check_keys(keys)?;
    Ok(Prepared::new(
        Command::new(RequestType::MGet).args(keys.iter().copied()),
        Responder::required("array", into_optional_string_array),
    ))
}

pub fn mset(pairs: &[(&str, &str)]) -> Result<Prepared<()>> {
    if pairs.is_empty() {
        return Err(Error::invalid_parameter("at least one pair is required"));
    }
    let mut command = Command::new(RequestType::MSet);
    for (key, value) in pairs {
        check_key(key)?;
        command = command.arg(*key).arg(*value);
    }
    Ok(Prepared::new(command, Responder::required("ok", into_unit)))
}

pub fn incr(key: &str) -> Result<Prepared<i64>> {
    check_key(key)?;
    Ok(Prepared::new(
        Command::new(RequestType::Incr).arg(key),
        Responder::required("integer", into_i64),
    ))
}

pub fn incr_by(key: &str, delta: i64) -> Result<Prepared<i64>> {
    check_key(key)?;
    Ok(Prepared::new(
        Command::new(RequestType::IncrBy).arg(key).arg(int_arg(delta)),
        Responder::required("integer", into_i64),
    ))
}

pub fn decr(key: &str) -> Result<Prepared<i64>> {
    check_key(key)?;
    Ok(Prepared::new(
        Command::new(RequestType::Decr).arg(key),
        Responder::required("integer", into_i64),
    ))
}

pub fn decr_by(key: &str, delta: i64) -> Result<Prepared<i64>> {
    check_key(key)?;
    Ok(Prepared::new(
        Command::new(RequestType::DecrBy).arg(key).arg(int_arg(delta)),
        Responder::required("integer", into_i64),
    ))
}

/// Length of the value after the append.
pub fn append(key: &str, value: &str) -> Result<Prepared<i64>> {
    check_key(key)?;
    Ok(Prepared::new(
        Command::new(RequestType::Append).arg(key).arg(value),
        Responder::required("integer", into_i64),
    ))
}

pub fn strlen(key: &str) -> Result<Prepared<i64>> {
    check_key(key)?;
    Ok(Prepared::new(
        Command::new(RequestType::Strlen).arg(key),
        Responder::required("integer", into_i64),
    ))
}

/// Whether a timeout was set (false when the key does not exist).
pub fn expire(key: &str, seconds: i64) -> Result<Prepared<bool>> {
    check_key(key)?;
    Ok(Prepared::new(
        Command::new(RequestType::Expire).arg(key).arg(int_arg(seconds)),
        Responder::required("boolean", into_bool),
    ))
}

pub fn ttl(key: &str) -> Result<Prepared<i64>> {
    check_key(key)?;
    Ok(Prepared::new(
        Command::new(RequestType::Ttl).arg(key),
        Responder::required("integer", into_i64),
    ))
}

// ---------------------------------------------------------------------------
// Hashes
// ---------------------------------------------------------------------------

/// Number of fields newly added.
pub fn hset(key: &str, fields: &[(&str, &str)]) -> Result<Prepared<i64>> {
    check_key(key)?;
    if fields.is_empty() {
        return Err(Error::invalid_parameter("at least one field is required"));
    }
    let mut command = Command::new(RequestType::HSet).arg(key);
    for (field, value) in fields {
        command = command.arg(*field).arg(*value);
    }
    Ok(Prepared::new(
        command,
        Responder::required("integer", into_i64),
    ))
}

pub fn hget(key: &str, field: &str) -> Result<Prepared<Option<String>>> {
    check_key(key)?;
    Ok(Prepared::new(
        Command::new(RequestType::HGet).arg(key).arg(field),
        Responder::nullable("string", || None, into_some_string),
    ))
}

/// Every field of the hash. The reply arrives as a flat field/value
/// sequence or as a genuine mapping depending on the negotiated protocol;
/// both normalize to the same map.
pub fn hgetall(key: &str) -> Result<Prepared<HashMap<String, String>>> {
    check_key(key)?;
    Ok(Prepared::new(
        Command::new(RequestType::HGetAll).arg(key),
        Responder::required("field-value pairs", into_string_map),
    ))
}

pub fn hdel(key: &str, fields: &[&str]) -> Result<Prepared<i64>> {
    check_key(key)?;
    if fields.is_empty() {
        return Err(Error::invalid_parameter("at least one field is required"));
    }
    Ok(Prepared::new(
        Command::new(RequestType::HDel).arg(key).args(fields.iter().copied()),
        Responder::required("integer", into_i64),
    ))
}

// ---------------------------------------------------------------------------
// Lists
// ---------------------------------------------------------------------------

/// List length after the push.
pub fn lpush(key: &str, values: &[&str]) -> Result<Prepared<i64>> {
    check_key(key)?;
    if values.is_empty() {
        return Err(Error::invalid_parameter("at least one value is required"));
    }
    Ok(Prepared::new(
        Command::new(RequestType::LPush).arg(key).args(values.iter().copied()),
        Responder::required("integer", into_i64),
    ))
}

/// List length after the push.
pub fn rpush(key: &str, values: &[&str]) -> Result<Prepared<i64>> {
    check_key(key)?;
    if values.is_empty() {
        return Err(Error::invalid_parameter("at least one value is required"));
    }
    Ok(Prepared::new(
        Command::new(RequestType::RPush).arg(key).args(values.iter().copied()),
        Responder::required("integer", into_i64),
    ))
}

pub fn lpop(key: &str) -> Result<Prepared<Option<String>>> {
    check_key(key)?;
    Ok(Prepared::new(
        Command::new(RequestType::LPop).arg(key),
        Responder::nullable("string", || None, into_some_string),
    ))
}

/// Pop up to `count` elements; the count token changes the reply shape to
/// an array.
pub fn lpop_count(key: &str, count: u64) -> Result<Prepared<Option<Vec<String>>>> {
    check_key(key)?;
    Ok(Prepared::new(
        Command::new(RequestType::LPop).arg(key).arg(uint_arg(count)),
        Responder::nullable("array", || None, into_some_string_array),
    ))
}

pub fn lrange(key: &str, start: i64, stop: i64) -> Result<Prepared<Vec<String>>> {
    check_key(key)?;
    Ok(Prepared::new(
        Command::new(RequestType::LRange)
            .arg(key)
            .arg(int_arg(start))
            .arg(int_arg(stop)),
        Responder::required("array", into_string_array),
    ))
}

pub fn llen(key: &str) -> Result<Prepared<i64>> {
    check_key(key)?;
    Ok(Prepared::new(
        Command::new(RequestType::LLen).arg(key),
        Responder::required("integer", into_i64),
    ))
}

/// Blocking left pop over several lists. A null reply means nothing became
/// available before the timeout and converts to None, never an error.
pub fn blpop(keys: &[&str], timeout_secs: f64) -> Result<Prepared<Option<(String, String)>>> {
    check_keys(keys)?;
    if !timeout_secs.is_finite() || timeout_secs < 0.0 {
        return Err(Error::invalid_parameter(
            "timeout must be a non-negative number of seconds",
        ));
    }
    Ok(Prepared::new(
        Command::new(RequestType::BLPop)
            .args(keys.iter().copied())
            .arg(float_arg(timeout_secs)),
        Responder::nullable("[key, value] pair", || None, into_key_value_pop),
    ))
}

// ---------------------------------------------------------------------------
// Sorted sets
// ---------------------------------------------------------------------------

/// Score update restriction for [`ZAddOptions`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateComparison {
    /// Only update when the new score is greater than the current one
    GreaterThan,
    /// Only update when the new score is less than the current one
    LessThan,
}

/// Options for [`zadd`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ZAddOptions {
    pub condition: Option<SetCondition>,
    pub comparison: Option<UpdateComparison>,
    /// Count changed members instead of only newly added ones
    pub changed: bool,
}

/// Add members with scores. GT/LT only restrict updates of existing
/// members, so they cannot be combined with the not-exists condition.
pub fn zadd(
    key: &str,
    members: &[(f64, &str)],
    options: ZAddOptions,
) -> Result<Prepared<i64>> {
    check_key(key)?;
    if members.is_empty() {
        return Err(Error::invalid_parameter("at least one member is required"));
    }
    if options.comparison.is_some() && options.condition == Some(SetCondition::OnlyIfNotExists) {
        return Err(Error::invalid_parameter(
            "GT/LT cannot be combined with the only-if-not-exists condition",
        ));
    }

    let mut command = Command::new(RequestType::ZAdd).arg(key);
    match options.condition {
        Some(SetCondition::OnlyIfNotExists) => command = command.arg("NX"),
        Some(SetCondition::OnlyIfExists) => command = command.arg("XX"),
        None => {}
    }
    match options.comparison {
        Some(UpdateComparison::GreaterThan) => command = command.arg("GT"),
        Some(UpdateComparison::LessThan) => command = command.arg("LT"),
        None => {}
    }
    if options.changed {
        command = command.arg("CH");
    }
    for (score, member) in members {
        command = command.arg(float_arg(*score)).arg(*member);
    }
    Ok(Prepared::new(
        command,
        Responder::required("integer", into_i64),
    ))
}

/// Pop up to `count` lowest-scoring members. Dual-shape reply: flat
/// member/score tokens or a mapping, depending on the protocol.
pub fn zpopmin(key: &str, count: u64) -> Result<Prepared<Vec<(String, f64)>>> {
    check_key(key)?;
    let mut command = Command::new(RequestType::ZPopMin).arg(key);
    if count != 1 {
        command = command.arg(uint_arg(count));
    }
    Ok(Prepared::new(
        command,
        Responder::required("member-score pairs", into_scored_members),
    ))
}

/// Blocking minimum pop over several sorted sets. Null converts to None;
/// a non-null reply must be the `[key, member, score]` triple.
pub fn bzpopmin(
    keys: &[&str],
    timeout_secs: f64,
) -> Result<Prepared<Option<(String, String, f64)>>> {
    check_keys(keys)?;
    if !timeout_secs.is_finite() || timeout_secs < 0.0 {
        return Err(Error::invalid_parameter(
            "timeout must be a non-negative number of seconds",
        ));
    }
    Ok(Prepared::new(
        Command::new(RequestType::BZPopMin)
            .args(keys.iter().copied())
            .arg(float_arg(timeout_secs)),
        Responder::nullable("[key, member, score] triple", || None, into_scored_pop),
    ))
}

// ---------------------------------------------------------------------------
// Streams
// ---------------------------------------------------------------------------

/// Append an entry; returns the assigned entry id. Use `"*"` to let the
/// server pick the id.
pub fn xadd(key: &str, id: &str, fields: &[(&str, &str)]) -> Result<Prepared<String>> {
    check_key(key)?;
    if fields.is_empty() {
        return Err(Error::invalid_parameter("at least one field is required"));
    }
    let mut command = Command::new(RequestType::XAdd).arg(key).arg(id);
    for (field, value) in fields {
        command = command.arg(*field).arg(*value);
    }
    Ok(Prepared::new(
        command,
        Responder::required("string", into_string),
    ))
}

/// What to trim a stream by.
#[derive(Debug, Clone, PartialEq)]
pub enum TrimBy {
    /// Keep at most this many entries
    MaxLen(u64),
    /// Drop entries with ids below this one
    MinId(String),
}

/// Options for [`xtrim`].
#[derive(Debug, Clone, PartialEq)]
pub struct TrimOptions {
    pub by: TrimBy,
    /// Exact trimming; approximate lets the server round to whole nodes
    pub exact: bool,
    /// Cap the number of entries evicted in one call
    pub limit: Option<u64>,
}

/// Trim a stream; returns the number of entries removed. The eviction
/// limit only exists for approximate trimming.
pub fn xtrim(key: &str, options: TrimOptions) -> Result<Prepared<i64>> {
    check_key(key)?;
    if options.limit.is_some() && options.exact {
        return Err(Error::invalid_parameter(
            "an eviction limit requires approximate trimming",
        ));
    }

    let mut command = Command::new(RequestType::XTrim).arg(key);
    command = match &options.by {
        TrimBy::MaxLen(_) => command.arg("MAXLEN"),
        TrimBy::MinId(_) => command.arg("MINID"),
    };
    if !options.exact {
        command = command.arg("~");
    }
    command = match options.by {
        TrimBy::MaxLen(threshold) => command.arg(uint_arg(threshold)),
        TrimBy::MinId(id) => command.arg(id),
    };
    if let Some(limit) = options.limit {
        command = command.arg("LIMIT").arg(uint_arg(limit));
    }
    Ok(Prepared::new(
        command,
        Responder::required("integer", into_i64),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args_of<T>(prepared: &Prepared<T>) -> Vec<&[u8]> {
        prepared
            .command()
            .arg_slices()
            .iter()
            .map(|a| a.as_slice())
            .collect()
    }

    #[test]
    fn test_get_token_sequence() {
        let prepared = get("user:1").unwrap();
        assert_eq!(prepared.command().request(), RequestType::Get);
        assert_eq!(args_of(&prepared), vec![b"user:1".as_slice()]);
    }

    #[test]
    fn test_empty_key_is_rejected_before_dispatch() {
        assert!(matches!(get(""), Err(Error::InvalidParameter { .. })));
        assert!(matches!(del(&[]), Err(Error::InvalidParameter { .. })));
        assert!(matches!(
            del(&["ok", ""]),
            Err(Error::InvalidParameter { .. })
        ));
        assert!(matches!(mset(&[]), Err(Error::InvalidParameter { .. })));
        assert!(matches!(
            hset("h", &[]),
            Err(Error::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_plain_set_emits_no_optional_tokens() {
        let prepared = set("k", "v").unwrap();
        assert_eq!(args_of(&prepared), vec![b"k".as_slice(), b"v".as_slice()]);
    }

    #[test]
    fn test_set_options_emit_tokens_in_grammar_order() {
        let prepared = set_with_options(
            "k",
            "v",
            SetOptions {
                condition: Some(SetCondition::OnlyIfNotExists),
                expiry: Some(Expiry::Seconds(30)),
                return_old_value: true,
            },
        )
        .unwrap();
        assert_eq!(
            args_of(&prepared),
            vec![
                b"k".as_slice(),
                b"v".as_slice(),
                b"NX".as_slice(),
                b"GET".as_slice(),
                b"EX".as_slice(),
                b"30".as_slice(),
            ]
        );
    }

    #[test]
    fn test_set_keepttl_token() {
        let prepared = set_with_options(
            "k",
            "v",
            SetOptions {
                expiry: Some(Expiry::KeepExisting),
                ..SetOptions::default()
            },
        )
        .unwrap();
        assert_eq!(
            args_of(&prepared),
            vec![b"k".as_slice(), b"v".as_slice(), b"KEEPTTL".as_slice()]
        );
    }

    #[test]
    fn test_del_takes_every_key_in_order() {
        let prepared = del(&["a", "b", "c"]).unwrap();
        assert_eq!(prepared.command().request(), RequestType::Del);
        assert_eq!(
            args_of(&prepared),
            vec![b"a".as_slice(), b"b".as_slice(), b"c".as_slice()]
        );
    }

    #[test]
    fn test_blpop_appends_timeout_last() {
        let prepared = blpop(&["q1", "q2"], 0.5).unwrap();
        assert_eq!(
            args_of(&prepared),
            vec![b"q1".as_slice(), b"q2".as_slice(), b"0.5".as_slice()]
        );
    }

    #[test]
    fn test_blpop_rejects_bad_timeouts() {
        assert!(matches!(
            blpop(&["q"], -1.0),
            Err(Error::InvalidParameter { .. })
        ));
        assert!(matches!(
            blpop(&["q"], f64::NAN),
            Err(Error::InvalidParameter { .. })
        ));
        assert!(matches!(
            blpop(&["q"], f64::INFINITY),
            Err(Error::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_zadd_rejects_nx_with_comparison() {
        let options = ZAddOptions {
            condition: Some(SetCondition::OnlyIfNotExists),
            comparison: Some(UpdateComparison::GreaterThan),
            changed: false,
        };
        assert!(matches!(
            zadd("z", &[(1.0, "m")], options),
            Err(Error::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_zadd_token_order() {
        let options = ZAddOptions {
            condition: Some(SetCondition::OnlyIfExists),
            comparison: Some(UpdateComparison::GreaterThan),
            changed: true,
        };
        let prepared = zadd("z", &[(1.5, "m1"), (2.0, "m2")], options).unwrap();
        assert_eq!(
            args_of(&prepared),
            vec![
                b"z".as_slice(),
                b"XX".as_slice(),
                b"GT".as_slice(),
                b"CH".as_slice(),
                b"1.5".as_slice(),
                b"m1".as_slice(),
                b"2".as_slice(),
                b"m2".as_slice(),
            ]
        );
    }

    #[test]
    fn test_zpopmin_count_token_only_when_non_default() {
        let single = zpopmin("z", 1).unwrap();
        assert_eq!(args_of(&single), vec![b"z".as_slice()]);

        let several = zpopmin("z", 3).unwrap();
        assert_eq!(args_of(&several), vec![b"z".as_slice(), b"3".as_slice()]);
    }

    #[test]
    fn test_xtrim_exact_maxlen() {
        let prepared = xtrim(
            "s",
            TrimOptions {
                by: TrimBy::MaxLen(1000),
                exact: true,
                limit: None,
            },
        )
        .unwrap();
        assert_eq!(
            args_of(&prepared),
            vec![b"s".as_slice(), b"MAXLEN".as_slice(), b"1000".as_slice()]
        );
    }

    #[test]
    fn test_xtrim_approximate_minid_with_limit() {
        let prepared = xtrim(
            "s",
            TrimOptions {
                by: TrimBy::MinId("1111-0".to_string()),
                exact: false,
                limit: Some(100),
            },
        )
        .unwrap();
        assert_eq!(
            args_of(&prepared),
            vec![
                b"s".as_slice(),
                b"MINID".as_slice(),
                b"~".as_slice(),
                b"1111-0".as_slice(),
                b"LIMIT".as_slice(),
                b"100".as_slice(),
            ]
        );
    }

    #[test]
    fn test_xtrim_limit_requires_approximate() {
        let result = xtrim(
            "s",
            TrimOptions {
                by: TrimBy::MaxLen(10),
                exact: true,
                limit: Some(5),
            },
        );
        assert!(matches!(result, Err(Error::InvalidParameter { .. })));
    }

    #[test]
    fn test_null_policy_is_bound_per_operation() {
        use crate::value::Value;

        // Nullable operations map null to the typed-null sentinel.
        assert_eq!(
            client_getname().responder.apply(Value::Nil).unwrap(),
            None
        );
        assert_eq!(
            bzpopmin(&["z"], 0.0).unwrap().responder.apply(Value::Nil).unwrap(),
            None
        );

        // Non-nullable operations treat null as a protocol violation.
        assert!(matches!(
            del(&["k"]).unwrap().responder.apply(Value::Nil),
            Err(Error::UnexpectedReturnType { .. })
        ));
    }

    #[test]
    fn test_hset_flattens_field_value_pairs() {
        let prepared = hset("h", &[("f1", "v1"), ("f2", "v2")]).unwrap();
        assert_eq!(
            args_of(&prepared),
            vec![
                b"h".as_slice(),
                b"f1".as_slice(),
                b"v1".as_slice(),
                b"f2".as_slice(),
                b"v2".as_slice(),
            ]
        );
    }
}
