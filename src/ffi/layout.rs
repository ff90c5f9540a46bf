//! # Fixed C Layouts
//!
//! `#[repr(C)]` structures shared with the native NovaKV core. Every type in
//! this module mirrors a structure the core parses (requests) or produces
//! (replies) byte for byte; field order and widths are part of the ABI and
//! must not change without a matching core release.
//!
//! The request-side structures (`CmdLayout`, `BatchLayout`, `RouteLayout`,
//! `ConnectionConfigLayout`) are only ever built by the marshalling units in
//! [`crate::ffi::marshal`], which own every allocation the pointers here
//! refer to. The reply-side structure (`WireReply`) is built and owned by the
//! native core; this crate copies out of it and then calls the core's free
//! entry point exactly once.

use std::ffi::c_char;

/// Discriminants of [`WireReply::typ`].
///
/// Kept as a plain enum with a `TryFrom<u32>` so that a corrupt or
/// out-of-range tag coming off the wire is a decode error rather than an
/// invalid enum value.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireType {
    Null = 0,
    Int = 1,
    Double = 2,
    Boolean = 3,
    SimpleString = 4,
    Array = 5,
    Map = 6,
    Set = 7,
    BulkString = 8,
    Okay = 9,
    Error = 10,
}

impl TryFrom<u32> for WireType {
    type Error = u32;

    fn try_from(raw: u32) -> std::result::Result<Self, u32> {
        match raw {
            0 => Ok(WireType::Null),
            1 => Ok(WireType::Int),
            2 => Ok(WireType::Double),
            3 => Ok(WireType::Boolean),
            4 => Ok(WireType::SimpleString),
            5 => Ok(WireType::Array),
            6 => Ok(WireType::Map),
            7 => Ok(WireType::Set),
            8 => Ok(WireType::BulkString),
            9 => Ok(WireType::Okay),
            10 => Ok(WireType::Error),
            other => Err(other),
        }
    }
}

/// FFI-safe reply value produced by the native core.
///
/// * For `Null` and `Okay` only `typ` is meaningful.
/// * `Int`, `Double` (bit-cast) and `Boolean` are stored inline in `val`.
/// * For `SimpleString`, `BulkString` and `Error`, `val` holds a pointer to
///   the bytes and `size` the byte length.
/// * For `Array` and `Set`, `val` points to a `WireReply` array of `size`
///   elements; for `Map` the array holds `size` elements laid out as
///   alternating key/value entries (`size` is twice the pair count).
///
/// The pointed-to memory is owned by the native core until
/// `NativeApi::free_reply` is called with the tree's root.
#[repr(C)]
#[derive(Debug, Clone)]
pub struct WireReply {
    pub typ: u32,
    pub val: i64,
    pub size: u32,
}

/// Command request layout: opcode plus two parallel arrays describing the
/// argument byte-strings. The core reads it synchronously during the
/// dispatch call and never retains the pointers afterwards.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct CmdLayout {
    pub request_type: u32,
    pub arg_count: usize,
    /// Pointer to `arg_count` argument byte pointers.
    pub args: *const *const u8,
    /// Pointer to `arg_count` argument byte lengths.
    pub arg_lengths: *const usize,
}

/// Batch request layout: an array of command layout pointers plus the
/// atomicity flag.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct BatchLayout {
    pub cmd_count: usize,
    pub cmds: *const *const CmdLayout,
    pub is_atomic: bool,
}

/// Optional batch execution parameters.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct BatchOptionsLayout {
    pub retry_server_error: bool,
    pub retry_connection_error: bool,
    pub has_timeout: bool,
    pub timeout_ms: u32,
    /// Null when the batch is not routed.
    pub route: *const RouteLayout,
}

/// Discriminants of [`RouteLayout::route_type`].
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteType {
    Random = 0,
    AllNodes = 1,
    AllPrimaries = 2,
    SlotId = 3,
    SlotKey = 4,
    ByAddress = 5,
}

/// Discriminants of [`RouteLayout::slot_type`].
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotTypeTag {
    Primary = 0,
    Replica = 1,
}

/// Route request layout. To avoid extra pointer chasing it carries fields
/// for every route type; which fields are meaningful depends on
/// `route_type`:
///
/// * simple routes fill only `route_type`;
/// * slot-id routes fill `slot_id` and `slot_type`;
/// * slot-key routes fill `slot_key` and `slot_type`;
/// * address routes fill `host` and `port`.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RouteLayout {
    pub route_type: RouteType,
    pub slot_id: i32,
    /// Null unless `route_type` is `SlotKey`.
    pub slot_key: *const c_char,
    pub slot_type: SlotTypeTag,
    /// Null unless `route_type` is `ByAddress`.
    pub host: *const c_char,
    pub port: i32,
}

/// Node address entry inside [`ConnectionConfigLayout`].
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct AddressLayout {
    pub host: *const c_char,
    pub port: u16,
}

/// Read-from strategy entry inside [`ConnectionConfigLayout`].
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct ReadFromLayout {
    pub strategy: u32,
    /// Availability zone, null unless the strategy is AZ-affine.
    pub az: *const c_char,
}

/// Reconnection backoff parameters.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RetryStrategyLayout {
    pub number_of_retries: u32,
    pub factor: u32,
    pub exponent_base: u32,
}

/// Credential entry inside [`ConnectionConfigLayout`].
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct AuthLayout {
    /// Null means no username (default user).
    pub username: *const c_char,
    pub password: *const c_char,
}

/// Subscription lists inside [`ConnectionConfigLayout`]. Channels and
/// patterns are byte spans (pointer + length arrays), not C strings, so
/// names containing NUL bytes survive the crossing.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct PubSubConfigLayout {
    pub channel_count: usize,
    pub channels: *const *const u8,
    pub channel_lengths: *const usize,
    pub pattern_count: usize,
    pub patterns: *const *const u8,
    pub pattern_lengths: *const usize,
    pub sharded_count: usize,
    pub sharded: *const *const u8,
    pub sharded_lengths: *const usize,
}

/// Connection request layout consumed by `NativeApi::create_client`.
///
/// `request_token` keys the establishment completion: the core invokes the
/// result callback with this token and an `Int` reply carrying the new
/// client handle, or the error callback with the same token. The core copies
/// the whole structure (and everything it points to) synchronously during
/// the `create_client` call.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct ConnectionConfigLayout {
    pub request_token: u64,

    pub address_count: usize,
    pub addresses: *const AddressLayout,
    pub cluster_mode: bool,

    pub has_tls: bool,
    pub tls_insecure: bool,

    pub has_request_timeout: bool,
    pub request_timeout_ms: u32,
    pub has_connection_timeout: bool,
    pub connection_timeout_ms: u32,

    pub has_read_from: bool,
    pub read_from: ReadFromLayout,

    pub has_retry_strategy: bool,
    pub retry_strategy: RetryStrategyLayout,

    pub has_auth: bool,
    pub auth: AuthLayout,

    pub database_id: u32,
    pub has_protocol: bool,
    pub protocol: u32,

    /// Null means no client name is set.
    pub client_name: *const c_char,
    pub lazy_connect: bool,

    pub has_pubsub: bool,
    pub pubsub: PubSubConfigLayout,

    pub root_cert_count: usize,
    pub root_certs: *const *const u8,
    pub root_cert_lengths: *const usize,
}

/// Kind of an asynchronous push notification, as reported by the native
/// core's push callback. The numeric values are part of the ABI.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushKind {
    /// Connection-closed notice generated by the core itself.
    Disconnection = 0,
    /// Unknown push notification type.
    Other = 1,
    /// Cache invalidation notice.
    Invalidate = 2,
    /// Regular channel message.
    Message = 3,
    /// Pattern-matched message.
    PMessage = 4,
    /// Sharded channel message.
    SMessage = 5,
    /// Unsubscribe confirmation.
    Unsubscribe = 6,
    /// Pattern unsubscribe confirmation.
    PUnsubscribe = 7,
    /// Sharded unsubscribe confirmation.
    SUnsubscribe = 8,
    /// Subscribe confirmation.
    Subscribe = 9,
    /// Pattern subscribe confirmation.
    PSubscribe = 10,
    /// Sharded subscribe confirmation.
    SSubscribe = 11,
}

impl TryFrom<u32> for PushKind {
    type Error = u32;

    fn try_from(raw: u32) -> std::result::Result<Self, u32> {
        match raw {
            0 => Ok(PushKind::Disconnection),
            1 => Ok(PushKind::Other),
            2 => Ok(PushKind::Invalidate),
            3 => Ok(PushKind::Message),
            4 => Ok(PushKind::PMessage),
            5 => Ok(PushKind::SMessage),
            6 => Ok(PushKind::Unsubscribe),
            7 => Ok(PushKind::PUnsubscribe),
            8 => Ok(PushKind::SUnsubscribe),
            9 => Ok(PushKind::Subscribe),
            10 => Ok(PushKind::PSubscribe),
            11 => Ok(PushKind::SSubscribe),
            other => Err(other),
        }
    }
}

impl PushKind {
    /// Whether the notification carries an application message (as opposed
    /// to a subscription confirmation or a core-generated notice).
    pub fn is_message(self) -> bool {
        matches!(
            self,
            PushKind::Message | PushKind::PMessage | PushKind::SMessage
        )
    }

    /// Whether the notification carries a pattern span.
    pub fn has_pattern(self) -> bool {
        matches!(
            self,
            PushKind::PMessage | PushKind::PSubscribe | PushKind::PUnsubscribe
        )
    }
}

/// Error class reported through the error callback. The numeric values are
/// part of the ABI.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Unspecified = 0,
    ExecAbort = 1,
    Timeout = 2,
    Disconnect = 3,
}

impl From<u32> for ErrorKind {
    fn from(raw: u32) -> Self {
        match raw {
            1 => ErrorKind::ExecAbort,
            2 => ErrorKind::Timeout,
            3 => ErrorKind::Disconnect,
            // An unknown class still carries a usable message; fold it into
            // Unspecified rather than failing the whole error path.
            _ => ErrorKind::Unspecified,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_type_round_trip() {
        for raw in 0u32..=10 {
            let typ = WireType::try_from(raw).unwrap();
            assert_eq!(typ as u32, raw);
        }
        assert!(WireType::try_from(11).is_err());
        assert!(WireType::try_from(u32::MAX).is_err());
    }

    #[test]
    fn test_push_kind_classification() {
        assert!(PushKind::Message.is_message());
        assert!(PushKind::PMessage.is_message());
        assert!(PushKind::SMessage.is_message());
        assert!(!PushKind::Subscribe.is_message());
        assert!(!PushKind::Disconnection.is_message());

        assert!(PushKind::PMessage.has_pattern());
        assert!(!PushKind::Message.has_pattern());
        assert!(PushKind::try_from(42).is_err());
    }

    #[test]
    fn test_error_kind_from_unknown_is_unspecified() {
        assert_eq!(ErrorKind::from(99), ErrorKind::Unspecified);
        assert_eq!(ErrorKind::from(2), ErrorKind::Timeout);
    }
}
