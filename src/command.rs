//! # Command Representation
//!
//! A [`Command`] is the unit of work sent across the FFI boundary: an
//! operation identifier plus the ordered byte-string arguments in exactly
//! the order the operation's wire grammar expects. Commands are produced by
//! the typed builders in [`crate::builders`], are immutable once built, and
//! are consumed exactly once by the marshaller.

use crate::convert::Responder;

/// Enumerated operation identifiers understood by the native core.
///
/// `Invalid` is a sentinel; the marshaller refuses to dispatch it. The
/// numeric values are part of the ABI shared with the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum RequestType {
    Invalid = 0,

    // Connection management
    Ping = 1,
    Echo = 2,
    Info = 3,
    ClientId = 4,
    ClientGetName = 5,

    // Strings
    Get = 10,
    Set = 11,
    Del = 12,
    Exists = 13,
    MGet = 14,
    MSet = 15,
    Incr = 20,
    IncrBy = 21,
    Decr = 22,
    DecrBy = 23,
    Append = 24,
    Strlen = 25,

    // Generic key management
    Expire = 28,
    Ttl = 29,

    // Hashes
    HSet = 30,
    HGet = 31,
    HGetAll = 32,
    HDel = 33,

    // Lists
    LPush = 40,
    RPush = 41,
    LPop = 42,
    LRange = 43,
    LLen = 44,
    BLPop = 45,

    // Sorted sets
    ZAdd = 50,
    ZPopMin = 51,
    BZPopMin = 52,

    // Streams
    XAdd = 60,
    XTrim = 61,
}

impl RequestType {
    /// Wire-level command name, used for logging and error context.
    pub fn command_name(self) -> &'static str {
        match self {
            RequestType::Invalid => "INVALID",
            RequestType::Ping => "PING",
            RequestType::Echo => "ECHO",
            RequestType::Info => "INFO",
            RequestType::ClientId => "CLIENT ID",
            RequestType::ClientGetName => "CLIENT GETNAME",
            RequestType::Get => "GET",
            RequestType::Set => "SET",
            RequestType::Del => "DEL",
            RequestType::Exists => "EXISTS",
            RequestType::MGet => "MGET",
            RequestType::MSet => "MSET",
            RequestType::Incr => "INCR",
            RequestType::IncrBy => "INCRBY",
            RequestType::Decr => "DECR",
            RequestType::DecrBy => "DECRBY",
            RequestType::Append => "APPEND",
            RequestType::Strlen => "STRLEN",
            RequestType::Expire => "EXPIRE",
            RequestType::Ttl => "TTL",
            RequestType::HSet => "HSET",
            RequestType::HGet => "HGET",
            RequestType::HGetAll => "HGETALL",
            RequestType::HDel => "HDEL",
            RequestType::LPush => "LPUSH",
            RequestType::RPush => "RPUSH",
            RequestType::LPop => "LPOP",
            RequestType::LRange => "LRANGE",
            RequestType::LLen => "LLEN",
            RequestType::BLPop => "BLPOP",
            RequestType::ZAdd => "ZADD",
            RequestType::ZPopMin => "ZPOPMIN",
            RequestType::BZPopMin => "BZPOPMIN",
            RequestType::XAdd => "XADD",
            RequestType::XTrim => "XTRIM",
        }
    }
}

/// An opcode plus its ordered byte-string arguments.
///
/// Argument order is the wire order; nothing downstream is allowed to
/// reorder them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    request: RequestType,
    args: Vec<Vec<u8>>,
}

impl Command {
    /// Create a command with no arguments.
    pub fn new(request: RequestType) -> Self {
        Self {
            request,
            args: Vec::new(),
        }
    }

    /// Append one argument, preserving insertion order.
    pub fn arg<A: Into<Vec<u8>>>(mut self, arg: A) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments at once.
    pub fn args<A: Into<Vec<u8>>, I: IntoIterator<Item = A>>(mut self, args: I) -> Self {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn request(&self) -> RequestType {
        self.request
    }

    pub fn arg_count(&self) -> usize {
        self.args.len()
    }

    pub fn arg_slices(&self) -> &[Vec<u8>] {
        &self.args
    }
}

/// A command with its bound response converter: what a typed builder
/// returns and what [`crate::client::Client::exec`] consumes.
pub struct Prepared<T> {
    pub(crate) command: Command,
    pub(crate) responder: Responder<T>,
}

impl<T> Prepared<T> {
    pub(crate) fn new(command: Command, responder: Responder<T>) -> Self {
        Self { command, responder }
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}
