//! Error types for NovaKV client operations

use thiserror::Error;

use crate::ffi::layout::ErrorKind;

/// Result type alias for NovaKV client operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types surfaced by the NovaKV client binding
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid argument or option combination, rejected before any foreign call
    #[error("Invalid parameter: {message}")]
    InvalidParameter { message: String },

    /// Reply shape or dynamic type did not match what the operation contract
    /// guarantees; indicates a core/binding version mismatch or a defect
    #[error("Unexpected return type: expected {expected}, got {actual}")]
    UnexpectedReturnType { expected: String, actual: String },

    /// Failure while building the foreign-memory representation of a request
    #[error("Marshalling error: {message}")]
    Marshal { message: String },

    /// Error reported by the native core or the server
    #[error("Server error ({kind:?}): {message}")]
    Server { kind: ErrorKind, message: String },

    /// Connection-related errors
    #[error("Connection error: {message}")]
    Connection { message: String },

    /// The client was closed before or during the operation
    #[error("Client is closed")]
    ClientClosed,
}

impl Error {
    /// Create an invalid parameter error
    pub fn invalid_parameter<S: Into<String>>(msg: S) -> Self {
        Error::InvalidParameter {
            message: msg.into(),
        }
    }

    /// Create an unexpected return type error
    pub fn unexpected_return_type<E: Into<String>, A: Into<String>>(
        expected: E,
        actual: A,
    ) -> Self {
        Error::UnexpectedReturnType {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create a marshalling error
    pub fn marshal<S: Into<String>>(msg: S) -> Self {
        Error::Marshal {
            message: msg.into(),
        }
    }

    /// Create a server error of the given kind
    pub fn server<S: Into<String>>(kind: ErrorKind, msg: S) -> Self {
        Error::Server {
            kind,
            message: msg.into(),
        }
    }

    /// Create a connection error
    pub fn connection<S: Into<String>>(msg: S) -> Self {
        Error::Connection {
            message: msg.into(),
        }
    }
}
