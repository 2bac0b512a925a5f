//! Error kinds recognized by the core.
//!
//! Contract violations and refcount underflow are programming errors and
//! are not modeled as [`Error`] values; they surface as asserts at the
//! point of violation.

use std::fmt;

/// The core's own result alias. Kept concrete rather than `ruc`'s
/// type-erased result, since callers need to match on the specific kind:
/// the registry demotes `Malformed`/`IoFailure` to a load failure but
/// propagates `OutOfSpace`.
pub type Result<T> = std::result::Result<T, Error>;

/// Recoverable failure kinds surfaced by [`crate::fdb`] and
/// [`crate::registry`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The record file is absent.
    NotFound,
    /// The record exists but a line could not be parsed.
    Malformed(String),
    /// A filesystem call failed.
    IoFailure(String),
    /// The freelist backing an id pool has no extent large enough.
    OutOfSpace,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NotFound => write!(f, "record not found"),
            Error::Malformed(reason) => write!(f, "malformed record: {reason}"),
            Error::IoFailure(reason) => write!(f, "io failure: {reason}"),
            Error::OutOfSpace => write!(f, "id space exhausted"),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::IoFailure(e.to_string())
    }
}
