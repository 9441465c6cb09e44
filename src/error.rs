//! Error types for matrix operations, allocation and decoding.
//!
//! Two families are kept apart:
//!
//! - contract violations (mismatched sizes, major orders or extents, bad
//!   indices) are caller bugs, and carry the fatal status code;
//! - decode failures come from external data and are expected to be
//!   handled by the caller.
//!
//! The library never terminates the process by itself. A host that wants
//! fail-fast behaviour calls [`OrAbort::or_abort`].

use thiserror::Error;

/// Status code reported for contract violations and allocation failures.
pub const FATAL_EXIT_CODE: i32 = 128;

/// Status code reported for decode and I/O failures.
pub const DECODE_EXIT_CODE: i32 = 1;

/// Failure while parsing serialized matrices or tokens.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The header could not be parsed.
    #[error("malformed header: {0}")]
    BadHeader(String),

    /// The format flag is neither `ascii` nor `binary`.
    #[error("unknown format flag `{0}`")]
    UnknownFormat(String),

    /// The major order tag is neither `row_major` nor `col_major`.
    #[error("unknown major order `{0}`")]
    UnknownOrder(String),

    /// The stream ended before every element was read.
    #[error("truncated stream: expected {expected} elements, got {found}")]
    Truncated {
        /// Elements announced by the header.
        expected: usize,
        /// Elements actually decoded.
        found: usize,
    },

    /// An ASCII token could not be parsed as the element type.
    #[error("malformed token `{token}` at element {index}")]
    MalformedToken {
        /// Element position in traversal order.
        index: usize,
        /// Offending text.
        token: String,
    },

    /// Bytes remain after the last element.
    #[error("{0} unexpected bytes after the last element")]
    TrailingData(usize),

    /// A token type code is unknown.
    #[error("unknown token code {0}")]
    UnknownTokenCode(u8),

    /// Bunches are nested deeper than the decoder accepts.
    #[error("token bunches nested deeper than {0} levels")]
    NestingTooDeep(usize),
}

/// The main error type of the crate.
#[derive(Error, Debug)]
pub enum Error {
    /// Total element counts differ.
    #[error("{op}: incorrect matrices sizes: {left} != {right}")]
    SizeMismatch {
        /// Operation that detected the mismatch.
        op: &'static str,
        /// Size of the receiving matrix.
        left: usize,
        /// Size of the other operand.
        right: usize,
    },

    /// Major orders differ.
    #[error("{op}: matrices with different major orders")]
    MajorOrderMismatch {
        /// Operation that detected the mismatch.
        op: &'static str,
    },

    /// Extents differ.
    #[error("{op}: matrices with different dimension sizes: {left:?} != {right:?}")]
    DimensionMismatch {
        /// Operation that detected the mismatch.
        op: &'static str,
        /// Extents of the receiving matrix.
        left: Vec<usize>,
        /// Extents of the other operand.
        right: Vec<usize>,
    },

    /// Dimensions are empty or contain a zero extent.
    #[error("invalid matrix dimensions {0:?}")]
    InvalidDimensions(Vec<usize>),

    /// Coordinates fall outside the matrix.
    #[error("index {coords:?} out of bounds for dimensions {dims:?}")]
    IndexOutOfBounds {
        /// Requested coordinates.
        coords: Vec<usize>,
        /// Matrix extents.
        dims: Vec<usize>,
    },

    /// The operation needs a contiguous view.
    #[error("{op} requires a contiguous matrix")]
    NotContiguous {
        /// Operation that was refused.
        op: &'static str,
    },

    /// The memory block could not be obtained.
    #[error("memory allocation failed: requested {elements} elements ({bytes} bytes)")]
    AllocationFailed {
        /// Requested elements.
        elements: usize,
        /// Requested bytes.
        bytes: usize,
    },

    /// External data could not be decoded.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Reading or writing a stream failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized `Result` type for this crate.
pub type Result<T> = core::result::Result<T, Error>;

/// Coarse classification of [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Caller bug: shape, layout or index contract broken.
    ContractViolation,
    /// Memory could not be obtained.
    Allocation,
    /// Malformed external data.
    Decode,
    /// Underlying stream failure.
    Io,
}

impl Error {
    /// Classifies this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::SizeMismatch { .. }
            | Self::MajorOrderMismatch { .. }
            | Self::DimensionMismatch { .. }
            | Self::InvalidDimensions(_)
            | Self::IndexOutOfBounds { .. }
            | Self::NotContiguous { .. } => ErrorKind::ContractViolation,
            Self::AllocationFailed { .. } => ErrorKind::Allocation,
            Self::Decode(_) => ErrorKind::Decode,
            Self::Io(_) => ErrorKind::Io,
        }
    }

    /// Returns `true` when the error signals a caller bug.
    #[must_use]
    pub const fn is_contract_violation(&self) -> bool {
        matches!(self.kind(), ErrorKind::ContractViolation)
    }

    /// Numeric process status associated with this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self.kind() {
            ErrorKind::ContractViolation | ErrorKind::Allocation => FATAL_EXIT_CODE,
            ErrorKind::Decode | ErrorKind::Io => DECODE_EXIT_CODE,
        }
    }
}

/// Converts a failed [`Result`] into process termination.
///
/// For hosts that treat every contract violation as fatal.
pub trait OrAbort<T> {
    /// Returns the value, or logs the error and exits with its status code.
    fn or_abort(self) -> T;
}

impl<T> OrAbort<T> for Result<T> {
    fn or_abort(self) -> T {
        match self {
            Ok(value) => value,
            Err(err) => {
                tracing::error!(code = err.exit_code(), "{err}");
                std::process::exit(err.exit_code())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contract_violations_are_fatal() {
        let err = Error::SizeMismatch {
            op: "cmul",
            left: 10,
            right: 8,
        };
        assert!(err.is_contract_violation());
        assert_eq!(err.exit_code(), FATAL_EXIT_CODE);
        assert!(err.to_string().contains("10 != 8"));
    }

    #[test]
    fn decode_errors_are_recoverable() {
        let err = Error::from(DecodeError::TrailingData(3));
        assert_eq!(err.kind(), ErrorKind::Decode);
        assert!(!err.is_contract_violation());
        assert_eq!(err.exit_code(), DECODE_EXIT_CODE);
    }
}
