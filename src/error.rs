//! # Error Handling Module
//!
//! Every fallible core operation returns a [`KdbError`]. Error *kinds* are
//! modeled as a composable [`RetCode`] bitmask so that a caller performing
//! several sub-operations can union their failures without losing the first
//! one that occurred, mirroring the bitwise-or'd result codes the reference
//! implementation used.

use std::io;

use bitflags::bitflags;
use thiserror::Error;

bitflags! {
    /// Composable error-kind bitmask. `OK` is the empty set.
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub struct RetCode: u32 {
        /// Generic I/O failure.
        const FAIL = 1 << 0;
        /// Missing object, schema, or backing file.
        const NOT_FOUND = 1 << 1;
        /// Conversion failure, out-of-range index, or oversized write.
        const BAD_ARG = 1 << 2;
        /// Allocator or `ftruncate` failure.
        const MALLOC_FAIL = 1 << 3;
        /// Transport could not be established.
        const CONNECTION_FAIL = 1 << 4;
        /// Null pointer resolution (a `Get` that landed outside the mapping).
        const NULL_OBJ = 1 << 5;
    }
}

impl RetCode {
    /// `true` iff no bit is set, i.e. every sub-operation succeeded.
    pub fn is_ok(self) -> bool {
        self.is_empty()
    }
}

/// The error type returned by every fallible core operation.
#[derive(Debug, Error)]
pub enum KdbError {
    #[error("i/o error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("object {object} is not registered")]
    UnknownObject { object: String },

    #[error("schema file {path} is malformed: {reason}")]
    MalformedSchema { path: String, reason: String },

    #[error("{ofri} is out of range")]
    OutOfRange { ofri: String },

    #[error("value {value:?} is not valid for field {field} (type {type_code})")]
    BadValue {
        field: String,
        type_code: char,
        value: String,
    },

    #[error("value for field {field} is {got} bytes, which exceeds its {max}-byte capacity")]
    Oversize {
        field: String,
        got: usize,
        max: usize,
    },

    #[error("failed to map object {object}: {reason}")]
    MapFailed { object: String, reason: String },

    #[error("could not connect to {address}:{port}: {reason}")]
    ConnectionFailed {
        address: String,
        port: String,
        reason: String,
    },

    #[error("short read: expected {expected} bytes, got {got}")]
    ShortRead { expected: usize, got: usize },
}

impl KdbError {
    /// Recovers the [`RetCode`] bit(s) this error corresponds to, for
    /// callers that need to fold it into a wider union of failures.
    pub fn code(&self) -> RetCode {
        match self {
            KdbError::Io { .. } => RetCode::FAIL,
            KdbError::UnknownObject { .. } => RetCode::NOT_FOUND,
            KdbError::MalformedSchema { .. } => RetCode::BAD_ARG,
            KdbError::OutOfRange { .. } => RetCode::NULL_OBJ,
            KdbError::BadValue { .. } => RetCode::BAD_ARG,
            KdbError::Oversize { .. } => RetCode::BAD_ARG,
            KdbError::MapFailed { .. } => RetCode::FAIL,
            KdbError::ConnectionFailed { .. } => RetCode::CONNECTION_FAIL,
            KdbError::ShortRead { .. } => RetCode::FAIL,
        }
    }
}

/// Maps a [`RetCode`] to the nearest BSD `sysexits.h` category, for CLIs that
/// need to pick a single process exit code out of a union of failures.
pub fn exit_code_for(code: RetCode) -> exitcode::ExitCode {
    if code.is_ok() {
        exitcode::OK
    } else if code.contains(RetCode::NOT_FOUND) {
        exitcode::NOINPUT
    } else if code.contains(RetCode::BAD_ARG) {
        exitcode::DATAERR
    } else if code.contains(RetCode::CONNECTION_FAIL) {
        exitcode::UNAVAILABLE
    } else {
        exitcode::IOERR
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn codes_compose_with_bitwise_or() {
        let a = RetCode::BAD_ARG;
        let b = RetCode::NOT_FOUND;
        let union = a | b;
        assert!(union.contains(RetCode::BAD_ARG));
        assert!(union.contains(RetCode::NOT_FOUND));
        assert!(!union.contains(RetCode::FAIL));
    }

    #[test]
    fn empty_code_is_ok() {
        assert!(RetCode::empty().is_ok());
        assert!(!RetCode::FAIL.is_ok());
    }
}
