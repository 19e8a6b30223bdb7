// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Fixed-width binary stream helpers used to pack and unpack records.

pub mod cursor;

pub use cursor::{StreamReader, StreamWriter};

use std::fmt;

/// Serialization error raised by the stream cursors and payload codecs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SerError {
    /// Source ended before a fixed-width field was complete.
    ReadFailed {
        offset: usize,
        needed: usize,
        remaining: usize,
    },
    /// Sink refused the write (fixed capacity exhausted).
    WriteFailed { offset: usize, reason: String },
    /// Bytes were read but describe an impossible value.
    InvalidData { reason: String },
}

impl fmt::Display for SerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SerError::ReadFailed {
                offset,
                needed,
                remaining,
            } => write!(
                f,
                "read failed at offset {}: need {} bytes, {} remaining",
                offset, needed, remaining
            ),
            SerError::WriteFailed { offset, reason } => {
                write!(f, "write failed at offset {}: {}", offset, reason)
            }
            SerError::InvalidData { reason } => write!(f, "invalid data: {}", reason),
        }
    }
}

impl std::error::Error for SerError {}

pub type SerResult<T> = core::result::Result<T, SerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ser_error_display_variants() {
        let err = SerError::ReadFailed {
            offset: 12,
            needed: 8,
            remaining: 3,
        };
        assert_eq!(
            err.to_string(),
            "read failed at offset 12: need 8 bytes, 3 remaining"
        );

        let err = SerError::WriteFailed {
            offset: 4,
            reason: "capacity limit reached".into(),
        };
        assert_eq!(
            err.to_string(),
            "write failed at offset 4: capacity limit reached"
        );

        let err = SerError::InvalidData {
            reason: "negative record count".into(),
        };
        assert_eq!(err.to_string(), "invalid data: negative record count");
    }

    #[test]
    fn test_ser_error_into_api_error() {
        let api_err: crate::Error = SerError::InvalidData {
            reason: "bad payload".into(),
        }
        .into();
        match api_err {
            crate::Error::Serialization(SerError::InvalidData { reason }) => {
                assert_eq!(reason, "bad payload");
            }
            other => panic!("unexpected api error {:?}", other),
        }
    }
}
