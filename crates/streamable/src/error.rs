// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error type shared by the registry, the record codecs and the frame layer.

use crate::manager::RegistryFingerprint;
use crate::ser::SerError;
use crate::streamable::ClassId;

/// Errors returned by streamable operations.
///
/// Every variant is fatal for the transfer that produced it: a corrupt or
/// mismatched stream cannot be repaired by retrying, so callers are expected
/// to abort the exchange and report the error.
///
/// # Example
///
/// ```
/// use streamable::{ClassId, Error, StreamableManager};
///
/// let manager = StreamableManager::new();
/// match manager.lookup_factory(ClassId::new(3)) {
///     Err(Error::UnknownClassId(id)) => assert_eq!(id.get(), 3),
///     other => panic!("unexpected: {:?}", other.map(|f| f.type_name())),
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // ========================================================================
    // Registration Errors
    // ========================================================================
    /// The same concrete payload type was registered twice.
    DuplicateRegistration { type_name: &'static str },
    /// Registration attempted after the registry was frozen.
    RegistryFrozen,
    /// Every representable class ID is already taken.
    RegistryFull { registered: usize },

    // ========================================================================
    // Dispatch Errors
    // ========================================================================
    /// Class ID never registered on this process (registration order mismatch).
    UnknownClassId(ClassId),
    /// Class ID requested for a payload type that was never registered.
    NotRegistered { type_name: &'static str },
    /// Typed unpack produced a record of another concrete type.
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
    /// Frame was packed by a process with a different registration sequence.
    RegistryMismatch {
        local: RegistryFingerprint,
        remote: RegistryFingerprint,
    },

    // ========================================================================
    // Data Errors
    // ========================================================================
    /// Stream encoding/decoding failed (truncated source, full sink, bad value).
    Serialization(SerError),
    /// Frame carries more records than the configured limit.
    RecordLimitExceeded { count: usize, limit: usize },
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::DuplicateRegistration { type_name } => {
                write!(f, "Duplicate registration of streamable type {}", type_name)
            }
            Error::RegistryFrozen => write!(
                f,
                "Streamable registry is frozen: registration must complete before streaming"
            ),
            Error::RegistryFull { registered } => write!(
                f,
                "Streamable registry is full: {} types already registered",
                registered
            ),
            Error::UnknownClassId(id) => write!(
                f,
                "Unknown streamable class ID {} (registration order mismatch?)",
                id
            ),
            Error::NotRegistered { type_name } => {
                write!(f, "Streamable type {} is not registered", type_name)
            }
            Error::TypeMismatch { expected, found } => {
                write!(f, "Type mismatch: expected {}, found {}", expected, found)
            }
            Error::RegistryMismatch { local, remote } => write!(
                f,
                "Registry mismatch: local fingerprint {}, remote fingerprint {}",
                local, remote
            ),
            Error::Serialization(e) => write!(f, "Stream serialization failed: {}", e),
            Error::RecordLimitExceeded { count, limit } => write!(
                f,
                "Record limit exceeded: frame holds {} records, limit is {}",
                count, limit
            ),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Serialization(e) => Some(e),
            _ => None,
        }
    }
}

impl From<SerError> for Error {
    fn from(e: SerError) -> Self {
        Error::Serialization(e)
    }
}

/// Convenient alias for results using the crate `Error` type.
pub type Result<T> = core::result::Result<T, Error>;
