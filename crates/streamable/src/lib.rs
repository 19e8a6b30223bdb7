// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # streamable - tagged payload records for distributed mesh exchange
//!
//! Polymorphic per-node records (force specifications, boundary data, ...)
//! travel inside one untyped byte stream between cooperating processes and
//! are rebuilt with their concrete type on the receiving side.
//!
//! ## Quick Start
//!
//! ```rust
//! use streamable::{
//!     StreamReader, StreamWriter, StreamableManager, TargetPointForceSpec,
//! };
//!
//! # fn main() -> streamable::Result<()> {
//! // Startup: identical registration sequence on every process.
//! let mut manager = StreamableManager::new();
//! TargetPointForceSpec::register_with(&mut manager)?;
//!
//! // Sender
//! let spec = TargetPointForceSpec::new(5, 2.0, 0.5, [1.0; streamable::config::NDIM]);
//! let mut sink = StreamWriter::with_capacity(manager.packed_size(&spec)?);
//! manager.pack(&spec, &mut sink)?;
//!
//! // Receiver: node indices shift into the local numbering.
//! let bytes = sink.into_inner();
//! let mut source = StreamReader::new(&bytes);
//! let received = manager.unpack_as::<TargetPointForceSpec>(&mut source, 10)?;
//! assert_eq!(received.master_index(), 15);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +------------------------------------------------------------------+
//! |  transport / mesh exchange (external)                            |
//! +------------------------------------------------------------------+
//! |  StreamableManager: ClassId -> factory, frames, fingerprint      |
//! +------------------------------------------------------------------+
//! |  Streamable / StreamableFactory     TargetPointForceSpec, ...    |
//! +------------------------------------------------------------------+
//! |  ser: StreamWriter / StreamReader (fixed-width LE fields)        |
//! +------------------------------------------------------------------+
//! ```
//!
//! ## Modules Overview
//!
//! - [`manager`] - class-ID registry, tagged records and frames
//! - [`streamable`] - payload and factory contracts
//! - [`force`] - force specifications shipped with the crate
//! - [`ser`] - byte cursors
//! - [`config`] - layout constants and runtime limits

/// Layout constants and runtime limits.
pub mod config;
mod error;
/// Force specifications attached to mesh nodes.
pub mod force;
/// Class-ID registry and tagged record streams.
pub mod manager;
/// Fixed-width binary cursors.
pub mod ser;
/// Payload and factory contracts.
pub mod streamable;

pub use config::StreamConfig;
pub use error::{Error, Result};
pub use force::{register_force_specs, Point, TargetPointForceSpec};
pub use manager::{RegistryFingerprint, StreamableManager};
pub use ser::{SerError, SerResult, StreamReader, StreamWriter};
pub use streamable::{AsAny, ClassId, Streamable, StreamableFactory};
