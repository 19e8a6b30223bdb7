// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Streamable configuration.
//!
//! # Architecture
//!
//! - **Level 1 (Static)**: compile-time layout constants (dimensionality, field widths)
//! - **Level 2 (Dynamic)**: [`StreamConfig`] for per-registry limits, optionally
//!   read from environment variables
//!
//! ## Environment
//! - `STREAMABLE_MAX_RECORDS_PER_FRAME`: upper bound on records accepted by one
//!   frame (default: 65536)
//! - `STREAMABLE_VERIFY_FINGERPRINT`: compare frame fingerprints against the
//!   local registry ("1"/"true"/"yes" or "0"/"false"/"no", default: true)

use std::env;

// =======================================================================
// Layout constants
// =======================================================================

/// Spatial dimensionality of target positions, fixed at build time.
#[cfg(not(feature = "ndim-2"))]
pub const NDIM: usize = 3;

/// Spatial dimensionality of target positions, fixed at build time.
#[cfg(feature = "ndim-2")]
pub const NDIM: usize = 2;

/// Wire width of an integer field (node indices, class IDs, counts).
pub const SIZEOF_INT: usize = 4;

/// Wire width of a floating-point field.
pub const SIZEOF_DOUBLE: usize = 8;

/// Wire width of the class ID written ahead of each record.
pub const CLASS_ID_SIZE: usize = SIZEOF_INT;

/// Registry fingerprint width in frame headers.
pub const FINGERPRINT_SIZE: usize = 8;

/// Frame header: record count followed by the registry fingerprint.
pub const FRAME_HEADER_SIZE: usize = SIZEOF_INT + FINGERPRINT_SIZE;

/// Default upper bound on records per frame.
pub const DEFAULT_MAX_RECORDS_PER_FRAME: usize = 65_536;

// =======================================================================
// Runtime configuration
// =======================================================================

pub const ENV_MAX_RECORDS_PER_FRAME: &str = "STREAMABLE_MAX_RECORDS_PER_FRAME";
pub const ENV_VERIFY_FINGERPRINT: &str = "STREAMABLE_VERIFY_FINGERPRINT";

/// Runtime limits applied by a [`StreamableManager`](crate::StreamableManager).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamConfig {
    /// Frames announcing more records than this are rejected before decoding.
    pub max_records_per_frame: usize,
    /// Reject frames whose registry fingerprint differs from the local one.
    pub verify_fingerprint: bool,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            max_records_per_frame: DEFAULT_MAX_RECORDS_PER_FRAME,
            verify_fingerprint: true,
        }
    }
}

impl StreamConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Set the per-frame record limit.
    pub fn with_max_records_per_frame(mut self, limit: usize) -> Self {
        self.max_records_per_frame = limit;
        self
    }

    /// Enable or disable frame fingerprint checks.
    pub fn with_verify_fingerprint(mut self, verify: bool) -> Self {
        self.verify_fingerprint = verify;
        self
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_MAX_RECORDS_PER_FRAME) {
            match raw.trim().parse::<usize>() {
                Ok(limit) if limit > 0 => config.max_records_per_frame = limit,
                _ => log::warn!(
                    "[StreamConfig] invalid {}={:?}, keeping default {}",
                    ENV_MAX_RECORDS_PER_FRAME,
                    raw,
                    config.max_records_per_frame
                ),
            }
        }

        if let Some(raw) = lookup(ENV_VERIFY_FINGERPRINT) {
            match parse_bool(&raw) {
                Some(verify) => config.verify_fingerprint = verify,
                None => log::warn!(
                    "[StreamConfig] invalid {}={:?}, keeping default {}",
                    ENV_VERIFY_FINGERPRINT,
                    raw,
                    config.verify_fingerprint
                ),
            }
        }

        config
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}
