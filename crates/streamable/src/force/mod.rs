// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Force specifications attached to mesh nodes.

pub mod target_point;

pub use target_point::{Point, TargetPointForceSpec, ORIGIN, UNATTACHED};

use crate::error::Result;
use crate::manager::StreamableManager;

/// Register every force specification shipped with this crate, in a fixed
/// order.
///
/// Calling this at the same startup point on every process keeps class IDs
/// identical across the group.
pub fn register_force_specs(manager: &mut StreamableManager) -> Result<()> {
    TargetPointForceSpec::register_with(manager)?;
    Ok(())
}
