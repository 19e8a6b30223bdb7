// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Target-point penalty force specification.
//!
//! A [`TargetPointForceSpec`] ties one mesh node to a fixed point in space
//! with a damped penalty spring, approximately imposing a Dirichlet condition
//! at that node.
//!
//! # Wire layout
//!
//! ```text
//! i32        master_index
//! f64        stiffness
//! f64        damping
//! f64[NDIM]  target_position
//! ```

use std::any::TypeId;

use crate::config::{NDIM, SIZEOF_DOUBLE, SIZEOF_INT};
use crate::error::Result;
use crate::manager::StreamableManager;
use crate::ser::{SerError, SerResult, StreamReader, StreamWriter};
use crate::streamable::{ClassId, Streamable, StreamableFactory};

/// A point in physical space.
pub type Point = [f64; NDIM];

/// Origin of the physical domain.
pub const ORIGIN: Point = [0.0; NDIM];

/// Node index of a spec not yet attached to any node.
pub const UNATTACHED: i32 = -1;

/// Exact number of payload bytes one spec packs to.
pub const PACKED_SIZE: usize = SIZEOF_INT + 2 * SIZEOF_DOUBLE + NDIM * SIZEOF_DOUBLE;

/// Penalty spring between a mesh node and a fixed target point.
///
/// `master_index` is always relative to the local numbering of the process
/// currently owning the node. Coefficients are not validated.
#[derive(Debug, PartialEq)]
pub struct TargetPointForceSpec {
    master_index: i32,
    stiffness: f64,
    damping: f64,
    target_position: Point,
}

impl TargetPointForceSpec {
    pub fn new(master_index: i32, stiffness: f64, damping: f64, target_position: Point) -> Self {
        Self {
            master_index,
            stiffness,
            damping,
            target_position,
        }
    }

    /// Install this type's factory in `manager`.
    ///
    /// Must run before any spec is packed or unpacked through `manager`, and
    /// at the same point of the registration sequence on every process.
    pub fn register_with(manager: &mut StreamableManager) -> Result<ClassId> {
        manager.register_factory(Box::new(TargetPointForceSpecFactory::new()))
    }

    pub fn is_registered_with(manager: &StreamableManager) -> bool {
        manager.is_registered::<Self>()
    }

    pub fn master_index(&self) -> i32 {
        self.master_index
    }

    pub fn master_index_mut(&mut self) -> &mut i32 {
        &mut self.master_index
    }

    /// Spring stiffness attached to the target point.
    pub fn stiffness(&self) -> f64 {
        self.stiffness
    }

    pub fn stiffness_mut(&mut self) -> &mut f64 {
        &mut self.stiffness
    }

    /// Damping factor of the spring.
    pub fn damping(&self) -> f64 {
        self.damping
    }

    pub fn damping_mut(&mut self) -> &mut f64 {
        &mut self.damping
    }

    pub fn target_position(&self) -> &Point {
        &self.target_position
    }

    pub fn target_position_mut(&mut self) -> &mut Point {
        &mut self.target_position
    }
}

impl Default for TargetPointForceSpec {
    fn default() -> Self {
        Self::new(UNATTACHED, 0.0, 0.0, ORIGIN)
    }
}

impl Streamable for TargetPointForceSpec {
    fn packed_size(&self) -> usize {
        PACKED_SIZE
    }

    fn pack(&self, sink: &mut StreamWriter) -> SerResult<()> {
        sink.write_i32(self.master_index)?;
        sink.write_f64(self.stiffness)?;
        sink.write_f64(self.damping)?;
        for &x in &self.target_position {
            sink.write_f64(x)?;
        }
        Ok(())
    }
}

/// Rebuilds [`TargetPointForceSpec`] records; only reachable through
/// [`TargetPointForceSpec::register_with`].
struct TargetPointForceSpecFactory {
    class_id: Option<ClassId>,
}

impl TargetPointForceSpecFactory {
    fn new() -> Self {
        Self { class_id: None }
    }
}

impl StreamableFactory for TargetPointForceSpecFactory {
    fn class_id(&self) -> Option<ClassId> {
        self.class_id
    }

    fn set_class_id(&mut self, class_id: ClassId) {
        self.class_id = Some(class_id);
    }

    fn stream_type(&self) -> TypeId {
        TypeId::of::<TargetPointForceSpec>()
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<TargetPointForceSpec>()
    }

    fn unpack(
        &self,
        source: &mut StreamReader<'_>,
        index_offset: i32,
    ) -> SerResult<Box<dyn Streamable>> {
        source.ensure_remaining(PACKED_SIZE)?;

        let master_index = source.read_i32()?;
        let stiffness = source.read_f64()?;
        let damping = source.read_f64()?;
        let mut target_position = ORIGIN;
        for x in &mut target_position {
            *x = source.read_f64()?;
        }

        let master_index =
            master_index
                .checked_add(index_offset)
                .ok_or_else(|| SerError::InvalidData {
                    reason: format!(
                        "node index {} shifted by {} overflows i32",
                        master_index, index_offset
                    ),
                })?;

        Ok(Box::new(TargetPointForceSpec::new(
            master_index,
            stiffness,
            damping,
            target_position,
        )))
    }
}
