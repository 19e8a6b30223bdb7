// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Payload and factory contracts.
//!
//! A [`Streamable`] knows how to size and pack its own fields. The matching
//! [`StreamableFactory`] knows how to rebuild it on the receiving side. The
//! class ID tying the two together is assigned by the
//! [`StreamableManager`](crate::StreamableManager) and written by the manager,
//! never by the payload itself.

use std::any::{Any, TypeId};
use std::fmt;

use crate::error::Result;
use crate::manager::StreamableManager;
use crate::ser::{SerResult, StreamReader, StreamWriter};

/// Dense class identifier agreed on by every cooperating process.
///
/// IDs are handed out in registration order starting at 0.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(i32);

impl ClassId {
    /// Wrap a raw wire value.
    pub const fn new(raw: i32) -> Self {
        Self(raw)
    }

    /// Raw wire value.
    pub const fn get(self) -> i32 {
        self.0
    }

    /// Slot in the registry table, `None` for negative IDs.
    pub(crate) fn index(self) -> Option<usize> {
        usize::try_from(self.0).ok()
    }
}

impl fmt::Debug for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClassId({})", self.0)
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Downcasting support for boxed payloads.
///
/// Implemented for every `'static + Send + Sync` type. When holding a
/// `Box<dyn Streamable>`, dereference it first (`(*boxed).as_any()`) so the
/// payload's implementation is picked rather than the box's.
pub trait AsAny: Any + Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn into_any(self: Box<Self>) -> Box<dyn Any + Send + Sync>;
    fn concrete_type_name(&self) -> &'static str;
}

impl<T: Any + Send + Sync> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send + Sync> {
        self
    }

    fn concrete_type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// A record that can travel inside a packed stream.
pub trait Streamable: AsAny + fmt::Debug {
    /// Class ID assigned to this record's concrete type by `manager`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotRegistered`](crate::Error::NotRegistered) if the
    /// type was never registered with `manager`.
    fn class_id(&self, manager: &StreamableManager) -> Result<ClassId> {
        manager.class_id_for(self.as_any().type_id(), self.concrete_type_name())
    }

    /// Upper bound on the bytes [`pack`](Streamable::pack) writes.
    fn packed_size(&self) -> usize;

    /// Write the payload fields (not the class ID) into `sink`.
    fn pack(&self, sink: &mut StreamWriter) -> SerResult<()>;
}

/// Rebuilds one concrete [`Streamable`] type from a stream.
pub trait StreamableFactory: Send + Sync {
    /// Class ID assigned at registration, `None` before.
    fn class_id(&self) -> Option<ClassId>;

    /// Called exactly once, by the registry, during registration.
    fn set_class_id(&mut self, class_id: ClassId);

    /// `TypeId` of the records this factory builds.
    fn stream_type(&self) -> TypeId;

    /// Stable name of the records this factory builds.
    fn type_name(&self) -> &'static str;

    /// Read one payload written by the matching `pack` and shift its node
    /// index by `index_offset`.
    ///
    /// # Errors
    ///
    /// Fails if `source` ends before the payload is complete or the shifted
    /// index is not representable. No record is produced in that case.
    fn unpack(
        &self,
        source: &mut StreamReader<'_>,
        index_offset: i32,
    ) -> SerResult<Box<dyn Streamable>>;
}
