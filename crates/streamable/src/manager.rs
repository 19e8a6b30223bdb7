// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Class-ID registry and tagged record streams.
//!
//! # Lifecycle
//!
//! ```text
//! StreamableManager::new()
//!     |
//!     v
//! Registering  --register_factory(&mut self)-->  (dense ClassId 0, 1, 2, ...)
//!     |
//!     | freeze() or first pack/unpack
//!     v
//! Frozen       --pack / unpack / lookups (&self, any thread)
//!     |
//!     | reset(&mut self)
//!     v
//! Registering (empty)
//! ```
//!
//! Registration is collective: every cooperating process must register the
//! same types in the same order, since class IDs are never negotiated on the
//! wire. The [`RegistryFingerprint`] (MD5 over the ordered type names) lets
//! frames detect a divergent registration sequence instead of decoding
//! garbage.
//!
//! # Thread Safety
//!
//! Registration needs `&mut self`, so it is finished before the manager is
//! shared (typically as `Arc<StreamableManager>`). Everything afterwards takes
//! `&self`; the only interior state is the atomic frozen flag.

use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use md5::{Digest, Md5};

use crate::config::{StreamConfig, CLASS_ID_SIZE, FINGERPRINT_SIZE, FRAME_HEADER_SIZE};
use crate::error::{Error, Result};
use crate::ser::{SerError, StreamReader, StreamWriter};
use crate::streamable::{ClassId, Streamable, StreamableFactory};

/// Digest of the ordered registration sequence.
///
/// Truncated MD5 of the registered type names, in class-ID order.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegistryFingerprint([u8; FINGERPRINT_SIZE]);

impl RegistryFingerprint {
    fn of_names<'a>(names: impl Iterator<Item = &'a str>) -> Self {
        let mut hasher = Md5::new();
        for name in names {
            hasher.update(name.as_bytes());
            // Separator keeps ["ab", "c"] and ["a", "bc"] apart.
            hasher.update([0u8]);
        }
        let digest = hasher.finalize();
        let mut bytes = [0u8; FINGERPRINT_SIZE];
        bytes.copy_from_slice(&digest[..FINGERPRINT_SIZE]);
        Self(bytes)
    }

    /// Create from raw bytes
    pub const fn from_bytes(bytes: [u8; FINGERPRINT_SIZE]) -> Self {
        Self(bytes)
    }

    /// Get raw bytes
    pub const fn as_bytes(&self) -> &[u8; FINGERPRINT_SIZE] {
        &self.0
    }
}

impl fmt::Debug for RegistryFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RegistryFingerprint({})", self)
    }
}

impl fmt::Display for RegistryFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

/// Process-scoped registry mapping class IDs to factories.
pub struct StreamableManager {
    /// Factories indexed by class ID.
    factories: Vec<Box<dyn StreamableFactory>>,
    /// Reverse map used to tag outgoing records.
    class_ids: HashMap<TypeId, ClassId>,
    fingerprint: RegistryFingerprint,
    frozen: AtomicBool,
    config: StreamConfig,
}

impl StreamableManager {
    /// Empty registry with default configuration.
    pub fn new() -> Self {
        Self::with_config(StreamConfig::default())
    }

    /// Empty registry with explicit limits.
    pub fn with_config(config: StreamConfig) -> Self {
        Self {
            factories: Vec::new(),
            class_ids: HashMap::new(),
            fingerprint: RegistryFingerprint::of_names(std::iter::empty()),
            frozen: AtomicBool::new(false),
            config,
        }
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    // ------------------------------------------------------------------------
    // Registration
    // ------------------------------------------------------------------------

    /// Register `factory` under the next free class ID.
    ///
    /// Collective: must be called with the same factories, in the same order,
    /// on every cooperating process.
    ///
    /// # Errors
    ///
    /// - [`Error::RegistryFrozen`] once the registry is frozen
    /// - [`Error::DuplicateRegistration`] if the factory's record type is
    ///   already registered; no class ID is consumed
    /// - [`Error::RegistryFull`] once every non-negative `i32` is taken
    pub fn register_factory(
        &mut self,
        mut factory: Box<dyn StreamableFactory>,
    ) -> Result<ClassId> {
        let type_name = factory.type_name();
        if self.is_frozen() {
            log::warn!(
                "[StreamableManager] rejecting registration of {}: registry is frozen",
                type_name
            );
            return Err(Error::RegistryFrozen);
        }
        if self.class_ids.contains_key(&factory.stream_type()) {
            log::warn!(
                "[StreamableManager] rejecting duplicate registration of {}",
                type_name
            );
            return Err(Error::DuplicateRegistration { type_name });
        }

        let class_id = next_class_id(self.factories.len())?;
        factory.set_class_id(class_id);
        self.class_ids.insert(factory.stream_type(), class_id);
        self.factories.push(factory);
        self.fingerprint =
            RegistryFingerprint::of_names(self.factories.iter().map(|f| f.type_name()));

        log::debug!(
            "[StreamableManager] registered {} as class {} (fingerprint {})",
            type_name,
            class_id,
            self.fingerprint
        );
        Ok(class_id)
    }

    /// Whether records of type `T` can be streamed.
    pub fn is_registered<T: Streamable>(&self) -> bool {
        self.is_type_registered(TypeId::of::<T>())
    }

    pub fn is_type_registered(&self, type_id: TypeId) -> bool {
        self.class_ids.contains_key(&type_id)
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Digest of the registration sequence so far.
    pub fn fingerprint(&self) -> RegistryFingerprint {
        self.fingerprint
    }

    /// Compare a peer's fingerprint with ours.
    ///
    /// Transports can exchange fingerprints once after startup to catch a
    /// divergent registration order before any record moves.
    pub fn verify_fingerprint(&self, remote: RegistryFingerprint) -> Result<()> {
        if remote == self.fingerprint {
            return Ok(());
        }
        log::error!(
            "[StreamableManager] registry mismatch: local {} remote {}",
            self.fingerprint,
            remote
        );
        Err(Error::RegistryMismatch {
            local: self.fingerprint,
            remote,
        })
    }

    /// Stop accepting registrations.
    pub fn freeze(&self) {
        if !self.frozen.swap(true, Ordering::AcqRel) {
            log::debug!(
                "[StreamableManager] frozen with {} registered types",
                self.factories.len()
            );
        }
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen.load(Ordering::Acquire)
    }

    /// Drop every registration and return to the empty, unfrozen state.
    pub fn reset(&mut self) {
        log::debug!(
            "[StreamableManager] reset ({} types dropped)",
            self.factories.len()
        );
        self.factories.clear();
        self.class_ids.clear();
        self.fingerprint = RegistryFingerprint::of_names(std::iter::empty());
        *self.frozen.get_mut() = false;
    }

    // ------------------------------------------------------------------------
    // Lookups
    // ------------------------------------------------------------------------

    /// Factory registered under `class_id`.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownClassId`] if nothing was registered under that ID on
    /// this process.
    pub fn lookup_factory(&self, class_id: ClassId) -> Result<&dyn StreamableFactory> {
        class_id
            .index()
            .and_then(|idx| self.factories.get(idx))
            .map(|factory| &**factory)
            .ok_or(Error::UnknownClassId(class_id))
    }

    /// Class ID for the record type identified by `type_id`.
    pub fn class_id_for(&self, type_id: TypeId, type_name: &'static str) -> Result<ClassId> {
        self.class_ids
            .get(&type_id)
            .copied()
            .ok_or(Error::NotRegistered { type_name })
    }

    /// Class ID of `record`'s concrete type.
    pub fn class_id_of(&self, record: &dyn Streamable) -> Result<ClassId> {
        record.class_id(self)
    }

    // ------------------------------------------------------------------------
    // Single tagged records
    // ------------------------------------------------------------------------

    /// Bytes [`pack`](Self::pack) needs for `record`, class ID included.
    pub fn packed_size(&self, record: &dyn Streamable) -> Result<usize> {
        self.class_id_of(record)?;
        Ok(CLASS_ID_SIZE + record.packed_size())
    }

    /// Write `record`'s class ID followed by its payload.
    ///
    /// On error `sink` is left at its previous length.
    pub fn pack(&self, record: &dyn Streamable, sink: &mut StreamWriter) -> Result<()> {
        let class_id = self.class_id_of(record)?;
        self.mark_streaming();
        let mark = sink.len();
        sink.write_i32(class_id.get())
            .and_then(|()| record.pack(sink))
            .inspect_err(|_| sink.truncate(mark))?;
        log::trace!(
            "[StreamableManager] packed class {} ({} bytes)",
            class_id,
            CLASS_ID_SIZE + record.packed_size()
        );
        Ok(())
    }

    /// Read a class ID and rebuild the record with the matching factory.
    ///
    /// On error `source` is left where it was.
    ///
    /// The class ID alone cannot tell whether the sender registered types in
    /// the same order: a diverging sequence decodes as whatever type this
    /// process registered under that ID. Exchange [`fingerprint`](Self::fingerprint)
    /// at startup and check it with [`verify_fingerprint`](Self::verify_fingerprint).
    /// [`unpack_as`](Self::unpack_as) catches a wrong type and
    /// [`unpack_all`](Self::unpack_all) checks the frame's fingerprint.
    pub fn unpack(
        &self,
        source: &mut StreamReader<'_>,
        index_offset: i32,
    ) -> Result<Box<dyn Streamable>> {
        self.mark_streaming();
        let mut probe = source.clone();
        let record = self.unpack_record(&mut probe, index_offset)?;
        *source = probe;
        Ok(record)
    }

    /// [`unpack`](Self::unpack) and downcast to `T`.
    ///
    /// # Errors
    ///
    /// [`Error::TypeMismatch`] if the stream held a record of another type.
    pub fn unpack_as<T: Streamable>(
        &self,
        source: &mut StreamReader<'_>,
        index_offset: i32,
    ) -> Result<Box<T>> {
        self.mark_streaming();
        let mut probe = source.clone();
        let record = self.unpack_record(&mut probe, index_offset)?;
        let found = (*record).concrete_type_name();
        let typed = record
            .into_any()
            .downcast::<T>()
            .map_err(|_| Error::TypeMismatch {
                expected: std::any::type_name::<T>(),
                found,
            })?;
        *source = probe;
        Ok(typed)
    }

    // ------------------------------------------------------------------------
    // Record frames
    // ------------------------------------------------------------------------

    /// Bytes [`pack_all`](Self::pack_all) needs for `records`.
    pub fn packed_size_all(&self, records: &[Box<dyn Streamable>]) -> Result<usize> {
        records.iter().try_fold(FRAME_HEADER_SIZE, |total, record| {
            Ok(total + self.packed_size(&**record)?)
        })
    }

    /// Write a frame: record count, registry fingerprint, then each tagged
    /// record.
    ///
    /// On error `sink` is left at its previous length.
    pub fn pack_all(
        &self,
        records: &[Box<dyn Streamable>],
        sink: &mut StreamWriter,
    ) -> Result<()> {
        self.check_record_limit(records.len())?;
        let count = i32::try_from(records.len()).map_err(|_| SerError::InvalidData {
            reason: format!("record count {} exceeds i32", records.len()),
        })?;
        // Resolve every class ID before the first byte goes out.
        for record in records {
            self.class_id_of(&**record)?;
        }

        let mark = sink.len();
        self.pack_frame(count, records, sink)
            .inspect_err(|_| sink.truncate(mark))?;
        log::trace!("[StreamableManager] packed frame of {} records", count);
        Ok(())
    }

    /// Read a frame written by [`pack_all`](Self::pack_all), shifting every
    /// record's node index by `index_offset`.
    ///
    /// Returns all records or an error; `source` only advances on success.
    pub fn unpack_all(
        &self,
        source: &mut StreamReader<'_>,
        index_offset: i32,
    ) -> Result<Vec<Box<dyn Streamable>>> {
        self.mark_streaming();
        let mut probe = source.clone();

        let raw_count = probe.read_i32()?;
        let count = usize::try_from(raw_count).map_err(|_| SerError::InvalidData {
            reason: format!("negative record count {}", raw_count),
        })?;
        self.check_record_limit(count)?;

        let remote = RegistryFingerprint::from_bytes(probe.read_array()?);
        if self.config.verify_fingerprint {
            self.verify_fingerprint(remote)?;
        }

        // Every record carries at least its class ID; cap the allocation by
        // what the source could possibly hold.
        let mut records = Vec::with_capacity(count.min(probe.remaining() / CLASS_ID_SIZE));
        for _ in 0..count {
            records.push(self.unpack_record(&mut probe, index_offset)?);
        }

        *source = probe;
        Ok(records)
    }

    // ------------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------------

    fn unpack_record(
        &self,
        source: &mut StreamReader<'_>,
        index_offset: i32,
    ) -> Result<Box<dyn Streamable>> {
        let class_id = ClassId::new(source.read_i32()?);
        let offset = source.offset();
        let factory = self.lookup_factory(class_id).inspect_err(|_| {
            log::error!(
                "[StreamableManager] unknown class {} at offset {} ({} types registered)",
                class_id,
                offset,
                self.factories.len()
            );
        })?;
        Ok(factory.unpack(source, index_offset)?)
    }

    fn pack_frame(
        &self,
        count: i32,
        records: &[Box<dyn Streamable>],
        sink: &mut StreamWriter,
    ) -> Result<()> {
        sink.write_i32(count)?;
        sink.write_bytes(self.fingerprint.as_bytes())?;
        for record in records {
            self.pack(&**record, sink)?;
        }
        Ok(())
    }

    fn check_record_limit(&self, count: usize) -> Result<()> {
        let limit = self.config.max_records_per_frame;
        if count > limit {
            return Err(Error::RecordLimitExceeded { count, limit });
        }
        Ok(())
    }

    fn mark_streaming(&self) {
        if !self.frozen.load(Ordering::Acquire) {
            self.freeze();
        }
    }
}

fn next_class_id(registered: usize) -> Result<ClassId> {
    i32::try_from(registered)
        .map(ClassId::new)
        .map_err(|_| Error::RegistryFull { registered })
}

impl Default for StreamableManager {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StreamableManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&'static str> = self.factories.iter().map(|f| f.type_name()).collect();
        f.debug_struct("StreamableManager")
            .field("types", &names)
            .field("fingerprint", &self.fingerprint)
            .field("frozen", &self.is_frozen())
            .field("config", &self.config)
            .finish()
    }
}
