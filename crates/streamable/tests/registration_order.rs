// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Cross-process behaviour when registration sequences diverge.
//!
//! Each `StreamableManager` stands in for one process of the group.

use std::any::TypeId;

use streamable::config::NDIM;
use streamable::{
    ClassId, Error, SerResult, StreamReader, StreamWriter, Streamable, StreamableFactory,
    StreamableManager, TargetPointForceSpec,
};

/// Second payload kind: pins a node in place, carrying only its index.
#[derive(Debug, PartialEq)]
struct AnchorSpec {
    master_index: i32,
}

impl Streamable for AnchorSpec {
    fn packed_size(&self) -> usize {
        4
    }

    fn pack(&self, sink: &mut StreamWriter) -> SerResult<()> {
        sink.write_i32(self.master_index)
    }
}

#[derive(Default)]
struct AnchorSpecFactory {
    class_id: Option<ClassId>,
}

impl StreamableFactory for AnchorSpecFactory {
    fn class_id(&self) -> Option<ClassId> {
        self.class_id
    }

    fn set_class_id(&mut self, class_id: ClassId) {
        self.class_id = Some(class_id);
    }

    fn stream_type(&self) -> TypeId {
        TypeId::of::<AnchorSpec>()
    }

    fn type_name(&self) -> &'static str {
        "AnchorSpec"
    }

    fn unpack(
        &self,
        source: &mut StreamReader<'_>,
        index_offset: i32,
    ) -> SerResult<Box<dyn Streamable>> {
        let master_index = source.read_i32()? + index_offset;
        Ok(Box::new(AnchorSpec { master_index }))
    }
}

fn anchor_first() -> StreamableManager {
    let mut manager = StreamableManager::new();
    manager
        .register_factory(Box::<AnchorSpecFactory>::default())
        .expect("anchor");
    TargetPointForceSpec::register_with(&mut manager).expect("target point");
    manager
}

fn target_point_first() -> StreamableManager {
    let mut manager = StreamableManager::new();
    TargetPointForceSpec::register_with(&mut manager).expect("target point");
    manager
        .register_factory(Box::<AnchorSpecFactory>::default())
        .expect("anchor");
    manager
}

fn packed_spec(manager: &StreamableManager) -> Vec<u8> {
    let spec = TargetPointForceSpec::new(5, 2.0, 0.5, [1.0; NDIM]);
    let mut sink = StreamWriter::new();
    manager.pack(&spec, &mut sink).expect("pack");
    sink.into_inner()
}

#[test]
fn test_same_order_agrees() {
    let sender = target_point_first();
    let receiver = target_point_first();
    assert_eq!(sender.fingerprint(), receiver.fingerprint());
    receiver
        .verify_fingerprint(sender.fingerprint())
        .expect("same sequence");

    let bytes = packed_spec(&sender);
    let spec = receiver
        .unpack_as::<TargetPointForceSpec>(&mut StreamReader::new(&bytes), 1)
        .expect("unpack");
    assert_eq!(spec.master_index(), 6);
}

#[test]
fn test_different_order_changes_ids_and_fingerprint() {
    let a = target_point_first();
    let b = anchor_first();

    let spec = TargetPointForceSpec::default();
    assert_eq!(spec.class_id(&a).expect("a"), ClassId::new(0));
    assert_eq!(spec.class_id(&b).expect("b"), ClassId::new(1));
    assert_ne!(a.fingerprint(), b.fingerprint());
    assert!(matches!(
        b.verify_fingerprint(a.fingerprint()),
        Err(Error::RegistryMismatch { .. })
    ));
}

#[test]
fn test_typed_unpack_detects_wrong_type() {
    let sender = target_point_first();
    let receiver = anchor_first();

    // Class 0 is TargetPointForceSpec on the sender but AnchorSpec here.
    let bytes = packed_spec(&sender);
    let mut source = StreamReader::new(&bytes);
    let err = receiver
        .unpack_as::<TargetPointForceSpec>(&mut source, 0)
        .unwrap_err();
    match err {
        Error::TypeMismatch { expected, found } => {
            assert!(expected.ends_with("TargetPointForceSpec"));
            assert!(found.ends_with("AnchorSpec"));
        }
        other => panic!("unexpected error {:?}", other),
    }
    assert_eq!(source.offset(), 0);
}

#[test]
fn test_unknown_class_id_on_receiver() {
    let sender = anchor_first();
    let mut receiver = StreamableManager::new();
    TargetPointForceSpec::register_with(&mut receiver).expect("register");

    // Class 1 on the sender was never registered on the receiver.
    let bytes = packed_spec(&sender);
    let err = receiver
        .unpack(&mut StreamReader::new(&bytes), 0)
        .unwrap_err();
    assert_eq!(err, Error::UnknownClassId(ClassId::new(1)));
}

#[test]
fn test_frame_from_divergent_registry_is_rejected() {
    let sender = target_point_first();
    let receiver = anchor_first();

    let records: Vec<Box<dyn Streamable>> = vec![
        Box::new(TargetPointForceSpec::new(1, 1.0, 0.0, [0.0; NDIM])),
        Box::new(AnchorSpec { master_index: 2 }),
    ];
    let mut sink = StreamWriter::new();
    sender.pack_all(&records, &mut sink).expect("pack");
    let bytes = sink.into_inner();

    let mut source = StreamReader::new(&bytes);
    let err = receiver.unpack_all(&mut source, 0).unwrap_err();
    assert_eq!(
        err,
        Error::RegistryMismatch {
            local: receiver.fingerprint(),
            remote: sender.fingerprint(),
        }
    );
    assert_eq!(source.offset(), 0);

    let same = target_point_first();
    let received = same
        .unpack_all(&mut StreamReader::new(&bytes), 10)
        .expect("matching registry");
    let anchor = (*received[1])
        .as_any()
        .downcast_ref::<AnchorSpec>()
        .expect("anchor");
    assert_eq!(anchor, &AnchorSpec { master_index: 12 });
}

#[test]
fn test_registration_after_streaming_is_refused() {
    let mut manager = StreamableManager::new();
    TargetPointForceSpec::register_with(&mut manager).expect("register");
    let _ = packed_spec(&manager);

    let err = manager
        .register_factory(Box::<AnchorSpecFactory>::default())
        .unwrap_err();
    assert_eq!(err, Error::RegistryFrozen);
    assert!(!manager.is_registered::<AnchorSpec>());
}

#[test]
fn test_explicit_freeze_and_reset() {
    let mut manager = StreamableManager::new();
    TargetPointForceSpec::register_with(&mut manager).expect("register");
    manager.freeze();
    assert_eq!(
        manager
            .register_factory(Box::<AnchorSpecFactory>::default())
            .unwrap_err(),
        Error::RegistryFrozen
    );

    manager.reset();
    assert!(!TargetPointForceSpec::is_registered_with(&manager));
    manager
        .register_factory(Box::<AnchorSpecFactory>::default())
        .expect("anchor after reset");
    assert_eq!(
        TargetPointForceSpec::register_with(&mut manager).expect("target point"),
        ClassId::new(1)
    );
    assert_eq!(manager.fingerprint(), anchor_first().fingerprint());
}

#[test]
fn test_pack_of_unregistered_type_is_refused() {
    let manager = target_point_first();
    let mut empty = StreamableManager::new();
    let spec = TargetPointForceSpec::default();
    let mut sink = StreamWriter::new();

    assert!(matches!(
        empty.pack(&spec, &mut sink),
        Err(Error::NotRegistered { .. })
    ));
    assert!(sink.is_empty());
    manager.pack(&spec, &mut sink).expect("registered manager");

    empty.reset();
    assert!(empty.is_empty());
}

#[test]
fn test_empty_registry_rejects_every_tagged_operation() {
    let manager = StreamableManager::new();
    let spec = TargetPointForceSpec::new(5, 2.0, 0.5, [1.0; NDIM]);
    let records: Vec<Box<dyn Streamable>> = vec![Box::new(TargetPointForceSpec::default())];
    let mut sink = StreamWriter::new();

    for err in [
        spec.class_id(&manager).unwrap_err(),
        manager.class_id_of(&spec).unwrap_err(),
        manager.packed_size(&spec).unwrap_err(),
        manager.packed_size_all(&records).unwrap_err(),
        manager.pack(&spec, &mut sink).unwrap_err(),
        manager.pack_all(&records, &mut sink).unwrap_err(),
    ] {
        match err {
            Error::NotRegistered { type_name } => {
                assert!(type_name.ends_with("TargetPointForceSpec"))
            }
            other => panic!("unexpected error {:?}", other),
        }
    }
    assert!(sink.is_empty());
    assert!(!manager.is_frozen());
}

#[test]
fn test_plain_unpack_needs_fingerprint_check_for_order() {
    let sender = target_point_first();
    let receiver = anchor_first();

    // Without the startup check the record decodes as the receiver's class 0.
    let bytes = packed_spec(&sender);
    let record = receiver
        .unpack(&mut StreamReader::new(&bytes), 0)
        .expect("decodes as another type");
    assert!((*record).as_any().downcast_ref::<AnchorSpec>().is_some());

    assert!(matches!(
        receiver.verify_fingerprint(sender.fingerprint()),
        Err(Error::RegistryMismatch { .. })
    ));
}
