// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![no_main]

use libfuzzer_sys::fuzz_target;
use streamable::{register_force_specs, StreamReader, StreamableManager};

fuzz_target!(|data: &[u8]| {
    let mut manager = StreamableManager::new();
    if register_force_specs(&mut manager).is_err() {
        return;
    }

    // First 4 bytes pick the index offset, the rest is the tagged record.
    if data.len() < 4 {
        return;
    }
    let offset = i32::from_le_bytes([data[0], data[1], data[2], data[3]]);
    let mut source = StreamReader::new(&data[4..]);
    while !source.is_eof() {
        if manager.unpack(&mut source, offset).is_err() {
            break;
        }
    }
});
