// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![no_main]

use libfuzzer_sys::fuzz_target;
use streamable::{register_force_specs, StreamConfig, StreamReader, StreamableManager};

fuzz_target!(|data: &[u8]| {
    // Fingerprint checks off so the fuzzer reaches record decoding.
    let config = StreamConfig::default()
        .with_verify_fingerprint(false)
        .with_max_records_per_frame(4096);
    let mut manager = StreamableManager::with_config(config);
    if register_force_specs(&mut manager).is_err() {
        return;
    }

    let _ = manager.unpack_all(&mut StreamReader::new(data), 0);
});
