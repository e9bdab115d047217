// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![no_main]

use libfuzzer_sys::fuzz_target;
use ordwire::{deserialize, PrimitiveKind, StructBuilder, Tombstone, WireWidth};
use std::sync::Arc;

fuzz_target!(|data: &[u8]| {
    let desc = Arc::new(
        StructBuilder::new("Fuzzed")
            .field("id", PrimitiveKind::U32)
            .asymmetric_field("unit", PrimitiveKind::String)
            .optional_field("note", PrimitiveKind::String)
            .tombstone(Tombstone::slotted(3, WireWidth::Prefixed))
            .field("blob", PrimitiveKind::Bytes)
            .build(),
    );

    // Arbitrary bytes must never panic, only return explicit errors.
    let _ = deserialize(data, &desc);
});
