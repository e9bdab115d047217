// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![no_main]

use libfuzzer_sys::fuzz_target;
use ordwire::{deserialize, ChoiceBuilder, PrimitiveKind};
use std::sync::Arc;

fuzz_target!(|data: &[u8]| {
    let v1 = Arc::new(
        ChoiceBuilder::new("Event")
            .variant("started", PrimitiveKind::Bool)
            .variant("message", PrimitiveKind::String)
            .build(),
    );
    let v2 = Arc::new(
        ChoiceBuilder::new("Event")
            .variant("started", PrimitiveKind::Bool)
            .variant("message", PrimitiveKind::String)
            .variant("count", PrimitiveKind::U64)
            .fallback(v1.clone())
            .build(),
    );

    // Exercise both the recognized-tag path and the fallback cascade.
    let _ = deserialize(data, &v1);
    let _ = deserialize(data, &v2);
});
