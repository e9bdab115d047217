// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Codec Benchmark
//!
//! Measures size/serialize/deserialize throughput for:
//! - A flat struct of fixed-width primitives
//! - A struct with strings and optional fields
//! - A choice with an embedded fallback chain

#![allow(clippy::uninlined_format_args)]

use criterion::{criterion_group, criterion_main, Criterion};
use ordwire::{
    deserialize, serialize, wire_size, ChoiceBuilder, PrimitiveKind, Record, StructBuilder,
    TypeDescriptor, Value,
};
use std::hint::black_box as bb;
use std::sync::Arc;

fn flat_record() -> Record {
    let desc = Arc::new(
        StructBuilder::new("Telemetry")
            .field("seq", PrimitiveKind::U64)
            .field("timestamp_ns", PrimitiveKind::U64)
            .field("x", PrimitiveKind::F64)
            .field("y", PrimitiveKind::F64)
            .field("z", PrimitiveKind::F64)
            .build(),
    );
    let mut data = Record::new(&desc);
    data.set("seq", 1u64).expect("seq");
    data.set("timestamp_ns", 1702900000u64).expect("timestamp");
    data.set("x", 1.0f64).expect("x");
    data.set("y", 2.0f64).expect("y");
    data.set("z", 3.0f64).expect("z");
    data
}

fn text_record() -> Record {
    let desc = Arc::new(
        StructBuilder::new("LogLine")
            .field("seq", PrimitiveKind::U64)
            .field("message", PrimitiveKind::String)
            .optional_field("source", PrimitiveKind::String)
            .optional_field("tag", PrimitiveKind::String)
            .build(),
    );
    let mut data = Record::new(&desc);
    data.set("seq", 7u64).expect("seq");
    data.set("message", "connection established to upstream replica")
        .expect("message");
    data.set("source", "replicator").expect("source");
    data
}

fn fallback_record() -> (Record, Arc<TypeDescriptor>) {
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
    let mut data = Record::new(&v2);
    data.select("count", Value::U64(512)).expect("select");
    let mut fb = Record::new(&v1);
    fb.select("message", Value::from("rollover")).expect("fb");
    data.set_fallback(fb).expect("set fallback");
    (data, v1)
}

fn bench_flat(c: &mut Criterion) {
    let data = flat_record();
    let bytes = serialize(&data).expect("serialize");
    let desc = data.descriptor().clone();

    c.bench_function("size_flat", |b| b.iter(|| wire_size(bb(&data))));
    c.bench_function("serialize_flat", |b| b.iter(|| serialize(bb(&data))));
    c.bench_function("deserialize_flat", |b| {
        b.iter(|| deserialize(bb(&bytes), &desc))
    });
}

fn bench_text(c: &mut Criterion) {
    let data = text_record();
    let bytes = serialize(&data).expect("serialize");
    let desc = data.descriptor().clone();

    c.bench_function("serialize_text", |b| b.iter(|| serialize(bb(&data))));
    c.bench_function("deserialize_text", |b| {
        b.iter(|| deserialize(bb(&bytes), &desc))
    });
}

fn bench_fallback(c: &mut Criterion) {
    let (data, older) = fallback_record();
    let bytes = serialize(&data).expect("serialize");

    c.bench_function("serialize_choice_fallback", |b| {
        b.iter(|| serialize(bb(&data)))
    });
    c.bench_function("deserialize_unrecognized_tag", |b| {
        b.iter(|| deserialize(bb(&bytes), &older))
    });
}

criterion_group!(benches, bench_flat, bench_text, bench_fallback);
criterion_main!(benches);
