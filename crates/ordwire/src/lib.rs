// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # ordwire - schema-evolution-safe binary codec
//!
//! A binary codec for fixed-field aggregates (structs) and tagged unions
//! (choices), engineered so independently-evolved versions of the same
//! logical type stay wire-compatible: bytes written under one schema version
//! decode without error under an older or newer version, subject to explicit
//! per-field evolution rules.
//!
//! # Features
//!
//! - **Descriptors**: compiler-produced runtime type metadata with stable
//!   field/variant ordinals and tombstones for removed fields
//! - **Records**: type-erased data containers with checked field access
//! - **Builder API**: fluent interface for building descriptors
//! - **Evolution**: required/asymmetric/optional cardinality matrix, presence
//!   markers, skip-by-width for ordinals the reader does not know
//! - **Fallbacks**: choice decoding recovers through embedded fallback values
//!   when a tag is unrecognized
//!
//! # Example
//!
//! ```rust
//! use ordwire::{deserialize, serialize, PrimitiveKind, Record, StructBuilder};
//! use std::sync::Arc;
//!
//! let descriptor = Arc::new(
//!     StructBuilder::new("SensorReading")
//!         .field("sensor_id", PrimitiveKind::U32)
//!         .field("temperature", PrimitiveKind::F64)
//!         .optional_field("label", PrimitiveKind::String)
//!         .build(),
//! );
//!
//! let mut reading = Record::new(&descriptor);
//! reading.set("sensor_id", 42u32).unwrap();
//! reading.set("temperature", 23.5f64).unwrap();
//!
//! let bytes = serialize(&reading).unwrap();
//! let decoded = deserialize(&bytes, &descriptor).unwrap();
//! assert_eq!(decoded.get::<u32>("sensor_id").unwrap(), 42);
//! assert!(!decoded.has("label"));
//! ```
//!
//! All operations are synchronous and pure: descriptors are immutable and
//! Arc-shared, values are owned by the caller, and the codec retains nothing
//! across calls.

/// Fluent builders for struct and choice descriptors.
pub mod builder;
/// Bounds-checked little-endian cursors over byte slices.
pub mod cursor;
/// Runtime type descriptors (structs, choices, tombstones, ordinals).
pub mod descriptor;
/// Cardinality evolution resolution (the visibility decision table).
pub mod evolution;
/// Choice encode/decode with fallback resolution.
mod fallback;
/// Record container with typed field access.
pub mod record;
/// Descriptor registry and schema validation.
pub mod registry;
/// Runtime values.
pub mod value;
/// Wire layout engine: size, serialize, deserialize.
pub mod wire;

pub use builder::{ChoiceBuilder, StructBuilder};
pub use descriptor::{
    Cardinality, ChoiceDescriptor, FieldDescriptor, PrimitiveKind, StructDescriptor, StructMember,
    Tombstone, TypeDescriptor, TypeKind, VariantDescriptor, WireWidth,
};
pub use record::{FromValue, IntoValue, Record, RecordError};
pub use registry::{DescriptorLookup, DescriptorRegistry, SchemaError};
pub use value::Value;
pub use wire::{deserialize, serialize, serialize_into, wire_size, WireError};
