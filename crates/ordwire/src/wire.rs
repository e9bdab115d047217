// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Wire layout engine: size, serialize, deserialize.
//!
//! # Wire format
//!
//! All integers are little-endian, fixed width, with no alignment padding.
//!
//! - Fixed-width primitives: raw bytes.
//! - Strings and byte blobs: `u32` byte count, then the raw bytes.
//! - Struct body: members visited in ascending ordinal order. A
//!   presence-slotted ordinal contributes one marker byte (0x00 absent,
//!   0x01 present) before its payload position; an unslotted ordinal
//!   contributes payload only. Nested composite payloads get a `u32` byte
//!   count prefix so a reader can skip a tombstoned ordinal without
//!   interpreting it. The invariant throughout: any `Prefixed`-width payload
//!   begins with a `u32` count of the bytes that follow it.
//! - Choice body: see [`crate::fallback`].
//!
//! Presence markers are inline per field rather than packed into a leading
//! bitmap: a leading bitmap whose width tracks the field count would shift
//! every payload byte for older readers whenever a version adds an optional
//! field, breaking the append-only evolution model.
//!
//! Deserialization tolerates trailing bytes it does not consume; an older
//! reader of a newer writer's output must.

use crate::cursor::{ByteReader, ByteWriter};
use crate::descriptor::{
    Cardinality, PrimitiveKind, StructDescriptor, StructMember, TypeDescriptor, TypeKind, WireWidth,
};
use crate::evolution::{self, Visibility, WireEvidence};
use crate::fallback;
use crate::record::Record;
use crate::value::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Errors for wire encode/decode operations.
#[derive(Debug)]
pub enum WireError {
    /// Buffer shorter than a mandatory field or ordinal requires.
    MalformedBuffer { offset: usize, reason: String },
    /// Tag unrecognized and no fallback resolves it.
    UnknownVariant { tag: u32 },
    /// Serialized length differs from the predicted size, or a caller buffer
    /// has the wrong length. Internal invariant violation, never expected
    /// with correct descriptors.
    BufferSizeMismatch { expected: usize, actual: usize },
    /// Value shape disagrees with the descriptor.
    TypeMismatch { expected: String, found: String },
    /// A required or asymmetric field (or a declared fallback) is missing
    /// from the value being encoded.
    MissingField(String),
    /// Decoded string payload is not valid UTF-8.
    Utf8Error(std::string::FromUtf8Error),
}

impl fmt::Display for WireError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedBuffer { offset, reason } => {
                write!(f, "malformed buffer at offset {}: {}", offset, reason)
            }
            Self::UnknownVariant { tag } => write!(f, "unknown variant tag {}", tag),
            Self::BufferSizeMismatch { expected, actual } => {
                write!(f, "buffer size mismatch: expected {}, got {}", expected, actual)
            }
            Self::TypeMismatch { expected, found } => {
                write!(f, "type mismatch: expected {}, found {}", expected, found)
            }
            Self::MissingField(name) => write!(f, "missing field: {}", name),
            Self::Utf8Error(e) => write!(f, "UTF-8 error: {}", e),
        }
    }
}

impl std::error::Error for WireError {}

impl From<std::string::FromUtf8Error> for WireError {
    fn from(e: std::string::FromUtf8Error) -> Self {
        Self::Utf8Error(e)
    }
}

/// Serialized byte count of a record. Pure and deterministic; equals what
/// [`serialize`] writes.
pub fn wire_size(record: &Record) -> Result<usize, WireError> {
    size_of_value(record.value(), record.descriptor())
}

/// Serialize a record into a caller-owned buffer of exactly [`wire_size`]
/// bytes.
pub fn serialize_into(record: &Record, buffer: &mut [u8]) -> Result<(), WireError> {
    let predicted = wire_size(record)?;
    if buffer.len() != predicted {
        return Err(WireError::BufferSizeMismatch {
            expected: predicted,
            actual: buffer.len(),
        });
    }

    let mut writer = ByteWriter::new(buffer);
    encode_value(&mut writer, record.value(), record.descriptor())?;

    let written = writer.offset();
    if written != predicted {
        log::error!(
            "[WIRE] size prediction violated for {}: predicted {}, wrote {}",
            record.type_name(),
            predicted,
            written
        );
        return Err(WireError::BufferSizeMismatch {
            expected: predicted,
            actual: written,
        });
    }
    Ok(())
}

/// Serialize a record into a freshly allocated buffer.
pub fn serialize(record: &Record) -> Result<Vec<u8>, WireError> {
    let mut buffer = vec![0u8; wire_size(record)?];
    serialize_into(record, &mut buffer)?;
    Ok(buffer)
}

/// Deserialize a record from bytes against the reader's descriptor.
///
/// Trailing bytes beyond the reader's last declared ordinal are ignored.
pub fn deserialize(bytes: &[u8], descriptor: &Arc<TypeDescriptor>) -> Result<Record, WireError> {
    let mut reader = ByteReader::new(bytes);
    let value = decode_value(&mut reader, descriptor)?;
    if reader.remaining() > 0 {
        log::trace!(
            "[WIRE] {} trailing bytes ignored decoding {}",
            reader.remaining(),
            descriptor.name
        );
    }
    Record::from_value(descriptor, value).map_err(|e| WireError::TypeMismatch {
        expected: descriptor.name.clone(),
        found: e.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Size
// ---------------------------------------------------------------------------

pub(crate) fn size_of_value(value: &Value, desc: &TypeDescriptor) -> Result<usize, WireError> {
    match &desc.kind {
        TypeKind::Primitive(p) => size_of_primitive(value, *p),
        TypeKind::Struct(s) => size_of_struct(value, s),
        TypeKind::Choice(c) => fallback::size_of_choice(value, c),
    }
}

fn size_of_primitive(value: &Value, kind: PrimitiveKind) -> Result<usize, WireError> {
    if let Some(width) = kind.fixed_width() {
        check_primitive_shape(value, kind)?;
        return Ok(width);
    }
    match (value, kind) {
        (Value::String(s), PrimitiveKind::String) => Ok(4 + s.len()),
        (Value::Bytes(b), PrimitiveKind::Bytes) => Ok(4 + b.len()),
        _ => Err(mismatch(kind, value)),
    }
}

fn size_of_struct(value: &Value, desc: &StructDescriptor) -> Result<usize, WireError> {
    let Value::Struct(map) = value else {
        return Err(WireError::TypeMismatch {
            expected: "struct".into(),
            found: format!("{:?}", value),
        });
    };

    let mut total = 0;
    for member in desc.members() {
        match member {
            StructMember::Tombstone(t) => {
                // A removed field encodes as an absent marker when slotted,
                // nothing otherwise.
                if t.presence {
                    total += 1;
                }
            }
            StructMember::Field(f) => {
                if f.presence {
                    total += 1;
                }
                match map.get(&f.name) {
                    Some(v) => total += size_of_field_payload(v, &f.ty)?,
                    None => {
                        if !f.presence || f.cardinality != Cardinality::Optional {
                            return Err(WireError::MissingField(f.name.clone()));
                        }
                    }
                }
            }
        }
    }
    Ok(total)
}

pub(crate) fn size_of_field_payload(value: &Value, ty: &TypeDescriptor) -> Result<usize, WireError> {
    match &ty.kind {
        // Strings and bytes already self-delimit.
        TypeKind::Primitive(_) => size_of_value(value, ty),
        // Nested composites get the skip prefix.
        TypeKind::Struct(_) | TypeKind::Choice(_) => Ok(4 + size_of_value(value, ty)?),
    }
}

// ---------------------------------------------------------------------------
// Encode
// ---------------------------------------------------------------------------

pub(crate) fn encode_value(
    writer: &mut ByteWriter<'_>,
    value: &Value,
    desc: &TypeDescriptor,
) -> Result<(), WireError> {
    match &desc.kind {
        TypeKind::Primitive(p) => encode_primitive(writer, value, *p),
        TypeKind::Struct(s) => encode_struct(writer, value, s),
        TypeKind::Choice(c) => fallback::encode_choice(writer, value, c, &desc.name),
    }
}

fn encode_primitive(
    writer: &mut ByteWriter<'_>,
    value: &Value,
    kind: PrimitiveKind,
) -> Result<(), WireError> {
    match (value, kind) {
        (Value::Bool(v), PrimitiveKind::Bool) => writer.write_u8(u8::from(*v)),
        (Value::U8(v), PrimitiveKind::U8) => writer.write_u8(*v),
        (Value::U16(v), PrimitiveKind::U16) => writer.write_u16_le(*v),
        (Value::U32(v), PrimitiveKind::U32) => writer.write_u32_le(*v),
        (Value::U64(v), PrimitiveKind::U64) => writer.write_u64_le(*v),
        (Value::I8(v), PrimitiveKind::I8) => writer.write_u8(*v as u8),
        (Value::I16(v), PrimitiveKind::I16) => writer.write_u16_le(*v as u16),
        (Value::I32(v), PrimitiveKind::I32) => writer.write_u32_le(*v as u32),
        (Value::I64(v), PrimitiveKind::I64) => writer.write_u64_le(*v as u64),
        (Value::F32(v), PrimitiveKind::F32) => writer.write_f32_le(*v),
        (Value::F64(v), PrimitiveKind::F64) => writer.write_f64_le(*v),
        (Value::String(s), PrimitiveKind::String) => {
            writer.write_u32_le(payload_len_u32(s.len())?)?;
            writer.write_bytes(s.as_bytes())
        }
        (Value::Bytes(b), PrimitiveKind::Bytes) => {
            writer.write_u32_le(payload_len_u32(b.len())?)?;
            writer.write_bytes(b)
        }
        _ => Err(mismatch(kind, value)),
    }
}

fn encode_struct(
    writer: &mut ByteWriter<'_>,
    value: &Value,
    desc: &StructDescriptor,
) -> Result<(), WireError> {
    let Value::Struct(map) = value else {
        return Err(WireError::TypeMismatch {
            expected: "struct".into(),
            found: format!("{:?}", value),
        });
    };

    for member in desc.members() {
        match member {
            StructMember::Tombstone(t) => {
                if t.presence {
                    writer.write_u8(0)?;
                }
            }
            StructMember::Field(f) => match map.get(&f.name) {
                Some(v) => {
                    if f.presence {
                        writer.write_u8(1)?;
                    }
                    encode_field_payload(writer, v, &f.ty)?;
                }
                None => {
                    if f.presence && f.cardinality == Cardinality::Optional {
                        writer.write_u8(0)?;
                    } else {
                        return Err(WireError::MissingField(f.name.clone()));
                    }
                }
            },
        }
    }
    Ok(())
}

pub(crate) fn encode_field_payload(
    writer: &mut ByteWriter<'_>,
    value: &Value,
    ty: &TypeDescriptor,
) -> Result<(), WireError> {
    match &ty.kind {
        TypeKind::Primitive(_) => encode_value(writer, value, ty),
        TypeKind::Struct(_) | TypeKind::Choice(_) => {
            let prefix_at = writer.offset();
            writer.write_u32_le(0)?;
            let body_start = writer.offset();
            encode_value(writer, value, ty)?;
            let body_len = writer.offset() - body_start;
            writer.patch_u32_le(prefix_at, payload_len_u32(body_len)?)
        }
    }
}

// ---------------------------------------------------------------------------
// Decode
// ---------------------------------------------------------------------------

pub(crate) fn decode_value(
    reader: &mut ByteReader<'_>,
    desc: &TypeDescriptor,
) -> Result<Value, WireError> {
    match &desc.kind {
        TypeKind::Primitive(p) => decode_primitive(reader, *p),
        TypeKind::Struct(s) => decode_struct(reader, s),
        TypeKind::Choice(c) => fallback::decode_choice(reader, c, &desc.name),
    }
}

fn decode_primitive(reader: &mut ByteReader<'_>, kind: PrimitiveKind) -> Result<Value, WireError> {
    match kind {
        PrimitiveKind::Bool => Ok(Value::Bool(reader.read_u8()? != 0)),
        PrimitiveKind::U8 => Ok(Value::U8(reader.read_u8()?)),
        PrimitiveKind::U16 => Ok(Value::U16(reader.read_u16_le()?)),
        PrimitiveKind::U32 => Ok(Value::U32(reader.read_u32_le()?)),
        PrimitiveKind::U64 => Ok(Value::U64(reader.read_u64_le()?)),
        PrimitiveKind::I8 => Ok(Value::I8(reader.read_u8()? as i8)),
        PrimitiveKind::I16 => Ok(Value::I16(reader.read_u16_le()? as i16)),
        PrimitiveKind::I32 => Ok(Value::I32(reader.read_u32_le()? as i32)),
        PrimitiveKind::I64 => Ok(Value::I64(reader.read_u64_le()? as i64)),
        PrimitiveKind::F32 => Ok(Value::F32(reader.read_f32_le()?)),
        PrimitiveKind::F64 => Ok(Value::F64(reader.read_f64_le()?)),
        PrimitiveKind::String => {
            let len = reader.read_u32_le()? as usize;
            let bytes = reader.read_bytes(len)?;
            Ok(Value::String(String::from_utf8(bytes.to_vec())?))
        }
        PrimitiveKind::Bytes => {
            let len = reader.read_u32_le()? as usize;
            Ok(Value::Bytes(reader.read_bytes(len)?.to_vec()))
        }
    }
}

fn decode_struct(reader: &mut ByteReader<'_>, desc: &StructDescriptor) -> Result<Value, WireError> {
    let mut map = HashMap::new();
    for member in desc.members() {
        match member {
            StructMember::Tombstone(t) => {
                if reader.is_eof() {
                    continue;
                }
                let skip = if t.presence {
                    reader.read_u8()? != 0
                } else {
                    true
                };
                if skip {
                    skip_width(reader, t.width)?;
                }
            }
            StructMember::Field(f) => {
                let at = reader.offset();
                let evidence = if reader.is_eof() {
                    WireEvidence::Exhausted
                } else if f.presence {
                    if reader.read_u8()? != 0 {
                        WireEvidence::MarkerSet
                    } else {
                        WireEvidence::MarkerUnset
                    }
                } else {
                    WireEvidence::Payload
                };
                match evolution::resolve(f.cardinality, evidence, at)? {
                    Visibility::Present => {
                        let v = decode_field_payload(reader, &f.ty)?;
                        map.insert(f.name.clone(), v);
                    }
                    Visibility::Absent => {}
                }
            }
        }
    }
    Ok(Value::Struct(map))
}

pub(crate) fn decode_field_payload(
    reader: &mut ByteReader<'_>,
    ty: &TypeDescriptor,
) -> Result<Value, WireError> {
    match &ty.kind {
        TypeKind::Primitive(_) => decode_value(reader, ty),
        TypeKind::Struct(_) | TypeKind::Choice(_) => {
            let len = reader.read_u32_le()? as usize;
            let body = reader.read_bytes(len)?;
            // Leftover bytes inside the prefix come from a newer writer's
            // appended ordinals; the prefix bounds them away from our walk.
            let mut sub = ByteReader::new(body);
            decode_value(&mut sub, ty)
        }
    }
}

fn skip_width(reader: &mut ByteReader<'_>, width: WireWidth) -> Result<(), WireError> {
    match width {
        WireWidth::Fixed(n) => reader.skip(n),
        WireWidth::Prefixed => {
            let len = reader.read_u32_le()? as usize;
            reader.skip(len)
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

pub(crate) fn payload_len_u32(len: usize) -> Result<u32, WireError> {
    u32::try_from(len).map_err(|_| WireError::BufferSizeMismatch {
        expected: len,
        actual: u32::MAX as usize,
    })
}

fn mismatch(kind: PrimitiveKind, value: &Value) -> WireError {
    WireError::TypeMismatch {
        expected: format!("{:?}", kind),
        found: format!("{:?}", value),
    }
}

fn check_primitive_shape(value: &Value, kind: PrimitiveKind) -> Result<(), WireError> {
    let ok = matches!(
        (value, kind),
        (Value::Bool(_), PrimitiveKind::Bool)
            | (Value::U8(_), PrimitiveKind::U8)
            | (Value::U16(_), PrimitiveKind::U16)
            | (Value::U32(_), PrimitiveKind::U32)
            | (Value::U64(_), PrimitiveKind::U64)
            | (Value::I8(_), PrimitiveKind::I8)
            | (Value::I16(_), PrimitiveKind::I16)
            | (Value::I32(_), PrimitiveKind::I32)
            | (Value::I64(_), PrimitiveKind::I64)
            | (Value::F32(_), PrimitiveKind::F32)
            | (Value::F64(_), PrimitiveKind::F64)
    );
    if ok {
        Ok(())
    } else {
        Err(mismatch(kind, value))
    }
}
