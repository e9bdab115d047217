// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Choice encode/decode with fallback resolution.
//!
//! # Wire format
//!
//! A choice encodes as: tag ordinal (`u32`), payload byte count (`u32`),
//! payload bytes, and (iff the descriptor declares a fallback slot) the
//! recursively encoded fallback value. The payload count is what lets a
//! reader that does not recognize the tag skip straight to the fallback
//! region.
//!
//! **Singleton collapse**: a choice with exactly one variant and no fallback
//! elides tag and count, leaving the bare payload, byte-identical to the
//! single-field struct of that field. A schema refactor can therefore promote
//! a lone field into a future multi-variant choice without breaking
//! already-serialized data.
//!
//! # Decode states
//!
//! ReadTag → ResolveVariant on a recognized tag (terminal success);
//! ReadTag → ResolveFallback on an unrecognized tag with fallback bytes
//! remaining, looping back into ReadTag for the embedded value; → Failed
//! (`UnknownVariant`) when unrecognized with no bytes left to consult.
//!
//! Resolution loops with the reader's own descriptor: recognition is always
//! against the reader's variant set, which is what lets readers predating
//! the fallback declaration still land on an ancestor they know. The
//! declared slot type only governs what the writer embeds and how a
//! recognized-tag decode types the embedded value. Every loop iteration
//! consumes the tag and count words, so the cascade terminates.

use crate::cursor::{ByteReader, ByteWriter};
use crate::descriptor::ChoiceDescriptor;
use crate::value::Value;
use crate::wire::{self, WireError};

pub(crate) fn size_of_choice(value: &Value, desc: &ChoiceDescriptor) -> Result<usize, WireError> {
    let Value::Choice {
        tag,
        payload,
        fallback,
        ..
    } = value
    else {
        return Err(WireError::TypeMismatch {
            expected: "choice".into(),
            found: format!("{:?}", value),
        });
    };

    let variant = desc
        .variant_by_tag(*tag)
        .ok_or(WireError::UnknownVariant { tag: *tag })?;

    if desc.is_singleton() {
        if fallback.is_some() {
            return Err(WireError::TypeMismatch {
                expected: "no fallback value".into(),
                found: "fallback value".into(),
            });
        }
        return wire::size_of_field_payload(payload, &variant.ty);
    }

    let mut total = 4 + 4 + wire::size_of_value(payload, &variant.ty)?;
    match (&desc.fallback, fallback) {
        (Some(fb_ty), Some(fb_value)) => total += wire::size_of_value(fb_value, fb_ty)?,
        (Some(_), None) => return Err(WireError::MissingField("fallback".into())),
        (None, Some(_)) => {
            return Err(WireError::TypeMismatch {
                expected: "no fallback value".into(),
                found: "fallback value".into(),
            })
        }
        (None, None) => {}
    }
    Ok(total)
}

pub(crate) fn encode_choice(
    writer: &mut ByteWriter<'_>,
    value: &Value,
    desc: &ChoiceDescriptor,
    type_name: &str,
) -> Result<(), WireError> {
    let Value::Choice {
        tag,
        payload,
        fallback,
        ..
    } = value
    else {
        return Err(WireError::TypeMismatch {
            expected: "choice".into(),
            found: format!("{:?}", value),
        });
    };

    let variant = desc
        .variant_by_tag(*tag)
        .ok_or(WireError::UnknownVariant { tag: *tag })?;

    if desc.is_singleton() {
        if fallback.is_some() {
            return Err(WireError::TypeMismatch {
                expected: "no fallback value".into(),
                found: "fallback value".into(),
            });
        }
        return wire::encode_field_payload(writer, payload, &variant.ty);
    }

    writer.write_u32_le(*tag)?;
    let count_at = writer.offset();
    writer.write_u32_le(0)?;
    let payload_start = writer.offset();
    wire::encode_value(writer, payload, &variant.ty)?;
    let payload_len = writer.offset() - payload_start;
    writer.patch_u32_le(count_at, wire::payload_len_u32(payload_len)?)?;

    match (&desc.fallback, fallback) {
        (Some(fb_ty), Some(fb_value)) => wire::encode_value(writer, fb_value, fb_ty),
        (Some(_), None) => Err(WireError::MissingField("fallback".into())),
        (None, Some(_)) => Err(WireError::TypeMismatch {
            expected: "no fallback value".into(),
            found: format!("fallback value in {}", type_name),
        }),
        (None, None) => Ok(()),
    }
}

pub(crate) fn decode_choice(
    reader: &mut ByteReader<'_>,
    desc: &ChoiceDescriptor,
    type_name: &str,
) -> Result<Value, WireError> {
    if desc.is_singleton() {
        let variant = &desc.variants()[0];
        let payload = wire::decode_field_payload(reader, &variant.ty)?;
        return Ok(Value::Choice {
            tag: variant.tag,
            name: variant.name.clone(),
            payload: Box::new(payload),
            fallback: None,
        });
    }

    let tag = reader.read_u32_le()?;
    let payload_len = reader.read_u32_le()? as usize;

    match desc.variant_by_tag(tag) {
        Some(variant) => {
            let body = reader.read_bytes(payload_len)?;
            let mut sub = ByteReader::new(body);
            let payload = wire::decode_value(&mut sub, &variant.ty)?;

            // A declared slot with no bytes left comes from a writer version
            // that predates the slot; tolerate it.
            let fallback = match &desc.fallback {
                Some(fb_ty) if !reader.is_eof() => {
                    Some(Box::new(wire::decode_value(reader, fb_ty)?))
                }
                _ => None,
            };

            Ok(Value::Choice {
                tag,
                name: variant.name.clone(),
                payload: Box::new(payload),
                fallback,
            })
        }
        None => {
            reader.skip(payload_len)?;
            if reader.is_eof() {
                return Err(WireError::UnknownVariant { tag });
            }
            log::debug!(
                "[CHOICE] tag {} unrecognized in {}, resolving embedded fallback",
                tag,
                type_name
            );
            decode_choice(reader, desc, type_name)
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::builder::{ChoiceBuilder, StructBuilder};
    use crate::record::Record;
    use crate::value::Value;
    use crate::wire::{deserialize, serialize, wire_size, WireError};
    use crate::PrimitiveKind as P;
    use crate::TypeDescriptor;
    use std::sync::Arc;

    fn event_v1() -> Arc<TypeDescriptor> {
        Arc::new(
            ChoiceBuilder::new("Event")
                .variant("started", P::Bool)
                .variant("message", P::String)
                .build(),
        )
    }

    fn event_v2() -> Arc<TypeDescriptor> {
        Arc::new(
            ChoiceBuilder::new("Event")
                .variant("started", P::Bool)
                .variant("message", P::String)
                .variant("count", P::U64)
                .fallback(event_v1())
                .build(),
        )
    }

    #[test]
    fn test_choice_roundtrip() {
        let desc = event_v1();
        let mut data = Record::new(&desc);
        data.select("message", Value::from("hello")).expect("select");

        let bytes = serialize(&data).expect("serialize");
        assert_eq!(bytes.len(), wire_size(&data).expect("size"));
        // tag + count + (len + 5 bytes)
        assert_eq!(bytes.len(), 4 + 4 + 4 + 5);

        let decoded = deserialize(&bytes, &desc).expect("deserialize");
        assert_eq!(decoded, data);
    }

    #[test]
    fn test_unrecognized_tag_resolves_fallback() {
        let v2 = event_v2();
        let mut data = Record::new(&v2);
        data.select("count", Value::U64(99)).expect("select");
        let mut fb = Record::new(&event_v1());
        fb.select("message", Value::from("fallback msg")).expect("select fb");
        data.set_fallback(fb).expect("set fallback");

        let bytes = serialize(&data).expect("serialize");

        // A v1 reader does not know tag 2 and lands on the embedded value.
        let decoded = deserialize(&bytes, &event_v1()).expect("deserialize");
        assert_eq!(decoded.value().choice_name(), Some("message"));
        assert_eq!(
            decoded.value().choice_payload().and_then(Value::as_str),
            Some("fallback msg")
        );
    }

    #[test]
    fn test_unrecognized_tag_without_fallback_fails() {
        let v2_no_fb = Arc::new(
            ChoiceBuilder::new("Event")
                .variant("started", P::Bool)
                .variant("message", P::String)
                .variant("count", P::U64)
                .build(),
        );
        let mut data = Record::new(&v2_no_fb);
        data.select("count", Value::U64(1)).expect("select");

        let bytes = serialize(&data).expect("serialize");
        let err = deserialize(&bytes, &event_v1()).unwrap_err();
        match err {
            WireError::UnknownVariant { tag } => assert_eq!(tag, 2),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_fallback_chain_depth_two() {
        // v3 falls back to v2, which falls back to v1. A v1 reader of a
        // v3-only tag cascades through both levels.
        let v3 = Arc::new(
            ChoiceBuilder::new("Event")
                .variant("started", P::Bool)
                .variant("message", P::String)
                .variant("count", P::U64)
                .variant("ratio", P::F64)
                .fallback(event_v2())
                .build(),
        );

        let mut oldest = Record::new(&event_v1());
        oldest.select("started", Value::Bool(true)).expect("select v1");

        let mut middle = Record::new(&event_v2());
        middle.select("count", Value::U64(5)).expect("select v2");
        middle.set_fallback(oldest).expect("fallback v2");

        let mut newest = Record::new(&v3);
        newest.select("ratio", Value::F64(0.5)).expect("select v3");
        newest.set_fallback(middle).expect("fallback v3");

        let bytes = serialize(&newest).expect("serialize");

        // A v2 reader recognizes the middle ancestor's tag.
        let at_v2 = deserialize(&bytes, &event_v2()).expect("v2 deserialize");
        assert_eq!(at_v2.value().choice_name(), Some("count"));
        assert_eq!(
            at_v2.value().choice_payload().and_then(Value::as_u64),
            Some(5)
        );

        // A v1 reader cascades down to the oldest ancestor.
        let at_v1 = deserialize(&bytes, &event_v1()).expect("v1 deserialize");
        assert_eq!(at_v1.value().choice_name(), Some("started"));
        assert_eq!(
            at_v1.value().choice_payload().and_then(Value::as_bool),
            Some(true)
        );
    }

    #[test]
    fn test_missing_fallback_value_on_encode() {
        let v2 = event_v2();
        let mut data = Record::new(&v2);
        data.select("count", Value::U64(3)).expect("select");
        if let Value::Choice { fallback, .. } = data.value_mut() {
            *fallback = None;
        }

        let err = serialize(&data).unwrap_err();
        match err {
            WireError::MissingField(name) => assert_eq!(name, "fallback"),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_singleton_collapse_byte_identity() {
        let lone_choice = Arc::new(
            ChoiceBuilder::new("Wrapped")
                .variant("payload", P::U32)
                .build(),
        );
        let lone_struct = Arc::new(
            StructBuilder::new("Wrapped")
                .field("payload", P::U32)
                .build(),
        );

        let mut as_choice = Record::new(&lone_choice);
        as_choice.select("payload", Value::U32(0xAABB)).expect("select");
        let mut as_struct = Record::new(&lone_struct);
        as_struct.set("payload", 0xAABBu32).expect("set");

        let choice_bytes = serialize(&as_choice).expect("serialize choice");
        let struct_bytes = serialize(&as_struct).expect("serialize struct");
        assert_eq!(choice_bytes, struct_bytes);

        // Each decodes the other's bytes into its own shape.
        let cross_choice = deserialize(&struct_bytes, &lone_choice).expect("cross choice");
        assert_eq!(
            cross_choice.value().choice_payload().and_then(Value::as_u32),
            Some(0xAABB)
        );
        let cross_struct = deserialize(&choice_bytes, &lone_struct).expect("cross struct");
        assert_eq!(cross_struct.get::<u32>("payload").expect("payload"), 0xAABB);
    }

    #[test]
    fn test_singleton_collapse_string_payload() {
        let lone_choice = Arc::new(
            ChoiceBuilder::new("Tag")
                .variant("label", P::String)
                .build(),
        );
        let lone_struct = Arc::new(StructBuilder::new("Tag").field("label", P::String).build());

        let mut as_choice = Record::new(&lone_choice);
        as_choice.select("label", Value::from("x")).expect("select");
        let mut as_struct = Record::new(&lone_struct);
        as_struct.set("label", "x").expect("set");

        assert_eq!(
            serialize(&as_choice).expect("choice"),
            serialize(&as_struct).expect("struct")
        );
    }
}
