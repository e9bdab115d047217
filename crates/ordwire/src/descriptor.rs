// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type descriptors for runtime type information.
//!
//! Descriptors are produced once (by a schema compiler or the builder API)
//! and are immutable for the process lifetime. Field and variant identity
//! across schema versions is the compiler-assigned ordinal, never the
//! declaration position.

use std::sync::Arc;

/// Primitive type kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Bool,
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
    String,
    Bytes,
}

impl PrimitiveKind {
    /// Get the encoded size in bytes (None for variable-width kinds).
    pub fn fixed_width(&self) -> Option<usize> {
        match self {
            Self::Bool | Self::U8 | Self::I8 => Some(1),
            Self::U16 | Self::I16 => Some(2),
            Self::U32 | Self::I32 | Self::F32 => Some(4),
            Self::U64 | Self::I64 | Self::F64 => Some(8),
            Self::String | Self::Bytes => None,
        }
    }
}

/// Wire width class of a payload, as retained by tombstones.
///
/// `Prefixed` payloads carry a leading `u32` byte count so a reader can skip
/// them without interpreting their contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireWidth {
    /// Payload occupies exactly this many bytes.
    Fixed(usize),
    /// Payload is length-prefixed (strings, bytes, nested composites).
    Prefixed,
}

/// Presence contract of a struct field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    /// Present in every value; consumes no presence marker when born required.
    Required,
    /// Always supplied by the writer, exposed as optional to readers. The
    /// stepping stone that lets a later version relax the field to Optional.
    Asymmetric,
    /// May be absent; presence recorded by an explicit wire marker.
    Optional,
}

/// Type kind enumeration.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeKind {
    /// Primitive type.
    Primitive(PrimitiveKind),
    /// Fixed-field aggregate.
    Struct(StructDescriptor),
    /// Tagged union.
    Choice(ChoiceDescriptor),
}

/// A complete type descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDescriptor {
    /// Type name.
    pub name: String,
    /// Type kind.
    pub kind: TypeKind,
}

impl TypeDescriptor {
    /// Create a new type descriptor.
    pub fn new(name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// Create a primitive type descriptor.
    pub fn primitive(name: impl Into<String>, kind: PrimitiveKind) -> Self {
        Self::new(name, TypeKind::Primitive(kind))
    }

    /// Create a struct type descriptor. Members are sorted ordinal-ascending.
    pub fn struct_type(name: impl Into<String>, members: Vec<StructMember>) -> Self {
        Self::new(name, TypeKind::Struct(StructDescriptor::new(members)))
    }

    /// Create a choice type descriptor.
    pub fn choice_type(name: impl Into<String>, descriptor: ChoiceDescriptor) -> Self {
        Self::new(name, TypeKind::Choice(descriptor))
    }

    /// Check if this is a primitive type.
    pub fn is_primitive(&self) -> bool {
        matches!(self.kind, TypeKind::Primitive(_))
    }

    /// Check if this is a struct type.
    pub fn is_struct(&self) -> bool {
        matches!(self.kind, TypeKind::Struct(_))
    }

    /// Check if this is a choice type.
    pub fn is_choice(&self) -> bool {
        matches!(self.kind, TypeKind::Choice(_))
    }

    /// Get the struct descriptor if this is a struct.
    pub fn as_struct(&self) -> Option<&StructDescriptor> {
        match &self.kind {
            TypeKind::Struct(s) => Some(s),
            _ => None,
        }
    }

    /// Get the choice descriptor if this is a choice.
    pub fn as_choice(&self) -> Option<&ChoiceDescriptor> {
        match &self.kind {
            TypeKind::Choice(c) => Some(c),
            _ => None,
        }
    }

    /// Get a live field by name if this is a struct.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.as_struct()?.field(name)
    }

    /// Wire width class of a value of this type.
    pub fn wire_width(&self) -> WireWidth {
        match &self.kind {
            TypeKind::Primitive(p) => match p.fixed_width() {
                Some(n) => WireWidth::Fixed(n),
                None => WireWidth::Prefixed,
            },
            TypeKind::Struct(_) | TypeKind::Choice(_) => WireWidth::Prefixed,
        }
    }
}

/// Field descriptor for struct members.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    /// Field name.
    pub name: String,
    /// Payload type.
    pub ty: Arc<TypeDescriptor>,
    /// Presence contract in this schema version.
    pub cardinality: Cardinality,
    /// Stable ordinal, assigned at schema-definition time and preserved
    /// across all versions of the type.
    pub ordinal: u32,
    /// Whether this ordinal owns a presence marker on the wire. Assigned at
    /// field birth and immutable across versions: fields born Optional or
    /// Asymmetric carry the marker through every later cardinality
    /// transition, fields born Required never gain one.
    pub presence: bool,
}

impl FieldDescriptor {
    /// Create a required field with no presence marker.
    pub fn new(name: impl Into<String>, ty: Arc<TypeDescriptor>, ordinal: u32) -> Self {
        Self {
            name: name.into(),
            ty,
            cardinality: Cardinality::Required,
            ordinal,
            presence: false,
        }
    }

    /// Mark as optional (allocates the presence marker).
    pub fn optional(mut self) -> Self {
        self.cardinality = Cardinality::Optional;
        self.presence = true;
        self
    }

    /// Mark as asymmetric (allocates the presence marker).
    pub fn asymmetric(mut self) -> Self {
        self.cardinality = Cardinality::Asymmetric;
        self.presence = true;
        self
    }

    /// Override the cardinality, keeping the presence flag untouched. Used
    /// to model a later version promoting an optional-born field.
    pub fn with_cardinality(mut self, cardinality: Cardinality) -> Self {
        self.cardinality = cardinality;
        self
    }

    /// Wire width class of this field's payload.
    pub fn wire_width(&self) -> WireWidth {
        self.ty.wire_width()
    }
}

/// Width-only descriptor retained for a removed field so readers can still
/// skip its bytes. Exposes no name and no value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tombstone {
    /// Ordinal of the removed field.
    pub ordinal: u32,
    /// Wire width class the removed field had.
    pub width: WireWidth,
    /// Whether the removed field owned a presence marker.
    pub presence: bool,
}

impl Tombstone {
    /// Create a tombstone for a removed field without a presence marker.
    pub fn new(ordinal: u32, width: WireWidth) -> Self {
        Self {
            ordinal,
            width,
            presence: false,
        }
    }

    /// Create a tombstone for a removed field that owned a presence marker.
    pub fn slotted(ordinal: u32, width: WireWidth) -> Self {
        Self {
            ordinal,
            width,
            presence: true,
        }
    }
}

/// A struct member: a live field or the tombstone of a removed one.
#[derive(Debug, Clone, PartialEq)]
pub enum StructMember {
    Field(FieldDescriptor),
    Tombstone(Tombstone),
}

impl StructMember {
    /// Stable ordinal of this member.
    pub fn ordinal(&self) -> u32 {
        match self {
            Self::Field(f) => f.ordinal,
            Self::Tombstone(t) => t.ordinal,
        }
    }

    /// Whether this ordinal owns a presence marker on the wire.
    pub fn presence(&self) -> bool {
        match self {
            Self::Field(f) => f.presence,
            Self::Tombstone(t) => t.presence,
        }
    }
}

/// Struct type descriptor: members ordered ordinal-ascending.
#[derive(Debug, Clone, PartialEq)]
pub struct StructDescriptor {
    members: Vec<StructMember>,
}

impl StructDescriptor {
    /// Create a struct descriptor, sorting members by ordinal.
    pub fn new(mut members: Vec<StructMember>) -> Self {
        members.sort_by_key(StructMember::ordinal);
        Self { members }
    }

    /// Members in ascending ordinal order.
    pub fn members(&self) -> &[StructMember] {
        &self.members
    }

    /// Iterate over live fields in ascending ordinal order.
    pub fn fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.members.iter().filter_map(|m| match m {
            StructMember::Field(f) => Some(f),
            StructMember::Tombstone(_) => None,
        })
    }

    /// Get a live field by name.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields().find(|f| f.name == name)
    }
}

/// Variant descriptor for choice members.
#[derive(Debug, Clone, PartialEq)]
pub struct VariantDescriptor {
    /// Stable tag ordinal.
    pub tag: u32,
    /// Variant name.
    pub name: String,
    /// Payload type.
    pub ty: Arc<TypeDescriptor>,
}

impl VariantDescriptor {
    /// Create a variant descriptor.
    pub fn new(tag: u32, name: impl Into<String>, ty: Arc<TypeDescriptor>) -> Self {
        Self {
            tag,
            name: name.into(),
            ty,
        }
    }
}

/// Choice type descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct ChoiceDescriptor {
    /// Known variants, ordered tag-ascending.
    variants: Vec<VariantDescriptor>,
    /// Payload type decoded when the selected tag is unrecognized,
    /// conventionally the same choice type at an earlier version. Chains are
    /// finite and acyclic by construction (checked at registration).
    pub fallback: Option<Arc<TypeDescriptor>>,
}

impl ChoiceDescriptor {
    /// Create a choice descriptor, sorting variants by tag.
    pub fn new(mut variants: Vec<VariantDescriptor>, fallback: Option<Arc<TypeDescriptor>>) -> Self {
        variants.sort_by_key(|v| v.tag);
        Self { variants, fallback }
    }

    /// Variants in ascending tag order.
    pub fn variants(&self) -> &[VariantDescriptor] {
        &self.variants
    }

    /// Get a variant by tag.
    pub fn variant_by_tag(&self, tag: u32) -> Option<&VariantDescriptor> {
        self.variants.iter().find(|v| v.tag == tag)
    }

    /// Get a variant by name.
    pub fn variant(&self, name: &str) -> Option<&VariantDescriptor> {
        self.variants.iter().find(|v| v.name == name)
    }

    /// A one-variant choice with no fallback collapses on the wire to the
    /// bare payload, byte-identical to the single-field struct of that field.
    pub fn is_singleton(&self) -> bool {
        self.variants.len() == 1 && self.fallback.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_fixed_width() {
        assert_eq!(PrimitiveKind::Bool.fixed_width(), Some(1));
        assert_eq!(PrimitiveKind::U32.fixed_width(), Some(4));
        assert_eq!(PrimitiveKind::F64.fixed_width(), Some(8));
        assert_eq!(PrimitiveKind::String.fixed_width(), None);
        assert_eq!(PrimitiveKind::Bytes.fixed_width(), None);
    }

    #[test]
    fn test_wire_width_classification() {
        let u32_ty = TypeDescriptor::primitive("uint32", PrimitiveKind::U32);
        assert_eq!(u32_ty.wire_width(), WireWidth::Fixed(4));

        let text_ty = TypeDescriptor::primitive("text", PrimitiveKind::String);
        assert_eq!(text_ty.wire_width(), WireWidth::Prefixed);

        let nested = TypeDescriptor::struct_type("Empty", vec![]);
        assert_eq!(nested.wire_width(), WireWidth::Prefixed);
    }

    #[test]
    fn test_struct_members_sorted_by_ordinal() {
        let u32_ty = Arc::new(TypeDescriptor::primitive("uint32", PrimitiveKind::U32));
        let desc = TypeDescriptor::struct_type(
            "Reading",
            vec![
                StructMember::Field(FieldDescriptor::new("b", u32_ty.clone(), 2)),
                StructMember::Tombstone(Tombstone::new(1, WireWidth::Fixed(8))),
                StructMember::Field(FieldDescriptor::new("a", u32_ty, 0)),
            ],
        );

        let s = desc.as_struct().expect("struct");
        let ordinals: Vec<u32> = s.members().iter().map(StructMember::ordinal).collect();
        assert_eq!(ordinals, vec![0, 1, 2]);
        assert!(s.field("a").is_some());
        assert!(s.field("missing").is_none());
    }

    #[test]
    fn test_field_cardinality_and_presence() {
        let text = Arc::new(TypeDescriptor::primitive("text", PrimitiveKind::String));
        let required = FieldDescriptor::new("id", text.clone(), 0);
        assert_eq!(required.cardinality, Cardinality::Required);
        assert!(!required.presence);

        let optional = FieldDescriptor::new("note", text.clone(), 1).optional();
        assert_eq!(optional.cardinality, Cardinality::Optional);
        assert!(optional.presence);

        // Optional-born field promoted to required keeps its marker.
        let promoted = FieldDescriptor::new("note", text, 1)
            .optional()
            .with_cardinality(Cardinality::Required);
        assert_eq!(promoted.cardinality, Cardinality::Required);
        assert!(promoted.presence);
    }

    #[test]
    fn test_choice_variant_lookup() {
        let b = Arc::new(TypeDescriptor::primitive("flag", PrimitiveKind::Bool));
        let t = Arc::new(TypeDescriptor::primitive("text", PrimitiveKind::String));
        let choice = ChoiceDescriptor::new(
            vec![
                VariantDescriptor::new(1, "label", t),
                VariantDescriptor::new(0, "flag", b),
            ],
            None,
        );

        assert_eq!(choice.variants()[0].tag, 0);
        assert_eq!(choice.variant_by_tag(1).map(|v| v.name.as_str()), Some("label"));
        assert!(choice.variant_by_tag(7).is_none());
        assert!(!choice.is_singleton());
    }

    #[test]
    fn test_singleton_choice() {
        let b = Arc::new(TypeDescriptor::primitive("flag", PrimitiveKind::Bool));
        let one = ChoiceDescriptor::new(vec![VariantDescriptor::new(0, "flag", b.clone())], None);
        assert!(one.is_singleton());

        let with_fallback = ChoiceDescriptor::new(
            vec![VariantDescriptor::new(0, "flag", b.clone())],
            Some(Arc::new(TypeDescriptor::choice_type(
                "Old",
                ChoiceDescriptor::new(vec![VariantDescriptor::new(0, "flag", b)], None),
            ))),
        );
        assert!(!with_fallback.is_singleton());
    }
}
