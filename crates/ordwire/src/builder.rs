// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Fluent builder API for type descriptors.
//!
//! Ordinals and tags auto-increment in declaration order; a tombstone or an
//! explicit member advances the counter past its ordinal so later additions
//! never collide. Schema compilers driving this API pass explicit ordinals
//! through [`StructBuilder::member`].

use crate::descriptor::{
    ChoiceDescriptor, FieldDescriptor, PrimitiveKind, StructMember, Tombstone, TypeDescriptor,
    VariantDescriptor,
};
use std::sync::Arc;

/// Builder for struct type descriptors.
#[derive(Debug)]
pub struct StructBuilder {
    name: String,
    members: Vec<StructMember>,
    next_ordinal: u32,
}

impl StructBuilder {
    /// Create a new builder for a struct type.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: Vec::new(),
            next_ordinal: 0,
        }
    }

    /// Add a required primitive field.
    pub fn field(self, name: impl Into<String>, kind: PrimitiveKind) -> Self {
        let ty = Arc::new(TypeDescriptor::primitive("", kind));
        self.field_with_type(name, ty)
    }

    /// Add a required field with a type descriptor.
    pub fn field_with_type(mut self, name: impl Into<String>, ty: Arc<TypeDescriptor>) -> Self {
        let ordinal = self.take_ordinal();
        self.members
            .push(StructMember::Field(FieldDescriptor::new(name, ty, ordinal)));
        self
    }

    /// Add an optional primitive field (owns a presence marker).
    pub fn optional_field(self, name: impl Into<String>, kind: PrimitiveKind) -> Self {
        let ty = Arc::new(TypeDescriptor::primitive("", kind));
        self.optional_field_with_type(name, ty)
    }

    /// Add an optional field with a type descriptor.
    pub fn optional_field_with_type(
        mut self,
        name: impl Into<String>,
        ty: Arc<TypeDescriptor>,
    ) -> Self {
        let ordinal = self.take_ordinal();
        self.members.push(StructMember::Field(
            FieldDescriptor::new(name, ty, ordinal).optional(),
        ));
        self
    }

    /// Add an asymmetric primitive field (always written, read as optional).
    pub fn asymmetric_field(self, name: impl Into<String>, kind: PrimitiveKind) -> Self {
        let ty = Arc::new(TypeDescriptor::primitive("", kind));
        self.asymmetric_field_with_type(name, ty)
    }

    /// Add an asymmetric field with a type descriptor.
    pub fn asymmetric_field_with_type(
        mut self,
        name: impl Into<String>,
        ty: Arc<TypeDescriptor>,
    ) -> Self {
        let ordinal = self.take_ordinal();
        self.members.push(StructMember::Field(
            FieldDescriptor::new(name, ty, ordinal).asymmetric(),
        ));
        self
    }

    /// Record a removed field's tombstone.
    pub fn tombstone(mut self, tombstone: Tombstone) -> Self {
        self.next_ordinal = self.next_ordinal.max(tombstone.ordinal + 1);
        self.members.push(StructMember::Tombstone(tombstone));
        self
    }

    /// Add a fully specified field (explicit ordinal, cardinality, presence).
    pub fn member(mut self, field: FieldDescriptor) -> Self {
        self.next_ordinal = self.next_ordinal.max(field.ordinal + 1);
        self.members.push(StructMember::Field(field));
        self
    }

    /// Build the TypeDescriptor.
    pub fn build(self) -> TypeDescriptor {
        TypeDescriptor::struct_type(self.name, self.members)
    }

    fn take_ordinal(&mut self) -> u32 {
        let ordinal = self.next_ordinal;
        self.next_ordinal += 1;
        ordinal
    }
}

/// Builder for choice type descriptors.
#[derive(Debug)]
pub struct ChoiceBuilder {
    name: String,
    variants: Vec<VariantDescriptor>,
    fallback: Option<Arc<TypeDescriptor>>,
    next_tag: u32,
}

impl ChoiceBuilder {
    /// Create a new builder for a choice type.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            variants: Vec::new(),
            fallback: None,
            next_tag: 0,
        }
    }

    /// Add a variant with a primitive payload.
    pub fn variant(self, name: impl Into<String>, kind: PrimitiveKind) -> Self {
        let ty = Arc::new(TypeDescriptor::primitive("", kind));
        self.variant_with_type(name, ty)
    }

    /// Add a variant with a type descriptor payload.
    pub fn variant_with_type(mut self, name: impl Into<String>, ty: Arc<TypeDescriptor>) -> Self {
        let tag = self.next_tag;
        self.next_tag += 1;
        self.variants.push(VariantDescriptor::new(tag, name, ty));
        self
    }

    /// Add a variant with an explicit tag.
    pub fn variant_at(mut self, tag: u32, name: impl Into<String>, ty: Arc<TypeDescriptor>) -> Self {
        self.next_tag = self.next_tag.max(tag + 1);
        self.variants.push(VariantDescriptor::new(tag, name, ty));
        self
    }

    /// Declare the fallback slot (conventionally the same choice type at an
    /// earlier version).
    pub fn fallback(mut self, ty: Arc<TypeDescriptor>) -> Self {
        self.fallback = Some(ty);
        self
    }

    /// Build the TypeDescriptor.
    pub fn build(self) -> TypeDescriptor {
        TypeDescriptor::choice_type(self.name, ChoiceDescriptor::new(self.variants, self.fallback))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{Cardinality, TypeKind, WireWidth};

    #[test]
    fn test_struct_builder_assigns_ordinals() {
        let desc = StructBuilder::new("Point3D")
            .field("x", PrimitiveKind::F64)
            .field("y", PrimitiveKind::F64)
            .field("z", PrimitiveKind::F64)
            .build();

        assert_eq!(desc.name, "Point3D");
        let s = desc.as_struct().expect("struct");
        let ordinals: Vec<u32> = s.fields().map(|f| f.ordinal).collect();
        assert_eq!(ordinals, vec![0, 1, 2]);
    }

    #[test]
    fn test_struct_builder_cardinalities() {
        let desc = StructBuilder::new("Reading")
            .field("id", PrimitiveKind::U32)
            .asymmetric_field("unit", PrimitiveKind::String)
            .optional_field("note", PrimitiveKind::String)
            .build();

        let s = desc.as_struct().expect("struct");
        assert_eq!(s.field("id").map(|f| f.cardinality), Some(Cardinality::Required));
        assert_eq!(
            s.field("unit").map(|f| f.cardinality),
            Some(Cardinality::Asymmetric)
        );
        assert_eq!(
            s.field("note").map(|f| f.cardinality),
            Some(Cardinality::Optional)
        );
        assert_eq!(s.field("id").map(|f| f.presence), Some(false));
        assert_eq!(s.field("unit").map(|f| f.presence), Some(true));
        assert_eq!(s.field("note").map(|f| f.presence), Some(true));
    }

    #[test]
    fn test_struct_builder_tombstone_advances_ordinal() {
        let desc = StructBuilder::new("Evolved")
            .field("kept", PrimitiveKind::U32)
            .tombstone(Tombstone::new(1, WireWidth::Fixed(8)))
            .field("added", PrimitiveKind::Bool)
            .build();

        let s = desc.as_struct().expect("struct");
        assert_eq!(s.members().len(), 3);
        assert_eq!(s.field("added").map(|f| f.ordinal), Some(2));
    }

    #[test]
    fn test_choice_builder_tags() {
        let desc = ChoiceBuilder::new("Shape")
            .variant("circle", PrimitiveKind::F64)
            .variant("square", PrimitiveKind::U32)
            .build();

        let c = desc.as_choice().expect("choice");
        assert_eq!(c.variants().len(), 2);
        assert_eq!(c.variant("square").map(|v| v.tag), Some(1));
        assert!(c.fallback.is_none());
    }

    #[test]
    fn test_choice_builder_explicit_tag_and_fallback() {
        let older = Arc::new(
            ChoiceBuilder::new("Shape")
                .variant("circle", PrimitiveKind::F64)
                .build(),
        );
        let desc = ChoiceBuilder::new("Shape")
            .variant("circle", PrimitiveKind::F64)
            .variant_at(
                5,
                "polygon",
                Arc::new(TypeDescriptor::primitive("", PrimitiveKind::U32)),
            )
            .fallback(older.clone())
            .build();

        let c = desc.as_choice().expect("choice");
        assert_eq!(c.variant("polygon").map(|v| v.tag), Some(5));
        match &c.fallback {
            Some(fb) => assert!(matches!(fb.kind, TypeKind::Choice(_))),
            None => panic!("expected fallback"),
        }
    }
}
