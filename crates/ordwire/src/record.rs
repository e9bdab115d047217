// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Record container for runtime data manipulation.

use crate::descriptor::{Cardinality, PrimitiveKind, TypeDescriptor, TypeKind};
use crate::value::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Errors for Record operations.
#[derive(Debug)]
pub enum RecordError {
    FieldNotFound(String),
    VariantNotFound(String),
    TypeMismatch { expected: String, got: String },
    InvalidOperation(String),
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FieldNotFound(name) => write!(f, "field not found: {}", name),
            Self::VariantNotFound(name) => write!(f, "variant not found: {}", name),
            Self::TypeMismatch { expected, got } => {
                write!(f, "type mismatch: expected {}, got {}", expected, got)
            }
            Self::InvalidOperation(msg) => write!(f, "invalid operation for type: {}", msg),
        }
    }
}

impl std::error::Error for RecordError {}

/// Data container pairing a value with its type descriptor.
#[derive(Debug, Clone)]
pub struct Record {
    /// Type descriptor.
    descriptor: Arc<TypeDescriptor>,
    /// Actual value.
    value: Value,
}

impl Record {
    /// Create a new Record with default values. Required and asymmetric
    /// fields get zero/empty defaults; optional fields start absent.
    pub fn new(descriptor: &Arc<TypeDescriptor>) -> Self {
        let value = Self::default_value(&descriptor.kind);
        Self {
            descriptor: descriptor.clone(),
            value,
        }
    }

    /// Create from an existing value.
    pub fn from_value(
        descriptor: &Arc<TypeDescriptor>,
        value: Value,
    ) -> Result<Self, RecordError> {
        let data = Self {
            descriptor: descriptor.clone(),
            value,
        };
        Ok(data)
    }

    /// Get the type descriptor.
    pub fn descriptor(&self) -> &Arc<TypeDescriptor> {
        &self.descriptor
    }

    /// Get the type name.
    pub fn type_name(&self) -> &str {
        &self.descriptor.name
    }

    /// Get the underlying value.
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Get mutable reference to the value.
    pub fn value_mut(&mut self) -> &mut Value {
        &mut self.value
    }

    /// Into inner value.
    pub fn into_value(self) -> Value {
        self.value
    }

    /// Get a struct field by name, converted to a concrete type.
    pub fn get<T: FromValue>(&self, name: &str) -> Result<T, RecordError> {
        let field_value = self.field_value(name)?;
        T::from_value(field_value)
    }

    /// Get an optional struct field: `None` when absent.
    pub fn try_get<T: FromValue>(&self, name: &str) -> Result<Option<T>, RecordError> {
        if self.descriptor.field(name).is_none() {
            return Err(RecordError::FieldNotFound(name.to_string()));
        }
        match self.value.get_field(name) {
            Some(v) => T::from_value(v).map(Some),
            None => Ok(None),
        }
    }

    /// Set a struct field by name.
    pub fn set<T: IntoValue>(&mut self, name: &str, value: T) -> Result<(), RecordError> {
        if self.descriptor.field(name).is_none() {
            return Err(RecordError::FieldNotFound(name.to_string()));
        }
        if !self.value.set_field(name, value.into_value()) {
            return Err(RecordError::InvalidOperation("set requires struct type".into()));
        }
        Ok(())
    }

    /// Set a struct field to a nested record's value.
    pub fn set_record(&mut self, name: &str, nested: Record) -> Result<(), RecordError> {
        self.set(name, nested.into_value())
    }

    /// Make a field absent. Only meaningful for optional fields.
    pub fn clear(&mut self, name: &str) -> Result<(), RecordError> {
        if self.descriptor.field(name).is_none() {
            return Err(RecordError::FieldNotFound(name.to_string()));
        }
        self.value.clear_field(name);
        Ok(())
    }

    /// Whether a struct field is present.
    pub fn has(&self, name: &str) -> bool {
        self.value.get_field(name).is_some()
    }

    /// Select a choice variant by name, keeping any embedded fallback value.
    pub fn select(&mut self, variant: &str, payload: Value) -> Result<(), RecordError> {
        let choice = self.descriptor.as_choice().ok_or_else(|| {
            RecordError::InvalidOperation("select requires choice type".into())
        })?;
        let v = choice
            .variant(variant)
            .ok_or_else(|| RecordError::VariantNotFound(variant.to_string()))?;

        let fallback = match &mut self.value {
            Value::Choice { fallback, .. } => fallback.take(),
            _ => None,
        };
        self.value = Value::Choice {
            tag: v.tag,
            name: v.name.clone(),
            payload: Box::new(payload),
            fallback,
        };
        Ok(())
    }

    /// Embed a fallback value (required when the descriptor declares a
    /// fallback slot).
    pub fn set_fallback(&mut self, fallback: Record) -> Result<(), RecordError> {
        let choice = self.descriptor.as_choice().ok_or_else(|| {
            RecordError::InvalidOperation("set_fallback requires choice type".into())
        })?;
        if choice.fallback.is_none() {
            return Err(RecordError::InvalidOperation(
                "descriptor declares no fallback slot".into(),
            ));
        }
        match &mut self.value {
            Value::Choice { fallback: slot, .. } => {
                *slot = Some(Box::new(fallback.into_value()));
                Ok(())
            }
            _ => Err(RecordError::InvalidOperation(
                "set_fallback requires choice value".into(),
            )),
        }
    }

    fn field_value(&self, name: &str) -> Result<&Value, RecordError> {
        if self.descriptor.field(name).is_none() {
            return Err(RecordError::FieldNotFound(name.to_string()));
        }
        self.value
            .get_field(name)
            .ok_or_else(|| RecordError::FieldNotFound(name.to_string()))
    }

    /// Create a default value for a type kind.
    fn default_value(kind: &TypeKind) -> Value {
        match kind {
            TypeKind::Primitive(p) => Self::default_primitive(*p),
            TypeKind::Struct(s) => {
                let mut map = HashMap::new();
                for field in s.fields() {
                    if field.cardinality == Cardinality::Optional {
                        continue;
                    }
                    map.insert(field.name.clone(), Self::default_value(&field.ty.kind));
                }
                Value::Struct(map)
            }
            TypeKind::Choice(c) => {
                // Fallback chains are acyclic, so the recursion terminates.
                let fallback = c
                    .fallback
                    .as_ref()
                    .map(|fb| Box::new(Self::default_value(&fb.kind)));
                match c.variants().first() {
                    Some(v) => Value::Choice {
                        tag: v.tag,
                        name: v.name.clone(),
                        payload: Box::new(Self::default_value(&v.ty.kind)),
                        fallback,
                    },
                    None => Value::Choice {
                        tag: 0,
                        name: String::new(),
                        payload: Box::new(Value::Bool(false)),
                        fallback,
                    },
                }
            }
        }
    }

    /// Create a default value for a primitive.
    fn default_primitive(kind: PrimitiveKind) -> Value {
        match kind {
            PrimitiveKind::Bool => Value::Bool(false),
            PrimitiveKind::U8 => Value::U8(0),
            PrimitiveKind::U16 => Value::U16(0),
            PrimitiveKind::U32 => Value::U32(0),
            PrimitiveKind::U64 => Value::U64(0),
            PrimitiveKind::I8 => Value::I8(0),
            PrimitiveKind::I16 => Value::I16(0),
            PrimitiveKind::I32 => Value::I32(0),
            PrimitiveKind::I64 => Value::I64(0),
            PrimitiveKind::F32 => Value::F32(0.0),
            PrimitiveKind::F64 => Value::F64(0.0),
            PrimitiveKind::String => Value::String(String::new()),
            PrimitiveKind::Bytes => Value::Bytes(Vec::new()),
        }
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.descriptor.name == other.descriptor.name && self.value == other.value
    }
}

/// Trait for converting from a [`Value`] reference.
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Result<Self, RecordError>;
}

/// Trait for converting into a [`Value`].
pub trait IntoValue {
    fn into_value(self) -> Value;
}

// Implement FromValue for primitives
macro_rules! impl_from_value {
    ($ty:ty, $variant:ident, $name:expr) => {
        impl FromValue for $ty {
            fn from_value(value: &Value) -> Result<Self, RecordError> {
                match value {
                    Value::$variant(v) => Ok(*v),
                    other => Err(RecordError::TypeMismatch {
                        expected: $name.to_string(),
                        got: format!("{:?}", other),
                    }),
                }
            }
        }
    };
}

impl_from_value!(bool, Bool, "bool");
impl_from_value!(u8, U8, "u8");
impl_from_value!(u16, U16, "u16");
impl_from_value!(u32, U32, "u32");
impl_from_value!(u64, U64, "u64");
impl_from_value!(i8, I8, "i8");
impl_from_value!(i16, I16, "i16");
impl_from_value!(i32, I32, "i32");
impl_from_value!(i64, I64, "i64");
impl_from_value!(f32, F32, "f32");
impl_from_value!(f64, F64, "f64");

impl FromValue for String {
    fn from_value(value: &Value) -> Result<Self, RecordError> {
        match value {
            Value::String(s) => Ok(s.clone()),
            other => Err(RecordError::TypeMismatch {
                expected: "string".to_string(),
                got: format!("{:?}", other),
            }),
        }
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: &Value) -> Result<Self, RecordError> {
        match value {
            Value::Bytes(b) => Ok(b.clone()),
            other => Err(RecordError::TypeMismatch {
                expected: "bytes".to_string(),
                got: format!("{:?}", other),
            }),
        }
    }
}

// Implement IntoValue for primitives
macro_rules! impl_into_value {
    ($ty:ty, $variant:ident) => {
        impl IntoValue for $ty {
            fn into_value(self) -> Value {
                Value::$variant(self)
            }
        }
    };
}

impl_into_value!(bool, Bool);
impl_into_value!(u8, U8);
impl_into_value!(u16, U16);
impl_into_value!(u32, U32);
impl_into_value!(u64, U64);
impl_into_value!(i8, I8);
impl_into_value!(i16, I16);
impl_into_value!(i32, I32);
impl_into_value!(i64, I64);
impl_into_value!(f32, F32);
impl_into_value!(f64, F64);

impl IntoValue for String {
    fn into_value(self) -> Value {
        Value::String(self)
    }
}

impl IntoValue for &str {
    fn into_value(self) -> Value {
        Value::String(self.to_string())
    }
}

impl IntoValue for Vec<u8> {
    fn into_value(self) -> Value {
        Value::Bytes(self)
    }
}

impl IntoValue for Value {
    fn into_value(self) -> Value {
        self
    }
}
