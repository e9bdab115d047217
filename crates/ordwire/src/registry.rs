// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Descriptor registry with registration-time schema validation.
//!
//! Descriptors are immutable and safely shared by unlimited concurrent
//! callers; the registry is the one place where mutation (registration)
//! happens, backed by a sharded concurrent map.
//!
//! Validation covers what a schema compiler would reject: ordinal and tag
//! collisions, duplicate names, optional fields without a presence marker,
//! and cyclic fallback declarations. The runtime codec itself assumes
//! descriptors are well formed.

use crate::descriptor::{Cardinality, StructMember, TypeDescriptor, TypeKind};
use dashmap::DashMap;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Errors for invalid schema declarations.
#[derive(Debug)]
pub enum SchemaError {
    DuplicateOrdinal { type_name: String, ordinal: u32 },
    DuplicateTag { type_name: String, tag: u32 },
    DuplicateName { type_name: String, name: String },
    OptionalWithoutMarker { type_name: String, field: String },
    CyclicFallback { type_name: String },
    EmptyChoice { type_name: String },
    AlreadyRegistered(String),
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateOrdinal { type_name, ordinal } => {
                write!(f, "duplicate ordinal {} in {}", ordinal, type_name)
            }
            Self::DuplicateTag { type_name, tag } => {
                write!(f, "duplicate tag {} in {}", tag, type_name)
            }
            Self::DuplicateName { type_name, name } => {
                write!(f, "duplicate member name {} in {}", name, type_name)
            }
            Self::OptionalWithoutMarker { type_name, field } => {
                write!(
                    f,
                    "optional field {} in {} has no presence marker",
                    field, type_name
                )
            }
            Self::CyclicFallback { type_name } => {
                write!(f, "cyclic fallback declaration in {}", type_name)
            }
            Self::EmptyChoice { type_name } => write!(f, "choice {} has no variants", type_name),
            Self::AlreadyRegistered(name) => write!(f, "type already registered: {}", name),
        }
    }
}

impl std::error::Error for SchemaError {}

/// Registry resolving type names to descriptors.
pub trait DescriptorLookup {
    /// Look up a descriptor by type name. Returns `None` if unknown.
    fn lookup(&self, name: &str) -> Option<Arc<TypeDescriptor>>;
}

/// Concurrent name-to-descriptor registry.
#[derive(Debug, Default)]
pub struct DescriptorRegistry {
    types: DashMap<String, Arc<TypeDescriptor>>,
}

impl DescriptorRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and register a descriptor under its type name.
    pub fn register(&self, descriptor: Arc<TypeDescriptor>) -> Result<(), SchemaError> {
        validate(&descriptor)?;
        let name = descriptor.name.clone();
        if self.types.contains_key(&name) {
            return Err(SchemaError::AlreadyRegistered(name));
        }
        log::debug!("[REGISTRY] registered type {}", name);
        self.types.insert(name, descriptor);
        Ok(())
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns `true` if no types are registered.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl DescriptorLookup for DescriptorRegistry {
    fn lookup(&self, name: &str) -> Option<Arc<TypeDescriptor>> {
        self.types.get(name).map(|entry| entry.value().clone())
    }
}

/// Validate a descriptor tree without registering it.
pub fn validate(descriptor: &TypeDescriptor) -> Result<(), SchemaError> {
    match &descriptor.kind {
        TypeKind::Primitive(_) => Ok(()),
        TypeKind::Struct(s) => {
            let mut ordinals = HashSet::new();
            let mut names = HashSet::new();
            for member in s.members() {
                if !ordinals.insert(member.ordinal()) {
                    return Err(SchemaError::DuplicateOrdinal {
                        type_name: descriptor.name.clone(),
                        ordinal: member.ordinal(),
                    });
                }
                if let StructMember::Field(f) = member {
                    if !names.insert(f.name.as_str()) {
                        return Err(SchemaError::DuplicateName {
                            type_name: descriptor.name.clone(),
                            name: f.name.clone(),
                        });
                    }
                    if f.cardinality == Cardinality::Optional && !f.presence {
                        return Err(SchemaError::OptionalWithoutMarker {
                            type_name: descriptor.name.clone(),
                            field: f.name.clone(),
                        });
                    }
                    validate(&f.ty)?;
                }
            }
            Ok(())
        }
        TypeKind::Choice(c) => {
            if c.variants().is_empty() {
                return Err(SchemaError::EmptyChoice {
                    type_name: descriptor.name.clone(),
                });
            }
            let mut tags = HashSet::new();
            let mut names = HashSet::new();
            for variant in c.variants() {
                if !tags.insert(variant.tag) {
                    return Err(SchemaError::DuplicateTag {
                        type_name: descriptor.name.clone(),
                        tag: variant.tag,
                    });
                }
                if !names.insert(variant.name.as_str()) {
                    return Err(SchemaError::DuplicateName {
                        type_name: descriptor.name.clone(),
                        name: variant.name.clone(),
                    });
                }
                validate(&variant.ty)?;
            }
            check_fallback_chain(descriptor, c.fallback.as_ref())?;
            if let Some(fb) = &c.fallback {
                validate(fb)?;
            }
            Ok(())
        }
    }
}

/// Walk the fallback chain and reject cycles. Chains reference earlier
/// versions, so identity repetition means a declaration error.
fn check_fallback_chain(
    root: &TypeDescriptor,
    mut fallback: Option<&Arc<TypeDescriptor>>,
) -> Result<(), SchemaError> {
    let mut seen: Vec<*const TypeDescriptor> = vec![root as *const TypeDescriptor];
    while let Some(current) = fallback {
        let ptr = Arc::as_ptr(current);
        if seen.contains(&ptr) {
            return Err(SchemaError::CyclicFallback {
                type_name: root.name.clone(),
            });
        }
        seen.push(ptr);
        fallback = match &current.kind {
            TypeKind::Choice(c) => c.fallback.as_ref(),
            _ => None,
        };
    }
    Ok(())
}
