// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Descriptor builder and slot allocator.
//!
//! Merges the included parent's fields, classifies each new field as boxed
//! or raw, and assigns indices. Boxed fields take the next slot. Raw fields
//! are packed into a word region whose reference occupies one boxed slot,
//! each aligned to its own word size.

use std::collections::HashSet;
use std::sync::Arc;

use crate::descriptor::{
    Declaration, FieldDescriptor, FieldSpec, NamingPolicy, Representation, Storage, TypeDescriptor,
};
use crate::error::{DefinitionError, SlotConflict};
use crate::types::{StandardResolver, TypeResolver};

/// Round `offset` up to a multiple of `align`.
#[inline]
fn align_up(offset: usize, align: usize) -> usize {
    offset.div_ceil(align) * align
}

/// Running allocation state, seeded from the parent.
struct SlotAllocator {
    boxed: usize,
    raw_region_index: Option<usize>,
    raw_words: usize,
}

impl SlotAllocator {
    fn inherit(parent: Option<&TypeDescriptor>) -> Self {
        match parent {
            Some(p) => Self {
                boxed: p.boxed_slot_count,
                raw_region_index: p.raw_region_index,
                raw_words: p.raw_region_words,
            },
            None => Self {
                boxed: 0,
                raw_region_index: None,
                raw_words: 0,
            },
        }
    }

    fn allocate(&mut self, storage: Storage) -> usize {
        match storage {
            Storage::Boxed => {
                let index = self.boxed;
                self.boxed += 1;
                index
            }
            Storage::Raw(kind) => {
                if self.raw_region_index.is_none() {
                    self.raw_region_index = Some(self.boxed);
                    self.boxed += 1;
                }
                let index = align_up(self.raw_words, kind.alignment());
                self.raw_words = index + kind.words();
                index
            }
        }
    }
}

/// Build a descriptor from a declaration.
///
/// `parent` must be the descriptor of `decl.include`. The builder is pure:
/// it reads `parent` and `resolver` and returns a new descriptor.
pub fn build_descriptor(
    decl: &Declaration,
    parent: Option<&TypeDescriptor>,
    resolver: &dyn TypeResolver,
) -> Result<TypeDescriptor, DefinitionError> {
    let type_name = decl.name.clone();
    if type_name.is_empty() {
        return Err(DefinitionError::EmptyName);
    }

    match (&decl.include, parent) {
        (Some(wanted), Some(p)) if wanted != &p.name => {
            return Err(DefinitionError::UnknownParent {
                type_name,
                parent: wanted.clone(),
            });
        }
        (Some(wanted), None) => {
            return Err(DefinitionError::UnknownParent {
                type_name,
                parent: wanted.clone(),
            });
        }
        _ => {}
    }

    if let Some(p) = parent {
        if p.name == type_name {
            return Err(DefinitionError::CircularInclusion {
                type_name,
                parent: p.name.clone(),
            });
        }
        if p.representation != decl.representation {
            return Err(DefinitionError::RepresentationMismatch {
                type_name,
                parent: p.name.clone(),
            });
        }
    }

    let mut seen = HashSet::with_capacity(decl.fields.len());
    for spec in &decl.fields {
        if !seen.insert(spec.name.clone()) {
            return Err(DefinitionError::DuplicateField {
                type_name,
                field: spec.name.clone(),
            });
        }
    }

    let mut fields: Vec<FieldDescriptor> = parent.map(|p| p.fields.clone()).unwrap_or_default();
    let mut slots = SlotAllocator::inherit(parent);

    for spec in &decl.fields {
        let storage = classify(spec, decl.representation, resolver);
        match fields.iter().position(|f| f.name == spec.name) {
            Some(pos) => {
                let merged = merge_override(&type_name, &fields[pos], spec, storage, resolver)?;
                fields[pos] = merged;
            }
            None => {
                let index = slots.allocate(storage);
                fields.push(FieldDescriptor {
                    name: spec.name.clone(),
                    declared_type: spec.declared_type.clone(),
                    default: spec.default.clone(),
                    storage,
                    index,
                    read_only: spec.read_only,
                });
            }
        }
    }

    Ok(TypeDescriptor {
        naming: decl
            .naming
            .clone()
            .unwrap_or_else(|| NamingPolicy::for_type(&type_name)),
        name: type_name,
        fields,
        included_parent: parent.map(|p| p.name.clone()),
        representation: decl.representation,
        boxed_slot_count: slots.boxed,
        raw_region_index: slots.raw_region_index,
        raw_region_words: slots.raw_words,
    })
}

/// Record-backed descriptor with default naming and the structural resolver.
pub fn build(
    name: impl AsRef<str>,
    parent: Option<&TypeDescriptor>,
    field_specs: Vec<FieldSpec>,
) -> Result<TypeDescriptor, DefinitionError> {
    let mut decl = Declaration::new(name).fields(field_specs);
    decl.include = parent.map(|p| p.name.clone());
    build_descriptor(&decl, parent, &StandardResolver)
}

fn classify(spec: &FieldSpec, representation: Representation, resolver: &dyn TypeResolver) -> Storage {
    if representation != Representation::Record {
        return Storage::Boxed;
    }
    resolver
        .raw_kind_of(&spec.declared_type)
        .map_or(Storage::Boxed, Storage::Raw)
}

/// Re-declaration of an inherited field: may narrow type or add read-only,
/// keeps the inherited location.
fn merge_override(
    type_name: &Arc<str>,
    inherited: &FieldDescriptor,
    spec: &FieldSpec,
    storage: Storage,
    resolver: &dyn TypeResolver,
) -> Result<FieldDescriptor, DefinitionError> {
    let conflict = |reason| DefinitionError::InheritedSlotConflict {
        type_name: type_name.clone(),
        field: spec.name.clone(),
        reason,
    };

    if !resolver.is_subtype(&spec.declared_type, &inherited.declared_type) {
        return Err(conflict(SlotConflict::WidenedType));
    }
    if inherited.read_only && !spec.read_only {
        return Err(conflict(SlotConflict::ReadOnlyRelaxed));
    }
    if storage != inherited.storage {
        return Err(DefinitionError::StorageNarrowing {
            type_name: type_name.clone(),
            field: spec.name.clone(),
            from: inherited.storage,
            to: storage,
        });
    }

    Ok(FieldDescriptor {
        name: inherited.name.clone(),
        declared_type: spec.declared_type.clone(),
        default: spec.default.clone().or_else(|| inherited.default.clone()),
        storage,
        index: inherited.index,
        read_only: spec.read_only,
    })
}
