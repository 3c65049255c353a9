// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type descriptors.

use std::sync::Arc;

use crate::descriptor::{FieldDescriptor, FieldSpec, Storage};

/// What instances of a type are made of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Representation {
    /// Full object model: instances carry a layout and may pack raw fields.
    #[default]
    Record,
    /// Degenerate form backed by a plain vector. Every field is boxed.
    Vector,
    /// Degenerate form backed by a list. Every field is boxed.
    List,
}

/// Names of the functions generated for a type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamingPolicy {
    /// Prefix of accessor names. `None` names accessors after their fields.
    pub conc_name: Option<Arc<str>>,
    pub constructor: Arc<str>,
    pub predicate: Arc<str>,
    pub copier: Arc<str>,
}

impl NamingPolicy {
    /// `<name>-field`, `make-<name>`, `<name>-p`, `copy-<name>`.
    pub fn for_type(name: &str) -> Self {
        Self {
            conc_name: Some(Arc::from(format!("{}-", name))),
            constructor: Arc::from(format!("make-{}", name)),
            predicate: Arc::from(format!("{}-p", name)),
            copier: Arc::from(format!("copy-{}", name)),
        }
    }

    pub fn with_conc_name(mut self, prefix: impl AsRef<str>) -> Self {
        self.conc_name = Some(Arc::from(prefix.as_ref()));
        self
    }

    /// Accessors are named exactly like their fields.
    pub fn bare_accessors(mut self) -> Self {
        self.conc_name = None;
        self
    }

    pub fn accessor_name(&self, field: &str) -> String {
        match &self.conc_name {
            Some(prefix) => format!("{}{}", prefix, field),
            None => field.to_string(),
        }
    }
}

/// A type declaration as handed over by the surface syntax.
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub name: Arc<str>,
    pub include: Option<Arc<str>>,
    pub fields: Vec<FieldSpec>,
    pub representation: Representation,
    /// Defaults to [`NamingPolicy::for_type`].
    pub naming: Option<NamingPolicy>,
}

impl Declaration {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self {
            name: Arc::from(name.as_ref()),
            include: None,
            fields: Vec::new(),
            representation: Representation::Record,
            naming: None,
        }
    }

    pub fn include(mut self, parent: impl AsRef<str>) -> Self {
        self.include = Some(Arc::from(parent.as_ref()));
        self
    }

    pub fn field(mut self, spec: FieldSpec) -> Self {
        self.fields.push(spec);
        self
    }

    pub fn fields(mut self, specs: impl IntoIterator<Item = FieldSpec>) -> Self {
        self.fields.extend(specs);
        self
    }

    pub fn representation(mut self, representation: Representation) -> Self {
        self.representation = representation;
        self
    }

    pub fn naming(mut self, naming: NamingPolicy) -> Self {
        self.naming = Some(naming);
        self
    }
}

/// Completed plan of a record type: merged fields with final storage and
/// indices. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDescriptor {
    pub(super) name: Arc<str>,
    pub(super) fields: Vec<FieldDescriptor>,
    pub(super) included_parent: Option<Arc<str>>,
    pub(super) representation: Representation,
    pub(super) naming: NamingPolicy,
    pub(super) boxed_slot_count: usize,
    pub(super) raw_region_index: Option<usize>,
    pub(super) raw_region_words: usize,
}

impl TypeDescriptor {
    pub fn name(&self) -> &Arc<str> {
        &self.name
    }

    /// Fields in declaration order, inherited ones first.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn included_parent(&self) -> Option<&Arc<str>> {
        self.included_parent.as_ref()
    }

    pub fn representation(&self) -> Representation {
        self.representation
    }

    pub fn naming(&self) -> &NamingPolicy {
        &self.naming
    }

    /// Boxed slots per instance, the raw-region slot included.
    pub fn boxed_slot_count(&self) -> usize {
        self.boxed_slot_count
    }

    /// Boxed slot that holds the raw region, if any field is raw.
    pub fn raw_region_index(&self) -> Option<usize> {
        self.raw_region_index
    }

    pub fn raw_region_words(&self) -> usize {
        self.raw_region_words
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| &*f.name == name)
    }

    pub fn field_position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| &*f.name == name)
    }

    pub fn raw_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|f| f.storage != Storage::Boxed)
    }

    pub fn accessor_name(&self, field: &str) -> String {
        self.naming.accessor_name(field)
    }
}
