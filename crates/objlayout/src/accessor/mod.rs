// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Accessor generator.
//!
//! For each field of a descriptor, emits a reader, a `boundp` check and two
//! writers bound to one layout. Storage is dispatched once, here: boxed
//! fields become indexed slot reads, raw fields become a region lookup plus
//! the kind's decoder. Every generated function checks the instance against
//! the layout before touching a slot.
//!
//! The safe writer checks the value against the field's declared type. The
//! fast writer only checks that the value fits the storage.

mod raw;

#[cfg(test)]
mod tests;

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::descriptor::{FieldDescriptor, RawKind, Storage, TypeDescriptor};
use crate::error::{AccessError, MembershipError};
use crate::instance::{Instance, Slot};
use crate::layout::{InstanceLayout, LayoutHandle};
use crate::membership::{self, check_instance_of, is_instance_of};
use crate::types::{NoRecords, RecordTypes, TypeExpr};
use crate::value::Value;

use self::raw::RawCodec;

/// Generated field reader.
pub type Reader = Arc<dyn Fn(&Instance) -> Result<Value, AccessError> + Send + Sync>;

/// Generated field writer.
pub type Writer = Arc<dyn Fn(&mut Instance, Value) -> Result<(), AccessError> + Send + Sync>;

/// Generated bound check.
pub type BoundP = Arc<dyn Fn(&Instance) -> Result<bool, AccessError> + Send + Sync>;

/// Record knowledge shared by generated writers.
pub type SharedRecords = Arc<dyn RecordTypes + Send + Sync>;

/// Which writer variant to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessorPolicy {
    /// Check written values against the declared type.
    #[default]
    Safe,
    /// Skip the declared-type check.
    Fast,
}

/// Generated functions for one field.
#[derive(Clone)]
pub struct FieldAccessor {
    field: FieldDescriptor,
    accessor_name: String,
    policy: AccessorPolicy,
    reader: Reader,
    boundp: BoundP,
    safe_store: Writer,
    fast_store: Writer,
}

impl FieldAccessor {
    pub fn name(&self) -> &Arc<str> {
        &self.field.name
    }

    /// Accessor name under the type's naming policy, e.g. `point-x`.
    pub fn accessor_name(&self) -> &str {
        &self.accessor_name
    }

    pub fn descriptor(&self) -> &FieldDescriptor {
        &self.field
    }

    pub fn is_read_only(&self) -> bool {
        self.field.read_only
    }

    pub fn reader(&self) -> &Reader {
        &self.reader
    }

    pub fn boundp(&self) -> &BoundP {
        &self.boundp
    }

    /// Writer of the given variant. `None` for read-only fields.
    pub fn writer(&self, policy: AccessorPolicy) -> Option<&Writer> {
        if self.field.read_only {
            return None;
        }
        Some(self.store(policy))
    }

    pub fn read(&self, instance: &Instance) -> Result<Value, AccessError> {
        (self.reader)(instance)
    }

    pub fn is_bound(&self, instance: &Instance) -> Result<bool, AccessError> {
        (self.boundp)(instance)
    }

    /// Write with the policy the accessors were generated with.
    pub fn write(&self, instance: &mut Instance, value: Value) -> Result<(), AccessError> {
        self.write_with(self.policy, instance, value)
    }

    pub fn write_with(
        &self,
        policy: AccessorPolicy,
        instance: &mut Instance,
        value: Value,
    ) -> Result<(), AccessError> {
        match self.writer(policy) {
            Some(writer) => writer(instance, value),
            None => Err(AccessError::ReadOnly {
                field: self.field.name.clone(),
            }),
        }
    }

    /// Store ignoring read-only, for constructors.
    fn store(&self, policy: AccessorPolicy) -> &Writer {
        match policy {
            AccessorPolicy::Safe => &self.safe_store,
            AccessorPolicy::Fast => &self.fast_store,
        }
    }
}

impl fmt::Debug for FieldAccessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldAccessor")
            .field("accessor_name", &self.accessor_name)
            .field("storage", &self.field.storage)
            .field("index", &self.field.index)
            .field("read_only", &self.field.read_only)
            .finish()
    }
}

/// All functions generated for a type, bound to one layout.
pub struct FieldAccessors {
    layout: LayoutHandle,
    descriptor: Arc<TypeDescriptor>,
    fields: Vec<FieldAccessor>,
    policy: AccessorPolicy,
}

impl FieldAccessors {
    /// Generate accessors for `descriptor` bound to `layout`.
    ///
    /// `records` answers record-typed field checks in safe writers.
    pub fn generate(
        descriptor: Arc<TypeDescriptor>,
        layout: LayoutHandle,
        records: SharedRecords,
        policy: AccessorPolicy,
    ) -> Self {
        let fields = descriptor
            .fields()
            .iter()
            .map(|field| generate_field(field, &descriptor, &layout, &records, policy))
            .collect();
        Self {
            layout,
            descriptor,
            fields,
            policy,
        }
    }

    /// Safe accessors for the layout's current descriptor, with no record
    /// types known beyond name equality.
    pub fn for_layout(layout: &LayoutHandle) -> Self {
        Self::generate(
            layout.descriptor(),
            layout.clone(),
            Arc::new(NoRecords),
            AccessorPolicy::Safe,
        )
    }

    pub fn layout(&self) -> &LayoutHandle {
        &self.layout
    }

    pub fn descriptor(&self) -> &Arc<TypeDescriptor> {
        &self.descriptor
    }

    pub fn type_name(&self) -> &Arc<str> {
        self.descriptor.name()
    }

    pub fn policy(&self) -> AccessorPolicy {
        self.policy
    }

    pub fn fields(&self) -> &[FieldAccessor] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldAccessor> {
        self.fields.iter().find(|a| &*a.field.name == name)
    }

    /// Look up by generated accessor name, e.g. `point-x`.
    pub fn by_accessor_name(&self, accessor_name: &str) -> Option<&FieldAccessor> {
        self.fields.iter().find(|a| a.accessor_name == accessor_name)
    }

    pub fn constructor_name(&self) -> &str {
        &self.descriptor.naming().constructor
    }

    pub fn predicate_name(&self) -> &str {
        &self.descriptor.naming().predicate
    }

    pub fn copier_name(&self) -> &str {
        &self.descriptor.naming().copier
    }

    pub fn read(&self, instance: &Instance, field: &str) -> Result<Value, AccessError> {
        self.lookup(field)?.read(instance)
    }

    pub fn write(&self, instance: &mut Instance, field: &str, value: Value) -> Result<(), AccessError> {
        self.lookup(field)?.write(instance, value)
    }

    /// Keyword constructor. The first initializer for a field wins; fields
    /// not supplied take their default, or stay unbound (boxed) / zero (raw).
    pub fn construct<'a>(
        &self,
        initargs: impl IntoIterator<Item = (&'a str, Value)>,
    ) -> Result<Instance, AccessError> {
        self.ensure_current()?;
        let mut supplied: Vec<Option<Value>> = vec![None; self.fields.len()];
        for (name, value) in initargs {
            let pos = self
                .fields
                .iter()
                .position(|a| &*a.field.name == name)
                .ok_or_else(|| self.unknown_field(name))?;
            if supplied[pos].is_none() {
                supplied[pos] = Some(value);
            }
        }
        self.fill(supplied)
    }

    /// Positional constructor over fields in declaration order. Trailing
    /// fields may be omitted.
    pub fn construct_positional(&self, values: Vec<Value>) -> Result<Instance, AccessError> {
        self.ensure_current()?;
        if values.len() > self.fields.len() {
            return Err(AccessError::Arity {
                type_name: self.descriptor.name().clone(),
                expected: self.fields.len(),
                got: values.len(),
            });
        }
        let mut supplied: Vec<Option<Value>> = values.into_iter().map(Some).collect();
        supplied.resize(self.fields.len(), None);
        self.fill(supplied)
    }

    /// Generated predicate.
    pub fn is_instance(&self, value: &Value) -> bool {
        value
            .as_record()
            .is_some_and(|instance| is_instance_of(instance, &self.layout))
    }

    /// Generated copier: a shallow copy sharing the layout.
    pub fn copy(&self, instance: &Instance) -> Result<Instance, AccessError> {
        guard(instance, &self.layout)?;
        Ok(instance.clone())
    }

    fn fill(&self, supplied: Vec<Option<Value>>) -> Result<Instance, AccessError> {
        let mut instance = Instance::allocate(&self.layout);
        for (accessor, value) in self.fields.iter().zip(supplied) {
            if let Some(value) = value.or_else(|| accessor.field.default.clone()) {
                accessor.store(self.policy)(&mut instance, value)?;
            }
        }
        Ok(instance)
    }

    fn ensure_current(&self) -> Result<(), AccessError> {
        if self.layout.is_valid() {
            return Ok(());
        }
        Err(MembershipError::InvalidTargetLayout {
            type_name: self.layout.name().clone(),
            layout: self.layout.id(),
        }
        .into())
    }

    fn lookup(&self, field: &str) -> Result<&FieldAccessor, AccessError> {
        self.field(field).ok_or_else(|| self.unknown_field(field))
    }

    fn unknown_field(&self, field: &str) -> AccessError {
        AccessError::UnknownField {
            type_name: self.descriptor.name().clone(),
            field: field.to_string(),
        }
    }
}

impl fmt::Debug for FieldAccessors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldAccessors")
            .field("type", self.descriptor.name())
            .field("layout", &self.layout.id())
            .field("policy", &self.policy)
            .field("fields", &self.fields)
            .finish()
    }
}

/// Obsolete instances are reported before the layout check so a stale
/// accessor does not mask them.
#[inline]
fn guard(instance: &Instance, layout: &InstanceLayout) -> Result<(), AccessError> {
    if !instance.layout().is_valid() {
        return Err(membership::obsolete(instance.layout()).into());
    }
    check_instance_of(instance, layout)?;
    Ok(())
}

fn type_mismatch(field: &Arc<str>, expected: &TypeExpr, value: &Value) -> AccessError {
    AccessError::TypeMismatch {
        field: field.clone(),
        expected: expected.to_string(),
        value: value.to_string(),
    }
}

fn generate_field(
    field: &FieldDescriptor,
    descriptor: &TypeDescriptor,
    layout: &LayoutHandle,
    records: &SharedRecords,
    policy: AccessorPolicy,
) -> FieldAccessor {
    let (reader, boundp, store) = match field.storage {
        Storage::Boxed => boxed_ops(field, layout),
        Storage::Raw(kind) => {
            debug_assert!(descriptor.raw_region_index().is_some());
            let region = descriptor.raw_region_index().unwrap_or_default();
            raw_ops(field, kind, region, layout)
        }
    };

    let fast_store: Writer = {
        let layout = layout.clone();
        let store = store.clone();
        Arc::new(move |instance: &mut Instance, value: Value| -> Result<(), AccessError> {
            guard(instance, &layout)?;
            store(instance, value)
        })
    };

    let safe_store: Writer = {
        let layout = layout.clone();
        let records = records.clone();
        let name = field.name.clone();
        let declared = field.declared_type.clone();
        Arc::new(move |instance: &mut Instance, value: Value| -> Result<(), AccessError> {
            guard(instance, &layout)?;
            if !declared.admits(&value, &*records)? {
                return Err(type_mismatch(&name, &declared, &value));
            }
            store(instance, value)
        })
    };

    FieldAccessor {
        field: field.clone(),
        accessor_name: descriptor.accessor_name(&field.name),
        policy,
        reader,
        boundp,
        safe_store,
        fast_store,
    }
}

/// Reader, boundp and unguarded store for a boxed slot.
fn boxed_ops(field: &FieldDescriptor, layout: &LayoutHandle) -> (Reader, BoundP, Writer) {
    let index = field.index;

    let reader: Reader = {
        let layout = layout.clone();
        let name = field.name.clone();
        Arc::new(move |instance: &Instance| -> Result<Value, AccessError> {
            guard(instance, &layout)?;
            match instance.slot(index) {
                Some(Slot::Value(v)) => Ok(v.clone()),
                _ => Err(AccessError::Unbound { field: name.clone() }),
            }
        })
    };

    let boundp: BoundP = {
        let layout = layout.clone();
        Arc::new(move |instance: &Instance| -> Result<bool, AccessError> {
            guard(instance, &layout)?;
            Ok(matches!(instance.slot(index), Some(Slot::Value(_))))
        })
    };

    let store: Writer = {
        let name = field.name.clone();
        Arc::new(move |instance: &mut Instance, value: Value| -> Result<(), AccessError> {
            match instance.slot_mut(index) {
                Some(slot) => {
                    *slot = Slot::Value(value);
                    Ok(())
                }
                None => Err(AccessError::SlotOutOfRange { field: name.clone() }),
            }
        })
    };

    (reader, boundp, store)
}

/// Reader, boundp and unguarded store for a raw field.
///
/// An instance allocated before fields were appended has no words for them:
/// reads report unbound, writes report out of range.
fn raw_ops(
    field: &FieldDescriptor,
    kind: RawKind,
    region: usize,
    layout: &LayoutHandle,
) -> (Reader, BoundP, Writer) {
    let RawCodec { decode, encode } = raw::codec(kind);
    let index = field.index;
    let words = kind.words();

    let reader: Reader = {
        let layout = layout.clone();
        let name = field.name.clone();
        Arc::new(move |instance: &Instance| -> Result<Value, AccessError> {
            guard(instance, &layout)?;
            instance
                .raw_region(region)
                .and_then(|r| r.get(index, words))
                .map(decode)
                .ok_or_else(|| AccessError::Unbound { field: name.clone() })
        })
    };

    let boundp: BoundP = {
        let layout = layout.clone();
        Arc::new(move |instance: &Instance| -> Result<bool, AccessError> {
            guard(instance, &layout)?;
            Ok(instance
                .raw_region(region)
                .and_then(|r| r.get(index, words))
                .is_some())
        })
    };

    let store: Writer = {
        let name = field.name.clone();
        let storage_type = kind.type_expr();
        Arc::new(move |instance: &mut Instance, value: Value| -> Result<(), AccessError> {
            let slot = instance
                .raw_region_mut(region)
                .and_then(|r| r.get_mut(index, words))
                .ok_or_else(|| AccessError::SlotOutOfRange { field: name.clone() })?;
            if encode(&value, slot) {
                Ok(())
            } else {
                Err(type_mismatch(&name, &storage_type, &value))
            }
        })
    };

    (reader, boundp, store)
}
