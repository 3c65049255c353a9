// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Instance layouts.
//!
//! An [`InstanceLayout`] is stamped into every instance at construction. It
//! carries the type identity, the ancestor table indexed by inclusion depth
//! and a validity flag. Once published, only the flag and (for in-place
//! redefinitions) the descriptor pointer change, both atomically.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::descriptor::TypeDescriptor;

static NEXT_LAYOUT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique layout identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayoutId(u64);

impl LayoutId {
    pub fn fresh() -> Self {
        Self(NEXT_LAYOUT_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for LayoutId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}

/// Shared handle to a layout.
pub type LayoutHandle = Arc<InstanceLayout>;

/// Runtime layout of a record type.
pub struct InstanceLayout {
    id: LayoutId,
    name: Arc<str>,
    descriptor: ArcSwap<TypeDescriptor>,
    /// Ancestor ids by increasing depth, self last.
    ancestors: Box<[LayoutId]>,
    parent: Option<LayoutHandle>,
    valid: AtomicBool,
}

impl InstanceLayout {
    /// Fresh layout under `parent`, with a new id.
    pub fn new(descriptor: Arc<TypeDescriptor>, parent: Option<LayoutHandle>) -> LayoutHandle {
        let id = LayoutId::fresh();
        let mut ancestors: Vec<LayoutId> = parent
            .as_ref()
            .map(|p| p.ancestors.to_vec())
            .unwrap_or_default();
        ancestors.push(id);

        Arc::new(Self {
            id,
            name: descriptor.name().clone(),
            descriptor: ArcSwap::new(descriptor),
            ancestors: ancestors.into_boxed_slice(),
            parent,
            valid: AtomicBool::new(true),
        })
    }

    #[inline]
    pub fn id(&self) -> LayoutId {
        self.id
    }

    pub fn name(&self) -> &Arc<str> {
        &self.name
    }

    /// Inclusion depth; 0 for a root type.
    #[inline]
    pub fn depth(&self) -> usize {
        self.ancestors.len() - 1
    }

    #[inline]
    pub fn ancestors(&self) -> &[LayoutId] {
        &self.ancestors
    }

    pub fn parent(&self) -> Option<&LayoutHandle> {
        self.parent.as_ref()
    }

    /// Current descriptor. Compatible redefinitions swap it in place.
    pub fn descriptor(&self) -> Arc<TypeDescriptor> {
        self.descriptor.load_full()
    }

    pub fn field_count(&self) -> usize {
        self.descriptor.load().fields().len()
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.valid.load(Ordering::Acquire)
    }

    /// Layouts from the root down to this one.
    pub fn ancestor_chain(&self) -> Vec<&InstanceLayout> {
        let mut chain = Vec::with_capacity(self.ancestors.len());
        let mut cursor = Some(self);
        while let Some(layout) = cursor {
            chain.push(layout);
            cursor = layout.parent.as_deref();
        }
        chain.reverse();
        chain
    }

    /// Ancestor id at inclusion depth `depth`.
    #[inline]
    pub(crate) fn ancestor_at(&self, depth: usize) -> Option<LayoutId> {
        self.ancestors.get(depth).copied()
    }

    /// Mark superseded. Never reversed.
    pub(crate) fn invalidate(&self) -> bool {
        self.valid.swap(false, Ordering::AcqRel)
    }

    pub(crate) fn replace_descriptor(&self, descriptor: Arc<TypeDescriptor>) {
        self.descriptor.store(descriptor);
    }
}

impl fmt::Debug for InstanceLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstanceLayout")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("depth", &self.depth())
            .field("ancestors", &self.ancestors)
            .field("valid", &self.is_valid())
            .finish()
    }
}
