// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Instances and raw word regions.

use std::fmt;

use crate::layout::LayoutHandle;
use crate::value::Value;

/// Untagged word buffer holding an instance's raw fields.
#[derive(Clone, PartialEq, Eq)]
pub struct RawRegion {
    words: Box<[u32]>,
}

impl RawRegion {
    pub fn zeroed(words: usize) -> Self {
        Self {
            words: vec![0; words].into_boxed_slice(),
        }
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// `count` words at `offset`, if in range.
    #[inline]
    pub fn get(&self, offset: usize, count: usize) -> Option<&[u32]> {
        self.words.get(offset..offset.checked_add(count)?)
    }

    #[inline]
    pub fn get_mut(&mut self, offset: usize, count: usize) -> Option<&mut [u32]> {
        self.words.get_mut(offset..offset.checked_add(count)?)
    }

    pub fn as_words(&self) -> &[u32] {
        &self.words
    }
}

impl fmt::Debug for RawRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RawRegion[")?;
        for (i, w) in self.words.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{:08x}", w)?;
        }
        write!(f, "]")
    }
}

/// One boxed slot.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Slot {
    #[default]
    Unbound,
    Value(Value),
    Raw(RawRegion),
}

/// A record instance: boxed slots plus the layout it was allocated under.
///
/// The layout is fixed for the life of the instance. After the layout is
/// superseded the instance is obsolete and generated accessors refuse it.
#[derive(Clone)]
pub struct Instance {
    layout: LayoutHandle,
    slots: Box<[Slot]>,
}

impl Instance {
    /// Fresh instance: every boxed slot unbound, raw region zeroed.
    pub fn allocate(layout: &LayoutHandle) -> Self {
        let descriptor = layout.descriptor();
        let mut slots = vec![Slot::Unbound; descriptor.boxed_slot_count()];
        if let Some(index) = descriptor.raw_region_index() {
            slots[index] = Slot::Raw(RawRegion::zeroed(descriptor.raw_region_words()));
        }
        Self {
            layout: layout.clone(),
            slots: slots.into_boxed_slice(),
        }
    }

    #[inline]
    pub fn layout(&self) -> &LayoutHandle {
        &self.layout
    }

    pub fn type_name(&self) -> &str {
        self.layout.name()
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn slot(&self, index: usize) -> Option<&Slot> {
        self.slots.get(index)
    }

    #[inline]
    pub fn slot_mut(&mut self, index: usize) -> Option<&mut Slot> {
        self.slots.get_mut(index)
    }

    /// Raw region stored at `index`, if that slot holds one.
    #[inline]
    pub fn raw_region(&self, index: usize) -> Option<&RawRegion> {
        match self.slots.get(index) {
            Some(Slot::Raw(region)) => Some(region),
            _ => None,
        }
    }

    #[inline]
    pub fn raw_region_mut(&mut self, index: usize) -> Option<&mut RawRegion> {
        match self.slots.get_mut(index) {
            Some(Slot::Raw(region)) => Some(region),
            _ => None,
        }
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("type", &self.type_name())
            .field("layout", &self.layout.id())
            .field("slots", &self.slots)
            .finish()
    }
}
