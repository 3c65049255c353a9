// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Field descriptors and storage classification.

use std::sync::Arc;

use crate::types::TypeExpr;
use crate::value::Value;

/// Width of one raw-region word, in bits.
pub const RAW_WORD_BITS: u32 = 32;

/// Untagged numeric encodings a field can be packed as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RawKind {
    UnsignedWord,
    SingleFloat,
    DoubleFloat,
    ComplexSingle,
    ComplexDouble,
}

impl RawKind {
    /// Every raw kind, in classification order.
    pub const ALL: [RawKind; 5] = [
        RawKind::UnsignedWord,
        RawKind::SingleFloat,
        RawKind::DoubleFloat,
        RawKind::ComplexSingle,
        RawKind::ComplexDouble,
    ];

    /// Raw-region words one value occupies.
    pub const fn words(self) -> usize {
        match self {
            Self::UnsignedWord | Self::SingleFloat => 1,
            Self::DoubleFloat | Self::ComplexSingle => 2,
            Self::ComplexDouble => 4,
        }
    }

    /// Word alignment of the field's offset. Equal to its own size.
    pub const fn alignment(self) -> usize {
        self.words()
    }

    /// The type a declared type must be a subtype of to use this encoding.
    pub fn type_expr(self) -> TypeExpr {
        match self {
            Self::UnsignedWord => TypeExpr::UnsignedByte(RAW_WORD_BITS as u8),
            Self::SingleFloat => TypeExpr::SingleFloat,
            Self::DoubleFloat => TypeExpr::DoubleFloat,
            Self::ComplexSingle => TypeExpr::ComplexSingle,
            Self::ComplexDouble => TypeExpr::ComplexDouble,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::UnsignedWord => "word",
            Self::SingleFloat => "single-float",
            Self::DoubleFloat => "double-float",
            Self::ComplexSingle => "complex-single-float",
            Self::ComplexDouble => "complex-double-float",
        }
    }
}

/// Where a field's value lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Storage {
    /// A tagged slot, indexed directly.
    Boxed,
    /// Packed words in the instance's raw region.
    Raw(RawKind),
}

impl Storage {
    pub fn is_raw(self) -> bool {
        matches!(self, Self::Raw(_))
    }
}

/// A field as the declarer wrote it.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: Arc<str>,
    pub declared_type: TypeExpr,
    /// Constant initial value used by constructors when none is supplied.
    pub default: Option<Value>,
    pub read_only: bool,
}

impl FieldSpec {
    pub fn new(name: impl AsRef<str>, declared_type: TypeExpr) -> Self {
        Self {
            name: Arc::from(name.as_ref()),
            declared_type,
            default: None,
            read_only: false,
        }
    }

    /// Untyped field (`t`).
    pub fn untyped(name: impl AsRef<str>) -> Self {
        Self::new(name, TypeExpr::T)
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }
}

/// A field after storage classification and slot allocation.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    pub name: Arc<str>,
    pub declared_type: TypeExpr,
    pub default: Option<Value>,
    pub storage: Storage,
    /// Boxed slot index for boxed fields, raw-region word offset for raw ones.
    pub index: usize,
    pub read_only: bool,
}

impl FieldDescriptor {
    /// Same `(index, storage)` location.
    pub fn same_location(&self, other: &FieldDescriptor) -> bool {
        self.index == other.index && self.storage == other.storage
    }
}
