// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Declared field type expressions.

use std::fmt;
use std::sync::Arc;

use crate::error::MembershipError;
use crate::types::RecordTypes;
use crate::value::Value;

/// Number of bits in a fixnum, sign included.
pub const FIXNUM_BITS: u8 = 63;

/// A declared field type.
///
/// Covers the atomic types fields are typically declared with, record types
/// by name, and the `or` / `member` combinators. Anything richer belongs to
/// the surrounding type system, which only needs record membership from here.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeExpr {
    /// The universal type.
    T,
    Boolean,
    /// Any integer representable in a [`Value::Integer`].
    Integer,
    Fixnum,
    /// `(unsigned-byte bits)`.
    UnsignedByte(u8),
    /// `(signed-byte bits)`.
    SignedByte(u8),
    SingleFloat,
    DoubleFloat,
    /// Either float format.
    Float,
    ComplexSingle,
    ComplexDouble,
    Number,
    String,
    Symbol,
    /// Instances of the named record type or any type including it.
    Record(Arc<str>),
    Or(Vec<TypeExpr>),
    Member(Vec<Value>),
}

impl TypeExpr {
    /// Named record type.
    pub fn record(name: impl AsRef<str>) -> Self {
        Self::Record(Arc::from(name.as_ref()))
    }

    /// Inclusive bounds of an integer type.
    pub fn integer_bounds(&self) -> Option<(i128, i128)> {
        match self {
            Self::Integer => Some((i128::from(i64::MIN), i128::from(i64::MAX))),
            Self::Fixnum => Some(signed_bounds(FIXNUM_BITS)),
            Self::UnsignedByte(bits) => {
                let bits = (*bits).min(64);
                Some((0, (1i128 << bits) - 1))
            }
            Self::SignedByte(bits) => Some(signed_bounds(*bits)),
            _ => None,
        }
    }

    /// Structural subtype test.
    ///
    /// Record-to-record questions are delegated to `records`. The answer is
    /// conservative: `false` means "not provably a subtype".
    pub fn is_subtype_of(&self, other: &TypeExpr, records: &dyn RecordTypes) -> bool {
        if self == other {
            return true;
        }
        match (self, other) {
            (_, Self::T) => true,
            // The empty union is the empty type.
            (Self::Or(xs), _) => xs.iter().all(|x| x.is_subtype_of(other, records)),
            (Self::Member(vs), _) => vs.iter().all(|v| other.admits_constant(v)),
            (_, Self::Or(ys)) => ys.iter().any(|y| self.is_subtype_of(y, records)),
            (Self::T, _) | (_, Self::Member(_)) => false,
            (Self::Record(a), Self::Record(b)) => records.includes(a, b),
            _ => {
                if let (Some(sub), Some(sup)) = (self.integer_bounds(), other.integer_bounds()) {
                    return sup.0 <= sub.0 && sub.1 <= sup.1;
                }
                matches!(
                    (self, other),
                    (
                        Self::Integer
                            | Self::Fixnum
                            | Self::UnsignedByte(_)
                            | Self::SignedByte(_)
                            | Self::SingleFloat
                            | Self::DoubleFloat
                            | Self::Float
                            | Self::ComplexSingle
                            | Self::ComplexDouble,
                        Self::Number
                    ) | (Self::SingleFloat | Self::DoubleFloat, Self::Float)
                )
            }
        }
    }

    /// Whether `value` is of this type.
    ///
    /// Record membership goes through `records`, so an obsolete instance
    /// surfaces as [`MembershipError::ObsoleteInstance`] instead of a plain
    /// `false`.
    pub fn admits(&self, value: &Value, records: &dyn RecordTypes) -> Result<bool, MembershipError> {
        match self {
            Self::Record(name) => match value {
                Value::Record(instance) => records.instance_of(instance, name),
                _ => Ok(false),
            },
            Self::Or(xs) => {
                for x in xs {
                    if x.admits(value, records)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            _ => Ok(self.admits_constant(value)),
        }
    }

    /// Membership for non-record types. Record types admit nothing here.
    fn admits_constant(&self, value: &Value) -> bool {
        match self {
            Self::T => true,
            Self::Boolean => matches!(value, Value::Bool(_)),
            Self::Integer | Self::Fixnum | Self::UnsignedByte(_) | Self::SignedByte(_) => {
                match (value, self.integer_bounds()) {
                    (Value::Integer(v), Some((lo, hi))) => {
                        let v = i128::from(*v);
                        lo <= v && v <= hi
                    }
                    _ => false,
                }
            }
            Self::SingleFloat => matches!(value, Value::Single(_)),
            Self::DoubleFloat => matches!(value, Value::Double(_)),
            Self::Float => matches!(value, Value::Single(_) | Value::Double(_)),
            Self::ComplexSingle => matches!(value, Value::ComplexSingle(..)),
            Self::ComplexDouble => matches!(value, Value::ComplexDouble(..)),
            Self::Number => value.is_number(),
            Self::String => matches!(value, Value::String(_)),
            Self::Symbol => matches!(value, Value::Symbol(_) | Value::Nil),
            Self::Record(_) => false,
            Self::Or(xs) => xs.iter().any(|x| x.admits_constant(value)),
            Self::Member(vs) => vs.contains(value),
        }
    }
}

fn signed_bounds(bits: u8) -> (i128, i128) {
    let bits = bits.clamp(1, 64);
    (-(1i128 << (bits - 1)), (1i128 << (bits - 1)) - 1)
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::T => write!(f, "t"),
            Self::Boolean => write!(f, "boolean"),
            Self::Integer => write!(f, "integer"),
            Self::Fixnum => write!(f, "fixnum"),
            Self::UnsignedByte(bits) => write!(f, "(unsigned-byte {})", bits),
            Self::SignedByte(bits) => write!(f, "(signed-byte {})", bits),
            Self::SingleFloat => write!(f, "single-float"),
            Self::DoubleFloat => write!(f, "double-float"),
            Self::Float => write!(f, "float"),
            Self::ComplexSingle => write!(f, "(complex single-float)"),
            Self::ComplexDouble => write!(f, "(complex double-float)"),
            Self::Number => write!(f, "number"),
            Self::String => write!(f, "string"),
            Self::Symbol => write!(f, "symbol"),
            Self::Record(name) => write!(f, "{}", name),
            Self::Or(xs) => {
                write!(f, "(or")?;
                for x in xs {
                    write!(f, " {}", x)?;
                }
                write!(f, ")")
            }
            Self::Member(vs) => {
                write!(f, "(member")?;
                for v in vs {
                    write!(f, " {}", v)?;
                }
                write!(f, ")")
            }
        }
    }
}
