// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Tagged values.
//!
//! A [`Value`] is what a boxed slot holds and what generated accessors take
//! and return. Raw fields are stored untagged in an instance's raw region and
//! are converted to and from `Value` by their raw kind's codec.

use std::fmt;
use std::sync::Arc;

use crate::instance::Instance;

/// A tagged value.
#[derive(Debug, Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Integer(i64),
    Single(f32),
    Double(f64),
    ComplexSingle(f32, f32),
    ComplexDouble(f64, f64),
    String(Arc<str>),
    Symbol(Arc<str>),
    /// Reference to a record instance. Compared by identity.
    Record(Arc<Instance>),
}

impl Value {
    /// Build a string value.
    pub fn string(s: impl AsRef<str>) -> Self {
        Self::String(Arc::from(s.as_ref()))
    }

    /// Build a symbol value.
    pub fn symbol(s: impl AsRef<str>) -> Self {
        Self::Symbol(Arc::from(s.as_ref()))
    }

    /// Wrap an instance.
    pub fn record(instance: Instance) -> Self {
        Self::Record(Arc::new(instance))
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Self::Nil)
    }

    pub fn is_number(&self) -> bool {
        matches!(
            self,
            Self::Integer(_)
                | Self::Single(_)
                | Self::Double(_)
                | Self::ComplexSingle(..)
                | Self::ComplexDouble(..)
        )
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f32(&self) -> Option<f32> {
        match self {
            Self::Single(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Double(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) | Self::Symbol(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Arc<Instance>> {
        match self {
            Self::Record(r) => Some(r),
            _ => None,
        }
    }

    /// Short name of the value's dynamic type, for diagnostics.
    pub fn type_name(&self) -> &str {
        match self {
            Self::Nil => "null",
            Self::Bool(_) => "boolean",
            Self::Integer(_) => "integer",
            Self::Single(_) => "single-float",
            Self::Double(_) => "double-float",
            Self::ComplexSingle(..) => "(complex single-float)",
            Self::ComplexDouble(..) => "(complex double-float)",
            Self::String(_) => "string",
            Self::Symbol(_) => "symbol",
            Self::Record(r) => r.type_name(),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Nil, Self::Nil) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Integer(a), Self::Integer(b)) => a == b,
            (Self::Single(a), Self::Single(b)) => a == b,
            (Self::Double(a), Self::Double(b)) => a == b,
            (Self::ComplexSingle(ar, ai), Self::ComplexSingle(br, bi)) => ar == br && ai == bi,
            (Self::ComplexDouble(ar, ai), Self::ComplexDouble(br, bi)) => ar == br && ai == bi,
            (Self::String(a), Self::String(b)) | (Self::Symbol(a), Self::Symbol(b)) => a == b,
            (Self::Record(a), Self::Record(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nil => write!(f, "nil"),
            Self::Bool(true) => write!(f, "t"),
            Self::Bool(false) => write!(f, "false"),
            Self::Integer(v) => write!(f, "{}", v),
            Self::Single(v) => write!(f, "{:?}f0", v),
            Self::Double(v) => write!(f, "{:?}d0", v),
            Self::ComplexSingle(re, im) => write!(f, "#c({:?} {:?})", re, im),
            Self::ComplexDouble(re, im) => write!(f, "#c({:?}d0 {:?}d0)", re, im),
            Self::String(s) => write!(f, "{:?}", s),
            Self::Symbol(s) => write!(f, "{}", s),
            Self::Record(r) => write!(f, "#<{} {}>", r.type_name(), r.layout().id()),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Integer(i64::from(v))
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Self::Integer(i64::from(v))
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Self::Single(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::string(v)
    }
}

impl From<Instance> for Value {
    fn from(v: Instance) -> Self {
        Self::record(v)
    }
}

impl From<Arc<Instance>> for Value {
    fn from(v: Arc<Instance>) -> Self {
        Self::Record(v)
    }
}
