// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

mod expr;
mod resolver;

pub use expr::{TypeExpr, FIXNUM_BITS};
pub use resolver::{StandardResolver, TypeResolver};

use crate::error::MembershipError;
use crate::instance::Instance;

/// Record-type knowledge the type expressions need from a registry.
pub trait RecordTypes {
    /// Whether record type `sub` is `sup` or includes it.
    fn includes(&self, sub: &str, sup: &str) -> bool;

    /// Whether `instance` is of the record type named `name`.
    fn instance_of(&self, instance: &Instance, name: &str) -> Result<bool, MembershipError>;
}

/// Knows no record types beyond name equality.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoRecords;

impl RecordTypes for NoRecords {
    fn includes(&self, sub: &str, sup: &str) -> bool {
        sub == sup
    }

    fn instance_of(&self, instance: &Instance, name: &str) -> Result<bool, MembershipError> {
        Ok(instance.type_name() == name)
    }
}
