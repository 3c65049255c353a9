// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type-expression resolver used by storage classification.

use crate::descriptor::RawKind;
use crate::types::{NoRecords, TypeExpr};

/// Answers subtype questions about declared field types.
///
/// The descriptor builder only asks two things: whether a field's type is
/// a subtype of one of the raw kinds, and whether an override narrows the
/// inherited type. Everything else about the type system stays outside.
pub trait TypeResolver {
    /// Whether every value of `sub` is a value of `sup`.
    fn is_subtype(&self, sub: &TypeExpr, sup: &TypeExpr) -> bool;

    /// Whether `ty` can be stored untagged as `kind`.
    ///
    /// The empty type never classifies as raw: there is nothing to store.
    fn is_subtype_of_raw(&self, ty: &TypeExpr, kind: RawKind) -> bool {
        !is_empty_type(ty) && self.is_subtype(ty, &kind.type_expr())
    }

    /// First raw kind `ty` fits, if any.
    fn raw_kind_of(&self, ty: &TypeExpr) -> Option<RawKind> {
        RawKind::ALL
            .into_iter()
            .find(|kind| self.is_subtype_of_raw(ty, *kind))
    }
}

/// Structural resolver over [`TypeExpr`].
///
/// Record types are only related to themselves. The registry supplies a
/// resolver that also knows the current inclusion chains.
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardResolver;

impl TypeResolver for StandardResolver {
    fn is_subtype(&self, sub: &TypeExpr, sup: &TypeExpr) -> bool {
        sub.is_subtype_of(sup, &NoRecords)
    }
}

fn is_empty_type(ty: &TypeExpr) -> bool {
    match ty {
        TypeExpr::Or(xs) => xs.iter().all(is_empty_type),
        TypeExpr::Member(vs) => vs.is_empty(),
        _ => false,
    }
}
