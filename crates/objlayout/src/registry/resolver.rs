// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Redefinition resolver.
//!
//! A second declaration of a registered name is classified against the
//! current layout. Compatible redefinitions keep the layout identity and
//! swap its descriptor in place. Anything else is a [`RedefinitionConflict`]
//! handed to the caller, who picks a [`Resolution`].

use std::fmt;
use std::sync::Arc;

use crate::descriptor::TypeDescriptor;
use crate::layout::{InstanceLayout, LayoutHandle};
use crate::types::TypeResolver;

/// Field-level differences between the current and the proposed descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RedefinitionReport {
    pub type_name: Arc<str>,
    /// Same storage, different index or raw region slot.
    pub moved: Vec<Arc<str>>,
    /// Different storage, or a declared type old values may not satisfy.
    pub retyped: Vec<Arc<str>>,
    /// Present in the current descriptor, absent from the proposed one.
    pub deleted: Vec<Arc<str>>,
    /// New in the proposed descriptor.
    pub added: Vec<Arc<str>>,
    /// The included parent resolves to a different layout.
    pub parent_changed: bool,
}

impl RedefinitionReport {
    /// Whether the proposed descriptor can replace the current one in place.
    pub fn is_compatible(&self) -> bool {
        self.moved.is_empty()
            && self.retyped.is_empty()
            && self.deleted.is_empty()
            && !self.parent_changed
    }
}

impl fmt::Display for RedefinitionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn list(f: &mut fmt::Formatter<'_>, label: &str, names: &[Arc<str>]) -> fmt::Result {
            if names.is_empty() {
                return Ok(());
            }
            write!(f, " {}=[", label)?;
            for (i, name) in names.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", name)?;
            }
            write!(f, "]")
        }

        write!(f, "{}:", self.type_name)?;
        list(f, "moved", &self.moved)?;
        list(f, "retyped", &self.retyped)?;
        list(f, "deleted", &self.deleted)?;
        list(f, "added", &self.added)?;
        if self.parent_changed {
            write!(f, " parent changed")?;
        }
        Ok(())
    }
}

/// Compare the current layout's descriptor with a proposed one.
pub fn classify(
    current: &InstanceLayout,
    proposed: &TypeDescriptor,
    proposed_parent: Option<&LayoutHandle>,
    resolver: &dyn TypeResolver,
) -> RedefinitionReport {
    let old = current.descriptor();
    let mut report = RedefinitionReport {
        type_name: proposed.name().clone(),
        ..Default::default()
    };

    let region_moved =
        old.raw_region_index().is_some() && old.raw_region_index() != proposed.raw_region_index();

    for old_field in old.fields() {
        let Some(new_field) = proposed.field(&old_field.name) else {
            report.deleted.push(old_field.name.clone());
            continue;
        };
        if new_field.storage != old_field.storage {
            report.retyped.push(old_field.name.clone());
        } else if new_field.index != old_field.index || (old_field.storage.is_raw() && region_moved) {
            report.moved.push(old_field.name.clone());
        } else if !resolver.is_subtype(&old_field.declared_type, &new_field.declared_type) {
            report.retyped.push(old_field.name.clone());
        }
    }

    report.added = proposed
        .fields()
        .iter()
        .filter(|f| old.field(&f.name).is_none())
        .map(|f| f.name.clone())
        .collect();

    report.parent_changed = current.parent().map(|p| p.id()) != proposed_parent.map(|p| p.id());
    report
}

/// Permission to clobber a layout in place.
///
/// Only obtainable through an `unsafe` constructor: clobbering reuses the
/// layout identity under a different shape, so every instance still alive
/// under the old shape is read through the new field table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClobberToken {
    _private: (),
}

impl ClobberToken {
    /// # Safety
    ///
    /// The caller guarantees no instance allocated under the layout being
    /// clobbered is alive or will be touched again, e.g. a fresh image that
    /// has not yet allocated any. Accessors on such instances would read and
    /// write fields at locations they were never allocated with.
    pub unsafe fn assume_no_live_instances() -> Self {
        Self { _private: () }
    }
}

/// How to resolve an incompatible redefinition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Resolution {
    /// Install a new layout and mark the old one invalid.
    #[default]
    Supersede,
    /// Force the new descriptor onto the existing layout.
    Clobber(ClobberToken),
}

/// An incompatible redefinition awaiting a [`Resolution`].
#[derive(Debug)]
pub struct RedefinitionConflict {
    current: LayoutHandle,
    proposed: Arc<TypeDescriptor>,
    report: RedefinitionReport,
}

impl RedefinitionConflict {
    pub(crate) fn new(
        current: LayoutHandle,
        proposed: Arc<TypeDescriptor>,
        report: RedefinitionReport,
    ) -> Self {
        Self {
            current,
            proposed,
            report,
        }
    }

    pub fn current(&self) -> &LayoutHandle {
        &self.current
    }

    pub fn proposed(&self) -> &TypeDescriptor {
        &self.proposed
    }

    pub fn report(&self) -> &RedefinitionReport {
        &self.report
    }

    pub fn moved(&self) -> &[Arc<str>] {
        &self.report.moved
    }

    pub fn retyped(&self) -> &[Arc<str>] {
        &self.report.retyped
    }

    pub fn deleted(&self) -> &[Arc<str>] {
        &self.report.deleted
    }

    pub(crate) fn into_parts(self) -> (LayoutHandle, Arc<TypeDescriptor>, RedefinitionReport) {
        (self.current, self.proposed, self.report)
    }
}

impl fmt::Display for RedefinitionConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "incompatible redefinition of layout {} ({})",
            self.current.id(),
            self.report
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{build, FieldSpec};
    use crate::types::{StandardResolver, TypeExpr};

    fn layout_of(specs: Vec<FieldSpec>) -> LayoutHandle {
        InstanceLayout::new(Arc::new(build("t", None, specs).unwrap()), None)
    }

    fn report(old: Vec<FieldSpec>, new: Vec<FieldSpec>) -> RedefinitionReport {
        let current = layout_of(old);
        let proposed = build("t", None, new).unwrap();
        classify(&current, &proposed, None, &StandardResolver)
    }

    fn names(v: &[Arc<str>]) -> Vec<&str> {
        v.iter().map(|n| &**n).collect()
    }

    #[test]
    fn test_identical_is_compatible() {
        let specs = || {
            vec![
                FieldSpec::untyped("a"),
                FieldSpec::new("b", TypeExpr::DoubleFloat),
            ]
        };
        let r = report(specs(), specs());
        assert!(r.is_compatible());
        assert_eq!(r, RedefinitionReport {
            type_name: Arc::from("t"),
            ..Default::default()
        });
    }

    #[test]
    fn test_appending_is_compatible() {
        let r = report(
            vec![FieldSpec::untyped("a")],
            vec![FieldSpec::untyped("a"), FieldSpec::untyped("b")],
        );
        assert!(r.is_compatible());
        assert_eq!(names(&r.added), ["b"]);
    }

    #[test]
    fn test_widening_is_compatible_narrowing_is_not() {
        let widened = report(
            vec![FieldSpec::new("n", TypeExpr::Fixnum)],
            vec![FieldSpec::new("n", TypeExpr::Integer)],
        );
        assert!(widened.is_compatible());

        let narrowed = report(
            vec![FieldSpec::new("n", TypeExpr::Integer)],
            vec![FieldSpec::new("n", TypeExpr::Fixnum)],
        );
        assert_eq!(names(&narrowed.retyped), ["n"]);
        assert!(!narrowed.is_compatible());
    }

    #[test]
    fn test_moved_retyped_deleted() {
        let r = report(
            vec![
                FieldSpec::untyped("a"),
                FieldSpec::untyped("b"),
                FieldSpec::new("c", TypeExpr::DoubleFloat),
                FieldSpec::untyped("gone"),
            ],
            vec![
                FieldSpec::untyped("b"),
                FieldSpec::untyped("a"),
                FieldSpec::new("c", TypeExpr::SingleFloat),
            ],
        );
        assert_eq!(names(&r.moved), ["a", "b"]);
        assert_eq!(names(&r.retyped), ["c"]);
        assert_eq!(names(&r.deleted), ["gone"]);
        assert!(!r.is_compatible());
        assert_eq!(
            r.to_string(),
            "t: moved=[a, b] retyped=[c] deleted=[gone]"
        );
    }

    #[test]
    fn test_raw_region_slot_move_moves_raw_fields() {
        let r = report(
            vec![FieldSpec::new("r", TypeExpr::DoubleFloat)],
            vec![FieldSpec::untyped("x"), FieldSpec::new("r", TypeExpr::DoubleFloat)],
        );
        assert_eq!(names(&r.moved), ["r"]);
        assert_eq!(names(&r.added), ["x"]);
    }

    #[test]
    fn test_boxed_to_raw_is_retyped() {
        let r = report(
            vec![FieldSpec::untyped("x")],
            vec![FieldSpec::new("x", TypeExpr::DoubleFloat)],
        );
        assert_eq!(names(&r.retyped), ["x"]);
        assert!(r.moved.is_empty());
    }

    #[test]
    fn test_parent_change() {
        let p1 = layout_of(vec![]);
        let p2 = layout_of(vec![]);
        let current = InstanceLayout::new(
            Arc::new(build("c", Some(&*p1.descriptor()), vec![]).unwrap()),
            Some(p1.clone()),
        );
        let proposed = build("c", Some(&*p2.descriptor()), vec![]).unwrap();

        assert!(classify(&current, &proposed, Some(&p2), &StandardResolver).parent_changed);
        assert!(!classify(&current, &proposed, Some(&p1), &StandardResolver).parent_changed);
    }
}
