// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Instance membership ("is-a").
//!
//! A layout at depth `d` is an ancestor of `L` iff `L.ancestors[d]` is that
//! layout, so the common test is one bounds check and one compare. Nothing
//! here locks or allocates.

use crate::error::MembershipError;
use crate::instance::Instance;
use crate::layout::InstanceLayout;

/// Layout-level test.
///
/// Fails with [`MembershipError::InvalidTargetLayout`] when `target` was
/// superseded and with [`MembershipError::ObsoleteInstance`] when `object` was,
/// unless `object` is `target` itself.
#[inline]
pub fn typep_to_layout(
    object: &InstanceLayout,
    target: &InstanceLayout,
) -> Result<bool, MembershipError> {
    if !target.is_valid() {
        return Err(MembershipError::InvalidTargetLayout {
            type_name: target.name().clone(),
            layout: target.id(),
        });
    }
    if object.id() == target.id() {
        return Ok(true);
    }
    if !object.is_valid() {
        return Err(obsolete(object));
    }
    Ok(object.ancestor_at(target.depth()) == Some(target.id()))
}

/// Raising variant used by generated accessors.
#[inline]
pub fn check_instance_of(object: &Instance, target: &InstanceLayout) -> Result<(), MembershipError> {
    if typep_to_layout(object.layout(), target)? {
        Ok(())
    } else {
        Err(MembershipError::TypeMismatch {
            expected: target.name().clone(),
            found: object.layout().name().clone(),
        })
    }
}

/// Boolean membership.
///
/// Obsolete instances are not members of anything but their own layout.
/// A superseded `target` falls back to [`ancestor_walk`].
#[inline]
pub fn is_instance_of(object: &Instance, target: &InstanceLayout) -> bool {
    if !target.is_valid() {
        return ancestor_walk(object.layout(), target);
    }
    let layout = object.layout();
    if layout.id() == target.id() {
        return true;
    }
    if !layout.is_valid() {
        return false;
    }
    layout.ancestor_at(target.depth()) == Some(target.id())
}

/// Linear search of `object`'s ancestor table for `target`.
///
/// Ignores validity and depth, so it also answers for superseded layouts.
#[cold]
pub fn ancestor_walk(object: &InstanceLayout, target: &InstanceLayout) -> bool {
    object.ancestors().iter().rev().any(|id| *id == target.id())
}

#[cold]
pub(crate) fn obsolete(layout: &InstanceLayout) -> MembershipError {
    log::debug!(
        "[membership] obsolete instance of '{}' (layout {})",
        layout.name(),
        layout.id()
    );
    MembershipError::ObsoleteInstance {
        type_name: layout.name().clone(),
        layout: layout.id(),
    }
}
