// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error taxonomy.
//!
//! - [`DefinitionError`]: a declaration was rejected; nothing was installed.
//! - [`MembershipError`]: an "is-a" check failed (obsolete instance, stale
//!   target layout, or plain mismatch).
//! - [`AccessError`]: a generated reader/writer/constructor refused to act.
//! - [`ConfigError`]: registry configuration could not be loaded.
//!
//! A redefinition conflict is not an error: it is handed to the caller as a
//! [`RedefinitionConflict`](crate::RedefinitionConflict) decision point.

use std::sync::Arc;

use thiserror::Error;

use crate::descriptor::Storage;
use crate::layout::LayoutId;

/// Why an inherited field override was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotConflict {
    /// The override declares a type that is not a subtype of the parent's.
    WidenedType,
    /// The parent declares the field read-only, the override does not.
    ReadOnlyRelaxed,
}

impl std::fmt::Display for SlotConflict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WidenedType => write!(f, "declared type widens the inherited type"),
            Self::ReadOnlyRelaxed => write!(f, "inherited field is read-only"),
        }
    }
}

/// A type declaration was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DefinitionError {
    #[error("type name must not be empty")]
    EmptyName,

    #[error("duplicate field `{field}` in declaration of `{type_name}`")]
    DuplicateField { type_name: Arc<str>, field: Arc<str> },

    #[error("field `{field}` of `{type_name}` conflicts with its inherited definition: {reason}")]
    InheritedSlotConflict {
        type_name: Arc<str>,
        field: Arc<str>,
        reason: SlotConflict,
    },

    #[error(
        "field `{field}` of `{type_name}` would change storage from {from:?} to {to:?} \
         relative to its inherited definition"
    )]
    StorageNarrowing {
        type_name: Arc<str>,
        field: Arc<str>,
        from: Storage,
        to: Storage,
    },

    #[error("`{type_name}` includes unknown type `{parent}`")]
    UnknownParent { type_name: Arc<str>, parent: Arc<str> },

    #[error("`{type_name}` cannot include `{parent}`: `{parent}` already includes `{type_name}`")]
    CircularInclusion { type_name: Arc<str>, parent: Arc<str> },

    #[error("`{type_name}` and its included parent `{parent}` use different representations")]
    RepresentationMismatch { type_name: Arc<str>, parent: Arc<str> },

    #[error("inclusion chain of `{type_name}` is {depth} deep (limit {limit})")]
    InheritanceTooDeep {
        type_name: Arc<str>,
        depth: usize,
        limit: usize,
    },

    #[error("`{type_name}` was built against a different layout of `{parent}`")]
    StaleParent { type_name: Arc<str>, parent: Arc<str> },

    #[error("`{type_name}` is list/vector backed and has no instance layout")]
    NotRecordBacked { type_name: Arc<str> },

    #[error("clobbering `{type_name}` cannot change its included parent")]
    ClobberAcrossParents { type_name: Arc<str> },
}

/// An instance membership test failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MembershipError {
    /// The layout tested against was superseded; the caller holds a stale handle.
    #[error("layout {layout} of `{type_name}` has been superseded")]
    InvalidTargetLayout { type_name: Arc<str>, layout: LayoutId },

    /// The instance was allocated under a layout that has since been superseded.
    #[error("instance of `{type_name}` is obsolete (allocated under superseded layout {layout})")]
    ObsoleteInstance { type_name: Arc<str>, layout: LayoutId },

    #[error("expected an instance of `{expected}`, found `{found}`")]
    TypeMismatch { expected: Arc<str>, found: Arc<str> },
}

/// A generated accessor, constructor or copier refused to act.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AccessError {
    #[error(transparent)]
    Membership(#[from] MembershipError),

    #[error("value {value} is not of declared type {expected} for field `{field}`")]
    TypeMismatch {
        field: Arc<str>,
        expected: String,
        value: String,
    },

    #[error("field `{field}` is unbound")]
    Unbound { field: Arc<str> },

    #[error("field `{field}` is read-only")]
    ReadOnly { field: Arc<str> },

    #[error("`{type_name}` has no field `{field}`")]
    UnknownField { type_name: Arc<str>, field: String },

    #[error("field `{field}` is outside the storage of this instance")]
    SlotOutOfRange { field: Arc<str> },

    #[error("constructor for `{type_name}` takes at most {expected} values, got {got}")]
    Arity {
        type_name: Arc<str>,
        expected: usize,
        got: usize,
    },
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
