// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # objlayout - record layouts, generated accessors and O(1) type membership
//!
//! A runtime object model for record types declared with single-chain
//! inclusion. Given a declaration (field names, declared field types, an
//! optional included parent), the crate plans a physical instance layout,
//! generates type-checked accessors bound to that layout, and keeps a registry
//! of current layouts that tolerates hot redefinition while instances of the
//! old shape are still alive.
//!
//! ## Quick Start
//!
//! ```rust
//! use objlayout::{FieldSpec, LayoutRegistry, TypeExpr, Value, is_instance_of};
//!
//! let registry = LayoutRegistry::new();
//! let point = registry
//!     .declare_type(
//!         "point",
//!         None,
//!         vec![
//!             FieldSpec::new("x", TypeExpr::DoubleFloat),
//!             FieldSpec::new("y", TypeExpr::DoubleFloat),
//!         ],
//!     )
//!     .unwrap();
//! registry
//!     .declare_type("point3", Some("point"), vec![FieldSpec::new("z", TypeExpr::DoubleFloat)])
//!     .unwrap();
//!
//! let point3 = registry.accessors("point3").unwrap();
//! let p = point3
//!     .construct_positional(vec![Value::Double(1.0), Value::Double(2.0), Value::Double(3.0)])
//!     .unwrap();
//!
//! assert!(is_instance_of(&p, &point));
//! assert_eq!(point3.field("z").unwrap().read(&p).unwrap(), Value::Double(3.0));
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Declaration --> descriptor::build_descriptor --> TypeDescriptor
//!                                                      |
//!                                                      v
//!                 LayoutRegistry --(redefinition)--> registry::resolver
//!                      |                                   |
//!                      v                                   v
//!               InstanceLayout <------------------ Supersede / Clobber
//!                      |
//!                      v
//!             accessor::FieldAccessors --> Instance (stamped with its layout)
//!                                              |
//!                                              v
//!                                   membership::check_instance_of
//! ```
//!
//! ## Concurrency
//!
//! Declarations serialize on one registry lock. Everything on the access path
//! (membership tests, generated readers and writers, `current_layout`) is
//! lock-free: it reads immutable ancestor tables, an atomically swapped map of
//! current types and one atomic validity flag per layout.

/// Generated readers, writers, constructors, predicates and copiers.
pub mod accessor;
/// Registry configuration (TOML loadable).
pub mod config;
/// Type descriptors and the descriptor builder / slot allocator.
pub mod descriptor;
/// Error taxonomy.
pub mod error;
/// Instances and their raw word regions.
pub mod instance;
/// Instance layouts and layout identities.
pub mod layout;
/// Instance membership ("is-a") tests.
pub mod membership;
/// Process-wide layout registry and the redefinition resolver.
pub mod registry;
/// Declared field type expressions and the type resolver seam.
pub mod types;
/// Tagged slot values.
pub mod value;

pub use accessor::{AccessorPolicy, BoundP, FieldAccessor, FieldAccessors, Reader, Writer};
pub use config::RegistryConfig;
pub use descriptor::{
    build, build_descriptor, Declaration, FieldDescriptor, FieldSpec, NamingPolicy, RawKind,
    Representation, Storage, TypeDescriptor, RAW_WORD_BITS,
};
pub use error::{AccessError, ConfigError, DefinitionError, MembershipError, SlotConflict};
pub use instance::{Instance, RawRegion, Slot};
pub use layout::{InstanceLayout, LayoutHandle, LayoutId};
pub use membership::{ancestor_walk, check_instance_of, is_instance_of, typep_to_layout};
pub use registry::resolver::{
    ClobberToken, RedefinitionConflict, RedefinitionReport, Resolution,
};
pub use registry::{Declared, LayoutRegistry, RegisteredType, RegistryStats, Transition};
pub use types::{NoRecords, RecordTypes, StandardResolver, TypeExpr, TypeResolver};
pub use value::Value;
