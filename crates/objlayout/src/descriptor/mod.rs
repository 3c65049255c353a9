// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

mod builder;
mod field;
mod type_descriptor;

pub use builder::{build, build_descriptor};
pub use field::{FieldDescriptor, FieldSpec, RawKind, Storage, RAW_WORD_BITS};
pub use type_descriptor::{Declaration, NamingPolicy, Representation, TypeDescriptor};
