// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![allow(clippy::uninlined_format_args)] // Test/bench code readability over pedantic
#![allow(clippy::float_cmp)] // Test assertions with constants
#![allow(clippy::missing_panics_doc)] // Tests panic on failure

//! Redefinition integration tests
//!
//! Drives the public registry API through compatible, superseding and
//! clobbering redefinitions and checks what live instances observe.

use objlayout::{
    check_instance_of, is_instance_of, AccessError, ClobberToken, Declaration, FieldSpec,
    LayoutRegistry, MembershipError, RawKind, Resolution, Storage, Transition, TypeExpr, Value,
};

fn particle_fields() -> Vec<FieldSpec> {
    vec![
        FieldSpec::new("mass", TypeExpr::DoubleFloat).with_default(1.0f64),
        FieldSpec::new("charge", TypeExpr::SingleFloat),
        FieldSpec::new("id", TypeExpr::UnsignedByte(32)),
        FieldSpec::untyped("name"),
    ]
}

#[test]
fn test_compatible_redefinition_preserves_every_field() {
    let registry = LayoutRegistry::new();
    let layout = registry.declare_type("particle", None, particle_fields()).unwrap();
    let before = registry.accessors("particle").unwrap();

    let p = before
        .construct([
            ("charge", Value::Single(-1.0)),
            ("id", Value::Integer(42)),
            ("name", Value::string("electron")),
        ])
        .unwrap();

    let mut fields = particle_fields();
    fields.push(FieldSpec::new("spin", TypeExpr::ComplexSingle));
    let declared = registry
        .declare(&Declaration::new("particle").fields(fields))
        .unwrap();
    assert!(matches!(declared.transition, Transition::Compatible { .. }));
    assert_eq!(declared.layout.id(), layout.id());

    let after = registry.accessors("particle").unwrap();
    for accessors in [&before, &after] {
        assert_eq!(accessors.read(&p, "mass").unwrap(), Value::Double(1.0));
        assert_eq!(accessors.read(&p, "charge").unwrap(), Value::Single(-1.0));
        assert_eq!(accessors.read(&p, "id").unwrap(), Value::Integer(42));
        assert_eq!(accessors.read(&p, "name").unwrap(), Value::string("electron"));
    }

    let mut q = after
        .construct([("spin", Value::ComplexSingle(0.5, -0.5))])
        .unwrap();
    after.write(&mut q, "mass", Value::Double(2.5)).unwrap();
    assert_eq!(after.read(&q, "spin").unwrap(), Value::ComplexSingle(0.5, -0.5));
    assert_eq!(before.read(&q, "mass").unwrap(), Value::Double(2.5));
}

#[test]
fn test_superseded_instances_never_read_garbage() {
    let registry = LayoutRegistry::new();
    let old_layout = registry.declare_type("particle", None, particle_fields()).unwrap();
    let old_accessors = registry.accessors("particle").unwrap();
    let old = old_accessors
        .construct([("id", Value::Integer(7))])
        .unwrap();

    // `id` becomes boxed: its storage changes.
    let mut fields = particle_fields();
    fields[2] = FieldSpec::new("id", TypeExpr::Integer);
    let declared = registry
        .declare(&Declaration::new("particle").fields(fields))
        .unwrap();
    let Transition::Superseded { report, .. } = &declared.transition else {
        panic!("expected supersede, got {:?}", declared.transition);
    };
    assert_eq!(report.retyped.len(), 1);
    assert_eq!(&*report.retyped[0], "id");

    assert!(!old_layout.is_valid());
    let new_accessors = registry.accessors("particle").unwrap();
    for field in ["mass", "charge", "id", "name"] {
        for accessors in [&old_accessors, &new_accessors] {
            let err = accessors.read(&old, field).unwrap_err();
            assert_eq!(
                err,
                AccessError::Membership(MembershipError::ObsoleteInstance {
                    type_name: "particle".into(),
                    layout: old_layout.id(),
                }),
                "field {}",
                field
            );
        }
    }
    assert!(!new_accessors.is_instance(&Value::record(old.clone())));
    assert!(check_instance_of(&old, &declared.layout).is_err());

    let field = new_accessors.field("id").unwrap();
    assert_eq!(field.descriptor().storage, Storage::Boxed);
    let fresh = new_accessors
        .construct([("id", Value::Integer(-7))])
        .unwrap();
    assert_eq!(field.read(&fresh).unwrap(), Value::Integer(-7));
}

#[test]
fn test_ignoring_the_conflict_supersedes() {
    let registry = LayoutRegistry::new();
    let first = registry
        .declare_type("node", None, vec![FieldSpec::untyped("next")])
        .unwrap();
    let second = registry
        .declare_type("node", None, vec![FieldSpec::untyped("prev")])
        .unwrap();

    assert_ne!(first.id(), second.id());
    assert!(!first.is_valid());
    assert!(second.is_valid());
    assert_eq!(registry.stats().superseded, 1);
}

#[test]
fn test_clobber_is_explicit_and_keeps_identity() {
    let registry = LayoutRegistry::new();
    let layout = registry
        .declare_type("vec2", None, vec![
            FieldSpec::new("x", TypeExpr::SingleFloat),
            FieldSpec::new("y", TypeExpr::SingleFloat),
        ])
        .unwrap();

    let widened = Declaration::new("vec2").fields([
        FieldSpec::new("x", TypeExpr::DoubleFloat),
        FieldSpec::new("y", TypeExpr::DoubleFloat),
    ]);
    // SAFETY: no instance of `vec2` was ever allocated.
    let token = unsafe { ClobberToken::assume_no_live_instances() };
    let declared = registry
        .declare_with(&widened, |conflict| {
            assert_eq!(conflict.retyped().len(), 2);
            Resolution::Clobber(token)
        })
        .unwrap();

    assert_eq!(declared.layout.id(), layout.id());
    assert!(layout.is_valid());
    assert_eq!(
        layout.descriptor().field("y").unwrap().storage,
        Storage::Raw(RawKind::DoubleFloat)
    );
    assert_eq!(layout.descriptor().raw_region_words(), 4);

    let v = declared
        .accessors
        .construct_positional(vec![Value::Double(0.25), Value::Double(0.5)])
        .unwrap();
    assert!(is_instance_of(&v, &layout));
    assert_eq!(declared.accessors.read(&v, "y").unwrap(), Value::Double(0.5));
}

#[test]
fn test_growing_a_parent_invalidates_descendants() {
    let registry = LayoutRegistry::new();
    let base = registry
        .declare_type("base", None, vec![FieldSpec::untyped("a")])
        .unwrap();
    let kid_layout = registry
        .declare_type("kid", Some("base"), vec![FieldSpec::untyped("c")])
        .unwrap();
    let kid = registry.accessors("kid").unwrap();
    let mut k = kid.construct([("c", Value::Integer(42))]).unwrap();

    let declared = registry
        .declare(&Declaration::new("base").fields([FieldSpec::untyped("a"), FieldSpec::untyped("b")]))
        .unwrap();
    let Transition::Compatible { invalidated, .. } = &declared.transition else {
        panic!("expected compatible redefinition, got {:?}", declared.transition);
    };
    assert_eq!(invalidated.len(), 1);
    assert_eq!(&*invalidated[0], "kid");
    assert_eq!(declared.layout.id(), base.id());
    assert!(base.is_valid());
    assert!(!kid_layout.is_valid());
    assert!(registry.current_layout("kid").is_none());

    // The appended slot is the child's `c`: it must not be reachable.
    let b = registry.accessor("base", "b").unwrap();
    assert!(matches!(
        b.read(&k),
        Err(AccessError::Membership(MembershipError::ObsoleteInstance { .. }))
    ));
    assert!(matches!(
        b.write(&mut k, Value::string("clobbered")),
        Err(AccessError::Membership(MembershipError::ObsoleteInstance { .. }))
    ));
    assert!(matches!(
        kid.read(&k, "c"),
        Err(AccessError::Membership(MembershipError::ObsoleteInstance { .. }))
    ));
    assert_eq!(registry.stats().invalidated, 1);
}

#[test]
fn test_growing_a_parent_raw_region_invalidates_descendants() {
    let registry = LayoutRegistry::new();
    registry
        .declare_type("rb", None, vec![FieldSpec::new("x", TypeExpr::DoubleFloat)])
        .unwrap();
    registry
        .declare_type("rk", Some("rb"), vec![FieldSpec::new("z", TypeExpr::DoubleFloat)])
        .unwrap();
    let k = registry
        .accessors("rk")
        .unwrap()
        .construct([("z", Value::Double(3.5))])
        .unwrap();

    registry
        .declare(&Declaration::new("rb").fields([
            FieldSpec::new("x", TypeExpr::DoubleFloat),
            FieldSpec::new("y", TypeExpr::DoubleFloat),
        ]))
        .unwrap();

    let y = registry.accessor("rb", "y").unwrap();
    assert!(matches!(
        y.read(&k),
        Err(AccessError::Membership(MembershipError::ObsoleteInstance { .. }))
    ));
    assert!(registry.descendants("rb").is_empty());
}

#[test]
fn test_compatible_parent_change_without_growth_keeps_descendants() {
    let registry = LayoutRegistry::new();
    registry
        .declare_type("base", None, vec![FieldSpec::untyped("a")])
        .unwrap();
    let kid_layout = registry
        .declare_type("kid", Some("base"), vec![FieldSpec::untyped("c")])
        .unwrap();

    let declared = registry
        .declare(&Declaration::new("base").field(FieldSpec::untyped("a").with_default(1i64)))
        .unwrap();
    assert!(matches!(
        &declared.transition,
        Transition::Compatible { invalidated, .. } if invalidated.is_empty()
    ));
    assert!(kid_layout.is_valid());
    assert!(registry.current_layout("kid").is_some());
}
