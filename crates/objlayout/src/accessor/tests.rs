// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use super::*;
use crate::descriptor::{build, FieldSpec};
use crate::error::MembershipError;
use crate::layout::InstanceLayout;
use crate::types::TypeExpr;

const NO_ARGS: [(&str, Value); 0] = [];

fn accessors_for(name: &str, specs: Vec<FieldSpec>) -> FieldAccessors {
    let desc = build(name, None, specs).unwrap();
    FieldAccessors::for_layout(&InstanceLayout::new(Arc::new(desc), None))
}

fn sample() -> FieldAccessors {
    accessors_for(
        "sample",
        vec![
            FieldSpec::untyped("label").with_default("none"),
            FieldSpec::new("word", TypeExpr::UnsignedByte(32)),
            FieldSpec::new("single", TypeExpr::SingleFloat),
            FieldSpec::new("double", TypeExpr::DoubleFloat),
            FieldSpec::new("cs", TypeExpr::ComplexSingle),
            FieldSpec::new("cd", TypeExpr::ComplexDouble),
            FieldSpec::new("small", TypeExpr::UnsignedByte(8)),
            FieldSpec::new("count", TypeExpr::Fixnum).read_only(),
        ],
    )
}

#[test]
fn test_safe_write_then_read_every_storage() {
    let acc = sample();
    let mut inst = acc.construct(NO_ARGS).unwrap();

    let cases = [
        ("label", Value::symbol("hello")),
        ("word", Value::Integer(0xffff_fffe)),
        ("single", Value::Single(2.5)),
        ("double", Value::Double(-7.125)),
        ("cs", Value::ComplexSingle(1.0, -1.0)),
        ("cd", Value::ComplexDouble(0.5, 1e-300)),
        ("small", Value::Integer(200)),
    ];
    for (field, value) in cases.iter().cloned() {
        acc.field(field)
            .unwrap()
            .write_with(AccessorPolicy::Safe, &mut inst, value)
            .unwrap();
    }
    for (field, value) in cases {
        assert_eq!(acc.read(&inst, field).unwrap(), value, "field {}", field);
    }
}

#[test]
fn test_raw_fields_do_not_clobber_neighbours() {
    let acc = sample();
    let mut inst = acc.construct(NO_ARGS).unwrap();
    acc.write(&mut inst, "double", Value::Double(f64::MAX)).unwrap();
    acc.write(&mut inst, "single", Value::Single(1.0)).unwrap();
    acc.write(&mut inst, "cd", Value::ComplexDouble(-1.0, -2.0)).unwrap();

    assert_eq!(acc.read(&inst, "double").unwrap(), Value::Double(f64::MAX));
    assert_eq!(acc.read(&inst, "single").unwrap(), Value::Single(1.0));
    assert_eq!(acc.read(&inst, "word").unwrap(), Value::Integer(0));
    assert_eq!(acc.read(&inst, "cs").unwrap(), Value::ComplexSingle(0.0, 0.0));
}

#[test]
fn test_safe_writer_checks_declared_type() {
    let acc = sample();
    let mut inst = acc.construct(NO_ARGS).unwrap();
    let small = acc.field("small").unwrap();

    let err = small
        .write_with(AccessorPolicy::Safe, &mut inst, Value::Integer(300))
        .unwrap_err();
    assert!(matches!(err, AccessError::TypeMismatch { ref expected, .. } if expected == "(unsigned-byte 8)"));
    assert_eq!(small.read(&inst).unwrap(), Value::Integer(0));

    // The fast writer only cares that the value fits a word.
    small
        .write_with(AccessorPolicy::Fast, &mut inst, Value::Integer(300))
        .unwrap();
    assert_eq!(small.read(&inst).unwrap(), Value::Integer(300));
}

#[test]
fn test_fast_writer_still_rejects_wrong_storage_shape() {
    let acc = sample();
    let mut inst = acc.construct(NO_ARGS).unwrap();
    let err = acc
        .field("double")
        .unwrap()
        .write_with(AccessorPolicy::Fast, &mut inst, Value::string("nope"))
        .unwrap_err();
    assert!(matches!(err, AccessError::TypeMismatch { .. }));
    assert_eq!(acc.read(&inst, "double").unwrap(), Value::Double(0.0));
}

#[test]
fn test_read_only_fields() {
    let acc = sample();
    let count = acc.field("count").unwrap();
    assert!(count.writer(AccessorPolicy::Safe).is_none());
    assert!(count.writer(AccessorPolicy::Fast).is_none());

    let mut inst = acc.construct([("count", Value::Integer(3))]).unwrap();
    assert_eq!(count.read(&inst).unwrap(), Value::Integer(3));
    assert!(matches!(
        count.write(&mut inst, Value::Integer(4)),
        Err(AccessError::ReadOnly { .. })
    ));
}

#[test]
fn test_constructor_defaults_and_unbound() {
    let acc = sample();
    let inst = acc.construct(NO_ARGS).unwrap();

    assert_eq!(acc.read(&inst, "label").unwrap(), Value::string("none"));
    assert!(matches!(
        acc.read(&inst, "count"),
        Err(AccessError::Unbound { .. })
    ));
    assert!(!acc.field("count").unwrap().is_bound(&inst).unwrap());
    // Raw fields are always bound, zeroed.
    assert!(acc.field("single").unwrap().is_bound(&inst).unwrap());
    assert_eq!(acc.read(&inst, "single").unwrap(), Value::Single(0.0));
}

#[test]
fn test_keyword_constructor_first_initializer_wins() {
    let acc = sample();
    let inst = acc
        .construct([
            ("double", Value::Double(1.0)),
            ("double", Value::Double(2.0)),
        ])
        .unwrap();
    assert_eq!(acc.read(&inst, "double").unwrap(), Value::Double(1.0));
}

#[test]
fn test_constructor_errors() {
    let acc = sample();
    assert!(matches!(
        acc.construct([("nope", Value::Nil)]),
        Err(AccessError::UnknownField { .. })
    ));
    assert!(matches!(
        acc.construct([("single", Value::Double(1.0))]),
        Err(AccessError::TypeMismatch { .. })
    ));
    let too_many = vec![Value::Nil; acc.fields().len() + 1];
    assert!(matches!(
        acc.construct_positional(too_many),
        Err(AccessError::Arity { expected: 8, got: 9, .. })
    ));
}

#[test]
fn test_positional_constructor() {
    let acc = accessors_for(
        "pair",
        vec![
            FieldSpec::new("left", TypeExpr::DoubleFloat),
            FieldSpec::untyped("right").with_default(Value::symbol("nil")),
        ],
    );
    let full = acc
        .construct_positional(vec![Value::Double(1.0), Value::Integer(2)])
        .unwrap();
    assert_eq!(acc.read(&full, "right").unwrap(), Value::Integer(2));

    let short = acc.construct_positional(vec![Value::Double(1.0)]).unwrap();
    assert_eq!(acc.read(&short, "right").unwrap(), Value::symbol("nil"));
}

#[test]
fn test_foreign_instance_is_rejected() {
    let a = accessors_for("a", vec![FieldSpec::untyped("x")]);
    let b = accessors_for("b", vec![FieldSpec::untyped("x")]);
    let ib = b.construct([("x", Value::Integer(1))]).unwrap();

    let err = a.read(&ib, "x").unwrap_err();
    assert!(matches!(
        err,
        AccessError::Membership(MembershipError::TypeMismatch { .. })
    ));
    assert!(!a.is_instance(&Value::record(ib.clone())));
    assert!(b.is_instance(&Value::record(ib)));
    assert!(!b.is_instance(&Value::Integer(1)));
}

#[test]
fn test_copier_is_independent() {
    let acc = sample();
    let original = acc.construct([("double", Value::Double(1.0))]).unwrap();
    let mut copy = acc.copy(&original).unwrap();
    acc.write(&mut copy, "double", Value::Double(9.0)).unwrap();

    assert_eq!(acc.read(&original, "double").unwrap(), Value::Double(1.0));
    assert_eq!(acc.read(&copy, "double").unwrap(), Value::Double(9.0));
    assert!(Arc::ptr_eq(copy.layout(), original.layout()));
}

#[test]
fn test_obsolete_instance_is_refused() {
    let acc = sample();
    let mut inst = acc.construct(NO_ARGS).unwrap();
    acc.layout().invalidate();

    assert!(matches!(
        acc.read(&inst, "double"),
        Err(AccessError::Membership(MembershipError::ObsoleteInstance { .. }))
    ));
    assert!(matches!(
        acc.write(&mut inst, "double", Value::Double(1.0)),
        Err(AccessError::Membership(MembershipError::ObsoleteInstance { .. }))
    ));
    assert!(matches!(
        acc.construct(NO_ARGS),
        Err(AccessError::Membership(MembershipError::InvalidTargetLayout { .. }))
    ));
}

#[test]
fn test_generated_names() {
    let acc = sample();
    assert_eq!(acc.constructor_name(), "make-sample");
    assert_eq!(acc.predicate_name(), "sample-p");
    assert_eq!(acc.copier_name(), "copy-sample");
    assert_eq!(acc.field("double").unwrap().accessor_name(), "sample-double");
    assert_eq!(acc.by_accessor_name("sample-cs").unwrap().name().as_ref(), "cs");
}
