// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Membership Benchmark
//!
//! Measures the "is-a" test and generated field access:
//! - identity hit, depth-indexed ancestor hit and miss
//! - the linear ancestor walk used for superseded targets
//! - boxed vs raw reads through generated accessors
//!
//! The depth-indexed test should stay flat as the inclusion chain grows.

#![allow(clippy::uninlined_format_args)]

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use objlayout::{
    ancestor_walk, is_instance_of, FieldSpec, Instance, LayoutHandle, LayoutRegistry, TypeExpr,
    Value,
};
use std::hint::black_box as bb;

/// Declare a chain `c0 <- c1 <- ... <- c{depth-1}` and return its layouts.
fn chain(registry: &LayoutRegistry, depth: usize) -> Vec<LayoutHandle> {
    let mut layouts = Vec::with_capacity(depth);
    for i in 0..depth {
        let name = format!("c{}", i);
        let parent = (i > 0).then(|| format!("c{}", i - 1));
        let layout = registry
            .declare_type(
                &name,
                parent.as_deref(),
                vec![FieldSpec::new(format!("f{}", i), TypeExpr::DoubleFloat)],
            )
            .expect("declare chain");
        layouts.push(layout);
    }
    layouts
}

fn bench_is_instance_of(c: &mut Criterion) {
    let mut group = c.benchmark_group("is_instance_of");

    for depth in [1usize, 4, 16, 48] {
        let registry = LayoutRegistry::new();
        let layouts = chain(&registry, depth);
        let leaf = Instance::allocate(&layouts[depth - 1]);
        let root = Instance::allocate(&layouts[0]);

        group.bench_with_input(BenchmarkId::new("identity", depth), &depth, |b, _| {
            b.iter(|| is_instance_of(bb(&leaf), bb(&layouts[depth - 1])));
        });
        group.bench_with_input(BenchmarkId::new("ancestor_hit", depth), &depth, |b, _| {
            b.iter(|| is_instance_of(bb(&leaf), bb(&layouts[0])));
        });
        group.bench_with_input(BenchmarkId::new("miss", depth), &depth, |b, _| {
            b.iter(|| is_instance_of(bb(&root), bb(&layouts[depth - 1])));
        });
        group.bench_with_input(BenchmarkId::new("ancestor_walk", depth), &depth, |b, _| {
            b.iter(|| ancestor_walk(bb(leaf.layout()), bb(&layouts[0])));
        });
    }

    group.finish();
}

fn bench_field_read(c: &mut Criterion) {
    let mut group = c.benchmark_group("field_read");

    let registry = LayoutRegistry::new();
    registry
        .declare_type(
            "sample",
            None,
            vec![
                FieldSpec::untyped("boxed"),
                FieldSpec::new("raw", TypeExpr::DoubleFloat),
            ],
        )
        .expect("declare sample");
    let accessors = registry.accessors("sample").expect("accessors");
    let inst = accessors
        .construct([("boxed", Value::Integer(1)), ("raw", Value::Double(2.0))])
        .expect("construct");

    let boxed = accessors.field("boxed").expect("boxed field");
    let raw = accessors.field("raw").expect("raw field");

    group.bench_function("boxed", |b| b.iter(|| boxed.read(bb(&inst))));
    group.bench_function("raw_double", |b| b.iter(|| raw.read(bb(&inst))));

    group.finish();
}

criterion_group!(benches, bench_is_instance_of, bench_field_read);
criterion_main!(benches);
