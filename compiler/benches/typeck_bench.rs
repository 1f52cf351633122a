//! Micro-benchmarks for the unifiers.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use nacre_compiler::ast::shared::{EffectSym, Label};
use nacre_compiler::typeck::unify::unify_types;
use nacre_compiler::types::kind::Kind;
use nacre_compiler::types::var::{fresh_type_var, RigidityEnv};
use nacre_compiler::types::Type;

fn deep_type(depth: usize, leaf: Type) -> Type {
    (0..depth).fold(leaf, |t, _| Type::mk_vector(t))
}

fn bench_syntactic(c: &mut Criterion) {
    let renv = RigidityEnv::new();
    let v = fresh_type_var(Kind::Star);
    let t1 = deep_type(32, Type::Var(v));
    let t2 = deep_type(32, Type::int32());
    c.bench_function("unify_deep_vector", |b| {
        b.iter(|| unify_types(black_box(&t1), black_box(&t2), &renv))
    });
}

fn bench_rows(c: &mut Criterion) {
    let renv = RigidityEnv::new();
    let labels: Vec<String> = (0..16).map(|i| format!("f{:02}", i)).collect();
    let closed = |order: Vec<usize>| {
        order
            .into_iter()
            .rev()
            .fold(Type::record_row_empty(), |acc, i| {
                Type::mk_record_row_extend(Label::new(labels[i].clone()), Type::int32(), acc)
            })
    };
    let r1 = closed((0..16).collect());
    let r2 = closed((0..16).rev().collect());
    c.bench_function("unify_permuted_rows", |b| {
        b.iter(|| unify_types(black_box(&r1), black_box(&r2), &renv))
    });
}

fn bench_effects(c: &mut Criterion) {
    let renv = RigidityEnv::new();
    let e1 = fresh_type_var(Kind::Bool);
    let e2 = fresh_type_var(Kind::Bool);
    let io = Type::mk_effect(EffectSym::new(1, "IO"));
    let net = Type::mk_effect(EffectSym::new(2, "Net"));
    let t1 = Type::mk_union(Type::Var(e1), Type::mk_intersection(io.clone(), Type::Var(e2)));
    let t2 = Type::mk_union(io, net);
    c.bench_function("unify_effect_formulas", |b| {
        b.iter(|| unify_types(black_box(&t1), black_box(&t2), &renv))
    });
}

criterion_group!(benches, bench_syntactic, bench_rows, bench_effects);
criterion_main!(benches);
