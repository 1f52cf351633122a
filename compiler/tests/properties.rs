//! Property-based tests for the algebraic laws of the core.
//!
//! Syntactic laws (soundness, idempotence, composition) are checked
//! structurally; the Boolean effect laws are checked against a
//! truth-table oracle, since the unifier is free to return any
//! equivalent formula.

use std::sync::OnceLock;

use proptest::prelude::*;

use nacre_compiler::ast::shared::{EffectSym, Label};
use nacre_compiler::typeck::unify::unify_types;
use nacre_compiler::typeck::{errors::UnificationError, scheme_ops};
use nacre_compiler::types::bool_alg::{self, AtomTable};
use nacre_compiler::types::kind::Kind;
use nacre_compiler::types::subst::Substitution;
use nacre_compiler::types::var::{fresh_named_type_var, RigidityEnv, TypeVarSym};
use nacre_compiler::types::Type;

// ============================================================================
// Variable pools and strategies
// ============================================================================

fn star_vars() -> &'static Vec<TypeVarSym> {
    static POOL: OnceLock<Vec<TypeVarSym>> = OnceLock::new();
    POOL.get_or_init(|| {
        (0..4)
            .map(|i| fresh_named_type_var(format!("v{}", i), Kind::Star))
            .collect()
    })
}

fn eff_vars() -> &'static Vec<TypeVarSym> {
    static POOL: OnceLock<Vec<TypeVarSym>> = OnceLock::new();
    POOL.get_or_init(|| {
        (0..2)
            .map(|i| fresh_named_type_var(format!("e{}", i), Kind::Bool))
            .collect()
    })
}

fn io() -> Type {
    Type::mk_effect(EffectSym::new(900, "IO"))
}

/// Star-kinded types over a small shared variable pool. Arrows carry a
/// pure effect so structural equality is meaningful.
fn arb_star_type() -> impl Strategy<Value = Type> {
    let leaf = prop_oneof![
        Just(Type::int32()),
        Just(Type::bool()),
        Just(Type::string()),
        (0usize..star_vars().len()).prop_map(|i| Type::Var(star_vars()[i].clone())),
    ];
    leaf.prop_recursive(3, 24, 3, |inner| {
        prop_oneof![
            inner.clone().prop_map(Type::mk_vector),
            (inner.clone(), inner.clone())
                .prop_map(|(a, b)| Type::mk_arrow(vec![a], Type::pure(), b)),
            (inner.clone(), inner).prop_map(|(a, b)| Type::mk_tuple(vec![a, b])),
        ]
    })
}

/// Effect formulas over two flexible variables and one named effect.
fn arb_eff() -> impl Strategy<Value = Type> {
    let leaf = prop_oneof![
        Just(Type::pure()),
        Just(Type::impure()),
        Just(io()),
        (0usize..eff_vars().len()).prop_map(|i| Type::Var(eff_vars()[i].clone())),
    ];
    leaf.prop_recursive(3, 16, 2, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone())
                .prop_map(|(a, b)| Type::mk_union(a, b)),
            (inner.clone(), inner.clone())
                .prop_map(|(a, b)| Type::mk_intersection(a, b)),
            inner.prop_map(Type::mk_complement),
        ]
    })
}

fn effects_equivalent(t1: &Type, t2: &Type) -> bool {
    let renv = RigidityEnv::new();
    let mut table = AtomTable::new();
    let f1 = bool_alg::from_type(t1, &mut table, &renv);
    let f2 = bool_alg::from_type(t2, &mut table, &renv);
    f1.equivalent(&f2)
}

// ============================================================================
// Laws
// ============================================================================

proptest! {
    /// Law 1: a successful unifier really equates its operands.
    #[test]
    fn unifier_soundness(t1 in arb_star_type(), t2 in arb_star_type()) {
        let renv = RigidityEnv::new();
        if let Ok(s) = unify_types(&t1, &t2, &renv) {
            prop_assert_eq!(
                s.apply(&t1).expand_aliases(),
                s.apply(&t2).expand_aliases()
            );
        }
    }

    /// Law 2: unifier substitutions are idempotent.
    #[test]
    fn unifier_idempotent(t1 in arb_star_type(), t2 in arb_star_type()) {
        let renv = RigidityEnv::new();
        if let Ok(s) = unify_types(&t1, &t2, &renv) {
            let once = s.apply(&t1);
            prop_assert_eq!(s.apply(&once), once.clone());
        }
    }

    /// Law 3 (composability): composing any grounding onto a unifier
    /// still equates the operands, and matches point-free composition.
    #[test]
    fn unifier_composes(t1 in arb_star_type(), t2 in arb_star_type()) {
        let renv = RigidityEnv::new();
        if let Ok(s) = unify_types(&t1, &t2, &renv) {
            let mut ground = Substitution::empty();
            for v in s.apply(&t1).type_vars() {
                ground.insert(&v, Type::int32());
            }
            let both = ground.compose(&s);
            prop_assert_eq!(both.apply(&t1), both.apply(&t2));
            prop_assert_eq!(both.apply(&t1), ground.apply(&s.apply(&t1)));
        }
    }

    /// Law 4: composition is associative in its action on types.
    #[test]
    fn composition_associative(t in arb_star_type()) {
        let vs = star_vars();
        let s1 = Substitution::singleton(&vs[0], Type::Var(vs[1].clone()));
        let s2 = Substitution::singleton(&vs[1], Type::mk_vector(Type::Var(vs[2].clone())));
        let s3 = Substitution::singleton(&vs[2], Type::bool());
        let left = s3.compose(&s2).compose(&s1);
        let right = s3.compose(&s2.compose(&s1));
        prop_assert_eq!(left.apply(&t), right.apply(&t));
    }

    /// Law 5: row unification is permutation invariant, and two open
    /// rows with the same fields unify tail-to-tail.
    #[test]
    fn row_permutation_invariant(
        ts in proptest::collection::vec(arb_star_type(), 3),
        order in Just(vec![0usize, 1, 2]).prop_shuffle(),
    ) {
        let labels = ["a", "b", "c"];
        let r1 = fresh_named_type_var("r1", Kind::RecordRow);
        let r2 = fresh_named_type_var("r2", Kind::RecordRow);
        let mut row1 = Type::Var(r1.clone());
        for i in 0..3 {
            row1 = Type::mk_record_row_extend(Label::new(labels[i]), ts[i].clone(), row1);
        }
        let mut row2 = Type::Var(r2.clone());
        for &i in &order {
            row2 = Type::mk_record_row_extend(Label::new(labels[i]), ts[i].clone(), row2);
        }
        let renv = RigidityEnv::new();
        let s = unify_types(&row1, &row2, &renv);
        prop_assert!(s.is_ok(), "row unification failed: {:?}", s.err());
        let s = s.unwrap();
        prop_assert_eq!(s.apply(&Type::Var(r1)), s.apply(&Type::Var(r2)));
    }

    /// Law 6: whatever the Boolean unifier returns is truth-table
    /// equivalent on both sides.
    #[test]
    fn boolean_unifier_correct(t1 in arb_eff(), t2 in arb_eff()) {
        let renv = RigidityEnv::new();
        if let Ok(s) = unify_types(&t1, &t2, &renv) {
            prop_assert!(
                effects_equivalent(&s.apply(&t1), &s.apply(&t2)),
                "not equivalent under {:?}", s
            );
        }
    }

    /// Law 7: generalize-then-instantiate yields an alpha-equivalent
    /// type: it unifies with the original by binding variables to
    /// variables only.
    #[test]
    fn generalize_instantiate_roundtrip(t in arb_star_type()) {
        let renv = RigidityEnv::new();
        let sc = scheme_ops::generalize(&renv, Vec::new(), Vec::new(), t.clone());
        let (_, _, opened) = scheme_ops::instantiate(&sc);
        let s = unify_types(&opened, &t, &renv);
        prop_assert!(s.is_ok());
        for v in opened.type_vars() {
            if let Some(bound) = s.as_ref().unwrap().get(&v) {
                prop_assert!(matches!(bound, Type::Var(_)));
            }
        }
    }

    /// Law 8: no successful unification binds a rigid variable.
    #[test]
    fn rigid_vars_never_bound(t1 in arb_star_type(), t2 in arb_star_type()) {
        let mut renv = RigidityEnv::new();
        for v in t1.type_vars() {
            renv.rigidify(&v);
        }
        if let Ok(s) = unify_types(&t1, &t2, &renv) {
            for v in t1.type_vars() {
                prop_assert!(!s.binds(&v), "rigid {} was bound", v);
            }
        }
    }

    /// Law 9: the occurs check rejects `v ~ f(v)` for any non-trivial
    /// wrapping of `v`.
    #[test]
    fn occurs_check_fires(depth in 1usize..4) {
        let v = fresh_named_type_var("v", Kind::Star);
        let mut t = Type::Var(v.clone());
        for _ in 0..depth {
            t = Type::mk_vector(t);
        }
        let renv = RigidityEnv::new();
        let r = unify_types(&Type::Var(v), &t, &renv);
        prop_assert!(matches!(r, Err(UnificationError::OccursCheck(_, _))));
    }
}
