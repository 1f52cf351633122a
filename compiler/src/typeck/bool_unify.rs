//! Boolean (effect) unification
//!
//! Effects live in a Boolean algebra: `Pure` is bottom, `Impure` is top,
//! named effects and rigid variables (including regions) are
//! uninterpreted atoms. Unification solves `t1 ≡ t2` by reducing to
//! `(t1 ⊕ t2) ≡ ⊥` and running successive variable elimination over the
//! flexible variables; Löwenheim's formula turns the witness into a most
//! general unifier.
//!
//! Results are canonicalized by the normalizing smart constructors when
//! formulas convert back to types; there is no separate minimizer.

use std::collections::HashMap;

use tracing::trace;

use crate::types::bool_alg::{self, AtomTable, BoolAtom, BoolFormula};
use crate::types::kind::Kind;
use crate::types::subst::Substitution;
use crate::types::var::{fresh_type_var, RigidityEnv};
use crate::types::Type;

use super::errors::UnificationError;

/// Unify two effect formulas.
pub fn unify_effects(
    t1: &Type,
    t2: &Type,
    renv: &RigidityEnv,
    budget: usize,
) -> Result<Substitution, UnificationError> {
    if t1 == t2 {
        return Ok(Substitution::empty());
    }

    // Fast path: a lone flexible variable not occurring on the other side
    // binds directly. This keeps inferred effects readable.
    if let Type::Var(v) = t1 {
        if renv.is_flexible(v) && !t2.contains_var(v) {
            return Ok(Substitution::singleton(v, t2.clone()));
        }
    }
    if let Type::Var(v) = t2 {
        if renv.is_flexible(v) && !t1.contains_var(v) {
            return Ok(Substitution::singleton(v, t1.clone()));
        }
    }

    let mut table = AtomTable::new();
    let f1 = bool_alg::from_type(t1, &mut table, renv);
    let f2 = bool_alg::from_type(t2, &mut table, renv);
    let query = BoolFormula::xor(f1, f2);

    if table.len() > budget {
        return Err(UnificationError::TooComplex(table.len()));
    }

    // Trivially equivalent formulas need no bindings.
    if !query.is_satisfiable() {
        return Ok(Substitution::empty());
    }

    let occurring = query.vars();
    let flexible: Vec<usize> = table
        .flexible_indices()
        .into_iter()
        .filter(|i| occurring.contains(i))
        .collect();

    trace!(
        atoms = table.len(),
        flexible = flexible.len(),
        "solving effect equation"
    );

    match sve(&query, &flexible, &mut table) {
        Some(solution) => {
            let mut subst = Substitution::empty();
            for (idx, formula) in &solution {
                if let BoolAtom::FlexVar(sym) = table.get(*idx).clone() {
                    subst.insert(&sym, bool_alg::to_type(formula, &table));
                }
            }
            Ok(subst)
        }
        None => Err(UnificationError::BooleanUnsat(Type::mk_union(
            Type::mk_difference(t1.clone(), t2.clone()),
            Type::mk_difference(t2.clone(), t1.clone()),
        ))),
    }
}

/// Successive variable elimination: solve `f ≡ ⊥` for the given flexible
/// variables. Returns `None` when the residual formula is satisfiable
/// with no flexible variable left to absorb it.
fn sve(
    f: &BoolFormula,
    flexible: &[usize],
    table: &mut AtomTable,
) -> Option<HashMap<usize, BoolFormula>> {
    let Some((&v, rest)) = flexible.split_first() else {
        return if f.is_satisfiable() { None } else { Some(HashMap::new()) };
    };

    // Shannon expansion: f = v ∧ f1 ∨ ¬v ∧ f0.
    let f0 = f.assign(v, false);
    let f1 = f.assign(v, true);

    // f ≡ ⊥ has a solution iff f0 ∧ f1 ≡ ⊥ has one over the rest.
    let solution = sve(&BoolFormula::and(f0.clone(), f1.clone()), rest, table)?;

    let f0s = apply_solution(&solution, &f0);
    let f1s = apply_solution(&solution, &f1);

    // Löwenheim: v ↦ f0 ∨ (fresh ∧ ¬(f0 ⊕ f1)), with the cofactors taken
    // under the recursive solution, makes the whole substitution an mgu.
    let fresh = table.intern(BoolAtom::FlexVar(fresh_type_var(Kind::Bool)));
    let witness = BoolFormula::or(
        f0s.clone(),
        BoolFormula::and(
            BoolFormula::Var(fresh),
            BoolFormula::not(BoolFormula::xor(f0s, f1s)),
        ),
    );

    let mut solution = solution;
    solution.insert(v, witness);
    Some(solution)
}

fn apply_solution(solution: &HashMap<usize, BoolFormula>, f: &BoolFormula) -> BoolFormula {
    let mut acc = f.clone();
    for (v, repl) in solution {
        acc = acc.substitute(*v, repl);
    }
    acc
}
