//! Unification
//!
//! The entry point `unify_types` dispatches on the (shared) kind of its
//! operands: effect formulas go to the Boolean unifier, rows go to the
//! row unifier, and everything else is solved by standard first-order
//! unification with an occurs check.
//!
//! The unifier never mutates its inputs and never binds a rigid
//! variable; a successful result is a most general unifier of the two
//! types, to be composed onto the caller's ambient substitution.

use crate::types::kind::Kind;
use crate::types::subst::Substitution;
use crate::types::var::{RigidityEnv, TypeVarSym};
use crate::types::{Type, TypeCtor};

use super::bool_unify;
use super::errors::UnificationError;
use super::row_unify;

/// Default cap on the number of distinct atoms the Boolean unifier will
/// expand; beyond it the equation is rejected as too complex.
pub const DEFAULT_EFFECT_ATOM_BUDGET: usize = 16;

/// Unify two types of equal kind.
pub fn unify_types(
    t1: &Type,
    t2: &Type,
    renv: &RigidityEnv,
) -> Result<Substitution, UnificationError> {
    unify_types_budgeted(t1, t2, renv, DEFAULT_EFFECT_ATOM_BUDGET)
}

/// `unify_types` with an explicit effect-atom budget.
pub fn unify_types_budgeted(
    t1: &Type,
    t2: &Type,
    renv: &RigidityEnv,
    budget: usize,
) -> Result<Substitution, UnificationError> {
    let k1 = t1.kind();
    let k2 = t2.kind();
    if k1 != k2 {
        return Err(UnificationError::KindMismatch(k1, k2));
    }
    match k1 {
        Kind::Bool => bool_unify::unify_effects(t1, t2, renv, budget),
        Kind::RecordRow | Kind::SchemaRow => row_unify::unify_rows(t1, t2, renv, budget),
        _ => unify_syntactic(t1, t2, renv, budget),
    }
}

/// Robinson unification for kinds `*`, `Predicate` and constructor kinds.
fn unify_syntactic(
    t1: &Type,
    t2: &Type,
    renv: &RigidityEnv,
    budget: usize,
) -> Result<Substitution, UnificationError> {
    match (t1, t2) {
        // Aliases are transparent; unify the expansion.
        (Type::Alias { tpe, .. }, _) => unify_types_budgeted(tpe, t2, renv, budget),
        (_, Type::Alias { tpe, .. }) => unify_types_budgeted(t1, tpe, renv, budget),

        (Type::Var(v1), Type::Var(v2)) if v1 == v2 => Ok(Substitution::empty()),

        (Type::Var(v), other) if renv.is_flexible(v) => bind_var(v, other),
        (other, Type::Var(v)) if renv.is_flexible(v) => bind_var(v, other),
        (Type::Var(v), other) | (other, Type::Var(v)) => {
            Err(UnificationError::RigidVar(v.clone(), other.clone()))
        }

        (Type::Cst(c1), Type::Cst(c2)) => {
            if ctor_eq(c1, c2) {
                Ok(Substitution::empty())
            } else {
                Err(UnificationError::Mismatch(t1.clone(), t2.clone()))
            }
        }

        (Type::App(a1, a2), Type::App(b1, b2)) => {
            let s1 = unify_types_budgeted(a1, b1, renv, budget)?;
            let s2 = unify_types_budgeted(&s1.apply(a2), &s1.apply(b2), renv, budget)?;
            Ok(s2.compose(&s1))
        }

        _ => Err(UnificationError::Mismatch(t1.clone(), t2.clone())),
    }
}

/// Bind a flexible variable, with the occurs check.
fn bind_var(v: &TypeVarSym, t: &Type) -> Result<Substitution, UnificationError> {
    if let Type::Var(w) = t {
        if w == v {
            return Ok(Substitution::empty());
        }
    }
    if t.contains_var(v) {
        return Err(UnificationError::OccursCheck(v.clone(), t.clone()));
    }
    debug_assert_eq!(v.kind, t.kind(), "binding changes the variable's kind");
    Ok(Substitution::singleton(v, t.clone()))
}

/// Constructor equality. Enum constructors compare by symbol only; the
/// cached kind is not part of the identity.
fn ctor_eq(c1: &TypeCtor, c2: &TypeCtor) -> bool {
    match (c1, c2) {
        (TypeCtor::Enum(s1, _), TypeCtor::Enum(s2, _)) => s1 == s2,
        (TypeCtor::RestrictableEnum(s1, _), TypeCtor::RestrictableEnum(s2, _)) => s1 == s2,
        _ => c1 == c2,
    }
}
