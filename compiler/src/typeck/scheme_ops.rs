//! Scheme instantiation, generalization, admissibility
//!
//! Instantiation opens a scheme with fresh flexible variables;
//! generalization closes a type over its free variables that are not
//! rigid in the ambient environment. Admissibility (`sc1` is at least as
//! general as `sc2`) instantiates the first scheme, skolemizes the
//! second, unifies the bodies, and discharges the residual constraints
//! through entailment.

use crate::ast::shared::Span;
use crate::types::scheme::{EqualityConstraint, Scheme, TraitConstraint};
use crate::types::subst::Substitution;
use crate::types::var::{fresh_type_var, RigidityEnv};
use crate::types::Type;

use super::context::{EqualityEnv, TraitEnv};
use super::entailment;
use super::errors::TypeError;
use super::unify::unify_types;

/// Open a scheme: replace each quantifier by a fresh flexible variable
/// of the same kind. The returned constraints and body share the fresh
/// variables.
pub fn instantiate(sc: &Scheme) -> (Vec<TraitConstraint>, Vec<EqualityConstraint>, Type) {
    let mut subst = Substitution::empty();
    for q in &sc.quantifiers {
        let mut fresh = fresh_type_var(q.kind.clone());
        fresh.text = q.text.clone();
        subst.insert(q, Type::Var(fresh));
    }
    let tconstrs = sc.tconstrs.iter().map(|c| subst.apply_tconstr(c)).collect();
    let econstrs = sc.econstrs.iter().map(|c| subst.apply_econstr(c)).collect();
    let base = subst.apply(&sc.base);
    (tconstrs, econstrs, base)
}

/// Close a type over its free variables, quantifying everything not
/// rigid in `renv`. Quantifiers are ordered by variable identity so
/// generalization is deterministic.
pub fn generalize(
    renv: &RigidityEnv,
    tconstrs: Vec<TraitConstraint>,
    econstrs: Vec<EqualityConstraint>,
    tpe: Type,
) -> Scheme {
    let mut free = tpe.type_vars();
    for c in &tconstrs {
        free.extend(c.arg.type_vars());
    }
    for c in &econstrs {
        free.extend(c.arg.type_vars());
        free.extend(c.tpe.type_vars());
    }
    let quantifiers: Vec<_> = free.into_iter().filter(|v| renv.is_flexible(v)).collect();
    Scheme::new(quantifiers, tconstrs, econstrs, tpe)
}

/// Check that `sc1` is at least as general as `sc2`: every use admitted
/// by `sc2` is admitted by `sc1`, and every residual constraint of `sc1`
/// is implied by `sc2`'s constraints.
///
/// `loc` locates the declaration whose schemes are compared.
pub fn check_at_least_as_general(
    sc1: &Scheme,
    sc2: &Scheme,
    trait_env: &TraitEnv,
    eq_env: &EqualityEnv,
    loc: Span,
) -> Result<(), Vec<TypeError>> {
    // Skolemize sc2: its quantifiers become constants sc1 must match.
    let mut renv = RigidityEnv::new();
    for q in &sc2.quantifiers {
        renv.rigidify(q);
    }

    let (cs1, es1, t1) = instantiate(sc1);

    let s = match unify_types(&t1, &sc2.base, &renv) {
        Ok(s) => s,
        Err(_) => {
            return Err(vec![TypeError::GeneralizationError {
                declared: sc2.clone(),
                inferred: sc1.clone(),
                loc,
            }]);
        }
    };

    let mut errors = Vec::new();

    // Residual trait constraints must follow from sc2's context.
    let context = trait_env.superclass_closure(&sc2.tconstrs);
    for c in &cs1 {
        let goal = s.apply_tconstr(c);
        if let Err(e) = entailment::entail(&context, &goal, trait_env, eq_env, &renv) {
            errors.push(e);
        }
    }

    // Residual equality constraints reduce under the equality environment
    // and must then hold, or be assumed verbatim by sc2.
    for c in &es1 {
        let goal = s.apply_econstr(c);
        if let Err(e) = check_equality_constraint(&goal, &sc2.econstrs, eq_env, &renv) {
            errors.push(e);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Discharge one associated-type equality: reduce the left-hand side via
/// the instance definitions and unify, or find the constraint assumed in
/// the declared context.
pub fn check_equality_constraint(
    goal: &EqualityConstraint,
    assumed: &[EqualityConstraint],
    eq_env: &EqualityEnv,
    renv: &RigidityEnv,
) -> Result<(), TypeError> {
    // Assumed verbatim?
    for a in assumed {
        if a.sym == goal.sym
            && a.arg.expand_aliases() == goal.arg.expand_aliases()
            && a.tpe.expand_aliases() == goal.tpe.expand_aliases()
        {
            return Ok(());
        }
    }

    // Reducible through an instance definition?
    for def in eq_env.defs(&goal.sym) {
        if let Ok(s) = unify_types(&goal.arg, &def.arg, renv) {
            let reduced = s.apply(&def.tpe);
            return match unify_types(&reduced, &s.apply(&goal.tpe), renv) {
                Ok(_) => Ok(()),
                Err(_) => Err(TypeError::Mismatch {
                    t1: reduced,
                    t2: goal.tpe.clone(),
                    loc: goal.loc,
                }),
            };
        }
    }

    Err(TypeError::Mismatch {
        t1: goal.arg.clone(),
        t2: goal.tpe.clone(),
        loc: goal.loc,
    })
}
