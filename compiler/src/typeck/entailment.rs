//! Trait-constraint entailment
//!
//! Decides whether a trait constraint holds given a context of assumed
//! constraints (closed under superclasses) and the instance declarations
//! of the unit. Resolution tries every candidate instance and, when all
//! fail, reports the failure whose head shares the longest constructor
//! spine with the goal.

use crate::types::scheme::TraitConstraint;
use crate::types::subst::Substitution;
use crate::types::var::{fresh_type_var, RigidityEnv};
use crate::types::{Type, TypeCtor};

use super::context::{EqualityEnv, InstanceContext, TraitEnv};
use super::errors::TypeError;
use super::unify::unify_types;

/// Fuel for recursive instance resolution; instance contexts can chain
/// (`Eq[List[a]]` needs `Eq[a]`) but never this deep in practice.
const MAX_DEPTH: usize = 32;

/// Does `goal` follow from `context` (already superclass-closed) and the
/// instances in `trait_env`?
pub fn entail(
    context: &[TraitConstraint],
    goal: &TraitConstraint,
    trait_env: &TraitEnv,
    eq_env: &EqualityEnv,
    renv: &RigidityEnv,
) -> Result<(), TypeError> {
    entail_at(context, goal, trait_env, eq_env, renv, MAX_DEPTH)
}

fn entail_at(
    context: &[TraitConstraint],
    goal: &TraitConstraint,
    trait_env: &TraitEnv,
    eq_env: &EqualityEnv,
    renv: &RigidityEnv,
    depth: usize,
) -> Result<(), TypeError> {
    if depth == 0 {
        return Err(missing_instance(goal));
    }

    let arg = goal.arg.expand_aliases();

    // Assumed in the context?
    if context
        .iter()
        .any(|c| c.sym == goal.sym && c.arg.expand_aliases() == arg)
    {
        return Ok(());
    }

    // A bare variable with no assumption can never be resolved by an
    // instance; instance heads are constructor-rooted.
    if matches!(arg, Type::Var(_)) {
        return Err(missing_instance(goal));
    }

    // Try every instance; remember the best-matching failure.
    let instances = trait_env.instances(&goal.sym);
    let mut best_failure: Option<(usize, TypeError)> = None;
    for inst in instances {
        match try_instance(context, goal, &arg, inst, trait_env, eq_env, renv, depth) {
            Ok(()) => return Ok(()),
            Err(err) => {
                let score = spine_overlap(&arg, &inst.tpe);
                match &best_failure {
                    Some((best, _)) if *best >= score => {}
                    _ => best_failure = Some((score, err)),
                }
            }
        }
    }

    match best_failure {
        Some((_, err)) => Err(err),
        None => Err(missing_instance(goal)),
    }
}

#[allow(clippy::too_many_arguments)]
fn try_instance(
    context: &[TraitConstraint],
    goal: &TraitConstraint,
    arg: &Type,
    inst: &InstanceContext,
    trait_env: &TraitEnv,
    eq_env: &EqualityEnv,
    renv: &RigidityEnv,
    depth: usize,
) -> Result<(), TypeError> {
    // The instance's variables are implicitly quantified; freshen them so
    // distinct resolutions do not interfere.
    let mut rename = Substitution::empty();
    let mut inst_vars = inst.tpe.type_vars();
    for c in &inst.tconstrs {
        inst_vars.extend(c.arg.type_vars());
    }
    for v in &inst_vars {
        rename.insert(v, Type::Var(fresh_type_var(v.kind.clone())));
    }
    let head = rename.apply(&inst.tpe);

    let s = unify_types(arg, &head, renv).map_err(|_| missing_instance(goal))?;

    // Discharge the instance context recursively.
    for c in &inst.tconstrs {
        let sub_goal = s.apply_tconstr(&rename.apply_tconstr(c));
        entail_at(context, &sub_goal, trait_env, eq_env, renv, depth - 1)?;
    }
    Ok(())
}

/// How many constructors two types share along their leftmost spines;
/// ranks candidate instances for error reporting.
fn spine_overlap(a: &Type, b: &Type) -> usize {
    match (a, b) {
        (Type::App(a1, a2), Type::App(b1, b2)) => {
            let head = spine_overlap(a1, b1);
            if head > 0 {
                head + spine_overlap(a2, b2)
            } else {
                0
            }
        }
        (Type::Cst(c1), Type::Cst(c2)) if c1 == c2 => 1,
        (Type::Var(_), _) | (_, Type::Var(_)) => 1,
        _ => 0,
    }
}

/// Build the error for an unresolvable constraint, specializing the
/// message for the well-known traits and for function-typed arguments.
pub fn missing_instance(goal: &TraitConstraint) -> TypeError {
    let tpe = goal.arg.clone();
    let loc = goal.loc;
    if matches!(tpe.head_ctor(), Some(TypeCtor::Arrow(_))) {
        return TypeError::MissingArrowInstance {
            sym: goal.sym.clone(),
            tpe,
            loc,
        };
    }
    match goal.sym.text.as_str() {
        "Eq" => TypeError::MissingEq { tpe, loc },
        "Order" => TypeError::MissingOrder { tpe, loc },
        "ToString" => TypeError::MissingToString { tpe, loc },
        "Sendable" => TypeError::MissingSendable { tpe, loc },
        _ => TypeError::MissingInstance {
            sym: goal.sym.clone(),
            tpe,
            loc,
        },
    }
}

/// Find declared constraints that are entailed by the remaining ones;
/// each is reported once.
pub fn redundant_constraints(
    declared: &[TraitConstraint],
    trait_env: &TraitEnv,
    eq_env: &EqualityEnv,
    renv: &RigidityEnv,
) -> Vec<TypeError> {
    let mut errors = Vec::new();
    for (i, c) in declared.iter().enumerate() {
        let others: Vec<TraitConstraint> = declared
            .iter()
            .enumerate()
            .filter_map(|(j, d)| (j != i).then(|| d.clone()))
            .collect();
        let context = trait_env.superclass_closure(&others);
        if entail(&context, c, trait_env, eq_env, renv).is_ok() {
            errors.push(TypeError::RedundantTraitConstraint {
                constraint: c.clone(),
                loc: c.loc,
            });
        }
    }
    errors
}
