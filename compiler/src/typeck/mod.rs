//! Type inference and checking
//!
//! The phase driver. Environments are built sequentially, then every
//! top-level declaration is checked independently: defs, trait default
//! implementations, and instance members each get their own inference
//! context and worker. Results merge deterministically by symbol order,
//! and error lists are sorted by source location before surfacing.
//!
//! A definition that fails to check contributes an `Error`-bodied typed
//! definition at its declared type and effect, so later phases always
//! receive a complete tree.

pub mod bool_unify;
pub mod checker;
pub mod context;
pub mod entailment;
pub mod errors;
pub mod infer;
pub mod patterns;
pub mod reconstruct;
pub mod row_unify;
pub mod scheme_ops;
pub mod unify;

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use rayon::prelude::*;
use tracing::{debug, debug_span, info};

use crate::ast::kinded::{self, FnSpec};
use crate::ast::shared::{DefnSym, Span, TraitSym};
use crate::ast::typed;
use crate::types::scheme::{Scheme, TraitConstraint};
use crate::types::subst::Substitution;
use crate::types::var::RigidityEnv;
use crate::types::{Type, TypeCtor};

use self::context::ContextSnapshot;
use self::errors::{sort_errors, TypeError};
use self::infer::InferCtx;

// ============================================================================
// Configuration
// ============================================================================

/// Knobs for the checking phase.
#[derive(Debug, Clone)]
pub struct CheckerConfig {
    /// Check top-level declarations on a worker pool.
    pub parallel: bool,
    /// Cap on distinct atoms per Boolean effect equation.
    pub max_effect_atoms: usize,
    /// Report declared constraints entailed by the remaining ones.
    pub report_redundant_constraints: bool,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            max_effect_atoms: unify::DEFAULT_EFFECT_ATOM_BUDGET,
            report_redundant_constraints: true,
        }
    }
}

/// Symbols invalidated since the cached typed root was produced.
#[derive(Debug, Clone, Default)]
pub struct ChangeSet {
    pub stale_defs: BTreeSet<DefnSym>,
    pub stale_traits: BTreeSet<TraitSym>,
    pub stale_instances: BTreeSet<TraitSym>,
}

/// Cooperative cancellation: checked at worker boundaries; in-flight
/// checks run to completion.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

// ============================================================================
// Entry point
// ============================================================================

/// Check a compilation unit. With a cached root and change set, only the
/// stale declarations are re-checked; the rest copy over.
pub fn check_root(
    root: &kinded::Root,
    config: &CheckerConfig,
    cache: Option<(&typed::Root, &ChangeSet)>,
    cancel: &CancelToken,
) -> (typed::Root, Vec<TypeError>) {
    let snapshot = ContextSnapshot::new(root, config);
    info!(
        defs = root.defs.len(),
        traits = root.traits.len(),
        "type checking"
    );

    let mut errors: Vec<TypeError> = Vec::new();

    let defs = check_defs(&snapshot, cache, cancel, &mut errors);
    let sigs = check_sigs(&snapshot, cancel, &mut errors);
    let instances = check_instances(&snapshot, cache, cancel, &mut errors);

    let typed_root = typed::Root {
        traits: root.traits.clone(),
        instances,
        defs,
        sigs,
        enums: root.enums.clone(),
        restrictable_enums: root.restrictable_enums.clone(),
        effects: root.effects.clone(),
        type_aliases: root.type_aliases.clone(),
        trait_env: snapshot.trait_env.clone(),
        eq_env: snapshot.eq_env.clone(),
        entry_point: root.entry_point.clone(),
        sources: root.sources.clone(),
    };

    if let Some(err) = check_entry_point(&typed_root) {
        errors.push(err);
    }

    sort_errors(&mut errors);
    (typed_root, errors)
}

// ============================================================================
// Definitions
// ============================================================================

fn check_defs(
    snapshot: &ContextSnapshot<'_>,
    cache: Option<(&typed::Root, &ChangeSet)>,
    cancel: &CancelToken,
    errors: &mut Vec<TypeError>,
) -> BTreeMap<DefnSym, typed::Def> {
    let root = snapshot.root;
    let mut out: BTreeMap<DefnSym, typed::Def> = BTreeMap::new();
    let mut work: Vec<(&DefnSym, &kinded::Def)> = Vec::new();

    for (sym, def) in &root.defs {
        match cache {
            Some((old, changes))
                if !changes.stale_defs.contains(sym) && old.defs.contains_key(sym) =>
            {
                debug!(def = %sym, "cache hit");
                out.insert(sym.clone(), old.defs[sym].clone());
            }
            _ => work.push((sym, def)),
        }
    }

    let results: DashMap<DefnSym, (typed::Def, Vec<TypeError>)> = DashMap::new();
    let run = |(sym, def): &(&DefnSym, &kinded::Def)| {
        let _span = debug_span!("check_def", def = %sym).entered();
        let checked = if cancel.is_cancelled() {
            (error_def(def), Vec::new())
        } else {
            check_def(snapshot, def, &[])
        };
        results.insert((*sym).clone(), checked);
    };
    if snapshot.config.parallel {
        work.par_iter().for_each(run);
    } else {
        work.iter().for_each(run);
    }

    // Deterministic merge: BTreeMap order is symbol order.
    let mut merged: BTreeMap<DefnSym, (typed::Def, Vec<TypeError>)> = BTreeMap::new();
    for (sym, checked) in results {
        merged.insert(sym, checked);
    }
    for (sym, (def, errs)) in merged {
        errors.extend(errs);
        out.insert(sym, def);
    }
    out
}

/// Check one definition against its declared spec. `assumed` carries
/// extra constraints available to entailment (the trait constraint for a
/// default implementation, the instance context for an instance member).
fn check_def(
    snapshot: &ContextSnapshot<'_>,
    def: &kinded::Def,
    assumed: &[TraitConstraint],
) -> (typed::Def, Vec<TypeError>) {
    match check_body(snapshot, &def.spec, &def.exp, assumed) {
        Ok((exp, scheme, mut errs)) => {
            let typed = typed::Def {
                sym: def.sym.clone(),
                spec: def.spec.clone(),
                exp,
                scheme,
            };
            sort_errors(&mut errs);
            (typed, errs)
        }
        Err(errs) => (error_def(def), errs),
    }
}

/// The per-definition pipeline: constraints, solving, reconstruction,
/// generalization, admissibility. Recoverable problems (admissibility,
/// redundancy) are returned alongside the result; unification failure
/// aborts the definition.
fn check_body(
    snapshot: &ContextSnapshot<'_>,
    spec: &FnSpec,
    exp: &kinded::Expr,
    assumed: &[TraitConstraint],
) -> Result<(typed::Expr, Scheme, Vec<TypeError>), Vec<TypeError>> {
    let mut ctx = InferCtx::new(snapshot);

    // The declared quantifiers are skolems while their body is checked.
    for q in &spec.scheme.quantifiers {
        ctx.rigidify(q);
    }

    for fp in &spec.fparams {
        ctx.unify(&Type::Var(fp.sym.tvar.clone()), &fp.tpe, fp.loc)
            .map_err(|e| vec![e])?;
    }

    let body = checker::infer_exp(&mut ctx, exp).map_err(|e| vec![e])?;

    ctx.expect_type(&spec.ret_tpe, &body.tpe, exp.loc)
        .map_err(|e| vec![e])?;

    // The inferred effect must match the declared effect exactly.
    if ctx.unify(&body.eff, &spec.eff, spec.loc).is_err() {
        return Err(vec![classify_effect_error(
            &ctx.apply(&spec.eff),
            &ctx.apply(&body.eff),
            spec.loc,
        )]);
    }

    let mut errs = Vec::new();

    // Residual associated-type equalities must hold or be assumed.
    let econstr_goals: Vec<_> = ctx
        .econstrs
        .iter()
        .map(|c| ctx.subst.apply_econstr(c))
        .collect();
    for goal in &econstr_goals {
        if let Err(e) = scheme_ops::check_equality_constraint(
            goal,
            &spec.scheme.econstrs,
            &snapshot.eq_env,
            &ctx.renv,
        ) {
            errs.push(e);
        }
    }

    // Reconstruct and generalize.
    let body = reconstruct::apply_subst_exp(&ctx.subst, body);
    let tconstrs: Vec<TraitConstraint> = ctx
        .tconstrs
        .iter()
        .map(|c| ctx.subst.apply_tconstr(c))
        .collect();
    let econstrs = ctx
        .econstrs
        .iter()
        .map(|c| ctx.subst.apply_econstr(c))
        .collect();
    let inferred_base = ctx.subst.apply(&spec.scheme.base);
    let inferred = scheme_ops::generalize(&RigidityEnv::new(), tconstrs, econstrs, inferred_base);

    // The inferred scheme must be admissible for the declared one, under
    // whatever the enclosing declaration assumes.
    let mut declared = spec.scheme.clone();
    declared.tconstrs.extend_from_slice(assumed);
    if let Err(mut more) = scheme_ops::check_at_least_as_general(
        &inferred,
        &declared,
        &snapshot.trait_env,
        &snapshot.eq_env,
        spec.loc,
    ) {
        errs.append(&mut more);
    }

    if snapshot.config.report_redundant_constraints {
        errs.extend(entailment::redundant_constraints(
            &spec.scheme.tconstrs,
            &snapshot.trait_env,
            &snapshot.eq_env,
            &ctx.renv,
        ));
    }

    Ok((body, inferred, errs))
}

/// The sentinel for a failed definition: an `Error` body at the declared
/// type and effect, carrying the declared scheme.
fn error_def(def: &kinded::Def) -> typed::Def {
    typed::Def {
        sym: def.sym.clone(),
        spec: def.spec.clone(),
        exp: typed::Expr {
            kind: typed::ExprKind::Error,
            tpe: def.spec.ret_tpe.clone(),
            eff: def.spec.eff.clone(),
            loc: def.exp.loc,
        },
        scheme: def.spec.scheme.clone(),
    }
}

/// Refine a failed declared-effect unification into the taxonomy.
fn classify_effect_error(declared: &Type, inferred: &Type, loc: Span) -> TypeError {
    if declared.is_pure() {
        let polymorphic =
            !inferred.type_vars().is_empty() && !mentions_concrete_effect(inferred);
        if polymorphic {
            return TypeError::EffectPolymorphicDeclaredAsPure {
                inferred: inferred.clone(),
                loc,
            };
        }
        return TypeError::ImpureDeclaredAsPure {
            inferred: inferred.clone(),
            loc,
        };
    }
    TypeError::EffectGeneralizationError {
        declared: declared.clone(),
        inferred: inferred.clone(),
        loc,
    }
}

fn mentions_concrete_effect(eff: &Type) -> bool {
    match eff {
        Type::Cst(TypeCtor::Impure) | Type::Cst(TypeCtor::Effect(_)) => true,
        Type::Cst(_) | Type::Var(_) => false,
        Type::App(t1, t2) => mentions_concrete_effect(t1) || mentions_concrete_effect(t2),
        Type::Alias { tpe, .. } => mentions_concrete_effect(tpe),
    }
}

// ============================================================================
// Traits and instances
// ============================================================================

/// Check trait signatures: a default implementation is checked like a
/// def, with the trait's own constraint assumed at its type parameter.
fn check_sigs(
    snapshot: &ContextSnapshot<'_>,
    cancel: &CancelToken,
    errors: &mut Vec<TypeError>,
) -> BTreeMap<crate::ast::shared::SigSym, typed::Sig> {
    let root = snapshot.root;
    let mut out = BTreeMap::new();
    for (sym, sig) in &root.sigs {
        let _span = debug_span!("check_sig", sig = %sym).entered();
        let assumed: Vec<TraitConstraint> = root
            .traits
            .get(&sig.trt)
            .map(|decl| {
                vec![TraitConstraint::new(
                    decl.sym.clone(),
                    Type::Var(decl.tparam.clone()),
                    decl.loc,
                )]
            })
            .unwrap_or_default();

        let (exp, scheme) = match &sig.exp {
            Some(body) if !cancel.is_cancelled() => {
                match check_body(snapshot, &sig.spec, body, &assumed) {
                    Ok((exp, scheme, errs)) => {
                        errors.extend(errs);
                        (Some(exp), scheme)
                    }
                    Err(errs) => {
                        errors.extend(errs);
                        (
                            Some(typed::Expr {
                                kind: typed::ExprKind::Error,
                                tpe: sig.spec.ret_tpe.clone(),
                                eff: sig.spec.eff.clone(),
                                loc: body.loc,
                            }),
                            sig.spec.scheme.clone(),
                        )
                    }
                }
            }
            _ => (None, sig.spec.scheme.clone()),
        };

        out.insert(
            sym.clone(),
            typed::Sig {
                sym: sym.clone(),
                trt: sig.trt.clone(),
                spec: sig.spec.clone(),
                exp,
                scheme,
            },
        );
    }
    out
}

/// Check instances: each member body is checked under the instance
/// context, and its declared scheme must match the trait signature
/// specialized to the instance head.
fn check_instances(
    snapshot: &ContextSnapshot<'_>,
    cache: Option<(&typed::Root, &ChangeSet)>,
    cancel: &CancelToken,
    errors: &mut Vec<TypeError>,
) -> BTreeMap<TraitSym, Vec<typed::Instance>> {
    let root = snapshot.root;
    let mut out = BTreeMap::new();
    for (trt, instances) in &root.instances {
        if let Some((old, changes)) = cache {
            if !changes.stale_instances.contains(trt) && old.instances.contains_key(trt) {
                out.insert(trt.clone(), old.instances[trt].clone());
                continue;
            }
        }
        let mut typed_instances = Vec::with_capacity(instances.len());
        for inst in instances {
            let _span = debug_span!("check_instance", trt = %trt).entered();
            let mut defs = Vec::with_capacity(inst.defs.len());
            for def in &inst.defs {
                if cancel.is_cancelled() {
                    defs.push(error_def(def));
                    continue;
                }
                let (typed_def, errs) = check_def(snapshot, def, &inst.tconstrs);
                errors.extend(errs);
                if let Some(err) = check_member_signature(snapshot, trt, inst, def) {
                    errors.push(err);
                }
                defs.push(typed_def);
            }
            typed_instances.push(typed::Instance {
                trt: inst.trt.clone(),
                tpe: inst.tpe.clone(),
                tconstrs: inst.tconstrs.clone(),
                assocs: inst.assocs.clone(),
                defs,
                loc: inst.loc,
            });
        }
        out.insert(trt.clone(), typed_instances);
    }
    out
}

/// An instance member's declared scheme must be the trait signature with
/// the trait parameter replaced by the instance head.
fn check_member_signature(
    snapshot: &ContextSnapshot<'_>,
    trt: &TraitSym,
    inst: &kinded::Instance,
    def: &kinded::Def,
) -> Option<TypeError> {
    let trait_decl = snapshot.root.traits.get(trt)?;
    let sig = trait_decl
        .sigs
        .iter()
        .filter_map(|s| snapshot.root.sigs.get(s))
        .find(|s| s.sym.text == def.sym.text)?;

    let inst_subst = Substitution::singleton(&trait_decl.tparam, inst.tpe.clone());
    let mut expected = Scheme::new(
        sig.spec
            .scheme
            .quantifiers
            .iter()
            .filter(|q| **q != trait_decl.tparam)
            .cloned()
            .collect(),
        sig.spec
            .scheme
            .tconstrs
            .iter()
            .filter(|c| !(c.sym == *trt && c.arg == Type::Var(trait_decl.tparam.clone())))
            .map(|c| inst_subst.apply_tconstr(c))
            .collect(),
        sig.spec
            .scheme
            .econstrs
            .iter()
            .map(|c| inst_subst.apply_econstr(c))
            .collect(),
        inst_subst.apply(&sig.spec.scheme.base),
    );
    expected.tconstrs.extend_from_slice(&inst.tconstrs);

    scheme_ops::check_at_least_as_general(
        &def.spec.scheme,
        &expected,
        &snapshot.trait_env,
        &snapshot.eq_env,
        def.spec.loc,
    )
    .err()
    .and_then(|mut errs| {
        if errs.is_empty() {
            None
        } else {
            Some(errs.remove(0))
        }
    })
}

// ============================================================================
// Entry point validation
// ============================================================================

/// An entry point must be a `Unit -> Unit` function whose effect is
/// admissible at top level (`Pure` or `Impure`; named effects must have
/// been handled).
fn check_entry_point(root: &typed::Root) -> Option<TypeError> {
    let sym = root.entry_point.as_ref()?;
    let def = root.defs.get(sym)?;
    let sc = &def.scheme;

    let ok = match sc.base.arrow_parts() {
        Some((params, eff, result)) => {
            params.len() == 1
                && params[0].expand_aliases() == Type::unit()
                && result.expand_aliases() == Type::unit()
                && (eff.is_pure() || eff.is_impure())
        }
        None => false,
    };

    if ok {
        None
    } else {
        Some(TypeError::IllegalEntryPointSignature {
            sym: sym.clone(),
            scheme: sc.clone(),
            loc: def.spec.loc,
        })
    }
}
