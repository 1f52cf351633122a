//! Constraint generation
//!
//! A recursive walk over kinded expressions. Each syntactic form
//! introduces the fresh variables its typing rule needs, emits its
//! unification goals into the inference context, and yields the typed
//! node. Known direct calls (`Apply` of a `Def` or `Sig` head) are
//! resolved eagerly so argument mismatches are reported at the argument,
//! not at the whole application.
//!
//! Every node's stored type variable is unified with the type the rule
//! derives; the typed tree therefore only mentions node variables, and
//! the final substitution pass resolves them all at once.

use crate::ast::kinded as k;
use crate::ast::shared::{BinaryOp, PrimType, Span, UnaryOp};
use crate::ast::typed as t;
use crate::types::kind::Kind;
use crate::types::scheme::TraitConstraint;
use crate::types::var::TypeVarSym;
use crate::types::{Type, TypeCtor};

use super::errors::TypeError;
use super::infer::InferCtx;
use super::patterns::{infer_pattern, instantiate_case, literal_type};
use super::scheme_ops::instantiate;

fn prim_type(p: PrimType) -> Type {
    let ctor = match p {
        PrimType::Char => TypeCtor::Char,
        PrimType::Int8 => TypeCtor::Int8,
        PrimType::Int16 => TypeCtor::Int16,
        PrimType::Int32 => TypeCtor::Int32,
        PrimType::Int64 => TypeCtor::Int64,
        PrimType::Float32 => TypeCtor::Float32,
        PrimType::Float64 => TypeCtor::Float64,
        PrimType::BigInt => TypeCtor::BigInt,
        PrimType::BigDecimal => TypeCtor::BigDecimal,
    };
    Type::Cst(ctor)
}

/// Infer an expression, producing its typed counterpart.
pub fn infer_exp(ctx: &mut InferCtx<'_>, exp: &k::Expr) -> Result<t::Expr, TypeError> {
    let loc = exp.loc;
    let node_tpe = Type::Var(exp.tvar.clone());

    let (kind, tpe, eff) = match &exp.kind {
        k::ExprKind::Cst(lit) => (
            t::ExprKind::Cst(lit.clone()),
            literal_type(lit),
            Type::pure(),
        ),

        k::ExprKind::Var(sym) => (
            t::ExprKind::Var(sym.clone()),
            Type::Var(sym.tvar.clone()),
            Type::pure(),
        ),

        k::ExprKind::Def(sym) => {
            let scheme = lookup_def_scheme(ctx, sym, loc)?;
            let inst = open_scheme(ctx, &scheme);
            (t::ExprKind::Def(sym.clone()), inst, Type::pure())
        }

        k::ExprKind::Sig(sym) => {
            let scheme = lookup_sig_scheme(ctx, sym, loc)?;
            let inst = open_scheme(ctx, &scheme);
            (t::ExprKind::Sig(sym.clone()), inst, Type::pure())
        }

        k::ExprKind::Lambda { fparam, body } => {
            ctx.unify(&Type::Var(fparam.sym.tvar.clone()), &fparam.tpe, fparam.loc)?;
            let body_t = infer_exp(ctx, body)?;
            let tpe = Type::mk_arrow(
                vec![fparam.tpe.clone()],
                body_t.eff.clone(),
                body_t.tpe.clone(),
            );
            (
                t::ExprKind::Lambda {
                    fparam: fparam.clone(),
                    body: Box::new(body_t),
                },
                tpe,
                Type::pure(),
            )
        }

        k::ExprKind::Apply { func, args, evar } => {
            return infer_apply(ctx, exp, func, args, evar);
        }

        k::ExprKind::Unary { op, exp: e } => {
            let e_t = infer_exp(ctx, e)?;
            let tpe = match op {
                UnaryOp::Not => {
                    ctx.expect_type(&Type::bool(), &e_t.tpe, e.loc)?;
                    Type::bool()
                }
                UnaryOp::Neg(p) => {
                    let pt = prim_type(*p);
                    ctx.expect_type(&pt, &e_t.tpe, e.loc)?;
                    pt
                }
            };
            let eff = e_t.eff.clone();
            (
                t::ExprKind::Unary {
                    op: *op,
                    exp: Box::new(e_t),
                },
                tpe,
                eff,
            )
        }

        k::ExprKind::Binary { op, exp1, exp2 } => {
            let e1 = infer_exp(ctx, exp1)?;
            let e2 = infer_exp(ctx, exp2)?;
            let tpe = match op {
                BinaryOp::BoolAnd | BinaryOp::BoolOr => {
                    ctx.expect_type(&Type::bool(), &e1.tpe, exp1.loc)?;
                    ctx.expect_type(&Type::bool(), &e2.tpe, exp2.loc)?;
                    Type::bool()
                }
                BinaryOp::Arith { tpe: p, .. } => {
                    let pt = prim_type(*p);
                    ctx.expect_type(&pt, &e1.tpe, exp1.loc)?;
                    ctx.expect_type(&pt, &e2.tpe, exp2.loc)?;
                    pt
                }
                BinaryOp::Cmp { tpe: p, .. } => {
                    let pt = prim_type(*p);
                    ctx.expect_type(&pt, &e1.tpe, exp1.loc)?;
                    ctx.expect_type(&pt, &e2.tpe, exp2.loc)?;
                    Type::bool()
                }
                BinaryOp::StringConcat => {
                    ctx.expect_type(&Type::string(), &e1.tpe, exp1.loc)?;
                    ctx.expect_type(&Type::string(), &e2.tpe, exp2.loc)?;
                    Type::string()
                }
            };
            let eff = Type::mk_union(e1.eff.clone(), e2.eff.clone());
            (
                t::ExprKind::Binary {
                    op: *op,
                    exp1: Box::new(e1),
                    exp2: Box::new(e2),
                },
                tpe,
                eff,
            )
        }

        k::ExprKind::IfThenElse {
            cond,
            then_exp,
            else_exp,
        } => {
            let c = infer_exp(ctx, cond)?;
            ctx.expect_type(&Type::bool(), &c.tpe, cond.loc)?;
            let th = infer_exp(ctx, then_exp)?;
            let el = infer_exp(ctx, else_exp)?;
            ctx.unify(&th.tpe, &el.tpe, loc)?;
            let tpe = th.tpe.clone();
            let eff = Type::mk_union_all([c.eff.clone(), th.eff.clone(), el.eff.clone()]);
            (
                t::ExprKind::IfThenElse {
                    cond: Box::new(c),
                    then_exp: Box::new(th),
                    else_exp: Box::new(el),
                },
                tpe,
                eff,
            )
        }

        k::ExprKind::Stm { exp1, exp2 } => {
            let e1 = infer_exp(ctx, exp1)?;
            let e2 = infer_exp(ctx, exp2)?;
            let tpe = e2.tpe.clone();
            let eff = Type::mk_union(e1.eff.clone(), e2.eff.clone());
            (
                t::ExprKind::Stm {
                    exp1: Box::new(e1),
                    exp2: Box::new(e2),
                },
                tpe,
                eff,
            )
        }

        k::ExprKind::Discard { exp: e } => {
            let e_t = infer_exp(ctx, e)?;
            let eff = e_t.eff.clone();
            (
                t::ExprKind::Discard { exp: Box::new(e_t) },
                Type::unit(),
                eff,
            )
        }

        k::ExprKind::Let { sym, exp1, exp2 } => {
            // Monomorphic: no generalization inside a definition.
            let e1 = infer_exp(ctx, exp1)?;
            ctx.unify(&Type::Var(sym.tvar.clone()), &e1.tpe, exp1.loc)?;
            let e2 = infer_exp(ctx, exp2)?;
            let tpe = e2.tpe.clone();
            let eff = Type::mk_union(e1.eff.clone(), e2.eff.clone());
            (
                t::ExprKind::Let {
                    sym: sym.clone(),
                    exp1: Box::new(e1),
                    exp2: Box::new(e2),
                },
                tpe,
                eff,
            )
        }

        k::ExprKind::LetRec { sym, exp1, exp2 } => {
            // The bound variable sees the lambda's type before its body is
            // inferred, so self-reference unifies against it.
            ctx.unify(
                &Type::Var(sym.tvar.clone()),
                &Type::Var(exp1.tvar.clone()),
                exp1.loc,
            )?;
            let e1 = infer_exp(ctx, exp1)?;
            let e2 = infer_exp(ctx, exp2)?;
            let tpe = e2.tpe.clone();
            let eff = Type::mk_union(e1.eff.clone(), e2.eff.clone());
            (
                t::ExprKind::LetRec {
                    sym: sym.clone(),
                    exp1: Box::new(e1),
                    exp2: Box::new(e2),
                },
                tpe,
                eff,
            )
        }

        k::ExprKind::Scope { sym, regvar, exp: e } => {
            ctx.rigidify(regvar);
            ctx.unify(
                &Type::Var(sym.tvar.clone()),
                &Type::mk_region(Type::Var(regvar.clone())),
                loc,
            )?;
            let e_t = infer_exp(ctx, e)?;
            // The region is purified out of the effect on exit...
            let eff = purify_region(&ctx.apply(&e_t.eff), regvar);
            // ...but must not escape through the result type.
            let result = ctx.apply(&e_t.tpe);
            if result.contains_var(regvar) {
                return Err(TypeError::RegionEscape {
                    rvar: regvar.clone(),
                    tpe: result,
                    loc,
                });
            }
            let tpe = e_t.tpe.clone();
            (
                t::ExprKind::Scope {
                    sym: sym.clone(),
                    regvar: regvar.clone(),
                    exp: Box::new(e_t),
                },
                tpe,
                eff,
            )
        }

        k::ExprKind::Match { exp: scrutinee, rules } => {
            let e = infer_exp(ctx, scrutinee)?;
            let result = ctx.fresh_star();
            let mut effs = vec![e.eff.clone()];
            let mut typed_rules = Vec::with_capacity(rules.len());
            for rule in rules {
                let pat = infer_pattern(ctx, &rule.pat)?;
                ctx.unify(&pat.tpe, &e.tpe, rule.pat.loc)?;
                let guard = match &rule.guard {
                    Some(g) => {
                        let g_t = infer_exp(ctx, g)?;
                        ctx.expect_type(&Type::bool(), &g_t.tpe, g.loc)?;
                        effs.push(g_t.eff.clone());
                        Some(g_t)
                    }
                    None => None,
                };
                let body = infer_exp(ctx, &rule.exp)?;
                ctx.unify(&result, &body.tpe, rule.exp.loc)?;
                effs.push(body.eff.clone());
                typed_rules.push(t::MatchRule {
                    pat,
                    guard,
                    exp: body,
                });
            }
            (
                t::ExprKind::Match {
                    exp: Box::new(e),
                    rules: typed_rules,
                },
                result,
                Type::mk_union_all(effs),
            )
        }

        k::ExprKind::TypeMatch { exp: scrutinee, rules } => {
            let e = infer_exp(ctx, scrutinee)?;
            let result = ctx.fresh_star();
            let mut effs = vec![e.eff.clone()];
            let mut typed_rules = Vec::with_capacity(rules.len());
            for rule in rules {
                // The matched type's variables are skolems inside the rule.
                for v in rule.tpe.type_vars() {
                    ctx.rigidify(&v);
                }
                ctx.unify(&Type::Var(rule.sym.tvar.clone()), &rule.tpe, rule.exp.loc)?;
                let body = infer_exp(ctx, &rule.exp)?;
                ctx.unify(&result, &body.tpe, rule.exp.loc)?;
                effs.push(body.eff.clone());
                typed_rules.push(t::TypeMatchRule {
                    sym: rule.sym.clone(),
                    tpe: rule.tpe.clone(),
                    exp: body,
                });
            }
            (
                t::ExprKind::TypeMatch {
                    exp: Box::new(e),
                    rules: typed_rules,
                },
                result,
                Type::mk_union_all(effs),
            )
        }

        k::ExprKind::Tag {
            enum_sym,
            case_sym,
            exp: payload,
        } => {
            let (enum_tpe, payload_tpe) = instantiate_case(ctx, enum_sym, case_sym, loc)?;
            let (payload_typed, eff) = match payload {
                Some(p) => {
                    let expected = payload_tpe.ok_or_else(|| TypeError::InternalError {
                        message: format!("case '{}' has no payload", case_sym),
                        loc,
                    })?;
                    let p_t = infer_exp(ctx, p)?;
                    ctx.expect_type(&expected, &p_t.tpe, p.loc)?;
                    let eff = p_t.eff.clone();
                    (Some(Box::new(p_t)), eff)
                }
                None => (None, Type::pure()),
            };
            (
                t::ExprKind::Tag {
                    enum_sym: enum_sym.clone(),
                    case_sym: case_sym.clone(),
                    exp: payload_typed,
                },
                enum_tpe,
                eff,
            )
        }

        k::ExprKind::Tuple { exps } => {
            let mut typed = Vec::with_capacity(exps.len());
            for e in exps {
                typed.push(infer_exp(ctx, e)?);
            }
            let tpe = Type::mk_tuple(typed.iter().map(|e| e.tpe.clone()).collect());
            let eff = Type::mk_union_all(typed.iter().map(|e| e.eff.clone()));
            (t::ExprKind::Tuple { exps: typed }, tpe, eff)
        }

        k::ExprKind::RecordEmpty => (
            t::ExprKind::RecordEmpty,
            Type::mk_record(Type::record_row_empty()),
            Type::pure(),
        ),

        k::ExprKind::RecordSelect { exp: e, label } => {
            let e_t = infer_exp(ctx, e)?;
            let field = ctx.fresh_star();
            let tail = ctx.fresh_var(Kind::RecordRow);
            let expected = Type::mk_record(Type::mk_record_row_extend(
                label.clone(),
                field.clone(),
                tail,
            ));
            ctx.unify(&e_t.tpe, &expected, loc)?;
            let eff = e_t.eff.clone();
            (
                t::ExprKind::RecordSelect {
                    exp: Box::new(e_t),
                    label: label.clone(),
                },
                field,
                eff,
            )
        }

        k::ExprKind::RecordExtend { label, value, rest } => {
            let v = infer_exp(ctx, value)?;
            let r = infer_exp(ctx, rest)?;
            let tail = ctx.fresh_var(Kind::RecordRow);
            ctx.unify(&r.tpe, &Type::mk_record(tail.clone()), rest.loc)?;
            let tpe = Type::mk_record(Type::mk_record_row_extend(
                label.clone(),
                v.tpe.clone(),
                tail,
            ));
            let eff = Type::mk_union(v.eff.clone(), r.eff.clone());
            (
                t::ExprKind::RecordExtend {
                    label: label.clone(),
                    value: Box::new(v),
                    rest: Box::new(r),
                },
                tpe,
                eff,
            )
        }

        k::ExprKind::RecordRestrict { label, rest } => {
            let r = infer_exp(ctx, rest)?;
            let field = ctx.fresh_star();
            let tail = ctx.fresh_var(Kind::RecordRow);
            let expected = Type::mk_record(Type::mk_record_row_extend(
                label.clone(),
                field,
                tail.clone(),
            ));
            ctx.unify(&r.tpe, &expected, loc)?;
            let eff = r.eff.clone();
            (
                t::ExprKind::RecordRestrict {
                    label: label.clone(),
                    rest: Box::new(r),
                },
                Type::mk_record(tail),
                eff,
            )
        }

        k::ExprKind::ArrayLit { exps, region } => {
            let (reg_t, rvar) = infer_region(ctx, region)?;
            let elm = ctx.fresh_star();
            let mut typed = Vec::with_capacity(exps.len());
            let mut effs = vec![reg_t.eff.clone(), rvar.clone()];
            for e in exps {
                let e_t = infer_exp(ctx, e)?;
                ctx.unify(&elm, &e_t.tpe, e.loc)?;
                effs.push(e_t.eff.clone());
                typed.push(e_t);
            }
            (
                t::ExprKind::ArrayLit {
                    exps: typed,
                    region: Box::new(reg_t),
                },
                Type::mk_array(elm, rvar),
                Type::mk_union_all(effs),
            )
        }

        k::ExprKind::ArrayNew { elm, len, region } => {
            let (reg_t, rvar) = infer_region(ctx, region)?;
            let elm_t = infer_exp(ctx, elm)?;
            let len_t = infer_exp(ctx, len)?;
            ctx.expect_type(&Type::int32(), &len_t.tpe, len.loc)?;
            let tpe = Type::mk_array(elm_t.tpe.clone(), rvar.clone());
            let eff = Type::mk_union_all([
                elm_t.eff.clone(),
                len_t.eff.clone(),
                reg_t.eff.clone(),
                rvar,
            ]);
            (
                t::ExprKind::ArrayNew {
                    elm: Box::new(elm_t),
                    len: Box::new(len_t),
                    region: Box::new(reg_t),
                },
                tpe,
                eff,
            )
        }

        k::ExprKind::ArrayLoad { base, index } => {
            let b = infer_exp(ctx, base)?;
            let i = infer_exp(ctx, index)?;
            let elm = ctx.fresh_star();
            let rvar = ctx.fresh_eff();
            ctx.unify(&b.tpe, &Type::mk_array(elm.clone(), rvar.clone()), base.loc)?;
            ctx.expect_type(&Type::int32(), &i.tpe, index.loc)?;
            let eff = Type::mk_union_all([b.eff.clone(), i.eff.clone(), rvar]);
            (
                t::ExprKind::ArrayLoad {
                    base: Box::new(b),
                    index: Box::new(i),
                },
                elm,
                eff,
            )
        }

        k::ExprKind::ArrayStore { base, index, elm } => {
            let b = infer_exp(ctx, base)?;
            let i = infer_exp(ctx, index)?;
            let v = infer_exp(ctx, elm)?;
            let rvar = ctx.fresh_eff();
            ctx.unify(
                &b.tpe,
                &Type::mk_array(v.tpe.clone(), rvar.clone()),
                base.loc,
            )?;
            ctx.expect_type(&Type::int32(), &i.tpe, index.loc)?;
            let eff = Type::mk_union_all([b.eff.clone(), i.eff.clone(), v.eff.clone(), rvar]);
            (
                t::ExprKind::ArrayStore {
                    base: Box::new(b),
                    index: Box::new(i),
                    elm: Box::new(v),
                },
                Type::unit(),
                eff,
            )
        }

        k::ExprKind::ArrayLength { base } => {
            let b = infer_exp(ctx, base)?;
            let elm = ctx.fresh_star();
            let rvar = ctx.fresh_eff();
            ctx.unify(&b.tpe, &Type::mk_array(elm, rvar), base.loc)?;
            let eff = b.eff.clone();
            (
                t::ExprKind::ArrayLength { base: Box::new(b) },
                Type::int32(),
                eff,
            )
        }

        k::ExprKind::VectorLit { exps } => {
            let elm = ctx.fresh_star();
            let mut typed = Vec::with_capacity(exps.len());
            let mut effs = Vec::with_capacity(exps.len());
            for e in exps {
                let e_t = infer_exp(ctx, e)?;
                ctx.unify(&elm, &e_t.tpe, e.loc)?;
                effs.push(e_t.eff.clone());
                typed.push(e_t);
            }
            (
                t::ExprKind::VectorLit { exps: typed },
                Type::mk_vector(elm),
                Type::mk_union_all(effs),
            )
        }

        k::ExprKind::VectorLoad { base, index } => {
            let b = infer_exp(ctx, base)?;
            let i = infer_exp(ctx, index)?;
            let elm = ctx.fresh_star();
            ctx.unify(&b.tpe, &Type::mk_vector(elm.clone()), base.loc)?;
            ctx.expect_type(&Type::int32(), &i.tpe, index.loc)?;
            let eff = Type::mk_union(b.eff.clone(), i.eff.clone());
            (
                t::ExprKind::VectorLoad {
                    base: Box::new(b),
                    index: Box::new(i),
                },
                elm,
                eff,
            )
        }

        k::ExprKind::VectorLength { base } => {
            let b = infer_exp(ctx, base)?;
            let elm = ctx.fresh_star();
            ctx.unify(&b.tpe, &Type::mk_vector(elm), base.loc)?;
            let eff = b.eff.clone();
            (
                t::ExprKind::VectorLength { base: Box::new(b) },
                Type::int32(),
                eff,
            )
        }

        k::ExprKind::Ref { exp: e, region } => {
            let (reg_t, rvar) = infer_region(ctx, region)?;
            let e_t = infer_exp(ctx, e)?;
            let tpe = Type::mk_ref(e_t.tpe.clone(), rvar.clone());
            let eff = Type::mk_union_all([e_t.eff.clone(), reg_t.eff.clone(), rvar]);
            (
                t::ExprKind::Ref {
                    exp: Box::new(e_t),
                    region: Box::new(reg_t),
                },
                tpe,
                eff,
            )
        }

        k::ExprKind::Deref { exp: e } => {
            let e_t = infer_exp(ctx, e)?;
            let elm = ctx.fresh_star();
            let rvar = ctx.fresh_eff();
            ctx.unify(&e_t.tpe, &Type::mk_ref(elm.clone(), rvar.clone()), e.loc)?;
            let eff = Type::mk_union(e_t.eff.clone(), rvar);
            (t::ExprKind::Deref { exp: Box::new(e_t) }, elm, eff)
        }

        k::ExprKind::Assign { exp1, exp2 } => {
            let e1 = infer_exp(ctx, exp1)?;
            let e2 = infer_exp(ctx, exp2)?;
            let rvar = ctx.fresh_eff();
            ctx.unify(
                &e1.tpe,
                &Type::mk_ref(e2.tpe.clone(), rvar.clone()),
                exp1.loc,
            )?;
            let eff = Type::mk_union_all([e1.eff.clone(), e2.eff.clone(), rvar]);
            (
                t::ExprKind::Assign {
                    exp1: Box::new(e1),
                    exp2: Box::new(e2),
                },
                Type::unit(),
                eff,
            )
        }

        k::ExprKind::Ascribe {
            exp: e,
            expected_tpe,
            expected_eff,
        } => {
            let e_t = infer_exp(ctx, e)?;
            if let Some(t0) = expected_tpe {
                ctx.expect_type(t0, &e_t.tpe, loc)?;
            }
            if let Some(f0) = expected_eff {
                ctx.expect_type(f0, &e_t.eff, loc)?;
            }
            let tpe = e_t.tpe.clone();
            let eff = e_t.eff.clone();
            (t::ExprKind::Ascribe { exp: Box::new(e_t) }, tpe, eff)
        }

        k::ExprKind::CheckedTypeCast { exp: e } => {
            let e_t = infer_exp(ctx, e)?;
            let tpe = ctx.fresh_star();
            let eff = e_t.eff.clone();
            (
                t::ExprKind::CheckedTypeCast { exp: Box::new(e_t) },
                tpe,
                eff,
            )
        }

        k::ExprKind::CheckedEffectCast { exp: e } => {
            let e_t = infer_exp(ctx, e)?;
            let tpe = e_t.tpe.clone();
            let eff = ctx.fresh_eff();
            (
                t::ExprKind::CheckedEffectCast { exp: Box::new(e_t) },
                tpe,
                eff,
            )
        }

        k::ExprKind::UncheckedCast {
            exp: e,
            declared_tpe,
            declared_eff,
        } => {
            let e_t = infer_exp(ctx, e)?;
            let tpe = declared_tpe.clone().unwrap_or_else(|| e_t.tpe.clone());
            let eff = declared_eff.clone().unwrap_or_else(|| e_t.eff.clone());
            (
                t::ExprKind::UncheckedCast {
                    exp: Box::new(e_t),
                    declared_tpe: declared_tpe.clone(),
                    declared_eff: declared_eff.clone(),
                },
                tpe,
                eff,
            )
        }

        k::ExprKind::Without { exp: e, eff: eff_sym } => {
            let e_t = infer_exp(ctx, e)?;
            // The body's effect must fit under the complement of the atom.
            let rest = ctx.fresh_eff();
            let bound = Type::mk_intersection(
                rest,
                Type::mk_complement(Type::mk_effect(eff_sym.clone())),
            );
            ctx.unify(&e_t.eff, &bound, loc)?;
            let tpe = e_t.tpe.clone();
            let eff = e_t.eff.clone();
            (
                t::ExprKind::Without {
                    exp: Box::new(e_t),
                    eff: eff_sym.clone(),
                },
                tpe,
                eff,
            )
        }

        k::ExprKind::TryCatch { exp: body, rules } => {
            let e = infer_exp(ctx, body)?;
            let mut effs = vec![e.eff.clone()];
            let mut typed_rules = Vec::with_capacity(rules.len());
            for rule in rules {
                ctx.unify(
                    &Type::Var(rule.sym.tvar.clone()),
                    &Type::mk_native(rule.class.clone()),
                    rule.exp.loc,
                )?;
                let handler = infer_exp(ctx, &rule.exp)?;
                ctx.unify(&e.tpe, &handler.tpe, rule.exp.loc)?;
                effs.push(handler.eff.clone());
                typed_rules.push(t::CatchRule {
                    sym: rule.sym.clone(),
                    class: rule.class.clone(),
                    exp: handler,
                });
            }
            let tpe = e.tpe.clone();
            (
                t::ExprKind::TryCatch {
                    exp: Box::new(e),
                    rules: typed_rules,
                },
                tpe,
                Type::mk_union_all(effs),
            )
        }

        k::ExprKind::TryWith {
            exp: body,
            eff: eff_sym,
            rules,
        } => {
            let e = infer_exp(ctx, body)?;
            let mut effs = Vec::with_capacity(rules.len());
            let mut typed_rules = Vec::with_capacity(rules.len());
            for rule in rules {
                let op = lookup_op(ctx, &rule.op, rule.exp.loc)?.clone();
                if rule.fparams.len() != op.fparams.len() {
                    return Err(TypeError::InvalidOpParamCount {
                        op: rule.op.clone(),
                        expected: op.fparams.len(),
                        actual: rule.fparams.len(),
                        loc: rule.exp.loc,
                    });
                }
                for (fp, op_fp) in rule.fparams.iter().zip(op.fparams.iter()) {
                    ctx.unify(&Type::Var(fp.sym.tvar.clone()), &fp.tpe, fp.loc)?;
                    ctx.expect_type(&op_fp.tpe, &fp.tpe, fp.loc)?;
                }
                let handler = infer_exp(ctx, &rule.exp)?;
                ctx.expect_type(&op.ret_tpe, &handler.tpe, rule.exp.loc)?;
                effs.push(handler.eff.clone());
                typed_rules.push(t::HandlerRule {
                    op: rule.op.clone(),
                    fparams: rule.fparams.clone(),
                    exp: handler,
                });
            }
            // Handling removes the effect atom from the block.
            let handled = Type::mk_difference(
                Type::mk_union_all(std::iter::once(e.eff.clone()).chain(effs)),
                Type::mk_effect(eff_sym.clone()),
            );
            let tpe = e.tpe.clone();
            (
                t::ExprKind::TryWith {
                    exp: Box::new(e),
                    eff: eff_sym.clone(),
                    rules: typed_rules,
                },
                tpe,
                handled,
            )
        }

        k::ExprKind::Do { op, args } => {
            let decl = lookup_op(ctx, op, loc)?.clone();
            if args.len() != decl.fparams.len() {
                return Err(TypeError::InvalidOpParamCount {
                    op: op.clone(),
                    expected: decl.fparams.len(),
                    actual: args.len(),
                    loc,
                });
            }
            let mut typed = Vec::with_capacity(args.len());
            let mut effs = Vec::with_capacity(args.len() + 1);
            for (arg, fp) in args.iter().zip(decl.fparams.iter()) {
                let a = infer_exp(ctx, arg)?;
                ctx.expect_type(&fp.tpe, &a.tpe, arg.loc)?;
                effs.push(a.eff.clone());
                typed.push(a);
            }
            effs.push(Type::mk_effect(decl.eff.clone()));
            (
                t::ExprKind::Do {
                    op: op.clone(),
                    args: typed,
                },
                decl.ret_tpe.clone(),
                Type::mk_union_all(effs),
            )
        }

        k::ExprKind::NewChannel { region, capacity } => {
            let (reg_t, rvar) = infer_region(ctx, region)?;
            let cap = infer_exp(ctx, capacity)?;
            ctx.expect_type(&Type::int32(), &cap.tpe, capacity.loc)?;
            let elm = ctx.fresh_star();
            let tpe = Type::mk_tuple(vec![
                Type::mk_sender(elm.clone(), rvar.clone()),
                Type::mk_receiver(elm, rvar.clone()),
            ]);
            let eff = Type::mk_union_all([reg_t.eff.clone(), cap.eff.clone(), rvar]);
            (
                t::ExprKind::NewChannel {
                    region: Box::new(reg_t),
                    capacity: Box::new(cap),
                },
                tpe,
                eff,
            )
        }

        k::ExprKind::GetChannel { exp: e } => {
            let e_t = infer_exp(ctx, e)?;
            let elm = ctx.fresh_star();
            let rvar = ctx.fresh_eff();
            ctx.unify(
                &e_t.tpe,
                &Type::mk_receiver(elm.clone(), rvar.clone()),
                e.loc,
            )?;
            let eff = Type::mk_union(e_t.eff.clone(), rvar);
            (t::ExprKind::GetChannel { exp: Box::new(e_t) }, elm, eff)
        }

        k::ExprKind::PutChannel { exp1, exp2 } => {
            let chan = infer_exp(ctx, exp1)?;
            let val = infer_exp(ctx, exp2)?;
            let rvar = ctx.fresh_eff();
            ctx.unify(
                &chan.tpe,
                &Type::mk_sender(val.tpe.clone(), rvar.clone()),
                exp1.loc,
            )?;
            let eff = Type::mk_union_all([chan.eff.clone(), val.eff.clone(), rvar]);
            (
                t::ExprKind::PutChannel {
                    exp1: Box::new(chan),
                    exp2: Box::new(val),
                },
                Type::unit(),
                eff,
            )
        }

        k::ExprKind::SelectChannel { rules, default } => {
            let result = ctx.fresh_star();
            let mut effs = Vec::new();
            let mut typed_rules = Vec::with_capacity(rules.len());
            for rule in rules {
                let chan = infer_exp(ctx, &rule.chan)?;
                let elm = ctx.fresh_star();
                let rvar = ctx.fresh_eff();
                ctx.unify(
                    &chan.tpe,
                    &Type::mk_receiver(elm.clone(), rvar.clone()),
                    rule.chan.loc,
                )?;
                ctx.unify(&Type::Var(rule.sym.tvar.clone()), &elm, rule.chan.loc)?;
                let body = infer_exp(ctx, &rule.exp)?;
                ctx.unify(&result, &body.tpe, rule.exp.loc)?;
                effs.push(chan.eff.clone());
                effs.push(body.eff.clone());
                effs.push(rvar);
                typed_rules.push(t::SelectChannelRule {
                    sym: rule.sym.clone(),
                    chan,
                    exp: body,
                });
            }
            let default_typed = match default {
                Some(d) => {
                    let d_t = infer_exp(ctx, d)?;
                    ctx.unify(&result, &d_t.tpe, d.loc)?;
                    effs.push(d_t.eff.clone());
                    Some(Box::new(d_t))
                }
                None => None,
            };
            (
                t::ExprKind::SelectChannel {
                    rules: typed_rules,
                    default: default_typed,
                },
                result,
                Type::mk_union_all(effs),
            )
        }

        k::ExprKind::Spawn { exp: body, region } => {
            let (reg_t, rvar) = infer_region(ctx, region)?;
            let e = infer_exp(ctx, body)?;
            let eff = Type::mk_union_all([e.eff.clone(), reg_t.eff.clone(), rvar, Type::impure()]);
            (
                t::ExprKind::Spawn {
                    exp: Box::new(e),
                    region: Box::new(reg_t),
                },
                Type::unit(),
                eff,
            )
        }

        k::ExprKind::Lazy { exp: e } => {
            let e_t = infer_exp(ctx, e)?;
            // Suspended computations must be pure.
            ctx.expect_type(&Type::pure(), &e_t.eff, e.loc)?;
            let tpe = Type::mk_lazy(e_t.tpe.clone());
            (t::ExprKind::Lazy { exp: Box::new(e_t) }, tpe, Type::pure())
        }

        k::ExprKind::Force { exp: e } => {
            let e_t = infer_exp(ctx, e)?;
            let elm = ctx.fresh_star();
            ctx.unify(&e_t.tpe, &Type::mk_lazy(elm.clone()), e.loc)?;
            let eff = e_t.eff.clone();
            (t::ExprKind::Force { exp: Box::new(e_t) }, elm, eff)
        }

        k::ExprKind::InvokeConstructor {
            class,
            args,
            param_types,
        } => {
            let typed = infer_foreign_args(ctx, args, param_types, loc)?;
            (
                t::ExprKind::InvokeConstructor {
                    class: class.clone(),
                    args: typed,
                },
                Type::mk_native(class.clone()),
                Type::impure(),
            )
        }

        k::ExprKind::InvokeMethod {
            method,
            receiver,
            args,
        } => {
            let recv = infer_exp(ctx, receiver)?;
            ctx.expect_type(
                &Type::mk_native(method.class.clone()),
                &recv.tpe,
                receiver.loc,
            )?;
            let typed = infer_foreign_args(ctx, args, &method.param_types, loc)?;
            (
                t::ExprKind::InvokeMethod {
                    method: method.clone(),
                    receiver: Box::new(recv),
                    args: typed,
                },
                method.ret_tpe.clone(),
                Type::impure(),
            )
        }

        k::ExprKind::InvokeStaticMethod { method, args } => {
            let typed = infer_foreign_args(ctx, args, &method.param_types, loc)?;
            (
                t::ExprKind::InvokeStaticMethod {
                    method: method.clone(),
                    args: typed,
                },
                method.ret_tpe.clone(),
                Type::impure(),
            )
        }

        k::ExprKind::GetField { field, receiver } => {
            let recv = infer_exp(ctx, receiver)?;
            ctx.expect_type(
                &Type::mk_native(field.class.clone()),
                &recv.tpe,
                receiver.loc,
            )?;
            (
                t::ExprKind::GetField {
                    field: field.clone(),
                    receiver: Box::new(recv),
                },
                field.tpe.clone(),
                Type::impure(),
            )
        }

        k::ExprKind::PutField {
            field,
            receiver,
            value,
        } => {
            let recv = infer_exp(ctx, receiver)?;
            ctx.expect_type(
                &Type::mk_native(field.class.clone()),
                &recv.tpe,
                receiver.loc,
            )?;
            let v = infer_exp(ctx, value)?;
            ctx.expect_type(&field.tpe, &v.tpe, value.loc)?;
            (
                t::ExprKind::PutField {
                    field: field.clone(),
                    receiver: Box::new(recv),
                    value: Box::new(v),
                },
                Type::unit(),
                Type::impure(),
            )
        }

        k::ExprKind::GetStaticField { field } => (
            t::ExprKind::GetStaticField {
                field: field.clone(),
            },
            field.tpe.clone(),
            Type::impure(),
        ),

        k::ExprKind::PutStaticField { field, value } => {
            let v = infer_exp(ctx, value)?;
            ctx.expect_type(&field.tpe, &v.tpe, value.loc)?;
            (
                t::ExprKind::PutStaticField {
                    field: field.clone(),
                    value: Box::new(v),
                },
                Type::unit(),
                Type::impure(),
            )
        }

        k::ExprKind::FixpointConstraintSet { constraints } => {
            let row = ctx.fresh_var(Kind::SchemaRow);
            let schema = Type::mk_schema(row);
            let mut typed = Vec::with_capacity(constraints.len());
            for c in constraints {
                typed.push(infer_constraint(ctx, c, &schema)?);
            }
            (
                t::ExprKind::FixpointConstraintSet {
                    constraints: typed,
                },
                schema,
                Type::pure(),
            )
        }

        k::ExprKind::FixpointMerge { exp1, exp2 } => {
            let e1 = infer_exp(ctx, exp1)?;
            let e2 = infer_exp(ctx, exp2)?;
            let row = ctx.fresh_var(Kind::SchemaRow);
            ctx.unify(&e1.tpe, &Type::mk_schema(row), exp1.loc)?;
            ctx.unify(&e1.tpe, &e2.tpe, loc)?;
            let tpe = e1.tpe.clone();
            let eff = Type::mk_union(e1.eff.clone(), e2.eff.clone());
            (
                t::ExprKind::FixpointMerge {
                    exp1: Box::new(e1),
                    exp2: Box::new(e2),
                },
                tpe,
                eff,
            )
        }

        k::ExprKind::FixpointSolve { exp: e } => {
            let e_t = infer_exp(ctx, e)?;
            let row = ctx.fresh_var(Kind::SchemaRow);
            ctx.unify(&e_t.tpe, &Type::mk_schema(row), e.loc)?;
            let tpe = e_t.tpe.clone();
            let eff = e_t.eff.clone();
            (
                t::ExprKind::FixpointSolve { exp: Box::new(e_t) },
                tpe,
                eff,
            )
        }

        k::ExprKind::FixpointFilter { pred, exp: e } => {
            let e_t = infer_exp(ctx, e)?;
            let pred_tpe = ctx.fresh_var(Kind::Predicate);
            let tail = ctx.fresh_var(Kind::SchemaRow);
            ctx.unify(
                &e_t.tpe,
                &Type::mk_schema(Type::mk_schema_row_extend(
                    pred.clone(),
                    pred_tpe.clone(),
                    tail,
                )),
                e.loc,
            )?;
            let out_tail = ctx.fresh_var(Kind::SchemaRow);
            let tpe = Type::mk_schema(Type::mk_schema_row_extend(
                pred.clone(),
                pred_tpe,
                out_tail,
            ));
            let eff = e_t.eff.clone();
            (
                t::ExprKind::FixpointFilter {
                    pred: pred.clone(),
                    exp: Box::new(e_t),
                },
                tpe,
                eff,
            )
        }

        k::ExprKind::FixpointInject { exp: e, pred } => {
            let e_t = infer_exp(ctx, e)?;
            let elm = ctx.fresh_star();
            let container = ctx.fresh_var(Kind::arrow(Kind::Star, Kind::Star));
            ctx.unify(&e_t.tpe, &Type::app(container.clone(), elm.clone()), e.loc)?;
            add_wellknown_constraint(ctx, "Foldable", container, loc);
            add_wellknown_constraint(ctx, "Order", elm.clone(), loc);
            let tail = ctx.fresh_var(Kind::SchemaRow);
            let tpe = Type::mk_schema(Type::mk_schema_row_extend(
                pred.clone(),
                Type::mk_relation(vec![elm]),
                tail,
            ));
            let eff = e_t.eff.clone();
            (
                t::ExprKind::FixpointInject {
                    exp: Box::new(e_t),
                    pred: pred.clone(),
                },
                tpe,
                eff,
            )
        }

        k::ExprKind::FixpointProject { pred, exp: e } => {
            let e_t = infer_exp(ctx, e)?;
            let elm = ctx.fresh_star();
            let tail = ctx.fresh_var(Kind::SchemaRow);
            ctx.unify(
                &e_t.tpe,
                &Type::mk_schema(Type::mk_schema_row_extend(
                    pred.clone(),
                    Type::mk_relation(vec![elm.clone()]),
                    tail,
                )),
                e.loc,
            )?;
            add_wellknown_constraint(ctx, "Order", elm.clone(), loc);
            let eff = e_t.eff.clone();
            (
                t::ExprKind::FixpointProject {
                    pred: pred.clone(),
                    exp: Box::new(e_t),
                },
                Type::mk_vector(elm),
                eff,
            )
        }

        k::ExprKind::Error => (t::ExprKind::Error, node_tpe.clone(), Type::pure()),
    };

    ctx.unify(&node_tpe, &tpe, loc)?;
    Ok(t::Expr {
        kind,
        tpe: node_tpe,
        eff,
        loc,
    })
}

// ============================================================================
// Application
// ============================================================================

/// `Apply` gets its own function: direct calls of a known `Def` or `Sig`
/// instantiate the declared scheme and check arguments against declared
/// parameter types for sharper error locations; everything else goes
/// through a fresh arrow.
fn infer_apply(
    ctx: &mut InferCtx<'_>,
    exp: &k::Expr,
    func: &k::Expr,
    args: &[k::Expr],
    evar: &TypeVarSym,
) -> Result<t::Expr, TypeError> {
    let loc = exp.loc;
    let node_tpe = Type::Var(exp.tvar.clone());

    let direct_scheme = match &func.kind {
        k::ExprKind::Def(sym) => Some((
            t::ExprKind::Def(sym.clone()),
            lookup_def_scheme(ctx, sym, func.loc)?,
        )),
        k::ExprKind::Sig(sym) => Some((
            t::ExprKind::Sig(sym.clone()),
            lookup_sig_scheme(ctx, sym, func.loc)?,
        )),
        _ => None,
    };

    if let Some((func_kind, scheme)) = direct_scheme {
        let declared = open_scheme(ctx, &scheme);
        if let Some((params, latent_eff, result)) = declared.arrow_parts() {
            if params.len() == args.len() {
                let params: Vec<Type> = params.into_iter().cloned().collect();
                let latent_eff = latent_eff.clone();
                let result = result.clone();

                let mut typed_args = Vec::with_capacity(args.len());
                let mut effs = Vec::with_capacity(args.len() + 1);
                for (arg, param) in args.iter().zip(params.iter()) {
                    let a = infer_exp(ctx, arg)?;
                    ctx.expect_type(param, &a.tpe, arg.loc)?;
                    effs.push(a.eff.clone());
                    typed_args.push(a);
                }
                ctx.unify(&Type::Var(evar.clone()), &latent_eff, loc)?;
                ctx.unify(&Type::Var(func.tvar.clone()), &declared, func.loc)?;
                effs.push(latent_eff);

                let func_typed = t::Expr {
                    kind: func_kind,
                    tpe: Type::Var(func.tvar.clone()),
                    eff: Type::pure(),
                    loc: func.loc,
                };
                ctx.unify(&node_tpe, &result, loc)?;
                return Ok(t::Expr {
                    kind: t::ExprKind::Apply {
                        func: Box::new(func_typed),
                        args: typed_args,
                    },
                    tpe: node_tpe,
                    eff: Type::mk_union_all(effs),
                    loc,
                });
            }
        }
        // Unexpected arity: fall back to the general rule below.
    }

    let func_typed = infer_exp(ctx, func)?;
    let mut typed_args = Vec::with_capacity(args.len());
    let mut arg_types = Vec::with_capacity(args.len());
    let mut effs = vec![func_typed.eff.clone()];
    for arg in args {
        let a = infer_exp(ctx, arg)?;
        arg_types.push(a.tpe.clone());
        effs.push(a.eff.clone());
        typed_args.push(a);
    }
    let result = ctx.fresh_star();
    let latent = Type::Var(evar.clone());
    let expected = Type::mk_arrow(arg_types, latent.clone(), result.clone());
    ctx.unify(&func_typed.tpe, &expected, func.loc)?;
    effs.push(latent);

    ctx.unify(&node_tpe, &result, loc)?;
    Ok(t::Expr {
        kind: t::ExprKind::Apply {
            func: Box::new(func_typed),
            args: typed_args,
        },
        tpe: node_tpe,
        eff: Type::mk_union_all(effs),
        loc,
    })
}

// ============================================================================
// Helpers
// ============================================================================

fn lookup_def_scheme(
    ctx: &InferCtx<'_>,
    sym: &crate::ast::shared::DefnSym,
    loc: Span,
) -> Result<crate::types::scheme::Scheme, TypeError> {
    ctx.snapshot
        .def(sym)
        .map(|d| d.spec.scheme.clone())
        .ok_or_else(|| TypeError::InternalError {
            message: format!("unresolved definition symbol '{}'", sym),
            loc,
        })
}

fn lookup_sig_scheme(
    ctx: &InferCtx<'_>,
    sym: &crate::ast::shared::SigSym,
    loc: Span,
) -> Result<crate::types::scheme::Scheme, TypeError> {
    ctx.snapshot
        .sig(sym)
        .map(|s| s.spec.scheme.clone())
        .ok_or_else(|| TypeError::InternalError {
            message: format!("unresolved signature symbol '{}'", sym),
            loc,
        })
}

fn lookup_op<'c>(
    ctx: &InferCtx<'c>,
    sym: &crate::ast::shared::OpSym,
    loc: Span,
) -> Result<&'c k::OpDecl, TypeError> {
    ctx.snapshot
        .op_decl(sym)
        .ok_or_else(|| TypeError::InternalError {
            message: format!("unresolved operation symbol '{}'", sym),
            loc,
        })
}

/// Instantiate a scheme and record its constraints in the context.
fn open_scheme(ctx: &mut InferCtx<'_>, scheme: &crate::types::scheme::Scheme) -> Type {
    let (tconstrs, econstrs, tpe) = instantiate(scheme);
    ctx.add_tconstrs(tconstrs);
    ctx.add_econstrs(econstrs);
    tpe
}

/// Infer a region handle expression; returns the typed expression and
/// the region variable it names.
fn infer_region(
    ctx: &mut InferCtx<'_>,
    region: &k::Expr,
) -> Result<(t::Expr, Type), TypeError> {
    let reg_t = infer_exp(ctx, region)?;
    let rvar = ctx.fresh_eff();
    ctx.unify(&reg_t.tpe, &Type::mk_region(rvar.clone()), region.loc)?;
    Ok((reg_t, rvar))
}

fn infer_foreign_args(
    ctx: &mut InferCtx<'_>,
    args: &[k::Expr],
    param_types: &[Type],
    loc: Span,
) -> Result<Vec<t::Expr>, TypeError> {
    if args.len() != param_types.len() {
        return Err(TypeError::InternalError {
            message: format!(
                "foreign signature arity mismatch: {} parameter(s), {} argument(s)",
                param_types.len(),
                args.len()
            ),
            loc,
        });
    }
    let mut typed = Vec::with_capacity(args.len());
    for (arg, param) in args.iter().zip(param_types.iter()) {
        let a = infer_exp(ctx, arg)?;
        ctx.expect_type(param, &a.tpe, arg.loc)?;
        typed.push(a);
    }
    Ok(typed)
}

/// Emit a constraint on a well-known trait if the unit declares it; units
/// compiled without the standard library simply skip the obligation.
fn add_wellknown_constraint(ctx: &mut InferCtx<'_>, name: &str, arg: Type, loc: Span) {
    if let Some(sym) = ctx.snapshot.trait_by_name(name).cloned() {
        ctx.add_tconstrs([TraitConstraint::new(sym, arg, loc)]);
    }
}

/// Type one Datalog constraint against the enclosing schema type.
fn infer_constraint(
    ctx: &mut InferCtx<'_>,
    c: &k::FixConstraint,
    schema: &Type,
) -> Result<t::FixConstraint, TypeError> {
    let mut term_types = Vec::with_capacity(c.head.terms.len());
    let mut typed_terms = Vec::with_capacity(c.head.terms.len());
    for term in &c.head.terms {
        let term_t = infer_exp(ctx, term)?;
        ctx.expect_type(&Type::pure(), &term_t.eff, term.loc)?;
        term_types.push(term_t.tpe.clone());
        typed_terms.push(term_t);
    }
    let pred_tpe = match c.head.den {
        k::Denotation::Relational => Type::mk_relation(term_types),
        k::Denotation::Latticenal => Type::mk_lattice(term_types),
    };
    constrain_predicate(ctx, schema, &c.head.pred, &pred_tpe, c.head.loc)?;

    let mut typed_body = Vec::with_capacity(c.body.len());
    for b in &c.body {
        match b {
            k::BodyPredicate::Atom {
                pred,
                den,
                polarity,
                terms,
                loc: bloc,
            } => {
                let mut pat_types = Vec::with_capacity(terms.len());
                let mut typed_pats = Vec::with_capacity(terms.len());
                for pat in terms {
                    let p = infer_pattern(ctx, pat)?;
                    pat_types.push(p.tpe.clone());
                    typed_pats.push(p);
                }
                let pred_tpe = match den {
                    k::Denotation::Relational => Type::mk_relation(pat_types),
                    k::Denotation::Latticenal => Type::mk_lattice(pat_types),
                };
                constrain_predicate(ctx, schema, pred, &pred_tpe, *bloc)?;
                typed_body.push(t::BodyPredicate::Atom {
                    pred: pred.clone(),
                    den: *den,
                    polarity: *polarity,
                    terms: typed_pats,
                    loc: *bloc,
                });
            }
            k::BodyPredicate::Guard { exp, loc: bloc } => {
                let g = infer_exp(ctx, exp)?;
                ctx.expect_type(&Type::bool(), &g.tpe, exp.loc)?;
                ctx.expect_type(&Type::pure(), &g.eff, exp.loc)?;
                typed_body.push(t::BodyPredicate::Guard {
                    exp: g,
                    loc: *bloc,
                });
            }
        }
    }

    Ok(t::FixConstraint {
        head: t::HeadPredicate {
            pred: c.head.pred.clone(),
            den: c.head.den,
            terms: typed_terms,
            loc: c.head.loc,
        },
        body: typed_body,
        loc: c.loc,
    })
}

/// Require the schema row to contain `pred` at `pred_tpe`.
fn constrain_predicate(
    ctx: &mut InferCtx<'_>,
    schema: &Type,
    pred: &crate::ast::shared::PredSym,
    pred_tpe: &Type,
    loc: Span,
) -> Result<(), TypeError> {
    let tail = ctx.fresh_var(Kind::SchemaRow);
    let expected = Type::mk_schema(Type::mk_schema_row_extend(
        pred.clone(),
        pred_tpe.clone(),
        tail,
    ));
    ctx.unify(schema, &expected, loc)
}

/// Substitute `Pure` for a region variable throughout an effect,
/// renormalizing on the way up.
pub(crate) fn purify_region(eff: &Type, regvar: &TypeVarSym) -> Type {
    match eff {
        Type::Var(v) if v == regvar => Type::pure(),
        Type::Var(_) | Type::Cst(_) => eff.clone(),
        Type::Alias { tpe, .. } => purify_region(tpe, regvar),
        Type::App(_, _) => {
            let (head, args) = eff.spine();
            match (head, args.as_slice()) {
                (Type::Cst(TypeCtor::Union), [a, b]) => Type::mk_union(
                    purify_region(a, regvar),
                    purify_region(b, regvar),
                ),
                (Type::Cst(TypeCtor::Intersection), [a, b]) => Type::mk_intersection(
                    purify_region(a, regvar),
                    purify_region(b, regvar),
                ),
                (Type::Cst(TypeCtor::Complement), [a]) => {
                    Type::mk_complement(purify_region(a, regvar))
                }
                _ => eff.clone(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::shared::{
        ArithOp, EffectSym, Label, Literal, NativeClass, OpSym, Span, VarSym,
    };
    use crate::typeck::context::ContextSnapshot;
    use crate::typeck::CheckerConfig;
    use crate::types::var::fresh_type_var;

    fn e(kind: k::ExprKind) -> k::Expr {
        k::Expr {
            kind,
            tvar: fresh_type_var(Kind::Star),
            loc: Span::dummy(),
        }
    }

    fn int(i: i32) -> k::Expr {
        e(k::ExprKind::Cst(Literal::Int32(i)))
    }

    fn vsym(name: &str) -> VarSym {
        VarSym::new(1, name, fresh_type_var(Kind::Star))
    }

    /// Infer against a given root; returns the resolved type and effect.
    fn infer_in(root: &k::Root, exp: &k::Expr) -> Result<(Type, Type), TypeError> {
        let config = CheckerConfig::default();
        let snapshot = ContextSnapshot::new(root, &config);
        let mut ctx = InferCtx::new(&snapshot);
        let typed = infer_exp(&mut ctx, exp)?;
        Ok((ctx.apply(&typed.tpe), ctx.apply(&typed.eff)))
    }

    fn infer(exp: &k::Expr) -> Result<(Type, Type), TypeError> {
        infer_in(&k::Root::default(), exp)
    }

    fn emit_root() -> (k::Root, EffectSym, OpSym) {
        let eff_sym = EffectSym::new(1, "Emit");
        let op_sym = OpSym::new(2, "emit");
        let mut root = k::Root::default();
        root.effects.insert(
            eff_sym.clone(),
            k::EffectDecl {
                sym: eff_sym.clone(),
                ops: vec![k::OpDecl {
                    sym: op_sym.clone(),
                    eff: eff_sym.clone(),
                    fparams: vec![],
                    ret_tpe: Type::unit(),
                    loc: Span::dummy(),
                }],
                loc: Span::dummy(),
            },
        );
        (root, eff_sym, op_sym)
    }

    #[test]
    fn test_stm_takes_second_type() {
        let exp = e(k::ExprKind::Stm {
            exp1: Box::new(int(1)),
            exp2: Box::new(e(k::ExprKind::Cst(Literal::Bool(true)))),
        });
        let (tpe, eff) = infer(&exp).unwrap();
        assert_eq!(tpe, Type::bool());
        assert!(eff.is_pure());
    }

    #[test]
    fn test_discard_is_unit() {
        let exp = e(k::ExprKind::Discard {
            exp: Box::new(int(1)),
        });
        let (tpe, _) = infer(&exp).unwrap();
        assert_eq!(tpe, Type::unit());
    }

    #[test]
    fn test_if_branches_unify() {
        let exp = e(k::ExprKind::IfThenElse {
            cond: Box::new(e(k::ExprKind::Cst(Literal::Bool(true)))),
            then_exp: Box::new(int(1)),
            else_exp: Box::new(int(2)),
        });
        let (tpe, _) = infer(&exp).unwrap();
        assert_eq!(tpe, Type::int32());
    }

    #[test]
    fn test_if_branch_mismatch() {
        let exp = e(k::ExprKind::IfThenElse {
            cond: Box::new(e(k::ExprKind::Cst(Literal::Bool(true)))),
            then_exp: Box::new(int(1)),
            else_exp: Box::new(e(k::ExprKind::Cst(Literal::Bool(false)))),
        });
        assert!(infer(&exp).is_err());
    }

    #[test]
    fn test_arith_operands_fixed() {
        let exp = e(k::ExprKind::Binary {
            op: BinaryOp::Arith {
                tpe: PrimType::Int32,
                op: ArithOp::Add,
            },
            exp1: Box::new(int(1)),
            exp2: Box::new(int(2)),
        });
        let (tpe, _) = infer(&exp).unwrap();
        assert_eq!(tpe, Type::int32());

        let bad = e(k::ExprKind::Binary {
            op: BinaryOp::Arith {
                tpe: PrimType::Int32,
                op: ArithOp::Add,
            },
            exp1: Box::new(int(1)),
            exp2: Box::new(e(k::ExprKind::Cst(Literal::Bool(true)))),
        });
        assert!(infer(&bad).is_err());
    }

    #[test]
    fn test_string_concat() {
        let s = |txt: &str| e(k::ExprKind::Cst(Literal::Str(txt.to_string())));
        let exp = e(k::ExprKind::Binary {
            op: BinaryOp::StringConcat,
            exp1: Box::new(s("a")),
            exp2: Box::new(s("b")),
        });
        let (tpe, _) = infer(&exp).unwrap();
        assert_eq!(tpe, Type::string());
    }

    #[test]
    fn test_tuple_shape() {
        let exp = e(k::ExprKind::Tuple {
            exps: vec![int(1), e(k::ExprKind::Cst(Literal::Bool(true)))],
        });
        let (tpe, _) = infer(&exp).unwrap();
        let (head, args) = tpe.spine();
        assert_eq!(head, &Type::Cst(TypeCtor::Tuple(2)));
        assert_eq!(args[1], &Type::bool());
    }

    #[test]
    fn test_vector_elements_unify() {
        let ok = e(k::ExprKind::VectorLit {
            exps: vec![int(1), int(2)],
        });
        let (tpe, _) = infer(&ok).unwrap();
        assert_eq!(tpe, Type::mk_vector(Type::int32()));

        let bad = e(k::ExprKind::VectorLit {
            exps: vec![int(1), e(k::ExprKind::Cst(Literal::Bool(true)))],
        });
        assert!(infer(&bad).is_err());
    }

    #[test]
    fn test_vector_load() {
        let exp = e(k::ExprKind::VectorLoad {
            base: Box::new(e(k::ExprKind::VectorLit {
                exps: vec![int(7)],
            })),
            index: Box::new(int(0)),
        });
        let (tpe, _) = infer(&exp).unwrap();
        assert_eq!(tpe, Type::int32());
    }

    #[test]
    fn test_ascribe_checks_type() {
        let ok = e(k::ExprKind::Ascribe {
            exp: Box::new(int(1)),
            expected_tpe: Some(Type::int32()),
            expected_eff: Some(Type::pure()),
        });
        assert!(infer(&ok).is_ok());

        let bad = e(k::ExprKind::Ascribe {
            exp: Box::new(int(1)),
            expected_tpe: Some(Type::bool()),
            expected_eff: None,
        });
        assert!(infer(&bad).is_err());
    }

    #[test]
    fn test_unchecked_cast_replaces_type() {
        let exp = e(k::ExprKind::UncheckedCast {
            exp: Box::new(int(1)),
            declared_tpe: Some(Type::bool()),
            declared_eff: None,
        });
        let (tpe, _) = infer(&exp).unwrap();
        assert_eq!(tpe, Type::bool());
    }

    #[test]
    fn test_checked_type_cast_is_open() {
        let exp = e(k::ExprKind::CheckedTypeCast {
            exp: Box::new(int(1)),
        });
        let (tpe, _) = infer(&exp).unwrap();
        // Unconstrained: the context decides.
        assert!(matches!(tpe, Type::Var(_)));
    }

    #[test]
    fn test_without_rejects_present_atom() {
        let (root, eff_sym, op_sym) = emit_root();
        let exp = e(k::ExprKind::Without {
            exp: Box::new(e(k::ExprKind::Do {
                op: op_sym,
                args: vec![],
            })),
            eff: eff_sym,
        });
        assert!(infer_in(&root, &exp).is_err());
    }

    #[test]
    fn test_without_accepts_absent_atom() {
        let (root, eff_sym, _) = emit_root();
        let exp = e(k::ExprKind::Without {
            exp: Box::new(int(1)),
            eff: eff_sym,
        });
        assert!(infer_in(&root, &exp).is_ok());
    }

    #[test]
    fn test_try_catch_binder_and_type() {
        let ex = vsym("ex");
        let exp = e(k::ExprKind::TryCatch {
            exp: Box::new(int(1)),
            rules: vec![k::CatchRule {
                sym: ex.clone(),
                class: NativeClass::new("java.lang.Exception"),
                exp: int(0),
            }],
        });
        let config = CheckerConfig::default();
        let root = k::Root::default();
        let snapshot = ContextSnapshot::new(&root, &config);
        let mut ctx = InferCtx::new(&snapshot);
        let typed = infer_exp(&mut ctx, &exp).unwrap();
        assert_eq!(ctx.apply(&typed.tpe), Type::int32());
        assert_eq!(
            ctx.apply(&Type::Var(ex.tvar)),
            Type::mk_native(NativeClass::new("java.lang.Exception"))
        );
    }

    #[test]
    fn test_force_unwraps_lazy() {
        let exp = e(k::ExprKind::Force {
            exp: Box::new(e(k::ExprKind::Lazy {
                exp: Box::new(int(1)),
            })),
        });
        let (tpe, eff) = infer(&exp).unwrap();
        assert_eq!(tpe, Type::int32());
        assert!(eff.is_pure());
    }

    #[test]
    fn test_restricted_field_is_gone() {
        // ({ x = 1 | {} } - x).x
        let extended = e(k::ExprKind::RecordExtend {
            label: Label::new("x"),
            value: Box::new(int(1)),
            rest: Box::new(e(k::ExprKind::RecordEmpty)),
        });
        let restricted = e(k::ExprKind::RecordRestrict {
            label: Label::new("x"),
            rest: Box::new(extended),
        });
        let select = e(k::ExprKind::RecordSelect {
            exp: Box::new(restricted),
            label: Label::new("x"),
        });
        let err = infer(&select).unwrap_err();
        assert!(matches!(err, TypeError::MissingLabel { .. }));
    }

    #[test]
    fn test_spawn_is_impure() {
        let handle = vsym("rc");
        let regvar = fresh_type_var(Kind::Bool);
        let spawn = e(k::ExprKind::Spawn {
            exp: Box::new(int(1)),
            region: Box::new(e(k::ExprKind::Var(handle.clone()))),
        });
        let exp = e(k::ExprKind::Scope {
            sym: handle,
            regvar,
            exp: Box::new(spawn),
        });
        let (tpe, eff) = infer(&exp).unwrap();
        assert_eq!(tpe, Type::unit());
        assert!(eff.is_impure());
    }

    #[test]
    fn test_purify_region_rewrites_to_pure() {
        let r = fresh_type_var(Kind::Bool);
        let other = fresh_type_var(Kind::Bool);
        let eff = Type::mk_union(Type::Var(r.clone()), Type::Var(other.clone()));
        let purified = purify_region(&eff, &r);
        assert_eq!(purified, Type::Var(other));
        assert_eq!(purify_region(&Type::Var(r.clone()), &r), Type::pure());
    }
}
