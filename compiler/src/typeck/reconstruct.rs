//! Type reconstruction
//!
//! After a definition's walk completes, the final substitution is pushed
//! through the typed tree so every node's type and effect mention only
//! what the unit as a whole could determine. Variables the substitution
//! does not cover stay, consistently, as themselves.

use crate::ast::kinded::FormalParam;
use crate::ast::typed as t;
use crate::types::subst::Substitution;

pub fn apply_subst_exp(s: &Substitution, exp: t::Expr) -> t::Expr {
    let t::Expr {
        kind,
        tpe,
        eff,
        loc,
    } = exp;
    t::Expr {
        kind: apply_subst_kind(s, kind),
        tpe: s.apply(&tpe),
        eff: s.apply(&eff),
        loc,
    }
}

fn bx(s: &Substitution, e: Box<t::Expr>) -> Box<t::Expr> {
    Box::new(apply_subst_exp(s, *e))
}

fn many(s: &Substitution, es: Vec<t::Expr>) -> Vec<t::Expr> {
    es.into_iter().map(|e| apply_subst_exp(s, e)).collect()
}

fn fparam(s: &Substitution, fp: FormalParam) -> FormalParam {
    FormalParam {
        sym: fp.sym,
        tpe: s.apply(&fp.tpe),
        loc: fp.loc,
    }
}

fn apply_subst_kind(s: &Substitution, kind: t::ExprKind) -> t::ExprKind {
    use t::ExprKind::*;
    match kind {
        Cst(lit) => Cst(lit),
        Var(sym) => Var(sym),
        Def(sym) => Def(sym),
        Sig(sym) => Sig(sym),
        Lambda { fparam: fp, body } => Lambda {
            fparam: fparam(s, fp),
            body: bx(s, body),
        },
        Apply { func, args } => Apply {
            func: bx(s, func),
            args: many(s, args),
        },
        Unary { op, exp } => Unary { op, exp: bx(s, exp) },
        Binary { op, exp1, exp2 } => Binary {
            op,
            exp1: bx(s, exp1),
            exp2: bx(s, exp2),
        },
        IfThenElse {
            cond,
            then_exp,
            else_exp,
        } => IfThenElse {
            cond: bx(s, cond),
            then_exp: bx(s, then_exp),
            else_exp: bx(s, else_exp),
        },
        Stm { exp1, exp2 } => Stm {
            exp1: bx(s, exp1),
            exp2: bx(s, exp2),
        },
        Discard { exp } => Discard { exp: bx(s, exp) },
        Let { sym, exp1, exp2 } => Let {
            sym,
            exp1: bx(s, exp1),
            exp2: bx(s, exp2),
        },
        LetRec { sym, exp1, exp2 } => LetRec {
            sym,
            exp1: bx(s, exp1),
            exp2: bx(s, exp2),
        },
        Scope { sym, regvar, exp } => Scope {
            sym,
            regvar,
            exp: bx(s, exp),
        },
        Match { exp, rules } => Match {
            exp: bx(s, exp),
            rules: rules
                .into_iter()
                .map(|r| t::MatchRule {
                    pat: apply_subst_pat(s, r.pat),
                    guard: r.guard.map(|g| apply_subst_exp(s, g)),
                    exp: apply_subst_exp(s, r.exp),
                })
                .collect(),
        },
        TypeMatch { exp, rules } => TypeMatch {
            exp: bx(s, exp),
            rules: rules
                .into_iter()
                .map(|r| t::TypeMatchRule {
                    sym: r.sym,
                    tpe: s.apply(&r.tpe),
                    exp: apply_subst_exp(s, r.exp),
                })
                .collect(),
        },
        Tag {
            enum_sym,
            case_sym,
            exp,
        } => Tag {
            enum_sym,
            case_sym,
            exp: exp.map(|e| bx(s, e)),
        },
        Tuple { exps } => Tuple { exps: many(s, exps) },
        RecordEmpty => RecordEmpty,
        RecordSelect { exp, label } => RecordSelect {
            exp: bx(s, exp),
            label,
        },
        RecordExtend { label, value, rest } => RecordExtend {
            label,
            value: bx(s, value),
            rest: bx(s, rest),
        },
        RecordRestrict { label, rest } => RecordRestrict {
            label,
            rest: bx(s, rest),
        },
        ArrayLit { exps, region } => ArrayLit {
            exps: many(s, exps),
            region: bx(s, region),
        },
        ArrayNew { elm, len, region } => ArrayNew {
            elm: bx(s, elm),
            len: bx(s, len),
            region: bx(s, region),
        },
        ArrayLoad { base, index } => ArrayLoad {
            base: bx(s, base),
            index: bx(s, index),
        },
        ArrayStore { base, index, elm } => ArrayStore {
            base: bx(s, base),
            index: bx(s, index),
            elm: bx(s, elm),
        },
        ArrayLength { base } => ArrayLength { base: bx(s, base) },
        VectorLit { exps } => VectorLit { exps: many(s, exps) },
        VectorLoad { base, index } => VectorLoad {
            base: bx(s, base),
            index: bx(s, index),
        },
        VectorLength { base } => VectorLength { base: bx(s, base) },
        Ref { exp, region } => Ref {
            exp: bx(s, exp),
            region: bx(s, region),
        },
        Deref { exp } => Deref { exp: bx(s, exp) },
        Assign { exp1, exp2 } => Assign {
            exp1: bx(s, exp1),
            exp2: bx(s, exp2),
        },
        Ascribe { exp } => Ascribe { exp: bx(s, exp) },
        CheckedTypeCast { exp } => CheckedTypeCast { exp: bx(s, exp) },
        CheckedEffectCast { exp } => CheckedEffectCast { exp: bx(s, exp) },
        UncheckedCast {
            exp,
            declared_tpe,
            declared_eff,
        } => UncheckedCast {
            exp: bx(s, exp),
            declared_tpe: declared_tpe.map(|t0| s.apply(&t0)),
            declared_eff: declared_eff.map(|e0| s.apply(&e0)),
        },
        Without { exp, eff } => Without {
            exp: bx(s, exp),
            eff,
        },
        TryCatch { exp, rules } => TryCatch {
            exp: bx(s, exp),
            rules: rules
                .into_iter()
                .map(|r| t::CatchRule {
                    sym: r.sym,
                    class: r.class,
                    exp: apply_subst_exp(s, r.exp),
                })
                .collect(),
        },
        TryWith { exp, eff, rules } => TryWith {
            exp: bx(s, exp),
            eff,
            rules: rules
                .into_iter()
                .map(|r| t::HandlerRule {
                    op: r.op,
                    fparams: r.fparams.into_iter().map(|fp| fparam(s, fp)).collect(),
                    exp: apply_subst_exp(s, r.exp),
                })
                .collect(),
        },
        Do { op, args } => Do {
            op,
            args: many(s, args),
        },
        NewChannel { region, capacity } => NewChannel {
            region: bx(s, region),
            capacity: bx(s, capacity),
        },
        GetChannel { exp } => GetChannel { exp: bx(s, exp) },
        PutChannel { exp1, exp2 } => PutChannel {
            exp1: bx(s, exp1),
            exp2: bx(s, exp2),
        },
        SelectChannel { rules, default } => SelectChannel {
            rules: rules
                .into_iter()
                .map(|r| t::SelectChannelRule {
                    sym: r.sym,
                    chan: apply_subst_exp(s, r.chan),
                    exp: apply_subst_exp(s, r.exp),
                })
                .collect(),
            default: default.map(|d| bx(s, d)),
        },
        Spawn { exp, region } => Spawn {
            exp: bx(s, exp),
            region: bx(s, region),
        },
        Lazy { exp } => Lazy { exp: bx(s, exp) },
        Force { exp } => Force { exp: bx(s, exp) },
        InvokeConstructor { class, args } => InvokeConstructor {
            class,
            args: many(s, args),
        },
        InvokeMethod {
            method,
            receiver,
            args,
        } => InvokeMethod {
            method,
            receiver: bx(s, receiver),
            args: many(s, args),
        },
        InvokeStaticMethod { method, args } => InvokeStaticMethod {
            method,
            args: many(s, args),
        },
        GetField { field, receiver } => GetField {
            field,
            receiver: bx(s, receiver),
        },
        PutField {
            field,
            receiver,
            value,
        } => PutField {
            field,
            receiver: bx(s, receiver),
            value: bx(s, value),
        },
        GetStaticField { field } => GetStaticField { field },
        PutStaticField { field, value } => PutStaticField {
            field,
            value: bx(s, value),
        },
        FixpointConstraintSet { constraints } => FixpointConstraintSet {
            constraints: constraints
                .into_iter()
                .map(|c| apply_subst_constraint(s, c))
                .collect(),
        },
        FixpointMerge { exp1, exp2 } => FixpointMerge {
            exp1: bx(s, exp1),
            exp2: bx(s, exp2),
        },
        FixpointSolve { exp } => FixpointSolve { exp: bx(s, exp) },
        FixpointFilter { pred, exp } => FixpointFilter {
            pred,
            exp: bx(s, exp),
        },
        FixpointInject { exp, pred } => FixpointInject {
            exp: bx(s, exp),
            pred,
        },
        FixpointProject { pred, exp } => FixpointProject {
            pred,
            exp: bx(s, exp),
        },
        Error => Error,
    }
}

fn apply_subst_constraint(s: &Substitution, c: t::FixConstraint) -> t::FixConstraint {
    t::FixConstraint {
        head: t::HeadPredicate {
            pred: c.head.pred,
            den: c.head.den,
            terms: many(s, c.head.terms),
            loc: c.head.loc,
        },
        body: c
            .body
            .into_iter()
            .map(|b| match b {
                t::BodyPredicate::Atom {
                    pred,
                    den,
                    polarity,
                    terms,
                    loc,
                } => t::BodyPredicate::Atom {
                    pred,
                    den,
                    polarity,
                    terms: terms.into_iter().map(|p| apply_subst_pat(s, p)).collect(),
                    loc,
                },
                t::BodyPredicate::Guard { exp, loc } => t::BodyPredicate::Guard {
                    exp: apply_subst_exp(s, exp),
                    loc,
                },
            })
            .collect(),
        loc: c.loc,
    }
}

pub fn apply_subst_pat(s: &Substitution, pat: t::Pattern) -> t::Pattern {
    let kind = match pat.kind {
        t::PatternKind::Wild => t::PatternKind::Wild,
        t::PatternKind::Var(sym) => t::PatternKind::Var(sym),
        t::PatternKind::Cst(lit) => t::PatternKind::Cst(lit),
        t::PatternKind::Tag {
            enum_sym,
            case_sym,
            pat: inner,
        } => t::PatternKind::Tag {
            enum_sym,
            case_sym,
            pat: inner.map(|p| Box::new(apply_subst_pat(s, *p))),
        },
        t::PatternKind::Tuple(pats) => t::PatternKind::Tuple(
            pats.into_iter().map(|p| apply_subst_pat(s, p)).collect(),
        ),
        t::PatternKind::Record { fields, rest } => t::PatternKind::Record {
            fields: fields
                .into_iter()
                .map(|(l, p)| (l, apply_subst_pat(s, p)))
                .collect(),
            rest: Box::new(apply_subst_pat(s, *rest)),
        },
    };
    t::Pattern {
        kind,
        tpe: s.apply(&pat.tpe),
        loc: pat.loc,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::shared::{Literal, Span};
    use crate::types::kind::Kind;
    use crate::types::var::fresh_type_var;
    use crate::types::Type;

    #[test]
    fn test_apply_resolves_node_types() {
        let v = fresh_type_var(Kind::Star);
        let exp = t::Expr {
            kind: t::ExprKind::Cst(Literal::Int32(1)),
            tpe: Type::Var(v.clone()),
            eff: Type::pure(),
            loc: Span::dummy(),
        };
        let s = Substitution::singleton(&v, Type::int32());
        let out = apply_subst_exp(&s, exp);
        assert_eq!(out.tpe, Type::int32());
    }

    #[test]
    fn test_apply_reaches_nested_nodes() {
        let v = fresh_type_var(Kind::Star);
        let inner = t::Expr {
            kind: t::ExprKind::Cst(Literal::Bool(true)),
            tpe: Type::Var(v.clone()),
            eff: Type::pure(),
            loc: Span::dummy(),
        };
        let outer = t::Expr {
            kind: t::ExprKind::Discard {
                exp: Box::new(inner),
            },
            tpe: Type::unit(),
            eff: Type::pure(),
            loc: Span::dummy(),
        };
        let s = Substitution::singleton(&v, Type::bool());
        let out = apply_subst_exp(&s, outer);
        match out.kind {
            t::ExprKind::Discard { exp } => assert_eq!(exp.tpe, Type::bool()),
            _ => panic!("shape changed"),
        }
    }
}
