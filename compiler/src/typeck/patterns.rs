//! Pattern inference
//!
//! A pattern produces the type of the values it matches and binds the
//! type variables of its variables by unification. The produced type is
//! unified with the scrutinee type at the match site.

use crate::ast::kinded as k;
use crate::ast::shared::Literal;
use crate::ast::typed as t;
use crate::types::kind::Kind;
use crate::types::subst::Substitution;
use crate::types::{Type, TypeCtor};

use super::errors::TypeError;
use super::infer::InferCtx;

/// The primitive type of a literal constant.
pub(crate) fn literal_type(lit: &Literal) -> Type {
    let ctor = match lit {
        Literal::Unit => TypeCtor::Unit,
        Literal::Null => TypeCtor::Null,
        Literal::Bool(_) => TypeCtor::Bool,
        Literal::Char(_) => TypeCtor::Char,
        Literal::Int8(_) => TypeCtor::Int8,
        Literal::Int16(_) => TypeCtor::Int16,
        Literal::Int32(_) => TypeCtor::Int32,
        Literal::Int64(_) => TypeCtor::Int64,
        Literal::Float32(_) => TypeCtor::Float32,
        Literal::Float64(_) => TypeCtor::Float64,
        Literal::BigInt(_) => TypeCtor::BigInt,
        Literal::BigDecimal(_) => TypeCtor::BigDecimal,
        Literal::Str(_) => TypeCtor::Str,
        Literal::Regex(_) => TypeCtor::Regex,
    };
    Type::Cst(ctor)
}

/// Infer a pattern, unifying its node variable with the derived type.
pub fn infer_pattern(ctx: &mut InferCtx<'_>, pat: &k::Pattern) -> Result<t::Pattern, TypeError> {
    let loc = pat.loc;
    let node_tpe = Type::Var(pat.tvar.clone());
    let kind = match &pat.kind {
        k::PatternKind::Wild => t::PatternKind::Wild,

        k::PatternKind::Var(sym) => {
            ctx.unify(&Type::Var(sym.tvar.clone()), &node_tpe, loc)?;
            t::PatternKind::Var(sym.clone())
        }

        k::PatternKind::Cst(lit) => {
            ctx.unify(&node_tpe, &literal_type(lit), loc)?;
            t::PatternKind::Cst(lit.clone())
        }

        k::PatternKind::Tag {
            enum_sym,
            case_sym,
            pat: inner,
        } => {
            let (enum_tpe, payload_tpe) = instantiate_case(ctx, enum_sym, case_sym, loc)?;
            let inner_typed = match inner {
                Some(p) => {
                    let payload = payload_tpe.ok_or_else(|| TypeError::InternalError {
                        message: format!("case '{}' has no payload", case_sym),
                        loc,
                    })?;
                    let tp = infer_pattern(ctx, p)?;
                    ctx.unify(&tp.tpe, &payload, loc)?;
                    Some(Box::new(tp))
                }
                None => None,
            };
            ctx.unify(&node_tpe, &enum_tpe, loc)?;
            t::PatternKind::Tag {
                enum_sym: enum_sym.clone(),
                case_sym: case_sym.clone(),
                pat: inner_typed,
            }
        }

        k::PatternKind::Tuple(pats) => {
            let mut typed = Vec::with_capacity(pats.len());
            for p in pats {
                typed.push(infer_pattern(ctx, p)?);
            }
            let tpe = Type::mk_tuple(typed.iter().map(|p| p.tpe.clone()).collect());
            ctx.unify(&node_tpe, &tpe, loc)?;
            t::PatternKind::Tuple(typed)
        }

        k::PatternKind::Record { fields, rest } => {
            let rest_typed = infer_pattern(ctx, rest)?;
            let tail = ctx.fresh_var(Kind::RecordRow);
            ctx.unify(&rest_typed.tpe, &Type::mk_record(tail.clone()), loc)?;
            let mut typed_fields = Vec::with_capacity(fields.len());
            let mut row = tail;
            for (label, p) in fields.iter().rev() {
                let tp = infer_pattern(ctx, p)?;
                row = Type::mk_record_row_extend(label.clone(), tp.tpe.clone(), row);
                typed_fields.push((label.clone(), tp));
            }
            typed_fields.reverse();
            ctx.unify(&node_tpe, &Type::mk_record(row), loc)?;
            t::PatternKind::Record {
                fields: typed_fields,
                rest: Box::new(rest_typed),
            }
        }
    };

    Ok(t::Pattern {
        kind,
        tpe: node_tpe,
        loc,
    })
}

/// Instantiate an enum case: fresh variables for the enum's type
/// parameters, the applied enum type, and the case's payload type under
/// the same instantiation.
pub(crate) fn instantiate_case(
    ctx: &mut InferCtx<'_>,
    enum_sym: &crate::ast::shared::EnumSym,
    case_sym: &crate::ast::shared::CaseSym,
    loc: crate::ast::shared::Span,
) -> Result<(Type, Option<Type>), TypeError> {
    let decl = ctx
        .snapshot
        .enum_decl(enum_sym)
        .ok_or_else(|| TypeError::InternalError {
            message: format!("unresolved enum symbol '{}'", enum_sym),
            loc,
        })?;
    let case = decl
        .cases
        .get(case_sym)
        .ok_or_else(|| TypeError::InternalError {
            message: format!("unresolved case symbol '{}'", case_sym),
            loc,
        })?;

    let mut subst = Substitution::empty();
    let mut args = Vec::with_capacity(decl.tparams.len());
    for tp in &decl.tparams {
        let fresh = ctx.fresh_var(tp.kind.clone());
        subst.insert(tp, fresh.clone());
        args.push(fresh);
    }
    let enum_tpe = Type::mk_enum(enum_sym.clone(), decl.kind(), args);
    let payload = case.payload.as_ref().map(|p| subst.apply(p));
    Ok((enum_tpe, payload))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::kinded::Root;
    use crate::ast::shared::{Span, VarSym};
    use crate::typeck::context::ContextSnapshot;
    use crate::typeck::CheckerConfig;
    use crate::types::var::fresh_type_var;

    fn pat(kind: k::PatternKind) -> k::Pattern {
        k::Pattern {
            kind,
            tvar: fresh_type_var(Kind::Star),
            loc: Span::dummy(),
        }
    }

    #[test]
    fn test_literal_pattern() {
        let root = Root::default();
        let config = CheckerConfig::default();
        let snapshot = ContextSnapshot::new(&root, &config);
        let mut ctx = InferCtx::new(&snapshot);
        let p = pat(k::PatternKind::Cst(Literal::Int32(42)));
        let tp = infer_pattern(&mut ctx, &p).unwrap();
        assert_eq!(ctx.apply(&tp.tpe), Type::int32());
    }

    #[test]
    fn test_var_pattern_binds() {
        let root = Root::default();
        let config = CheckerConfig::default();
        let snapshot = ContextSnapshot::new(&root, &config);
        let mut ctx = InferCtx::new(&snapshot);
        let v = VarSym::new(1, "x", fresh_type_var(Kind::Star));
        let p = pat(k::PatternKind::Var(v.clone()));
        let tp = infer_pattern(&mut ctx, &p).unwrap();
        // Scrutinee side fixes the variable's type.
        ctx.unify(&tp.tpe, &Type::bool(), Span::dummy()).unwrap();
        assert_eq!(ctx.apply(&Type::Var(v.tvar)), Type::bool());
    }

    #[test]
    fn test_tuple_pattern() {
        let root = Root::default();
        let config = CheckerConfig::default();
        let snapshot = ContextSnapshot::new(&root, &config);
        let mut ctx = InferCtx::new(&snapshot);
        let p = pat(k::PatternKind::Tuple(vec![
            pat(k::PatternKind::Cst(Literal::Int32(1))),
            pat(k::PatternKind::Wild),
        ]));
        let tp = infer_pattern(&mut ctx, &p).unwrap();
        let applied = ctx.apply(&tp.tpe);
        let (head, args) = applied.spine();
        assert_eq!(head, &Type::Cst(TypeCtor::Tuple(2)));
        assert_eq!(args[0], &Type::int32());
    }
}
