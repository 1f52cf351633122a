//! Row unification
//!
//! Record and schema rows unify up to permutation of their labeled
//! fields. The algorithm rewrites the right row to bring the left row's
//! first label to the front, inventing a fresh field and tail when the
//! right row is open, then recurses on the remainders. The outcome does
//! not depend on the field order of either input.
//!
//! Duplicate labels are legal (field shadowing); occurrences pair up
//! positionally per label.

use crate::types::kind::Kind;
use crate::types::subst::Substitution;
use crate::types::var::{fresh_type_var, RigidityEnv, TypeVarSym};
use crate::types::{Type, TypeCtor};

use super::errors::UnificationError;
use super::unify::unify_types_budgeted;

/// A row label: a record field or a schema predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
enum RowKey {
    Field(crate::ast::shared::Label),
    Pred(crate::ast::shared::PredSym),
}

impl RowKey {
    /// The kind of a field under this key.
    fn field_kind(&self) -> Kind {
        match self {
            RowKey::Field(_) => Kind::Star,
            RowKey::Pred(_) => Kind::Predicate,
        }
    }

    fn extend(&self, tpe: Type, rest: Type) -> Type {
        match self {
            RowKey::Field(l) => Type::mk_record_row_extend(l.clone(), tpe, rest),
            RowKey::Pred(p) => Type::mk_schema_row_extend(p.clone(), tpe, rest),
        }
    }

    fn missing_error(&self, row: &Type) -> UnificationError {
        match self {
            RowKey::Field(l) => UnificationError::MissingLabel(l.clone(), row.clone()),
            RowKey::Pred(p) => UnificationError::MissingPredicate(p.clone(), row.clone()),
        }
    }
}

/// One level of a row: either empty, a variable tail, or an extension.
enum RowView<'a> {
    Empty,
    Var(&'a TypeVarSym),
    Extend(RowKey, &'a Type, &'a Type),
}

fn view(row: &Type) -> Result<RowView<'_>, UnificationError> {
    if let Type::Alias { tpe, .. } = row {
        return view(tpe);
    }
    if let Type::Var(v) = row {
        return Ok(RowView::Var(v));
    }
    let (head, args) = row.spine();
    match (head, args.as_slice()) {
        (Type::Cst(TypeCtor::RecordRowEmpty), []) | (Type::Cst(TypeCtor::SchemaRowEmpty), []) => {
            Ok(RowView::Empty)
        }
        (Type::Cst(TypeCtor::RecordRowExtend(l)), [tpe, rest]) => {
            Ok(RowView::Extend(RowKey::Field(l.clone()), *tpe, *rest))
        }
        (Type::Cst(TypeCtor::SchemaRowExtend(p)), [tpe, rest]) => {
            Ok(RowView::Extend(RowKey::Pred(p.clone()), *tpe, *rest))
        }
        _ => Err(UnificationError::Mismatch(row.clone(), row.clone())),
    }
}

/// Unify two rows of the same row kind.
pub fn unify_rows(
    row1: &Type,
    row2: &Type,
    renv: &RigidityEnv,
    budget: usize,
) -> Result<Substitution, UnificationError> {
    match view(row1)? {
        RowView::Empty => match view(row2)? {
            RowView::Empty => Ok(Substitution::empty()),
            RowView::Var(v) => bind_row_var(v, row1, renv),
            RowView::Extend(key, _, _) => Err(key.missing_error(row1)),
        },
        RowView::Var(v1) => match view(row2)? {
            RowView::Var(v2) if v1 == v2 => Ok(Substitution::empty()),
            _ => bind_row_var(v1, row2, renv).or_else(|e| match view(row2)? {
                // Maybe the other side is the flexible one.
                RowView::Var(v2) if renv.is_flexible(v2) => bind_row_var(v2, row1, renv),
                _ => Err(e),
            }),
        },
        RowView::Extend(key, tpe1, rest1) => match view(row2)? {
            RowView::Var(v2) => bind_row_var(v2, row1, renv),
            RowView::Empty => Err(key.missing_error(row2)),
            RowView::Extend(_, _, _) => {
                // Bring `key` to the front of row2, then unify pointwise.
                let (tpe2, rest2, s0) = rewrite_row(row2, &key, renv)?;
                let s1 = unify_types_budgeted(&s0.apply(tpe1), &s0.apply(&tpe2), renv, budget)?;
                let acc = s1.compose(&s0);
                let s2 = unify_rows(&acc.apply(rest1), &acc.apply(&rest2), renv, budget)?;
                Ok(s2.compose(&acc))
            }
        },
    }
}

fn bind_row_var(
    v: &TypeVarSym,
    row: &Type,
    renv: &RigidityEnv,
) -> Result<Substitution, UnificationError> {
    if renv.is_rigid(v) {
        return Err(UnificationError::RigidVar(v.clone(), row.clone()));
    }
    if row.contains_var(v) {
        return Err(UnificationError::OccursCheck(v.clone(), row.clone()));
    }
    Ok(Substitution::singleton(v, row.clone()))
}

/// Rewrite `row` so its first field carries `key`. Returns that field's
/// type, the remaining row, and any substitution made along the way
/// (binding an open tail extends it with a fresh field and a fresh tail).
fn rewrite_row(
    row: &Type,
    key: &RowKey,
    renv: &RigidityEnv,
) -> Result<(Type, Type, Substitution), UnificationError> {
    match view(row)? {
        RowView::Extend(key2, tpe2, rest2) if &key2 == key => {
            Ok((tpe2.clone(), rest2.clone(), Substitution::empty()))
        }
        RowView::Extend(key2, tpe2, rest2) => {
            let (found, rest, s) = rewrite_row(rest2, key, renv)?;
            Ok((found, key2.extend(s.apply(tpe2), rest), s))
        }
        RowView::Var(v) => {
            if renv.is_rigid(v) {
                return Err(UnificationError::RigidVar(v.clone(), row.clone()));
            }
            // Open tail: it must contain the sought field plus some rest.
            let field = Type::Var(fresh_type_var(key.field_kind()));
            let tail = Type::Var(fresh_type_var(v.kind.clone()));
            let ext = key.extend(field.clone(), tail.clone());
            Ok((field, tail, Substitution::singleton(v, ext)))
        }
        RowView::Empty => Err(key.missing_error(row)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::shared::Label;
    use crate::types::var::fresh_type_var;

    fn lbl(s: &str) -> Label {
        Label::new(s)
    }

    fn closed(fields: Vec<(&str, Type)>) -> Type {
        fields
            .into_iter()
            .rev()
            .fold(Type::record_row_empty(), |acc, (l, t)| {
                Type::mk_record_row_extend(lbl(l), t, acc)
            })
    }

    fn renv() -> RigidityEnv {
        RigidityEnv::new()
    }

    #[test]
    fn test_permutation_invariant() {
        let r1 = closed(vec![("x", Type::int32()), ("y", Type::bool())]);
        let r2 = closed(vec![("y", Type::bool()), ("x", Type::int32())]);
        let s = unify_rows(&r1, &r2, &renv(), 16).unwrap();
        assert!(s.is_empty() || s.apply(&r1).expand_aliases() == s.apply(&r2).expand_aliases());
    }

    #[test]
    fn test_shared_tail() {
        // { x: Int | r } ~ { x: Int | r' } binds one tail to the other.
        let r = fresh_type_var(Kind::RecordRow);
        let r2 = fresh_type_var(Kind::RecordRow);
        let row1 = Type::mk_record_row_extend(lbl("x"), Type::int32(), Type::Var(r.clone()));
        let row2 = Type::mk_record_row_extend(lbl("x"), Type::int32(), Type::Var(r2.clone()));
        let s = unify_rows(&row1, &row2, &renv(), 16).unwrap();
        assert_eq!(s.apply(&Type::Var(r)), s.apply(&Type::Var(r2)));
    }

    #[test]
    fn test_missing_label_on_closed_row() {
        let r1 = closed(vec![("x", Type::int32())]);
        let r2 = closed(vec![("y", Type::int32())]);
        let e = unify_rows(&r1, &r2, &renv(), 16).unwrap_err();
        assert!(matches!(e, UnificationError::MissingLabel(_, _)));
    }

    #[test]
    fn test_open_row_extends() {
        // { x: Int, y: Bool } ~ { y: Bool | r } binds r to { x: Int | ρ }… ρ ~ ().
        let r = fresh_type_var(Kind::RecordRow);
        let r1 = closed(vec![("x", Type::int32()), ("y", Type::bool())]);
        let r2 = Type::mk_record_row_extend(lbl("y"), Type::bool(), Type::Var(r.clone()));
        let s = unify_rows(&r1, &r2, &renv(), 16).unwrap();
        let bound = s.apply(&Type::Var(r));
        match view(&bound).unwrap() {
            RowView::Extend(RowKey::Field(l), t, rest) => {
                assert_eq!(l, lbl("x"));
                assert_eq!(t, &Type::int32());
                assert!(matches!(view(rest).unwrap(), RowView::Empty));
            }
            _ => panic!("tail not extended: {}", bound),
        }
    }

    #[test]
    fn test_field_type_conflict() {
        let r1 = closed(vec![("x", Type::int32())]);
        let r2 = closed(vec![("x", Type::bool())]);
        assert!(unify_rows(&r1, &r2, &renv(), 16).is_err());
    }

    #[test]
    fn test_duplicate_labels_pair_in_order() {
        let r1 = closed(vec![("x", Type::int32()), ("x", Type::bool())]);
        let r2 = closed(vec![("x", Type::int32()), ("x", Type::bool())]);
        assert!(unify_rows(&r1, &r2, &renv(), 16).is_ok());
        let r3 = closed(vec![("x", Type::bool()), ("x", Type::int32())]);
        assert!(unify_rows(&r1, &r3, &renv(), 16).is_err());
    }

    #[test]
    fn test_row_var_occurs() {
        let r = fresh_type_var(Kind::RecordRow);
        let row = Type::mk_record_row_extend(lbl("x"), Type::int32(), Type::Var(r.clone()));
        let e = unify_rows(&Type::Var(r), &row, &renv(), 16).unwrap_err();
        assert!(matches!(e, UnificationError::OccursCheck(_, _)));
    }
}
