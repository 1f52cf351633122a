//! Type errors
//!
//! Every failure of the checker is a value of `TypeError`. Errors carry a
//! source span and a stable code for tooling; rendering beyond `Display`
//! lives in the `diagnostics` module. Errors never abort the phase; they
//! accumulate per definition and are sorted by location before surfacing.

use std::fmt;

use crate::ast::shared::{DefnSym, Label, OpSym, PredSym, Span, TraitSym};
use crate::types::kind::Kind;
use crate::types::scheme::{Scheme, TraitConstraint};
use crate::types::var::TypeVarSym;
use crate::types::Type;

// ============================================================================
// Unification errors
// ============================================================================

/// A failure internal to the unifier, not yet located.
#[derive(Debug, Clone, PartialEq)]
pub enum UnificationError {
    /// The two types have incompatible heads.
    Mismatch(Type, Type),
    /// Binding would create an infinite type.
    OccursCheck(TypeVarSym, Type),
    /// A rigid variable would have to be bound.
    RigidVar(TypeVarSym, Type),
    /// The operands have different kinds.
    KindMismatch(Kind, Kind),
    /// A closed record row lacks a required label.
    MissingLabel(Label, Type),
    /// A closed schema row lacks a required predicate.
    MissingPredicate(PredSym, Type),
    /// The Boolean effect equation has no solution.
    BooleanUnsat(Type),
    /// The effect formula exceeded the atom budget.
    TooComplex(usize),
}

// ============================================================================
// Type errors
// ============================================================================

/// A located error produced by type inference or constraint resolution.
#[derive(Debug, Clone)]
pub enum TypeError {
    // --- unification ---
    Mismatch {
        t1: Type,
        t2: Type,
        loc: Span,
    },
    /// Asymmetric variant used where one side is the declared expectation.
    UnexpectedType {
        expected: Type,
        actual: Type,
        loc: Span,
    },
    OccursCheck {
        var: TypeVarSym,
        tpe: Type,
        loc: Span,
    },
    KindMismatch {
        k1: Kind,
        k2: Kind,
        loc: Span,
    },
    MissingLabel {
        label: Label,
        row: Type,
        loc: Span,
    },
    MissingPredicate {
        pred: PredSym,
        row: Type,
        loc: Span,
    },
    BooleanUnsat {
        eff: Type,
        loc: Span,
    },
    TooComplexEffect {
        atoms: usize,
        loc: Span,
    },

    // --- constraint resolution ---
    MissingInstance {
        sym: TraitSym,
        tpe: Type,
        loc: Span,
    },
    MissingEq {
        tpe: Type,
        loc: Span,
    },
    MissingOrder {
        tpe: Type,
        loc: Span,
    },
    MissingToString {
        tpe: Type,
        loc: Span,
    },
    MissingSendable {
        tpe: Type,
        loc: Span,
    },
    MissingArrowInstance {
        sym: TraitSym,
        tpe: Type,
        loc: Span,
    },
    RedundantTraitConstraint {
        constraint: TraitConstraint,
        loc: Span,
    },

    // --- effects ---
    ImpureDeclaredAsPure {
        inferred: Type,
        loc: Span,
    },
    EffectPolymorphicDeclaredAsPure {
        inferred: Type,
        loc: Span,
    },
    EffectGeneralizationError {
        declared: Type,
        inferred: Type,
        loc: Span,
    },
    RegionEscape {
        rvar: TypeVarSym,
        tpe: Type,
        loc: Span,
    },

    // --- operation signatures ---
    InvalidOpParamCount {
        op: OpSym,
        expected: usize,
        actual: usize,
        loc: Span,
    },

    // --- generalization ---
    GeneralizationError {
        declared: Scheme,
        inferred: Scheme,
        loc: Span,
    },

    // --- entry point ---
    IllegalEntryPointSignature {
        sym: DefnSym,
        scheme: Scheme,
        loc: Span,
    },

    /// An invariant of the input tree was broken; indicates a bug in an
    /// earlier phase, not in user code.
    InternalError {
        message: String,
        loc: Span,
    },
}

impl TypeError {
    /// Locate a symmetric unification failure.
    pub fn from_unification(err: UnificationError, loc: Span) -> TypeError {
        match err {
            UnificationError::Mismatch(t1, t2) => TypeError::Mismatch { t1, t2, loc },
            UnificationError::RigidVar(var, tpe) => TypeError::Mismatch {
                t1: Type::Var(var),
                t2: tpe,
                loc,
            },
            UnificationError::OccursCheck(var, tpe) => TypeError::OccursCheck { var, tpe, loc },
            UnificationError::KindMismatch(k1, k2) => TypeError::KindMismatch { k1, k2, loc },
            UnificationError::MissingLabel(label, row) => {
                TypeError::MissingLabel { label, row, loc }
            }
            UnificationError::MissingPredicate(pred, row) => {
                TypeError::MissingPredicate { pred, row, loc }
            }
            UnificationError::BooleanUnsat(eff) => TypeError::BooleanUnsat { eff, loc },
            UnificationError::TooComplex(atoms) => TypeError::TooComplexEffect { atoms, loc },
        }
    }

    /// Locate a failure of `expect_type`, phrasing head mismatches as
    /// expected-versus-actual.
    pub fn from_expectation(
        err: UnificationError,
        expected: &Type,
        actual: &Type,
        loc: Span,
    ) -> TypeError {
        match err {
            UnificationError::Mismatch(_, _) | UnificationError::RigidVar(_, _) => {
                TypeError::UnexpectedType {
                    expected: expected.clone(),
                    actual: actual.clone(),
                    loc,
                }
            }
            other => TypeError::from_unification(other, loc),
        }
    }

    /// The source span of the error.
    pub fn span(&self) -> Span {
        match self {
            TypeError::Mismatch { loc, .. }
            | TypeError::UnexpectedType { loc, .. }
            | TypeError::OccursCheck { loc, .. }
            | TypeError::KindMismatch { loc, .. }
            | TypeError::MissingLabel { loc, .. }
            | TypeError::MissingPredicate { loc, .. }
            | TypeError::BooleanUnsat { loc, .. }
            | TypeError::TooComplexEffect { loc, .. }
            | TypeError::MissingInstance { loc, .. }
            | TypeError::MissingEq { loc, .. }
            | TypeError::MissingOrder { loc, .. }
            | TypeError::MissingToString { loc, .. }
            | TypeError::MissingSendable { loc, .. }
            | TypeError::MissingArrowInstance { loc, .. }
            | TypeError::RedundantTraitConstraint { loc, .. }
            | TypeError::ImpureDeclaredAsPure { loc, .. }
            | TypeError::EffectPolymorphicDeclaredAsPure { loc, .. }
            | TypeError::EffectGeneralizationError { loc, .. }
            | TypeError::RegionEscape { loc, .. }
            | TypeError::InvalidOpParamCount { loc, .. }
            | TypeError::GeneralizationError { loc, .. }
            | TypeError::IllegalEntryPointSignature { loc, .. }
            | TypeError::InternalError { loc, .. } => *loc,
        }
    }

    /// A stable error code for tooling.
    pub fn code(&self) -> &'static str {
        match self {
            TypeError::Mismatch { .. } => "E2001",
            TypeError::UnexpectedType { .. } => "E2002",
            TypeError::OccursCheck { .. } => "E2003",
            TypeError::KindMismatch { .. } => "E2004",
            TypeError::MissingLabel { .. } => "E2005",
            TypeError::MissingPredicate { .. } => "E2006",
            TypeError::BooleanUnsat { .. } => "E2007",
            TypeError::TooComplexEffect { .. } => "E2008",
            TypeError::MissingInstance { .. } => "E2010",
            TypeError::MissingEq { .. } => "E2011",
            TypeError::MissingOrder { .. } => "E2012",
            TypeError::MissingToString { .. } => "E2013",
            TypeError::MissingSendable { .. } => "E2014",
            TypeError::MissingArrowInstance { .. } => "E2015",
            TypeError::RedundantTraitConstraint { .. } => "E2016",
            TypeError::ImpureDeclaredAsPure { .. } => "E2020",
            TypeError::EffectPolymorphicDeclaredAsPure { .. } => "E2021",
            TypeError::EffectGeneralizationError { .. } => "E2022",
            TypeError::RegionEscape { .. } => "E2023",
            TypeError::InvalidOpParamCount { .. } => "E2030",
            TypeError::GeneralizationError { .. } => "E2040",
            TypeError::IllegalEntryPointSignature { .. } => "E2050",
            TypeError::InternalError { .. } => "E2999",
        }
    }

    /// One-line description.
    pub fn message(&self) -> String {
        match self {
            TypeError::Mismatch { t1, t2, .. } => {
                format!("unable to unify the types '{}' and '{}'", t1, t2)
            }
            TypeError::UnexpectedType {
                expected, actual, ..
            } => format!("expected type '{}', found '{}'", expected, actual),
            TypeError::OccursCheck { var, tpe, .. } => {
                format!("infinite type: '{}' occurs in '{}'", var, tpe)
            }
            TypeError::KindMismatch { k1, k2, .. } => {
                format!("kind mismatch: '{}' versus '{}'", k1, k2)
            }
            TypeError::MissingLabel { label, row, .. } => {
                format!("the record '{}' has no field '{}'", row, label)
            }
            TypeError::MissingPredicate { pred, row, .. } => {
                format!("the schema '{}' has no predicate '{}'", row, pred)
            }
            TypeError::BooleanUnsat { eff, .. } => {
                format!("unable to solve the effect equation '{} ~ Pure'", eff)
            }
            TypeError::TooComplexEffect { atoms, .. } => format!(
                "the effect formula is too complex to solve ({} atoms)",
                atoms
            ),
            TypeError::MissingInstance { sym, tpe, .. } => {
                format!("no instance of trait '{}' for the type '{}'", sym, tpe)
            }
            TypeError::MissingEq { tpe, .. } => format!(
                "the type '{}' does not support equality; add an 'Eq' constraint or instance",
                tpe
            ),
            TypeError::MissingOrder { tpe, .. } => format!(
                "the type '{}' does not support ordering; add an 'Order' constraint or instance",
                tpe
            ),
            TypeError::MissingToString { tpe, .. } => format!(
                "the type '{}' cannot be converted to a string; add a 'ToString' constraint or instance",
                tpe
            ),
            TypeError::MissingSendable { tpe, .. } => {
                format!("the type '{}' is not sendable between threads", tpe)
            }
            TypeError::MissingArrowInstance { sym, tpe, .. } => format!(
                "no instance of trait '{}' for the function type '{}'; functions admit no instances",
                sym, tpe
            ),
            TypeError::RedundantTraitConstraint { constraint, .. } => format!(
                "the constraint '{}' is redundant; it is already entailed",
                constraint
            ),
            TypeError::ImpureDeclaredAsPure { inferred, .. } => format!(
                "the definition is declared pure but its body has effect '{}'",
                inferred
            ),
            TypeError::EffectPolymorphicDeclaredAsPure { inferred, .. } => format!(
                "the definition is declared pure but its body is effect polymorphic in '{}'",
                inferred
            ),
            TypeError::EffectGeneralizationError {
                declared, inferred, ..
            } => format!(
                "the inferred effect '{}' does not match the declared effect '{}'",
                inferred, declared
            ),
            TypeError::RegionEscape { rvar, tpe, .. } => format!(
                "the region '{}' escapes its scope through the type '{}'",
                rvar, tpe
            ),
            TypeError::InvalidOpParamCount {
                op,
                expected,
                actual,
                ..
            } => format!(
                "the operation '{}' expects {} parameter(s), found {}",
                op, expected, actual
            ),
            TypeError::GeneralizationError {
                declared, inferred, ..
            } => format!(
                "the declared scheme '{}' is more general than the inferred scheme '{}'",
                declared, inferred
            ),
            TypeError::IllegalEntryPointSignature { sym, scheme, .. } => format!(
                "the entry point '{}' must have type 'Unit -> Unit'; found '{}'",
                sym, scheme
            ),
            TypeError::InternalError { message, .. } => {
                format!("internal error: {}", message)
            }
        }
    }
}

impl fmt::Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code(), self.message())
    }
}

impl std::error::Error for TypeError {}

/// Deterministic surfacing order: by location, then by code.
pub fn sort_errors(errors: &mut Vec<TypeError>) {
    errors.sort_by(|a, b| a.span().cmp(&b.span()).then_with(|| a.code().cmp(b.code())));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_unique() {
        let errs = [
            TypeError::Mismatch {
                t1: Type::int32(),
                t2: Type::bool(),
                loc: Span::dummy(),
            },
            TypeError::OccursCheck {
                var: crate::types::var::fresh_type_var(Kind::Star),
                tpe: Type::int32(),
                loc: Span::dummy(),
            },
            TypeError::MissingEq {
                tpe: Type::int32(),
                loc: Span::dummy(),
            },
        ];
        let mut codes: Vec<_> = errs.iter().map(|e| e.code()).collect();
        codes.dedup();
        assert_eq!(codes.len(), errs.len());
    }

    #[test]
    fn test_sorted_by_location() {
        let s = crate::ast::shared::SourceId(1);
        let mut errs = vec![
            TypeError::Mismatch {
                t1: Type::int32(),
                t2: Type::bool(),
                loc: Span::new(s, 50, 60),
            },
            TypeError::Mismatch {
                t1: Type::int32(),
                t2: Type::bool(),
                loc: Span::new(s, 10, 20),
            },
        ];
        sort_errors(&mut errs);
        assert_eq!(errs[0].span().start, 10);
    }
}
