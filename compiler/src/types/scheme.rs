//! Type schemes and constraints
//!
//! A scheme `∀ q1 .. qn . C => T` is the unit of generalization: the
//! closed polymorphic type of a top-level declaration. Its constraint
//! list mixes trait constraints (`Eq[a]`) and equality constraints over
//! associated types (`Elm[a] ~ Int32`).

use std::collections::BTreeSet;
use std::fmt;

use crate::ast::shared::{AssocTypeSym, Span, TraitSym};

use super::var::TypeVarSym;
use super::Type;

// ============================================================================
// Constraints
// ============================================================================

/// A trait constraint: the type `arg` is an instance of the trait `sym`.
#[derive(Debug, Clone, PartialEq)]
pub struct TraitConstraint {
    pub sym: TraitSym,
    pub arg: Type,
    /// Where the constraint was introduced, for diagnostics.
    pub loc: Span,
}

impl TraitConstraint {
    pub fn new(sym: TraitSym, arg: Type, loc: Span) -> Self {
        Self { sym, arg, loc }
    }
}

impl fmt::Display for TraitConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.sym, self.arg)
    }
}

/// An equality constraint over an associated type:
/// `sym[arg] ~ tpe`.
#[derive(Debug, Clone, PartialEq)]
pub struct EqualityConstraint {
    pub sym: AssocTypeSym,
    pub arg: Type,
    pub tpe: Type,
    pub loc: Span,
}

impl fmt::Display for EqualityConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}] ~ {}", self.sym, self.arg, self.tpe)
    }
}

// ============================================================================
// Schemes
// ============================================================================

/// A polymorphic type scheme.
#[derive(Debug, Clone, PartialEq)]
pub struct Scheme {
    /// Quantified variables, in deterministic (identity) order.
    pub quantifiers: Vec<TypeVarSym>,
    pub tconstrs: Vec<TraitConstraint>,
    pub econstrs: Vec<EqualityConstraint>,
    pub base: Type,
}

impl Scheme {
    /// A scheme with no quantifiers and no constraints.
    pub fn mono(base: Type) -> Self {
        Self {
            quantifiers: Vec::new(),
            tconstrs: Vec::new(),
            econstrs: Vec::new(),
            base,
        }
    }

    pub fn new(
        quantifiers: Vec<TypeVarSym>,
        tconstrs: Vec<TraitConstraint>,
        econstrs: Vec<EqualityConstraint>,
        base: Type,
    ) -> Self {
        Self {
            quantifiers,
            tconstrs,
            econstrs,
            base,
        }
    }

    pub fn is_mono(&self) -> bool {
        self.quantifiers.is_empty()
    }

    /// Free (unquantified) variables of the scheme.
    pub fn free_vars(&self) -> BTreeSet<TypeVarSym> {
        let mut acc = self.base.type_vars();
        for c in &self.tconstrs {
            acc.extend(c.arg.type_vars());
        }
        for c in &self.econstrs {
            acc.extend(c.arg.type_vars());
            acc.extend(c.tpe.type_vars());
        }
        for q in &self.quantifiers {
            acc.remove(q);
        }
        acc
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.quantifiers.is_empty() {
            write!(f, "∀")?;
            for (i, q) in self.quantifiers.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", q)?;
            }
            write!(f, ". ")?;
        }
        let n = self.tconstrs.len() + self.econstrs.len();
        if n > 0 {
            let mut first = true;
            for c in &self.tconstrs {
                if !first {
                    write!(f, ", ")?;
                }
                write!(f, "{}", c)?;
                first = false;
            }
            for c in &self.econstrs {
                if !first {
                    write!(f, ", ")?;
                }
                write!(f, "{}", c)?;
                first = false;
            }
            write!(f, " => ")?;
        }
        write!(f, "{}", self.base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::kind::Kind;
    use crate::types::var::fresh_named_type_var;

    #[test]
    fn test_free_vars_exclude_quantifiers() {
        let a = fresh_named_type_var("a", Kind::Star);
        let b = fresh_named_type_var("b", Kind::Star);
        let base = Type::mk_arrow(
            vec![Type::Var(a.clone())],
            Type::pure(),
            Type::Var(b.clone()),
        );
        let sc = Scheme::new(vec![a], Vec::new(), Vec::new(), base);
        let free = sc.free_vars();
        assert!(free.contains(&b));
        assert_eq!(free.len(), 1);
    }

    #[test]
    fn test_display() {
        let a = fresh_named_type_var("a", Kind::Star);
        let sc = Scheme::new(
            vec![a.clone()],
            vec![TraitConstraint::new(
                TraitSym::new(1, "Eq"),
                Type::Var(a.clone()),
                Span::dummy(),
            )],
            Vec::new(),
            Type::mk_arrow(
                vec![Type::Var(a.clone()), Type::Var(a.clone())],
                Type::pure(),
                Type::bool(),
            ),
        );
        assert_eq!(sc.to_string(), "∀a. Eq[a] => (a, a) -> Bool");
    }
}
