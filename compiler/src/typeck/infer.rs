//! The inference context
//!
//! The stateful heart of a single definition check: the current
//! substitution, the rigidity environment, and the trait and equality
//! constraints accumulated so far. Sequencing is ordinary Rust control
//! flow; failure is a `Result` propagated with `?`, and rigidification
//! is monotonic so no scoped undo exists.

use tracing::trace;

use crate::ast::shared::Span;
use crate::types::kind::Kind;
use crate::types::scheme::{EqualityConstraint, TraitConstraint};
use crate::types::subst::Substitution;
use crate::types::var::{fresh_type_var, RigidityEnv, TypeVarSym};
use crate::types::Type;

use super::context::ContextSnapshot;
use super::errors::TypeError;
use super::unify::unify_types_budgeted;

/// Per-definition inference state.
pub struct InferCtx<'a> {
    pub snapshot: &'a ContextSnapshot<'a>,
    pub subst: Substitution,
    pub renv: RigidityEnv,
    pub tconstrs: Vec<TraitConstraint>,
    pub econstrs: Vec<EqualityConstraint>,
}

impl<'a> InferCtx<'a> {
    pub fn new(snapshot: &'a ContextSnapshot<'a>) -> Self {
        Self {
            snapshot,
            subst: Substitution::empty(),
            renv: RigidityEnv::new(),
            tconstrs: Vec::new(),
            econstrs: Vec::new(),
        }
    }

    // ------------------------------------------------------------------------
    // Variables
    // ------------------------------------------------------------------------

    pub fn fresh_var(&self, kind: Kind) -> Type {
        Type::Var(fresh_type_var(kind))
    }

    pub fn fresh_star(&self) -> Type {
        self.fresh_var(Kind::Star)
    }

    pub fn fresh_eff(&self) -> Type {
        self.fresh_var(Kind::Bool)
    }

    /// Mark a variable universally quantified for the rest of this check.
    pub fn rigidify(&mut self, var: &TypeVarSym) {
        self.renv.rigidify(var);
    }

    // ------------------------------------------------------------------------
    // Goals
    // ------------------------------------------------------------------------

    /// Emit and immediately solve the goal `t1 ≡ t2 @ loc`, folding the
    /// resulting unifier into the ambient substitution.
    pub fn unify(&mut self, t1: &Type, t2: &Type, loc: Span) -> Result<(), TypeError> {
        let a = self.subst.apply(t1);
        let b = self.subst.apply(t2);
        match unify_types_budgeted(&a, &b, &self.renv, self.snapshot.config.max_effect_atoms) {
            Ok(s) => {
                if !s.is_empty() {
                    self.subst = s.compose(&self.subst);
                }
                Ok(())
            }
            Err(err) => {
                trace!(t1 = %a, t2 = %b, "unification failed");
                Err(TypeError::from_unification(err, loc))
            }
        }
    }

    /// Like `unify`, but the first operand is a declared expectation and
    /// head mismatches are phrased expected-versus-actual.
    pub fn expect_type(&mut self, expected: &Type, actual: &Type, loc: Span) -> Result<(), TypeError> {
        let a = self.subst.apply(expected);
        let b = self.subst.apply(actual);
        match unify_types_budgeted(&a, &b, &self.renv, self.snapshot.config.max_effect_atoms) {
            Ok(s) => {
                if !s.is_empty() {
                    self.subst = s.compose(&self.subst);
                }
                Ok(())
            }
            Err(err) => {
                trace!(expected = %a, actual = %b, "expectation failed");
                Err(TypeError::from_expectation(err, &a, &b, loc))
            }
        }
    }

    /// Unify the types of a list of arguments against declared parameter
    /// types pairwise, each at the argument's own location.
    pub fn expect_types(
        &mut self,
        expected: &[Type],
        actuals: &[(Type, Span)],
    ) -> Result<(), TypeError> {
        for (exp, (act, loc)) in expected.iter().zip(actuals.iter()) {
            self.expect_type(exp, act, *loc)?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Constraints
    // ------------------------------------------------------------------------

    pub fn add_tconstrs(&mut self, cs: impl IntoIterator<Item = TraitConstraint>) {
        self.tconstrs.extend(cs);
    }

    pub fn add_econstrs(&mut self, cs: impl IntoIterator<Item = EqualityConstraint>) {
        self.econstrs.extend(cs);
    }

    /// The ambient substitution applied to a type.
    pub fn apply(&self, tpe: &Type) -> Type {
        self.subst.apply(tpe)
    }
}
