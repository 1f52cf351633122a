//! Substitutions
//!
//! A substitution is a finite, idempotent map from type-variable
//! identities to types: no variable in its domain occurs in any type in
//! its codomain. The unifier maintains this invariant by applying the
//! ambient substitution before binding and by occurs-checking every
//! binding.

use std::collections::HashMap;
use std::fmt;

use super::scheme::{EqualityConstraint, Scheme, TraitConstraint};
use super::var::TypeVarSym;
use super::Type;

/// An idempotent mapping from type variables to types.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Substitution {
    map: HashMap<u64, Type>,
}

impl Substitution {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn singleton(var: &TypeVarSym, tpe: Type) -> Self {
        let mut map = HashMap::new();
        map.insert(var.id, tpe);
        Self { map }
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn get(&self, var: &TypeVarSym) -> Option<&Type> {
        self.map.get(&var.id)
    }

    /// Does the substitution bind this variable?
    pub fn binds(&self, var: &TypeVarSym) -> bool {
        self.map.contains_key(&var.id)
    }

    /// Insert a binding. The caller is responsible for the idempotence
    /// invariant (bind only after applying `self` to `tpe`).
    pub fn insert(&mut self, var: &TypeVarSym, tpe: Type) {
        self.map.insert(var.id, tpe);
    }

    // ------------------------------------------------------------------------
    // Application
    // ------------------------------------------------------------------------

    /// Apply the substitution to a type.
    ///
    /// Sharing is preserved where nothing changes: untouched subtrees are
    /// returned as clones of the original rather than rebuilt.
    pub fn apply(&self, tpe: &Type) -> Type {
        if self.map.is_empty() {
            return tpe.clone();
        }
        match tpe {
            Type::Var(sym) => match self.map.get(&sym.id) {
                Some(t) => t.clone(),
                None => tpe.clone(),
            },
            Type::Cst(_) => tpe.clone(),
            Type::App(t1, t2) => Type::app(self.apply(t1), self.apply(t2)),
            Type::Alias { sym, args, tpe } => Type::Alias {
                sym: sym.clone(),
                args: args.iter().map(|a| self.apply(a)).collect(),
                tpe: Box::new(self.apply(tpe)),
            },
        }
    }

    pub fn apply_tconstr(&self, c: &TraitConstraint) -> TraitConstraint {
        TraitConstraint {
            sym: c.sym.clone(),
            arg: self.apply(&c.arg),
            loc: c.loc,
        }
    }

    pub fn apply_econstr(&self, c: &EqualityConstraint) -> EqualityConstraint {
        EqualityConstraint {
            sym: c.sym.clone(),
            arg: self.apply(&c.arg),
            tpe: self.apply(&c.tpe),
            loc: c.loc,
        }
    }

    /// Apply to a scheme's body and constraints, but never to its
    /// quantified variables. Quantifiers are assumed fresh, so capture
    /// cannot occur; a binding for a quantified variable would be a bug
    /// upstream.
    pub fn apply_scheme(&self, sc: &Scheme) -> Scheme {
        debug_assert!(
            sc.quantifiers.iter().all(|q| !self.map.contains_key(&q.id)),
            "substitution binds a quantified variable"
        );
        Scheme {
            quantifiers: sc.quantifiers.clone(),
            tconstrs: sc.tconstrs.iter().map(|c| self.apply_tconstr(c)).collect(),
            econstrs: sc.econstrs.iter().map(|c| self.apply_econstr(c)).collect(),
            base: self.apply(&sc.base),
        }
    }

    // ------------------------------------------------------------------------
    // Composition
    // ------------------------------------------------------------------------

    /// Compose two substitutions: `s2.compose(s1)` is `s2 ∘ s1`, i.e.
    /// applying the result is applying `s1` first and `s2` second.
    ///
    /// Built by applying `s2` to every type in `s1`'s codomain and then
    /// adding `s2`'s remaining entries. On a key collision `s1`'s binding
    /// wins; collisions do not arise from unifier-produced substitutions.
    pub fn compose(&self, s1: &Substitution) -> Substitution {
        let mut map = HashMap::with_capacity(self.map.len() + s1.map.len());
        for (id, t) in &s1.map {
            map.insert(*id, self.apply(t));
        }
        for (id, t) in &self.map {
            map.entry(*id).or_insert_with(|| t.clone());
        }
        Substitution { map }
    }
}

impl fmt::Display for Substitution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut entries: Vec<_> = self.map.iter().collect();
        entries.sort_by_key(|(id, _)| **id);
        write!(f, "{{")?;
        for (i, (id, t)) in entries.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "t{} -> {}", id, t)?;
        }
        write!(f, "}}")
    }
}
