//! Boolean formula bridge for the effect algebra
//!
//! The effect unifier works on plain Boolean formulas over an atom table
//! rather than on `Type` trees. Atoms are flexible effect variables,
//! rigid effect variables (including region variables), and named effect
//! constants; rigid atoms and constants are uninterpreted.
//!
//! There is deliberately no standalone minimizer here. Formulas are
//! converted back to types through the normalizing smart constructors on
//! `Type` (`mk_union`, `mk_intersection`, `mk_complement`), and the
//! property-test suite holds a truth-table oracle against the result.

use std::collections::BTreeSet;

use crate::ast::shared::EffectSym;

use super::var::{RigidityEnv, TypeVarSym};
use super::{Type, TypeCtor};

// ============================================================================
// Atoms
// ============================================================================

/// An uninterpreted leaf of an effect formula.
#[derive(Debug, Clone, PartialEq)]
pub enum BoolAtom {
    /// A flexible effect variable; the unifier may bind it.
    FlexVar(TypeVarSym),
    /// A rigid effect variable (a quantified effect or a region).
    RigidVar(TypeVarSym),
    /// A named effect constant.
    Eff(EffectSym),
    /// A Bool-kinded subterm the algebra does not interpret.
    Opaque(Type),
}

/// Interns atoms so formulas can refer to them by index.
#[derive(Debug, Default)]
pub struct AtomTable {
    atoms: Vec<BoolAtom>,
}

impl AtomTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    pub fn get(&self, idx: usize) -> &BoolAtom {
        &self.atoms[idx]
    }

    pub fn intern(&mut self, atom: BoolAtom) -> usize {
        match self.atoms.iter().position(|a| a == &atom) {
            Some(idx) => idx,
            None => {
                self.atoms.push(atom);
                self.atoms.len() - 1
            }
        }
    }

    /// Indices of all flexible-variable atoms, in insertion order.
    pub fn flexible_indices(&self) -> Vec<usize> {
        self.atoms
            .iter()
            .enumerate()
            .filter_map(|(i, a)| matches!(a, BoolAtom::FlexVar(_)).then_some(i))
            .collect()
    }
}

// ============================================================================
// Formulas
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum BoolFormula {
    True,
    False,
    Var(usize),
    Not(Box<BoolFormula>),
    And(Box<BoolFormula>, Box<BoolFormula>),
    Or(Box<BoolFormula>, Box<BoolFormula>),
}

impl BoolFormula {
    // Constant-folding constructors.

    pub fn not(f: BoolFormula) -> BoolFormula {
        match f {
            BoolFormula::True => BoolFormula::False,
            BoolFormula::False => BoolFormula::True,
            BoolFormula::Not(g) => *g,
            _ => BoolFormula::Not(Box::new(f)),
        }
    }

    pub fn and(f: BoolFormula, g: BoolFormula) -> BoolFormula {
        match (&f, &g) {
            (BoolFormula::False, _) | (_, BoolFormula::False) => BoolFormula::False,
            (BoolFormula::True, _) => g,
            (_, BoolFormula::True) => f,
            _ if f == g => f,
            _ => BoolFormula::And(Box::new(f), Box::new(g)),
        }
    }

    pub fn or(f: BoolFormula, g: BoolFormula) -> BoolFormula {
        match (&f, &g) {
            (BoolFormula::True, _) | (_, BoolFormula::True) => BoolFormula::True,
            (BoolFormula::False, _) => g,
            (_, BoolFormula::False) => f,
            _ if f == g => f,
            _ => BoolFormula::Or(Box::new(f), Box::new(g)),
        }
    }

    /// Symmetric difference.
    pub fn xor(f: BoolFormula, g: BoolFormula) -> BoolFormula {
        BoolFormula::or(
            BoolFormula::and(f.clone(), BoolFormula::not(g.clone())),
            BoolFormula::and(BoolFormula::not(f), g),
        )
    }

    /// Variables occurring in the formula.
    pub fn vars(&self) -> BTreeSet<usize> {
        let mut acc = BTreeSet::new();
        self.collect_vars(&mut acc);
        acc
    }

    fn collect_vars(&self, acc: &mut BTreeSet<usize>) {
        match self {
            BoolFormula::True | BoolFormula::False => {}
            BoolFormula::Var(i) => {
                acc.insert(*i);
            }
            BoolFormula::Not(f) => f.collect_vars(acc),
            BoolFormula::And(f, g) | BoolFormula::Or(f, g) => {
                f.collect_vars(acc);
                g.collect_vars(acc);
            }
        }
    }

    /// Substitute a constant for a variable, folding as we go
    /// (one Shannon cofactor).
    pub fn assign(&self, var: usize, val: bool) -> BoolFormula {
        match self {
            BoolFormula::True => BoolFormula::True,
            BoolFormula::False => BoolFormula::False,
            BoolFormula::Var(i) if *i == var => {
                if val {
                    BoolFormula::True
                } else {
                    BoolFormula::False
                }
            }
            BoolFormula::Var(i) => BoolFormula::Var(*i),
            BoolFormula::Not(f) => BoolFormula::not(f.assign(var, val)),
            BoolFormula::And(f, g) => {
                BoolFormula::and(f.assign(var, val), g.assign(var, val))
            }
            BoolFormula::Or(f, g) => BoolFormula::or(f.assign(var, val), g.assign(var, val)),
        }
    }

    /// Substitute a formula for a variable.
    pub fn substitute(&self, var: usize, repl: &BoolFormula) -> BoolFormula {
        match self {
            BoolFormula::True => BoolFormula::True,
            BoolFormula::False => BoolFormula::False,
            BoolFormula::Var(i) if *i == var => repl.clone(),
            BoolFormula::Var(i) => BoolFormula::Var(*i),
            BoolFormula::Not(f) => BoolFormula::not(f.substitute(var, repl)),
            BoolFormula::And(f, g) => {
                BoolFormula::and(f.substitute(var, repl), g.substitute(var, repl))
            }
            BoolFormula::Or(f, g) => {
                BoolFormula::or(f.substitute(var, repl), g.substitute(var, repl))
            }
        }
    }

    /// Evaluate under a total assignment.
    pub fn eval(&self, assignment: &dyn Fn(usize) -> bool) -> bool {
        match self {
            BoolFormula::True => true,
            BoolFormula::False => false,
            BoolFormula::Var(i) => assignment(*i),
            BoolFormula::Not(f) => !f.eval(assignment),
            BoolFormula::And(f, g) => f.eval(assignment) && g.eval(assignment),
            BoolFormula::Or(f, g) => f.eval(assignment) || g.eval(assignment),
        }
    }

    /// True if some assignment of the formula's variables satisfies it.
    ///
    /// Exponential in the number of distinct variables; effect formulas
    /// are small by construction and the unifier enforces an atom budget
    /// before calling this.
    pub fn is_satisfiable(&self) -> bool {
        let vars: Vec<usize> = self.vars().into_iter().collect();
        let n = vars.len();
        for bits in 0u64..(1u64 << n) {
            let res = self.eval(&|v| {
                let pos = vars.iter().position(|&x| x == v).unwrap_or(0);
                bits & (1 << pos) != 0
            });
            if res {
                return true;
            }
        }
        false
    }

    /// Truth-table equivalence over the union of both variable sets.
    pub fn equivalent(&self, other: &BoolFormula) -> bool {
        !BoolFormula::xor(self.clone(), other.clone()).is_satisfiable()
    }
}

// ============================================================================
// Conversion
// ============================================================================

/// Translate an effect type into a formula, interning atoms.
pub fn from_type(tpe: &Type, table: &mut AtomTable, renv: &RigidityEnv) -> BoolFormula {
    match tpe {
        Type::Var(sym) => {
            let atom = if renv.is_rigid(sym) {
                BoolAtom::RigidVar(sym.clone())
            } else {
                BoolAtom::FlexVar(sym.clone())
            };
            BoolFormula::Var(table.intern(atom))
        }
        Type::Cst(TypeCtor::Pure) => BoolFormula::False,
        Type::Cst(TypeCtor::Impure) => BoolFormula::True,
        Type::Cst(TypeCtor::Effect(sym)) => {
            BoolFormula::Var(table.intern(BoolAtom::Eff(sym.clone())))
        }
        Type::Alias { tpe, .. } => from_type(tpe, table, renv),
        Type::App(_, _) => {
            let (head, args) = tpe.spine();
            match (head, args.as_slice()) {
                (Type::Cst(TypeCtor::Union), [a, b]) => BoolFormula::or(
                    from_type(a, table, renv),
                    from_type(b, table, renv),
                ),
                (Type::Cst(TypeCtor::Intersection), [a, b]) => BoolFormula::and(
                    from_type(a, table, renv),
                    from_type(b, table, renv),
                ),
                (Type::Cst(TypeCtor::Complement), [a]) => {
                    BoolFormula::not(from_type(a, table, renv))
                }
                _ => BoolFormula::Var(table.intern(BoolAtom::Opaque(tpe.clone()))),
            }
        }
        _ => BoolFormula::Var(table.intern(BoolAtom::Opaque(tpe.clone()))),
    }
}

/// Translate a formula back into an effect type through the normalizing
/// smart constructors.
pub fn to_type(f: &BoolFormula, table: &AtomTable) -> Type {
    match f {
        BoolFormula::True => Type::impure(),
        BoolFormula::False => Type::pure(),
        BoolFormula::Var(i) => match table.get(*i) {
            BoolAtom::FlexVar(sym) | BoolAtom::RigidVar(sym) => Type::Var(sym.clone()),
            BoolAtom::Eff(sym) => Type::mk_effect(sym.clone()),
            BoolAtom::Opaque(t) => t.clone(),
        },
        BoolFormula::Not(g) => Type::mk_complement(to_type(g, table)),
        BoolFormula::And(g, h) => {
            Type::mk_intersection(to_type(g, table), to_type(h, table))
        }
        BoolFormula::Or(g, h) => Type::mk_union(to_type(g, table), to_type(h, table)),
    }
}
