//! Checking environments
//!
//! The trait and equality environments are built once, sequentially,
//! from the declarations of the compilation unit; workers then receive a
//! read-only snapshot. Symbol tables are immutable after the kinder, so
//! the snapshot is plain shared references.

use std::collections::HashMap;

use crate::ast::kinded::{self, Root};
use crate::ast::shared::{AssocTypeSym, TraitSym};
use crate::types::scheme::TraitConstraint;
use crate::types::Type;

use super::CheckerConfig;

// ============================================================================
// Trait environment
// ============================================================================

/// One instance as the entailment machinery sees it: the head and the
/// context constraints.
#[derive(Debug, Clone)]
pub struct InstanceContext {
    pub tpe: Type,
    pub tconstrs: Vec<TraitConstraint>,
}

/// Everything entailment needs to know about one trait.
#[derive(Debug, Clone, Default)]
pub struct TraitContext {
    pub super_traits: Vec<TraitSym>,
    pub instances: Vec<InstanceContext>,
}

/// Superclass edges and instance heads for every trait in the unit.
#[derive(Debug, Clone, Default)]
pub struct TraitEnv {
    map: HashMap<TraitSym, TraitContext>,
}

impl TraitEnv {
    /// Build the environment from the declarations. Sequential; runs
    /// before the parallel checking phase.
    pub fn from_root(root: &Root) -> Self {
        let mut map: HashMap<TraitSym, TraitContext> = HashMap::new();
        for (sym, decl) in &root.traits {
            map.insert(
                sym.clone(),
                TraitContext {
                    super_traits: decl.super_traits.clone(),
                    instances: Vec::new(),
                },
            );
        }
        for (sym, instances) in &root.instances {
            let ctx = map.entry(sym.clone()).or_default();
            for inst in instances {
                ctx.instances.push(InstanceContext {
                    tpe: inst.tpe.clone(),
                    tconstrs: inst.tconstrs.clone(),
                });
            }
        }
        Self { map }
    }

    pub fn get(&self, sym: &TraitSym) -> Option<&TraitContext> {
        self.map.get(sym)
    }

    pub fn super_traits(&self, sym: &TraitSym) -> &[TraitSym] {
        self.map
            .get(sym)
            .map(|c| c.super_traits.as_slice())
            .unwrap_or(&[])
    }

    pub fn instances(&self, sym: &TraitSym) -> &[InstanceContext] {
        self.map
            .get(sym)
            .map(|c| c.instances.as_slice())
            .unwrap_or(&[])
    }

    /// Close a constraint set under superclass edges: `Order[a]` yields
    /// `Eq[a]` when `Eq` is a superclass of `Order`, transitively.
    pub fn superclass_closure(&self, constrs: &[TraitConstraint]) -> Vec<TraitConstraint> {
        let mut acc: Vec<TraitConstraint> = Vec::new();
        let mut work: Vec<TraitConstraint> = constrs.to_vec();
        while let Some(c) = work.pop() {
            if acc.iter().any(|d| d.sym == c.sym && d.arg == c.arg) {
                continue;
            }
            for sup in self.super_traits(&c.sym) {
                work.push(TraitConstraint::new(sup.clone(), c.arg.clone(), c.loc));
            }
            acc.push(c);
        }
        acc
    }
}

// ============================================================================
// Equality environment
// ============================================================================

/// An associated-type definition from some instance.
#[derive(Debug, Clone)]
pub struct AssocTypeDefContext {
    /// The instance head the definition is for.
    pub arg: Type,
    pub tpe: Type,
}

/// All associated-type definitions, keyed by the associated type symbol.
#[derive(Debug, Clone, Default)]
pub struct EqualityEnv {
    map: HashMap<AssocTypeSym, Vec<AssocTypeDefContext>>,
}

impl EqualityEnv {
    pub fn from_root(root: &Root) -> Self {
        let mut map: HashMap<AssocTypeSym, Vec<AssocTypeDefContext>> = HashMap::new();
        for instances in root.instances.values() {
            for inst in instances {
                for def in &inst.assocs {
                    map.entry(def.sym.clone()).or_default().push(AssocTypeDefContext {
                        arg: def.arg.clone(),
                        tpe: def.tpe.clone(),
                    });
                }
            }
        }
        Self { map }
    }

    pub fn defs(&self, sym: &AssocTypeSym) -> &[AssocTypeDefContext] {
        self.map.get(sym).map(|v| v.as_slice()).unwrap_or(&[])
    }
}

// ============================================================================
// Snapshot
// ============================================================================

/// The read-only world a checking worker operates in.
#[derive(Debug)]
pub struct ContextSnapshot<'a> {
    pub root: &'a Root,
    pub trait_env: TraitEnv,
    pub eq_env: EqualityEnv,
    pub config: &'a CheckerConfig,
}

impl<'a> ContextSnapshot<'a> {
    pub fn new(root: &'a Root, config: &'a CheckerConfig) -> Self {
        Self {
            root,
            trait_env: TraitEnv::from_root(root),
            eq_env: EqualityEnv::from_root(root),
            config,
        }
    }

    pub fn def(&self, sym: &crate::ast::shared::DefnSym) -> Option<&'a kinded::Def> {
        self.root.defs.get(sym)
    }

    pub fn sig(&self, sym: &crate::ast::shared::SigSym) -> Option<&'a kinded::Sig> {
        self.root.sigs.get(sym)
    }

    pub fn enum_decl(&self, sym: &crate::ast::shared::EnumSym) -> Option<&'a kinded::EnumDecl> {
        self.root
            .enums
            .get(sym)
            .or_else(|| self.root.restrictable_enums.get(sym))
    }

    /// Find an effect operation declaration by symbol.
    pub fn op_decl(&self, sym: &crate::ast::shared::OpSym) -> Option<&'a kinded::OpDecl> {
        self.root
            .effects
            .values()
            .flat_map(|e| e.ops.iter())
            .find(|op| &op.sym == sym)
    }

    /// Look up a trait by source name, for the well-known traits the
    /// checker itself needs (`Order`, `Foldable`, ...).
    pub fn trait_by_name(&self, name: &str) -> Option<&'a TraitSym> {
        self.root.traits.keys().find(|t| t.text == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::shared::Span;

    #[test]
    fn test_superclass_closure() {
        let eq = TraitSym::new(1, "Eq");
        let order = TraitSym::new(2, "Order");
        let mut env = TraitEnv::default();
        env.map.insert(
            order.clone(),
            TraitContext {
                super_traits: vec![eq.clone()],
                instances: Vec::new(),
            },
        );
        env.map.insert(eq.clone(), TraitContext::default());
        let cs = vec![TraitConstraint::new(order, Type::int32(), Span::dummy())];
        let closed = env.superclass_closure(&cs);
        assert_eq!(closed.len(), 2);
        assert!(closed.iter().any(|c| c.sym == eq));
    }
}
