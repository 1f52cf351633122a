//! Type variables
//!
//! Variables are opaque identities drawn from a process-wide atomic
//! counter, so workers checking different definitions in parallel can
//! allocate without coordination. A variable's kind is fixed at
//! allocation. Whether a variable is flexible (the unifier may bind it)
//! or rigid (a universally quantified skolem) is not a property of the
//! variable itself but of the rigidity environment of the definition
//! currently being checked.

use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use super::kind::Kind;

// ============================================================================
// Allocation
// ============================================================================

static NEXT_VAR_ID: AtomicU64 = AtomicU64::new(1);

/// Allocate a fresh type variable of the given kind.
pub fn fresh_type_var(kind: Kind) -> TypeVarSym {
    TypeVarSym {
        id: NEXT_VAR_ID.fetch_add(1, Ordering::Relaxed),
        kind,
        text: None,
    }
}

/// Allocate a fresh type variable carrying a user-facing name.
///
/// The name is purely for diagnostics; identity is the numeric id.
pub fn fresh_named_type_var(text: impl Into<String>, kind: Kind) -> TypeVarSym {
    TypeVarSym {
        id: NEXT_VAR_ID.fetch_add(1, Ordering::Relaxed),
        kind,
        text: Some(text.into()),
    }
}

// ============================================================================
// Type variable symbols
// ============================================================================

/// A type variable: a globally unique identity plus a fixed kind.
#[derive(Debug, Clone)]
pub struct TypeVarSym {
    pub id: u64,
    pub kind: Kind,
    /// Optional source-level name, for diagnostics only.
    pub text: Option<String>,
}

impl PartialEq for TypeVarSym {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeVarSym {}

impl std::hash::Hash for TypeVarSym {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl PartialOrd for TypeVarSym {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TypeVarSym {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.id.cmp(&other.id)
    }
}

impl fmt::Display for TypeVarSym {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.text {
            Some(name) => write!(f, "{}", name),
            None => write!(f, "t{}", self.id),
        }
    }
}

// ============================================================================
// Rigidity environment
// ============================================================================

/// The set of type variables the unifier must treat as constants.
///
/// Rigidification is monotonic within a single definition check, so no
/// scoped undo is provided; each definition starts from a fresh
/// environment.
#[derive(Debug, Clone, Default)]
pub struct RigidityEnv {
    rigid: HashSet<u64>,
}

impl RigidityEnv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a variable as rigid.
    pub fn rigidify(&mut self, var: &TypeVarSym) {
        self.rigid.insert(var.id);
    }

    pub fn is_rigid(&self, var: &TypeVarSym) -> bool {
        self.rigid.contains(&var.id)
    }

    pub fn is_flexible(&self, var: &TypeVarSym) -> bool {
        !self.is_rigid(var)
    }

    pub fn len(&self) -> usize {
        self.rigid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rigid.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_vars_are_distinct() {
        let v1 = fresh_type_var(Kind::Star);
        let v2 = fresh_type_var(Kind::Star);
        assert_ne!(v1, v2);
    }

    #[test]
    fn test_identity_ignores_name() {
        let v = fresh_named_type_var("a", Kind::Star);
        let mut w = v.clone();
        w.text = None;
        assert_eq!(v, w);
    }

    #[test]
    fn test_rigidity() {
        let v = fresh_type_var(Kind::Bool);
        let mut renv = RigidityEnv::new();
        assert!(renv.is_flexible(&v));
        renv.rigidify(&v);
        assert!(renv.is_rigid(&v));
    }
}
