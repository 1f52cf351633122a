//! Nacre Compiler — type inference and checking core
//!
//! The subsystem between name resolution and lowering: it consumes a
//! kinded AST (every type variable kinded, every type in canonical form)
//! and produces a typed AST in which every expression and pattern
//! carries its inferred type and effect, every definition carries its
//! inferred scheme, and every trait constraint is discharged or reported.
//!
//! # Layers
//!
//! - `types` — the data model: types, kinds, variables, substitutions,
//!   schemes, and the Boolean effect algebra.
//! - `ast` — the kinded (input) and typed (output) trees.
//! - `typeck` — unification (syntactic, row, Boolean), the inference
//!   context, constraint generation, entailment, and the phase driver.
//! - `diagnostics` — rendering of type errors.

pub mod ast;
pub mod diagnostics;
pub mod typeck;
pub mod types;

// Re-exports for convenient access
pub use typeck::errors::TypeError;
pub use typeck::{check_root, CancelToken, ChangeSet, CheckerConfig};
