//! Abstract syntax trees
//!
//! Two trees bracket the type checker: `kinded` comes in from the
//! resolver and kinder, `typed` goes out to the backend. `shared` holds
//! the vocabulary common to both.

pub mod kinded;
pub mod shared;
pub mod typed;
