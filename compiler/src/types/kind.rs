//! Kinds
//!
//! The kind system classifies types the same way types classify values.
//! Kinds form a small closed set with no subkinding; equality is
//! structural. Every type variable is assigned its kind once, at
//! allocation, and the assignment is never revised.

use std::fmt;

/// The kind of a type.
///
/// - `Star` classifies inhabited types (`Int32`, `String -> Bool`, ...).
/// - `Bool` classifies effect formulas; `Pure` is bottom, `Impure` is top.
///   Region variables are `Bool`-kinded atoms.
/// - `RecordRow` / `SchemaRow` classify row types before they are lifted
///   to `Star` by the `Record` / `Schema` wrapper constructors.
/// - `Predicate` classifies Datalog predicate types (`Relation`, `Lattice`).
/// - `Arrow` classifies type constructors awaiting arguments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Kind {
    Star,
    Bool,
    RecordRow,
    SchemaRow,
    Predicate,
    Arrow(Box<Kind>, Box<Kind>),
}

impl Kind {
    /// Construct the kind `k1 -> k2`.
    pub fn arrow(k1: Kind, k2: Kind) -> Kind {
        Kind::Arrow(Box::new(k1), Box::new(k2))
    }

    /// Construct the curried kind `ks... -> ret`.
    pub fn arrow_chain<I>(ks: I, ret: Kind) -> Kind
    where
        I: IntoIterator<Item = Kind>,
        I::IntoIter: DoubleEndedIterator,
    {
        ks.into_iter()
            .rev()
            .fold(ret, |acc, k| Kind::arrow(k, acc))
    }

    /// The result of applying a constructor of this kind to an argument
    /// of kind `arg`, or `None` if the application is ill-kinded.
    pub fn apply_to(&self, arg: &Kind) -> Option<Kind> {
        match self {
            Kind::Arrow(k1, k2) if k1.as_ref() == arg => Some((**k2).clone()),
            _ => None,
        }
    }

    /// True for kinds whose types the syntactic (Robinson) unifier handles.
    pub fn is_syntactic(&self) -> bool {
        matches!(self, Kind::Star | Kind::Predicate | Kind::Arrow(_, _))
    }

    /// True for the two row kinds.
    pub fn is_row(&self) -> bool {
        matches!(self, Kind::RecordRow | Kind::SchemaRow)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Kind::Star => write!(f, "*"),
            Kind::Bool => write!(f, "Bool"),
            Kind::RecordRow => write!(f, "RecordRow"),
            Kind::SchemaRow => write!(f, "SchemaRow"),
            Kind::Predicate => write!(f, "Predicate"),
            Kind::Arrow(k1, k2) => match k1.as_ref() {
                Kind::Arrow(_, _) => write!(f, "({}) -> {}", k1, k2),
                _ => write!(f, "{} -> {}", k1, k2),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arrow_chain() {
        // Bool -> * -> *
        let k = Kind::arrow_chain(vec![Kind::Bool, Kind::Star], Kind::Star);
        assert_eq!(
            k,
            Kind::arrow(Kind::Bool, Kind::arrow(Kind::Star, Kind::Star))
        );
    }

    #[test]
    fn test_apply_to() {
        let k = Kind::arrow(Kind::Star, Kind::RecordRow);
        assert_eq!(k.apply_to(&Kind::Star), Some(Kind::RecordRow));
        assert_eq!(k.apply_to(&Kind::Bool), None);
        assert_eq!(Kind::Star.apply_to(&Kind::Star), None);
    }

    #[test]
    fn test_display() {
        let k = Kind::arrow(Kind::arrow(Kind::Star, Kind::Star), Kind::Star);
        assert_eq!(k.to_string(), "(* -> *) -> *");
    }
}
