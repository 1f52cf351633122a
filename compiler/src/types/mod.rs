//! Type representation
//!
//! Types are finite trees over a fixed constructor alphabet: variables,
//! nullary constants, left-associative application, and transparent
//! aliases. Well-kindedness is an invariant established by the kinder
//! before this core runs; the functions here assume it and the unifier
//! re-checks kinds only at its entry point.
//!
//! The submodules hold the rest of the data model: kinds, variables and
//! the rigidity environment, substitutions, schemes, and the Boolean
//! formula bridge used by the effect unifier.

pub mod bool_alg;
pub mod kind;
pub mod scheme;
pub mod subst;
pub mod var;

use std::collections::BTreeSet;
use std::fmt;

use crate::ast::shared::{
    EffectSym, EnumSym, Label, NativeClass, PredSym, TypeAliasSym,
};
use self::kind::Kind;
use self::var::TypeVarSym;

// ============================================================================
// Type constructors
// ============================================================================

/// The closed alphabet of type constructors, partitioned by kind.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeCtor {
    // --- primitives, kind * ---
    Unit,
    Null,
    Bool,
    Char,
    Int8,
    Int16,
    Int32,
    Int64,
    Float32,
    Float64,
    BigInt,
    BigDecimal,
    Str,
    Regex,

    // --- containers ---
    /// `Array[t, r]`: mutable, region-allocated. Kind `* -> Bool -> *`.
    Array,
    /// `Vector[t]`: immutable. Kind `* -> *`.
    Vector,
    /// `List[t]`. Kind `* -> *`.
    List,
    /// `Lazy[t]`. Kind `* -> *`.
    Lazy,
    /// `Ref[t, r]`: a region-allocated mutable cell. Kind `* -> Bool -> *`.
    Ref,
    /// `Sender[t, r]` / `Receiver[t, r]`: channel endpoints.
    /// Kind `* -> Bool -> *`.
    Sender,
    Receiver,
    /// The handle of a lexical region: `Region[r]`. Kind `Bool -> *`.
    Region,
    /// A user-declared enum with its cached kind.
    ///
    /// The cached kind exists so `Type::kind` needs no symbol table; it is
    /// ignored by equality in the unifier.
    Enum(EnumSym, Kind),
    /// A user-declared restrictable enum with its cached kind.
    RestrictableEnum(EnumSym, Kind),

    // --- functions ---
    /// `Arrow(arity)`: effect first, then `arity - 1` domains, then the
    /// codomain. Kind `Bool -> * -> ... -> * -> *`.
    Arrow(usize),

    // --- tuples ---
    Tuple(usize),

    // --- rows ---
    RecordRowEmpty,
    RecordRowExtend(Label),
    SchemaRowEmpty,
    SchemaRowExtend(PredSym),
    /// Lifts a record row to kind `*`.
    Record,
    /// Lifts a schema row to kind `*`.
    Schema,

    // --- effects, kind Bool ---
    /// The empty effect; bottom of the Boolean algebra.
    Pure,
    /// The universal effect; top of the Boolean algebra.
    Impure,
    Union,
    Intersection,
    Complement,
    /// A named, user-declared effect atom.
    Effect(EffectSym),

    // --- predicates ---
    Relation,
    Lattice,

    // --- foreign ---
    Native(NativeClass),
}

impl TypeCtor {
    /// The kind of the constructor.
    pub fn kind(&self) -> Kind {
        use Kind::*;
        match self {
            TypeCtor::Unit
            | TypeCtor::Null
            | TypeCtor::Bool
            | TypeCtor::Char
            | TypeCtor::Int8
            | TypeCtor::Int16
            | TypeCtor::Int32
            | TypeCtor::Int64
            | TypeCtor::Float32
            | TypeCtor::Float64
            | TypeCtor::BigInt
            | TypeCtor::BigDecimal
            | TypeCtor::Str
            | TypeCtor::Regex => Star,
            TypeCtor::Native(_) => Star,

            TypeCtor::Vector | TypeCtor::List | TypeCtor::Lazy => Kind::arrow(Star, Star),
            TypeCtor::Array | TypeCtor::Ref | TypeCtor::Sender | TypeCtor::Receiver => {
                Kind::arrow_chain(vec![Star, Bool], Star)
            }
            TypeCtor::Region => Kind::arrow(Bool, Star),
            TypeCtor::Enum(_, k) | TypeCtor::RestrictableEnum(_, k) => k.clone(),

            TypeCtor::Arrow(arity) => {
                let mut ks = vec![Bool];
                ks.extend(std::iter::repeat(Star).take(arity - 1));
                Kind::arrow_chain(ks, Star)
            }

            TypeCtor::Tuple(arity) => {
                Kind::arrow_chain(std::iter::repeat(Star).take(*arity).collect::<Vec<_>>(), Star)
            }

            TypeCtor::RecordRowEmpty => RecordRow,
            TypeCtor::RecordRowExtend(_) => Kind::arrow_chain(vec![Star, RecordRow], RecordRow),
            TypeCtor::SchemaRowEmpty => SchemaRow,
            TypeCtor::SchemaRowExtend(_) => {
                Kind::arrow_chain(vec![Predicate, SchemaRow], SchemaRow)
            }
            TypeCtor::Record => Kind::arrow(RecordRow, Star),
            TypeCtor::Schema => Kind::arrow(SchemaRow, Star),

            TypeCtor::Pure | TypeCtor::Impure | TypeCtor::Effect(_) => Bool,
            TypeCtor::Union | TypeCtor::Intersection => Kind::arrow_chain(vec![Bool, Bool], Bool),
            TypeCtor::Complement => Kind::arrow(Bool, Bool),

            TypeCtor::Relation | TypeCtor::Lattice => Kind::arrow(Star, Predicate),
        }
    }
}

// ============================================================================
// Types
// ============================================================================

/// A type: a tree over the constructor alphabet.
#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    /// A type variable with fixed kind and global identity.
    Var(TypeVarSym),
    /// A constant (nullary occurrence of a constructor).
    Cst(TypeCtor),
    /// Left-associative application: `App(App(c, a), b)` is `c[a, b]`.
    App(Box<Type>, Box<Type>),
    /// A transparent alias. Equality and unification look through to the
    /// expansion; the alias form survives purely for diagnostics.
    Alias {
        sym: TypeAliasSym,
        args: Vec<Type>,
        tpe: Box<Type>,
    },
}

impl Type {
    // ------------------------------------------------------------------------
    // Basic observers
    // ------------------------------------------------------------------------

    /// The kind of the type. Assumes well-kindedness.
    pub fn kind(&self) -> Kind {
        match self {
            Type::Var(sym) => sym.kind.clone(),
            Type::Cst(tc) => tc.kind(),
            Type::App(t1, _) => match t1.kind() {
                Kind::Arrow(_, k2) => *k2,
                // Unreachable on well-kinded input; fall back defensively
                // so diagnostics can still be produced.
                k => k,
            },
            Type::Alias { tpe, .. } => tpe.kind(),
        }
    }

    /// All type variables occurring in the type, ordered by identity.
    pub fn type_vars(&self) -> BTreeSet<TypeVarSym> {
        let mut acc = BTreeSet::new();
        self.collect_type_vars(&mut acc);
        acc
    }

    fn collect_type_vars(&self, acc: &mut BTreeSet<TypeVarSym>) {
        match self {
            Type::Var(sym) => {
                acc.insert(sym.clone());
            }
            Type::Cst(_) => {}
            Type::App(t1, t2) => {
                t1.collect_type_vars(acc);
                t2.collect_type_vars(acc);
            }
            Type::Alias { args, tpe, .. } => {
                // The expansion is the semantics; args only repeat its vars.
                for a in args {
                    a.collect_type_vars(acc);
                }
                tpe.collect_type_vars(acc);
            }
        }
    }

    /// Occurs check helper.
    pub fn contains_var(&self, var: &TypeVarSym) -> bool {
        match self {
            Type::Var(sym) => sym == var,
            Type::Cst(_) => false,
            Type::App(t1, t2) => t1.contains_var(var) || t2.contains_var(var),
            Type::Alias { args, tpe, .. } => {
                args.iter().any(|a| a.contains_var(var)) || tpe.contains_var(var)
            }
        }
    }

    /// Decompose an application spine into its head and arguments.
    pub fn spine(&self) -> (&Type, Vec<&Type>) {
        let mut args = Vec::new();
        let mut cur = self;
        while let Type::App(t1, t2) = cur {
            args.push(t2.as_ref());
            cur = t1;
        }
        args.reverse();
        (cur, args)
    }

    /// The constructor at the head of the spine, if any.
    pub fn head_ctor(&self) -> Option<&TypeCtor> {
        match self.spine().0 {
            Type::Cst(tc) => Some(tc),
            _ => None,
        }
    }

    /// Recursively replace aliases by their expansions.
    pub fn expand_aliases(&self) -> Type {
        match self {
            Type::Var(_) | Type::Cst(_) => self.clone(),
            Type::App(t1, t2) => Type::App(
                Box::new(t1.expand_aliases()),
                Box::new(t2.expand_aliases()),
            ),
            Type::Alias { tpe, .. } => tpe.expand_aliases(),
        }
    }

    // ------------------------------------------------------------------------
    // General constructors
    // ------------------------------------------------------------------------

    pub fn app(t1: Type, t2: Type) -> Type {
        Type::App(Box::new(t1), Box::new(t2))
    }

    /// Apply a head type to several arguments.
    pub fn app_all(head: Type, args: impl IntoIterator<Item = Type>) -> Type {
        args.into_iter().fold(head, Type::app)
    }

    pub fn unit() -> Type {
        Type::Cst(TypeCtor::Unit)
    }

    pub fn bool() -> Type {
        Type::Cst(TypeCtor::Bool)
    }

    pub fn int32() -> Type {
        Type::Cst(TypeCtor::Int32)
    }

    pub fn string() -> Type {
        Type::Cst(TypeCtor::Str)
    }

    /// The type of a function with the given parameters, effect and result.
    pub fn mk_arrow(params: Vec<Type>, eff: Type, result: Type) -> Type {
        let arity = params.len() + 1;
        let head = Type::app(Type::Cst(TypeCtor::Arrow(arity)), eff);
        Type::app(Type::app_all(head, params), result)
    }

    /// Destructure a fully applied arrow into `(params, effect, result)`.
    pub fn arrow_parts(&self) -> Option<(Vec<&Type>, &Type, &Type)> {
        let (head, args) = self.spine();
        match head {
            Type::Cst(TypeCtor::Arrow(arity)) if args.len() == arity + 1 => {
                let eff = args[0];
                let params = args[1..*arity].to_vec();
                let result = args[*arity];
                Some((params, eff, result))
            }
            _ => None,
        }
    }

    pub fn mk_tuple(elms: Vec<Type>) -> Type {
        let arity = elms.len();
        Type::app_all(Type::Cst(TypeCtor::Tuple(arity)), elms)
    }

    pub fn mk_array(elm: Type, region: Type) -> Type {
        Type::app_all(Type::Cst(TypeCtor::Array), vec![elm, region])
    }

    pub fn mk_vector(elm: Type) -> Type {
        Type::app(Type::Cst(TypeCtor::Vector), elm)
    }

    pub fn mk_lazy(elm: Type) -> Type {
        Type::app(Type::Cst(TypeCtor::Lazy), elm)
    }

    pub fn mk_ref(elm: Type, region: Type) -> Type {
        Type::app_all(Type::Cst(TypeCtor::Ref), vec![elm, region])
    }

    pub fn mk_sender(elm: Type, region: Type) -> Type {
        Type::app_all(Type::Cst(TypeCtor::Sender), vec![elm, region])
    }

    pub fn mk_receiver(elm: Type, region: Type) -> Type {
        Type::app_all(Type::Cst(TypeCtor::Receiver), vec![elm, region])
    }

    pub fn mk_region(region: Type) -> Type {
        Type::app(Type::Cst(TypeCtor::Region), region)
    }

    pub fn mk_enum(sym: EnumSym, kind: Kind, args: Vec<Type>) -> Type {
        Type::app_all(Type::Cst(TypeCtor::Enum(sym, kind)), args)
    }

    pub fn mk_native(class: NativeClass) -> Type {
        Type::Cst(TypeCtor::Native(class))
    }

    // ------------------------------------------------------------------------
    // Rows
    // ------------------------------------------------------------------------

    pub fn record_row_empty() -> Type {
        Type::Cst(TypeCtor::RecordRowEmpty)
    }

    pub fn mk_record_row_extend(label: Label, tpe: Type, rest: Type) -> Type {
        Type::app_all(
            Type::Cst(TypeCtor::RecordRowExtend(label)),
            vec![tpe, rest],
        )
    }

    pub fn mk_record(row: Type) -> Type {
        Type::app(Type::Cst(TypeCtor::Record), row)
    }

    pub fn schema_row_empty() -> Type {
        Type::Cst(TypeCtor::SchemaRowEmpty)
    }

    pub fn mk_schema_row_extend(pred: PredSym, tpe: Type, rest: Type) -> Type {
        Type::app_all(
            Type::Cst(TypeCtor::SchemaRowExtend(pred)),
            vec![tpe, rest],
        )
    }

    pub fn mk_schema(row: Type) -> Type {
        Type::app(Type::Cst(TypeCtor::Schema), row)
    }

    /// The predicate type of a relation over the given term types.
    pub fn mk_relation(terms: Vec<Type>) -> Type {
        Type::app(Type::Cst(TypeCtor::Relation), Self::tuplish(terms))
    }

    /// The predicate type of a lattice over the given term types.
    pub fn mk_lattice(terms: Vec<Type>) -> Type {
        Type::app(Type::Cst(TypeCtor::Lattice), Self::tuplish(terms))
    }

    fn tuplish(mut terms: Vec<Type>) -> Type {
        match terms.len() {
            0 => Type::unit(),
            1 => terms.remove(0),
            _ => Type::mk_tuple(terms),
        }
    }

    // ------------------------------------------------------------------------
    // Effects: normalizing smart constructors
    // ------------------------------------------------------------------------

    pub fn pure() -> Type {
        Type::Cst(TypeCtor::Pure)
    }

    pub fn impure() -> Type {
        Type::Cst(TypeCtor::Impure)
    }

    pub fn mk_effect(sym: EffectSym) -> Type {
        Type::Cst(TypeCtor::Effect(sym))
    }

    pub fn is_pure(&self) -> bool {
        matches!(self, Type::Cst(TypeCtor::Pure))
    }

    pub fn is_impure(&self) -> bool {
        matches!(self, Type::Cst(TypeCtor::Impure))
    }

    /// `t1 + t2`, simplified by the algebra's unit and annihilator laws.
    pub fn mk_union(t1: Type, t2: Type) -> Type {
        match (&t1, &t2) {
            (Type::Cst(TypeCtor::Pure), _) => t2,
            (_, Type::Cst(TypeCtor::Pure)) => t1,
            (Type::Cst(TypeCtor::Impure), _) | (_, Type::Cst(TypeCtor::Impure)) => Type::impure(),
            _ if t1 == t2 => t1,
            _ if t1.as_complement() == Some(&t2) || t2.as_complement() == Some(&t1) => {
                Type::impure()
            }
            _ => Type::app_all(Type::Cst(TypeCtor::Union), vec![t1, t2]),
        }
    }

    /// `t1 & t2`, simplified dually to `mk_union`.
    pub fn mk_intersection(t1: Type, t2: Type) -> Type {
        match (&t1, &t2) {
            (Type::Cst(TypeCtor::Impure), _) => t2,
            (_, Type::Cst(TypeCtor::Impure)) => t1,
            (Type::Cst(TypeCtor::Pure), _) | (_, Type::Cst(TypeCtor::Pure)) => Type::pure(),
            _ if t1 == t2 => t1,
            _ if t1.as_complement() == Some(&t2) || t2.as_complement() == Some(&t1) => {
                Type::pure()
            }
            _ => Type::app_all(Type::Cst(TypeCtor::Intersection), vec![t1, t2]),
        }
    }

    /// `~t`, folding constants and double complement.
    pub fn mk_complement(t: Type) -> Type {
        match &t {
            Type::Cst(TypeCtor::Pure) => Type::impure(),
            Type::Cst(TypeCtor::Impure) => Type::pure(),
            _ => match t.as_complement() {
                Some(inner) => inner.clone(),
                None => Type::app(Type::Cst(TypeCtor::Complement), t),
            },
        }
    }

    /// The union of an arbitrary number of effects.
    pub fn mk_union_all(effs: impl IntoIterator<Item = Type>) -> Type {
        effs.into_iter().fold(Type::pure(), Type::mk_union)
    }

    /// `t1 - t2` in the algebra: `t1 & ~t2`.
    pub fn mk_difference(t1: Type, t2: Type) -> Type {
        Type::mk_intersection(t1, Type::mk_complement(t2))
    }

    /// If the type is `~x`, return `x`.
    pub fn as_complement(&self) -> Option<&Type> {
        match self {
            Type::App(t1, t2) if matches!(t1.as_ref(), Type::Cst(TypeCtor::Complement)) => {
                Some(t2.as_ref())
            }
            _ => None,
        }
    }
}

// ============================================================================
// Display
// ============================================================================

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Recognized shapes get surface syntax; everything else prints as
        // an applied constructor.
        if let Some((params, eff, result)) = self.arrow_parts() {
            write!(f, "(")?;
            for (i, p) in params.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", p)?;
            }
            write!(f, ") -> {}", result)?;
            if !eff.is_pure() {
                write!(f, " \\ {}", eff)?;
            }
            return Ok(());
        }

        let (head, args) = self.spine();
        match head {
            Type::Var(sym) => {
                write!(f, "{}", sym)?;
                write_bracketed_args(f, &args)
            }
            Type::Alias {
                sym,
                args: alias_args,
                ..
            } => {
                // Aliases display their own arguments, not the spine's.
                write!(f, "{}", sym)?;
                let arg_refs: Vec<&Type> = alias_args.iter().collect();
                write_bracketed_args(f, &arg_refs)
            }
            Type::Cst(tc) => display_applied_ctor(f, tc, &args),
            Type::App(_, _) => unreachable!("spine head is never an application"),
        }
    }
}

fn write_bracketed_args(f: &mut fmt::Formatter<'_>, args: &[&Type]) -> fmt::Result {
    if args.is_empty() {
        return Ok(());
    }
    write!(f, "[")?;
    for (i, a) in args.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", a)?;
    }
    write!(f, "]")
}

fn display_applied_ctor(f: &mut fmt::Formatter<'_>, tc: &TypeCtor, args: &[&Type]) -> fmt::Result {
    match tc {
        TypeCtor::Unit => write!(f, "Unit"),
        TypeCtor::Null => write!(f, "Null"),
        TypeCtor::Bool => write!(f, "Bool"),
        TypeCtor::Char => write!(f, "Char"),
        TypeCtor::Int8 => write!(f, "Int8"),
        TypeCtor::Int16 => write!(f, "Int16"),
        TypeCtor::Int32 => write!(f, "Int32"),
        TypeCtor::Int64 => write!(f, "Int64"),
        TypeCtor::Float32 => write!(f, "Float32"),
        TypeCtor::Float64 => write!(f, "Float64"),
        TypeCtor::BigInt => write!(f, "BigInt"),
        TypeCtor::BigDecimal => write!(f, "BigDecimal"),
        TypeCtor::Str => write!(f, "String"),
        TypeCtor::Regex => write!(f, "Regex"),
        TypeCtor::Native(class) => write!(f, "##{}", class),

        TypeCtor::Array => named_app(f, "Array", args),
        TypeCtor::Vector => named_app(f, "Vector", args),
        TypeCtor::List => named_app(f, "List", args),
        TypeCtor::Lazy => named_app(f, "Lazy", args),
        TypeCtor::Ref => named_app(f, "Ref", args),
        TypeCtor::Sender => named_app(f, "Sender", args),
        TypeCtor::Receiver => named_app(f, "Receiver", args),
        TypeCtor::Region => named_app(f, "Region", args),
        TypeCtor::Enum(sym, _) | TypeCtor::RestrictableEnum(sym, _) => {
            write!(f, "{}", sym)?;
            write_bracketed_args(f, args)
        }

        // A partially applied arrow; the fully applied case is handled in
        // `Display for Type`.
        TypeCtor::Arrow(arity) => {
            write!(f, "Arrow{}", arity)?;
            write_bracketed_args(f, args)
        }

        TypeCtor::Tuple(_) => {
            write!(f, "(")?;
            for (i, a) in args.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", a)?;
            }
            write!(f, ")")
        }

        TypeCtor::Record => match args {
            [row] => {
                write!(f, "{{ ")?;
                display_row(f, row, " = ")?;
                write!(f, " }}")
            }
            _ => named_app(f, "Record", args),
        },
        TypeCtor::Schema => match args {
            [row] => {
                write!(f, "#{{ ")?;
                display_row(f, row, "")?;
                write!(f, " }}")
            }
            _ => named_app(f, "Schema", args),
        },
        TypeCtor::RecordRowEmpty | TypeCtor::SchemaRowEmpty => write!(f, "()"),
        TypeCtor::RecordRowExtend(_) | TypeCtor::SchemaRowExtend(_) => {
            // A bare row out of its wrapper.
            display_row_ctor(f, tc, args, " = ")
        }

        TypeCtor::Pure => write!(f, "Pure"),
        TypeCtor::Impure => write!(f, "Impure"),
        TypeCtor::Effect(sym) => write!(f, "{}", sym),
        TypeCtor::Union => binop(f, args, "+"),
        TypeCtor::Intersection => binop(f, args, "&"),
        TypeCtor::Complement => match args {
            [x] => write!(f, "~{}", paren_eff(x)),
            _ => write!(f, "~"),
        },

        TypeCtor::Relation => named_app(f, "Relation", args),
        TypeCtor::Lattice => named_app(f, "Lattice", args),
    }
}

fn named_app(f: &mut fmt::Formatter<'_>, name: &str, args: &[&Type]) -> fmt::Result {
    write!(f, "{}", name)?;
    write_bracketed_args(f, args)
}

fn binop(f: &mut fmt::Formatter<'_>, args: &[&Type], op: &str) -> fmt::Result {
    match args {
        [a, b] => write!(f, "{} {} {}", paren_eff(a), op, paren_eff(b)),
        _ => write!(f, "({})", op),
    }
}

/// Wrap compound effect operands in parentheses.
fn paren_eff(t: &Type) -> String {
    match t.head_ctor() {
        Some(TypeCtor::Union) | Some(TypeCtor::Intersection) => format!("({})", t),
        _ => t.to_string(),
    }
}

/// Print a row: fields separated by commas, `| tail` for an open row.
fn display_row(f: &mut fmt::Formatter<'_>, row: &Type, sep: &str) -> fmt::Result {
    let (head, args) = row.spine();
    match head {
        Type::Cst(tc @ (TypeCtor::RecordRowExtend(_) | TypeCtor::SchemaRowExtend(_))) => {
            display_row_ctor(f, tc, &args, sep)
        }
        Type::Cst(TypeCtor::RecordRowEmpty) | Type::Cst(TypeCtor::SchemaRowEmpty) => Ok(()),
        _ => write!(f, "| {}", row),
    }
}

fn display_row_ctor(
    f: &mut fmt::Formatter<'_>,
    tc: &TypeCtor,
    args: &[&Type],
    sep: &str,
) -> fmt::Result {
    let label = match tc {
        TypeCtor::RecordRowExtend(l) => l.to_string(),
        TypeCtor::SchemaRowExtend(p) => p.to_string(),
        _ => unreachable!(),
    };
    match args {
        [tpe, rest] => {
            write!(f, "{}{}{}", label, sep, tpe)?;
            match rest.head_ctor() {
                Some(TypeCtor::RecordRowEmpty) | Some(TypeCtor::SchemaRowEmpty) => Ok(()),
                Some(TypeCtor::RecordRowExtend(_)) | Some(TypeCtor::SchemaRowExtend(_)) => {
                    write!(f, ", ")?;
                    display_row(f, rest, sep)
                }
                _ => write!(f, " | {}", rest),
            }
        }
        _ => write!(f, "{}", label),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::var::fresh_named_type_var;

    #[test]
    fn test_arrow_roundtrip() {
        let t = Type::mk_arrow(
            vec![Type::int32(), Type::bool()],
            Type::pure(),
            Type::string(),
        );
        let (params, eff, result) = t.arrow_parts().unwrap();
        assert_eq!(params.len(), 2);
        assert!(eff.is_pure());
        assert_eq!(result, &Type::string());
    }

    #[test]
    fn test_arrow_kind() {
        let t = Type::mk_arrow(vec![Type::int32()], Type::pure(), Type::int32());
        assert_eq!(t.kind(), Kind::Star);
    }

    #[test]
    fn test_union_laws() {
        let a = Type::Var(fresh_named_type_var("e", Kind::Bool));
        assert_eq!(Type::mk_union(Type::pure(), a.clone()), a);
        assert_eq!(Type::mk_union(a.clone(), Type::impure()), Type::impure());
        assert_eq!(Type::mk_union(a.clone(), a.clone()), a);
        assert_eq!(
            Type::mk_union(a.clone(), Type::mk_complement(a.clone())),
            Type::impure()
        );
    }

    #[test]
    fn test_complement_involution() {
        let a = Type::Var(fresh_named_type_var("e", Kind::Bool));
        assert_eq!(Type::mk_complement(Type::mk_complement(a.clone())), a);
        assert_eq!(Type::mk_complement(Type::pure()), Type::impure());
    }

    #[test]
    fn test_record_display() {
        let row = Type::mk_record_row_extend(
            Label::new("x"),
            Type::int32(),
            Type::mk_record_row_extend(Label::new("y"), Type::bool(), Type::record_row_empty()),
        );
        let t = Type::mk_record(row);
        assert_eq!(t.to_string(), "{ x = Int32, y = Bool }");
    }

    #[test]
    fn test_open_record_display() {
        let r = fresh_named_type_var("r", Kind::RecordRow);
        let row = Type::mk_record_row_extend(Label::new("x"), Type::int32(), Type::Var(r));
        let t = Type::mk_record(row);
        assert_eq!(t.to_string(), "{ x = Int32 | r }");
    }

    #[test]
    fn test_arrow_display() {
        let t = Type::mk_arrow(vec![Type::int32()], Type::impure(), Type::bool());
        assert_eq!(t.to_string(), "(Int32) -> Bool \\ Impure");
    }

    #[test]
    fn test_spine() {
        let t = Type::mk_array(Type::int32(), Type::pure());
        let (head, args) = t.spine();
        assert_eq!(head, &Type::Cst(TypeCtor::Array));
        assert_eq!(args.len(), 2);
    }

    #[test]
    fn test_alias_expansion() {
        let alias = Type::Alias {
            sym: TypeAliasSym::new(1, "MyInt"),
            args: vec![],
            tpe: Box::new(Type::int32()),
        };
        assert_eq!(alias.expand_aliases(), Type::int32());
        assert_eq!(alias.kind(), Kind::Star);
    }
}
