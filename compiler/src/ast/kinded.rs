//! The kinded AST
//!
//! The input of the type checker: names are resolved, types are in
//! canonical form, and every type variable has been assigned its kind.
//! Every expression node carries a kinded type variable standing for its
//! result type; nodes whose rule needs a latent effect variable carry one
//! of those too. Pattern variables carry their own type variables through
//! their `VarSym`.

use std::collections::BTreeMap;

use crate::types::kind::Kind;
use crate::types::scheme::{Scheme, TraitConstraint};
use crate::types::var::TypeVarSym;
use crate::types::Type;

use super::shared::{
    AssocTypeSym, BinaryOp, CaseSym, DefnSym, EffectSym, EnumSym, Label, Literal, NativeClass,
    OpSym, PredSym, SigSym, SourceId, Span, TraitSym, TypeAliasSym, UnaryOp, VarSym,
};

// ============================================================================
// Root
// ============================================================================

/// A complete compilation unit, ready for type checking.
#[derive(Debug, Clone, Default)]
pub struct Root {
    pub traits: BTreeMap<TraitSym, TraitDecl>,
    pub instances: BTreeMap<TraitSym, Vec<Instance>>,
    pub defs: BTreeMap<DefnSym, Def>,
    pub sigs: BTreeMap<SigSym, Sig>,
    pub enums: BTreeMap<EnumSym, EnumDecl>,
    pub restrictable_enums: BTreeMap<EnumSym, EnumDecl>,
    pub effects: BTreeMap<EffectSym, EffectDecl>,
    pub type_aliases: BTreeMap<TypeAliasSym, TypeAliasDecl>,
    pub entry_point: Option<DefnSym>,
    /// Source file names, for diagnostics.
    pub sources: BTreeMap<SourceId, String>,
}

// ============================================================================
// Declarations
// ============================================================================

#[derive(Debug, Clone)]
pub struct TraitDecl {
    pub sym: TraitSym,
    /// The trait's single type parameter.
    pub tparam: TypeVarSym,
    pub super_traits: Vec<TraitSym>,
    pub assocs: Vec<AssocTypeSig>,
    /// Members; the signatures themselves live in `Root::sigs`.
    pub sigs: Vec<SigSym>,
    pub loc: Span,
}

/// An associated type declared by a trait.
#[derive(Debug, Clone)]
pub struct AssocTypeSig {
    pub sym: AssocTypeSym,
    pub kind: Kind,
    pub loc: Span,
}

/// An associated type definition inside an instance.
#[derive(Debug, Clone)]
pub struct AssocTypeDef {
    pub sym: AssocTypeSym,
    /// The instance head the definition is for.
    pub arg: Type,
    pub tpe: Type,
    pub loc: Span,
}

#[derive(Debug, Clone)]
pub struct Instance {
    pub trt: TraitSym,
    /// The instance head.
    pub tpe: Type,
    /// The instance context.
    pub tconstrs: Vec<TraitConstraint>,
    pub assocs: Vec<AssocTypeDef>,
    pub defs: Vec<Def>,
    pub loc: Span,
}

#[derive(Debug, Clone)]
pub struct Def {
    pub sym: DefnSym,
    pub spec: FnSpec,
    pub exp: Expr,
}

#[derive(Debug, Clone)]
pub struct Sig {
    pub sym: SigSym,
    pub trt: TraitSym,
    pub spec: FnSpec,
    /// A default implementation, if the trait provides one.
    pub exp: Option<Expr>,
}

/// The declared interface of a def, sig or effect operation.
#[derive(Debug, Clone)]
pub struct FnSpec {
    pub fparams: Vec<FormalParam>,
    /// The declared scheme; its base is the full arrow type.
    pub scheme: Scheme,
    pub ret_tpe: Type,
    pub eff: Type,
    pub loc: Span,
}

#[derive(Debug, Clone)]
pub struct FormalParam {
    pub sym: VarSym,
    pub tpe: Type,
    pub loc: Span,
}

#[derive(Debug, Clone)]
pub struct EffectDecl {
    pub sym: EffectSym,
    pub ops: Vec<OpDecl>,
    pub loc: Span,
}

#[derive(Debug, Clone)]
pub struct OpDecl {
    pub sym: OpSym,
    pub eff: EffectSym,
    pub fparams: Vec<FormalParam>,
    pub ret_tpe: Type,
    pub loc: Span,
}

#[derive(Debug, Clone)]
pub struct EnumDecl {
    pub sym: EnumSym,
    pub tparams: Vec<TypeVarSym>,
    pub cases: BTreeMap<CaseSym, CaseDecl>,
    pub loc: Span,
}

impl EnumDecl {
    /// The kind of the enum's type constructor.
    pub fn kind(&self) -> Kind {
        Kind::arrow_chain(
            self.tparams.iter().map(|tp| tp.kind.clone()).collect::<Vec<_>>(),
            Kind::Star,
        )
    }
}

#[derive(Debug, Clone)]
pub struct CaseDecl {
    pub sym: CaseSym,
    /// The payload type, mentioning the enum's type parameters.
    pub payload: Option<Type>,
    pub loc: Span,
}

#[derive(Debug, Clone)]
pub struct TypeAliasDecl {
    pub sym: TypeAliasSym,
    pub tparams: Vec<TypeVarSym>,
    pub tpe: Type,
    pub loc: Span,
}

// ============================================================================
// Foreign signatures
// ============================================================================

/// A resolved foreign method: the reflected parameter and return types.
#[derive(Debug, Clone)]
pub struct NativeMethodSig {
    pub class: NativeClass,
    pub name: String,
    pub param_types: Vec<Type>,
    pub ret_tpe: Type,
}

/// A resolved foreign field.
#[derive(Debug, Clone)]
pub struct NativeFieldSig {
    pub class: NativeClass,
    pub name: String,
    pub tpe: Type,
}

// ============================================================================
// Expressions
// ============================================================================

/// An expression node. `tvar` stands for the node's result type; the
/// checker unifies it with the type the typing rule derives.
#[derive(Debug, Clone)]
pub struct Expr {
    pub kind: ExprKind,
    pub tvar: TypeVarSym,
    pub loc: Span,
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    Cst(Literal),
    Var(VarSym),
    Def(DefnSym),
    Sig(SigSym),
    Lambda {
        fparam: FormalParam,
        body: Box<Expr>,
    },
    Apply {
        func: Box<Expr>,
        args: Vec<Expr>,
        /// The latent effect of the applied arrow.
        evar: TypeVarSym,
    },
    Unary {
        op: UnaryOp,
        exp: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        exp1: Box<Expr>,
        exp2: Box<Expr>,
    },
    IfThenElse {
        cond: Box<Expr>,
        then_exp: Box<Expr>,
        else_exp: Box<Expr>,
    },
    Stm {
        exp1: Box<Expr>,
        exp2: Box<Expr>,
    },
    Discard {
        exp: Box<Expr>,
    },
    Let {
        sym: VarSym,
        exp1: Box<Expr>,
        exp2: Box<Expr>,
    },
    /// `let rec`; the bound expression must be a lambda and may refer to
    /// `sym` in its own body.
    LetRec {
        sym: VarSym,
        exp1: Box<Expr>,
        exp2: Box<Expr>,
    },
    /// `region r { exp }`. The handle variable `sym` has type
    /// `Region[regvar]`; `regvar` is rigid inside the scope.
    Scope {
        sym: VarSym,
        regvar: TypeVarSym,
        exp: Box<Expr>,
    },
    Match {
        exp: Box<Expr>,
        rules: Vec<MatchRule>,
    },
    TypeMatch {
        exp: Box<Expr>,
        rules: Vec<TypeMatchRule>,
    },
    Tag {
        enum_sym: EnumSym,
        case_sym: CaseSym,
        exp: Option<Box<Expr>>,
    },
    Tuple {
        exps: Vec<Expr>,
    },
    RecordEmpty,
    RecordSelect {
        exp: Box<Expr>,
        label: Label,
    },
    RecordExtend {
        label: Label,
        value: Box<Expr>,
        rest: Box<Expr>,
    },
    RecordRestrict {
        label: Label,
        rest: Box<Expr>,
    },
    ArrayLit {
        exps: Vec<Expr>,
        region: Box<Expr>,
    },
    ArrayNew {
        elm: Box<Expr>,
        len: Box<Expr>,
        region: Box<Expr>,
    },
    ArrayLoad {
        base: Box<Expr>,
        index: Box<Expr>,
    },
    ArrayStore {
        base: Box<Expr>,
        index: Box<Expr>,
        elm: Box<Expr>,
    },
    ArrayLength {
        base: Box<Expr>,
    },
    VectorLit {
        exps: Vec<Expr>,
    },
    VectorLoad {
        base: Box<Expr>,
        index: Box<Expr>,
    },
    VectorLength {
        base: Box<Expr>,
    },
    Ref {
        exp: Box<Expr>,
        region: Box<Expr>,
    },
    Deref {
        exp: Box<Expr>,
    },
    Assign {
        exp1: Box<Expr>,
        exp2: Box<Expr>,
    },
    Ascribe {
        exp: Box<Expr>,
        expected_tpe: Option<Type>,
        expected_eff: Option<Type>,
    },
    /// The result type is a fresh variable constrained only by context.
    CheckedTypeCast {
        exp: Box<Expr>,
    },
    /// The effect is a fresh variable constrained only by context.
    CheckedEffectCast {
        exp: Box<Expr>,
    },
    UncheckedCast {
        exp: Box<Expr>,
        declared_tpe: Option<Type>,
        declared_eff: Option<Type>,
    },
    /// Asserts that the effect atom is absent from `exp`'s effect.
    Without {
        exp: Box<Expr>,
        eff: EffectSym,
    },
    TryCatch {
        exp: Box<Expr>,
        rules: Vec<CatchRule>,
    },
    TryWith {
        exp: Box<Expr>,
        eff: EffectSym,
        rules: Vec<HandlerRule>,
    },
    Do {
        op: OpSym,
        args: Vec<Expr>,
    },
    /// Allocates a buffered channel; the result is a sender/receiver pair.
    NewChannel {
        region: Box<Expr>,
        capacity: Box<Expr>,
    },
    GetChannel {
        exp: Box<Expr>,
    },
    PutChannel {
        exp1: Box<Expr>,
        exp2: Box<Expr>,
    },
    SelectChannel {
        rules: Vec<SelectChannelRule>,
        default: Option<Box<Expr>>,
    },
    Spawn {
        exp: Box<Expr>,
        region: Box<Expr>,
    },
    Lazy {
        exp: Box<Expr>,
    },
    Force {
        exp: Box<Expr>,
    },
    InvokeConstructor {
        class: NativeClass,
        args: Vec<Expr>,
        param_types: Vec<Type>,
    },
    InvokeMethod {
        method: NativeMethodSig,
        receiver: Box<Expr>,
        args: Vec<Expr>,
    },
    InvokeStaticMethod {
        method: NativeMethodSig,
        args: Vec<Expr>,
    },
    GetField {
        field: NativeFieldSig,
        receiver: Box<Expr>,
    },
    PutField {
        field: NativeFieldSig,
        receiver: Box<Expr>,
        value: Box<Expr>,
    },
    GetStaticField {
        field: NativeFieldSig,
    },
    PutStaticField {
        field: NativeFieldSig,
        value: Box<Expr>,
    },
    FixpointConstraintSet {
        constraints: Vec<FixConstraint>,
    },
    FixpointMerge {
        exp1: Box<Expr>,
        exp2: Box<Expr>,
    },
    FixpointSolve {
        exp: Box<Expr>,
    },
    FixpointFilter {
        pred: PredSym,
        exp: Box<Expr>,
    },
    FixpointInject {
        exp: Box<Expr>,
        pred: PredSym,
    },
    FixpointProject {
        pred: PredSym,
        exp: Box<Expr>,
    },
    /// A hole left by error recovery in an earlier phase.
    Error,
}

#[derive(Debug, Clone)]
pub struct MatchRule {
    pub pat: Pattern,
    pub guard: Option<Expr>,
    pub exp: Expr,
}

#[derive(Debug, Clone)]
pub struct TypeMatchRule {
    pub sym: VarSym,
    /// The matched type; its free variables are rigid inside the rule.
    pub tpe: Type,
    pub exp: Expr,
}

#[derive(Debug, Clone)]
pub struct CatchRule {
    pub sym: VarSym,
    pub class: NativeClass,
    pub exp: Expr,
}

#[derive(Debug, Clone)]
pub struct HandlerRule {
    pub op: OpSym,
    pub fparams: Vec<FormalParam>,
    pub exp: Expr,
}

#[derive(Debug, Clone)]
pub struct SelectChannelRule {
    pub sym: VarSym,
    pub chan: Expr,
    pub exp: Expr,
}

// ============================================================================
// Datalog constraints
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denotation {
    Relational,
    Latticenal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    Positive,
    Negative,
}

#[derive(Debug, Clone)]
pub struct FixConstraint {
    pub head: HeadPredicate,
    pub body: Vec<BodyPredicate>,
    pub loc: Span,
}

#[derive(Debug, Clone)]
pub struct HeadPredicate {
    pub pred: PredSym,
    pub den: Denotation,
    pub terms: Vec<Expr>,
    pub loc: Span,
}

#[derive(Debug, Clone)]
pub enum BodyPredicate {
    Atom {
        pred: PredSym,
        den: Denotation,
        polarity: Polarity,
        terms: Vec<Pattern>,
        loc: Span,
    },
    Guard {
        exp: Expr,
        loc: Span,
    },
}

// ============================================================================
// Patterns
// ============================================================================

/// A pattern node; `tvar` stands for the type of values it matches.
#[derive(Debug, Clone)]
pub struct Pattern {
    pub kind: PatternKind,
    pub tvar: TypeVarSym,
    pub loc: Span,
}

#[derive(Debug, Clone)]
pub enum PatternKind {
    Wild,
    Var(VarSym),
    Cst(Literal),
    Tag {
        enum_sym: EnumSym,
        case_sym: CaseSym,
        pat: Option<Box<Pattern>>,
    },
    Tuple(Vec<Pattern>),
    Record {
        fields: Vec<(Label, Pattern)>,
        /// Matches the remainder of the record.
        rest: Box<Pattern>,
    },
}
