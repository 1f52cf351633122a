//! The typed AST
//!
//! The output of the type checker: the same shape as the kinded tree,
//! but every expression and pattern node carries its concrete type and
//! effect (any still-unresolved variables appear consistently
//! substituted), and every definition carries its inferred scheme.
//!
//! A definition that failed to check has its body replaced by an
//! `ExprKind::Error` sentinel typed at the declared type and effect, so
//! downstream phases keep their shape.

use std::collections::BTreeMap;

use crate::types::scheme::{Scheme, TraitConstraint};
use crate::types::Type;

use super::kinded::{
    AssocTypeDef, Denotation, EffectDecl, EnumDecl, FnSpec, FormalParam, NativeFieldSig,
    NativeMethodSig, Polarity, TraitDecl, TypeAliasDecl,
};
use super::shared::{
    BinaryOp, CaseSym, DefnSym, EffectSym, EnumSym, Label, Literal, NativeClass, OpSym, PredSym,
    SigSym, SourceId, Span, TraitSym, TypeAliasSym, UnaryOp, VarSym,
};

// ============================================================================
// Root
// ============================================================================

/// A fully checked compilation unit.
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
    /// The trait environment the unit was checked under.
    pub trait_env: crate::typeck::context::TraitEnv,
    /// The associated-type definitions the unit was checked under.
    pub eq_env: crate::typeck::context::EqualityEnv,
    pub entry_point: Option<DefnSym>,
    pub sources: BTreeMap<SourceId, String>,
}

#[derive(Debug, Clone)]
pub struct Def {
    pub sym: DefnSym,
    pub spec: FnSpec,
    pub exp: Expr,
    /// The inferred scheme.
    pub scheme: Scheme,
}

#[derive(Debug, Clone)]
pub struct Sig {
    pub sym: SigSym,
    pub trt: TraitSym,
    pub spec: FnSpec,
    pub exp: Option<Expr>,
    pub scheme: Scheme,
}

#[derive(Debug, Clone)]
pub struct Instance {
    pub trt: TraitSym,
    pub tpe: Type,
    pub tconstrs: Vec<TraitConstraint>,
    pub assocs: Vec<AssocTypeDef>,
    pub defs: Vec<Def>,
    pub loc: Span,
}

// ============================================================================
// Expressions
// ============================================================================

#[derive(Debug, Clone)]
pub struct Expr {
    pub kind: ExprKind,
    pub tpe: Type,
    pub eff: Type,
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
    LetRec {
        sym: VarSym,
        exp1: Box<Expr>,
        exp2: Box<Expr>,
    },
    Scope {
        sym: VarSym,
        regvar: crate::types::var::TypeVarSym,
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
    },
    CheckedTypeCast {
        exp: Box<Expr>,
    },
    CheckedEffectCast {
        exp: Box<Expr>,
    },
    UncheckedCast {
        exp: Box<Expr>,
        declared_tpe: Option<Type>,
        declared_eff: Option<Type>,
    },
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
    /// A definition body that failed to check, typed at the declared
    /// type and effect.
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

#[derive(Debug, Clone)]
pub struct Pattern {
    pub kind: PatternKind,
    pub tpe: Type,
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
        rest: Box<Pattern>,
    },
}
