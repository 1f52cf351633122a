//! End-to-end tests for the type inference core.
//!
//! Each test builds a small kinded root the way the resolver and kinder
//! would, runs the checker, and inspects the typed root and the error
//! list. Builders at the top keep the scenarios readable.

use std::sync::atomic::{AtomicU32, Ordering};

use nacre_compiler::ast::kinded::*;
use nacre_compiler::ast::shared::*;
use nacre_compiler::ast::typed;
use nacre_compiler::typeck::{check_root, CancelToken, ChangeSet, CheckerConfig};
use nacre_compiler::types::kind::Kind;
use nacre_compiler::types::scheme::{Scheme, TraitConstraint};
use nacre_compiler::types::var::{fresh_named_type_var, fresh_type_var, TypeVarSym};
use nacre_compiler::types::Type;
use nacre_compiler::TypeError;

// ============================================================================
// Builders
// ============================================================================

static NEXT_ID: AtomicU32 = AtomicU32::new(1);

fn next_id() -> u32 {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

fn var_sym(name: &str) -> VarSym {
    VarSym::new(next_id(), name, fresh_type_var(Kind::Star))
}

fn exp(kind: ExprKind) -> Expr {
    Expr {
        kind,
        tvar: fresh_type_var(Kind::Star),
        loc: Span::dummy(),
    }
}

fn evar() -> TypeVarSym {
    fresh_type_var(Kind::Bool)
}

fn int(i: i32) -> Expr {
    exp(ExprKind::Cst(Literal::Int32(i)))
}

fn use_var(sym: &VarSym) -> Expr {
    exp(ExprKind::Var(sym.clone()))
}

fn mk_def(
    name: &str,
    quantifiers: Vec<TypeVarSym>,
    tconstrs: Vec<TraitConstraint>,
    fparams: Vec<(VarSym, Type)>,
    ret: Type,
    eff: Type,
    body: Expr,
) -> Def {
    let params: Vec<FormalParam> = fparams
        .into_iter()
        .map(|(sym, tpe)| FormalParam {
            sym,
            tpe,
            loc: Span::dummy(),
        })
        .collect();
    let base = Type::mk_arrow(
        params.iter().map(|p| p.tpe.clone()).collect(),
        eff.clone(),
        ret.clone(),
    );
    Def {
        sym: DefnSym::new(next_id(), name),
        spec: FnSpec {
            fparams: params,
            scheme: Scheme::new(quantifiers, tconstrs, Vec::new(), base),
            ret_tpe: ret,
            eff,
            loc: Span::dummy(),
        },
        exp: body,
    }
}

fn root_with_defs(defs: Vec<Def>) -> Root {
    let mut root = Root::default();
    for def in defs {
        root.defs.insert(def.sym.clone(), def);
    }
    root
}

fn check(root: &Root) -> (typed::Root, Vec<TypeError>) {
    check_root(root, &CheckerConfig::default(), None, &CancelToken::new())
}

/// A trait declaration with a single signature and no default body.
fn mk_trait(name: &str, sig_name: &str, sig_scheme_of: impl Fn(&TypeVarSym) -> Scheme) -> (TraitDecl, Sig) {
    let trt = TraitSym::new(next_id(), name);
    let tparam = fresh_named_type_var("a", Kind::Star);
    let sig_sym = SigSym::new(next_id(), sig_name);
    let scheme = sig_scheme_of(&tparam);
    let (fparams, ret, eff) = match scheme.base.arrow_parts() {
        Some((params, eff, ret)) => (
            params
                .into_iter()
                .map(|t| FormalParam {
                    sym: var_sym("x"),
                    tpe: t.clone(),
                    loc: Span::dummy(),
                })
                .collect(),
            ret.clone(),
            eff.clone(),
        ),
        None => (Vec::new(), scheme.base.clone(), Type::pure()),
    };
    let sig = Sig {
        sym: sig_sym.clone(),
        trt: trt.clone(),
        spec: FnSpec {
            fparams,
            scheme,
            ret_tpe: ret,
            eff,
            loc: Span::dummy(),
        },
        exp: None,
    };
    let decl = TraitDecl {
        sym: trt,
        tparam,
        super_traits: Vec::new(),
        assocs: Vec::new(),
        sigs: vec![sig_sym],
        loc: Span::dummy(),
    };
    (decl, sig)
}

// ============================================================================
// Polymorphic definitions
// ============================================================================

/// `def id(x: a): a = x` infers the scheme `∀a. a -> a` with a pure
/// effect.
#[test]
fn test_identity() {
    let a = fresh_named_type_var("a", Kind::Star);
    let x = var_sym("x");
    let def = mk_def(
        "id",
        vec![a.clone()],
        Vec::new(),
        vec![(x.clone(), Type::Var(a.clone()))],
        Type::Var(a.clone()),
        Type::pure(),
        use_var(&x),
    );
    let sym = def.sym.clone();
    let (typed_root, errors) = check(&root_with_defs(vec![def]));
    assert!(errors.is_empty(), "unexpected errors: {:?}", errors);

    let scheme = &typed_root.defs[&sym].scheme;
    assert_eq!(scheme.quantifiers.len(), 1);
    let (params, eff, ret) = scheme.base.arrow_parts().unwrap();
    assert!(eff.is_pure());
    assert_eq!(params[0], ret);
}

/// `def twice(f: a ->{e} a, x: a): a \ e = f(f(x))` is effect
/// polymorphic in the function argument.
#[test]
fn test_twice_effect_polymorphic() {
    let a = fresh_named_type_var("a", Kind::Star);
    let e = fresh_named_type_var("e", Kind::Bool);
    let f = var_sym("f");
    let x = var_sym("x");
    let f_tpe = Type::mk_arrow(
        vec![Type::Var(a.clone())],
        Type::Var(e.clone()),
        Type::Var(a.clone()),
    );
    let inner = exp(ExprKind::Apply {
        func: Box::new(use_var(&f)),
        args: vec![use_var(&x)],
        evar: evar(),
    });
    let body = exp(ExprKind::Apply {
        func: Box::new(use_var(&f)),
        args: vec![inner],
        evar: evar(),
    });
    let def = mk_def(
        "twice",
        vec![a.clone(), e.clone()],
        Vec::new(),
        vec![(f.clone(), f_tpe), (x.clone(), Type::Var(a.clone()))],
        Type::Var(a.clone()),
        Type::Var(e.clone()),
        body,
    );
    let sym = def.sym.clone();
    let (typed_root, errors) = check(&root_with_defs(vec![def]));
    assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
    assert_eq!(typed_root.defs[&sym].scheme.quantifiers.len(), 2);
}

/// `def bad(): Int32 = true` is a mismatch at the body.
#[test]
fn test_body_mismatch() {
    let def = mk_def(
        "bad",
        Vec::new(),
        Vec::new(),
        Vec::new(),
        Type::int32(),
        Type::pure(),
        exp(ExprKind::Cst(Literal::Bool(true))),
    );
    let sym = def.sym.clone();
    let (typed_root, errors) = check(&root_with_defs(vec![def]));
    assert_eq!(errors.len(), 1);
    assert!(matches!(errors[0], TypeError::UnexpectedType { .. }));
    // The failed def keeps its declared shape with an error body.
    assert!(matches!(
        typed_root.defs[&sym].exp.kind,
        typed::ExprKind::Error
    ));
    assert_eq!(typed_root.defs[&sym].exp.tpe, Type::int32());
}

/// `def get(r: { x: Int32 | ρ }): Int32 = r.x` is row polymorphic.
#[test]
fn test_row_polymorphic_select() {
    let rho = fresh_named_type_var("r", Kind::RecordRow);
    let r = var_sym("r");
    let rec_tpe = Type::mk_record(Type::mk_record_row_extend(
        Label::new("x"),
        Type::int32(),
        Type::Var(rho.clone()),
    ));
    let body = exp(ExprKind::RecordSelect {
        exp: Box::new(use_var(&r)),
        label: Label::new("x"),
    });
    let def = mk_def(
        "get",
        vec![rho],
        Vec::new(),
        vec![(r.clone(), rec_tpe)],
        Type::int32(),
        Type::pure(),
        body,
    );
    let (_, errors) = check(&root_with_defs(vec![def]));
    assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
}

/// Record extension and restriction round-trip through open rows.
#[test]
fn test_record_extend_restrict() {
    // def f(): Int32 = ({ x = 1 | {} }).x
    let extended = exp(ExprKind::RecordExtend {
        label: Label::new("x"),
        value: Box::new(int(1)),
        rest: Box::new(exp(ExprKind::RecordEmpty)),
    });
    let body = exp(ExprKind::RecordSelect {
        exp: Box::new(extended),
        label: Label::new("x"),
    });
    let def = mk_def(
        "f",
        Vec::new(),
        Vec::new(),
        Vec::new(),
        Type::int32(),
        Type::pure(),
        body,
    );
    let (_, errors) = check(&root_with_defs(vec![def]));
    assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
}

// ============================================================================
// Regions
// ============================================================================

fn scope_of(body_of: impl FnOnce(&VarSym) -> Expr) -> Expr {
    let handle = var_sym("rc");
    let regvar = fresh_type_var(Kind::Bool);
    let body = body_of(&handle);
    exp(ExprKind::Scope {
        sym: handle,
        regvar,
        exp: Box::new(body),
    })
}

/// `region rc { let p = ref 1 @ rc; deref p }` purifies the region out
/// of the effect and types as `Int32`.
#[test]
fn test_region_purification() {
    let body = scope_of(|handle| {
        let p = var_sym("p");
        let alloc = exp(ExprKind::Ref {
            exp: Box::new(int(1)),
            region: Box::new(use_var(handle)),
        });
        let read = exp(ExprKind::Deref {
            exp: Box::new(use_var(&p)),
        });
        exp(ExprKind::Let {
            sym: p,
            exp1: Box::new(alloc),
            exp2: Box::new(read),
        })
    });
    let def = mk_def(
        "f",
        Vec::new(),
        Vec::new(),
        Vec::new(),
        Type::int32(),
        Type::pure(),
        body,
    );
    let (_, errors) = check(&root_with_defs(vec![def]));
    assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
}

/// `region rc { ref 1 @ rc }` lets the region escape through the result
/// type and is rejected.
#[test]
fn test_region_escape() {
    let body = scope_of(|handle| {
        exp(ExprKind::Ref {
            exp: Box::new(int(1)),
            region: Box::new(use_var(handle)),
        })
    });
    let rq = fresh_named_type_var("r", Kind::Bool);
    let def = mk_def(
        "g",
        vec![rq.clone()],
        Vec::new(),
        Vec::new(),
        Type::mk_ref(Type::int32(), Type::Var(rq)),
        Type::pure(),
        body,
    );
    let (_, errors) = check(&root_with_defs(vec![def]));
    assert!(
        errors
            .iter()
            .any(|e| matches!(e, TypeError::RegionEscape { .. })),
        "expected a region escape, got: {:?}",
        errors
    );
}

/// Channels allocated inside a region type as a sender/receiver pair and
/// the region purifies away.
#[test]
fn test_channels_in_region() {
    let body = scope_of(|handle| {
        let ch = var_sym("ch");
        let alloc = exp(ExprKind::NewChannel {
            region: Box::new(use_var(handle)),
            capacity: Box::new(int(10)),
        });
        exp(ExprKind::Let {
            sym: ch,
            exp1: Box::new(alloc),
            exp2: Box::new(exp(ExprKind::Cst(Literal::Unit))),
        })
    });
    let def = mk_def(
        "c",
        Vec::new(),
        Vec::new(),
        Vec::new(),
        Type::unit(),
        Type::pure(),
        body,
    );
    let (_, errors) = check(&root_with_defs(vec![def]));
    assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
}

// ============================================================================
// Traits
// ============================================================================

/// `def eq3(x: b, y: b): Bool = eq(x, y)` without a declared `Eq[b]`
/// constraint reports the specialized missing-equality error.
#[test]
fn test_missing_eq_constraint() {
    let (eq_trait, eq_sig) = mk_trait("Eq", "eq", |a| {
        Scheme::new(
            vec![a.clone()],
            vec![TraitConstraint::new(
                TraitSym::new(0, "Eq"),
                Type::Var(a.clone()),
                Span::dummy(),
            )],
            Vec::new(),
            Type::mk_arrow(
                vec![Type::Var(a.clone()), Type::Var(a.clone())],
                Type::pure(),
                Type::bool(),
            ),
        )
    });
    // Fix the constraint to the real trait symbol.
    let mut eq_sig = eq_sig;
    eq_sig.spec.scheme.tconstrs[0].sym = eq_trait.sym.clone();

    let b = fresh_named_type_var("b", Kind::Star);
    let x = var_sym("x");
    let y = var_sym("y");
    let body = exp(ExprKind::Apply {
        func: Box::new(exp(ExprKind::Sig(eq_sig.sym.clone()))),
        args: vec![use_var(&x), use_var(&y)],
        evar: evar(),
    });
    let def = mk_def(
        "eq3",
        vec![b.clone()],
        Vec::new(),
        vec![
            (x.clone(), Type::Var(b.clone())),
            (y.clone(), Type::Var(b.clone())),
        ],
        Type::bool(),
        Type::pure(),
        body,
    );

    let mut root = root_with_defs(vec![def]);
    root.traits.insert(eq_trait.sym.clone(), eq_trait);
    root.sigs.insert(eq_sig.sym.clone(), eq_sig);

    let (_, errors) = check(&root);
    assert!(
        errors.iter().any(|e| matches!(e, TypeError::MissingEq { .. })),
        "expected MissingEq, got: {:?}",
        errors
    );
}

/// A repeated trait constraint is reported as redundant.
#[test]
fn test_redundant_constraint() {
    let (show_trait, show_sig) = mk_trait("Show", "show", |a| {
        Scheme::new(
            vec![a.clone()],
            Vec::new(),
            Vec::new(),
            Type::mk_arrow(vec![Type::Var(a.clone())], Type::pure(), Type::string()),
        )
    });

    let a = fresh_named_type_var("a", Kind::Star);
    let x = var_sym("x");
    let c = TraitConstraint::new(show_trait.sym.clone(), Type::Var(a.clone()), Span::dummy());
    let def = mk_def(
        "h",
        vec![a.clone()],
        vec![c.clone(), c],
        vec![(x.clone(), Type::Var(a.clone()))],
        Type::Var(a),
        Type::pure(),
        use_var(&x),
    );

    let mut root = root_with_defs(vec![def]);
    root.traits.insert(show_trait.sym.clone(), show_trait);
    root.sigs.insert(show_sig.sym.clone(), show_sig);

    let (_, errors) = check(&root);
    assert!(
        errors
            .iter()
            .any(|e| matches!(e, TypeError::RedundantTraitConstraint { .. })),
        "expected RedundantTraitConstraint, got: {:?}",
        errors
    );
}

/// An instance member checked against the trait signature specialized to
/// the instance head.
#[test]
fn test_instance_member_ok() {
    let (show_trait, show_sig) = mk_trait("Show", "show", |a| {
        Scheme::new(
            vec![a.clone()],
            Vec::new(),
            Vec::new(),
            Type::mk_arrow(vec![Type::Var(a.clone())], Type::pure(), Type::string()),
        )
    });

    let x = var_sym("x");
    let member = mk_def(
        "show",
        Vec::new(),
        Vec::new(),
        vec![(x.clone(), Type::int32())],
        Type::string(),
        Type::pure(),
        exp(ExprKind::Cst(Literal::Str("42".to_string()))),
    );

    let mut root = Root::default();
    root.instances.insert(
        show_trait.sym.clone(),
        vec![Instance {
            trt: show_trait.sym.clone(),
            tpe: Type::int32(),
            tconstrs: Vec::new(),
            assocs: Vec::new(),
            defs: vec![member],
            loc: Span::dummy(),
        }],
    );
    root.traits.insert(show_trait.sym.clone(), show_trait);
    root.sigs.insert(show_sig.sym.clone(), show_sig);

    let (_, errors) = check(&root);
    assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
}

// ============================================================================
// Effects and handlers
// ============================================================================

fn emit_effect() -> (EffectDecl, OpSym) {
    let eff_sym = EffectSym::new(next_id(), "Emit");
    let op_sym = OpSym::new(next_id(), "emit");
    let x = var_sym("x");
    let decl = EffectDecl {
        sym: eff_sym.clone(),
        ops: vec![OpDecl {
            sym: op_sym.clone(),
            eff: eff_sym,
            fparams: vec![FormalParam {
                sym: x,
                tpe: Type::int32(),
                loc: Span::dummy(),
            }],
            ret_tpe: Type::unit(),
            loc: Span::dummy(),
        }],
        loc: Span::dummy(),
    };
    (decl, op_sym)
}

/// `try { do emit(1) } with Emit { def emit(x) = () }` handles the
/// effect away; the block is pure.
#[test]
fn test_handler_discharges_effect() {
    let (decl, op_sym) = emit_effect();
    let eff_sym = decl.sym.clone();

    let do_exp = exp(ExprKind::Do {
        op: op_sym.clone(),
        args: vec![int(1)],
    });
    let hx = var_sym("x");
    let body = exp(ExprKind::TryWith {
        exp: Box::new(do_exp),
        eff: eff_sym.clone(),
        rules: vec![HandlerRule {
            op: op_sym,
            fparams: vec![FormalParam {
                sym: hx,
                tpe: Type::int32(),
                loc: Span::dummy(),
            }],
            exp: exp(ExprKind::Cst(Literal::Unit)),
        }],
    });
    let def = mk_def(
        "run",
        Vec::new(),
        Vec::new(),
        Vec::new(),
        Type::unit(),
        Type::pure(),
        body,
    );

    let mut root = root_with_defs(vec![def]);
    root.effects.insert(eff_sym, decl);

    let (_, errors) = check(&root);
    assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
}

/// An unhandled `do` makes a pure-declared definition fail.
#[test]
fn test_unhandled_effect_rejected() {
    let (decl, op_sym) = emit_effect();
    let eff_sym = decl.sym.clone();
    let body = exp(ExprKind::Do {
        op: op_sym,
        args: vec![int(1)],
    });
    let def = mk_def(
        "leaky",
        Vec::new(),
        Vec::new(),
        Vec::new(),
        Type::unit(),
        Type::pure(),
        body,
    );
    let mut root = root_with_defs(vec![def]);
    root.effects.insert(eff_sym, decl);

    let (_, errors) = check(&root);
    assert!(
        errors
            .iter()
            .any(|e| matches!(e, TypeError::ImpureDeclaredAsPure { .. })),
        "expected ImpureDeclaredAsPure, got: {:?}",
        errors
    );
}

/// `do emit(1, 2)` has the wrong operation arity.
#[test]
fn test_op_param_count() {
    let (decl, op_sym) = emit_effect();
    let eff_sym = decl.sym.clone();
    let body = exp(ExprKind::Do {
        op: op_sym,
        args: vec![int(1), int(2)],
    });
    let def = mk_def(
        "wrong",
        Vec::new(),
        Vec::new(),
        Vec::new(),
        Type::unit(),
        Type::impure(),
        body,
    );
    let mut root = root_with_defs(vec![def]);
    root.effects.insert(eff_sym, decl);

    let (_, errors) = check(&root);
    assert!(
        errors
            .iter()
            .any(|e| matches!(e, TypeError::InvalidOpParamCount { .. })),
        "expected InvalidOpParamCount, got: {:?}",
        errors
    );
}

/// A suspended computation must be pure.
#[test]
fn test_lazy_requires_purity() {
    let field = NativeFieldSig {
        class: NativeClass::new("java.lang.System"),
        name: "out".to_string(),
        tpe: Type::int32(),
    };
    let body = exp(ExprKind::Lazy {
        exp: Box::new(exp(ExprKind::GetStaticField { field })),
    });
    let def = mk_def(
        "l",
        Vec::new(),
        Vec::new(),
        Vec::new(),
        Type::mk_lazy(Type::int32()),
        Type::pure(),
        body,
    );
    let (_, errors) = check(&root_with_defs(vec![def]));
    assert!(
        errors
            .iter()
            .any(|e| matches!(e, TypeError::UnexpectedType { .. })),
        "expected a purity violation, got: {:?}",
        errors
    );
}

// ============================================================================
// Pattern matching
// ============================================================================

/// Matching over `Option[Int32]` with a payload binder.
#[test]
fn test_match_enum() {
    let a = fresh_named_type_var("a", Kind::Star);
    let opt = EnumSym::new(next_id(), "Option");
    let none = CaseSym::new(next_id(), "None");
    let some = CaseSym::new(next_id(), "Some");
    let mut cases = std::collections::BTreeMap::new();
    cases.insert(
        none.clone(),
        CaseDecl {
            sym: none.clone(),
            payload: None,
            loc: Span::dummy(),
        },
    );
    cases.insert(
        some.clone(),
        CaseDecl {
            sym: some.clone(),
            payload: Some(Type::Var(a.clone())),
            loc: Span::dummy(),
        },
    );
    let decl = EnumDecl {
        sym: opt.clone(),
        tparams: vec![a],
        cases,
        loc: Span::dummy(),
    };

    let x = var_sym("x");
    let y = var_sym("y");
    let pat = |kind| Pattern {
        kind,
        tvar: fresh_type_var(Kind::Star),
        loc: Span::dummy(),
    };
    let body = exp(ExprKind::Match {
        exp: Box::new(use_var(&x)),
        rules: vec![
            MatchRule {
                pat: pat(PatternKind::Tag {
                    enum_sym: opt.clone(),
                    case_sym: none,
                    pat: None,
                }),
                guard: None,
                exp: int(0),
            },
            MatchRule {
                pat: pat(PatternKind::Tag {
                    enum_sym: opt.clone(),
                    case_sym: some,
                    pat: Some(Box::new(pat(PatternKind::Var(y.clone())))),
                }),
                guard: None,
                exp: use_var(&y),
            },
        ],
    });

    let param_tpe = Type::mk_enum(opt.clone(), decl.kind(), vec![Type::int32()]);
    let def = mk_def(
        "m",
        Vec::new(),
        Vec::new(),
        vec![(x.clone(), param_tpe)],
        Type::int32(),
        Type::pure(),
        body,
    );
    let mut root = root_with_defs(vec![def]);
    root.enums.insert(opt, decl);

    let (_, errors) = check(&root);
    assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
}

/// Type match rigidifies the matched type's variables per rule.
#[test]
fn test_type_match() {
    let a = fresh_named_type_var("a", Kind::Star);
    let x = var_sym("x");
    let y = var_sym("y");
    let z = var_sym("z");
    let other = fresh_named_type_var("b", Kind::Star);
    let body = exp(ExprKind::TypeMatch {
        exp: Box::new(use_var(&x)),
        rules: vec![
            TypeMatchRule {
                sym: y.clone(),
                tpe: Type::int32(),
                exp: use_var(&y),
            },
            TypeMatchRule {
                sym: z,
                tpe: Type::Var(other),
                exp: int(0),
            },
        ],
    });
    let def = mk_def(
        "tm",
        vec![a.clone()],
        Vec::new(),
        vec![(x.clone(), Type::Var(a.clone()))],
        Type::int32(),
        Type::pure(),
        body,
    );
    let (_, errors) = check(&root_with_defs(vec![def]));
    assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
}

// ============================================================================
// Driver behavior
// ============================================================================

/// Unchanged definitions copy over from a cached typed root.
#[test]
fn test_incremental_cache_reuse() {
    let x = var_sym("x");
    let def = mk_def(
        "f",
        Vec::new(),
        Vec::new(),
        vec![(x.clone(), Type::int32())],
        Type::int32(),
        Type::pure(),
        use_var(&x),
    );
    let sym = def.sym.clone();
    let root = root_with_defs(vec![def]);

    let (old, errors) = check(&root);
    assert!(errors.is_empty());

    let changes = ChangeSet::default();
    let (again, errors) = check_root(
        &root,
        &CheckerConfig::default(),
        Some((&old, &changes)),
        &CancelToken::new(),
    );
    assert!(errors.is_empty());
    assert_eq!(again.defs[&sym].scheme, old.defs[&sym].scheme);
}

/// A well-formed entry point passes; a misshapen one is reported.
#[test]
fn test_entry_point_signature() {
    let u = var_sym("u");
    let good = mk_def(
        "main",
        Vec::new(),
        Vec::new(),
        vec![(u.clone(), Type::unit())],
        Type::unit(),
        Type::pure(),
        exp(ExprKind::Cst(Literal::Unit)),
    );
    let sym = good.sym.clone();
    let mut root = root_with_defs(vec![good]);
    root.entry_point = Some(sym);
    let (_, errors) = check(&root);
    assert!(errors.is_empty(), "unexpected errors: {:?}", errors);

    let bad = mk_def(
        "main",
        Vec::new(),
        Vec::new(),
        Vec::new(),
        Type::int32(),
        Type::pure(),
        int(0),
    );
    let sym = bad.sym.clone();
    let mut root = root_with_defs(vec![bad]);
    root.entry_point = Some(sym);
    let (_, errors) = check(&root);
    assert!(
        errors
            .iter()
            .any(|e| matches!(e, TypeError::IllegalEntryPointSignature { .. })),
        "expected IllegalEntryPointSignature, got: {:?}",
        errors
    );
}

/// Serial and parallel checking agree.
#[test]
fn test_serial_parallel_agree() {
    let defs: Vec<Def> = (0..8)
        .map(|i| {
            let x = var_sym("x");
            mk_def(
                &format!("f{}", i),
                Vec::new(),
                Vec::new(),
                vec![(x.clone(), Type::int32())],
                Type::int32(),
                Type::pure(),
                use_var(&x),
            )
        })
        .collect();
    let root = root_with_defs(defs);

    let serial = CheckerConfig {
        parallel: false,
        ..CheckerConfig::default()
    };
    let (r1, e1) = check_root(&root, &serial, None, &CancelToken::new());
    let (r2, e2) = check_root(&root, &CheckerConfig::default(), None, &CancelToken::new());
    assert!(e1.is_empty() && e2.is_empty());
    let k1: Vec<_> = r1.defs.keys().cloned().collect();
    let k2: Vec<_> = r2.defs.keys().cloned().collect();
    assert_eq!(k1, k2);
}
