mod common;

use common::*;
use pretty_assertions::assert_eq;
use suite_tooth::spec::literal::{Literal, AFTER_ALL, BEFORE_ALL, BEFORE_EACH, ONLY, SKIP};
use suite_tooth::{context, SpecNode, SuiteError, TestFn};

fn test(f: TestFn) -> Literal {
    f.into()
}

#[tokio::test]
async fn before_each_array_counts_three() {
    let spec = SpecNode::from_literal(Literal::object([(
        "FOO",
        Literal::object([
            (
                BEFORE_EACH,
                Literal::array([
                    test(increment("count")),
                    test(increment("count")),
                    test(increment("count")),
                ]),
            ),
            ("test", noop().into()),
        ]),
    )]))
    .unwrap();
    let (ctx, _) = run(&spec).await;
    assert_eq!(ctx, context! { "count" => 3 });
}

#[tokio::test]
async fn hooks_alone_never_run() {
    let spec = SpecNode::from_literal(Literal::object([(
        "FOOBAR",
        Literal::object([
            (BEFORE_ALL, test(increment("before"))),
            (AFTER_ALL, test(increment("after"))),
        ]),
    )]))
    .unwrap();
    let (ctx, _) = run(&spec).await;
    assert!(!ctx.contains_key("before"));
    assert!(!ctx.contains_key("after"));
}

#[tokio::test]
async fn reserved_flags_filter_like_wrappers() {
    let spec = SpecNode::from_literal(Literal::object([
        (
            "skipped",
            Literal::object([(SKIP, true.into()), ("x", marks("x").into())]),
        ),
        (
            "focused",
            Literal::object([(ONLY, true.into()), ("y", marks("y").into())]),
        ),
        ("ignored", marks("z").into()),
    ]))
    .unwrap();
    let (ctx, _) = run(&spec).await;
    assert_eq!(ctx, context! { "y" => true });
}

#[tokio::test]
async fn prefixed_names_in_literals_are_flags() {
    let spec = SpecNode::from_literal(Literal::object([
        ("SKIP: a", marks("a").into()),
        ("ONLY b", marks("b").into()),
        ("c", marks("c").into()),
    ]))
    .unwrap();
    let (ctx, tap) = run(&spec).await;
    assert_eq!(ctx, context! { "b" => true });
    assert!(tap.contains("# Subtest: ONLY b"));
}

#[test]
fn invalid_reserved_values_are_rejected() {
    let err = SpecNode::from_literal(Literal::object([(
        "G",
        Literal::object([(BEFORE_ALL, Literal::Bool(true))]),
    )]))
    .unwrap_err();
    assert!(matches!(err, SuiteError::InvalidReservedKey { ref key, .. } if key == BEFORE_ALL));

    let err = SpecNode::from_literal(Literal::object([(
        "G",
        Literal::object([(SKIP, Literal::array([]))]),
    )]))
    .unwrap_err();
    assert!(matches!(err, SuiteError::InvalidReservedKey { expected: "a bool", .. }));
}

#[test]
fn scalar_roots_are_structural_errors() {
    let err = SpecNode::from_literal(Literal::Null).unwrap_err();
    assert!(matches!(err, SuiteError::InvalidNode { found: "null", .. }));
    assert!(err.is_structural());
}
