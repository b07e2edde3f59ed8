use super::*;

#[test]
fn test_name_scope_appends_counters() {
    let mut scope = NameScope::new();
    assert_eq!(&*scope.fresh("target"), "target");
    assert_eq!(&*scope.fresh("target"), "target1");
    assert_eq!(&*scope.fresh("target"), "target2");
    assert_eq!(&*scope.fresh("item"), "item");
}

#[test]
fn test_name_scope_respects_reserved_names() {
    let mut scope = NameScope::new();
    scope.reserve("source");
    assert!(scope.is_used("source"));
    assert_eq!(&*scope.fresh("source"), "source1");
}

#[test]
fn test_substitute_replaces_free_identifiers() {
    let expr = Expr::ident("source").member("Name").call("Trim", vec![]);
    let replaced = expr.substitute("source", &Expr::ident("x"));
    assert_eq!(replaced, Expr::ident("x").member("Name").call("Trim", vec![]));
}

#[test]
fn test_substitute_skips_shadowing_lambda() {
    let lambda = Expr::lambda("x", Expr::ident("x").member("Id"));
    let replaced = lambda.substitute("x", &Expr::ident("y"));
    assert_eq!(replaced, lambda);
}

#[test]
fn test_and_all_joins_conditions() {
    assert_eq!(Expr::and_all(Vec::new()), None);
    let joined = Expr::and_all([Expr::ident("a"), Expr::ident("b")]);
    assert_eq!(
        joined,
        Some(Expr::binary(BinaryOp::And, Expr::ident("a"), Expr::ident("b")))
    );
}

#[test]
fn test_expression_body_becomes_return_statement() {
    let body = Body::Expr(Expr::ident("source"));
    assert_eq!(body.statements(), vec![Stmt::Return(Some(Expr::ident("source")))]);
}
