use std::sync::Arc;

use crate::core::{Function, Namespace};
use crate::{
    CasError, Evaluator, Expr, PatternTransform, Solver, TransformSet, evaluate, expand, matrix,
    parse, parse_with,
};

fn eval(input: &str) -> Expr {
    evaluate(&parse(input).unwrap())
}

#[test]
fn test_solver_builder_configuration() {
    let equations = [parse("x + y == 3").unwrap(), parse("x - y == 1").unwrap()];
    let unknowns = [Expr::variable("x"), Expr::variable("y")];

    // Defaults: full pivoting and back substitution
    let full = Solver::new().solve(&equations, &unknowns).unwrap();
    assert_eq!(full.len(), 2);

    let partial = Solver::new()
        .full_pivoting(false)
        .back_substitute(false)
        .solve(&equations, &unknowns)
        .unwrap();
    assert_eq!(partial.len(), 2);
    // The last solution may refer to unknowns solved before it
    let substituted = evaluate(&partial[1].substitute(&partial[..1]));
    assert!(full.contains(&substituted));
}

#[test]
fn test_solve_reports_bad_input() {
    let err = Solver::new()
        .solve(&[parse("x <= 1").unwrap()], &[Expr::variable("x")])
        .unwrap_err();
    assert!(matches!(err, CasError::NotAnEquation { .. }));
    assert_eq!(err.to_string(), "Not an equation: x <= 1");
}

#[test]
fn test_partial_solve_through_the_parser() {
    let result = eval("PartialSolve({x + y == 3, x - y == 1}, {x, y})");
    assert_eq!(result.set_members().len(), 2);
    assert!(result.set_members().iter().all(|m| m.as_arrow().is_some()));
}

#[test]
fn test_custom_namespace_functions() {
    let mut ns = Namespace::standard();
    let t = Expr::variable("t");
    ns.define_function(Function::expression(
        "Cube",
        vec![t.clone()],
        Expr::power(t, Expr::integer(3)),
    ))
    .define_value("k", Expr::integer(2));

    let e = parse_with("Cube(k) + Cube(z)", &ns).unwrap();
    assert_eq!(evaluate(&e), eval("8 + z^3"));
}

#[test]
fn test_unresolved_names_propagate() {
    let ns = Namespace::new();
    assert!(parse_with("Sin(x)", &ns).is_ok());
    assert!(matches!(
        ns.resolve_function("Sin", 1),
        Err(CasError::UnresolvedName { .. })
    ));
}

#[test]
fn test_native_faults_are_absorbed() {
    let mut evaluator = Evaluator::new();
    let e = parse("Factorial(-1) + 1").unwrap();
    let result = evaluator.evaluate(&e);
    assert_eq!(evaluator.faults().len(), 1);
    assert!(!result.is_constant());
}

#[test]
fn test_native_function_from_closure() {
    let double = Arc::new(Function::native("Double", 1..=1, |args: &[Expr]| {
        Ok(args[0]
            .as_constant()
            .map(|c| Expr::constant(c.clone() * crate::Real::from_i64(2))))
    }));
    assert_eq!(
        evaluate(&Expr::call(Arc::clone(&double), vec![Expr::integer(21)])),
        Expr::integer(42)
    );
    let symbolic = Expr::call(double, vec![Expr::variable("q")]);
    assert_eq!(evaluate(&symbolic), symbolic);
}

#[test]
fn test_depends_on_query() {
    assert_eq!(eval("DependsOn(x^2 + y, {x})"), Expr::one());
    assert_eq!(eval("DependsOn(Sin(y), {x, z})"), Expr::zero());
    assert!(crate::evaluate::depends_on(&parse("f(a*x)").unwrap(), &[parse("a*x").unwrap()]));
}

#[test]
fn test_expand_and_substitute() {
    let e = parse("(a + b)^3").unwrap();
    assert_eq!(expand(&e), eval("a^3 + 3*a^2*b + 3*a*b^2 + b^3"));
    assert_eq!(eval("x^2 + x : {x -> 3}"), Expr::integer(12));
}

#[test]
fn test_transform_set_rewrites_trig_identity() {
    let mut rules = TransformSet::new();
    rules.add(PatternTransform::new(
        parse("Sin(u)^2 + Cos(u)^2").unwrap(),
        Expr::one(),
    ));
    let e = parse("Sin(x + 1)^2 + Cos(x + 1)^2").unwrap();
    assert_eq!(rules.apply(&e), Some(Expr::one()));
    assert_eq!(rules.apply(&parse("Sin(x)^2").unwrap()), None);
}

#[test]
fn test_matrix_round_trip_through_inverse() {
    let m = parse("[[1, 2][3, 4]]").unwrap();
    let inv = matrix::inverse(&m).unwrap();
    assert_eq!(matrix::mul(&evaluate(&m), &inv).unwrap(), matrix::identity(2));
    assert_eq!(matrix::determinant(&evaluate(&m)).unwrap(), Expr::integer(-2));
}
