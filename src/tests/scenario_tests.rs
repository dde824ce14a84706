//! End-to-end scenarios through the public API

use crate::core::Ring;
use crate::{Expr, evaluate, parse, solve};

fn eval(input: &str) -> Expr {
    evaluate(&parse(input).unwrap())
}

fn vars(names: &[&str]) -> Vec<Expr> {
    names.iter().map(|n| Expr::variable(n)).collect()
}

#[test]
fn test_like_terms_combine() {
    let result = eval("2*x + 3*x");
    assert_eq!(result, parse("5*x").unwrap());
    assert_eq!(result.to_string(), "5*x");
}

#[test]
fn test_like_terms_combine_whatever_the_factor_order() {
    let result = eval("3*(x + 1)^2 + (x + 1)^2*2");
    assert_eq!(result.to_string(), "5*(x + 1)^2");
    assert_eq!(eval("3*2^x + 2*2^x").to_string(), "5*2^x");
    assert_eq!(eval("2^x*3 - 3*2^x"), Expr::zero());
}

#[test]
fn test_numeric_linear_system() {
    let equations = [parse("2*x + 4*y == 8").unwrap(), parse("x == 2*y + 3").unwrap()];
    let solutions = solve(&equations, &vars(&["x", "y"])).unwrap();
    assert_eq!(
        solutions,
        vec![
            Expr::arrow(Expr::variable("x"), Expr::rational(7, 2)),
            Expr::arrow(Expr::variable("y"), Expr::rational(1, 4)),
        ]
    );
    assert_eq!(Expr::set(solutions).to_string(), "{x -> 3.5, y -> 0.25}");
}

#[test]
fn test_symbolic_linear_system() {
    let equations = [parse("2*x + 4*y == A").unwrap(), parse("x == 2*y + B").unwrap()];
    let solutions = solve(&equations, &vars(&["x", "y"])).unwrap();
    assert_eq!(
        solutions,
        vec![
            Expr::arrow(Expr::variable("x"), eval("A/4 + B/2")),
            Expr::arrow(Expr::variable("y"), eval("A/8 - B/4")),
        ]
    );
}

#[test]
fn test_partial_pivoting_skips_empty_column() {
    let equations = [parse("y + z == 3").unwrap(), parse("z == 1").unwrap()];
    let solutions = crate::Solver::new()
        .full_pivoting(false)
        .solve(&equations, &vars(&["x", "y", "z"]))
        .unwrap();
    assert_eq!(
        solutions,
        vec![
            Expr::arrow(Expr::variable("z"), Expr::one()),
            Expr::arrow(Expr::variable("y"), Expr::integer(2)),
        ]
    );
}

#[test]
fn test_solve_through_the_parser() {
    let result = eval("Solve({2*x + 4*y == 8, x == 2*y + 3}, {x, y})");
    assert_eq!(result, eval("{x -> 7/2, y -> 1/4}"));
}

#[test]
fn test_negated_sum_cancels_against_power() {
    let result = eval("(x - y)^3/(y - x)");
    assert_eq!(result, eval("-(x - y)^2"));
    assert_eq!(result.to_string(), "-(x - y)^2");
}

#[test]
fn test_power_pattern_binds_coefficient_and_exponent() {
    let x = Expr::variable("x");
    let a = Expr::pattern_variable("A", Ring::Reals, {
        let x = x.clone();
        move |e| !e.depends_on(&x)
    });
    let n = Expr::variable_in("n", Ring::Integers);
    let pattern = Expr::product(vec![a.clone(), Expr::power(x.clone(), n.clone())]);

    let ctx = pattern
        .matches(&parse("3*x^2").unwrap(), &[Expr::arrow(x.clone(), x.clone())])
        .unwrap();
    assert_eq!(ctx.get(&a), Some(&Expr::integer(3)));
    assert_eq!(ctx.get(&n), Some(&Expr::integer(2)));
    assert_eq!(ctx.get(&x), Some(&x));

    let pre = [Expr::arrow(x.clone(), x.clone())];
    let ctx = pattern.matches(&eval("y*x^3"), &pre).unwrap();
    assert_eq!(ctx.get(&a), Some(&Expr::variable("y")));
    assert_eq!(ctx.get(&n), Some(&Expr::integer(3)));

    // n ranges over the integers
    assert!(pattern.matches(&eval("3*x^(1/2)"), &pre).is_none());
}
