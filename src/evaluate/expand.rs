//! Polynomial expansion

use crate::core::{Expr, ExprKind, terms_of};

use super::Evaluator;

/// Largest power of a sum that is multiplied out
const MAX_EXPANDED_POWER: i64 = 64;

/// Distribute products over sums and multiply out positive integer powers of
/// sums, then evaluate. Function arguments are left alone.
///
/// # Example
/// ```
/// use symb_algebra::{evaluate, expand, parse};
///
/// let e = parse("(x + 1)^2").unwrap();
/// assert_eq!(expand(&e), evaluate(&parse("x^2 + 2*x + 1").unwrap()));
/// ```
#[must_use]
pub fn expand(expr: &Expr) -> Expr {
    let mut evaluator = Evaluator::new();
    let evaluated = evaluator.evaluate(expr);
    let expanded = expand_node(&evaluated, &mut evaluator);
    evaluator.evaluate(&expanded)
}

fn expand_node(expr: &Expr, evaluator: &mut Evaluator) -> Expr {
    match &expr.kind {
        ExprKind::Sum(terms) => Expr::sum(terms.iter().map(|t| expand_node(t, evaluator)).collect()),

        ExprKind::Product(factors) => {
            let expanded: Vec<Expr> = factors.iter().map(|f| expand_node(f, evaluator)).collect();
            multiply_out(&expanded, evaluator)
        }

        ExprKind::Power(base, exponent) => {
            let base = expand_node(base, evaluator);
            match exponent.as_constant().and_then(|e| e.to_i64()) {
                Some(n) if (2..=MAX_EXPANDED_POWER).contains(&n) && matches!(base.kind, ExprKind::Sum(_)) => {
                    let copies = vec![base; usize::try_from(n).unwrap_or_default()];
                    multiply_out(&copies, evaluator)
                }
                _ => Expr::power(base, (**exponent).clone()),
            }
        }

        ExprKind::Binary { op, left, right } => Expr::binary(
            *op,
            expand_node(left, evaluator),
            expand_node(right, evaluator),
        ),
        ExprKind::Unary { op, operand } => Expr::unary(*op, expand_node(operand, evaluator)),
        ExprKind::Set(members) => Expr::set(members.iter().map(|m| expand_node(m, evaluator)).collect()),

        _ => expr.clone(),
    }
}

/// The product of `factors` as a sum of products, collected after each step
fn multiply_out(factors: &[Expr], evaluator: &mut Evaluator) -> Expr {
    let mut acc = Expr::one();
    for factor in factors {
        let mut terms = Vec::new();
        for a in terms_of(&acc) {
            for b in terms_of(factor) {
                terms.push(Expr::mul_expr(a.clone(), b.clone()));
            }
        }
        acc = evaluator.evaluate(&Expr::sum(terms));
    }
    acc
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic, reason = "Standard test relaxations")]
mod tests {
    use super::*;
    use crate::evaluate::evaluate;
    use crate::parser::parse;

    fn eval(input: &str) -> Expr {
        evaluate(&parse(input).unwrap())
    }

    #[test]
    fn test_expand_square() {
        assert_eq!(expand(&parse("(x + y)^2").unwrap()), eval("x^2 + 2*x*y + y^2"));
    }

    #[test]
    fn test_expand_product_of_sums() {
        assert_eq!(
            expand(&parse("(a + b)*(c - d)").unwrap()),
            eval("a*c - a*d + b*c - b*d")
        );
    }

    #[test]
    fn test_expand_cancels() {
        assert_eq!(expand(&parse("(x + 1)*(x - 1) - x^2").unwrap()), Expr::integer(-1));
    }

    #[test]
    fn test_expand_leaves_call_arguments() {
        let e = parse("Sin((x + 1)^2)").unwrap();
        assert_eq!(expand(&e), evaluate(&e));
    }
}
