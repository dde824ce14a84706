//! Simultaneous replacement of sub-expressions

use std::sync::Arc;

use crate::core::{Expr, ExprKind};
use crate::matching::Bindings;

/// Replace every sub-expression of `expr` that is a key of `map` by its value.
///
/// Replacement is simultaneous: values are not substituted again. Nodes are
/// rebuilt through the canonical constructors but not evaluated; untouched
/// subtrees are shared with `expr`.
#[must_use]
pub fn substitute(expr: &Expr, map: &Bindings) -> Expr {
    if map.is_empty() {
        return expr.clone();
    }
    replace(expr, map).unwrap_or_else(|| expr.clone())
}

/// `None` when nothing below `expr` changed
fn replace(expr: &Expr, map: &Bindings) -> Option<Expr> {
    if let Some(value) = map.get(expr) {
        return Some(value.clone());
    }

    match &expr.kind {
        ExprKind::Constant(_) | ExprKind::Variable(_) => None,

        ExprKind::Sum(terms) => replace_all(terms, map).map(Expr::sum_from_arcs),
        ExprKind::Product(factors) => replace_all(factors, map).map(Expr::product_from_arcs),
        ExprKind::Set(members) => replace_all(members, map)
            .map(|members| Expr::set(members.into_iter().map(Expr::unwrap_arc).collect())),
        ExprKind::Call { function, args } => replace_all(args, map).map(|args| {
            Expr::new(ExprKind::Call {
                function: Arc::clone(function),
                args,
            })
        }),
        ExprKind::Matrix {
            rows,
            cols,
            elements,
        } => replace_all(elements, map)
            .map(|elements| Expr::matrix_from_arcs(*rows, *cols, elements)),

        ExprKind::Index { target, indices } => {
            let new_target = replace(target, map);
            let new_indices = replace_all(indices, map);
            if new_target.is_none() && new_indices.is_none() {
                return None;
            }
            Some(Expr::new(ExprKind::Index {
                target: new_target.map_or_else(|| Arc::clone(target), Arc::new),
                indices: new_indices.unwrap_or_else(|| indices.clone()),
            }))
        }

        ExprKind::Power(base, exponent) => {
            let (b, e) = (replace(base, map), replace(exponent, map));
            if b.is_none() && e.is_none() {
                return None;
            }
            Some(Expr::power(
                b.unwrap_or_else(|| (**base).clone()),
                e.unwrap_or_else(|| (**exponent).clone()),
            ))
        }

        ExprKind::Binary { op, left, right } => {
            let (l, r) = (replace(left, map), replace(right, map));
            if l.is_none() && r.is_none() {
                return None;
            }
            Some(Expr::binary(
                *op,
                l.unwrap_or_else(|| (**left).clone()),
                r.unwrap_or_else(|| (**right).clone()),
            ))
        }

        ExprKind::Unary { op, operand } => {
            replace(operand, map).map(|operand| Expr::unary(*op, operand))
        }
    }
}

fn replace_all(children: &[Arc<Expr>], map: &Bindings) -> Option<Vec<Arc<Expr>>> {
    let mut changed = false;
    let out: Vec<Arc<Expr>> = children
        .iter()
        .map(|c| match replace(c, map) {
            Some(new) => {
                changed = true;
                Arc::new(new)
            }
            None => Arc::clone(c),
        })
        .collect();
    changed.then_some(out)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic, reason = "Standard test relaxations")]
mod tests {
    use super::*;

    #[test]
    fn test_simultaneous_replacement() {
        let x = Expr::variable("x");
        let y = Expr::variable("y");
        let e = Expr::sum(vec![x.clone(), Expr::product(vec![Expr::integer(2), y.clone()])]);
        let swapped = e.substitute(&[Expr::arrow(x.clone(), y.clone()), Expr::arrow(y.clone(), x.clone())]);
        assert_eq!(
            swapped,
            Expr::sum(vec![y, Expr::product(vec![Expr::integer(2), x])])
        );
    }

    #[test]
    fn test_replaces_compound_keys() {
        let x = Expr::variable("x");
        let f = Expr::unknown_call("f", vec![x.clone()]);
        let e = Expr::power(f.clone(), Expr::integer(2));
        let out = e.substitute(&[Expr::arrow(f, Expr::integer(3))]);
        assert_eq!(out, Expr::power(Expr::integer(3), Expr::integer(2)));
    }

    #[test]
    fn test_untouched_is_identical() {
        let e = Expr::sum(vec![Expr::variable("a"), Expr::variable("b")]);
        let out = e.substitute(&[Expr::arrow(Expr::variable("z"), Expr::one())]);
        assert_eq!(out, e);
    }

    #[test]
    fn test_zero_substitution_collapses_product() {
        let x = Expr::variable("x");
        let e = Expr::product(vec![x.clone(), Expr::variable("y")]);
        assert_eq!(e.substitute(&[Expr::arrow(x, Expr::zero())]), Expr::zero());
    }
}
