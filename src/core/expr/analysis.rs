//! Structural queries over expressions.

use super::{Expr, ExprKind};
use crate::core::real::Real;

/// Pre-order iterator over the atoms of an expression
pub struct Atoms<'a> {
    stack: Vec<&'a Expr>,
}

impl<'a> Iterator for Atoms<'a> {
    type Item = &'a Expr;

    fn next(&mut self) -> Option<&'a Expr> {
        while let Some(e) = self.stack.pop() {
            match &e.kind {
                _ if e.is_atom() => return Some(e),
                ExprKind::Sum(children) | ExprKind::Product(children) | ExprKind::Set(children) => {
                    self.stack.extend(children.iter().rev().map(AsRef::as_ref));
                }
                ExprKind::Power(left, right) | ExprKind::Binary { left, right, .. } => {
                    self.stack.push(right);
                    self.stack.push(left);
                }
                ExprKind::Unary { operand, .. } => self.stack.push(operand),
                _ => {}
            }
        }
        None
    }
}

impl Expr {
    /// Iterate over the maximal indivisible leaves of this expression, left to right
    #[must_use]
    pub fn atoms(&self) -> Atoms<'_> {
        Atoms { stack: vec![self] }
    }

    /// Whether any sub-expression of `self` equals `x`
    #[must_use]
    pub fn depends_on(&self, x: &Self) -> bool {
        self.depends_on_any(std::slice::from_ref(x))
    }

    /// Whether any sub-expression of `self` equals any of `xs`
    #[must_use]
    pub fn depends_on_any(&self, xs: &[Self]) -> bool {
        if xs.is_empty() {
            return false;
        }
        let mut stack: Vec<&Self> = vec![self];
        while let Some(e) = stack.pop() {
            if xs.contains(e) {
                return true;
            }
            match &e.kind {
                ExprKind::Constant(_) | ExprKind::Variable(_) => {}
                ExprKind::Call { args: children, .. }
                | ExprKind::Matrix {
                    elements: children, ..
                }
                | ExprKind::Sum(children)
                | ExprKind::Product(children)
                | ExprKind::Set(children) => stack.extend(children.iter().map(AsRef::as_ref)),
                ExprKind::Index { target, indices } => {
                    stack.push(target);
                    stack.extend(indices.iter().map(AsRef::as_ref));
                }
                ExprKind::Power(left, right) | ExprKind::Binary { left, right, .. } => {
                    stack.push(left);
                    stack.push(right);
                }
                ExprKind::Unary { operand, .. } => stack.push(operand),
            }
        }
        false
    }

    /// Number of nodes in the tree
    #[must_use]
    pub fn node_count(&self) -> usize {
        let mut counter = crate::core::visitor::NodeCounter::default();
        crate::core::visitor::walk_expr(self, &mut counter);
        counter.count
    }
}

/// The terms of a sum, or the expression itself
#[must_use]
pub fn terms_of(e: &Expr) -> Vec<&Expr> {
    match &e.kind {
        ExprKind::Sum(terms) => terms.iter().map(AsRef::as_ref).collect(),
        _ => vec![e],
    }
}

/// The factors of a product, or the expression itself
#[must_use]
pub fn factors_of(e: &Expr) -> Vec<&Expr> {
    match &e.kind {
        ExprKind::Product(factors) => factors.iter().map(AsRef::as_ref).collect(),
        _ => vec![e],
    }
}

/// Split `e` into a base and an exact constant exponent.
///
/// `x^3` gives `(x, 3)`, `x^(1/2)` gives `(x, 1/2)`, anything else `(e, 1)`.
/// Only exact rational exponents are split off, floating ones stay in the base.
#[must_use]
pub fn split_exponent(e: &Expr) -> (&Expr, Real) {
    if let ExprKind::Power(base, exp) = &e.kind
        && let Some(r @ Real::Rational(_)) = exp.as_constant()
    {
        return (base.as_ref(), r.clone());
    }
    (e, Real::one())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_atoms_in_order() {
        let x = Expr::variable("x");
        let y = Expr::variable("y");
        let e = Expr::power(Expr::sum(vec![x.clone(), y.clone()]), Expr::integer(2));
        let atoms: Vec<&Expr> = e.atoms().collect();
        assert_eq!(atoms, vec![&x, &y, &Expr::integer(2)]);
    }

    #[test]
    fn test_call_is_single_atom() {
        let f = Expr::unknown_call("f", vec![Expr::variable("x")]);
        assert_eq!(f.atoms().count(), 1);
    }

    #[test]
    fn test_depends_on_sees_through_calls() {
        let x = Expr::variable("x");
        let f = Expr::unknown_call("f", vec![Expr::product(vec![Expr::integer(2), x.clone()])]);
        assert!(f.depends_on(&x));
        assert!(!f.depends_on(&Expr::variable("y")));
        assert!(!f.depends_on_any(&[]));
    }

    #[test]
    fn test_exponent_split() {
        let x = Expr::variable("x");
        let p = Expr::power(x.clone(), Expr::rational(1, 2));
        assert_eq!(split_exponent(&p), (&x, Real::from_ratio(1, 2)));
        assert_eq!(split_exponent(&x), (&x, Real::one()));
    }
}
