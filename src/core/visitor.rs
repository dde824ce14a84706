//! Expression visitor pattern for tree traversal
//!
//! Provides a clean interface for walking the expression tree without
//! manually handling the recursive structure.

use std::sync::Arc;

use crate::core::expr::{Expr, ExprKind, Function, Variable};
use crate::core::real::Real;

/// Trait for visiting expression nodes
///
/// Implement this trait to define custom behavior when traversing expressions.
/// Each method returns a boolean indicating whether to continue visiting children.
///
/// # Example
/// ```
/// use symb_algebra::{Expr, ExprVisitor, walk_expr};
/// use symb_algebra::core::{Function, Real, Variable};
/// use std::sync::Arc;
///
/// struct ConstantCounter { count: usize }
///
/// impl ExprVisitor for ConstantCounter {
///     fn visit_constant(&mut self, _c: &Real) -> bool { self.count += 1; true }
///     fn visit_variable(&mut self, _v: &Variable) -> bool { true }
///     fn visit_call(&mut self, _f: &Function, _args: &[Arc<Expr>]) -> bool { true }
///     fn visit_composite(&mut self, _e: &Expr) -> bool { true }
/// }
///
/// let e = Expr::sum(vec![Expr::variable("x"), Expr::integer(2)]);
/// let mut counter = ConstantCounter { count: 0 };
/// walk_expr(&e, &mut counter);
/// assert_eq!(counter.count, 1);
/// ```
pub trait ExprVisitor {
    /// Visit a constant leaf
    fn visit_constant(&mut self, value: &Real) -> bool;

    /// Visit a variable
    fn visit_variable(&mut self, variable: &Variable) -> bool;

    /// Visit a function call, returns true to visit arguments
    fn visit_call(&mut self, function: &Function, args: &[Arc<Expr>]) -> bool;

    /// Visit any other node (sum, product, power, operators, sets, matrices,
    /// indices), returns true to visit its children
    fn visit_composite(&mut self, expr: &Expr) -> bool;
}

/// Walk an expression tree with a visitor
///
/// Visits nodes in pre-order (parent before children).
/// The visitor methods return true to continue walking children, false to skip.
pub fn walk_expr<V: ExprVisitor>(expr: &Expr, visitor: &mut V) {
    match &expr.kind {
        ExprKind::Constant(c) => {
            visitor.visit_constant(c);
        }
        ExprKind::Variable(v) => {
            visitor.visit_variable(v);
        }
        ExprKind::Call { function, args } => {
            if visitor.visit_call(function, args) {
                for arg in args {
                    walk_expr(arg, visitor);
                }
            }
        }
        ExprKind::Sum(children)
        | ExprKind::Product(children)
        | ExprKind::Set(children)
        | ExprKind::Matrix {
            elements: children, ..
        } => {
            if visitor.visit_composite(expr) {
                for child in children {
                    walk_expr(child, visitor);
                }
            }
        }
        ExprKind::Index { target, indices } => {
            if visitor.visit_composite(expr) {
                walk_expr(target, visitor);
                for index in indices {
                    walk_expr(index, visitor);
                }
            }
        }
        ExprKind::Power(left, right) | ExprKind::Binary { left, right, .. } => {
            if visitor.visit_composite(expr) {
                walk_expr(left, visitor);
                walk_expr(right, visitor);
            }
        }
        ExprKind::Unary { operand, .. } => {
            if visitor.visit_composite(expr) {
                walk_expr(operand, visitor);
            }
        }
    }
}

/// A simple visitor that counts nodes
#[derive(Default)]
pub struct NodeCounter {
    pub count: usize,
}

impl ExprVisitor for NodeCounter {
    fn visit_constant(&mut self, _value: &Real) -> bool {
        self.count += 1;
        true
    }

    fn visit_variable(&mut self, _variable: &Variable) -> bool {
        self.count += 1;
        true
    }

    fn visit_call(&mut self, _function: &Function, _args: &[Arc<Expr>]) -> bool {
        self.count += 1;
        true
    }

    fn visit_composite(&mut self, _expr: &Expr) -> bool {
        self.count += 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_counter() {
        let x = Expr::variable("x");
        let expr = Expr::sum(vec![x.clone(), Expr::power(x, Expr::integer(2))]);
        let mut counter = NodeCounter::default();
        walk_expr(&expr, &mut counter);
        // sum, x, power, x, 2
        assert_eq!(counter.count, 5);
        assert_eq!(expr.node_count(), 5);
    }
}
