//! Symbolic Algebra Engine
//!
//! Immutable expression trees kept in canonical form, with pattern matching,
//! evaluation and a symbolic linear equation solver.
//!
//! # Features
//! - Exact rational arithmetic with a floating-point fallback
//! - Canonical sums and products under a total expression order
//! - Associative/commutative pattern matching with transactional bindings
//! - Memoizing evaluation: like terms, powers, constant folding, function calls
//! - Row reduction with pivot scoring over symbolic coefficients
//! - Text parsing and printing that round-trip
//!
//! # Usage Examples
//!
//! ## Evaluation
//! ```
//! use symb_algebra::{evaluate, parse};
//!
//! let e = parse("(x - y)^3/(y - x)").unwrap();
//! assert_eq!(evaluate(&e), evaluate(&parse("-(x - y)^2").unwrap()));
//! ```
//!
//! ## Pattern matching
//! ```
//! use symb_algebra::{Expr, parse};
//! use symb_algebra::core::Ring;
//!
//! let x = Expr::variable("x");
//! let a = Expr::pattern_variable("A", Ring::Reals, {
//!     let x = x.clone();
//!     move |e| !e.depends_on(&x)
//! });
//! let n = Expr::variable_in("n", Ring::Integers);
//! let pattern = Expr::product(vec![a.clone(), Expr::power(x.clone(), n.clone())]);
//!
//! let ctx = pattern
//!     .matches(&parse("3*x^2").unwrap(), &[Expr::arrow(x.clone(), x)])
//!     .unwrap();
//! assert_eq!(ctx.get(&a), Some(&Expr::integer(3)));
//! assert_eq!(ctx.get(&n), Some(&Expr::integer(2)));
//! ```
//!
//! ## Solving
//! ```
//! use symb_algebra::{Expr, parse, solve};
//!
//! let equations = [parse("2*x + 4*y == A").unwrap(), parse("x == 2*y + B").unwrap()];
//! let unknowns = [Expr::variable("x"), Expr::variable("y")];
//! let solutions = solve(&equations, &unknowns).unwrap();
//! assert_eq!(solutions.len(), 2);
//! ```

pub mod core;
pub mod evaluate;
pub mod matching;
pub mod matrix;
pub mod parser;
pub mod solve;
pub mod transform;

#[cfg(test)]
mod tests;

// Re-export key types for easier usage
pub use crate::core::{
    BinaryOp, CasError, EvalFault, Expr, ExprKind, ExprVisitor, Function, Namespace, Real, Ring,
    Span, UnaryOp, walk_expr,
};
pub use evaluate::{Evaluator, evaluate, expand, substitute};
pub use matching::{Bindings, MatchContext};
pub use parser::{parse, parse_with};
pub use solve::{LinearCombination, Solver, SystemOfEquations, partial_solve, solve};
pub use transform::{PatternTransform, Transform, TransformSet};
