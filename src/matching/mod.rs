//! Structural pattern matching with backtracking.
//!
//! Every variable in a pattern is a pattern variable: unbound, it binds to any
//! expression its ring and condition admit; bound, it only matches its value.
//! Pre-binding `x -> x` makes `x` match itself literally.
//!
//! Sums and products are matched combinatorially. A variable term may absorb
//! any non-empty combination of target terms, or the identity element, and the
//! search backtracks through [`MatchContext::try_match`] so a failed
//! alternative leaves no bindings behind.
//!
//! # Example
//! ```
//! use symb_algebra::{Expr, parse};
//!
//! let pattern = parse("a*x + b").unwrap();
//! let target = parse("3*x + 2").unwrap();
//! let x = Expr::variable("x");
//! let ctx = pattern.matches(&target, &[Expr::arrow(x.clone(), x)]).unwrap();
//! assert_eq!(ctx.get(&Expr::variable("a")), Some(&Expr::integer(3)));
//! assert_eq!(ctx.get(&Expr::variable("b")), Some(&Expr::integer(2)));
//! ```

mod context;

pub use context::{Bindings, MatchContext};

use std::sync::Arc;

use tracing::trace;

use crate::core::{Expr, ExprKind, factors_of, terms_of};
use crate::evaluate::evaluate;

impl Expr {
    /// Match this pattern against `target`, starting from `pre_bindings` (`x -> value` arrows).
    ///
    /// Returns the bindings on success, `None` when there is no match.
    #[must_use]
    pub fn matches(&self, target: &Self, pre_bindings: &[Self]) -> Option<MatchContext> {
        let mut ctx = MatchContext::with_bindings(pre_bindings);
        matches(self, target, &mut ctx).then_some(ctx)
    }

    /// Match this pattern against `target` within an existing context.
    ///
    /// On failure `ctx` is left as it was.
    pub fn matches_in(&self, target: &Self, ctx: &mut MatchContext) -> bool {
        matches(self, target, ctx)
    }
}

/// Match `pattern` against `target`, extending `ctx` on success
pub fn matches(pattern: &Expr, target: &Expr, ctx: &mut MatchContext) -> bool {
    ctx.try_match(|ctx| match_node(pattern, target, ctx))
}

fn match_node(pattern: &Expr, target: &Expr, ctx: &mut MatchContext) -> bool {
    match &pattern.kind {
        ExprKind::Variable(var) => var.admits(target) && ctx.bind_or_check(pattern, target),
        ExprKind::Constant(_) => pattern == target,

        ExprKind::Call { function, args } => match &target.kind {
            ExprKind::Call {
                function: target_fn,
                args: target_args,
            } if function == target_fn && args.len() == target_args.len() => {
                // Arguments are matched last to first
                args.iter()
                    .rev()
                    .zip(target_args.iter().rev())
                    .all(|(p, e)| matches(p, e, ctx))
            }
            _ => false,
        },

        ExprKind::Matrix {
            rows,
            cols,
            elements,
        } => match &target.kind {
            ExprKind::Matrix {
                rows: target_rows,
                cols: target_cols,
                elements: target_elements,
            } if rows == target_rows && cols == target_cols => match_all(elements, target_elements, ctx),
            _ => false,
        },

        ExprKind::Index { target: p_target, indices } => match &target.kind {
            ExprKind::Index {
                target: e_target,
                indices: e_indices,
            } if indices.len() == e_indices.len() => {
                matches(p_target, e_target, ctx) && match_all(indices, e_indices, ctx)
            }
            _ => false,
        },

        ExprKind::Set(members) => match &target.kind {
            ExprKind::Set(target_members) if members.len() == target_members.len() => {
                match_all(members, target_members, ctx)
            }
            _ => false,
        },

        ExprKind::Binary { op, left, right } => match &target.kind {
            ExprKind::Binary {
                op: target_op,
                left: target_left,
                right: target_right,
            } if op == target_op => matches(left, target_left, ctx) && matches(right, target_right, ctx),
            _ => false,
        },

        ExprKind::Unary { op, operand } => match &target.kind {
            ExprKind::Unary {
                op: target_op,
                operand: target_operand,
            } if op == target_op => matches(operand, target_operand, ctx),
            _ => false,
        },

        ExprKind::Power(base, exponent) => match_power(base, exponent, target, ctx),
        ExprKind::Sum(terms) => match_variadic(&Sum, terms, target, ctx),
        ExprKind::Product(factors) => match_variadic(&Product, factors, target, ctx),
    }
}

fn match_all(patterns: &[Arc<Expr>], targets: &[Arc<Expr>], ctx: &mut MatchContext) -> bool {
    patterns
        .iter()
        .zip(targets)
        .all(|(p, e)| matches(p, e, ctx))
}

// =============================================================================
// POWER
// =============================================================================

fn match_power(base: &Expr, exponent: &Expr, target: &Expr, ctx: &mut MatchContext) -> bool {
    // A bound exponent: the base has to match the corresponding root of the target
    if let Some(bound) = ctx.get(exponent).cloned() {
        let root = evaluate(&Expr::power(target.clone(), Expr::one() / bound));
        if matches(base, &root, ctx) {
            return true;
        }
    }

    // x^0 = 1
    if target.is_one() && matches(exponent, &Expr::zero(), ctx) {
        return true;
    }
    // 0^x = 0
    if target.is_zero() && matches(base, &Expr::zero(), ctx) {
        return true;
    }

    if let ExprKind::Power(target_base, target_exponent) = &target.kind
        && ctx.try_match(|ctx| {
            matches(base, target_base, ctx) && matches(exponent, target_exponent, ctx)
        })
    {
        return true;
    }

    // If the exponent can be 1, the base takes the whole target
    if ctx.try_match(|ctx| matches(exponent, &Expr::one(), ctx) && matches(base, target, ctx)) {
        return true;
    }

    if exponent.is_integer() {
        let root = evaluate(&Expr::power(target.clone(), Expr::one() / exponent.clone()));
        return matches(base, &root, ctx);
    }

    false
}

// =============================================================================
// SUM / PRODUCT
// =============================================================================

/// The operation-specific parts of combinatorial matching
trait Variadic {
    fn name(&self) -> &'static str;
    fn identity(&self) -> Expr;
    fn build(&self, operands: Vec<Expr>) -> Expr;
    fn operands_of<'a>(&self, e: &'a Expr) -> Vec<&'a Expr>;
    /// `left` with `right` taken out (difference or quotient)
    fn remove(&self, left: &Expr, right: Expr) -> Expr;
}

struct Sum;
struct Product;

impl Variadic for Sum {
    fn name(&self) -> &'static str {
        "sum"
    }
    fn identity(&self) -> Expr {
        Expr::zero()
    }
    fn build(&self, operands: Vec<Expr>) -> Expr {
        Expr::sum(operands)
    }
    fn operands_of<'a>(&self, e: &'a Expr) -> Vec<&'a Expr> {
        terms_of(e)
    }
    fn remove(&self, left: &Expr, right: Expr) -> Expr {
        evaluate(&Expr::sub_expr(left.clone(), right))
    }
}

impl Variadic for Product {
    fn name(&self) -> &'static str {
        "product"
    }
    fn identity(&self) -> Expr {
        Expr::one()
    }
    fn build(&self, operands: Vec<Expr>) -> Expr {
        Expr::product(operands)
    }
    fn operands_of<'a>(&self, e: &'a Expr) -> Vec<&'a Expr> {
        factors_of(e)
    }
    fn remove(&self, left: &Expr, right: Expr) -> Expr {
        evaluate(&Expr::div_expr(left.clone(), right))
    }
}

fn match_variadic<V: Variadic>(
    op: &V,
    pattern_operands: &[Arc<Expr>],
    target: &Expr,
    ctx: &mut MatchContext,
) -> bool {
    trace!(op = op.name(), %target, "matching {} pattern", op.name());

    // Move the constants of the pattern over to the target
    let (constants, operands): (Vec<&Arc<Expr>>, Vec<&Arc<Expr>>) =
        pattern_operands.iter().partition(|p| p.is_constant());
    let target = if constants.is_empty() {
        target.clone()
    } else {
        let constants = op.build(constants.into_iter().map(|c| (**c).clone()).collect());
        op.remove(target, constants)
    };
    if operands.is_empty() {
        return target == op.identity();
    }

    let target_operands: Vec<Expr> = op.operands_of(&target).into_iter().cloned().collect();

    // Try starting the match at each operand of the pattern
    for (i, p) in operands.iter().enumerate() {
        let rest_pattern = op.build(
            operands
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .map(|(_, q)| (***q).clone())
                .collect(),
        );

        if p.as_variable().is_some() {
            if let Some(bound) = ctx.get(p).cloned() {
                // Already bound: take its value out of the target and match the rest
                let remainder = op.remove(&target, bound);
                if matches(&rest_pattern, &remainder, ctx) {
                    return true;
                }
                continue;
            }

            // A variable may absorb any combination of the target's operands
            for size in 1..=target_operands.len() {
                for chosen in Combinations::new(target_operands.len(), size) {
                    let (taken, left) = split_by_index(&target_operands, &chosen);
                    if ctx.try_match(|ctx| {
                        matches(p, &op.build(taken), ctx) && matches(&rest_pattern, &op.build(left), ctx)
                    }) {
                        return true;
                    }
                }
            }

            // Or nothing at all
            if ctx.try_match(|ctx| {
                matches(p, &op.identity(), ctx) && matches(&rest_pattern, &target, ctx)
            }) {
                return true;
            }
        } else {
            for j in 0..target_operands.len() {
                let left: Vec<Expr> = target_operands
                    .iter()
                    .enumerate()
                    .filter(|(k, _)| *k != j)
                    .map(|(_, e)| e.clone())
                    .collect();
                if ctx.try_match(|ctx| {
                    matches(p, &target_operands[j], ctx) && matches(&rest_pattern, &op.build(left), ctx)
                }) {
                    return true;
                }
            }
        }
    }

    false
}

/// Partition `items` into those at `chosen` (sorted indices) and the rest
fn split_by_index(items: &[Expr], chosen: &[usize]) -> (Vec<Expr>, Vec<Expr>) {
    let mut taken = Vec::with_capacity(chosen.len());
    let mut left = Vec::with_capacity(items.len() - chosen.len());
    let mut next = chosen.iter().peekable();
    for (i, item) in items.iter().enumerate() {
        if next.peek() == Some(&&i) {
            next.next();
            taken.push(item.clone());
        } else {
            left.push(item.clone());
        }
    }
    (taken, left)
}

/// Index combinations of size `k` out of `n`, in lexicographic order
struct Combinations {
    indices: Vec<usize>,
    n: usize,
    first: bool,
}

impl Combinations {
    fn new(n: usize, k: usize) -> Self {
        Self {
            indices: (0..k).collect(),
            n,
            first: true,
        }
    }
}

impl Iterator for Combinations {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Vec<usize>> {
        let k = self.indices.len();
        if k > self.n {
            return None;
        }
        if self.first {
            self.first = false;
            return Some(self.indices.clone());
        }
        // Rightmost index that can still move
        let i = (0..k).rev().find(|&i| self.indices[i] < self.n - k + i)?;
        self.indices[i] += 1;
        for j in i + 1..k {
            self.indices[j] = self.indices[j - 1] + 1;
        }
        Some(self.indices.clone())
    }
}
