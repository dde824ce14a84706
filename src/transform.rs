//! Pattern-driven rewrite rules.
//!
//! A [`PatternTransform`] rewrites any expression matching its pattern into its
//! result, with the match bindings substituted. A [`TransformSet`] is an ordered
//! list of transforms; the first one that applies wins.
//!
//! # Example
//! ```
//! use symb_algebra::{Expr, PatternTransform, parse};
//!
//! // Sin[u]^2 + Cos[u]^2 -> 1
//! let rule = PatternTransform::new(
//!     parse("Sin[u]^2 + Cos[u]^2").unwrap(),
//!     Expr::one(),
//! );
//! let e = parse("Sin[2*t]^2 + Cos[2*t]^2").unwrap();
//! assert_eq!(rule.apply(&e), Some(Expr::one()));
//! ```

use std::sync::Arc;

use tracing::trace;

use crate::core::{Expr, ExprKind};
use crate::evaluate::Evaluator;
use crate::matching::MatchContext;

/// A rewrite rule
pub trait Transform {
    /// Rewrite `expr`, or `None` when the rule does not apply
    fn apply(&self, expr: &Expr) -> Option<Expr>;
}

/// Rewrites `pattern` into `result` when every condition holds.
///
/// Conditions are expressions over the pattern variables; after substituting
/// the bindings they must evaluate to true (a non-zero constant).
#[derive(Debug, Clone)]
pub struct PatternTransform {
    pattern: Expr,
    result: Expr,
    conditions: Vec<Expr>,
    pre_bindings: Vec<Expr>,
}

impl PatternTransform {
    #[must_use]
    pub fn new(pattern: Expr, result: Expr) -> Self {
        Self {
            pattern,
            result,
            conditions: Vec::new(),
            pre_bindings: Vec::new(),
        }
    }

    /// Add a condition the bindings must satisfy
    #[must_use]
    pub fn with_condition(mut self, condition: Expr) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Pre-bind variables (`x -> x` makes `x` literal in the pattern)
    #[must_use]
    pub fn with_bindings(mut self, arrows: Vec<Expr>) -> Self {
        self.pre_bindings.extend(arrows);
        self
    }

    #[must_use]
    pub const fn pattern(&self) -> &Expr {
        &self.pattern
    }

    #[must_use]
    pub const fn result(&self) -> &Expr {
        &self.result
    }

    fn conditions_hold(&self, ctx: &MatchContext, evaluator: &mut Evaluator) -> bool {
        self.conditions.iter().all(|condition| {
            evaluator
                .evaluate(&ctx.substitute(condition))
                .as_bool()
                .unwrap_or(false)
        })
    }
}

impl Transform for PatternTransform {
    fn apply(&self, expr: &Expr) -> Option<Expr> {
        let ctx = self.pattern.matches(expr, &self.pre_bindings)?;
        let mut evaluator = Evaluator::new();
        if !self.conditions_hold(&ctx, &mut evaluator) {
            trace!(pattern = %self.pattern, %expr, "transform condition failed");
            return None;
        }
        Some(evaluator.evaluate(&ctx.substitute(&self.result)))
    }
}

impl PatternTransform {
    /// Inherent shorthand for [`Transform::apply`]
    #[must_use]
    pub fn apply(&self, expr: &Expr) -> Option<Expr> {
        Transform::apply(self, expr)
    }
}

/// An ordered set of rewrite rules
#[derive(Default)]
pub struct TransformSet {
    transforms: Vec<Arc<dyn Transform + Send + Sync>>,
}

impl std::fmt::Debug for TransformSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformSet")
            .field("len", &self.transforms.len())
            .finish()
    }
}

impl TransformSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule; earlier rules take priority
    pub fn add(&mut self, transform: impl Transform + Send + Sync + 'static) -> &mut Self {
        self.transforms.push(Arc::new(transform));
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    /// Apply the first rule that matches `expr` itself
    #[must_use]
    pub fn apply(&self, expr: &Expr) -> Option<Expr> {
        self.transforms.iter().find_map(|t| t.apply(expr))
    }

    /// Rewrite bottom-up: children first, then the rebuilt node
    #[must_use]
    pub fn apply_recursive(&self, expr: &Expr) -> Expr {
        let rebuilt = self.map_children(expr);
        self.apply(&rebuilt).unwrap_or(rebuilt)
    }

    fn map_children(&self, expr: &Expr) -> Expr {
        let map = |children: &[Arc<Expr>]| -> Vec<Expr> {
            children.iter().map(|c| self.apply_recursive(c)).collect()
        };
        match &expr.kind {
            ExprKind::Constant(_) | ExprKind::Variable(_) => expr.clone(),
            ExprKind::Sum(terms) => Expr::sum(map(terms)),
            ExprKind::Product(factors) => Expr::product(map(factors)),
            ExprKind::Set(members) => Expr::set(map(members)),
            ExprKind::Call { function, args } => Expr::call(Arc::clone(function), map(args)),
            ExprKind::Matrix {
                rows,
                cols,
                elements,
            } => Expr::matrix_from_arcs(
                *rows,
                *cols,
                map(elements).into_iter().map(Arc::new).collect(),
            ),
            ExprKind::Index { target, indices } => {
                Expr::index(self.apply_recursive(target), map(indices))
            }
            ExprKind::Power(base, exponent) => {
                Expr::power(self.apply_recursive(base), self.apply_recursive(exponent))
            }
            ExprKind::Binary { op, left, right } => Expr::binary(
                *op,
                self.apply_recursive(left),
                self.apply_recursive(right),
            ),
            ExprKind::Unary { op, operand } => Expr::unary(*op, self.apply_recursive(operand)),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic, reason = "Standard test relaxations")]
mod tests {
    use super::*;
    use crate::evaluate::evaluate;
    use crate::parser::parse;

    fn x() -> Expr {
        Expr::variable("x")
    }

    /// d/dx of `a*x^n` for `a` free of x
    fn power_rule() -> PatternTransform {
        let x = x();
        let a = Expr::pattern_variable("a", crate::core::Ring::Reals, {
            let x = x.clone();
            move |e| !e.depends_on(&x)
        });
        let n = Expr::variable("n");
        PatternTransform::new(
            Expr::product(vec![a.clone(), Expr::power(x.clone(), n.clone())]),
            Expr::product(vec![a, n.clone(), Expr::power(x.clone(), Expr::sub_expr(n, Expr::one()))]),
        )
        .with_bindings(vec![Expr::arrow(x.clone(), x)])
    }

    #[test]
    fn test_pattern_transform() {
        let e = parse("3*x^4").unwrap();
        assert_eq!(power_rule().apply(&e), Some(evaluate(&parse("12*x^3").unwrap())));
        assert_eq!(power_rule().apply(&parse("Sin(x)").unwrap()), None);
    }

    #[test]
    fn test_condition_blocks_rewrite() {
        let rule = PatternTransform::new(Expr::variable("u"), Expr::zero())
            .with_condition(parse("u < 0").unwrap());
        assert_eq!(rule.apply(&Expr::integer(-2)), Some(Expr::zero()));
        assert_eq!(rule.apply(&Expr::integer(2)), None);
        // Undecidable conditions do not hold
        assert_eq!(rule.apply(&x()), None);
    }

    #[test]
    fn test_set_applies_first_match() {
        let mut set = TransformSet::new();
        set.add(PatternTransform::new(parse("f(u)").unwrap(), parse("g(u)").unwrap()))
            .add(PatternTransform::new(parse("f(u)").unwrap(), parse("h(u)").unwrap()));
        assert_eq!(set.len(), 2);
        assert_eq!(
            set.apply(&parse("f(1)").unwrap()),
            Some(parse("g(1)").unwrap())
        );
    }

    #[test]
    fn test_apply_recursive_rewrites_inside() {
        let mut set = TransformSet::new();
        set.add(PatternTransform::new(parse("f(u)").unwrap(), parse("u + 1").unwrap()));
        let e = parse("2*f(f(x))").unwrap();
        // The rebuilt outer product is not evaluated
        assert_eq!(set.apply_recursive(&e), parse("2*(x + 2)").unwrap());
    }
}
