//! Evaluation: constant folding, term collection and function calls.
//!
//! The [`Evaluator`] walks an expression bottom-up and rebuilds it in
//! evaluated form:
//! - sums combine like terms (`2*x + 3*x -> 5*x`) and fold constants
//! - products combine powers of equal bases and fold constants; a product
//!   with an exact zero factor is zero
//! - powers fold constants and push integer exponents into products and
//!   nested powers
//! - relational and logical operators decide when their operands allow it
//! - calls invoke native or expression-bodied functions
//!
//! Results are memoized per evaluator, so shared subtrees are evaluated once.
//! Native function faults never abort evaluation: the call stays symbolic and
//! the fault is recorded (see [`Evaluator::faults`]).
//!
//! Evaluation is idempotent: `evaluate(evaluate(e)) == evaluate(e)`.
//!
//! # Example
//! ```
//! use symb_algebra::{evaluate, parse};
//!
//! let e = parse("2*x + 3*x").unwrap();
//! assert_eq!(evaluate(&e), parse("5*x").unwrap());
//! ```

mod expand;
mod substitute;

pub use expand::expand;
pub use substitute::substitute;

use std::sync::Arc;

use indexmap::IndexMap;
use rustc_hash::{FxBuildHasher, FxHashMap};
use tracing::{debug, trace};

use crate::core::{
    BinaryOp, EvalFault, Expr, ExprKind, Function, FunctionBody, Real, UnaryOp, split_exponent,
};
use crate::matching::Bindings;

/// Default cache capacity before clearing (10K entries)
const DEFAULT_CACHE_CAPACITY: usize = 10_000;

/// Evaluate `expr` with a fresh evaluator
#[must_use]
pub fn evaluate(expr: &Expr) -> Expr {
    Evaluator::new().evaluate(expr)
}

/// Whether `expr` contains any of `xs`
#[must_use]
pub fn depends_on(expr: &Expr, xs: &[Expr]) -> bool {
    expr.depends_on_any(xs)
}

// =============================================================================
// ARITHMETIC HELPERS
// =============================================================================

/// `a + b`, evaluated
#[must_use]
pub fn add(a: &Expr, b: &Expr) -> Expr {
    evaluate(&Expr::add_expr(a.clone(), b.clone()))
}

/// `a - b`, evaluated
#[must_use]
pub fn sub(a: &Expr, b: &Expr) -> Expr {
    evaluate(&Expr::sub_expr(a.clone(), b.clone()))
}

/// `a * b`, evaluated
#[must_use]
pub fn mul(a: &Expr, b: &Expr) -> Expr {
    evaluate(&Expr::mul_expr(a.clone(), b.clone()))
}

/// `a / b`, evaluated
#[must_use]
pub fn div(a: &Expr, b: &Expr) -> Expr {
    evaluate(&Expr::div_expr(a.clone(), b.clone()))
}

/// `-a`, evaluated
#[must_use]
pub fn neg(a: &Expr) -> Expr {
    evaluate(&a.clone().negate())
}

/// `a ^ b`, evaluated
#[must_use]
pub fn pow(a: &Expr, b: &Expr) -> Expr {
    evaluate(&Expr::power(a.clone(), b.clone()))
}

impl Expr {
    /// Evaluate this expression
    #[must_use]
    pub fn evaluate(&self) -> Self {
        evaluate(self)
    }

    /// Replace sub-expressions according to `arrows` (`from -> to`), without evaluating
    #[must_use]
    pub fn substitute(&self, arrows: &[Self]) -> Self {
        substitute(self, &bindings_from_arrows(arrows))
    }

    /// Distribute products over sums, then evaluate
    #[must_use]
    pub fn expand(&self) -> Self {
        expand(self)
    }
}

fn bindings_from_arrows(arrows: &[Expr]) -> Bindings {
    arrows
        .iter()
        .filter_map(Expr::as_arrow)
        .map(|(from, to)| (from.clone(), to.clone()))
        .collect()
}

// =============================================================================
// EVALUATOR
// =============================================================================

/// Memoizing evaluator.
///
/// One evaluator per logical top-level call; the cache is never shared.
#[derive(Debug)]
pub struct Evaluator {
    cache: FxHashMap<Expr, Expr>,
    cache_capacity: usize,
    faults: Vec<EvalFault>,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl Evaluator {
    #[must_use]
    pub fn new() -> Self {
        Self {
            cache: FxHashMap::default(),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            faults: Vec::new(),
        }
    }

    /// Set the cache capacity (default: 10K entries).
    /// The cache is cleared when this limit is exceeded.
    #[must_use]
    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity.max(1);
        self
    }

    /// Evaluate `expr`
    pub fn evaluate(&mut self, expr: &Expr) -> Expr {
        self.visit(expr)
    }

    /// Faults raised by native functions so far
    #[must_use]
    pub fn faults(&self) -> &[EvalFault] {
        &self.faults
    }

    fn visit(&mut self, expr: &Expr) -> Expr {
        if let Some(cached) = self.cache.get(expr) {
            trace!(%expr, "evaluator cache hit");
            return cached.clone();
        }

        let result = match &expr.kind {
            ExprKind::Constant(_) | ExprKind::Variable(_) => expr.clone(),
            ExprKind::Sum(terms) => self.visit_sum(terms),
            ExprKind::Product(factors) => self.visit_product(factors),
            ExprKind::Power(base, exponent) => self.visit_power(base, exponent),
            ExprKind::Binary { op, left, right } => self.visit_binary(*op, left, right),
            ExprKind::Unary { op, operand } => self.visit_unary(*op, operand),
            ExprKind::Call { function, args } => self.visit_call(function, args),
            ExprKind::Set(members) => {
                Expr::set(members.iter().map(|m| self.visit(m)).collect())
            }
            ExprKind::Matrix {
                rows,
                cols,
                elements,
            } => Expr::matrix_from_arcs(
                *rows,
                *cols,
                elements.iter().map(|e| Arc::new(self.visit(e))).collect(),
            ),
            ExprKind::Index { target, indices } => {
                let target = self.visit(target);
                let indices: Vec<Expr> = indices.iter().map(|i| self.visit(i)).collect();
                matrix_element(&target, &indices).unwrap_or_else(|| Expr::index(target, indices))
            }
        };

        if self.cache.len() >= self.cache_capacity {
            self.cache.clear();
        }
        self.cache.insert(expr.clone(), result.clone());
        result
    }

    // -------------------------------------------------------------------------
    // Sum
    // -------------------------------------------------------------------------

    fn visit_sum(&mut self, terms: &[Arc<Expr>]) -> Expr {
        let mut flat = Vec::with_capacity(terms.len());
        for t in terms {
            push_flat_terms(self.visit(t), &mut flat);
        }
        self.collect_terms(flat)
    }

    /// Combine like terms of already evaluated, non-sum `terms`
    fn collect_terms(&mut self, mut terms: Vec<Expr>) -> Expr {
        loop {
            let mut constant = Real::zero();
            let mut coefficients: IndexMap<Expr, Real, FxBuildHasher> = IndexMap::default();
            for t in &terms {
                if let Some(c) = t.as_constant() {
                    constant = constant + c.clone();
                    continue;
                }
                let (coefficient, key) = split_coefficient(t);
                let slot = coefficients.entry(key).or_insert_with(Real::zero);
                *slot = slot.clone() + coefficient;
            }

            // A combined term may itself be a sum, e.g. 2*(a+b) - (a+b); those are
            // flattened and collected again
            let mut out = Vec::with_capacity(coefficients.len() + 1);
            let mut flattened = false;
            for (key, coefficient) in coefficients {
                if coefficient.is_zero() {
                    continue;
                }
                let term = if coefficient.is_one() {
                    key
                } else {
                    self.visit(&Expr::product(vec![Expr::constant(coefficient), key]))
                };
                if matches!(term.kind, ExprKind::Sum(_)) {
                    flattened = true;
                }
                push_flat_terms(term, &mut out);
            }
            if !constant.is_zero() {
                out.push(Expr::constant(constant));
            }

            if !flattened {
                return Expr::sum(out);
            }
            terms = out;
        }
    }

    // -------------------------------------------------------------------------
    // Product
    // -------------------------------------------------------------------------

    fn visit_product(&mut self, factors: &[Arc<Expr>]) -> Expr {
        let mut flat = Vec::with_capacity(factors.len());
        for f in factors {
            let v = self.visit(f);
            if v.is_zero() {
                return Expr::zero();
            }
            match &v.kind {
                ExprKind::Product(inner) => flat.extend(inner.iter().map(|i| (**i).clone())),
                _ => flat.push(v),
            }
        }
        self.collect_factors(flat)
    }

    /// Combine powers of equal bases in already evaluated, non-product `factors`
    fn collect_factors(&mut self, factors: Vec<Expr>) -> Expr {
        let mut constant = Real::one();
        let mut powers: IndexMap<Expr, Real, FxBuildHasher> = IndexMap::default();

        // Positive powers first, so `(x-y)^3/(y-x)` keeps the base `x-y`
        let (positive, rest): (Vec<Expr>, Vec<Expr>) = factors
            .into_iter()
            .partition(|f| split_exponent(f).1.is_positive());

        for f in positive.iter().chain(rest.iter()) {
            if let Some(c) = f.as_constant() {
                constant = constant * c.clone();
                continue;
            }
            let (base, exponent) = split_exponent(f);
            if let Some(slot) = powers.get_mut(base) {
                *slot = slot.clone() + exponent;
                continue;
            }
            // (a-b)^n * (b-a)^m = (-1)^m * (a-b)^(n+m)
            if let ExprKind::Sum(terms) = &base.kind
                && exponent.is_integer()
                && powers.keys().any(|b| matches!(b.kind, ExprKind::Sum(_)))
            {
                let negated = Expr::sum(terms.iter().map(|t| negate_term(t)).collect());
                if let Some(slot) = powers.get_mut(&negated) {
                    *slot = slot.clone() + exponent.clone();
                    constant = constant * Real::from_i64(-1).pow(&exponent);
                    continue;
                }
            }
            powers.insert(base.clone(), exponent);
        }

        powers.retain(|_, exponent| !exponent.is_zero());

        // Constant bases with an exact value fold into the scalar
        powers.retain(|base, exponent| match base.as_constant() {
            Some(c) => match c.pow(exponent) {
                value @ Real::Rational(_) => {
                    constant = constant.clone() * value;
                    false
                }
                Real::Float(_) => true,
            },
            None => true,
        });

        if constant.is_zero() {
            return Expr::zero();
        }

        // Distribute the scalar into a sum factor: 2*(x+1) -> 2*x + 2
        if !constant.is_one()
            && let Some(index) = powers.iter().position(|(base, exponent)| {
                matches!(base.kind, ExprKind::Sum(_)) && (exponent.is_one() || exponent.is_minus_one())
            })
            && let Some((base, exponent)) = powers.shift_remove_index(index)
        {
            let scale = Expr::constant(constant.pow(&exponent));
            let distributed = self.visit(&Expr::sum(
                crate::core::terms_of(&base)
                    .into_iter()
                    .map(|t| Expr::product(vec![scale.clone(), t.clone()]))
                    .collect(),
            ));
            // The scaled sum can meet another factor again: 2*(x+1)*(2*x+2)
            let mut rest: Vec<Expr> = powers
                .into_iter()
                .map(|(base, exponent)| with_exponent(base, exponent))
                .collect();
            rest.push(with_exponent(distributed, exponent));
            return self.visit(&Expr::product(rest));
        }

        let mut out: Vec<Expr> = powers
            .into_iter()
            .map(|(base, exponent)| with_exponent(base, exponent))
            .collect();
        if !constant.is_one() {
            out.push(Expr::constant(constant));
        }
        Expr::product(out)
    }

    // -------------------------------------------------------------------------
    // Power
    // -------------------------------------------------------------------------

    fn visit_power(&mut self, base: &Expr, exponent: &Expr) -> Expr {
        let base = self.visit(base);
        let exponent = self.visit(exponent);

        if exponent.is_zero() || base.is_one() {
            return Expr::one();
        }
        if exponent.is_one() {
            return base;
        }
        if base.is_zero() && exponent.as_constant().is_some_and(Real::is_positive) {
            return Expr::zero();
        }

        if let (Some(b), Some(e)) = (base.as_constant(), exponent.as_constant()) {
            let value = b.pow(e);
            if value.is_nonfinite() {
                return Expr::power(base, exponent);
            }
            return Expr::constant(value);
        }

        if exponent.is_integer() {
            match &base.kind {
                // (a*b)^n = a^n * b^n
                ExprKind::Product(factors) => {
                    let distributed = factors
                        .iter()
                        .map(|f| Expr::power((**f).clone(), exponent.clone()))
                        .collect();
                    return self.visit(&Expr::product(distributed));
                }
                // (a^b)^n = a^(b*n)
                ExprKind::Power(inner_base, inner_exponent) => {
                    let combined = Expr::mul_expr((**inner_exponent).clone(), exponent);
                    return self.visit(&Expr::power((**inner_base).clone(), combined));
                }
                _ => {}
            }
        }

        Expr::power(base, exponent)
    }

    // -------------------------------------------------------------------------
    // Operators
    // -------------------------------------------------------------------------

    fn visit_binary(&mut self, op: BinaryOp, left: &Expr, right: &Expr) -> Expr {
        let left = self.visit(left);
        let right = self.visit(right);

        match op {
            BinaryOp::Substitute => {
                let members = right.set_members();
                let arrows: Vec<&Expr> = members.iter().filter(|m| m.as_arrow().is_some()).collect();
                if arrows.is_empty() || arrows.len() != members.len() {
                    return Expr::binary(op, left, right);
                }
                let substituted = left.substitute(&members);
                if substituted == left {
                    return left;
                }
                self.visit(&substituted)
            }
            BinaryOp::And => match (left.as_bool(), right.as_bool()) {
                (Some(false), _) | (_, Some(false)) => Expr::boolean(false),
                (Some(true), Some(true)) => Expr::boolean(true),
                (Some(true), None) => right,
                (None, Some(true)) => left,
                (None, None) => Expr::binary(op, left, right),
            },
            BinaryOp::Or => match (left.as_bool(), right.as_bool()) {
                (Some(true), _) | (_, Some(true)) => Expr::boolean(true),
                (Some(false), Some(false)) => Expr::boolean(false),
                (Some(false), None) => right,
                (None, Some(false)) => left,
                (None, None) => Expr::binary(op, left, right),
            },
            BinaryOp::Arrow => Expr::binary(op, left, right),
            _ => match decide_relation(op, &left, &right) {
                Some(truth) => Expr::boolean(truth),
                None => Expr::binary(op, left, right),
            },
        }
    }

    fn visit_unary(&mut self, op: UnaryOp, operand: &Expr) -> Expr {
        let operand = self.visit(operand);
        match (op, operand.as_bool()) {
            (UnaryOp::Not, Some(truth)) => Expr::boolean(!truth),
            _ => Expr::unary(op, operand),
        }
    }

    // -------------------------------------------------------------------------
    // Calls
    // -------------------------------------------------------------------------

    fn visit_call(&mut self, function: &Arc<Function>, args: &[Arc<Expr>]) -> Expr {
        let args: Vec<Expr> = args.iter().map(|a| self.visit(a)).collect();
        if !function.can_call(&args) {
            return Expr::call(Arc::clone(function), args);
        }

        match function.body() {
            FunctionBody::Native(native) => match (**native)(&args) {
                Ok(Some(result)) => {
                    let call = Expr::call(Arc::clone(function), args);
                    if result == call { call } else { self.visit(&result) }
                }
                Ok(None) => Expr::call(Arc::clone(function), args),
                Err(message) => {
                    debug!(function = function.name(), %message, "native function fault");
                    self.faults.push(EvalFault {
                        function: function.name().to_string(),
                        message,
                    });
                    Expr::call(Arc::clone(function), args)
                }
            },
            FunctionBody::Expression { parameters, body } => {
                let bindings: Bindings = parameters.iter().cloned().zip(args).collect();
                self.visit(&substitute(body, &bindings))
            }
            FunctionBody::Unknown => Expr::call(Arc::clone(function), args),
        }
    }
}

// =============================================================================
// HELPERS
// =============================================================================

fn push_flat_terms(term: Expr, out: &mut Vec<Expr>) {
    match &term.kind {
        ExprKind::Sum(inner) => out.extend(inner.iter().map(|t| (**t).clone())),
        _ => out.push(term),
    }
}

/// Split a term into its constant coefficient and the rest: `3*x*y -> (3, x*y)`
fn split_coefficient(term: &Expr) -> (Real, Expr) {
    let ExprKind::Product(factors) = &term.kind else {
        return (Real::one(), term.clone());
    };
    let mut coefficient = Real::one();
    let mut rest = Vec::with_capacity(factors.len());
    for f in factors {
        match f.as_constant() {
            Some(c) => coefficient = coefficient * c.clone(),
            None => rest.push(Arc::clone(f)),
        }
    }
    (coefficient, Expr::product_from_arcs(rest))
}

/// `-term` for an evaluated, non-sum term, built without evaluating again
fn negate_term(term: &Expr) -> Expr {
    if let Some(c) = term.as_constant() {
        return Expr::constant(-c.clone());
    }
    let (coefficient, rest) = split_coefficient(term);
    let coefficient = -coefficient;
    if coefficient.is_one() {
        rest
    } else {
        Expr::product(vec![Expr::constant(coefficient), rest])
    }
}

fn with_exponent(base: Expr, exponent: Real) -> Expr {
    if exponent.is_one() {
        base
    } else {
        Expr::power(base, Expr::constant(exponent))
    }
}

/// Truth of a relation, when the operands decide it
fn decide_relation(op: BinaryOp, left: &Expr, right: &Expr) -> Option<bool> {
    if left == right {
        match op {
            BinaryOp::Equal | BinaryOp::ApproxEqual | BinaryOp::LessEqual | BinaryOp::GreaterEqual => {
                return Some(true);
            }
            BinaryOp::NotEqual | BinaryOp::Less | BinaryOp::Greater => return Some(false),
            _ => {}
        }
    }

    let (l, r) = (left.as_constant()?, right.as_constant()?);
    if op == BinaryOp::ApproxEqual {
        return Some(l.approx_eq(r));
    }

    let ordering = match (l, r) {
        (Real::Rational(a), Real::Rational(b)) => a.cmp(b),
        _ => l.to_f64().partial_cmp(&r.to_f64())?,
    };
    Some(match op {
        BinaryOp::Equal => ordering.is_eq(),
        BinaryOp::NotEqual => ordering.is_ne(),
        BinaryOp::Less => ordering.is_lt(),
        BinaryOp::LessEqual => ordering.is_le(),
        BinaryOp::Greater => ordering.is_gt(),
        BinaryOp::GreaterEqual => ordering.is_ge(),
        _ => return None,
    })
}

/// `m[i, j]` (or `m[k]` on a row or column vector) for constant, in-range indices
fn matrix_element(target: &Expr, indices: &[Expr]) -> Option<Expr> {
    if !matches!(target.kind, ExprKind::Matrix { .. }) {
        return None;
    }
    let index = |e: &Expr| {
        e.as_constant()
            .and_then(Real::to_i64)
            .and_then(|n| usize::try_from(n).ok())
    };
    let (rows, _) = crate::matrix::shape(target);
    match indices {
        [i, j] => crate::matrix::get(target, index(i)?, index(j)?),
        [k] if rows == 1 => crate::matrix::get(target, 0, index(k)?),
        [k] => crate::matrix::get(target, index(k)?, 0),
        _ => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic, reason = "Standard test relaxations")]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn eval(input: &str) -> Expr {
        evaluate(&parse(input).unwrap())
    }

    fn x() -> Expr {
        Expr::variable("x")
    }

    #[test]
    fn test_like_terms_combine() {
        assert_eq!(
            eval("2*x + 3*x"),
            Expr::product(vec![Expr::integer(5), x()])
        );
        assert_eq!(eval("x - x"), Expr::zero());
        assert_eq!(eval("1 + 2 + x"), Expr::sum(vec![x(), Expr::integer(3)]));
    }

    #[test]
    fn test_powers_combine() {
        assert_eq!(eval("x*x"), Expr::power(x(), Expr::integer(2)));
        assert_eq!(eval("x^2/x"), x());
        assert_eq!(eval("x/x"), Expr::one());
    }

    #[test]
    fn test_sign_flip_merges_negated_sum() {
        let expected = Expr::product(vec![
            Expr::integer(-1),
            Expr::power(eval("x - y"), Expr::integer(2)),
        ]);
        assert_eq!(eval("(x - y)^3/(y - x)"), expected);
    }

    #[test]
    fn test_scalar_distributes_into_sum() {
        assert_eq!(eval("2*(x + 1)"), eval("2*x + 2"));
        assert_eq!(eval("2*(x + 1) - (x + 1)"), eval("x + 1"));
    }

    #[test]
    fn test_scalar_times_sum_power_terminates() {
        let square = Expr::power(eval("x + 1"), Expr::integer(2));
        assert_eq!(eval("3*(x + 1)^2"), Expr::product(vec![Expr::integer(3), square]));
        assert_eq!(eval("-(x + 1)"), eval("-x - 1"));
        assert_eq!(eval("(x + 1)^2*(y + 2)*(-1)"), eval("-(y + 2)*(x + 1)^2"));
    }

    #[test]
    fn test_distributed_scalar_merges_with_equal_factor() {
        let doubled = eval("2*x + 2");
        assert_eq!(
            eval("((x + x) + 2)*((x + 1)*2)"),
            Expr::power(doubled, Expr::integer(2))
        );
        let once = eval("2*(x + 1)*(-2*x - 2)");
        assert_eq!(evaluate(&once), once);
    }

    #[test]
    fn test_coefficient_after_term_combines() {
        let two_to_x = Expr::power(Expr::integer(2), x());
        assert_eq!(
            eval("3*2^x + 2*2^x"),
            Expr::product(vec![Expr::integer(5), two_to_x])
        );
        assert_eq!(eval("2^x*3 - 3*2^x"), Expr::zero());
        assert_eq!(eval("3*(x + 1)^2 - (x + 1)^2*3"), Expr::zero());
        assert_eq!(eval("3*(x + 1)^2 - (x + 1)^2"), eval("2*(x + 1)^2"));
    }

    #[test]
    fn test_zero_short_circuit() {
        assert_eq!(eval("0*Factorial(-1)"), Expr::zero());
    }

    #[test]
    fn test_constant_powers() {
        assert_eq!(eval("2^10"), Expr::integer(1024));
        assert_eq!(eval("4^(1/2)"), Expr::integer(2));
        // 1/0 stays symbolic instead of becoming infinity
        assert!(matches!(eval("0^(-1)").kind(), ExprKind::Power(..)));
        assert_eq!(eval("x^0"), Expr::one());
        assert_eq!(eval("1^x"), Expr::one());
    }

    #[test]
    fn test_integer_power_distributes() {
        assert_eq!(eval("(2*x)^2"), eval("4*x^2"));
        assert_eq!(eval("(x^2)^3"), Expr::power(x(), Expr::integer(6)));
    }

    #[test]
    fn test_relations_and_logic() {
        assert_eq!(eval("1 < 2"), Expr::boolean(true));
        assert_eq!(eval("x == x"), Expr::boolean(true));
        assert_eq!(eval("x != x"), Expr::boolean(false));
        assert_eq!(eval("1 ~= 1.0000000000001"), Expr::boolean(true));
        assert_eq!(eval("(x < 2) & 0"), Expr::boolean(false));
        assert_eq!(eval("(x < 2) | 1"), Expr::boolean(true));
        assert_eq!(eval("!0"), Expr::boolean(true));
        assert!(matches!(eval("x < 2").kind(), ExprKind::Binary { .. }));
    }

    #[test]
    fn test_substitution_operator() {
        assert_eq!(eval("x^2 + x : x -> 3"), Expr::integer(12));
        assert_eq!(eval("y : x -> 3"), Expr::variable("y"));
    }

    #[test]
    fn test_native_calls() {
        assert_eq!(eval("Abs(-3)"), Expr::integer(3));
        assert_eq!(eval("Sqrt(9)"), Expr::integer(3));
        assert_eq!(eval("If(1 < 2, x, y)"), x());
        assert!(matches!(eval("Sin(x)").kind(), ExprKind::Call { .. }));
    }

    #[test]
    fn test_native_fault_is_captured() {
        let e = parse("Factorial(1/2) + 1").unwrap();
        let mut evaluator = Evaluator::new();
        let result = evaluator.evaluate(&e);
        assert_eq!(evaluator.faults().len(), 1);
        assert_eq!(evaluator.faults()[0].function, "Factorial");
        assert!(result.depends_on(&evaluate(&parse("Factorial(1/2)").unwrap())));
    }

    #[test]
    fn test_expression_function() {
        let f = Arc::new(Function::expression(
            "Sq",
            vec![x()],
            Expr::power(x(), Expr::integer(2)),
        ));
        let call = Expr::call(f, vec![Expr::integer(3)]);
        assert_eq!(evaluate(&call), Expr::integer(9));
    }

    #[test]
    fn test_fixpoint_on_mixed_expression() {
        let once = eval("(x + 1)^2*3/(x + 1) + 2*y - y + Sin(0)");
        assert_eq!(evaluate(&once), once);
    }

    #[test]
    fn test_arithmetic_helpers() {
        let y = Expr::variable("y");
        assert_eq!(sub(&add(&x(), &y), &y), x());
        assert_eq!(div(&mul(&x(), &y), &y), x());
        assert_eq!(neg(&neg(&x())), x());
        assert_eq!(pow(&Expr::integer(3), &Expr::integer(2)), Expr::integer(9));
    }

    #[test]
    fn test_constant_index_into_matrix() {
        let m = Expr::matrix(vec![
            vec![Expr::integer(1), x()],
            vec![Expr::integer(3), Expr::integer(4)],
        ])
        .unwrap();
        let at = |idx: Vec<Expr>| evaluate(&Expr::index(m.clone(), idx));
        assert_eq!(at(vec![Expr::integer(0), Expr::integer(1)]), x());
        assert_eq!(at(vec![Expr::integer(1)]), Expr::integer(3));
        // Out of range or symbolic indices stay put
        let symbolic = Expr::index(m.clone(), vec![Expr::variable("i"), Expr::zero()]);
        assert_eq!(evaluate(&symbolic), symbolic);
        assert!(matches!(at(vec![Expr::integer(5), Expr::zero()]).kind, ExprKind::Index { .. }));
    }
}
