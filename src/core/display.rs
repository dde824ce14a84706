//! Display implementation for expressions.
//!
//! Produces the infix text form read back by the parser:
//! - `x^2 + 2*x + 1`, `a - b`, `x/(y*z)`
//! - `F[a, b]` calls, `{a, b}` sets, `[[a, b][c, d]]` matrices
//! - `x == y`, `x -> y`, `f : {x -> 1}`
//!
//! # Display Behavior Notes for N-ary trees
//! - Sum displays positive terms first, then ` - ` for negated terms, constant last
//! - Product displays each `-1` factor as a leading `-` and `b^-1` factors as `/b`
//! - Parentheses are added only where the child binds weaker than its parent

use std::fmt;
use std::sync::Arc;

use crate::core::expr::{
    ATOM_PRECEDENCE, Expr, ExprKind, NEGATE_PRECEDENCE, POWER_PRECEDENCE, PRODUCT_PRECEDENCE,
    SUM_PRECEDENCE,
};
use crate::core::real::Real;

// =============================================================================
// HELPERS
// =============================================================================

/// Binding power of the printed form of `expr`
pub(crate) fn precedence(expr: &Expr) -> u8 {
    match &expr.kind {
        ExprKind::Constant(c) => constant_precedence(c),
        ExprKind::Sum(_) => SUM_PRECEDENCE,
        ExprKind::Product(_) => PRODUCT_PRECEDENCE,
        ExprKind::Power(_, exp) if exp.is_minus_one() => PRODUCT_PRECEDENCE,
        ExprKind::Power(..) => POWER_PRECEDENCE,
        ExprKind::Binary { op, .. } => op.precedence(),
        ExprKind::Unary { op, .. } => op.precedence(),
        ExprKind::Variable(_)
        | ExprKind::Call { .. }
        | ExprKind::Matrix { .. }
        | ExprKind::Index { .. }
        | ExprKind::Set(_) => ATOM_PRECEDENCE,
    }
}

fn constant_precedence(c: &Real) -> u8 {
    if c.is_negative() {
        NEGATE_PRECEDENCE
    } else if c.to_string().contains('/') {
        PRODUCT_PRECEDENCE
    } else {
        ATOM_PRECEDENCE
    }
}

/// Write `expr`, parenthesized when `wrap` holds
fn format_wrapped(f: &mut fmt::Formatter<'_>, expr: &Expr, wrap: bool) -> fmt::Result {
    if wrap {
        write!(f, "({expr})")
    } else {
        write!(f, "{expr}")
    }
}

fn format_list(f: &mut fmt::Formatter<'_>, items: &[Arc<Expr>]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

/// If `expr` carries a negative sign, return the expression without it.
///
/// A product loses one `-1` factor, or has its first negative constant
/// replaced by its magnitude; a negative constant is negated.
pub(crate) fn extract_negative(expr: &Expr) -> Option<Expr> {
    match &expr.kind {
        ExprKind::Constant(c) if c.is_negative() => Some(Expr::constant(-c.clone())),
        ExprKind::Product(factors) => {
            if let Some(pos) = factors.iter().position(|f| f.is_minus_one()) {
                let mut rest = factors.clone();
                rest.remove(pos);
                return Some(Expr::product_from_arcs(rest));
            }
            let pos = factors
                .iter()
                .position(|f| f.as_constant().is_some_and(Real::is_negative))?;
            let mut rest = factors.clone();
            if let Some(c) = factors[pos].as_constant() {
                rest[pos] = Arc::new(Expr::constant(-c.clone()));
            }
            Some(Expr::product_from_arcs(rest))
        }
        _ => None,
    }
}

// =============================================================================
// NODE FORMATTERS
// =============================================================================

fn format_sum(f: &mut fmt::Formatter<'_>, terms: &[Arc<Expr>]) -> fmt::Result {
    // Print order: positive terms, then negative terms, then the constant.
    // Reading the text back re-sorts the terms canonically.
    let mut ordered: Vec<(&Expr, Option<Expr>)> = Vec::with_capacity(terms.len());
    let mut negatives = Vec::new();
    let mut constants = Vec::new();
    for term in terms {
        let negated = extract_negative(term);
        if term.is_constant() {
            constants.push((term.as_ref(), negated));
        } else if negated.is_some() {
            negatives.push((term.as_ref(), negated));
        } else {
            ordered.push((term.as_ref(), None));
        }
    }
    ordered.append(&mut negatives);
    ordered.append(&mut constants);

    for (i, (term, negated)) in ordered.into_iter().enumerate() {
        if i == 0 {
            format_wrapped(f, term, precedence(term) < SUM_PRECEDENCE)?;
            continue;
        }
        match negated {
            Some(positive) => {
                f.write_str(" - ")?;
                format_wrapped(f, &positive, precedence(&positive) <= SUM_PRECEDENCE)?;
            }
            None => {
                f.write_str(" + ")?;
                format_wrapped(f, term, precedence(term) <= SUM_PRECEDENCE)?;
            }
        }
    }
    Ok(())
}

fn format_product(f: &mut fmt::Formatter<'_>, factors: &[Arc<Expr>]) -> fmt::Result {
    let mut negations = 0;
    let mut numerator: Vec<&Expr> = Vec::with_capacity(factors.len());
    let mut denominator: Vec<&Expr> = Vec::new();

    for factor in factors {
        match &factor.kind {
            _ if factor.is_minus_one() => negations += 1,
            ExprKind::Power(base, exp) if exp.is_minus_one() => denominator.push(base),
            _ => numerator.push(factor),
        }
    }

    for _ in 0..negations {
        f.write_str("-")?;
    }

    if numerator.is_empty() {
        f.write_str("1")?;
    }
    for (i, factor) in numerator.iter().enumerate() {
        if i > 0 {
            f.write_str("*")?;
        }
        // A lone leading negative constant can print its own sign
        let leading_sign_ok = i == 0 && negations == 0;
        let p = precedence(factor);
        let wrap = p < PRODUCT_PRECEDENCE
            && !(leading_sign_ok && p == NEGATE_PRECEDENCE && factor.is_constant());
        format_wrapped(f, factor, wrap)?;
    }

    for factor in denominator {
        f.write_str("/")?;
        format_wrapped(f, factor, precedence(factor) <= PRODUCT_PRECEDENCE)?;
    }
    Ok(())
}

fn format_power(f: &mut fmt::Formatter<'_>, base: &Expr, exp: &Expr) -> fmt::Result {
    if exp.is_minus_one() {
        f.write_str("1/")?;
        return format_wrapped(f, base, precedence(base) <= PRODUCT_PRECEDENCE);
    }
    format_wrapped(f, base, precedence(base) <= POWER_PRECEDENCE)?;
    f.write_str("^")?;
    let negative_constant = exp.as_constant().is_some_and(Real::is_negative);
    format_wrapped(
        f,
        exp,
        !negative_constant && precedence(exp) < POWER_PRECEDENCE,
    )
}

// =============================================================================
// DISPLAY IMPLEMENTATION
// =============================================================================

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ExprKind::Constant(c) => write!(f, "{c}"),
            ExprKind::Variable(v) => f.write_str(v.name()),
            ExprKind::Call { function, args } => {
                write!(f, "{}[", function.name())?;
                format_list(f, args)?;
                f.write_str("]")
            }
            ExprKind::Matrix {
                rows,
                cols,
                elements,
            } => {
                f.write_str("[")?;
                for i in 0..*rows {
                    f.write_str("[")?;
                    format_list(f, &elements[i * cols..(i + 1) * cols])?;
                    f.write_str("]")?;
                }
                f.write_str("]")
            }
            ExprKind::Index { target, indices } => {
                // A bare name followed by `[` reads back as a call
                let wrap = precedence(target) < ATOM_PRECEDENCE
                    || matches!(target.kind, ExprKind::Variable(_) | ExprKind::Constant(_));
                format_wrapped(f, target, wrap)?;
                f.write_str("[")?;
                format_list(f, indices)?;
                f.write_str("]")
            }
            ExprKind::Sum(terms) => format_sum(f, terms),
            ExprKind::Product(factors) => format_product(f, factors),
            ExprKind::Power(base, exp) => format_power(f, base, exp),
            ExprKind::Binary { op, left, right } => {
                let p = op.precedence();
                format_wrapped(f, left, precedence(left) < p)?;
                write!(f, " {} ", op.symbol())?;
                format_wrapped(f, right, precedence(right) <= p)
            }
            ExprKind::Unary { op, operand } => {
                let p = op.precedence();
                match op {
                    crate::core::expr::UnaryOp::Not => {
                        f.write_str(op.symbol())?;
                        format_wrapped(f, operand, precedence(operand) <= p)
                    }
                    crate::core::expr::UnaryOp::Prime => {
                        format_wrapped(f, operand, precedence(operand) < p)?;
                        f.write_str(op.symbol())
                    }
                }
            }
            ExprKind::Set(members) => {
                f.write_str("{")?;
                format_list(f, members)?;
                f.write_str("}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::expr::{BinaryOp, UnaryOp};

    fn x() -> Expr {
        Expr::variable("x")
    }

    fn y() -> Expr {
        Expr::variable("y")
    }

    #[test]
    fn test_display_constant() {
        assert_eq!(Expr::integer(5).to_string(), "5");
        assert_eq!(Expr::rational(7, 2).to_string(), "3.5");
        assert_eq!(Expr::rational(1, 3).to_string(), "1/3");
    }

    #[test]
    fn test_display_subtraction() {
        assert_eq!((x() - y()).to_string(), "x - y");
        assert_eq!((x() - Expr::integer(2) * y()).to_string(), "x - 2*y");
        assert_eq!((x() - (y() + Expr::integer(1))).to_string(), "x - (y + 1)");
    }

    #[test]
    fn test_display_negation() {
        assert_eq!((-x()).to_string(), "-x");
        assert_eq!((-(-x())).to_string(), "--x");
        assert_eq!(Expr::product(vec![Expr::integer(-3), x()]).to_string(), "-3*x");
    }

    #[test]
    fn test_display_division() {
        assert_eq!((x() / y()).to_string(), "x/y");
        assert_eq!((Expr::one() / y()).to_string(), "1/y");
        assert_eq!((x() / (y() * Expr::integer(2))).to_string(), "x/(2*y)");
        assert_eq!((x() / y() / Expr::variable("z")).to_string(), "x/y/z");
    }

    #[test]
    fn test_display_coefficient_leads() {
        let square = (x() + Expr::one()).pow(2);
        assert_eq!(Expr::product(vec![square, Expr::integer(3)]).to_string(), "3*(x + 1)^2");
        let two_to_x = Expr::integer(2).pow(x());
        assert_eq!(Expr::product(vec![two_to_x, Expr::integer(3)]).to_string(), "3*2^x");
    }

    #[test]
    fn test_display_power() {
        assert_eq!(x().pow(2).to_string(), "x^2");
        assert_eq!((x() + y()).pow(2).to_string(), "(x + y)^2");
        assert_eq!(x().pow(y()).pow(2).to_string(), "(x^y)^2");
        assert_eq!(x().pow(-2).to_string(), "x^-2");
        assert_eq!((-x()).pow(2).to_string(), "(-x)^2");
    }

    #[test]
    fn test_display_operators() {
        let arrow = Expr::arrow(x(), Expr::rational(7, 2));
        assert_eq!(arrow.to_string(), "x -> 3.5");
        let sub = Expr::binary(BinaryOp::Substitute, x() + y(), Expr::set(vec![arrow]));
        assert_eq!(sub.to_string(), "x + y : {x -> 3.5}");
        let not = Expr::unary(UnaryOp::Not, Expr::binary(BinaryOp::And, x(), y()));
        assert_eq!(not.to_string(), "!(x & y)");
        assert_eq!(Expr::unary(UnaryOp::Prime, x()).to_string(), "x'");
    }

    #[test]
    fn test_display_containers() {
        let f = Expr::unknown_call("F", vec![x(), y()]);
        assert_eq!(f.to_string(), "F[x, y]");
        let m = Expr::matrix(vec![vec![x(), y()], vec![Expr::integer(1), Expr::integer(2)]]);
        assert_eq!(m.map(|m| m.to_string()).ok(), Some("[[x, y][1, 2]]".to_string()));
        let i = Expr::index(x(), vec![Expr::integer(1)]);
        assert_eq!(i.to_string(), "(x)[1]");
    }
}
