//! Canonical ordering for expressions.
//!
//! Provides the total order used to sort the operands of sums, products and
//! sets. The order carries no numeric meaning.
//!
//! Key, compared lexicographically:
//! 1. constants before everything else
//! 2. the flattened atom sequences of both sides
//! 3. the node kind
//! 4. the children, in order
//!
//! Atoms compare by type rank (constants < variables < calls < matrices <
//! indices), then by a packed key of their leading name characters, then by
//! full value.

use std::cmp::Ordering as CmpOrdering;
use std::sync::Arc;

use super::{Expr, ExprKind, FunctionBody, Variable};

/// Pack the first four characters of `name` into an integer whose numeric
/// order agrees with the lexical order of the names
#[must_use]
pub fn fast_key(name: &str) -> u64 {
    let mut key = 0u64;
    let mut chars = name.chars();
    for _ in 0..4 {
        let c = chars.next().map_or(0, |c| u64::from(c).min(0xFFFF));
        key = (key << 16) | c;
    }
    key
}

/// Compare expressions for canonical ordering
#[must_use]
pub fn expr_cmp(a: &Expr, b: &Expr) -> CmpOrdering {
    if std::ptr::eq(a, b) {
        return CmpOrdering::Equal;
    }
    // A coefficient leads its product, whatever the atoms of the other factors
    match (a.is_constant(), b.is_constant()) {
        (true, false) => return CmpOrdering::Less,
        (false, true) => return CmpOrdering::Greater,
        _ => {}
    }
    if a.is_atom() && b.is_atom() {
        return atom_cmp(a, b);
    }

    // Composite on at least one side: atom sequences first
    let mut atoms_a = a.atoms();
    let mut atoms_b = b.atoms();
    loop {
        match (atoms_a.next(), atoms_b.next()) {
            (Some(x), Some(y)) => {
                let ord = atom_cmp(x, y);
                if ord != CmpOrdering::Equal {
                    return ord;
                }
            }
            (Some(_), None) => return CmpOrdering::Greater,
            (None, Some(_)) => return CmpOrdering::Less,
            (None, None) => break,
        }
    }

    kind_rank(a)
        .cmp(&kind_rank(b))
        .then_with(|| structural_cmp(a, b))
}

/// Rank of the node kind. Atoms rank below every composite.
fn kind_rank(e: &Expr) -> u8 {
    match &e.kind {
        ExprKind::Constant(_) => 0,
        ExprKind::Variable(_) => 1,
        ExprKind::Call { .. } => 2,
        ExprKind::Matrix { .. } => 3,
        ExprKind::Index { .. } => 4,
        ExprKind::Sum(_) => 10,
        ExprKind::Product(_) => 11,
        ExprKind::Power(..) => 12,
        ExprKind::Binary { .. } => 13,
        ExprKind::Unary { .. } => 14,
        ExprKind::Set(_) => 15,
    }
}

/// Compare two atoms
fn atom_cmp(a: &Expr, b: &Expr) -> CmpOrdering {
    let rank = kind_rank(a).cmp(&kind_rank(b));
    if rank != CmpOrdering::Equal {
        return rank;
    }

    match (&a.kind, &b.kind) {
        (ExprKind::Constant(x), ExprKind::Constant(y)) => x.total_cmp(y),
        (ExprKind::Variable(x), ExprKind::Variable(y)) => variable_cmp(x, y),
        (
            ExprKind::Call {
                function: f,
                args: args_a,
            },
            ExprKind::Call {
                function: g,
                args: args_b,
            },
        ) => f
            .key()
            .cmp(&g.key())
            .then_with(|| f.name().cmp(g.name()))
            .then_with(|| f.arity().start().cmp(g.arity().start()))
            .then_with(|| f.arity().end().cmp(g.arity().end()))
            .then_with(|| body_cmp(f.body(), g.body()))
            .then_with(|| slice_cmp(args_a, args_b)),
        (
            ExprKind::Matrix {
                rows: ra,
                cols: ca,
                elements: ea,
            },
            ExprKind::Matrix {
                rows: rb,
                cols: cb,
                elements: eb,
            },
        ) => ra
            .cmp(rb)
            .then_with(|| ca.cmp(cb))
            .then_with(|| slice_cmp(ea, eb)),
        (
            ExprKind::Index {
                target: ta,
                indices: ia,
            },
            ExprKind::Index {
                target: tb,
                indices: ib,
            },
        ) => expr_cmp(ta, tb).then_with(|| slice_cmp(ia, ib)),
        _ => CmpOrdering::Equal,
    }
}

fn variable_cmp(a: &Variable, b: &Variable) -> CmpOrdering {
    a.key()
        .cmp(&b.key())
        .then_with(|| a.name().cmp(b.name()))
        .then_with(|| a.ring().cmp(&b.ring()))
        .then_with(|| a.condition_addr().cmp(&b.condition_addr()))
}

fn body_cmp(a: &FunctionBody, b: &FunctionBody) -> CmpOrdering {
    fn rank(body: &FunctionBody) -> u8 {
        match body {
            FunctionBody::Unknown => 0,
            FunctionBody::Native(_) => 1,
            FunctionBody::Expression { .. } => 2,
        }
    }
    match (a, b) {
        (FunctionBody::Native(f), FunctionBody::Native(g)) => Arc::as_ptr(f)
            .cast::<()>()
            .cmp(&Arc::as_ptr(g).cast::<()>()),
        (
            FunctionBody::Expression {
                parameters: pa,
                body: ba,
            },
            FunctionBody::Expression {
                parameters: pb,
                body: bb,
            },
        ) => pa
            .iter()
            .zip(pb)
            .map(|(x, y)| expr_cmp(x, y))
            .find(|o| *o != CmpOrdering::Equal)
            .unwrap_or_else(|| pa.len().cmp(&pb.len()))
            .then_with(|| expr_cmp(ba, bb)),
        _ => rank(a).cmp(&rank(b)),
    }
}

/// Same-kind composite comparison: operator, then children in order
fn structural_cmp(a: &Expr, b: &Expr) -> CmpOrdering {
    match (&a.kind, &b.kind) {
        (ExprKind::Sum(x), ExprKind::Sum(y))
        | (ExprKind::Product(x), ExprKind::Product(y))
        | (ExprKind::Set(x), ExprKind::Set(y)) => slice_cmp(x, y),
        (ExprKind::Power(la, ra), ExprKind::Power(lb, rb)) => {
            expr_cmp(la, lb).then_with(|| expr_cmp(ra, rb))
        }
        (
            ExprKind::Binary {
                op: oa,
                left: la,
                right: ra,
            },
            ExprKind::Binary {
                op: ob,
                left: lb,
                right: rb,
            },
        ) => oa
            .cmp(ob)
            .then_with(|| expr_cmp(la, lb))
            .then_with(|| expr_cmp(ra, rb)),
        (
            ExprKind::Unary {
                op: oa,
                operand: xa,
            },
            ExprKind::Unary {
                op: ob,
                operand: xb,
            },
        ) => oa.cmp(ob).then_with(|| expr_cmp(xa, xb)),
        _ => atom_cmp(a, b),
    }
}

fn slice_cmp(a: &[Arc<Expr>], b: &[Arc<Expr>]) -> CmpOrdering {
    for (x, y) in a.iter().zip(b) {
        let ord = expr_cmp(x, y);
        if ord != CmpOrdering::Equal {
            return ord;
        }
    }
    a.len().cmp(&b.len())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic, reason = "Standard test relaxations")]
mod tests {
    use super::*;
    use crate::core::expr::Ring;

    fn v(name: &str) -> Expr {
        Expr::variable(name)
    }

    #[test]
    fn test_fast_key_agrees_with_names() {
        assert!(fast_key("ab") < fast_key("abc"));
        assert!(fast_key("a") < fast_key("b"));
        assert_eq!(fast_key("abcdX"), fast_key("abcdY"));
        assert_eq!(expr_cmp(&v("abcdX"), &v("abcdY")), CmpOrdering::Less);
    }

    #[test]
    fn test_constants_before_variables_before_calls() {
        let c = Expr::integer(7);
        let x = v("x");
        let f = Expr::unknown_call("f", vec![v("a")]);
        assert_eq!(expr_cmp(&c, &x), CmpOrdering::Less);
        assert_eq!(expr_cmp(&x, &f), CmpOrdering::Less);
        assert_eq!(expr_cmp(&f, &c), CmpOrdering::Greater);
    }

    #[test]
    fn test_ring_distinguishes_variables() {
        let n = Expr::variable_in("n", Ring::Integers);
        let m = v("n");
        assert_ne!(n, m);
        assert_ne!(expr_cmp(&n, &m), CmpOrdering::Equal);
    }

    #[test]
    fn test_equal_atoms_different_kinds_are_ordered() {
        let sum = Expr::sum(vec![v("x"), v("y")]);
        let product = Expr::product(vec![v("x"), v("y")]);
        assert_eq!(expr_cmp(&sum, &product), CmpOrdering::Less);
        assert_eq!(expr_cmp(&product, &sum), CmpOrdering::Greater);
    }

    #[test]
    fn test_prefix_atom_sequence_sorts_first() {
        let x = v("x");
        let x2 = Expr::power(v("x"), Expr::integer(2));
        assert_eq!(expr_cmp(&x, &x2), CmpOrdering::Less);
    }

    #[test]
    fn test_constants_lead_composites() {
        let three = Expr::integer(3);
        let two_to_x = Expr::power(Expr::integer(2), v("x"));
        let square = Expr::power(Expr::sum(vec![v("x"), Expr::one()]), Expr::integer(2));
        assert_eq!(expr_cmp(&three, &two_to_x), CmpOrdering::Less);
        assert_eq!(expr_cmp(&square, &three), CmpOrdering::Greater);

        let product = Expr::product(vec![two_to_x, three.clone()]);
        match product.kind() {
            ExprKind::Product(factors) => assert_eq!(*factors[0], three),
            other => panic!("expected product, got {other:?}"),
        }
    }

    #[test]
    fn test_cmp_equal_iff_eq() {
        let a = Expr::power(Expr::sum(vec![v("x"), v("y")]), v("z"));
        let b = Expr::power(Expr::sum(vec![v("y"), v("x")]), v("z"));
        assert_eq!(a, b);
        assert_eq!(expr_cmp(&a, &b), CmpOrdering::Equal);
    }
}
