//! Structural hashing.

use std::hash::{Hash, Hasher};

use rustc_hash::FxHasher;

use super::ExprKind;

/// Compute the structural hash of a node from its kind.
///
/// Children contribute their own cached hashes, so this is O(children).
/// Sum and product hashes are order-independent.
#[must_use]
pub fn compute_expr_hash(kind: &ExprKind) -> u64 {
    let mut hasher = FxHasher::default();
    std::mem::discriminant(kind).hash(&mut hasher);

    match kind {
        ExprKind::Constant(r) => r.hash(&mut hasher),
        ExprKind::Variable(v) => {
            v.name().hash(&mut hasher);
            v.ring().hash(&mut hasher);
        }
        ExprKind::Call { function, args } => {
            function.hash(&mut hasher);
            for arg in args {
                hasher.write_u64(arg.hash);
            }
        }
        ExprKind::Matrix {
            rows,
            cols,
            elements,
        } => {
            hasher.write_usize(*rows);
            hasher.write_usize(*cols);
            for e in elements {
                hasher.write_u64(e.hash);
            }
        }
        ExprKind::Index { target, indices } => {
            hasher.write_u64(target.hash);
            for i in indices {
                hasher.write_u64(i.hash);
            }
        }
        // Commutative: sum of individual hashes
        ExprKind::Sum(terms) | ExprKind::Product(terms) | ExprKind::Set(terms) => {
            let acc = terms.iter().fold(0u64, |acc, t| acc.wrapping_add(t.hash));
            hasher.write_u64(acc);
        }
        ExprKind::Power(base, exp) => {
            hasher.write_u64(base.hash);
            hasher.write_u64(exp.hash);
        }
        ExprKind::Binary { op, left, right } => {
            op.hash(&mut hasher);
            hasher.write_u64(left.hash);
            hasher.write_u64(right.hash);
        }
        ExprKind::Unary { op, operand } => {
            op.hash(&mut hasher);
            hasher.write_u64(operand.hash);
        }
    }

    hasher.finish()
}
